use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use truss2d::{render_report, TrussModel};

/// Analyse a planar truss described in a JSON model file.
#[derive(Parser)]
#[command(name = "truss2d", version)]
struct Opt {
    /// Path to the truss model.
    #[arg(value_name = "MODEL")]
    model: PathBuf,

    /// Print the full result as JSON instead of the text report.
    #[arg(long)]
    json: bool,

    /// Exaggeration applied to displacements when listing displaced node positions.
    #[arg(long, value_name = "SCALE")]
    scale: Option<f64>,
}

fn main() -> ExitCode {
    let _ = env_logger::Builder::from_env("TRUSS2D_LOG").try_init();

    match try_main(Opt::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Load, analyse and print; errors bubble up to `main` for reporting.
fn try_main(opt: Opt) -> Result<(), Box<dyn Error>> {
    // Load the model and build the editable truss from it.
    let mut built = TrussModel::from_json_file(&opt.model)?.build()?;

    // A failed pass is reported to the user rather than aborting the process.
    let result = built.truss.run_analysis()?;

    if opt.json {
        println!("{}", result.to_json()?);
    } else {
        print!("{}", render_report(result));
    }

    if let Some(scale) = opt.scale {
        println!("\nDisplaced positions (scale {scale}):");
        for (idx, node) in result.nodes.iter().enumerate() {
            let displaced = node.displaced_position(scale);
            println!("  {idx:>3}: ({:.6}, {:.6})", displaced.x, displaced.y);
        }
    }

    Ok(())
}
