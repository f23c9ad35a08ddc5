use truss2d::{render_report, MaterialCatalog, TrussModel, UniformInputs};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // The default bridge, built from the first catalogue material
    let catalog = MaterialCatalog::builtin();
    let material = catalog.get(0).ok_or("empty catalogue")?;
    let mut model = TrussModel::bridge(material.properties(1.0));
    // Loads are entered in kN
    model.config.force_scale = 1_000.0;
    let mut built = model.build()?;

    // Every node receives the same load, every element the same section
    let inputs = UniformInputs {
        force: Some(truss2d::force(0.0, -0.01)),
        properties: Some(material.properties(2.5)),
    };
    let result = built.truss.run_analysis_with(&inputs)?;
    print!("{}", render_report(result));

    Ok(())
}
