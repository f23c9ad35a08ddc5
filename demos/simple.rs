use truss2d::{force, point, ElementProperties, Truss};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Create a simple two-bar truss with one loaded apex
    let mut truss = Truss::new();

    // Define nodes and supports
    let left = truss.add_node(point(0.0, 0.0), true)?;
    let right = truss.add_node(point(2.0, 0.0), true)?;
    let apex = truss.add_node(point(1.0, 1.0), false)?;

    // Define loads
    truss.set_node_force(apex, force(0.0, -5_000.0))?;

    // Define elements
    let properties = ElementProperties::new(210.0e9, 250.0e6, 7850.0, 0.005);
    let left_bar = truss.add_element(left, apex, properties)?;
    truss.add_element(right, apex, properties)?;

    // Analyse the truss
    let result = truss.run_analysis()?;

    if let Some(displacement) = result.displacement(apex) {
        println!("apex: ux = {:.3e} m, uy = {:.3e} m", displacement.x, displacement.y);
    }
    if let Some(bar) = result.element(left_bar) {
        println!(
            "left bar: axial force = {:.1} N, factor of safety = {:.2}",
            bar.axial_force, bar.factor_of_safety
        );
    }

    // All done
    Ok(())
}
