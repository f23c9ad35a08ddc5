//! Plain-text rendering of analysis results.

use std::fmt::Write;

use crate::analysis::AnalysisResult;

/// Render a textual summary of an analysis result.
///
/// Totals come first, followed by one line per node and one line per element. Elements
/// whose stress exceeds the yield stress are flagged with `YIELD`.
#[must_use]
pub fn render_report(result: &AnalysisResult) -> String {
    let mut output = String::new();

    writeln!(
        &mut output,
        "Truss analysis: {} nodes, {} elements",
        result.nodes.len(),
        result.elements.len()
    )
    .expect("writing to string cannot fail");
    writeln!(
        &mut output,
        "Total volume: {:.4e}  total mass: {:.4e}",
        result.totals.volume, result.totals.mass
    )
    .expect("writing to string cannot fail");
    writeln!(
        &mut output,
        "Total displacement: {:.4e}  total stress: {:.4e}",
        result.totals.displacement, result.totals.stress
    )
    .expect("writing to string cannot fail");

    output.push_str("\nNodes:\n");
    for (idx, node) in result.nodes.iter().enumerate() {
        let support = if node.fixed { " fixed" } else { "" };
        writeln!(
            &mut output,
            "  {idx:>3}: ux = {:+.4e}, uy = {:+.4e}{support}",
            node.displacement.x, node.displacement.y
        )
        .expect("writing to string cannot fail");
    }

    output.push_str("\nElements:\n");
    for (idx, element) in result.elements.iter().enumerate() {
        let marker = if element.yielded { "  YIELD" } else { "" };
        writeln!(
            &mut output,
            "  {idx:>3}: nodes {}-{}, stress = {:.4e}, volume = {:.4e}, utilisation = {:.1}%{marker}",
            element.nodes.0,
            element.nodes.1,
            element.stress,
            element.volume,
            element.utilization * 100.0
        )
        .expect("writing to string cannot fail");
    }

    if result.totals.any_yielded {
        output.push_str("\nAt least one element exceeds its yield stress.\n");
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{force, point};
    use crate::store::ElementProperties;
    use crate::truss::Truss;

    #[test]
    fn formats_human_readable_report() {
        let mut truss = Truss::new();
        let a = truss.add_node(point(0.0, 0.0), true).expect("node added");
        let b = truss.add_node(point(1.0, 0.0), true).expect("node added");
        truss.set_node_force(b, force(1.0, 0.0)).expect("load applied");
        truss
            .add_element(a, b, ElementProperties::new(10.0, 5.0, 0.0, 2.0))
            .expect("element added");
        let result = truss.run_analysis().expect("nothing to solve");

        let report = render_report(result);
        assert!(report.contains("Truss analysis: 2 nodes, 1 elements"));
        assert!(report.contains("Total volume: 2.0000e0"));
        assert!(report.contains("nodes 0-1"));
        assert!(!report.contains("YIELD"));
    }
}
