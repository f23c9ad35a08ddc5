use approx::assert_relative_eq;
use nalgebra::{DMatrix, DVector};
use truss2d::assembly::{global_stiffness, AnalysisModel};
use truss2d::constraints::DofPartition;
use truss2d::{
    force, point, AnalysisError, ElementProperties, NodeHandle, Truss, TrussModel,
};

fn steel() -> ElementProperties {
    ElementProperties::new(200.0e9, 250.0e6, 7850.0, 1.0e-3)
}

/// Pratt-style panel: two supports, two free nodes, five members.
fn panel() -> (Truss, [NodeHandle; 4]) {
    let mut truss = Truss::new();
    let a = truss.add_node(point(0.0, 0.0), true).expect("node added");
    let b = truss.add_node(point(3.0, 0.0), true).expect("node added");
    let c = truss.add_node(point(3.0, 2.0), false).expect("node added");
    let d = truss.add_node(point(0.0, 2.0), false).expect("node added");
    for (start, end) in [(a, b), (b, c), (c, d), (d, a), (a, c)] {
        truss.add_element(start, end, steel()).expect("element added");
    }
    (truss, [a, b, c, d])
}

fn assembled(truss: &Truss) -> DMatrix<f64> {
    let model = AnalysisModel::from_store(truss.store()).expect("consistent store");
    global_stiffness(&model).expect("no degenerate elements")
}

#[test]
fn global_stiffness_is_symmetric() {
    let (truss, _) = panel();
    let k = assembled(&truss);
    assert_relative_eq!(k.clone(), k.transpose(), max_relative = 1.0e-12);
}

#[test]
fn elements_sharing_a_node_add_up() {
    let mut truss = Truss::new();
    let a = truss.add_node(point(0.0, 0.0), true).expect("node added");
    let b = truss.add_node(point(1.0, 1.0), false).expect("node added");
    let c = truss.add_node(point(2.0, 0.0), true).expect("node added");
    let first = truss.add_element(a, b, steel()).expect("element added");
    let second = truss.add_element(b, c, steel()).expect("element added");
    let combined = assembled(&truss);

    let mut only_first = truss.clone();
    only_first.remove_element(second).expect("element exists");
    let mut only_second = truss.clone();
    only_second.remove_element(first).expect("element exists");

    let sum = assembled(&only_first) + assembled(&only_second);
    assert_relative_eq!(combined, sum, epsilon = 1.0e-6);
}

#[test]
fn unloaded_structure_does_not_move() {
    let (mut truss, _) = panel();
    let result = truss.run_analysis().expect("stable structure");
    assert_relative_eq!(
        result.displacements.clone(),
        DVector::zeros(8),
        epsilon = 1.0e-15
    );
    assert_eq!(result.totals.displacement, 0.0);
    assert_eq!(result.totals.stress, 0.0);
}

#[test]
fn unsupported_structure_is_singular() {
    let mut truss = Truss::new();
    let a = truss.add_node(point(0.0, 0.0), false).expect("node added");
    let b = truss.add_node(point(1.0, 0.0), false).expect("node added");
    let c = truss.add_node(point(0.5, 1.0), false).expect("node added");
    for (start, end) in [(a, b), (b, c), (c, a)] {
        truss.add_element(start, end, steel()).expect("element added");
    }
    truss
        .set_node_force(c, force(10.0, 0.0))
        .expect("load applied");
    assert!(matches!(
        truss.run_analysis(),
        Err(AnalysisError::SingularSystem { .. })
    ));
    assert!(truss.last_result().is_none());
}

#[test]
fn colinear_mechanism_is_singular() {
    let mut truss = Truss::new();
    let a = truss.add_node(point(0.0, 0.0), true).expect("node added");
    let b = truss.add_node(point(1.0, 0.0), false).expect("node added");
    let c = truss.add_node(point(2.0, 0.0), true).expect("node added");
    truss.add_element(a, b, steel()).expect("element added");
    truss.add_element(b, c, steel()).expect("element added");
    truss
        .set_node_force(b, force(0.0, -1.0))
        .expect("load applied");
    assert!(matches!(
        truss.run_analysis(),
        Err(AnalysisError::SingularSystem { .. })
    ));
}

#[test]
fn reduce_then_expand_keeps_free_values() {
    let flags = [true, false, false, true, false];
    let partition = DofPartition::from_fixed_nodes(flags);
    let full = DVector::from_fn(10, |row, _| (row as f64 + 1.0) * 0.5);
    let round_trip = partition.expand(&partition.restrict_vector(&full));
    for (node, &fixed) in flags.iter().enumerate() {
        for axis in 0..2 {
            let dof = node * 2 + axis;
            let expected = if fixed { 0.0 } else { full[dof] };
            assert_eq!(round_trip[dof], expected);
        }
    }
    assert_eq!(partition.reduced_len(), 10 - 2 * 2);
}

#[test]
fn total_volume_follows_geometry_changes() {
    let (mut truss, [_, _, c, d]) = panel();
    let expected = |truss: &Truss| -> f64 {
        truss
            .elements()
            .into_iter()
            .map(|element| {
                let (start, end) = truss.element_nodes(element).expect("element exists");
                let length = truss
                    .node_position(start)
                    .expect("node exists")
                    .distance(truss.node_position(end).expect("node exists"));
                truss.element_properties(element).expect("element exists").area * length
            })
            .sum()
    };

    let before = expected(&truss);
    let total = truss.run_analysis().expect("stable structure").totals.volume;
    assert_relative_eq!(total, before, max_relative = 1.0e-12);

    truss.move_node(c, point(3.0, 4.0)).expect("node moved");
    truss.move_node(d, point(0.0, 4.0)).expect("node moved");
    let after = expected(&truss);
    let total = truss.run_analysis().expect("stable structure").totals.volume;
    assert_relative_eq!(total, after, max_relative = 1.0e-12);
    assert!(after > before);
}

#[test]
fn coincident_nodes_raise_a_degenerate_element_error() {
    let mut truss = Truss::new();
    let a = truss.add_node(point(1.0, 1.0), true).expect("node added");
    let b = truss.add_node(point(1.0, 1.0), false).expect("node added");
    let element = truss.add_element(a, b, steel()).expect("element added");
    assert_eq!(
        truss.run_analysis().map(|_| ()),
        Err(AnalysisError::DegenerateElement(element))
    );
}

#[test]
fn removing_a_node_removes_its_elements_before_analysis() {
    let (mut truss, [_, _, _, d]) = panel();
    let removed = truss.remove_node(d).expect("node exists");
    assert_eq!(removed.len(), 2);
    assert_eq!(truss.element_count(), 3);
    for element in removed {
        assert!(truss.element_properties(element).is_none());
    }
    let result = truss.run_analysis().expect("remaining structure is stable");
    assert_eq!(result.nodes.len(), 3);
}

#[test]
fn loaded_bridge_sags_symmetrically() {
    let mut built = TrussModel::bridge(steel()).build().expect("consistent model");
    for &node in &built.nodes[0..4] {
        built
            .truss
            .set_node_force(node, force(0.0, -1_000.0))
            .expect("load applied");
    }
    let result = built.truss.run_analysis().expect("bridge is stable");

    let left = result.displacement(built.nodes[5]).expect("node result");
    let right = result.displacement(built.nodes[7]).expect("node result");
    let middle = result.displacement(built.nodes[6]).expect("node result");
    assert!(middle.y < 0.0);
    let tolerance = 1.0e-9 * middle.y.abs();
    assert_relative_eq!(left.y, right.y, epsilon = tolerance);
    assert_relative_eq!(left.x, -right.x, epsilon = tolerance);
    assert_relative_eq!(middle.x, 0.0, epsilon = tolerance);
    assert!(middle.y < left.y);
    assert_eq!(result.displacement(built.nodes[4]), Some(Default::default()));
    assert_eq!(result.displacement(built.nodes[8]), Some(Default::default()));
}

#[test]
fn stiff_and_soft_bars_bracing_one_node_solve() {
    let mut truss = Truss::new();
    let anchor = truss.add_node(point(0.0, 0.0), true).expect("node added");
    let brace_foot = truss.add_node(point(0.0, -1.0), true).expect("node added");
    let joint = truss.add_node(point(1.0, 0.0), false).expect("node added");
    let stiff = 2.0e11;
    truss
        .add_element(anchor, joint, ElementProperties::new(stiff, 250.0e6, 0.0, 1.0))
        .expect("element added");
    truss
        .add_element(brace_foot, joint, ElementProperties::new(1.0, 1.0, 0.0, 1.0))
        .expect("element added");
    truss
        .set_node_force(joint, force(0.0, -1.0))
        .expect("load applied");

    let result = truss.run_analysis().expect("statically determinate");
    let displacement = result.displacement(joint).expect("node result");

    // Diagonal brace of length sqrt(2) contributes EA/L * 1/2 to each entry.
    let soft = 0.5 * std::f64::consts::FRAC_1_SQRT_2;
    assert_relative_eq!(displacement.x, 1.0 / stiff, max_relative = 1.0e-9);
    assert_relative_eq!(
        displacement.y,
        -(stiff + soft) / (stiff * soft),
        max_relative = 1.0e-9
    );
}
