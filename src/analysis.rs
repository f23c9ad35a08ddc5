//! The analysis pass: assemble, reduce, solve, expand and derive results.
//!
//! A pass runs to completion on the calling thread and works on an
//! [`AnalysisModel`] snapshot, so nothing it allocates outlives it except the
//! returned [`AnalysisResult`].

use std::fmt;

use nalgebra::DVector;
use serde::Serialize;

use crate::assembly::{force_vector, global_stiffness, AnalysisModel, DOF_PER_NODE};
use crate::config::AnalysisConfig;
use crate::constraints::DofPartition;
use crate::element::separation_stress;
use crate::errors::{AnalysisError, TopologyError};
use crate::geometry::{Displacement, Force, Point};
use crate::lu;
use crate::store::{ElementHandle, NodeHandle};

/// Stages of a pass, in the order they run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnalysisStage {
    /// No pass is running; a pass starts and ends here.
    Idle,
    /// Current loads and properties are pulled from the input source.
    GatherInputs,
    /// Global stiffness matrix and load vector are built.
    AssembleGlobal,
    /// Fixed degrees of freedom are removed.
    Reduce,
    /// The reduced system is solved.
    Solve,
    /// The reduced solution is scattered back to full length.
    Expand,
    /// Stresses, volumes and totals are computed.
    DeriveResults,
}

impl fmt::Display for AnalysisStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AnalysisStage::Idle => "idle",
            AnalysisStage::GatherInputs => "gather inputs",
            AnalysisStage::AssembleGlobal => "assemble global system",
            AnalysisStage::Reduce => "reduce",
            AnalysisStage::Solve => "solve",
            AnalysisStage::Expand => "expand",
            AnalysisStage::DeriveResults => "derive results",
        };
        f.write_str(name)
    }
}

/// Solved state of a node.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NodeResult {
    /// Node the result belongs to.
    #[serde(skip)]
    pub handle: NodeHandle,
    /// Undeformed position.
    pub position: Point,
    /// Whether the node was fixed.
    pub fixed: bool,
    /// Load applied during the pass.
    pub force: Force,
    /// Solved displacement; exactly zero for fixed nodes.
    pub displacement: Displacement,
}

impl NodeResult {
    /// Position after loading, with the displacement exaggerated by `scale`.
    #[must_use]
    pub fn displaced_position(&self, scale: f64) -> Point {
        self.position.displaced(self.displacement, scale)
    }
}

/// Derived quantities of an element.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ElementResult {
    /// Element the result belongs to.
    #[serde(skip)]
    pub handle: ElementHandle,
    /// Canonical indices of the two nodes.
    pub nodes: (usize, usize),
    /// Undeformed length.
    pub length: f64,
    /// Material volume, `area × length`.
    pub volume: f64,
    /// Mass, `density × volume`.
    pub mass: f64,
    /// Separation-change stress, see [`separation_stress`].
    pub stress: f64,
    /// Signed axial force, positive in tension.
    pub axial_force: f64,
    /// Signed axial stress, `axial_force / area`.
    pub axial_stress: f64,
    /// `stress / yield_stress`.
    pub utilization: f64,
    /// Whether `stress` exceeds the yield stress.
    pub yielded: bool,
    /// `yield_stress / stress`, infinite for an unstressed element.
    pub factor_of_safety: f64,
}

/// Aggregates over a whole truss.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct AnalysisTotals {
    /// Sum of element volumes.
    pub volume: f64,
    /// Sum of element stresses.
    pub stress: f64,
    /// Sum of the absolute values of every displacement component.
    pub displacement: f64,
    /// Sum of element masses.
    pub mass: f64,
    /// Element with the largest stress, if any element exists.
    #[serde(skip)]
    pub max_stress_element: Option<ElementHandle>,
    /// Whether any element exceeds its yield stress.
    pub any_yielded: bool,
}

/// Outcome of a successful pass.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnalysisResult {
    /// Per-node results in canonical order.
    pub nodes: Vec<NodeResult>,
    /// Per-element results in canonical order.
    pub elements: Vec<ElementResult>,
    /// Full `2n` displacement vector ordered `[x0, y0, x1, y1, ...]`.
    pub displacements: DVector<f64>,
    /// Aggregated quantities.
    pub totals: AnalysisTotals,
}

impl AnalysisResult {
    /// Result for a node.
    #[must_use]
    pub fn node(&self, node: NodeHandle) -> Option<&NodeResult> {
        self.nodes.iter().find(|result| result.handle == node)
    }

    /// Result for an element.
    #[must_use]
    pub fn element(&self, element: ElementHandle) -> Option<&ElementResult> {
        self.elements.iter().find(|result| result.handle == element)
    }

    /// Displacement of a node.
    #[must_use]
    pub fn displacement(&self, node: NodeHandle) -> Option<Displacement> {
        self.node(node).map(|result| result.displacement)
    }

    /// Stress in an element.
    #[must_use]
    pub fn stress(&self, element: ElementHandle) -> Option<f64> {
        self.element(element).map(|result| result.stress)
    }

    /// Volume of an element.
    #[must_use]
    pub fn volume(&self, element: ElementHandle) -> Option<f64> {
        self.element(element).map(|result| result.volume)
    }

    /// Serialise the result as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Propagates [`serde_json::Error`].
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Run the numerical part of a pass on a snapshot.
///
/// # Errors
///
/// Returns [`AnalysisError::InvalidTopology`] when strict support checking fails,
/// [`AnalysisError::DegenerateElement`] for zero-length elements and
/// [`AnalysisError::SingularSystem`] when the constrained structure is a mechanism and
/// [`AnalysisError::NonFiniteDisplacement`] when the solution overflows.
pub fn analyse(
    model: &AnalysisModel,
    config: &AnalysisConfig,
) -> Result<AnalysisResult, AnalysisError> {
    if config.require_support
        && !model.nodes.is_empty()
        && !model.nodes.iter().any(|node| node.fixed)
    {
        return Err(TopologyError::NoFixedNodes.into());
    }

    log::debug!(
        "{}: {} nodes, {} elements, {} degrees of freedom",
        AnalysisStage::AssembleGlobal,
        model.nodes.len(),
        model.elements.len(),
        model.dof_count()
    );
    let load = force_vector(model);
    let stiffness = global_stiffness(model)?;

    let partition = DofPartition::from_model(model);
    log::debug!(
        "{}: {} free, {} fixed degrees of freedom",
        AnalysisStage::Reduce,
        partition.reduced_len(),
        partition.fixed().len()
    );
    let reduced = partition.reduce(&stiffness, &load);

    let reduced_displacements = if reduced.is_empty() {
        log::debug!("{}: nothing to solve", AnalysisStage::Solve);
        DVector::zeros(0)
    } else {
        let size = reduced.load.len();
        log::debug!("{}: {}x{} system", AnalysisStage::Solve, size, size);
        lu::solve(&reduced.stiffness, &reduced.load, config.pivot_tolerance)?
    };

    log::debug!("{}", AnalysisStage::Expand);
    let displacements = partition.expand(&reduced_displacements);
    if let Some(dof) = displacements.iter().position(|value| !value.is_finite()) {
        return Err(AnalysisError::NonFiniteDisplacement { dof });
    }

    log::debug!("{}", AnalysisStage::DeriveResults);
    derive_results(model, displacements)
}

/// Compute per-node and per-element results from the full displacement vector.
fn derive_results(
    model: &AnalysisModel,
    displacements: DVector<f64>,
) -> Result<AnalysisResult, AnalysisError> {
    let nodes: Vec<NodeResult> = model
        .nodes
        .iter()
        .enumerate()
        .map(|(idx, node)| {
            let base = idx * DOF_PER_NODE;
            NodeResult {
                handle: node.handle,
                position: node.position,
                fixed: node.fixed,
                force: node.force,
                displacement: Displacement::new(displacements[base], displacements[base + 1]),
            }
        })
        .collect();

    let mut elements = Vec::with_capacity(model.elements.len());
    for element in &model.elements {
        let geometry = model.element_geometry(element)?;
        let properties = &element.properties;
        let (start, end) = (&nodes[element.nodes.0], &nodes[element.nodes.1]);

        let stress = separation_stress(
            properties.young_modulus,
            start.position,
            end.position,
            start.displaced_position(1.0),
            end.displaced_position(1.0),
        );
        let axial_force = geometry.axial_force(properties, start.displacement, end.displacement);
        let volume = geometry.volume(properties);
        let yielded = stress > properties.yield_stress;
        if yielded {
            log::warn!(
                "element {:?} exceeds its yield stress ({:e} > {:e})",
                element.handle,
                stress,
                properties.yield_stress
            );
        }
        elements.push(ElementResult {
            handle: element.handle,
            nodes: element.nodes,
            length: geometry.length,
            volume,
            mass: properties.density * volume,
            stress,
            axial_force,
            axial_stress: axial_force / properties.area,
            utilization: ratio(stress, properties.yield_stress),
            yielded,
            factor_of_safety: ratio(properties.yield_stress, stress),
        });
    }

    let totals = AnalysisTotals {
        volume: elements.iter().map(|element| element.volume).sum(),
        stress: elements.iter().map(|element| element.stress).sum(),
        displacement: nodes.iter().map(|node| node.displacement.abs_sum()).sum(),
        mass: elements.iter().map(|element| element.mass).sum(),
        max_stress_element: elements
            .iter()
            .max_by(|a, b| a.stress.total_cmp(&b.stress))
            .map(|element| element.handle),
        any_yielded: elements.iter().any(|element| element.yielded),
    };
    log::info!(
        "analysis complete: total volume {:e}, total stress {:e}, total displacement {:e}",
        totals.volume,
        totals.stress,
        totals.displacement
    );

    Ok(AnalysisResult {
        nodes,
        elements,
        displacements,
        totals,
    })
}

/// `numerator / denominator`, with `0 / 0 = 0` and `x / 0 = ∞`.
fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        if numerator == 0.0 {
            0.0
        } else {
            f64::INFINITY
        }
    } else {
        numerator / denominator
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::geometry::{force, point};
    use crate::store::{ElementProperties, TopologyStore};

    fn bar(load: Force, fixed_start: bool) -> (TopologyStore, NodeHandle, ElementHandle) {
        let mut store = TopologyStore::new();
        let a = store.add_node(point(0.0, 0.0), fixed_start).expect("node added");
        let b = store.add_node(point(2.0, 0.0), false).expect("node added");
        store.node_mut(b).expect("node").force = load;
        let ab = store
            .add_element(a, b, ElementProperties::new(200.0e9, 250.0e6, 7850.0, 0.01))
            .expect("valid element");
        (store, b, ab)
    }

    fn run(store: &TopologyStore) -> Result<AnalysisResult, AnalysisError> {
        let model = AnalysisModel::from_store(store).expect("consistent store");
        analyse(&model, &AnalysisConfig::default())
    }

    #[test]
    fn free_bar_without_lateral_support_is_singular() {
        let (store, _, _) = bar(force(1_000.0, 0.0), true);
        assert!(matches!(
            run(&store),
            Err(AnalysisError::SingularSystem { .. })
        ));
    }

    #[test]
    fn empty_model_produces_empty_result() {
        let result = run(&TopologyStore::new()).expect("nothing to solve");
        assert!(result.nodes.is_empty());
        assert_eq!(result.totals, AnalysisTotals::default());
    }

    #[test]
    fn fully_fixed_model_skips_the_solve() {
        let mut store = TopologyStore::new();
        let a = store.add_node(point(0.0, 0.0), true).expect("node added");
        let b = store.add_node(point(3.0, 4.0), true).expect("node added");
        store.node_mut(b).expect("node").force = force(10.0, 10.0);
        let ab = store
            .add_element(a, b, ElementProperties::default())
            .expect("valid element");
        let result = run(&store).expect("nothing to solve");
        assert_eq!(result.displacements, DVector::zeros(4));
        assert_eq!(result.stress(ab), Some(0.0));
        assert_relative_eq!(result.totals.volume, 5.0);
    }

    #[test]
    fn strict_support_check_rejects_unsupported_trusses() {
        let (store, _, _) = bar(force(0.0, 0.0), false);
        let model = AnalysisModel::from_store(&store).expect("consistent store");
        let config = AnalysisConfig {
            require_support: true,
            ..AnalysisConfig::default()
        };
        assert_eq!(
            analyse(&model, &config),
            Err(AnalysisError::InvalidTopology(TopologyError::NoFixedNodes))
        );
    }

    #[test]
    fn triangle_derives_consistent_results() {
        let mut store = TopologyStore::new();
        let a = store.add_node(point(0.0, 0.0), true).expect("node added");
        let b = store.add_node(point(4.0, 0.0), true).expect("node added");
        let c = store.add_node(point(2.0, 2.0), false).expect("node added");
        store.node_mut(c).expect("node").force = force(0.0, -1_000.0);
        let properties = ElementProperties::new(200.0e9, 250.0e6, 7850.0, 1.0e-4);
        let ac = store.add_element(a, c, properties).expect("valid element");
        let bc = store.add_element(b, c, properties).expect("valid element");

        let result = run(&store).expect("stable structure");
        let displacement = result.displacement(c).expect("node result");
        assert!(displacement.y < 0.0);
        assert_relative_eq!(displacement.x, 0.0, epsilon = 1.0e-15);

        let left = result.element(ac).expect("element result");
        let right = result.element(bc).expect("element result");
        assert_relative_eq!(left.axial_force, right.axial_force, max_relative = 1.0e-9);
        assert!(left.axial_force < 0.0);
        let expected_force = -1_000.0 / (2.0 * std::f64::consts::FRAC_1_SQRT_2);
        assert_relative_eq!(left.axial_force, expected_force, max_relative = 1.0e-9);
        assert_relative_eq!(left.mass, 7850.0 * left.volume);
        assert_relative_eq!(
            result.totals.displacement,
            displacement.abs_sum(),
            max_relative = 1.0e-12
        );
        assert_eq!(result.displacement(a), Some(Displacement::default()));
    }

    #[test]
    fn overflowing_displacements_are_reported_by_degree_of_freedom() {
        let mut store = TopologyStore::new();
        let a = store.add_node(point(0.0, 0.0), true).expect("node added");
        let b = store.add_node(point(1.0, 0.0), false).expect("node added");
        let c = store.add_node(point(1.0, -1.0), true).expect("node added");
        store.node_mut(b).expect("node").force = force(1.0e300, 0.0);
        let soft = ElementProperties::new(1.0e-300, 0.0, 0.0, 1.0);
        store.add_element(a, b, soft).expect("valid element");
        store.add_element(c, b, soft).expect("valid element");

        assert_eq!(
            run(&store),
            Err(AnalysisError::NonFiniteDisplacement { dof: 2 })
        );
    }

    #[test]
    fn stage_labels_start_and_end_at_idle() {
        let labels: Vec<String> = [
            AnalysisStage::Idle,
            AnalysisStage::GatherInputs,
            AnalysisStage::Solve,
            AnalysisStage::DeriveResults,
        ]
        .iter()
        .map(ToString::to_string)
        .collect();
        assert_eq!(labels, ["idle", "gather inputs", "solve", "derive results"]);
    }

    #[test]
    fn ratio_handles_zero_denominators() {
        assert_eq!(ratio(0.0, 0.0), 0.0);
        assert_eq!(ratio(1.0, 0.0), f64::INFINITY);
        assert_eq!(ratio(1.0, 4.0), 0.25);
    }
}
