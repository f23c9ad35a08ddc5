//! Assembly of the global load vector and stiffness matrix.
//!
//! Assembly works on an [`AnalysisModel`], a snapshot of the store taken at the start
//! of a pass. The snapshot fixes the canonical node order, so node `i` owns degrees of
//! freedom `2i` (x) and `2i + 1` (y) for the whole pass.

use std::collections::HashMap;

use nalgebra::{DMatrix, DVector, Matrix4};

use crate::element::ElementGeometry;
use crate::errors::{AnalysisError, TopologyError};
use crate::geometry::{Force, Point};
use crate::store::{ElementHandle, ElementProperties, NodeHandle, TopologyStore};

/// Degrees of freedom carried by every node.
pub const DOF_PER_NODE: usize = 2;

/// Node state captured for one analysis pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeInput {
    /// Handle of the node in the store.
    pub handle: NodeHandle,
    /// Undeformed position.
    pub position: Point,
    /// Whether both degrees of freedom are restrained.
    pub fixed: bool,
    /// Applied load.
    pub force: Force,
}

/// Element state captured for one analysis pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ElementInput {
    /// Handle of the element in the store.
    pub handle: ElementHandle,
    /// Canonical indices of the two nodes.
    pub nodes: (usize, usize),
    /// Material and cross-section properties.
    pub properties: ElementProperties,
}

/// Ordered snapshot of a truss used by every stage of a pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnalysisModel {
    /// Nodes in canonical order.
    pub nodes: Vec<NodeInput>,
    /// Elements in canonical order.
    pub elements: Vec<ElementInput>,
}

impl AnalysisModel {
    /// Capture the current contents of `store`.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::DanglingElement`] when an element refers to a node
    /// outside the canonical order.
    pub fn from_store(store: &TopologyStore) -> Result<Self, TopologyError> {
        let nodes: Vec<NodeInput> = store
            .nodes()
            .map(|(handle, node)| NodeInput {
                handle,
                position: node.position,
                fixed: node.fixed,
                force: node.force,
            })
            .collect();
        let index_map: HashMap<NodeHandle, usize> = nodes
            .iter()
            .enumerate()
            .map(|(idx, node)| (node.handle, idx))
            .collect();

        let mut elements = Vec::with_capacity(store.element_count());
        for (handle, element) in store.elements() {
            let (start, end) = store
                .element_nodes(handle)
                .ok_or(TopologyError::DanglingElement(handle))?;
            let start = *index_map
                .get(&start)
                .ok_or(TopologyError::DanglingElement(handle))?;
            let end = *index_map
                .get(&end)
                .ok_or(TopologyError::DanglingElement(handle))?;
            elements.push(ElementInput {
                handle,
                nodes: (start, end),
                properties: element.properties,
            });
        }
        Ok(Self { nodes, elements })
    }

    /// Size of the unreduced system, `2n`.
    #[must_use]
    pub fn dof_count(&self) -> usize {
        self.nodes.len() * DOF_PER_NODE
    }

    /// Undeformed geometry of an element.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::DegenerateElement`] when both nodes coincide and
    /// [`AnalysisError::InvalidTopology`] when a node index is out of range.
    pub fn element_geometry(&self, element: &ElementInput) -> Result<ElementGeometry, AnalysisError> {
        let (start, end) = self.element_positions(element)?;
        ElementGeometry::between(start, end)
            .ok_or(AnalysisError::DegenerateElement(element.handle))
    }

    /// Undeformed positions of both ends of `element`.
    fn element_positions(&self, element: &ElementInput) -> Result<(Point, Point), TopologyError> {
        let start = self
            .nodes
            .get(element.nodes.0)
            .ok_or(TopologyError::DanglingElement(element.handle))?;
        let end = self
            .nodes
            .get(element.nodes.1)
            .ok_or(TopologyError::DanglingElement(element.handle))?;
        Ok((start.position, end.position))
    }
}

/// Assemble the `2n` global load vector.
#[must_use]
pub fn force_vector(model: &AnalysisModel) -> DVector<f64> {
    let mut load = DVector::zeros(model.dof_count());
    for (idx, node) in model.nodes.iter().enumerate() {
        let base = idx * DOF_PER_NODE;
        load[base] = node.force.x;
        load[base + 1] = node.force.y;
    }
    load
}

/// Global degree-of-freedom indices of an element in `{x1, y1, x2, y2}` order.
#[must_use]
pub fn element_dofs(nodes: (usize, usize)) -> [usize; 4] {
    let start = nodes.0 * DOF_PER_NODE;
    let end = nodes.1 * DOF_PER_NODE;
    [start, start + 1, end, end + 1]
}

/// Add an element's local stiffness into the global matrix.
///
/// Contributions accumulate, so elements sharing a node sum into the shared blocks.
pub fn scatter_local(matrix: &mut DMatrix<f64>, nodes: (usize, usize), local: &Matrix4<f64>) {
    let dof_map = element_dofs(nodes);
    for (row_local, global_row) in dof_map.iter().enumerate() {
        for (col_local, global_col) in dof_map.iter().enumerate() {
            matrix[(*global_row, *global_col)] += local[(row_local, col_local)];
        }
    }
}

/// Assemble the `2n × 2n` global stiffness matrix.
///
/// # Errors
///
/// Returns [`AnalysisError::DegenerateElement`] for zero-length elements.
pub fn global_stiffness(model: &AnalysisModel) -> Result<DMatrix<f64>, AnalysisError> {
    let dof = model.dof_count();
    let mut matrix = DMatrix::zeros(dof, dof);
    for element in &model.elements {
        let geometry = model.element_geometry(element)?;
        let local = geometry.local_stiffness(&element.properties);
        log::trace!(
            "element {:?} spans nodes {:?} with L = {:e}, EA/L = {:e}",
            element.handle,
            element.nodes,
            geometry.length,
            geometry.axial_stiffness(&element.properties)
        );
        scatter_local(&mut matrix, element.nodes, &local);
    }
    Ok(matrix)
}
