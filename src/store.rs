//! Arena-owned storage for nodes, elements and their connectivity.
//!
//! Nodes and elements live in an undirected [`StableGraph`] so that removing one
//! entry never shifts the indices of the others. Handles pair the graph index with a
//! generation counter: once an entry is removed, its handle stays invalid even if
//! the graph later reuses the slot.

use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableUnGraph};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

use crate::errors::{PropertyError, TrussEditError};
use crate::geometry::{Force, Point};

/// Stable reference to a node of a truss.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeHandle {
    index: NodeIndex,
    generation: u32,
}

impl NodeHandle {
    /// Slot index of the node inside its store.
    #[must_use]
    pub fn index(self) -> usize {
        self.index.index()
    }
}

/// Stable reference to an element of a truss.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementHandle {
    index: EdgeIndex,
    generation: u32,
}

impl ElementHandle {
    /// Slot index of the element inside its store.
    #[must_use]
    pub fn index(self) -> usize {
        self.index.index()
    }
}

/// Material and cross-section properties of an element.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElementProperties {
    /// Young's modulus of the material.
    pub young_modulus: f64,
    /// Stress at which the material yields.
    pub yield_stress: f64,
    /// Mass per unit volume. Not used by the stiffness or stress computations.
    #[serde(default)]
    pub density: f64,
    /// Cross-sectional area.
    pub area: f64,
}

impl Default for ElementProperties {
    /// The first preset of the built-in material catalogue with a unit area.
    fn default() -> Self {
        Self {
            young_modulus: 200_000.0,
            yield_stress: 1_000_000.0,
            density: 0.0,
            area: 1.0,
        }
    }
}

impl ElementProperties {
    /// Create a property set from its four components.
    #[must_use]
    pub const fn new(young_modulus: f64, yield_stress: f64, density: f64, area: f64) -> Self {
        Self {
            young_modulus,
            yield_stress,
            density,
            area,
        }
    }

    /// Check that the values describe a physically meaningful element.
    ///
    /// # Errors
    ///
    /// Returns the first [`PropertyError`] found.
    pub fn validate(&self) -> Result<(), PropertyError> {
        let values = [self.young_modulus, self.yield_stress, self.density, self.area];
        if values.iter().any(|value| !value.is_finite()) {
            return Err(PropertyError::NonFinite);
        }
        if self.area <= 0.0 {
            return Err(PropertyError::NonPositiveArea(self.area));
        }
        if self.young_modulus <= 0.0 {
            return Err(PropertyError::NonPositiveYoungModulus(self.young_modulus));
        }
        if self.yield_stress < 0.0 {
            return Err(PropertyError::NegativeYieldStress(self.yield_stress));
        }
        if self.density < 0.0 {
            return Err(PropertyError::NegativeDensity(self.density));
        }
        Ok(())
    }
}

/// A pin joint of the truss.
#[derive(Clone, Debug)]
pub struct Node {
    /// Undeformed position.
    pub position: Point,
    /// Whether both translational degrees of freedom are restrained.
    pub fixed: bool,
    /// External load applied to the node.
    pub force: Force,
    generation: u32,
}

/// A two-force member connecting two distinct nodes.
#[derive(Clone, Debug)]
pub struct Element {
    /// Material and cross-section properties.
    pub properties: ElementProperties,
    generation: u32,
}

/// Nodes and elements in a single arena with a canonical insertion order.
#[derive(Clone, Debug, Default)]
pub struct TopologyStore {
    /// Connectivity and payloads.
    graph: StableUnGraph<Node, Element>,
    /// Live nodes in insertion order; this is the degree-of-freedom order.
    node_order: Vec<NodeIndex>,
    /// Live elements in insertion order.
    element_order: Vec<EdgeIndex>,
    /// Counter stamped onto every new entry.
    next_generation: u32,
}

impl TopologyStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.node_order.len()
    }

    /// Number of live elements.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.element_order.len()
    }

    /// Next generation stamp; every node and element gets a distinct one.
    fn stamp(&mut self) -> u32 {
        let generation = self.next_generation;
        self.next_generation = self.next_generation.wrapping_add(1);
        generation
    }

    /// Insert a node and return its handle.
    ///
    /// # Errors
    ///
    /// Returns [`TrussEditError::NonFinitePosition`] when a coordinate is NaN or infinite.
    pub fn add_node(
        &mut self,
        position: Point,
        fixed: bool,
    ) -> Result<NodeHandle, TrussEditError> {
        if !position.is_finite() {
            return Err(TrussEditError::NonFinitePosition(position));
        }
        let generation = self.stamp();
        let index = self.graph.add_node(Node {
            position,
            fixed,
            force: Force::default(),
            generation,
        });
        self.node_order.push(index);
        Ok(NodeHandle { index, generation })
    }

    /// Remove a node together with every element attached to it.
    ///
    /// Returns the handles of the cascaded elements.
    ///
    /// # Errors
    ///
    /// Returns [`TrussEditError::UnknownNode`] when `node` is not part of this store.
    pub fn remove_node(&mut self, node: NodeHandle) -> Result<Vec<ElementHandle>, TrussEditError> {
        self.node(node).ok_or(TrussEditError::UnknownNode(node))?;
        let attached: Vec<ElementHandle> = self
            .graph
            .edges(node.index)
            .map(|edge| ElementHandle {
                index: edge.id(),
                generation: edge.weight().generation,
            })
            .collect();
        for element in &attached {
            self.graph.remove_edge(element.index);
        }
        self.element_order
            .retain(|index| attached.iter().all(|element| element.index != *index));
        self.graph.remove_node(node.index);
        self.node_order.retain(|index| *index != node.index);
        Ok(attached)
    }

    /// Connect two distinct nodes with a new element.
    ///
    /// # Errors
    ///
    /// Returns [`TrussEditError::UnknownNode`] for a missing endpoint,
    /// [`TrussEditError::CoincidentEndpoints`] when `start == end` and
    /// [`TrussEditError::InvalidProperties`] when `properties` fail validation.
    pub fn add_element(
        &mut self,
        start: NodeHandle,
        end: NodeHandle,
        properties: ElementProperties,
    ) -> Result<ElementHandle, TrussEditError> {
        self.node(start).ok_or(TrussEditError::UnknownNode(start))?;
        self.node(end).ok_or(TrussEditError::UnknownNode(end))?;
        if start == end {
            return Err(TrussEditError::CoincidentEndpoints(start));
        }
        properties.validate()?;
        let generation = self.stamp();
        let index = self.graph.add_edge(
            start.index,
            end.index,
            Element {
                properties,
                generation,
            },
        );
        self.element_order.push(index);
        Ok(ElementHandle { index, generation })
    }

    /// Remove a single element.
    ///
    /// # Errors
    ///
    /// Returns [`TrussEditError::UnknownElement`] when `element` is not part of this store.
    pub fn remove_element(&mut self, element: ElementHandle) -> Result<(), TrussEditError> {
        self.element(element)
            .ok_or(TrussEditError::UnknownElement(element))?;
        self.graph.remove_edge(element.index);
        self.element_order.retain(|index| *index != element.index);
        Ok(())
    }

    /// Look up a node.
    #[must_use]
    pub fn node(&self, node: NodeHandle) -> Option<&Node> {
        self.graph
            .node_weight(node.index)
            .filter(|weight| weight.generation == node.generation)
    }

    /// Look up a node for modification.
    pub fn node_mut(&mut self, node: NodeHandle) -> Option<&mut Node> {
        self.graph
            .node_weight_mut(node.index)
            .filter(|weight| weight.generation == node.generation)
    }

    /// Look up an element.
    #[must_use]
    pub fn element(&self, element: ElementHandle) -> Option<&Element> {
        self.graph
            .edge_weight(element.index)
            .filter(|weight| weight.generation == element.generation)
    }

    /// Look up an element for modification.
    pub fn element_mut(&mut self, element: ElementHandle) -> Option<&mut Element> {
        self.graph
            .edge_weight_mut(element.index)
            .filter(|weight| weight.generation == element.generation)
    }

    /// The two nodes an element connects, in the order they were given.
    #[must_use]
    pub fn element_nodes(&self, element: ElementHandle) -> Option<(NodeHandle, NodeHandle)> {
        self.element(element)?;
        let (start, end) = self.graph.edge_endpoints(element.index)?;
        Some((self.node_handle(start)?, self.node_handle(end)?))
    }

    /// Rebuild the handle of a live node from its graph index.
    fn node_handle(&self, index: NodeIndex) -> Option<NodeHandle> {
        self.graph.node_weight(index).map(|weight| NodeHandle {
            index,
            generation: weight.generation,
        })
    }

    /// Live nodes in canonical (insertion) order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeHandle, &Node)> + '_ {
        self.node_order.iter().filter_map(move |&index| {
            self.graph.node_weight(index).map(|weight| {
                (
                    NodeHandle {
                        index,
                        generation: weight.generation,
                    },
                    weight,
                )
            })
        })
    }

    /// Live elements in canonical (insertion) order.
    pub fn elements(&self) -> impl Iterator<Item = (ElementHandle, &Element)> + '_ {
        self.element_order.iter().filter_map(move |&index| {
            self.graph.edge_weight(index).map(|weight| {
                (
                    ElementHandle {
                        index,
                        generation: weight.generation,
                    },
                    weight,
                )
            })
        })
    }

    /// Handles of all live nodes in canonical order.
    #[must_use]
    pub fn node_handles(&self) -> Vec<NodeHandle> {
        self.nodes().map(|(handle, _)| handle).collect()
    }

    /// Handles of all live elements in canonical order.
    #[must_use]
    pub fn element_handles(&self) -> Vec<ElementHandle> {
        self.elements().map(|(handle, _)| handle).collect()
    }
}
