//! The editable truss model and the entry point for analysis passes.

use crate::analysis::{analyse, AnalysisResult, AnalysisStage};
use crate::assembly::AnalysisModel;
use crate::config::AnalysisConfig;
use crate::errors::{AnalysisError, TrussEditError};
use crate::geometry::{Force, Point};
use crate::store::{ElementHandle, ElementProperties, NodeHandle, TopologyStore};

/// Source of loads and element properties consulted at the start of a pass.
///
/// This is the seam to whatever front end holds the user's current inputs. Returning
/// `None` keeps the value already stored in the truss.
pub trait AnalysisInputs {
    /// Force to apply at `node`, before [`AnalysisConfig::force_scale`] is applied.
    fn node_force(&self, _node: NodeHandle) -> Option<Force> {
        None
    }

    /// Properties to assign to `element`.
    fn element_properties(&self, _element: ElementHandle) -> Option<ElementProperties> {
        None
    }
}

/// Applies the same force to every node and the same properties to every element.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct UniformInputs {
    /// Force for every node.
    pub force: Option<Force>,
    /// Properties for every element.
    pub properties: Option<ElementProperties>,
}

impl AnalysisInputs for UniformInputs {
    fn node_force(&self, _node: NodeHandle) -> Option<Force> {
        self.force
    }

    fn element_properties(&self, _element: ElementHandle) -> Option<ElementProperties> {
        self.properties
    }
}

/// A planar pin-jointed truss together with its latest analysis result.
///
/// Every edit marks the stored result as stale; a failed pass also marks it stale but
/// never replaces it. Passes borrow the truss mutably, so the topology cannot change
/// while one is running.
#[derive(Clone, Debug, Default)]
pub struct Truss {
    /// Nodes, elements and connectivity.
    store: TopologyStore,
    /// Settings used by every pass.
    config: AnalysisConfig,
    /// Result of the last successful pass.
    last_result: Option<AnalysisResult>,
    /// Whether `last_result` reflects the current model.
    results_current: bool,
}

impl Truss {
    /// Create an empty truss.
    ///
    /// # Examples
    /// ```
    /// use truss2d::Truss;
    ///
    /// let truss = Truss::new();
    /// assert_eq!(truss.node_count(), 0);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty truss with explicit settings.
    #[must_use]
    pub fn with_config(config: AnalysisConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Settings used by analysis passes.
    #[must_use]
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Replace the analysis settings.
    pub fn set_config(&mut self, config: AnalysisConfig) {
        self.invalidate();
        self.config = config;
    }

    /// Read-only access to the underlying store.
    #[must_use]
    pub fn store(&self) -> &TopologyStore {
        &self.store
    }

    /// Return the number of nodes in the truss.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.store.node_count()
    }

    /// Return the number of elements in the truss.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.store.element_count()
    }

    /// Node handles in canonical order.
    #[must_use]
    pub fn nodes(&self) -> Vec<NodeHandle> {
        self.store.node_handles()
    }

    /// Element handles in canonical order.
    #[must_use]
    pub fn elements(&self) -> Vec<ElementHandle> {
        self.store.element_handles()
    }

    /// Add a new node to the truss.
    ///
    /// # Examples
    /// ```
    /// use truss2d::{point, Truss};
    ///
    /// let mut truss = Truss::new();
    /// let node = truss.add_node(point(0.0, 0.0), true).unwrap();
    /// assert_eq!(truss.node_count(), 1);
    /// assert_eq!(truss.node_is_fixed(node), Some(true));
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`TrussEditError::NonFinitePosition`] when a coordinate is NaN or infinite.
    pub fn add_node(
        &mut self,
        position: Point,
        fixed: bool,
    ) -> Result<NodeHandle, TrussEditError> {
        let node = self.store.add_node(position, fixed)?;
        self.invalidate();
        Ok(node)
    }

    /// Remove a node and every element attached to it, returning the removed elements.
    ///
    /// # Errors
    ///
    /// Returns [`TrussEditError::UnknownNode`] when `node` is not part of this truss.
    pub fn remove_node(&mut self, node: NodeHandle) -> Result<Vec<ElementHandle>, TrussEditError> {
        let removed = self.store.remove_node(node)?;
        self.invalidate();
        Ok(removed)
    }

    /// Update the position of an existing node.
    ///
    /// # Errors
    ///
    /// Returns [`TrussEditError::UnknownNode`] when `node` is not part of this truss and
    /// [`TrussEditError::NonFinitePosition`] when a coordinate is NaN or infinite.
    pub fn move_node(&mut self, node: NodeHandle, position: Point) -> Result<(), TrussEditError> {
        if !position.is_finite() {
            return Err(TrussEditError::NonFinitePosition(position));
        }
        self.node_mut(node)?.position = position;
        Ok(())
    }

    /// Fix or release both degrees of freedom of a node.
    ///
    /// # Errors
    ///
    /// Returns [`TrussEditError::UnknownNode`] when `node` is not part of this truss.
    pub fn set_node_fixed(&mut self, node: NodeHandle, fixed: bool) -> Result<(), TrussEditError> {
        self.node_mut(node)?.fixed = fixed;
        Ok(())
    }

    /// Apply a load to a node.
    ///
    /// # Errors
    ///
    /// Returns [`TrussEditError::UnknownNode`] when `node` is not part of this truss and
    /// [`TrussEditError::NonFiniteForce`] when a component is NaN or infinite.
    pub fn set_node_force(&mut self, node: NodeHandle, force: Force) -> Result<(), TrussEditError> {
        if !force.is_finite() {
            return Err(TrussEditError::NonFiniteForce(force));
        }
        self.node_mut(node)?.force = force;
        Ok(())
    }

    /// Undeformed position of a node.
    #[must_use]
    pub fn node_position(&self, node: NodeHandle) -> Option<Point> {
        self.store.node(node).map(|node| node.position)
    }

    /// Load applied to a node.
    #[must_use]
    pub fn node_force(&self, node: NodeHandle) -> Option<Force> {
        self.store.node(node).map(|node| node.force)
    }

    /// Whether a node is fixed.
    #[must_use]
    pub fn node_is_fixed(&self, node: NodeHandle) -> Option<bool> {
        self.store.node(node).map(|node| node.fixed)
    }

    /// Connect two nodes with a new element.
    ///
    /// # Errors
    ///
    /// Returns [`TrussEditError::UnknownNode`] for a missing endpoint,
    /// [`TrussEditError::CoincidentEndpoints`] when both handles are equal and
    /// [`TrussEditError::InvalidProperties`] for unphysical properties.
    pub fn add_element(
        &mut self,
        start: NodeHandle,
        end: NodeHandle,
        properties: ElementProperties,
    ) -> Result<ElementHandle, TrussEditError> {
        let element = self.store.add_element(start, end, properties)?;
        self.invalidate();
        Ok(element)
    }

    /// Remove an element from the truss.
    ///
    /// # Errors
    ///
    /// Returns [`TrussEditError::UnknownElement`] when `element` is not part of this truss.
    pub fn remove_element(&mut self, element: ElementHandle) -> Result<(), TrussEditError> {
        self.store.remove_element(element)?;
        self.invalidate();
        Ok(())
    }

    /// Replace the properties of an element.
    ///
    /// # Errors
    ///
    /// Returns [`TrussEditError::UnknownElement`] when `element` is not part of this truss
    /// and [`TrussEditError::InvalidProperties`] when `properties` fail validation.
    ///
    /// # Examples
    /// ```
    /// use truss2d::{point, ElementProperties, PropertyError, Truss, TrussEditError};
    ///
    /// let mut truss = Truss::new();
    /// let a = truss.add_node(point(0.0, 0.0), true).unwrap();
    /// let b = truss.add_node(point(1.0, 0.0), false).unwrap();
    /// let element = truss.add_element(a, b, ElementProperties::default()).unwrap();
    ///
    /// let invalid = ElementProperties { area: 0.0, ..ElementProperties::default() };
    /// let error = truss
    ///     .set_element_properties(element, invalid)
    ///     .expect_err("invalid area rejected");
    /// assert_eq!(
    ///     error,
    ///     TrussEditError::InvalidProperties(PropertyError::NonPositiveArea(0.0))
    /// );
    /// ```
    pub fn set_element_properties(
        &mut self,
        element: ElementHandle,
        properties: ElementProperties,
    ) -> Result<(), TrussEditError> {
        if self.store.element(element).is_none() {
            return Err(TrussEditError::UnknownElement(element));
        }
        properties.validate()?;
        self.invalidate();
        if let Some(edge) = self.store.element_mut(element) {
            edge.properties = properties;
        }
        Ok(())
    }

    /// Properties of an element.
    #[must_use]
    pub fn element_properties(&self, element: ElementHandle) -> Option<ElementProperties> {
        self.store.element(element).map(|element| element.properties)
    }

    /// The two nodes an element connects.
    #[must_use]
    pub fn element_nodes(&self, element: ElementHandle) -> Option<(NodeHandle, NodeHandle)> {
        self.store.element_nodes(element)
    }

    /// Result of the most recent successful pass, if any.
    ///
    /// Check [`Truss::results_current`] to learn whether it still matches the model.
    #[must_use]
    pub fn last_result(&self) -> Option<&AnalysisResult> {
        self.last_result.as_ref()
    }

    /// Whether [`Truss::last_result`] reflects the current model.
    #[must_use]
    pub fn results_current(&self) -> bool {
        self.results_current && self.last_result.is_some()
    }

    /// Analyse the truss with the loads and properties stored in it.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError`] when the structure cannot be solved. The previous
    /// result is kept but marked stale.
    pub fn run_analysis(&mut self) -> Result<&AnalysisResult, AnalysisError> {
        self.run_pass()
    }

    /// Pull current loads and properties from `inputs`, then analyse.
    ///
    /// Gathered forces are multiplied by [`AnalysisConfig::force_scale`]. Gathered
    /// properties are validated before anything is written, so a rejected property
    /// set leaves the truss unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::NonFiniteForce`] when a scaled load is NaN or infinite,
    /// [`AnalysisError::InvalidProperties`] for rejected properties and otherwise
    /// behaves like [`Truss::run_analysis`].
    pub fn run_analysis_with<I>(&mut self, inputs: &I) -> Result<&AnalysisResult, AnalysisError>
    where
        I: AnalysisInputs + ?Sized,
    {
        log::debug!("{}", AnalysisStage::GatherInputs);
        if let Err(error) = self.gather_inputs(inputs) {
            log::warn!("analysis aborted: {error}");
            log::debug!("{}", AnalysisStage::Idle);
            self.results_current = false;
            return Err(error);
        }
        self.run_pass()
    }

    /// Validate everything `inputs` provides, then write it into the store.
    fn gather_inputs<I>(&mut self, inputs: &I) -> Result<(), AnalysisError>
    where
        I: AnalysisInputs + ?Sized,
    {
        let scale = self.config.force_scale;
        let mut forces = Vec::new();
        for node in self.store.node_handles() {
            if let Some(gathered) = inputs.node_force(node) {
                let force = gathered.scaled(scale);
                if !force.is_finite() {
                    return Err(AnalysisError::NonFiniteForce { node, force });
                }
                forces.push((node, force));
            }
        }
        let mut properties = Vec::new();
        for element in self.store.element_handles() {
            if let Some(gathered) = inputs.element_properties(element) {
                gathered
                    .validate()
                    .map_err(|source| AnalysisError::InvalidProperties { element, source })?;
                properties.push((element, gathered));
            }
        }

        if !forces.is_empty() || !properties.is_empty() {
            self.invalidate();
        }
        for (node, force) in forces {
            if let Some(weight) = self.store.node_mut(node) {
                weight.force = force;
            }
        }
        for (element, gathered) in properties {
            if let Some(weight) = self.store.element_mut(element) {
                weight.properties = gathered;
            }
        }
        Ok(())
    }

    /// Snapshot the store, analyse it and record the outcome.
    fn run_pass(&mut self) -> Result<&AnalysisResult, AnalysisError> {
        let outcome = AnalysisModel::from_store(&self.store)
            .map_err(AnalysisError::from)
            .and_then(|model| analyse(&model, &self.config));
        log::debug!("{}", AnalysisStage::Idle);
        match outcome {
            Ok(result) => {
                self.results_current = true;
                Ok(&*self.last_result.insert(result))
            }
            Err(error) => {
                log::warn!("analysis aborted: {error}");
                self.results_current = false;
                Err(error)
            }
        }
    }

    /// Mutable access to a node for an edit; marks results stale.
    fn node_mut(&mut self, node: NodeHandle) -> Result<&mut crate::store::Node, TrussEditError> {
        if self.store.node(node).is_none() {
            return Err(TrussEditError::UnknownNode(node));
        }
        self.invalidate();
        self.store
            .node_mut(node)
            .ok_or(TrussEditError::UnknownNode(node))
    }

    /// Mark the stored result as stale after a change.
    fn invalidate(&mut self) {
        self.results_current = false;
    }
}
