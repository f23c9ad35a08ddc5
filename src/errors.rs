//! Error types produced while editing or analysing trusses.

use thiserror::Error;

use crate::geometry::{Force, Point};
use crate::store::{ElementHandle, NodeHandle};

/// Error returned when an analysis pass fails.
///
/// A failed pass never produces partial results; the previous successful result stays
/// available through [`Truss::last_result`](crate::Truss::last_result).
#[derive(Clone, Debug, Error, PartialEq)]
pub enum AnalysisError {
    /// Returned when an element spans zero distance, leaving its direction undefined.
    #[error("element {0:?} has zero length")]
    DegenerateElement(ElementHandle),
    /// Returned when the reduced stiffness matrix has a near-zero pivot.
    #[error(
        "reduced stiffness matrix is singular at row {row} (pivot {pivot:e}); \
         the structure is an unstable mechanism or under-constrained"
    )]
    SingularSystem {
        /// Row of the reduced system where elimination broke down.
        row: usize,
        /// Offending pivot value.
        pivot: f64,
    },
    /// Returned when the node/element topology cannot be analysed.
    #[error("invalid topology: {0}")]
    InvalidTopology(#[from] TopologyError),
    /// Returned when gathered element properties are not physically meaningful.
    #[error("element {element:?} has invalid properties: {source}")]
    InvalidProperties {
        /// Identifier of the offending element.
        element: ElementHandle,
        /// Description of the invalid property.
        #[source]
        source: PropertyError,
    },
    /// Returned when a gathered load has a NaN or infinite component after scaling.
    #[error("node {node:?} received a non-finite load {force:?}")]
    NonFiniteForce {
        /// Node the load was meant for.
        node: NodeHandle,
        /// Offending load, after the configured force scale was applied.
        force: Force,
    },
    /// Returned when the solved displacements overflow despite finite inputs.
    #[error(
        "displacement of degree of freedom {dof} is not finite; \
         the structure is too soft for the applied loads"
    )]
    NonFiniteDisplacement {
        /// Index into the full `[x0, y0, x1, y1, ...]` displacement vector.
        dof: usize,
    },
    /// Returned when the assembled system has inconsistent dimensions.
    #[error("inconsistent linear system: {0}")]
    MalformedSystem(SolveError),
}

impl From<SolveError> for AnalysisError {
    fn from(value: SolveError) -> Self {
        match value {
            SolveError::ZeroPivot { row, pivot } => AnalysisError::SingularSystem { row, pivot },
            mismatch @ SolveError::DimensionMismatch { .. } => {
                AnalysisError::MalformedSystem(mismatch)
            }
        }
    }
}

/// Structural problems detected before any matrix is assembled.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum TopologyError {
    /// An element refers to a node that is no longer part of the truss.
    #[error("element {0:?} references a node that no longer exists")]
    DanglingElement(ElementHandle),
    /// Strict support checking is enabled and no node is fixed.
    #[error("no node is fixed, so the structure is free to translate")]
    NoFixedNodes,
}

/// Reasons an element property set is rejected.
///
/// The variants describe why the supplied value is refused so callers can present
/// actionable feedback to users.
#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum PropertyError {
    /// The cross-sectional area is zero or negative.
    #[error("area must be positive (received {0})")]
    NonPositiveArea(f64),
    /// The Young's modulus is zero or negative.
    #[error("Young's modulus must be positive (received {0})")]
    NonPositiveYoungModulus(f64),
    /// The yield stress is negative.
    #[error("yield stress must not be negative (received {0})")]
    NegativeYieldStress(f64),
    /// The density is negative.
    #[error("density must not be negative (received {0})")]
    NegativeDensity(f64),
    /// One of the values is NaN or infinite.
    #[error("property values must be finite")]
    NonFinite,
}

/// Error returned when editing a [`Truss`](crate::Truss) with invalid handles or values.
///
/// # Examples
///
/// ```
/// use truss2d::{point, ElementProperties, Truss, TrussEditError};
///
/// let mut truss = Truss::new();
/// let a = truss.add_node(point(0.0, 0.0), true).unwrap();
/// let error = truss
///     .add_element(a, a, ElementProperties::default())
///     .expect_err("an element needs two distinct nodes");
/// assert_eq!(error, TrussEditError::CoincidentEndpoints(a));
/// ```
#[derive(Clone, Debug, Error, PartialEq)]
pub enum TrussEditError {
    /// Returned when a node cannot be found in the truss.
    #[error("node {0:?} does not exist in this truss")]
    UnknownNode(NodeHandle),
    /// Returned when an element cannot be found in the truss.
    #[error("element {0:?} does not exist in this truss")]
    UnknownElement(ElementHandle),
    /// Returned when both ends of a new element are the same node.
    #[error("element would connect node {0:?} to itself")]
    CoincidentEndpoints(NodeHandle),
    /// Returned when a node position has a NaN or infinite coordinate.
    #[error("node position {0:?} is not finite")]
    NonFinitePosition(Point),
    /// Returned when a load has a NaN or infinite component.
    #[error("load {0:?} is not finite")]
    NonFiniteForce(Force),
    /// Returned when the supplied element properties are invalid.
    #[error("{0}")]
    InvalidProperties(#[from] PropertyError),
}

/// Failure of the dense LU solver.
#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum SolveError {
    /// A pivot fell below the configured tolerance during decomposition.
    #[error("zero pivot {pivot:e} at row {row}")]
    ZeroPivot {
        /// Row of the pivot.
        row: usize,
        /// Value of the pivot.
        pivot: f64,
    },
    /// The matrix is not square or the right-hand side has the wrong length.
    #[error("cannot solve a {rows}x{cols} system with a right-hand side of length {rhs}")]
    DimensionMismatch {
        /// Matrix rows.
        rows: usize,
        /// Matrix columns.
        cols: usize,
        /// Right-hand side length.
        rhs: usize,
    },
}

/// Error raised while loading configuration, catalogues or model files.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path that failed.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The contents were not valid JSON for the expected type.
    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// A model element refers to a node index outside the node list.
    #[error("element {element} refers to node index {node}, but only {count} nodes are defined")]
    NodeIndexOutOfRange {
        /// Position of the element in the model file.
        element: usize,
        /// Offending node index.
        node: usize,
        /// Number of nodes in the model.
        count: usize,
    },
    /// A model element names a material that is not in the catalogue.
    #[error("element {element} uses unknown material {material:?}")]
    UnknownMaterial {
        /// Position of the element in the model file.
        element: usize,
        /// Material name that could not be resolved.
        material: String,
    },
    /// A model element carries neither a material nor explicit properties.
    #[error("element {0} needs either a material or explicit properties")]
    MissingProperties(usize),
    /// Building the truss from the model was rejected.
    #[error(transparent)]
    Edit(#[from] TrussEditError),
}
