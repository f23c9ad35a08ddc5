#![warn(clippy::all)]
#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

pub mod analysis;
pub mod assembly;
pub mod config;
pub mod constraints;
pub mod element;
pub mod errors;
pub mod geometry;
pub mod lu;
pub mod materials;
pub mod model;
pub mod report;
pub mod store;
pub mod truss;

pub use analysis::{
    AnalysisResult, AnalysisStage, AnalysisTotals, ElementResult, NodeResult,
};
pub use config::AnalysisConfig;
pub use errors::{
    AnalysisError, LoadError, PropertyError, SolveError, TopologyError, TrussEditError,
};
pub use geometry::{displacement, force, point, Displacement, Force, Point};
pub use materials::{Material, MaterialCatalog};
pub use model::{BuiltTruss, TrussModel};
pub use report::render_report;
pub use store::{ElementHandle, ElementProperties, NodeHandle};
pub use truss::{AnalysisInputs, Truss, UniformInputs};
