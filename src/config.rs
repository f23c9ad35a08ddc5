//! Tunable parameters of an analysis pass.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::LoadError;

/// Settings that control how a pass is carried out.
///
/// Every field has a default, so a configuration file only needs to name the values it
/// changes.
///
/// # Examples
/// ```
/// use truss2d::AnalysisConfig;
///
/// let config = AnalysisConfig::from_json_str(r#"{ "force_scale": 1000.0 }"#).unwrap();
/// assert_eq!(config.force_scale, 1000.0);
/// assert!(!config.require_support);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Relative pivot threshold of the LU solver, measured against each row's diagonal.
    pub pivot_tolerance: f64,
    /// Fail with a topology error when nodes exist but none is fixed.
    pub require_support: bool,
    /// Multiplier applied to forces gathered from an input source.
    pub force_scale: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            pivot_tolerance: 1.0e-10,
            require_support: false,
            force_scale: 1.0,
        }
    }
}

impl AnalysisConfig {
    /// Parse a configuration from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Json`] for malformed input.
    pub fn from_json_str(text: &str) -> Result<Self, LoadError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Io`] when the file cannot be read and [`LoadError::Json`]
    /// for malformed contents.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        Self::from_json_str(&read_to_string(path.as_ref())?)
    }
}

/// Read a whole file, attaching the path to any I/O error.
pub(crate) fn read_to_string(path: &Path) -> Result<String, LoadError> {
    std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })
}
