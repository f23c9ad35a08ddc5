//! Catalogue of material presets offered to a front end.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::read_to_string;
use crate::errors::LoadError;
use crate::store::ElementProperties;

/// A named material.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Name shown to the user.
    pub name: String,
    /// Young's modulus.
    pub young_modulus: f64,
    /// Yield stress.
    pub yield_stress: f64,
    /// Mass per unit volume.
    #[serde(default)]
    pub density: f64,
}

impl Material {
    /// Element properties for this material with the given cross-sectional area.
    #[must_use]
    pub fn properties(&self, area: f64) -> ElementProperties {
        ElementProperties::new(self.young_modulus, self.yield_stress, self.density, area)
    }
}

/// Built-in presets as `(young_modulus, yield_stress)` pairs, in selector order.
const PRESETS: [(f64, f64); 8] = [
    (200_000.0, 1_000_000.0),
    (5_000.0, 70_000.0),
    (180_000.0, 790_000.0),
    (30_000.0, 60_000.0),
    (15_000.0, 44_000.0),
    (10_000.0, 248_000.0),
    (150_000.0, 3_460_000.0),
    (50.0, 145_000.0),
];

/// Ordered list of materials, indexed like a dropdown selector.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaterialCatalog {
    materials: Vec<Material>,
}

impl MaterialCatalog {
    /// Wrap an explicit list of materials.
    #[must_use]
    pub fn new(materials: Vec<Material>) -> Self {
        Self { materials }
    }

    /// The eight built-in presets, named `material-1` to `material-8`.
    ///
    /// Presets carry no density.
    #[must_use]
    pub fn builtin() -> Self {
        let materials = PRESETS
            .iter()
            .enumerate()
            .map(|(idx, &(young_modulus, yield_stress))| Material {
                name: format!("material-{}", idx + 1),
                young_modulus,
                yield_stress,
                density: 0.0,
            })
            .collect();
        Self { materials }
    }

    /// Number of materials.
    #[must_use]
    pub fn len(&self) -> usize {
        self.materials.len()
    }

    /// Whether the catalogue has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    /// Material at a selector position.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Material> {
        self.materials.get(index)
    }

    /// Material with the given name.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&Material> {
        self.materials.iter().find(|material| material.name == name)
    }

    /// Iterate over the materials in order.
    pub fn iter(&self) -> impl Iterator<Item = &Material> {
        self.materials.iter()
    }

    /// Parse a catalogue from a JSON array of materials.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Json`] for malformed input.
    pub fn from_json_str(text: &str) -> Result<Self, LoadError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read a catalogue from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Io`] or [`LoadError::Json`].
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        Self::from_json_str(&read_to_string(path.as_ref())?)
    }
}
