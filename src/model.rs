//! JSON description of a complete truss, used by the command line tool.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::{read_to_string, AnalysisConfig};
use crate::errors::LoadError;
use crate::geometry::{point, Force};
use crate::materials::MaterialCatalog;
use crate::store::{ElementHandle, ElementProperties, NodeHandle};
use crate::truss::Truss;

/// A node entry of a model file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
    /// Whether the node is fixed.
    #[serde(default)]
    pub fixed: bool,
    /// Applied load.
    #[serde(default)]
    pub force: Force,
}

/// An element entry of a model file.
///
/// Properties come either from `properties` or from `material` plus `area`; explicit
/// properties win when both are present.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElementSpec {
    /// Index of the first node in the model's node list.
    pub start: usize,
    /// Index of the second node in the model's node list.
    pub end: usize,
    /// Name of a catalogue material.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    /// Cross-sectional area used with `material`.
    #[serde(default = "unit_area")]
    pub area: f64,
    /// Explicit properties.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<ElementProperties>,
}

/// Default cross-sectional area for model elements.
fn unit_area() -> f64 {
    1.0
}

/// A complete truss definition.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrussModel {
    /// Analysis settings.
    #[serde(default)]
    pub config: AnalysisConfig,
    /// Extra materials; the built-in presets are used when empty.
    #[serde(default, skip_serializing_if = "MaterialCatalog::is_empty")]
    pub materials: MaterialCatalog,
    /// Nodes in canonical order.
    pub nodes: Vec<NodeSpec>,
    /// Elements referencing nodes by position.
    #[serde(default)]
    pub elements: Vec<ElementSpec>,
}

/// A truss built from a model together with the handles of its entries.
#[derive(Debug)]
pub struct BuiltTruss {
    /// The editable truss.
    pub truss: Truss,
    /// Node handles, in model order.
    pub nodes: Vec<NodeHandle>,
    /// Element handles, in model order.
    pub elements: Vec<ElementHandle>,
}

impl TrussModel {
    /// Parse a model from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Json`] for malformed input.
    pub fn from_json_str(text: &str) -> Result<Self, LoadError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read a model from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Io`] or [`LoadError::Json`].
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        Self::from_json_str(&read_to_string(path.as_ref())?)
    }

    /// The default bridge layout: a top chord of four nodes above a bottom chord of
    /// five, supported at both ends of the bottom chord and braced with verticals and
    /// diagonals.
    #[must_use]
    pub fn bridge(properties: ElementProperties) -> Self {
        let top = (0..4).map(|i| (200.0 + 50.0 * f64::from(i), 250.0, false));
        let bottom = (0..5).map(|i| (175.0 + 50.0 * f64::from(i), 200.0, i == 0 || i == 4));
        let nodes = top
            .chain(bottom)
            .map(|(x, y, fixed)| NodeSpec {
                x,
                y,
                fixed,
                force: Force::default(),
            })
            .collect();

        let mut pairs = Vec::new();
        pairs.extend((0..3).map(|i| (i, i + 1)));
        pairs.extend((4..8).map(|i| (i, i + 1)));
        pairs.extend((4..8).map(|i| (i, i - 4)));
        pairs.extend((5..9).map(|i| (i, i - 5)));
        let elements = pairs
            .into_iter()
            .map(|(start, end)| ElementSpec {
                start,
                end,
                material: None,
                area: properties.area,
                properties: Some(properties),
            })
            .collect();

        Self {
            config: AnalysisConfig::default(),
            materials: MaterialCatalog::default(),
            nodes,
            elements,
        }
    }

    /// Create the truss described by this model.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::NodeIndexOutOfRange`], [`LoadError::UnknownMaterial`] or
    /// [`LoadError::MissingProperties`] for inconsistent element entries and
    /// [`LoadError::Edit`] when the truss rejects an entry.
    pub fn build(&self) -> Result<BuiltTruss, LoadError> {
        let builtin = MaterialCatalog::builtin();
        let catalog = if self.materials.is_empty() {
            &builtin
        } else {
            &self.materials
        };

        let mut truss = Truss::with_config(self.config);
        let mut nodes = Vec::with_capacity(self.nodes.len());
        for entry in &self.nodes {
            let node = truss.add_node(point(entry.x, entry.y), entry.fixed)?;
            truss.set_node_force(node, entry.force)?;
            nodes.push(node);
        }

        let mut elements = Vec::with_capacity(self.elements.len());
        for (idx, entry) in self.elements.iter().enumerate() {
            let lookup = |node: usize| {
                nodes
                    .get(node)
                    .copied()
                    .ok_or(LoadError::NodeIndexOutOfRange {
                        element: idx,
                        node,
                        count: nodes.len(),
                    })
            };
            let start = lookup(entry.start)?;
            let end = lookup(entry.end)?;
            let properties = match (&entry.properties, &entry.material) {
                (Some(properties), _) => *properties,
                (None, Some(name)) => catalog
                    .by_name(name)
                    .map(|material| material.properties(entry.area))
                    .ok_or_else(|| LoadError::UnknownMaterial {
                        element: idx,
                        material: name.clone(),
                    })?,
                (None, None) => return Err(LoadError::MissingProperties(idx)),
            };
            elements.push(truss.add_element(start, end, properties)?);
        }
        log::debug!(
            "built truss with {} nodes and {} elements",
            nodes.len(),
            elements.len()
        );

        Ok(BuiltTruss {
            truss,
            nodes,
            elements,
        })
    }
}
