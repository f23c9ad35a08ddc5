//! Per-element mechanics of a two-force member.

use nalgebra::{Matrix4, Vector2, Vector4};

use crate::geometry::{Displacement, Point};
use crate::store::ElementProperties;

/// Length and orientation of an element in its undeformed position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ElementGeometry {
    /// Distance between the two nodes.
    pub length: f64,
    /// Direction cosines `(X, Y)` pointing from the first node to the second.
    pub direction: Vector2<f64>,
}

impl ElementGeometry {
    /// Measure the element spanning `start` to `end`.
    ///
    /// Returns `None` for coincident nodes, where the direction is undefined.
    #[must_use]
    pub fn between(start: Point, end: Point) -> Option<Self> {
        let delta = end.to_vector() - start.to_vector();
        let length = delta.norm();
        if length == 0.0 || !length.is_finite() {
            return None;
        }
        Some(Self {
            length,
            direction: delta / length,
        })
    }

    /// Axial stiffness `E·A/L`.
    #[must_use]
    pub fn axial_stiffness(&self, properties: &ElementProperties) -> f64 {
        properties.young_modulus * properties.area / self.length
    }

    /// Stiffness matrix in global `{x1, y1, x2, y2}` ordering.
    ///
    /// Entry `(i, j)` is `K·c_i·c_j` with `c = (X, Y, -X, -Y)`, so the matrix is the
    /// symmetric rank-one outer product scaled by the axial stiffness.
    #[must_use]
    pub fn local_stiffness(&self, properties: &ElementProperties) -> Matrix4<f64> {
        let (x, y) = (self.direction.x, self.direction.y);
        let c = Vector4::new(x, y, -x, -y);
        c * c.transpose() * self.axial_stiffness(properties)
    }

    /// Material volume `area × length`.
    #[must_use]
    pub fn volume(&self, properties: &ElementProperties) -> f64 {
        properties.area * self.length
    }

    /// Signed axial force, positive in tension.
    ///
    /// Projects the relative nodal displacement onto the element axis.
    #[must_use]
    pub fn axial_force(
        &self,
        properties: &ElementProperties,
        start: Displacement,
        end: Displacement,
    ) -> f64 {
        let relative = end.to_vector() - start.to_vector();
        self.axial_stiffness(properties) * self.direction.dot(&relative)
    }
}

/// Stress reported for an element after solving.
///
/// The change of the separation vector between the undeformed and displaced node
/// pairs is measured by its magnitude, not its projection onto the element axis, and
/// scaled by the Young's modulus. This only approximates axial stress for small
/// displacements nearly aligned with the element and is always non-negative.
#[must_use]
pub fn separation_stress(
    young_modulus: f64,
    start: Point,
    end: Point,
    displaced_start: Point,
    displaced_end: Point,
) -> f64 {
    let reference = end.to_vector() - start.to_vector();
    let deformed = displaced_end.to_vector() - displaced_start.to_vector();
    young_modulus * (reference - deformed).norm()
}
