//! Elimination of fixed degrees of freedom and expansion of the reduced solution.

use nalgebra::{DMatrix, DVector};

use crate::assembly::{AnalysisModel, DOF_PER_NODE};

/// Split of the global degrees of freedom into free and fixed sets.
///
/// Both lists are ascending, so the reduced system keeps the relative order of the
/// remaining degrees of freedom.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DofPartition {
    total: usize,
    free: Vec<usize>,
    fixed: Vec<usize>,
}

impl DofPartition {
    /// Partition the degrees of freedom of `model`, fixing both axes of fixed nodes.
    #[must_use]
    pub fn from_model(model: &AnalysisModel) -> Self {
        Self::from_fixed_nodes(model.nodes.iter().map(|node| node.fixed))
    }

    /// Partition from per-node fixed flags given in canonical order.
    pub fn from_fixed_nodes<I>(fixed_flags: I) -> Self
    where
        I: IntoIterator<Item = bool>,
    {
        let mut partition = Self::default();
        for (idx, fixed) in fixed_flags.into_iter().enumerate() {
            let base = idx * DOF_PER_NODE;
            let target = if fixed {
                &mut partition.fixed
            } else {
                &mut partition.free
            };
            target.extend(base..base + DOF_PER_NODE);
            partition.total += DOF_PER_NODE;
        }
        partition
    }

    /// Size of the unreduced system.
    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    /// Unconstrained degrees of freedom in ascending order.
    #[must_use]
    pub fn free(&self) -> &[usize] {
        &self.free
    }

    /// Constrained degrees of freedom in ascending order.
    #[must_use]
    pub fn fixed(&self) -> &[usize] {
        &self.fixed
    }

    /// Size of the reduced system, `2n - 2·(fixed nodes)`.
    #[must_use]
    pub fn reduced_len(&self) -> usize {
        self.free.len()
    }

    /// Keep only the free entries of a full-length vector.
    #[must_use]
    pub fn restrict_vector(&self, full: &DVector<f64>) -> DVector<f64> {
        DVector::from_iterator(self.free.len(), self.free.iter().map(|&dof| full[dof]))
    }

    /// Keep only the rows and columns of the free degrees of freedom.
    #[must_use]
    pub fn restrict_matrix(&self, full: &DMatrix<f64>) -> DMatrix<f64> {
        let size = self.free.len();
        DMatrix::from_fn(size, size, |row, col| full[(self.free[row], self.free[col])])
    }

    /// Remove the fixed rows and columns from a global system.
    #[must_use]
    pub fn reduce(&self, stiffness: &DMatrix<f64>, load: &DVector<f64>) -> ReducedSystem {
        ReducedSystem {
            stiffness: self.restrict_matrix(stiffness),
            load: self.restrict_vector(load),
        }
    }

    /// Scatter a reduced solution back to full length.
    ///
    /// Fixed degrees of freedom are set to exactly zero.
    #[must_use]
    pub fn expand(&self, reduced: &DVector<f64>) -> DVector<f64> {
        let mut full = DVector::zeros(self.total);
        for (value, &dof) in reduced.iter().zip(&self.free) {
            full[dof] = *value;
        }
        full
    }
}

/// Global system with the fixed degrees of freedom removed.
#[derive(Clone, Debug, PartialEq)]
pub struct ReducedSystem {
    /// Reduced stiffness matrix.
    pub stiffness: DMatrix<f64>,
    /// Reduced load vector.
    pub load: DVector<f64>,
}

impl ReducedSystem {
    /// Whether there is nothing left to solve.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.load.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_nodes_remove_both_dofs() {
        let partition = DofPartition::from_fixed_nodes([true, false, true, false]);
        assert_eq!(partition.total(), 8);
        assert_eq!(partition.fixed(), &[0, 1, 4, 5]);
        assert_eq!(partition.free(), &[2, 3, 6, 7]);
        assert_eq!(partition.reduced_len(), 4);
    }

    #[test]
    fn reduction_preserves_relative_order() {
        let partition = DofPartition::from_fixed_nodes([false, true, false]);
        let stiffness = DMatrix::from_fn(6, 6, |row, col| (row * 10 + col) as f64);
        let load = DVector::from_fn(6, |row, _| row as f64);
        let reduced = partition.reduce(&stiffness, &load);
        assert_eq!(reduced.load, DVector::from_vec(vec![0.0, 1.0, 4.0, 5.0]));
        assert_eq!(reduced.stiffness[(0, 0)], 0.0);
        assert_eq!(reduced.stiffness[(1, 2)], 14.0);
        assert_eq!(reduced.stiffness[(3, 0)], 50.0);
        assert_eq!(reduced.stiffness[(2, 3)], 45.0);
    }

    #[test]
    fn everything_fixed_yields_an_empty_system() {
        let partition = DofPartition::from_fixed_nodes([true, true]);
        let reduced = partition.reduce(&DMatrix::identity(4, 4), &DVector::zeros(4));
        assert!(reduced.is_empty());
        assert_eq!(partition.expand(&reduced.load), DVector::zeros(4));
    }

    #[test]
    fn expand_after_restrict_zeroes_fixed_dofs() {
        let partition = DofPartition::from_fixed_nodes([false, true, false]);
        let full = DVector::from_vec(vec![1.0, -2.0, 3.0, 4.0, -5.0, 6.0]);
        let round_trip = partition.expand(&partition.restrict_vector(&full));
        assert_eq!(
            round_trip,
            DVector::from_vec(vec![1.0, -2.0, 0.0, 0.0, -5.0, 6.0])
        );
    }
}
