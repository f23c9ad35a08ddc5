//! Dense LU solver without pivoting.
//!
//! Doolittle decomposition `A = L·U` with a unit diagonal on `L`, stored in one
//! combined matrix (`L + U - I`). Rows are never exchanged, so a zero pivot means the
//! elimination breaks down; it is reported as [`SolveError::ZeroPivot`] instead of
//! dividing by zero. Reduced stiffness matrices of stable trusses are symmetric
//! positive definite, for which elimination without pivoting is well defined.

use nalgebra::{DMatrix, DVector};

use crate::errors::SolveError;

/// Combined `L + U - I` factors of a square matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct LuDecomposition {
    factors: DMatrix<f64>,
}

impl LuDecomposition {
    /// Factor `matrix`.
    ///
    /// A pivot is rejected when it is not finite or when
    /// `|pivot| <= tolerance * |a_ii|`, the diagonal entry of the same row before
    /// elimination. The test measures how much of the row's own stiffness
    /// elimination cancelled, so it holds regardless of units and of how much
    /// stiffer one row is than another.
    ///
    /// # Errors
    ///
    /// Returns [`SolveError::DimensionMismatch`] for a non-square matrix and
    /// [`SolveError::ZeroPivot`] when a pivot fails the test above.
    pub fn decompose(matrix: &DMatrix<f64>, tolerance: f64) -> Result<Self, SolveError> {
        let n = matrix.nrows();
        if matrix.ncols() != n {
            return Err(SolveError::DimensionMismatch {
                rows: n,
                cols: matrix.ncols(),
                rhs: n,
            });
        }
        let mut lu = DMatrix::zeros(n, n);
        for i in 0..n {
            for j in i..n {
                let mut sum = 0.0;
                for k in 0..i {
                    sum += lu[(i, k)] * lu[(k, j)];
                }
                lu[(i, j)] = matrix[(i, j)] - sum;
            }
            let pivot = lu[(i, i)];
            let threshold = tolerance * matrix[(i, i)].abs();
            if !pivot.is_finite() || pivot.abs() <= threshold {
                log::debug!("pivot {pivot:e} at row {i} is below {threshold:e}");
                return Err(SolveError::ZeroPivot { row: i, pivot });
            }
            for j in (i + 1)..n {
                let mut sum = 0.0;
                for k in 0..i {
                    sum += lu[(j, k)] * lu[(k, i)];
                }
                lu[(j, i)] = (matrix[(j, i)] - sum) / pivot;
            }
        }
        Ok(Self { factors: lu })
    }

    /// Order of the factored matrix.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.factors.nrows()
    }

    /// Combined factors, `L` strictly below the diagonal and `U` on and above it.
    #[must_use]
    pub fn factors(&self) -> &DMatrix<f64> {
        &self.factors
    }

    /// Solve `A·x = b` by forward substitution (`L·y = b`) then back substitution
    /// (`U·x = y`).
    ///
    /// # Errors
    ///
    /// Returns [`SolveError::DimensionMismatch`] when `rhs` has the wrong length.
    pub fn solve(&self, rhs: &DVector<f64>) -> Result<DVector<f64>, SolveError> {
        let n = self.dim();
        if rhs.len() != n {
            return Err(SolveError::DimensionMismatch {
                rows: n,
                cols: n,
                rhs: rhs.len(),
            });
        }
        let lu = &self.factors;

        let mut y = DVector::zeros(n);
        for i in 0..n {
            let mut sum = 0.0;
            for k in 0..i {
                sum += lu[(i, k)] * y[k];
            }
            y[i] = rhs[i] - sum;
        }

        let mut x = DVector::zeros(n);
        for i in (0..n).rev() {
            let mut sum = 0.0;
            for k in (i + 1)..n {
                sum += lu[(i, k)] * x[k];
            }
            x[i] = (y[i] - sum) / lu[(i, i)];
        }
        Ok(x)
    }
}

/// Factor `matrix` and solve `matrix · x = rhs` in one call.
///
/// # Errors
///
/// See [`LuDecomposition::decompose`] and [`LuDecomposition::solve`].
pub fn solve(
    matrix: &DMatrix<f64>,
    rhs: &DVector<f64>,
    tolerance: f64,
) -> Result<DVector<f64>, SolveError> {
    LuDecomposition::decompose(matrix, tolerance)?.solve(rhs)
}
