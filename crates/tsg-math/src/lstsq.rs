//! Dense linear least squares on top of nalgebra's SVD.

use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, ArrayView1, ArrayView2};
use tsg_core::{Result, TsgError};

/// Solution of a least-squares problem together with its diagnostics.
#[derive(Debug, Clone)]
pub struct LeastSquares {
    pub solution: Array1<f64>,
    /// Euclidean norm of `A x - b`.
    pub residual: f64,
    /// Number of singular values kept above the cutoff.
    pub rank: usize,
}

/// Minimize `||A x - b||` using singular values above `rcond * sigma_max`.
pub fn solve(a: ArrayView2<f64>, b: ArrayView1<f64>, rcond: f64) -> Result<LeastSquares> {
    let (rows, cols) = a.dim();
    TsgError::check_len(rows, b.len())?;
    if cols == 0 {
        return Err(TsgError::InvalidParameter(
            "least squares with zero unknowns".into(),
        ));
    }

    let matrix = DMatrix::from_row_iterator(rows, cols, a.iter().copied());
    let rhs = DVector::from_iterator(rows, b.iter().copied());

    let svd = matrix.clone().svd(true, true);
    let sigma_max = svd.singular_values.max();
    let cutoff = rcond * sigma_max;
    let rank = svd.singular_values.iter().filter(|&&s| s > cutoff).count();
    if rank < cols {
        log::debug!("least squares is rank deficient: rank {} of {}", rank, cols);
    }

    let x = svd.solve(&rhs, cutoff).map_err(|msg| TsgError::Convergence {
        iterations: 0,
        message: format!("SVD solve failed: {msg}"),
    })?;
    if x.iter().any(|v| !v.is_finite()) {
        return Err(TsgError::Convergence {
            iterations: 0,
            message: "least-squares solution is not finite".into(),
        });
    }

    let residual = (&matrix * &x - &rhs).norm();
    Ok(LeastSquares {
        solution: Array1::from_iter(x.iter().copied()),
        residual,
        rank,
    })
}
