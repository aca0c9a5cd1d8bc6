//! Least squares that survives rank deficient designs.

use nalgebra::{DMatrix, DVector};

use crate::errors::{FitsimError, Result};

/// Minimum-norm solution of `design * beta ≈ response` via the singular value decomposition.
///
/// Singular values below the usual machine-precision cutoff are treated as zero, so singular
/// designs yield the solution of smallest norm instead of an error.
pub fn least_squares(design: DMatrix<f64>, response: &DVector<f64>) -> Result<DVector<f64>> {
    let (n_rows, n_cols) = design.shape();
    if n_rows != response.len() {
        return Err(FitsimError::DimensionMismatch(format!(
            "design has {n_rows} rows but the response has {} entries",
            response.len()
        )));
    }
    if n_rows == 0 || n_cols == 0 {
        return Err(FitsimError::SingularRegression(
            "no observations to fit".to_string(),
        ));
    }

    let svd = design.svd(true, true);
    let largest = svd.singular_values.max();
    if !largest.is_finite() {
        return Err(FitsimError::SingularRegression(
            "design matrix is not finite".to_string(),
        ));
    }
    if largest == 0. {
        return Ok(DVector::zeros(n_cols));
    }

    let cutoff = f64::EPSILON * n_rows.max(n_cols) as f64 * largest;
    svd.solve(response, cutoff)
        .map_err(|err| FitsimError::SingularRegression(err.to_string()))
}

/// Slope of the line through the origin that best explains `response` by `covariate`.
///
/// Pairs where either value is not finite (log of a zero count) are left out.
pub fn fit_through_origin(covariate: &[f64], response: &[f64]) -> Result<f64> {
    if covariate.len() != response.len() {
        return Err(FitsimError::DimensionMismatch(format!(
            "{} covariate values for {} responses",
            covariate.len(),
            response.len()
        )));
    }
    let (x, y): (Vec<f64>, Vec<f64>) = covariate
        .iter()
        .zip(response)
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .map(|(&x, &y)| (x, y))
        .unzip();
    if x.len() < covariate.len() {
        log::debug!(
            "Dropped {} of {} observations with non-finite values",
            covariate.len() - x.len(),
            covariate.len()
        );
    }

    let design = DMatrix::from_column_slice(x.len(), 1, &x);
    let beta = least_squares(design, &DVector::from_vec(y))?;
    Ok(beta[0])
}
