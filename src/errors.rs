//! All errors that can occur in the fitsim library.

use std::fmt;

pub type Result<T> = std::result::Result<T, FitsimError>;

#[derive(Clone, Debug, PartialEq)]
pub enum FitsimError {
    /// A count distribution was requested with a mean or variance it cannot represent.
    InvalidDistributionParameters(String),
    /// The ODE solver did not reach the end of the time grid.
    IntegrationError(String),
    /// The shared carrying capacity cannot hold one individual per strain.
    CapacityError(String),
    /// Shapes passed between pipeline stages disagree.
    DimensionMismatch(String),
    /// A least-squares fit had nothing to fit or the solver failed.
    SingularRegression(String),
    /// The wild-type inoculum is empty, so its expansion is undefined.
    ExtinctReference(String),
}

impl fmt::Display for FitsimError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FitsimError::InvalidDistributionParameters(message) => {
                write!(f, "InvalidDistributionParameters: {}", message)
            }
            FitsimError::IntegrationError(message) => {
                write!(f, "IntegrationError: {}", message)
            }
            FitsimError::CapacityError(message) => {
                write!(f, "CapacityError: {}", message)
            }
            FitsimError::DimensionMismatch(message) => {
                write!(f, "DimensionMismatch: {}", message)
            }
            FitsimError::SingularRegression(message) => {
                write!(f, "SingularRegression: {}", message)
            }
            FitsimError::ExtinctReference(message) => {
                write!(f, "ExtinctReference: {}", message)
            }
        }
    }
}

impl std::error::Error for FitsimError {}
