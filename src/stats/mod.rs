//! Statistics over repeated experiments

pub mod accuracy;

pub use accuracy::{EstimationAccuracy, FitnessAccuracy};
