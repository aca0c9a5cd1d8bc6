//! This module contains the core model: strains, their growth, the sequencing of samples and
//! the estimation of fitness from read counts.

pub mod distributions;
pub mod estimate;
pub mod growth;
pub mod random;
pub mod reads;
pub mod regression;
pub mod strains;

pub use distributions::{CountDistribution, DegeneracyPolicy, MultivariateHypergeometric};
pub use estimate::{Covariate, FitnessFit};
pub use growth::{GrowthCurves, GrowthModel};
pub use random::{RandomnessProvider, Stage};
pub use reads::{DepthBudget, ReadCounts};
pub use strains::StrainVector;
