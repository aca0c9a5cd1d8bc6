use serde::{Deserialize, Serialize};

use crate::core::distributions::DegeneracyPolicy;
use crate::core::reads::DepthBudget;

/// Horizon of the time grid in arbitrary time units.
pub const MAX_TIME: f64 = 5.;

/// Parameters of the competitive growth phase.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct GrowthParameters {
    /// Average number of cells each strain is inoculated with.
    pub inoculum_mean: f64,

    /// Quadratic overdispersion of the inoculum between strains. The variance of the inoculum is
    /// `inoculum_mean + inoculum_dispersion * inoculum_mean^2`.
    pub inoculum_dispersion: f64,

    /// Total carrying capacity in multiples of the inoculum mean. Without a capacity, all strains
    /// grow exponentially.
    pub capacity_multiplier: Option<f64>,

    /// Fitness of each mutant relative to the wild-type. The wild-type (fitness 1) and the
    /// spike-in (fitness 0) are always prepended.
    pub mutant_fitness: Vec<f64>,

    /// Number of evenly spaced timepoints from 0 to `max_time`.
    pub n_timepoints: usize,

    pub max_time: f64,
}

impl Default for GrowthParameters {
    fn default() -> Self {
        Self {
            inoculum_mean: 1000.,
            inoculum_dispersion: 0.001,
            capacity_multiplier: Some(10.),
            mutant_fitness: vec![0.5, 2., 0.2],
            n_timepoints: 100,
            max_time: MAX_TIME,
        }
    }
}

/// Parameters of the destructive sampling and sequencing of the population.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SamplingParameters {
    /// Fraction of the population taken per sample.
    pub sample_fraction: f64,

    /// Average number of reads per sample unit, see [`DepthBudget`].
    pub sequencing_depth: f64,

    /// Number of technical replicates per timepoint.
    pub replicate_count: usize,

    /// Quadratic overdispersion of the read counts.
    pub noise_dispersion: f64,

    /// Number of sampled timepoints. The growth curves are recomputed on this coarser grid.
    pub n_timepoints: usize,

    pub depth_budget: DepthBudget,
}

impl Default for SamplingParameters {
    fn default() -> Self {
        Self {
            sample_fraction: 0.1,
            sequencing_depth: 10_000.,
            replicate_count: 3,
            noise_dispersion: 0.001,
            n_timepoints: 10,
            depth_budget: DepthBudget::PerTimepoint,
        }
    }
}

/// Numerical settings of the integrator and the count distributions.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct NumericParameters {
    /// Relative tolerance of the adaptive ODE solver.
    pub rtol: f64,

    /// Absolute tolerance of the adaptive ODE solver.
    pub atol: f64,

    /// Behaviour of the overdispersion model when the variance does not exceed the mean.
    pub degeneracy: DegeneracyPolicy,
}

impl Default for NumericParameters {
    fn default() -> Self {
        Self {
            rtol: 1e-8,
            atol: 1e-6,
            degeneracy: DegeneracyPolicy::Poisson,
        }
    }
}
