//! Destructive sampling and sequencing of the population.
//!
//! At every timepoint a fraction of the cells is drawn without replacement, independently for
//! each technical replicate. The sampled composition is then scaled to the read budget and
//! passed through overdispersed read noise.

use ndarray::{Array2, Array3, Axis, s};
use rand_distr::Distribution;
use serde::{Deserialize, Serialize};

use crate::config::{NumericParameters, SamplingParameters};
use crate::core::distributions::{CountDistribution, MultivariateHypergeometric};
use crate::core::random::{RandomnessProvider, Stage};
use crate::errors::{FitsimError, Result};

/// Total number of reads each replicate receives.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DepthBudget {
    /// `sequencing_depth * n_timepoints` reads per replicate.
    #[default]
    PerTimepoint,
    /// `sequencing_depth * n_strains` reads per replicate.
    PerStrain,
}

impl DepthBudget {
    pub fn total(&self, sequencing_depth: f64, n_strains: usize, n_timepoints: usize) -> f64 {
        match self {
            DepthBudget::PerTimepoint => sequencing_depth * n_timepoints as f64,
            DepthBudget::PerStrain => sequencing_depth * n_strains as f64,
        }
    }
}

/// Sampled cells and sequenced reads, both indexed by (strain, timepoint, replicate).
#[derive(Clone, Debug)]
pub struct ReadCounts {
    pub sampled: Array3<u64>,
    pub reads: Array3<u64>,
}

impl ReadCounts {
    pub fn n_strains(&self) -> usize {
        self.reads.len_of(Axis(0))
    }

    pub fn n_timepoints(&self) -> usize {
        self.reads.len_of(Axis(1))
    }

    pub fn n_replicates(&self) -> usize {
        self.reads.len_of(Axis(2))
    }
}

/// Sample cells from `population` and sequence them.
pub fn sample_reads(
    population: &Array2<f64>,
    parameters: &SamplingParameters,
    numerics: &NumericParameters,
    randomness: &RandomnessProvider,
) -> Result<ReadCounts> {
    if !parameters.sequencing_depth.is_finite() || parameters.sequencing_depth <= 0. {
        return Err(FitsimError::InvalidDistributionParameters(format!(
            "sequencing depth must be positive, got {}",
            parameters.sequencing_depth
        )));
    }
    let sampled = sample_cells(
        population,
        parameters.sample_fraction,
        parameters.replicate_count,
        randomness,
    )?;
    let (n_strains, n_timepoints, _) = sampled.dim();
    let budget = parameters
        .depth_budget
        .total(parameters.sequencing_depth, n_strains, n_timepoints);
    let means = read_means(&sampled, budget);
    let reads = apply_read_noise(&means, parameters.noise_dispersion, numerics, randomness)?;

    Ok(ReadCounts { sampled, reads })
}

/// Draw `replicate_count` multivariate hypergeometric samples of
/// `floor(total * sample_fraction)` cells per timepoint.
pub fn sample_cells(
    population: &Array2<f64>,
    sample_fraction: f64,
    replicate_count: usize,
    randomness: &RandomnessProvider,
) -> Result<Array3<u64>> {
    if !(sample_fraction > 0. && sample_fraction <= 1.) {
        return Err(FitsimError::InvalidDistributionParameters(format!(
            "sample fraction must lie in (0, 1], got {sample_fraction}"
        )));
    }
    if replicate_count == 0 {
        return Err(FitsimError::DimensionMismatch(
            "at least one replicate is required".to_string(),
        ));
    }

    let (n_strains, n_timepoints) = population.dim();
    let mut sampled = Array3::zeros((n_strains, n_timepoints, replicate_count));

    for (timepoint, cells) in population.axis_iter(Axis(1)).enumerate() {
        // fractional cells are not sampleable
        let urn: Vec<u64> = cells.iter().map(|&count| count as u64).collect();
        let total: u64 = urn.iter().sum();
        let sample_size = ((total as f64 * sample_fraction).floor() as u64).min(total);
        log::trace!("Sampling {sample_size} of {total} cells at timepoint {timepoint}");

        let urn = MultivariateHypergeometric::new(urn, sample_size)?;
        let mut rng = randomness.stream(Stage::Sampling, timepoint as u64);
        for replicate in 0..replicate_count {
            let draw = urn.sample(&mut rng);
            for (strain, count) in draw.into_iter().enumerate() {
                sampled[[strain, timepoint, replicate]] = count;
            }
        }
    }

    Ok(sampled)
}

/// Expected reads per cell of `sampled`, allocating `budget` reads to each replicate in
/// proportion to the sampled composition.
pub fn read_means(sampled: &Array3<u64>, budget: f64) -> Array3<f64> {
    let mut means = sampled.mapv(|count| count as f64);
    for mut column in means.lanes_mut(Axis(0)) {
        let total: f64 = column.sum();
        if total > 0. {
            column.mapv_inplace(|count| (budget * count / total).floor());
        }
    }
    means
}

/// Replace every mean with an overdispersed read count, one random stream per replicate.
pub fn apply_read_noise(
    means: &Array3<f64>,
    noise_dispersion: f64,
    numerics: &NumericParameters,
    randomness: &RandomnessProvider,
) -> Result<Array3<u64>> {
    let (n_strains, n_timepoints, n_replicates) = means.dim();
    let mut reads = Array3::zeros((n_strains, n_timepoints, n_replicates));

    for replicate in 0..n_replicates {
        let mut rng = randomness.stream(Stage::ReadNoise, replicate as u64);
        let replicate_means = means.slice(s![.., .., replicate]);
        for ((strain, timepoint), &mean) in replicate_means.indexed_iter() {
            let distribution =
                CountDistribution::overdispersed(mean, noise_dispersion, numerics.degeneracy)?;
            reads[[strain, timepoint, replicate]] = distribution.sample(&mut rng);
        }
    }

    Ok(reads)
}
