//! Count distributions shared by inoculum and read noise sampling.
//!
//! Both stages use the same overdispersion model, `variance = mean + dispersion * mean^2`, which
//! maps onto a negative binomial distribution. The moment algebra and its degeneracy check live
//! here so the two stages cannot drift apart.

use rand::Rng;
use rand_distr::{Distribution, Gamma, Hypergeometric, Poisson};
use serde::{Deserialize, Serialize};

use crate::errors::{FitsimError, Result};

/// What to do when the overdispersion model collapses to `variance <= mean` for a positive mean.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DegeneracyPolicy {
    /// Sample from a Poisson distribution with the requested mean.
    #[default]
    Poisson,
    /// Refuse with [`FitsimError::InvalidDistributionParameters`].
    Fail,
}

/// Variance implied by the quadratic overdispersion model.
#[inline]
pub fn overdispersed_variance(mean: f64, dispersion: f64) -> f64 {
    mean + dispersion * mean * mean
}

/// Negative binomial parameters counting failures before the `n`-th success, where each trial
/// succeeds with probability `p`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NegativeBinomialParameters {
    pub n: f64,
    pub p: f64,
}

impl NegativeBinomialParameters {
    /// Solve `mean = n (1 - p) / p` and `variance = mean / p` for `n` and `p`.
    pub fn from_moments(mean: f64, variance: f64) -> Result<Self> {
        if !mean.is_finite() || mean <= 0. {
            return Err(FitsimError::InvalidDistributionParameters(format!(
                "negative binomial mean must be positive and finite, got {mean}"
            )));
        }
        if !variance.is_finite() || variance <= mean {
            return Err(FitsimError::InvalidDistributionParameters(format!(
                "negative binomial variance must exceed its mean, \
                 got mean={mean} variance={variance}"
            )));
        }
        let p = mean / variance;
        let n = mean * mean / (variance - mean);
        Ok(Self { n, p })
    }

    pub fn mean(&self) -> f64 {
        self.n * (1. - self.p) / self.p
    }

    pub fn variance(&self) -> f64 {
        self.mean() / self.p
    }
}

/// Negative binomial distribution sampled as a gamma-mixed Poisson.
#[derive(Clone, Debug)]
pub struct NegativeBinomial {
    rate: Gamma<f64>,
}

impl NegativeBinomial {
    pub fn new(parameters: NegativeBinomialParameters) -> Result<Self> {
        let scale = (1. - parameters.p) / parameters.p;
        let rate = Gamma::new(parameters.n, scale).map_err(|err| {
            FitsimError::InvalidDistributionParameters(format!(
                "n={} p={}: {err}",
                parameters.n, parameters.p
            ))
        })?;
        Ok(Self { rate })
    }
}

impl Distribution<u64> for NegativeBinomial {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u64 {
        let lambda: f64 = self.rate.sample(rng);
        if lambda <= 0. {
            return 0;
        }
        match Poisson::new(lambda) {
            Ok(poisson) => {
                let draw: f64 = poisson.sample(rng);
                draw as u64
            }
            // beyond the Poisson sampler's range the relative noise is negligible
            Err(_) => lambda.round() as u64,
        }
    }
}

/// Count distribution for a given mean under the overdispersion model.
#[derive(Clone, Debug)]
pub enum CountDistribution {
    /// Point mass at zero.
    Zero,
    Poisson(Poisson<f64>),
    NegativeBinomial(NegativeBinomial),
}

impl CountDistribution {
    pub fn overdispersed(mean: f64, dispersion: f64, policy: DegeneracyPolicy) -> Result<Self> {
        if !mean.is_finite() || mean < 0. {
            return Err(FitsimError::InvalidDistributionParameters(format!(
                "count mean must be non-negative and finite, got {mean}"
            )));
        }
        if !dispersion.is_finite() || dispersion < 0. {
            return Err(FitsimError::InvalidDistributionParameters(format!(
                "dispersion must be non-negative and finite, got {dispersion}"
            )));
        }
        if mean == 0. {
            return Ok(CountDistribution::Zero);
        }

        let variance = overdispersed_variance(mean, dispersion);
        if variance > mean {
            let parameters = NegativeBinomialParameters::from_moments(mean, variance)?;
            return Ok(CountDistribution::NegativeBinomial(NegativeBinomial::new(
                parameters,
            )?));
        }

        match policy {
            DegeneracyPolicy::Poisson => {
                let poisson = Poisson::new(mean).map_err(|err| {
                    FitsimError::InvalidDistributionParameters(format!("mean={mean}: {err}"))
                })?;
                Ok(CountDistribution::Poisson(poisson))
            }
            DegeneracyPolicy::Fail => Err(FitsimError::InvalidDistributionParameters(format!(
                "variance {variance} does not exceed mean {mean} (dispersion={dispersion})"
            ))),
        }
    }
}

impl Distribution<u64> for CountDistribution {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u64 {
        match self {
            CountDistribution::Zero => 0,
            CountDistribution::Poisson(poisson) => {
                let draw: f64 = poisson.sample(rng);
                draw as u64
            }
            CountDistribution::NegativeBinomial(negative_binomial) => negative_binomial.sample(rng),
        }
    }
}

/// Sampling without replacement from an urn with several colors.
///
/// Each draw returns how many balls of each color were taken; the counts always sum to the sample
/// size.
#[derive(Clone, Debug, PartialEq)]
pub struct MultivariateHypergeometric {
    colors: Vec<u64>,
    total: u64,
    sample_size: u64,
}

impl MultivariateHypergeometric {
    pub fn new(colors: Vec<u64>, sample_size: u64) -> Result<Self> {
        let total: u64 = colors.iter().sum();
        if sample_size > total {
            return Err(FitsimError::InvalidDistributionParameters(format!(
                "cannot draw {sample_size} from an urn of {total}"
            )));
        }
        Ok(Self {
            colors,
            total,
            sample_size,
        })
    }
}

impl Distribution<Vec<u64>> for MultivariateHypergeometric {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<u64> {
        let mut remaining_total = self.total;
        let mut remaining_sample = self.sample_size;

        // draw color by color from the balls not yet considered
        self.colors
            .iter()
            .map(|&color| {
                let drawn = if remaining_sample == 0 || color == 0 {
                    0
                } else if color == remaining_total {
                    remaining_sample
                } else {
                    match Hypergeometric::new(remaining_total, color, remaining_sample) {
                        Ok(hypergeometric) => hypergeometric.sample(rng),
                        // the inversion setup underflows for large urns with a small expected draw
                        Err(_) => sequential_hypergeometric(
                            remaining_total,
                            color,
                            remaining_sample,
                            rng,
                        ),
                    }
                };
                remaining_total -= color;
                remaining_sample -= drawn;
                drawn
            })
            .collect()
    }
}

/// Marked balls among `draws` taken without replacement from `total` balls, `marked` of them
/// marked. Walks the smaller of the two sets ball by ball, so the cost is `min(marked, draws)`.
fn sequential_hypergeometric<R: Rng + ?Sized>(
    total: u64,
    marked: u64,
    draws: u64,
    rng: &mut R,
) -> u64 {
    let (walked, target) = if marked <= draws {
        (marked, draws)
    } else {
        (draws, marked)
    };
    let mut hits = 0;
    for considered in 0..walked {
        if rng.random_range(0..total - considered) < target - hits {
            hits += 1;
        }
    }
    hits
}
