use serde::Serialize;

use crate::core::{Covariate, FitnessFit, StrainVector};
use crate::errors::{FitsimError, Result};

/// Accuracy of the relative fitness estimates of one strain across trials.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct EstimationAccuracy {
    pub strain: String,
    pub covariate: &'static str,
    pub true_fitness: f64,
    pub mean_estimate: f64,
    pub sd_estimate: f64,
    pub rmse: f64,
    pub trials: usize,
}

/// Trait extension to compare fitted relative fitness with the simulated truth.
pub trait FitnessAccuracy {
    fn accuracy(&self, strains: &StrainVector) -> Result<Vec<EstimationAccuracy>>;
}

impl FitnessAccuracy for [FitnessFit] {
    /// Per strain mean, sample standard deviation and root-mean-square error of the relative
    /// fitness over all fits. All fits must share their covariate and strains.
    fn accuracy(&self, strains: &StrainVector) -> Result<Vec<EstimationAccuracy>> {
        let covariate = match self.first() {
            Some(fit) => fit.covariate,
            None => return Ok(Vec::new()),
        };
        if let Some(fit) = self
            .iter()
            .find(|fit| fit.covariate != covariate || fit.n_strains() != strains.len())
        {
            return Err(FitsimError::DimensionMismatch(format!(
                "cannot summarize a {:?} fit of {} strains with {:?} fits of {} strains",
                fit.covariate,
                fit.n_strains(),
                covariate,
                strains.len()
            )));
        }

        let estimates: Vec<_> = self.iter().map(FitnessFit::relative_fitness).collect();
        let n_trials = estimates.len();

        Ok(strains
            .fitness()
            .iter()
            .enumerate()
            .map(|(strain, &truth)| {
                let values: Vec<f64> = estimates.iter().map(|estimate| estimate[strain]).collect();
                let mean = values.iter().sum::<f64>() / n_trials as f64;
                let sd = if n_trials > 1 {
                    (values.iter().map(|value| (value - mean).powi(2)).sum::<f64>()
                        / (n_trials - 1) as f64)
                        .sqrt()
                } else {
                    0.
                };
                let rmse = (values.iter().map(|value| (value - truth).powi(2)).sum::<f64>()
                    / n_trials as f64)
                    .sqrt();
                EstimationAccuracy {
                    strain: StrainVector::label(strain),
                    covariate: covariate.name(),
                    true_fitness: truth,
                    mean_estimate: mean,
                    sd_estimate: sd,
                    rmse,
                    trials: n_trials,
                }
            })
            .collect())
    }
}
