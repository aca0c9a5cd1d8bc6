//! Fitness estimation from read counts.
//!
//! Read counts of each strain are expressed as fold-change from their mean at the first
//! timepoint and divided by the wild-type's fold-change, which cancels drift in sequencing depth.
//! The logarithm of this corrected ratio is then regressed through the origin, either against the
//! known log expansion of the wild-type or against the corrected log ratio of the spike-in.

use ndarray::{Array1, Array2, Array3, Axis};
use serde::{Deserialize, Serialize};

use crate::core::regression::fit_through_origin;
use crate::core::strains::{SPIKE_IN, StrainVector, WILDTYPE};
use crate::errors::{FitsimError, Result};

/// The independent variable of a fitness regression.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Covariate {
    /// Log fold-expansion of the wild-type population.
    ReferenceExpansion,
    /// Corrected log ratio of the non-growing spike-in.
    SpikeIn,
}

impl Covariate {
    /// Sign of the covariate relative to the log wild-type expansion.
    ///
    /// A spike-in that does not grow loses ground against the wild-type exactly as fast as the
    /// wild-type expands, so its corrected log ratio runs opposite to the expansion.
    pub fn orientation(&self) -> f64 {
        match self {
            Covariate::ReferenceExpansion => 1.,
            Covariate::SpikeIn => -1.,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Covariate::ReferenceExpansion => "reference_expansion",
            Covariate::SpikeIn => "spike_in",
        }
    }
}

/// Result of regressing all strains against one covariate.
#[derive(Clone, Debug)]
pub struct FitnessFit {
    pub covariate: Covariate,
    /// Covariate per (timepoint, replicate), on log scale.
    pub log_covariate: Array2<f64>,
    /// Corrected log ratio per (strain, timepoint, replicate).
    pub log_ratio: Array3<f64>,
    /// Slope per strain.
    pub beta: Array1<f64>,
}

impl FitnessFit {
    pub fn n_strains(&self) -> usize {
        self.beta.len()
    }

    /// Fitness relative to the wild-type, `1 + orientation * beta`.
    ///
    /// Both covariates report the same quantity under this convention: the wild-type maps to 1
    /// and a strain growing at fitness `w` maps to `w`.
    pub fn relative_fitness(&self) -> Array1<f64> {
        let orientation = self.covariate.orientation();
        self.beta.mapv(|beta| 1. + orientation * beta)
    }

    /// Regression line of `strain`, evaluated at every observation.
    pub fn fitted(&self, strain: usize) -> Array2<f64> {
        &self.log_covariate * self.beta[strain]
    }
}

/// Log of each strain's read fold-change divided by the wild-type's read fold-change.
pub fn log_corrected_ratio(read_counts: &Array3<u64>) -> Result<Array3<f64>> {
    let (n_strains, n_timepoints, n_replicates) = read_counts.dim();
    if n_strains == 0 || n_timepoints == 0 || n_replicates == 0 {
        return Err(FitsimError::DimensionMismatch(format!(
            "read counts of shape {:?} are empty",
            read_counts.dim()
        )));
    }

    let mut log_expansion = read_counts.mapv(|count| count as f64);
    let baseline = log_expansion
        .index_axis(Axis(1), 0)
        .mean_axis(Axis(1))
        .ok_or_else(|| FitsimError::DimensionMismatch("no replicates".to_string()))?;
    for (strain, mut counts) in log_expansion.outer_iter_mut().enumerate() {
        let initial = baseline[strain];
        counts.mapv_inplace(|count| (count / initial).ln());
    }

    let reference = log_expansion.index_axis(Axis(0), WILDTYPE).to_owned();
    for mut counts in log_expansion.outer_iter_mut() {
        counts -= &reference;
    }

    Ok(log_expansion)
}

/// Regress every strain's corrected log ratio on the log wild-type expansion.
pub fn fit_fitness(
    read_counts: &Array3<u64>,
    reference_expansion: &Array1<f64>,
) -> Result<FitnessFit> {
    let log_ratio = log_corrected_ratio(read_counts)?;
    let (_, n_timepoints, n_replicates) = log_ratio.dim();
    if reference_expansion.len() != n_timepoints {
        return Err(FitsimError::DimensionMismatch(format!(
            "reference expansion has {} timepoints, read counts have {n_timepoints}",
            reference_expansion.len()
        )));
    }

    let log_reference = reference_expansion.mapv(f64::ln);
    let log_covariate =
        Array2::from_shape_fn((n_timepoints, n_replicates), |(timepoint, _)| {
            log_reference[timepoint]
        });
    regress(Covariate::ReferenceExpansion, log_covariate, log_ratio)
}

/// Regress every strain's corrected log ratio on the spike-in's corrected log ratio.
pub fn fit_fitness_spike(log_corrected_ratio: &Array3<f64>) -> Result<FitnessFit> {
    if log_corrected_ratio.len_of(Axis(0)) <= SPIKE_IN {
        return Err(FitsimError::DimensionMismatch(
            "corrected log ratios lack a spike-in strain".to_string(),
        ));
    }
    let log_covariate = log_corrected_ratio.index_axis(Axis(0), SPIKE_IN).to_owned();
    regress(Covariate::SpikeIn, log_covariate, log_corrected_ratio.clone())
}

fn regress(
    covariate: Covariate,
    log_covariate: Array2<f64>,
    log_ratio: Array3<f64>,
) -> Result<FitnessFit> {
    let (_, n_timepoints, n_replicates) = log_ratio.dim();
    if log_covariate.dim() != (n_timepoints, n_replicates) {
        return Err(FitsimError::DimensionMismatch(format!(
            "covariate of shape {:?} for observations of shape {:?}",
            log_covariate.dim(),
            (n_timepoints, n_replicates)
        )));
    }

    // observations in (timepoint, replicate) order for covariate and response alike
    let x: Vec<f64> = log_covariate.iter().copied().collect();
    let beta = log_ratio
        .outer_iter()
        .enumerate()
        .map(|(strain, ratios)| {
            let y: Vec<f64> = ratios.iter().copied().collect();
            fit_through_origin(&x, &y).map_err(|err| match err {
                FitsimError::SingularRegression(message) => FitsimError::SingularRegression(
                    format!("{}: {message}", StrainVector::label(strain)),
                ),
                other => other,
            })
        })
        .collect::<Result<Array1<f64>>>()?;
    log::debug!("Fitted {} slopes {beta}", covariate.name());

    Ok(FitnessFit {
        covariate,
        log_covariate,
        log_ratio,
        beta,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GrowthParameters, NumericParameters};
    use crate::core::growth::simulate_growth;
    use crate::core::random::RandomnessProvider;

    /// Noise-free read counts proportional to an exponentially growing population.
    fn noiseless_reads(mutant_fitness: &[f64], n_replicates: usize) -> (Array3<u64>, Array1<f64>) {
        let growth = GrowthParameters {
            capacity_multiplier: None,
            mutant_fitness: mutant_fitness.to_vec(),
            n_timepoints: 10,
            max_time: 3.,
            ..GrowthParameters::default()
        };
        let curves = simulate_growth(
            &growth,
            &NumericParameters::default(),
            &RandomnessProvider::new(42),
        )
        .unwrap();
        let (n_strains, n_timepoints) = curves.population.dim();
        let reads = Array3::from_shape_fn(
            (n_strains, n_timepoints, n_replicates),
            |(strain, timepoint, _)| {
                (1000. * curves.population[[strain, timepoint]]).round() as u64
            },
        );
        (reads, curves.reference_expansion)
    }

    #[test]
    fn corrected_ratio_of_wildtype_is_zero() {
        let reads = Array3::from_shape_vec((2, 2, 2), vec![10, 20, 40, 40, 5, 5, 5, 10]).unwrap();
        let log_ratio = log_corrected_ratio(&reads).unwrap();
        assert!(log_ratio.index_axis(Axis(0), WILDTYPE).iter().all(|&x| x == 0.));
        // wild-type baseline 15, second strain baseline 5
        let expected = (5f64 / 5.).ln() - (40f64 / 15.).ln();
        assert!((log_ratio[[1, 1, 0]] - expected).abs() < 1e-12);
    }

    #[test]
    fn recovers_known_fitness() {
        let mutant_fitness = [0.5, 2., 0.2, 1.];
        let (reads, reference_expansion) = noiseless_reads(&mutant_fitness, 3);
        let fit = fit_fitness(&reads, &reference_expansion).unwrap();
        assert_eq!(fit.n_strains(), 6);
        assert!(fit.beta[WILDTYPE].abs() < 1e-12);
        for (mutant, &fitness) in mutant_fitness.iter().enumerate() {
            let beta = fit.beta[mutant + 2];
            assert!((beta - (fitness - 1.)).abs() < 1e-3, "beta {beta} for fitness {fitness}");
        }
        let relative = fit.relative_fitness();
        assert!((relative[WILDTYPE] - 1.).abs() < 1e-12);
        assert!((relative[3] - 2.).abs() < 1e-3);
    }

    #[test]
    fn slope_magnitude_grows_with_fitness_difference() {
        let mutant_fitness = [1.1, 0.7, 1.6, 2.5];
        let (reads, reference_expansion) = noiseless_reads(&mutant_fitness, 1);
        let fit = fit_fitness(&reads, &reference_expansion).unwrap();
        let mut pairs: Vec<(f64, f64)> = mutant_fitness
            .iter()
            .enumerate()
            .map(|(mutant, &fitness)| ((fitness - 1.).abs(), fit.beta[mutant + 2].abs()))
            .collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
        for pair in pairs.windows(2) {
            assert!(pair[1].1 > pair[0].1);
        }
    }

    #[test]
    fn spike_in_fit_agrees() {
        let mutant_fitness = [0.5, 2., 0.2];
        let (reads, reference_expansion) = noiseless_reads(&mutant_fitness, 2);
        let fit = fit_fitness(&reads, &reference_expansion).unwrap();
        let spike = fit_fitness_spike(&fit.log_ratio).unwrap();
        assert_eq!(spike.covariate, Covariate::SpikeIn);
        assert_eq!(spike.log_covariate.dim(), (10, 2));
        assert!(spike.beta[WILDTYPE].abs() < 1e-12);
        assert!((spike.beta[SPIKE_IN] - 1.).abs() < 1e-12);

        let relative = spike.relative_fitness();
        for (mutant, &fitness) in mutant_fitness.iter().enumerate() {
            assert!((spike.beta[mutant + 2] - (1. - fitness)).abs() < 1e-3);
            assert!((relative[mutant + 2] - fitness).abs() < 1e-3);
        }
    }

    #[test]
    fn fitted_line() {
        let (reads, reference_expansion) = noiseless_reads(&[2.], 2);
        let fit = fit_fitness(&reads, &reference_expansion).unwrap();
        let line = fit.fitted(2);
        assert_eq!(line.dim(), (10, 2));
        assert!((line[[9, 1]] - fit.beta[2] * reference_expansion[9].ln()).abs() < 1e-12);
    }

    #[test]
    fn mismatched_reference() {
        let (reads, reference_expansion) = noiseless_reads(&[2.], 2);
        let shorter = reference_expansion.slice(ndarray::s![..5]).to_owned();
        assert!(matches!(
            fit_fitness(&reads, &shorter),
            Err(FitsimError::DimensionMismatch(_))
        ));
    }

    #[test]
    fn spike_fit_needs_spike() {
        let log_ratio = Array3::zeros((1, 3, 2));
        assert!(matches!(
            fit_fitness_spike(&log_ratio),
            Err(FitsimError::DimensionMismatch(_))
        ));
    }

    #[test]
    fn strain_without_reads() {
        let mut reads = Array3::from_elem((3, 4, 2), 100u64);
        reads.index_axis_mut(Axis(0), 2).fill(0);
        let reference_expansion = Array1::from(vec![1., 2., 4., 8.]);
        assert!(matches!(
            fit_fitness(&reads, &reference_expansion),
            Err(FitsimError::SingularRegression(_))
        ));
    }

    #[test]
    fn single_replicate_single_timepoint() {
        let reads = Array3::from_elem((3, 1, 1), 100u64);
        let fit = fit_fitness(&reads, &Array1::from(vec![1.])).unwrap();
        assert!(fit.beta.iter().all(|&beta| beta == 0.));
    }
}
