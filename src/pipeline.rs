//! One simulated competition assay from inoculation to fitted fitness.

use crate::config::{GrowthParameters, NumericParameters, SamplingParameters, Settings};
use crate::core::estimate::{fit_fitness, fit_fitness_spike};
use crate::core::growth::simulate_growth;
use crate::core::reads::sample_reads;
use crate::core::{FitnessFit, GrowthCurves, RandomnessProvider, ReadCounts};
use crate::errors::Result;

/// Everything one run of the experiment produces.
#[derive(Clone, Debug)]
pub struct Outcome {
    pub seed: u64,
    /// Growth curves on the fine time grid.
    pub growth: GrowthCurves,
    /// Growth curves on the sampled timepoints.
    pub assay: GrowthCurves,
    pub reads: ReadCounts,
    pub reference_fit: FitnessFit,
    pub spike_fit: FitnessFit,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Experiment {
    growth: GrowthParameters,
    sampling: SamplingParameters,
    numerics: NumericParameters,
}

impl Experiment {
    pub fn new(
        growth: GrowthParameters,
        sampling: SamplingParameters,
        numerics: NumericParameters,
    ) -> Self {
        Self {
            growth,
            sampling,
            numerics,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.growth.clone(),
            settings.sampling.clone(),
            settings.numerics.clone(),
        )
    }

    /// Growth curves on the fine time grid.
    pub fn simulate_growth(&self, randomness: &RandomnessProvider) -> Result<GrowthCurves> {
        simulate_growth(&self.growth, &self.numerics, randomness)
    }

    /// Run growth, sampling and both fits with all randomness derived from `seed`.
    pub fn run(&self, seed: u64) -> Result<Outcome> {
        let randomness = RandomnessProvider::new(seed);
        log::debug!("Running experiment with seed {seed}");

        let growth = self.simulate_growth(&randomness)?;

        // the assay samples fewer timepoints from the same inoculum
        let assay_parameters = GrowthParameters {
            n_timepoints: self.sampling.n_timepoints,
            ..self.growth.clone()
        };
        let assay = simulate_growth(&assay_parameters, &self.numerics, &randomness)?;
        let reads = sample_reads(&assay.population, &self.sampling, &self.numerics, &randomness)?;

        let reference_fit = fit_fitness(&reads.reads, &assay.reference_expansion)?;
        let spike_fit = fit_fitness_spike(&reference_fit.log_ratio)?;
        log::info!(
            "seed={seed} relative_fitness={} spike_relative_fitness={}",
            reference_fit.relative_fitness(),
            spike_fit.relative_fitness()
        );

        Ok(Outcome {
            seed,
            growth,
            assay,
            reads,
            reference_fit,
            spike_fit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::strains::WILDTYPE;
    use crate::errors::FitsimError;

    fn experiment() -> Experiment {
        Experiment::from_settings(&Settings::default())
    }

    #[test]
    fn default_scenario() {
        let outcome = experiment().run(42).unwrap();

        assert_eq!(outcome.growth.population.dim(), (5, 100));
        assert!(outcome.growth.population.iter().all(|&count| count >= 0.));
        assert!(
            outcome
                .growth
                .total_population()
                .iter()
                .all(|&total| total <= 10_000. * (1. + 1e-6))
        );

        assert_eq!(outcome.reads.reads.dim(), (5, 10, 3));
        assert_eq!(outcome.reference_fit.beta.len(), 5);
        assert_eq!(outcome.spike_fit.beta.len(), 5);
        assert!(outcome.reference_fit.beta[WILDTYPE].abs() < 1e-9);
    }

    #[test]
    fn same_inoculum_on_both_grids() {
        let outcome = experiment().run(3).unwrap();
        assert_eq!(outcome.growth.inoculum, outcome.assay.inoculum);
        let last_fine = outcome.growth.population.column(99);
        let last_assay = outcome.assay.population.column(9);
        for (fine, assay) in last_fine.iter().zip(last_assay.iter()) {
            assert!((fine - assay).abs() < 1e-4 * fine.max(1.));
        }
    }

    #[test]
    fn bit_identical_reruns() {
        let experiment = experiment();
        let a = experiment.run(17).unwrap();
        let b = experiment.run(17).unwrap();
        assert_eq!(a.growth.population, b.growth.population);
        assert_eq!(a.reads.sampled, b.reads.sampled);
        assert_eq!(a.reads.reads, b.reads.reads);
        assert_eq!(a.reference_fit.beta, b.reference_fit.beta);
        assert_eq!(a.spike_fit.beta, b.spike_fit.beta);
    }

    #[test]
    fn exponential_estimates_are_close() {
        let mut settings = Settings::default();
        settings.growth.capacity_multiplier = None;
        settings.growth.max_time = 3.;
        let outcome = Experiment::from_settings(&settings).run(42).unwrap();
        let relative = outcome.reference_fit.relative_fitness();
        for (mutant, &fitness) in settings.growth.mutant_fitness.iter().enumerate() {
            assert!(
                (relative[mutant + 2] - fitness).abs() < 0.1,
                "estimated {} for {fitness}",
                relative[mutant + 2]
            );
        }
    }

    #[test]
    fn low_inoculum_runs_return_results_or_errors() {
        let mut settings = Settings::default();
        settings.growth.inoculum_mean = 10.;
        settings.growth.capacity_multiplier = None;
        let experiment = Experiment::from_settings(&settings);
        for seed in 0..20 {
            // sparse reads may leave a strain without a finite log ratio
            if let Err(err) = experiment.run(seed) {
                assert!(
                    matches!(
                        err,
                        FitsimError::SingularRegression(_) | FitsimError::ExtinctReference(_)
                    ),
                    "seed {seed}: {err}"
                );
            }
        }
    }
}
