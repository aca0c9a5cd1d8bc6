use anyhow::Result;

use indicatif::{ProgressBar, ProgressStyle};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use std::io;

use crate::args::Args;
use crate::config::Settings;
use crate::core::{FitnessFit, StrainVector};
use crate::errors::FitsimError;
use crate::pipeline::{Experiment, Outcome};
use crate::stats::FitnessAccuracy;

pub struct Runner {
    args: Args,
    settings: Settings,
    experiment: Experiment,
}

impl Runner {
    pub fn new(args: Args) -> Result<Runner> {
        Self::setup_logger(&args);
        #[cfg(feature = "parallel")]
        Self::setup_rayon(&args);
        #[cfg(not(feature = "parallel"))]
        if args.threads.is_some() {
            log::warn!("Ignoring --threads, built without the parallel feature.");
        }

        let mut settings = Self::load_settings(args.settings.as_deref())?;
        if let Some(seed) = args.seed {
            settings.seed = seed;
        }
        if let Some(trials) = args.trials {
            settings.trials = trials;
        }
        let experiment = Experiment::from_settings(&settings);

        Ok(Self {
            args,
            settings,
            experiment,
        })
    }

    pub fn start(&self) -> Result<()> {
        if self.args.dump_settings {
            print!("{}", self.settings);
            return Ok(());
        }
        let outcomes = self.run()?;
        self.report(&outcomes)
    }

    /// Setup logging level and file
    fn setup_logger(args: &Args) {
        let log_level = match args.verbose {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        };
        simple_logging::log_to_file(args.log_file.as_str(), log_level).unwrap_or_else(|_| {
            eprintln!("Unable to open log file.");
            std::process::exit(1);
        });
    }

    /// Setup rayon thread pool
    #[cfg(feature = "parallel")]
    fn setup_rayon(args: &Args) {
        if let Some(n_threads) = args.threads {
            log::info!("Setting number of threads to {}.", n_threads);
            rayon::ThreadPoolBuilder::new()
                .num_threads(n_threads)
                .build_global()
                .unwrap_or_else(|_| {
                    eprintln!("Unable to set number of threads.");
                    std::process::exit(1);
                });
        }
    }

    /// Load settings from file, or fall back to defaults
    fn load_settings(path: Option<&str>) -> Result<Settings> {
        let settings = match path {
            Some(path) => Settings::read_from_file(path)?,
            None => Settings::default(),
        };
        log::info!("Loaded settings\n{}", settings);
        Ok(settings)
    }

    fn progress_bar(&self) -> Option<ProgressBar> {
        if self.args.disable_progress_bar {
            return None;
        }
        let bar = ProgressBar::new(self.settings.trials as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template(
                    "[{bar:40}] {pos:>7}/{len:7} [{elapsed_precise} / {duration_precise}] {msg}",
                )
                .expect("Unable to create template.")
                .progress_chars("=> "),
        );
        Some(bar)
    }

    /// Run all trials, each with its own seed.
    fn run(&self) -> Result<Vec<Outcome>> {
        let bar = self.progress_bar();
        let run_trial = |trial: usize| {
            let seed = self.settings.seed.wrapping_add(trial as u64);
            let outcome = self.experiment.run(seed);
            if let Some(bar) = bar.as_ref() {
                bar.inc(1);
            }
            outcome
        };

        #[cfg(feature = "parallel")]
        let outcomes: Result<Vec<Outcome>, FitsimError> =
            (0..self.settings.trials).into_par_iter().map(run_trial).collect();
        #[cfg(not(feature = "parallel"))]
        let outcomes: Result<Vec<Outcome>, FitsimError> =
            (0..self.settings.trials).map(run_trial).collect();

        if let Some(bar) = bar {
            bar.finish_with_message("Done.");
        }
        let outcomes = outcomes?;
        log::info!("Finished {} trials.", outcomes.len());
        Ok(outcomes)
    }

    /// Write the accuracy of both estimators as csv to stdout.
    fn report(&self, outcomes: &[Outcome]) -> Result<()> {
        let strains = StrainVector::new(&self.settings.growth.mutant_fitness);
        let reference_fits: Vec<FitnessFit> = outcomes
            .iter()
            .map(|outcome| outcome.reference_fit.clone())
            .collect();
        let spike_fits: Vec<FitnessFit> = outcomes
            .iter()
            .map(|outcome| outcome.spike_fit.clone())
            .collect();

        let mut writer = csv::Writer::from_writer(io::stdout());
        for row in reference_fits
            .accuracy(&strains)?
            .into_iter()
            .chain(spike_fits.accuracy(&strains)?)
        {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}
