//! Settings module.

use super::parameters::{GrowthParameters, NumericParameters, SamplingParameters};

use serde::{Deserialize, Serialize};
use std::fs;

/// Default seed of the randomness provider.
pub const DEFAULT_SEED: u64 = 42;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Base seed; trial `i` runs with `seed + i`.
    pub seed: u64,

    /// Number of independent repetitions of the experiment.
    pub trials: usize,

    pub growth: GrowthParameters,
    pub sampling: SamplingParameters,
    pub numerics: NumericParameters,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            trials: 1,
            growth: GrowthParameters::default(),
            sampling: SamplingParameters::default(),
            numerics: NumericParameters::default(),
        }
    }
}

#[derive(Debug)]
pub enum SettingsError {
    IoError(std::io::Error),
    YamlError(serde_yaml::Error),
}

impl std::error::Error for SettingsError {}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsError::IoError(error) => write!(formatter, "IO error: {}", error),
            SettingsError::YamlError(error) => write!(formatter, "YAML error: {}", error),
        }
    }
}

impl std::fmt::Display for Settings {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut output = vec![];
        self.write(&mut output).map_err(|_| std::fmt::Error)?;
        let yaml = String::from_utf8(output).map_err(|_| std::fmt::Error)?;
        write!(formatter, "{}", yaml)
    }
}

impl Settings {
    pub fn write(&self, writer: &mut dyn std::io::Write) -> Result<(), SettingsError> {
        serde_yaml::to_writer(writer, self).map_err(SettingsError::YamlError)
    }

    pub fn read(reader: &mut dyn std::io::Read) -> Result<Settings, SettingsError> {
        serde_yaml::from_reader(reader).map_err(SettingsError::YamlError)
    }

    pub fn write_to_file(&self, filename: &str) -> Result<(), SettingsError> {
        let file = fs::File::create(filename).map_err(SettingsError::IoError)?;
        let mut writer = std::io::BufWriter::new(file);
        self.write(&mut writer)
    }

    pub fn read_from_file(filename: &str) -> Result<Settings, SettingsError> {
        let file = fs::File::open(filename).map_err(SettingsError::IoError)?;
        let mut reader = std::io::BufReader::new(file);
        Self::read(&mut reader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::distributions::DegeneracyPolicy;
    use crate::core::reads::DepthBudget;

    #[test]
    fn read_write() {
        let settings = Settings {
            seed: 7,
            trials: 20,
            growth: GrowthParameters {
                inoculum_mean: 500.,
                inoculum_dispersion: 0.01,
                capacity_multiplier: None,
                mutant_fitness: vec![1.5, 0.8],
                n_timepoints: 50,
                max_time: 3.,
            },
            sampling: SamplingParameters {
                sample_fraction: 0.2,
                sequencing_depth: 2_000.,
                replicate_count: 4,
                noise_dispersion: 0.05,
                n_timepoints: 6,
                depth_budget: DepthBudget::PerStrain,
            },
            numerics: NumericParameters {
                rtol: 1e-6,
                atol: 1e-4,
                degeneracy: DegeneracyPolicy::Fail,
            },
        };
        let mut output = vec![];
        settings.write(&mut output).unwrap();
        let settings2 = Settings::read(&mut &output[..]).unwrap();
        assert_eq!(settings, settings2);
    }

    #[test]
    fn empty_document_is_default() {
        let settings = Settings::read(&mut "{}".as_bytes()).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn read_write_file() {
        let tmp_dir = std::env::temp_dir().join("fitsim_test_settings.yaml");
        let path = tmp_dir.to_str().unwrap();
        let settings = Settings {
            trials: 3,
            ..Settings::default()
        };
        settings.write_to_file(path).unwrap();
        let read_settings = Settings::read_from_file(path).unwrap();
        assert_eq!(read_settings, settings);
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn missing_file() {
        assert!(matches!(
            Settings::read_from_file("/nonexistent/fitsim.yaml"),
            Err(SettingsError::IoError(_))
        ));
    }
}
