//! Configuration data structures for simulated competition assays.

mod parameters;
mod settings;

pub use parameters::{GrowthParameters, MAX_TIME, NumericParameters, SamplingParameters};
pub use settings::{DEFAULT_SEED, Settings, SettingsError};
