//! Simulation of competition assays: strains compete for a shared resource, the population is
//! sampled destructively and sequenced, and each mutant's fitness is estimated back from the
//! read counts.

pub mod args;
pub mod config;
pub mod core;
pub mod errors;
pub mod pipeline;
pub mod runner;
pub mod stats;

pub use crate::core::estimate::{fit_fitness, fit_fitness_spike};
pub use crate::core::growth::simulate_growth;
pub use crate::core::reads::sample_reads;
pub use crate::errors::{FitsimError, Result};
