//! Competitive growth of the strain population.
//!
//! Strains start from an overdispersed inoculum and grow either without limit or while competing
//! for one shared carrying capacity. The latter is a coupled ODE system that is handed to an
//! adaptive Dormand-Prince solver, which reports the solution on the requested time grid through
//! its dense output.

use nalgebra::DVector;
use ndarray::{Array1, Array2, Axis};
use ode_solvers::System;
use ode_solvers::dopri5::Dopri5;
use rand_distr::Distribution;

use crate::config::{GrowthParameters, NumericParameters};
use crate::core::distributions::{CountDistribution, DegeneracyPolicy};
use crate::core::random::{RandomnessProvider, Stage};
use crate::core::strains::{StrainVector, WILDTYPE};
use crate::errors::{FitsimError, Result};

/// How the strains share their environment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GrowthModel {
    /// Every strain grows as `n0 * exp(fitness * t)`.
    Exponential,
    /// All strains draw from one carrying capacity `capacity`.
    SharedCapacity { capacity: f64 },
}

impl GrowthModel {
    pub fn from_parameters(parameters: &GrowthParameters, n_strains: usize) -> Result<Self> {
        let multiplier = match parameters.capacity_multiplier {
            Some(multiplier) => multiplier,
            None => return Ok(GrowthModel::Exponential),
        };
        let capacity = parameters.inoculum_mean * multiplier;
        if !capacity.is_finite() || capacity <= 0. {
            return Err(FitsimError::CapacityError(format!(
                "carrying capacity must be positive, got {capacity}"
            )));
        }
        if capacity < n_strains as f64 {
            return Err(FitsimError::CapacityError(format!(
                "carrying capacity {capacity} cannot hold {n_strains} strains"
            )));
        }
        Ok(GrowthModel::SharedCapacity { capacity })
    }
}

/// Population trajectory of one simulation.
#[derive(Clone, Debug)]
pub struct GrowthCurves {
    pub strains: StrainVector,
    pub time: Array1<f64>,
    pub inoculum: Array1<f64>,
    /// Wild-type population relative to its inoculum.
    pub reference_expansion: Array1<f64>,
    /// Cells per strain (rows) and timepoint (columns).
    pub population: Array2<f64>,
}

impl GrowthCurves {
    /// Summed population across strains at each timepoint.
    pub fn total_population(&self) -> Array1<f64> {
        self.population.sum_axis(Axis(0))
    }
}

/// Simulate the growth of the wild-type, the spike-in and all mutants.
pub fn simulate_growth(
    parameters: &GrowthParameters,
    numerics: &NumericParameters,
    randomness: &RandomnessProvider,
) -> Result<GrowthCurves> {
    let strains = StrainVector::new(&parameters.mutant_fitness);
    let model = GrowthModel::from_parameters(parameters, strains.len())?;
    let time = time_grid(parameters.n_timepoints, parameters.max_time)?;
    let inoculum = draw_inoculum(
        parameters.inoculum_mean,
        parameters.inoculum_dispersion,
        strains.len(),
        numerics.degeneracy,
        randomness,
    )?;
    log::debug!("Simulating {model:?} growth from inoculum {inoculum}");

    let population = match model {
        GrowthModel::Exponential => grow_exponential(&time, &inoculum, strains.fitness()),
        GrowthModel::SharedCapacity { capacity } => {
            grow_shared_capacity(&time, &inoculum, strains.fitness(), capacity, numerics)?
        }
    };
    let reference_expansion = reference_expansion(&population, &inoculum)?;

    Ok(GrowthCurves {
        strains,
        time,
        inoculum,
        reference_expansion,
        population,
    })
}

/// Evenly spaced timepoints from zero to `max_time`, both included.
pub fn time_grid(n_timepoints: usize, max_time: f64) -> Result<Array1<f64>> {
    if n_timepoints == 0 {
        return Err(FitsimError::DimensionMismatch(
            "time grid needs at least one timepoint".to_string(),
        ));
    }
    Ok(Array1::linspace(0., max_time, n_timepoints))
}

/// Draw the initial cell count of each strain.
pub fn draw_inoculum(
    mean: f64,
    dispersion: f64,
    n_strains: usize,
    policy: DegeneracyPolicy,
    randomness: &RandomnessProvider,
) -> Result<Array1<f64>> {
    if !mean.is_finite() || mean <= 0. {
        return Err(FitsimError::InvalidDistributionParameters(format!(
            "inoculum mean must be positive, got {mean}"
        )));
    }
    let distribution = CountDistribution::overdispersed(mean, dispersion, policy)?;
    let mut rng = randomness.stream(Stage::Inoculum, 0);
    Ok((0..n_strains)
        .map(|_| distribution.sample(&mut rng) as f64)
        .collect())
}

pub fn grow_exponential(
    time: &Array1<f64>,
    inoculum: &Array1<f64>,
    fitness: &[f64],
) -> Array2<f64> {
    Array2::from_shape_fn((inoculum.len(), time.len()), |(strain, timepoint)| {
        inoculum[strain] * (fitness[strain] * time[timepoint]).exp()
    })
}

/// Logistic competition: `dn_i/dt = w_i * n_i * (1 - sum_j n_j / K)`.
#[derive(Clone, Debug)]
struct SharedCapacity {
    fitness: DVector<f64>,
    capacity: f64,
}

impl System<f64, DVector<f64>> for SharedCapacity {
    fn system(&self, _t: f64, y: &DVector<f64>, dy: &mut DVector<f64>) {
        let crowding = 1. - y.sum() / self.capacity;
        for ((rate, &count), &fitness) in dy.iter_mut().zip(y.iter()).zip(self.fitness.iter()) {
            *rate = fitness * count * crowding;
        }
    }
}

pub fn grow_shared_capacity(
    time: &Array1<f64>,
    inoculum: &Array1<f64>,
    fitness: &[f64],
    capacity: f64,
    numerics: &NumericParameters,
) -> Result<Array2<f64>> {
    let n_timepoints = time.len();
    let mut population = Array2::zeros((inoculum.len(), n_timepoints));
    population.column_mut(0).assign(inoculum);
    if n_timepoints == 1 {
        return Ok(population);
    }

    let max_time = time[n_timepoints - 1];
    let spacing = max_time / (n_timepoints - 1) as f64;
    if !spacing.is_finite() || spacing <= 0. {
        return Err(FitsimError::IntegrationError(format!(
            "time horizon must be positive, got {max_time}"
        )));
    }

    let system = SharedCapacity {
        fitness: DVector::from_vec(fitness.to_vec()),
        capacity,
    };
    let initial = DVector::from_iterator(inoculum.len(), inoculum.iter().copied());

    // half a step past the horizon, so that rounding in the accumulated output times cannot
    // drop the last grid point
    let mut stepper = Dopri5::new(
        system,
        0.,
        max_time + 0.5 * spacing,
        spacing,
        initial,
        numerics.rtol,
        numerics.atol,
    );
    stepper
        .integrate()
        .map_err(|err| FitsimError::IntegrationError(format!("{err:?}")))?;

    let tolerance = 1e-9 * max_time.max(1.);
    let solution_times = stepper.x_out();
    let solution_states = stepper.y_out();
    let mut cursor = 0;
    for (timepoint, &t) in time.iter().enumerate().skip(1) {
        while cursor < solution_times.len() && solution_times[cursor] < t - tolerance {
            cursor += 1;
        }
        if cursor == solution_times.len() || (solution_times[cursor] - t).abs() > tolerance {
            return Err(FitsimError::IntegrationError(format!(
                "solver produced no solution at t={t}"
            )));
        }
        for (strain, &count) in solution_states[cursor].iter().enumerate() {
            population[[strain, timepoint]] = count;
        }
    }
    log::trace!(
        "Integrated {} strains over {} solver outputs",
        inoculum.len(),
        solution_times.len()
    );

    Ok(population)
}

pub fn reference_expansion(
    population: &Array2<f64>,
    inoculum: &Array1<f64>,
) -> Result<Array1<f64>> {
    let initial = inoculum[WILDTYPE];
    if initial <= 0. {
        return Err(FitsimError::ExtinctReference(
            "wild-type inoculum is empty".to_string(),
        ));
    }
    Ok(population.row(WILDTYPE).mapv(|count| count / initial))
}
