//! Strain bookkeeping.
//!
//! Every simulation tracks the same fixed order of strains: the wild-type first, then the
//! non-growing spike-in reference, then the mutants in the order they were given.

/// Index of the wild-type strain.
pub const WILDTYPE: usize = 0;

/// Index of the spike-in reference strain.
pub const SPIKE_IN: usize = 1;

pub const WILDTYPE_FITNESS: f64 = 1.;
pub const SPIKE_IN_FITNESS: f64 = 0.;

/// Per-strain fitness multipliers in simulation order.
#[derive(Clone, Debug, PartialEq)]
pub struct StrainVector {
    fitness: Vec<f64>,
}

impl StrainVector {
    pub fn new(mutant_fitness: &[f64]) -> Self {
        let mut fitness = Vec::with_capacity(mutant_fitness.len() + 2);
        fitness.push(WILDTYPE_FITNESS);
        fitness.push(SPIKE_IN_FITNESS);
        fitness.extend_from_slice(mutant_fitness);
        Self { fitness }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.fitness.len()
    }

    /// Always false, the wild-type and the spike-in are always present.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fitness.is_empty()
    }

    pub fn n_mutants(&self) -> usize {
        self.fitness.len() - 2
    }

    pub fn fitness(&self) -> &[f64] {
        &self.fitness
    }

    pub fn mutant_fitness(&self) -> &[f64] {
        &self.fitness[2..]
    }

    /// Human readable name of the strain at `index`.
    pub fn label(index: usize) -> String {
        match index {
            WILDTYPE => "wildtype".to_string(),
            SPIKE_IN => "spike_in".to_string(),
            mutant => format!("mutant_{}", mutant - 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_order() {
        let strains = StrainVector::new(&[0.5, 2., 0.2]);
        assert_eq!(strains.fitness(), &[1., 0., 0.5, 2., 0.2]);
        assert_eq!(strains.len(), 5);
        assert_eq!(strains.n_mutants(), 3);
        assert_eq!(strains.mutant_fitness(), &[0.5, 2., 0.2]);
        assert!(!strains.is_empty());
    }

    #[test]
    fn without_mutants() {
        let strains = StrainVector::new(&[]);
        assert_eq!(strains.fitness(), &[WILDTYPE_FITNESS, SPIKE_IN_FITNESS]);
        assert_eq!(strains.n_mutants(), 0);
    }

    #[test]
    fn labels() {
        assert_eq!(StrainVector::label(0), "wildtype");
        assert_eq!(StrainVector::label(1), "spike_in");
        assert_eq!(StrainVector::label(2), "mutant_1");
        assert_eq!(StrainVector::label(4), "mutant_3");
    }
}
