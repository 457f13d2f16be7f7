//! Random elementary automorphisms.
//!
//! The sampler draws from the inverters `x_i ↦ x_i⁻¹` and the multipliers
//! `x_i ↦ x_i x_j`, `x_i ↦ x_j x_i` by positive `j ≠ i`. First a Bernoulli
//! draw picks the kind, then one uniform draw picks the generator within it.
//! Given a seed the sequence of draws is fully reproducible.

use crate::endomorphism::Endomorphism;
use crate::symbol::TerminalSymbol;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use tracing::debug;

/// Settings for building a [`UniformAutomorphismSlpGenerator`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Rank of the free group.
    pub rank: i32,
    /// Seed of the random engine; `None` seeds from system entropy.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Probability of drawing an inverter; `None` uses the share of inverters
    /// among all generators.
    #[serde(default)]
    pub inverters_probability: Option<f64>,
}

impl GeneratorConfig {
    /// Settings for `rank` with entropy seeding and the default probability.
    pub fn new(rank: i32) -> Self {
        Self {
            rank,
            seed: None,
            inverters_probability: None,
        }
    }

    /// Fixes the seed of the random engine.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Overrides the probability of drawing an inverter.
    pub fn with_inverters_probability(mut self, probability: f64) -> Self {
        self.inverters_probability = Some(probability);
        self
    }
}

/// Share of inverters among the `rank + 2·rank·(rank−1)` sampled generators.
pub fn default_inverters_probability(rank: i32) -> f64 {
    let rank = f64::from(rank);
    rank / (rank + 2.0 * rank * (rank - 1.0))
}

/// Stateful uniform sampler of elementary automorphisms.
#[derive(Debug, Clone)]
pub struct UniformAutomorphismSlpGenerator<S = i32, R = StdRng> {
    rank: i32,
    inverters_probability: f64,
    rng: R,
    _symbol: PhantomData<fn() -> S>,
}

impl<S: TerminalSymbol> UniformAutomorphismSlpGenerator<S, StdRng> {
    /// Creates a sampler seeded from system entropy.
    pub fn new(rank: i32) -> Self {
        Self::with_engine(rank, StdRng::from_entropy())
    }

    /// Creates a reproducible sampler.
    pub fn with_seed(rank: i32, seed: u64) -> Self {
        debug!(rank, seed, "seeded automorphism sampler");
        Self::with_engine(rank, StdRng::seed_from_u64(seed))
    }

    /// Builds a sampler from its settings.
    ///
    /// # Panics
    /// Panics if the rank is not positive or the probability is outside `[0, 1]`.
    pub fn from_config(config: &GeneratorConfig) -> Self {
        let mut generator = match config.seed {
            Some(seed) => Self::with_seed(config.rank, seed),
            None => Self::new(config.rank),
        };
        if let Some(probability) = config.inverters_probability {
            generator.set_inverters_probability(probability);
        }
        generator
    }
}

impl<S: TerminalSymbol, R: RngCore> UniformAutomorphismSlpGenerator<S, R> {
    /// Creates a sampler drawing from the given engine.
    ///
    /// # Panics
    /// Panics if `rank` is not positive.
    pub fn with_engine(rank: i32, rng: R) -> Self {
        assert!(rank > 0, "rank must be positive, got {rank}");
        Self {
            rank,
            inverters_probability: default_inverters_probability(rank),
            rng,
            _symbol: PhantomData,
        }
    }

    /// Sets the probability of drawing an inverter.
    ///
    /// # Panics
    /// Panics if `probability` is outside `[0, 1]`.
    pub fn set_inverters_probability(&mut self, probability: f64) {
        assert!(
            (0.0..=1.0).contains(&probability),
            "inverters probability must lie in [0, 1], got {probability}"
        );
        self.inverters_probability = probability;
    }

    /// Current probability of drawing an inverter.
    pub fn inverters_probability(&self) -> f64 {
        self.inverters_probability
    }

    /// Rank of the free group the draws act on.
    pub fn rank(&self) -> i32 {
        self.rank
    }

    /// Draws the next elementary automorphism.
    ///
    /// With rank 1 there are no multipliers and every draw is the inverter.
    pub fn generate(&mut self) -> Endomorphism<S> {
        let multipliers = 2 * self.rank * (self.rank - 1);
        if multipliers == 0 || self.rng.gen_bool(self.inverters_probability) {
            let symbol = 1 + self.rng.gen_range(0..self.rank);
            return Endomorphism::inverter(S::from_index(symbol));
        }

        let mut draw = self.rng.gen_range(0..multipliers);
        let right = draw % 2 == 0;
        draw >>= 1;
        let mapped = 1 + draw % self.rank;
        let index = 1 + draw / self.rank;
        // skip the mapped symbol itself
        let multiplier = if index < mapped { index } else { index + 1 };

        let (mapped, multiplier) = (S::from_index(mapped), S::from_index(multiplier));
        if right {
            Endomorphism::right_multiplier(mapped, multiplier)
        } else {
            Endomorphism::left_multiplier(multiplier, mapped)
        }
    }
}

/// An endless stream of draws.
impl<S: TerminalSymbol, R: RngCore> Iterator for UniformAutomorphismSlpGenerator<S, R> {
    type Item = Endomorphism<S>;

    fn next(&mut self) -> Option<Endomorphism<S>> {
        Some(self.generate())
    }
}
