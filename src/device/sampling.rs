//! Simulated sensor sampling.
//!
//! The field unit draws its flow and leak samples through the
//! [`SampleSource`] port so the randomness is replaceable: production
//! wires in a seeded ChaCha8 generator (identical seeds replay
//! identical runs), tests script exact sequences.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Read-side port for the simulated physics: one flow sample and one
/// leak draw per device tick.
pub trait SampleSource {
    /// Water flow sample in litres/minute.
    fn flow_lpm(&mut self) -> f64;

    /// Whether a leak is present this tick.
    fn leak(&mut self) -> bool;
}

/// Production sampler: uniform flow on `[0, max_flow_lpm]` and a
/// Bernoulli leak draw, both from one deterministic stream.
pub struct SimSampler {
    rng: ChaCha8Rng,
    max_flow_lpm: f64,
    leak_probability: f64,
}

impl SimSampler {
    pub fn seeded(seed: u64, max_flow_lpm: f64, leak_probability: f64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            max_flow_lpm,
            leak_probability,
        }
    }

    pub fn from_entropy(max_flow_lpm: f64, leak_probability: f64) -> Self {
        Self {
            rng: ChaCha8Rng::from_entropy(),
            max_flow_lpm,
            leak_probability,
        }
    }
}

impl SampleSource for SimSampler {
    fn flow_lpm(&mut self) -> f64 {
        self.rng.gen_range(0.0..=self.max_flow_lpm)
    }

    fn leak(&mut self) -> bool {
        self.rng.gen_bool(self.leak_probability)
    }
}

/// Deterministic playback sampler for tests: pops scripted values and
/// repeats the last one once the script runs out.
pub struct ScriptedSamples {
    flows: Vec<f64>,
    leaks: Vec<bool>,
    next_flow: usize,
    next_leak: usize,
}

impl ScriptedSamples {
    pub fn new(flows: Vec<f64>, leaks: Vec<bool>) -> Self {
        Self {
            flows,
            leaks,
            next_flow: 0,
            next_leak: 0,
        }
    }
}

impl SampleSource for ScriptedSamples {
    fn flow_lpm(&mut self) -> f64 {
        let i = self.next_flow.min(self.flows.len().saturating_sub(1));
        self.next_flow += 1;
        self.flows.get(i).copied().unwrap_or(0.0)
    }

    fn leak(&mut self) -> bool {
        let i = self.next_leak.min(self.leaks.len().saturating_sub(1));
        self.next_leak += 1;
        self.leaks.get(i).copied().unwrap_or(false)
    }
}
