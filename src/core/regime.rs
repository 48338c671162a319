//! Four-state Markov market-regime chain. A regime holds for a uniformly
//! drawn 3-8 month spell, then transitions along its matrix row; the chain
//! has no terminal state and runs for the whole simulated horizon.

use rand::Rng;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Regime {
    Bull,
    Bear,
    Sideways,
    Volatile,
}

/// Multipliers applied to the monthly base parameters while a regime is
/// active. The bear return multiplier is negative: it flips the drift.
#[derive(Copy, Clone, Debug)]
pub struct RegimeMultipliers {
    pub return_mean: f64,
    pub return_vol: f64,
    pub premium: f64,
}

const REGIMES: [Regime; 4] = [Regime::Bull, Regime::Bear, Regime::Sideways, Regime::Volatile];

const INITIAL_PROBS: [f64; 4] = [0.35, 0.15, 0.35, 0.15];

// Row = current regime, column = next; rows are stochastic.
const TRANSITIONS: [[f64; 4]; 4] = [
    [0.50, 0.05, 0.30, 0.15],
    [0.10, 0.40, 0.20, 0.30],
    [0.30, 0.10, 0.40, 0.20],
    [0.15, 0.30, 0.25, 0.30],
];

const MIN_DURATION_MONTHS: u32 = 3;
const MAX_DURATION_MONTHS: u32 = 8;

impl Regime {
    fn index(self) -> usize {
        match self {
            Regime::Bull => 0,
            Regime::Bear => 1,
            Regime::Sideways => 2,
            Regime::Volatile => 3,
        }
    }

    pub fn multipliers(self) -> RegimeMultipliers {
        match self {
            Regime::Bull => RegimeMultipliers {
                return_mean: 1.5,
                return_vol: 0.8,
                premium: 0.8,
            },
            Regime::Bear => RegimeMultipliers {
                return_mean: -2.0,
                return_vol: 1.5,
                premium: 1.4,
            },
            Regime::Sideways => RegimeMultipliers {
                return_mean: 0.0,
                return_vol: 0.6,
                premium: 0.7,
            },
            Regime::Volatile => RegimeMultipliers {
                return_mean: 0.5,
                return_vol: 2.0,
                premium: 1.8,
            },
        }
    }

    pub fn sample_initial(rng: &mut impl Rng) -> Self {
        sample_categorical(&INITIAL_PROBS, rng)
    }

    pub fn transition(self, rng: &mut impl Rng) -> Self {
        sample_categorical(&TRANSITIONS[self.index()], rng)
    }
}

fn sample_categorical(probs: &[f64; 4], rng: &mut impl Rng) -> Regime {
    let u: f64 = rng.gen_range(0.0..1.0);
    let mut cumulative = 0.0;
    for (regime, p) in REGIMES.iter().zip(probs) {
        cumulative += p;
        if u < cumulative {
            return *regime;
        }
    }
    // u landed in the float dust above the last cumulative bound
    REGIMES[3]
}

fn sample_duration(rng: &mut impl Rng) -> u32 {
    rng.gen_range(MIN_DURATION_MONTHS..=MAX_DURATION_MONTHS)
}

/// Per-path chain state: the active regime and the months left in its spell.
#[derive(Debug, Clone, Copy)]
pub struct RegimeChain {
    regime: Regime,
    months_left: u32,
}

impl RegimeChain {
    pub fn start(rng: &mut impl Rng) -> Self {
        Self {
            regime: Regime::sample_initial(rng),
            months_left: sample_duration(rng),
        }
    }

    /// Advances the chain by one month: transition when the spell has
    /// expired, then consume one month of the active spell.
    pub fn advance(&mut self, rng: &mut impl Rng) {
        if self.months_left == 0 {
            self.regime = self.regime.transition(rng);
            self.months_left = sample_duration(rng);
        }
        self.months_left -= 1;
    }

    pub fn regime(&self) -> Regime {
        self.regime
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn transition_rows_are_stochastic() {
        for row in TRANSITIONS {
            let sum: f64 = row.iter().sum();
            assert!((sum - 1.0).abs() < 1e-12, "row sums to {sum}");
        }
        assert!((INITIAL_PROBS.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn durations_stay_in_the_three_to_eight_band() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1_000 {
            let d = sample_duration(&mut rng);
            assert!((3..=8).contains(&d), "duration {d}");
        }
    }

    #[test]
    fn initial_distribution_matches_configured_weights() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut counts = [0u32; 4];
        let draws = 100_000;
        for _ in 0..draws {
            counts[Regime::sample_initial(&mut rng).index()] += 1;
        }
        for (count, expected) in counts.iter().zip(INITIAL_PROBS) {
            let freq = *count as f64 / draws as f64;
            assert!(
                (freq - expected).abs() < 0.01,
                "frequency {freq} vs weight {expected}"
            );
        }
    }

    #[test]
    fn bull_transitions_follow_their_matrix_row() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut counts = [0u32; 4];
        let draws = 100_000;
        for _ in 0..draws {
            counts[Regime::Bull.transition(&mut rng).index()] += 1;
        }
        for (count, expected) in counts.iter().zip(TRANSITIONS[Regime::Bull.index()]) {
            let freq = *count as f64 / draws as f64;
            assert!(
                (freq - expected).abs() < 0.01,
                "frequency {freq} vs weight {expected}"
            );
        }
    }

    #[test]
    fn chain_consumes_its_spell_before_transitioning() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut chain = RegimeChain::start(&mut rng);
        let first = chain.regime();
        let spell = chain.months_left;
        // the spell it started with is consumed without a transition
        for _ in 0..spell {
            chain.advance(&mut rng);
            assert_eq!(chain.regime(), first);
        }
    }
}
