use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use rand_distr::StandardNormal;
use rayon::prelude::*;
use tracing::info;

use super::params::distribution_stats;
use super::regime::{RegimeChain, RegimeMultipliers};
use super::stats::summarize;
use super::types::{PathOutcomes, SimulationOutput, SimulationParameters, SimulationRequest};

pub(crate) const NAV_FLOOR: f64 = 0.01;
pub(crate) const VOL_UPLIFT_SCALE: f64 = 5.0;
pub(crate) const DISTRIBUTION_NAV_CAP: f64 = 0.15;
pub(crate) const PREMIUM_PASSTHROUGH: f64 = 0.95;

const NEUTRAL_MULTIPLIERS: RegimeMultipliers = RegimeMultipliers {
    return_mean: 1.0,
    return_vol: 1.0,
    premium: 1.0,
};

/// A simulation engine produces the four raw per-path arrays for a request.
/// The looped and vectorized engines are interchangeable behind this trait;
/// the aggregator only sees `PathOutcomes`.
pub trait SimulationEngine {
    fn run_paths(
        &self,
        params: &SimulationParameters,
        request: &SimulationRequest,
    ) -> PathOutcomes;
}

/// Runs a request on the given engine and reduces the raw outcomes into the
/// output record. This is the single public entry point.
pub fn run_simulation<E: SimulationEngine + ?Sized>(
    engine: &E,
    params: &SimulationParameters,
    request: &SimulationRequest,
) -> SimulationOutput {
    info!(
        ticker = %params.fund.ticker,
        paths = request.n_simulations.max(1),
        months = horizon_months(request),
        regime_shifts = request.include_regime_shifts,
        "running NAV projection"
    );
    let outcomes = engine.run_paths(params, request);
    summarize(params, request, &outcomes)
}

/// Reference engine: one path at a time, month by month, with full regime
/// and distribution-history modeling. Paths are independent streams keyed
/// by a derived per-path seed, so the fan-out parallelizes without
/// changing results.
pub struct PathEngine;

impl SimulationEngine for PathEngine {
    fn run_paths(
        &self,
        params: &SimulationParameters,
        request: &SimulationRequest,
    ) -> PathOutcomes {
        let months = horizon_months(request);
        let n = request.n_simulations.max(1);
        let base_seed = resolve_seed(request.seed);

        let results: Vec<PathResult> = (0..n)
            .into_par_iter()
            .map(|path_id| {
                let mut rng = StdRng::seed_from_u64(derive_seed(base_seed, path_id));
                simulate_path(params, months, request.include_regime_shifts, &mut rng)
            })
            .collect();

        let mut outcomes = PathOutcomes::with_capacity(n as usize);
        for result in results {
            outcomes.final_navs.push(result.final_nav);
            outcomes.total_distributions.push(result.total_distributions);
            outcomes.total_premiums.push(result.total_premiums);
            outcomes.calls_exercised.push(result.calls_exercised);
        }
        outcomes
    }
}

struct PathResult {
    final_nav: f64,
    total_distributions: f64,
    total_premiums: f64,
    calls_exercised: u32,
}

fn simulate_path(
    params: &SimulationParameters,
    months: u32,
    include_regime_shifts: bool,
    rng: &mut impl Rng,
) -> PathResult {
    let (monthly_mean, monthly_vol) = monthly_base(params);
    let payout_stats = distribution_stats(&params.fund.distribution_history);
    let monthly_expense = params.fund.expense_ratio_annual / 12.0;
    let mut chain = if include_regime_shifts {
        Some(RegimeChain::start(rng))
    } else {
        None
    };

    let mut nav = params.fund.current_nav;
    let mut total_distributions = 0.0;
    let mut total_premiums = 0.0;
    let mut calls_exercised = 0u32;

    for _ in 0..months {
        let mults = match chain.as_mut() {
            Some(chain) => {
                chain.advance(rng);
                chain.regime().multipliers()
            }
            None => NEUTRAL_MULTIPLIERS,
        };

        let z: f64 = rng.sample(StandardNormal);
        let underlying_return =
            monthly_mean * mults.return_mean + monthly_vol * mults.return_vol * z;

        // premium richens with realized volatility
        let uplift = params.premium_vol_correlation * underlying_return.abs() * VOL_UPLIFT_SCALE;
        let z: f64 = rng.sample(StandardNormal);
        let premium_yield = (params.premium_yield_mean * mults.premium
            + uplift
            + params.premium_yield_std * mults.premium * z)
            .max(0.0);

        let strike = nav * (1.0 + params.fund.call_moneyness_target);
        let price_after = nav * (1.0 + underlying_return);
        let exercised = price_after > strike;
        let nav_from_price = if exercised {
            calls_exercised += 1;
            strike
        } else {
            price_after
        };

        let premium_dollars = nav * premium_yield;
        nav = nav_from_price + premium_dollars;
        total_premiums += premium_dollars;

        let distribution = match payout_stats {
            Some((payout_mean, payout_std)) => {
                let z: f64 = rng.sample(StandardNormal);
                (payout_mean + payout_std * z).min(DISTRIBUTION_NAV_CAP * nav)
            }
            None => PREMIUM_PASSTHROUGH * premium_dollars,
        }
        .max(0.0);
        nav -= distribution;
        total_distributions += distribution;

        nav -= nav * monthly_expense;
        nav = nav.max(NAV_FLOOR);
    }

    PathResult {
        final_nav: nav,
        total_distributions,
        total_premiums,
        calls_exercised,
    }
}

pub(crate) fn horizon_months(request: &SimulationRequest) -> u32 {
    request.years.max(1) * 12
}

pub(crate) fn monthly_base(params: &SimulationParameters) -> (f64, f64) {
    (
        params.underlying_annual_return_mean / 12.0,
        params.underlying_annual_volatility / 12f64.sqrt(),
    )
}

pub(crate) fn resolve_seed(seed: Option<u64>) -> u64 {
    seed.unwrap_or_else(|| rand::thread_rng().next_u64())
}

pub(crate) fn derive_seed(base_seed: u64, path_id: u32) -> u64 {
    let mixed = base_seed ^ ((path_id as u64) << 32) ^ path_id as u64;
    splitmix64(mixed)
}

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::FundInputs;
    use proptest::prelude::{any, prop_assert, proptest};

    fn static_params(annual_mean: f64, annual_vol: f64) -> SimulationParameters {
        SimulationParameters {
            fund: FundInputs::new("TEST", 50.0, 50.0),
            underlying_annual_return_mean: annual_mean,
            underlying_annual_volatility: annual_vol,
            premium_yield_mean: 0.007,
            premium_yield_std: 0.003,
            premium_vol_correlation: 0.4,
        }
    }

    fn request(years: u32, n: u32, regime: bool, seed: u64) -> SimulationRequest {
        SimulationRequest {
            years,
            n_simulations: n,
            include_regime_shifts: regime,
            seed: Some(seed),
        }
    }

    #[test]
    fn nav_floor_holds_under_forced_drawdown() {
        // constant -90% months with no premium income grind NAV into the floor
        let mut params = static_params(-0.90 * 12.0, 0.0);
        params.premium_yield_mean = 0.0;
        params.premium_yield_std = 0.0;
        params.premium_vol_correlation = 0.0;

        let outcomes = PathEngine.run_paths(&params, &request(1, 50, false, 7));
        for final_nav in &outcomes.final_navs {
            assert!(
                (final_nav - NAV_FLOOR).abs() < 1e-12,
                "final NAV {final_nav} should sit on the floor"
            );
        }
        assert!(outcomes.calls_exercised.iter().all(|&c| c == 0));
    }

    #[test]
    fn upside_cap_binds_in_a_sustained_bull() {
        // +5% every month against a 2% OTM strike: every call finishes
        // in the money and growth is pinned to the moneyness target
        let mut params = static_params(0.05 * 12.0, 0.0);
        params.premium_yield_mean = 0.0;
        params.premium_yield_std = 0.0;
        params.premium_vol_correlation = 0.0;

        let output = run_simulation(&PathEngine, &params, &request(3, 200, false, 1));
        assert!(output.pct_months_upside_capped > 50.0);
        assert!((output.pct_months_upside_capped - 100.0).abs() < 1e-9);
        // ~2%/month compounding, nowhere near the ~680% uncapped rate
        assert!(output.median_annualized_nav_change_pct > 20.0);
        assert!(output.median_annualized_nav_change_pct < 30.0);
    }

    #[test]
    fn regime_shifts_widen_the_outcome_spread() {
        let params = static_params(0.10, 0.16);
        let with_regimes = run_simulation(&PathEngine, &params, &request(3, 10_000, true, 42));
        let without = run_simulation(&PathEngine, &params, &request(3, 10_000, false, 42));

        let spread_on =
            with_regimes.p90_annualized_nav_change_pct - with_regimes.p10_annualized_nav_change_pct;
        let spread_off =
            without.p90_annualized_nav_change_pct - without.p10_annualized_nav_change_pct;
        assert!(
            spread_on > spread_off,
            "regime spread {spread_on} should exceed static spread {spread_off}"
        );
    }

    #[test]
    fn erosion_probability_rises_as_drift_falls() {
        let mut strong = static_params(0.08, 0.16);
        strong.premium_vol_correlation = 0.0;
        let mut weak = strong.clone();
        weak.underlying_annual_return_mean = -0.08;

        let strong_out = run_simulation(&PathEngine, &strong, &request(3, 5_000, false, 11));
        let weak_out = run_simulation(&PathEngine, &weak, &request(3, 5_000, false, 11));

        assert!(
            weak_out.probability_annual_erosion_gt_5pct
                > strong_out.probability_annual_erosion_gt_5pct
        );
        assert!(
            weak_out.probability_annual_erosion_gt_10pct
                > strong_out.probability_annual_erosion_gt_10pct
        );
    }

    #[test]
    fn end_to_end_covered_call_income_fund() {
        let mut fund = FundInputs::new("JEPI", 50.0, 50.0);
        fund.premium_yields = vec![0.007; 12];
        fund.underlying_returns = vec![
            0.02, -0.015, 0.03, -0.025, 0.01, 0.035, -0.02, 0.025, -0.01, 0.015, -0.03, -0.011,
        ];
        let params = SimulationParameters::derive(fund);

        let output = run_simulation(&PathEngine, &params, &request(3, 20_000, true, 42));

        assert!(
            output.median_annualized_nav_change_pct >= -5.0
                && output.median_annualized_nav_change_pct <= 0.0,
            "median annualized NAV change {} outside [-5, 0]",
            output.median_annualized_nav_change_pct
        );
        assert!(output.probability_annual_erosion_gt_5pct < 80.0);
        assert!(output.median_annualized_total_return_pct > 0.0);
        assert_eq!(output.metadata.ticker, "JEPI");
        assert_eq!(output.metadata.n_simulations, 20_000);
    }

    #[test]
    fn fixed_seed_reproduces_the_run() {
        let params = static_params(0.10, 0.16);
        let a = PathEngine.run_paths(&params, &request(2, 64, true, 99));
        let b = PathEngine.run_paths(&params, &request(2, 64, true, 99));
        assert_eq!(a.final_navs, b.final_navs);
        assert_eq!(a.calls_exercised, b.calls_exercised);
    }

    #[test]
    fn distributions_track_premiums_without_payout_history() {
        // no history: every month pays out exactly 95% of the premium
        let params = static_params(0.06, 0.12);
        let outcomes = PathEngine.run_paths(&params, &request(3, 100, false, 5));
        for (dist, prem) in outcomes
            .total_distributions
            .iter()
            .zip(&outcomes.total_premiums)
        {
            assert!((dist - PREMIUM_PASSTHROUGH * prem).abs() < 1e-9);
        }
    }

    #[test]
    fn derive_seed_separates_paths() {
        let a = derive_seed(42, 0);
        let b = derive_seed(42, 1);
        let c = derive_seed(43, 0);
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(24))]

        #[test]
        fn prop_outputs_stay_finite_and_bounded(
            seed in any::<u64>(),
            mean_bp in -5_000i32..5_000,
            vol_bp in 0u32..5_000,
            premium_bp in 0u32..200,
            premium_std_bp in 0u32..100,
            corr_pct in -100i32..101,
            years in 1u32..5,
            sims in 1u32..40,
            regime in any::<bool>()
        ) {
            let mut params = static_params(
                mean_bp as f64 / 10_000.0,
                vol_bp as f64 / 10_000.0,
            );
            params.premium_yield_mean = premium_bp as f64 / 10_000.0;
            params.premium_yield_std = premium_std_bp as f64 / 10_000.0;
            params.premium_vol_correlation = corr_pct as f64 / 100.0;

            let req = request(years, sims, regime, seed);
            let outcomes = PathEngine.run_paths(&params, &req);
            let months = years * 12;

            prop_assert!(outcomes.len() == sims as usize);
            for final_nav in &outcomes.final_navs {
                prop_assert!(final_nav.is_finite());
                prop_assert!(*final_nav >= NAV_FLOOR);
            }
            for total in outcomes
                .total_distributions
                .iter()
                .chain(&outcomes.total_premiums)
            {
                prop_assert!(total.is_finite());
                prop_assert!(*total >= 0.0);
            }
            for calls in &outcomes.calls_exercised {
                prop_assert!(*calls <= months);
            }

            let output = summarize(&params, &req, &outcomes);
            for probability in [
                output.probability_annual_erosion_gt_5pct,
                output.probability_annual_erosion_gt_10pct,
                output.probability_any_erosion,
            ] {
                prop_assert!((0.0..=100.0).contains(&probability));
            }
            prop_assert!(output.p10_annualized_nav_change_pct <= output.p25_annualized_nav_change_pct);
            prop_assert!(output.p25_annualized_nav_change_pct <= output.p50_annualized_nav_change_pct);
            prop_assert!(output.p50_annualized_nav_change_pct <= output.p75_annualized_nav_change_pct);
            prop_assert!(output.p75_annualized_nav_change_pct <= output.p90_annualized_nav_change_pct);
            prop_assert!(output.pct_months_upside_capped <= 100.0 + 1e-9);
        }
    }
}
