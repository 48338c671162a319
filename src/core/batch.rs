//! Vectorized batch engine: one flat state vector per quantity, updated for
//! all paths at once each month from pre-drawn shock arrays.
//!
//! Two deliberate simplifications relative to the looped engine: regime
//! modeling is not applied (every month uses the base monthly mean/vol),
//! and the distribution is always 95% of the month's premium even when a
//! payout history is present. Cross-engine comparisons are therefore only
//! meaningful with regime shifts disabled and an empty distribution
//! history.

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::StandardNormal;
use tracing::debug;

use super::engine::{
    NAV_FLOOR, PREMIUM_PASSTHROUGH, SimulationEngine, VOL_UPLIFT_SCALE, derive_seed,
    horizon_months, monthly_base, resolve_seed,
};
use super::types::{PathOutcomes, SimulationParameters, SimulationRequest};

pub struct BatchEngine;

impl SimulationEngine for BatchEngine {
    fn run_paths(
        &self,
        params: &SimulationParameters,
        request: &SimulationRequest,
    ) -> PathOutcomes {
        let months = horizon_months(request) as usize;
        let n = request.n_simulations.max(1) as usize;
        let base_seed = resolve_seed(request.seed);
        let (monthly_mean, monthly_vol) = monthly_base(params);

        debug!(paths = n, months, "pre-drawing batch shock arrays");

        // Row of shocks per path, drawn in the same per-path stream order
        // as the looped engine (return then premium, month by month).
        // Premium shocks are floored at zero at draw time.
        let mut returns = vec![0.0f64; n * months];
        let mut premiums = vec![0.0f64; n * months];
        for path_id in 0..n {
            let mut rng = StdRng::seed_from_u64(derive_seed(base_seed, path_id as u32));
            let row = path_id * months;
            for month in 0..months {
                let z: f64 = rng.sample(StandardNormal);
                returns[row + month] = monthly_mean + monthly_vol * z;
                let z: f64 = rng.sample(StandardNormal);
                premiums[row + month] =
                    (params.premium_yield_mean + params.premium_yield_std * z).max(0.0);
            }
        }

        let strike_ratio = 1.0 + params.fund.call_moneyness_target;
        let monthly_expense = params.fund.expense_ratio_annual / 12.0;

        let mut navs = vec![params.fund.current_nav; n];
        let mut total_distributions = vec![0.0f64; n];
        let mut total_premiums = vec![0.0f64; n];
        let mut calls_exercised = vec![0u32; n];

        for month in 0..months {
            for path in 0..n {
                let idx = path * months + month;
                let underlying_return = returns[idx];
                let premium_yield = premiums[idx]
                    + params.premium_vol_correlation * underlying_return.abs() * VOL_UPLIFT_SCALE;

                let nav = navs[path];
                let strike = nav * strike_ratio;
                let price_after = nav * (1.0 + underlying_return);
                let nav_from_price = if price_after > strike {
                    calls_exercised[path] += 1;
                    strike
                } else {
                    price_after
                };

                let premium_dollars = nav * premium_yield;
                let mut next = nav_from_price + premium_dollars;
                total_premiums[path] += premium_dollars;

                let distribution = PREMIUM_PASSTHROUGH * premium_dollars;
                next -= distribution;
                total_distributions[path] += distribution;

                next -= next * monthly_expense;
                navs[path] = next.max(NAV_FLOOR);
            }
        }

        PathOutcomes {
            final_navs: navs,
            total_distributions,
            total_premiums,
            calls_exercised,
        }
    }
}
