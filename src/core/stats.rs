//! Reduces raw per-path outcomes into the output record. This is the single
//! source of truth for output formatting; both engines feed it the same
//! four arrays.

use super::params::mean;
use super::types::{
    PathOutcomes, RunMetadata, SimulationOutput, SimulationParameters, SimulationRequest,
};

pub fn summarize(
    params: &SimulationParameters,
    request: &SimulationRequest,
    outcomes: &PathOutcomes,
) -> SimulationOutput {
    let years = request.years.max(1);
    let initial = params.fund.current_nav;
    let inv_years = 1.0 / years as f64;

    let mut final_navs = outcomes.final_navs.clone();
    let mut total_distributions = outcomes.total_distributions.clone();
    let mut total_premiums = outcomes.total_premiums.clone();

    let mut annualized_nav_change: Vec<f64> = outcomes
        .final_navs
        .iter()
        .map(|&nav| annualized_change_pct(nav / initial, inv_years))
        .collect();
    let mut annualized_total_return: Vec<f64> = outcomes
        .final_navs
        .iter()
        .zip(&outcomes.total_distributions)
        .map(|(&nav, &dist)| annualized_change_pct((nav + dist) / initial, inv_years))
        .collect();
    let mut annualized_yield: Vec<f64> = outcomes
        .total_distributions
        .iter()
        .map(|&dist| dist / initial * 100.0 * inv_years)
        .collect();

    let calls: Vec<f64> = outcomes.calls_exercised.iter().map(|&c| c as f64).collect();
    let avg_months_calls_exercised = mean(&calls);
    let pct_months_upside_capped =
        avg_months_calls_exercised / (years as f64 * 12.0) * 100.0;

    SimulationOutput {
        median_final_nav: percentile(&mut final_navs, 50.0),
        mean_final_nav: mean(&outcomes.final_navs),
        median_annualized_nav_change_pct: percentile(&mut annualized_nav_change, 50.0),
        mean_annualized_nav_change_pct: mean(&annualized_nav_change),
        p10_annualized_nav_change_pct: percentile(&mut annualized_nav_change, 10.0),
        p25_annualized_nav_change_pct: percentile(&mut annualized_nav_change, 25.0),
        p50_annualized_nav_change_pct: percentile(&mut annualized_nav_change, 50.0),
        p75_annualized_nav_change_pct: percentile(&mut annualized_nav_change, 75.0),
        p90_annualized_nav_change_pct: percentile(&mut annualized_nav_change, 90.0),
        probability_annual_erosion_gt_5pct: share_below(&annualized_nav_change, -5.0),
        probability_annual_erosion_gt_10pct: share_below(&annualized_nav_change, -10.0),
        probability_any_erosion: share_below(&annualized_nav_change, 0.0),
        var_95: percentile(&mut annualized_nav_change, 5.0),
        var_99: percentile(&mut annualized_nav_change, 1.0),
        median_annualized_total_return_pct: percentile(&mut annualized_total_return, 50.0),
        mean_annualized_total_return_pct: mean(&annualized_total_return),
        p10_annualized_total_return_pct: percentile(&mut annualized_total_return, 10.0),
        p90_annualized_total_return_pct: percentile(&mut annualized_total_return, 90.0),
        median_annualized_yield_pct: percentile(&mut annualized_yield, 50.0),
        mean_annualized_yield_pct: mean(&annualized_yield),
        median_total_distributions: percentile(&mut total_distributions, 50.0),
        mean_total_distributions: mean(&outcomes.total_distributions),
        avg_months_calls_exercised,
        pct_months_upside_capped,
        median_total_premiums: percentile(&mut total_premiums, 50.0),
        mean_total_premiums: mean(&outcomes.total_premiums),
        metadata: RunMetadata {
            ticker: params.fund.ticker.clone(),
            years,
            n_simulations: outcomes.len() as u32,
            initial_nav: initial,
            call_moneyness_target: params.fund.call_moneyness_target,
            expense_ratio_annual: params.fund.expense_ratio_annual,
        },
    }
}

fn annualized_change_pct(ratio: f64, inv_years: f64) -> f64 {
    (ratio.powf(inv_years) - 1.0) * 100.0
}

/// Share of values strictly below the threshold, on the 0-100 scale.
fn share_below(values: &[f64], threshold: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().filter(|v| **v < threshold).count() as f64 / values.len() as f64 * 100.0
}

/// Linear-interpolation percentile over a working buffer; a single-element
/// slice degrades to that element.
pub(crate) fn percentile(values: &mut [f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    values.sort_by(|a, b| a.total_cmp(b));

    let n = values.len();
    if n == 1 {
        return values[0];
    }

    let rank = (p / 100.0) * (n as f64 - 1.0);
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;

    if lower == upper {
        values[lower]
    } else {
        let w = rank - lower as f64;
        values[lower] * (1.0 - w) + values[upper] * w
    }
}
