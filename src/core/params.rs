//! Summary statistics derived from historical monthly series, with fixed
//! fallbacks when a history is absent or too short to estimate from.

use super::types::{FundInputs, SimulationParameters};

const FALLBACK_ANNUAL_RETURN_MEAN: f64 = 0.10;
const FALLBACK_ANNUAL_VOLATILITY: f64 = 0.16;
const FALLBACK_PREMIUM_YIELD_MEAN: f64 = 0.007;
const FALLBACK_PREMIUM_YIELD_STD: f64 = 0.003;
const FALLBACK_PREMIUM_VOL_CORRELATION: f64 = 0.4;

const MONTHS_PER_YEAR: f64 = 12.0;

impl SimulationParameters {
    /// Computes the five derived statistics once. Degenerate histories
    /// (empty, single point, mismatched lengths, zero variance) silently
    /// take the documented fallback constants; nothing here can fail.
    pub fn derive(fund: FundInputs) -> Self {
        let (underlying_annual_return_mean, underlying_annual_volatility) =
            match moments(&fund.underlying_returns) {
                Some((mean, std)) => (mean * MONTHS_PER_YEAR, std * MONTHS_PER_YEAR.sqrt()),
                None => (FALLBACK_ANNUAL_RETURN_MEAN, FALLBACK_ANNUAL_VOLATILITY),
            };

        let (premium_yield_mean, premium_yield_std) = match moments(&fund.premium_yields) {
            Some((mean, std)) => (mean, std),
            None => (FALLBACK_PREMIUM_YIELD_MEAN, FALLBACK_PREMIUM_YIELD_STD),
        };

        let abs_returns: Vec<f64> = fund.underlying_returns.iter().map(|r| r.abs()).collect();
        let premium_vol_correlation = pearson(&fund.premium_yields, &abs_returns)
            .unwrap_or(FALLBACK_PREMIUM_VOL_CORRELATION);

        Self {
            fund,
            underlying_annual_return_mean,
            underlying_annual_volatility,
            premium_yield_mean,
            premium_yield_std,
            premium_vol_correlation,
        }
    }
}

/// Monthly mean and sample standard deviation, or None when the series is
/// too short for a sample estimate.
fn moments(values: &[f64]) -> Option<(f64, f64)> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values);
    let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>()
        / (values.len() as f64 - 1.0);
    Some((mean, var.sqrt()))
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Pearson correlation, or None when the inputs are not a valid pair of
/// equal-length series with spread in both.
fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.is_empty() || xs.len() != ys.len() {
        return None;
    }
    let mx = mean(xs);
    let my = mean(ys);
    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mx;
        let dy = y - my;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    let denom = (var_x * var_y).sqrt();
    if denom <= 0.0 {
        return None;
    }
    Some(cov / denom)
}

/// Mean and std of the payout history for the history-aware distribution
/// branch. Computed once per run; a single-point history gets a nominal
/// 10% spread around its one observation.
pub(crate) fn distribution_stats(history: &[f64]) -> Option<(f64, f64)> {
    match history.len() {
        0 => None,
        1 => Some((history[0], 0.1 * history[0])),
        _ => moments(history),
    }
}
