use serde::Serialize;

/// Raw fund record supplied by the upstream data layer. Histories are
/// monthly and may be empty; defaults below are the documented fallbacks
/// applied when the upstream source has no value.
#[derive(Debug, Clone)]
pub struct FundInputs {
    pub ticker: String,
    pub current_nav: f64,
    pub current_price: f64,
    pub premium_yields: Vec<f64>,
    pub underlying_returns: Vec<f64>,
    pub distribution_history: Vec<f64>,
    pub expense_ratio_annual: f64,
    pub leverage_ratio: f64,
    pub roc_percentage: f64,
    pub call_moneyness_target: f64,
    pub call_coverage_ratio: f64,
    pub option_expiry_days: u32,
}

impl FundInputs {
    pub fn new(ticker: impl Into<String>, current_nav: f64, current_price: f64) -> Self {
        Self {
            ticker: ticker.into(),
            current_nav,
            current_price,
            premium_yields: Vec::new(),
            underlying_returns: Vec::new(),
            distribution_history: Vec::new(),
            expense_ratio_annual: 0.0035,
            leverage_ratio: 1.0,
            roc_percentage: 0.0,
            call_moneyness_target: 0.02,
            call_coverage_ratio: 1.0,
            option_expiry_days: 30,
        }
    }
}

/// Fund inputs plus the five derived statistics. Built once via
/// `SimulationParameters::derive` and treated as constant for the lifetime
/// of a simulation run.
#[derive(Debug, Clone)]
pub struct SimulationParameters {
    pub fund: FundInputs,
    pub underlying_annual_return_mean: f64,
    pub underlying_annual_volatility: f64,
    pub premium_yield_mean: f64,
    pub premium_yield_std: f64,
    pub premium_vol_correlation: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct SimulationRequest {
    pub years: u32,
    pub n_simulations: u32,
    pub include_regime_shifts: bool,
    pub seed: Option<u64>,
}

/// Raw per-path outcomes, one entry per simulated path. Both engines emit
/// this shape; the aggregator consumes it without knowing which engine ran.
#[derive(Debug, Clone, Default)]
pub struct PathOutcomes {
    pub final_navs: Vec<f64>,
    pub total_distributions: Vec<f64>,
    pub total_premiums: Vec<f64>,
    pub calls_exercised: Vec<u32>,
}

impl PathOutcomes {
    pub fn with_capacity(n: usize) -> Self {
        Self {
            final_navs: Vec::with_capacity(n),
            total_distributions: Vec::with_capacity(n),
            total_premiums: Vec::with_capacity(n),
            calls_exercised: Vec::with_capacity(n),
        }
    }

    pub fn len(&self) -> usize {
        self.final_navs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.final_navs.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunMetadata {
    pub ticker: String,
    pub years: u32,
    pub n_simulations: u32,
    pub initial_nav: f64,
    pub call_moneyness_target: f64,
    pub expense_ratio_annual: f64,
}

/// Reduced simulation record. Field names and the 0-100 scale of every
/// `*_pct` / `probability_*` field are a contract with downstream
/// risk-penalty scoring; do not rename or rescale.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationOutput {
    pub median_final_nav: f64,
    pub mean_final_nav: f64,
    pub median_annualized_nav_change_pct: f64,
    pub mean_annualized_nav_change_pct: f64,
    pub p10_annualized_nav_change_pct: f64,
    pub p25_annualized_nav_change_pct: f64,
    pub p50_annualized_nav_change_pct: f64,
    pub p75_annualized_nav_change_pct: f64,
    pub p90_annualized_nav_change_pct: f64,
    pub probability_annual_erosion_gt_5pct: f64,
    pub probability_annual_erosion_gt_10pct: f64,
    pub probability_any_erosion: f64,
    pub var_95: f64,
    pub var_99: f64,
    pub median_annualized_total_return_pct: f64,
    pub mean_annualized_total_return_pct: f64,
    pub p10_annualized_total_return_pct: f64,
    pub p90_annualized_total_return_pct: f64,
    pub median_annualized_yield_pct: f64,
    pub mean_annualized_yield_pct: f64,
    pub median_total_distributions: f64,
    pub mean_total_distributions: f64,
    pub avg_months_calls_exercised: f64,
    pub pct_months_upside_capped: f64,
    pub median_total_premiums: f64,
    pub mean_total_premiums: f64,
    pub metadata: RunMetadata,
}
