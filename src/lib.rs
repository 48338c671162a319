//! Monte Carlo projection of covered-call fund NAV paths: premium income,
//! upside capping, distributions, expense drag, and regime-dependent market
//! behavior, reduced to a distribution-of-outcomes summary.

pub mod core;
