mod batch;
mod engine;
mod params;
mod regime;
mod stats;
mod types;

pub use batch::BatchEngine;
pub use engine::{PathEngine, SimulationEngine, run_simulation};
pub use regime::{Regime, RegimeChain, RegimeMultipliers};
pub use stats::summarize;
pub use types::{
    FundInputs, PathOutcomes, RunMetadata, SimulationOutput, SimulationParameters,
    SimulationRequest,
};
