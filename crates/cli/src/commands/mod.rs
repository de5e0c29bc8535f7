//! CLI commands that take arguments beyond the global flags.

pub mod advisory;
pub mod watch;

pub use advisory::{
    run_consensus, run_history, run_liquidity, run_risk, run_simulate, run_technicals,
    ConsensusArgs, HistoryArgs, LiquidityArgs, RiskArgs, SimulateArgs, TechnicalsArgs,
};
pub use watch::{run_watch, WatchArgs};
