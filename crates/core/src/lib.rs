//! Core types, traits, and configuration shared by every desk crate.
//!
//! Venue adapters, the opportunity scanner, the fair-value engine, and the
//! risk sizer all exchange the value types defined here. Nothing in this crate
//! performs I/O beyond reading configuration files.

pub mod config;
pub mod config_loader;
pub mod error;
pub mod events;
pub mod traits;
pub mod types;

pub use config::{
    AppConfig, ConsensusConfig, EstimatorConfig, EstimatorKind, EstimatorProvider, EventLogConfig,
    HistorianSettings, HttpConfig, RiskLimits, ScanConfig, SimulationSettings, SnapshotConfig,
    VenueUrls,
};
pub use config_loader::ConfigLoader;
pub use error::{truncate_detail, VenueError, ERROR_DETAIL_LIMIT};
pub use events::{EventLog, TracingEventLog};
pub use traits::VenueAdapter;
pub use types::{
    Balance, BalanceStatus, BookLevel, EstimateSource, FairValueEstimate, Holding, NormalizedMarket,
    Opportunity, OpportunityKind, OrderBook, RiskGrade, SizingResult, Venue,
};
