//! The trading desk's entry points.
//!
//! [`Desk`] owns every venue adapter and the advisory engines and exposes the
//! operations the command line and the snapshot scheduler call:
//!
//! - portfolio snapshots across all venues
//! - opportunity scans across the prediction venues
//! - risk analysis, fair-value simulation, consensus, and liquidity scans
//!
//! Results are rendered to markdown by [`report`] and recorded through an
//! [`EventLog`](tradedesk_core::EventLog).

pub mod credentials;
pub mod desk;
pub mod event_log;
pub mod report;
pub mod scheduler;

pub use credentials::DeskCredentials;
pub use desk::{
    Desk, IntegrationStatus, LiquidityReport, PortfolioSnapshot, ScanReport, SimulationReport,
    VenueListing, VenueSnapshot,
};
pub use event_log::HttpEventLog;
pub use scheduler::SnapshotScheduler;
