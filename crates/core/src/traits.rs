use crate::error::VenueError;
use crate::types::{Balance, Holding, NormalizedMarket, Venue};
use async_trait::async_trait;

/// One external venue: owns its credential and signer, issues signed calls,
/// and returns normalized values.
///
/// Implementations never panic or propagate faults out of `get_balance`; a
/// failure is reported inside the returned [`Balance`].
#[async_trait]
pub trait VenueAdapter: Send + Sync {
    fn venue(&self) -> Venue;

    /// Returns true if the credentials this venue needs are present.
    fn is_configured(&self) -> bool;

    async fn get_balance(&self) -> Balance;

    /// Non-cash positions. Venues without a holdings endpoint return nothing.
    async fn get_holdings(&self) -> Result<Vec<Holding>, VenueError> {
        Ok(Vec::new())
    }

    /// Up to `limit` open binary markets. Venues without prediction markets
    /// return nothing.
    async fn get_markets(&self, _limit: usize) -> Result<Vec<NormalizedMarket>, VenueError> {
        Ok(Vec::new())
    }
}
