// Error types for route planning

use crate::models::StoreId;
use thiserror::Error;

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that end a route-planning request.
///
/// Recoverable conditions (a slow distance provider, an exhausted time
/// budget) never surface here; they are reported as
/// [`Degradation`](crate::models::Degradation) values on the route instead.
#[derive(Debug, Error)]
pub enum Error {
    /// The request cannot be routed as given: no items, a coordinate out of
    /// range, a negative price, or a malformed stop set.
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    /// No travel cost could be determined for a leg ending at this store,
    /// even after falling back to the local estimate.
    #[error("store `{store_id}` cannot be reached")]
    UnreachableStop {
        store_id: StoreId,
        #[source]
        source: CostError,
    },

    /// Reading or writing a persisted distance cache failed.
    #[error("distance cache I/O failed")]
    CacheIo(#[from] std::io::Error),

    /// A persisted distance cache could not be parsed.
    #[error("distance cache file is malformed")]
    CacheFormat(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }
}

/// Errors raised by a [`TravelCost`](crate::utils::distance::TravelCost)
/// implementation for a single pair of coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CostError {
    /// The provider could not answer right now (timeout, network, rate
    /// limit). The caller may substitute a local estimate.
    #[error("travel-cost provider unavailable: {message}")]
    UpstreamUnavailable { message: String },

    /// The provider answered that no route exists, or produced a cost that
    /// is not a finite, non-negative number.
    #[error("no route between the points: {message}")]
    Unreachable { message: String },
}

impl CostError {
    /// Whether a fallback estimate may stand in for this failure.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::UpstreamUnavailable { .. })
    }
}
