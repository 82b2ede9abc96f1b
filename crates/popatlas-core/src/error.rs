// crates/popatlas-core/src/error.rs

//! # Error taxonomy
//!
//! Every failure the pipeline can hit is non-fatal: fetch and schema problems
//! surface as `LoadState::Error` on the session, never as a panic.
//! An unmatched region is not an error at all (see [`crate::Classification`]).

use crate::model::{Channel, LoadState};
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AtlasError>;

pub const MAP_LOAD_FAILED: &str = "Failed to load map data";
pub const DATA_LOAD_FAILED: &str = "couldn't load refugee data from UNHCR API";
pub const LOADING: &str = "Loading map data...";

#[derive(Debug, Error)]
pub enum AtlasError {
    /// Transport failure (connection refused, DNS, non-success HTTP status).
    #[error("network error: {0}")]
    Network(String),

    /// The request for `channel` did not complete before its deadline.
    #[error("{channel} request timed out after {}ms", after.as_millis())]
    Timeout { channel: Channel, after: Duration },

    /// The response shape violates the expected contract.
    #[error("schema error: {0}")]
    Schema(String),

    /// Well-formed response, but nothing usable after normalization.
    #[error("{channel} dataset is empty after normalization")]
    EmptyResult { channel: Channel },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A view was requested while the composite state does not allow it.
    #[error("view not available while {0}")]
    NotReady(LoadState),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl AtlasError {
    /// The single message shown to a user when loading fails.
    pub fn user_message(&self) -> &'static str {
        match self {
            AtlasError::Timeout { channel, .. } | AtlasError::EmptyResult { channel }
                if *channel == Channel::Geography =>
            {
                MAP_LOAD_FAILED
            }
            AtlasError::Network(_)
            | AtlasError::Timeout { .. }
            | AtlasError::Schema(_)
            | AtlasError::EmptyResult { .. }
            | AtlasError::Json(_) => DATA_LOAD_FAILED,
            AtlasError::NotFound(_) | AtlasError::Io(_) => MAP_LOAD_FAILED,
            AtlasError::NotReady(_) => LOADING,
            AtlasError::InvalidConfig(_) => "invalid configuration",
        }
    }

    /// Whether this error came from a fetch deadline.
    pub fn is_timeout(&self) -> bool {
        matches!(self, AtlasError::Timeout { .. })
    }
}

/// Errors are cloned into per-channel state so the session can report them
/// without giving up ownership; wrapped std errors are flattened to text.
impl Clone for AtlasError {
    fn clone(&self) -> Self {
        match self {
            AtlasError::Network(m) => AtlasError::Network(m.clone()),
            AtlasError::Timeout { channel, after } => AtlasError::Timeout {
                channel: *channel,
                after: *after,
            },
            AtlasError::Schema(m) => AtlasError::Schema(m.clone()),
            AtlasError::EmptyResult { channel } => AtlasError::EmptyResult { channel: *channel },
            AtlasError::NotFound(m) => AtlasError::NotFound(m.clone()),
            AtlasError::Io(e) => AtlasError::Io(std::io::Error::new(e.kind(), e.to_string())),
            AtlasError::Json(e) => AtlasError::Schema(e.to_string()),
            AtlasError::NotReady(s) => AtlasError::NotReady(*s),
            AtlasError::InvalidConfig(m) => AtlasError::InvalidConfig(m.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geography_failures_use_map_message() {
        let err = AtlasError::EmptyResult {
            channel: Channel::Geography,
        };
        assert_eq!(err.user_message(), "Failed to load map data");

        let err = AtlasError::EmptyResult {
            channel: Channel::Host,
        };
        assert_eq!(
            err.user_message(),
            "couldn't load refugee data from UNHCR API"
        );
    }

    #[test]
    fn timeout_display_mentions_channel_and_deadline() {
        let err = AtlasError::Timeout {
            channel: Channel::Origin,
            after: Duration::from_millis(5000),
        };
        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "origin request timed out after 5000ms");
    }
}
