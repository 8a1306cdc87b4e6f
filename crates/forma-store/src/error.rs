//! Error types for the Forma store.
//!
//! Store-level errors are synchronous results at the offending call.
//! Absence is never an error: reading a missing path yields `Ok(None)`.
//! Subscriber callback failures travel through a separate side channel
//! ([`SubscriberError`]) so one failing callback cannot abort a dispatch
//! round or surface as a store error to the mutating caller.

use forma_path::{Path, PathError};
use thiserror::Error;

use crate::subs::SubscriptionId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Malformed path string, rejected before any traversal.
    #[error("invalid path: {0}")]
    InvalidPath(#[from] PathError),
    /// A write tried to traverse through a scalar as if it were a container.
    #[error("type conflict at `{path}`: segment `{segment}` is not a container")]
    TypeConflict { path: Path, segment: String },
    /// A `length` write with a value that is not a non-negative integer.
    #[error("invalid length value for `{path}`")]
    InvalidLength { path: Path },
    /// Structurally impossible operation, e.g. removing a `length` path.
    #[error("invalid target `{path}` for this operation")]
    InvalidTarget { path: Path },
}

/// A subscriber callback failed during a notification round.
///
/// Reported to the store's error sink (or buffered for
/// [`PathStore::take_subscriber_errors`](crate::PathStore::take_subscriber_errors)),
/// never raised to the caller that committed the mutation.
#[derive(Debug, Error)]
#[error("subscriber {id} on `{path}` failed: {source}")]
pub struct SubscriberError {
    /// The failing registration.
    pub id: SubscriptionId,
    /// The subscriber's path.
    pub path: Path,
    #[source]
    pub source: Box<dyn std::error::Error>,
}

/// Marker error for a callback reached again while already executing.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("re-entrant dispatch reached a callback that is already executing")]
pub struct ReentrantCallback;
