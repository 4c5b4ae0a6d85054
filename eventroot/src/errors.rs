//! Error types for `EventRoot`.
//!
//! Each layer has its own error enum:
//!
//! - **`AggregateError`**: loading, reconstructing and saving aggregates
//! - **`EventStoreError`**: storage and persistence failures
//! - **`SnapshotError`**: snapshot storage failures
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use eventroot::errors::AggregateError;
//!
//! match repository.save_aggregate_root(&mut vehicle).await {
//!     Ok(version) => tracing::info!(%version, "saved"),
//!     Err(AggregateError::ConcurrencyConflict { aggregate_id, .. }) => {
//!         // reload and retry the command
//!         retry(aggregate_id).await?;
//!     }
//!     Err(e) => return Err(e),
//! }
//! ```

use crate::aggregate_type::AggregateType;
use crate::types::{AggregateId, EventId, EventVersion, StreamId};
use thiserror::Error;

/// Errors raised while working with aggregate roots.
///
/// # Error Handling Strategy
///
/// - **AggregateTypeMismatch**: a programming error; the repository was handed
///   an aggregate it does not serve
/// - **MissingDiscriminator / UnknownAggregateType**: the stream cannot be
///   mapped to a concrete aggregate; check translator registration
/// - **ConcurrencyConflict**: reload the aggregate and retry the command
/// - **BusinessRuleViolation**: surface to the caller
#[derive(Debug, Clone, Error)]
pub enum AggregateError {
    /// The aggregate's type is not one the repository accepts.
    #[error("Aggregate type mismatch: expected {expected}, got {actual}")]
    AggregateTypeMismatch {
        /// The base type the repository serves
        expected: AggregateType,
        /// The type reported by the aggregate
        actual: AggregateType,
    },

    /// No constructor is registered for the discriminator found in the stream.
    #[error("Unknown aggregate type: {0}")]
    UnknownAggregateType(AggregateType),

    /// The first event of the stream carries no aggregate type discriminator.
    #[error("No aggregate type discriminator on the first event of stream '{stream}'")]
    MissingDiscriminator {
        /// The stream that could not be classified
        stream: StreamId,
    },

    /// Reconstruction was attempted from an empty history.
    #[error("Cannot reconstitute aggregate '{0}' from an empty history")]
    EmptyHistory(AggregateId),

    /// A replayed event did not follow the aggregate's current version.
    #[error(
        "Non-contiguous history for aggregate '{aggregate_id}': expected version {expected}, got {actual}"
    )]
    NonContiguousHistory {
        /// The aggregate being replayed
        aggregate_id: AggregateId,
        /// The version the next event should have carried
        expected: EventVersion,
        /// The version it actually carried
        actual: EventVersion,
    },

    /// A replayed event belongs to a different aggregate.
    #[error("Event for aggregate '{actual}' replayed into aggregate '{expected}'")]
    IdentityMismatch {
        /// The aggregate being replayed
        expected: AggregateId,
        /// The aggregate named in the event's metadata
        actual: AggregateId,
    },

    /// The requested aggregate has no events and no snapshot.
    #[error("Aggregate '{0}' not found")]
    AggregateNotFound(AggregateId),

    /// Another writer appended to the aggregate's stream first.
    #[error("Concurrency conflict saving aggregate '{aggregate_id}' to stream '{stream}'")]
    ConcurrencyConflict {
        /// The aggregate being saved
        aggregate_id: AggregateId,
        /// The stream that moved on
        stream: StreamId,
    },

    /// The aggregate has pending events that would be lost or misrepresented.
    #[error("Aggregate '{0}' has unsaved events")]
    UnsavedChanges(AggregateId),

    /// The stream name derived for an aggregate is not a valid stream id.
    #[error("Invalid stream name '{0}'")]
    InvalidStreamName(String),

    /// A command on the aggregate was rejected by a business rule.
    #[error("Business rule violation: {0}")]
    BusinessRuleViolation(String),

    /// An error occurred in the event store.
    #[error("Event store error: {0}")]
    EventStore(#[from] EventStoreError),

    /// An error occurred in the snapshot store.
    #[error("Snapshot store error: {0}")]
    Snapshot(#[from] SnapshotError),
}

/// Errors that can occur when interacting with the event store.
#[derive(Debug, Clone, Error)]
pub enum EventStoreError {
    /// The requested stream was not found.
    #[error("Stream '{0}' not found")]
    StreamNotFound(StreamId),

    /// A version conflict occurred when writing events.
    #[error(
        "Version conflict on stream '{stream}': expected {expected}, but current is {current}"
    )]
    VersionConflict {
        /// The stream with the version conflict
        stream: StreamId,
        /// The version that was expected
        expected: EventVersion,
        /// The actual current version
        current: EventVersion,
    },

    /// An event with the given ID already exists.
    #[error("Duplicate event ID: {0}")]
    DuplicateEventId(EventId),

    /// Serialization of an event failed.
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    /// Deserialization of an event failed.
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    /// The event store is temporarily unavailable.
    #[error("Event store unavailable: {0}")]
    Unavailable(String),

    /// An unexpected internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Errors that can occur in a snapshot store.
#[derive(Debug, Clone, Error)]
pub enum SnapshotError {
    /// The aggregate state could not be serialized.
    #[error("Snapshot serialization failed: {0}")]
    SerializationFailed(String),

    /// A stored snapshot could not be turned back into an aggregate.
    #[error("Snapshot deserialization failed: {0}")]
    DeserializationFailed(String),

    /// An unexpected internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Type alias for aggregate results.
pub type AggregateResult<T> = Result<T, AggregateError>;

/// Type alias for event store results.
pub type EventStoreResult<T> = Result<T, EventStoreError>;

/// Type alias for snapshot store results.
pub type SnapshotResult<T> = Result<T, SnapshotError>;
