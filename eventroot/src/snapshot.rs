//! Snapshots of aggregate state.
//!
//! A snapshot stores an aggregate as of a known version so loading only has
//! to replay the tail of the stream.

use crate::aggregate_type::AggregateType;
use crate::errors::SnapshotResult;
use crate::types::{AggregateId, EventVersion, Timestamp};
use async_trait::async_trait;
use nutype::nutype;
use serde::{Deserialize, Serialize};

/// An aggregate captured at `last_version`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot<A> {
    /// Type the snapshot is filed under
    pub aggregate_type: AggregateType,
    /// Identity of the captured aggregate
    pub aggregate_id: AggregateId,
    /// The aggregate itself
    pub aggregate_root: A,
    /// Version of the last event folded into the state
    pub last_version: EventVersion,
    /// When the snapshot was taken
    pub created_at: Timestamp,
}

impl<A> Snapshot<A> {
    /// Captures an aggregate now.
    pub fn new(
        aggregate_type: AggregateType,
        aggregate_id: AggregateId,
        aggregate_root: A,
        last_version: EventVersion,
    ) -> Self {
        Self {
            aggregate_type,
            aggregate_id,
            aggregate_root,
            last_version,
            created_at: Timestamp::now(),
        }
    }
}

/// Persistence port for snapshots.
///
/// Snapshots are keyed by aggregate type and aggregate id. Repositories key
/// them by their base type, so every variant of a polymorphic aggregate
/// shares one keyspace.
#[async_trait]
pub trait SnapshotStore<A>: Send + Sync {
    /// The latest snapshot for an aggregate, if one exists.
    async fn get(
        &self,
        aggregate_type: &AggregateType,
        aggregate_id: &AggregateId,
    ) -> SnapshotResult<Option<Snapshot<A>>>;

    /// Stores a snapshot, replacing any earlier one for the same aggregate.
    async fn save(&self, snapshot: Snapshot<A>) -> SnapshotResult<()>;

    /// Removes every snapshot of one aggregate type.
    async fn remove_all(&self, aggregate_type: &AggregateType) -> SnapshotResult<()>;
}

/// Number of events between snapshots.
#[nutype(
    validate(greater_or_equal = 1, less_or_equal = 1_000_000),
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Into,
        Serialize,
        Deserialize
    )
)]
pub struct SnapshotThreshold(u64);

/// When the repository takes a snapshot after saving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SnapshotPolicy {
    /// Never snapshot
    #[default]
    Never,
    /// Snapshot whenever a save crosses a multiple of the threshold
    EveryNEvents(SnapshotThreshold),
}

impl SnapshotPolicy {
    /// Whether a save moving the aggregate from `before` to `after` should
    /// produce a snapshot.
    pub fn should_snapshot(self, before: EventVersion, after: EventVersion) -> bool {
        match self {
            Self::Never => false,
            Self::EveryNEvents(threshold) => {
                let n: u64 = threshold.into();
                let before: u64 = before.into();
                let after: u64 = after.into();
                after / n > before / n
            }
        }
    }
}
