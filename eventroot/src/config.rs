//! Repository configuration.
//!
//! Every tunable is a validated newtype, so a `RepositoryConfig` that exists
//! is a usable one.

use crate::snapshot::SnapshotPolicy;
use nutype::nutype;
use serde::{Deserialize, Serialize};

/// Prefix of every stream a repository writes, e.g. `"vehicle"` for
/// `"vehicle-<id>"`.
#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 128),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        Hash,
        AsRef,
        Deref,
        Display,
        Serialize,
        Deserialize
    )
)]
pub struct StreamPrefix(String);

/// Number of events fetched per read while loading an aggregate.
#[nutype(
    validate(greater_or_equal = 1, less_or_equal = 10_000),
    default = 500,
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Into,
        Default,
        Serialize,
        Deserialize
    )
)]
pub struct ReadBatchSize(usize);

/// How an [`crate::repository::AggregateRepository`] names streams, pages
/// reads and takes snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// Stream name prefix; defaults to the repository's base aggregate type
    pub stream_prefix: Option<StreamPrefix>,
    /// Events per read when loading
    pub read_batch_size: ReadBatchSize,
    /// When to snapshot after a save
    pub snapshot_policy: SnapshotPolicy,
}

impl RepositoryConfig {
    /// The default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the stream prefix.
    #[must_use]
    pub fn with_stream_prefix(mut self, prefix: StreamPrefix) -> Self {
        self.stream_prefix = Some(prefix);
        self
    }

    /// Sets the read batch size.
    #[must_use]
    pub const fn with_read_batch_size(mut self, size: ReadBatchSize) -> Self {
        self.read_batch_size = size;
        self
    }

    /// Sets the snapshot policy.
    #[must_use]
    pub const fn with_snapshot_policy(mut self, policy: SnapshotPolicy) -> Self {
        self.snapshot_policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::SnapshotThreshold;

    #[test]
    fn defaults_read_in_batches_of_500_without_snapshots() {
        let config = RepositoryConfig::new();
        let batch: usize = config.read_batch_size.into();

        assert_eq!(batch, 500);
        assert_eq!(config.snapshot_policy, SnapshotPolicy::Never);
        assert!(config.stream_prefix.is_none());
    }

    #[test]
    fn batch_size_is_bounded() {
        assert!(ReadBatchSize::try_new(0).is_err());
        assert!(ReadBatchSize::try_new(10_001).is_err());
        assert!(ReadBatchSize::try_new(1).is_ok());
    }

    #[test]
    fn builder_overrides_fields() {
        let policy = SnapshotPolicy::EveryNEvents(SnapshotThreshold::try_new(10).unwrap());
        let config = RepositoryConfig::new()
            .with_stream_prefix(StreamPrefix::try_new("fleet").unwrap())
            .with_read_batch_size(ReadBatchSize::try_new(2).unwrap())
            .with_snapshot_policy(policy);

        assert_eq!(config.stream_prefix.unwrap().as_ref(), "fleet");
        assert_eq!(config.snapshot_policy, policy);
    }

    #[test]
    fn config_deserializes_from_json() {
        let json = r#"{
            "stream_prefix": "fleet",
            "read_batch_size": 50,
            "snapshot_policy": { "EveryNEvents": 25 }
        }"#;

        let config: RepositoryConfig = serde_json::from_str(json).unwrap();
        let batch: usize = config.read_batch_size.into();

        assert_eq!(batch, 50);
        assert!(matches!(
            config.snapshot_policy,
            SnapshotPolicy::EveryNEvents(_)
        ));
    }

    #[test]
    fn invalid_batch_size_fails_deserialization() {
        let json = r#"{ "stream_prefix": null, "read_batch_size": 0, "snapshot_policy": "Never" }"#;
        assert!(serde_json::from_str::<RepositoryConfig>(json).is_err());
    }
}
