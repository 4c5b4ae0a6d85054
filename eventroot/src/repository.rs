//! Loading and saving aggregate roots.
//!
//! Each aggregate lives in its own stream, named `"{prefix}-{aggregate_id}"`.
//! The repository checks every aggregate it touches against its
//! [`AggregateTypeMapping`], delegates extraction and reconstruction to an
//! [`AggregateTranslator`], and optionally keeps snapshots.

use crate::aggregate::AggregateRoot;
use crate::aggregate_type::{AggregateType, AggregateTypeMapping};
use crate::config::RepositoryConfig;
use crate::errors::{AggregateError, AggregateResult, EventStoreError};
use crate::event::RecordedEvent;
use crate::event_store::{EventStore, EventToWrite, ExpectedVersion, ReadOptions, StoredEvent};
use crate::metadata::{AggregateMetadata, MetadataEnricher};
use crate::snapshot::{Snapshot, SnapshotStore};
use crate::translator::AggregateTranslator;
use crate::types::{AggregateId, EventVersion, StreamId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Repository for one (possibly polymorphic) aggregate type.
pub struct AggregateRepository<A, S, T>
where
    A: AggregateRoot,
{
    store: S,
    translator: T,
    mapping: AggregateTypeMapping,
    config: RepositoryConfig,
    snapshot_store: Option<Arc<dyn SnapshotStore<A>>>,
    enrichers: Vec<Arc<dyn MetadataEnricher>>,
    _aggregate: PhantomData<fn() -> A>,
}

impl<A, S, T> fmt::Debug for AggregateRepository<A, S, T>
where
    A: AggregateRoot,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AggregateRepository")
            .field("mapping", &self.mapping)
            .field("config", &self.config)
            .field("snapshots", &self.snapshot_store.is_some())
            .field("enrichers", &self.enrichers.len())
            .finish_non_exhaustive()
    }
}

impl<A, S, T> AggregateRepository<A, S, T>
where
    A: AggregateRoot + Clone,
    S: EventStore<Event = A::Event>,
    T: AggregateTranslator<A>,
{
    /// Creates a repository with the default configuration and no snapshots.
    pub fn new(store: S, translator: T, mapping: AggregateTypeMapping) -> Self {
        Self {
            store,
            translator,
            mapping,
            config: RepositoryConfig::default(),
            snapshot_store: None,
            enrichers: Vec::new(),
            _aggregate: PhantomData,
        }
    }

    /// Replaces the configuration.
    #[must_use]
    pub fn with_config(mut self, config: RepositoryConfig) -> Self {
        self.config = config;
        self
    }

    /// Attaches a snapshot store.
    #[must_use]
    pub fn with_snapshot_store(mut self, snapshot_store: Arc<dyn SnapshotStore<A>>) -> Self {
        self.snapshot_store = Some(snapshot_store);
        self
    }

    /// Adds a metadata enricher, run on every saved event.
    #[must_use]
    pub fn with_metadata_enricher(mut self, enricher: impl MetadataEnricher + 'static) -> Self {
        self.enrichers.push(Arc::new(enricher));
        self
    }

    /// The aggregate types this repository serves.
    pub const fn mapping(&self) -> &AggregateTypeMapping {
        &self.mapping
    }

    /// The active configuration.
    pub const fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// The underlying event store.
    pub const fn event_store(&self) -> &S {
        &self.store
    }

    /// The stream holding `aggregate_id`'s history.
    pub fn stream_id_for(&self, aggregate_id: &AggregateId) -> AggregateResult<StreamId> {
        let prefix = self
            .config
            .stream_prefix
            .as_ref()
            .map_or_else(|| self.mapping.base().to_string(), ToString::to_string);
        let name = format!("{prefix}-{aggregate_id}");
        StreamId::try_new(name.clone()).map_err(|_| AggregateError::InvalidStreamName(name))
    }

    /// Persists the aggregate's pending events.
    ///
    /// Returns the aggregate's version after the save. An aggregate with no
    /// pending events is not written. If the write fails the pending events
    /// stay on the aggregate.
    #[instrument(skip(self, aggregate), fields(aggregate_id = %aggregate.aggregate_id()))]
    pub async fn save_aggregate_root(&self, aggregate: &mut A) -> AggregateResult<EventVersion> {
        let aggregate_type = aggregate.aggregate_type();
        if let Err(error) = self.mapping.assert_accepts(&aggregate_type) {
            warn!(%aggregate_type, base = %self.mapping.base(), "Rejected aggregate of foreign type");
            return Err(error);
        }

        let aggregate_id = self.translator.extract_aggregate_id(aggregate);
        let stream_id = self.stream_id_for(&aggregate_id)?;
        let current = self.translator.extract_aggregate_version(aggregate);
        let pending = self.translator.pending_events(aggregate);

        let Some(first) = pending.first() else {
            debug!("No pending events to save");
            return Ok(current);
        };

        let persisted = first.version.rewound_by(1);
        let expected = ExpectedVersion::from_version(persisted);
        let events = pending
            .into_iter()
            .map(|recorded| self.prepare(recorded, &aggregate_type, &aggregate_id))
            .collect::<Vec<_>>();
        let count = events.len();

        let new_version = match self.store.append_to_stream(&stream_id, expected, events).await {
            Ok(version) => version,
            Err(EventStoreError::VersionConflict {
                expected, current, ..
            }) => {
                warn!(%stream_id, %expected, %current, "Concurrent modification detected");
                return Err(AggregateError::ConcurrencyConflict {
                    aggregate_id,
                    stream: stream_id,
                });
            }
            Err(error) => return Err(error.into()),
        };

        self.translator.extract_pending_events(aggregate);
        info!(%stream_id, events = count, version = %new_version, "Saved aggregate");

        if self
            .config
            .snapshot_policy
            .should_snapshot(persisted, new_version)
        {
            if let Err(error) = self.snapshot(aggregate).await {
                warn!(%error, "Snapshot after save failed; history remains authoritative");
            }
        }

        Ok(new_version)
    }

    /// Loads an aggregate, or `None` if it has neither events nor a snapshot.
    #[instrument(skip(self))]
    pub async fn get_aggregate_root(&self, aggregate_id: &AggregateId) -> AggregateResult<Option<A>> {
        let stream_id = self.stream_id_for(aggregate_id)?;
        let mut aggregate = self.restore_snapshot(aggregate_id).await;
        let mut next = aggregate
            .as_ref()
            .map_or_else(EventVersion::initial, AggregateRoot::version)
            .next();
        let batch_size: usize = self.config.read_batch_size.into();

        loop {
            let options = ReadOptions::new()
                .from_version(next)
                .with_max_events(batch_size);
            let batch = self.store.read_stream(&stream_id, options).await?;
            let Some(last) = batch.last_version() else {
                break;
            };
            let exhausted = batch.len() < batch_size;

            aggregate = Some(self.fold_batch(aggregate, aggregate_id, &batch.events)?);
            next = last.next();

            if exhausted {
                break;
            }
        }

        let Some(aggregate) = aggregate else {
            debug!("Aggregate not found");
            return Ok(None);
        };

        self.mapping.assert_accepts(&aggregate.aggregate_type())?;
        debug!(version = %aggregate.version(), "Loaded aggregate");
        Ok(Some(aggregate))
    }

    /// Loads an aggregate that must exist.
    pub async fn load(&self, aggregate_id: &AggregateId) -> AggregateResult<A> {
        self.get_aggregate_root(aggregate_id)
            .await?
            .ok_or_else(|| AggregateError::AggregateNotFound(aggregate_id.clone()))
    }

    /// Whether the aggregate's stream exists.
    pub async fn exists(&self, aggregate_id: &AggregateId) -> AggregateResult<bool> {
        let stream_id = self.stream_id_for(aggregate_id)?;
        Ok(self.store.stream_exists(&stream_id).await?)
    }

    /// Stores a snapshot of a fully saved aggregate.
    ///
    /// Does nothing without a snapshot store. The aggregate must be of an
    /// accepted type and its version must equal the head of its stream:
    /// an aggregate ahead of the stream has unsaved changes, one behind it
    /// is a stale copy.
    #[instrument(skip(self, aggregate), fields(aggregate_id = %aggregate.aggregate_id()))]
    pub async fn snapshot(&self, aggregate: &A) -> AggregateResult<()> {
        let Some(snapshot_store) = &self.snapshot_store else {
            return Ok(());
        };
        self.mapping.assert_accepts(&aggregate.aggregate_type())?;

        let aggregate_id = aggregate.aggregate_id();
        if aggregate.recorder().has_pending() {
            return Err(AggregateError::UnsavedChanges(aggregate_id.clone()));
        }

        let stream_id = self.stream_id_for(aggregate_id)?;
        let head = self.store.get_stream_version(&stream_id).await?;
        match head {
            Some(head) if head == aggregate.version() => {}
            Some(head) if head > aggregate.version() => {
                warn!(%stream_id, %head, version = %aggregate.version(), "Refusing to snapshot a stale aggregate");
                return Err(AggregateError::ConcurrencyConflict {
                    aggregate_id: aggregate_id.clone(),
                    stream: stream_id,
                });
            }
            _ => {
                warn!(%stream_id, version = %aggregate.version(), "Refusing to snapshot state the stream does not hold");
                return Err(AggregateError::UnsavedChanges(aggregate_id.clone()));
            }
        }

        let snapshot = Snapshot::new(
            self.mapping.base().clone(),
            aggregate.aggregate_id().clone(),
            aggregate.clone(),
            aggregate.version(),
        );
        snapshot_store.save(snapshot).await?;
        debug!(version = %aggregate.version(), "Snapshot stored");
        Ok(())
    }

    fn prepare(
        &self,
        recorded: RecordedEvent<A::Event>,
        aggregate_type: &AggregateType,
        aggregate_id: &AggregateId,
    ) -> EventToWrite<A::Event> {
        let metadata = recorded.metadata.with_aggregate(AggregateMetadata {
            aggregate_type: aggregate_type.clone(),
            aggregate_id: aggregate_id.clone(),
            aggregate_version: recorded.version,
        });
        let metadata = self
            .enrichers
            .iter()
            .fold(metadata, |metadata, enricher| enricher.enrich(metadata));
        EventToWrite::with_metadata(recorded.event_id, recorded.payload, metadata)
    }

    fn fold_batch(
        &self,
        aggregate: Option<A>,
        aggregate_id: &AggregateId,
        events: &[StoredEvent<A::Event>],
    ) -> AggregateResult<A> {
        match aggregate {
            Some(mut aggregate) => {
                self.translator.replay_stream_events(&mut aggregate, events)?;
                Ok(aggregate)
            }
            None => self
                .translator
                .reconstitute_from_history(aggregate_id.clone(), events),
        }
    }

    async fn restore_snapshot(&self, aggregate_id: &AggregateId) -> Option<A> {
        let snapshot_store = self.snapshot_store.as_ref()?;
        match snapshot_store.get(self.mapping.base(), aggregate_id).await {
            Ok(Some(snapshot)) if &snapshot.aggregate_id == aggregate_id => {
                debug!(version = %snapshot.last_version, "Restored snapshot");
                Some(snapshot.aggregate_root)
            }
            Ok(Some(snapshot)) => {
                warn!(found = %snapshot.aggregate_id, "Ignoring snapshot of another aggregate");
                None
            }
            Ok(None) => None,
            Err(error) => {
                warn!(%error, "Snapshot unavailable; replaying full history");
                None
            }
        }
    }
}
