//! In-memory adapters for `EventRoot`.
//!
//! [`InMemoryEventStore`] implements the `EventStore` port and
//! [`InMemorySnapshotStore`] the `SnapshotStore` port. Neither persists
//! anything beyond the life of the process; they exist for tests, examples
//! and prototyping.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod snapshot_store;

pub use snapshot_store::InMemorySnapshotStore;

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use eventroot::errors::{EventStoreError, EventStoreResult};
use eventroot::event_store::{
    EventStore, EventToWrite, ExpectedVersion, ReadOptions, StoredEvent, StreamData,
};
use eventroot::types::{EventId, EventVersion, StreamId, Timestamp};
use tracing::trace;

struct Streams<E> {
    streams: HashMap<StreamId, Vec<StoredEvent<E>>>,
    event_ids: HashSet<EventId>,
}

/// Thread-safe in-memory event store.
///
/// Clones share the same storage.
#[derive(Clone)]
pub struct InMemoryEventStore<E> {
    inner: Arc<RwLock<Streams<E>>>,
}

impl<E> InMemoryEventStore<E> {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Streams {
                streams: HashMap::new(),
                event_ids: HashSet::new(),
            })),
        }
    }

    fn read(&self) -> EventStoreResult<RwLockReadGuard<'_, Streams<E>>> {
        self.inner
            .read()
            .map_err(|_| EventStoreError::Internal("event store lock poisoned".to_string()))
    }

    fn write(&self) -> EventStoreResult<RwLockWriteGuard<'_, Streams<E>>> {
        self.inner
            .write()
            .map_err(|_| EventStoreError::Internal("event store lock poisoned".to_string()))
    }
}

impl<E> Default for InMemoryEventStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

fn version_of<E>(events: Option<&Vec<StoredEvent<E>>>) -> EventVersion {
    events.map_or_else(EventVersion::initial, |events| {
        EventVersion::initial().advanced_by(events.len())
    })
}

#[async_trait]
impl<E> EventStore for InMemoryEventStore<E>
where
    E: Send + Sync + Clone + 'static,
{
    type Event = E;

    async fn read_stream(
        &self,
        stream_id: &StreamId,
        options: ReadOptions,
    ) -> EventStoreResult<StreamData<Self::Event>> {
        let guard = self.read()?;
        let stored = guard.streams.get(stream_id);
        let stream_version = version_of(stored);

        let events: Vec<_> = stored
            .into_iter()
            .flatten()
            .filter(|event| options.includes(event.event_version))
            .take(options.max_events.unwrap_or(usize::MAX))
            .cloned()
            .collect();

        Ok(StreamData::new(stream_id.clone(), events, stream_version))
    }

    async fn append_to_stream(
        &self,
        stream_id: &StreamId,
        expected: ExpectedVersion,
        events: Vec<EventToWrite<Self::Event>>,
    ) -> EventStoreResult<EventVersion> {
        let mut guard = self.write()?;
        let current = version_of(guard.streams.get(stream_id));

        match expected {
            ExpectedVersion::New if guard.streams.contains_key(stream_id) => {
                return Err(EventStoreError::VersionConflict {
                    stream: stream_id.clone(),
                    expected: EventVersion::initial(),
                    current,
                });
            }
            ExpectedVersion::Exact(expected) if expected != current => {
                return Err(EventStoreError::VersionConflict {
                    stream: stream_id.clone(),
                    expected,
                    current,
                });
            }
            _ => {}
        }

        let mut batch_ids = HashSet::with_capacity(events.len());
        for event in &events {
            if guard.event_ids.contains(&event.event_id) || !batch_ids.insert(event.event_id) {
                return Err(EventStoreError::DuplicateEventId(event.event_id));
            }
        }

        if events.is_empty() {
            return Ok(current);
        }

        let Streams { streams, event_ids } = &mut *guard;
        let stream = streams.entry(stream_id.clone()).or_default();
        let mut version = current;
        for event in events {
            version = version.next();
            event_ids.insert(event.event_id);
            stream.push(StoredEvent::new(
                event.event_id,
                stream_id.clone(),
                version,
                Timestamp::now(),
                event.payload,
                event.metadata,
            ));
        }

        trace!(%stream_id, %version, "Appended events");
        Ok(version)
    }

    async fn stream_exists(&self, stream_id: &StreamId) -> EventStoreResult<bool> {
        Ok(self.read()?.streams.contains_key(stream_id))
    }

    async fn get_stream_version(
        &self,
        stream_id: &StreamId,
    ) -> EventStoreResult<Option<EventVersion>> {
        let guard = self.read()?;
        Ok(guard
            .streams
            .get(stream_id)
            .map(|events| version_of(Some(events))))
    }
}
