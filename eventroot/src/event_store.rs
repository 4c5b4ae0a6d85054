//! Event store port.
//!
//! The `EventStore` trait is the boundary between aggregates and whatever
//! persists their streams. One aggregate owns one stream; streams are read in
//! version order and appended to under optimistic concurrency control.

use crate::errors::EventStoreResult;
use crate::event::RecordedEvent;
use crate::metadata::EventMetadata;
use crate::types::{EventId, EventVersion, StreamId, Timestamp};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One page of an aggregate's stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamData<E> {
    /// Stream the page came from
    pub stream_id: StreamId,
    /// Events inside the requested window, oldest first
    pub events: Vec<StoredEvent<E>>,
    /// Head of the whole stream when it was read; 0 for a missing stream
    pub stream_version: EventVersion,
}

impl<E> StreamData<E> {
    /// Wraps a page read from `stream_id`.
    pub const fn new(
        stream_id: StreamId,
        events: Vec<StoredEvent<E>>,
        stream_version: EventVersion,
    ) -> Self {
        Self {
            stream_id,
            events,
            stream_version,
        }
    }

    /// Whether the window held no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events in this page.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Version of the last event read, if any.
    pub fn last_version(&self) -> Option<EventVersion> {
        self.events.last().map(|event| event.event_version)
    }
}

/// An event as the store hands it back during replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEvent<E> {
    /// Id assigned when the aggregate recorded it
    pub event_id: EventId,
    /// Aggregate stream holding it
    pub stream_id: StreamId,
    /// Position in the stream, which is also the aggregate version it produced
    pub event_version: EventVersion,
    /// Append time
    pub timestamp: Timestamp,
    /// Domain payload applied on replay
    pub payload: E,
    /// Metadata, including the aggregate enrichment written on save
    pub metadata: EventMetadata,
}

impl<E> StoredEvent<E> {
    /// Assembles an event read back from `stream_id`.
    pub const fn new(
        event_id: EventId,
        stream_id: StreamId,
        event_version: EventVersion,
        timestamp: Timestamp,
        payload: E,
        metadata: EventMetadata,
    ) -> Self {
        Self {
            event_id,
            stream_id,
            event_version,
            timestamp,
            payload,
            metadata,
        }
    }
}

/// Window of versions to read from an aggregate stream.
///
/// The repository pages through a stream by moving `from_version` forward
/// and capping each page with `max_events`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOptions {
    /// Page size cap; unbounded when absent
    pub max_events: Option<usize>,
    /// First version in the window, inclusive
    pub from_version: Option<EventVersion>,
    /// Last version in the window, inclusive
    pub to_version: Option<EventVersion>,
}

impl ReadOptions {
    /// The whole stream, unpaged.
    pub const fn new() -> Self {
        Self {
            max_events: None,
            from_version: None,
            to_version: None,
        }
    }

    /// Caps the page at `max_events`.
    #[must_use]
    pub const fn with_max_events(mut self, max_events: usize) -> Self {
        self.max_events = Some(max_events);
        self
    }

    /// Skips events before `version`.
    #[must_use]
    pub const fn from_version(mut self, version: EventVersion) -> Self {
        self.from_version = Some(version);
        self
    }

    /// Skips events after `version`.
    #[must_use]
    pub const fn to_version(mut self, version: EventVersion) -> Self {
        self.to_version = Some(version);
        self
    }

    /// Whether an event at `version` falls inside the requested range.
    pub fn includes(&self, version: EventVersion) -> bool {
        self.from_version.map_or(true, |from| version >= from)
            && self.to_version.map_or(true, |to| version <= to)
    }
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// What an append assumes about the head of the aggregate's stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// First save of a fresh aggregate; the stream must be absent
    New,
    /// The stream head must be at this version
    Exact(EventVersion),
    /// Append unconditionally
    Any,
}

impl ExpectedVersion {
    /// The expectation for a stream last seen at `version`.
    pub fn from_version(version: EventVersion) -> Self {
        if version.is_initial() {
            Self::New
        } else {
            Self::Exact(version)
        }
    }
}

/// A pending aggregate event on its way into the store.
#[derive(Debug, Clone)]
pub struct EventToWrite<E> {
    /// Id carried over from the recorded event
    pub event_id: EventId,
    /// Domain payload
    pub payload: E,
    /// Metadata after enrichment
    pub metadata: EventMetadata,
}

impl<E> EventToWrite<E> {
    /// An event with empty metadata.
    pub fn new(event_id: EventId, payload: E) -> Self {
        Self {
            event_id,
            payload,
            metadata: EventMetadata::new(),
        }
    }

    /// An event carrying already-enriched metadata.
    pub const fn with_metadata(event_id: EventId, payload: E, metadata: EventMetadata) -> Self {
        Self {
            event_id,
            payload,
            metadata,
        }
    }
}

impl<E> From<RecordedEvent<E>> for EventToWrite<E> {
    fn from(recorded: RecordedEvent<E>) -> Self {
        Self::with_metadata(recorded.event_id, recorded.payload, recorded.metadata)
    }
}

/// The persistence port every store adapter implements.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// The event type this store handles.
    type Event: Send + Sync;

    /// Reads one stream in ascending version order.
    ///
    /// A stream that does not exist reads as empty at version 0.
    async fn read_stream(
        &self,
        stream_id: &StreamId,
        options: ReadOptions,
    ) -> EventStoreResult<StreamData<Self::Event>>;

    /// Appends events to a stream atomically and returns the new stream version.
    ///
    /// # Errors
    /// * `EventStoreError::VersionConflict` - if `expected` does not hold
    /// * `EventStoreError::DuplicateEventId` - if an event ID already exists
    async fn append_to_stream(
        &self,
        stream_id: &StreamId,
        expected: ExpectedVersion,
        events: Vec<EventToWrite<Self::Event>>,
    ) -> EventStoreResult<EventVersion>;

    /// Whether anything was ever appended to `stream_id`.
    async fn stream_exists(&self, stream_id: &StreamId) -> EventStoreResult<bool>;

    /// Head version of `stream_id`; `None` for a stream never written.
    async fn get_stream_version(
        &self,
        stream_id: &StreamId,
    ) -> EventStoreResult<Option<EventVersion>>;
}
