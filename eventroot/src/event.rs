//! Domain events and events recorded by an aggregate but not yet persisted.

use crate::aggregate_type::AggregateType;
use crate::metadata::EventMetadata;
use crate::types::{EventId, EventVersion, Timestamp};
use serde::{Deserialize, Serialize};

/// An immutable fact about an aggregate.
///
/// Implementations are usually an enum with one variant per event kind; the
/// type tag identifies the variant in logs and persisted form.
pub trait DomainEvent: Clone + Send + Sync + 'static {
    /// The event's type tag, e.g. `"VehicleRegistered"`.
    fn event_type(&self) -> &'static str;

    /// The concrete aggregate type this event implies, if it carries one.
    ///
    /// Creation events of polymorphic aggregates return the variant they
    /// create; every other event returns `None`.
    fn aggregate_type_hint(&self) -> Option<AggregateType> {
        None
    }
}

/// An event recorded by an aggregate and waiting to be saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedEvent<E> {
    /// Identity assigned at record time
    pub event_id: EventId,
    /// The aggregate version this event moves the aggregate to
    pub version: EventVersion,
    /// When the aggregate recorded the event
    pub recorded_at: Timestamp,
    /// Metadata; the repository adds aggregate enrichment on save
    pub metadata: EventMetadata,
    /// The domain event
    pub payload: E,
}

impl<E> RecordedEvent<E> {
    /// Records `payload` at `version` with fresh metadata.
    pub fn new(payload: E, version: EventVersion) -> Self {
        Self {
            event_id: EventId::new(),
            version,
            recorded_at: Timestamp::now(),
            metadata: EventMetadata::new(),
            payload,
        }
    }

    /// Replaces the metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: EventMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}
