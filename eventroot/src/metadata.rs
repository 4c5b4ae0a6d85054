//! Event metadata.
//!
//! Metadata travels next to each event payload. Besides correlation and
//! causation tracking it carries the aggregate enrichment the repository
//! writes on save: which aggregate type, identity and version produced the
//! event. That enrichment is what lets a stream be classified without
//! inspecting payloads.

use crate::aggregate_type::AggregateType;
use crate::types::{AggregateId, EventId, EventVersion};
use nutype::nutype;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Links related events across aggregates and commands.
#[nutype(
    validate(predicate = |id: &Uuid| id.get_version() == Some(uuid::Version::SortRand)),
    derive(
        Debug,
        Clone,
        Copy,
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
pub struct CorrelationId(Uuid);

impl CorrelationId {
    /// Creates a new correlation ID from a fresh `UUIDv7`.
    pub fn new() -> Self {
        Self::try_new(Uuid::now_v7()).expect("Uuid::now_v7() should always return a valid v7 UUID")
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

/// Links an event to the event that caused it.
#[nutype(
    validate(predicate = |id: &Uuid| id.get_version() == Some(uuid::Version::SortRand)),
    derive(
        Debug,
        Clone,
        Copy,
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
pub struct CausationId(Uuid);

impl From<EventId> for CausationId {
    fn from(event_id: EventId) -> Self {
        Self::try_new(*event_id.as_ref())
            .expect("EventId should always be a valid v7 UUID for CausationId")
    }
}

/// The user or system actor that triggered an event.
#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 255),
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
pub struct UserId(String);

/// Which aggregate produced an event, as written by the repository on save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateMetadata {
    /// Concrete type of the aggregate that recorded the event
    #[serde(rename = "_aggregate_type")]
    pub aggregate_type: AggregateType,
    /// Identity of the aggregate
    #[serde(rename = "_aggregate_id")]
    pub aggregate_id: AggregateId,
    /// Aggregate version this event moves the aggregate to
    #[serde(rename = "_aggregate_version")]
    pub aggregate_version: EventVersion,
}

/// Metadata attached to every event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Links events in the same logical workflow
    pub correlation_id: CorrelationId,
    /// The event that directly caused this one
    pub causation_id: Option<CausationId>,
    /// The actor that triggered the event
    pub user_id: Option<UserId>,
    /// Aggregate enrichment; absent until the repository saves the event
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregate: Option<AggregateMetadata>,
    /// Additional custom metadata
    #[serde(default)]
    pub custom: HashMap<String, serde_json::Value>,
}

impl EventMetadata {
    /// Creates metadata with a fresh correlation ID and nothing else set.
    pub fn new() -> Self {
        Self {
            correlation_id: CorrelationId::new(),
            causation_id: None,
            user_id: None,
            aggregate: None,
            custom: HashMap::new(),
        }
    }

    /// Sets the correlation ID.
    #[must_use]
    pub const fn with_correlation_id(mut self, correlation_id: CorrelationId) -> Self {
        self.correlation_id = correlation_id;
        self
    }

    /// Records the event that caused this one.
    #[must_use]
    pub fn caused_by(mut self, event_id: EventId) -> Self {
        self.causation_id = Some(CausationId::from(event_id));
        self
    }

    /// Sets the user ID.
    #[must_use]
    pub fn with_user_id(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Sets the aggregate enrichment.
    #[must_use]
    pub fn with_aggregate(mut self, aggregate: AggregateMetadata) -> Self {
        self.aggregate = Some(aggregate);
        self
    }

    /// Adds custom metadata.
    #[must_use]
    pub fn with_custom(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.custom.insert(key.into(), value.into());
        self
    }

    /// The concrete aggregate type recorded in the enrichment, if any.
    pub fn aggregate_type(&self) -> Option<&AggregateType> {
        self.aggregate.as_ref().map(|a| &a.aggregate_type)
    }
}

impl Default for EventMetadata {
    fn default() -> Self {
        Self::new()
    }
}

/// Adds metadata to events as the repository writes them.
///
/// Enrichers run after the aggregate enrichment has been applied, in the order
/// they were registered on the repository.
pub trait MetadataEnricher: Send + Sync {
    /// Returns the metadata to persist for one event.
    fn enrich(&self, metadata: EventMetadata) -> EventMetadata;
}

impl<F> MetadataEnricher for F
where
    F: Fn(EventMetadata) -> EventMetadata + Send + Sync,
{
    fn enrich(&self, metadata: EventMetadata) -> EventMetadata {
        self(metadata)
    }
}
