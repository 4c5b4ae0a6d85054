//! Builders for stored-event histories.

use crate::aggregate_type::AggregateType;
use crate::event_store::StoredEvent;
use crate::metadata::{AggregateMetadata, EventMetadata};
use crate::types::{AggregateId, EventId, EventVersion, StreamId, Timestamp};

/// Builds a stream's history with contiguous versions starting at 1.
///
/// Panics on invalid stream, type or id names; it is meant for tests.
#[derive(Debug, Clone)]
pub struct HistoryBuilder<E> {
    stream_id: StreamId,
    enrichment: Option<(AggregateType, AggregateId)>,
    first_version: EventVersion,
    payloads: Vec<E>,
}

impl<E> HistoryBuilder<E> {
    /// Starts a history for `stream_id`.
    pub fn new(stream_id: impl Into<String>) -> Self {
        Self {
            stream_id: StreamId::try_new(stream_id.into()).expect("valid stream id"),
            enrichment: None,
            first_version: EventVersion::initial().next(),
            payloads: Vec::new(),
        }
    }

    /// Adds the aggregate enrichment a repository would write on save.
    #[must_use]
    pub fn enriched_as(mut self, aggregate_type: &str, aggregate_id: &str) -> Self {
        self.enrichment = Some((
            AggregateType::try_new(aggregate_type).expect("valid aggregate type"),
            AggregateId::try_new(aggregate_id).expect("valid aggregate id"),
        ));
        self
    }

    /// Numbers the first event `version` instead of 1, for stream tails.
    #[must_use]
    pub fn starting_at(mut self, version: u64) -> Self {
        self.first_version = EventVersion::try_new(version).expect("valid version");
        self
    }

    /// Appends one event.
    #[must_use]
    pub fn event(mut self, payload: E) -> Self {
        self.payloads.push(payload);
        self
    }

    /// Appends several events.
    #[must_use]
    pub fn events(mut self, payloads: impl IntoIterator<Item = E>) -> Self {
        self.payloads.extend(payloads);
        self
    }

    /// Produces the stored events.
    pub fn build(self) -> Vec<StoredEvent<E>> {
        let mut version = self.first_version;
        let mut history = Vec::with_capacity(self.payloads.len());

        for payload in self.payloads {
            let mut metadata = EventMetadata::new();
            if let Some((aggregate_type, aggregate_id)) = &self.enrichment {
                metadata = metadata.with_aggregate(AggregateMetadata {
                    aggregate_type: aggregate_type.clone(),
                    aggregate_id: aggregate_id.clone(),
                    aggregate_version: version,
                });
            }
            history.push(StoredEvent::new(
                EventId::new(),
                self.stream_id.clone(),
                version,
                Timestamp::now(),
                payload,
                metadata,
            ));
            version = version.next();
        }

        history
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn versions_are_contiguous_from_one() {
        let history = HistoryBuilder::new("s-1").events(["a", "b", "c"]).build();
        let versions: Vec<u64> = history.iter().map(|e| e.event_version.into()).collect();

        assert_eq!(versions, vec![1, 2, 3]);
    }

    #[test]
    fn tails_start_at_requested_version() {
        let history = HistoryBuilder::new("s-1").starting_at(7).event("x").build();
        let version: u64 = history[0].event_version.into();

        assert_eq!(version, 7);
    }

    #[test]
    fn enrichment_tracks_each_version() {
        let history = HistoryBuilder::new("s-1")
            .enriched_as("truck", "t-1")
            .events(["a", "b"])
            .build();

        let enrichment = history[1].metadata.aggregate.as_ref().unwrap();
        assert_eq!(enrichment.aggregate_type.as_ref(), "truck");
        assert_eq!(enrichment.aggregate_version, EventVersion::try_new(2).unwrap());
    }
}
