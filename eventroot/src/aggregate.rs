//! Aggregate roots.
//!
//! An aggregate composes an [`EventRecorder`] for its version and pending
//! events, and implements [`AggregateRoot`] to gain recording, replay and
//! extraction. Its own fields hold domain state, which changes only in
//! [`AggregateRoot::apply`].
//!
//! ```rust,ignore
//! struct Driver {
//!     id: AggregateId,
//!     recorder: EventRecorder<DriverEvent>,
//!     points: u8,
//! }
//!
//! impl Driver {
//!     pub fn assign(&mut self, vehicle: &Vehicle) -> AggregateResult<()> {
//!         if self.points == 0 {
//!             return Err(AggregateError::BusinessRuleViolation(
//!                 "driver's licence is suspended".to_string(),
//!             ));
//!         }
//!         self.record_that(DriverEvent::Assigned {
//!             vehicle: vehicle.aggregate_id().clone(),
//!         });
//!         Ok(())
//!     }
//!
//!     pub fn penalise(&mut self, points: u8) {
//!         self.record_that(DriverEvent::Penalised { points });
//!     }
//! }
//! ```

use crate::aggregate_type::AggregateType;
use crate::errors::{AggregateError, AggregateResult};
use crate::event::{DomainEvent, RecordedEvent};
use crate::event_store::StoredEvent;
use crate::types::{AggregateId, EventVersion};
use serde::{Deserialize, Serialize};

/// Version bookkeeping and pending events for one aggregate.
///
/// Pending events are never serialized; a snapshot captures the version only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct EventRecorder<E> {
    version: EventVersion,
    #[serde(skip)]
    pending: Vec<RecordedEvent<E>>,
}

impl<E> EventRecorder<E> {
    /// A recorder for an aggregate with no history.
    pub fn new() -> Self {
        Self {
            version: EventVersion::initial(),
            pending: Vec::new(),
        }
    }

    /// Current version, counting pending events.
    pub const fn version(&self) -> EventVersion {
        self.version
    }

    /// Events recorded since the last extraction.
    pub fn pending(&self) -> &[RecordedEvent<E>] {
        &self.pending
    }

    /// Whether anything is waiting to be saved.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Records `payload` as the next version.
    pub fn record(&mut self, payload: E) -> &RecordedEvent<E> {
        self.version = self.version.next();
        let index = self.pending.len();
        self.pending.push(RecordedEvent::new(payload, self.version));
        &self.pending[index]
    }

    /// Drains the pending events.
    pub fn take_pending(&mut self) -> Vec<RecordedEvent<E>> {
        std::mem::take(&mut self.pending)
    }

    /// Moves the version forward during replay without recording anything.
    pub fn advance_to(&mut self, version: EventVersion) {
        self.version = version;
    }
}

impl<E> Default for EventRecorder<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// The capabilities of an event-sourced aggregate root.
pub trait AggregateRoot: Send + Sync + Sized {
    /// The event type shared by every variant of this aggregate.
    type Event: DomainEvent;

    /// The aggregate's identity.
    fn aggregate_id(&self) -> &AggregateId;

    /// The concrete type of this instance.
    ///
    /// Polymorphic aggregates answer per variant.
    fn aggregate_type(&self) -> AggregateType;

    /// Applies one event to domain state. Must not record events.
    fn apply(&mut self, event: &Self::Event);

    /// The composed recorder.
    fn recorder(&self) -> &EventRecorder<Self::Event>;

    /// The composed recorder, mutably.
    fn recorder_mut(&mut self) -> &mut EventRecorder<Self::Event>;

    /// Current version, including pending events.
    fn version(&self) -> EventVersion {
        self.recorder().version()
    }

    /// Applies `event` and queues it for saving.
    fn record_that(&mut self, event: Self::Event) {
        self.apply(&event);
        self.recorder_mut().record(event);
    }

    /// Removes and returns the pending events.
    fn pop_recorded_events(&mut self) -> Vec<RecordedEvent<Self::Event>> {
        self.recorder_mut().take_pending()
    }

    /// Applies persisted history.
    ///
    /// Each event must carry the version directly after the aggregate's current
    /// one, and any aggregate enrichment on it must name this aggregate. Replay
    /// never records pending events.
    fn replay(&mut self, history: &[StoredEvent<Self::Event>]) -> AggregateResult<()> {
        for stored in history {
            let expected = self.version().next();
            if stored.event_version != expected {
                return Err(AggregateError::NonContiguousHistory {
                    aggregate_id: self.aggregate_id().clone(),
                    expected,
                    actual: stored.event_version,
                });
            }
            if let Some(enrichment) = &stored.metadata.aggregate {
                if &enrichment.aggregate_id != self.aggregate_id() {
                    return Err(AggregateError::IdentityMismatch {
                        expected: self.aggregate_id().clone(),
                        actual: enrichment.aggregate_id.clone(),
                    });
                }
            }
            self.apply(&stored.payload);
            self.recorder_mut().advance_to(expected);
        }
        Ok(())
    }
}

/// Aggregates that can be created blank for a known identity.
///
/// Used by [`crate::translator::DefaultTranslator`]; polymorphic aggregates
/// register per-variant constructors with a
/// [`crate::translator::TaggedTranslator`] instead.
pub trait Reconstitute: AggregateRoot {
    /// A blank aggregate with the given identity and no history.
    fn with_identity(id: AggregateId) -> Self;

    /// Builds an aggregate from its full history.
    fn reconstitute_from_history(
        id: AggregateId,
        history: &[StoredEvent<Self::Event>],
    ) -> AggregateResult<Self> {
        if history.is_empty() {
            return Err(AggregateError::EmptyHistory(id));
        }
        let mut aggregate = Self::with_identity(id);
        aggregate.replay(history)?;
        Ok(aggregate)
    }
}
