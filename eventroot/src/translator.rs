//! Conversion between persisted streams and in-memory aggregates.
//!
//! A translator extracts identity, version and pending events from an
//! aggregate on save, and rebuilds the aggregate from history on load.
//! [`DefaultTranslator`] covers aggregates with a single concrete type.
//! [`TaggedTranslator`] covers polymorphic aggregates: it classifies a stream
//! by its first event and dispatches to the constructor registered for that
//! classification.

use crate::aggregate::{AggregateRoot, Reconstitute};
use crate::aggregate_type::{AggregateType, AggregateTypeMapping};
use crate::errors::{AggregateError, AggregateResult};
use crate::event::{DomainEvent, RecordedEvent};
use crate::event_store::StoredEvent;
use crate::types::{AggregateId, EventVersion};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use tracing::debug;

/// Moves aggregates in and out of their persisted form.
pub trait AggregateTranslator<A: AggregateRoot>: Send + Sync {
    /// The identity used to locate the aggregate's stream.
    fn extract_aggregate_id(&self, aggregate: &A) -> AggregateId {
        aggregate.aggregate_id().clone()
    }

    /// The aggregate's version, including pending events.
    fn extract_aggregate_version(&self, aggregate: &A) -> EventVersion {
        aggregate.version()
    }

    /// The events a save would persist, left on the aggregate.
    fn pending_events(&self, aggregate: &A) -> Vec<RecordedEvent<A::Event>> {
        aggregate.recorder().pending().to_vec()
    }

    /// Drains the events to persist.
    fn extract_pending_events(&self, aggregate: &mut A) -> Vec<RecordedEvent<A::Event>> {
        aggregate.pop_recorded_events()
    }

    /// Rebuilds an aggregate from its complete history.
    fn reconstitute_from_history(
        &self,
        id: AggregateId,
        history: &[StoredEvent<A::Event>],
    ) -> AggregateResult<A>;

    /// Applies further history to an existing aggregate, e.g. after a snapshot.
    fn replay_stream_events(
        &self,
        aggregate: &mut A,
        events: &[StoredEvent<A::Event>],
    ) -> AggregateResult<()> {
        aggregate.replay(events)
    }
}

/// Translator for aggregates that know how to create themselves blank.
pub struct DefaultTranslator<A> {
    _aggregate: PhantomData<fn() -> A>,
}

impl<A> DefaultTranslator<A> {
    /// Creates the translator.
    pub const fn new() -> Self {
        Self {
            _aggregate: PhantomData,
        }
    }
}

impl<A> Default for DefaultTranslator<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Clone for DefaultTranslator<A> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<A> fmt::Debug for DefaultTranslator<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultTranslator").finish()
    }
}

impl<A: Reconstitute> AggregateTranslator<A> for DefaultTranslator<A> {
    fn reconstitute_from_history(
        &self,
        id: AggregateId,
        history: &[StoredEvent<A::Event>],
    ) -> AggregateResult<A> {
        A::reconstitute_from_history(id, history)
    }
}

/// Reads the concrete aggregate type off the first event of a stream.
pub trait Discriminator<E>: Send + Sync {
    /// The concrete type, or `None` if the event carries no discriminator.
    fn discriminate(&self, first: &StoredEvent<E>) -> Option<AggregateType>;
}

impl<E, F> Discriminator<E> for F
where
    F: Fn(&StoredEvent<E>) -> Option<AggregateType> + Send + Sync,
{
    fn discriminate(&self, first: &StoredEvent<E>) -> Option<AggregateType> {
        self(first)
    }
}

/// Uses the `_aggregate_type` enrichment the repository writes on save.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataDiscriminator;

impl<E> Discriminator<E> for MetadataDiscriminator {
    fn discriminate(&self, first: &StoredEvent<E>) -> Option<AggregateType> {
        first.metadata.aggregate_type().cloned()
    }
}

/// Uses [`DomainEvent::aggregate_type_hint`] on the first payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct PayloadDiscriminator;

impl<E: DomainEvent> Discriminator<E> for PayloadDiscriminator {
    fn discriminate(&self, first: &StoredEvent<E>) -> Option<AggregateType> {
        first.payload.aggregate_type_hint()
    }
}

type Constructor<A> = Box<dyn Fn(AggregateId) -> A + Send + Sync>;

/// Translator for polymorphic aggregates.
///
/// ```rust,ignore
/// let translator = TaggedTranslator::new(PayloadDiscriminator)
///     .register(car_type(), |id| Vehicle::Car(Car::blank(id)))
///     .register(truck_type(), |id| Vehicle::Truck(Truck::blank(id)));
/// ```
pub struct TaggedTranslator<A: AggregateRoot> {
    discriminator: Box<dyn Discriminator<A::Event>>,
    constructors: HashMap<AggregateType, Constructor<A>>,
}

impl<A: AggregateRoot> TaggedTranslator<A> {
    /// Creates a translator with no registered variants.
    pub fn new(discriminator: impl Discriminator<A::Event> + 'static) -> Self {
        Self {
            discriminator: Box::new(discriminator),
            constructors: HashMap::new(),
        }
    }

    /// Registers the blank constructor for one concrete type.
    ///
    /// Registering the same type twice keeps the later constructor.
    #[must_use]
    pub fn register<F>(mut self, aggregate_type: AggregateType, constructor: F) -> Self
    where
        F: Fn(AggregateId) -> A + Send + Sync + 'static,
    {
        self.constructors
            .insert(aggregate_type, Box::new(constructor));
        self
    }

    /// Whether a constructor exists for `aggregate_type`.
    pub fn is_registered(&self, aggregate_type: &AggregateType) -> bool {
        self.constructors.contains_key(aggregate_type)
    }

    /// A repository mapping that accepts exactly the registered types.
    pub fn mapping(&self, base: AggregateType) -> AggregateTypeMapping {
        AggregateTypeMapping::polymorphic(base, self.constructors.keys().cloned())
    }
}

impl<A: AggregateRoot> fmt::Debug for TaggedTranslator<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut registered: Vec<_> = self.constructors.keys().collect();
        registered.sort();
        f.debug_struct("TaggedTranslator")
            .field("registered", &registered)
            .finish_non_exhaustive()
    }
}

impl<A: AggregateRoot> AggregateTranslator<A> for TaggedTranslator<A> {
    fn reconstitute_from_history(
        &self,
        id: AggregateId,
        history: &[StoredEvent<A::Event>],
    ) -> AggregateResult<A> {
        let Some(first) = history.first() else {
            return Err(AggregateError::EmptyHistory(id));
        };

        let aggregate_type = self.discriminator.discriminate(first).ok_or_else(|| {
            AggregateError::MissingDiscriminator {
                stream: first.stream_id.clone(),
            }
        })?;

        let constructor = self
            .constructors
            .get(&aggregate_type)
            .ok_or_else(|| AggregateError::UnknownAggregateType(aggregate_type.clone()))?;

        debug!(
            aggregate_id = %id,
            aggregate_type = %aggregate_type,
            events = history.len(),
            "Reconstituting polymorphic aggregate"
        );

        let mut aggregate = constructor(id);
        let actual = aggregate.aggregate_type();
        if actual != aggregate_type {
            return Err(AggregateError::AggregateTypeMismatch {
                expected: aggregate_type,
                actual,
            });
        }

        aggregate.replay(history)?;
        Ok(aggregate)
    }
}
