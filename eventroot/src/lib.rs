//! `EventRoot` - aggregate-root event sourcing
//!
//! Aggregates compose an [`aggregate::EventRecorder`] and implement
//! [`aggregate::AggregateRoot`]; they record domain events as pending and
//! derive their state only by applying events. An
//! [`repository::AggregateRepository`] saves pending events to one stream per
//! aggregate and loads aggregates back through an
//! [`translator::AggregateTranslator`]. Polymorphic aggregates, where several
//! concrete variants share one event schema, are reconstructed by a
//! [`translator::TaggedTranslator`] that picks the variant from the first
//! event in the stream.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod aggregate;
pub mod aggregate_type;
pub mod config;
pub mod errors;
pub mod event;
pub mod event_store;
pub mod metadata;
pub mod repository;
pub mod snapshot;
pub mod translator;
pub mod types;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Common imports for aggregate implementations.
pub mod prelude {
    pub use crate::aggregate::{AggregateRoot, EventRecorder, Reconstitute};
    pub use crate::aggregate_type::{AggregateType, AggregateTypeMapping};
    pub use crate::errors::{AggregateError, AggregateResult};
    pub use crate::event::DomainEvent;
    pub use crate::event_store::{EventStore, StoredEvent};
    pub use crate::repository::AggregateRepository;
    pub use crate::translator::{
        AggregateTranslator, DefaultTranslator, MetadataDiscriminator, PayloadDiscriminator,
        TaggedTranslator,
    };
    pub use crate::types::{AggregateId, EventVersion};
}
