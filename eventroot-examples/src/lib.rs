//! Example aggregates built with the `EventRoot` event sourcing library
//!
//! The fleet domain shows both kinds of aggregate the library supports: a
//! polymorphic `Vehicle` whose concrete variant is chosen from the first event
//! of its stream, and a plain `Driver`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
// These are examples, so we don't need to be as pedantic
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::use_self)]

/// Fleet example: cars and trucks sharing one event schema, plus drivers
pub mod fleet;
