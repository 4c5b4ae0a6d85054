//! Test support for code built on `EventRoot`.
//!
//! Enabled with the `testing` feature.
//!
//! - [`builders`]: build contiguous stored-event histories for replay tests
//! - [`generators`]: `proptest` strategies for identity and type names
//!
//! ```rust,ignore
//! use eventroot::testing::builders::HistoryBuilder;
//!
//! let history = HistoryBuilder::new("vehicle-car-1")
//!     .enriched_as("car", "car-1")
//!     .event(VehicleEvent::registered_car())
//!     .event(VehicleEvent::Refuelled { litres: 40 })
//!     .build();
//! ```

pub mod builders;
pub mod generators;
