//! `proptest` strategies for `EventRoot` types.

use crate::aggregate_type::AggregateType;
use crate::types::{AggregateId, EventVersion, StreamId};
use proptest::prelude::*;

/// Generates valid `AggregateId` values.
pub fn arb_aggregate_id() -> impl Strategy<Value = AggregateId> {
    "[a-z0-9][a-z0-9-]{0,63}".prop_filter_map("Invalid AggregateId", |s| AggregateId::try_new(s).ok())
}

/// Generates valid `AggregateType` names.
pub fn arb_aggregate_type() -> impl Strategy<Value = AggregateType> {
    "[a-z][a-z_]{0,31}".prop_filter_map("Invalid AggregateType", |s| AggregateType::try_new(s).ok())
}

/// Generates valid `StreamId` values.
pub fn arb_stream_id() -> impl Strategy<Value = StreamId> {
    "[a-zA-Z0-9_-]{1,255}".prop_filter_map("Invalid StreamId", |s| StreamId::try_new(s).ok())
}

/// Generates versions small enough to advance without overflow.
pub fn arb_event_version() -> impl Strategy<Value = EventVersion> {
    (0u64..1_000_000).prop_map(|v| EventVersion::try_new(v).expect("non-negative version"))
}
