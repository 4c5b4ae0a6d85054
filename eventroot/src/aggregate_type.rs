//! Aggregate type names and the runtime type assertion used by repositories.
//!
//! A repository serves one *base* aggregate type. When that base is
//! polymorphic (several concrete variants share one event schema), the
//! [`AggregateTypeMapping`] lists every variant name the repository accepts.

use crate::errors::{AggregateError, AggregateResult};
use nutype::nutype;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The name of a concrete or base aggregate type, e.g. `"vehicle"` or `"truck"`.
#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 255),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        AsRef,
        Deref,
        Display,
        Serialize,
        Deserialize
    )
)]
pub struct AggregateType(String);

/// The set of aggregate types a repository is allowed to load and save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateTypeMapping {
    base: AggregateType,
    members: BTreeSet<AggregateType>,
}

impl AggregateTypeMapping {
    /// A mapping for a non-polymorphic aggregate: only `base` is accepted.
    pub fn single(base: AggregateType) -> Self {
        let members = BTreeSet::from([base.clone()]);
        Self { base, members }
    }

    /// A mapping for a polymorphic aggregate.
    ///
    /// `base` names the family and is used for stream naming; `members` are the
    /// concrete variant names an aggregate may report. The base itself is not
    /// accepted unless it is listed.
    pub fn polymorphic(
        base: AggregateType,
        members: impl IntoIterator<Item = AggregateType>,
    ) -> Self {
        Self {
            base,
            members: members.into_iter().collect(),
        }
    }

    /// Adds an accepted variant.
    #[must_use]
    pub fn with_member(mut self, member: AggregateType) -> Self {
        self.members.insert(member);
        self
    }

    /// The base type name.
    pub const fn base(&self) -> &AggregateType {
        &self.base
    }

    /// Accepted variant names, in sorted order.
    pub fn members(&self) -> impl Iterator<Item = &AggregateType> + '_ {
        self.members.iter()
    }

    /// Whether an aggregate reporting `aggregate_type` belongs here.
    pub fn accepts(&self, aggregate_type: &AggregateType) -> bool {
        self.members.contains(aggregate_type)
    }

    /// Rejects an aggregate whose type does not belong to this mapping.
    pub fn assert_accepts(&self, aggregate_type: &AggregateType) -> AggregateResult<()> {
        if self.accepts(aggregate_type) {
            Ok(())
        } else {
            Err(AggregateError::AggregateTypeMismatch {
                expected: self.base.clone(),
                actual: aggregate_type.clone(),
            })
        }
    }
}
