//! Validated value types for the fleet example.

use nutype::nutype;

/// Registration plate, normalised to upper case.
#[nutype(
    sanitize(trim, uppercase),
    validate(not_empty, len_char_max = 12),
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
pub struct LicencePlate(String);

/// A driver's full name.
#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 100),
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
pub struct DriverName(String);

/// Distance covered by a single trip, in kilometres.
#[nutype(
    validate(greater_or_equal = 1, less_or_equal = 5_000),
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Into,
        Display,
        Serialize,
        Deserialize
    )
)]
pub struct Distance(u32);

/// Cargo weight in tonnes.
#[nutype(
    validate(greater_or_equal = 1, less_or_equal = 40),
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Into,
        Display,
        Serialize,
        Deserialize
    )
)]
pub struct Tonnes(u32);
