//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Map a value from one range into another.
pub fn lin_map<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where 
    T: Float 
{
    target_range.0 
        + ((value - source_range.0) 
        * (target_range.1 - target_range.0) 
        / (source_range.1 - source_range.0))
}

/// Clamp a value into the `[min, max]` range.
pub fn clamp<T>(value: T, min: T, max: T) -> T 
where
    T: Float
{
    let mut ret = value;

    if ret > max {
        ret = max
    }
    if ret < min {
        ret = min
    }

    ret
}

/// Clamp a value into the symmetric `[-limit, limit]` range.
pub fn clamp_abs<T>(value: T, limit: T) -> T
where
    T: Float
{
    clamp(value, -limit.abs(), limit.abs())
}

/// Returns true if the value lies outside the dead-zone of the given half
/// width.
///
/// A value exactly on the edge of the dead-zone is considered inside it.
pub fn outside_dead_zone<T>(value: T, dead_zone: T) -> bool
where
    T: Float
{
    value.abs() > dead_zone
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
