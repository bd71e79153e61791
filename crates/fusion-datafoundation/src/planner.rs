//! Capacity planning: usable capacity units to device-set count

use std::num::NonZeroU64;

/// Usable capacity of one device set, in TiB
pub const UNIT_CAPACITY_TIB: NonZeroU64 = match NonZeroU64::new(4) {
    Some(capacity) => capacity,
    None => panic!("unit capacity must be non-zero"),
};

/// Device sets needed to provide `usable_capacity_units`
///
/// Rounds up: a partial unit still needs a whole device set.
pub fn plan(usable_capacity_units: u64, unit_capacity: NonZeroU64) -> u64 {
    usable_capacity_units.div_ceil(unit_capacity.get())
}

/// [`plan`] with the provider's [`UNIT_CAPACITY_TIB`]
pub fn plan_device_sets(usable_capacity_units: u64) -> u64 {
    plan(usable_capacity_units, UNIT_CAPACITY_TIB)
}
