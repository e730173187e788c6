//! Static partitioning of one workload axis across compute units.
//!
//! Each unit derives its own slice from the axis totals and its index on the
//! axis; no state is shared between units. An axis that runs out of work
//! before reaching a unit yields `None`, which callers treat as an ordinary
//! idle outcome rather than an error.

/// Slice of one partitioned axis assigned to one compute unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitSlice {
    pub start: usize,
    pub len: usize,
    /// Set on the highest-indexed unit with work; its `len` absorbs the
    /// remainder and is the only one allowed to be smaller than the rest.
    pub is_tail: bool,
}

pub(crate) const fn ceil_div(a: usize, b: usize) -> usize {
    (a + b - 1) / b
}

pub(crate) const fn round_up(value: usize, quantum: usize) -> usize {
    ceil_div(value, quantum) * quantum
}

/// Partitions an axis with no alignment requirement.
pub fn partition_axis(units_on_axis: usize, unit_index: usize, total: usize) -> Option<UnitSlice> {
    partition_axis_aligned(units_on_axis, unit_index, total, total, 1)
}

/// Partitions an axis whose per-unit span must be a multiple of `quantum`
/// (e.g. an output-channel axis aligned to a hardware block).
///
/// `aligned_total` is the padded axis size the hardware sees; `real_total`
/// is the logical size actually covered. Returns `None` when `unit_index`
/// lands beyond the last unit with work.
pub fn partition_axis_aligned(
    units_on_axis: usize,
    unit_index: usize,
    aligned_total: usize,
    real_total: usize,
    quantum: usize,
) -> Option<UnitSlice> {
    debug_assert!(units_on_axis > 0, "axis must have at least one unit");
    debug_assert!(quantum > 0, "alignment quantum must be non-zero");
    debug_assert!(real_total > 0, "axis must have work to partition");

    let per_unit = round_up(ceil_div(aligned_total, units_on_axis), quantum);
    let real_units = ceil_div(real_total, per_unit);
    if unit_index >= real_units {
        return None;
    }

    let is_tail = unit_index == real_units - 1;
    let len = if is_tail {
        // Remainder is always in (0, per_unit].
        real_total - (real_units - 1) * per_unit
    } else {
        per_unit
    };
    Some(UnitSlice {
        start: unit_index * per_unit,
        len,
        is_tail,
    })
}
