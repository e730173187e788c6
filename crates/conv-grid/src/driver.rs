//! Per-unit orchestration: partition, address, bind, invoke.
//!
//! `run_unit` is the whole per-unit control flow. It owns every intermediate
//! value it computes; nothing is shared between units and nothing survives
//! the compute call it feeds.

use log::{debug, trace};

use crate::address::{compute_addresses, AddressSet, ComputeWindow, IterationOrder, UnitSlices};
use crate::error::RoutineResult;
use crate::group::{group_calls, GroupSlices};
use crate::partition::{ceil_div, partition_axis, partition_axis_aligned, round_up, UnitSlice};
use crate::plan::{GridPlan, UnitCoords};
use crate::workload::{ConvWorkload, GroupMode};

/// Interface to the external compute routine.
///
/// The driver issues `bind`, `set_window`, `run`, `end` once per compute
/// call (per unit, or per surviving group for grouped workloads) and
/// propagates any failure unchanged.
pub trait ComputeRoutine {
    fn bind(&mut self, addresses: &AddressSet) -> RoutineResult<()>;
    fn set_window(&mut self, window: &ComputeWindow) -> RoutineResult<()>;
    fn run(&mut self) -> RoutineResult<()>;
    fn end(&mut self) -> RoutineResult<()>;
}

/// Outcome summary for one unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnitReport {
    pub calls_issued: usize,
    /// Groups dropped by the tail trim instead of being issued empty.
    pub groups_skipped: usize,
    /// The unit had no slice on some axis and did nothing.
    pub idle: bool,
}

impl UnitReport {
    fn idle() -> Self {
        UnitReport {
            idle: true,
            ..UnitReport::default()
        }
    }
}

/// Runs the full partition-address-invoke sequence for one compute unit.
///
/// Assumes `workload.validate()` and `grid.validate_for(workload)` passed
/// host-side. Units without work return an idle report without touching the
/// routine.
pub fn run_unit<R: ComputeRoutine>(
    workload: &ConvWorkload,
    grid: &GridPlan,
    unit_id: usize,
    routine: &mut R,
) -> RoutineResult<UnitReport> {
    let coords = grid.coords(unit_id);
    trace!("unit {unit_id}: coords {coords:?}");

    let Some(batch) = partition_axis(grid.batch_units, coords.batch, workload.batch) else {
        debug!("unit {unit_id}: idle, batch axis exhausted");
        return Ok(UnitReport::idle());
    };
    let Some((depth, row, col)) = partition_spatial(workload, grid, &coords) else {
        debug!("unit {unit_id}: idle, spatial axis exhausted");
        return Ok(UnitReport::idle());
    };

    let (group_total, channel_total) = match workload.group_mode {
        GroupMode::Ungrouped => (1, workload.cout),
        GroupMode::Original => (workload.groups, workload.cout_per_group()),
        GroupMode::Optimized { enlarge } => (
            ceil_div(workload.groups, enlarge),
            workload.cout_per_group() * enlarge,
        ),
    };
    let Some(group) = partition_axis(grid.group_units, coords.group, group_total) else {
        debug!("unit {unit_id}: idle, group axis exhausted");
        return Ok(UnitReport::idle());
    };
    let Some(channel) = partition_axis_aligned(
        grid.cout_units,
        coords.cout,
        round_up(channel_total, workload.cout_align),
        channel_total,
        workload.cout_align,
    ) else {
        debug!("unit {unit_id}: idle, output-channel axis exhausted");
        return Ok(UnitReport::idle());
    };

    if workload.group_mode == GroupMode::Ungrouped {
        let slices = UnitSlices {
            batch,
            cout: channel,
            depth,
            row,
            col,
        };
        let (addresses, window) = compute_addresses(workload, grid.iter_order, &slices);
        issue(routine, &addresses, &window)?;
        return Ok(UnitReport {
            calls_issued: 1,
            groups_skipped: 0,
            idle: false,
        });
    }

    let slices = GroupSlices {
        batch,
        depth,
        row,
        col,
        group,
        channel,
    };
    let (calls, skipped) = group_calls(workload, grid.iter_order, &slices);
    for call in &calls {
        issue(routine, &call.addresses, &call.window)?;
    }
    debug!(
        "unit {unit_id}: {} group calls issued, {skipped} skipped",
        calls.len()
    );
    Ok(UnitReport {
        calls_issued: calls.len(),
        groups_skipped: skipped,
        idle: false,
    })
}

fn issue<R: ComputeRoutine>(
    routine: &mut R,
    addresses: &AddressSet,
    window: &ComputeWindow,
) -> RoutineResult<()> {
    routine.bind(addresses)?;
    routine.set_window(window)?;
    routine.run()?;
    routine.end()
}

fn partition_spatial(
    workload: &ConvWorkload,
    grid: &GridPlan,
    coords: &UnitCoords,
) -> Option<(UnitSlice, UnitSlice, UnitSlice)> {
    match grid.iter_order {
        IterationOrder::FlattenedPosition => {
            let row = partition_axis(grid.row_units, coords.row, workload.out_positions())?;
            Some((whole_axis(workload.output[0]), row, whole_axis(workload.output[2])))
        }
        IterationOrder::RowColumn => {
            let depth = partition_axis(grid.depth_units, coords.depth, workload.output[0])?;
            let row = partition_axis(grid.row_units, coords.row, workload.output[1])?;
            let col = partition_axis(grid.col_units, coords.col, workload.output[2])?;
            Some((depth, row, col))
        }
    }
}

fn whole_axis(len: usize) -> UnitSlice {
    UnitSlice {
        start: 0,
        len,
        is_tail: true,
    }
}
