//! Unit grid plan: units per axis and the nesting of the global unit-id
//! space.
//!
//! The plan is chosen by the host ahead of dispatch and shared read-only by
//! every unit. Nothing here reads ambient state; the unit id is always an
//! explicit argument.

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

use crate::address::IterationOrder;
use crate::workload::{ConvWorkload, GroupMode};

/// One partitionable axis of the workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    Batch,
    Group,
    OutChannel,
    Depth,
    Row,
    Col,
}

const ALL_AXES: [Axis; 6] = [
    Axis::Batch,
    Axis::Group,
    Axis::OutChannel,
    Axis::Depth,
    Axis::Row,
    Axis::Col,
];

/// Units assigned to each axis plus the nesting order of the global unit-id
/// space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridPlan {
    pub batch_units: usize,
    pub group_units: usize,
    pub cout_units: usize,
    pub depth_units: usize,
    /// In flattened-position order this axis partitions the combined "m"
    /// axis and `depth_units`/`col_units` must stay 1.
    pub row_units: usize,
    pub col_units: usize,
    /// Axis nesting across the global unit-id space; the last entry varies
    /// fastest.
    pub nesting: [Axis; 6],
    pub iter_order: IterationOrder,
}

/// Per-axis unit indices decomposed from a global unit id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnitCoords {
    pub batch: usize,
    pub group: usize,
    pub cout: usize,
    pub depth: usize,
    pub row: usize,
    pub col: usize,
}

impl UnitCoords {
    fn index_mut(&mut self, axis: Axis) -> &mut usize {
        match axis {
            Axis::Batch => &mut self.batch,
            Axis::Group => &mut self.group,
            Axis::OutChannel => &mut self.cout,
            Axis::Depth => &mut self.depth,
            Axis::Row => &mut self.row,
            Axis::Col => &mut self.col,
        }
    }
}

impl GridPlan {
    pub const DEFAULT_NESTING: [Axis; 6] = [
        Axis::Batch,
        Axis::Group,
        Axis::OutChannel,
        Axis::Depth,
        Axis::Row,
        Axis::Col,
    ];

    /// Plan that keeps the whole workload on one unit.
    pub fn single(iter_order: IterationOrder) -> Self {
        GridPlan {
            batch_units: 1,
            group_units: 1,
            cout_units: 1,
            depth_units: 1,
            row_units: 1,
            col_units: 1,
            nesting: Self::DEFAULT_NESTING,
            iter_order,
        }
    }

    pub fn units_on(&self, axis: Axis) -> usize {
        match axis {
            Axis::Batch => self.batch_units,
            Axis::Group => self.group_units,
            Axis::OutChannel => self.cout_units,
            Axis::Depth => self.depth_units,
            Axis::Row => self.row_units,
            Axis::Col => self.col_units,
        }
    }

    /// Total units the plan spans.
    pub fn unit_count(&self) -> usize {
        ALL_AXES.iter().map(|axis| self.units_on(*axis)).product()
    }

    /// Decomposes a global unit id into per-axis indices.
    ///
    /// The outermost nesting axis is left unwrapped, so ids at or beyond
    /// `unit_count()` resolve to an out-of-range index there and fall out of
    /// partitioning as ordinary idle units.
    pub fn coords(&self, unit_id: usize) -> UnitCoords {
        let mut rem = unit_id;
        let mut coords = UnitCoords::default();
        for (pos, axis) in self.nesting.iter().enumerate().rev() {
            let units = self.units_on(*axis);
            *coords.index_mut(*axis) = if pos == 0 { rem } else { rem % units };
            rem /= units;
        }
        coords
    }

    /// Checks plan consistency against a workload before dispatch.
    pub fn validate_for(&self, workload: &ConvWorkload) -> Result<()> {
        for axis in ALL_AXES {
            ensure!(
                self.units_on(axis) > 0,
                "grid plan must assign at least one unit to {axis:?}"
            );
        }
        for axis in ALL_AXES {
            ensure!(
                self.nesting.iter().filter(|a| **a == axis).count() == 1,
                "grid plan nesting must list every axis exactly once, {axis:?} is off"
            );
        }
        if workload.group_mode == GroupMode::Ungrouped {
            ensure!(
                self.group_units == 1,
                "ungrouped workload cannot partition the group axis"
            );
        }
        if self.iter_order == IterationOrder::FlattenedPosition {
            ensure!(
                self.depth_units == 1 && self.col_units == 1,
                "flattened-position order partitions only the combined position axis"
            );
        }
        if workload.fmap_layout.spatial_rank() == 2 {
            ensure!(
                self.depth_units == 1,
                "2D workload cannot partition the depth axis"
            );
        }
        Ok(())
    }
}
