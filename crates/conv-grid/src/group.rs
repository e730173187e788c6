//! Address strategies for grouped convolution.
//!
//! Two strategies share the ungrouped address helpers and differ only in how
//! group indices map to channel ranges: the original strategy walks exact
//! group boundaries, the optimized strategy walks enlarged groups (several
//! raw groups merged per `enlarge`) and trims the partially filled final
//! enlarged group.

use smallvec::SmallVec;

use crate::address::{
    scale_offset, spatial_window, tensor_offset, weight_offset, AddressSet, ComputeWindow,
    IterationOrder,
};
use crate::partition::{ceil_div, UnitSlice};
use crate::workload::{ConvWorkload, GroupMode};

/// Real channel counts of the final, partially filled enlarged group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RaggedTail {
    pub group: usize,
    pub cout: usize,
    pub cin: usize,
}

/// Resolved group assignment for one unit.
///
/// Built once from the unit's group-axis and channel-axis slices; the tail
/// adjustment is folded into `ragged` at resolution so a unit spanning both
/// full and ragged enlarged groups reads the right length for each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupPlan {
    /// First (enlarged) group index assigned to the unit.
    pub group_start: usize,
    pub group_count: usize,
    /// Effective per-(enlarged-)group channel counts.
    pub cin_per_group: usize,
    pub cout_per_group: usize,
    /// Output-channel slice within each assigned group.
    pub channel_start: usize,
    pub channel_len: usize,
    pub ragged: Option<RaggedTail>,
}

impl GroupPlan {
    pub fn resolve(workload: &ConvWorkload, group: &UnitSlice, channel: &UnitSlice) -> GroupPlan {
        let (cin_per_group, cout_per_group, ragged) = match workload.group_mode {
            GroupMode::Ungrouped | GroupMode::Original => {
                (workload.cin_per_group(), workload.cout_per_group(), None)
            }
            GroupMode::Optimized { enlarge } => {
                let remainder = workload.groups % enlarge;
                let ragged = (remainder != 0).then(|| RaggedTail {
                    group: ceil_div(workload.groups, enlarge) - 1,
                    cout: remainder * workload.cout_per_group(),
                    cin: remainder * workload.cin_per_group(),
                });
                (
                    workload.cin_per_group() * enlarge,
                    workload.cout_per_group() * enlarge,
                    ragged,
                )
            }
        };
        GroupPlan {
            group_start: group.start,
            group_count: group.len,
            cin_per_group,
            cout_per_group,
            channel_start: channel.start,
            channel_len: channel.len,
            ragged,
        }
    }

    /// Output-channel slice length for group `g` after the tail trim.
    ///
    /// Never negative; exactly zero when the slice starts at or beyond the
    /// ragged group's real channel count, in which case the group is skipped.
    pub fn channel_len_for(&self, g: usize) -> usize {
        match self.ragged {
            Some(tail) if tail.group == g => self
                .channel_len
                .min(tail.cout.saturating_sub(self.channel_start)),
            _ => self.channel_len,
        }
    }

    /// Input-channel count for group `g`; the ragged group carries only its
    /// real channels.
    pub fn cin_for(&self, g: usize) -> usize {
        match self.ragged {
            Some(tail) if tail.group == g => tail.cin,
            _ => self.cin_per_group,
        }
    }
}

/// One compute invocation for a single (enlarged) group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupCall {
    pub group: usize,
    pub addresses: AddressSet,
    pub window: ComputeWindow,
}

/// Per-axis slices feeding one grouped address computation.
#[derive(Debug, Clone, Copy)]
pub struct GroupSlices {
    pub batch: UnitSlice,
    pub depth: UnitSlice,
    pub row: UnitSlice,
    pub col: UnitSlice,
    /// Slice of the (enlarged) group axis.
    pub group: UnitSlice,
    /// Output-channel slice within one (enlarged) group.
    pub channel: UnitSlice,
}

/// Builds the ascending per-group call list for one unit.
///
/// Groups whose channel slice trims to zero are skipped rather than issued
/// with an empty window; the second return value counts them.
pub fn group_calls(
    workload: &ConvWorkload,
    order: IterationOrder,
    slices: &GroupSlices,
) -> (SmallVec<[GroupCall; 4]>, usize) {
    let plan = GroupPlan::resolve(workload, &slices.group, &slices.channel);
    let sw = spatial_window(workload, order, &slices.depth, &slices.row, &slices.col);

    let mut calls = SmallVec::new();
    let mut skipped = 0;
    for g in plan.group_start..plan.group_start + plan.group_count {
        let cout_len = plan.channel_len_for(g);
        if cout_len == 0 {
            skipped += 1;
            continue;
        }

        let channel = g * plan.cout_per_group + plan.channel_start;
        let output = tensor_offset(
            workload.out_layout,
            workload.output,
            workload.cout,
            slices.batch.start,
            channel,
            sw.out_start,
        );
        let addresses = AddressSet {
            feature_map: tensor_offset(
                workload.fmap_layout,
                workload.input,
                workload.cin,
                slices.batch.start,
                g * plan.cin_per_group,
                sw.in_clamped,
            ),
            weight: weight_offset(
                workload.weight_layout,
                plan.cin_per_group,
                workload.kernel_volume(),
                channel,
            ),
            bias: workload.has_bias.then_some(channel),
            scale: scale_offset(workload.scale_mode, channel),
            output,
            second_output: workload.dual_output.then_some(output),
        };
        let window = ComputeWindow {
            batch: slices.batch.len,
            cin: plan.cin_for(g),
            cout: cout_len,
            out_span: sw.out_span,
            in_start: sw.in_signed,
        };
        calls.push(GroupCall {
            group: g,
            addresses,
            window,
        });
    }
    (calls, skipped)
}
