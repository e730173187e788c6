//! Address computation for ungrouped convolution.
//!
//! Combines per-axis [`UnitSlice`] values with a workload descriptor into
//! element offsets for every buffer one compute call binds. Everything here
//! is pure arithmetic over validated inputs; there is no failure path.

use serde::{Deserialize, Serialize};

use crate::layout::{TensorLayout, WeightLayout};
use crate::partition::UnitSlice;
use crate::workload::{ConvWorkload, ScaleMode};

/// Order in which a compute routine walks its output slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IterationOrder {
    /// Single combined output-position axis (matrix-multiply style "m").
    FlattenedPosition,
    /// Separate depth/row/column slices.
    RowColumn,
}

/// Element offsets into each buffer a compute call binds, relative to each
/// buffer's base.
///
/// `None` means the buffer does not exist for this workload and must not be
/// bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressSet {
    pub feature_map: usize,
    pub weight: usize,
    pub bias: Option<usize>,
    pub scale: Option<usize>,
    pub output: usize,
    pub second_output: Option<usize>,
}

/// Window shape handed to the compute routine alongside an [`AddressSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComputeWindow {
    pub batch: usize,
    pub cin: usize,
    pub cout: usize,
    /// Output positions covered along [depth, row, col]; flattened-position
    /// calls cover `[1, 1, m_len]` consecutive positions.
    pub out_span: [usize; 3],
    /// Signed input start per spatial axis, before zero-clamping. Negative
    /// values tell the routine how far the window hangs into the padding.
    pub in_start: [isize; 3],
}

/// Per-axis slices feeding one ungrouped address computation.
///
/// In flattened-position order the `row` slice carries the combined position
/// axis and `depth`/`col` are ignored.
#[derive(Debug, Clone, Copy)]
pub struct UnitSlices {
    pub batch: UnitSlice,
    pub cout: UnitSlice,
    pub depth: UnitSlice,
    pub row: UnitSlice,
    pub col: UnitSlice,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct SpatialWindow {
    pub out_start: [usize; 3],
    pub out_span: [usize; 3],
    pub in_signed: [isize; 3],
    pub in_clamped: [usize; 3],
}

/// Resolves the output window and the matching input window base.
///
/// The input start on each axis is `stride * out_start - pad_before`; the
/// signed value is kept for the routine's edge handling while the clamped
/// value anchors the buffer offset.
pub(crate) fn spatial_window(
    workload: &ConvWorkload,
    order: IterationOrder,
    depth: &UnitSlice,
    row: &UnitSlice,
    col: &UnitSlice,
) -> SpatialWindow {
    let (out_start, out_span) = match order {
        IterationOrder::RowColumn => (
            [depth.start, row.start, col.start],
            [depth.len, row.len, col.len],
        ),
        IterationOrder::FlattenedPosition => {
            let (oh, ow) = (workload.output[1], workload.output[2]);
            let m = row.start;
            ([m / (oh * ow), (m / ow) % oh, m % ow], [1, 1, row.len])
        }
    };

    let mut in_signed = [0isize; 3];
    let mut in_clamped = [0usize; 3];
    for axis in 0..3 {
        let start = (workload.stride[axis] * out_start[axis]) as isize
            - workload.pad[axis].before as isize;
        in_signed[axis] = start;
        in_clamped[axis] = start.max(0) as usize;
    }

    SpatialWindow {
        out_start,
        out_span,
        in_signed,
        in_clamped,
    }
}

/// Element offset of `(batch, channel, pos)` in a tensor of the given layout.
pub(crate) fn tensor_offset(
    layout: TensorLayout,
    extents: [usize; 3],
    channels: usize,
    batch: usize,
    channel: usize,
    pos: [usize; 3],
) -> usize {
    let volume = extents[0] * extents[1] * extents[2];
    let linear = (pos[0] * extents[1] + pos[1]) * extents[2] + pos[2];
    if layout.is_channel_last() {
        (batch * volume + linear) * channels + channel
    } else {
        (batch * channels + channel) * volume + linear
    }
}

/// Element offset of an output channel's filter data.
pub(crate) fn weight_offset(
    layout: WeightLayout,
    cin_span: usize,
    kernel_volume: usize,
    channel: usize,
) -> usize {
    match layout {
        WeightLayout::Packed { block } => channel * block,
        WeightLayout::Oihw => channel * cin_span * kernel_volume,
    }
}

pub(crate) fn scale_offset(mode: ScaleMode, channel: usize) -> Option<usize> {
    match mode {
        ScaleMode::None => None,
        ScaleMode::PerTensor => Some(0),
        ScaleMode::PerChannel => Some(channel),
    }
}

/// Computes the single [`AddressSet`]/[`ComputeWindow`] pair for an
/// ungrouped unit.
pub fn compute_addresses(
    workload: &ConvWorkload,
    order: IterationOrder,
    slices: &UnitSlices,
) -> (AddressSet, ComputeWindow) {
    let sw = spatial_window(workload, order, &slices.depth, &slices.row, &slices.col);

    let output = tensor_offset(
        workload.out_layout,
        workload.output,
        workload.cout,
        slices.batch.start,
        slices.cout.start,
        sw.out_start,
    );
    let addresses = AddressSet {
        feature_map: tensor_offset(
            workload.fmap_layout,
            workload.input,
            workload.cin,
            slices.batch.start,
            0,
            sw.in_clamped,
        ),
        weight: weight_offset(
            workload.weight_layout,
            workload.cin_per_group(),
            workload.kernel_volume(),
            slices.cout.start,
        ),
        bias: workload.has_bias.then_some(slices.cout.start),
        scale: scale_offset(workload.scale_mode, slices.cout.start),
        output,
        second_output: workload.dual_output.then_some(output),
    };
    let window = ComputeWindow {
        batch: slices.batch.len,
        cin: workload.cin,
        cout: slices.cout.len,
        out_span: sw.out_span,
        in_start: sw.in_signed,
    };
    (addresses, window)
}
