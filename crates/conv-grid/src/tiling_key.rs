//! Dispatch-key encoding for specialized compute routines.
//!
//! A compiled compute routine is specialized over a tuple of small-range
//! configuration flags. The tuple is narrowed to a canonical form, then
//! packed into one dense integer used as an opaque lookup value at workload
//! setup; nothing decodes it on the per-unit path.

use serde::{Deserialize, Serialize};

use crate::address::IterationOrder;
use crate::workload::{ConvWorkload, GroupMode, ScaleMode};

/// Whether a buffer is streamed in tiles or loaded whole into its tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Fullload {
    #[default]
    Tiled,
    Resident,
}

/// Ring-buffering depth of a streamed buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RingBuffer {
    #[default]
    Disabled,
    Double,
    Quad,
}

/// Grouping strategy as seen by the dispatch key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupKind {
    #[default]
    None,
    Original,
    Optimized,
}

impl From<GroupMode> for GroupKind {
    fn from(mode: GroupMode) -> Self {
        match mode {
            GroupMode::Ungrouped => GroupKind::None,
            GroupMode::Original => GroupKind::Original,
            GroupMode::Optimized { .. } => GroupKind::Optimized,
        }
    }
}

/// How the feature map reaches the compute tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputCopy {
    #[default]
    Whole,
    Sliced,
}

/// How many batch elements one inner compute iteration covers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InnerBatch {
    #[default]
    Single,
    Multi,
}

/// Configuration tuple a compute routine is specialized over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TilingFlags {
    pub fmap_fullload: Fullload,
    pub weight_fullload: Fullload,
    pub fmap_ring: RingBuffer,
    pub weight_ring: RingBuffer,
    pub iteration_order: IterationOrder,
    pub group_kind: GroupKind,
    pub scale_mode: ScaleMode,
    pub small_channel: bool,
    pub weight_reshape: bool,
    pub input_copy: InputCopy,
    pub inner_batch: InnerBatch,
    pub discontinuous_input: bool,
}

impl Default for TilingFlags {
    fn default() -> Self {
        TilingFlags {
            fmap_fullload: Fullload::default(),
            weight_fullload: Fullload::default(),
            fmap_ring: RingBuffer::default(),
            weight_ring: RingBuffer::default(),
            iteration_order: IterationOrder::FlattenedPosition,
            group_kind: GroupKind::default(),
            scale_mode: ScaleMode::None,
            small_channel: false,
            weight_reshape: false,
            input_copy: InputCopy::default(),
            inner_batch: InnerBatch::default(),
            discontinuous_input: false,
        }
    }
}

/// Dense dispatch key selecting one specialized compute routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TilingKey(pub u32);

const FULLLOAD_BITS: u32 = 1;
const RING_BITS: u32 = 2;
const ORDER_BITS: u32 = 1;
const GROUP_BITS: u32 = 2;
const SCALE_BITS: u32 = 2;
const BOOL_BITS: u32 = 1;

impl TilingFlags {
    /// Seeds the workload-derived flags; buffering flags stay at their
    /// defaults for the host to fill in.
    pub fn for_workload(workload: &ConvWorkload, order: IterationOrder) -> Self {
        TilingFlags {
            iteration_order: order,
            group_kind: workload.group_mode.into(),
            scale_mode: workload.scale_mode,
            ..TilingFlags::default()
        }
    }

    /// Rewrites invalid or redundant joint settings to their canonical
    /// values so equivalent tuples encode to the same key.
    ///
    /// Fixed point: narrowing a narrowed tuple changes nothing.
    pub fn narrow(mut self) -> Self {
        // Resident weights only exist for the flattened-position order.
        if self.iteration_order != IterationOrder::FlattenedPosition {
            self.weight_fullload = Fullload::Tiled;
        }
        // A fully resident buffer has no ring.
        if self.fmap_fullload == Fullload::Resident {
            self.fmap_ring = RingBuffer::Disabled;
        }
        if self.weight_fullload == Fullload::Resident {
            self.weight_ring = RingBuffer::Disabled;
        }
        // The small-channel path carries its own weight staging.
        if self.small_channel {
            self.weight_reshape = false;
        }
        // Grouped routines iterate groups, not inner batches.
        if self.group_kind != GroupKind::None {
            self.inner_batch = InnerBatch::Single;
        }
        // Discontinuous input only arises for sliced copies.
        if self.input_copy != InputCopy::Sliced {
            self.discontinuous_input = false;
        }
        self
    }

    /// Narrows and packs the tuple into its dispatch key.
    pub fn encode(self) -> TilingKey {
        let flags = self.narrow();
        let mut key = 0u32;
        key = push(key, fullload_code(flags.fmap_fullload), FULLLOAD_BITS);
        key = push(key, fullload_code(flags.weight_fullload), FULLLOAD_BITS);
        key = push(key, ring_code(flags.fmap_ring), RING_BITS);
        key = push(key, ring_code(flags.weight_ring), RING_BITS);
        key = push(key, order_code(flags.iteration_order), ORDER_BITS);
        key = push(key, group_code(flags.group_kind), GROUP_BITS);
        key = push(key, scale_code(flags.scale_mode), SCALE_BITS);
        key = push(key, flags.small_channel as u32, BOOL_BITS);
        key = push(key, flags.weight_reshape as u32, BOOL_BITS);
        key = push(key, input_copy_code(flags.input_copy), BOOL_BITS);
        key = push(key, inner_batch_code(flags.inner_batch), BOOL_BITS);
        key = push(key, flags.discontinuous_input as u32, BOOL_BITS);
        TilingKey(key)
    }
}

fn push(key: u32, value: u32, bits: u32) -> u32 {
    debug_assert!(value < (1 << bits), "flag value {value} exceeds {bits}-bit field");
    (key << bits) | value
}

fn fullload_code(value: Fullload) -> u32 {
    match value {
        Fullload::Tiled => 0,
        Fullload::Resident => 1,
    }
}

fn ring_code(value: RingBuffer) -> u32 {
    match value {
        RingBuffer::Disabled => 0,
        RingBuffer::Double => 1,
        RingBuffer::Quad => 2,
    }
}

fn order_code(value: IterationOrder) -> u32 {
    match value {
        IterationOrder::FlattenedPosition => 0,
        IterationOrder::RowColumn => 1,
    }
}

fn group_code(value: GroupKind) -> u32 {
    match value {
        GroupKind::None => 0,
        GroupKind::Original => 1,
        GroupKind::Optimized => 2,
    }
}

fn scale_code(value: ScaleMode) -> u32 {
    match value {
        ScaleMode::None => 0,
        ScaleMode::PerTensor => 1,
        ScaleMode::PerChannel => 2,
    }
}

fn input_copy_code(value: InputCopy) -> u32 {
    match value {
        InputCopy::Whole => 0,
        InputCopy::Sliced => 1,
    }
}

fn inner_batch_code(value: InnerBatch) -> u32 {
    match value {
        InnerBatch::Single => 0,
        InnerBatch::Multi => 1,
    }
}
