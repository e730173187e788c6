//! Tensor memory layout descriptors.
//!
//! The engine addresses buffers in a small set of canonical layouts. Feature
//! map, weight, and output layouts are declared independently on the
//! workload; everything downstream is a pure function of these enums.

use serde::{Deserialize, Serialize};

/// Memory layout of an activation or output tensor.
///
/// Channel-first layouts store whole spatial planes per channel; channel-last
/// layouts interleave channels at the innermost stride. The 3D variants add a
/// depth axis one nesting level above the rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TensorLayout {
    Nchw,
    Nhwc,
    Ncdhw,
    Ndhwc,
}

impl TensorLayout {
    pub const fn is_channel_last(self) -> bool {
        matches!(self, TensorLayout::Nhwc | TensorLayout::Ndhwc)
    }

    /// Number of spatial axes the layout carries (2 or 3).
    pub const fn spatial_rank(self) -> usize {
        match self {
            TensorLayout::Nchw | TensorLayout::Nhwc => 2,
            TensorLayout::Ncdhw | TensorLayout::Ndhwc => 3,
        }
    }
}

/// Memory layout of the filter tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeightLayout {
    /// Hardware-packed blocks: each output channel occupies `block` elements,
    /// so an output channel's offset is `channel * block` regardless of the
    /// filter window.
    Packed { block: usize },
    /// Natural channel-first filter, `O x I/groups x (D x) H x W`.
    Oihw,
}
