//! Convolution workload descriptor and its boundary validation.
//!
//! A [`ConvWorkload`] is built host-side, validated once, and then shared
//! read-only by every compute unit. All spatial quantities are carried as
//! `[depth, height, width]` triples; 2D problems set the depth slots to their
//! neutral values so the address arithmetic needs no rank special cases.

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

use crate::layout::{TensorLayout, WeightLayout};

/// Padding on one spatial axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PadPair {
    pub before: usize,
    pub after: usize,
}

impl PadPair {
    pub const fn zero() -> Self {
        PadPair {
            before: 0,
            after: 0,
        }
    }
}

/// How the per-channel scale buffer is addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScaleMode {
    /// No scale buffer; the address field stays unset.
    None,
    /// One scalar for the whole tensor, addressed at a fixed base.
    PerTensor,
    /// One value per output channel, addressed at the channel start.
    PerChannel,
}

/// Grouped-convolution addressing strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupMode {
    Ungrouped,
    /// Exact group boundaries; one compute call per group.
    Original,
    /// Groups merged `enlarge` at a time into hardware-aligned enlarged
    /// groups, with a tail trim for the remainder.
    Optimized { enlarge: usize },
}

/// Immutable description of one convolution invocation.
///
/// Extents, kernel, stride, dilation, and padding are `[depth, height,
/// width]`; 2D workloads use depth extent 1, kernel/stride/dilation depth 1,
/// and zero depth padding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvWorkload {
    pub batch: usize,
    pub cin: usize,
    pub cout: usize,
    pub input: [usize; 3],
    pub output: [usize; 3],
    pub kernel: [usize; 3],
    pub stride: [usize; 3],
    pub dilation: [usize; 3],
    pub pad: [PadPair; 3],
    pub groups: usize,
    pub group_mode: GroupMode,
    pub fmap_layout: TensorLayout,
    pub weight_layout: WeightLayout,
    pub out_layout: TensorLayout,
    /// Hardware block granularity the output-channel axis is partitioned on
    /// (1 = no alignment requirement).
    pub cout_align: usize,
    pub has_bias: bool,
    pub scale_mode: ScaleMode,
    pub dual_output: bool,
}

impl ConvWorkload {
    pub fn cin_per_group(&self) -> usize {
        self.cin / self.groups
    }

    pub fn cout_per_group(&self) -> usize {
        self.cout / self.groups
    }

    /// Total output positions (the flattened "m" axis).
    pub fn out_positions(&self) -> usize {
        self.output[0] * self.output[1] * self.output[2]
    }

    pub fn kernel_volume(&self) -> usize {
        self.kernel[0] * self.kernel[1] * self.kernel[2]
    }

    /// Checks the host-side contract before the descriptor reaches the
    /// partitioner. Everything downstream assumes a validated workload.
    pub fn validate(&self) -> Result<()> {
        ensure!(self.batch > 0, "workload batch must be > 0");
        ensure!(
            self.cin > 0 && self.cout > 0,
            "workload channel counts must be > 0 (cin={}, cout={})",
            self.cin,
            self.cout
        );
        ensure!(self.groups > 0, "workload groups must be > 0");
        ensure!(
            self.cin.is_multiple_of(self.groups),
            "input channels {} must be divisible by groups {}",
            self.cin,
            self.groups
        );
        ensure!(
            self.cout.is_multiple_of(self.groups),
            "output channels {} must be divisible by groups {}",
            self.cout,
            self.groups
        );
        ensure!(self.cout_align > 0, "cout alignment quantum must be > 0");
        match self.group_mode {
            GroupMode::Ungrouped => {
                ensure!(
                    self.groups == 1,
                    "ungrouped workload must declare groups=1, got {}",
                    self.groups
                );
            }
            GroupMode::Original => {}
            GroupMode::Optimized { enlarge } => {
                ensure!(enlarge > 0, "group enlarge factor must be > 0");
            }
        }
        if let WeightLayout::Packed { block } = self.weight_layout {
            ensure!(block > 0, "packed weight block must be > 0");
        }

        ensure!(
            self.fmap_layout.spatial_rank() == self.out_layout.spatial_rank(),
            "feature map layout {:?} and output layout {:?} disagree on spatial rank",
            self.fmap_layout,
            self.out_layout
        );
        if self.fmap_layout.spatial_rank() == 2 {
            ensure!(
                self.input[0] == 1 && self.output[0] == 1,
                "2D workload must use depth extent 1, got input depth {} / output depth {}",
                self.input[0],
                self.output[0]
            );
            ensure!(
                self.kernel[0] == 1 && self.stride[0] == 1 && self.dilation[0] == 1,
                "2D workload must use neutral depth kernel/stride/dilation"
            );
            ensure!(
                self.pad[0] == PadPair::zero(),
                "2D workload must use zero depth padding"
            );
        }

        for axis in 0..3 {
            ensure!(
                self.input[axis] > 0 && self.output[axis] > 0,
                "spatial extents must be > 0 on axis {axis}"
            );
            ensure!(self.kernel[axis] > 0, "kernel must be > 0 on axis {axis}");
            ensure!(self.stride[axis] > 0, "stride must be > 0 on axis {axis}");
            ensure!(
                self.dilation[axis] > 0,
                "dilation must be > 0 on axis {axis}"
            );
            let expected = out_extent(
                self.input[axis],
                self.kernel[axis],
                self.stride[axis],
                self.dilation[axis],
                self.pad[axis],
            )?;
            ensure!(
                self.output[axis] == expected,
                "output extent {} on axis {axis} does not match computed extent {}",
                self.output[axis],
                expected
            );
        }
        Ok(())
    }
}

fn out_extent(
    input: usize,
    kernel: usize,
    stride: usize,
    dilation: usize,
    pad: PadPair,
) -> Result<usize> {
    let effective = (kernel - 1)
        .checked_mul(dilation)
        .and_then(|v| v.checked_add(1))
        .ok_or_else(|| anyhow::anyhow!("effective kernel window overflow"))?;
    let padded = input
        .checked_add(pad.before)
        .and_then(|v| v.checked_add(pad.after))
        .ok_or_else(|| anyhow::anyhow!("padded extent overflow"))?;
    ensure!(
        padded >= effective,
        "kernel window ({}) exceeds padded input ({})",
        effective,
        padded
    );
    Ok((padded - effective) / stride + 1)
}
