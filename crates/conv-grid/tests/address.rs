use conv_grid::{
    compute_addresses, AddressSet, ConvWorkload, GroupMode, IterationOrder, PadPair, ScaleMode,
    TensorLayout, UnitSlice, UnitSlices, WeightLayout,
};

fn slice(start: usize, len: usize) -> UnitSlice {
    UnitSlice {
        start,
        len,
        is_tail: false,
    }
}

fn base_2d() -> ConvWorkload {
    ConvWorkload {
        batch: 2,
        cin: 16,
        cout: 32,
        input: [1, 16, 16],
        output: [1, 16, 16],
        kernel: [1, 3, 3],
        stride: [1, 1, 1],
        dilation: [1, 1, 1],
        pad: [
            PadPair::zero(),
            PadPair {
                before: 1,
                after: 1,
            },
            PadPair {
                before: 1,
                after: 1,
            },
        ],
        groups: 1,
        group_mode: GroupMode::Ungrouped,
        fmap_layout: TensorLayout::Nchw,
        weight_layout: WeightLayout::Oihw,
        out_layout: TensorLayout::Nchw,
        cout_align: 1,
        has_bias: true,
        scale_mode: ScaleMode::PerChannel,
        dual_output: false,
    }
}

#[test]
fn flattened_position_channel_first_offsets() {
    let workload = base_2d();
    workload.validate().expect("base workload is consistent");

    // m = 20 lands at output row 1, column 4 of the 16x16 plane.
    let slices = UnitSlices {
        batch: slice(1, 1),
        cout: slice(8, 8),
        depth: slice(0, 1),
        row: slice(20, 50),
        col: slice(0, 16),
    };
    let (addresses, window) =
        compute_addresses(&workload, IterationOrder::FlattenedPosition, &slices);

    assert_eq!(
        addresses,
        AddressSet {
            feature_map: (1 * 16) * 256 + 3,
            weight: 8 * 16 * 9,
            bias: Some(8),
            scale: Some(8),
            output: (1 * 32 + 8) * 256 + 20,
            second_output: None,
        }
    );
    assert_eq!(window.batch, 1);
    assert_eq!(window.cin, 16);
    assert_eq!(window.cout, 8);
    assert_eq!(window.out_span, [1, 1, 50]);
    // Row start 1 maps onto input row 0 once the padding is subtracted.
    assert_eq!(window.in_start, [0, 0, 3]);
}

#[test]
fn row_column_channel_last_keeps_signed_starts() {
    let mut workload = base_2d();
    workload.fmap_layout = TensorLayout::Nhwc;
    workload.out_layout = TensorLayout::Nhwc;
    workload.scale_mode = ScaleMode::PerTensor;
    workload.dual_output = true;
    workload.validate().expect("channel-last workload is consistent");

    let slices = UnitSlices {
        batch: slice(0, 2),
        cout: slice(16, 16),
        depth: slice(0, 1),
        row: slice(0, 8),
        col: slice(0, 16),
    };
    let (addresses, window) = compute_addresses(&workload, IterationOrder::RowColumn, &slices);

    assert_eq!(
        addresses,
        AddressSet {
            feature_map: 0,
            weight: 16 * 16 * 9,
            bias: Some(16),
            // Per-tensor scale is addressed at its fixed base for every unit.
            scale: Some(0),
            output: 16,
            second_output: Some(16),
        }
    );
    assert_eq!(window.out_span, [1, 8, 16]);
    // The window hangs one row and one column into the padding.
    assert_eq!(window.in_start, [0, -1, -1]);
}

#[test]
fn depth_axis_adds_one_more_nesting_level() {
    let workload = ConvWorkload {
        batch: 1,
        cin: 8,
        cout: 8,
        input: [4, 8, 8],
        output: [4, 8, 8],
        kernel: [1, 3, 3],
        stride: [1, 1, 1],
        dilation: [1, 1, 1],
        pad: [
            PadPair::zero(),
            PadPair {
                before: 1,
                after: 1,
            },
            PadPair {
                before: 1,
                after: 1,
            },
        ],
        groups: 1,
        group_mode: GroupMode::Ungrouped,
        fmap_layout: TensorLayout::Ncdhw,
        weight_layout: WeightLayout::Oihw,
        out_layout: TensorLayout::Ncdhw,
        cout_align: 1,
        has_bias: false,
        scale_mode: ScaleMode::None,
        dual_output: false,
    };
    workload.validate().expect("3D workload is consistent");

    let slices = UnitSlices {
        batch: slice(0, 1),
        cout: slice(0, 8),
        depth: slice(2, 2),
        row: slice(0, 8),
        col: slice(0, 8),
    };
    let (addresses, window) = compute_addresses(&workload, IterationOrder::RowColumn, &slices);

    // Depth start 2 contributes two whole 8x8 planes on both sides.
    assert_eq!(addresses.feature_map, 2 * 64);
    assert_eq!(addresses.output, 2 * 64);
    assert_eq!(addresses.bias, None);
    assert_eq!(addresses.scale, None);
    assert_eq!(window.out_span, [2, 8, 8]);
    assert_eq!(window.in_start, [2, -1, -1]);
}

#[test]
fn flattened_position_decomposes_across_depth() {
    let mut workload = base_2d();
    workload.fmap_layout = TensorLayout::Ncdhw;
    workload.out_layout = TensorLayout::Ncdhw;
    workload.input = [4, 8, 8];
    workload.output = [4, 8, 8];
    workload.validate().expect("3D workload is consistent");

    // m = 100 in a 4x8x8 output is depth 1, row 4, column 4.
    let slices = UnitSlices {
        batch: slice(0, 1),
        cout: slice(0, 4),
        depth: slice(0, 4),
        row: slice(100, 28),
        col: slice(0, 8),
    };
    let (addresses, window) =
        compute_addresses(&workload, IterationOrder::FlattenedPosition, &slices);

    // Input start: depth 1*1-0, row 4*1-1, col 4*1-1.
    assert_eq!(window.in_start, [1, 3, 3]);
    assert_eq!(addresses.feature_map, (1 * 8 + 3) * 8 + 3);
    assert_eq!(addresses.output, 100);
}

#[test]
fn packed_weights_scale_purely_with_the_channel_start() {
    let mut workload = base_2d();
    workload.weight_layout = WeightLayout::Packed { block: 144 };

    let slices = UnitSlices {
        batch: slice(0, 1),
        cout: slice(8, 8),
        depth: slice(0, 1),
        row: slice(0, 256),
        col: slice(0, 16),
    };
    let (addresses, _) = compute_addresses(&workload, IterationOrder::FlattenedPosition, &slices);
    assert_eq!(addresses.weight, 8 * 144);
}

#[test]
fn absent_buffers_stay_unbound() {
    let mut workload = base_2d();
    workload.has_bias = false;
    workload.scale_mode = ScaleMode::None;

    let slices = UnitSlices {
        batch: slice(0, 1),
        cout: slice(0, 32),
        depth: slice(0, 1),
        row: slice(0, 256),
        col: slice(0, 16),
    };
    let (addresses, _) = compute_addresses(&workload, IterationOrder::FlattenedPosition, &slices);
    assert_eq!(addresses.bias, None);
    assert_eq!(addresses.scale, None);
    assert_eq!(addresses.second_output, None);
}
