use conv_grid::{
    ConvWorkload, GroupKind, GroupMode, IterationOrder, PadPair, ScaleMode, TensorLayout,
    TilingFlags, WeightLayout,
};

fn base() -> ConvWorkload {
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
        cout_align: 16,
        has_bias: true,
        scale_mode: ScaleMode::PerChannel,
        dual_output: false,
    }
}

#[test]
fn consistent_workloads_validate() {
    base().validate().expect("base workload is consistent");

    let mut strided = base();
    strided.stride = [1, 2, 2];
    strided.output = [1, 8, 8];
    strided.validate().expect("strided workload is consistent");
}

#[test]
fn zero_stride_is_rejected() {
    let mut workload = base();
    workload.stride = [1, 0, 1];
    workload
        .validate()
        .expect_err("zero stride must be rejected");
}

#[test]
fn indivisible_channels_are_rejected() {
    let mut workload = base();
    workload.groups = 3;
    workload.group_mode = GroupMode::Original;
    workload
        .validate()
        .expect_err("channels must divide by groups");
}

#[test]
fn mismatched_output_extent_is_rejected() {
    let mut workload = base();
    workload.output = [1, 16, 15];
    workload
        .validate()
        .expect_err("inconsistent output extent must be rejected");
}

#[test]
fn ungrouped_mode_requires_one_group() {
    let mut workload = base();
    workload.groups = 2;
    workload
        .validate()
        .expect_err("ungrouped workload cannot carry groups");
}

#[test]
fn two_d_layouts_require_neutral_depth() {
    let mut workload = base();
    workload.pad[0] = PadPair {
        before: 1,
        after: 0,
    };
    workload
        .validate()
        .expect_err("2D workload cannot pad the depth axis");

    let mut workload = base();
    workload.input = [2, 16, 16];
    workload.output = [2, 16, 16];
    workload
        .validate()
        .expect_err("2D layout cannot carry a depth extent");
}

#[test]
fn oversized_kernel_is_rejected() {
    let mut workload = base();
    workload.kernel = [1, 19, 3];
    workload
        .validate()
        .expect_err("kernel larger than the padded input must be rejected");
}

#[test]
fn descriptors_round_trip_through_serde() {
    let workload = base();
    let json = serde_json::to_string(&workload).expect("workload serializes");
    let back: ConvWorkload = serde_json::from_str(&json).expect("workload deserializes");
    assert_eq!(back, workload);

    let flags = TilingFlags::for_workload(&workload, IterationOrder::RowColumn);
    let json = serde_json::to_string(&flags).expect("flags serialize");
    let back: TilingFlags = serde_json::from_str(&json).expect("flags deserialize");
    assert_eq!(back, flags);
}

#[test]
fn workload_seeded_flags_reflect_the_descriptor() {
    let mut workload = base();
    workload.groups = 4;
    workload.group_mode = GroupMode::Optimized { enlarge: 2 };
    workload.scale_mode = ScaleMode::PerTensor;

    let flags = TilingFlags::for_workload(&workload, IterationOrder::RowColumn);
    assert_eq!(flags.iteration_order, IterationOrder::RowColumn);
    assert_eq!(flags.group_kind, GroupKind::Optimized);
    assert_eq!(flags.scale_mode, ScaleMode::PerTensor);
}
