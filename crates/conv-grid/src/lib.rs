pub mod address;
pub mod driver;
pub mod error;
pub mod group;
pub mod layout;
pub mod partition;
pub mod plan;
pub mod tiling_key;
pub mod workload;

pub use address::{compute_addresses, AddressSet, ComputeWindow, IterationOrder, UnitSlices};
pub use driver::{run_unit, ComputeRoutine, UnitReport};
pub use error::{RoutineError, RoutineResult};
pub use group::{group_calls, GroupCall, GroupPlan, GroupSlices, RaggedTail};
pub use layout::{TensorLayout, WeightLayout};
pub use partition::{partition_axis, partition_axis_aligned, UnitSlice};
pub use plan::{Axis, GridPlan, UnitCoords};
pub use tiling_key::{
    Fullload, GroupKind, InnerBatch, InputCopy, RingBuffer, TilingFlags, TilingKey,
};
pub use workload::{ConvWorkload, GroupMode, PadPair, ScaleMode};
