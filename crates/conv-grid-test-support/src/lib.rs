//! Test doubles shared by conv-grid driver tests.

use conv_grid::{AddressSet, ComputeRoutine, ComputeWindow, RoutineError, RoutineResult};

/// One recorded invocation on [`RecordingRoutine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutineCall {
    Bind(AddressSet),
    SetWindow(ComputeWindow),
    Run,
    End,
}

/// Test-only compute routine that records the driver's exact call sequence.
#[derive(Debug, Default)]
pub struct RecordingRoutine {
    calls: Vec<RoutineCall>,
    fail_next_run: bool,
}

impl RecordingRoutine {
    pub fn calls(&self) -> &[RoutineCall] {
        &self.calls
    }

    /// Offsets from every recorded `Bind`, in call order.
    pub fn bound_addresses(&self) -> Vec<AddressSet> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                RoutineCall::Bind(addresses) => Some(*addresses),
                _ => None,
            })
            .collect()
    }

    /// Windows from every recorded `SetWindow`, in call order.
    pub fn set_windows(&self) -> Vec<ComputeWindow> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                RoutineCall::SetWindow(window) => Some(*window),
                _ => None,
            })
            .collect()
    }

    /// Makes the next `run` report an execution failure.
    pub fn fail_next_run(&mut self) {
        self.fail_next_run = true;
    }
}

impl ComputeRoutine for RecordingRoutine {
    fn bind(&mut self, addresses: &AddressSet) -> RoutineResult<()> {
        self.calls.push(RoutineCall::Bind(*addresses));
        Ok(())
    }

    fn set_window(&mut self, window: &ComputeWindow) -> RoutineResult<()> {
        self.calls.push(RoutineCall::SetWindow(*window));
        Ok(())
    }

    fn run(&mut self) -> RoutineResult<()> {
        self.calls.push(RoutineCall::Run);
        if self.fail_next_run {
            self.fail_next_run = false;
            return Err(RoutineError::execution("injected failure"));
        }
        Ok(())
    }

    fn end(&mut self) -> RoutineResult<()> {
        self.calls.push(RoutineCall::End);
        Ok(())
    }
}
