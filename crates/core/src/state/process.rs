//! Process state machine implementation.
//!
//! This module provides the lifecycle transitions of a process run
//! (Idle → Running → Done | Failed) together with the events each of them
//! emits.

use crate::state::events::EventBus;
use seq_protocol::ipc::ProcessEvent;
use seq_protocol::process_models::ProcessingState;

/// Processing state and last error of a process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunState {
    pub processing_state: ProcessingState,
    pub error: Option<String>,
}

impl RunState {
    pub fn is_running(&self) -> bool {
        self.processing_state == ProcessingState::Running
    }
}

/// Transition the run to Running and emit `start`.
///
/// # Arguments
///
/// * `run` - The run state to update
/// * `process_name` - Name carried by the event
/// * `events` - Listeners to notify
pub fn start_process(run: &mut RunState, process_name: &str, events: &mut EventBus) {
    events.emit(ProcessEvent::Start {
        process_name: process_name.to_string(),
    });
    run.processing_state = ProcessingState::Running;
}

/// Mark the run as Done, unless it already failed.
///
/// Returns whether the transition happened.
pub fn complete_process(run: &mut RunState) -> bool {
    if run.is_running() {
        run.processing_state = ProcessingState::Done;
        true
    } else {
        false
    }
}

/// Mark the run as Failed and record the error message.
///
/// # Arguments
///
/// * `run` - The run state to update
/// * `error` - Error message describing the failure
pub fn fail_process(run: &mut RunState, error: String) {
    run.processing_state = ProcessingState::Failed;
    run.error = Some(error);
}

/// Emit `done`.
pub fn finish_process(process_name: &str, events: &mut EventBus) {
    events.emit(ProcessEvent::Done {
        process_name: process_name.to_string(),
    });
}
