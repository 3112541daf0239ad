//! Custom assertion helpers over process events.

use seq_protocol::ipc::ProcessEvent;
use tokio::sync::mpsc::UnboundedReceiver;

/// Drain every event currently buffered in the receiver.
#[allow(dead_code)]
pub fn drain_events(rx: &mut UnboundedReceiver<ProcessEvent>) -> Vec<ProcessEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Wire names of the events, e.g. `["start", "step-start", ...]`.
#[allow(dead_code)]
pub fn event_kinds(events: &[ProcessEvent]) -> Vec<&'static str> {
    events.iter().map(ProcessEvent::kind).collect()
}

/// Assert that events form one well-ordered full run.
///
/// Checks that:
/// 1. `start` comes first and `done` last
/// 2. every `step-done` / `step-error` follows a `step-start` of the same
///    step, except dependency failures which happen before the step starts
#[allow(dead_code)]
pub fn assert_run_envelope(events: &[ProcessEvent]) {
    assert!(!events.is_empty(), "Event sequence is empty");
    assert_eq!(events[0].kind(), "start", "First event should be start, got: {:?}", events[0]);
    assert_eq!(
        events[events.len() - 1].kind(),
        "done",
        "Last event should be done, got: {:?}",
        events[events.len() - 1]
    );

    for (index, event) in events.iter().enumerate() {
        if let ProcessEvent::StepDone {
            step_name,
            item_identifier,
            ..
        } = event
        {
            let started = events[..index].iter().any(|previous| {
                matches!(
                    previous,
                    ProcessEvent::StepStart { step_name: s, item_identifier: i, .. }
                        if s == step_name && i == item_identifier
                )
            });
            assert!(started, "step-done for {} without step-start", step_name);
        }
    }
}

/// Steps (as `name` or `name[id]`) that reported `step-done`, in order.
#[allow(dead_code)]
pub fn done_steps(events: &[ProcessEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|event| match event {
            ProcessEvent::StepDone {
                step_name,
                item_identifier: Some(id),
                ..
            } => Some(format!("{}[{}]", step_name, id)),
            ProcessEvent::StepDone { step_name, .. } => Some(step_name.clone()),
            _ => None,
        })
        .collect()
}
