//! Integration tests for the Process engine.
//!
//! These tests verify that a Process correctly:
//! - Validates its step list
//! - Runs steps in order and persists their outcomes
//! - Gates steps on the persisted state of their dependencies
//! - Resumes across instances sharing one state provider
//! - Emits lifecycle events in order

mod common;

use common::*;
use seq_core::engine::{DependencyError, ProcessError, ValidationError};
use seq_core::steps::{Step, StepError};
use seq_core::{InMemoryStateProvider, Process, ProviderError, StateProvider};
use seq_protocol::ipc::ProcessEvent;
use seq_protocol::process_models::ProcessingState;
use seq_protocol::record_models::{ResolvedState, StepStateRecord};
use seq_protocol::step_models::DependencyRef;
use serde_json::json;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

fn validation_error(steps: Vec<Box<dyn Step>>) -> String {
    let (_, provider) = shared_store();
    Process::new("p", steps, provider, None)
        .expect_err("step list should be rejected")
        .to_string()
}

#[test]
fn test_validation_rejects_mixed_kinds() {
    let message = validation_error(vec![succeeding(plain("s1")), succeeding(item("s1", "1"))]);
    assert_eq!(
        message,
        "Invalid argument steps, step s1 is declared as both single and array item step."
    );
}

#[test]
fn test_validation_rejects_unknown_dependency() {
    let message = validation_error(vec![
        succeeding(plain("s1")),
        succeeding(plain("s2").depends_on(["s3"])),
    ]);
    assert_eq!(message, "Invalid argument steps, step s2 depends on unknown step s3.");
}

#[test]
fn test_validation_rejects_duplicate_plain_step() {
    let message = validation_error(vec![succeeding(plain("s1")), succeeding(plain("s1"))]);
    assert_eq!(message, "Invalid argument steps, step s1 is included multiple times.");
}

#[test]
fn test_validation_rejects_duplicate_item_identifier() {
    let message = validation_error(vec![succeeding(item("as1", "1")), succeeding(item("as1", "1"))]);
    assert_eq!(
        message,
        "Invalid argument steps, step as1 contains duplicate itemIdentifier values."
    );
}

#[tokio::test]
async fn test_run_passes_dependency_state_downstream() {
    let (store, provider) = shared_store();
    let steps = vec![
        ScriptedStep::new(plain("s1"), Script::Succeed(result_state("foo"))).boxed(),
        succeeding(plain("s2").depends_on(["s1"])),
    ];
    let mut process = Process::new("p", steps, provider, None).unwrap();
    let mut rx = process.subscribe();

    process.run(false).await.unwrap();

    assert_eq!(process.processing_state(), ProcessingState::Done);
    assert_eq!(process.error(), None);

    let s1 = store.get_step_state("p", "s1", None).await.unwrap().unwrap();
    let s2 = store.get_step_state("p", "s2", None).await.unwrap().unwrap();
    assert!(s1.success);
    assert_eq!(s1.state, result_state("foo"));
    assert!(s2.success);

    let dependency = process.steps()[1].base().dependency("s1").unwrap();
    assert_eq!(dependency.as_single().unwrap().state, result_state("foo"));

    let events = drain_events(&mut rx);
    assert_run_envelope(&events);
    assert_eq!(
        event_kinds(&events),
        vec!["start", "step-start", "step-done", "step-start", "step-done", "done"]
    );
    assert_eq!(done_steps(&events), vec!["s1", "s2"]);
}

#[tokio::test]
async fn test_failing_step_marks_process_failed() {
    let (store, provider) = shared_store();
    let steps = vec![
        failing(plain("s1"), "I was born to fail."),
        succeeding(plain("s2").depends_on(["s1"])),
    ];
    let mut process = Process::new("p", steps, provider, None).unwrap();
    let mut rx = process.subscribe();

    process.run(false).await.unwrap();

    assert_eq!(process.processing_state(), ProcessingState::Failed);
    assert_eq!(process.error(), Some("I was born to fail."));

    let s1 = store.get_step_state("p", "s1", None).await.unwrap().unwrap();
    assert!(s1.error);
    assert!(!s1.success);
    assert_eq!(s1.error_message.as_deref(), Some("I was born to fail."));
    assert!(store.get_step_state("p", "s2", None).await.unwrap().is_none());

    let events = drain_events(&mut rx);
    assert_eq!(event_kinds(&events), vec!["start", "step-start", "step-error", "done"]);
    assert!(matches!(
        &events[2],
        ProcessEvent::StepError { step_name, error, .. }
            if step_name == "s1" && error == "I was born to fail."
    ));
}

#[tokio::test]
async fn test_run_throw_error_returns_failure_without_done() {
    let (_, provider) = shared_store();
    let steps = vec![failing(plain("s1"), "I was born to fail.")];
    let mut process = Process::new("p", steps, provider, None).unwrap();
    let mut rx = process.subscribe();

    let err = process.run(true).await.unwrap_err();

    assert!(matches!(&err, ProcessError::StepFailed { step, .. } if step == "s1"));
    assert_eq!(err.to_string(), "I was born to fail.");
    assert_eq!(process.processing_state(), ProcessingState::Failed);
    assert_eq!(
        event_kinds(&drain_events(&mut rx)),
        vec!["start", "step-start", "step-error"]
    );
}

#[tokio::test]
async fn test_rerun_does_not_repeat_succeeded_steps() {
    let (store, provider) = shared_store();
    let s1 = ScriptedStep::new(plain("s1"), Script::Succeed(None));
    let calls = s1.calls();
    let mut process = Process::new("p", vec![s1.boxed()], provider, None).unwrap();

    process.run(false).await.unwrap();
    let first = store.get_step_state("p", "s1", None).await.unwrap();
    assert!(first.as_ref().is_some_and(|record| record.success));

    process.run(false).await.unwrap();
    let second = store.get_step_state("p", "s1", None).await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(second, first);
    assert_eq!(process.processing_state(), ProcessingState::Done);
}

#[tokio::test]
async fn test_new_instance_resumes_from_persisted_state() {
    let (store, provider) = shared_store();

    let first = vec![
        succeeding(plain("s1")),
        failing(plain("s2").depends_on(["s1"]), "temporary outage"),
    ];
    let mut process = Process::new("p", first, provider.clone(), None).unwrap();
    process.run(false).await.unwrap();
    assert_eq!(process.processing_state(), ProcessingState::Failed);

    let s1 = ScriptedStep::new(plain("s1"), Script::Succeed(None));
    let s1_calls = s1.calls();
    let s2 = ScriptedStep::new(plain("s2").depends_on(["s1"]), Script::Succeed(result_state("ok")));
    let s2_calls = s2.calls();
    let mut resumed = Process::new("p", vec![s1.boxed(), s2.boxed()], provider, None).unwrap();

    resumed.run(false).await.unwrap();

    assert_eq!(resumed.processing_state(), ProcessingState::Done);
    assert_eq!(s1_calls.load(Ordering::SeqCst), 0);
    assert_eq!(s2_calls.load(Ordering::SeqCst), 1);
    let s2 = store.get_step_state("p", "s2", None).await.unwrap().unwrap();
    assert!(s2.success);
    assert!(!s2.error);
    assert_eq!(s2.state, result_state("ok"));
}

#[tokio::test]
async fn test_family_dependency_waits_for_every_item() {
    let (store, provider) = shared_store();
    let steps = vec![
        succeeding(item("as1", "1")),
        succeeding(item("as1", "2")),
        succeeding(plain("s2").depends_on(["as1"])),
    ];
    let mut process = Process::new("p", steps, provider, None).unwrap();

    process.run_step("as1", Some("1"), false, None).await.unwrap();
    let err = process.run_step("s2", None, true, None).await.unwrap_err();
    assert_eq!(err.to_string(), "Missing succeeded dependency state of step as1");
    assert!(matches!(
        err,
        ProcessError::Dependency(DependencyError::UnsatisfiedFamilyItem { .. })
    ));

    store
        .set_step_state("p", "as1", Some("2"), &StepStateRecord::failed("boom").with_item_identifier("2"))
        .await
        .unwrap();
    let record = process.run_step("s2", None, false, None).await.unwrap().unwrap();
    assert_eq!(
        record.error_message.as_deref(),
        Some("Missing succeeded dependency state of step as1, item identifier: 2")
    );

    process.run(false).await.unwrap();

    assert_eq!(process.processing_state(), ProcessingState::Done);
    let resolved = process.steps()[2].base().dependency("as1").unwrap();
    let ids: Vec<_> = resolved
        .as_items()
        .unwrap()
        .iter()
        .filter_map(|record| record.item_identifier.as_deref())
        .collect();
    assert_eq!(ids, vec!["1", "2"]);
}

#[tokio::test]
async fn test_single_item_dependency() {
    let (_, provider) = shared_store();
    let steps = vec![
        succeeding(item("as1", "1")),
        failing(item("as1", "2"), "item 2 is broken"),
        succeeding(plain("s2").depends_on(vec![DependencyRef::item("as1", "1")])),
        succeeding(plain("s3").depends_on(vec![DependencyRef::item("as1", "2")])),
    ];
    let mut process = Process::new("p", steps, provider, None).unwrap();

    process.run(false).await.unwrap();
    assert_eq!(process.error(), Some("item 2 is broken"));

    let s2 = process.run_step("s2", None, false, None).await.unwrap().unwrap();
    assert!(s2.success);

    let s3 = process.run_step("s3", None, false, None).await.unwrap().unwrap();
    assert!(s3.error);
    assert_eq!(
        s3.error_message.as_deref(),
        Some("Missing succeeded dependency state of step as1 with itemIdentifier: 2")
    );
}

#[tokio::test]
async fn test_run_step_with_unsatisfied_dependency() {
    let (store, provider) = shared_store();
    let s1 = ScriptedStep::new(plain("s1"), Script::Succeed(None));
    let s1_calls = s1.calls();
    let steps = vec![s1.boxed(), succeeding(plain("s2").depends_on(["s1"]))];
    let mut process = Process::new("p", steps, provider, None).unwrap();
    let mut rx = process.subscribe();

    let record = process.run_step("s2", None, false, None).await.unwrap().unwrap();

    assert!(record.error);
    assert!(!record.success);
    assert_eq!(
        record.error_message.as_deref(),
        Some("Missing succeeded dependency state of step s1.")
    );
    assert_eq!(process.processing_state(), ProcessingState::Failed);
    assert_eq!(process.error(), Some("Missing succeeded dependency state of step s1."));
    assert_eq!(s1_calls.load(Ordering::SeqCst), 0);
    assert!(store.get_step_state("p", "s1", None).await.unwrap().is_none());
    assert_eq!(store.get_step_state("p", "s2", None).await.unwrap(), Some(record));

    // The dependency fails before the step starts.
    assert_eq!(event_kinds(&drain_events(&mut rx)), vec!["step-error"]);
}

#[tokio::test]
async fn test_run_step_selects_by_name_and_item() {
    let (store, provider) = shared_store();
    let steps = vec![succeeding(item("as1", "1")), succeeding(item("as1", "2"))];
    let mut process = Process::new("p", steps, provider, None).unwrap();
    let mut rx = process.subscribe();

    assert_eq!(process.run_step("missing", None, false, None).await.unwrap(), None);
    assert_eq!(process.run_step("as1", Some("3"), false, None).await.unwrap(), None);
    assert_eq!(process.run_step("as1", None, false, None).await.unwrap(), None);

    let record = process.run_step("as1", Some("2"), false, None).await.unwrap().unwrap();
    assert!(record.success);
    assert_eq!(record.item_identifier.as_deref(), Some("2"));
    assert!(store.get_step_state("p", "as1", Some("1")).await.unwrap().is_none());
    assert_eq!(process.processing_state(), ProcessingState::Idle);

    let events = drain_events(&mut rx);
    assert_eq!(event_kinds(&events), vec!["step-start", "step-done"]);
    assert_eq!(done_steps(&events), vec!["as1[2]"]);
}

#[tokio::test]
async fn test_run_step_passes_input_and_extra_args() {
    let (_, provider) = shared_store();
    let steps = vec![ScriptedStep::new(plain("s1"), Script::Echo).boxed()];
    let input = json!({ "processed_input_id": "someId" });
    let mut process = Process::new("p", steps, provider, Some(input.clone())).unwrap();

    let extra = json!({ "force": true });
    let record = process.run_step("s1", None, false, Some(&extra)).await.unwrap().unwrap();

    let state = record.state.unwrap();
    assert_eq!(state.get("input"), Some(&input));
    assert_eq!(state.get("extra"), Some(&extra));
    assert_eq!(state.get("process"), Some(&json!("p")));
    assert_eq!(process.process_input(), Some(&input));
}

#[tokio::test]
async fn test_run_step_throw_error() {
    let (store, provider) = shared_store();
    let steps = vec![failing(plain("s1"), "I was born to fail.")];
    let mut process = Process::new("p", steps, provider, None).unwrap();

    let err = process.run_step("s1", None, true, None).await.unwrap_err();

    assert_eq!(err.to_string(), "I was born to fail.");
    let persisted = store.get_step_state("p", "s1", None).await.unwrap().unwrap();
    assert!(persisted.error);
}

#[tokio::test]
async fn test_silent_failure_persists_non_error_record() {
    let (store, provider) = shared_store();
    let steps = vec![ScriptedStep::new(plain("s1"), Script::FailSilently("lost".to_string())).boxed()];
    let mut process = Process::new("p", steps, provider, None).unwrap();

    process.run(false).await.unwrap();

    assert_eq!(process.error(), Some("lost"));
    let record = store.get_step_state("p", "s1", None).await.unwrap().unwrap();
    assert!(!record.error);
    assert!(!record.is_terminal());
}

#[tokio::test]
async fn test_disabled_step_is_kept_and_blocks_dependents() {
    let (store, provider) = shared_store();
    store
        .seed(
            "p",
            "s1",
            None,
            StepStateRecord {
                disabled: true,
                ..StepStateRecord::default()
            },
        )
        .await;
    let s1 = ScriptedStep::new(plain("s1"), Script::Succeed(None));
    let s1_calls = s1.calls();
    let steps = vec![s1.boxed(), succeeding(plain("s2").depends_on(["s1"]))];
    let mut process = Process::new("p", steps, provider, None).unwrap();

    process.run(false).await.unwrap();

    assert_eq!(s1_calls.load(Ordering::SeqCst), 0);
    assert!(store.get_step_state("p", "s1", None).await.unwrap().unwrap().disabled);
    assert_eq!(process.error(), Some("Missing succeeded dependency state of step s1."));
}

#[tokio::test]
async fn test_hydration_requires_item_identifier() {
    let (store, provider) = shared_store();
    store.seed("p", "as1", Some("1"), StepStateRecord::succeeded(None)).await;
    let steps = vec![succeeding(item("as1", "1"))];
    let mut process = Process::new("p", steps, provider, None).unwrap();

    let err = process.run_step("as1", Some("1"), true, None).await.unwrap_err();

    assert!(matches!(err, ProcessError::Step(StepError::MissingItemIdentifier)));
    assert_eq!(err.to_string(), "Bad arguments: missing required identifier");
}

#[tokio::test]
async fn test_get_step_state() {
    let (_, provider) = shared_store();
    let steps = vec![
        ScriptedStep::new(plain("s1"), Script::Succeed(result_state("foo"))).boxed(),
        succeeding(item("as1", "1")),
        succeeding(item("as1", "2")),
    ];
    let mut process = Process::new("p", steps, provider, None).unwrap();

    assert_eq!(process.get_step_state("s1").await.unwrap(), None);
    assert_eq!(process.get_step_state("unknown").await.unwrap(), None);

    process.run_step("s1", None, false, None).await.unwrap();
    process.run_step("as1", Some("2"), false, None).await.unwrap();

    match process.get_step_state("s1").await.unwrap() {
        Some(ResolvedState::Single(record)) => assert_eq!(record.state, result_state("foo")),
        other => panic!("expected a single record, got {:?}", other),
    }
    match process.get_step_state("as1").await.unwrap() {
        Some(ResolvedState::Items(records)) => {
            assert_eq!(records.len(), 1);
            assert_eq!(records[0].item_identifier.as_deref(), Some("2"));
        }
        other => panic!("expected item records, got {:?}", other),
    }
}

#[tokio::test]
async fn test_set_steps_is_locked_while_running() {
    let (_, provider) = shared_store();
    let steps = vec![ScriptedStep::new(plain("slow"), Script::Sleep(Duration::from_secs(60))).boxed()];
    let mut process = Process::new("p", steps, provider, None).unwrap();

    let interrupted = tokio::time::timeout(Duration::from_millis(20), process.run(false)).await;
    assert!(interrupted.is_err());
    assert_eq!(process.processing_state(), ProcessingState::Running);

    let err = process.set_steps(vec![succeeding(plain("s1"))]).unwrap_err();
    assert!(matches!(err, ProcessError::StepsLocked));
    assert_eq!(err.to_string(), "Cannot change steps during run phase.");
    assert_eq!(process.steps()[0].name(), "slow");
}

#[tokio::test]
async fn test_set_steps_replaces_and_validates() {
    let (_, provider) = shared_store();
    let mut process = Process::new("p", vec![succeeding(plain("s1"))], provider, None).unwrap();

    let err = process
        .set_steps(vec![succeeding(plain("s2")), succeeding(plain("s2"))])
        .unwrap_err();
    assert!(matches!(
        err,
        ProcessError::Validation(ValidationError::DuplicateStep { .. })
    ));

    process
        .set_steps(vec![succeeding(plain("s1")), succeeding(plain("s2").depends_on(["s1"]))])
        .unwrap();
    process.run(false).await.unwrap();
    assert_eq!(process.processing_state(), ProcessingState::Done);
}

#[tokio::test]
async fn test_added_listener_receives_events() {
    let (_, provider) = shared_store();
    let mut process = Process::new("p", vec![succeeding(plain("s1"))], provider, None).unwrap();
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    process.add_listener(tx);

    process.run(false).await.unwrap();

    let events = drain_events(&mut rx);
    assert_run_envelope(&events);
    assert!(events.iter().all(|event| event.process_name() == "p"));
}

#[tokio::test]
async fn test_unread_subscriber_does_not_stall_long_run() {
    let (store, provider) = shared_store();
    let steps: Vec<Box<dyn Step>> = (0..200)
        .map(|index| succeeding(plain(&format!("s{index}"))))
        .collect();
    let mut process = Process::new("p", steps, provider, None).unwrap();
    let mut rx = process.subscribe();

    tokio::time::timeout(Duration::from_secs(5), process.run(false))
        .await
        .expect("run should not wait on its subscribers")
        .unwrap();

    assert_eq!(process.processing_state(), ProcessingState::Done);
    assert_eq!(store.len().await, 200);
    let events = drain_events(&mut rx);
    assert_eq!(events.len(), 2 + 2 * 200);
    assert_run_envelope(&events);
}

#[tokio::test]
async fn test_event_stream_yields_run_events() {
    use tokio_stream::StreamExt;

    let (_, provider) = shared_store();
    let mut process = Process::new("p", vec![succeeding(plain("s1"))], provider, None).unwrap();
    let stream = process.event_stream();

    process.run(false).await.unwrap();
    drop(process);

    let kinds: Vec<&str> = stream.map(|event| event.kind()).collect().await;
    assert_eq!(kinds, vec!["start", "step-start", "step-done", "done"]);
}

#[tokio::test]
async fn test_unpersisted_failure_surfaces_with_throw() {
    let store = InMemoryStateProvider::new();
    let provider: Arc<dyn StateProvider> = Arc::new(RejectingErrorsProvider {
        store: store.clone(),
    });
    let steps = vec![succeeding(plain("s1")), failing(plain("s2"), "I was born to fail.")];

    let mut process = Process::new("p", steps, Arc::clone(&provider), None).unwrap();
    let err = process.run(true).await.unwrap_err();
    assert!(matches!(err, ProcessError::Provider(ProviderError::Backend(_))));
    assert_eq!(process.processing_state(), ProcessingState::Failed);
    assert_eq!(process.error(), Some("I was born to fail."));

    let mut quiet = Process::new("p", vec![failing(plain("s2"), "I was born to fail.")], provider, None)
        .unwrap();
    quiet.run(false).await.unwrap();
    assert_eq!(quiet.processing_state(), ProcessingState::Failed);

    let err = quiet.run_step("s2", None, true, None).await.unwrap_err();
    assert!(matches!(err, ProcessError::Provider(_)));
    assert!(store.get_step_state("p", "s2", None).await.unwrap().is_none());
}
