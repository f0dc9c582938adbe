/// End-to-end control-plane scenarios: definition reads with lock
/// arbitration, compilation, and fire-and-forget schedule reconciliation
/// against a recording scheduler double.

use loomway::config::Config;
use loomway::lock::{MemoryLockStore, ResolveAction};
use loomway::schedule::mock::{RecordingScheduler, SchedulerCall};
use loomway::schedule::ScheduleSpec;
use loomway::workflow::{
    Connection, DefinitionStore, MemoryDefinitionStore, Step, WorkflowDefinition,
};
use loomway::{CompileError, ControlPlane};
use serde_json::json;
use std::sync::Arc;

struct Harness {
    plane: ControlPlane,
    definitions: Arc<MemoryDefinitionStore>,
    scheduler: Arc<RecordingScheduler>,
}

fn harness() -> Harness {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let definitions = Arc::new(MemoryDefinitionStore::new());
    let scheduler = Arc::new(RecordingScheduler::new());
    let plane = ControlPlane::new(
        definitions.clone(),
        Arc::new(MemoryLockStore::new()),
        scheduler.clone(),
        Config::default(),
    );
    Harness {
        plane,
        definitions,
        scheduler,
    }
}

fn step(id: &str, step_type: &str, params: serde_json::Value) -> Step {
    Step {
        id: id.into(),
        step_type: step_type.into(),
        name: id.to_uppercase(),
        params,
    }
}

fn conn(source: &str, target: &str) -> Connection {
    Connection {
        source: source.into(),
        target: target.into(),
        condition: None,
    }
}

fn scheduled_definition(id: &str) -> WorkflowDefinition {
    WorkflowDefinition {
        id: id.into(),
        name: "Nightly Report".into(),
        steps: vec![
            step("trigger", "interval", json!({ "interval": 30 })),
            step("fetch", "http_request", json!({})),
            step("store", "db_write", json!({})),
        ],
        connections: vec![conn("trigger", "fetch"), conn("fetch", "store")],
    }
}

fn plain_definition(id: &str) -> WorkflowDefinition {
    WorkflowDefinition {
        id: id.into(),
        name: "Nightly Report".into(),
        steps: vec![
            step("start", "manual", json!({})),
            step("fetch", "http_request", json!({})),
        ],
        connections: vec![conn("start", "fetch")],
    }
}

#[tokio::test]
async fn read_with_lock_grants_first_editor_and_blocks_second() {
    let h = harness();
    h.definitions.put(plain_definition("wf-1")).await.unwrap();

    let first = h.plane.read_with_lock("wf-1", Some("alice")).await.unwrap();
    assert!(!first.read_only);
    assert_eq!(first.holder.as_deref(), Some("alice"));

    let second = h.plane.read_with_lock("wf-1", Some("bob")).await.unwrap();
    assert!(second.read_only);
    assert_eq!(second.holder.as_deref(), Some("alice"));
    assert_eq!(second.definition.id, "wf-1");
}

#[tokio::test]
async fn unauthenticated_read_is_read_only_and_does_not_lock() {
    let h = harness();
    h.definitions.put(plain_definition("wf-1")).await.unwrap();

    let view = h.plane.read_with_lock("wf-1", None).await.unwrap();
    assert!(view.read_only);
    assert!(view.holder.is_none());

    // The lock is still free for an identified editor
    let first = h.plane.read_with_lock("wf-1", Some("alice")).await.unwrap();
    assert!(!first.read_only);
}

#[tokio::test]
async fn missing_workflow_is_an_error() {
    let h = harness();
    assert!(h.plane.read_with_lock("ghost", Some("alice")).await.is_err());
}

#[tokio::test]
async fn contention_view_carries_pending_request_details() {
    let h = harness();
    h.definitions.put(plain_definition("wf-1")).await.unwrap();

    h.plane.read_with_lock("wf-1", Some("alice")).await.unwrap();
    h.plane.request_lock("wf-1", "bob").await.unwrap();

    // The holder's heartbeat surfaces the takeover request
    let status = h.plane.heartbeat("wf-1", "alice").await.unwrap();
    let pending = status.pending_request.expect("pending request visible");
    assert_eq!(pending.requested_by, "bob");

    // Accepting hands over: bob's next read acquires
    assert!(h
        .plane
        .resolve_request("wf-1", "alice", ResolveAction::Accept)
        .await
        .unwrap());
    let view = h.plane.read_with_lock("wf-1", Some("bob")).await.unwrap();
    assert!(!view.read_only);
    assert_eq!(view.holder.as_deref(), Some("bob"));
}

#[tokio::test]
async fn release_frees_the_lock_for_the_next_reader() {
    let h = harness();
    h.definitions.put(plain_definition("wf-1")).await.unwrap();

    h.plane.read_with_lock("wf-1", Some("alice")).await.unwrap();
    assert!(h.plane.release_lock("wf-1", "alice").await.unwrap());

    let view = h.plane.read_with_lock("wf-1", Some("bob")).await.unwrap();
    assert!(!view.read_only);
    assert_eq!(view.holder.as_deref(), Some("bob"));
}

#[tokio::test]
async fn compile_drops_trigger_and_orders_activities() {
    let h = harness();
    let plan = h.plane.compile(&scheduled_definition("wf-1")).unwrap();

    let ids: Vec<&str> = plan.steps.iter().map(|s| s.activity_id.as_str()).collect();
    assert_eq!(ids, ["fetch", "store"]);
    assert!(plan.steps[0].depends_on.is_empty());
    assert_eq!(plan.steps[1].depends_on, ["fetch"]);
}

#[tokio::test]
async fn compile_surfaces_cycles() {
    let h = harness();
    let mut def = plain_definition("wf-1");
    def.connections.push(conn("fetch", "fetch"));

    assert_eq!(
        h.plane.compile(&def).unwrap_err(),
        CompileError::Cycle {
            step_id: "fetch".into()
        }
    );
}

#[tokio::test]
async fn create_reconciliation_registers_a_schedule() {
    let h = harness();
    let def = scheduled_definition("wf-1");
    h.definitions.put(def.clone()).await.unwrap();

    h.plane.reconcile_schedule(None, &def, None);
    h.plane.synchronizer().drain().await;

    let calls = h.scheduler.calls().await;
    assert_eq!(calls.len(), 1);
    match &calls[0] {
        SchedulerCall::Create {
            id,
            workflow_type,
            task_queue,
            spec,
        } => {
            assert_eq!(id, "wf-1");
            assert_eq!(workflow_type, "NightlyReportWorkflow");
            assert_eq!(task_queue, "nightly_report");
            assert_eq!(spec, &ScheduleSpec::IntervalSeconds(1800));
        }
        other => panic!("expected a create call, got {other:?}"),
    }
}

#[tokio::test]
async fn removing_the_interval_trigger_deletes_the_schedule_once() {
    let h = harness();
    let before = scheduled_definition("wf-1");
    h.plane.reconcile_schedule(None, &before, None);
    h.plane.synchronizer().drain().await;

    // The update drops the interval trigger entirely
    let after = plain_definition("wf-1");
    h.plane.reconcile_schedule(Some(&before), &after, None);
    h.plane.synchronizer().drain().await;

    let calls = h.scheduler.calls().await;
    let deletes = calls
        .iter()
        .filter(|c| matches!(c, SchedulerCall::Delete { .. }))
        .count();
    assert_eq!(deletes, 1);
    // And nothing was created or updated after the initial registration
    assert!(matches!(calls.last(), Some(SchedulerCall::Delete { id }) if id == "wf-1"));
}

#[tokio::test]
async fn scheduler_outage_never_fails_the_save_path() {
    let h = harness();
    h.scheduler.fail_everything(true);

    let def = scheduled_definition("wf-1");
    // Fire-and-forget: enqueuing never errors, the failure stays in logs
    h.plane.reconcile_schedule(None, &def, None);
    h.plane.synchronizer().drain().await;

    h.plane.reconcile_deleted("wf-1");
    h.plane.synchronizer().drain().await;
}

#[tokio::test]
async fn delete_reconciliation_is_best_effort() {
    let h = harness();
    h.plane.reconcile_deleted("wf-1");
    h.plane.synchronizer().drain().await;

    assert_eq!(
        h.scheduler.calls().await,
        vec![SchedulerCall::Delete { id: "wf-1".into() }]
    );
}
