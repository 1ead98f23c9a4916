//! Tests for the event log.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::DateTime;
use tempfile::TempDir;

use crate::clock::VirtualClock;
use crate::event::{Event, EventPayload, StreamType};
use crate::ids::IdGenerator;
use crate::workspace::{WorkspaceArchived, WorkspaceCreated};

use super::*;

fn ids() -> IdGenerator {
    IdGenerator::new(Arc::new(VirtualClock::new()))
}

fn created_event(stream_id: &str, version: u64, command_id: &str) -> Event {
    Event {
        event_id: ids().event_id(),
        stream_id: stream_id.to_string(),
        stream_type: StreamType::Workspace,
        version,
        command_id: command_id.to_string(),
        occurred_at: DateTime::UNIX_EPOCH,
        actor_id: Some("alice".to_string()),
        payload: EventPayload::WorkspaceCreated(WorkspaceCreated {
            workspace_id: stream_id.to_string(),
            name: "Health".to_string(),
            parent_workspace_id: None,
            scope: BTreeMap::new(),
            created_at: DateTime::UNIX_EPOCH,
        }),
    }
}

fn archived_event(stream_id: &str, version: u64, command_id: &str) -> Event {
    Event {
        event_id: ids().event_id(),
        stream_id: stream_id.to_string(),
        stream_type: StreamType::Workspace,
        version,
        command_id: command_id.to_string(),
        occurred_at: DateTime::UNIX_EPOCH,
        actor_id: None,
        payload: EventPayload::WorkspaceArchived(WorkspaceArchived {
            workspace_id: stream_id.to_string(),
            archived_at: DateTime::UNIX_EPOCH,
            reason: "done".to_string(),
        }),
    }
}

#[test]
fn open_creates_an_empty_store() {
    let dir = TempDir::new().expect("temp dir");
    let store = SqliteEventStore::open(dir.path().join("log.db")).expect("open");
    assert_eq!(store.count_events().unwrap(), 0);
    assert_eq!(store.stream_version("ws-1").unwrap(), 0);
}

#[test]
fn append_assigns_contiguous_versions() {
    let store = SqliteEventStore::in_memory().unwrap();

    let outcome = store
        .append("ws-1", 0, &[created_event("ws-1", 1, "cmd-1")])
        .unwrap();
    assert_eq!(outcome, AppendOutcome::Appended);

    store
        .append("ws-1", 1, &[archived_event("ws-1", 2, "cmd-2")])
        .unwrap();

    let events = store.load_stream("ws-1").unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].version, 1);
    assert_eq!(events[1].version, 2);
}

#[test]
fn version_conflict_is_detected() {
    let store = SqliteEventStore::in_memory().unwrap();
    store
        .append("ws-1", 0, &[created_event("ws-1", 1, "cmd-1")])
        .unwrap();

    let err = store
        .append("ws-1", 0, &[archived_event("ws-1", 1, "cmd-2")])
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::VersionConflict {
            expected: 0,
            actual: 1,
            ..
        }
    ));
}

#[test]
fn nothing_persists_when_the_batch_conflicts() {
    let store = SqliteEventStore::in_memory().unwrap();
    store
        .append("ws-1", 0, &[created_event("ws-1", 1, "cmd-1")])
        .unwrap();

    let batch = [
        archived_event("ws-1", 2, "cmd-2"),
        archived_event("ws-1", 3, "cmd-3"),
    ];
    // Wrong expected version: the whole batch must be rejected.
    assert!(store.append("ws-1", 5, &batch).is_err());
    assert_eq!(store.count_events().unwrap(), 1);
}

#[test]
fn duplicate_command_is_skipped_and_returns_stored_events() {
    let store = SqliteEventStore::in_memory().unwrap();
    let first = created_event("ws-1", 1, "cmd-1");
    store.append("ws-1", 0, &[first.clone()]).unwrap();

    // Retry with the same command id; stream head has not moved for
    // the caller, and the append is silently skipped.
    let outcome = store
        .append("ws-1", 1, &[created_event("ws-1", 2, "cmd-1")])
        .unwrap();
    match outcome {
        AppendOutcome::AlreadyApplied(events) => {
            assert_eq!(events.len(), 1);
            assert_eq!(events[0].command_id, "cmd-1");
            assert_eq!(events[0].version, 1);
        },
        AppendOutcome::Appended => panic!("duplicate command must not append"),
    }
    assert_eq!(store.count_events().unwrap(), 1);
}

#[test]
fn command_reuse_across_streams_is_an_error() {
    let store = SqliteEventStore::in_memory().unwrap();
    store
        .append("ws-1", 0, &[created_event("ws-1", 1, "cmd-1")])
        .unwrap();

    let err = store
        .append("ws-2", 0, &[created_event("ws-2", 1, "cmd-1")])
        .unwrap_err();
    assert!(matches!(err, StoreError::CommandAlreadyApplied { .. }));
}

#[test]
fn load_command_includes_derived_keys() {
    let store = SqliteEventStore::in_memory().unwrap();
    store
        .append(
            "ws-1",
            0,
            &[
                created_event("ws-1", 1, "cmd-1"),
                archived_event("ws-1", 2, "cmd-1:followup"),
            ],
        )
        .unwrap();
    store
        .append("ws-2", 0, &[created_event("ws-2", 1, "cmd-2")])
        .unwrap();

    let events = store.load_command("cmd-1").unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].command_id, "cmd-1");
    assert_eq!(events[1].command_id, "cmd-1:followup");
    assert!(store.load_command("cmd-9").unwrap().is_empty());
}

#[test]
fn load_all_preserves_insertion_order() {
    let store = SqliteEventStore::in_memory().unwrap();
    store
        .append("ws-1", 0, &[created_event("ws-1", 1, "cmd-1")])
        .unwrap();
    store
        .append("ws-2", 0, &[created_event("ws-2", 1, "cmd-2")])
        .unwrap();
    store
        .append("ws-1", 1, &[archived_event("ws-1", 2, "cmd-3")])
        .unwrap();

    let all = store.load_all().unwrap();
    let order: Vec<(&str, u64)> = all
        .iter()
        .map(|e| (e.stream_id.as_str(), e.version))
        .collect();
    assert_eq!(order, vec![("ws-1", 1), ("ws-2", 1), ("ws-1", 2)]);
}

#[test]
fn payloads_round_trip_canonically() {
    let store = SqliteEventStore::in_memory().unwrap();
    let event = created_event("ws-1", 1, "cmd-1");
    store.append("ws-1", 0, &[event.clone()]).unwrap();

    let loaded = &store.load_stream("ws-1").unwrap()[0];
    assert_eq!(loaded.payload, event.payload);
    assert_eq!(loaded.actor_id.as_deref(), Some("alice"));
    assert_eq!(
        loaded.canonical_payload().unwrap(),
        event.canonical_payload().unwrap()
    );
}

#[test]
fn store_survives_reopen() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("log.db");
    {
        let store = SqliteEventStore::open(&path).unwrap();
        store
            .append("ws-1", 0, &[created_event("ws-1", 1, "cmd-1")])
            .unwrap();
    }

    let store = SqliteEventStore::open(&path).unwrap();
    assert_eq!(store.count_events().unwrap(), 1);
    assert_eq!(store.stream_version("ws-1").unwrap(), 1);
    assert_eq!(store.count_streams().unwrap(), 1);
}
