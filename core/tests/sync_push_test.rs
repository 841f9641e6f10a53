//! Push ingest: idempotency, ordering and partial-batch behavior

mod helpers;

use agrisync_core::{
	domain::{EventStatus, Principal, Role, TenantKey},
	service::{PushRequest, SyncError},
	testing::MemoryBlobStore,
};
use helpers::*;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::HashSet;

fn statuses(outcome: &agrisync_core::domain::PushOutcome) -> Vec<EventStatus> {
	outcome.results.iter().map(|r| r.status).collect()
}

#[tokio::test]
async fn retrying_a_batch_reports_conflicts_and_stores_once() {
	let harness = SyncHarness::new().await;
	let sync = harness.core.sync();
	let principal = farmer("f-1");

	let first = sync
		.push(
			&principal,
			PushRequest::from_raw(vec![event("a", "2025-03-01T08:00:00Z")]),
		)
		.await
		.unwrap();
	let retry = sync
		.push(
			&principal,
			PushRequest::from_raw(vec![event("a", "2025-03-01T08:00:00Z")]),
		)
		.await
		.unwrap();

	assert_eq!(statuses(&first), vec![EventStatus::Success]);
	assert!(first.results[0].server_id.is_some());
	assert_eq!(statuses(&retry), vec![EventStatus::Conflict]);
	assert_eq!(retry.results[0].client_id.as_deref(), Some("a"));
	assert_eq!(retry.results[0].server_id, None);

	// The retry still consumed a number
	assert_eq!(first.server_seq, 1);
	assert_eq!(retry.server_seq, 2);

	let stored = harness.all_events(&principal.tenant).await;
	assert_eq!(stored.len(), 1);
	assert_eq!(stored[0].seq, 1);
}

#[tokio::test]
async fn duplicate_inside_a_batch_leaves_a_sequence_gap() {
	let harness = SyncHarness::new().await;
	let principal = farmer("f-1");

	let outcome = harness
		.core
		.sync()
		.push(
			&principal,
			PushRequest::from_raw(vec![
				event("a", "2025-03-01T08:00:00Z"),
				event("a", "2025-03-01T08:05:00Z"),
				event("b", "2025-03-01T08:10:00Z"),
			]),
		)
		.await
		.unwrap();

	assert_eq!(
		statuses(&outcome),
		vec![
			EventStatus::Success,
			EventStatus::Conflict,
			EventStatus::Success
		]
	);
	assert_eq!(outcome.server_seq, 3);

	let stored = harness.all_events(&principal.tenant).await;
	let seqs = stored
		.iter()
		.map(|e| (e.id.as_str(), e.seq))
		.collect::<Vec<_>>();
	assert_eq!(seqs, vec![("a", 1), ("b", 3)]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_tenants_share_one_total_order() {
	let harness = SyncHarness::new().await;
	let tenants = (0..8).map(|i| farmer(&format!("f-{i}"))).collect::<Vec<_>>();

	let handles = tenants
		.iter()
		.cloned()
		.map(|principal| {
			let sync = harness.core.sync();
			tokio::spawn(async move {
				let mut last = 0;
				for batch in 0..5 {
					let request = PushRequest::from_raw(vec![
						event(&format!("{batch}-x"), "2025-03-01T10:00:00Z"),
						event(&format!("{batch}-y"), "2025-03-01T10:00:00Z"),
					]);
					let outcome = sync.push(&principal, request).await.unwrap();
					// Each push sees numbers above everything it saw before
					assert!(outcome.server_seq > last);
					last = outcome.server_seq;
				}
			})
		})
		.collect::<Vec<_>>();

	for handle in handles {
		handle.await.unwrap();
	}

	let mut seen = HashSet::new();
	for principal in &tenants {
		let events = harness.all_events(&principal.tenant).await;
		assert_eq!(events.len(), 10);
		assert!(events.windows(2).all(|w| w[0].seq < w[1].seq));
		for event in events {
			assert!(seen.insert(event.seq), "seq {} stored twice", event.seq);
		}
	}

	assert_eq!(seen.len(), 80);
	assert_eq!(seen.into_iter().max(), Some(80));
}

#[tokio::test]
async fn sequencer_failure_keeps_earlier_commits() {
	let harness = SyncHarness::new().await;
	let sync = harness.sync_with_sequencer(FailingSequencer::after(&harness, 2));
	let principal = farmer("f-1");

	let result = sync
		.push(
			&principal,
			PushRequest::from_raw(vec![
				event("a", "2025-03-01T08:00:00Z"),
				event("b", "2025-03-01T08:01:00Z"),
				event("c", "2025-03-01T08:02:00Z"),
				event("d", "2025-03-01T08:03:00Z"),
			]),
		)
		.await;

	let err = result.unwrap_err();
	assert!(matches!(err, SyncError::Sequencer(_)));
	assert!(!err.is_client_error());

	let stored = harness.all_events(&principal.tenant).await;
	assert_eq!(
		stored.iter().map(|e| e.id.as_str()).collect::<Vec<_>>(),
		vec!["a", "b"]
	);
}

#[tokio::test]
async fn invalid_requests_consume_no_sequence_numbers() {
	let harness = SyncHarness::with_config(|config| config.sync.max_batch_size = 2).await;
	let sync = harness.core.sync();
	let principal = farmer("f-1");

	let not_an_array = PushRequest::from_value(json!({ "events": { "clientId": "a" } }));
	assert!(matches!(not_an_array, Err(SyncError::Validation(_))));

	let too_large = sync
		.push(
			&principal,
			PushRequest::from_raw(vec![
				event("a", "2025-03-01T08:00:00Z"),
				event("b", "2025-03-01T08:00:00Z"),
				event("c", "2025-03-01T08:00:00Z"),
			]),
		)
		.await;
	assert!(matches!(too_large, Err(SyncError::Validation(_))));

	let empty = sync.push(&principal, PushRequest::default()).await.unwrap();
	assert_eq!(empty.server_seq, 0);
	assert!(empty.results.is_empty());

	let accepted = sync
		.push(
			&principal,
			PushRequest::from_raw(vec![event("a", "2025-03-01T08:00:00Z")]),
		)
		.await
		.unwrap();
	assert_eq!(accepted.server_seq, 1);
}

#[tokio::test]
async fn malformed_events_are_rejected_individually() {
	let harness = SyncHarness::new().await;
	let principal = farmer("f-1");

	let outcome = harness
		.core
		.sync()
		.push(
			&principal,
			PushRequest::from_raw(vec![
				event("a", "2025-03-01T08:00:00Z"),
				json!({ "clientId": "no-type", "occurredAt": "2025-03-01T08:00:00Z" }),
				json!({ "clientId": "", "type": "note", "occurredAt": "2025-03-01T08:00:00Z" }),
				json!("not even an object"),
				event("b", "2025-03-01T08:00:00Z"),
			]),
		)
		.await
		.unwrap();

	assert_eq!(
		statuses(&outcome),
		vec![
			EventStatus::Success,
			EventStatus::Rejected,
			EventStatus::Rejected,
			EventStatus::Rejected,
			EventStatus::Success
		]
	);
	assert_eq!(outcome.results[1].client_id.as_deref(), Some("no-type"));
	assert!(outcome.results[1].error.is_some());
	assert_eq!(outcome.results[2].client_id, None);
	assert_eq!(outcome.results[3].client_id, None);
	assert_eq!(outcome.server_seq, 5);

	let stored = harness.all_events(&principal.tenant).await;
	assert_eq!(stored.iter().map(|e| e.seq).collect::<Vec<_>>(), vec![1, 5]);
}

#[tokio::test]
async fn actor_role_comes_from_the_principal() {
	let harness = SyncHarness::new().await;
	let principal = Principal::owner(Role::Cooperative, "coop-7").acting_as(Role::FieldAgent);

	let mut spoofed = event("a", "2025-03-01T08:00:00Z");
	spoofed["actorRole"] = json!("admin");
	spoofed["ownerIdentifier"] = json!("someone-else");

	harness
		.core
		.sync()
		.push(&principal, PushRequest::from_raw(vec![spoofed]))
		.await
		.unwrap();

	let stored = harness
		.all_events(&TenantKey::new(Role::Cooperative, "coop-7"))
		.await;
	assert_eq!(stored.len(), 1);
	assert_eq!(stored[0].actor_role, Role::FieldAgent);
	assert!(harness
		.all_events(&TenantKey::new(Role::Cooperative, "someone-else"))
		.await
		.is_empty());
}

#[tokio::test]
async fn media_is_presigned_even_when_the_event_conflicts() {
	let harness = SyncHarness::new().await;
	let sync = harness.core.sync();
	let principal = farmer("f-1");

	let first = sync
		.push(
			&principal,
			PushRequest::from_raw(vec![event_with_media("a", "photo-1")]),
		)
		.await
		.unwrap();
	let retry = sync
		.push(
			&principal,
			PushRequest::from_raw(vec![event_with_media("a", "photo-1")]),
		)
		.await
		.unwrap();

	assert_eq!(statuses(&retry), vec![EventStatus::Conflict]);
	for outcome in [&first, &retry] {
		assert_eq!(outcome.media_presigned.len(), 1);
		let upload = &outcome.media_presigned[0];
		assert_eq!(upload.client_id.as_deref(), Some("photo-1"));
		assert_eq!(upload.method, "PUT");
		assert_eq!(upload.headers["Content-Type"], "image/jpeg");
	}
	assert_ne!(first.media_presigned[0].id, retry.media_presigned[0].id);
	assert_eq!(harness.store.presigned().len(), 2);
	assert_eq!(harness.store.container_checks(), 1);
}

#[tokio::test]
async fn blob_store_failure_fails_the_batch_after_storing_the_event() {
	let harness = SyncHarness::with_store(MemoryBlobStore::unavailable()).await;
	let principal = farmer("f-1");

	let result = harness
		.core
		.sync()
		.push(
			&principal,
			PushRequest::from_raw(vec![
				event_with_media("a", "photo-1"),
				event("b", "2025-03-01T08:00:00Z"),
			]),
		)
		.await;

	assert!(matches!(result, Err(SyncError::Media(_))));

	let stored = harness.all_events(&principal.tenant).await;
	assert_eq!(
		stored.iter().map(|e| e.id.as_str()).collect::<Vec<_>>(),
		vec!["a"]
	);
}
