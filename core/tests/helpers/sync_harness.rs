//! A core over an in-memory database and blob store

use agrisync_core::{
	config::AppConfig,
	domain::{Principal, PullPage, PulledEvent, Role, TenantKey},
	infra::{
		db::Database,
		event_log::EventLog,
		sequencer::{DbSequencer, Sequencer, SequencerError},
	},
	service::{MediaPreparer, SyncService},
	testing::MemoryBlobStore,
	Core,
};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::{
	atomic::{AtomicUsize, Ordering},
	Arc,
};
use tempfile::TempDir;

pub struct SyncHarness {
	pub core: Core,
	pub store: Arc<MemoryBlobStore>,
	_data_dir: TempDir,
}

impl SyncHarness {
	pub async fn new() -> Self {
		Self::build(|_| {}, MemoryBlobStore::default()).await
	}

	pub async fn with_config(configure: impl FnOnce(&mut AppConfig)) -> Self {
		Self::build(configure, MemoryBlobStore::default()).await
	}

	pub async fn with_store(store: MemoryBlobStore) -> Self {
		Self::build(|_| {}, store).await
	}

	async fn build(configure: impl FnOnce(&mut AppConfig), store: MemoryBlobStore) -> Self {
		let data_dir = TempDir::new().unwrap();
		let mut config = AppConfig::default_with_dir(data_dir.path().to_path_buf());
		configure(&mut config);

		let db = Database::in_memory().await.unwrap();
		let store = Arc::new(store);
		let core = Core::with_parts(config, db, store.clone());

		Self {
			core,
			store,
			_data_dir: data_dir,
		}
	}

	/// A sync service over the same database but with its own sequencer
	pub fn sync_with_sequencer(&self, sequencer: Arc<dyn Sequencer>) -> SyncService {
		let conn = self.core.db().conn().clone();
		SyncService::new(
			sequencer,
			EventLog::new(conn.clone()),
			MediaPreparer::new(conn, self.store.clone(), "media"),
			self.core.config().sync.clone(),
		)
	}

	/// Every event of `tenant`, in one unbounded read
	pub async fn all_events(&self, tenant: &TenantKey) -> Vec<PulledEvent> {
		EventLog::new(self.core.db().conn().clone())
			.after(tenant, None, 10_000)
			.await
			.unwrap()
			.into_iter()
			.map(PulledEvent::from)
			.collect()
	}

	/// Pull until an empty page comes back
	pub async fn pull_all(&self, tenant: &TenantKey) -> (Vec<PulledEvent>, Vec<PullPage>) {
		let sync = self.core.sync();
		let mut since = None;
		let mut events = Vec::new();
		let mut pages = Vec::new();

		loop {
			let page = sync.pull(tenant, since).await.unwrap();
			if page.events.is_empty() {
				pages.push(page);
				return (events, pages);
			}
			since = Some(page.server_seq);
			events.extend(page.events.iter().cloned());
			pages.push(page);
		}
	}
}

/// Sequencer that stops answering after a fixed number of values
pub struct FailingSequencer {
	inner: DbSequencer,
	remaining: AtomicUsize,
}

impl FailingSequencer {
	pub fn after(harness: &SyncHarness, calls: usize) -> Arc<Self> {
		Arc::new(Self {
			inner: DbSequencer::new(harness.core.db().conn().clone()),
			remaining: AtomicUsize::new(calls),
		})
	}
}

#[async_trait]
impl Sequencer for FailingSequencer {
	async fn next(&self, name: &str) -> Result<u64, SequencerError> {
		let allowed = self
			.remaining
			.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
			.is_ok();

		if !allowed {
			return Err(SequencerError::Unavailable("counter store offline".into()));
		}
		self.inner.next(name).await
	}
}

pub fn farmer(identifier: &str) -> Principal {
	Principal::owner(Role::Farmer, identifier)
}

/// Wire-shaped event as a device would send it
pub fn event(client_id: &str, occurred_at: &str) -> Value {
	json!({
		"clientId": client_id,
		"type": "harvest.recorded",
		"occurredAt": occurred_at,
		"payload": { "plot": "P-4", "kg": 120 }
	})
}

pub fn event_with_media(client_id: &str, media_client_id: &str) -> Value {
	let mut value = event(client_id, "2025-03-01T09:00:00Z");
	value["media"] = json!([{
		"clientId": media_client_id,
		"checksum": "sha256:9f86d0",
		"size": 52_311,
		"type": "photo",
		"mimeType": "image/jpeg"
	}]);
	value
}
