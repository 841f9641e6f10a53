//! agrisync core
//!
//! Offline-first event sync and daily audit anchoring for field devices.
//! Devices push batches of locally recorded events; each event gets a number
//! from one global sequence, is stored at most once per tenant and can later
//! be pulled back in order. A daily digest over a tenant's events makes later
//! tampering with that day's history detectable.

pub mod common;
pub mod config;
pub mod domain;
pub mod infra;
pub mod service;
pub mod testing;

pub use common::CoreError;
pub use config::AppConfig;

use infra::{
	blob::{BlobStore, S3BlobStore},
	db::Database,
	event_log::EventLog,
	sequencer::DbSequencer,
};
use service::{AnchorJob, MediaPreparer, SyncService};
use std::sync::Arc;
use tracing::info;

/// The main context for all core operations
pub struct Core {
	config: AppConfig,

	db: Database,

	sync: Arc<SyncService>,

	anchor: AnchorJob,
}

impl Core {
	/// Open the database and blob store described by `config`
	pub async fn new(config: AppConfig) -> Result<Self, CoreError> {
		info!("Initializing agrisync core at {:?}", config.data_dir);

		// 1. Directories for the database and logs
		config.ensure_directories()?;

		// 2. Database, migrated to the latest schema
		let db = match &config.database_url {
			Some(url) => Database::connect(url, 10).await?,
			None => Database::create(&config.database_path()).await?,
		};
		db.migrate().await?;

		// 3. Blob store; the container itself is checked lazily on first use
		let store = Arc::new(S3BlobStore::new(&config.media)?);

		Ok(Self::with_parts(config, db, store))
	}

	/// Assemble the services over an already migrated database
	pub fn with_parts(config: AppConfig, db: Database, store: Arc<dyn BlobStore>) -> Self {
		let conn = db.conn().clone();
		let log = EventLog::new(conn.clone());

		let sync = SyncService::new(
			Arc::new(DbSequencer::new(conn.clone())),
			log.clone(),
			MediaPreparer::new(conn.clone(), store, &config.media.container),
			config.sync.clone(),
		);
		let anchor = AnchorJob::new(conn, log);

		Self {
			config,
			db,
			sync: Arc::new(sync),
			anchor,
		}
	}

	pub fn config(&self) -> &AppConfig {
		&self.config
	}

	pub fn db(&self) -> &Database {
		&self.db
	}

	/// Push, pull and standalone media preparation
	pub fn sync(&self) -> Arc<SyncService> {
		self.sync.clone()
	}

	pub fn anchor(&self) -> &AnchorJob {
		&self.anchor
	}
}
