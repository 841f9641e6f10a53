//! Sync protocol handler
//!
//! Stateless request handling for field devices:
//! - push: sequence, store and acknowledge a batch of offline events
//! - pull: page through a tenant's events after a known sequence number
//!
//! Nothing here holds a lock across I/O. Ordering comes from the sequencer and
//! deduplication from the event log's unique index.

mod pull;
mod push;

pub use push::PushRequest;

use crate::{
	config::SyncConfig,
	infra::{
		event_log::{EventLog, EventLogError},
		sequencer::{Sequencer, SequencerError},
	},
	service::media::{MediaError, MediaPreparer},
};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
	/// The request itself is malformed; nothing was processed
	#[error("invalid request: {0}")]
	Validation(String),

	#[error("sequencer failure: {0}")]
	Sequencer(#[from] SequencerError),

	#[error("event log failure: {0}")]
	EventLog(#[from] EventLogError),

	#[error("media preparation failed: {0}")]
	Media(#[from] MediaError),
}

impl SyncError {
	/// Whether the caller sent something wrong, as opposed to us failing
	pub fn is_client_error(&self) -> bool {
		matches!(self, SyncError::Validation(_))
	}
}

pub struct SyncService {
	sequencer: Arc<dyn Sequencer>,
	log: EventLog,
	media: MediaPreparer,
	config: SyncConfig,
}

impl SyncService {
	pub fn new(
		sequencer: Arc<dyn Sequencer>,
		log: EventLog,
		media: MediaPreparer,
		config: SyncConfig,
	) -> Self {
		Self {
			sequencer,
			log,
			media,
			config,
		}
	}

	pub fn media(&self) -> &MediaPreparer {
		&self.media
	}
}
