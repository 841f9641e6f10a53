//! Sync event shapes as seen by field devices

use super::{media::MediaDeclaration, tenant::Role, PresignedUpload};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// An event recorded offline on a device and pushed in a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientEvent {
	/// Client-generated idempotency key, unique per tenant
	pub client_id: String,

	#[serde(rename = "type")]
	pub event_type: String,

	/// When the event happened in the field, not when it reached us
	pub occurred_at: DateTime<Utc>,

	#[serde(default = "empty_payload")]
	pub payload: Value,

	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub media: Vec<MediaDeclaration>,
}

fn empty_payload() -> Value {
	Value::Object(Default::default())
}

impl ClientEvent {
	pub fn new(
		client_id: impl Into<String>,
		event_type: impl Into<String>,
		occurred_at: DateTime<Utc>,
		payload: Value,
	) -> Self {
		Self {
			client_id: client_id.into(),
			event_type: event_type.into(),
			occurred_at,
			payload,
			media: Vec::new(),
		}
	}

	pub fn with_media(mut self, media: Vec<MediaDeclaration>) -> Self {
		self.media = media;
		self
	}

	/// Field checks that serde cannot express
	pub fn validate(&self) -> Result<(), String> {
		if self.client_id.trim().is_empty() {
			return Err("clientId must not be empty".to_string());
		}
		if self.event_type.trim().is_empty() {
			return Err("type must not be empty".to_string());
		}
		Ok(())
	}
}

/// Per-event result of a push
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
	/// Stored for the first time
	Success,
	/// Already stored by an earlier submission; the earlier record stands
	Conflict,
	/// Not stored
	Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventResult {
	/// Absent only when the submitted event carried no usable `clientId`
	pub client_id: Option<String>,
	pub status: EventStatus,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub server_id: Option<Uuid>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
}

impl EventResult {
	pub fn success(client_id: String, server_id: Uuid) -> Self {
		Self {
			client_id: Some(client_id),
			status: EventStatus::Success,
			server_id: Some(server_id),
			error: None,
		}
	}

	pub fn conflict(client_id: String) -> Self {
		Self {
			client_id: Some(client_id),
			status: EventStatus::Conflict,
			server_id: None,
			error: None,
		}
	}

	pub fn rejected(client_id: Option<String>, error: impl Into<String>) -> Self {
		Self {
			client_id,
			status: EventStatus::Rejected,
			server_id: None,
			error: Some(error.into()),
		}
	}
}

/// Response to a push batch
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushOutcome {
	/// Highest sequence number consumed by this batch, 0 if none was
	pub server_seq: u64,
	pub results: Vec<EventResult>,
	pub media_presigned: Vec<PresignedUpload>,
}

impl PushOutcome {
	pub fn count(&self, status: EventStatus) -> usize {
		self.results.iter().filter(|r| r.status == status).count()
	}
}

/// External shape of a stored event, without server or tenant internals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PulledEvent {
	/// The client's idempotency key
	pub id: String,
	pub seq: u64,
	#[serde(rename = "type")]
	pub event_type: String,
	pub payload: Value,
	pub occurred_at: DateTime<Utc>,
	pub actor_role: Role,
}

/// One page of catch-up results
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullPage {
	/// Cursor for the next pull
	pub server_seq: u64,
	pub events: Vec<PulledEvent>,
}
