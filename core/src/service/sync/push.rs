//! Batch ingest

use super::{SyncError, SyncService};
use crate::{
	domain::{ClientEvent, EventResult, EventStatus, MediaDeclaration, Principal, PushOutcome},
	infra::{event_log::AppendOutcome, sequencer::SERVER_SEQ},
};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

/// A push body whose shape has been checked
///
/// Events stay raw JSON until each one has its sequence number, so a single
/// malformed event is rejected on its own instead of failing the batch.
#[derive(Debug, Clone, Default)]
pub struct PushRequest {
	events: Vec<Value>,
}

impl PushRequest {
	/// Accepts `{"events": [...]}` and nothing else
	pub fn from_value(body: Value) -> Result<Self, SyncError> {
		let Value::Object(mut body) = body else {
			return Err(SyncError::Validation("body must be a JSON object".into()));
		};

		match body.remove("events") {
			Some(Value::Array(events)) => Ok(Self { events }),
			Some(_) => Err(SyncError::Validation("`events` must be an array".into())),
			None => Err(SyncError::Validation("`events` is required".into())),
		}
	}

	pub fn from_events(
		events: impl IntoIterator<Item = ClientEvent>,
	) -> Result<Self, serde_json::Error> {
		Ok(Self {
			events: events
				.into_iter()
				.map(serde_json::to_value)
				.collect::<Result<_, _>>()?,
		})
	}

	pub fn from_raw(events: Vec<Value>) -> Self {
		Self { events }
	}

	pub fn len(&self) -> usize {
		self.events.len()
	}

	pub fn is_empty(&self) -> bool {
		self.events.is_empty()
	}
}

impl SyncService {
	/// Sequence, store and acknowledge a batch
	///
	/// Per-event problems end up in `results`. Anything returned as `Err` after
	/// the first event leaves the events stored before it in place.
	#[instrument(
		skip(self, principal, request),
		fields(tenant = %principal.tenant, events = request.len()),
		err
	)]
	pub async fn push(
		&self,
		principal: &Principal,
		request: PushRequest,
	) -> Result<PushOutcome, SyncError> {
		if request.len() > self.config.max_batch_size {
			return Err(SyncError::Validation(format!(
				"batch of {} events exceeds the limit of {}",
				request.len(),
				self.config.max_batch_size
			)));
		}

		let mut outcome = PushOutcome {
			results: Vec::with_capacity(request.len()),
			..Default::default()
		};

		for raw in request.events {
			let seq = self.sequencer.next(SERVER_SEQ).await?;
			outcome.server_seq = outcome.server_seq.max(seq);

			let (result, media) = self.ingest(principal, seq, raw).await;
			outcome.results.push(result);

			if !media.is_empty() {
				let uploads = self.media.prepare(&principal.tenant, &media).await?;
				outcome.media_presigned.extend(uploads);
			}
		}

		info!(
			success = outcome.count(EventStatus::Success),
			conflict = outcome.count(EventStatus::Conflict),
			rejected = outcome.count(EventStatus::Rejected),
			media = outcome.media_presigned.len(),
			server_seq = outcome.server_seq,
			"Processed push batch"
		);

		Ok(outcome)
	}

	/// Store one event under `seq`, returning its result and whatever media it
	/// declared
	async fn ingest(
		&self,
		principal: &Principal,
		seq: u64,
		raw: Value,
	) -> (EventResult, Vec<MediaDeclaration>) {
		let event = match serde_json::from_value::<ClientEvent>(raw.clone()) {
			Ok(event) => event,
			Err(e) => {
				let client_id = raw_client_id(&raw);
				warn!(client_id = ?client_id, seq, error = %e, "Rejected malformed event");
				return (
					EventResult::rejected(client_id, format!("malformed event: {e}")),
					raw_media(&raw),
				);
			}
		};

		if let Err(reason) = event.validate() {
			warn!(client_id = %event.client_id, seq, %reason, "Rejected invalid event");
			let client_id = Some(event.client_id).filter(|id| !id.trim().is_empty());
			return (EventResult::rejected(client_id, reason), event.media);
		}

		let result = match self
			.log
			.append(&principal.tenant, principal.actor_role, seq, &event)
			.await
		{
			Ok(AppendOutcome::Stored(model)) => EventResult::success(event.client_id, model.id),
			Ok(AppendOutcome::Duplicate) => {
				debug!(client_id = %event.client_id, seq, "Event already stored");
				EventResult::conflict(event.client_id)
			}
			Err(e) => {
				warn!(client_id = %event.client_id, seq, error = %e, "Failed to store event");
				EventResult::rejected(Some(event.client_id), e.to_string())
			}
		};

		(result, event.media)
	}
}

fn raw_client_id(raw: &Value) -> Option<String> {
	raw.get("clientId")
		.and_then(Value::as_str)
		.filter(|id| !id.trim().is_empty())
		.map(str::to_string)
}

/// Media of an event that failed to decode, if the media list itself is sound
fn raw_media(raw: &Value) -> Vec<MediaDeclaration> {
	raw.get("media")
		.cloned()
		.and_then(|media| serde_json::from_value(media).ok())
		.unwrap_or_default()
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn events_must_be_an_array() {
		assert!(PushRequest::from_value(json!({ "events": [] })).is_ok());

		for body in [
			json!({ "events": {} }),
			json!({ "events": "a" }),
			json!({}),
			json!([]),
		] {
			let err = PushRequest::from_value(body).unwrap_err();
			assert!(err.is_client_error());
		}
	}

	#[test]
	fn typed_events_are_all_kept() {
		let occurred_at = "2025-03-01T08:00:00Z".parse().unwrap();
		let request = PushRequest::from_events([
			ClientEvent::new("a", "harvest.recorded", occurred_at, json!({ "kg": 1 })),
			ClientEvent::new("b", "harvest.recorded", occurred_at, json!(null)),
		])
		.unwrap();

		assert_eq!(request.len(), 2);
		assert_eq!(request.events[0]["clientId"], "a");
		assert_eq!(request.events[1]["clientId"], "b");
	}

	#[test]
	fn salvages_client_id_and_media_from_malformed_events() {
		let raw = json!({
			"clientId": "evt-9",
			"occurredAt": "not a date",
			"media": [{ "checksum": "c", "size": 3 }]
		});

		assert_eq!(raw_client_id(&raw).as_deref(), Some("evt-9"));
		assert_eq!(raw_media(&raw).len(), 1);

		assert_eq!(raw_client_id(&json!({ "clientId": 4 })), None);
		assert!(raw_media(&json!({ "media": "nope" })).is_empty());
	}
}
