//! Append-only event log
//!
//! Deduplication is left entirely to the `(owner_role, owner_identifier,
//! client_id)` unique index: an insert that trips it is reported as a
//! duplicate, never retried or merged.

use crate::domain::{ClientEvent, Role, TenantKey};

use super::db::entities::sync_event::{self, ActiveModel, Column, Entity};
use chrono::{DateTime, Utc};
use sea_orm::{
	ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
	PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, SqlErr,
};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum EventLogError {
	#[error("database error: {0}")]
	Database(#[from] DbErr),

	#[error("sequence {0} does not fit the log")]
	SequenceOutOfRange(u64),
}

/// What happened to an append
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppendOutcome {
	Stored(sync_event::Model),
	/// The tenant already has an event with this `clientId`
	Duplicate,
}

#[derive(Clone)]
pub struct EventLog {
	conn: DatabaseConnection,
}

impl EventLog {
	pub fn new(conn: DatabaseConnection) -> Self {
		Self { conn }
	}

	/// Insert one event under an already-issued sequence number
	pub async fn append(
		&self,
		tenant: &TenantKey,
		actor_role: Role,
		seq: u64,
		event: &ClientEvent,
	) -> Result<AppendOutcome, EventLogError> {
		let seq_value = i64::try_from(seq).map_err(|_| EventLogError::SequenceOutOfRange(seq))?;

		let active = ActiveModel {
			id: Set(Uuid::new_v4()),
			owner_role: Set(tenant.role),
			owner_identifier: Set(tenant.identifier.clone()),
			client_id: Set(event.client_id.clone()),
			event_type: Set(event.event_type.clone()),
			actor_role: Set(actor_role),
			payload: Set(event.payload.clone()),
			occurred_at: Set(event.occurred_at),
			seq: Set(seq_value),
			created_at: Set(Utc::now()),
		};

		match active.insert(&self.conn).await {
			Ok(model) => Ok(AppendOutcome::Stored(model)),
			Err(e) if is_client_id_violation(&e) => Ok(AppendOutcome::Duplicate),
			Err(e) => Err(e.into()),
		}
	}

	/// Events after `since` in sequence order, at most `limit` of them
	pub async fn after(
		&self,
		tenant: &TenantKey,
		since: Option<u64>,
		limit: u64,
	) -> Result<Vec<sync_event::Model>, EventLogError> {
		let mut query = Entity::find()
			.filter(Column::OwnerRole.eq(tenant.role))
			.filter(Column::OwnerIdentifier.eq(tenant.identifier.as_str()));

		if let Some(since) = since {
			// Anything past i64::MAX cannot exist, so the page is empty
			let Ok(since) = i64::try_from(since) else {
				return Ok(Vec::new());
			};
			query = query.filter(Column::Seq.gt(since));
		}

		Ok(query
			.order_by_asc(Column::Seq)
			.limit(limit)
			.all(&self.conn)
			.await?)
	}

	/// Events whose `occurred_at` falls in `[start, end]`, in sequence order
	pub async fn occurred_between(
		&self,
		tenant: &TenantKey,
		start: DateTime<Utc>,
		end: DateTime<Utc>,
	) -> Result<Vec<sync_event::Model>, EventLogError> {
		Ok(Entity::find()
			.filter(Column::OwnerRole.eq(tenant.role))
			.filter(Column::OwnerIdentifier.eq(tenant.identifier.as_str()))
			.filter(Column::OccurredAt.between(start, end))
			.order_by_asc(Column::Seq)
			.all(&self.conn)
			.await?)
	}

	pub async fn find_by_client_id(
		&self,
		tenant: &TenantKey,
		client_id: &str,
	) -> Result<Option<sync_event::Model>, EventLogError> {
		Ok(Entity::find()
			.filter(Column::OwnerRole.eq(tenant.role))
			.filter(Column::OwnerIdentifier.eq(tenant.identifier.as_str()))
			.filter(Column::ClientId.eq(client_id))
			.one(&self.conn)
			.await?)
	}

	pub async fn count(&self, tenant: &TenantKey) -> Result<u64, EventLogError> {
		Ok(Entity::find()
			.filter(Column::OwnerRole.eq(tenant.role))
			.filter(Column::OwnerIdentifier.eq(tenant.identifier.as_str()))
			.count(&self.conn)
			.await?)
	}
}

/// Only the tenant-scoped `clientId` index counts as a duplicate; any other
/// constraint failure is a real error.
fn is_client_id_violation(err: &DbErr) -> bool {
	match err.sql_err() {
		Some(SqlErr::UniqueConstraintViolation(message)) => message.contains("client_id"),
		_ => false,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::infra::db::Database;
	use chrono::TimeZone;
	use serde_json::json;

	fn event(client_id: &str, at: DateTime<Utc>) -> ClientEvent {
		ClientEvent::new(client_id, "plot.inspected", at, json!({ "plot": "P-1" }))
	}

	#[tokio::test]
	async fn duplicate_client_id_is_scoped_to_tenant() {
		let db = Database::in_memory().await.unwrap();
		let log = EventLog::new(db.conn().clone());
		let farmer = TenantKey::new(Role::Farmer, "f-1");
		let other = TenantKey::new(Role::Farmer, "f-2");
		let at = Utc::now();

		let first = log.append(&farmer, Role::Farmer, 1, &event("a", at)).await.unwrap();
		let stored = match first {
			AppendOutcome::Stored(model) => model,
			AppendOutcome::Duplicate => panic!("first insert reported as duplicate"),
		};
		assert_eq!(stored.seq, 1);

		let again = log.append(&farmer, Role::Farmer, 2, &event("a", at)).await.unwrap();
		assert_eq!(again, AppendOutcome::Duplicate);

		// Same clientId under another tenant is a different event
		let elsewhere = log.append(&other, Role::Farmer, 3, &event("a", at)).await.unwrap();
		assert!(matches!(elsewhere, AppendOutcome::Stored(_)));

		// The original record is untouched
		let kept = log.find_by_client_id(&farmer, "a").await.unwrap().unwrap();
		assert_eq!(kept.id, stored.id);
		assert_eq!(kept.seq, 1);
		assert_eq!(log.count(&farmer).await.unwrap(), 1);
	}

	#[tokio::test]
	async fn reused_sequence_is_an_error_not_a_duplicate() {
		let db = Database::in_memory().await.unwrap();
		let log = EventLog::new(db.conn().clone());
		let tenant = TenantKey::new(Role::Exporter, "x-1");
		let at = Utc::now();

		log.append(&tenant, Role::Exporter, 7, &event("a", at)).await.unwrap();
		let clash = log.append(&tenant, Role::Exporter, 7, &event("b", at)).await;

		assert!(matches!(clash, Err(EventLogError::Database(_))));
	}

	#[tokio::test]
	async fn after_filters_orders_and_limits() {
		let db = Database::in_memory().await.unwrap();
		let log = EventLog::new(db.conn().clone());
		let tenant = TenantKey::new(Role::Cooperative, "c-1");
		let stranger = TenantKey::new(Role::Cooperative, "c-2");
		let at = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();

		for (seq, id) in [(5, "e"), (2, "b"), (9, "i")] {
			log.append(&tenant, Role::FieldAgent, seq, &event(id, at)).await.unwrap();
		}
		log.append(&stranger, Role::Cooperative, 3, &event("z", at)).await.unwrap();

		let all = log.after(&tenant, None, 10).await.unwrap();
		assert_eq!(all.iter().map(|e| e.seq).collect::<Vec<_>>(), vec![2, 5, 9]);

		let tail = log.after(&tenant, Some(2), 1).await.unwrap();
		assert_eq!(tail.len(), 1);
		assert_eq!(tail[0].client_id, "e");

		assert!(log.after(&tenant, Some(9), 10).await.unwrap().is_empty());
		assert!(log.after(&tenant, Some(u64::MAX), 10).await.unwrap().is_empty());
	}
}
