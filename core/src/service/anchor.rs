//! Audit anchoring
//!
//! Once a day (or on demand) each tenant's events for a UTC calendar day are
//! folded into a single SHA-256 digest and stored. Recomputing the digest later
//! and comparing it with the stored one shows whether that day's history has
//! changed since it was anchored.
//!
//! The digest is a sequential fold: every leaf `"<serverId>:<seq>"` is fed, in
//! `seq` order and without separators, into one hashing context. It is not a
//! binary tree, although it is stored under the `merkle_root` name.

use crate::{
	domain::{Role, TenantKey},
	infra::{
		db::entities::merkle_root::{self, Column, Entity},
		event_log::{EventLog, EventLogError},
	},
};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use sea_orm::{
	sea_query::OnConflict, ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
	QueryFilter,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{info, instrument, warn};

#[derive(Error, Debug)]
pub enum AnchorError {
	#[error("database error: {0}")]
	Database(#[from] DbErr),

	#[error("event log failure: {0}")]
	EventLog(#[from] EventLogError),

	#[error("invalid date `{0}`, expected YYYY-MM-DD or an RFC 3339 timestamp")]
	InvalidDate(String),

	#[error("{0} is not a representable UTC day")]
	DayOutOfRange(NaiveDate),

	#[error("event count {0} is out of range")]
	EventCountOutOfRange(i128),
}

/// Inclusive bounds of one UTC calendar day, at millisecond precision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
	pub date: NaiveDate,
	pub start: DateTime<Utc>,
	pub end: DateTime<Utc>,
}

impl DayWindow {
	pub fn for_date(date: NaiveDate) -> Result<Self, AnchorError> {
		let start = date.and_time(NaiveTime::MIN).and_utc();
		let end = start
			.checked_add_signed(Duration::days(1) - Duration::milliseconds(1))
			.ok_or(AnchorError::DayOutOfRange(date))?;

		Ok(Self { date, start, end })
	}

	/// The day `instant` falls on, in UTC
	pub fn containing(instant: DateTime<Utc>) -> Result<Self, AnchorError> {
		Self::for_date(instant.date_naive())
	}

	pub fn contains(&self, instant: DateTime<Utc>) -> bool {
		self.start <= instant && instant <= self.end
	}
}

/// Accepts `2025-03-01` or any RFC 3339 timestamp; only the UTC day is kept
pub fn parse_anchor_date(input: &str) -> Result<NaiveDate, AnchorError> {
	let input = input.trim();

	if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
		return Ok(date);
	}

	DateTime::parse_from_rfc3339(input)
		.map(|instant| instant.with_timezone(&Utc).date_naive())
		.map_err(|_| AnchorError::InvalidDate(input.to_string()))
}

/// Lowercase hex SHA-256 of all leaves concatenated in order
pub fn fold_leaves<I, L>(leaves: I) -> String
where
	I: IntoIterator<Item = L>,
	L: AsRef<[u8]>,
{
	let mut hasher = Sha256::new();
	for leaf in leaves {
		hasher.update(leaf.as_ref());
	}
	hex::encode(hasher.finalize())
}

/// A tenant's digest for one day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorReport {
	pub owner_role: Role,
	pub owner_identifier: String,
	pub merkle_date: NaiveDate,
	pub root_hash: String,
	pub event_count: u64,
}

impl TryFrom<merkle_root::Model> for AnchorReport {
	type Error = AnchorError;

	fn try_from(model: merkle_root::Model) -> Result<Self, Self::Error> {
		let event_count = u64::try_from(model.event_count)
			.map_err(|_| AnchorError::EventCountOutOfRange(model.event_count.into()))?;

		Ok(Self {
			owner_role: model.owner_role,
			owner_identifier: model.owner_identifier,
			merkle_date: model.merkle_date.date_naive(),
			root_hash: model.root_hash,
			event_count,
		})
	}
}

/// Stored digest compared against a fresh computation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VerifyOutcome {
	Matches { computed: String },
	Mismatch { stored: String, computed: String },
	/// Nothing stored for that day yet
	NotAnchored { computed: String },
}

impl VerifyOutcome {
	pub fn is_match(&self) -> bool {
		matches!(self, VerifyOutcome::Matches { .. })
	}
}

#[derive(Clone)]
pub struct AnchorJob {
	conn: DatabaseConnection,
	log: EventLog,
}

impl AnchorJob {
	pub fn new(conn: DatabaseConnection, log: EventLog) -> Self {
		Self { conn, log }
	}

	/// Compute and store the digest for `date` (today when `None`)
	///
	/// Safe to re-run: the stored row for the same tenant and day is
	/// overwritten, and with no new events the digest comes out identical.
	#[instrument(skip(self), fields(tenant = %tenant), err)]
	pub async fn run(
		&self,
		tenant: &TenantKey,
		date: Option<NaiveDate>,
	) -> Result<AnchorReport, AnchorError> {
		let window = match date {
			Some(date) => DayWindow::for_date(date)?,
			None => DayWindow::containing(Utc::now())?,
		};

		let (root_hash, event_count) = self.compute(tenant, &window).await?;
		let stored_count = i64::try_from(event_count)
			.map_err(|_| AnchorError::EventCountOutOfRange(event_count.into()))?;
		let now = Utc::now();

		let row = merkle_root::ActiveModel {
			owner_role: Set(tenant.role),
			owner_identifier: Set(tenant.identifier.clone()),
			merkle_date: Set(window.start),
			root_hash: Set(root_hash.clone()),
			event_count: Set(stored_count),
			anchored: Set(false),
			anchor_txid: Set(None),
			created_at: Set(now),
			updated_at: Set(now),
			..Default::default()
		};

		Entity::insert(row)
			.on_conflict(
				OnConflict::columns([Column::OwnerRole, Column::OwnerIdentifier, Column::MerkleDate])
					.update_columns([Column::RootHash, Column::EventCount, Column::UpdatedAt])
					.to_owned(),
			)
			.exec_without_returning(&self.conn)
			.await?;

		info!(
			date = %window.date,
			event_count,
			root_hash = %root_hash,
			"Anchored daily digest"
		);

		Ok(AnchorReport {
			owner_role: tenant.role,
			owner_identifier: tenant.identifier.clone(),
			merkle_date: window.date,
			root_hash,
			event_count,
		})
	}

	/// The stored digest, if that day was ever anchored
	pub async fn get(
		&self,
		tenant: &TenantKey,
		date: NaiveDate,
	) -> Result<Option<AnchorReport>, AnchorError> {
		let window = DayWindow::for_date(date)?;

		Entity::find()
			.filter(Column::OwnerRole.eq(tenant.role))
			.filter(Column::OwnerIdentifier.eq(tenant.identifier.as_str()))
			.filter(Column::MerkleDate.eq(window.start))
			.one(&self.conn)
			.await?
			.map(AnchorReport::try_from)
			.transpose()
	}

	/// Recompute without writing and compare with what is stored
	#[instrument(skip(self), fields(tenant = %tenant), err)]
	pub async fn verify(
		&self,
		tenant: &TenantKey,
		date: NaiveDate,
	) -> Result<VerifyOutcome, AnchorError> {
		let window = DayWindow::for_date(date)?;
		let (computed, _) = self.compute(tenant, &window).await?;

		let outcome = match self.get(tenant, date).await? {
			None => VerifyOutcome::NotAnchored { computed },
			Some(stored) if stored.root_hash == computed => VerifyOutcome::Matches { computed },
			Some(stored) => {
				warn!(
					%date,
					stored = %stored.root_hash,
					computed = %computed,
					"Anchored digest no longer matches the event log"
				);
				VerifyOutcome::Mismatch {
					stored: stored.root_hash,
					computed,
				}
			}
		};

		Ok(outcome)
	}

	async fn compute(
		&self,
		tenant: &TenantKey,
		window: &DayWindow,
	) -> Result<(String, u64), AnchorError> {
		let events = self
			.log
			.occurred_between(tenant, window.start, window.end)
			.await?;

		let root_hash = fold_leaves(events.iter().map(|event| event.audit_leaf()));

		Ok((root_hash, events.len() as u64))
	}
}
