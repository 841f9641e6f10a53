//! Global sequencer
//!
//! Sequence numbers come from a named counter row that is incremented and read
//! back in a single statement. Every event of every tenant goes through the same
//! counter, which gives one total order across the whole system. Numbers are
//! never handed out twice, but a number whose insert later fails is simply lost.

use async_trait::async_trait;
use sea_orm::{ConnectionTrait, DatabaseConnection, DbBackend, DbErr, Statement};
use thiserror::Error;
use tracing::{instrument, trace};

/// Name of the counter shared by every tenant
pub const SERVER_SEQ: &str = "serverSeq";

#[derive(Error, Debug)]
pub enum SequencerError {
	#[error("database error: {0}")]
	Database(#[from] DbErr),

	#[error("counter `{0}` returned no value")]
	NoValue(String),

	#[error("counter `{name}` holds invalid value {value}")]
	InvalidValue { name: String, value: i64 },

	#[error("sequencer unavailable: {0}")]
	Unavailable(String),
}

/// Source of strictly increasing sequence numbers
///
/// Implementations must be safe under concurrent callers from any number of
/// processes. The first value handed out for a name is 1.
#[async_trait]
pub trait Sequencer: Send + Sync {
	async fn next(&self, name: &str) -> Result<u64, SequencerError>;
}

/// Counter rows in the sync database
#[derive(Clone)]
pub struct DbSequencer {
	conn: DatabaseConnection,
}

impl DbSequencer {
	pub fn new(conn: DatabaseConnection) -> Self {
		Self { conn }
	}
}

#[async_trait]
impl Sequencer for DbSequencer {
	#[instrument(skip(self), level = "trace", err)]
	async fn next(&self, name: &str) -> Result<u64, SequencerError> {
		// Create-or-increment and read back in one statement; a separate
		// SELECT then UPDATE would hand the same value to concurrent callers.
		let row = self
			.conn
			.query_one(Statement::from_sql_and_values(
				DbBackend::Sqlite,
				r#"
				INSERT INTO counter (name, seq) VALUES (?, 1)
				ON CONFLICT (name) DO UPDATE SET seq = seq + 1
				RETURNING seq
				"#,
				vec![name.into()],
			))
			.await?
			.ok_or_else(|| SequencerError::NoValue(name.to_string()))?;

		let value: i64 = row.try_get("", "seq")?;
		let seq = u64::try_from(value).map_err(|_| SequencerError::InvalidValue {
			name: name.to_string(),
			value,
		})?;

		trace!(name, seq, "Issued sequence number");

		Ok(seq)
	}
}
