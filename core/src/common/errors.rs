//! Start-up error handling for the core
//!
//! Request-path failures have their own enums next to the code that raises
//! them (`SyncError`, `AnchorError`, ...). `CoreError` only covers building
//! the engine.

use crate::infra::blob::BlobError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
	#[error("Database error: {0}")]
	Database(#[from] sea_orm::DbErr),

	#[error("Blob store error: {0}")]
	Blob(#[from] BlobError),

	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("Configuration error: {0}")]
	Config(#[from] anyhow::Error),
}
