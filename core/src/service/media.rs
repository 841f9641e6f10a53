//! Media reference preparation
//!
//! Turns attachment declarations into upload slots: a server-side id, a storage
//! key derived from it and a presigned PUT that expires after ten minutes.

use crate::{
	domain::{MediaDeclaration, PresignedUpload, TenantKey},
	infra::{
		blob::{BlobError, BlobStore},
		db::entities::media_object,
	},
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, DatabaseConnection, DbErr};
use std::{sync::Arc, time::Duration};
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, instrument};
use uuid::Uuid;

/// How long an issued upload URL stays valid
pub const UPLOAD_URL_TTL: Duration = Duration::from_secs(10 * 60);

/// Content type bound to uploads that did not declare one
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

#[derive(Error, Debug)]
pub enum MediaError {
	#[error(transparent)]
	Blob(#[from] BlobError),

	#[error("database error: {0}")]
	Database(#[from] DbErr),

	#[error("declared size {0} is too large")]
	SizeOutOfRange(u64),
}

#[derive(Clone)]
pub struct MediaPreparer {
	conn: DatabaseConnection,
	store: Arc<dyn BlobStore>,
	container: String,
	container_ready: Arc<OnceCell<()>>,
}

impl MediaPreparer {
	pub fn new(conn: DatabaseConnection, store: Arc<dyn BlobStore>, container: &str) -> Self {
		Self {
			conn,
			store,
			container: container.trim_matches('/').to_string(),
			container_ready: Arc::new(OnceCell::new()),
		}
	}

	/// Issue one upload slot per declaration, in input order
	#[instrument(skip(self, files), fields(tenant = %tenant, files = files.len()), err)]
	pub async fn prepare(
		&self,
		tenant: &TenantKey,
		files: &[MediaDeclaration],
	) -> Result<Vec<PresignedUpload>, MediaError> {
		if files.is_empty() {
			return Ok(Vec::new());
		}

		self.ensure_container().await?;

		let mut uploads = Vec::with_capacity(files.len());
		for file in files {
			uploads.push(self.prepare_one(tenant, file).await?);
		}

		Ok(uploads)
	}

	async fn prepare_one(
		&self,
		tenant: &TenantKey,
		file: &MediaDeclaration,
	) -> Result<PresignedUpload, MediaError> {
		let size = i64::try_from(file.size).map_err(|_| MediaError::SizeOutOfRange(file.size))?;
		let id = Uuid::new_v4();
		let key = storage_key(&self.container, id);
		let mime_type = file
			.mime_type
			.as_deref()
			.filter(|m| !m.trim().is_empty())
			.unwrap_or(DEFAULT_MIME_TYPE);

		let presigned = self.store.presign_put(&key, mime_type, UPLOAD_URL_TTL).await?;

		media_object::ActiveModel {
			id: Set(id),
			owner_role: Set(tenant.role),
			owner_identifier: Set(tenant.identifier.clone()),
			client_id: Set(file.client_id.clone()),
			storage_key: Set(key.clone()),
			checksum: Set(file.checksum.clone()),
			size: Set(size),
			kind: Set(file.kind),
			mime_type: Set(mime_type.to_string()),
			created_at: Set(Utc::now()),
		}
		.insert(&self.conn)
		.await?;

		debug!(%id, key = %key, mime_type, "Issued media upload slot");

		Ok(PresignedUpload {
			id,
			client_id: file.client_id.clone(),
			upload_url: presigned.url,
			method: presigned.method,
			headers: presigned.headers,
		})
	}

	/// Checked once per process; concurrent first callers share one check
	async fn ensure_container(&self) -> Result<(), BlobError> {
		self.container_ready
			.get_or_try_init(|| self.store.ensure_container())
			.await
			.map(|_| ())
	}
}

pub fn storage_key(container: &str, id: Uuid) -> String {
	format!("{container}/{id}")
}
