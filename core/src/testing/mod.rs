//! Test doubles shared by unit tests, integration tests and the server crate

use crate::infra::blob::{BlobError, BlobStore, PresignedPut};
use async_trait::async_trait;
use std::{
	collections::BTreeMap,
	sync::{
		atomic::{AtomicUsize, Ordering},
		Mutex,
	},
	time::Duration,
};

/// Blob store that signs nothing and remembers what it was asked for
#[derive(Default)]
pub struct MemoryBlobStore {
	unavailable: bool,
	container_checks: AtomicUsize,
	presigned: Mutex<Vec<(String, String, Duration)>>,
}

impl MemoryBlobStore {
	/// A store whose every call fails, as if the endpoint were down
	pub fn unavailable() -> Self {
		Self {
			unavailable: true,
			..Default::default()
		}
	}

	pub fn container_checks(&self) -> usize {
		self.container_checks.load(Ordering::SeqCst)
	}

	/// `(key, content_type, expires_in)` for every presign call, in order
	pub fn presigned(&self) -> Vec<(String, String, Duration)> {
		self.presigned
			.lock()
			.unwrap_or_else(|poisoned| poisoned.into_inner())
			.clone()
	}
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
	async fn ensure_container(&self) -> Result<(), BlobError> {
		self.container_checks.fetch_add(1, Ordering::SeqCst);
		if self.unavailable {
			return Err(BlobError::Unavailable("memory store is offline".to_string()));
		}
		Ok(())
	}

	async fn presign_put(
		&self,
		key: &str,
		content_type: &str,
		expires_in: Duration,
	) -> Result<PresignedPut, BlobError> {
		if self.unavailable {
			return Err(BlobError::Unavailable("memory store is offline".to_string()));
		}

		self.presigned
			.lock()
			.unwrap_or_else(|poisoned| poisoned.into_inner())
			.push((key.to_string(), content_type.to_string(), expires_in));

		Ok(PresignedPut {
			url: format!(
				"memory://uploads/{key}?expires={}",
				expires_in.as_secs()
			),
			method: "PUT".to_string(),
			headers: BTreeMap::from([("Content-Type".to_string(), content_type.to_string())]),
		})
	}
}
