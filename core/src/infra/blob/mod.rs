//! External blob store
//!
//! The sync engine only ever asks the store for write capability. Uploads go
//! straight from the device to the store with a presigned request.

use crate::config::MediaConfig;
use async_trait::async_trait;
use chrono::Utc;
use opendal::{services::S3, Operator};
use std::{collections::BTreeMap, time::Duration};
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

pub mod sigv4;

use sigv4::Credentials;

#[derive(Error, Debug)]
pub enum BlobError {
	#[error("blob store error: {0}")]
	Store(#[from] opendal::Error),

	#[error("failed to sign request: {0}")]
	Signing(String),

	#[error("no blob store credentials configured")]
	MissingCredentials,

	#[error("invalid blob store endpoint: {0}")]
	InvalidEndpoint(String),

	#[error("blob store unavailable: {0}")]
	Unavailable(String),
}

/// A signed request the client replays to upload bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresignedPut {
	pub url: String,
	pub method: String,
	/// Exactly the headers covered by the signature
	pub headers: BTreeMap<String, String>,
}

#[async_trait]
pub trait BlobStore: Send + Sync {
	/// Create the upload container if it is missing. Must be idempotent and
	/// safe to race.
	async fn ensure_container(&self) -> Result<(), BlobError>;

	/// Sign a PUT of `key` with `content_type` bound to the signature
	async fn presign_put(
		&self,
		key: &str,
		content_type: &str,
		expires_in: Duration,
	) -> Result<PresignedPut, BlobError>;
}

/// S3-compatible store
///
/// Container checks go through OpenDAL. Upload URLs are signed locally so the
/// content type is part of `X-Amz-SignedHeaders`.
pub struct S3BlobStore {
	op: Operator,
	container: String,
	address: Address,
	region: String,
	root: String,
	credentials: Option<Credentials>,
}

/// Where objects of the bucket live
#[derive(Debug, Clone, PartialEq, Eq)]
struct Address {
	scheme: String,
	host: String,
	/// Path segment before the object key, empty for virtual-hosted buckets
	prefix: String,
}

impl Address {
	/// Path-style under a custom endpoint, virtual-hosted on AWS
	fn resolve(config: &MediaConfig) -> Result<Self, BlobError> {
		let Some(endpoint) = &config.endpoint else {
			return Ok(Self {
				scheme: "https".to_string(),
				host: format!("{}.s3.{}.amazonaws.com", config.bucket, config.region),
				prefix: String::new(),
			});
		};

		let url = Url::parse(endpoint)
			.map_err(|e| BlobError::InvalidEndpoint(format!("{endpoint}: {e}")))?;
		let host = url
			.host_str()
			.ok_or_else(|| BlobError::InvalidEndpoint(format!("{endpoint}: no host")))?;

		Ok(Self {
			scheme: url.scheme().to_string(),
			host: match url.port() {
				Some(port) => format!("{host}:{port}"),
				None => host.to_string(),
			},
			prefix: format!("{}/{}", url.path().trim_end_matches('/'), config.bucket),
		})
	}
}

impl S3BlobStore {
	pub fn new(config: &MediaConfig) -> Result<Self, BlobError> {
		let address = Address::resolve(config)?;

		let mut builder = S3::default()
			.bucket(&config.bucket)
			.region(&config.region)
			.root(&config.root);

		if let Some(endpoint) = &config.endpoint {
			builder = builder.endpoint(endpoint);
		}
		if let Some(access_key_id) = &config.access_key_id {
			builder = builder.access_key_id(access_key_id);
		}
		if let Some(secret_access_key) = &config.secret_access_key {
			builder = builder.secret_access_key(secret_access_key);
		}

		let op = Operator::new(builder)?.finish();

		let credentials = match (&config.access_key_id, &config.secret_access_key) {
			(Some(access_key_id), Some(secret_access_key)) => {
				Some(Credentials::new(access_key_id, secret_access_key))
			}
			_ => Credentials::from_env(),
		};
		if credentials.is_none() {
			warn!("No blob store credentials found, media uploads cannot be signed");
		}

		info!(
			bucket = %config.bucket,
			region = %config.region,
			host = %address.host,
			"Configured S3 blob store"
		);

		Ok(Self {
			op,
			container: container_dir(&config.container),
			address,
			region: config.region.clone(),
			root: config.root.trim_matches('/').to_string(),
			credentials,
		})
	}

	/// Unescaped request path of `key`
	fn object_path(&self, key: &str) -> String {
		let mut path = self.address.prefix.clone();
		for segment in [self.root.as_str(), key.trim_start_matches('/')] {
			if !segment.is_empty() {
				path.push('/');
				path.push_str(segment);
			}
		}
		path
	}
}

/// OpenDAL only treats paths ending in `/` as directories
fn container_dir(name: &str) -> String {
	format!("{}/", name.trim_matches('/'))
}

#[async_trait]
impl BlobStore for S3BlobStore {
	async fn ensure_container(&self) -> Result<(), BlobError> {
		if self.op.exists(&self.container).await? {
			return Ok(());
		}

		// Creating a directory that already exists is a no-op, so a concurrent
		// creator winning the race is fine.
		self.op.create_dir(&self.container).await?;
		debug!(container = %self.container, "Created media container");

		Ok(())
	}

	async fn presign_put(
		&self,
		key: &str,
		content_type: &str,
		expires_in: Duration,
	) -> Result<PresignedPut, BlobError> {
		let credentials = self
			.credentials
			.as_ref()
			.ok_or(BlobError::MissingCredentials)?;

		let headers = BTreeMap::from([("Content-Type".to_string(), content_type.to_string())]);
		let path = self.object_path(key);

		let url = sigv4::presign(
			&sigv4::Presign {
				method: "PUT",
				scheme: &self.address.scheme,
				host: &self.address.host,
				path: &path,
				region: &self.region,
				headers: &headers,
				expires_in,
				now: Utc::now(),
			},
			credentials,
		)?;

		Ok(PresignedPut {
			url,
			method: "PUT".to_string(),
			headers,
		})
	}
}
