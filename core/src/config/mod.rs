//! Service configuration management

use serde::{Deserialize, Serialize};

pub mod app_config;
pub mod migration;

pub use app_config::AppConfig;
pub use migration::Migrate;

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
	/// Address to bind, e.g. `[::]:8080` (listens on IPv6 and IPv4)
	pub bind: String,
}

impl Default for ServerConfig {
	fn default() -> Self {
		Self {
			bind: "[::]:8080".to_string(),
		}
	}
}

/// Limits applied by the sync protocol handler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
	/// Events returned per pull page
	pub pull_page_size: u64,

	/// Largest push batch accepted before any sequence number is consumed
	pub max_batch_size: usize,
}

impl Default for SyncConfig {
	fn default() -> Self {
		Self {
			pull_page_size: 200,
			max_batch_size: 500,
		}
	}
}

/// S3-compatible blob store used for media uploads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
	pub bucket: String,
	pub region: String,

	/// Custom endpoint for non-AWS stores (MinIO, R2, ...)
	#[serde(default)]
	pub endpoint: Option<String>,

	/// Root path inside the bucket
	pub root: String,

	/// Directory under `root` that receives uploads
	pub container: String,

	// Credentials fall back to the AWS_* environment variables when unset
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub access_key_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub secret_access_key: Option<String>,
}

impl Default for MediaConfig {
	fn default() -> Self {
		Self {
			bucket: "agrisync-media".to_string(),
			region: "us-east-1".to_string(),
			endpoint: None,
			root: "/".to_string(),
			container: "media".to_string(),
			access_key_id: None,
			secret_access_key: None,
		}
	}
}

/// A bearer token issued by the identity provider and the principal it maps to
///
/// The service does not mint or verify credentials itself; deployments sync this
/// list from the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenGrant {
	pub token: String,
	pub owner_role: crate::domain::Role,
	pub owner_identifier: String,

	/// Defaults to `owner_role`
	#[serde(default)]
	pub actor_role: Option<crate::domain::Role>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
	#[serde(default)]
	pub tokens: Vec<TokenGrant>,
}
