//! Media attachments
//!
//! Devices declare attachments alongside events (or on their own); we answer
//! with short-lived upload URLs. File bytes never pass through this service.

use sea_orm::entity::prelude::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(
	Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
	#[sea_orm(string_value = "photo")]
	Photo,
	#[sea_orm(string_value = "document")]
	Document,
	#[sea_orm(string_value = "receipt")]
	Receipt,
}

/// A file the client intends to upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaDeclaration {
	#[serde(default)]
	pub client_id: Option<String>,
	pub checksum: String,
	pub size: u64,
	#[serde(default, rename = "type")]
	pub kind: Option<MediaKind>,
	/// Standalone prepare requests send `mime_type`, event attachments `mimeType`
	#[serde(default, alias = "mime_type")]
	pub mime_type: Option<String>,
}

/// Write capability for one declared file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignedUpload {
	/// Server-side media identifier
	pub id: Uuid,
	pub client_id: Option<String>,
	pub upload_url: String,
	pub method: String,
	pub headers: BTreeMap<String, String>,
}
