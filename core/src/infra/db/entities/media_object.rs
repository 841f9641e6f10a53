//! Media object entity
//!
//! One row per issued upload URL. Whether the bytes ever arrived is the blob
//! store's business, not ours.

use crate::domain::{MediaKind, Role};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "media_object")]
pub struct Model {
	#[sea_orm(primary_key, auto_increment = false)]
	pub id: Uuid,

	pub owner_role: Role,
	pub owner_identifier: String,
	pub client_id: Option<String>,

	#[sea_orm(unique)]
	pub storage_key: String,
	pub checksum: String,
	pub size: i64,
	pub kind: Option<MediaKind>,
	pub mime_type: String,

	pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
