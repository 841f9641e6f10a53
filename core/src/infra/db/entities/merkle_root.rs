//! Daily audit digest per tenant

use crate::domain::Role;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "merkle_root")]
pub struct Model {
	#[sea_orm(primary_key)]
	pub id: i32,

	pub owner_role: Role,
	pub owner_identifier: String,

	/// Midnight UTC of the anchored day
	pub merkle_date: DateTimeUtc,

	/// Lowercase hex SHA-256
	pub root_hash: String,
	pub event_count: i64,

	// Reserved for publishing the digest to an external ledger
	pub anchored: bool,
	pub anchor_txid: Option<String>,

	pub created_at: DateTimeUtc,
	pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
