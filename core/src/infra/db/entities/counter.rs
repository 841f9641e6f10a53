//! Named counters
//!
//! Rows here are only ever touched through the atomic upsert in
//! [`crate::infra::sequencer::DbSequencer`]; the entity exists for reads.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "counter")]
pub struct Model {
	#[sea_orm(primary_key, auto_increment = false)]
	pub name: String,
	pub seq: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
