//! Issued media upload slots

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
	async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
		manager
			.create_table(
				Table::create()
					.table(MediaObject::Table)
					.if_not_exists()
					.col(ColumnDef::new(MediaObject::Id).uuid().not_null().primary_key())
					.col(ColumnDef::new(MediaObject::OwnerRole).string().not_null())
					.col(ColumnDef::new(MediaObject::OwnerIdentifier).string().not_null())
					.col(ColumnDef::new(MediaObject::ClientId).string())
					.col(
						ColumnDef::new(MediaObject::StorageKey)
							.string()
							.not_null()
							.unique_key(),
					)
					.col(ColumnDef::new(MediaObject::Checksum).string().not_null())
					.col(ColumnDef::new(MediaObject::Size).big_integer().not_null())
					.col(ColumnDef::new(MediaObject::Kind).string())
					.col(ColumnDef::new(MediaObject::MimeType).string().not_null())
					.col(
						ColumnDef::new(MediaObject::CreatedAt)
							.timestamp_with_time_zone()
							.not_null(),
					)
					.to_owned(),
			)
			.await?;

		manager
			.create_index(
				Index::create()
					.name("idx_media_object_tenant")
					.table(MediaObject::Table)
					.col(MediaObject::OwnerRole)
					.col(MediaObject::OwnerIdentifier)
					.to_owned(),
			)
			.await
	}

	async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
		manager
			.drop_table(Table::drop().table(MediaObject::Table).to_owned())
			.await
	}
}

#[derive(DeriveIden)]
enum MediaObject {
	Table,
	Id,
	OwnerRole,
	OwnerIdentifier,
	ClientId,
	StorageKey,
	Checksum,
	Size,
	Kind,
	MimeType,
	CreatedAt,
}
