//! Event log, sequencer counters and daily digests

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
	async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
		manager
			.create_table(
				Table::create()
					.table(SyncEvent::Table)
					.if_not_exists()
					.col(ColumnDef::new(SyncEvent::Id).uuid().not_null().primary_key())
					.col(ColumnDef::new(SyncEvent::OwnerRole).string().not_null())
					.col(ColumnDef::new(SyncEvent::OwnerIdentifier).string().not_null())
					.col(ColumnDef::new(SyncEvent::ClientId).string().not_null())
					.col(ColumnDef::new(SyncEvent::EventType).string().not_null())
					.col(ColumnDef::new(SyncEvent::ActorRole).string().not_null())
					.col(ColumnDef::new(SyncEvent::Payload).json().not_null())
					.col(
						ColumnDef::new(SyncEvent::OccurredAt)
							.timestamp_with_time_zone()
							.not_null(),
					)
					.col(
						ColumnDef::new(SyncEvent::Seq)
							.big_integer()
							.not_null()
							.unique_key(),
					)
					.col(
						ColumnDef::new(SyncEvent::CreatedAt)
							.timestamp_with_time_zone()
							.not_null(),
					)
					.to_owned(),
			)
			.await?;

		// Idempotency key: a retried clientId must fail here, not be ignored
		manager
			.create_index(
				Index::create()
					.name("idx_sync_event_tenant_client")
					.table(SyncEvent::Table)
					.col(SyncEvent::OwnerRole)
					.col(SyncEvent::OwnerIdentifier)
					.col(SyncEvent::ClientId)
					.unique()
					.to_owned(),
			)
			.await?;

		// Pull: tenant filter, ordered by seq
		manager
			.create_index(
				Index::create()
					.name("idx_sync_event_tenant_seq")
					.table(SyncEvent::Table)
					.col(SyncEvent::OwnerRole)
					.col(SyncEvent::OwnerIdentifier)
					.col(SyncEvent::Seq)
					.to_owned(),
			)
			.await?;

		// Anchor: tenant filter over a day window
		manager
			.create_index(
				Index::create()
					.name("idx_sync_event_tenant_occurred")
					.table(SyncEvent::Table)
					.col(SyncEvent::OwnerRole)
					.col(SyncEvent::OwnerIdentifier)
					.col(SyncEvent::OccurredAt)
					.to_owned(),
			)
			.await?;

		manager
			.create_table(
				Table::create()
					.table(Counter::Table)
					.if_not_exists()
					.col(ColumnDef::new(Counter::Name).string().not_null().primary_key())
					.col(
						ColumnDef::new(Counter::Seq)
							.big_integer()
							.not_null()
							.default(0),
					)
					.to_owned(),
			)
			.await?;

		manager
			.create_table(
				Table::create()
					.table(MerkleRoot::Table)
					.if_not_exists()
					.col(
						ColumnDef::new(MerkleRoot::Id)
							.integer()
							.not_null()
							.auto_increment()
							.primary_key(),
					)
					.col(ColumnDef::new(MerkleRoot::OwnerRole).string().not_null())
					.col(ColumnDef::new(MerkleRoot::OwnerIdentifier).string().not_null())
					.col(
						ColumnDef::new(MerkleRoot::MerkleDate)
							.timestamp_with_time_zone()
							.not_null(),
					)
					.col(ColumnDef::new(MerkleRoot::RootHash).string().not_null())
					.col(ColumnDef::new(MerkleRoot::EventCount).big_integer().not_null())
					.col(
						ColumnDef::new(MerkleRoot::Anchored)
							.boolean()
							.not_null()
							.default(false),
					)
					.col(ColumnDef::new(MerkleRoot::AnchorTxid).string())
					.col(
						ColumnDef::new(MerkleRoot::CreatedAt)
							.timestamp_with_time_zone()
							.not_null(),
					)
					.col(
						ColumnDef::new(MerkleRoot::UpdatedAt)
							.timestamp_with_time_zone()
							.not_null(),
					)
					.to_owned(),
			)
			.await?;

		// One digest per tenant-day; reruns upsert against this
		manager
			.create_index(
				Index::create()
					.name("idx_merkle_root_tenant_date")
					.table(MerkleRoot::Table)
					.col(MerkleRoot::OwnerRole)
					.col(MerkleRoot::OwnerIdentifier)
					.col(MerkleRoot::MerkleDate)
					.unique()
					.to_owned(),
			)
			.await?;

		Ok(())
	}

	async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
		manager
			.drop_table(Table::drop().table(MerkleRoot::Table).to_owned())
			.await?;
		manager
			.drop_table(Table::drop().table(Counter::Table).to_owned())
			.await?;
		manager
			.drop_table(Table::drop().table(SyncEvent::Table).to_owned())
			.await
	}
}

#[derive(DeriveIden)]
enum SyncEvent {
	Table,
	Id,
	OwnerRole,
	OwnerIdentifier,
	ClientId,
	EventType,
	ActorRole,
	Payload,
	OccurredAt,
	Seq,
	CreatedAt,
}

#[derive(DeriveIden)]
enum Counter {
	Table,
	Name,
	Seq,
}

#[derive(DeriveIden)]
enum MerkleRoot {
	Table,
	Id,
	OwnerRole,
	OwnerIdentifier,
	MerkleDate,
	RootHash,
	EventCount,
	Anchored,
	AnchorTxid,
	CreatedAt,
	UpdatedAt,
}
