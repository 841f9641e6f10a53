//! Database infrastructure using SeaORM

use sea_orm::{ConnectOptions, Database as SeaDatabase, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod entities;
pub mod migration;

/// Database wrapper for the sync engine
#[derive(Clone)]
pub struct Database {
	/// SeaORM database connection
	conn: DatabaseConnection,
}

impl Database {
	/// Create (or open) a SQLite database at the specified path
	pub async fn create(path: &Path) -> Result<Self, DbErr> {
		// Ensure parent directory exists
		if let Some(parent) = path.parent() {
			std::fs::create_dir_all(parent)
				.map_err(|e| DbErr::Custom(format!("Failed to create directory: {}", e)))?;
		}

		let db_url = format!("sqlite://{}?mode=rwc", path.display());
		let db = Self::connect(&db_url, 10).await?;

		info!("Opened database at {:?}", path);

		Ok(db)
	}

	/// Connect to an explicit database URL
	pub async fn connect(url: &str, max_connections: u32) -> Result<Self, DbErr> {
		let mut opt = ConnectOptions::new(url.to_owned());
		opt.max_connections(max_connections)
			.min_connections(1)
			.connect_timeout(Duration::from_secs(8))
			.idle_timeout(Duration::from_secs(60))
			.sqlx_logging(false); // We'll use tracing instead

		let conn = SeaDatabase::connect(opt).await?;

		Ok(Self { conn })
	}

	/// A private in-memory database, migrated and ready to use
	///
	/// Every SQLite `:memory:` connection is its own database, so the pool is
	/// pinned to a single connection.
	pub async fn in_memory() -> Result<Self, DbErr> {
		let db = Self::connect("sqlite::memory:", 1).await?;
		db.migrate().await?;
		Ok(db)
	}

	/// Run migrations
	pub async fn migrate(&self) -> Result<(), DbErr> {
		migration::Migrator::up(&self.conn, None).await?;
		info!("Database migrations completed successfully");
		Ok(())
	}

	/// Get the database connection
	pub fn conn(&self) -> &DatabaseConnection {
		&self.conn
	}
}
