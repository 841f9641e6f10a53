//! Configuration schema versioning

use anyhow::Result;

/// Upgrades an on-disk configuration to the current schema
pub trait Migrate {
	fn current_version(&self) -> u32;

	fn target_version() -> u32;

	fn migrate(&mut self) -> Result<()>;

	fn needs_migration(&self) -> bool {
		self.current_version() < Self::target_version()
	}
}
