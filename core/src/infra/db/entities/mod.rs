//! Sea-ORM entity definitions
//!
//! These map the sync engine's records to database tables.

pub mod counter;
pub mod media_object;
pub mod merkle_root;
pub mod sync_event;

// Re-export all entities
pub use counter::Entity as Counter;
pub use media_object::Entity as MediaObject;
pub use merkle_root::Entity as MerkleRoot;
pub use sync_event::Entity as SyncEvent;
