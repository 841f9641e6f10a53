//! Domain models for the sync engine
//!
//! These are the shapes exchanged with field devices:
//! - Principals and tenant keys resolved by the authentication collaborator
//! - Client events as pushed, and their per-event outcomes
//! - Media declarations and the presigned uploads issued for them

pub mod event;
pub mod media;
pub mod tenant;

// Re-export commonly used types
pub use event::{ClientEvent, EventResult, EventStatus, PullPage, PulledEvent, PushOutcome};
pub use media::{MediaDeclaration, MediaKind, PresignedUpload};
pub use tenant::{Principal, Role, TenantKey};
