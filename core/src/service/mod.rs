//! Request-facing services built on the infrastructure layer

pub mod anchor;
pub mod media;
pub mod sync;

pub use anchor::{AnchorError, AnchorJob, AnchorReport, VerifyOutcome};
pub use media::{MediaError, MediaPreparer};
pub use sync::{PushRequest, SyncError, SyncService};
