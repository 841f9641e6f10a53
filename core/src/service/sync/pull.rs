//! Catch-up paging
//!
//! Paging with the returned cursor sees every event of a committed prefix of
//! the log. Sequence numbers are issued before the event is stored, so two
//! concurrent pushes for one tenant can commit out of order: if seq 3 is
//! still in flight when seq 5 is pulled, the cursor moves to 5 and seq 3 is
//! never returned by a later `since=5` pull. Only a pull from an earlier
//! cursor (or from scratch) picks it up.

use super::{SyncError, SyncService};
use crate::domain::{PullPage, PulledEvent, TenantKey};
use tracing::{debug, instrument};

impl SyncService {
	/// One page of the tenant's events with `seq > since`
	///
	/// Clients call again with the returned `server_seq` until a page comes
	/// back empty; the cursor is unchanged when nothing matched.
	#[instrument(skip(self), fields(tenant = %tenant), err)]
	pub async fn pull(&self, tenant: &TenantKey, since: Option<u64>) -> Result<PullPage, SyncError> {
		let events = self
			.log
			.after(tenant, since, self.config.pull_page_size)
			.await?;

		let server_seq = events
			.last()
			.map(|event| event.sequence())
			.unwrap_or_else(|| since.unwrap_or(0));

		debug!(count = events.len(), server_seq, "Served pull page");

		Ok(PullPage {
			server_seq,
			events: events.into_iter().map(PulledEvent::from).collect(),
		})
	}
}
