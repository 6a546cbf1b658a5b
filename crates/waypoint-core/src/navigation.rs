//! Room change on prompt confirmation.

use tracing::{info, warn};

use crate::error::NavigationError;
use crate::host::Host;
use crate::session::ExitUiSession;

/// The action bound to an exit prompt: go to `destination_url`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationTrigger {
    destination_url: String,
}

impl NavigationTrigger {
    /// Bind a trigger to a destination.
    pub const fn new(destination_url: String) -> Self {
        Self { destination_url }
    }

    /// Where this trigger navigates to.
    pub fn destination_url(&self) -> &str {
        &self.destination_url
    }

    /// Tear down the exit UI, then ask the host for the room change.
    ///
    /// The room change is only requested once teardown has completed, so
    /// no artifact leaks into the destination room. A teardown failure is
    /// logged and does not block navigation since the session is already
    /// empty. A failed room change is not retried: confirming again is the
    /// retry.
    pub async fn fire<H: Host>(
        self,
        session: &mut ExitUiSession,
        host: &H,
    ) -> Result<(), NavigationError> {
        if let Err(err) = session.close(host).await {
            warn!(error = %err, "exit UI teardown failed before navigation");
        }

        info!(destination = self.destination_url, "requesting room change");
        host.request_room_change(&self.destination_url)
            .await
            .map_err(|source| NavigationError {
                destination: self.destination_url,
                source,
            })
    }
}
