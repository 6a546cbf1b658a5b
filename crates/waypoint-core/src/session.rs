//! The exit UI session: popup, prompt, and banner for one exit zone.
//!
//! A session is either empty or holds the handles of everything shown for
//! a single zone. [`ExitUiSession::close`] takes all handles out before its
//! first host round-trip, so a close that is still in flight can never be
//! followed by a stale handle, and overlapping closes converge on the empty
//! state.

use tracing::{debug, warn};
use waypoint_types::{
    BannerHandle, BannerSpec, PopupHandle, PopupSpec, PromptHandle, PromptSpec, ZoneDescriptor,
    ZoneName,
};

use crate::config::PresentationConfig;
use crate::error::{Artifact, UiOperationError};
use crate::host::Host;
use crate::navigation::NavigationTrigger;

/// The currently visible exit UI, if any.
#[derive(Debug, Default)]
pub struct ExitUiSession {
    zone: Option<ZoneName>,
    popup: Option<PopupHandle>,
    prompt: Option<PromptHandle>,
    banner: Option<BannerHandle>,
    on_confirm: Option<NavigationTrigger>,
}

impl ExitUiSession {
    /// Create an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any artifact is currently held.
    pub const fn is_open(&self) -> bool {
        self.popup.is_some() || self.prompt.is_some() || self.banner.is_some()
    }

    /// Zone the session was opened for.
    pub const fn zone(&self) -> Option<&ZoneName> {
        self.zone.as_ref()
    }

    /// Handle of the open popup.
    pub const fn popup(&self) -> Option<PopupHandle> {
        self.popup
    }

    /// Handle of the open prompt.
    pub const fn prompt(&self) -> Option<PromptHandle> {
        self.prompt
    }

    /// Handle of the open banner.
    pub const fn banner(&self) -> Option<BannerHandle> {
        self.banner
    }

    /// Take the action bound to the prompt's confirmation.
    pub const fn take_confirm_action(&mut self) -> Option<NavigationTrigger> {
        self.on_confirm.take()
    }

    /// Show the popup, prompt, and (if enabled) banner for `zone`.
    ///
    /// The caller must [`close`](Self::close) any previous session first.
    /// On failure every artifact already shown is closed again and the
    /// session is left empty.
    pub async fn open<H: Host>(
        &mut self,
        host: &H,
        zone: &ZoneDescriptor,
        presentation: &PresentationConfig,
    ) -> Result<(), UiOperationError> {
        if self.is_open() {
            warn!(
                zone = %zone.name,
                previous = ?self.zone,
                "opening exit UI over an open session"
            );
        }

        self.zone = Some(zone.name.clone());
        if let Err(err) = self.show(host, zone, presentation).await {
            if let Err(cleanup) = self.close(host).await {
                warn!(zone = %zone.name, error = %cleanup, "cleanup after failed open also failed");
            }
            return Err(err);
        }

        self.on_confirm = Some(NavigationTrigger::new(zone.destination_url.clone()));
        debug!(zone = %zone.name, label = zone.destination_label, "exit UI opened");
        Ok(())
    }

    async fn show<H: Host>(
        &mut self,
        host: &H,
        zone: &ZoneDescriptor,
        presentation: &PresentationConfig,
    ) -> Result<(), UiOperationError> {
        let label = &zone.destination_label;

        let popup = PopupSpec {
            id: format!("exit-popup-{}", zone.name),
            text: label.clone(),
        };
        self.popup = Some(
            host.open_popup(&popup)
                .await
                .map_err(|source| UiOperationError::open(Artifact::Popup, source))?,
        );

        let prompt = PromptSpec {
            id: format!("exit-prompt-{}", zone.name),
            message: presentation.prompt_message(label),
            zone: zone.name.clone(),
        };
        self.prompt = Some(
            host.display_prompt(&prompt)
                .await
                .map_err(|source| UiOperationError::open(Artifact::Prompt, source))?,
        );

        let banner = &presentation.banner;
        if banner.enabled {
            let spec = BannerSpec {
                id: banner.id.clone(),
                text: label.clone(),
                bg_color: banner.bg_color.clone(),
                text_color: banner.text_color.clone(),
                closable: false,
            };
            self.banner = Some(
                host.open_banner(&spec)
                    .await
                    .map_err(|source| UiOperationError::open(Artifact::Banner, source))?,
            );
        }

        Ok(())
    }

    /// Close everything the session holds.
    ///
    /// Idempotent: an empty session completes at once without touching
    /// the host. Every artifact is attempted even if an earlier one fails;
    /// the first failure is returned.
    pub async fn close<H: Host>(&mut self, host: &H) -> Result<(), UiOperationError> {
        let zone = self.zone.take();
        let popup = self.popup.take();
        let prompt = self.prompt.take();
        let banner = self.banner.take();
        self.on_confirm = None;

        let mut failures = Vec::new();

        if let Some(handle) = popup {
            if let Err(source) = host.close_popup(handle).await {
                failures.push(UiOperationError::close(Artifact::Popup, source));
            }
        }
        if let Some(handle) = banner {
            if let Err(source) = host.close_banner(handle).await {
                failures.push(UiOperationError::close(Artifact::Banner, source));
            }
        }
        if let Some(handle) = prompt {
            if let Err(source) = host.remove_prompt(handle).await {
                failures.push(UiOperationError::close(Artifact::Prompt, source));
            }
        }

        let mut failures = failures.into_iter();
        match failures.next() {
            Some(first) => {
                for other in failures {
                    warn!(zone = ?zone, error = %other, "additional exit UI close failure");
                }
                Err(first)
            }
            None => {
                if zone.is_some() {
                    debug!(zone = ?zone, "exit UI closed");
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::BannerConfig;
    use crate::host::{HostCall, HostOp, RecordingHost};

    fn door1() -> ZoneDescriptor {
        ZoneDescriptor {
            name: ZoneName::from("door1"),
            destination_url: String::from("forest.tmj"),
            destination_label: String::from("forest"),
        }
    }

    fn with_banner() -> PresentationConfig {
        PresentationConfig {
            banner: BannerConfig {
                enabled: true,
                ..BannerConfig::default()
            },
            ..PresentationConfig::default()
        }
    }

    #[tokio::test]
    async fn open_shows_popup_and_prompt() {
        let host = RecordingHost::default();
        let mut session = ExitUiSession::new();

        session
            .open(&host, &door1(), &PresentationConfig::default())
            .await
            .unwrap();

        assert!(session.popup().is_some());
        assert!(session.prompt().is_some());
        assert!(session.banner().is_none());
        assert_eq!(session.zone(), Some(&ZoneName::from("door1")));
        assert_eq!(
            host.visible_popups(),
            vec![PopupSpec {
                id: String::from("exit-popup-door1"),
                text: String::from("forest"),
            }]
        );
        assert_eq!(
            host.visible_prompts(),
            vec![PromptSpec {
                id: String::from("exit-prompt-door1"),
                message: String::from("Press SPACE to go to forest"),
                zone: ZoneName::from("door1"),
            }]
        );
        assert_eq!(
            session.take_confirm_action().map(|t| t.destination_url().to_owned()),
            Some(String::from("forest.tmj"))
        );
    }

    #[tokio::test]
    async fn banner_follows_presentation() {
        let host = RecordingHost::default();
        let mut session = ExitUiSession::new();

        session.open(&host, &door1(), &with_banner()).await.unwrap();
        let banners = host.visible_banners();
        assert_eq!(banners.len(), 1);
        assert_eq!(banners.first().map(|b| b.text.as_str()), Some("forest"));
        assert_eq!(banners.first().map(|b| b.id.as_str()), Some("exit-navigation"));

        session.close(&host).await.unwrap();
        assert!(host.visible_banners().is_empty());
    }

    #[tokio::test]
    async fn close_twice_is_idempotent() {
        let host = RecordingHost::default();
        let mut session = ExitUiSession::new();
        session
            .open(&host, &door1(), &PresentationConfig::default())
            .await
            .unwrap();

        session.close(&host).await.unwrap();
        let calls_after_first = host.calls().len();
        session.close(&host).await.unwrap();

        assert!(!session.is_open());
        assert!(session.zone().is_none());
        assert!(session.take_confirm_action().is_none());
        assert_eq!(host.calls().len(), calls_after_first);
        assert!(host.visible_popups().is_empty());
        assert!(host.visible_prompts().is_empty());
    }

    #[tokio::test]
    async fn closing_an_empty_session_touches_nothing() {
        let host = RecordingHost::default();
        let mut session = ExitUiSession::new();
        session.close(&host).await.unwrap();
        assert!(host.calls().is_empty());
    }

    #[tokio::test]
    async fn failed_prompt_leaves_session_empty() {
        let host = RecordingHost::default();
        host.fail(HostOp::DisplayPrompt);
        let mut session = ExitUiSession::new();

        let err = session
            .open(&host, &door1(), &PresentationConfig::default())
            .await
            .unwrap_err();

        assert_eq!(err.artifact, Artifact::Prompt);
        assert!(!session.is_open());
        assert!(session.take_confirm_action().is_none());
        // The popup that did open was closed again.
        assert!(host.visible_popups().is_empty());
    }

    #[tokio::test]
    async fn failed_close_still_clears_handles_and_tries_everything() {
        let host = RecordingHost::default();
        let mut session = ExitUiSession::new();
        session
            .open(&host, &door1(), &PresentationConfig::default())
            .await
            .unwrap();
        let prompt = session.prompt().unwrap();

        host.fail(HostOp::ClosePopup);
        let err = session.close(&host).await.unwrap_err();

        assert_eq!(err.artifact, Artifact::Popup);
        assert!(!session.is_open());
        assert!(host.calls().contains(&HostCall::RemovePrompt(prompt)));
        assert!(host.visible_prompts().is_empty());
    }
}
