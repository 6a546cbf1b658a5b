//! Host capability surface and an in-memory recording host.
//!
//! The controller never talks to the virtual-space client directly. Every
//! side effect goes through the [`Host`] trait: fetching the map, showing
//! and closing UI, subscribing to zones, and moving the visitor. Zone and
//! prompt notifications travel the other way as
//! [`ZoneEvent`](waypoint_types::ZoneEvent)s pushed into the router's
//! channel by the host implementation.
//!
//! [`RecordingHost`] keeps everything in memory and records each call, so
//! the state machine can be exercised end-to-end without a client.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use waypoint_types::{
    BannerHandle, BannerSpec, PopupHandle, PopupSpec, PromptHandle, PromptSpec, ZoneName,
};

use crate::error::HostError;

/// The capabilities the controller consumes from the host client.
///
/// Implementations are driven from a single logical flow: the router
/// awaits each call before issuing the next one.
#[allow(async_fn_in_trait)]
pub trait Host {
    /// Resolves once the scripting bridge is usable.
    async fn on_ready(&self) -> Result<(), HostError>;

    /// Tags attached to the local player.
    async fn player_tags(&self) -> Result<Vec<String>, HostError>;

    /// Start delivering enter and leave notifications for a zone.
    ///
    /// Subscriptions live as long as the map session; there is no
    /// unsubscribe.
    async fn subscribe_zone(&self, zone: &ZoneName) -> Result<(), HostError>;

    /// Fetch the raw map document (Tiled JSON).
    async fn map_document(&self) -> Result<serde_json::Value, HostError>;

    /// Show an informational popup.
    async fn open_popup(&self, spec: &PopupSpec) -> Result<PopupHandle, HostError>;

    /// Close a popup.
    async fn close_popup(&self, handle: PopupHandle) -> Result<(), HostError>;

    /// Show an action prompt. Confirmation arrives as
    /// [`ZoneEvent::Confirmed`](waypoint_types::ZoneEvent::Confirmed).
    async fn display_prompt(&self, spec: &PromptSpec) -> Result<PromptHandle, HostError>;

    /// Remove an action prompt, resolving once the host has done so.
    async fn remove_prompt(&self, handle: PromptHandle) -> Result<(), HostError>;

    /// Show a banner.
    async fn open_banner(&self, spec: &BannerSpec) -> Result<BannerHandle, HostError>;

    /// Close a banner.
    async fn close_banner(&self, handle: BannerHandle) -> Result<(), HostError>;

    /// Move the visitor to another room.
    async fn request_room_change(&self, url: &str) -> Result<(), HostError>;

    /// Bootstrap the host's extended scripting capabilities.
    async fn bootstrap_extended(&self) -> Result<(), HostError>;
}

/// A host operation, used to make [`RecordingHost`] fail on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostOp {
    /// [`Host::on_ready`].
    Ready,
    /// [`Host::player_tags`].
    PlayerTags,
    /// [`Host::subscribe_zone`].
    Subscribe,
    /// [`Host::map_document`].
    MapDocument,
    /// [`Host::open_popup`].
    OpenPopup,
    /// [`Host::close_popup`].
    ClosePopup,
    /// [`Host::display_prompt`].
    DisplayPrompt,
    /// [`Host::remove_prompt`].
    RemovePrompt,
    /// [`Host::open_banner`].
    OpenBanner,
    /// [`Host::close_banner`].
    CloseBanner,
    /// [`Host::request_room_change`].
    RoomChange,
    /// [`Host::bootstrap_extended`].
    BootstrapExtended,
}

impl HostOp {
    const fn name(self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::PlayerTags => "player tags",
            Self::Subscribe => "zone subscription",
            Self::MapDocument => "map document",
            Self::OpenPopup => "popup open",
            Self::ClosePopup => "popup close",
            Self::DisplayPrompt => "prompt display",
            Self::RemovePrompt => "prompt removal",
            Self::OpenBanner => "banner open",
            Self::CloseBanner => "banner close",
            Self::RoomChange => "room change",
            Self::BootstrapExtended => "extended bootstrap",
        }
    }
}

/// One call made against a [`RecordingHost`], failed or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    /// Waited for readiness.
    Ready,
    /// Asked for the player's tags.
    PlayerTags,
    /// Subscribed to a zone.
    Subscribe(ZoneName),
    /// Fetched the map document.
    MapDocument,
    /// Opened a popup.
    OpenPopup(PopupSpec),
    /// Closed a popup.
    ClosePopup(PopupHandle),
    /// Displayed a prompt.
    DisplayPrompt(PromptSpec),
    /// Removed a prompt.
    RemovePrompt(PromptHandle),
    /// Opened a banner.
    OpenBanner(BannerSpec),
    /// Closed a banner.
    CloseBanner(BannerHandle),
    /// Requested a room change.
    RoomChange(String),
    /// Bootstrapped extended capabilities.
    BootstrapExtended,
}

#[derive(Debug, Default)]
struct Recording {
    calls: Vec<HostCall>,
    map: serde_json::Value,
    tags: Vec<String>,
    failing: HashSet<HostOp>,
    popups: BTreeMap<PopupHandle, PopupSpec>,
    prompts: BTreeMap<PromptHandle, PromptSpec>,
    banners: BTreeMap<BannerHandle, BannerSpec>,
}

/// An in-memory [`Host`] that records every call.
///
/// Clones share the same recording, so a test can hand one clone to the
/// router and inspect another. Artifacts stay "visible" from a successful
/// open until a successful close.
#[derive(Debug, Clone, Default)]
pub struct RecordingHost {
    inner: Arc<Mutex<Recording>>,
}

impl RecordingHost {
    /// Create a host serving the given map document.
    pub fn with_map(map: serde_json::Value) -> Self {
        let host = Self::default();
        host.lock().map = map;
        host
    }

    /// Set the tags reported for the player.
    pub fn set_player_tags(&self, tags: Vec<String>) {
        self.lock().tags = tags;
    }

    /// Make every future call of `op` fail until [`recover`](Self::recover).
    pub fn fail(&self, op: HostOp) {
        self.lock().failing.insert(op);
    }

    /// Let `op` succeed again.
    pub fn recover(&self, op: HostOp) {
        self.lock().failing.remove(&op);
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<HostCall> {
        self.lock().calls.clone()
    }

    /// Room changes requested so far, in order.
    pub fn room_changes(&self) -> Vec<String> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                HostCall::RoomChange(url) => Some(url.clone()),
                _ => None,
            })
            .collect()
    }

    /// Popups currently visible.
    pub fn visible_popups(&self) -> Vec<PopupSpec> {
        self.lock().popups.values().cloned().collect()
    }

    /// Prompts currently visible.
    pub fn visible_prompts(&self) -> Vec<PromptSpec> {
        self.lock().prompts.values().cloned().collect()
    }

    /// Handles of the prompts currently visible.
    pub fn visible_prompt_handles(&self) -> Vec<PromptHandle> {
        self.lock().prompts.keys().copied().collect()
    }

    /// Banners currently visible.
    pub fn visible_banners(&self) -> Vec<BannerSpec> {
        self.lock().banners.values().cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, Recording> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record `call` and report whether `op` is set to fail.
    fn record(&self, op: HostOp, call: HostCall) -> Result<MutexGuard<'_, Recording>, HostError> {
        let mut recording = self.lock();
        recording.calls.push(call);
        if recording.failing.contains(&op) {
            return Err(HostError::Transport {
                message: format!("{} unavailable", op.name()),
            });
        }
        Ok(recording)
    }
}

impl Host for RecordingHost {
    async fn on_ready(&self) -> Result<(), HostError> {
        self.record(HostOp::Ready, HostCall::Ready).map(drop)
    }

    async fn player_tags(&self) -> Result<Vec<String>, HostError> {
        self.record(HostOp::PlayerTags, HostCall::PlayerTags)
            .map(|recording| recording.tags.clone())
    }

    async fn subscribe_zone(&self, zone: &ZoneName) -> Result<(), HostError> {
        self.record(HostOp::Subscribe, HostCall::Subscribe(zone.clone()))
            .map(drop)
    }

    async fn map_document(&self) -> Result<serde_json::Value, HostError> {
        self.record(HostOp::MapDocument, HostCall::MapDocument)
            .map(|recording| recording.map.clone())
    }

    async fn open_popup(&self, spec: &PopupSpec) -> Result<PopupHandle, HostError> {
        let mut recording = self.record(HostOp::OpenPopup, HostCall::OpenPopup(spec.clone()))?;
        let handle = PopupHandle::new();
        recording.popups.insert(handle, spec.clone());
        Ok(handle)
    }

    async fn close_popup(&self, handle: PopupHandle) -> Result<(), HostError> {
        let mut recording = self.record(HostOp::ClosePopup, HostCall::ClosePopup(handle))?;
        recording.popups.remove(&handle);
        Ok(())
    }

    async fn display_prompt(&self, spec: &PromptSpec) -> Result<PromptHandle, HostError> {
        let mut recording =
            self.record(HostOp::DisplayPrompt, HostCall::DisplayPrompt(spec.clone()))?;
        let handle = PromptHandle::new();
        recording.prompts.insert(handle, spec.clone());
        Ok(handle)
    }

    async fn remove_prompt(&self, handle: PromptHandle) -> Result<(), HostError> {
        // Removal is a host round-trip; give other tasks a chance to run.
        tokio::task::yield_now().await;
        let mut recording = self.record(HostOp::RemovePrompt, HostCall::RemovePrompt(handle))?;
        recording.prompts.remove(&handle);
        Ok(())
    }

    async fn open_banner(&self, spec: &BannerSpec) -> Result<BannerHandle, HostError> {
        let mut recording = self.record(HostOp::OpenBanner, HostCall::OpenBanner(spec.clone()))?;
        let handle = BannerHandle::new();
        recording.banners.insert(handle, spec.clone());
        Ok(handle)
    }

    async fn close_banner(&self, handle: BannerHandle) -> Result<(), HostError> {
        let mut recording = self.record(HostOp::CloseBanner, HostCall::CloseBanner(handle))?;
        recording.banners.remove(&handle);
        Ok(())
    }

    async fn request_room_change(&self, url: &str) -> Result<(), HostError> {
        tokio::task::yield_now().await;
        self.record(HostOp::RoomChange, HostCall::RoomChange(url.to_owned()))
            .map(drop)
    }

    async fn bootstrap_extended(&self) -> Result<(), HostError> {
        self.record(HostOp::BootstrapExtended, HostCall::BootstrapExtended)
            .map(drop)
    }
}
