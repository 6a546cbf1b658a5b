//! The zone event router: the exit-zone state machine.
//!
//! The router owns all mutable controller state (the active zone, the exit
//! UI session, the clock popup) and is driven by one [`ZoneEvent`] at a
//! time. Each transition is fully awaited before the next event is read,
//! so between host round-trips state changes are atomic with respect to
//! other notifications.
//!
//! # Transitions
//!
//! | Event | State | Effect |
//! |---|---|---|
//! | `Enter(z)`, exit zone | any | close session, `Active(z)`, open session |
//! | `Leave(z)`, exit zone | `Active(z)` | close session, `Inactive` |
//! | `Leave(z)`, exit zone | other | none (stale notification) |
//! | `Confirmed(z, p)` | `Active(z)`, `p` showing | navigate, `Inactive` |
//! | `Confirmed(z, p)` | other | none (prompt already gone) |
//!
//! The same-name guard on `Leave` is what keeps a late leave of zone A from
//! tearing down the UI that now belongs to zone B: enter and leave
//! notifications of different zones are not ordered with respect to each
//! other.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use waypoint_types::{PromptHandle, ZoneDescriptor, ZoneEvent, ZoneName};

use crate::clock::ClockPopup;
use crate::config::PresentationConfig;
use crate::host::Host;
use crate::session::ExitUiSession;

/// What a subscribed zone is wired to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZoneBinding {
    /// A doorway to another room.
    Exit(ZoneDescriptor),
    /// The informational clock zone.
    Clock,
}

/// Name-keyed subscriptions: one enter/leave pair per zone.
///
/// Registering a name again replaces its binding, so when a map reuses a
/// zone name the last registration wins.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    bindings: HashMap<ZoneName, ZoneBinding>,
}

impl SubscriptionRegistry {
    /// Bind `zone`, returning the binding it replaced.
    pub fn insert(&mut self, zone: ZoneName, binding: ZoneBinding) -> Option<ZoneBinding> {
        self.bindings.insert(zone, binding)
    }

    /// The binding for `zone`.
    pub fn get(&self, zone: &ZoneName) -> Option<&ZoneBinding> {
        self.bindings.get(zone)
    }

    /// Whether `zone` is subscribed.
    pub fn contains(&self, zone: &ZoneName) -> bool {
        self.bindings.contains_key(zone)
    }

    /// Number of subscribed zones.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether nothing is subscribed.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Exit-zone state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RouterState {
    /// The visitor is in no exit zone.
    #[default]
    Inactive,
    /// The visitor is inside the named exit zone.
    Active(ZoneName),
}

impl RouterState {
    /// Whether `zone` is the active zone.
    pub fn is_active(&self, zone: &ZoneName) -> bool {
        matches!(self, Self::Active(active) if active == zone)
    }

    /// The active zone, if any.
    pub const fn active_zone(&self) -> Option<&ZoneName> {
        match self {
            Self::Active(zone) => Some(zone),
            Self::Inactive => None,
        }
    }
}

/// Routes zone notifications to the exit UI and the clock popup.
#[derive(Debug)]
pub struct ZoneRouter<H> {
    host: H,
    registry: SubscriptionRegistry,
    state: RouterState,
    session: ExitUiSession,
    clock: ClockPopup,
    presentation: PresentationConfig,
}

impl<H: Host> ZoneRouter<H> {
    /// Create a router with no subscriptions.
    pub fn new(host: H, presentation: PresentationConfig, clock: ClockPopup) -> Self {
        Self {
            host,
            registry: SubscriptionRegistry::default(),
            state: RouterState::Inactive,
            session: ExitUiSession::new(),
            clock,
            presentation,
        }
    }

    /// The host this router drives.
    pub const fn host(&self) -> &H {
        &self.host
    }

    /// Current exit-zone state.
    pub const fn state(&self) -> &RouterState {
        &self.state
    }

    /// The exit UI session.
    pub const fn session(&self) -> &ExitUiSession {
        &self.session
    }

    /// The clock popup.
    pub const fn clock(&self) -> &ClockPopup {
        &self.clock
    }

    /// Current subscriptions.
    pub const fn registry(&self) -> &SubscriptionRegistry {
        &self.registry
    }

    /// Subscribe the clock zone.
    pub async fn register_clock(&mut self, zone: ZoneName) {
        self.bind(zone, ZoneBinding::Clock).await;
    }

    /// Subscribe every exit zone. Returns how many were bound.
    pub async fn register_exit_zones<I>(&mut self, zones: I) -> usize
    where
        I: IntoIterator<Item = ZoneDescriptor>,
    {
        let mut bound = 0_usize;
        for zone in zones {
            if self.bind(zone.name.clone(), ZoneBinding::Exit(zone)).await {
                bound = bound.saturating_add(1);
            }
        }
        bound
    }

    /// Bind `zone`, subscribing on the host the first time the name is seen.
    async fn bind(&mut self, zone: ZoneName, binding: ZoneBinding) -> bool {
        if self.registry.contains(&zone) {
            warn!(zone = %zone, "zone name registered twice, last registration wins");
            self.registry.insert(zone, binding);
            return true;
        }
        match self.host.subscribe_zone(&zone).await {
            Ok(()) => {
                debug!(zone = %zone, "zone subscribed");
                self.registry.insert(zone, binding);
                true
            }
            Err(err) => {
                error!(zone = %zone, error = %err, "zone subscription failed");
                false
            }
        }
    }

    /// Handle one notification. Failures are logged, never propagated.
    pub async fn handle(&mut self, event: ZoneEvent) {
        match event {
            ZoneEvent::Enter(zone) => self.on_enter(zone).await,
            ZoneEvent::Leave(zone) => self.on_leave(zone).await,
            ZoneEvent::Confirmed { zone, prompt } => self.on_confirmed(zone, prompt).await,
        }
    }

    /// Handle notifications until every sender is dropped.
    pub async fn run(&mut self, mut events: mpsc::Receiver<ZoneEvent>) {
        info!(zones = self.registry.len(), "zone router running");
        while let Some(event) = events.recv().await {
            debug!(zone = %event.zone(), "zone event received");
            self.handle(event).await;
        }
        info!("zone event channel closed, zone router stopping");
    }

    async fn on_enter(&mut self, zone: ZoneName) {
        match self.registry.get(&zone).cloned() {
            Some(ZoneBinding::Exit(descriptor)) => self.enter_exit_zone(descriptor).await,
            Some(ZoneBinding::Clock) => {
                if let Err(err) = self.clock.open(&self.host).await {
                    error!(zone = %zone, error = %err, "clock popup failed to open");
                }
            }
            None => debug!(zone = %zone, "enter for unregistered zone ignored"),
        }
    }

    async fn enter_exit_zone(&mut self, zone: ZoneDescriptor) {
        // Close first: a leave for the previous zone may still be in flight.
        if let Err(err) = self.session.close(&self.host).await {
            warn!(error = %err, "closing previous exit UI failed");
        }

        debug!(zone = %zone.name, previous = ?self.state.active_zone(), "exit zone entered");
        self.state = RouterState::Active(zone.name.clone());

        if let Err(err) = self
            .session
            .open(&self.host, &zone, &self.presentation)
            .await
        {
            error!(zone = %zone.name, error = %err, "exit UI failed to open");
        }
    }

    async fn on_leave(&mut self, zone: ZoneName) {
        match self.registry.get(&zone) {
            Some(ZoneBinding::Exit(_)) => {
                if !self.state.is_active(&zone) {
                    debug!(
                        zone = %zone,
                        active = ?self.state.active_zone(),
                        "stale leave ignored"
                    );
                    return;
                }
                self.state = RouterState::Inactive;
                if let Err(err) = self.session.close(&self.host).await {
                    error!(zone = %zone, error = %err, "exit UI failed to close");
                }
                debug!(zone = %zone, "exit zone left");
            }
            Some(ZoneBinding::Clock) => {
                if let Err(err) = self.clock.close(&self.host).await {
                    error!(zone = %zone, error = %err, "clock popup failed to close");
                }
            }
            None => debug!(zone = %zone, "leave for unregistered zone ignored"),
        }
    }

    async fn on_confirmed(&mut self, zone: ZoneName, prompt: PromptHandle) {
        if !self.state.is_active(&zone) {
            debug!(zone = %zone, "confirmation for inactive zone ignored");
            return;
        }
        if self.session.prompt() != Some(prompt) {
            debug!(zone = %zone, prompt = %prompt, "confirmation for a removed prompt ignored");
            return;
        }
        let Some(trigger) = self.session.take_confirm_action() else {
            debug!(zone = %zone, "confirmation without an open prompt ignored");
            return;
        };

        self.state = RouterState::Inactive;
        if let Err(err) = trigger.fire(&mut self.session, &self.host).await {
            error!(zone = %zone, error = %err, "navigation failed");
        }
    }
}
