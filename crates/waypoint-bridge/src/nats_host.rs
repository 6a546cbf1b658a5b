//! NATS implementation of the controller's [`Host`] capabilities.
//!
//! The map client runs a small relay script that mirrors its scripting API
//! onto NATS. Every host capability becomes a subject under a shared
//! prefix (default `waypoint`):
//!
//! - **Request/reply:** `{p}.ready`, `{p}.player.tags`, `{p}.map.get`,
//!   `{p}.ui.prompt.remove`, `{p}.room.change`, `{p}.extra.bootstrap`
//! - **Publish:** `{p}.ui.popup.open|close`, `{p}.ui.prompt.display`,
//!   `{p}.ui.banner.open|close`
//! - **Subscribe:** `{p}.area.{zone}.*` (ending in `enter` or `leave`),
//!   `{p}.ui.prompt.confirmed`
//!
//! Each zone gets one wildcard subscription and one forwarding task, so its
//! enter and leave notifications reach the router in the order they were
//! published. Zone names are escaped into a single subject token by
//! [`subject_token`].
//!
//! Handles are minted here and sent along with each open command; the
//! relay keys its client-side objects by them. Notifications are decoded
//! by spawned forwarding tasks and pushed into the router's channel.

use std::fmt::Write as _;
use std::time::Duration;

use futures::StreamExt as _;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use waypoint_core::{Host, HostError};
use waypoint_types::{
    Ack, BannerClose, BannerCommand, BannerHandle, BannerSpec, PopupClose, PopupCommand,
    PopupHandle, PopupSpec, PromptCommand, PromptConfirmed, PromptHandle, PromptRemove,
    PromptSpec, RoomChange, ZoneEvent, ZoneEventKind, ZoneName,
};

use crate::error::BridgeError;

/// Turn a zone name into a single subject token.
///
/// Subject separators, wildcards, whitespace and `%` itself are written as
/// `%XX`, one per UTF-8 byte in uppercase hex. Distinct names always give
/// distinct tokens.
pub fn subject_token(zone: &str) -> String {
    let mut token = String::with_capacity(zone.len());
    for c in zone.chars() {
        if matches!(c, '.' | '*' | '>' | '%') || c.is_whitespace() {
            let mut utf8 = [0_u8; 4];
            for byte in c.encode_utf8(&mut utf8).bytes() {
                let _ = write!(token, "%{byte:02X}");
            }
        } else {
            token.push(c);
        }
    }
    token
}

/// Read the notification kind from the last token of an area subject.
fn zone_event_kind(subject: &str) -> Option<ZoneEventKind> {
    let last = subject.rsplit('.').next()?;
    [ZoneEventKind::Enter, ZoneEventKind::Leave]
        .into_iter()
        .find(|kind| kind.as_str() == last)
}

/// Subject names under one prefix.
#[derive(Debug, Clone)]
pub struct Subjects {
    prefix: String,
}

impl Subjects {
    /// Root every subject at `prefix`.
    pub const fn new(prefix: String) -> Self {
        Self { prefix }
    }

    /// `{p}.{suffix}`
    pub fn at(&self, suffix: &str) -> String {
        format!("{}.{suffix}", self.prefix)
    }

    /// `{p}.area.{zone}.*`
    pub fn area(&self, zone: &ZoneName) -> String {
        format!("{}.area.{}.*", self.prefix, subject_token(zone.as_str()))
    }
}

/// A [`Host`] reached over NATS.
pub struct NatsHost {
    client: async_nats::Client,
    subjects: Subjects,
    timeout: Duration,
    events: mpsc::Sender<ZoneEvent>,
}

impl NatsHost {
    /// Wrap a connected client.
    ///
    /// Zone notifications are forwarded into `events`.
    pub const fn new(
        client: async_nats::Client,
        subjects: Subjects,
        timeout: Duration,
        events: mpsc::Sender<ZoneEvent>,
    ) -> Self {
        Self {
            client,
            subjects,
            timeout,
            events,
        }
    }

    /// Forward prompt confirmations into the event channel.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Nats`] if the subscription fails.
    pub async fn forward_prompt_confirmations(&self) -> Result<JoinHandle<()>, BridgeError> {
        let subject = self.subjects.at("ui.prompt.confirmed");
        let mut subscriber = self
            .client
            .subscribe(subject.clone())
            .await
            .map_err(|e| BridgeError::Nats(format!("failed to subscribe to {subject}: {e}")))?;
        info!(subject = subject, "forwarding prompt confirmations");

        let events = self.events.clone();
        Ok(tokio::spawn(async move {
            while let Some(message) = subscriber.next().await {
                match serde_json::from_slice::<PromptConfirmed>(&message.payload) {
                    Ok(confirmed) => {
                        debug!(zone = %confirmed.zone, prompt = %confirmed.handle, "prompt confirmed");
                        let event = ZoneEvent::Confirmed {
                            zone: confirmed.zone,
                            prompt: confirmed.handle,
                        };
                        if events.send(event).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!(error = %e, "undecodable prompt confirmation dropped"),
                }
            }
        }))
    }

    /// Send a request and wait for the reply.
    async fn request(
        &self,
        operation: &'static str,
        suffix: &str,
        payload: Vec<u8>,
    ) -> Result<async_nats::Message, HostError> {
        let subject = self.subjects.at(suffix);
        debug!(subject = subject, operation, "host request");
        match tokio::time::timeout(self.timeout, self.client.request(subject, payload.into())).await {
            Ok(Ok(message)) => Ok(message),
            Ok(Err(e)) => Err(HostError::Transport {
                message: format!("{operation} request failed: {e}"),
            }),
            Err(elapsed) => {
                debug!(operation, %elapsed, "host request timed out");
                Err(HostError::Timeout {
                    operation,
                    timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
                })
            }
        }
    }

    /// Send a request and decode a JSON reply.
    async fn request_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        suffix: &str,
    ) -> Result<T, HostError> {
        let reply = self.request(operation, suffix, Vec::new()).await?;
        decode(operation, &reply.payload)
    }

    /// Send a request and require a positive [`Ack`].
    async fn request_ack<T: Serialize>(
        &self,
        operation: &'static str,
        suffix: &str,
        body: &T,
    ) -> Result<(), HostError> {
        let reply = self.request(operation, suffix, encode(operation, body)?).await?;
        let ack: Ack = decode(operation, &reply.payload)?;
        if ack.ok {
            Ok(())
        } else {
            Err(HostError::Rejected {
                operation,
                message: ack.error.unwrap_or_default(),
            })
        }
    }

    /// Fire-and-forget publish.
    async fn publish<T: Serialize>(
        &self,
        operation: &'static str,
        suffix: &str,
        body: &T,
    ) -> Result<(), HostError> {
        let subject = self.subjects.at(suffix);
        let payload = encode(operation, body)?;
        debug!(subject = subject, operation, "host publish");
        self.client
            .publish(subject, payload.into())
            .await
            .map_err(|e| HostError::Transport {
                message: format!("{operation} publish failed: {e}"),
            })
    }

    async fn forward_zone(&self, zone: &ZoneName) -> Result<(), HostError> {
        let subject = self.subjects.area(zone);
        let mut subscriber =
            self.client
                .subscribe(subject.clone())
                .await
                .map_err(|e| HostError::Transport {
                    message: format!("failed to subscribe to {subject}: {e}"),
                })?;
        debug!(subject = subject, "zone subject subscribed");

        let events = self.events.clone();
        let zone = zone.clone();
        tokio::spawn(async move {
            while let Some(message) = subscriber.next().await {
                let Some(kind) = zone_event_kind(message.subject.as_str()) else {
                    warn!(subject = %message.subject, "unknown zone notification dropped");
                    continue;
                };
                if events
                    .send(ZoneEvent::from_kind(kind, zone.clone()))
                    .await
                    .is_err()
                {
                    break;
                }
            }
        });
        Ok(())
    }
}

fn encode<T: Serialize>(operation: &'static str, body: &T) -> Result<Vec<u8>, HostError> {
    serde_json::to_vec(body).map_err(|e| HostError::Transport {
            message: format!("failed to encode {operation}: {e}"),
        })
}

fn decode<T: DeserializeOwned>(operation: &'static str, payload: &[u8]) -> Result<T, HostError> {
    serde_json::from_slice(payload).map_err(|e| HostError::Decode {
        operation,
        message: e.to_string(),
    })
}

impl Host for NatsHost {
    async fn on_ready(&self) -> Result<(), HostError> {
        self.request("ready", "ready", Vec::new()).await.map(drop)
    }

    async fn player_tags(&self) -> Result<Vec<String>, HostError> {
        self.request_json("player tags", "player.tags").await
    }

    async fn subscribe_zone(&self, zone: &ZoneName) -> Result<(), HostError> {
        self.forward_zone(zone).await
    }

    async fn map_document(&self) -> Result<serde_json::Value, HostError> {
        self.request_json("map document", "map.get").await
    }

    async fn open_popup(&self, spec: &PopupSpec) -> Result<PopupHandle, HostError> {
        let handle = PopupHandle::new();
        let command = PopupCommand {
            handle,
            spec: spec.clone(),
        };
        self.publish("popup open", "ui.popup.open", &command).await?;
        Ok(handle)
    }

    async fn close_popup(&self, handle: PopupHandle) -> Result<(), HostError> {
        self.publish("popup close", "ui.popup.close", &PopupClose { handle })
            .await
    }

    async fn display_prompt(&self, spec: &PromptSpec) -> Result<PromptHandle, HostError> {
        let handle = PromptHandle::new();
        let command = PromptCommand {
            handle,
            spec: spec.clone(),
        };
        self.publish("prompt display", "ui.prompt.display", &command)
            .await?;
        Ok(handle)
    }

    async fn remove_prompt(&self, handle: PromptHandle) -> Result<(), HostError> {
        self.request_ack("prompt removal", "ui.prompt.remove", &PromptRemove { handle })
            .await
    }

    async fn open_banner(&self, spec: &BannerSpec) -> Result<BannerHandle, HostError> {
        let handle = BannerHandle::new();
        let command = BannerCommand {
            handle,
            spec: spec.clone(),
        };
        self.publish("banner open", "ui.banner.open", &command).await?;
        Ok(handle)
    }

    async fn close_banner(&self, handle: BannerHandle) -> Result<(), HostError> {
        self.publish("banner close", "ui.banner.close", &BannerClose { handle })
            .await
    }

    async fn request_room_change(&self, url: &str) -> Result<(), HostError> {
        let body = RoomChange {
            url: url.to_owned(),
        };
        self.request_ack("room change", "room.change", &body).await
    }

    async fn bootstrap_extended(&self) -> Result<(), HostError> {
        self.request_ack("extended bootstrap", "extra.bootstrap", &serde_json::Value::Null)
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn plain_names_are_kept() {
        assert_eq!(subject_token("door1"), "door1");
        assert_eq!(subject_token("exit-north_2"), "exit-north_2");
    }

    #[test]
    fn separators_and_wildcards_are_escaped() {
        assert_eq!(subject_token("a.b"), "a%2Eb");
        assert_eq!(subject_token("any*"), "any%2A");
        assert_eq!(subject_token("x>y"), "x%3Ey");
        assert_eq!(subject_token("front door\t2"), "front%20door%092");
        assert_eq!(subject_token("50%"), "50%25");
        assert_eq!(subject_token("a\u{3000}b"), "a%E3%80%80b");
    }

    #[test]
    fn similar_names_get_distinct_tokens() {
        let names = ["a.b", "a_b", "a b", "a%2Eb", "a*b", "a>b"];
        let tokens: std::collections::HashSet<String> =
            names.iter().map(|name| subject_token(name)).collect();
        assert_eq!(tokens.len(), names.len());
    }

    #[test]
    fn area_subjects_use_tokens() {
        let subjects = Subjects::new(String::from("waypoint"));
        assert_eq!(
            subjects.area(&ZoneName::from("front.door")),
            "waypoint.area.front%2Edoor.*"
        );
        assert_eq!(
            subjects.area(&ZoneName::from("clock")),
            "waypoint.area.clock.*"
        );
        assert_eq!(subjects.at("room.change"), "waypoint.room.change");
    }

    #[test]
    fn notification_kind_comes_from_the_last_token() {
        assert_eq!(
            zone_event_kind("waypoint.area.door1.enter"),
            Some(ZoneEventKind::Enter)
        );
        assert_eq!(
            zone_event_kind("waypoint.area.front%2Edoor.leave"),
            Some(ZoneEventKind::Leave)
        );
        assert_eq!(zone_event_kind("waypoint.area.door1.hover"), None);
        assert_eq!(zone_event_kind("waypoint.area.enter.other"), None);
    }

    #[test]
    fn rejected_ack_is_decoded() {
        let ack: Ack = decode("room change", br#"{"ok":false,"error":"no such room"}"#).unwrap();
        assert!(!ack.ok);
        assert_eq!(ack.error.as_deref(), Some("no such room"));
    }

    #[test]
    fn garbage_reply_is_a_decode_error() {
        let result: Result<Vec<String>, HostError> = decode("player tags", b"not json");
        assert!(matches!(
            result,
            Err(HostError::Decode {
                operation: "player tags",
                ..
            })
        ));
    }
}
