//! Zone identity, exit-zone descriptors, and zone notifications.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::PromptHandle;

/// Name of a zone (a Tiled area object) as authored in the map.
///
/// Zone names are the subscription key for enter/leave notifications and
/// are unique within a map.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export, export_to = "bindings/")]
pub struct ZoneName(String);

impl ZoneName {
    /// Wrap a zone name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Borrow the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for ZoneName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ZoneName {
    fn from(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl From<String> for ZoneName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// An exit zone discovered in the map: a doorway to another room.
///
/// Produced once per map load and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ZoneDescriptor {
    /// The zone's name, used as the subscription key.
    pub name: ZoneName,
    /// Where the room change should take the visitor (e.g. `forest.tmj`).
    pub destination_url: String,
    /// Human-readable destination shown in the popup and prompt. Never empty.
    pub destination_label: String,
}

/// Kind of zone notification, as named by the last subject token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZoneEventKind {
    /// The visitor walked into the zone.
    Enter,
    /// The visitor walked out of the zone.
    Leave,
}

impl ZoneEventKind {
    /// Lowercase name used in subjects and logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Enter => "enter",
            Self::Leave => "leave",
        }
    }
}

/// A notification delivered by the host into the controller's event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZoneEvent {
    /// The visitor entered the named zone.
    Enter(ZoneName),
    /// The visitor left the named zone.
    Leave(ZoneName),
    /// The visitor confirmed an action prompt.
    Confirmed {
        /// Zone the prompt was opened for.
        zone: ZoneName,
        /// The prompt that was confirmed.
        prompt: PromptHandle,
    },
}

impl ZoneEvent {
    /// Build an enter or leave event from its kind.
    pub const fn from_kind(kind: ZoneEventKind, zone: ZoneName) -> Self {
        match kind {
            ZoneEventKind::Enter => Self::Enter(zone),
            ZoneEventKind::Leave => Self::Leave(zone),
        }
    }

    /// The zone this event concerns.
    pub const fn zone(&self) -> &ZoneName {
        match self {
            Self::Enter(zone) | Self::Leave(zone) | Self::Confirmed { zone, .. } => zone,
        }
    }
}
