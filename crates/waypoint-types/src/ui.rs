//! UI artifact specifications and host wire messages.
//!
//! The `*Spec` structs describe what the controller wants shown. The
//! `*Command` structs are what actually travels to the host bridge script:
//! the spec plus the handle the bridge minted for it, so later close and
//! remove commands can address the same artifact.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::{BannerHandle, PopupHandle, PromptHandle};
use crate::zone::ZoneName;

/// An informational popup anchored to a map object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PopupSpec {
    /// Host-side identifier of the popup anchor.
    pub id: String,
    /// Text shown in the popup.
    pub text: String,
}

/// An action prompt inviting the visitor to confirm navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PromptSpec {
    /// Host-side identifier, derived from the zone name.
    pub id: String,
    /// Message shown to the visitor.
    pub message: String,
    /// Zone whose confirmation this prompt reports.
    pub zone: ZoneName,
}

/// A banner across the top of the viewport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct BannerSpec {
    /// Host-side banner identifier.
    pub id: String,
    /// Text shown in the banner.
    pub text: String,
    /// Background colour as a CSS colour string.
    pub bg_color: String,
    /// Text colour as a CSS colour string.
    pub text_color: String,
    /// Whether the visitor may dismiss the banner.
    pub closable: bool,
}

/// Wire message: open a popup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PopupCommand {
    /// Handle minted for this popup.
    pub handle: PopupHandle,
    /// What to show.
    #[serde(flatten)]
    pub spec: PopupSpec,
}

/// Wire message: show an action prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PromptCommand {
    /// Handle minted for this prompt.
    pub handle: PromptHandle,
    /// What to show.
    #[serde(flatten)]
    pub spec: PromptSpec,
}

/// Wire message: show a banner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct BannerCommand {
    /// Handle minted for this banner.
    pub handle: BannerHandle,
    /// What to show.
    #[serde(flatten)]
    pub spec: BannerSpec,
}

/// Wire message: close a popup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PopupClose {
    /// Handle of the popup to close.
    pub handle: PopupHandle,
}

/// Wire message: remove an action prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PromptRemove {
    /// Handle of the prompt to remove.
    pub handle: PromptHandle,
}

/// Wire message: close a banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct BannerClose {
    /// Handle of the banner to close.
    pub handle: BannerHandle,
}

/// Wire message from the host: the visitor confirmed a prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PromptConfirmed {
    /// Handle of the confirmed prompt.
    pub handle: PromptHandle,
    /// Zone the prompt was opened for.
    pub zone: ZoneName,
}

/// Wire message: move the visitor to another room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RoomChange {
    /// Destination map URL.
    pub url: String,
}

/// Reply from the host to any request that only reports success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Ack {
    /// Whether the host carried out the request.
    pub ok: bool,
    /// Failure description when `ok` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
