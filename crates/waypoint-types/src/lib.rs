//! Shared type definitions for the Waypoint map controller.
//!
//! This crate is the single source of truth for the types exchanged
//! between the controller core and the host bridge. Wire types flow to
//! `TypeScript` via `ts-rs` for the in-client bridge script.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID handles for popups, prompts, and banners
//! - [`zone`] -- Zone names, exit-zone descriptors, and zone events
//! - [`ui`] -- UI artifact specs and the host wire messages

pub mod ids;
pub mod ui;
pub mod zone;

// Re-export all public types at crate root for convenience.
pub use ids::{BannerHandle, PopupHandle, PromptHandle};
pub use ui::{
    Ack, BannerClose, BannerCommand, BannerSpec, PopupClose, PopupCommand, PopupSpec,
    PromptCommand, PromptConfirmed, PromptRemove, PromptSpec, RoomChange,
};
pub use zone::{ZoneDescriptor, ZoneEvent, ZoneEventKind, ZoneName};
