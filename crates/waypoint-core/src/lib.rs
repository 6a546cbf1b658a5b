//! Core controller logic for Waypoint.
//!
//! Waypoint drives the room-navigation behaviour of a virtual-space map:
//! it discovers exit zones in the map's Tiled document, shows a popup and
//! a confirmation prompt while the visitor stands in one, and asks the host
//! to change rooms when the prompt is confirmed.
//!
//! # Modules
//!
//! - [`config`] -- `waypoint.yaml` loading and typed configuration
//! - [`error`] -- error types for each asynchronous flow
//! - [`host`] -- the [`Host`] capability trait and an in-memory recorder
//! - [`label`] -- human-readable destination labels
//! - [`map`] -- exit zone discovery in map documents
//! - [`session`] -- the popup/prompt/banner lifecycle of one exit zone
//! - [`navigation`] -- room change on confirmation
//! - [`clock`] -- the clock zone popup
//! - [`router`] -- the zone event state machine
//! - [`script`] -- startup sequence and main loop

pub mod clock;
pub mod config;
pub mod error;
pub mod host;
pub mod label;
pub mod map;
pub mod navigation;
pub mod router;
pub mod script;
pub mod session;

pub use config::{ConfigError, WaypointConfig};
pub use error::{ExtractionError, HostError, NavigationError, UiOperationError};
pub use host::{Host, RecordingHost};
pub use router::{RouterState, ZoneRouter};
pub use script::run_script;
