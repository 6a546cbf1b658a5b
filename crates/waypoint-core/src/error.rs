//! Error types for the controller core.
//!
//! Each independent asynchronous flow has its own error type so the
//! boundary that catches it can log what went wrong without guessing:
//! [`ExtractionError`] for map loading, [`UiOperationError`] for popup,
//! prompt, and banner calls, and [`NavigationError`] for room changes.
//! All three wrap a [`HostError`] when the host itself failed.

use core::fmt;

/// A failure reported by a [`Host`](crate::host::Host) implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    /// The connection to the host could not carry the request.
    #[error("host transport error: {message}")]
    Transport {
        /// Description of the transport failure.
        message: String,
    },

    /// The host received the request and refused it.
    #[error("host rejected {operation}: {message}")]
    Rejected {
        /// The operation that was refused.
        operation: &'static str,
        /// The host's explanation.
        message: String,
    },

    /// The host did not answer within the deadline.
    #[error("host did not answer {operation} within {timeout_ms}ms")]
    Timeout {
        /// The operation that timed out.
        operation: &'static str,
        /// The deadline in milliseconds.
        timeout_ms: u64,
    },

    /// The host's reply could not be decoded.
    #[error("undecodable host reply to {operation}: {message}")]
    Decode {
        /// The operation whose reply was bad.
        operation: &'static str,
        /// Description of the decoding failure.
        message: String,
    },
}

/// Errors raised while discovering exit zones.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// The host could not deliver the map document.
    #[error("failed to fetch map document: {source}")]
    Fetch {
        /// The underlying host error.
        #[from]
        source: HostError,
    },

    /// The map document root is not a JSON object.
    #[error("map document root is not an object")]
    NotAnObject,

    /// The map document's layer list has the wrong shape.
    #[error("malformed map document: {source}")]
    Malformed {
        /// The underlying deserialization error.
        #[from]
        source: serde_json::Error,
    },
}

/// Which UI artifact an operation concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    /// Informational popup.
    Popup,
    /// Action prompt.
    Prompt,
    /// Destination banner.
    Banner,
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Popup => "popup",
            Self::Prompt => "prompt",
            Self::Banner => "banner",
        })
    }
}

/// Whether an operation was opening or closing an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiAction {
    /// Showing the artifact.
    Open,
    /// Closing or removing the artifact.
    Close,
}

impl fmt::Display for UiAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Open => "open",
            Self::Close => "close",
        })
    }
}

/// A host UI call failed.
///
/// The session that raised it has already cleared its handles.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to {action} {artifact}: {source}")]
pub struct UiOperationError {
    /// What was being attempted.
    pub action: UiAction,
    /// Which artifact was involved.
    pub artifact: Artifact,
    /// The underlying host error.
    #[source]
    pub source: HostError,
}

impl UiOperationError {
    /// An artifact could not be shown.
    pub const fn open(artifact: Artifact, source: HostError) -> Self {
        Self {
            action: UiAction::Open,
            artifact,
            source,
        }
    }

    /// An artifact could not be closed.
    pub const fn close(artifact: Artifact, source: HostError) -> Self {
        Self {
            action: UiAction::Close,
            artifact,
            source,
        }
    }
}

/// The room-change request failed; the visitor stays where they are.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("room change to {destination} failed: {source}")]
pub struct NavigationError {
    /// The requested destination URL.
    pub destination: String,
    /// The underlying host error.
    #[source]
    pub source: HostError,
}
