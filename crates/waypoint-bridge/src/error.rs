//! Error types for the bridge binary.
//!
//! [`BridgeError`] covers startup: loading configuration and wiring the
//! NATS connection. Once the script is running, host failures surface as
//! [`HostError`](waypoint_core::HostError) and are handled by the router.

/// Top-level error for the bridge binary.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: waypoint_core::ConfigError,
    },

    /// Failed to connect to or communicate with the NATS server.
    #[error("NATS error: {0}")]
    Nats(String),

    /// The host never signalled readiness.
    #[error("host error: {source}")]
    Host {
        /// The underlying host error.
        #[from]
        source: waypoint_core::HostError,
    },
}
