//! Type-safe handle wrappers around [`Uuid`].
//!
//! Every UI artifact the controller opens on the host is addressed by a
//! strongly-typed handle so a popup handle can never be passed where a
//! prompt handle is expected. Handles use UUID v7 (time-ordered), which
//! keeps host-side logs sortable by creation time.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_handle {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Mint a new handle using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

define_handle! {
    /// Handle to an informational popup shown by the host.
    PopupHandle
}

define_handle! {
    /// Handle to an action prompt shown by the host.
    PromptHandle
}

define_handle! {
    /// Handle to a banner shown by the host.
    BannerHandle
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_are_unique() {
        assert_ne!(PopupHandle::new(), PopupHandle::new());
    }

    #[test]
    fn handle_serializes_as_bare_uuid() {
        let uuid = Uuid::nil();
        let handle = PromptHandle::from(uuid);
        let json = serde_json::to_string(&handle).unwrap_or_default();
        assert_eq!(json, format!("\"{uuid}\""));
        assert_eq!(handle.to_string(), uuid.to_string());
    }
}
