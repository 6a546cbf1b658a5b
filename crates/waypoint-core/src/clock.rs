//! The clock zone: a popup showing the local time.
//!
//! Independent from exit-zone state. Entering shows the time, leaving
//! closes the popup unconditionally.

use chrono::{Local, Timelike};
use waypoint_types::{PopupHandle, PopupSpec};

use crate::error::{Artifact, UiOperationError};
use crate::host::Host;

/// Popup text for a time of day: `It's 9:5` at five past nine.
pub fn clock_text<T: Timelike>(time: &T) -> String {
    format!("It's {}:{}", time.hour(), time.minute())
}

/// The clock popup and its single handle.
#[derive(Debug)]
pub struct ClockPopup {
    popup_id: String,
    handle: Option<PopupHandle>,
}

impl ClockPopup {
    /// Create a clock popup anchored at `popup_id`.
    pub const fn new(popup_id: String) -> Self {
        Self {
            popup_id,
            handle: None,
        }
    }

    /// Whether the popup is showing.
    pub const fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    /// Show the current local time, replacing a popup already showing.
    pub async fn open<H: Host>(&mut self, host: &H) -> Result<(), UiOperationError> {
        self.close(host).await?;
        let spec = PopupSpec {
            id: self.popup_id.clone(),
            text: clock_text(&Local::now()),
        };
        let handle = host
            .open_popup(&spec)
            .await
            .map_err(|source| UiOperationError::open(Artifact::Popup, source))?;
        self.handle = Some(handle);
        Ok(())
    }

    /// Close the popup if it is showing.
    pub async fn close<H: Host>(&mut self, host: &H) -> Result<(), UiOperationError> {
        if let Some(handle) = self.handle.take() {
            host.close_popup(handle)
                .await
                .map_err(|source| UiOperationError::close(Artifact::Popup, source))?;
        }
        Ok(())
    }
}
