//! Map script entry point.
//!
//! Waits for the host, wires the clock and exit zones into a
//! [`ZoneRouter`], then hands control to the router loop. Only a failed
//! readiness wait aborts the script; every later step degrades on its own.

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{error, info, warn};
use waypoint_types::{ZoneDescriptor, ZoneEvent, ZoneName};

use crate::clock::ClockPopup;
use crate::config::{BridgeConfig, MAX_READY_BACKOFF_MS, NavigationRules, WaypointConfig};
use crate::error::{ExtractionError, HostError};
use crate::host::Host;
use crate::map::{MapDocument, extract_exit_zones};
use crate::router::ZoneRouter;

/// Fetch the map document and collect its exit zones.
///
/// # Errors
///
/// Returns [`ExtractionError`] if the host cannot deliver the map or the
/// document is malformed.
pub async fn load_exit_zones<H: Host>(
    host: &H,
    rules: &NavigationRules,
) -> Result<Vec<ZoneDescriptor>, ExtractionError> {
    let document = MapDocument::from_value(host.map_document().await?)?;
    Ok(extract_exit_zones(&document, rules).collect())
}

/// Wait for the host's scripting API, retrying with a doubling pause.
///
/// The first pause is `ready_backoff_ms`; each later one doubles, capped at
/// [`MAX_READY_BACKOFF_MS`].
///
/// # Errors
///
/// Returns the last [`HostError`] once `ready_attempts` checks have failed.
pub async fn wait_until_ready<H: Host>(host: &H, bridge: &BridgeConfig) -> Result<(), HostError> {
    let attempts = bridge.ready_attempts.max(1);
    let base = Duration::from_millis(bridge.ready_backoff_ms);
    let cap = Duration::from_millis(MAX_READY_BACKOFF_MS);
    let mut attempt = 1_u32;

    loop {
        match host.on_ready().await {
            Ok(()) => return Ok(()),
            Err(err) if attempt >= attempts => {
                error!(attempts, error = %err, "host never became ready");
                return Err(err);
            }
            Err(err) => {
                let doublings = attempt.saturating_sub(1).min(8);
                let backoff = base.saturating_mul(2_u32.saturating_pow(doublings)).min(cap);
                warn!(attempt, attempts, ?backoff, error = %err, "host not ready, retrying");
                tokio::time::sleep(backoff).await;
                attempt = attempt.saturating_add(1);
            }
        }
    }
}

/// Run the map script until the event channel closes.
///
/// # Errors
///
/// Returns [`HostError`] only if the host never becomes ready, see
/// [`wait_until_ready`].
pub async fn run_script<H: Host>(
    host: H,
    config: &WaypointConfig,
    events: mpsc::Receiver<ZoneEvent>,
) -> Result<(), HostError> {
    wait_until_ready(&host, &config.bridge).await?;
    info!("scripting API ready");

    match host.player_tags().await {
        Ok(tags) => info!(?tags, "player tags"),
        Err(err) => warn!(error = %err, "player tags unavailable"),
    }

    let mut router = ZoneRouter::new(
        host,
        config.presentation.clone(),
        ClockPopup::new(config.clock.popup_id.clone()),
    );

    if config.clock.enabled {
        router
            .register_clock(ZoneName::new(config.clock.zone.as_str()))
            .await;
    }

    let exit_zones = match load_exit_zones(router.host(), &config.navigation).await {
        Ok(zones) => zones,
        Err(err) => {
            error!(error = %err, "exit zone discovery failed, continuing without exits");
            Vec::new()
        }
    };

    let discovered = exit_zones.len();
    let bound = router.register_exit_zones(exit_zones).await;
    info!(discovered, bound, "exit zones registered");

    match router.host().bootstrap_extended().await {
        Ok(()) => info!("extended scripting API ready"),
        Err(err) => error!(error = %err, "extended scripting API bootstrap failed"),
    }

    router.run(events).await;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::host::{HostCall, HostOp, RecordingHost};

    fn map() -> serde_json::Value {
        json!({
            "layers": [{
                "type": "objectgroup",
                "name": "roomNavigation",
                "objects": [{
                    "name": "door1",
                    "type": "area",
                    "properties": [{ "name": "targetUrl", "type": "string", "value": "forest.tmj" }]
                }]
            }]
        })
    }

    #[tokio::test]
    async fn load_exit_zones_reads_the_navigation_layer() {
        let host = RecordingHost::with_map(map());
        let zones = load_exit_zones(&host, &NavigationRules::default())
            .await
            .unwrap();
        assert_eq!(zones.len(), 1);
        assert_eq!(zones.first().map(|z| z.destination_label.as_str()), Some("forest"));
    }

    #[tokio::test]
    async fn load_exit_zones_reports_fetch_failure() {
        let host = RecordingHost::with_map(map());
        host.fail(HostOp::MapDocument);
        let err = load_exit_zones(&host, &NavigationRules::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::Fetch { .. }));
    }

    #[tokio::test]
    async fn startup_order() {
        let host = RecordingHost::with_map(map());
        let (tx, rx) = mpsc::channel(1);
        drop(tx);

        run_script(host.clone(), &WaypointConfig::default(), rx)
            .await
            .unwrap();

        assert_eq!(
            host.calls(),
            vec![
                HostCall::Ready,
                HostCall::PlayerTags,
                HostCall::Subscribe(ZoneName::from("clock")),
                HostCall::MapDocument,
                HostCall::Subscribe(ZoneName::from("door1")),
                HostCall::BootstrapExtended,
            ]
        );
    }

    fn bridge(ready_attempts: u32) -> BridgeConfig {
        BridgeConfig {
            ready_attempts,
            ready_backoff_ms: 500,
            ..BridgeConfig::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn readiness_backs_off_then_gives_up() {
        let host = RecordingHost::default();
        host.fail(HostOp::Ready);
        let started = tokio::time::Instant::now();

        let result = wait_until_ready(&host, &bridge(3)).await;

        assert!(matches!(result, Err(HostError::Transport { .. })));
        assert_eq!(host.calls(), vec![HostCall::Ready; 3]);
        assert_eq!(started.elapsed(), Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn readiness_succeeds_once_host_recovers() {
        let host = RecordingHost::default();
        host.fail(HostOp::Ready);
        let recovering = host.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(700)).await;
            recovering.recover(HostOp::Ready);
        });

        wait_until_ready(&host, &bridge(5)).await.unwrap();

        assert_eq!(host.calls(), vec![HostCall::Ready; 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn readiness_pause_is_capped() {
        let host = RecordingHost::default();
        host.fail(HostOp::Ready);
        let started = tokio::time::Instant::now();

        let result = wait_until_ready(&host, &bridge(7)).await;

        assert!(result.is_err());
        // 500, 1000, 2000 and 4000, then two pauses at the 8000 cap.
        assert_eq!(started.elapsed(), Duration::from_millis(23_500));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_readiness_aborts() {
        let host = RecordingHost::with_map(map());
        host.fail(HostOp::Ready);
        let (_tx, rx) = mpsc::channel(1);
        let config = WaypointConfig::default();

        let result = run_script(host.clone(), &config, rx).await;

        assert!(result.is_err());
        let attempts = usize::try_from(config.bridge.ready_attempts).unwrap();
        assert_eq!(host.calls(), vec![HostCall::Ready; attempts]);
    }
}
