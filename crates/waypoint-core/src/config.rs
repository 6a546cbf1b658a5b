//! Configuration loading and typed config structures for Waypoint.
//!
//! The configuration lives in `waypoint.yaml` next to the bridge binary.
//! Every field has a default matching the conventions existing maps already
//! follow, so an absent file or an empty document yields a working setup.

use std::path::Path;

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level Waypoint configuration.
///
/// Mirrors the structure of `waypoint.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct WaypointConfig {
    /// Infrastructure connection strings.
    #[serde(default)]
    pub infrastructure: InfrastructureConfig,

    /// Host bridge transport settings.
    #[serde(default)]
    pub bridge: BridgeConfig,

    /// How exit zones are discovered in the map.
    #[serde(default)]
    pub navigation: NavigationRules,

    /// How exit UI is presented.
    #[serde(default)]
    pub presentation: PresentationConfig,

    /// The informational clock zone.
    #[serde(default)]
    pub clock: ClockConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl WaypointConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `NATS_URL` overrides `infrastructure.nats_url` when set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = serde_yml::from_str(&contents)?;
        config.infrastructure.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.infrastructure.apply_env_overrides();
        Ok(config)
    }
}

/// Infrastructure configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InfrastructureConfig {
    /// NATS messaging URL.
    #[serde(default = "default_nats_url")]
    pub nats_url: String,
}

impl InfrastructureConfig {
    /// Override infrastructure URLs with environment variables when set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("NATS_URL") {
            self.nats_url = val;
        }
    }
}

impl Default for InfrastructureConfig {
    fn default() -> Self {
        Self {
            nats_url: default_nats_url(),
        }
    }
}

/// Host bridge settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BridgeConfig {
    /// Root token of every subject the bridge uses.
    #[serde(default = "default_subject_prefix")]
    pub subject_prefix: String,

    /// How long to wait for the host to answer a request.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Capacity of the zone event channel.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,

    /// How many times to ask the host whether it is ready before giving up.
    #[serde(default = "default_ready_attempts")]
    pub ready_attempts: u32,

    /// Pause after the first failed readiness check. Doubles on every
    /// further failure, up to [`MAX_READY_BACKOFF_MS`].
    #[serde(default = "default_ready_backoff_ms")]
    pub ready_backoff_ms: u64,
}

/// Upper bound on the pause between readiness checks.
pub const MAX_READY_BACKOFF_MS: u64 = 8_000;

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            subject_prefix: default_subject_prefix(),
            request_timeout_ms: default_request_timeout_ms(),
            event_buffer: default_event_buffer(),
            ready_attempts: default_ready_attempts(),
            ready_backoff_ms: default_ready_backoff_ms(),
        }
    }
}

/// Rules the map extractor uses to find exit zones.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NavigationRules {
    /// Name of the object layer holding exit zones.
    #[serde(default = "default_layer_name")]
    pub layer_name: String,

    /// Object type (or class) marking a zone.
    #[serde(default = "default_area_type")]
    pub area_type: String,

    /// Property names holding the destination URL, in priority order.
    #[serde(default = "default_url_properties")]
    pub url_properties: Vec<String>,
}

impl Default for NavigationRules {
    fn default() -> Self {
        Self {
            layer_name: default_layer_name(),
            area_type: default_area_type(),
            url_properties: default_url_properties(),
        }
    }
}

/// How the exit UI looks.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PresentationConfig {
    /// Prompt message; `{label}` is replaced with the destination label.
    #[serde(default = "default_prompt_template")]
    pub prompt_template: String,

    /// Optional destination banner.
    #[serde(default)]
    pub banner: BannerConfig,
}

impl PresentationConfig {
    /// Render the prompt message for a destination label.
    pub fn prompt_message(&self, label: &str) -> String {
        self.prompt_template.replace("{label}", label)
    }
}

impl Default for PresentationConfig {
    fn default() -> Self {
        Self {
            prompt_template: default_prompt_template(),
            banner: BannerConfig::default(),
        }
    }
}

/// Destination banner settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BannerConfig {
    /// Whether a banner accompanies the popup and prompt.
    #[serde(default)]
    pub enabled: bool,

    /// Host-side banner identifier.
    #[serde(default = "default_banner_id")]
    pub id: String,

    /// Background colour.
    #[serde(default = "default_banner_bg_color")]
    pub bg_color: String,

    /// Text colour.
    #[serde(default = "default_banner_text_color")]
    pub text_color: String,
}

impl Default for BannerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            id: default_banner_id(),
            bg_color: default_banner_bg_color(),
            text_color: default_banner_text_color(),
        }
    }
}

/// Clock zone settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClockConfig {
    /// Whether the clock zone is subscribed at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Name of the clock zone.
    #[serde(default = "default_clock_zone")]
    pub zone: String,

    /// Host-side popup anchor for the time popup.
    #[serde(default = "default_clock_popup_id")]
    pub popup_id: String,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            zone: default_clock_zone(),
            popup_id: default_clock_popup_id(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_nats_url() -> String {
    String::from("nats://localhost:4222")
}

fn default_subject_prefix() -> String {
    String::from("waypoint")
}

const fn default_request_timeout_ms() -> u64 {
    5000
}

const fn default_event_buffer() -> usize {
    64
}

const fn default_ready_attempts() -> u32 {
    10
}

const fn default_ready_backoff_ms() -> u64 {
    500
}

fn default_layer_name() -> String {
    String::from("roomNavigation")
}

fn default_area_type() -> String {
    String::from("area")
}

fn default_url_properties() -> Vec<String> {
    vec![String::from("targetUrl"), String::from("exitUrl")]
}

fn default_prompt_template() -> String {
    String::from("Press SPACE to go to {label}")
}

fn default_banner_id() -> String {
    String::from("exit-navigation")
}

fn default_banner_bg_color() -> String {
    String::from("#3f3f46")
}

fn default_banner_text_color() -> String {
    String::from("#ffffff")
}

const fn default_true() -> bool {
    true
}

fn default_clock_zone() -> String {
    String::from("clock")
}

fn default_clock_popup_id() -> String {
    String::from("clockPopup")
}

fn default_log_level() -> String {
    String::from("info")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_map_conventions() {
        let config = WaypointConfig::default();
        assert_eq!(config.navigation.layer_name, "roomNavigation");
        assert_eq!(config.navigation.area_type, "area");
        assert_eq!(config.navigation.url_properties, vec!["targetUrl", "exitUrl"]);
        assert_eq!(config.clock.zone, "clock");
        assert!(config.clock.enabled);
        assert!(!config.presentation.banner.enabled);
        assert_eq!(config.bridge.subject_prefix, "waypoint");
        assert_eq!(config.bridge.ready_attempts, 10);
        assert_eq!(config.bridge.ready_backoff_ms, 500);
    }

    #[test]
    fn parse_partial_yaml_keeps_defaults() {
        let yaml = r#"
navigation:
  layer_name: "exits"
presentation:
  prompt_template: "Hit SPACE for {label}"
  banner:
    enabled: true
clock:
  enabled: false
logging:
  format: json
bridge:
  ready_attempts: 3
"#;
        let config = WaypointConfig::parse(yaml).unwrap();
        assert_eq!(config.navigation.layer_name, "exits");
        assert_eq!(config.navigation.area_type, "area");
        assert!(config.presentation.banner.enabled);
        assert_eq!(config.presentation.banner.id, "exit-navigation");
        assert!(!config.clock.enabled);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.bridge.ready_attempts, 3);
        assert_eq!(config.bridge.ready_backoff_ms, 500);
    }

    #[test]
    fn prompt_message_substitutes_label() {
        let presentation = PresentationConfig::default();
        assert_eq!(
            presentation.prompt_message("forest"),
            "Press SPACE to go to forest"
        );
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        let result = WaypointConfig::parse("navigation: [unclosed");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }
}
