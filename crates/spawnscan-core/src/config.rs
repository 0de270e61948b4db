//! Configuration loading and typed config structures for Spawnscan.
//!
//! The service reads `spawnscan.yaml` (or the path given with `--config`).
//! YAML is a superset of JSON, so a JSON settings file works unchanged.
//! Every field has a default, and an empty file is a valid configuration.

use std::path::Path;

use serde::Deserialize;
use spawnscan_grid::MAX_LEVEL;

use crate::client::{AuthService, Credentials};
use crate::error::ConfigError;

/// Environment variable overriding `scan.username`.
pub const ENV_USERNAME: &str = "SPAWNSCAN_USERNAME";
/// Environment variable overriding `scan.password`.
pub const ENV_PASSWORD: &str = "SPAWNSCAN_PASSWORD";
/// Environment variable overriding `scan.relay_url`.
pub const ENV_RELAY_URL: &str = "SPAWNSCAN_RELAY_URL";
/// Environment variable overriding `notifier.pushbullet`.
pub const ENV_PUSHBULLET_KEY: &str = "SPAWNSCAN_PUSHBULLET_KEY";

/// Top-level service configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ServiceConfig {
    /// HTTP listen address.
    #[serde(default)]
    pub listen: ListenConfig,

    /// Location client account and scan geometry.
    #[serde(default)]
    pub scan: ScanConfig,

    /// Push notification settings.
    #[serde(default)]
    pub notifier: NotifierConfig,
}

impl ServiceConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment overrides (`SPAWNSCAN_*`) are applied after parsing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// Does not consult the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Override secrets and endpoints with environment variables when set.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides using `lookup` to resolve variable names.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup(ENV_USERNAME) {
            self.scan.username = val;
        }
        if let Some(val) = lookup(ENV_PASSWORD) {
            self.scan.password = val;
        }
        if let Some(val) = lookup(ENV_RELAY_URL) {
            self.scan.relay_url = val;
        }
        if let Some(val) = lookup(ENV_PUSHBULLET_KEY) {
            self.notifier.pushbullet = Some(val);
        }
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the scan depth leaves no room
    /// for child cells, or the altitude is not finite.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scan.depth >= MAX_LEVEL {
            return Err(ConfigError::Invalid(format!(
                "scan.depth {} must be below {MAX_LEVEL}",
                self.scan.depth
            )));
        }
        if !self.scan.altitude.is_finite() {
            return Err(ConfigError::Invalid(String::from(
                "scan.altitude must be a finite number",
            )));
        }
        Ok(())
    }
}

/// HTTP listen address.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ListenConfig {
    /// Interface to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port to bind.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ListenConfig {
    /// The `host:port` string to bind.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Location client account and scan geometry.
#[derive(Clone, PartialEq, Deserialize)]
pub struct ScanConfig {
    /// Account name.
    #[serde(default)]
    pub username: String,

    /// Account password.
    #[serde(default)]
    pub password: String,

    /// Account provider.
    #[serde(default)]
    pub auth_service: AuthService,

    /// Base URL of the location client relay.
    #[serde(default = "default_relay_url")]
    pub relay_url: String,

    /// Level of the parent cell each scan fans out from.
    #[serde(default = "default_depth")]
    pub depth: u8,

    /// Altitude sent with every location update.
    #[serde(default)]
    pub altitude: f64,
}

impl ScanConfig {
    /// Login material for the location client.
    pub fn credentials(&self) -> Credentials {
        Credentials {
            username: self.username.clone(),
            password: self.password.clone(),
            auth_service: self.auth_service,
        }
    }
}

impl core::fmt::Debug for ScanConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ScanConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("auth_service", &self.auth_service)
            .field("relay_url", &self.relay_url)
            .field("depth", &self.depth)
            .field("altitude", &self.altitude)
            .finish()
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            auth_service: AuthService::default(),
            relay_url: default_relay_url(),
            depth: default_depth(),
            altitude: 0.0,
        }
    }
}

/// Push notification settings.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NotifierConfig {
    /// Pushbullet access token. Notifications are disabled without one.
    #[serde(default)]
    pub pushbullet: Option<String>,

    /// Comma-separated species names to notify for. When set, only these
    /// species are notified and `do_not_notify` is ignored.
    #[serde(default)]
    pub notify: Option<String>,

    /// Comma-separated species names never to notify for.
    #[serde(default)]
    pub do_not_notify: Option<String>,
}

impl NotifierConfig {
    /// The push provider key, if a non-empty one is configured.
    pub fn pushbullet_key(&self) -> Option<&str> {
        self.pushbullet
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    /// Normalized allow-list, if one is configured with any entries.
    pub fn allow_list(&self) -> Option<Vec<String>> {
        self.notify.as_deref().and_then(name_list)
    }

    /// Normalized deny-list, if one is configured with any entries.
    pub fn deny_list(&self) -> Option<Vec<String>> {
        self.do_not_notify.as_deref().and_then(name_list)
    }
}

impl core::fmt::Debug for NotifierConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NotifierConfig")
            .field("pushbullet", &self.pushbullet.as_ref().map(|_| "<redacted>"))
            .field("notify", &self.notify)
            .field("do_not_notify", &self.do_not_notify)
            .finish()
    }
}

/// Split a comma-separated list into trimmed, lower-cased, non-empty names.
fn name_list(raw: &str) -> Option<Vec<String>> {
    let names: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_lowercase)
        .collect();
    if names.is_empty() { None } else { Some(names) }
}

// ---------------------------------------------------------------------------
// Default value functions for serde
// ---------------------------------------------------------------------------

fn default_host() -> String {
    "127.0.0.1".to_owned()
}

const fn default_port() -> u16 {
    12345
}

fn default_relay_url() -> String {
    "http://127.0.0.1:8000".to_owned()
}

const fn default_depth() -> u8 {
    spawnscan_grid::SCAN_DEPTH
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
listen:
  host: "0.0.0.0"
  port: 8080

scan:
  username: "ash"
  password: "pikachu"
  auth_service: "google"
  relay_url: "http://relay:9000"
  depth: 14
  altitude: 12.5

notifier:
  pushbullet: "o.abc"
  notify: "Abra, pidgey"
  do_not_notify: "rattata"
"#;

        let config = ServiceConfig::parse(yaml).unwrap();
        assert_eq!(config.listen.address(), "0.0.0.0:8080");
        assert_eq!(config.scan.username, "ash");
        assert_eq!(config.scan.auth_service, AuthService::Google);
        assert_eq!(config.scan.depth, 14);
        assert!((config.scan.altitude - 12.5).abs() < f64::EPSILON);
        assert_eq!(config.notifier.pushbullet_key(), Some("o.abc"));
        assert_eq!(
            config.notifier.allow_list(),
            Some(vec![String::from("abra"), String::from("pidgey")])
        );
        assert_eq!(config.notifier.deny_list(), Some(vec![String::from("rattata")]));
    }

    #[test]
    fn parse_empty_yaml() {
        let config = ServiceConfig::parse("").unwrap();
        assert_eq!(config, ServiceConfig::default());
        assert_eq!(config.listen.address(), "127.0.0.1:12345");
        assert_eq!(config.scan.depth, spawnscan_grid::SCAN_DEPTH);
        assert_eq!(config.notifier.pushbullet_key(), None);
    }

    #[test]
    fn parse_json_settings() {
        let json = r#"{"scan": {"username": "misty", "auth_service": "ptc"}, "notifier": {"notify": ""}}"#;
        let config = ServiceConfig::parse(json).unwrap();
        assert_eq!(config.scan.username, "misty");
        assert_eq!(config.notifier.allow_list(), None);
    }

    #[test]
    fn rejects_depth_without_children() {
        let result = ServiceConfig::parse("scan:\n  depth: 30\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_bad_yaml() {
        let result = ServiceConfig::parse("listen: [unterminated");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn env_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            (ENV_USERNAME, "brock"),
            (ENV_PUSHBULLET_KEY, "o.env"),
        ]);
        let mut config = ServiceConfig::default();
        config.apply_overrides_from(|key| vars.get(key).map(|v| (*v).to_owned()));

        assert_eq!(config.scan.username, "brock");
        assert_eq!(config.scan.password, "");
        assert_eq!(config.notifier.pushbullet_key(), Some("o.env"));
        assert_eq!(config.scan.relay_url, "http://127.0.0.1:8000");
    }

    #[test]
    fn list_normalization_drops_empty_entries() {
        let notifier = NotifierConfig {
            pushbullet: Some(String::from("   ")),
            notify: Some(String::from(" , MEW ,, ")),
            do_not_notify: Some(String::from(",")),
        };
        assert_eq!(notifier.pushbullet_key(), None);
        assert_eq!(notifier.allow_list(), Some(vec![String::from("mew")]));
        assert_eq!(notifier.deny_list(), None);
    }

    #[test]
    fn debug_redacts_secrets() {
        let mut config = ServiceConfig::default();
        config.scan.password = String::from("hunter2");
        config.notifier.pushbullet = Some(String::from("o.secret"));
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("o.secret"));
    }

    #[test]
    fn credentials_from_scan_config() {
        let mut scan = ScanConfig::default();
        scan.username = String::from("gary");
        let credentials = scan.credentials();
        assert_eq!(credentials.username, "gary");
        assert_eq!(credentials.auth_service, AuthService::Ptc);
    }
}
