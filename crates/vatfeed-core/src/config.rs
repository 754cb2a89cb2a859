//! Client configuration.
//!
//! [`FeedConfig`] carries every tunable of the facade. It can be built in code
//! through the `with_*` setters, deserialized from JSON (camelCase keys),
//! overridden from `VATFEED_*` environment variables, or patched one key at a
//! time through [`FeedConfig::set`].

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::feed::{DataFormat, FeedKind, DEFAULT_STATUS_URL};
use crate::http_client::FetchOptions;

const ENV_PREFIX: &str = "VATFEED_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeedConfig {
    /// Base directory for every cache file.
    pub cache_dir: PathBuf,
    /// Never fetch; use the cache files whatever their age.
    pub cache_only: bool,
    /// Bootstrap status file URL; empty means the public default.
    pub status_url: String,
    pub status_refresh: u64,
    pub data_refresh: u64,
    /// Seconds after which the feed's embedded update stamp is too old; 0 disables.
    pub data_expire: u64,
    pub force_data_refresh: bool,
    pub metar_refresh: u64,
    pub force_metar_refresh: bool,
    pub data_format: DataFormat,
    /// Data mirrors to use instead of the ones listed by the status file.
    pub data_urls: Vec<String>,
    pub fetch_timeout_ms: u64,
    pub verify_peer: bool,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("."),
            cache_only: false,
            status_url: String::new(),
            status_refresh: FeedKind::Status.default_refresh(),
            data_refresh: FeedKind::Data.default_refresh(),
            data_expire: 3_600,
            force_data_refresh: false,
            metar_refresh: FeedKind::Metar.default_refresh(),
            force_metar_refresh: false,
            data_format: DataFormat::Legacy,
            data_urls: Vec::new(),
            fetch_timeout_ms: 10_000,
            verify_peer: false,
        }
    }
}

impl FeedConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by any `VATFEED_*` variables that are set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides looked up through `lookup`, keyed by variable name.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        for key in Self::KEYS {
            let variable = env_name(key);
            let Some(value) = lookup(&variable) else {
                continue;
            };
            if !self.set(key, &value) {
                return Err(ConfigError::Env {
                    key: variable,
                    value,
                });
            }
        }
        Ok(self)
    }

    pub const KEYS: [&'static str; 13] = [
        "cacheDir",
        "cacheOnly",
        "statusUrl",
        "statusRefresh",
        "dataRefresh",
        "dataExpire",
        "forceDataRefresh",
        "metarRefresh",
        "forceMetarRefresh",
        "dataFormat",
        "dataUrls",
        "fetchTimeoutMs",
        "verifyPeer",
    ];

    /// Sets one option from its string form.
    ///
    /// Returns `false`, leaving the config untouched, for unknown keys and
    /// unparsable values. `dataUrls` takes a comma-separated list.
    pub fn set(&mut self, key: &str, value: &str) -> bool {
        let value = value.trim();
        match key {
            "cacheDir" => assign(&mut self.cache_dir, Some(PathBuf::from(value))),
            "cacheOnly" => assign(&mut self.cache_only, parse_flag(value)),
            "statusUrl" => assign(&mut self.status_url, Some(value.to_owned())),
            "statusRefresh" => assign(&mut self.status_refresh, value.parse().ok()),
            "dataRefresh" => assign(&mut self.data_refresh, value.parse().ok()),
            "dataExpire" => assign(&mut self.data_expire, value.parse().ok()),
            "forceDataRefresh" => assign(&mut self.force_data_refresh, parse_flag(value)),
            "metarRefresh" => assign(&mut self.metar_refresh, value.parse().ok()),
            "forceMetarRefresh" => assign(&mut self.force_metar_refresh, parse_flag(value)),
            "dataFormat" => assign(&mut self.data_format, DataFormat::from_str(value).ok()),
            "dataUrls" => assign(
                &mut self.data_urls,
                Some(
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|url| !url.is_empty())
                        .map(str::to_owned)
                        .collect(),
                ),
            ),
            "fetchTimeoutMs" => assign(&mut self.fetch_timeout_ms, value.parse().ok()),
            "verifyPeer" => assign(&mut self.verify_peer, parse_flag(value)),
            _ => false,
        }
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    pub fn with_cache_only(mut self, cache_only: bool) -> Self {
        self.cache_only = cache_only;
        self
    }

    pub fn with_status_url(mut self, url: impl Into<String>) -> Self {
        self.status_url = url.into();
        self
    }

    pub fn with_status_refresh(mut self, seconds: u64) -> Self {
        self.status_refresh = seconds;
        self
    }

    pub fn with_data_refresh(mut self, seconds: u64) -> Self {
        self.data_refresh = seconds;
        self
    }

    pub fn with_data_expire(mut self, seconds: u64) -> Self {
        self.data_expire = seconds;
        self
    }

    pub fn with_force_data_refresh(mut self, force: bool) -> Self {
        self.force_data_refresh = force;
        self
    }

    pub fn with_metar_refresh(mut self, seconds: u64) -> Self {
        self.metar_refresh = seconds;
        self
    }

    pub fn with_force_metar_refresh(mut self, force: bool) -> Self {
        self.force_metar_refresh = force;
        self
    }

    pub fn with_data_format(mut self, format: DataFormat) -> Self {
        self.data_format = format;
        self
    }

    pub fn with_data_urls<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.data_urls = urls.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_fetch_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.fetch_timeout_ms = timeout_ms;
        self
    }

    pub fn with_verify_peer(mut self, verify_peer: bool) -> Self {
        self.verify_peer = verify_peer;
        self
    }

    /// Status URL to bootstrap from.
    pub fn effective_status_url(&self) -> &str {
        if self.status_url.trim().is_empty() {
            DEFAULT_STATUS_URL
        } else {
            self.status_url.trim()
        }
    }

    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            follow_redirects: true,
            verify_peer: self.verify_peer,
            timeout: Duration::from_millis(self.fetch_timeout_ms),
        }
    }
}

fn assign<T>(slot: &mut T, value: Option<T>) -> bool {
    match value {
        Some(value) => {
            *slot = value;
            true
        }
        None => false,
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

/// `dataRefresh` -> `VATFEED_DATA_REFRESH`.
fn env_name(key: &str) -> String {
    let mut name = String::from(ENV_PREFIX);
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            name.push('_');
        }
        name.push(ch.to_ascii_uppercase());
    }
    name
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn defaults_match_feed_presets() {
        let config = FeedConfig::default();
        assert_eq!(config.cache_dir, PathBuf::from("."));
        assert_eq!(config.status_refresh, 86_400);
        assert_eq!(config.data_refresh, 180);
        assert_eq!(config.data_expire, 3_600);
        assert_eq!(config.metar_refresh, 600);
        assert_eq!(config.effective_status_url(), DEFAULT_STATUS_URL);
        assert!(!config.fetch_options().verify_peer);
    }

    #[test]
    fn set_rejects_unknown_keys_and_bad_values() {
        let mut config = FeedConfig::default();
        assert!(config.set("dataRefresh", "30"));
        assert_eq!(config.data_refresh, 30);

        assert!(!config.set("dataRefresh", "soon"));
        assert_eq!(config.data_refresh, 30);

        assert!(!config.set("refreshEverything", "1"));
        assert!(config.set("cacheOnly", "yes"));
        assert!(config.cache_only);
    }

    #[test]
    fn data_urls_accept_comma_separated_lists() {
        let mut config = FeedConfig::default();
        assert!(config.set("dataUrls", "http://a.example, http://b.example,"));
        assert_eq!(
            config.data_urls,
            vec![
                String::from("http://a.example"),
                String::from("http://b.example"),
            ]
        );
    }

    #[test]
    fn env_overrides_use_screaming_snake_names() {
        assert_eq!(env_name("forceDataRefresh"), "VATFEED_FORCE_DATA_REFRESH");

        let vars = HashMap::from([
            (String::from("VATFEED_CACHE_DIR"), String::from("/tmp/vatfeed")),
            (String::from("VATFEED_DATA_FORMAT"), String::from("json")),
        ]);
        let config = FeedConfig::default()
            .with_env_overrides(|key| vars.get(key).cloned())
            .expect("valid overrides");
        assert_eq!(config.cache_dir, PathBuf::from("/tmp/vatfeed"));
        assert_eq!(config.data_format, DataFormat::Json);

        let bad = HashMap::from([(String::from("VATFEED_DATA_EXPIRE"), String::from("-1"))]);
        let error = FeedConfig::default()
            .with_env_overrides(|key| bad.get(key).cloned())
            .expect_err("negative expiry");
        assert!(matches!(error, ConfigError::Env { .. }));
    }

    #[test]
    fn deserializes_camel_case_with_defaults() {
        let config: FeedConfig =
            serde_json::from_str(r#"{"cacheOnly":true,"dataFormat":"json"}"#).expect("valid json");
        assert!(config.cache_only);
        assert_eq!(config.data_format, DataFormat::Json);
        assert_eq!(config.data_refresh, 180);
    }
}
