use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;

/// Options consumed by the extraction pipeline.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunOptions {
    pub max_pages: u32,
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    pub proxies: Vec<ProxyEndpoint>,
    pub cookies: CookieConfig,
    pub log_level: String,
    pub timeout_ms: u64,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            max_pages: 1,
            min_delay_ms: 1000,
            max_delay_ms: 2500,
            proxies: Vec::new(),
            cookies: CookieConfig::default(),
            log_level: "info".to_string(),
            timeout_ms: 20_000,
        }
    }
}

/// Full settings file contents: the run options plus the glue-level fields
/// (search URL, output path) the binary resolves before starting a run.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub search_url: String,
    pub output_path: Option<PathBuf>,
    #[serde(flatten)]
    pub run: RunOptions,
}

/// One upstream proxy endpoint. Descriptors with a missing host or port are
/// skipped by the fetcher rather than treated as errors, so both fields
/// tolerate absence in the settings file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProxyEndpoint {
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub auth: Option<ProxyAuth>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProxyAuth {
    pub username: String,
    pub password: String,
}

fn default_true() -> bool {
    true
}

impl ProxyEndpoint {
    pub fn is_usable(&self) -> bool {
        self.enabled && !self.host.is_empty() && self.port != 0
    }

    /// Label used in log lines: the configured label, or `host:port`.
    pub fn name(&self) -> String {
        self.label
            .clone()
            .unwrap_or_else(|| format!("{}:{}", self.host, self.port))
    }

    pub fn url(&self) -> String {
        format!(
            "{}://{}:{}",
            self.protocol.as_deref().unwrap_or("http"),
            self.host,
            self.port
        )
    }
}

/// Cookie material from the settings file: either a pre-built header string
/// or a name -> value mapping.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum CookieConfig {
    Header(String),
    Pairs(BTreeMap<String, String>),
}

impl Default for CookieConfig {
    fn default() -> Self {
        CookieConfig::Pairs(BTreeMap::new())
    }
}

pub fn load_settings(path: &Path) -> Result<Settings> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let mut settings: Settings =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
    if settings.run.max_pages == 0 {
        settings.run.max_pages = 1;
    }
    Ok(settings)
}

/// Maps the configured log level to a tracing filter. Unrecognized values
/// emit everything.
pub fn level_filter(level: &str) -> LevelFilter {
    match level {
        "error" => LevelFilter::ERROR,
        "warn" => LevelFilter::WARN,
        "info" => LevelFilter::INFO,
        "debug" => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_settings_use_defaults() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings.run.max_pages, 1);
        assert_eq!(settings.run.min_delay_ms, 1000);
        assert_eq!(settings.run.max_delay_ms, 2500);
        assert_eq!(settings.run.timeout_ms, 20_000);
        assert_eq!(settings.run.log_level, "info");
        assert!(settings.run.proxies.is_empty());
        assert!(settings.search_url.is_empty());
    }

    #[test]
    fn full_settings_parse() {
        let raw = r#"{
            "searchUrl": "https://www.upwork.com/nx/jobs/search/?q=rust",
            "outputPath": "data/out.json",
            "maxPages": 3,
            "minDelayMs": 500,
            "maxDelayMs": 900,
            "logLevel": "debug",
            "timeoutMs": 5000,
            "cookies": { "session": "abc" },
            "proxies": [
                { "host": "proxy.example.com", "port": 8080, "label": "eu-1",
                  "auth": { "username": "u", "password": "p" } },
                { "host": "off.example.com", "port": 8080, "enabled": false }
            ]
        }"#;
        let settings: Settings = serde_json::from_str(raw).unwrap();
        assert_eq!(settings.run.max_pages, 3);
        assert_eq!(settings.run.proxies.len(), 2);
        assert!(settings.run.proxies[0].is_usable());
        assert!(!settings.run.proxies[1].is_usable());
        assert_eq!(settings.run.proxies[0].name(), "eu-1");
        assert_eq!(settings.run.proxies[0].url(), "http://proxy.example.com:8080");
        assert_eq!(settings.output_path.as_deref(), Some(Path::new("data/out.json")));
    }

    #[test]
    fn proxy_without_host_or_port_is_unusable() {
        let p: ProxyEndpoint = serde_json::from_str(r#"{ "port": 8080 }"#).unwrap();
        assert!(!p.is_usable());
        let p: ProxyEndpoint = serde_json::from_str(r#"{ "host": "x" }"#).unwrap();
        assert!(!p.is_usable());
    }

    #[test]
    fn cookies_accept_string_or_map() {
        let c: CookieConfig = serde_json::from_str(r#""a=1; b=2""#).unwrap();
        assert_eq!(c, CookieConfig::Header("a=1; b=2".to_string()));
        let c: CookieConfig = serde_json::from_str(r#"{ "a": "1" }"#).unwrap();
        assert!(matches!(c, CookieConfig::Pairs(_)));
    }

    #[test]
    fn unknown_log_level_emits_everything() {
        assert_eq!(level_filter("warn"), LevelFilter::WARN);
        assert_eq!(level_filter("verbose"), LevelFilter::TRACE);
        assert_eq!(level_filter(""), LevelFilter::TRACE);
    }
}
