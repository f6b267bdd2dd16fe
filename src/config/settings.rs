//! Settings structures for places-rs configuration

use crate::places::{BoundingBox, PlaceFilter};
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

/// Main settings structure, loaded from settings.yml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub service: ServiceSettings,
    pub search: SearchSettings,
    pub server: ServerSettings,
    pub outgoing: OutgoingSettings,
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse settings from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        let settings: Settings = serde_yaml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values that cannot be used at runtime
    pub fn validate(&self) -> Result<()> {
        if parse_timeout(self.service.query_timeout).is_none() {
            bail!(
                "service.query_timeout must be a positive number of seconds, got {}",
                self.service.query_timeout
            );
        }
        Ok(())
    }

    /// Merge with environment variables (PLACES_* prefix)
    pub fn merge_env(&mut self) {
        self.merge_vars(|key| std::env::var(key).ok());
    }

    fn merge_vars<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = var("PLACES_DEBUG") {
            self.general.debug = val.parse().unwrap_or(false);
        }
        if let Some(val) = var("PLACES_API_KEY") {
            self.service.api_key = Some(val);
        }
        if let Some(val) = var("PLACES_BASE_URL") {
            self.service.base_url = val;
        }
        if let Some(val) = var("PLACES_QUERY_TIMEOUT") {
            match val.parse::<f64>() {
                Ok(secs) if parse_timeout(secs).is_some() => self.service.query_timeout = secs,
                _ => warn!("Ignoring invalid PLACES_QUERY_TIMEOUT: {}", val),
            }
        }
        if let Some(val) = var("PLACES_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Some(val) = var("PLACES_BIND_ADDRESS") {
            self.server.bind_address = val;
        }
    }
}

/// A timeout in seconds, if it is positive and representable
fn parse_timeout(secs: f64) -> Option<Duration> {
    if secs > 0.0 {
        Duration::try_from_secs_f64(secs).ok()
    } else {
        None
    }
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Enable debug mode
    pub debug: bool,
    /// Instance name reported by the HTTP front-end
    pub instance_name: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            debug: false,
            instance_name: "places-rs".to_string(),
        }
    }
}

/// Geodata service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Base URL of the places web service
    pub base_url: String,
    /// API key sent with every request
    pub api_key: Option<String>,
    /// Maximum wait for a query response, in seconds
    pub query_timeout: f64,
    /// Issue a reachability request when connecting
    pub probe_on_connect: bool,
    /// Preferred result language
    pub language: Option<String>,
}

impl ServiceSettings {
    /// Query timeout, falling back to the default for unusable values
    pub fn query_timeout(&self) -> Duration {
        parse_timeout(self.query_timeout)
            .unwrap_or_else(|| Duration::from_secs(crate::DEFAULT_QUERY_TIMEOUT))
    }
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            base_url: "https://maps.googleapis.com".to_string(),
            api_key: None,
            query_timeout: crate::DEFAULT_QUERY_TIMEOUT as f64,
            probe_on_connect: false,
            language: None,
        }
    }
}

/// Autocomplete search settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Bounds biasing autocomplete results
    pub bounds: BoundingBox,
    /// Place types to restrict results to (empty = no filter)
    pub filter: PlaceFilter,
}

impl SearchSettings {
    /// The configured filter, if any types are set
    pub fn place_filter(&self) -> Option<PlaceFilter> {
        if self.filter.is_empty() {
            None
        } else {
            Some(self.filter.clone())
        }
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            bounds: BoundingBox::world(),
            filter: PlaceFilter::default(),
        }
    }
}

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Server port
    pub port: u16,
    /// Bind address
    pub bind_address: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 8899,
            bind_address: "127.0.0.1".to_string(),
        }
    }
}

/// Outgoing request settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutgoingSettings {
    /// Transport-level request timeout in seconds
    pub request_timeout: f64,
    /// User agent string (none = places-rs/<version>)
    pub useragent: Option<String>,
    /// Pool max size
    pub pool_maxsize: usize,
    /// Verify SSL certificates
    pub verify_ssl: bool,
    /// Proxy settings
    pub proxies: ProxySettings,
    /// Extra headers to send
    pub extra_headers: HashMap<String, String>,
}

impl Default for OutgoingSettings {
    fn default() -> Self {
        Self {
            request_timeout: 90.0,
            useragent: None,
            pool_maxsize: 20,
            verify_ssl: true,
            proxies: ProxySettings::default(),
            extra_headers: HashMap::new(),
        }
    }
}

/// Proxy settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    pub http: Option<String>,
    pub https: Option<String>,
    pub all: Option<String>,
}
