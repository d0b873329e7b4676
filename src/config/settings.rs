//! Settings structures for Logfolio configuration

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Main settings structure matching `settings.yml`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub server: ServerSettings,
    pub search: SearchSettings,
    pub outgoing: OutgoingSettings,
    pub storage: StorageSettings,
    pub providers: Vec<ProviderConfig>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            general: GeneralSettings::default(),
            server: ServerSettings::default(),
            search: SearchSettings::default(),
            outgoing: OutgoingSettings::default(),
            storage: StorageSettings::default(),
            providers: default_providers(),
        }
    }
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = serde_yaml::from_str(&content)?;
        Ok(settings)
    }

    /// Merge with environment variables (LOGFOLIO_* prefix, plus UPLOAD_DIR)
    pub fn merge_env(&mut self) {
        if let Ok(val) = std::env::var("LOGFOLIO_DEBUG") {
            self.general.debug = val.parse().unwrap_or(false);
        }
        if let Ok(val) = std::env::var("LOGFOLIO_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = std::env::var("LOGFOLIO_BIND_ADDRESS") {
            self.server.bind_address = val;
        }
        if let Ok(val) = std::env::var("UPLOAD_DIR") {
            self.storage.upload_dir = PathBuf::from(val);
        }
        if let Ok(val) = std::env::var("LOGFOLIO_CACHE_DIR") {
            self.storage.cache_dir = Some(PathBuf::from(val));
        }
    }

    /// Get provider config by name
    pub fn get_provider(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| p.name == name)
    }

    /// Get all enabled providers, in configuration order
    pub fn enabled_providers(&self) -> Vec<&ProviderConfig> {
        self.providers.iter().filter(|p| !p.disabled).collect()
    }
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Enable debug logging
    pub debug: bool,
    /// Instance name reported by the root endpoint
    pub instance_name: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            debug: false,
            instance_name: "Logfolio API".to_string(),
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
    /// Log the caller identity of every `/api` request
    pub log_user_id: bool,
    /// Header carrying the caller identity, set by the reverse proxy
    pub user_id_header: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 8000,
            bind_address: "0.0.0.0".to_string(),
            log_user_id: true,
            user_id_header: "X-User-ID".to_string(),
        }
    }
}

/// Search behavior settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Default per-provider timeout in seconds
    pub default_timeout: f64,
    /// Upper bound for any per-provider timeout
    pub max_timeout: f64,
    /// Largest page number accepted by the search endpoint
    pub max_page: u32,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_timeout: 12.0,
            max_timeout: 15.0,
            max_page: 100,
        }
    }
}

/// Outgoing request settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutgoingSettings {
    /// Default request timeout in seconds
    pub request_timeout: f64,
    /// Pool max idle connections per host
    pub pool_maxsize: usize,
    /// Verify SSL certificates
    pub verify_ssl: bool,
    /// Contact string appended to the User-Agent
    pub useragent_suffix: Option<String>,
    /// Proxy settings
    pub proxies: ProxySettings,
    /// Extra headers to send
    pub extra_headers: HashMap<String, String>,
}

impl Default for OutgoingSettings {
    fn default() -> Self {
        Self {
            request_timeout: 12.0,
            pool_maxsize: 10,
            verify_ssl: true,
            useragent_suffix: None,
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

/// Upload storage and derivative cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Directory holding uploaded source images
    pub upload_dir: PathBuf,
    /// Directory for transcoded derivatives (defaults to `<upload_dir>/.webp_cache`)
    pub cache_dir: Option<PathBuf>,
    /// Upper bound for a single decode/encode, in seconds
    pub transcode_timeout: f64,
    /// Number of recently produced derivatives held in memory
    pub inflight_capacity: u64,
    /// How long a produced derivative stays in memory, in seconds
    pub inflight_ttl: u64,
}

impl StorageSettings {
    /// Effective derivative cache directory
    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir
            .clone()
            .unwrap_or_else(|| self.upload_dir.join(".webp_cache"))
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("static/uploads"),
            cache_dir: None,
            transcode_timeout: 30.0,
            inflight_capacity: 64,
            inflight_ttl: 30,
        }
    }
}

/// Individual provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Provider name (unique identifier)
    pub name: String,
    /// Provider module to use
    pub provider: String,
    /// Whether provider is disabled
    pub disabled: bool,
    /// Custom timeout for this provider, in seconds
    pub timeout: Option<f64>,
    /// Results requested per upstream page
    pub page_size: Option<u32>,
    /// Override for the upstream API base URL
    pub api_url: Option<String>,
    /// Outgoing requests allowed per second
    pub rate_limit_per_second: Option<u32>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            provider: String::new(),
            disabled: false,
            timeout: None,
            page_size: None,
            api_url: None,
            rate_limit_per_second: None,
        }
    }
}

/// Default provider configurations, in merge order
fn default_providers() -> Vec<ProviderConfig> {
    vec![
        ProviderConfig {
            name: "bangumi".to_string(),
            provider: "bangumi".to_string(),
            ..Default::default()
        },
        ProviderConfig {
            name: "jikan".to_string(),
            provider: "jikan".to_string(),
            ..Default::default()
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 8000);
        assert!(!settings.general.debug);
        assert_eq!(settings.enabled_providers().len(), 2);
        assert_eq!(settings.providers[0].name, "bangumi");
    }

    #[test]
    fn test_cache_dir_defaults_under_uploads() {
        let storage = StorageSettings {
            upload_dir: PathBuf::from("/srv/uploads"),
            ..Default::default()
        };
        assert_eq!(storage.cache_dir(), PathBuf::from("/srv/uploads/.webp_cache"));
    }

    #[test]
    fn test_partial_yaml() {
        let yaml = r#"
server:
  port: 9000
providers:
  - name: jikan
    provider: jikan
    timeout: 3.5
  - name: bangumi
    provider: bangumi
    disabled: true
"#;
        let settings: Settings = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.server.bind_address, "0.0.0.0");
        assert_eq!(settings.get_provider("jikan").unwrap().timeout, Some(3.5));
        assert_eq!(settings.enabled_providers().len(), 1);
    }
}
