//! Provider loader for initializing providers from configuration

use super::registry::ProviderRegistry;
use super::traits::Provider;
use super::{bangumi, jikan};
use crate::config::{ProviderConfig, Settings};
use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

/// Loader for initializing providers from configuration
pub struct ProviderLoader;

impl ProviderLoader {
    /// Load all enabled providers from settings, in configuration order
    pub fn load(settings: &Settings) -> Result<ProviderRegistry> {
        let mut registry = ProviderRegistry::new();

        for config in settings.enabled_providers() {
            match Self::create_provider(&config.provider, config) {
                Ok(provider) => {
                    info!("Loaded provider: {} ({})", config.name, config.provider);
                    registry.register(provider, config.clone());
                }
                Err(e) => {
                    warn!("Failed to load provider {}: {}", config.name, e);
                }
            }
        }

        info!("Loaded {} providers", registry.len());
        Ok(registry)
    }

    /// Create a provider instance by type
    fn create_provider(provider_type: &str, config: &ProviderConfig) -> Result<Arc<dyn Provider>> {
        let mut provider: Box<dyn Provider> = match provider_type {
            "bangumi" => Box::new(bangumi::Bangumi::new()),
            "jikan" => Box::new(jikan::Jikan::new()),
            _ => {
                return Err(anyhow::anyhow!("Unknown provider type: {}", provider_type));
            }
        };

        provider.init(config)?;

        Ok(Arc::from(provider))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_defaults() {
        let registry = ProviderLoader::load(&Settings::default()).unwrap();
        assert_eq!(registry.names(), vec!["bangumi", "jikan"]);
    }

    #[test]
    fn test_skips_disabled_unknown_and_invalid() {
        let mut settings = Settings::default();
        settings.providers[0].disabled = true;
        settings.providers.push(ProviderConfig {
            name: "anilist".to_string(),
            provider: "anilist".to_string(),
            ..Default::default()
        });
        settings.providers[1].page_size = Some(500);

        let registry = ProviderLoader::load(&settings).unwrap();
        assert!(registry.is_empty());
    }
}
