//! Provider registry for the configured cover search providers

use super::traits::Provider;
use crate::config::ProviderConfig;
use crate::search::{KindFilter, ProviderFilter};
use std::sync::Arc;

/// Registry of loaded providers.
///
/// Providers keep their registration order, which is also the order their
/// results appear in an aggregated response.
pub struct ProviderRegistry {
    entries: Vec<(Arc<dyn Provider>, ProviderConfig)>,
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register a provider, replacing any earlier one with the same name
    pub fn register(&mut self, provider: Arc<dyn Provider>, config: ProviderConfig) {
        let name = provider.name().to_string();
        if let Some(slot) = self.entries.iter_mut().find(|(p, _)| p.name() == name) {
            *slot = (provider, config);
        } else {
            self.entries.push((provider, config));
        }
    }

    /// Get a provider by name
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Provider>> {
        self.entries
            .iter()
            .find(|(p, _)| p.name() == name)
            .map(|(p, _)| p)
    }

    /// Get provider config
    pub fn get_config(&self, name: &str) -> Option<&ProviderConfig> {
        self.entries
            .iter()
            .find(|(p, _)| p.name() == name)
            .map(|(_, c)| c)
    }

    /// Providers in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Provider>> {
        self.entries.iter().map(|(p, _)| p)
    }

    /// Providers that should be consulted for a search, in registration order
    pub fn selected(&self, kinds: KindFilter, providers: ProviderFilter) -> Vec<Arc<dyn Provider>> {
        self.iter()
            .filter(|p| providers.matches(p.name()))
            .filter(|p| p.supports(kinds))
            .cloned()
            .collect()
    }

    /// Get all provider names
    pub fn names(&self) -> Vec<&str> {
        self.iter().map(|p| p.name()).collect()
    }

    /// Check if a provider exists
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Get number of registered providers
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get effective timeout for a provider
    pub fn get_timeout(&self, name: &str, default: f64) -> f64 {
        self.get_config(name)
            .and_then(|c| c.timeout)
            .or_else(|| self.get(name).map(|p| p.timeout()))
            .unwrap_or(default)
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::bangumi::Bangumi;
    use crate::providers::jikan::Jikan;

    fn config(name: &str) -> ProviderConfig {
        ProviderConfig {
            name: name.to_string(),
            provider: name.to_string(),
            ..Default::default()
        }
    }

    fn registry() -> ProviderRegistry {
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(Bangumi::new()), config("bangumi"));
        registry.register(Arc::new(Jikan::new()), config("jikan"));
        registry
    }

    #[test]
    fn test_registry_keeps_order() {
        let registry = registry();
        assert_eq!(registry.names(), vec!["bangumi", "jikan"]);
        assert!(registry.contains("jikan"));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_selected_by_kind_and_provider() {
        let registry = registry();

        let all: Vec<_> = registry
            .selected(KindFilter::AnimeOrManga, ProviderFilter::Any)
            .iter()
            .map(|p| p.name().to_string())
            .collect();
        assert_eq!(all, vec!["bangumi", "jikan"]);

        let games = registry.selected(KindFilter::Game, ProviderFilter::Any);
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].name(), "bangumi");

        assert!(registry
            .selected(KindFilter::Game, ProviderFilter::Jikan)
            .is_empty());
    }

    #[test]
    fn test_timeout_override() {
        let mut registry = registry();
        registry.register(
            Arc::new(Jikan::new()),
            ProviderConfig {
                timeout: Some(2.5),
                ..config("jikan")
            },
        );
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get_timeout("jikan", 12.0), 2.5);
        assert_eq!(registry.get_timeout("bangumi", 9.0), 12.0);
        assert_eq!(registry.get_timeout("missing", 9.0), 9.0);
    }
}
