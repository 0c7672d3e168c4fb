//! Plugin registration table.
//!
//! Plugins are registered by name under one of two extension points,
//! checkers and formatters, as zero-argument factories. Nothing is
//! instantiated until [`Registry::discover`] runs, once per process.

use crate::plugin::{Plugin, PluginError};
use crate::plugins;
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Minimum Jaro-Winkler similarity for a "did you mean" suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.8;

/// Extension point a plugin is registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Checker,
    Formatter,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Checker => "checkers",
            Category::Formatter => "formatters",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Zero-argument plugin constructor.
pub type PluginFactory = Box<dyn Fn() -> Result<Plugin, PluginError>>;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("{category} plugin '{name}' is already registered")]
    Duplicate { category: Category, name: String },
}

/// A factory failed while plugins were being discovered.
#[derive(Error, Debug)]
#[error("failed to instantiate {category} plugin '{name}': {source}")]
pub struct DiscoveryError {
    pub category: Category,
    pub name: String,
    #[source]
    pub source: PluginError,
}

/// A name passed to [`Registry::disable`] that matches no registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownName {
    pub name: String,
    /// Closest registered name, if any is similar enough
    pub suggestion: Option<String>,
}

struct Entry {
    category: Category,
    name: String,
    factory: PluginFactory,
}

#[derive(Default)]
pub struct Registry {
    entries: Vec<Entry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the plugins shipped with the crate.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.push(
            Category::Formatter,
            plugins::json::NAME,
            Box::new(plugins::json_formatter),
        );
        registry.push(
            Category::Checker,
            plugins::toml::NAME,
            Box::new(plugins::toml_checker),
        );
        registry
    }

    /// Register a named factory. Names are unique within a category.
    pub fn register<F>(
        &mut self,
        category: Category,
        name: impl Into<String>,
        factory: F,
    ) -> Result<(), RegistryError>
    where
        F: Fn() -> Result<Plugin, PluginError> + 'static,
    {
        let name = name.into();
        if self
            .entries
            .iter()
            .any(|entry| entry.category == category && entry.name == name)
        {
            return Err(RegistryError::Duplicate { category, name });
        }
        self.push(category, name, Box::new(factory));
        Ok(())
    }

    fn push(&mut self, category: Category, name: impl Into<String>, factory: PluginFactory) {
        self.entries.push(Entry {
            category,
            name: name.into(),
            factory,
        });
    }

    /// Registered plugins in discovery order.
    pub fn names(&self) -> impl Iterator<Item = (Category, &str)> {
        self.ordered().map(|entry| (entry.category, entry.name.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove every registration whose name is listed, in any category.
    ///
    /// Returns the names that matched nothing.
    pub fn disable(&mut self, names: &[String]) -> Vec<UnknownName> {
        let unknown = names
            .iter()
            .filter(|name| !self.entries.iter().any(|entry| &entry.name == *name))
            .map(|name| UnknownName {
                name: name.clone(),
                suggestion: self.suggest(name),
            })
            .collect();

        self.entries.retain(|entry| {
            let keep = !names.contains(&entry.name);
            if !keep {
                debug!("Disabled {} plugin {}", entry.category, entry.name);
            }
            keep
        });
        unknown
    }

    fn suggest(&self, name: &str) -> Option<String> {
        self.entries
            .iter()
            .map(|entry| (strsim::jaro_winkler(name, &entry.name), &entry.name))
            .filter(|(score, _)| *score >= SUGGESTION_THRESHOLD)
            .max_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, name)| name.clone())
    }

    /// Instantiate every registered plugin.
    ///
    /// Checkers come first, then formatters, each in registration order. The
    /// first failing factory aborts discovery.
    pub fn discover(&self) -> Result<Vec<Plugin>, DiscoveryError> {
        let mut plugins = Vec::with_capacity(self.entries.len());
        for entry in self.ordered() {
            let plugin = (entry.factory)().map_err(|source| DiscoveryError {
                category: entry.category,
                name: entry.name.clone(),
                source,
            })?;
            debug!("Discovered {} plugin {}", entry.category, entry.name);
            plugins.push(plugin);
        }
        Ok(plugins)
    }

    fn ordered(&self) -> impl Iterator<Item = &Entry> {
        [Category::Checker, Category::Formatter]
            .into_iter()
            .flat_map(move |category| {
                self.entries
                    .iter()
                    .filter(move |entry| entry.category == category)
            })
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry_discovers_shipped_plugins() {
        let registry = Registry::builtin();
        let names: Vec<_> = registry.names().collect();
        assert_eq!(
            names,
            vec![(Category::Checker, "toml"), (Category::Formatter, "json")]
        );

        let plugins = registry.discover().unwrap();
        assert_eq!(plugins.len(), 2);
        assert!(!plugins[0].can_fix());
        assert!(plugins[1].can_fix());
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let mut registry = Registry::builtin();
        let result = registry.register(Category::Formatter, "json", plugins::json_formatter);
        assert!(matches!(result, Err(RegistryError::Duplicate { .. })));

        // Same name in the other category is a different registration
        registry
            .register(Category::Checker, "json", plugins::json_formatter)
            .unwrap();
    }

    #[test]
    fn test_failing_factory_aborts_discovery() {
        let mut registry = Registry::builtin();
        registry
            .register(Category::Formatter, "broken", || {
                Err(PluginError::Init("missing backend".to_string()))
            })
            .unwrap();

        let err = registry.discover().unwrap_err();
        assert_eq!(err.name, "broken");
        assert_eq!(err.category, Category::Formatter);
        assert!(err.to_string().contains("missing backend"));
    }

    #[test]
    fn test_empty_registry_discovers_nothing() {
        let registry = Registry::new();
        assert!(registry.is_empty());
        assert!(registry.discover().unwrap().is_empty());
    }

    #[test]
    fn test_disable_removes_and_suggests() {
        let mut registry = Registry::builtin();
        let unknown = registry.disable(&["toml".to_string(), "jsn".to_string()]);

        assert_eq!(
            unknown,
            vec![UnknownName {
                name: "jsn".to_string(),
                suggestion: Some("json".to_string()),
            }]
        );
        let names: Vec<_> = registry.names().collect();
        assert_eq!(names, vec![(Category::Formatter, "json")]);
    }

    #[test]
    fn test_disable_without_close_match() {
        let mut registry = Registry::builtin();
        let unknown = registry.disable(&["yaml".to_string()]);
        assert_eq!(unknown[0].suggestion, None);
        assert_eq!(registry.names().count(), 2);
    }
}
