//! Plugin trait and container.

use crate::config::ServerConfig;
use crate::error::ResolutionError;
use thiserror::Error;
use tracing::trace;

/// Result type for plugin hooks.
pub type HookResult<T> = Result<T, PluginError>;

/// Error from a plugin hook.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PluginError {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error("[{plugin}] {hook}: {message}")]
    Hook {
        /// Plugin name that caused the error.
        plugin: String,
        /// Hook that failed.
        hook: &'static str,
        message: String,
    },
}

impl PluginError {
    #[must_use]
    pub fn hook(plugin: &str, hook: &'static str, message: impl Into<String>) -> Self {
        Self::Hook {
            plugin: plugin.to_string(),
            hook,
            message: message.into(),
        }
    }

    /// A hook that needs `server_start` ran before it.
    #[must_use]
    pub fn not_started(plugin: &str, hook: &'static str) -> Self {
        Self::hook(plugin, hook, "server not started")
    }
}

/// Where an import was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportContext {
    /// Browser path of the importing module, e.g. `/src/app.js`.
    pub path: String,
}

impl ImportContext {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

/// A dev server plugin.
pub trait Plugin: Send + Sync {
    /// Plugin name for debugging and error messages.
    fn name(&self) -> &str;

    /// Called once when the server starts, before any import is resolved.
    fn server_start(&mut self, _config: &ServerConfig) -> HookResult<()> {
        Ok(())
    }

    /// Rewrite an import specifier.
    ///
    /// Return `Some(specifier)` to handle the import, or `None` to let the
    /// next plugin handle it.
    fn resolve_import(&self, _source: &str, _ctx: &ImportContext) -> HookResult<Option<String>> {
        Ok(None)
    }
}

/// Ordered set of plugins; the first answer to a hook wins.
#[derive(Default)]
pub struct PluginContainer {
    plugins: Vec<Box<dyn Plugin>>,
}

impl PluginContainer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, plugin: Box<dyn Plugin>) {
        self.plugins.push(plugin);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Call `server_start` on all plugins, in order.
    pub fn server_start(&mut self, config: &ServerConfig) -> HookResult<()> {
        for plugin in &mut self.plugins {
            trace!(plugin = plugin.name(), "server_start");
            plugin.server_start(config)?;
        }
        Ok(())
    }

    /// Resolve an import through plugins.
    /// Returns None if no plugin handled it.
    pub fn resolve_import(&self, source: &str, ctx: &ImportContext) -> HookResult<Option<String>> {
        for plugin in &self.plugins {
            if let Some(resolved) = plugin.resolve_import(source, ctx)? {
                trace!(plugin = plugin.name(), source, resolved = %resolved, "import resolved");
                return Ok(Some(resolved));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Prefix(&'static str, &'static str);

    impl Plugin for Prefix {
        fn name(&self) -> &str {
            "prefix"
        }

        fn resolve_import(&self, source: &str, _ctx: &ImportContext) -> HookResult<Option<String>> {
            Ok(source
                .starts_with(self.0)
                .then(|| format!("{}{source}", self.1)))
        }
    }

    struct Failing;

    impl Plugin for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn server_start(&mut self, _config: &ServerConfig) -> HookResult<()> {
            Err(PluginError::hook(self.name(), "server_start", "boom"))
        }
    }

    #[test]
    fn test_first_answer_wins() {
        let mut container = PluginContainer::new();
        container.add(Box::new(Prefix("a", "/first/")));
        container.add(Box::new(Prefix("ab", "/second/")));

        let ctx = ImportContext::new("/index.js");
        assert_eq!(
            container.resolve_import("abc", &ctx).unwrap(),
            Some("/first/abc".to_string())
        );
        assert_eq!(container.resolve_import("zzz", &ctx).unwrap(), None);
        assert_eq!(container.len(), 2);
    }

    #[test]
    fn test_server_start_propagates_errors() {
        let mut container = PluginContainer::new();
        container.add(Box::new(Failing));

        let err = container
            .server_start(&ServerConfig::new("/srv"))
            .unwrap_err();
        assert_eq!(err.to_string(), "[failing] server_start: boom");
    }
}
