//! Bare-import resolution for the dev server.
//!
//! The [`ResolveEngine`] trait is the seam between the server's import
//! rewriting and the actual resolution algorithm. [`NodeResolver`] is the
//! bundled implementation.

mod builtins;
mod engine;
mod exports;
mod pkg_json_cache;

pub use builtins::is_builtin;
pub use engine::{NodeResolver, ResolverConfig};
pub use exports::{resolve_package_exports, resolve_package_imports};
pub use pkg_json_cache::{PkgJsonCache, PkgJsonStamp};

use std::path::Path;

/// Result of asking an engine to resolve a specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveIdResult {
    /// Absolute file-system path, or the bare id for externals.
    pub id: String,
    /// The import must be left for the runtime to satisfy.
    pub external: bool,
}

impl ResolveIdResult {
    #[must_use]
    pub fn resolved(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            external: false,
        }
    }

    #[must_use]
    pub fn external(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            external: true,
        }
    }
}

/// A package-resolution engine.
pub trait ResolveEngine: Send + Sync {
    /// One-time startup hook, run before the first `resolve_id`.
    fn build_start(&mut self, _preserve_symlinks: bool) {}

    /// Resolve `source` as imported from the file `importer`.
    ///
    /// `None` means the engine could not find the module.
    fn resolve_id(&self, source: &str, importer: &Path) -> Option<ResolveIdResult>;
}
