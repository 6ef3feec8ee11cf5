//! Bare import resolution for served modules.
//!
//! Browsers cannot load `import 'lit-html'`, so every bare specifier is handed
//! to a [`ResolveEngine`] and rewritten to a path relative to the importing
//! module: `lit-html` in `/src/app.js` becomes `../node_modules/lit-html/lit-html.js`.

use super::plugin::{HookResult, ImportContext, Plugin, PluginError};
use crate::config::ServerConfig;
use crate::error::ResolutionError;
use crate::resolver::{NodeResolver, ResolveEngine, ResolverConfig};
use esdev_util::path::{normalize, relative_path, to_browser_path};
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;

const PLUGIN_NAME: &str = "node-resolve";

/// Builds the engine once the server config is known.
pub type EngineFactory = Box<dyn Fn(ResolverConfig) -> Box<dyn ResolveEngine> + Send + Sync>;

/// State captured by `server_start`.
struct Started {
    root_dir: PathBuf,
    file_extensions: Vec<String>,
    engine: Box<dyn ResolveEngine>,
}

/// Rewrites bare imports to browser-relative paths.
pub struct NodeResolvePlugin {
    factory: EngineFactory,
    started: Option<Started>,
}

impl NodeResolvePlugin {
    /// Plugin backed by [`NodeResolver`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_engine_factory(Box::new(|config| Box::new(NodeResolver::new(config))))
    }

    #[must_use]
    pub fn with_engine_factory(factory: EngineFactory) -> Self {
        Self {
            factory,
            started: None,
        }
    }

    fn started(&self, hook: &'static str) -> HookResult<&Started> {
        self.started
            .as_ref()
            .ok_or_else(|| PluginError::not_started(PLUGIN_NAME, hook))
    }
}

impl Default for NodeResolvePlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for NodeResolvePlugin {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn server_start(&mut self, config: &ServerConfig) -> HookResult<()> {
        let root_dir = if config.root_dir.is_absolute() {
            normalize(&config.root_dir)
        } else {
            let cwd = std::env::current_dir()
                .map_err(|e| PluginError::hook(PLUGIN_NAME, "server_start", e.to_string()))?;
            normalize(&cwd.join(&config.root_dir))
        };

        let opts = config.node_resolve_options().unwrap_or_default();
        let resolver_config = ResolverConfig::from_options(&root_dir, &config.file_extensions, &opts);
        debug!(
            root = %root_dir.display(),
            extensions = ?resolver_config.extensions,
            preserve_symlinks = opts.custom_resolve_options.preserve_symlinks,
            "starting node resolution"
        );

        let mut engine = (self.factory)(resolver_config);
        engine.build_start(opts.custom_resolve_options.preserve_symlinks);

        self.started = Some(Started {
            root_dir,
            file_extensions: config.file_extensions.clone(),
            engine,
        });
        Ok(())
    }

    fn resolve_import(&self, source: &str, ctx: &ImportContext) -> HookResult<Option<String>> {
        let started = self.started("resolve_import")?;

        if Url::parse(source).is_ok() {
            return Ok(Some(source.to_string()));
        }

        let (rest, fragment) = source.split_once('#').unwrap_or((source, ""));
        let (path, query) = rest.split_once('?').unwrap_or((rest, ""));

        if (path.starts_with('.') || path.starts_with('/'))
            && has_extension_in(path, &started.file_extensions)
        {
            return Ok(Some(source.to_string()));
        }

        let importer = importer_file(&started.root_dir, &ctx.path)?;
        let resolved = started
            .engine
            .resolve_id(path, &importer)
            .filter(|r| !r.external && !r.id.is_empty())
            .ok_or_else(|| ResolutionError {
                specifier: source.to_string(),
                importer: importer.clone(),
            })?;

        let from_dir = importer.parent().unwrap_or(&started.root_dir);
        let mut out = to_browser_path(&relative_path(from_dir, Path::new(&resolved.id)));
        if !query.is_empty() {
            out.push('?');
            out.push_str(query);
        }
        if !fragment.is_empty() {
            out.push('#');
            out.push_str(fragment);
        }
        if !out.starts_with('/') && !out.starts_with('.') {
            out.insert_str(0, "./");
        }

        debug!(source, importer = %importer.display(), resolved = %out, "resolved bare import");
        Ok(Some(out))
    }
}

fn has_extension_in(path: &str, extensions: &[String]) -> bool {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.iter().any(|x| x.strip_prefix('.') == Some(ext)))
}

/// The file a browser path points at, under `root`.
fn importer_file(root: &Path, browser_path: &str) -> HookResult<PathBuf> {
    let invalid = |what: &str| {
        PluginError::hook(
            PLUGIN_NAME,
            "resolve_import",
            format!("cannot map importer path `{browser_path}` under {}: {what}", root.display()),
        )
    };

    let base = Url::from_directory_path(root).map_err(|()| invalid("root is not absolute"))?;
    let url = base
        .join(&format!(".{browser_path}"))
        .map_err(|e| invalid(&e.to_string()))?;
    url.to_file_path().map_err(|()| invalid("not a file URL"))
}
