//! Configuration for esdev.
//!
//! Two layers live here: the runtime [`Config`] the CLI builds from its flags,
//! and the project [`ServerConfig`] read from `esdev.config.json`.
//!
//! ```json
//! {
//!   "rootDir": ".",
//!   "fileExtensions": [".js", ".mjs"],
//!   "nodeResolve": { "browser": true, "customResolveOptions": { "preserveSymlinks": true } }
//! }
//! ```

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file names in priority order.
const CONFIG_FILES: &[&str] = &["esdev.config.json", ".esdevrc.json"];

/// Extensions the dev server serves as scripts when none are configured.
pub const DEFAULT_FILE_EXTENSIONS: &[&str] = &[".mjs", ".js"];

/// Runtime configuration for the esdev CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Current working directory.
    pub cwd: PathBuf,

    /// Whether to emit JSON logs.
    pub json_logs: bool,

    /// Verbosity level (0 = INFO, 1 = DEBUG, 2+ = TRACE).
    pub verbosity: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cwd: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            json_logs: false,
            verbosity: 0,
        }
    }
}

impl Config {
    #[must_use]
    pub fn new(cwd: PathBuf) -> Self {
        Self {
            cwd,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    #[must_use]
    pub fn with_json_logs(mut self, json: bool) -> Self {
        self.json_logs = json;
        self
    }
}

/// Dev server project configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    /// Directory served as `/`.
    pub root_dir: PathBuf,
    /// Extensions treated as browser-loadable scripts.
    pub file_extensions: Vec<String>,
    /// `true`, `false`, or an options object for the node resolver.
    pub node_resolve: NodeResolveSetting,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("."),
            file_extensions: DEFAULT_FILE_EXTENSIONS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            node_resolve: NodeResolveSetting::default(),
        }
    }
}

impl ServerConfig {
    /// Config rooted at `root` with every other field defaulted.
    #[must_use]
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            ..Default::default()
        }
    }

    /// The resolver options, if node resolution is enabled at all.
    #[must_use]
    pub fn node_resolve_options(&self) -> Option<NodeResolveOptions> {
        match &self.node_resolve {
            NodeResolveSetting::Enabled(false) => None,
            NodeResolveSetting::Enabled(true) => Some(NodeResolveOptions::default()),
            NodeResolveSetting::Options(opts) => Some(opts.clone()),
        }
    }
}

/// The `nodeResolve` key accepts a flag or a full options object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeResolveSetting {
    Enabled(bool),
    Options(NodeResolveOptions),
}

impl Default for NodeResolveSetting {
    fn default() -> Self {
        Self::Enabled(false)
    }
}

/// Options passed through to the node resolution engine.
///
/// Unset fields fall back to what the dev server itself knows (root dir,
/// file extensions) or to the engine defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodeResolveOptions {
    /// Overrides the server root for resolution.
    pub root_dir: Option<PathBuf>,
    /// Overrides the server file extensions for probing.
    pub extensions: Option<Vec<String>>,
    /// Treat Node builtins (`fs`, `path`, ...) as external instead of looking
    /// for polyfills in `node_modules`.
    pub prefer_builtins: Option<bool>,
    /// Honor the package.json `browser` field and `browser` export condition.
    pub browser: bool,
    /// package.json fields consulted for the entry point, in order.
    pub main_fields: Vec<String>,
    /// Directory names searched for bare specifiers.
    pub module_directories: Vec<String>,
    /// Extra `exports` conditions, checked before the defaults.
    pub export_conditions: Vec<String>,
    pub custom_resolve_options: CustomResolveOptions,
}

impl Default for NodeResolveOptions {
    fn default() -> Self {
        Self {
            root_dir: None,
            extensions: None,
            prefer_builtins: None,
            browser: false,
            main_fields: vec!["module".to_string(), "main".to_string()],
            module_directories: vec!["node_modules".to_string()],
            export_conditions: Vec::new(),
            custom_resolve_options: CustomResolveOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomResolveOptions {
    /// Keep symlinked paths instead of resolving to their real location.
    pub preserve_symlinks: bool,
}

/// Find a config file in the given root directory.
#[must_use]
pub fn find_config_file(root: &Path) -> Option<PathBuf> {
    CONFIG_FILES
        .iter()
        .map(|name| root.join(name))
        .find(|path| path.is_file())
}

/// Load the server configuration for `root`.
///
/// With `config_path` set, that file must exist. Otherwise the first known
/// config file in `root` is used, and defaults apply when there is none. A
/// relative `rootDir` is taken relative to the directory holding the file.
pub fn load_config(root: &Path, config_path: Option<&Path>) -> Result<ServerConfig, Error> {
    let path = match config_path {
        Some(p) => {
            let abs = if p.is_absolute() {
                p.to_path_buf()
            } else {
                root.join(p)
            };
            if !abs.is_file() {
                return Err(Error::ConfigNotFound { path: abs });
            }
            abs
        }
        None => match find_config_file(root) {
            Some(p) => p,
            None => return Ok(ServerConfig::new(root)),
        },
    };

    let source = std::fs::read_to_string(&path).map_err(|source| Error::ConfigRead {
        path: path.clone(),
        source,
    })?;
    let mut config: ServerConfig =
        serde_json::from_str(&source).map_err(|source| Error::ConfigParse {
            path: path.clone(),
            source,
        })?;

    if config.root_dir.is_relative() {
        let base = path.parent().unwrap_or(root);
        config.root_dir = esdev_util::path::normalize(&base.join(&config.root_dir));
    }

    Ok(config)
}
