use super::{fail, print_json, EXIT_INTERNAL_ERROR, EXIT_VALIDATION_ERROR};
use esdev_core::config::{load_config, NodeResolveOptions, NodeResolveSetting, ServerConfig};
use esdev_core::version::OUTPUT_SCHEMA_VERSION;
use esdev_core::{Error, ImportContext, NodeResolvePlugin, PluginContainer, PluginError};
use esdev_util::path::normalize;
use miette::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// What to resolve, and how to set up the resolver for it.
#[derive(Debug)]
pub struct ResolveAction {
    pub specifier: String,
    /// Browser path of the importing file, e.g. `/src/app.js`.
    pub importer: String,
    pub config: Option<PathBuf>,
    pub root: Option<PathBuf>,
    pub browser: bool,
    pub preserve_symlinks: bool,
}

#[derive(Debug, Serialize)]
struct ResolveOutput<'a> {
    ok: bool,
    schema_version: u32,
    specifier: &'a str,
    importer: &'a str,
    resolved: Option<String>,
}

pub fn run(cwd: &Path, action: &ResolveAction, json: bool) -> Result<()> {
    let config = match server_config(cwd, action) {
        Ok(config) => config,
        Err(e) => fail(json, "CONFIG_INVALID", &e.to_string(), EXIT_VALIDATION_ERROR),
    };

    let mut plugins = PluginContainer::new();
    plugins.add(Box::new(NodeResolvePlugin::new()));
    if let Err(e) = plugins.server_start(&config) {
        fail(json, error_code(&e), &e.to_string(), EXIT_INTERNAL_ERROR);
    }

    let ctx = ImportContext::new(action.importer.as_str());
    let resolved = match plugins.resolve_import(&action.specifier, &ctx) {
        Ok(resolved) => resolved,
        Err(e) => fail(json, error_code(&e), &e.to_string(), EXIT_INTERNAL_ERROR),
    };

    if json {
        print_json(&ResolveOutput {
            ok: true,
            schema_version: OUTPUT_SCHEMA_VERSION,
            specifier: &action.specifier,
            importer: &action.importer,
            resolved,
        })
    } else {
        println!("{}", resolved.as_deref().unwrap_or(&action.specifier));
        Ok(())
    }
}

/// Load the project config and apply command-line overrides.
///
/// Node resolution is switched on even when the config leaves it off, since
/// resolving is the whole point of this command.
fn server_config(cwd: &Path, action: &ResolveAction) -> std::result::Result<ServerConfig, Error> {
    let mut config = load_config(cwd, action.config.as_deref())?;

    if let Some(root) = &action.root {
        config.root_dir = normalize(&cwd.join(root));
    }

    let mut opts = config.node_resolve_options().unwrap_or_else(|| {
        debug!("nodeResolve is off in config, using defaults");
        NodeResolveOptions::default()
    });
    opts.browser |= action.browser;
    opts.custom_resolve_options.preserve_symlinks |= action.preserve_symlinks;
    config.node_resolve = NodeResolveSetting::Options(opts);

    Ok(config)
}

fn error_code(e: &PluginError) -> &'static str {
    match e {
        PluginError::Resolution(_) => "RESOLUTION_FAILED",
        PluginError::Hook { .. } => "HOOK_FAILED",
    }
}
