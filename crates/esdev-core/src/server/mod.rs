//! Dev server plugin layer.
//!
//! Only the import-resolution side of a dev server lives here: plugins get a
//! `server_start` hook with the project config and a `resolve_import` hook
//! that may rewrite each import specifier a served module contains.

mod node_resolve;
mod plugin;

pub use node_resolve::{EngineFactory, NodeResolvePlugin};
pub use plugin::{HookResult, ImportContext, Plugin, PluginContainer, PluginError};
