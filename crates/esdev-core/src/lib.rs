#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::return_self_not_must_use)]

//! Core library for esdev: bare-import resolution for a browser dev server
//! and the mdjs markdown-with-stories compiler.

pub mod config;
pub mod error;
pub mod highlight;
pub mod lexer;
pub mod mdjs;
pub mod resolver;
pub mod server;
pub mod version;

pub use config::{Config, NodeResolveOptions, ServerConfig};
pub use error::{Error, ExtractionError, MdjsError, ResolutionError};
pub use mdjs::{compile, CompileOptions, CompiledOutput, Story, StoryKind};
pub use resolver::{NodeResolver, ResolveEngine, ResolveIdResult, ResolverConfig};
pub use server::{ImportContext, NodeResolvePlugin, Plugin, PluginContainer, PluginError};
pub use version::VERSION;
