//! Lightweight static analysis of JavaScript module source.
//!
//! Provides a scanner for exported binding names, used to key story blocks.

mod scan;

pub use scan::{first_export, has_tagged_template, scan_exports, ExportKind, ExportSpec};
