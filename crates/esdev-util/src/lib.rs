#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Shared utilities for esdev.
//!
//! Pure helpers with no logging dependencies: document I/O and the path
//! arithmetic used to turn filesystem locations into browser import paths.

pub mod fs;
pub mod path;
