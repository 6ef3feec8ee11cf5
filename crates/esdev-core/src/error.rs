use std::path::PathBuf;
use thiserror::Error;

/// Core error type for esdev operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read config at {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config at {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Config file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Mdjs(#[from] MdjsError),

    #[error(transparent)]
    Plugin(#[from] crate::server::PluginError),

    #[error("{0}")]
    Other(String),
}

impl Error {
    #[must_use]
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}

/// An import specifier the resolution engine could not turn into a file.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Could not resolve import \"{specifier}\" in \"{}\".", importer.display())]
pub struct ResolutionError {
    /// Specifier exactly as written in the import statement.
    pub specifier: String,
    /// Absolute path of the importing file.
    pub importer: PathBuf,
}

/// A `story` / `preview-story` block without any exported binding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("`js {meta}` block has no exported binding to use as story key (starts with `{first_line}`)")]
pub struct ExtractionError {
    /// Block annotation (`story` or `preview-story`).
    pub meta: String,
    /// First non-empty line of the block, for the message.
    pub first_line: String,
}

impl ExtractionError {
    #[must_use]
    pub fn new(meta: &str, code: &str) -> Self {
        let first_line = code
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or_default()
            .to_string();
        Self {
            meta: meta.to_string(),
            first_line,
        }
    }
}

/// Errors from the mdjs markdown compiler.
#[derive(Error, Debug)]
pub enum MdjsError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("stage `{stage}` failed: {message}")]
    Stage { stage: String, message: String },

    #[error("pipeline finished without output; no serializing stage ran")]
    NoOutput,
}

impl MdjsError {
    #[must_use]
    pub fn stage(stage: &str, message: impl Into<String>) -> Self {
        Self::Stage {
            stage: stage.to_string(),
            message: message.into(),
        }
    }

    /// Attribute an anonymous stage error to the pipeline entry `name`.
    #[must_use]
    pub fn in_stage(self, name: &str) -> Self {
        match self {
            Self::Stage { stage, message } if stage.is_empty() => Self::Stage {
                stage: name.to_string(),
                message,
            },
            other => other,
        }
    }
}
