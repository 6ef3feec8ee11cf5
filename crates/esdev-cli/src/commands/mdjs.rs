use super::{fail, print_json, EXIT_INTERNAL_ERROR, EXIT_VALIDATION_ERROR};
use esdev_core::mdjs::{compile, CompileOptions, CompiledOutput};
use esdev_core::version::OUTPUT_SCHEMA_VERSION;
use esdev_core::MdjsError;
use esdev_util::fs::{read_document, write_output};
use miette::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A markdown document to compile and where its pieces go.
#[derive(Debug)]
pub struct MdjsAction {
    pub file: PathBuf,
    pub root_node_query_code: Option<String>,
    /// Write the HTML here instead of printing it.
    pub out: Option<PathBuf>,
    /// Write the generated JavaScript here.
    pub js_out: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct MdjsOutput<'a> {
    ok: bool,
    schema_version: u32,
    #[serde(flatten)]
    output: &'a CompiledOutput,
}

pub fn run(cwd: &Path, action: &MdjsAction, json: bool) -> Result<()> {
    let path = cwd.join(&action.file);
    let document = match read_document(&path) {
        Ok(text) => text,
        Err(e) => fail(
            json,
            "DOCUMENT_NOT_FOUND",
            &format!("Failed to read {}: {e}", path.display()),
            EXIT_VALIDATION_ERROR,
        ),
    };

    let mut options = CompileOptions::default();
    if let Some(code) = &action.root_node_query_code {
        options = options.with_root_node_query_code(code.as_str());
    }

    debug!(file = %path.display(), "compiling");
    let output = match compile(&document, &options) {
        Ok(output) => output,
        Err(e) => fail(json, error_code(&e), &e.to_string(), EXIT_INTERNAL_ERROR),
    };
    info!(stories = output.stories.len(), "compiled {}", path.display());

    if let Some(out) = &action.out {
        write_file(json, &cwd.join(out), &output.html);
    }
    if let Some(js_out) = &action.js_out {
        write_file(json, &cwd.join(js_out), &output.js_code);
    }

    if json {
        print_json(&MdjsOutput {
            ok: true,
            schema_version: OUTPUT_SCHEMA_VERSION,
            output: &output,
        })
    } else {
        if action.out.is_none() {
            println!("{}", output.html);
        }
        if action.js_out.is_none() && !output.js_code.is_empty() {
            eprintln!("{} stories; pass --js-out to save the generated code", output.stories.len());
        }
        Ok(())
    }
}

fn write_file(json: bool, path: &Path, contents: &str) {
    if let Err(e) = write_output(path, contents.as_bytes()) {
        fail(
            json,
            "WRITE_FAILED",
            &format!("Failed to write {}: {e}", path.display()),
            EXIT_INTERNAL_ERROR,
        );
    }
    debug!(path = %path.display(), bytes = contents.len(), "wrote output");
}

fn error_code(e: &MdjsError) -> &'static str {
    match e {
        MdjsError::Extraction(_) => "STORY_WITHOUT_EXPORT",
        MdjsError::Stage { .. } => "STAGE_FAILED",
        MdjsError::NoOutput => "NO_OUTPUT",
    }
}
