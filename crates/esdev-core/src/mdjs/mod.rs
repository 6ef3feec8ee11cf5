//! Markdown with live JavaScript stories.
//!
//! [`compile`] runs a markdown document through an ordered pipeline of named
//! stages and returns the rendered HTML plus the JavaScript that registers
//! each story with its placeholder element:
//!
//! ````markdown
//! # Button
//!
//! ```js story
//! export const primary = () => html`<my-button primary></my-button>`;
//! ```
//! ````
//!
//! Story code is highlighted by a second, reduced pipeline built from the
//! stages named in [`SECONDARY_STAGES`].

pub mod hast;
mod pipeline;
pub mod stages;

pub use pipeline::{FileData, MdEvent, Pipeline, PipelineStage, Stage, Tree, VFile};

use crate::error::MdjsError;
use serde::Serialize;
use stages::{
    AutolinkStage, HighlightStage, MarkdownStage, RawStage, ScriptStage, SlugStage, StoryStage,
    StringifyStage, ToHastStage,
};
use tracing::debug;

/// Stages reused to highlight story code.
pub const SECONDARY_STAGES: &[&str] = &["markdown", "remark-to-rehype", "highlight", "stringify"];

/// How a story renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoryKind {
    /// Story code is plain JavaScript.
    Js,
    /// Story returns an `html` tagged template.
    Html,
}

impl StoryKind {
    #[must_use]
    pub fn fence_language(self) -> &'static str {
        match self {
            Self::Js => "js",
            Self::Html => "html",
        }
    }
}

/// A story block found in the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Story {
    /// First exported binding of the block.
    pub key: String,
    pub name: String,
    /// Block text as written.
    pub code: String,
    #[serde(rename = "type")]
    pub kind: StoryKind,
}

impl Story {
    /// The code shown for the story. For `html` stories only the first
    /// template literal body is shown, or the whole code without one.
    #[must_use]
    pub fn display_code(&self) -> &str {
        match self.kind {
            StoryKind::Js => &self.code,
            StoryKind::Html => self.code.split('`').nth(1).unwrap_or(&self.code),
        }
    }
}

/// Compiler options.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Expression the generated code uses to find placeholders.
    pub root_node_query_code: String,
    pub stages: Vec<PipelineStage>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            root_node_query_code: "document".to_string(),
            stages: default_stages(),
        }
    }
}

impl CompileOptions {
    #[must_use]
    pub fn with_root_node_query_code(mut self, code: impl Into<String>) -> Self {
        self.root_node_query_code = code.into();
        self
    }

    #[must_use]
    pub fn with_stages(mut self, stages: Vec<PipelineStage>) -> Self {
        self.stages = stages;
        self
    }
}

/// Compiler result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledOutput {
    pub stories: Vec<Story>,
    /// Script blocks, story code and story registration. Empty without stories.
    pub js_code: String,
    pub html: String,
}

/// The standard stage list.
#[must_use]
pub fn default_stages() -> Vec<PipelineStage> {
    vec![
        PipelineStage::new("markdown", MarkdownStage::default()),
        PipelineStage::new("mdjs-parse", ScriptStage),
        PipelineStage::new("mdjs-story-parse", StoryStage::default()),
        PipelineStage::new("remark-to-rehype", ToHastStage::allow_dangerous_html()),
        PipelineStage::new("highlight", HighlightStage),
        PipelineStage::new("raw", RawStage),
        PipelineStage::new("slug", SlugStage),
        PipelineStage::new("autolink-headings", AutolinkStage::default()),
        PipelineStage::new("stringify", StringifyStage),
    ]
}

/// Compile a markdown document.
pub fn compile(document: &str, options: &CompileOptions) -> Result<CompiledOutput, MdjsError> {
    let pipeline = Pipeline::new(options.stages.clone());
    let file = pipeline.process(document)?;
    let html = file.contents.ok_or(MdjsError::NoOutput)?;
    let FileData { stories, js_code } = file.data;
    debug!(stories = stories.len(), html_bytes = html.len(), "document compiled");

    if stories.is_empty() {
        return Ok(CompiledOutput {
            stories,
            js_code: String::new(),
            html,
        });
    }

    let code_pipeline = pipeline.only(SECONDARY_STAGES);
    let entries = stories
        .iter()
        .map(|story| story_entry(&code_pipeline, story))
        .collect::<Result<Vec<_>, _>>()?;

    let js_code = registration_code(&js_code, &stories, &entries, &options.root_node_query_code);
    Ok(CompiledOutput {
        stories,
        js_code,
        html,
    })
}

/// `{ key: 'KEY', story: KEY, code: `HIGHLIGHTED` }` for one story.
fn story_entry(pipeline: &Pipeline, story: &Story) -> Result<String, MdjsError> {
    let fenced = format!(
        "```{}\n{}\n```",
        story.kind.fence_language(),
        story.display_code()
    );
    let highlighted = pipeline
        .process(&fenced)?
        .contents
        .ok_or(MdjsError::NoOutput)?;

    Ok(format!(
        "{{ key: '{key}', story: {key}, code: `{code}` }}",
        key = story.key,
        code = escape_template_literal(&highlighted),
    ))
}

/// Escape text for a JavaScript template literal.
fn escape_template_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '`' | '$') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn registration_code(
    script_code: &str,
    stories: &[Story],
    entries: &[String],
    root_node_query_code: &str,
) -> String {
    let stories_code = stories
        .iter()
        .map(|s| s.code.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    [
        script_code.to_string(),
        stories_code,
        format!("const rootNode = {root_node_query_code};"),
        format!("const stories = [{}];", entries.join(", ")),
        "for (const story of stories) {".to_string(),
        "  const storyEl = rootNode.querySelector(`[mdjs-story-name=\"${story.key}\"]`);".to_string(),
        "  storyEl.codeHasHtml = true;".to_string(),
        "  storyEl.story = story.story;".to_string(),
        "  storyEl.code = story.code;".to_string(),
        "};".to_string(),
    ]
    .join("\n")
}
