//! Ordered stage pipeline over a document tree.
//!
//! A run starts from [`Tree::Pending`] with the document text in
//! [`VFile::value`]; a parsing stage turns it into markdown events, a
//! conversion stage into an HTML tree, and a serializing stage writes
//! [`VFile::contents`]. Each stage checks the tree shape it receives, so a
//! misordered pipeline fails instead of silently skipping work.

use super::hast::Node;
use super::Story;
use crate::error::MdjsError;
use pulldown_cmark::Event;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Owned markdown event.
pub type MdEvent = Event<'static>;

/// The document as it moves through the pipeline.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Tree {
    /// Nothing parsed yet; the source is in [`VFile::value`].
    #[default]
    Pending,
    Markdown(Vec<MdEvent>),
    Html(Vec<Node>),
}

impl Tree {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Pending => "unparsed",
            Self::Markdown(_) => "markdown",
            Self::Html(_) => "html",
        }
    }

    /// The markdown events, or a stage error naming the shape found instead.
    pub fn into_markdown(self) -> Result<Vec<MdEvent>, MdjsError> {
        match self {
            Self::Markdown(events) => Ok(events),
            other => Err(shape_error("markdown", &other)),
        }
    }

    /// The HTML tree, or a stage error naming the shape found instead.
    pub fn into_html(self) -> Result<Vec<Node>, MdjsError> {
        match self {
            Self::Html(nodes) => Ok(nodes),
            other => Err(shape_error("html", &other)),
        }
    }
}

fn shape_error(expected: &str, found: &Tree) -> MdjsError {
    MdjsError::stage(
        "",
        format!("expected a {expected} tree, found {}", found.kind()),
    )
}

/// Data stages share outside the tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileData {
    /// Story blocks, in document order.
    pub stories: Vec<Story>,
    /// Text of `js script` blocks, joined by newlines.
    pub js_code: String,
}

/// One document and its side channel for the length of a run.
#[derive(Debug, Clone, Default)]
pub struct VFile {
    /// Input text.
    pub value: String,
    /// Serialized output, written by the serializing stage.
    pub contents: Option<String>,
    pub data: FileData,
}

impl VFile {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..Default::default()
        }
    }
}

/// A parse, transform or render step.
pub trait Stage: Send + Sync {
    fn run(&self, tree: Tree, file: &mut VFile) -> Result<Tree, MdjsError>;
}

/// A named stage; the name is how the secondary pass picks stages.
#[derive(Clone)]
pub struct PipelineStage {
    pub name: String,
    pub stage: Arc<dyn Stage>,
}

impl PipelineStage {
    pub fn new(name: impl Into<String>, stage: impl Stage + 'static) -> Self {
        Self {
            name: name.into(),
            stage: Arc::new(stage),
        }
    }
}

impl fmt::Debug for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineStage")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Stages chained in order.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    stages: Vec<PipelineStage>,
}

impl Pipeline {
    #[must_use]
    pub fn new(stages: Vec<PipelineStage>) -> Self {
        Self { stages }
    }

    /// A pipeline keeping only the stages named in `names`, in their
    /// original order.
    #[must_use]
    pub fn only(&self, names: &[&str]) -> Self {
        Self::new(
            self.stages
                .iter()
                .filter(|s| names.contains(&s.name.as_str()))
                .cloned()
                .collect(),
        )
    }

    #[must_use]
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name.as_str()).collect()
    }

    /// Run every stage once over `document`.
    pub fn process(&self, document: &str) -> Result<VFile, MdjsError> {
        let mut file = VFile::new(document);
        let mut tree = Tree::Pending;

        for entry in &self.stages {
            trace!(stage = %entry.name, tree = tree.kind(), "running stage");
            tree = entry
                .stage
                .run(tree, &mut file)
                .map_err(|e| e.in_stage(&entry.name))?;
        }

        Ok(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Upper;

    impl Stage for Upper {
        fn run(&self, tree: Tree, file: &mut VFile) -> Result<Tree, MdjsError> {
            file.contents = Some(file.value.to_uppercase());
            Ok(tree)
        }
    }

    struct NeedsHtml;

    impl Stage for NeedsHtml {
        fn run(&self, tree: Tree, _file: &mut VFile) -> Result<Tree, MdjsError> {
            tree.into_html().map(Tree::Html)
        }
    }

    #[test]
    fn test_process_runs_stages_in_order() {
        let pipeline = Pipeline::new(vec![PipelineStage::new("upper", Upper)]);
        let file = pipeline.process("abc").unwrap();
        assert_eq!(file.contents.as_deref(), Some("ABC"));
        assert_eq!(file.value, "abc");
    }

    #[test]
    fn test_wrong_tree_shape_names_stage() {
        let pipeline = Pipeline::new(vec![PipelineStage::new("needs-html", NeedsHtml)]);
        let err = pipeline.process("abc").unwrap_err();
        assert_eq!(
            err.to_string(),
            "stage `needs-html` failed: expected a html tree, found unparsed"
        );
    }

    #[test]
    fn test_only_keeps_order() {
        let pipeline = Pipeline::new(vec![
            PipelineStage::new("a", Upper),
            PipelineStage::new("b", Upper),
            PipelineStage::new("c", Upper),
        ]);
        assert_eq!(pipeline.only(&["c", "a"]).stage_names(), vec!["a", "c"]);
    }
}
