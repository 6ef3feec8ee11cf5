//! Story block extraction.
//!
//! A fenced block annotated `js story` or `js preview-story` is a live
//! example. Its first exported binding becomes the story key; the block itself
//! is replaced by a placeholder element the generated registration code later
//! looks up by that key.

use super::super::pipeline::{MdEvent, Stage, Tree, VFile};
use super::super::{Story, StoryKind};
use super::rewrite_fenced_blocks;
use crate::error::{ExtractionError, MdjsError};
use crate::lexer::{first_export, has_tagged_template};
use pulldown_cmark::{CowStr, Event, Tag, TagEnd};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Renders the placeholder markup for a story key.
pub type TagFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

fn default_story_tag(name: &str) -> String {
    format!("<mdjs-story mdjs-story-name=\"{name}\"></mdjs-story>")
}

fn default_preview_story_tag(name: &str) -> String {
    format!("<mdjs-preview mdjs-story-name=\"{name}\"></mdjs-preview>")
}

#[derive(Clone)]
pub struct StoryStage {
    story_tag: TagFn,
    preview_story_tag: TagFn,
}

impl Default for StoryStage {
    fn default() -> Self {
        Self {
            story_tag: Arc::new(default_story_tag),
            preview_story_tag: Arc::new(default_preview_story_tag),
        }
    }
}

impl fmt::Debug for StoryStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoryStage").finish_non_exhaustive()
    }
}

impl StoryStage {
    #[must_use]
    pub fn with_story_tag(mut self, tag: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        self.story_tag = Arc::new(tag);
        self
    }

    #[must_use]
    pub fn with_preview_story_tag(
        mut self,
        tag: impl Fn(&str) -> String + Send + Sync + 'static,
    ) -> Self {
        self.preview_story_tag = Arc::new(tag);
        self
    }
}

impl Stage for StoryStage {
    fn run(&self, tree: Tree, file: &mut VFile) -> Result<Tree, MdjsError> {
        let events = tree.into_markdown()?;

        let events = rewrite_fenced_blocks(events, |block| {
            if block.lang != "js" {
                return Ok(None);
            }
            let tag = match block.meta.as_str() {
                "story" => &self.story_tag,
                "preview-story" => &self.preview_story_tag,
                _ => return Ok(None),
            };

            let key = first_export(&block.code)
                .ok_or_else(|| ExtractionError::new(&block.meta, &block.code))?;
            let kind = if has_tagged_template(&block.code, "html") {
                StoryKind::Html
            } else {
                StoryKind::Js
            };
            debug!(key = %key, kind = ?kind, "extracted story");

            let placeholder = tag(&key);
            file.data.stories.push(Story {
                name: key.clone(),
                key,
                code: block.code.clone(),
                kind,
            });
            Ok(Some(html_block(placeholder)))
        })?;

        Ok(Tree::Markdown(events))
    }
}

fn html_block(markup: String) -> Vec<MdEvent> {
    vec![
        Event::Start(Tag::HtmlBlock),
        Event::Html(CowStr::from(markup)),
        Event::End(TagEnd::HtmlBlock),
    ]
}
