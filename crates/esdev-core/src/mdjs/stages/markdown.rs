use super::super::pipeline::{Stage, Tree, VFile};
use crate::error::MdjsError;
use pulldown_cmark::{Event, Options, Parser};

/// Parses [`VFile::value`] as CommonMark with GFM tables, strikethrough and
/// task lists.
#[derive(Debug, Clone, Copy)]
pub struct MarkdownStage {
    pub options: Options,
}

impl Default for MarkdownStage {
    fn default() -> Self {
        Self {
            options: Options::ENABLE_TABLES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_TASKLISTS,
        }
    }
}

impl Stage for MarkdownStage {
    fn run(&self, tree: Tree, file: &mut VFile) -> Result<Tree, MdjsError> {
        if tree != Tree::Pending {
            return Err(MdjsError::stage(
                "",
                format!("document already parsed into a {} tree", tree.kind()),
            ));
        }

        let events = Parser::new_ext(&file.value, self.options)
            .map(Event::into_static)
            .collect();
        Ok(Tree::Markdown(events))
    }
}
