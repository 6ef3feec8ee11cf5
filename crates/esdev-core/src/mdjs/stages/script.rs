use super::super::pipeline::{Stage, Tree, VFile};
use super::rewrite_fenced_blocks;
use crate::error::MdjsError;
use tracing::trace;

/// Removes `js script` blocks and collects their text into
/// [`FileData::js_code`](super::super::pipeline::FileData::js_code).
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptStage;

impl Stage for ScriptStage {
    fn run(&self, tree: Tree, file: &mut VFile) -> Result<Tree, MdjsError> {
        let events = tree.into_markdown()?;

        let events = rewrite_fenced_blocks(events, |block| {
            if block.lang != "js" || block.meta != "script" {
                return Ok(None);
            }
            trace!(bytes = block.code.len(), "collected script block");
            let js_code = &mut file.data.js_code;
            if !js_code.is_empty() {
                js_code.push('\n');
            }
            js_code.push_str(&block.code);
            Ok(Some(Vec::new()))
        })?;

        Ok(Tree::Markdown(events))
    }
}
