use super::super::hast::Node;
use super::super::pipeline::{Stage, Tree, VFile};
use crate::error::MdjsError;

/// Marks raw markup from the document as trusted, so it is serialized
/// verbatim instead of escaped.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawStage;

impl Stage for RawStage {
    fn run(&self, tree: Tree, _file: &mut VFile) -> Result<Tree, MdjsError> {
        let mut nodes = tree.into_html()?;
        trust(&mut nodes);
        Ok(Tree::Html(nodes))
    }
}

fn trust(nodes: &mut [Node]) {
    for node in nodes {
        match node {
            Node::Raw { trusted, .. } => *trusted = true,
            Node::Element(el) => trust(&mut el.children),
            Node::Text(_) => {}
        }
    }
}
