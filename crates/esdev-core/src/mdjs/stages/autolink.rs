use super::super::hast::{visit_elements_mut, Element, Node};
use super::super::pipeline::{Stage, Tree, VFile};
use crate::error::MdjsError;

/// Where the anchor goes relative to the heading content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AutolinkBehavior {
    /// Icon link before the heading text.
    #[default]
    Prepend,
    /// Icon link after the heading text.
    Append,
    /// The heading text itself becomes the link.
    Wrap,
}

/// Adds self-links to headings that carry an `id`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutolinkStage {
    pub behavior: AutolinkBehavior,
}

impl AutolinkStage {
    #[must_use]
    pub fn new(behavior: AutolinkBehavior) -> Self {
        Self { behavior }
    }
}

impl Stage for AutolinkStage {
    fn run(&self, tree: Tree, _file: &mut VFile) -> Result<Tree, MdjsError> {
        let mut nodes = tree.into_html()?;

        visit_elements_mut(&mut nodes, &mut |el| {
            if el.heading_rank().is_none() {
                return;
            }
            let Some(id) = el.attr("id").map(str::to_string) else {
                return;
            };

            let mut anchor = Element::new("a")
                .with_attr("aria-hidden", "true")
                .with_attr("tabindex", "-1")
                .with_attr("href", format!("#{id}"));

            match self.behavior {
                AutolinkBehavior::Prepend => {
                    anchor.children = vec![icon()];
                    el.children.insert(0, Node::Element(anchor));
                }
                AutolinkBehavior::Append => {
                    anchor.children = vec![icon()];
                    el.children.push(Node::Element(anchor));
                }
                AutolinkBehavior::Wrap => {
                    anchor.children = std::mem::take(&mut el.children);
                    el.children = vec![Node::Element(anchor)];
                }
            }
        });

        Ok(Tree::Html(nodes))
    }
}

fn icon() -> Node {
    Node::Element(Element::new("span").with_attr("class", "icon icon-link"))
}
