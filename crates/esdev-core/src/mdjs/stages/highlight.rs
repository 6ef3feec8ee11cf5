use super::super::hast::{text_content, Element, Node};
use super::super::pipeline::{Stage, Tree, VFile};
use crate::error::MdjsError;
use crate::highlight::{highlight, Token};

/// Prism-style highlighting of `<pre><code class="language-*">` blocks.
///
/// Unknown languages are left as they are. Highlighted blocks also get the
/// `language-*` class on the `pre`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HighlightStage;

impl Stage for HighlightStage {
    fn run(&self, tree: Tree, _file: &mut VFile) -> Result<Tree, MdjsError> {
        let mut nodes = tree.into_html()?;
        highlight_nodes(&mut nodes);
        Ok(Tree::Html(nodes))
    }
}

fn highlight_nodes(nodes: &mut [Node]) {
    for node in nodes {
        let Node::Element(el) = node else {
            continue;
        };
        if el.tag == "pre" {
            highlight_pre(el);
        } else {
            highlight_nodes(&mut el.children);
        }
    }
}

fn highlight_pre(pre: &mut Element) {
    let Some(code) = pre
        .children
        .iter_mut()
        .find_map(|n| n.as_element_mut().filter(|el| el.tag == "code"))
    else {
        return;
    };
    let Some(class) = code
        .classes()
        .find(|c| c.starts_with("language-"))
        .map(str::to_string)
    else {
        return;
    };

    let source = text_content(&code.children);
    let Some(tokens) = highlight(&source, &class["language-".len()..]) else {
        return;
    };
    code.children = tokens.into_iter().map(token_to_node).collect();
    pre.add_class(&class);
}

fn token_to_node(token: Token) -> Node {
    match token {
        Token::Text(text) => Node::Text(text),
        Token::Span { kind, children } => Node::Element(
            Element::new("span")
                .with_attr("class", format!("token {kind}"))
                .with_children(children.into_iter().map(token_to_node).collect()),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mdjs::stages::{to_html, MarkdownStage, ToHastStage};

    fn highlighted(src: &str) -> String {
        let mut file = VFile::new(src);
        let mut tree = Tree::Pending;
        tree = MarkdownStage::default().run(tree, &mut file).unwrap();
        tree = ToHastStage::default().run(tree, &mut file).unwrap();
        tree = HighlightStage.run(tree, &mut file).unwrap();
        to_html(&tree.into_html().unwrap())
    }

    #[test]
    fn test_js_block() {
        assert_eq!(
            highlighted("```js\nconst a = 1;\n```"),
            "<pre class=\"language-js\"><code class=\"language-js\">\
             <span class=\"token keyword\">const</span> a \
             <span class=\"token operator\">=</span> \
             <span class=\"token number\">1</span>\
             <span class=\"token punctuation\">;</span>\n</code></pre>"
        );
    }

    #[test]
    fn test_html_block_escapes_markup() {
        let out = highlighted("```html\n<p>hi</p>\n```");
        assert!(out.starts_with("<pre class=\"language-html\"><code class=\"language-html\">"));
        assert!(out.contains(
            "<span class=\"token tag\"><span class=\"token tag\"><span class=\"token punctuation\">&#x3C;</span>p</span>"
        ));
    }

    #[test]
    fn test_unknown_language_untouched() {
        assert_eq!(
            highlighted("```rust\nfn main() {}\n```"),
            "<pre><code class=\"language-rust\">fn main() {}\n</code></pre>"
        );
    }
}
