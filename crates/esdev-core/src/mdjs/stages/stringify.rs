use super::super::hast::{Element, Node};
use super::super::pipeline::{Stage, Tree, VFile};
use crate::error::MdjsError;

/// Elements serialized without children or closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Serializes the HTML tree into [`VFile::contents`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StringifyStage;

impl Stage for StringifyStage {
    fn run(&self, tree: Tree, file: &mut VFile) -> Result<Tree, MdjsError> {
        let nodes = tree.into_html()?;
        file.contents = Some(to_html(&nodes));
        Ok(Tree::Html(nodes))
    }
}

/// Serialize nodes to an HTML string.
#[must_use]
pub fn to_html(nodes: &[Node]) -> String {
    let mut out = String::new();
    write_nodes(nodes, &mut out);
    out
}

fn write_nodes(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => escape_text(text, out),
            Node::Raw {
                value,
                trusted: true,
            } => out.push_str(value),
            Node::Raw { value, .. } => escape_text(value, out),
            Node::Element(el) => write_element(el, out),
        }
    }
}

fn write_element(el: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&el.tag);
    for (name, value) in &el.attrs {
        out.push(' ');
        out.push_str(name);
        if let Some(value) = value {
            out.push_str("=\"");
            escape_attr(value, out);
            out.push('"');
        }
    }
    out.push('>');

    if VOID_ELEMENTS.contains(&el.tag.as_str()) {
        return;
    }
    write_nodes(&el.children, out);
    out.push_str("</");
    out.push_str(&el.tag);
    out.push('>');
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&#x26;"),
            '<' => out.push_str("&#x3C;"),
            c => out.push(c),
        }
    }
}

fn escape_attr(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&#x26;"),
            '"' => out.push_str("&#x22;"),
            c => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escaping() {
        let nodes = vec![Node::Element(
            Element::new("p")
                .with_attr("title", "a \"b\" & c")
                .with_children(vec![Node::text("1 < 2 & 3 > 2")]),
        )];
        assert_eq!(
            to_html(&nodes),
            "<p title=\"a &#x22;b&#x22; &#x26; c\">1 &#x3C; 2 &#x26; 3 > 2</p>"
        );
    }

    #[test]
    fn test_void_and_boolean_attributes() {
        let mut input = Element::new("input").with_attr("type", "checkbox");
        input.set_attr("disabled", None);
        assert_eq!(
            to_html(&[Node::Element(input)]),
            "<input type=\"checkbox\" disabled>"
        );
    }

    #[test]
    fn test_raw_trust() {
        let raw = |trusted| Node::Raw {
            value: "<b>x</b>".to_string(),
            trusted,
        };
        assert_eq!(to_html(&[raw(true)]), "<b>x</b>");
        assert_eq!(to_html(&[raw(false)]), "&#x3C;b>x&#x3C;/b>");
    }

    #[test]
    fn test_requires_html_tree() {
        let mut file = VFile::new("# x");
        assert!(StringifyStage.run(Tree::Pending, &mut file).is_err());
        assert!(file.contents.is_none());
    }
}
