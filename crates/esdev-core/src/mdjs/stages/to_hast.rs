//! Markdown events to HTML tree.
//!
//! Block containers get newline text nodes between their children so the
//! serialized output keeps one block per line.

use super::super::hast::{text_content, Element, Node};
use super::super::pipeline::{MdEvent, Stage, Tree, VFile};
use crate::error::MdjsError;
use pulldown_cmark::{Alignment, CodeBlockKind, Event, LinkType, Tag, TagEnd};

/// Converts the markdown tree into an HTML tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToHastStage {
    /// Keep raw HTML from the document as raw nodes; dropped otherwise.
    pub allow_dangerous_html: bool,
}

impl ToHastStage {
    #[must_use]
    pub fn allow_dangerous_html() -> Self {
        Self {
            allow_dangerous_html: true,
        }
    }
}

impl Stage for ToHastStage {
    fn run(&self, tree: Tree, _file: &mut VFile) -> Result<Tree, MdjsError> {
        let events = tree.into_markdown()?;
        let mut builder = Builder::new(self.allow_dangerous_html);
        for event in events {
            builder.event(event);
        }
        Ok(Tree::Html(builder.finish()))
    }
}

/// How a frame's children are placed when it closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    Element,
    /// Children are spliced into the parent (HTML blocks, metadata).
    Transparent,
    /// `<tbody>` opened implicitly by the first body row.
    ImplicitBody,
    /// `<thead>`: its cells get wrapped in a single row.
    TableHead,
}

struct Frame {
    element: Element,
    kind: FrameKind,
}

struct Builder {
    stack: Vec<Frame>,
    root: Vec<Node>,
    allow_html: bool,
    /// Column alignments of the open tables, innermost last.
    tables: Vec<Vec<Alignment>>,
    cell_index: usize,
}

impl Builder {
    fn new(allow_html: bool) -> Self {
        Self {
            stack: Vec::new(),
            root: Vec::new(),
            allow_html,
            tables: Vec::new(),
            cell_index: 0,
        }
    }

    fn event(&mut self, event: MdEvent) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(end) => self.end(end),
            Event::Text(text) => self.append_text(&text),
            Event::Code(code) => {
                let el = Element::new("code").with_children(vec![Node::text(code.to_string())]);
                self.append(Node::Element(el));
            }
            Event::Html(html) | Event::InlineHtml(html) => {
                if self.allow_html {
                    self.append_raw(&html);
                }
            }
            Event::SoftBreak => self.append_text("\n"),
            Event::HardBreak => {
                self.append(Node::Element(Element::new("br")));
                self.append_text("\n");
            }
            Event::Rule => self.append(Node::Element(Element::new("hr"))),
            Event::TaskListMarker(checked) => self.task_marker(checked),
            Event::FootnoteReference(label) => self.append_text(&format!("[^{label}]")),
            Event::InlineMath(math) | Event::DisplayMath(math) => self.append_text(&math),
        }
    }

    fn start(&mut self, tag: Tag<'static>) {
        let (element, kind) = match tag {
            Tag::Paragraph => (Element::new("p"), FrameKind::Element),
            Tag::Heading { level, id, .. } => {
                let mut el = Element::new(format!("h{}", level as u8));
                if let Some(id) = id {
                    el.set_attr("id", Some(id.to_string()));
                }
                (el, FrameKind::Element)
            }
            Tag::BlockQuote(_) => (Element::new("blockquote"), FrameKind::Element),
            Tag::CodeBlock(kind) => {
                let mut code = Element::new("code");
                if let CodeBlockKind::Fenced(info) = kind {
                    if let Some(lang) = info.split_whitespace().next() {
                        code.add_class(&format!("language-{lang}"));
                    }
                }
                self.stack.push(Frame {
                    element: Element::new("pre"),
                    kind: FrameKind::Element,
                });
                (code, FrameKind::Element)
            }
            Tag::List(Some(start)) => {
                let mut el = Element::new("ol");
                if start != 1 {
                    el.set_attr("start", Some(start.to_string()));
                }
                (el, FrameKind::Element)
            }
            Tag::List(None) => (Element::new("ul"), FrameKind::Element),
            Tag::Item => (Element::new("li"), FrameKind::Element),
            Tag::Table(alignments) => {
                self.tables.push(alignments);
                (Element::new("table"), FrameKind::Element)
            }
            Tag::TableHead => {
                self.cell_index = 0;
                (Element::new("thead"), FrameKind::TableHead)
            }
            Tag::TableRow => {
                if self.top_tag() == Some("table") {
                    self.stack.push(Frame {
                        element: Element::new("tbody"),
                        kind: FrameKind::ImplicitBody,
                    });
                }
                self.cell_index = 0;
                (Element::new("tr"), FrameKind::Element)
            }
            Tag::TableCell => {
                let in_head = self
                    .stack
                    .iter()
                    .any(|f| f.kind == FrameKind::TableHead);
                let mut el = Element::new(if in_head { "th" } else { "td" });
                let align = self
                    .tables
                    .last()
                    .and_then(|a| a.get(self.cell_index))
                    .and_then(|a| match a {
                        Alignment::Left => Some("left"),
                        Alignment::Center => Some("center"),
                        Alignment::Right => Some("right"),
                        Alignment::None => None,
                    });
                if let Some(align) = align {
                    el.set_attr("align", Some(align.to_string()));
                }
                self.cell_index += 1;
                (el, FrameKind::Element)
            }
            Tag::Emphasis => (Element::new("em"), FrameKind::Element),
            Tag::Strong => (Element::new("strong"), FrameKind::Element),
            Tag::Strikethrough => (Element::new("del"), FrameKind::Element),
            Tag::Link {
                link_type,
                dest_url,
                title,
                ..
            } => {
                let href = match link_type {
                    LinkType::Email => format!("mailto:{dest_url}"),
                    _ => dest_url.to_string(),
                };
                let mut el = Element::new("a").with_attr("href", href);
                if !title.is_empty() {
                    el.set_attr("title", Some(title.to_string()));
                }
                (el, FrameKind::Element)
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                let mut el = Element::new("img").with_attr("src", dest_url.to_string());
                el.set_attr("alt", Some(String::new()));
                if !title.is_empty() {
                    el.set_attr("title", Some(title.to_string()));
                }
                (el, FrameKind::Element)
            }
            Tag::DefinitionList => (Element::new("dl"), FrameKind::Element),
            Tag::DefinitionListTitle => (Element::new("dt"), FrameKind::Element),
            Tag::DefinitionListDefinition => (Element::new("dd"), FrameKind::Element),
            Tag::FootnoteDefinition(_) => (Element::new("div"), FrameKind::Element),
            Tag::HtmlBlock | Tag::MetadataBlock(_) => (Element::default(), FrameKind::Transparent),
        };
        self.stack.push(Frame { element, kind });
    }

    fn end(&mut self, end: TagEnd) {
        if end == TagEnd::Table && self.top_kind() == Some(FrameKind::ImplicitBody) {
            self.close();
        }
        self.close();
        match end {
            // The `pre` wrapping the `code` element.
            TagEnd::CodeBlock => self.close(),
            TagEnd::Table => {
                self.tables.pop();
            }
            _ => {}
        }
    }

    fn close(&mut self) {
        let Some(Frame { mut element, kind }) = self.stack.pop() else {
            return;
        };

        match kind {
            FrameKind::Transparent => {
                for child in element.children {
                    self.append(child);
                }
                return;
            }
            FrameKind::TableHead => {
                let row = Element::new("tr").with_children(wrap(element.children, true));
                element.children = wrap(vec![Node::Element(row)], true);
            }
            FrameKind::Element | FrameKind::ImplicitBody => {}
        }

        match element.tag.as_str() {
            "img" => {
                let alt = text_content(&element.children);
                element.children.clear();
                element.set_attr("alt", Some(alt));
            }
            "blockquote" | "ul" | "ol" | "table" | "tbody" | "tr" | "dl" => {
                element.children = wrap(std::mem::take(&mut element.children), true);
            }
            "li" if element.children.iter().any(is_block) => {
                element.children = wrap(std::mem::take(&mut element.children), true);
            }
            _ => {}
        }

        self.append(Node::Element(element));
    }

    fn task_marker(&mut self, checked: bool) {
        let mut input = Element::new("input").with_attr("type", "checkbox");
        if checked {
            input.set_attr("checked", None);
        }
        input.set_attr("disabled", None);
        self.append(Node::Element(input));
        self.append_text(" ");

        let Some(item) = self.stack.iter().rposition(|f| f.element.tag == "li") else {
            return;
        };
        self.stack[item].element.add_class("task-list-item");
        if let Some(list) = item.checked_sub(1) {
            self.stack[list].element.add_class("contains-task-list");
        }
    }

    fn top_tag(&self) -> Option<&str> {
        self.stack.last().map(|f| f.element.tag.as_str())
    }

    fn top_kind(&self) -> Option<FrameKind> {
        self.stack.last().map(|f| f.kind)
    }

    fn children_mut(&mut self) -> &mut Vec<Node> {
        match self.stack.last_mut() {
            Some(frame) => &mut frame.element.children,
            None => &mut self.root,
        }
    }

    fn append(&mut self, node: Node) {
        self.children_mut().push(node);
    }

    fn append_text(&mut self, text: &str) {
        let children = self.children_mut();
        if let Some(Node::Text(last)) = children.last_mut() {
            last.push_str(text);
        } else {
            children.push(Node::text(text));
        }
    }

    fn append_raw(&mut self, html: &str) {
        let children = self.children_mut();
        if let Some(Node::Raw { value, .. }) = children.last_mut() {
            value.push_str(html);
        } else {
            children.push(Node::Raw {
                value: html.to_string(),
                trusted: false,
            });
        }
    }

    fn finish(mut self) -> Vec<Node> {
        while !self.stack.is_empty() {
            self.close();
        }
        wrap(self.root, false)
    }
}

fn is_block(node: &Node) -> bool {
    match node {
        Node::Element(el) => matches!(
            el.tag.as_str(),
            "p" | "ul" | "ol" | "pre" | "blockquote" | "table" | "hr" | "dl" | "div"
        ) || el.heading_rank().is_some(),
        Node::Raw { .. } | Node::Text(_) => false,
    }
}

/// Separate nodes with newlines; `loose` also pads both ends.
fn wrap(nodes: Vec<Node>, loose: bool) -> Vec<Node> {
    let mut out = Vec::with_capacity(nodes.len() * 2 + 1);
    if loose {
        out.push(Node::text("\n"));
    }
    let has_nodes = !nodes.is_empty();
    for (i, node) in nodes.into_iter().enumerate() {
        if i > 0 {
            out.push(Node::text("\n"));
        }
        out.push(node);
    }
    if loose && has_nodes {
        out.push(Node::text("\n"));
    }
    out
}
