//! Built-in pipeline stages.

mod autolink;
mod highlight;
mod markdown;
mod raw;
mod script;
mod slug;
mod story;
mod stringify;
mod to_hast;

pub use autolink::{AutolinkBehavior, AutolinkStage};
pub use highlight::HighlightStage;
pub use markdown::MarkdownStage;
pub use raw::RawStage;
pub use script::ScriptStage;
pub use slug::{SlugStage, Slugger};
pub use story::{StoryStage, TagFn};
pub use stringify::{to_html, StringifyStage};
pub use to_hast::ToHastStage;

use super::pipeline::MdEvent;
use crate::error::MdjsError;
use pulldown_cmark::{CodeBlockKind, Event, Tag, TagEnd};

/// A fenced code block lifted out of the event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FencedBlock {
    /// First word of the info string.
    pub lang: String,
    /// Rest of the info string, trimmed.
    pub meta: String,
    /// Block body without its final newline.
    pub code: String,
}

impl FencedBlock {
    fn from_info(info: &str, body: &str) -> Self {
        let info = info.trim();
        let (lang, meta) = info
            .split_once(char::is_whitespace)
            .map_or((info, ""), |(l, m)| (l, m.trim()));
        Self {
            lang: lang.to_string(),
            meta: meta.to_string(),
            code: body.strip_suffix('\n').unwrap_or(body).to_string(),
        }
    }
}

/// Walk fenced code blocks in document order. `f` returns replacement events
/// for a block, or `None` to keep it.
pub(crate) fn rewrite_fenced_blocks<F>(
    events: Vec<MdEvent>,
    mut f: F,
) -> Result<Vec<MdEvent>, MdjsError>
where
    F: FnMut(&FencedBlock) -> Result<Option<Vec<MdEvent>>, MdjsError>,
{
    let mut out = Vec::with_capacity(events.len());
    let mut iter = events.into_iter();

    while let Some(event) = iter.next() {
        let Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) = &event else {
            out.push(event);
            continue;
        };
        let info = info.to_string();

        let mut block_events = vec![event];
        let mut body = String::new();
        for inner in iter.by_ref() {
            let done = matches!(inner, Event::End(TagEnd::CodeBlock));
            if let Event::Text(text) = &inner {
                body.push_str(text);
            }
            block_events.push(inner);
            if done {
                break;
            }
        }

        match f(&FencedBlock::from_info(&info, &body))? {
            Some(replacement) => out.extend(replacement),
            None => out.extend(block_events),
        }
    }

    Ok(out)
}
