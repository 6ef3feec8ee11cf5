//! HTML / XML / SVG tokenizer with embedded `<script>` and `<style>`.

use super::{css, js, Cursor, Token, TokenBuf};

pub(super) fn tokenize(src: &str) -> Vec<Token> {
    let mut cur = Cursor::new(src);
    let mut out = TokenBuf::default();

    while let Some(c) = cur.peek() {
        if cur.starts_with("<!--") {
            out.push("comment", cur.eat_through("-->"));
        } else if cur.starts_with("<![CDATA[") {
            out.push("cdata", cur.eat_through("]]>"));
        } else if cur.starts_with("<?") {
            out.push("prolog", cur.eat_through(">"));
        } else if cur.starts_with("<!") {
            out.push("doctype", cur.eat_through(">"));
        } else if c == '<' && starts_tag(&cur) {
            let tag = tag(&mut cur, &mut out);
            if !tag.closing && !tag.self_closing {
                embedded(&mut cur, &mut out, &tag.name);
            }
        } else if let Some(len) = (c == '&').then(|| entity_len(cur.rest())).flatten() {
            let start = cur.pos;
            cur.pos += len;
            out.push("entity", cur.slice_from(start));
        } else {
            let start = cur.pos;
            cur.bump();
            cur.eat_while(|c| c != '<' && c != '&');
            out.text(cur.slice_from(start));
        }
    }

    out.finish()
}

struct Tag {
    name: String,
    closing: bool,
    self_closing: bool,
}

fn starts_tag(cur: &Cursor<'_>) -> bool {
    match cur.peek_nth(1) {
        Some('/') => cur.peek_nth(2).is_some_and(char::is_alphabetic),
        Some(c) => c.is_alphabetic(),
        None => false,
    }
}

fn tag(cur: &mut Cursor<'_>, out: &mut TokenBuf) -> Tag {
    let closing = cur.starts_with("</");
    let open = if closing { "</" } else { "<" };
    cur.pos += open.len();
    let name = cur.eat_while(|c| c.is_alphanumeric() || matches!(c, '-' | ':' | '_' | '.'));

    let mut parts = TokenBuf::default();
    parts.nest(
        "tag",
        vec![Token::span("punctuation", open), Token::Text(name.to_string())],
    );

    let mut self_closing = false;
    loop {
        let ws = cur.eat_while(char::is_whitespace);
        parts.text(ws);
        match cur.peek() {
            None => break,
            Some('>') => {
                cur.bump();
                parts.push("punctuation", ">");
                break;
            }
            Some('/') if cur.peek_nth(1) == Some('>') => {
                cur.pos += 2;
                parts.push("punctuation", "/>");
                self_closing = true;
                break;
            }
            Some(_) => attribute(cur, &mut parts),
        }
    }

    out.nest("tag", parts.finish());
    Tag {
        name: name.to_ascii_lowercase(),
        closing,
        self_closing,
    }
}

fn attribute(cur: &mut Cursor<'_>, parts: &mut TokenBuf) {
    let name = cur.eat_while(|c| !c.is_whitespace() && !matches!(c, '=' | '>' | '/'));
    if name.is_empty() && cur.peek() != Some('=') {
        let start = cur.pos;
        cur.bump();
        parts.text(cur.slice_from(start));
        return;
    }
    parts.push("attr-name", name);

    if cur.peek() != Some('=') {
        return;
    }
    cur.bump();
    let mut value = TokenBuf::default();
    value.push("punctuation attr-equals", "=");

    match cur.peek() {
        Some(q @ ('"' | '\'')) => {
            cur.bump();
            let quote = q.to_string();
            value.push("punctuation", &quote);
            value.text(cur.eat_while(|c| c != q));
            if cur.peek() == Some(q) {
                cur.bump();
                value.push("punctuation", &quote);
            }
        }
        _ => value.text(cur.eat_while(|c| !c.is_whitespace() && c != '>')),
    }
    parts.nest("attr-value", value.finish());
}

/// Highlight the body of `<script>` / `<style>` with the matching tokenizer.
fn embedded(cur: &mut Cursor<'_>, out: &mut TokenBuf, tag: &str) {
    let lang_class = match tag {
        "script" => "language-javascript",
        "style" => "language-css",
        _ => return,
    };

    let rest = cur.rest();
    let end = rest
        .to_ascii_lowercase()
        .find(&format!("</{tag}"))
        .unwrap_or(rest.len());
    let body = &rest[..end];
    if body.is_empty() {
        return;
    }
    cur.pos += end;

    let children = if tag == "script" {
        js::tokenize(body)
    } else {
        css::tokenize(body)
    };
    out.nest(
        tag,
        vec![Token::Span {
            kind: lang_class.to_string(),
            children,
        }],
    );
}

/// Length of a character reference at the start of `s`.
fn entity_len(s: &str) -> Option<usize> {
    let body = s.strip_prefix('&')?;
    let end = body.find(';')?;
    let name = &body[..end];

    let valid = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
        !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit())
    } else if let Some(dec) = name.strip_prefix('#') {
        !dec.is_empty() && dec.chars().all(|c| c.is_ascii_digit())
    } else {
        name.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
            && name.chars().all(|c| c.is_ascii_alphanumeric())
    };
    valid.then_some(end + 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find<'t>(tokens: &'t [Token], kind: &str) -> Vec<&'t Token> {
        let mut found = Vec::new();
        for t in tokens {
            if let Token::Span { kind: k, children } = t {
                if k == kind {
                    found.push(t);
                }
                found.extend(find(children, kind));
            }
        }
        found
    }

    #[test]
    fn test_tag_structure() {
        let tokens = tokenize(r#"<my-el class="a" hidden>hi</my-el>"#);
        let tags = find(&tokens, "tag");
        // Two outer tags, each with an inner name tag.
        assert_eq!(tags.len(), 4);
        assert_eq!(tags[0].text(), r#"<my-el class="a" hidden>"#);
        assert_eq!(tags[1].text(), "<my-el");

        let names: Vec<_> = find(&tokens, "attr-name").iter().map(|t| t.text()).collect();
        assert_eq!(names, vec!["class", "hidden"]);
        assert_eq!(find(&tokens, "attr-value")[0].text(), "=\"a\"");
        assert_eq!(find(&tokens, "punctuation attr-equals").len(), 1);
    }

    #[test]
    fn test_comments_doctype_entities() {
        let tokens = tokenize("<!doctype html><!-- note --><p>a &amp; b &#x3C; &bogus c</p>");
        assert_eq!(find(&tokens, "doctype")[0].text(), "<!doctype html>");
        assert_eq!(find(&tokens, "comment")[0].text(), "<!-- note -->");
        let entities: Vec<_> = find(&tokens, "entity").iter().map(|t| t.text()).collect();
        assert_eq!(entities, vec!["&amp;", "&#x3C;"]);
    }

    #[test]
    fn test_embedded_script() {
        let tokens = tokenize("<script type=module>const a = 1;</script>");
        let script = find(&tokens, "script");
        assert_eq!(script.len(), 1);
        assert_eq!(script[0].text(), "const a = 1;");
        assert!(!find(&tokens, "keyword").is_empty());
    }

    #[test]
    fn test_partial_tag_from_template_chunk() {
        let tokens = tokenize("<div class=");
        let text: String = tokens.iter().map(Token::text).collect();
        assert_eq!(text, "<div class=");
    }

    #[test]
    fn test_lone_angle_bracket_is_text() {
        let tokens = tokenize("a < b");
        assert_eq!(tokens, vec![Token::Text("a < b".to_string())]);
    }
}
