//! CSS tokenizer.

use super::{Cursor, Token, TokenBuf};

pub(super) fn tokenize(src: &str) -> Vec<Token> {
    let mut cur = Cursor::new(src);
    let mut out = TokenBuf::default();

    while let Some(c) = cur.peek() {
        if cur.starts_with("/*") {
            out.push("comment", cur.eat_through("*/"));
            continue;
        }

        match c {
            c if c.is_whitespace() => out.text(cur.eat_while(char::is_whitespace)),
            '@' => {
                let start = cur.pos;
                cur.bump();
                cur.eat_while(is_word_char);
                let rule = cur.slice_from(start);
                let prelude = cur.eat_while(|c| c != '{' && c != ';');

                let mut children = vec![Token::span("rule", rule)];
                if !prelude.is_empty() {
                    children.push(Token::Text(prelude.to_string()));
                }
                out.nest("atrule", children);
            }
            '"' | '\'' => {
                let start = cur.pos;
                cur.bump();
                while let Some(d) = cur.bump() {
                    if d == '\\' {
                        cur.bump();
                    } else if d == c {
                        break;
                    }
                }
                out.push("string", cur.slice_from(start));
            }
            '{' | '}' | ';' | ':' | ',' | '(' | ')' => {
                cur.bump();
                out.push("punctuation", &c.to_string());
            }
            _ if starts_selector(cur.rest()) => {
                let selector = cur.eat_while(|c| !matches!(c, '{' | '}' | ';'));
                let trimmed = selector.trim_end();
                out.push("selector", trimmed);
                out.text(&selector[trimmed.len()..]);
            }
            '!' => {
                let start = cur.pos;
                cur.bump();
                cur.eat_while(char::is_alphanumeric);
                let word = cur.slice_from(start);
                if word.eq_ignore_ascii_case("!important") {
                    out.push("important", word);
                } else {
                    out.text(word);
                }
            }
            _ => word(&mut cur, &mut out),
        }
    }

    out.finish()
}

fn word(cur: &mut Cursor<'_>, out: &mut TokenBuf) {
    let start = cur.pos;
    let word = cur.eat_while(|c| is_word_char(c) || matches!(c, '.' | '#' | '%'));
    if word.is_empty() {
        cur.bump();
        out.text(cur.slice_from(start));
        return;
    }

    let next = cur.rest().chars().find(|c| !c.is_whitespace());
    match next {
        Some('(') if word.eq_ignore_ascii_case("url") && cur.peek() == Some('(') => {
            cur.eat_through(")");
            out.push("url", cur.slice_from(start));
        }
        Some('(') if cur.peek() == Some('(') => out.push("function", word),
        Some(':') if word.starts_with(|c: char| c.is_alphabetic() || c == '-') => {
            out.push("property", word);
        }
        _ => out.text(word),
    }
}

/// Whether the upcoming text is a selector: it runs into `{` before `;` or `}`.
fn starts_selector(rest: &str) -> bool {
    rest.find(['{', ';', '}'])
        .is_some_and(|i| rest.as_bytes()[i] == b'{')
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans(tokens: &[Token], out: &mut Vec<(String, String)>) {
        for t in tokens {
            if let Token::Span { kind, children } = t {
                out.push((kind.clone(), t.text()));
                spans(children, out);
            }
        }
    }

    fn all(src: &str) -> Vec<(String, String)> {
        let mut out = Vec::new();
        spans(&tokenize(src), &mut out);
        out
    }

    fn pair(kind: &str, text: &str) -> (String, String) {
        (kind.to_string(), text.to_string())
    }

    #[test]
    fn test_rule_set() {
        let tokens = all("a:hover, .b > c { color: red; background: url(x.png) !important; }");
        assert!(tokens.contains(&pair("selector", "a:hover, .b > c")));
        assert!(tokens.contains(&pair("property", "color")));
        assert!(tokens.contains(&pair("property", "background")));
        assert!(tokens.contains(&pair("url", "url(x.png)")));
        assert!(tokens.contains(&pair("important", "!important")));
        assert!(tokens.contains(&pair("punctuation", "{")));
    }

    #[test]
    fn test_at_rule_with_nested_selector() {
        let tokens = all("@media (min-width: 600px) { .grid { display: grid; } }");
        assert!(tokens.contains(&pair("rule", "@media")));
        assert!(tokens.contains(&pair("atrule", "@media (min-width: 600px) ")));
        assert!(tokens.contains(&pair("selector", ".grid")));
        assert!(tokens.contains(&pair("property", "display")));
    }

    #[test]
    fn test_functions_and_comments() {
        let tokens = all("/* c */ p { width: calc(100% - 2px); }");
        assert!(tokens.contains(&pair("comment", "/* c */")));
        assert!(tokens.contains(&pair("function", "calc")));
    }
}
