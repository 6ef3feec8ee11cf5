//! JavaScript / TypeScript / JSON tokenizer.

use super::{markup, Cursor, Token, TokenBuf};

const KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "case", "catch", "class", "const", "continue", "debugger",
    "default", "delete", "do", "else", "enum", "export", "extends", "finally", "for", "from",
    "function", "get", "if", "implements", "import", "in", "instanceof", "interface", "let", "new",
    "null", "of", "package", "private", "protected", "public", "return", "set", "static", "super",
    "switch", "this", "throw", "try", "typeof", "undefined", "var", "void", "while", "with",
    "yield", "type", "readonly",
];

/// Keywords after which the next identifier names a class.
const CLASS_INTRODUCERS: &[&str] = &["class", "extends", "implements", "new", "instanceof"];

const OPERATOR_CHARS: &str = "+-*/%=&|^!<>?~";
const PUNCTUATION_CHARS: &str = "{}[]();,.:";

pub(super) fn tokenize(src: &str) -> Vec<Token> {
    Tokenizer::new(src, false).run()
}

pub(super) fn tokenize_json(src: &str) -> Vec<Token> {
    Tokenizer::new(src, true).run()
}

struct Tokenizer<'a> {
    cur: Cursor<'a>,
    out: TokenBuf,
    json: bool,
    /// Last significant token, when it was a plain identifier.
    last_ident: Option<&'a str>,
    expect_class: bool,
}

impl<'a> Tokenizer<'a> {
    fn new(src: &'a str, json: bool) -> Self {
        Self {
            cur: Cursor::new(src),
            out: TokenBuf::default(),
            json,
            last_ident: None,
            expect_class: false,
        }
    }

    fn run(mut self) -> Vec<Token> {
        while let Some(c) = self.cur.peek() {
            if c.is_whitespace() {
                let ws = self.cur.eat_while(char::is_whitespace);
                self.out.text(ws);
                continue;
            }
            if self.cur.starts_with("//") {
                let comment = self.cur.eat_while(|c| c != '\n');
                self.out.push("comment", comment);
                continue;
            }
            if self.cur.starts_with("/*") {
                let comment = self.cur.eat_through("*/");
                self.out.push("comment", comment);
                continue;
            }

            let was_ident = match c {
                '"' | '\'' => {
                    self.string(c);
                    false
                }
                '`' => {
                    self.template(self.last_ident == Some("html"));
                    false
                }
                c if c.is_ascii_digit()
                    || (c == '.' && self.cur.peek_nth(1).is_some_and(|d| d.is_ascii_digit())) =>
                {
                    let num = self
                        .cur
                        .eat_while(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_');
                    self.out.push("number", num);
                    false
                }
                c if is_ident_start(c) => {
                    self.identifier();
                    true
                }
                _ if self.cur.starts_with("...") => {
                    let start = self.cur.pos;
                    self.cur.pos += 3;
                    self.out.push("operator", self.cur.slice_from(start));
                    false
                }
                ':' if self.json => {
                    self.cur.bump();
                    self.out.push("operator", ":");
                    false
                }
                c if PUNCTUATION_CHARS.contains(c) => {
                    self.cur.bump();
                    self.out.push("punctuation", &c.to_string());
                    false
                }
                c if OPERATOR_CHARS.contains(c) => {
                    let op = self.cur.eat_while(|c| OPERATOR_CHARS.contains(c));
                    self.out.push("operator", op);
                    false
                }
                _ => {
                    let start = self.cur.pos;
                    self.cur.bump();
                    self.out.text(self.cur.slice_from(start));
                    false
                }
            };

            if !was_ident {
                self.expect_class = false;
                self.last_ident = None;
            }
        }

        self.out.finish()
    }

    fn identifier(&mut self) {
        let word = self.cur.eat_while(is_ident_part);
        self.last_ident = None;

        if self.json {
            match word {
                "true" | "false" => self.out.push("boolean", word),
                "null" => self.out.push("null keyword", word),
                _ => self.out.text(word),
            }
            return;
        }

        if KEYWORDS.contains(&word) {
            self.out.push("keyword", word);
            self.expect_class = CLASS_INTRODUCERS.contains(&word);
            return;
        }
        if std::mem::take(&mut self.expect_class) {
            self.out.push("class-name", word);
            return;
        }

        match word {
            "true" | "false" => self.out.push("boolean", word),
            _ if self.next_significant() == Some('(') => self.out.push("function", word),
            _ => {
                self.out.text(word);
                self.last_ident = Some(word);
            }
        }
    }

    fn string(&mut self, quote: char) {
        let start = self.cur.pos;
        self.cur.bump();
        while let Some(c) = self.cur.bump() {
            match c {
                '\\' => {
                    self.cur.bump();
                }
                '\n' => break,
                c if c == quote => break,
                _ => {}
            }
        }
        let s = self.cur.slice_from(start);

        let kind = if self.json && self.next_significant() == Some(':') {
            "property"
        } else {
            "string"
        };
        self.out.push(kind, s);
    }

    fn template(&mut self, html: bool) {
        let mut parts = TokenBuf::default();
        self.cur.bump();
        parts.push("template-punctuation string", "`");

        let mut literal_start = self.cur.pos;
        loop {
            match self.cur.peek() {
                None => {
                    push_literal(&mut parts, self.cur.slice_from(literal_start), html);
                    break;
                }
                Some('\\') => {
                    self.cur.bump();
                    self.cur.bump();
                }
                Some('`') => {
                    push_literal(&mut parts, self.cur.slice_from(literal_start), html);
                    self.cur.bump();
                    parts.push("template-punctuation string", "`");
                    break;
                }
                Some('$') if self.cur.peek_nth(1) == Some('{') => {
                    push_literal(&mut parts, self.cur.slice_from(literal_start), html);
                    self.interpolation(&mut parts);
                    literal_start = self.cur.pos;
                }
                Some(_) => {
                    self.cur.bump();
                }
            }
        }

        self.out.nest("template-string", parts.finish());
    }

    fn interpolation(&mut self, parts: &mut TokenBuf) {
        self.cur.pos += 2;
        let mut children = vec![Token::span("interpolation-punctuation punctuation", "${")];

        let rest = self.cur.rest();
        let end = interpolation_end(rest);
        let expr = &rest[..end.unwrap_or(rest.len())];
        children.extend(tokenize(expr));
        self.cur.pos += expr.len();

        if end.is_some() {
            self.cur.bump();
            children.push(Token::span("interpolation-punctuation punctuation", "}"));
        }
        parts.nest("interpolation", children);
    }

    fn next_significant(&self) -> Option<char> {
        self.cur.rest().chars().find(|c| !c.is_whitespace())
    }
}

fn push_literal(parts: &mut TokenBuf, text: &str, html: bool) {
    if text.is_empty() {
        return;
    }
    if html {
        parts.nest("html language-html", markup::tokenize(text));
    } else {
        parts.push("string", text);
    }
}

/// Offset of the `}` closing an interpolation body.
fn interpolation_end(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut chars = s.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '{' => depth += 1,
            '}' if depth == 0 => return Some(i),
            '}' => depth -= 1,
            '"' | '\'' | '`' => {
                while let Some((_, d)) = chars.next() {
                    if d == '\\' {
                        chars.next();
                    } else if d == c {
                        break;
                    }
                }
            }
            _ => {}
        }
    }
    None
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$' || c == '#'
}

fn is_ident_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$' || c == '#'
}
