//! Prism-compatible syntax highlighting.
//!
//! Produces the same token tree Prism does, so the usual Prism themes style
//! the output: every token becomes `<span class="token KIND">`.
//!
//! Supported languages: JavaScript (and TypeScript/JSON through the same
//! tokenizer), HTML-like markup, CSS. JavaScript template literals tagged with
//! `html` are highlighted as markup.

mod css;
mod js;
mod markup;

/// A highlighted fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Text(String),
    /// `kind` holds the class names following `token`, e.g. `"keyword"` or
    /// `"punctuation attr-equals"`.
    Span { kind: String, children: Vec<Token> },
}

impl Token {
    #[must_use]
    pub fn span(kind: &str, text: impl Into<String>) -> Self {
        Self::Span {
            kind: kind.to_string(),
            children: vec![Self::Text(text.into())],
        }
    }

    /// Concatenated source text of the token.
    #[must_use]
    pub fn text(&self) -> String {
        match self {
            Self::Text(t) => t.clone(),
            Self::Span { children, .. } => children.iter().map(Self::text).collect(),
        }
    }
}

/// Languages the highlighter knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    JavaScript,
    Json,
    Markup,
    Css,
}

impl Language {
    /// Map a fence language (`js`, `html`, `svg`, ...) to a tokenizer.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "js" | "javascript" | "mjs" | "cjs" | "jsx" | "ts" | "typescript" | "tsx" => {
                Some(Self::JavaScript)
            }
            "json" | "json5" | "webmanifest" => Some(Self::Json),
            "html" | "markup" | "xml" | "svg" | "mathml" => Some(Self::Markup),
            "css" => Some(Self::Css),
            _ => None,
        }
    }
}

/// Tokenize `code`, or `None` for an unknown language.
#[must_use]
pub fn highlight(code: &str, language: &str) -> Option<Vec<Token>> {
    let tokens = match Language::from_name(language)? {
        Language::JavaScript => js::tokenize(code),
        Language::Json => js::tokenize_json(code),
        Language::Markup => markup::tokenize(code),
        Language::Css => css::tokenize(code),
    };
    Some(tokens)
}

/// Token accumulator that merges adjacent plain text.
#[derive(Debug, Default)]
struct TokenBuf {
    tokens: Vec<Token>,
}

impl TokenBuf {
    fn text(&mut self, s: &str) {
        if s.is_empty() {
            return;
        }
        if let Some(Token::Text(last)) = self.tokens.last_mut() {
            last.push_str(s);
        } else {
            self.tokens.push(Token::Text(s.to_string()));
        }
    }

    fn push(&mut self, kind: &str, s: &str) {
        if !s.is_empty() {
            self.tokens.push(Token::span(kind, s));
        }
    }

    fn nest(&mut self, kind: &str, children: Vec<Token>) {
        self.tokens.push(Token::Span {
            kind: kind.to_string(),
            children,
        });
    }

    fn finish(self) -> Vec<Token> {
        self.tokens
    }
}

/// Char cursor shared by the tokenizers.
struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn starts_with(&self, s: &str) -> bool {
        self.rest().starts_with(s)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Advance while `pred` holds; return the consumed slice.
    fn eat_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.bump();
        }
        &self.src[start..self.pos]
    }

    /// Advance past the first occurrence of `end` (or to the end of input).
    fn eat_through(&mut self, end: &str) -> &'a str {
        let start = self.pos;
        match self.rest().find(end) {
            Some(i) => self.pos += i + end.len(),
            None => self.pos = self.src.len(),
        }
        &self.src[start..self.pos]
    }

    fn slice_from(&self, start: usize) -> &'a str {
        &self.src[start..self.pos]
    }
}
