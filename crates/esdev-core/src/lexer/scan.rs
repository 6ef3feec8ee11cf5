//! Export binding scanner.
//!
//! Walks JavaScript source once, skipping comments, string, template and
//! regex literals, and reports the names bound by top-level `export` statements in
//! source order. No AST is built.

/// How a name came to be exported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    /// `export const|let|var|function|class name`
    Declaration,
    /// `export default ...`
    Default,
    /// `export { local as name }`, with or without `from`
    Named,
    /// `export * as name from "..."`
    Namespace,
}

/// One exported binding found in source code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSpec {
    /// Exported name as seen by importers.
    pub name: String,
    pub kind: ExportKind,
    /// Line number (1-indexed) of the `export` keyword.
    pub line: u32,
}

/// Scan source code for exported binding names.
///
/// Returns every export in first-appearance order. Duplicates are kept; the
/// scanner does not validate the module.
#[must_use]
pub fn scan_exports(source: &str) -> Vec<ExportSpec> {
    let mut scanner = Scanner::new(source);
    let mut results = Vec::new();
    let mut depth: i32 = 0;

    while let Some(c) = scanner.peek() {
        if scanner.skip_trivia_or_literal() {
            continue;
        }

        match c {
            '{' | '(' | '[' => {
                depth += 1;
                scanner.bump();
            }
            '}' | ')' | ']' => {
                depth -= 1;
                scanner.bump();
            }
            _ if depth == 0 && scanner.at_keyword("export") => {
                let line = scanner.line;
                scanner.advance(6);
                scanner.scan_export_clause(line, &mut results);
            }
            _ if is_ident_start(c) => scanner.skip_identifier(),
            _ => scanner.bump(),
        }
    }

    results
}

/// Name of the first exported binding, if any.
#[must_use]
pub fn first_export(source: &str) -> Option<String> {
    scan_exports(source).into_iter().next().map(|e| e.name)
}

/// Whether `source` contains a template literal tagged with `tag`
/// (e.g. ``html`<p></p>` ``) outside comments and strings.
#[must_use]
pub fn has_tagged_template(source: &str, tag: &str) -> bool {
    let mut scanner = Scanner::new(source);

    while let Some(c) = scanner.peek() {
        if scanner.skip_trivia_or_literal() {
            continue;
        }
        if scanner.at_keyword(tag) {
            scanner.advance(tag.chars().count());
            scanner.skip_whitespace();
            if scanner.peek() == Some('`') {
                return true;
            }
            continue;
        }
        if is_ident_start(c) {
            scanner.skip_identifier();
        } else {
            scanner.bump();
        }
    }

    false
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Keywords that begin a new statement; used to recover from missing
/// semicolons while skipping an initializer.
const STATEMENT_KEYWORDS: &[&str] = &[
    "export", "import", "const", "let", "var", "function", "class", "async",
];

/// Keywords after which `/` begins a regex literal.
const REGEX_PRECEDING_KEYWORDS: &[&str] = &[
    "return", "typeof", "instanceof", "in", "of", "new", "delete", "void", "throw", "case",
    "do", "else", "yield", "await",
];

struct Scanner {
    chars: Vec<char>,
    pos: usize,
    line: u32,
}

impl Scanner {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            if c == '\n' {
                self.line += 1;
            }
            self.pos += 1;
        }
    }

    fn advance(&mut self, n: usize) {
        for _ in 0..n {
            self.bump();
        }
    }

    /// Check if the cursor sits on `keyword` with word boundaries on both
    /// sides. Member access (`obj.export`) does not count.
    fn at_keyword(&self, keyword: &str) -> bool {
        if self.pos > 0 {
            let prev = self.chars[self.pos - 1];
            if is_ident_char(prev) || prev == '.' {
                return false;
            }
        }

        let mut len = 0;
        for (j, kc) in keyword.chars().enumerate() {
            if self.peek_at(j) != Some(kc) {
                return false;
            }
            len = j + 1;
        }

        !matches!(self.peek_at(len), Some(c) if is_ident_char(c))
    }

    /// Skip one comment, string or template literal if the cursor is on one.
    fn skip_trivia_or_literal(&mut self) -> bool {
        match (self.peek(), self.peek_at(1)) {
            (Some('/'), Some('/')) => {
                while let Some(c) = self.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.bump();
                }
                true
            }
            (Some('/'), Some('*')) => {
                self.advance(2);
                while self.peek().is_some() {
                    if self.peek() == Some('*') && self.peek_at(1) == Some('/') {
                        self.advance(2);
                        break;
                    }
                    self.bump();
                }
                true
            }
            (Some(q @ ('"' | '\'')), _) => {
                self.skip_string(q);
                true
            }
            (Some('`'), _) => {
                self.skip_template();
                true
            }
            (Some('/'), _) if self.regex_allowed() => {
                self.skip_regex();
                true
            }
            _ => false,
        }
    }

    /// Whether a `/` at the cursor starts a regex literal rather than a
    /// division, judged by the previous significant token.
    fn regex_allowed(&self) -> bool {
        let before = &self.chars[..self.pos];
        let Some(end) = before.iter().rposition(|c| !c.is_whitespace()) else {
            return true;
        };
        let prev = before[end];
        if is_ident_char(prev) {
            let start = before[..end]
                .iter()
                .rposition(|&c| !is_ident_char(c))
                .map_or(0, |i| i + 1);
            let word: String = before[start..=end].iter().collect();
            return REGEX_PRECEDING_KEYWORDS.contains(&word.as_str());
        }
        !matches!(prev, ')' | ']' | '"' | '\'' | '`')
    }

    /// Skip `/body/flags`. `/` inside a `[...]` class does not close it.
    fn skip_regex(&mut self) {
        self.bump();
        let mut in_class = false;
        while let Some(c) = self.peek() {
            match c {
                '\\' => self.advance(2),
                '\n' => return,
                '[' => {
                    in_class = true;
                    self.bump();
                }
                ']' => {
                    in_class = false;
                    self.bump();
                }
                '/' if !in_class => {
                    self.bump();
                    self.skip_identifier();
                    return;
                }
                _ => self.bump(),
            }
        }
    }

    fn skip_string(&mut self, quote: char) {
        self.bump();
        while let Some(c) = self.peek() {
            match c {
                '\\' => self.advance(2),
                '\n' => return,
                _ if c == quote => {
                    self.bump();
                    return;
                }
                _ => self.bump(),
            }
        }
    }

    /// Skip a template literal, including code nested in `${ }`.
    fn skip_template(&mut self) {
        self.bump();
        while let Some(c) = self.peek() {
            match c {
                '\\' => self.advance(2),
                '`' => {
                    self.bump();
                    return;
                }
                '$' if self.peek_at(1) == Some('{') => {
                    self.advance(2);
                    self.skip_balanced_code('}');
                }
                _ => self.bump(),
            }
        }
    }

    /// Skip code up to and including the `close` that balances an already
    /// consumed opener.
    fn skip_balanced_code(&mut self, close: char) {
        let mut depth = 0usize;
        while let Some(c) = self.peek() {
            if self.skip_trivia_or_literal() {
                continue;
            }
            match c {
                '{' | '(' | '[' => depth += 1,
                _ if c == close && depth == 0 => {
                    self.bump();
                    return;
                }
                '}' | ')' | ']' => depth = depth.saturating_sub(1),
                _ => {}
            }
            self.bump();
        }
    }

    fn skip_whitespace(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => self.bump(),
                Some('/') if matches!(self.peek_at(1), Some('/' | '*')) => {
                    self.skip_trivia_or_literal();
                }
                _ => return,
            }
        }
    }

    fn skip_identifier(&mut self) {
        while matches!(self.peek(), Some(c) if is_ident_char(c)) {
            self.bump();
        }
    }

    fn read_identifier(&mut self) -> Option<String> {
        let c = self.peek()?;
        if !is_ident_start(c) {
            return None;
        }
        let start = self.pos;
        self.skip_identifier();
        Some(self.chars[start..self.pos].iter().collect())
    }

    /// Read an identifier or a string literal (`export { x as "a-b" }`).
    fn read_export_name(&mut self) -> Option<String> {
        match self.peek()? {
            q @ ('"' | '\'') => {
                let start = self.pos + 1;
                self.skip_string(q);
                let end = self.pos.saturating_sub(1).max(start);
                Some(self.chars[start..end].iter().collect())
            }
            _ => self.read_identifier(),
        }
    }

    /// Parse what follows an `export` keyword.
    fn scan_export_clause(&mut self, line: u32, out: &mut Vec<ExportSpec>) {
        self.skip_whitespace();
        let push = |out: &mut Vec<ExportSpec>, name: String, kind: ExportKind| {
            out.push(ExportSpec { name, kind, line });
        };

        match self.peek() {
            Some('{') => {
                self.bump();
                for name in self.scan_named_list() {
                    push(out, name, ExportKind::Named);
                }
            }
            Some('*') => {
                self.bump();
                self.skip_whitespace();
                if self.at_keyword("as") {
                    self.advance(2);
                    self.skip_whitespace();
                    if let Some(name) = self.read_export_name() {
                        push(out, name, ExportKind::Namespace);
                    }
                }
            }
            _ if self.at_keyword("default") => {
                self.advance(7);
                push(out, "default".to_string(), ExportKind::Default);
            }
            _ if self.at_keyword("const") || self.at_keyword("var") => {
                let kw_len = if self.at_keyword("const") { 5 } else { 3 };
                self.advance(kw_len);
                for name in self.scan_declarators() {
                    push(out, name, ExportKind::Declaration);
                }
            }
            _ if self.at_keyword("let") => {
                self.advance(3);
                for name in self.scan_declarators() {
                    push(out, name, ExportKind::Declaration);
                }
            }
            _ if self.at_keyword("async") => {
                self.advance(5);
                self.skip_whitespace();
                if self.at_keyword("function") {
                    self.advance(8);
                    if let Some(name) = self.scan_function_name() {
                        push(out, name, ExportKind::Declaration);
                    }
                }
            }
            _ if self.at_keyword("function") => {
                self.advance(8);
                if let Some(name) = self.scan_function_name() {
                    push(out, name, ExportKind::Declaration);
                }
            }
            _ if self.at_keyword("class") => {
                self.advance(5);
                self.skip_whitespace();
                if let Some(name) = self.read_identifier() {
                    push(out, name, ExportKind::Declaration);
                }
            }
            _ => {}
        }
    }

    fn scan_function_name(&mut self) -> Option<String> {
        self.skip_whitespace();
        if self.peek() == Some('*') {
            self.bump();
            self.skip_whitespace();
        }
        self.read_identifier()
    }

    /// `{ a, b as c, d as default }` after the opening brace.
    fn scan_named_list(&mut self) -> Vec<String> {
        let mut names = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => break,
                Some('}') => {
                    self.bump();
                    break;
                }
                Some(',') => {
                    self.bump();
                    continue;
                }
                _ => {}
            }

            let Some(local) = self.read_export_name() else {
                self.bump();
                continue;
            };
            self.skip_whitespace();
            if self.at_keyword("as") {
                self.advance(2);
                self.skip_whitespace();
                if let Some(alias) = self.read_export_name() {
                    names.push(alias);
                    continue;
                }
            }
            names.push(local);
        }
        names
    }

    /// Declarator list after `const`/`let`/`var`.
    fn scan_declarators(&mut self) -> Vec<String> {
        let mut names = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some('{') => {
                    self.bump();
                    names.extend(self.scan_object_pattern());
                }
                Some('[') => {
                    self.bump();
                    names.extend(self.scan_array_pattern());
                }
                _ => match self.read_identifier() {
                    Some(name) => names.push(name),
                    None => return names,
                },
            }

            if !self.skip_initializer() {
                return names;
            }
        }
    }

    /// Skip `= expr` up to the end of the declarator. Returns `true` when a
    /// comma announces another declarator.
    fn skip_initializer(&mut self) -> bool {
        let mut depth = 0usize;
        let mut saw_newline = false;

        while let Some(c) = self.peek() {
            if depth == 0 && saw_newline && STATEMENT_KEYWORDS.iter().any(|k| self.at_keyword(k)) {
                return false;
            }
            if self.skip_trivia_or_literal() {
                continue;
            }
            match c {
                '{' | '(' | '[' => depth += 1,
                '}' | ')' | ']' => {
                    if depth == 0 {
                        return false;
                    }
                    depth -= 1;
                }
                ',' if depth == 0 => {
                    self.bump();
                    return true;
                }
                ';' if depth == 0 => {
                    self.bump();
                    return false;
                }
                '\n' => saw_newline = true,
                c if !c.is_whitespace() => saw_newline = false,
                _ => {}
            }
            self.bump();
        }
        false
    }

    /// `{ a, b: c, ...rest }` after the opening brace; yields bound names.
    fn scan_object_pattern(&mut self) -> Vec<String> {
        let mut names = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => break,
                Some('}') => {
                    self.bump();
                    break;
                }
                Some(',') => {
                    self.bump();
                    continue;
                }
                Some('.') => {
                    while self.peek() == Some('.') {
                        self.bump();
                    }
                    if let Some(rest) = self.read_identifier() {
                        names.push(rest);
                    }
                    continue;
                }
                _ => {}
            }

            let Some(key) = self.read_export_name() else {
                self.bump();
                continue;
            };
            self.skip_whitespace();
            if self.peek() == Some(':') {
                self.bump();
                self.skip_whitespace();
                match self.peek() {
                    Some('{') => {
                        self.bump();
                        names.extend(self.scan_object_pattern());
                    }
                    Some('[') => {
                        self.bump();
                        names.extend(self.scan_array_pattern());
                    }
                    _ => {
                        if let Some(alias) = self.read_identifier() {
                            names.push(alias);
                        }
                    }
                }
            } else {
                names.push(key);
            }
            self.skip_default_value('}');
        }
        names
    }

    /// `[a, , b = 1, ...rest]` after the opening bracket.
    fn scan_array_pattern(&mut self) -> Vec<String> {
        let mut names = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => break,
                Some(']') => {
                    self.bump();
                    break;
                }
                Some(',' | '.') => {
                    self.bump();
                    continue;
                }
                Some('{') => {
                    self.bump();
                    names.extend(self.scan_object_pattern());
                }
                Some('[') => {
                    self.bump();
                    names.extend(self.scan_array_pattern());
                }
                _ => match self.read_identifier() {
                    Some(name) => names.push(name),
                    None => self.bump(),
                },
            }
            self.skip_default_value(']');
        }
        names
    }

    /// Skip `= value` inside a pattern, stopping before `,` or `close`.
    fn skip_default_value(&mut self, close: char) {
        self.skip_whitespace();
        if self.peek() != Some('=') {
            return;
        }
        self.bump();
        let mut depth = 0usize;
        while let Some(c) = self.peek() {
            if self.skip_trivia_or_literal() {
                continue;
            }
            match c {
                '{' | '(' | '[' => depth += 1,
                ',' if depth == 0 => return,
                _ if c == close && depth == 0 => return,
                '}' | ')' | ']' => depth = depth.saturating_sub(1),
                _ => {}
            }
            self.bump();
        }
    }
}
