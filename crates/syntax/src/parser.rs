use crate::{Token, Spanned, ast::*};
use diagnostics::{Span, Diagnostic, WarningCode};

/// Builds a [`Module`] out of lexer tokens.
///
/// The parser never fails: anything it does not recognize is kept as a plain
/// token node, and unbalanced delimiters only produce warnings.
pub struct Parser {
    tokens: Vec<Spanned<Token>>,
    current: usize,
    diagnostics: Vec<Diagnostic>,
}

impl Parser {
    pub fn new(tokens: Vec<Spanned<Token>>) -> Self {
        Self {
            tokens,
            current: 0,
            diagnostics: Vec::new(),
        }
    }

    pub fn parse(&mut self) -> (Module, Vec<Diagnostic>) {
        let body = self.parse_nodes(None);
        let module = Module { body };
        let diagnostics = std::mem::take(&mut self.diagnostics);
        (module, diagnostics)
    }

    fn parse_nodes(&mut self, closing: Option<&Token>) -> Vec<Node> {
        let mut nodes = Vec::new();

        while let Some(token) = self.peek() {
            if token.value == Token::Eof {
                break;
            }
            if token.value.is_closing() {
                if closing == Some(&token.value) {
                    break;
                }
                let span = token.span;
                let message = format!("unexpected '{}'", token.value.text());
                self.warn(WarningCode::UnexpectedDelimiter, span, message);
                nodes.push(Node::Token(self.bump()));
                continue;
            }
            nodes.push(self.parse_node());
        }

        nodes
    }

    fn parse_node(&mut self) -> Node {
        let Spanned { value, span } = self.bump();
        match value {
            Token::Import => self.parse_import(Spanned::new(Token::Import, span)),
            Token::Export => self.parse_export(Spanned::new(Token::Export, span)),
            open @ (Token::LeftParen | Token::LeftBrace | Token::LeftBracket) => {
                Node::Group(self.parse_group(Spanned::new(open, span)))
            }
            Token::String(value) => Node::Literal(Spanned::new(Literal::String(value), span)),
            Token::Number(raw) => Node::Literal(Spanned::new(
                Literal::Number(NumberLiteral {
                    value: canonical_number(&raw),
                    raw: None,
                }),
                span,
            )),
            other => Node::Token(Spanned::new(other, span)),
        }
    }

    /// `open` is already consumed.
    fn parse_group(&mut self, open: Spanned<Token>) -> Group {
        let closing = open.value.closing();
        let children = self.parse_nodes(closing.as_ref());

        let closed = matches!(
            (self.peek(), &closing),
            (Some(token), Some(expected)) if token.value == *expected
        );
        let close = if closed {
            Some(self.bump())
        } else {
            let message = format!("unclosed '{}'", open.value.text());
            self.warn(WarningCode::UnclosedDelimiter, open.span, message);
            None
        };

        Group { open, children, close }
    }

    /// `keyword` (the `import` token) is already consumed.
    fn parse_import(&mut self, keyword: Spanned<Token>) -> Node {
        let Some(next) = self.next_significant(self.current) else {
            return Node::Token(keyword);
        };
        let start = keyword.span;

        match self.tokens[next].value.clone() {
            Token::LeftParen => {
                let mut callee = vec![Node::Token(keyword)];
                callee.extend(self.take_tokens(next));
                let open = self.bump();
                let arguments = self.parse_group(open);
                Node::ImportCall(ImportCall {
                    span: self.span_from(start),
                    callee,
                    arguments,
                })
            }
            Token::String(_) => {
                let mut clause = vec![Node::Token(keyword)];
                clause.extend(self.take_tokens(next));
                let specifier = self.take_specifier();
                let attributes = self.parse_attributes();
                Node::Import(ImportDeclaration {
                    span: self.span_from(start),
                    clause,
                    specifier,
                    attributes,
                })
            }
            Token::LeftBrace | Token::Star | Token::Ident(_) => {
                match self.scan_import_clause(next) {
                    Some(ClauseEnd::Specifier(at)) => {
                        let clause = self.parse_clause(keyword, at);
                        let specifier = self.take_specifier();
                        let attributes = self.parse_attributes();
                        Node::Import(ImportDeclaration {
                            span: self.span_from(start),
                            clause,
                            specifier,
                            attributes,
                        })
                    }
                    Some(ClauseEnd::MissingSpecifier(from)) => {
                        let clause = self.parse_clause(keyword, from + 1);
                        Node::Import(ImportDeclaration {
                            span: self.span_from(start),
                            clause,
                            specifier: None,
                            attributes: Vec::new(),
                        })
                    }
                    // `import x = require(...)` and friends
                    None => Node::Token(keyword),
                }
            }
            // `import.meta`, `{ import: ... }`
            _ => Node::Token(keyword),
        }
    }

    /// `keyword` (the `export` token) is already consumed.
    fn parse_export(&mut self, keyword: Spanned<Token>) -> Node {
        let Some(mut next) = self.next_significant(self.current) else {
            return Node::Token(keyword);
        };

        if self.tokens[next].value.is_ident("type") {
            match self.next_significant(next + 1) {
                Some(after)
                    if matches!(self.tokens[after].value, Token::LeftBrace | Token::Star) =>
                {
                    next = after;
                }
                _ => return Node::Token(keyword),
            }
        }

        match self.tokens[next].value.clone() {
            Token::Star => {
                let at = self
                    .scan_namespace_export(next)
                    .and_then(|from| self.from_specifier(from));
                match at {
                    Some(at) => self.parse_export_from(keyword, at),
                    None => Node::Token(keyword),
                }
            }
            Token::LeftBrace => {
                let Some(close) = self.scan_braces(next) else {
                    return Node::Token(keyword);
                };
                let at = self
                    .next_significant(close + 1)
                    .and_then(|from| self.from_specifier(from));
                match at {
                    Some(at) => self.parse_export_from(keyword, at),
                    None => {
                        // local re-export: `export { a, b as c }`
                        let start = keyword.span;
                        let clause = self.parse_clause(keyword, close + 1);
                        Node::Export(ExportDeclaration {
                            span: self.span_from(start),
                            clause,
                            specifier: None,
                            attributes: Vec::new(),
                        })
                    }
                }
            }
            _ => Node::Token(keyword),
        }
    }

    fn parse_export_from(&mut self, keyword: Spanned<Token>, specifier_at: usize) -> Node {
        let start = keyword.span;
        let clause = self.parse_clause(keyword, specifier_at);
        let specifier = self.take_specifier();
        let attributes = self.parse_attributes();
        Node::Export(ExportDeclaration {
            span: self.span_from(start),
            clause,
            specifier,
            attributes,
        })
    }

    /// Looks ahead through an import clause (`a`, `* as ns`, `{ a, b as c }`,
    /// `type T`, combinations joined by commas) and reports where it ends.
    fn scan_import_clause(&self, start: usize) -> Option<ClauseEnd> {
        let mut index = start;
        loop {
            match &self.tokens[index].value {
                Token::Ident(name) if name == "from" => {
                    let next = self.next_significant(index + 1)?;
                    match &self.tokens[next].value {
                        Token::String(_) => return Some(ClauseEnd::Specifier(next)),
                        // `import from from "x"` binds a default named `from`
                        Token::Ident(other) if other == "from" => index = next,
                        Token::Comma => index = next,
                        _ => return Some(ClauseEnd::MissingSpecifier(index)),
                    }
                }
                Token::Ident(_) | Token::Star | Token::Comma => {
                    index = self.next_significant(index + 1)?;
                }
                Token::LeftBrace => {
                    let close = self.scan_braces(index)?;
                    index = self.next_significant(close + 1)?;
                }
                _ => return None,
            }
        }
    }

    /// `* from`, `* as ns from`; returns the index of `from`.
    fn scan_namespace_export(&self, star: usize) -> Option<usize> {
        let next = self.next_significant(star + 1)?;
        if self.tokens[next].value.is_ident("as") {
            let name = self.next_significant(next + 1)?;
            if !matches!(self.tokens[name].value, Token::Ident(_) | Token::String(_)) {
                return None;
            }
            return self.next_significant(name + 1);
        }
        Some(next)
    }

    /// Index of the string after `from` at `index`, if that is what follows.
    fn from_specifier(&self, index: usize) -> Option<usize> {
        if !self.tokens[index].value.is_ident("from") {
            return None;
        }
        let next = self.next_significant(index + 1)?;
        matches!(self.tokens[next].value, Token::String(_)).then_some(next)
    }

    /// Finds the `}` closing the binding list opened at `open`. Only names,
    /// commas and string names may appear inside.
    fn scan_braces(&self, open: usize) -> Option<usize> {
        let mut index = open + 1;
        while let Some(token) = self.tokens.get(index) {
            match &token.value {
                Token::RightBrace => return Some(index),
                Token::Ident(_) | Token::Comma | Token::String(_) => {}
                value if value.is_trivia() => {}
                _ => return None,
            }
            index += 1;
        }
        None
    }

    /// Parses the nodes between the already consumed keyword and `end` (exclusive).
    fn parse_clause(&mut self, keyword: Spanned<Token>, end: usize) -> Vec<Node> {
        let mut clause = vec![Node::Token(keyword)];
        while self.current < end && !self.is_at_end() {
            clause.push(self.parse_node());
        }
        clause
    }

    fn take_specifier(&mut self) -> Option<Spanned<String>> {
        let token = self.bump();
        match token.value {
            Token::String(value) => Some(Spanned::new(value, token.span)),
            _ => None,
        }
    }

    /// Optional `assert { ... }` / `with { ... }` after a specifier.
    fn parse_attributes(&mut self) -> Vec<Node> {
        let Some(keyword) = self.next_significant(self.current) else {
            return Vec::new();
        };
        let is_attribute_keyword = matches!(
            &self.tokens[keyword].value,
            Token::Ident(name) if name == "assert" || name == "with"
        );
        if !is_attribute_keyword {
            return Vec::new();
        }
        let Some(open) = self.next_significant(keyword + 1) else {
            return Vec::new();
        };
        if self.tokens[open].value != Token::LeftBrace {
            return Vec::new();
        }

        let mut attributes = self.take_tokens(open);
        let open = self.bump();
        attributes.push(Node::Group(self.parse_group(open)));
        attributes
    }

    /// Consumes every token before `end` as a plain token node.
    fn take_tokens(&mut self, end: usize) -> Vec<Node> {
        let mut nodes = Vec::new();
        while self.current < end {
            nodes.push(Node::Token(self.bump()));
        }
        nodes
    }

    fn next_significant(&self, from: usize) -> Option<usize> {
        (from..self.tokens.len()).find(|&index| {
            let value = &self.tokens[index].value;
            !value.is_trivia() && *value != Token::Eof
        })
    }

    fn span_from(&self, start: Span) -> Span {
        let end = self.previous().map_or(start.end, |token| token.span.end);
        Span::new(start.file_id, start.start, end)
    }

    // Helper methods
    fn peek(&self) -> Option<&Spanned<Token>> {
        self.tokens.get(self.current)
    }

    fn previous(&self) -> Option<&Spanned<Token>> {
        if self.current > 0 {
            self.tokens.get(self.current - 1)
        } else {
            None
        }
    }

    fn bump(&mut self) -> Spanned<Token> {
        let token = self.tokens[self.current].clone();
        if !self.is_at_end() {
            self.current += 1;
        }
        token
    }

    fn is_at_end(&self) -> bool {
        self.peek().map_or(true, |t| t.value == Token::Eof)
    }

    fn warn(&mut self, code: WarningCode, span: Span, message: String) {
        self.diagnostics.push(Diagnostic::warning(code, span, message));
    }
}

enum ClauseEnd {
    /// Index of the specifier string.
    Specifier(usize),
    /// Index of a `from` that is not followed by a string.
    MissingSpecifier(usize),
}

/// Normalizes numeric literal text the way a printer without access to the
/// source would see it: separators dropped, radix integers in decimal.
pub fn canonical_number(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| *c != '_').collect();
    let (body, bigint) = match digits.strip_suffix('n') {
        Some(body) => (body, true),
        None => (digits.as_str(), false),
    };
    let radix = match body.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };
    let value = match radix {
        Some(radix) => u128::from_str_radix(&body[2..], radix)
            .map(|value| value.to_string())
            .unwrap_or_else(|_| body.to_string()),
        None => body.to_string(),
    };
    if bigint {
        format!("{value}n")
    } else {
        value
    }
}
