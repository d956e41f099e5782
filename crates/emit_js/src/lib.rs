use syntax::ast::*;
use syntax::Token;

/// Prints a module back to source text.
///
/// Tokens print as written, with two normalizations: string literals are
/// re-quoted with double quotes (non-ASCII characters escaped as UTF-16
/// `\uXXXX` units), and runs of blank lines collapse into one line break.
/// Numeric literals print their canonical value unless raw text is attached.
pub fn emit(module: &Module, newline: &str) -> String {
    let mut emitter = Emitter {
        output: String::new(),
        newline,
    };
    emitter.emit_nodes(&module.body);
    emitter.output
}

struct Emitter<'a> {
    output: String,
    newline: &'a str,
}

impl Emitter<'_> {
    fn emit_nodes(&mut self, nodes: &[Node]) {
        for node in nodes {
            self.emit_node(node);
        }
    }

    fn emit_node(&mut self, node: &Node) {
        match node {
            Node::Import(import) => {
                self.emit_nodes(&import.clause);
                if let Some(specifier) = &import.specifier {
                    self.output.push_str(&quote_string(&specifier.value));
                }
                self.emit_nodes(&import.attributes);
            }
            Node::Export(export) => {
                self.emit_nodes(&export.clause);
                if let Some(specifier) = &export.specifier {
                    self.output.push_str(&quote_string(&specifier.value));
                }
                self.emit_nodes(&export.attributes);
            }
            Node::ImportCall(call) => {
                self.emit_nodes(&call.callee);
                self.emit_group(&call.arguments);
            }
            Node::Literal(literal) => self.emit_literal(&literal.value),
            Node::Group(group) => self.emit_group(group),
            Node::Token(token) => self.emit_token(&token.value),
        }
    }

    fn emit_group(&mut self, group: &Group) {
        self.emit_token(&group.open.value);
        self.emit_nodes(&group.children);
        if let Some(close) = &group.close {
            self.emit_token(&close.value);
        }
    }

    fn emit_literal(&mut self, literal: &Literal) {
        match literal {
            Literal::String(value) => self.output.push_str(&quote_string(value)),
            Literal::Number(number) => {
                let text = number.raw.as_deref().unwrap_or(&number.value);
                self.output.push_str(text);
            }
        }
    }

    fn emit_token(&mut self, token: &Token) {
        match token {
            Token::LineBreak(_) => self.line_break(),
            Token::String(value) => self.output.push_str(&quote_string(value)),
            Token::Eof => {}
            other => self.output.push_str(&other.text()),
        }
    }

    /// Drops the break when the current line is blank.
    fn line_break(&mut self) {
        let kept = self.output.trim_end_matches(is_inline_whitespace).len();
        if kept == 0 || self.output[..kept].ends_with('\n') {
            self.output.truncate(kept);
            return;
        }
        self.output.push_str(self.newline);
    }
}

fn is_inline_whitespace(ch: char) -> bool {
    ch.is_whitespace() && ch != '\n' && ch != '\r'
}

/// Double-quoted JavaScript string literal for `value`.
pub fn quote_string(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for ch in value.chars() {
        match ch {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            '\u{8}' => quoted.push_str("\\b"),
            '\u{b}' => quoted.push_str("\\v"),
            '\u{c}' => quoted.push_str("\\f"),
            _ if ch.is_ascii_control() => {
                quoted.push_str(&format!("\\u{:04X}", ch as u32));
            }
            _ if !ch.is_ascii() => {
                let mut units = [0u16; 2];
                for unit in ch.encode_utf16(&mut units) {
                    quoted.push_str(&format!("\\u{:04X}", unit));
                }
            }
            _ => quoted.push(ch),
        }
    }
    quoted.push('"');
    quoted
}
