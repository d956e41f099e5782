pub mod token;
pub mod lexer;
pub mod ast;
pub mod parser;
pub mod references;

pub use token::*;
pub use lexer::*;
pub use ast::*;
pub use parser::*;
pub use references::*;
pub use diagnostics::Span;

#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub value: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(value: T, span: Span) -> Self {
        Self { value, span }
    }
}

/// Lexes and parses `source` in one go.
pub fn parse_module(source: &str, file_id: u32) -> (Module, Vec<diagnostics::Diagnostic>) {
    parse_module_with_jsx(source, file_id, false)
}

pub fn parse_module_with_jsx(
    source: &str,
    file_id: u32,
    jsx: bool,
) -> (Module, Vec<diagnostics::Diagnostic>) {
    let mut lexer = Lexer::new(source.to_string(), file_id).with_jsx(jsx);
    let tokens = lexer.tokenize();
    let mut parser = Parser::new(tokens);
    parser.parse()
}

/// Whether files with this extension may contain JSX. Plain TypeScript uses
/// `<T>value` for type assertions instead.
pub fn allows_jsx(extension: &str) -> bool {
    !matches!(extension, "ts" | "mts" | "cts")
}
