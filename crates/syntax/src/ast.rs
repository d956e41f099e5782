use crate::{Spanned, Token};
use diagnostics::Span;

/// A parsed source file: a flat sequence of nodes in source order.
///
/// Only the shapes that carry module specifiers (and the literals whose
/// printed form matters) get their own node kinds; everything else is kept as
/// tokens so the printer can reproduce it.
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub body: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Import(ImportDeclaration),
    Export(ExportDeclaration),
    ImportCall(ImportCall),
    Literal(Spanned<Literal>),
    Group(Group),
    Token(Spanned<Token>),
}

/// `import <clause> from "x"` or `import "x"`, with an optional
/// `assert { ... }` / `with { ... }` attribute clause.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportDeclaration {
    pub span: Span,
    /// Everything from the `import` keyword up to the specifier, trivia included.
    pub clause: Vec<Node>,
    pub specifier: Option<Spanned<String>>,
    pub attributes: Vec<Node>,
}

/// `export * from "x"`, `export { a } from "x"` or a local `export { a }`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportDeclaration {
    pub span: Span,
    pub clause: Vec<Node>,
    /// Absent for re-exports of local bindings.
    pub specifier: Option<Spanned<String>>,
    pub attributes: Vec<Node>,
}

/// `import(...)`
#[derive(Debug, Clone, PartialEq)]
pub struct ImportCall {
    pub span: Span,
    /// The `import` keyword and any trivia before the parenthesis.
    pub callee: Vec<Node>,
    pub arguments: Group,
}

/// A delimited run of nodes: `( ... )`, `[ ... ]` or `{ ... }`.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub open: Spanned<Token>,
    pub children: Vec<Node>,
    /// Missing when the source ends before the group is closed.
    pub close: Option<Spanned<Token>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Number(NumberLiteral),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumberLiteral {
    /// Canonical form: no separators, radix integers in decimal, `n` kept for BigInts.
    pub value: String,
    /// Source text to print instead of `value`, when attached.
    pub raw: Option<String>,
}

impl Node {
    pub fn is_trivia(&self) -> bool {
        matches!(self, Node::Token(token) if token.value.is_trivia())
    }

    pub fn as_string_literal(&self) -> Option<&Spanned<Literal>> {
        match self {
            Node::Literal(literal) if matches!(literal.value, Literal::String(_)) => Some(literal),
            _ => None,
        }
    }
}

impl Group {
    /// Splits the children on top-level commas, dropping the commas themselves.
    pub fn arguments(&self) -> Vec<&[Node]> {
        self.children
            .split(|node| matches!(node, Node::Token(token) if token.value == Token::Comma))
            .collect()
    }
}

/// The string literal that makes up an argument, ignoring surrounding trivia.
/// `None` for anything that is not exactly one string literal.
pub fn sole_string_literal(argument: &[Node]) -> Option<&Spanned<Literal>> {
    let mut significant = argument.iter().filter(|node| !node.is_trivia());
    match (significant.next(), significant.next()) {
        (Some(node), None) => node.as_string_literal(),
        _ => None,
    }
}
