use crate::ast::*;
use diagnostics::Span;

/// A module specifier as written in the source, before any rewriting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecifierRef {
    pub text: String,
    pub span: Span,
}

/// Collects every specifier carried by static imports, re-exports and dynamic
/// `import()` calls, in source order. The same text may appear several times.
pub fn collect_specifiers(module: &Module) -> Vec<SpecifierRef> {
    let mut refs = Vec::new();
    collect_nodes(&module.body, &mut refs);
    refs
}

fn collect_nodes(nodes: &[Node], refs: &mut Vec<SpecifierRef>) {
    for node in nodes {
        match node {
            Node::Import(import) => {
                if let Some(specifier) = &import.specifier {
                    refs.push(SpecifierRef {
                        text: specifier.value.clone(),
                        span: specifier.span,
                    });
                }
            }
            Node::Export(export) => {
                if let Some(specifier) = &export.specifier {
                    refs.push(SpecifierRef {
                        text: specifier.value.clone(),
                        span: specifier.span,
                    });
                }
            }
            Node::ImportCall(call) => {
                for argument in call.arguments.arguments() {
                    match sole_string_literal(argument) {
                        Some(literal) => {
                            if let Literal::String(text) = &literal.value {
                                refs.push(SpecifierRef {
                                    text: text.clone(),
                                    span: literal.span,
                                });
                            }
                        }
                        None => collect_nodes(argument, refs),
                    }
                }
            }
            Node::Group(group) => collect_nodes(&group.children, refs),
            Node::Literal(_) | Node::Token(_) => {}
        }
    }
}
