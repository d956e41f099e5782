use syntax::ast::*;
use syntax::{Spanned, Token};

use crate::decide::SpecifierMap;
use crate::error::RewriteError;

/// Replaces module specifiers found in `map` and pins numeric literals to
/// their source text. `source` is the text the module was parsed from.
pub struct SpecifierRewriter<'a> {
    map: &'a SpecifierMap,
    source: &'a str,
}

impl<'a> SpecifierRewriter<'a> {
    pub fn new(map: &'a SpecifierMap, source: &'a str) -> Self {
        Self { map, source }
    }

    pub fn rewrite_module(&self, module: Module) -> Result<Module, RewriteError> {
        Ok(Module {
            body: self.rewrite_nodes(module.body)?,
        })
    }

    fn rewrite_nodes(&self, nodes: Vec<Node>) -> Result<Vec<Node>, RewriteError> {
        nodes.into_iter().map(|node| self.rewrite_node(node)).collect()
    }

    fn rewrite_node(&self, node: Node) -> Result<Node, RewriteError> {
        match node {
            Node::Import(mut import) => {
                import.clause = self.rewrite_nodes(import.clause)?;
                import.attributes = self.rewrite_nodes(import.attributes)?;
                let specifier = import
                    .specifier
                    .take()
                    .ok_or(RewriteError::MissingSpecifier { span: import.span })?;
                import.specifier = Some(self.rewrite_specifier(specifier));
                Ok(Node::Import(import))
            }
            Node::Export(mut export) => {
                export.clause = self.rewrite_nodes(export.clause)?;
                export.attributes = self.rewrite_nodes(export.attributes)?;
                export.specifier = export
                    .specifier
                    .take()
                    .map(|specifier| self.rewrite_specifier(specifier));
                Ok(Node::Export(export))
            }
            Node::ImportCall(mut call) => {
                call.callee = self.rewrite_nodes(call.callee)?;
                call.arguments = self.rewrite_call_arguments(call.arguments)?;
                Ok(Node::ImportCall(call))
            }
            Node::Literal(literal) => Ok(Node::Literal(self.rewrite_literal(literal))),
            Node::Group(group) => Ok(Node::Group(Group {
                children: self.rewrite_nodes(group.children)?,
                ..group
            })),
            Node::Token(_) => Ok(node),
        }
    }

    fn rewrite_specifier(&self, specifier: Spanned<String>) -> Spanned<String> {
        match self.map.get(&specifier.value) {
            Some(resolved) => Spanned::new(resolved.to_string(), specifier.span),
            None => specifier,
        }
    }

    /// Each argument that is a lone string literal is looked up on its own.
    fn rewrite_call_arguments(&self, arguments: Group) -> Result<Group, RewriteError> {
        let positions = string_argument_positions(&arguments.children);
        let children = arguments
            .children
            .into_iter()
            .enumerate()
            .map(|(index, child)| match child {
                Node::Literal(literal) if positions.contains(&index) => {
                    Ok(Node::Literal(self.rewrite_string_argument(literal)))
                }
                other => self.rewrite_node(other),
            })
            .collect::<Result<_, _>>()?;
        Ok(Group {
            children,
            ..arguments
        })
    }

    fn rewrite_string_argument(&self, literal: Spanned<Literal>) -> Spanned<Literal> {
        match &literal.value {
            Literal::String(text) => match self.map.get(text) {
                Some(resolved) => Spanned::new(Literal::String(resolved.to_string()), literal.span),
                None => literal,
            },
            Literal::Number(_) => self.rewrite_literal(literal),
        }
    }

    fn rewrite_literal(&self, literal: Spanned<Literal>) -> Spanned<Literal> {
        let Spanned { value, span } = literal;
        match value {
            Literal::Number(number) => {
                let raw = span.slice(self.source).map(str::to_string).or(number.raw);
                Spanned::new(
                    Literal::Number(NumberLiteral {
                        value: number.value,
                        raw,
                    }),
                    span,
                )
            }
            other => Spanned::new(other, span),
        }
    }
}

/// Indices of the children that are the sole string literal of their argument.
fn string_argument_positions(children: &[Node]) -> Vec<usize> {
    let comma_positions = children
        .iter()
        .enumerate()
        .filter(|(_, node)| matches!(node, Node::Token(token) if token.value == Token::Comma))
        .map(|(index, _)| index);

    let mut positions = Vec::new();
    let mut start = 0;
    for end in comma_positions.chain(std::iter::once(children.len())) {
        let argument = &children[start..end];
        if sole_string_literal(argument).is_some() {
            if let Some(offset) = argument.iter().position(|node| !node.is_trivia()) {
                positions.push(start + offset);
            }
        }
        start = end + 1;
    }
    positions
}

#[cfg(test)]
mod tests {
    use super::*;
    use syntax::parse_module;

    fn rewrite(source: &str, map: &SpecifierMap) -> Result<String, RewriteError> {
        let (module, _) = parse_module(source, 0);
        let module = SpecifierRewriter::new(map, source).rewrite_module(module)?;
        Ok(emit_js::emit(&module, "\n"))
    }

    fn map(entries: &[(&str, &str)]) -> SpecifierMap {
        let mut map = SpecifierMap::default();
        for (original, resolved) in entries {
            map.insert(*original, *resolved);
        }
        map
    }

    #[test]
    fn test_rewrites_import_and_keeps_clause() {
        let map = map(&[("./A", "./A/index.ts")]);
        assert_eq!(
            rewrite("import { A } from './A';", &map).unwrap(),
            "import { A } from \"./A/index.ts\";"
        );
    }

    #[test]
    fn test_unmapped_specifiers_keep_their_text() {
        let map = map(&[("./a", "./a.ts")]);
        assert_eq!(
            rewrite("import React from 'react';\nimport './a';\n", &map).unwrap(),
            "import React from \"react\";\nimport \"./a.ts\";\n"
        );
    }

    #[test]
    fn test_rewrites_reexports_and_passes_local_exports() {
        let map = map(&[("./b", "./b.tsx")]);
        assert_eq!(
            rewrite("export * as b from './b';\nexport { c };\n", &map).unwrap(),
            "export * as b from \"./b.tsx\";\nexport { c };\n"
        );
    }

    #[test]
    fn test_rewrites_import_attributes_untouched() {
        let map = map(&[("./data.json", "./data.json.ts")]);
        assert_eq!(
            rewrite("import data from './data.json' with { type: 'json' };", &map).unwrap(),
            "import data from \"./data.json.ts\" with { type: \"json\" };"
        );
    }

    #[test]
    fn test_rewrites_each_string_argument_of_import_calls() {
        let map = map(&[("./lazy", "./lazy.ts")]);
        assert_eq!(
            rewrite("const m = import('./lazy', './lazy');\nimport(name);\n", &map).unwrap(),
            "const m = import(\"./lazy.ts\", \"./lazy.ts\");\nimport(name);\n"
        );
    }

    #[test]
    fn test_nested_import_calls_are_rewritten() {
        let map = map(&[("./page", "./page.tsx")]);
        assert_eq!(
            rewrite("const routes = [() => import('./page')];", &map).unwrap(),
            "const routes = [() => import(\"./page.tsx\")];"
        );
    }

    #[test]
    fn test_numbers_keep_source_text() {
        let map = SpecifierMap::default();
        assert_eq!(
            rewrite("const n = [100_000, 0o777777777777n, 0x00111, 1e3];", &map).unwrap(),
            "const n = [100_000, 0o777777777777n, 0x00111, 1e3];"
        );
    }

    #[test]
    fn test_import_without_specifier_is_an_error() {
        let map = SpecifierMap::default();
        let error = rewrite("import { a } from ;", &map).unwrap_err();
        assert!(matches!(error, RewriteError::MissingSpecifier { .. }));
    }

    #[test]
    fn test_string_argument_positions() {
        let (module, _) = parse_module("import('./a', x, 'b', f('c'))", 0);
        let Node::ImportCall(call) = &module.body[0] else {
            panic!("expected an import call");
        };
        let positions = string_argument_positions(&call.arguments.children);
        assert_eq!(positions.len(), 2);
    }
}
