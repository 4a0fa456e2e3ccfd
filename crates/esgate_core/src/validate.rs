//! Node and token gating against a [`FeatureSet`].
//!
//! Both validators are pure decision tables.  They never raise: the caller
//! turns a `false` into an "Unexpected token" error.  Anything a table does
//! not name is valid.

use crate::features::{Feature, FeatureSet};
use crate::parser::ast::Node;
use crate::parser::scanner::{Token, TokenKind, TokenValue};
use crate::syntax::NodeType;

/// Decide whether a completed node is allowed by `features`.
pub fn is_node_valid(node: &Node, features: &FeatureSet) -> bool {
    use Feature::*;

    match node.kind {
        NodeType::VariableDeclaration => {
            node.str_field("kind") == Some("var") || features.enabled(BlockBindings)
        }
        NodeType::ObjectPattern | NodeType::ArrayPattern => features.enabled(Destructuring),
        NodeType::AssignmentPattern => features.either(Destructuring, DefaultParams),
        NodeType::RestElement => features.either(Destructuring, RestParams),
        NodeType::ForOfStatement => features.enabled(ForOf),
        NodeType::Property => {
            !(node.flag("computed") && !features.enabled(ObjectLiteralComputedProperties)
                || node.flag("method") && !features.enabled(ObjectLiteralShorthandMethods)
                || node.flag("shorthand") && !features.enabled(ObjectLiteralShorthandProperties))
        }
        NodeType::FunctionExpression | NodeType::FunctionDeclaration => {
            !node.flag("generator") || features.enabled(Generators)
        }
        NodeType::YieldExpression => features.enabled(Generators),
        NodeType::SpreadElement => features.enabled(Spread),
        NodeType::ClassDeclaration | NodeType::ClassExpression => features.enabled(Classes),
        NodeType::Super => features.either(Classes, SuperInFunctions),
        NodeType::ImportDeclaration
        | NodeType::ExportNamedDeclaration
        | NodeType::ExportDefaultDeclaration
        | NodeType::ExportAllDeclaration => features.enabled(Modules),
        _ => true,
    }
}

/// A token about to be consumed, together with the source it was read from.
#[derive(Debug, Clone, Copy)]
pub struct TokenCursor<'a> {
    /// The current token.
    pub token: &'a Token,
    /// The complete source text.
    pub source: &'a str,
}

impl<'a> TokenCursor<'a> {
    /// Pair a token with its source.
    pub fn new(token: &'a Token, source: &'a str) -> Self {
        Self { token, source }
    }

    /// Up to the first `n` bytes of the token's source text.
    fn prefix(&self, n: usize) -> &'a str {
        let start = self.token.start();
        let end = (start + n).min(self.token.end());
        self.source.get(start..end).unwrap_or_default()
    }
}

/// Decide whether the lexer may advance past the cursor's token.
pub fn is_token_valid(cursor: &TokenCursor<'_>, features: &FeatureSet) -> bool {
    use Feature::*;

    match cursor.token.kind {
        TokenKind::Arrow => features.enabled(ArrowFunctions),
        TokenKind::Num => match cursor.prefix(2).to_ascii_lowercase().as_str() {
            "0b" => features.enabled(BinaryLiterals),
            "0o" => features.enabled(OctalLiterals),
            _ => true,
        },
        TokenKind::Regexp => match &cursor.token.value {
            TokenValue::Regex { flags, .. } => {
                (!flags.contains('y') || features.enabled(RegexYFlag))
                    && (!flags.contains('u') || features.enabled(RegexUFlag))
            }
            _ => true,
        },
        TokenKind::Ellipsis => features.either(RestParams, Spread),
        TokenKind::BackQuote | TokenKind::Template | TokenKind::DollarBraceL => {
            features.enabled(TemplateStrings)
        }
        TokenKind::JsxName | TokenKind::JsxText | TokenKind::JsxTagStart | TokenKind::JsxTagEnd => {
            features.enabled(Jsx)
        }
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::Value;
    use crate::parser::scanner::{LexMode, Scanner, ScannerOptions};

    fn node(kind: NodeType, fields: Vec<(&'static str, Value)>) -> Node {
        Node {
            kind,
            start: 0,
            end: 0,
            id: 0,
            range: None,
            loc: None,
            fields,
        }
    }

    fn first_token(source: &str) -> Token {
        let opts = ScannerOptions {
            ecma6: true,
            jsx: true,
        };
        Scanner::new(source, opts).next_token(LexMode::Normal).unwrap()
    }

    fn token_ok(source: &str, features: &FeatureSet) -> bool {
        let token = first_token(source);
        is_token_valid(&TokenCursor::new(&token, source), features)
    }

    #[test]
    fn test_var_always_valid() {
        let var = node(NodeType::VariableDeclaration, vec![("kind", "var".into())]);
        let lets = node(NodeType::VariableDeclaration, vec![("kind", "let".into())]);
        assert!(is_node_valid(&var, &FeatureSet::new()));
        assert!(!is_node_valid(&lets, &FeatureSet::new()));
        assert!(is_node_valid(&lets, &FeatureSet::new().with(Feature::BlockBindings, true)));
    }

    #[test]
    fn test_dual_feature_gates() {
        let rest = node(NodeType::RestElement, vec![]);
        let default = node(NodeType::AssignmentPattern, vec![]);
        let sup = node(NodeType::Super, vec![]);
        let destructuring = FeatureSet::new().with(Feature::Destructuring, true);
        assert!(is_node_valid(&rest, &destructuring));
        assert!(is_node_valid(&default, &destructuring));
        assert!(is_node_valid(&rest, &FeatureSet::new().with(Feature::RestParams, true)));
        assert!(is_node_valid(&default, &FeatureSet::new().with(Feature::DefaultParams, true)));
        assert!(!is_node_valid(&default, &FeatureSet::new().with(Feature::RestParams, true)));
        assert!(is_node_valid(&sup, &FeatureSet::new().with(Feature::SuperInFunctions, true)));
        assert!(!is_node_valid(&sup, &FeatureSet::new()));
    }

    #[test]
    fn test_property_compound_check() {
        let prop = |computed: bool, method: bool, shorthand: bool| {
            node(
                NodeType::Property,
                vec![
                    ("method", method.into()),
                    ("shorthand", shorthand.into()),
                    ("computed", computed.into()),
                ],
            )
        };
        let none = FeatureSet::new();
        assert!(is_node_valid(&prop(false, false, false), &none));
        assert!(!is_node_valid(&prop(true, false, false), &none));
        assert!(!is_node_valid(&prop(false, true, false), &none));
        assert!(!is_node_valid(&prop(false, false, true), &none));
        let computed = FeatureSet::new().with(Feature::ObjectLiteralComputedProperties, true);
        assert!(is_node_valid(&prop(true, false, false), &computed));
        assert!(!is_node_valid(&prop(true, true, false), &computed));
    }

    #[test]
    fn test_generator_functions() {
        let plain = node(NodeType::FunctionDeclaration, vec![("generator", false.into())]);
        let generator = node(NodeType::FunctionExpression, vec![("generator", true.into())]);
        assert!(is_node_valid(&plain, &FeatureSet::new()));
        assert!(!is_node_valid(&generator, &FeatureSet::new()));
        assert!(is_node_valid(&generator, &FeatureSet::new().with(Feature::Generators, true)));
    }

    #[test]
    fn test_module_nodes() {
        for kind in [
            NodeType::ImportDeclaration,
            NodeType::ExportNamedDeclaration,
            NodeType::ExportDefaultDeclaration,
            NodeType::ExportAllDeclaration,
        ] {
            assert!(!is_node_valid(&node(kind, vec![]), &FeatureSet::new()));
            assert!(is_node_valid(
                &node(kind, vec![]),
                &FeatureSet::new().with(Feature::Modules, true)
            ));
        }
        assert!(is_node_valid(&node(NodeType::ImportSpecifier, vec![]), &FeatureSet::new()));
    }

    #[test]
    fn test_numeric_prefixes() {
        let none = FeatureSet::new();
        assert!(!token_ok("0b101", &none));
        assert!(!token_ok("0B1", &none));
        assert!(!token_ok("0o17", &none));
        assert!(token_ok("0x1F", &none));
        assert!(token_ok("7", &none));
        assert!(token_ok("0b1", &none.clone().with(Feature::BinaryLiterals, true)));
        assert!(token_ok("0O7", &none.with(Feature::OctalLiterals, true)));
    }

    #[test]
    fn test_regex_flags_are_independent() {
        let sticky = FeatureSet::new().with(Feature::RegexYFlag, true);
        assert!(token_ok("/a/g", &FeatureSet::new()));
        assert!(token_ok("/a/y", &sticky));
        assert!(!token_ok("/a/uy", &sticky));
        assert!(token_ok("/a/uy", &sticky.with(Feature::RegexUFlag, true)));
    }

    #[test]
    fn test_punctuation_gates() {
        let none = FeatureSet::new();
        assert!(!token_ok("=>", &none));
        assert!(!token_ok("...", &none));
        assert!(token_ok("...", &none.clone().with(Feature::Spread, true)));
        assert!(!token_ok("`a`", &none));
        assert!(token_ok("`a`", &none.clone().with(Feature::TemplateStrings, true)));
        assert!(!token_ok("<", &none));
        assert!(token_ok("<", &none.with(Feature::Jsx, true)));
        assert!(token_ok("(", &FeatureSet::new()));
    }
}
