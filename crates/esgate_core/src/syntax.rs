//! The closed catalog of syntax node types.
//!
//! Every [`crate::Node`] carries one of these types.  The catalog is a
//! read-only public surface: [`NodeType::ALL`] lists every type in
//! declaration order and [`syntax`] exposes the same data as a name map.

use std::collections::BTreeMap;
use std::fmt;

macro_rules! node_types {
    ($($name:ident),* $(,)?) => {
        /// A syntax node type name.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum NodeType {
            $($name,)*
        }

        impl NodeType {
            /// Every node type, in catalog order.
            pub const ALL: &'static [NodeType] = &[$(NodeType::$name,)*];

            /// The public type name (`"Identifier"`, `"JSXElement"`, …).
            pub fn as_str(self) -> &'static str {
                match self {
                    $(NodeType::$name => stringify!($name),)*
                }
            }
        }
    };
}

node_types! {
    AssignmentExpression,
    AssignmentPattern,
    ArrayExpression,
    ArrayPattern,
    ArrowFunctionExpression,
    BlockStatement,
    BinaryExpression,
    BreakStatement,
    CallExpression,
    CatchClause,
    ClassBody,
    ClassDeclaration,
    ClassExpression,
    ConditionalExpression,
    ContinueStatement,
    DoWhileStatement,
    DebuggerStatement,
    EmptyStatement,
    ExperimentalRestProperty,
    ExperimentalSpreadProperty,
    ExpressionStatement,
    ForStatement,
    ForInStatement,
    ForOfStatement,
    FunctionDeclaration,
    FunctionExpression,
    Identifier,
    IfStatement,
    Literal,
    LabeledStatement,
    LogicalExpression,
    MemberExpression,
    MetaProperty,
    MethodDefinition,
    NewExpression,
    ObjectExpression,
    ObjectPattern,
    Program,
    Property,
    RestElement,
    ReturnStatement,
    SequenceExpression,
    SpreadElement,
    Super,
    SwitchCase,
    SwitchStatement,
    TaggedTemplateExpression,
    TemplateElement,
    TemplateLiteral,
    ThisExpression,
    ThrowStatement,
    TryStatement,
    UnaryExpression,
    UpdateExpression,
    VariableDeclaration,
    VariableDeclarator,
    WhileStatement,
    WithStatement,
    YieldExpression,
    JSXIdentifier,
    JSXNamespacedName,
    JSXMemberExpression,
    JSXEmptyExpression,
    JSXExpressionContainer,
    JSXElement,
    JSXClosingElement,
    JSXOpeningElement,
    JSXAttribute,
    JSXSpreadAttribute,
    JSXText,
    ExportDeclaration,
    ExportBatchSpecifier,
    ExportSpecifier,
    ExportNamedDeclaration,
    ExportAllDeclaration,
    ExportDefaultDeclaration,
    ImportDeclaration,
    ImportSpecifier,
    ImportDefaultSpecifier,
    ImportNamespaceSpecifier,
}

impl NodeType {
    /// `true` when the type name contains `Function`.
    pub fn is_function(self) -> bool {
        self.as_str().contains("Function")
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The node-type catalog as a `name → name` map, sorted by name.
pub fn syntax() -> BTreeMap<&'static str, &'static str> {
    NodeType::ALL
        .iter()
        .map(|ty| (ty.as_str(), ty.as_str()))
        .collect()
}

/// The crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_names() {
        assert_eq!(NodeType::Identifier.as_str(), "Identifier");
        assert_eq!(NodeType::JSXSpreadAttribute.to_string(), "JSXSpreadAttribute");
        assert_eq!(NodeType::ALL.len(), syntax().len());
    }

    #[test]
    fn test_function_types() {
        assert!(NodeType::FunctionDeclaration.is_function());
        assert!(NodeType::ArrowFunctionExpression.is_function());
        assert!(!NodeType::ClassExpression.is_function());
    }

    #[test]
    fn test_syntax_map_is_identity() {
        let map = syntax();
        assert_eq!(map.get("ForOfStatement"), Some(&"ForOfStatement"));
        assert!(map.iter().all(|(k, v)| k == v));
    }
}
