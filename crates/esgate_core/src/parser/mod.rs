//! JavaScript parser infrastructure.
//!
//! - [`scanner`] — lexer that converts raw source text into a stream of
//!   [`scanner::Token`]s, with ES5/ES2015 dialects and JSX lexing modes.
//! - [`ast`] — dynamic ESTree node representation.
//! - [`parser`] — recursive-descent parser producing [`ast::Node`] trees.
//! - [`jsx`] — JSX grammar extension of the parser.
//! - [`hooks`] — callbacks through which callers observe and veto tokens
//!   and nodes while parsing.

/// ESTree syntax-tree nodes.
pub mod ast;
/// Parser callbacks.
pub mod hooks;
/// JSX elements, attributes and children.
pub mod jsx;
/// ES5 / ES2015 recursive-descent parser.
#[allow(clippy::module_inception)]
pub mod parser;
/// JavaScript lexer.
pub mod scanner;

pub use ast::{LineCol, Node, NodeId, SourceLocation, Value};
pub use hooks::{NoHooks, ParseHooks};
pub use parser::{EcmaVersion, EngineOptions, SourceType, parse_program};
