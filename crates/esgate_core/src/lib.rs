//! `esgate_core` — feature-gated ECMAScript parsing with ESTree output.
//!
//! Callers switch individual grammar features on or off; anything the active
//! feature set does not permit is rejected with a syntax error, and the
//! engine's tokens, comments and nodes are reshaped into the
//! ESTree/Esprima schema.
//!
//! # Crate layout
//!
//! - [`parser`] — the ES5/ES2015 + JSX engine and its hook contract.
//! - [`features`] — grammar features and per-call feature sets.
//! - [`validate`] — node and token gating tables.
//! - [`normalize`] — token and comment reshaping.
//! - [`comments`] — leading/trailing comment attachment.
//! - [`options`] — caller options and their resolution.
//! - [`driver`] — [`parse`] and [`tokenize`].
//!
//! ```
//! use esgate_core::{ParseOptions, parse};
//!
//! let opts = ParseOptions::from_json(r#"{"sourceType": "module", "range": true}"#).unwrap();
//! let program = parse("export const answer = 42;", &opts).unwrap();
//! assert_eq!(program.source_type(), "module");
//! ```

/// Comment attachment.
pub mod comments;
/// `parse` and `tokenize`.
pub mod driver;
/// Error types.
pub mod error;
/// The feature registry.
pub mod features;
/// Token and comment normalization.
pub mod normalize;
/// Caller options.
pub mod options;
/// The parsing engine.
pub mod parser;
/// The node-type catalog.
pub mod syntax;
/// Feature gating.
pub mod validate;

pub use driver::{Program, TokenList, parse, tokenize};
pub use error::{Error, Result, SyntaxError};
pub use features::{Feature, FeatureSet};
pub use normalize::{Comment, OutputToken};
pub use options::ParseOptions;
pub use syntax::{NodeType, VERSION, syntax};
