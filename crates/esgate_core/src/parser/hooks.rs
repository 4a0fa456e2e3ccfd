//! The hook contract between the parser and its caller.
//!
//! A [`Parser`](super::parser::Parser) calls into a [`ParseHooks`]
//! implementation synchronously while it runs:
//!
//! - [`ParseHooks::check_token`] before it advances past a token,
//! - [`ParseHooks::on_token`] once the token has been accepted,
//! - [`ParseHooks::on_comment`] for every comment the scanner skips,
//! - [`ParseHooks::finish_node`] whenever a node is completed.
//!
//! Returning `false` from a check makes the parser fail with
//! `Unexpected token <text>` at the token or node start.

use super::ast::Node;
use super::scanner::{RawComment, Token};

/// Callbacks invoked by the parser.  Every method has a permissive default.
pub trait ParseHooks {
    /// Decide whether the parser may advance past `token`.
    fn check_token(&mut self, _token: &Token) -> bool {
        true
    }

    /// Inspect or amend a completed node and decide whether it is allowed.
    fn finish_node(&mut self, _node: &mut Node) -> bool {
        true
    }

    /// Observe an accepted token.
    fn on_token(&mut self, _token: &Token) {}

    /// Observe a skipped comment.
    fn on_comment(&mut self, _comment: &RawComment) {}
}

/// Hooks that accept everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHooks;

impl ParseHooks for NoHooks {}
