//! The parse orchestrator: [`parse`] and [`tokenize`].
//!
//! Each call resolves its [`ParseConfig`], builds a fresh [`ParseContext`]
//! and hands it to the engine as its [`ParseHooks`].  The context gates every
//! token and node against the feature set, normalizes tokens and comments as
//! they stream past, and drives comment attachment.  Nothing outlives the
//! call.

use std::collections::HashSet;

use log::{debug, trace};
use serde::ser::{Serialize, SerializeMap, Serializer};
use smallvec::SmallVec;

use crate::comments::CommentAttachment;
use crate::error::SyntaxError;
use crate::normalize::{Comment, OutputPositions, OutputToken, normalize_raw_comment, normalize_token};
use crate::options::{ParseConfig, ParseOptions};
use crate::parser::ast::{LineCol, Node, NodeId, Value};
use crate::parser::hooks::ParseHooks;
use crate::parser::parse_program;
use crate::parser::scanner::{LexMode, RawComment, Scanner, Span, Token, TokenKind};
use crate::validate::{TokenCursor, is_node_valid, is_token_valid};

// ─────────────────────────────────────────────────────────────────────────────
// Results
// ─────────────────────────────────────────────────────────────────────────────

/// A parsed program together with the tokens and comments that were asked
/// for.
///
/// Serializes as the ESTree `Program` node with `comments` and `tokens`
/// appended when present.
#[derive(Debug, Clone)]
pub struct Program {
    /// The `Program` node.
    pub root: Node,
    /// Every token, when `tokens` was requested.
    pub tokens: Option<Vec<OutputToken>>,
    /// Every comment, when `comment` or `attachComment` was requested.
    pub comments: Option<Vec<Comment>>,
}

impl Program {
    /// The `sourceType` recorded on the program.
    pub fn source_type(&self) -> &str {
        self.root.str_field("sourceType").unwrap_or("script")
    }

    /// Top-level statements.
    pub fn body(&self) -> Vec<&Node> {
        match self.root.get("body") {
            Some(Value::List(items)) => items.iter().filter_map(Value::as_node).collect(),
            _ => Vec::new(),
        }
    }
}

impl Serialize for Program {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", self.root.kind.as_str())?;
        for (k, v) in &self.root.fields {
            map.serialize_entry(k, v)?;
        }
        if let Some(range) = &self.root.range {
            map.serialize_entry("range", range)?;
        }
        if let Some(loc) = &self.root.loc {
            map.serialize_entry("loc", loc)?;
        }
        if let Some(comments) = &self.comments {
            map.serialize_entry("comments", comments)?;
        }
        if let Some(tokens) = &self.tokens {
            map.serialize_entry("tokens", tokens)?;
        }
        map.end()
    }
}

/// The result of [`tokenize`].
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct TokenList {
    /// Normalized tokens in source order.
    pub tokens: Vec<OutputToken>,
    /// Comments, when `comment` was requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<Vec<Comment>>,
    /// The error that stopped a tolerant run, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<SyntaxError>>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Per-call context
// ─────────────────────────────────────────────────────────────────────────────

/// Mutable state of one [`parse`] call, handed to the engine as its hooks.
struct ParseContext<'a> {
    source: &'a str,
    config: &'a ParseConfig,
    positions: OutputPositions<'a>,
    tokens: Option<Vec<OutputToken>>,
    comments: Option<Vec<Comment>>,
    attachment: CommentAttachment,
    /// Nodes already routed through comment attachment.  Retyped nodes are
    /// offered a second time under the same id.
    processed: HashSet<NodeId>,
    last_token: Option<Span>,
}

impl<'a> ParseContext<'a> {
    fn new(source: &'a str, config: &'a ParseConfig) -> Self {
        let mut attachment = CommentAttachment::new();
        if config.attach_comment {
            attachment.reset();
        }
        Self {
            source,
            config,
            positions: config.positions(),
            tokens: config.tokens.then(Vec::new),
            comments: config.wants_comments().then(Vec::new),
            attachment,
            processed: HashSet::new(),
            last_token: None,
        }
    }
}

impl ParseHooks for ParseContext<'_> {
    fn check_token(&mut self, token: &Token) -> bool {
        let ok = is_token_valid(&TokenCursor::new(token, self.source), &self.config.features);
        if !ok {
            trace!("gated token {} at {}", token.kind.label(), token.start());
        }
        ok
    }

    fn finish_node(&mut self, node: &mut Node) -> bool {
        if !is_node_valid(node, &self.config.features) {
            trace!("gated node {} at {}", node.kind, node.start);
            return false;
        }
        if self.config.attach_comment && self.processed.insert(node.id) {
            self.attachment.process_comment(node);
        }
        if node.kind.is_function() && !node.has("generator") {
            node.set("generator", false);
        }
        true
    }

    fn on_token(&mut self, token: &Token) {
        if token.kind == TokenKind::Eof {
            return;
        }
        if let Some(tokens) = &mut self.tokens {
            tokens.push(normalize_token(token, self.source, &self.positions));
        }
        self.last_token = Some(token.span);
    }

    fn on_comment(&mut self, raw: &RawComment) {
        let Some(comments) = &mut self.comments else {
            return;
        };
        let comment = normalize_raw_comment(raw, &self.positions);
        if self.config.attach_comment {
            self.attachment.add_comment(&comment);
        }
        comments.push(comment);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// parse
// ─────────────────────────────────────────────────────────────────────────────

/// Parse `source` under `options`.
///
/// Any construct the resolved feature set does not permit fails the whole
/// call with `Unexpected token …` at the construct's first token.
///
/// ```
/// use esgate_core::{Feature, ParseOptions, parse};
///
/// let err = parse("let x = 1;", &ParseOptions::default().with_feature(Feature::ArrowFunctions, true))
///     .unwrap_err();
/// assert_eq!(err.message, "Unexpected token let");
///
/// let opts = ParseOptions::default().with_feature(Feature::BlockBindings, true);
/// let program = parse("let x = 1;", &opts).unwrap();
/// assert_eq!(program.body().len(), 1);
/// ```
pub fn parse(source: &str, options: &ParseOptions) -> Result<Program, SyntaxError> {
    let config = ParseConfig::from_options(options);
    let mut ctx = ParseContext::new(source, &config);
    let mut root = parse_program(source, &config.engine, &mut ctx)?;

    root.set("sourceType", config.reported_source_type().as_str());
    if let Some(last) = ctx.last_token {
        root.end = last.end.offset;
        if let Some(range) = &mut root.range {
            range[1] = last.end.offset;
        }
        if let Some(loc) = &mut root.loc {
            loc.end = LineCol {
                line: last.end.line,
                column: last.end.column,
            };
        }
    }
    if config.attach_comment {
        ctx.attachment.attach(&mut root);
    }

    let program = Program {
        root,
        tokens: ctx.tokens,
        comments: ctx.comments,
    };
    debug!(
        "parsed {} statements, {} tokens, {} comments",
        program.body().len(),
        program.tokens.as_ref().map_or(0, Vec::len),
        program.comments.as_ref().map_or(0, Vec::len),
    );
    Ok(program)
}

// ─────────────────────────────────────────────────────────────────────────────
// tokenize
// ─────────────────────────────────────────────────────────────────────────────

/// Where the tokenizer is inside JSX.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JsxContext {
    /// Between `<` and `>`.
    Tag { closing: bool, self_closing: bool },
    /// Between an opening tag and its closing tag.
    Children,
    /// Inside `{…}` within a tag or children; counts open braces.
    Expr(u32),
}

/// Tracks JSX nesting from the token stream alone, so the scanner can be
/// told which lexing mode to use next.
#[derive(Debug, Default)]
struct JsxTracker {
    stack: SmallVec<[JsxContext; 8]>,
    previous: Option<TokenKind>,
}

impl JsxTracker {
    fn mode(&self) -> LexMode {
        match self.stack.last() {
            Some(JsxContext::Tag { .. }) => LexMode::JsxTag,
            Some(JsxContext::Children) => LexMode::JsxChild,
            Some(JsxContext::Expr(_)) | None => LexMode::Normal,
        }
    }

    fn observe(&mut self, kind: TokenKind) {
        let after_tag_start = self.previous == Some(TokenKind::JsxTagStart);
        self.previous = Some(kind);
        match (kind, self.stack.last_mut()) {
            (TokenKind::JsxTagStart, _) => self.stack.push(JsxContext::Tag {
                closing: false,
                self_closing: false,
            }),
            (
                TokenKind::Slash,
                Some(JsxContext::Tag {
                    closing,
                    self_closing,
                }),
            ) => {
                if after_tag_start {
                    *closing = true;
                } else {
                    *self_closing = true;
                }
            }
            (TokenKind::JsxTagEnd, Some(&mut JsxContext::Tag { closing, self_closing })) => {
                self.stack.pop();
                if closing {
                    if self.stack.last() == Some(&JsxContext::Children) {
                        self.stack.pop();
                    }
                } else if !self_closing {
                    self.stack.push(JsxContext::Children);
                }
            }
            (TokenKind::LeftBrace, Some(JsxContext::Tag { .. } | JsxContext::Children)) => {
                self.stack.push(JsxContext::Expr(1));
            }
            (TokenKind::LeftBrace | TokenKind::DollarBraceL, Some(JsxContext::Expr(depth))) => {
                *depth += 1;
            }
            (TokenKind::RightBrace, Some(JsxContext::Expr(depth))) => {
                *depth -= 1;
                if *depth == 0 {
                    self.stack.pop();
                }
            }
            _ => {}
        }
    }
}

/// Tokenize `source` under `options` without building a tree.
///
/// Every token is gated and normalized exactly as [`parse`] would.  With
/// `tolerant` set, the first error is returned in
/// [`TokenList::errors`] together with the tokens read before it.
pub fn tokenize(source: &str, options: &ParseOptions) -> Result<TokenList, SyntaxError> {
    let config = ParseConfig::from_options(options);
    let positions = config.positions();
    let mut scanner = Scanner::new(source, config.engine.scanner_options());
    let mut jsx = JsxTracker::default();
    let mut list = TokenList {
        tokens: Vec::new(),
        comments: config.comment.then(Vec::new),
        errors: config.tolerant.then(Vec::new),
    };

    loop {
        let next = scanner.next_token(jsx.mode());
        let skipped = scanner.take_comments();
        if let Some(comments) = &mut list.comments {
            comments.extend(skipped.iter().map(|c| normalize_raw_comment(c, &positions)));
        }

        let step = next
            .map_err(|e| SyntaxError::at(source, e.pos, e.message))
            .and_then(|token| {
                if is_token_valid(&TokenCursor::new(&token, source), &config.features) {
                    Ok(token)
                } else {
                    trace!("gated token {} at {}", token.kind.label(), token.start());
                    Err(SyntaxError::at(
                        source,
                        token.start(),
                        format!("Unexpected token {}", &source[token.start()..token.end()]),
                    ))
                }
            });

        match step {
            Ok(token) if token.kind == TokenKind::Eof => break,
            Ok(token) => {
                list.tokens.push(normalize_token(&token, source, &positions));
                jsx.observe(token.kind);
            }
            Err(err) => match &mut list.errors {
                Some(errors) => {
                    errors.push(err);
                    break;
                }
                None => return Err(err),
            },
        }
    }

    debug!("tokenized {} tokens", list.tokens.len());
    Ok(list)
}
