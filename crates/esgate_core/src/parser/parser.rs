//! Recursive-descent ECMAScript parser.
//!
//! The parser understands two dialects, ES5 and ES2015, selected through
//! [`EngineOptions::ecma_version`], plus an optional JSX grammar extension
//! (see [`super::jsx`]).  It produces dynamic ESTree [`Node`]s and knows
//! nothing about individual grammar features: every completed node and every
//! consumed token is offered to a [`ParseHooks`] implementation, which may
//! veto it.
//!
//! # Entry point
//!
//! ```
//! use esgate_core::parser::{EngineOptions, NoHooks, parse_program};
//!
//! let program = parse_program("var x = 1;", &EngineOptions::default(), &mut NoHooks).unwrap();
//! assert_eq!(program.kind.as_str(), "Program");
//! ```

use std::collections::HashSet;

use log::trace;
use serde::{Deserialize, Serialize};

use super::ast::{LineCol, Node, NodeId, SourceLocation, Value};
use super::hooks::ParseHooks;
use super::scanner::{
    Keyword, LexMode, Position, Scanner, ScannerOptions, Token, TokenKind, TokenValue, line_info,
};
use crate::error::SyntaxError;
use crate::syntax::NodeType;

/// Result alias for parser operations.
pub type PResult<T> = Result<T, SyntaxError>;

// ─────────────────────────────────────────────────────────────────────────────
// Options
// ─────────────────────────────────────────────────────────────────────────────

/// The language dialect the engine accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EcmaVersion {
    /// ECMAScript 5.1.
    #[default]
    Es5,
    /// ECMAScript 2015.
    Es2015,
}

/// Whether the source is a classic script or a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// A classic script.
    #[default]
    Script,
    /// A module: strict code with top-level `import`/`export`.
    Module,
}

impl SourceType {
    /// `"script"` or `"module"`.
    pub fn as_str(self) -> &'static str {
        match self {
            SourceType::Script => "script",
            SourceType::Module => "module",
        }
    }
}

/// Engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineOptions {
    /// Accepted dialect.
    pub ecma_version: EcmaVersion,
    /// Enable the JSX grammar extension.
    pub jsx: bool,
    /// Record `range` on nodes.
    pub ranges: bool,
    /// Record `loc` on nodes.
    pub locations: bool,
    /// Accept `return` at the top level.
    pub allow_return_outside_function: bool,
    /// Script or module goal.
    pub source_type: SourceType,
    /// File name recorded as `loc.source`.
    pub source_file: Option<String>,
}

impl EngineOptions {
    /// `true` for the ES2015 dialect.
    pub fn is_es6(&self) -> bool {
        self.ecma_version == EcmaVersion::Es2015
    }

    /// The scanner switches matching these options.
    pub fn scanner_options(&self) -> ScannerOptions {
        ScannerOptions {
            ecma6: self.is_es6(),
            jsx: self.jsx,
        }
    }
}

/// Parse `source` into a `Program` node, reporting to `hooks`.
pub fn parse_program<H: ParseHooks>(
    source: &str,
    options: &EngineOptions,
    hooks: &mut H,
) -> PResult<Node> {
    Parser::new(source, options, hooks)?.parse_top_level()
}

// ─────────────────────────────────────────────────────────────────────────────
// Parser state
// ─────────────────────────────────────────────────────────────────────────────

/// Where a node started.
#[derive(Debug, Clone, Copy)]
pub(super) struct Marker {
    pub(super) pos: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LabelKind {
    Loop,
    Switch,
    Plain,
}

#[derive(Debug, Clone)]
struct Label {
    name: Option<String>,
    kind: LabelKind,
}

/// Position of the first `{a = 1}` shorthand initializer seen while parsing
/// an expression that may still turn out to be a pattern.
#[derive(Debug, Default)]
pub(super) struct DestructuringErrors {
    shorthand_assign: Option<usize>,
}

fn has_shorthand(refs: &Option<&mut DestructuringErrors>) -> bool {
    refs.as_ref().is_some_and(|r| r.shorthand_assign.is_some())
}

const STRICT_RESERVED: &[&str] = &[
    "implements",
    "interface",
    "let",
    "package",
    "private",
    "protected",
    "public",
    "static",
    "yield",
];

/// Recursive-descent parser over a [`Scanner`] token stream.
pub struct Parser<'src, 'h, H: ParseHooks> {
    pub(super) source: &'src str,
    pub(super) options: &'h EngineOptions,
    scanner: Scanner<'src>,
    hooks: &'h mut H,
    /// The current (not yet consumed) token.
    pub(super) tok: Token,
    pub(super) last_tok_end: Position,
    last_tok_start: usize,
    strict: bool,
    in_function: bool,
    in_generator: bool,
    labels: Vec<Label>,
    potential_arrow_at: Option<usize>,
    next_id: NodeId,
}

impl<'src, 'h, H: ParseHooks> Parser<'src, 'h, H> {
    /// Create a parser and read the first token.
    pub fn new(source: &'src str, options: &'h EngineOptions, hooks: &'h mut H) -> PResult<Self> {
        let mut scanner = Scanner::new(source, options.scanner_options());
        let first = scanner.next_token(LexMode::Normal);
        for comment in scanner.take_comments() {
            hooks.on_comment(&comment);
        }
        let tok = first.map_err(|e| SyntaxError::at(source, e.pos, e.message))?;
        Ok(Self {
            source,
            options,
            scanner,
            hooks,
            tok,
            last_tok_end: Position::START,
            last_tok_start: 0,
            strict: options.source_type == SourceType::Module,
            in_function: false,
            in_generator: false,
            labels: Vec::new(),
            potential_arrow_at: None,
            next_id: 0,
        })
    }

    // ── Token helpers ───────────────────────────────────────────────────────

    fn is_es6(&self) -> bool {
        self.options.is_es6()
    }

    pub(super) fn is(&self, kind: TokenKind) -> bool {
        self.tok.kind == kind
    }

    fn is_kw(&self, kw: Keyword) -> bool {
        self.tok.kind == TokenKind::Keyword(kw)
    }

    /// Source text of the current token.
    pub(super) fn tok_text(&self) -> &'src str {
        let source = self.source;
        &source[self.tok.start()..self.tok.end()]
    }

    /// Name or cooked string value of the current token.
    pub(super) fn tok_str(&self) -> String {
        self.tok.value.as_str().unwrap_or_default().to_string()
    }

    /// Advance past the current token, lexing the next one in `mode`.
    pub(super) fn next_in(&mut self, mode: LexMode) -> PResult<()> {
        if !self.hooks.check_token(&self.tok) {
            trace!("token {:?} rejected at {}", self.tok.kind, self.tok.start());
            return Err(self.unexpected());
        }
        self.hooks.on_token(&self.tok);
        self.last_tok_end = self.tok.span.end;
        self.last_tok_start = self.tok.start();
        let next = self.scanner.next_token(mode);
        for comment in self.scanner.take_comments() {
            self.hooks.on_comment(&comment);
        }
        self.tok = next.map_err(|e| self.raise(e.pos, e.message))?;
        Ok(())
    }

    pub(super) fn next(&mut self) -> PResult<()> {
        self.next_in(LexMode::Normal)
    }

    pub(super) fn eat_in(&mut self, kind: TokenKind, mode: LexMode) -> PResult<bool> {
        if self.is(kind) {
            self.next_in(mode)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub(super) fn eat(&mut self, kind: TokenKind) -> PResult<bool> {
        self.eat_in(kind, LexMode::Normal)
    }

    pub(super) fn expect_in(&mut self, kind: TokenKind, mode: LexMode) -> PResult<()> {
        if self.eat_in(kind, mode)? {
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    pub(super) fn expect(&mut self, kind: TokenKind) -> PResult<()> {
        self.expect_in(kind, LexMode::Normal)
    }

    fn is_contextual(&self, word: &str) -> bool {
        self.tok.is_contextual(word)
    }

    fn eat_contextual(&mut self, word: &str) -> PResult<bool> {
        if self.is_contextual(word) {
            self.next()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect_contextual(&mut self, word: &str) -> PResult<()> {
        if self.eat_contextual(word)? {
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn can_insert_semicolon(&self) -> bool {
        matches!(self.tok.kind, TokenKind::Eof | TokenKind::RightBrace)
            || self.tok.had_line_terminator_before
    }

    fn semicolon(&mut self) -> PResult<()> {
        if self.eat(TokenKind::Semicolon)? || self.can_insert_semicolon() {
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    /// `true` when the current token is `in`, or `of` in ES2015.
    fn is_for_in_or_of(&self) -> bool {
        self.is_kw(Keyword::In) || (self.is_es6() && self.is_contextual("of"))
    }

    // ── Errors ──────────────────────────────────────────────────────────────

    pub(super) fn raise(&self, pos: usize, message: impl Into<String>) -> SyntaxError {
        SyntaxError::at(self.source, pos, message)
    }

    /// An "Unexpected token" error for the current token.
    pub(super) fn unexpected(&self) -> SyntaxError {
        if self.is(TokenKind::Eof) {
            self.raise(self.tok.start(), "Unexpected end of input")
        } else {
            self.raise(
                self.tok.start(),
                format!("Unexpected token {}", self.tok_text()),
            )
        }
    }

    /// An "Unexpected token" error for whatever token starts at `pos`.
    pub(super) fn unexpected_at(&self, pos: usize) -> SyntaxError {
        let at = line_info(self.source, pos);
        let mut scanner = Scanner::resume_at(self.source, self.options.scanner_options(), at);
        match scanner.next_token(LexMode::Normal) {
            Ok(tok) if tok.kind == TokenKind::Eof => self.raise(pos, "Unexpected end of input"),
            Ok(tok) => self.raise(
                tok.start(),
                format!("Unexpected token {}", &self.source[tok.start()..tok.end()]),
            ),
            Err(e) => self.raise(e.pos, e.message),
        }
    }

    // ── Node construction ───────────────────────────────────────────────────

    pub(super) fn start_node(&self) -> Marker {
        Marker {
            pos: self.tok.span.start,
        }
    }

    /// Complete a node ending at the previous token.
    pub(super) fn finish(
        &mut self,
        m: Marker,
        kind: NodeType,
        fields: Vec<(&'static str, Value)>,
    ) -> PResult<Node> {
        let end = self.last_tok_end;
        self.finish_at(m, end, kind, fields)
    }

    pub(super) fn finish_at(
        &mut self,
        m: Marker,
        end: Position,
        kind: NodeType,
        fields: Vec<(&'static str, Value)>,
    ) -> PResult<Node> {
        let id = self.next_id;
        self.next_id += 1;
        let node = Node {
            kind,
            start: m.pos.offset,
            end: end.offset,
            id,
            range: self.options.ranges.then_some([m.pos.offset, end.offset]),
            loc: self.options.locations.then(|| SourceLocation {
                start: LineCol {
                    line: m.pos.line,
                    column: m.pos.column,
                },
                end: LineCol {
                    line: end.line,
                    column: end.column,
                },
                source: self.options.source_file.clone(),
            }),
            fields,
        };
        self.submit(node)
    }

    /// Offer a completed (or retyped) node to the hooks.
    fn submit(&mut self, mut node: Node) -> PResult<Node> {
        if self.hooks.finish_node(&mut node) {
            Ok(node)
        } else {
            trace!("node {} rejected at {}", node.kind, node.start);
            Err(self.unexpected_at(node.start))
        }
    }

    // ── Program ─────────────────────────────────────────────────────────────

    /// Parse the whole input as a `Program`.
    pub fn parse_top_level(&mut self) -> PResult<Node> {
        let m = Marker {
            pos: Position::START,
        };
        let mut body = Vec::new();
        let mut directives = true;
        while !self.is(TokenKind::Eof) {
            let stmt = self.parse_statement(true, true)?;
            if directives {
                directives = self.apply_directive(&stmt);
            }
            body.push(stmt);
        }
        let source_type = self.options.source_type.as_str();
        self.finish(
            m,
            NodeType::Program,
            vec![("body", body.into()), ("sourceType", source_type.into())],
        )
    }

    /// Handle a statement of a directive prologue.  Returns `false` once the
    /// prologue has ended.
    fn apply_directive(&mut self, stmt: &Node) -> bool {
        let Some(expr) = stmt.child("expression") else {
            return false;
        };
        if stmt.kind != NodeType::ExpressionStatement
            || expr.kind != NodeType::Literal
            || !matches!(expr.get("value"), Some(Value::Str(_)))
        {
            return false;
        }
        let raw = &self.source[expr.start..expr.end];
        if raw == "'use strict'" || raw == "\"use strict\"" {
            self.strict = true;
        }
        true
    }

    // ── Statements ──────────────────────────────────────────────────────────

    fn parse_statement(&mut self, declaration: bool, top_level: bool) -> PResult<Node> {
        let m = self.start_node();
        match self.tok.kind {
            TokenKind::Keyword(kw @ (Keyword::Break | Keyword::Continue)) => {
                self.parse_break_continue(m, kw == Keyword::Break)
            }
            TokenKind::Keyword(Keyword::Debugger) => {
                self.next()?;
                self.semicolon()?;
                self.finish(m, NodeType::DebuggerStatement, vec![])
            }
            TokenKind::Keyword(Keyword::Do) => self.parse_do_statement(m),
            TokenKind::Keyword(Keyword::For) => self.parse_for_statement(m),
            TokenKind::Keyword(Keyword::Function) => {
                if !declaration && self.is_es6() {
                    return Err(self.unexpected());
                }
                self.next()?;
                self.parse_function(m, true)
            }
            TokenKind::Keyword(Keyword::Class) => {
                if !declaration {
                    return Err(self.unexpected());
                }
                self.parse_class(m, true)
            }
            TokenKind::Keyword(Keyword::If) => self.parse_if_statement(m),
            TokenKind::Keyword(Keyword::Return) => self.parse_return_statement(m),
            TokenKind::Keyword(Keyword::Switch) => self.parse_switch_statement(m),
            TokenKind::Keyword(Keyword::Throw) => self.parse_throw_statement(m),
            TokenKind::Keyword(Keyword::Try) => self.parse_try_statement(m),
            TokenKind::Keyword(Keyword::Let | Keyword::Const) if !declaration => {
                Err(self.unexpected())
            }
            TokenKind::Keyword(Keyword::Var | Keyword::Let | Keyword::Const) => {
                let kind = self.tok_text();
                self.next()?;
                let declarations = self.parse_var(false, kind)?;
                self.semicolon()?;
                self.finish(
                    m,
                    NodeType::VariableDeclaration,
                    vec![("declarations", declarations.into()), ("kind", kind.into())],
                )
            }
            TokenKind::Keyword(Keyword::While) => self.parse_while_statement(m),
            TokenKind::Keyword(Keyword::With) => self.parse_with_statement(m),
            TokenKind::LeftBrace => self.parse_block(),
            TokenKind::Semicolon => {
                self.next()?;
                self.finish(m, NodeType::EmptyStatement, vec![])
            }
            TokenKind::Keyword(kw @ (Keyword::Export | Keyword::Import)) => {
                if !top_level {
                    return Err(self.raise(
                        self.tok.start(),
                        "'import' and 'export' may only appear at the top level",
                    ));
                }
                if kw == Keyword::Import {
                    self.parse_import(m)
                } else {
                    self.parse_export(m)
                }
            }
            starttype => {
                let expr = self.parse_expression(false, None)?;
                if starttype == TokenKind::Name
                    && expr.kind == NodeType::Identifier
                    && self.eat(TokenKind::Colon)?
                {
                    self.parse_labeled_statement(m, expr)
                } else {
                    self.semicolon()?;
                    self.finish(
                        m,
                        NodeType::ExpressionStatement,
                        vec![("expression", expr.into())],
                    )
                }
            }
        }
    }

    fn parse_break_continue(&mut self, m: Marker, is_break: bool) -> PResult<Node> {
        self.next()?;
        let label = if self.eat(TokenKind::Semicolon)? || self.can_insert_semicolon() {
            None
        } else if self.is(TokenKind::Name) {
            let label = self.parse_ident(false)?;
            self.semicolon()?;
            Some(label)
        } else {
            return Err(self.unexpected());
        };

        let name = label.as_ref().and_then(|l| l.str_field("name"));
        let found = self.labels.iter().any(|lab| {
            let matches = name.is_none_or(|n| lab.name.as_deref() == Some(n));
            matches
                && ((lab.kind != LabelKind::Plain && (is_break || lab.kind == LabelKind::Loop))
                    || (name.is_some() && is_break))
        });
        if !found {
            let keyword = if is_break { "break" } else { "continue" };
            return Err(self.raise(m.pos.offset, format!("Unsyntactic {keyword}")));
        }
        let kind = if is_break {
            NodeType::BreakStatement
        } else {
            NodeType::ContinueStatement
        };
        self.finish(m, kind, vec![("label", label.into())])
    }

    fn loop_label() -> Label {
        Label {
            name: None,
            kind: LabelKind::Loop,
        }
    }

    fn parse_loop_body(&mut self) -> PResult<Node> {
        self.labels.push(Self::loop_label());
        let body = self.parse_statement(false, false);
        self.labels.pop();
        body
    }

    fn parse_do_statement(&mut self, m: Marker) -> PResult<Node> {
        self.next()?;
        let body = self.parse_loop_body()?;
        self.expect(TokenKind::Keyword(Keyword::While))?;
        let test = self.parse_paren_expression()?;
        if self.is_es6() {
            self.eat(TokenKind::Semicolon)?;
        } else {
            self.semicolon()?;
        }
        self.finish(
            m,
            NodeType::DoWhileStatement,
            vec![("body", body.into()), ("test", test.into())],
        )
    }

    fn parse_for_statement(&mut self, m: Marker) -> PResult<Node> {
        self.next()?;
        self.expect(TokenKind::LeftParen)?;
        if self.is(TokenKind::Semicolon) {
            return self.parse_for(m, None);
        }
        if matches!(
            self.tok.kind,
            TokenKind::Keyword(Keyword::Var | Keyword::Let | Keyword::Const)
        ) {
            let init_m = self.start_node();
            let kind = self.tok_text();
            self.next()?;
            let declarations = self.parse_var(true, kind)?;
            let single_without_init = declarations.len() == 1
                && (kind == "var"
                    || declarations[0].get("init").is_none_or(Value::is_null));
            let init = self.finish(
                init_m,
                NodeType::VariableDeclaration,
                vec![("declarations", declarations.into()), ("kind", kind.into())],
            )?;
            if self.is_for_in_or_of() && single_without_init {
                return self.parse_for_in(m, init);
            }
            return self.parse_for(m, Some(init));
        }
        let mut refs = DestructuringErrors::default();
        let init = self.parse_expression(true, Some(&mut refs))?;
        if self.is_for_in_or_of() {
            let init = self.to_assignable(init, false)?;
            self.check_lval(&init, false, None)?;
            return self.parse_for_in(m, init);
        }
        if let Some(pos) = refs.shorthand_assign {
            return Err(self.unexpected_at(pos));
        }
        self.parse_for(m, Some(init))
    }

    fn parse_for(&mut self, m: Marker, init: Option<Node>) -> PResult<Node> {
        self.expect(TokenKind::Semicolon)?;
        let test = if self.is(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression(false, None)?)
        };
        self.expect(TokenKind::Semicolon)?;
        let update = if self.is(TokenKind::RightParen) {
            None
        } else {
            Some(self.parse_expression(false, None)?)
        };
        self.expect(TokenKind::RightParen)?;
        let body = self.parse_loop_body()?;
        self.finish(
            m,
            NodeType::ForStatement,
            vec![
                ("init", init.into()),
                ("test", test.into()),
                ("update", update.into()),
                ("body", body.into()),
            ],
        )
    }

    fn parse_for_in(&mut self, m: Marker, left: Node) -> PResult<Node> {
        let kind = if self.is_kw(Keyword::In) {
            NodeType::ForInStatement
        } else {
            NodeType::ForOfStatement
        };
        self.next()?;
        let right = self.parse_expression(false, None)?;
        self.expect(TokenKind::RightParen)?;
        let body = self.parse_loop_body()?;
        self.finish(
            m,
            kind,
            vec![
                ("left", left.into()),
                ("right", right.into()),
                ("body", body.into()),
            ],
        )
    }

    fn parse_if_statement(&mut self, m: Marker) -> PResult<Node> {
        self.next()?;
        let test = self.parse_paren_expression()?;
        let consequent = self.parse_statement(false, false)?;
        let alternate = if self.eat(TokenKind::Keyword(Keyword::Else))? {
            Some(self.parse_statement(false, false)?)
        } else {
            None
        };
        self.finish(
            m,
            NodeType::IfStatement,
            vec![
                ("test", test.into()),
                ("consequent", consequent.into()),
                ("alternate", alternate.into()),
            ],
        )
    }

    fn parse_return_statement(&mut self, m: Marker) -> PResult<Node> {
        if !self.in_function && !self.options.allow_return_outside_function {
            return Err(self.raise(self.tok.start(), "'return' outside of function"));
        }
        self.next()?;
        let argument = if self.eat(TokenKind::Semicolon)? || self.can_insert_semicolon() {
            None
        } else {
            let arg = self.parse_expression(false, None)?;
            self.semicolon()?;
            Some(arg)
        };
        self.finish(
            m,
            NodeType::ReturnStatement,
            vec![("argument", argument.into())],
        )
    }

    fn parse_switch_statement(&mut self, m: Marker) -> PResult<Node> {
        self.next()?;
        let discriminant = self.parse_paren_expression()?;
        self.expect(TokenKind::LeftBrace)?;
        self.labels.push(Label {
            name: None,
            kind: LabelKind::Switch,
        });

        let mut cases = Vec::new();
        let mut current: Option<(Marker, Option<Node>, Vec<Node>)> = None;
        let mut saw_default = false;
        while !self.is(TokenKind::RightBrace) {
            let is_case = self.is_kw(Keyword::Case);
            if is_case || self.is_kw(Keyword::Default) {
                if let Some(case) = current.take() {
                    cases.push(self.finish_case(case)?);
                }
                let case_m = self.start_node();
                self.next()?;
                let test = if is_case {
                    Some(self.parse_expression(false, None)?)
                } else {
                    if saw_default {
                        return Err(self.raise(self.last_tok_start, "Multiple default clauses"));
                    }
                    saw_default = true;
                    None
                };
                self.expect(TokenKind::Colon)?;
                current = Some((case_m, test, Vec::new()));
            } else {
                let Some((_, _, consequent)) = current.as_mut() else {
                    return Err(self.unexpected());
                };
                consequent.push(self.parse_statement(true, false)?);
            }
        }
        if let Some(case) = current.take() {
            cases.push(self.finish_case(case)?);
        }
        self.next()?;
        self.labels.pop();
        self.finish(
            m,
            NodeType::SwitchStatement,
            vec![
                ("discriminant", discriminant.into()),
                ("cases", cases.into()),
            ],
        )
    }

    fn finish_case(&mut self, (m, test, consequent): (Marker, Option<Node>, Vec<Node>)) -> PResult<Node> {
        self.finish(
            m,
            NodeType::SwitchCase,
            vec![("test", test.into()), ("consequent", consequent.into())],
        )
    }

    fn parse_throw_statement(&mut self, m: Marker) -> PResult<Node> {
        self.next()?;
        if self.tok.had_line_terminator_before {
            return Err(self.raise(self.last_tok_end.offset, "Illegal newline after throw"));
        }
        let argument = self.parse_expression(false, None)?;
        self.semicolon()?;
        self.finish(
            m,
            NodeType::ThrowStatement,
            vec![("argument", argument.into())],
        )
    }

    fn parse_try_statement(&mut self, m: Marker) -> PResult<Node> {
        self.next()?;
        let block = self.parse_block()?;
        let handler = if self.is_kw(Keyword::Catch) {
            let clause_m = self.start_node();
            self.next()?;
            self.expect(TokenKind::LeftParen)?;
            let param = self.parse_binding_atom()?;
            self.check_lval(&param, true, None)?;
            self.expect(TokenKind::RightParen)?;
            let body = self.parse_block()?;
            Some(self.finish(
                clause_m,
                NodeType::CatchClause,
                vec![("param", param.into()), ("body", body.into())],
            )?)
        } else {
            None
        };
        let finalizer = if self.eat(TokenKind::Keyword(Keyword::Finally))? {
            Some(self.parse_block()?)
        } else {
            None
        };
        if handler.is_none() && finalizer.is_none() {
            return Err(self.raise(m.pos.offset, "Missing catch or finally clause"));
        }
        self.finish(
            m,
            NodeType::TryStatement,
            vec![
                ("block", block.into()),
                ("handler", handler.into()),
                ("finalizer", finalizer.into()),
            ],
        )
    }

    /// Parse the declarator list of a `var`/`let`/`const` declaration.
    fn parse_var(&mut self, is_for: bool, kind: &str) -> PResult<Vec<Node>> {
        let mut declarations = Vec::new();
        loop {
            let m = self.start_node();
            let id = self.parse_binding_atom()?;
            self.check_lval(&id, true, None)?;
            let init = if self.eat(TokenKind::Eq)? {
                Some(self.parse_maybe_assign(is_for, None)?)
            } else if kind == "const" && !(is_for && self.is_for_in_or_of()) {
                return Err(self.unexpected());
            } else if id.kind != NodeType::Identifier && !(is_for && self.is_for_in_or_of()) {
                return Err(self.raise(
                    self.last_tok_end.offset,
                    "Complex binding patterns require an initialization value",
                ));
            } else {
                None
            };
            declarations.push(self.finish(
                m,
                NodeType::VariableDeclarator,
                vec![("id", id.into()), ("init", init.into())],
            )?);
            if !self.eat(TokenKind::Comma)? {
                return Ok(declarations);
            }
        }
    }

    fn parse_while_statement(&mut self, m: Marker) -> PResult<Node> {
        self.next()?;
        let test = self.parse_paren_expression()?;
        let body = self.parse_loop_body()?;
        self.finish(
            m,
            NodeType::WhileStatement,
            vec![("test", test.into()), ("body", body.into())],
        )
    }

    fn parse_with_statement(&mut self, m: Marker) -> PResult<Node> {
        if self.strict {
            return Err(self.raise(self.tok.start(), "'with' in strict mode"));
        }
        self.next()?;
        let object = self.parse_paren_expression()?;
        let body = self.parse_statement(false, false)?;
        self.finish(
            m,
            NodeType::WithStatement,
            vec![("object", object.into()), ("body", body.into())],
        )
    }

    fn parse_labeled_statement(&mut self, m: Marker, label: Node) -> PResult<Node> {
        let name = label.str_field("name").unwrap_or_default().to_string();
        if self.labels.iter().any(|l| l.name.as_deref() == Some(&name)) {
            return Err(self.raise(label.start, format!("Label '{name}' is already declared")));
        }
        let kind = match self.tok.kind {
            TokenKind::Keyword(Keyword::While | Keyword::Do | Keyword::For) => LabelKind::Loop,
            TokenKind::Keyword(Keyword::Switch) => LabelKind::Switch,
            _ => LabelKind::Plain,
        };
        self.labels.push(Label {
            name: Some(name),
            kind,
        });
        let body = self.parse_statement(true, false);
        self.labels.pop();
        let body = body?;
        self.finish(
            m,
            NodeType::LabeledStatement,
            vec![("label", label.into()), ("body", body.into())],
        )
    }

    fn parse_block(&mut self) -> PResult<Node> {
        let m = self.start_node();
        self.expect(TokenKind::LeftBrace)?;
        let mut body = Vec::new();
        while !self.eat(TokenKind::RightBrace)? {
            body.push(self.parse_statement(true, false)?);
        }
        self.finish(m, NodeType::BlockStatement, vec![("body", body.into())])
    }

    // ── Expressions ─────────────────────────────────────────────────────────

    fn parse_paren_expression(&mut self) -> PResult<Node> {
        self.expect(TokenKind::LeftParen)?;
        let expr = self.parse_expression(false, None)?;
        self.expect(TokenKind::RightParen)?;
        Ok(expr)
    }

    /// Parse a full expression, including comma sequences.
    pub(super) fn parse_expression(
        &mut self,
        no_in: bool,
        mut refs: Option<&mut DestructuringErrors>,
    ) -> PResult<Node> {
        let m = self.start_node();
        let expr = self.parse_maybe_assign(no_in, refs.as_deref_mut())?;
        if !self.is(TokenKind::Comma) {
            return Ok(expr);
        }
        let mut expressions = vec![expr];
        while self.eat(TokenKind::Comma)? {
            expressions.push(self.parse_maybe_assign(no_in, refs.as_deref_mut())?);
        }
        self.finish(
            m,
            NodeType::SequenceExpression,
            vec![("expressions", expressions.into())],
        )
    }

    /// Parse an assignment expression (or anything of higher precedence).
    pub(super) fn parse_maybe_assign(
        &mut self,
        no_in: bool,
        refs: Option<&mut DestructuringErrors>,
    ) -> PResult<Node> {
        if self.in_generator && self.is_contextual("yield") {
            return self.parse_yield();
        }
        let fail_on_shorthand = refs.is_none();
        let mut own = DestructuringErrors::default();
        let refs = match refs {
            Some(refs) => refs,
            None => &mut own,
        };
        let m = self.start_node();
        if matches!(self.tok.kind, TokenKind::LeftParen | TokenKind::Name) {
            self.potential_arrow_at = Some(self.tok.start());
        }
        let left = self.parse_maybe_conditional(no_in, Some(&mut *refs))?;
        if self.tok.kind.is_assign() {
            let operator = self.tok_text();
            let left = if self.is(TokenKind::Eq) {
                self.to_assignable(left, false)?
            } else {
                left
            };
            refs.shorthand_assign = None;
            self.check_lval(&left, false, None)?;
            self.next()?;
            let right = self.parse_maybe_assign(no_in, None)?;
            return self.finish(
                m,
                NodeType::AssignmentExpression,
                vec![
                    ("operator", operator.into()),
                    ("left", left.into()),
                    ("right", right.into()),
                ],
            );
        }
        if fail_on_shorthand && let Some(pos) = refs.shorthand_assign {
            return Err(self.unexpected_at(pos));
        }
        Ok(left)
    }

    fn parse_maybe_conditional(
        &mut self,
        no_in: bool,
        mut refs: Option<&mut DestructuringErrors>,
    ) -> PResult<Node> {
        let m = self.start_node();
        let expr = self.parse_expr_ops(no_in, refs.as_deref_mut())?;
        if has_shorthand(&refs) {
            return Ok(expr);
        }
        if !self.eat(TokenKind::Question)? {
            return Ok(expr);
        }
        let consequent = self.parse_maybe_assign(false, None)?;
        self.expect(TokenKind::Colon)?;
        let alternate = self.parse_maybe_assign(no_in, None)?;
        self.finish(
            m,
            NodeType::ConditionalExpression,
            vec![
                ("test", expr.into()),
                ("consequent", consequent.into()),
                ("alternate", alternate.into()),
            ],
        )
    }

    fn parse_expr_ops(
        &mut self,
        no_in: bool,
        mut refs: Option<&mut DestructuringErrors>,
    ) -> PResult<Node> {
        let m = self.start_node();
        let expr = self.parse_maybe_unary(refs.as_deref_mut())?;
        if has_shorthand(&refs) {
            return Ok(expr);
        }
        self.parse_expr_op(expr, m, -1, no_in)
    }

    /// Precedence climbing over binary operators.
    fn parse_expr_op(&mut self, left: Node, left_m: Marker, min_prec: i32, no_in: bool) -> PResult<Node> {
        let Some(prec) = self.tok.kind.binop().map(i32::from) else {
            return Ok(left);
        };
        if prec <= min_prec || (no_in && self.is_kw(Keyword::In)) {
            return Ok(left);
        }
        let logical = matches!(self.tok.kind, TokenKind::LogicalOr | TokenKind::LogicalAnd);
        let operator = self.tok_text();
        self.next()?;
        let right_m = self.start_node();
        let right = self.parse_maybe_unary(None)?;
        let right = self.parse_expr_op(right, right_m, prec, no_in)?;
        let kind = if logical {
            NodeType::LogicalExpression
        } else {
            NodeType::BinaryExpression
        };
        let node = self.finish(
            left_m,
            kind,
            vec![
                ("left", left.into()),
                ("operator", operator.into()),
                ("right", right.into()),
            ],
        )?;
        self.parse_expr_op(node, left_m, min_prec, no_in)
    }

    fn parse_maybe_unary(&mut self, mut refs: Option<&mut DestructuringErrors>) -> PResult<Node> {
        let m = self.start_node();
        let is_prefix = matches!(
            self.tok.kind,
            TokenKind::Prefix
                | TokenKind::PlusMin
                | TokenKind::IncDec
                | TokenKind::Keyword(Keyword::Typeof | Keyword::Void | Keyword::Delete)
        );
        if is_prefix {
            let update = self.is(TokenKind::IncDec);
            let operator = self.tok_text();
            self.next()?;
            let argument = self.parse_maybe_unary(None)?;
            if let Some(pos) = refs.as_ref().and_then(|r| r.shorthand_assign) {
                return Err(self.unexpected_at(pos));
            }
            if update {
                self.check_lval(&argument, false, None)?;
            } else if self.strict && operator == "delete" && argument.kind == NodeType::Identifier {
                return Err(self.raise(m.pos.offset, "Deleting local variable in strict mode"));
            }
            let kind = if update {
                NodeType::UpdateExpression
            } else {
                NodeType::UnaryExpression
            };
            return self.finish(
                m,
                kind,
                vec![
                    ("operator", operator.into()),
                    ("prefix", true.into()),
                    ("argument", argument.into()),
                ],
            );
        }

        let mut expr = self.parse_expr_subscripts(refs.as_deref_mut())?;
        if has_shorthand(&refs) {
            return Ok(expr);
        }
        while self.is(TokenKind::IncDec) && !self.can_insert_semicolon() {
            self.check_lval(&expr, false, None)?;
            let operator = self.tok_text();
            self.next()?;
            expr = self.finish(
                m,
                NodeType::UpdateExpression,
                vec![
                    ("operator", operator.into()),
                    ("prefix", false.into()),
                    ("argument", expr.into()),
                ],
            )?;
        }
        Ok(expr)
    }

    fn parse_expr_subscripts(&mut self, mut refs: Option<&mut DestructuringErrors>) -> PResult<Node> {
        let m = self.start_node();
        let expr = self.parse_expr_atom(refs.as_deref_mut())?;
        if has_shorthand(&refs) {
            return Ok(expr);
        }
        self.parse_subscripts(expr, m, false)
    }

    fn parse_subscripts(&mut self, mut base: Node, m: Marker, no_calls: bool) -> PResult<Node> {
        loop {
            if self.eat(TokenKind::Dot)? {
                let property = self.parse_ident(true)?;
                base = self.finish(
                    m,
                    NodeType::MemberExpression,
                    vec![
                        ("object", base.into()),
                        ("property", property.into()),
                        ("computed", false.into()),
                    ],
                )?;
            } else if self.eat(TokenKind::LeftBracket)? {
                let property = self.parse_expression(false, None)?;
                self.expect(TokenKind::RightBracket)?;
                base = self.finish(
                    m,
                    NodeType::MemberExpression,
                    vec![
                        ("object", base.into()),
                        ("property", property.into()),
                        ("computed", true.into()),
                    ],
                )?;
            } else if !no_calls && self.eat(TokenKind::LeftParen)? {
                let arguments = self.parse_expr_list(TokenKind::RightParen, false, false, None)?;
                base = self.finish(
                    m,
                    NodeType::CallExpression,
                    vec![("callee", base.into()), ("arguments", arguments.into())],
                )?;
            } else if self.is(TokenKind::BackQuote) {
                let quasi = self.parse_template()?;
                base = self.finish(
                    m,
                    NodeType::TaggedTemplateExpression,
                    vec![("tag", base.into()), ("quasi", quasi.into())],
                )?;
            } else {
                return Ok(base);
            }
        }
    }

    fn parse_expr_atom(&mut self, refs: Option<&mut DestructuringErrors>) -> PResult<Node> {
        let can_be_arrow = self.potential_arrow_at == Some(self.tok.start());
        let m = self.start_node();
        match self.tok.kind {
            TokenKind::Keyword(Keyword::Super) => {
                self.next()?;
                self.finish(m, NodeType::Super, vec![])
            }
            TokenKind::Keyword(Keyword::This) => {
                self.next()?;
                self.finish(m, NodeType::ThisExpression, vec![])
            }
            TokenKind::Name => {
                let id = self.parse_ident(false)?;
                if can_be_arrow && !self.can_insert_semicolon() && self.eat(TokenKind::Arrow)? {
                    return self.parse_arrow_expression(m, vec![id]);
                }
                Ok(id)
            }
            TokenKind::Regexp => {
                let TokenValue::Regex { pattern, flags } = self.tok.value.clone() else {
                    return Err(self.unexpected());
                };
                let raw = self.tok_text();
                self.next()?;
                self.finish(
                    m,
                    NodeType::Literal,
                    vec![
                        ("value", Value::Null),
                        ("raw", raw.into()),
                        (
                            "regex",
                            Value::Object(vec![("pattern", pattern.into()), ("flags", flags.into())]),
                        ),
                    ],
                )
            }
            TokenKind::Num | TokenKind::String => self.parse_literal(),
            TokenKind::Keyword(kw @ (Keyword::Null | Keyword::True | Keyword::False)) => {
                let value = match kw {
                    Keyword::True => Value::Bool(true),
                    Keyword::False => Value::Bool(false),
                    _ => Value::Null,
                };
                let raw = self.tok_text();
                self.next()?;
                self.finish(
                    m,
                    NodeType::Literal,
                    vec![("value", value), ("raw", raw.into())],
                )
            }
            TokenKind::LeftParen => self.parse_paren_and_distinguish(can_be_arrow),
            TokenKind::LeftBracket => {
                self.next()?;
                let elements = self.parse_expr_list(TokenKind::RightBracket, true, true, refs)?;
                self.finish(
                    m,
                    NodeType::ArrayExpression,
                    vec![("elements", elements.into())],
                )
            }
            TokenKind::LeftBrace => self.parse_obj(false, refs),
            TokenKind::Keyword(Keyword::Function) => {
                self.next()?;
                self.parse_function(m, false)
            }
            TokenKind::Keyword(Keyword::Class) => self.parse_class(m, false),
            TokenKind::Keyword(Keyword::New) => self.parse_new(),
            TokenKind::BackQuote => self.parse_template(),
            TokenKind::JsxTagStart if self.options.jsx => self.parse_jsx_element(LexMode::Normal),
            _ => Err(self.unexpected()),
        }
    }

    /// Parse a numeric or string literal.
    pub(super) fn parse_literal(&mut self) -> PResult<Node> {
        let m = self.start_node();
        let value = match &self.tok.value {
            TokenValue::Number(n) => Value::Number(*n),
            TokenValue::Str(s) => Value::Str(s.clone()),
            _ => return Err(self.unexpected()),
        };
        let raw = self.tok_text();
        if self.strict && has_legacy_octal(self.tok.kind, raw) {
            return Err(self.raise(self.tok.start(), "Octal literal in strict mode"));
        }
        self.next()?;
        self.finish(
            m,
            NodeType::Literal,
            vec![("value", value), ("raw", raw.into())],
        )
    }

    fn parse_paren_and_distinguish(&mut self, can_be_arrow: bool) -> PResult<Node> {
        if !self.is_es6() {
            return self.parse_paren_expression();
        }
        let m = self.start_node();
        self.next()?;
        let inner_m = self.start_node();
        let mut exprs = Vec::new();
        let mut first = true;
        let mut refs = DestructuringErrors::default();
        let mut spread_start = None;
        let mut inner_paren_start = None;
        while !self.is(TokenKind::RightParen) {
            if first {
                first = false;
            } else {
                self.expect(TokenKind::Comma)?;
            }
            if self.is(TokenKind::Ellipsis) {
                spread_start = Some(self.tok.start());
                exprs.push(self.parse_rest()?);
                break;
            }
            if self.is(TokenKind::LeftParen) && inner_paren_start.is_none() {
                inner_paren_start = Some(self.tok.start());
            }
            exprs.push(self.parse_maybe_assign(false, Some(&mut refs))?);
        }
        let inner_end = self.last_tok_end;
        self.expect(TokenKind::RightParen)?;

        if can_be_arrow && !self.can_insert_semicolon() && self.eat(TokenKind::Arrow)? {
            if let Some(pos) = inner_paren_start {
                return Err(self.unexpected_at(pos));
            }
            return self.parse_arrow_expression(m, exprs);
        }

        if exprs.is_empty() {
            return Err(self.unexpected_at(self.last_tok_start));
        }
        if let Some(pos) = spread_start.or(refs.shorthand_assign) {
            return Err(self.unexpected_at(pos));
        }
        if exprs.len() > 1 {
            self.finish_at(
                inner_m,
                inner_end,
                NodeType::SequenceExpression,
                vec![("expressions", exprs.into())],
            )
        } else {
            Ok(exprs.remove(0))
        }
    }

    fn parse_new(&mut self) -> PResult<Node> {
        let m = self.start_node();
        let meta = self.parse_ident(true)?;
        if self.is_es6() && self.eat(TokenKind::Dot)? {
            let property = self.parse_ident(true)?;
            if property.str_field("name") != Some("target") {
                return Err(self.raise(
                    property.start,
                    "The only valid meta property for new is new.target",
                ));
            }
            return self.finish(
                m,
                NodeType::MetaProperty,
                vec![("meta", meta.into()), ("property", property.into())],
            );
        }
        let callee_m = self.start_node();
        let atom = self.parse_expr_atom(None)?;
        let callee = self.parse_subscripts(atom, callee_m, true)?;
        let arguments = if self.eat(TokenKind::LeftParen)? {
            self.parse_expr_list(TokenKind::RightParen, false, false, None)?
        } else {
            Vec::new()
        };
        self.finish(
            m,
            NodeType::NewExpression,
            vec![("callee", callee.into()), ("arguments", arguments.into())],
        )
    }

    fn parse_template_element(&mut self) -> PResult<Node> {
        let m = self.start_node();
        if !self.is(TokenKind::Template) {
            return Err(self.unexpected());
        }
        let cooked = self.tok_str();
        let raw = self.tok_text().replace("\r\n", "\n").replace('\r', "\n");
        self.next()?;
        let tail = self.is(TokenKind::BackQuote);
        self.finish(
            m,
            NodeType::TemplateElement,
            vec![
                (
                    "value",
                    Value::Object(vec![("raw", raw.into()), ("cooked", cooked.into())]),
                ),
                ("tail", tail.into()),
            ],
        )
    }

    fn parse_template(&mut self) -> PResult<Node> {
        let m = self.start_node();
        self.next()?;
        let mut expressions = Vec::new();
        let mut quasis = vec![self.parse_template_element()?];
        while !self.is(TokenKind::BackQuote) {
            self.expect(TokenKind::DollarBraceL)?;
            expressions.push(self.parse_expression(false, None)?);
            self.expect(TokenKind::RightBrace)?;
            quasis.push(self.parse_template_element()?);
        }
        self.next()?;
        self.finish(
            m,
            NodeType::TemplateLiteral,
            vec![
                ("quasis", quasis.into()),
                ("expressions", expressions.into()),
            ],
        )
    }

    // ── Object literals and patterns ────────────────────────────────────────

    fn parse_obj(&mut self, is_pattern: bool, mut refs: Option<&mut DestructuringErrors>) -> PResult<Node> {
        let m = self.start_node();
        self.next()?;
        let mut properties = Vec::new();
        let mut first = true;
        while !self.eat(TokenKind::RightBrace)? {
            if first {
                first = false;
            } else {
                self.expect(TokenKind::Comma)?;
                if self.eat(TokenKind::RightBrace)? {
                    break;
                }
            }
            let prop_m = self.start_node();
            let is_generator = self.is_es6() && !is_pattern && self.eat(TokenKind::Star)?;
            let (key, computed) = self.parse_property_name()?;
            properties.push(self.parse_property_value(
                prop_m,
                key,
                computed,
                is_pattern,
                is_generator,
                refs.as_deref_mut(),
            )?);
        }
        let kind = if is_pattern {
            NodeType::ObjectPattern
        } else {
            NodeType::ObjectExpression
        };
        self.finish(m, kind, vec![("properties", properties.into())])
    }

    /// Parse a property key; returns the key and whether it was computed.
    fn parse_property_name(&mut self) -> PResult<(Node, bool)> {
        if self.is_es6() && self.eat(TokenKind::LeftBracket)? {
            let key = self.parse_maybe_assign(false, None)?;
            self.expect(TokenKind::RightBracket)?;
            return Ok((key, true));
        }
        let key = match self.tok.kind {
            TokenKind::Num | TokenKind::String => self.parse_literal()?,
            _ => self.parse_ident(true)?,
        };
        Ok((key, false))
    }

    fn property_fields(
        &self,
        key: Node,
        value: Node,
        kind: &str,
        method: bool,
        shorthand: bool,
        computed: bool,
    ) -> Vec<(&'static str, Value)> {
        let mut fields = vec![
            ("key", key.into()),
            ("value", value.into()),
            ("kind", kind.into()),
        ];
        if self.is_es6() {
            fields.push(("method", method.into()));
            fields.push(("shorthand", shorthand.into()));
            fields.push(("computed", computed.into()));
        }
        fields
    }

    fn parse_property_value(
        &mut self,
        m: Marker,
        key: Node,
        computed: bool,
        is_pattern: bool,
        is_generator: bool,
        refs: Option<&mut DestructuringErrors>,
    ) -> PResult<Node> {
        let key_name = (!computed && key.kind == NodeType::Identifier)
            .then(|| key.str_field("name").unwrap_or_default().to_string());

        let fields = if self.eat(TokenKind::Colon)? {
            let value = if is_pattern {
                let start = self.start_node();
                self.parse_maybe_default(start, None)?
            } else {
                self.parse_maybe_assign(false, refs)?
            };
            self.property_fields(key, value, "init", false, false, computed)
        } else if self.is_es6() && self.is(TokenKind::LeftParen) {
            if is_pattern {
                return Err(self.unexpected());
            }
            let value = self.parse_method(is_generator)?;
            self.property_fields(key, value, "init", true, false, computed)
        } else if let Some(accessor @ ("get" | "set")) = key_name.as_deref()
            && !matches!(self.tok.kind, TokenKind::Comma | TokenKind::RightBrace)
        {
            if is_generator || is_pattern {
                return Err(self.unexpected());
            }
            let (key, computed) = self.parse_property_name()?;
            let value = self.parse_method(false)?;
            self.check_accessor_params(accessor, &value)?;
            self.property_fields(key, value, accessor, false, false, computed)
        } else if self.is_es6() && key_name.is_some() {
            let name = key_name.unwrap_or_default();
            let value = if is_pattern {
                if self.is_reserved_binding(&name) {
                    return Err(self.raise(key.start, format!("Binding {name}")));
                }
                self.parse_maybe_default(m, Some(key.clone()))?
            } else if let Some(refs) = refs.filter(|_| self.is(TokenKind::Eq)) {
                if refs.shorthand_assign.is_none() {
                    refs.shorthand_assign = Some(self.tok.start());
                }
                self.parse_maybe_default(m, Some(key.clone()))?
            } else {
                key.clone()
            };
            self.property_fields(key, value, "init", false, true, computed)
        } else {
            return Err(self.unexpected());
        };
        self.finish(m, NodeType::Property, fields)
    }

    fn check_accessor_params(&self, accessor: &str, method: &Node) -> PResult<()> {
        let count = match method.get("params") {
            Some(Value::List(params)) => params.len(),
            _ => 0,
        };
        if accessor == "get" && count != 0 {
            return Err(self.raise(method.start, "getter should have no params"));
        }
        if accessor == "set" && count != 1 {
            return Err(self.raise(method.start, "setter should have exactly one param"));
        }
        Ok(())
    }

    fn is_reserved_binding(&self, name: &str) -> bool {
        Keyword::from_word(name, true).is_some()
            || name == "enum"
            || (self.strict && (STRICT_RESERVED.contains(&name) || name == "eval" || name == "arguments"))
    }

    // ── Functions ───────────────────────────────────────────────────────────

    /// Parse a function after its `function` keyword.
    fn parse_function(&mut self, m: Marker, is_statement: bool) -> PResult<Node> {
        let generator = self.is_es6() && self.eat(TokenKind::Star)?;
        let id = if is_statement || self.is(TokenKind::Name) {
            Some(self.parse_ident(false)?)
        } else {
            None
        };
        self.expect(TokenKind::LeftParen)?;
        let params = self.parse_params()?;
        let (body, expression) = self.parse_function_body(id.as_ref(), &params, generator, false)?;
        let kind = if is_statement {
            NodeType::FunctionDeclaration
        } else {
            NodeType::FunctionExpression
        };
        let fields = self.function_fields(id, params, body, generator, expression);
        self.finish(m, kind, fields)
    }

    fn parse_params(&mut self) -> PResult<Vec<Node>> {
        let params = self.parse_binding_list(TokenKind::RightParen, false, false)?;
        Ok(params.into_iter().flatten().collect())
    }

    fn function_fields(
        &self,
        id: Option<Node>,
        params: Vec<Node>,
        body: Node,
        generator: bool,
        expression: bool,
    ) -> Vec<(&'static str, Value)> {
        let mut fields = vec![
            ("id", id.into()),
            ("params", params.into()),
            ("body", body.into()),
        ];
        if self.is_es6() {
            fields.push(("generator", generator.into()));
            fields.push(("expression", expression.into()));
        }
        fields
    }

    /// Parse a method's parameter list and body as a `FunctionExpression`.
    fn parse_method(&mut self, generator: bool) -> PResult<Node> {
        let m = self.start_node();
        self.expect(TokenKind::LeftParen)?;
        let params = self.parse_params()?;
        let (body, expression) = self.parse_function_body(None, &params, generator, false)?;
        let fields = self.function_fields(None, params, body, generator, expression);
        self.finish(m, NodeType::FunctionExpression, fields)
    }

    fn parse_arrow_expression(&mut self, m: Marker, params: Vec<Node>) -> PResult<Node> {
        let params = self.to_assignable_list(params.into_iter().map(Value::from).collect(), true)?;
        let params: Vec<Node> = params
            .into_iter()
            .filter_map(|p| match p {
                Value::Node(node) => Some(*node),
                _ => None,
            })
            .collect();
        let (body, expression) = self.parse_function_body(None, &params, false, true)?;
        let fields = self.function_fields(None, params, body, false, expression);
        self.finish(m, NodeType::ArrowFunctionExpression, fields)
    }

    /// Parse a function body with a fresh function context.  Returns the body
    /// and whether it is a bare expression (concise arrow body).
    fn parse_function_body(
        &mut self,
        id: Option<&Node>,
        params: &[Node],
        generator: bool,
        is_arrow: bool,
    ) -> PResult<(Node, bool)> {
        let is_expression = is_arrow && !self.is(TokenKind::LeftBrace);
        let old_in_function = std::mem::replace(&mut self.in_function, true);
        let old_in_generator = std::mem::replace(&mut self.in_generator, generator);
        let old_labels = std::mem::take(&mut self.labels);
        let old_strict = self.strict;

        let body = if is_expression {
            self.parse_maybe_assign(false, None)
        } else {
            self.parse_function_block()
        };
        let checked = body.and_then(|body| {
            if self.strict {
                if let Some(id) = id {
                    self.check_lval(id, true, None)?;
                }
                let mut names = HashSet::new();
                for param in params {
                    self.check_lval(param, true, Some(&mut names))?;
                }
            } else if is_arrow {
                let mut names = HashSet::new();
                for param in params {
                    self.check_lval(param, true, Some(&mut names))?;
                }
            }
            Ok(body)
        });

        self.in_function = old_in_function;
        self.in_generator = old_in_generator;
        self.labels = old_labels;
        self.strict = old_strict;
        Ok((checked?, is_expression))
    }

    fn parse_function_block(&mut self) -> PResult<Node> {
        let m = self.start_node();
        self.expect(TokenKind::LeftBrace)?;
        let mut body = Vec::new();
        let mut directives = true;
        while !self.eat(TokenKind::RightBrace)? {
            let stmt = self.parse_statement(true, false)?;
            if directives {
                directives = self.apply_directive(&stmt);
            }
            body.push(stmt);
        }
        self.finish(m, NodeType::BlockStatement, vec![("body", body.into())])
    }

    fn parse_yield(&mut self) -> PResult<Node> {
        let m = self.start_node();
        self.next()?;
        let bare = self.is(TokenKind::Semicolon)
            || self.can_insert_semicolon()
            || (!self.is(TokenKind::Star) && !self.tok.kind.starts_expr());
        let (argument, delegate) = if bare {
            (None, false)
        } else {
            let delegate = self.eat(TokenKind::Star)?;
            (Some(self.parse_maybe_assign(false, None)?), delegate)
        };
        self.finish(
            m,
            NodeType::YieldExpression,
            vec![("argument", argument.into()), ("delegate", delegate.into())],
        )
    }

    // ── Classes ─────────────────────────────────────────────────────────────

    fn parse_class(&mut self, m: Marker, is_statement: bool) -> PResult<Node> {
        self.next()?;
        let id = if self.is(TokenKind::Name) {
            Some(self.parse_ident(false)?)
        } else if is_statement {
            return Err(self.unexpected());
        } else {
            None
        };
        let super_class = if self.eat(TokenKind::Keyword(Keyword::Extends))? {
            Some(self.parse_expr_subscripts(None)?)
        } else {
            None
        };
        let old_strict = std::mem::replace(&mut self.strict, true);
        let body = self.parse_class_body();
        self.strict = old_strict;
        let body = body?;
        let kind = if is_statement {
            NodeType::ClassDeclaration
        } else {
            NodeType::ClassExpression
        };
        self.finish(
            m,
            kind,
            vec![
                ("id", id.into()),
                ("superClass", super_class.into()),
                ("body", body.into()),
            ],
        )
    }

    fn parse_class_body(&mut self) -> PResult<Node> {
        let m = self.start_node();
        self.expect(TokenKind::LeftBrace)?;
        let mut methods = Vec::new();
        let mut had_constructor = false;
        while !self.eat(TokenKind::RightBrace)? {
            if self.eat(TokenKind::Semicolon)? {
                continue;
            }
            let method_m = self.start_node();
            let mut is_generator = self.eat(TokenKind::Star)?;
            let (mut key, mut computed) = self.parse_property_name()?;
            let mut is_static = false;
            if !computed && is_ident_named(&key, "static") && !self.is(TokenKind::LeftParen) {
                if is_generator {
                    return Err(self.unexpected());
                }
                is_static = true;
                is_generator = self.eat(TokenKind::Star)?;
                (key, computed) = self.parse_property_name()?;
            }
            let mut kind = "method";
            if !computed
                && !is_generator
                && !self.is(TokenKind::LeftParen)
                && (is_ident_named(&key, "get") || is_ident_named(&key, "set"))
            {
                kind = if is_ident_named(&key, "get") { "get" } else { "set" };
                (key, computed) = self.parse_property_name()?;
            }
            let is_constructor = !is_static
                && !computed
                && (is_ident_named(&key, "constructor")
                    || (key.kind == NodeType::Literal
                        && key.str_field("value") == Some("constructor")));
            if is_constructor {
                if had_constructor {
                    return Err(self.raise(key.start, "Duplicate constructor in the same class"));
                }
                if kind != "method" {
                    return Err(self.raise(key.start, "Constructor can't have get/set modifier"));
                }
                if is_generator {
                    return Err(self.raise(key.start, "Constructor can't be a generator"));
                }
                kind = "constructor";
                had_constructor = true;
            }
            let value = self.parse_method(is_generator)?;
            if kind == "get" || kind == "set" {
                self.check_accessor_params(kind, &value)?;
            }
            methods.push(self.finish(
                method_m,
                NodeType::MethodDefinition,
                vec![
                    ("key", key.into()),
                    ("static", is_static.into()),
                    ("kind", kind.into()),
                    ("computed", computed.into()),
                    ("value", value.into()),
                ],
            )?);
        }
        self.finish(m, NodeType::ClassBody, vec![("body", methods.into())])
    }

    // ── Identifiers ─────────────────────────────────────────────────────────

    /// Parse an identifier.  With `liberal`, reserved words are accepted too
    /// (property names, `new`).
    pub(super) fn parse_ident(&mut self, liberal: bool) -> PResult<Node> {
        let m = self.start_node();
        let name = match self.tok.kind {
            TokenKind::Name => self.tok_str(),
            kind if liberal && kind.is_keyword() => kind.label().to_string(),
            _ => return Err(self.unexpected()),
        };
        if !liberal {
            let reserved = if self.is_es6() {
                name == "enum" || (self.options.source_type == SourceType::Module && name == "await")
            } else {
                matches!(
                    name.as_str(),
                    "class" | "enum" | "extends" | "super" | "const" | "export" | "import"
                )
            };
            let strict_reserved = self.strict && STRICT_RESERVED.contains(&name.as_str());
            let escaped = self.tok_text().contains('\\');
            if (reserved || strict_reserved) && (self.is_es6() || !escaped) {
                return Err(self.raise(
                    self.tok.start(),
                    format!("The keyword '{name}' is reserved"),
                ));
            }
        }
        self.next()?;
        self.finish(m, NodeType::Identifier, vec![("name", name.into())])
    }

    // ── Patterns ────────────────────────────────────────────────────────────

    fn parse_rest(&mut self) -> PResult<Node> {
        let m = self.start_node();
        self.next()?;
        let argument = match self.tok.kind {
            TokenKind::Name | TokenKind::LeftBracket => self.parse_binding_atom()?,
            _ => return Err(self.unexpected()),
        };
        self.finish(m, NodeType::RestElement, vec![("argument", argument.into())])
    }

    fn parse_spread(&mut self, refs: Option<&mut DestructuringErrors>) -> PResult<Node> {
        let m = self.start_node();
        self.next()?;
        let argument = self.parse_maybe_assign(false, refs)?;
        self.finish(m, NodeType::SpreadElement, vec![("argument", argument.into())])
    }

    fn parse_binding_atom(&mut self) -> PResult<Node> {
        if !self.is_es6() {
            return self.parse_ident(false);
        }
        match self.tok.kind {
            TokenKind::Name => self.parse_ident(false),
            TokenKind::LeftBracket => {
                let m = self.start_node();
                self.next()?;
                let elements = self.parse_binding_list(TokenKind::RightBracket, true, true)?;
                self.finish(m, NodeType::ArrayPattern, vec![("elements", elements.into())])
            }
            TokenKind::LeftBrace => self.parse_obj(true, None),
            _ => Err(self.unexpected()),
        }
    }

    fn parse_binding_list(
        &mut self,
        close: TokenKind,
        allow_empty: bool,
        allow_trailing_comma: bool,
    ) -> PResult<Vec<Option<Node>>> {
        let mut elements = Vec::new();
        let mut first = true;
        while !self.eat(close)? {
            if first {
                first = false;
            } else {
                self.expect(TokenKind::Comma)?;
            }
            if allow_empty && self.is(TokenKind::Comma) {
                elements.push(None);
            } else if allow_trailing_comma && self.is(close) {
                self.next()?;
                break;
            } else if self.is(TokenKind::Ellipsis) {
                elements.push(Some(self.parse_rest()?));
                self.expect(close)?;
                break;
            } else {
                let m = self.start_node();
                elements.push(Some(self.parse_maybe_default(m, None)?));
            }
        }
        Ok(elements)
    }

    /// Parse `left = default` where `left` is given or a binding atom.
    fn parse_maybe_default(&mut self, m: Marker, left: Option<Node>) -> PResult<Node> {
        let left = match left {
            Some(left) => left,
            None => self.parse_binding_atom()?,
        };
        if !self.is_es6() || !self.eat(TokenKind::Eq)? {
            return Ok(left);
        }
        let right = self.parse_maybe_assign(false, None)?;
        self.finish(
            m,
            NodeType::AssignmentPattern,
            vec![("left", left.into()), ("right", right.into())],
        )
    }

    fn parse_expr_list(
        &mut self,
        close: TokenKind,
        allow_trailing_comma: bool,
        allow_empty: bool,
        mut refs: Option<&mut DestructuringErrors>,
    ) -> PResult<Vec<Option<Node>>> {
        let mut elements = Vec::new();
        let mut first = true;
        while !self.eat(close)? {
            if first {
                first = false;
            } else {
                self.expect(TokenKind::Comma)?;
                if allow_trailing_comma && self.eat(close)? {
                    break;
                }
            }
            if allow_empty && self.is(TokenKind::Comma) {
                elements.push(None);
            } else if self.is(TokenKind::Ellipsis) {
                elements.push(Some(self.parse_spread(refs.as_deref_mut())?));
            } else {
                elements.push(Some(self.parse_maybe_assign(false, refs.as_deref_mut())?));
            }
        }
        Ok(elements)
    }

    /// Convert an expression that turned out to be an assignment target into
    /// a pattern.  Retyped nodes are offered to the hooks again.
    fn to_assignable(&mut self, mut node: Node, is_binding: bool) -> PResult<Node> {
        if !self.is_es6() {
            return Ok(node);
        }
        match node.kind {
            NodeType::Identifier
            | NodeType::ObjectPattern
            | NodeType::ArrayPattern
            | NodeType::AssignmentPattern => Ok(node),
            NodeType::ObjectExpression => {
                if let Some(Value::List(props)) = node.get_mut("properties") {
                    for prop in props.iter_mut() {
                        let Value::Node(prop) = prop else { continue };
                        if prop.str_field("kind") != Some("init") {
                            let at = prop.child("key").map_or(prop.start, |k| k.start);
                            return Err(self.raise(at, "Object pattern can't contain getter or setter"));
                        }
                        if let Some(value) = prop.take_child("value") {
                            prop.set("value", self.to_assignable(value, is_binding)?);
                        }
                    }
                }
                node.kind = NodeType::ObjectPattern;
                self.submit(node)
            }
            NodeType::ArrayExpression => {
                let elements = node.get_mut("elements").map(std::mem::take);
                if let Some(Value::List(elements)) = elements {
                    node.set("elements", Value::List(self.to_assignable_list(elements, is_binding)?));
                }
                node.kind = NodeType::ArrayPattern;
                self.submit(node)
            }
            NodeType::AssignmentExpression => {
                if node.str_field("operator") != Some("=") {
                    let at = node.child("left").map_or(node.start, |l| l.end);
                    return Err(self.raise(
                        at,
                        "Only '=' operator can be used for specifying default value.",
                    ));
                }
                node.take("operator");
                node.kind = NodeType::AssignmentPattern;
                self.submit(node)
            }
            NodeType::MemberExpression if !is_binding => Ok(node),
            _ => Err(self.raise(node.start, "Assigning to rvalue")),
        }
    }

    fn to_assignable_list(&mut self, mut items: Vec<Value>, is_binding: bool) -> PResult<Vec<Value>> {
        let mut end = items.len();
        let last_kind = match items.last() {
            Some(Value::Node(node)) => Some(node.kind),
            _ => None,
        };
        match last_kind {
            Some(NodeType::RestElement) => end -= 1,
            Some(NodeType::SpreadElement) => {
                if let Some(Value::Node(spread)) = items.pop() {
                    let mut rest = *spread;
                    if let Some(arg) = rest.take_child("argument") {
                        let arg = self.to_assignable(arg, is_binding)?;
                        if !matches!(
                            arg.kind,
                            NodeType::Identifier | NodeType::MemberExpression | NodeType::ArrayPattern
                        ) {
                            return Err(self.unexpected_at(arg.start));
                        }
                        rest.set("argument", arg);
                    }
                    rest.kind = NodeType::RestElement;
                    items.push(self.submit(rest)?.into());
                }
                end -= 1;
            }
            _ => {}
        }
        for item in &mut items[..end] {
            if let Value::Node(node) = std::mem::take(item) {
                *item = self.to_assignable(*node, is_binding)?.into();
            }
        }
        Ok(items)
    }

    /// Verify that `expr` may be assigned to (or bound, with `is_binding`).
    /// `clashes` collects parameter names to detect duplicates.
    fn check_lval(
        &self,
        expr: &Node,
        is_binding: bool,
        mut clashes: Option<&mut HashSet<String>>,
    ) -> PResult<()> {
        let verb = if is_binding { "Binding" } else { "Assigning to" };
        match expr.kind {
            NodeType::Identifier => {
                let name = expr.str_field("name").unwrap_or_default();
                if self.strict
                    && (name == "eval" || name == "arguments" || STRICT_RESERVED.contains(&name))
                {
                    return Err(self.raise(expr.start, format!("{verb} {name} in strict mode")));
                }
                if let Some(names) = clashes
                    && !names.insert(name.to_string())
                {
                    return Err(self.raise(expr.start, "Argument name clash in strict mode"));
                }
                Ok(())
            }
            NodeType::MemberExpression if !is_binding => Ok(()),
            NodeType::MemberExpression => {
                Err(self.raise(expr.start, format!("{verb} member expression")))
            }
            NodeType::ObjectPattern => {
                for prop in list_nodes(expr, "properties") {
                    if let Some(value) = prop.child("value") {
                        self.check_lval(value, is_binding, clashes.as_deref_mut())?;
                    }
                }
                Ok(())
            }
            NodeType::ArrayPattern => {
                for element in list_nodes(expr, "elements") {
                    self.check_lval(element, is_binding, clashes.as_deref_mut())?;
                }
                Ok(())
            }
            NodeType::AssignmentPattern => match expr.child("left") {
                Some(left) => self.check_lval(left, is_binding, clashes),
                None => Ok(()),
            },
            NodeType::RestElement => match expr.child("argument") {
                Some(arg) => self.check_lval(arg, is_binding, clashes),
                None => Ok(()),
            },
            _ => Err(self.raise(expr.start, format!("{verb} rvalue"))),
        }
    }

    // ── Modules ─────────────────────────────────────────────────────────────

    fn parse_module_source(&mut self) -> PResult<Node> {
        if self.is(TokenKind::String) {
            self.parse_literal()
        } else {
            Err(self.unexpected())
        }
    }

    fn parse_export(&mut self, m: Marker) -> PResult<Node> {
        self.next()?;
        if self.eat(TokenKind::Star)? {
            self.expect_contextual("from")?;
            let source = self.parse_module_source()?;
            self.semicolon()?;
            return self.finish(
                m,
                NodeType::ExportAllDeclaration,
                vec![("source", source.into())],
            );
        }
        if self.eat(TokenKind::Keyword(Keyword::Default))? {
            let parens = self.is(TokenKind::LeftParen);
            let expr = self.parse_maybe_assign(false, None)?;
            let declaration = match expr.kind {
                NodeType::FunctionExpression | NodeType::ClassExpression if !parens => {
                    let named = expr.child("id").is_some();
                    let mut decl = expr;
                    if named {
                        decl.kind = if decl.kind == NodeType::FunctionExpression {
                            NodeType::FunctionDeclaration
                        } else {
                            NodeType::ClassDeclaration
                        };
                        decl = self.submit(decl)?;
                    }
                    decl
                }
                _ => {
                    self.semicolon()?;
                    expr
                }
            };
            return self.finish(
                m,
                NodeType::ExportDefaultDeclaration,
                vec![("declaration", declaration.into())],
            );
        }
        let (declaration, specifiers, source) = if matches!(
            self.tok.kind,
            TokenKind::Keyword(
                Keyword::Var | Keyword::Let | Keyword::Const | Keyword::Function | Keyword::Class
            )
        ) {
            (Some(self.parse_statement(true, false)?), Vec::new(), None)
        } else {
            let specifiers = self.parse_export_specifiers()?;
            let source = if self.eat_contextual("from")? {
                Some(self.parse_module_source()?)
            } else {
                None
            };
            self.semicolon()?;
            (None, specifiers, source)
        };
        self.finish(
            m,
            NodeType::ExportNamedDeclaration,
            vec![
                ("declaration", declaration.into()),
                ("specifiers", specifiers.into()),
                ("source", source.into()),
            ],
        )
    }

    fn parse_export_specifiers(&mut self) -> PResult<Vec<Node>> {
        self.expect(TokenKind::LeftBrace)?;
        let mut specifiers = Vec::new();
        let mut first = true;
        while !self.eat(TokenKind::RightBrace)? {
            if first {
                first = false;
            } else {
                self.expect(TokenKind::Comma)?;
                if self.eat(TokenKind::RightBrace)? {
                    break;
                }
            }
            let m = self.start_node();
            let liberal = self.is_kw(Keyword::Default);
            let local = self.parse_ident(liberal)?;
            let exported = if self.eat_contextual("as")? {
                self.parse_ident(true)?
            } else {
                local.clone()
            };
            specifiers.push(self.finish(
                m,
                NodeType::ExportSpecifier,
                vec![("local", local.into()), ("exported", exported.into())],
            )?);
        }
        Ok(specifiers)
    }

    fn parse_import(&mut self, m: Marker) -> PResult<Node> {
        self.next()?;
        let (specifiers, source) = if self.is(TokenKind::String) {
            (Vec::new(), self.parse_literal()?)
        } else {
            let specifiers = self.parse_import_specifiers()?;
            self.expect_contextual("from")?;
            (specifiers, self.parse_module_source()?)
        };
        self.semicolon()?;
        self.finish(
            m,
            NodeType::ImportDeclaration,
            vec![("specifiers", specifiers.into()), ("source", source.into())],
        )
    }

    fn parse_import_specifiers(&mut self) -> PResult<Vec<Node>> {
        let mut specifiers = Vec::new();
        if self.is(TokenKind::Name) {
            let m = self.start_node();
            let local = self.parse_ident(false)?;
            self.check_lval(&local, true, None)?;
            specifiers.push(self.finish(
                m,
                NodeType::ImportDefaultSpecifier,
                vec![("local", local.into())],
            )?);
            if !self.eat(TokenKind::Comma)? {
                return Ok(specifiers);
            }
        }
        if self.is(TokenKind::Star) {
            let m = self.start_node();
            self.next()?;
            self.expect_contextual("as")?;
            let local = self.parse_ident(false)?;
            self.check_lval(&local, true, None)?;
            specifiers.push(self.finish(
                m,
                NodeType::ImportNamespaceSpecifier,
                vec![("local", local.into())],
            )?);
            return Ok(specifiers);
        }
        self.expect(TokenKind::LeftBrace)?;
        let mut first = true;
        while !self.eat(TokenKind::RightBrace)? {
            if first {
                first = false;
            } else {
                self.expect(TokenKind::Comma)?;
                if self.eat(TokenKind::RightBrace)? {
                    break;
                }
            }
            let m = self.start_node();
            let imported = self.parse_ident(true)?;
            let local = if self.eat_contextual("as")? {
                self.parse_ident(false)?
            } else {
                imported.clone()
            };
            self.check_lval(&local, true, None)?;
            specifiers.push(self.finish(
                m,
                NodeType::ImportSpecifier,
                vec![("imported", imported.into()), ("local", local.into())],
            )?);
        }
        Ok(specifiers)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn is_ident_named(node: &Node, name: &str) -> bool {
    node.kind == NodeType::Identifier && node.str_field("name") == Some(name)
}

/// The nodes of list field `field`, skipping holes.
fn list_nodes<'n>(node: &'n Node, field: &str) -> impl Iterator<Item = &'n Node> {
    let items: &[Value] = match node.get(field) {
        Some(Value::List(items)) => items,
        _ => &[],
    };
    items.iter().filter_map(Value::as_node)
}

/// `true` for `017`-style numbers and strings containing legacy octal
/// escapes such as `\101`.
fn has_legacy_octal(kind: TokenKind, raw: &str) -> bool {
    let bytes = raw.as_bytes();
    match kind {
        TokenKind::Num => bytes.len() > 1 && bytes[0] == b'0' && bytes[1].is_ascii_digit(),
        TokenKind::String => {
            let mut i = 0;
            while i + 1 < bytes.len() {
                if bytes[i] == b'\\' {
                    let next = bytes[i + 1];
                    let follows_digit = bytes.get(i + 2).is_some_and(u8::is_ascii_digit);
                    if (b'1'..=b'7').contains(&next) || (next == b'0' && follows_digit) {
                        return true;
                    }
                    i += 2;
                } else {
                    i += 1;
                }
            }
            false
        }
        _ => false,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::hooks::NoHooks;

    fn es5() -> EngineOptions {
        EngineOptions::default()
    }

    fn es6() -> EngineOptions {
        EngineOptions {
            ecma_version: EcmaVersion::Es2015,
            ..EngineOptions::default()
        }
    }

    fn parse(src: &str, options: &EngineOptions) -> PResult<Node> {
        parse_program(src, options, &mut NoHooks)
    }

    fn first_stmt(src: &str, options: &EngineOptions) -> Node {
        let program = parse(src, options).unwrap();
        match program.get("body") {
            Some(Value::List(items)) => items[0].as_node().unwrap().clone(),
            _ => panic!("program without body"),
        }
    }

    fn expr_of(stmt: &Node) -> &Node {
        stmt.child("expression").unwrap()
    }

    #[test]
    fn test_var_declaration() {
        let stmt = first_stmt("var x = 1;", &es5());
        assert_eq!(stmt.kind, NodeType::VariableDeclaration);
        assert_eq!(stmt.str_field("kind"), Some("var"));
        let Some(Value::List(decls)) = stmt.get("declarations") else {
            panic!("no declarations");
        };
        let decl = decls[0].as_node().unwrap();
        assert_eq!(decl.child("id").unwrap().str_field("name"), Some("x"));
        assert_eq!(decl.child("init").unwrap().get("value"), Some(&Value::Number(1.0)));
        assert_eq!((stmt.start, stmt.end), (0, 10));
    }

    #[test]
    fn test_binary_precedence() {
        let stmt = first_stmt("a + b * c || d", &es5());
        let expr = expr_of(&stmt);
        assert_eq!(expr.kind, NodeType::LogicalExpression);
        let sum = expr.child("left").unwrap();
        assert_eq!(sum.str_field("operator"), Some("+"));
        assert_eq!(sum.child("right").unwrap().str_field("operator"), Some("*"));
    }

    #[test]
    fn test_es5_has_no_generator_field() {
        let stmt = first_stmt("function f(a, b) { return a; }", &es5());
        assert_eq!(stmt.kind, NodeType::FunctionDeclaration);
        assert!(!stmt.has("generator"));
        let stmt = first_stmt("function* g() { yield 1; }", &es6());
        assert!(stmt.flag("generator"));
    }

    #[test]
    fn test_arrow_functions() {
        let stmt = first_stmt("(a, b) => a + b", &es6());
        let arrow = expr_of(&stmt);
        assert_eq!(arrow.kind, NodeType::ArrowFunctionExpression);
        assert!(arrow.flag("expression"));
        let stmt = first_stmt("x => { return x; }", &es6());
        assert!(!expr_of(&stmt).flag("expression"));
    }

    #[test]
    fn test_arrow_rejected_in_es5() {
        let err = parse("x => x", &es5()).unwrap_err();
        assert_eq!(err.message, "Unexpected token >");
    }

    #[test]
    fn test_destructuring_assignment_becomes_pattern() {
        let stmt = first_stmt("[a, ...b] = c", &es6());
        let left = expr_of(&stmt).child("left").unwrap();
        assert_eq!(left.kind, NodeType::ArrayPattern);
        let Some(Value::List(elements)) = left.get("elements") else {
            panic!("no elements");
        };
        assert_eq!(elements[1].as_node().unwrap().kind, NodeType::RestElement);
    }

    #[test]
    fn test_shorthand_default_outside_pattern_fails() {
        assert!(parse("({a = 1})", &es6()).is_err());
        assert!(parse("({a = 1} = b)", &es6()).is_ok());
    }

    #[test]
    fn test_object_property_flags() {
        let stmt = first_stmt("({ a, b() {}, [c]: 1, get d() { return 1; } })", &es6());
        let Some(Value::List(props)) = expr_of(&stmt).get("properties") else {
            panic!("no properties");
        };
        let props: Vec<_> = props.iter().map(|p| p.as_node().unwrap()).collect();
        assert!(props[0].flag("shorthand"));
        assert!(props[1].flag("method"));
        assert!(props[2].flag("computed"));
        assert_eq!(props[3].str_field("kind"), Some("get"));
    }

    #[test]
    fn test_template_literal() {
        let stmt = first_stmt("`a${b}c`", &es6());
        let tpl = expr_of(&stmt);
        assert_eq!(tpl.kind, NodeType::TemplateLiteral);
        let Some(Value::List(quasis)) = tpl.get("quasis") else {
            panic!("no quasis");
        };
        assert_eq!(quasis.len(), 2);
        assert!(quasis[1].as_node().unwrap().flag("tail"));
    }

    #[test]
    fn test_class_declaration() {
        let stmt = first_stmt(
            "class A extends B { constructor() { super(); } static m() {} }",
            &es6(),
        );
        assert_eq!(stmt.kind, NodeType::ClassDeclaration);
        let body = stmt.child("body").unwrap();
        let Some(Value::List(methods)) = body.get("body") else {
            panic!("no methods");
        };
        assert_eq!(methods[0].as_node().unwrap().str_field("kind"), Some("constructor"));
        assert!(methods[1].as_node().unwrap().flag("static"));
    }

    #[test]
    fn test_modules() {
        let options = EngineOptions {
            source_type: SourceType::Module,
            ..es6()
        };
        let program = parse(
            "import a, { b as c } from 'm'; export default function f() {} export * from 'n';",
            &options,
        )
        .unwrap();
        let Some(Value::List(body)) = program.get("body") else {
            panic!("no body");
        };
        let kinds: Vec<_> = body.iter().map(|s| s.as_node().unwrap().kind).collect();
        assert_eq!(
            kinds,
            vec![
                NodeType::ImportDeclaration,
                NodeType::ExportDefaultDeclaration,
                NodeType::ExportAllDeclaration,
            ]
        );
        let decl = body[1].as_node().unwrap().child("declaration").unwrap();
        assert_eq!(decl.kind, NodeType::FunctionDeclaration);
    }

    #[test]
    fn test_import_only_at_top_level() {
        let err = parse("{ import a from 'b'; }", &es6()).unwrap_err();
        assert_eq!(err.message, "'import' and 'export' may only appear at the top level");
    }

    #[test]
    fn test_return_outside_function() {
        let err = parse("return 1", &es5()).unwrap_err();
        assert_eq!(err.message, "'return' outside of function");
        let options = EngineOptions {
            allow_return_outside_function: true,
            ..es5()
        };
        assert!(parse("return 1", &options).is_ok());
    }

    #[test]
    fn test_strict_mode_checks() {
        let err = parse("'use strict'; with (a) {}", &es5()).unwrap_err();
        assert_eq!(err.message, "'with' in strict mode");
        let err = parse("'use strict'; var x = 017;", &es5()).unwrap_err();
        assert_eq!(err.message, "Octal literal in strict mode");
        let err = parse("function f(eval) { 'use strict'; }", &es5()).unwrap_err();
        assert_eq!(err.message, "Binding eval in strict mode");
        assert!(parse("with (a) {}", &es5()).is_ok());
    }

    #[test]
    fn test_labels() {
        assert!(parse("a: while (1) { continue a; }", &es5()).is_ok());
        let err = parse("break;", &es5()).unwrap_err();
        assert_eq!(err.message, "Unsyntactic break");
        let err = parse("a: { continue a; }", &es5()).unwrap_err();
        assert_eq!(err.message, "Unsyntactic continue");
    }

    #[test]
    fn test_for_of_and_in() {
        let stmt = first_stmt("for (let x of y) {}", &es6());
        assert_eq!(stmt.kind, NodeType::ForOfStatement);
        let stmt = first_stmt("for (var k in o) {}", &es5());
        assert_eq!(stmt.kind, NodeType::ForInStatement);
        let stmt = first_stmt("for (;;) break;", &es5());
        assert_eq!(stmt.kind, NodeType::ForStatement);
    }

    #[test]
    fn test_ranges_and_locations() {
        let options = EngineOptions {
            ranges: true,
            locations: true,
            source_file: Some("a.js".into()),
            ..es5()
        };
        let stmt = first_stmt("\n  foo;", &options);
        assert_eq!(stmt.range, Some([3, 7]));
        let loc = stmt.loc.unwrap();
        assert_eq!(loc.start, LineCol { line: 2, column: 2 });
        assert_eq!(loc.source.as_deref(), Some("a.js"));
    }

    #[test]
    fn test_asi() {
        let program = parse("a\nb", &es5()).unwrap();
        let Some(Value::List(body)) = program.get("body") else {
            panic!("no body");
        };
        assert_eq!(body.len(), 2);
        assert!(parse("a b", &es5()).is_err());
    }

    #[test]
    fn test_unexpected_end_of_input() {
        let err = parse("a +", &es5()).unwrap_err();
        assert_eq!(err.message, "Unexpected end of input");
    }

    #[test]
    fn test_new_target_and_regex_literal() {
        let stmt = first_stmt("function f() { return new.target; }", &es6());
        assert_eq!(stmt.kind, NodeType::FunctionDeclaration);
        let stmt = first_stmt("x = /ab+c/g", &es5());
        let literal = expr_of(&stmt).child("right").unwrap();
        assert_eq!(literal.str_field("raw"), Some("/ab+c/g"));
        assert!(literal.get("value").unwrap().is_null());
    }

    #[test]
    fn test_legacy_octal_detection() {
        assert!(has_legacy_octal(TokenKind::Num, "017"));
        assert!(!has_legacy_octal(TokenKind::Num, "0"));
        assert!(!has_legacy_octal(TokenKind::Num, "0x1F"));
        assert!(has_legacy_octal(TokenKind::String, r"'\101'"));
        assert!(!has_legacy_octal(TokenKind::String, r"'\0'"));
        assert!(!has_legacy_octal(TokenKind::String, r"'\\1'"));
    }
}
