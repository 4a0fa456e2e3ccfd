//! ECMAScript lexer (scanner).
//!
//! The scanner produces acorn-style token categories ([`TokenKind`]):
//! operators are grouped by precedence class, every category carries a
//! canonical label, and keyword and assignment categories are flagged.
//!
//! Lexing is dialect-aware.  With [`ScannerOptions::ecma6`] off the scanner
//! never produces `=>`, `...`, template tokens, `0b`/`0o` literals, `\u{…}`
//! escapes or the `u`/`y` regular-expression flags.  JSX lexing is driven by
//! the caller through [`LexMode`], because only the parser knows whether it
//! is positioned inside a tag or between children.
//!
//! See [`Scanner`] for the main entry point.

use smallvec::{SmallVec, smallvec};
use thiserror::Error;

// ─────────────────────────────────────────────────────────────────────────────
// Position / Span
// ─────────────────────────────────────────────────────────────────────────────

/// A byte offset + line/column location in source code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    /// Byte offset from the beginning of the source string.
    pub offset: usize,
    /// 1-based line number (incremented on every *LineTerminator*).
    pub line: u32,
    /// 0-based column number, measured in Unicode scalar values.
    pub column: u32,
}

impl Position {
    /// The position of the first character of any source text.
    pub const START: Position = Position {
        offset: 0,
        line: 1,
        column: 0,
    };
}

/// A half-open `[start, end)` source span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// Inclusive start of the span.
    pub start: Position,
    /// Exclusive end of the span.
    pub end: Position,
}

// ─────────────────────────────────────────────────────────────────────────────
// Keywords
// ─────────────────────────────────────────────────────────────────────────────

/// Reserved words that the scanner reports as keyword tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Break,
    Case,
    Catch,
    Class,
    Const,
    Continue,
    Debugger,
    Default,
    Delete,
    Do,
    Else,
    Export,
    Extends,
    False,
    Finally,
    For,
    Function,
    If,
    Import,
    In,
    Instanceof,
    Let,
    New,
    Null,
    Return,
    Super,
    Switch,
    This,
    Throw,
    True,
    Try,
    Typeof,
    Var,
    Void,
    While,
    With,
}

impl Keyword {
    /// The source spelling of the keyword.
    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Break => "break",
            Keyword::Case => "case",
            Keyword::Catch => "catch",
            Keyword::Class => "class",
            Keyword::Const => "const",
            Keyword::Continue => "continue",
            Keyword::Debugger => "debugger",
            Keyword::Default => "default",
            Keyword::Delete => "delete",
            Keyword::Do => "do",
            Keyword::Else => "else",
            Keyword::Export => "export",
            Keyword::Extends => "extends",
            Keyword::False => "false",
            Keyword::Finally => "finally",
            Keyword::For => "for",
            Keyword::Function => "function",
            Keyword::If => "if",
            Keyword::Import => "import",
            Keyword::In => "in",
            Keyword::Instanceof => "instanceof",
            Keyword::Let => "let",
            Keyword::New => "new",
            Keyword::Null => "null",
            Keyword::Return => "return",
            Keyword::Super => "super",
            Keyword::Switch => "switch",
            Keyword::This => "this",
            Keyword::Throw => "throw",
            Keyword::True => "true",
            Keyword::Try => "try",
            Keyword::Typeof => "typeof",
            Keyword::Var => "var",
            Keyword::Void => "void",
            Keyword::While => "while",
            Keyword::With => "with",
        }
    }

    /// Map a word to a keyword of the given dialect.
    ///
    /// ES5 knows only the classic reserved words; ES2015 adds `let`,
    /// `const`, `class`, `extends`, `export`, `import` and `super`.  `yield`
    /// is contextual in both dialects and always scans as a name.
    pub fn from_word(word: &str, ecma6: bool) -> Option<Keyword> {
        let kw = match word {
            "break" => Keyword::Break,
            "case" => Keyword::Case,
            "catch" => Keyword::Catch,
            "continue" => Keyword::Continue,
            "debugger" => Keyword::Debugger,
            "default" => Keyword::Default,
            "delete" => Keyword::Delete,
            "do" => Keyword::Do,
            "else" => Keyword::Else,
            "false" => Keyword::False,
            "finally" => Keyword::Finally,
            "for" => Keyword::For,
            "function" => Keyword::Function,
            "if" => Keyword::If,
            "in" => Keyword::In,
            "instanceof" => Keyword::Instanceof,
            "new" => Keyword::New,
            "null" => Keyword::Null,
            "return" => Keyword::Return,
            "switch" => Keyword::Switch,
            "this" => Keyword::This,
            "throw" => Keyword::Throw,
            "true" => Keyword::True,
            "try" => Keyword::Try,
            "typeof" => Keyword::Typeof,
            "var" => Keyword::Var,
            "void" => Keyword::Void,
            "while" => Keyword::While,
            "with" => Keyword::With,
            "class" if ecma6 => Keyword::Class,
            "const" if ecma6 => Keyword::Const,
            "export" if ecma6 => Keyword::Export,
            "extends" if ecma6 => Keyword::Extends,
            "import" if ecma6 => Keyword::Import,
            "let" if ecma6 => Keyword::Let,
            "super" if ecma6 => Keyword::Super,
            _ => return None,
        };
        Some(kw)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// TokenKind
// ─────────────────────────────────────────────────────────────────────────────

/// The lexical category of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // ── Literals and names ────────────────────────────────────────────────
    /// Identifier (including contextual words such as `of`, `yield`, `get`).
    Name,
    /// Numeric literal.
    Num,
    /// String literal (also JSX attribute strings).
    String,
    /// Regular-expression literal `/pattern/flags`.
    Regexp,
    /// A template chunk between `` ` ``/`}` and `${`/`` ` ``.
    Template,
    /// End of input.
    Eof,

    // ── Punctuation ───────────────────────────────────────────────────────
    /// `[`
    LeftBracket,
    /// `]`
    RightBracket,
    /// `{`
    LeftBrace,
    /// `}`
    RightBrace,
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `,`
    Comma,
    /// `;`
    Semicolon,
    /// `:`
    Colon,
    /// `.`
    Dot,
    /// `?`
    Question,
    /// `=>`
    Arrow,
    /// `...`
    Ellipsis,
    /// `` ` ``
    BackQuote,
    /// `${`
    DollarBraceL,

    // ── Operators ─────────────────────────────────────────────────────────
    /// `=`
    Eq,
    /// Compound assignment (`+=`, `>>>=`, …).
    Assign,
    /// `++` / `--`
    IncDec,
    /// `!` / `~`
    Prefix,
    /// `||`
    LogicalOr,
    /// `&&`
    LogicalAnd,
    /// `|`
    BitwiseOr,
    /// `^`
    BitwiseXor,
    /// `&`
    BitwiseAnd,
    /// `==`, `!=`, `===`, `!==`
    Equality,
    /// `<`, `>`, `<=`, `>=`
    Relational,
    /// `<<`, `>>`, `>>>`
    BitShift,
    /// `+` / `-`
    PlusMin,
    /// `%`
    Modulo,
    /// `*`
    Star,
    /// `/`
    Slash,

    // ── JSX ───────────────────────────────────────────────────────────────
    /// Element or attribute name inside a JSX tag.
    JsxName,
    /// Text between JSX children.
    JsxText,
    /// `<` opening a JSX tag.
    JsxTagStart,
    /// `>` closing a JSX tag.
    JsxTagEnd,

    // ── Reserved words ────────────────────────────────────────────────────
    /// A reserved word of the active dialect.
    Keyword(Keyword),
}

impl TokenKind {
    /// The canonical label of the category.
    pub fn label(self) -> &'static str {
        match self {
            TokenKind::Name => "name",
            TokenKind::Num => "num",
            TokenKind::String => "string",
            TokenKind::Regexp => "regexp",
            TokenKind::Template => "template",
            TokenKind::Eof => "eof",
            TokenKind::LeftBracket => "[",
            TokenKind::RightBracket => "]",
            TokenKind::LeftBrace => "{",
            TokenKind::RightBrace => "}",
            TokenKind::LeftParen => "(",
            TokenKind::RightParen => ")",
            TokenKind::Comma => ",",
            TokenKind::Semicolon => ";",
            TokenKind::Colon => ":",
            TokenKind::Dot => ".",
            TokenKind::Question => "?",
            TokenKind::Arrow => "=>",
            TokenKind::Ellipsis => "...",
            TokenKind::BackQuote => "`",
            TokenKind::DollarBraceL => "${",
            TokenKind::Eq => "=",
            TokenKind::Assign => "_=",
            TokenKind::IncDec => "++/--",
            TokenKind::Prefix => "prefix",
            TokenKind::LogicalOr => "||",
            TokenKind::LogicalAnd => "&&",
            TokenKind::BitwiseOr => "|",
            TokenKind::BitwiseXor => "^",
            TokenKind::BitwiseAnd => "&",
            TokenKind::Equality => "==/!=",
            TokenKind::Relational => "</>",
            TokenKind::BitShift => "<</>>",
            TokenKind::PlusMin => "+/-",
            TokenKind::Modulo => "%",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::JsxName => "jsxName",
            TokenKind::JsxText => "jsxText",
            TokenKind::JsxTagStart => "jsxTagStart",
            TokenKind::JsxTagEnd => "jsxTagEnd",
            TokenKind::Keyword(kw) => kw.as_str(),
        }
    }

    /// `true` for reserved-word categories.
    pub fn is_keyword(self) -> bool {
        matches!(self, TokenKind::Keyword(_))
    }

    /// `true` for `=` and the compound assignment operators.
    pub fn is_assign(self) -> bool {
        matches!(self, TokenKind::Eq | TokenKind::Assign)
    }

    /// Binary-operator precedence, or `None` when the category is not a
    /// binary operator.
    pub fn binop(self) -> Option<u8> {
        match self {
            TokenKind::LogicalOr => Some(1),
            TokenKind::LogicalAnd => Some(2),
            TokenKind::BitwiseOr => Some(3),
            TokenKind::BitwiseXor => Some(4),
            TokenKind::BitwiseAnd => Some(5),
            TokenKind::Equality => Some(6),
            TokenKind::Relational
            | TokenKind::Keyword(Keyword::In)
            | TokenKind::Keyword(Keyword::Instanceof) => Some(7),
            TokenKind::BitShift => Some(8),
            TokenKind::PlusMin => Some(9),
            TokenKind::Modulo | TokenKind::Star | TokenKind::Slash => Some(10),
            _ => None,
        }
    }

    /// `true` when a token of this category can begin an expression.
    pub fn starts_expr(self) -> bool {
        matches!(
            self,
            TokenKind::Name
                | TokenKind::Num
                | TokenKind::String
                | TokenKind::Regexp
                | TokenKind::LeftBracket
                | TokenKind::LeftBrace
                | TokenKind::LeftParen
                | TokenKind::BackQuote
                | TokenKind::IncDec
                | TokenKind::Prefix
                | TokenKind::PlusMin
                | TokenKind::JsxTagStart
                | TokenKind::Keyword(
                    Keyword::This
                        | Keyword::Super
                        | Keyword::Null
                        | Keyword::True
                        | Keyword::False
                        | Keyword::Function
                        | Keyword::Class
                        | Keyword::New
                        | Keyword::Typeof
                        | Keyword::Void
                        | Keyword::Delete
                )
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// TokenValue
// ─────────────────────────────────────────────────────────────────────────────

/// The payload value associated with a [`Token`].
#[derive(Debug, Clone, PartialEq)]
pub enum TokenValue {
    /// No semantic value (brackets, `.`, `...`, `?`, EOF, …).
    None,
    /// Names, keywords, operator text, and the *cooked* contents of string,
    /// template and JSX text tokens.
    Str(String),
    /// Parsed numeric value for [`TokenKind::Num`].
    Number(f64),
    /// Pattern and flags of a [`TokenKind::Regexp`].
    Regex {
        /// Body between the slashes.
        pattern: String,
        /// Flag letters after the closing slash.
        flags: String,
    },
}

impl TokenValue {
    /// The textual payload, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            TokenValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Token / RawComment
// ─────────────────────────────────────────────────────────────────────────────

/// A single lexical token produced by the [`Scanner`].
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The lexical category.
    pub kind: TokenKind,
    /// The associated value, if any.
    pub value: TokenValue,
    /// Source location of this token.
    pub span: Span,
    /// `true` when at least one *LineTerminator* appeared between the previous
    /// token and this one.
    ///
    /// The parser uses this flag for Automatic Semicolon Insertion (ASI).
    pub had_line_terminator_before: bool,
}

impl Token {
    /// Byte offset of the first character.
    pub fn start(&self) -> usize {
        self.span.start.offset
    }

    /// Byte offset one past the last character.
    pub fn end(&self) -> usize {
        self.span.end.offset
    }

    /// `true` for a name token spelled exactly `word`.
    pub fn is_contextual(&self, word: &str) -> bool {
        self.kind == TokenKind::Name && self.value.as_str() == Some(word)
    }
}

/// A comment skipped while looking for the next token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawComment {
    /// `true` for `/* … */`, `false` for `// …`.
    pub block: bool,
    /// Comment text without the delimiters.
    pub text: String,
    /// Location including the delimiters.
    pub span: Span,
}

// ─────────────────────────────────────────────────────────────────────────────
// Modes, options, errors
// ─────────────────────────────────────────────────────────────────────────────

/// How the next token should be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LexMode {
    /// Ordinary ECMAScript tokens.
    #[default]
    Normal,
    /// Inside a JSX tag: names may contain `-`, strings have no escapes and
    /// `>` closes the tag.
    JsxTag,
    /// Between JSX children: everything up to `<` or `{` is text.
    JsxChild,
}

/// Dialect switches for the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScannerOptions {
    /// Recognise ES2015 tokens and reserved words.
    pub ecma6: bool,
    /// Recognise `<` as a JSX tag start in expression position.
    pub jsx: bool,
}

/// A lexical error at a byte offset.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct LexError {
    /// Byte offset the error is reported at.
    pub pos: usize,
    /// Human-readable description.
    pub message: String,
}

impl LexError {
    fn new(pos: usize, message: impl Into<String>) -> Self {
        Self {
            pos,
            message: message.into(),
        }
    }
}

/// Result alias for scanner operations.
pub type LexResult<T> = Result<T, LexError>;

// ─────────────────────────────────────────────────────────────────────────────
// Character-classification helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Returns `true` for *LineTerminator* code points.
fn is_line_terminator(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// Returns `true` for *WhiteSpace* **or** *LineTerminator* characters.
fn is_js_whitespace(c: char) -> bool {
    matches!(
        c,
        '\t'                      // CHARACTER TABULATION
        | '\x0B'                  // LINE TABULATION
        | '\x0C'                  // FORM FEED
        | ' '                     // SPACE
        | '\u{00A0}'              // NO-BREAK SPACE
        | '\u{FEFF}'              // ZERO WIDTH NO-BREAK SPACE (BOM)
        | '\u{1680}'              // OGHAM SPACE MARK
        | '\u{2000}'
            ..='\u{200A}' // EN QUAD … HAIR SPACE
        | '\u{202F}'              // NARROW NO-BREAK SPACE
        | '\u{205F}'              // MEDIUM MATHEMATICAL SPACE
        | '\u{3000}'              // IDEOGRAPHIC SPACE
        | '\n'
        | '\r'
        | '\u{2028}'
        | '\u{2029}'
    )
}

/// Returns `true` for characters that may *start* an identifier.
fn is_id_start(c: char) -> bool {
    c == '$' || c == '_' || c.is_alphabetic()
}

/// Returns `true` for characters that may *continue* an identifier.
fn is_id_continue(c: char) -> bool {
    c == '$' || c == '_' || c == '\u{200C}' || c == '\u{200D}' || c.is_alphanumeric()
}

/// `true` for token categories after which an operand, not an operator, is
/// expected.  `)`, `}`, `` ` ``, `++`/`--`, `function` and `class` are
/// handled by the context stack instead.
fn before_expr(kind: TokenKind) -> bool {
    match kind {
        TokenKind::LeftBracket
        | TokenKind::LeftBrace
        | TokenKind::LeftParen
        | TokenKind::Comma
        | TokenKind::Semicolon
        | TokenKind::Colon
        | TokenKind::Question
        | TokenKind::Arrow
        | TokenKind::Ellipsis
        | TokenKind::DollarBraceL
        | TokenKind::Eq
        | TokenKind::Assign
        | TokenKind::Prefix
        | TokenKind::LogicalOr
        | TokenKind::LogicalAnd
        | TokenKind::BitwiseOr
        | TokenKind::BitwiseXor
        | TokenKind::BitwiseAnd
        | TokenKind::Equality
        | TokenKind::Relational
        | TokenKind::BitShift
        | TokenKind::PlusMin
        | TokenKind::Modulo
        | TokenKind::Star
        | TokenKind::Slash => true,
        TokenKind::Keyword(kw) => matches!(
            kw,
            Keyword::Case
                | Keyword::Default
                | Keyword::Do
                | Keyword::Else
                | Keyword::Return
                | Keyword::Throw
                | Keyword::New
                | Keyword::Extends
                | Keyword::In
                | Keyword::Instanceof
                | Keyword::Typeof
                | Keyword::Void
                | Keyword::Delete
        ),
        _ => false,
    }
}

/// Named character references understood in JSX text and attribute strings.
fn named_entity(name: &str) -> Option<char> {
    let ch = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{00A0}',
        "copy" => '\u{00A9}',
        "reg" => '\u{00AE}',
        "trade" => '\u{2122}',
        "hellip" => '\u{2026}',
        "mdash" => '\u{2014}',
        "ndash" => '\u{2013}',
        "lsquo" => '\u{2018}',
        "rsquo" => '\u{2019}',
        "ldquo" => '\u{201C}',
        "rdquo" => '\u{201D}',
        "laquo" => '\u{00AB}',
        "raquo" => '\u{00BB}',
        "middot" => '\u{00B7}',
        "bull" => '\u{2022}',
        "times" => '\u{00D7}',
        "divide" => '\u{00F7}',
        "euro" => '\u{20AC}',
        _ => return None,
    };
    Some(ch)
}

/// Compute the line/column [`Position`] of `offset` within `source`.
///
/// Lines are 1-based and columns 0-based; `\r\n` counts as one terminator.
/// Offsets past the end clamp to the end of the source.
pub fn line_info(source: &str, offset: usize) -> Position {
    let mut line = 1;
    let mut column = 0;
    let mut chars = source.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if i >= offset {
            break;
        }
        match c {
            '\r' => {
                if let Some(&(_, '\n')) = chars.peek() {
                    chars.next();
                }
                line += 1;
                column = 0;
            }
            '\n' | '\u{2028}' | '\u{2029}' => {
                line += 1;
                column = 0;
            }
            _ => column += 1,
        }
    }
    Position {
        offset: offset.min(source.len()),
        line,
        column,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Scanner
// ─────────────────────────────────────────────────────────────────────────────

/// Where the scanner is relative to a template literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TemplateState {
    /// Ordinary code.
    Code,
    /// The next token is a template chunk.
    Chunk,
    /// A chunk was just read; the next token is `${` or the closing `` ` ``.
    ChunkEnd,
}

/// An open bracket (or function/class header) the scanner is inside.
///
/// The stack of these decides whether a `/` starts a regular expression and
/// whether a `<` starts a JSX tag: both only happen where an expression may
/// begin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexContext {
    /// `{` opening a block or function body.
    BraceStatement,
    /// `{` opening an object literal or JSX expression container.
    BraceExpression,
    /// `${` inside a template literal.
    BraceTemplate,
    /// `(` after `if`, `for`, `while` or `with`.
    ParenStatement,
    /// Any other `(`.
    ParenExpression,
    /// Inside `` `…` ``.
    Template,
    /// `function`/`class` in expression position.
    FunctionExpression,
    /// `function`/`class` in statement position.
    FunctionStatement,
}

impl LexContext {
    fn is_expr(self) -> bool {
        matches!(
            self,
            LexContext::BraceExpression
                | LexContext::BraceTemplate
                | LexContext::ParenExpression
                | LexContext::Template
                | LexContext::FunctionExpression
        )
    }

    fn is_function(self) -> bool {
        matches!(
            self,
            LexContext::FunctionExpression | LexContext::FunctionStatement
        )
    }
}

/// ECMAScript lexer.
///
/// Produces a stream of [`Token`]s from a UTF-8 source string.  Call
/// [`Scanner::next_token`] repeatedly until a token with [`TokenKind::Eof`]
/// is returned.  Comments skipped along the way are buffered and can be
/// drained with [`Scanner::take_comments`].
///
/// # Example
///
/// ```
/// use esgate_core::parser::scanner::{LexMode, Scanner, ScannerOptions, TokenKind};
///
/// let mut sc = Scanner::new("var x = 42;", ScannerOptions::default());
/// loop {
///     let tok = sc.next_token(LexMode::Normal).unwrap();
///     if tok.kind == TokenKind::Eof { break; }
///     println!("{:?}", tok.kind);
/// }
/// ```
pub struct Scanner<'src> {
    /// The complete source string.
    source: &'src str,
    /// Current byte position within `source`.
    pos: usize,
    /// Current 1-based line number.
    line: u32,
    /// Current 0-based column number.
    column: u32,
    options: ScannerOptions,
    /// Enclosing brackets; never empty.  A `}` whose context is
    /// [`LexContext::BraceTemplate`] closes a template substitution.
    context: SmallVec<[LexContext; 8]>,
    /// Whether the next token may begin an expression.
    expr_allowed: bool,
    template: TemplateState,
    /// The most recent significant token kind.
    last_significant_kind: Option<TokenKind>,
    /// Comments skipped since the last [`Scanner::take_comments`].
    comments: Vec<RawComment>,
}

impl<'src> Scanner<'src> {
    /// Create a new scanner for the given UTF-8 source string.
    pub fn new(source: &'src str, options: ScannerOptions) -> Self {
        Self::resume_at(source, options, Position::START)
    }

    /// Create a scanner that starts reading at `at` (used to re-lex the
    /// token at an arbitrary offset for error messages).
    pub fn resume_at(source: &'src str, options: ScannerOptions, at: Position) -> Self {
        Self {
            source,
            pos: at.offset.min(source.len()),
            line: at.line,
            column: at.column,
            options,
            context: smallvec![LexContext::BraceStatement],
            expr_allowed: true,
            template: TemplateState::Code,
            last_significant_kind: None,
            comments: Vec::new(),
        }
    }

    /// Returns `true` when all input has been consumed.
    pub fn is_eof(&self) -> bool {
        self.pos >= self.source.len()
    }

    /// Drain the comments skipped so far.
    pub fn take_comments(&mut self) -> Vec<RawComment> {
        std::mem::take(&mut self.comments)
    }

    // ── Low-level character helpers ─────────────────────────────────────────

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn peek2(&self) -> Option<char> {
        let mut it = self.source[self.pos..].chars();
        it.next();
        it.next()
    }

    fn peek3(&self) -> Option<char> {
        let mut it = self.source[self.pos..].chars();
        it.next();
        it.next();
        it.next()
    }

    /// Advance past the current character and update line/column tracking.
    ///
    /// `\r\n` is treated as a single line terminator; the `\n` is consumed
    /// automatically so callers never see a stray `\r`.  Returns `'\0'` at
    /// end of input.
    fn advance(&mut self) -> char {
        let Some(ch) = self.peek() else {
            return '\0';
        };
        self.pos += ch.len_utf8();
        match ch {
            '\r' => {
                if self.source[self.pos..].starts_with('\n') {
                    self.pos += 1;
                }
                self.line += 1;
                self.column = 0;
            }
            '\n' | '\u{2028}' | '\u{2029}' => {
                self.line += 1;
                self.column = 0;
            }
            _ => {
                self.column += 1;
            }
        }
        ch
    }

    /// Advance one character and append its exact source text to `out`.
    fn advance_into(&mut self, out: &mut String) {
        let before = self.pos;
        self.advance();
        out.push_str(&self.source[before..self.pos]);
    }

    fn current_pos(&self) -> Position {
        Position {
            offset: self.pos,
            line: self.line,
            column: self.column,
        }
    }

    // ── Token construction ──────────────────────────────────────────────────

    fn finish(
        &mut self,
        kind: TokenKind,
        value: TokenValue,
        start: Position,
        had_lt: bool,
    ) -> Token {
        if kind != TokenKind::Eof {
            self.update_context(kind, had_lt);
            self.last_significant_kind = Some(kind);
        }
        Token {
            kind,
            value,
            span: Span {
                start,
                end: self.current_pos(),
            },
            had_line_terminator_before: had_lt,
        }
    }

    fn current_context(&self) -> LexContext {
        self.context
            .last()
            .copied()
            .unwrap_or(LexContext::BraceStatement)
    }

    /// Whether a `{` following `prev` opens a block rather than an object
    /// literal.
    fn brace_is_block(&self, prev: Option<TokenKind>, had_lt: bool) -> bool {
        let parent = self.current_context();
        if parent.is_function() {
            return true;
        }
        match prev {
            None => true,
            Some(TokenKind::Colon)
                if matches!(
                    parent,
                    LexContext::BraceStatement | LexContext::BraceExpression
                ) =>
            {
                !parent.is_expr()
            }
            Some(TokenKind::Keyword(Keyword::Return)) => had_lt,
            Some(
                TokenKind::Keyword(Keyword::Else)
                | TokenKind::Semicolon
                | TokenKind::RightParen
                | TokenKind::Arrow,
            ) => true,
            Some(TokenKind::LeftBrace) => parent == LexContext::BraceStatement,
            Some(
                TokenKind::Name
                | TokenKind::Keyword(Keyword::Var | Keyword::Let | Keyword::Const),
            ) => false,
            Some(_) => !self.expr_allowed,
        }
    }

    /// Update the context stack and `expr_allowed` for a token of `kind`.
    fn update_context(&mut self, kind: TokenKind, had_lt: bool) {
        let prev = self.last_significant_kind;
        match kind {
            TokenKind::Keyword(_) if prev == Some(TokenKind::Dot) => self.expr_allowed = false,
            TokenKind::RightParen | TokenKind::RightBrace => {
                // A `function` or `class` word that never reached its body.
                while self.context.len() > 1 && self.current_context().is_function() {
                    self.context.pop();
                }
                if self.context.len() <= 1 {
                    self.expr_allowed = true;
                    return;
                }
                if let Some(mut out) = self.context.pop() {
                    if out == LexContext::BraceStatement
                        && self.context.len() > 1
                        && self.current_context().is_function()
                    {
                        out = self.context.pop().unwrap_or(out);
                    }
                    self.expr_allowed = !out.is_expr();
                }
            }
            TokenKind::LeftBrace => {
                let ctx = if self.brace_is_block(prev, had_lt) {
                    LexContext::BraceStatement
                } else {
                    LexContext::BraceExpression
                };
                self.context.push(ctx);
                self.expr_allowed = true;
            }
            TokenKind::DollarBraceL => {
                self.context.push(LexContext::BraceTemplate);
                self.expr_allowed = true;
            }
            TokenKind::LeftParen => {
                let statement = matches!(
                    prev,
                    Some(TokenKind::Keyword(
                        Keyword::If | Keyword::For | Keyword::While | Keyword::With
                    ))
                );
                self.context.push(if statement {
                    LexContext::ParenStatement
                } else {
                    LexContext::ParenExpression
                });
                self.expr_allowed = true;
            }
            TokenKind::Keyword(Keyword::Function | Keyword::Class) => {
                let expression = prev.is_some_and(|p| {
                    before_expr(p)
                        && !matches!(
                            p,
                            TokenKind::Semicolon | TokenKind::Keyword(Keyword::Else)
                        )
                        && !(p == TokenKind::Keyword(Keyword::Return) && had_lt)
                        && !(matches!(p, TokenKind::Colon | TokenKind::LeftBrace)
                            && self.current_context() == LexContext::BraceStatement)
                });
                self.context.push(if expression {
                    LexContext::FunctionExpression
                } else {
                    LexContext::FunctionStatement
                });
                self.expr_allowed = false;
            }
            TokenKind::BackQuote => {
                if self.current_context() == LexContext::Template {
                    self.context.pop();
                } else {
                    self.context.push(LexContext::Template);
                }
                self.expr_allowed = false;
            }
            TokenKind::IncDec => {}
            _ => self.expr_allowed = before_expr(kind),
        }
    }

    /// Finish an operator token whose value is its own source text.
    fn finish_op(&mut self, kind: TokenKind, start: Position, had_lt: bool) -> Token {
        let text = self.source[start.offset..self.pos].to_string();
        self.finish(kind, TokenValue::Str(text), start, had_lt)
    }

    /// Consume one character and finish a value-less punctuation token.
    fn punct(&mut self, kind: TokenKind, start: Position, had_lt: bool) -> Token {
        self.advance();
        self.finish(kind, TokenValue::None, start, had_lt)
    }

    // ── Whitespace and comments ─────────────────────────────────────────────

    /// Consume whitespace and comments, buffering the comments.  Returns
    /// `true` if any line terminators were encountered.
    fn skip_space(&mut self) -> LexResult<bool> {
        let mut had_lt = false;
        loop {
            match self.peek() {
                Some(c) if is_js_whitespace(c) => {
                    if is_line_terminator(c) {
                        had_lt = true;
                    }
                    self.advance();
                }
                Some('/') if self.peek2() == Some('/') => {
                    let start = self.current_pos();
                    self.advance();
                    self.advance();
                    let text_start = self.pos;
                    while let Some(ch) = self.peek() {
                        if is_line_terminator(ch) {
                            break;
                        }
                        self.advance();
                    }
                    let text = self.source[text_start..self.pos].to_string();
                    self.comments.push(RawComment {
                        block: false,
                        text,
                        span: Span {
                            start,
                            end: self.current_pos(),
                        },
                    });
                }
                Some('/') if self.peek2() == Some('*') => {
                    let start = self.current_pos();
                    self.advance();
                    self.advance();
                    let text_start = self.pos;
                    loop {
                        match self.peek() {
                            None => {
                                return Err(LexError::new(start.offset, "Unterminated comment"));
                            }
                            Some('*') if self.peek2() == Some('/') => break,
                            Some(ch) => {
                                if is_line_terminator(ch) {
                                    had_lt = true;
                                }
                                self.advance();
                            }
                        }
                    }
                    let text = self.source[text_start..self.pos].to_string();
                    self.advance(); // *
                    self.advance(); // /
                    self.comments.push(RawComment {
                        block: true,
                        text,
                        span: Span {
                            start,
                            end: self.current_pos(),
                        },
                    });
                }
                _ => return Ok(had_lt),
            }
        }
    }

    // ── Main public API ─────────────────────────────────────────────────────

    /// Scan and return the next [`Token`] using the given [`LexMode`].
    ///
    /// Returns a token with [`TokenKind::Eof`] when the input is exhausted.
    /// Inside a template literal the mode is ignored: chunks and delimiters
    /// are always read first.
    pub fn next_token(&mut self, mode: LexMode) -> LexResult<Token> {
        match self.template {
            TemplateState::Chunk => return self.read_template_chunk(),
            TemplateState::ChunkEnd => return self.read_template_delimiter(),
            TemplateState::Code => {}
        }

        if mode == LexMode::JsxChild {
            return self.read_jsx_child();
        }

        let had_lt = self.skip_space()?;
        let start = self.current_pos();
        if self.is_eof() {
            return Ok(self.finish(TokenKind::Eof, TokenValue::None, start, had_lt));
        }

        if mode == LexMode::JsxTag
            && let Some(tok) = self.read_jsx_tag_token(start, had_lt)?
        {
            return Ok(tok);
        }

        self.read_token(start, had_lt)
    }

    fn read_token(&mut self, start: Position, had_lt: bool) -> LexResult<Token> {
        let Some(c) = self.peek() else {
            return Ok(self.finish(TokenKind::Eof, TokenValue::None, start, had_lt));
        };

        if is_id_start(c) || c == '\\' {
            return self.read_word(start, had_lt);
        }

        let tok = match c {
            '.' => {
                if matches!(self.peek2(), Some(d) if d.is_ascii_digit()) {
                    return self.read_number(start, had_lt);
                }
                if self.options.ecma6 && self.peek2() == Some('.') && self.peek3() == Some('.') {
                    self.advance();
                    self.advance();
                    self.punct(TokenKind::Ellipsis, start, had_lt)
                } else {
                    self.punct(TokenKind::Dot, start, had_lt)
                }
            }
            '(' => self.punct(TokenKind::LeftParen, start, had_lt),
            ')' => self.punct(TokenKind::RightParen, start, had_lt),
            ';' => self.punct(TokenKind::Semicolon, start, had_lt),
            ',' => self.punct(TokenKind::Comma, start, had_lt),
            '[' => self.punct(TokenKind::LeftBracket, start, had_lt),
            ']' => self.punct(TokenKind::RightBracket, start, had_lt),
            ':' => self.punct(TokenKind::Colon, start, had_lt),
            '?' => self.punct(TokenKind::Question, start, had_lt),
            '{' => self.punct(TokenKind::LeftBrace, start, had_lt),
            '}' => {
                if self.current_context() == LexContext::BraceTemplate {
                    self.template = TemplateState::Chunk;
                }
                self.punct(TokenKind::RightBrace, start, had_lt)
            }
            '`' => {
                if !self.options.ecma6 {
                    return Err(LexError::new(start.offset, "Unexpected character '`'"));
                }
                self.template = TemplateState::Chunk;
                self.punct(TokenKind::BackQuote, start, had_lt)
            }
            '0'..='9' => return self.read_number(start, had_lt),
            '"' | '\'' => return self.read_string(c, start, had_lt),
            '/' => {
                if self.expr_allowed {
                    return self.read_regexp(start, had_lt);
                }
                self.advance();
                if self.peek() == Some('=') {
                    self.advance();
                    self.finish_op(TokenKind::Assign, start, had_lt)
                } else {
                    self.finish_op(TokenKind::Slash, start, had_lt)
                }
            }
            '%' | '*' => {
                self.advance();
                let kind = if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::Assign
                } else if c == '%' {
                    TokenKind::Modulo
                } else {
                    TokenKind::Star
                };
                self.finish_op(kind, start, had_lt)
            }
            '|' | '&' => {
                self.advance();
                let kind = if self.peek() == Some(c) {
                    self.advance();
                    if c == '|' {
                        TokenKind::LogicalOr
                    } else {
                        TokenKind::LogicalAnd
                    }
                } else if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::Assign
                } else if c == '|' {
                    TokenKind::BitwiseOr
                } else {
                    TokenKind::BitwiseAnd
                };
                self.finish_op(kind, start, had_lt)
            }
            '^' => {
                self.advance();
                let kind = if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::Assign
                } else {
                    TokenKind::BitwiseXor
                };
                self.finish_op(kind, start, had_lt)
            }
            '+' | '-' => {
                self.advance();
                let kind = if self.peek() == Some(c) {
                    self.advance();
                    TokenKind::IncDec
                } else if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::Assign
                } else {
                    TokenKind::PlusMin
                };
                self.finish_op(kind, start, had_lt)
            }
            '<' if self.options.jsx && self.expr_allowed => {
                self.punct(TokenKind::JsxTagStart, start, had_lt)
            }
            '<' | '>' => {
                self.advance();
                let kind = if self.peek() == Some(c) {
                    self.advance();
                    if c == '>' && self.peek() == Some('>') {
                        self.advance();
                    }
                    if self.peek() == Some('=') {
                        self.advance();
                        TokenKind::Assign
                    } else {
                        TokenKind::BitShift
                    }
                } else {
                    if self.peek() == Some('=') {
                        self.advance();
                    }
                    TokenKind::Relational
                };
                self.finish_op(kind, start, had_lt)
            }
            '=' | '!' => {
                self.advance();
                let kind = if c == '=' && self.options.ecma6 && self.peek() == Some('>') {
                    self.advance();
                    TokenKind::Arrow
                } else if self.peek() == Some('=') {
                    self.advance();
                    if self.peek() == Some('=') {
                        self.advance();
                    }
                    TokenKind::Equality
                } else if c == '=' {
                    TokenKind::Eq
                } else {
                    TokenKind::Prefix
                };
                self.finish_op(kind, start, had_lt)
            }
            '~' => {
                self.advance();
                self.finish_op(TokenKind::Prefix, start, had_lt)
            }
            _ => {
                return Err(LexError::new(
                    start.offset,
                    format!("Unexpected character '{c}'"),
                ));
            }
        };
        Ok(tok)
    }

    // ── Digit-run helpers ───────────────────────────────────────────────────

    fn scan_decimal_digits(&mut self) -> usize {
        let mut count = 0;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.advance();
            count += 1;
        }
        count
    }

    /// Consume an optional exponent part (`e` / `E`, optional sign, digits).
    fn scan_exponent(&mut self) -> LexResult<()> {
        if matches!(self.peek(), Some('e') | Some('E')) {
            let at = self.pos;
            self.advance();
            if matches!(self.peek(), Some('+') | Some('-')) {
                self.advance();
            }
            if self.scan_decimal_digits() == 0 {
                return Err(LexError::new(at, "Invalid number"));
            }
        }
        Ok(())
    }

    // ── Numeric literal ─────────────────────────────────────────────────────

    fn read_number(&mut self, start: Position, had_lt: bool) -> LexResult<Token> {
        let source = self.source;
        let first = self.advance();
        let radix = match (first, self.peek()) {
            ('0', Some('x' | 'X')) => Some(16),
            ('0', Some('o' | 'O')) if self.options.ecma6 => Some(8),
            ('0', Some('b' | 'B')) if self.options.ecma6 => Some(2),
            _ => None,
        };

        let value = if let Some(radix) = radix {
            self.advance();
            self.read_radix_digits(radix, start)?
        } else if first == '0' && matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            // Legacy octal (`017`) unless an 8 or 9 turns it into a decimal.
            self.scan_decimal_digits();
            let digits = &source[start.offset..self.pos];
            if digits.bytes().all(|b| (b'0'..=b'7').contains(&b)) {
                fold_digits(digits, 8)
            } else {
                self.read_decimal_tail(start)?
            }
        } else if first == '.' {
            self.scan_decimal_digits();
            self.scan_exponent()?;
            parse_decimal(&source[start.offset..self.pos], start.offset)?
        } else {
            self.scan_decimal_digits();
            self.read_decimal_tail(start)?
        };

        if matches!(self.peek(), Some(c) if is_id_start(c)) {
            return Err(LexError::new(self.pos, "Identifier directly after number"));
        }
        Ok(self.finish(TokenKind::Num, TokenValue::Number(value), start, had_lt))
    }

    /// Scan the optional fraction and exponent of a decimal literal whose
    /// integer digits have been consumed, and parse the whole literal.
    fn read_decimal_tail(&mut self, start: Position) -> LexResult<f64> {
        if self.peek() == Some('.') {
            self.advance();
            self.scan_decimal_digits();
        }
        self.scan_exponent()?;
        parse_decimal(&self.source[start.offset..self.pos], start.offset)
    }

    fn read_radix_digits(&mut self, radix: u32, start: Position) -> LexResult<f64> {
        let digits_start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_digit(radix)) {
            self.advance();
        }
        if self.pos == digits_start {
            return Err(LexError::new(
                digits_start,
                format!("Expected number in radix {radix}"),
            ));
        }
        debug_assert!(digits_start > start.offset);
        Ok(fold_digits(&self.source[digits_start..self.pos], radix))
    }

    // ── Identifier / keyword ────────────────────────────────────────────────

    fn read_word(&mut self, start: Position, had_lt: bool) -> LexResult<Token> {
        let mut word = String::new();
        let mut escaped = false;
        loop {
            let first = word.is_empty();
            match self.peek() {
                Some('\\') => {
                    let esc = self.pos;
                    self.advance();
                    if self.peek() != Some('u') {
                        return Err(LexError::new(
                            esc,
                            "Expecting Unicode escape sequence \\uXXXX",
                        ));
                    }
                    self.advance();
                    let cp = self.read_code_point(esc)?;
                    let ch = char::from_u32(cp)
                        .filter(|&c| if first { is_id_start(c) } else { is_id_continue(c) })
                        .ok_or_else(|| LexError::new(esc, "Invalid Unicode escape"))?;
                    word.push(ch);
                    escaped = true;
                }
                Some(c) if (first && is_id_start(c)) || (!first && is_id_continue(c)) => {
                    self.advance();
                    word.push(c);
                }
                _ => break,
            }
        }
        // Escaped spellings never form keywords.
        let kind = if escaped {
            TokenKind::Name
        } else {
            Keyword::from_word(&word, self.options.ecma6)
                .map_or(TokenKind::Name, TokenKind::Keyword)
        };
        Ok(self.finish(kind, TokenValue::Str(word), start, had_lt))
    }

    // ── String literal ──────────────────────────────────────────────────────

    fn read_string(&mut self, quote: char, start: Position, had_lt: bool) -> LexResult<Token> {
        self.advance(); // opening quote
        let mut out = String::new();
        loop {
            match self.peek() {
                None => return Err(LexError::new(start.offset, "Unterminated string constant")),
                Some(c) if c == quote => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    self.read_escape_into(&mut out, false)?;
                }
                Some(c) if is_line_terminator(c) => {
                    return Err(LexError::new(start.offset, "Unterminated string constant"));
                }
                Some(c) => {
                    self.advance();
                    out.push(c);
                }
            }
        }
        Ok(self.finish(TokenKind::String, TokenValue::Str(out), start, had_lt))
    }

    // ── Escape sequences ────────────────────────────────────────────────────

    /// Cook one escape sequence starting *after* the leading `\` into `out`.
    fn read_escape_into(&mut self, out: &mut String, in_template: bool) -> LexResult<()> {
        let esc = self.pos.saturating_sub(1);
        let Some(c) = self.peek() else {
            return Err(LexError::new(esc, "Unterminated string constant"));
        };
        self.advance();
        match c {
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'b' => out.push('\u{8}'),
            'v' => out.push('\u{B}'),
            'f' => out.push('\u{C}'),
            'x' => {
                let cp = self.read_hex(2, esc)?;
                self.push_code_point(out, cp);
            }
            'u' => {
                let cp = self.read_code_point(esc)?;
                self.push_code_point(out, cp);
            }
            // Line continuation: contributes nothing.
            '\r' | '\n' | '\u{2028}' | '\u{2029}' => {}
            '0'..='7' => {
                let legacy = c != '0' || matches!(self.peek(), Some(d) if d.is_ascii_digit());
                if legacy && in_template {
                    return Err(LexError::new(esc, "Octal literal in template string"));
                }
                let mut value = c.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match self.peek().and_then(|d| d.to_digit(8)) {
                        Some(d) if value * 8 + d <= 0xFF => {
                            self.advance();
                            value = value * 8 + d;
                        }
                        _ => break,
                    }
                }
                self.push_code_point(out, value);
            }
            other => out.push(other),
        }
        Ok(())
    }

    /// Push a cooked code point, pairing a high surrogate with an immediately
    /// following `\uXXXX` low surrogate.  Unpaired surrogates become U+FFFD.
    fn push_code_point(&mut self, out: &mut String, cp: u32) {
        if (0xD800..=0xDBFF).contains(&cp) {
            let rest = &self.source[self.pos..];
            if let Some(hex) = rest.strip_prefix("\\u").and_then(|r| r.get(..4))
                && let Ok(low) = u32::from_str_radix(hex, 16)
                && (0xDC00..=0xDFFF).contains(&low)
            {
                for _ in 0..6 {
                    self.advance();
                }
                let combined = 0x10000 + ((cp - 0xD800) << 10) + (low - 0xDC00);
                out.push(char::from_u32(combined).unwrap_or('\u{FFFD}'));
                return;
            }
        }
        out.push(char::from_u32(cp).unwrap_or('\u{FFFD}'));
    }

    fn read_hex(&mut self, len: usize, esc: usize) -> LexResult<u32> {
        let mut value = 0;
        for _ in 0..len {
            match self.peek().and_then(|d| d.to_digit(16)) {
                Some(d) => {
                    self.advance();
                    value = value * 16 + d;
                }
                None => return Err(LexError::new(esc, "Bad character escape sequence")),
            }
        }
        Ok(value)
    }

    /// Read the body of a `\u` escape (after the `u`): four hex digits, or
    /// `{…}` in the ES2015 dialect.
    fn read_code_point(&mut self, esc: usize) -> LexResult<u32> {
        if self.peek() != Some('{') {
            return self.read_hex(4, esc);
        }
        if !self.options.ecma6 {
            return Err(LexError::new(esc, "Bad character escape sequence"));
        }
        self.advance(); // {
        let mut value: u32 = 0;
        let mut count = 0;
        while let Some(d) = self.peek().and_then(|d| d.to_digit(16)) {
            self.advance();
            value = value.saturating_mul(16).saturating_add(d);
            count += 1;
        }
        if count == 0 || self.peek() != Some('}') {
            return Err(LexError::new(esc, "Bad character escape sequence"));
        }
        self.advance(); // }
        if value > 0x10FFFF {
            return Err(LexError::new(esc, "Code point out of bounds"));
        }
        Ok(value)
    }

    // ── Template literal ────────────────────────────────────────────────────

    /// Read the chunk after an opening `` ` `` or a substitution-closing `}`.
    /// The chunk is emitted even when empty.
    fn read_template_chunk(&mut self) -> LexResult<Token> {
        let start = self.current_pos();
        let mut cooked = String::new();
        loop {
            match self.peek() {
                None => return Err(LexError::new(start.offset, "Unterminated template")),
                Some('`') => break,
                Some('$') if self.peek2() == Some('{') => break,
                Some('\\') => {
                    self.advance();
                    self.read_escape_into(&mut cooked, true)?;
                }
                Some('\r') => {
                    self.advance();
                    cooked.push('\n');
                }
                Some(c) => {
                    self.advance();
                    cooked.push(c);
                }
            }
        }
        self.template = TemplateState::ChunkEnd;
        Ok(self.finish(TokenKind::Template, TokenValue::Str(cooked), start, false))
    }

    fn read_template_delimiter(&mut self) -> LexResult<Token> {
        let start = self.current_pos();
        self.template = TemplateState::Code;
        if self.peek() == Some('`') {
            return Ok(self.punct(TokenKind::BackQuote, start, false));
        }
        self.advance(); // $
        self.advance(); // {
        Ok(self.finish(TokenKind::DollarBraceL, TokenValue::None, start, false))
    }

    // ── Regular-expression literal ──────────────────────────────────────────

    fn read_regexp(&mut self, start: Position, had_lt: bool) -> LexResult<Token> {
        let source = self.source;
        self.advance(); // opening /
        let body_start = self.pos;
        let mut in_class = false;
        let mut escaped = false;
        loop {
            let Some(c) = self.peek() else {
                return Err(LexError::new(start.offset, "Unterminated regular expression"));
            };
            if is_line_terminator(c) {
                return Err(LexError::new(start.offset, "Unterminated regular expression"));
            }
            self.advance();
            if escaped {
                escaped = false;
                continue;
            }
            match c {
                '\\' => escaped = true,
                '[' => in_class = true,
                ']' if in_class => in_class = false,
                '/' if !in_class => break,
                _ => {}
            }
        }
        let pattern = source[body_start..self.pos - 1].to_string();

        let flags_start = self.pos;
        while matches!(self.peek(), Some(c) if is_id_continue(c)) {
            self.advance();
        }
        let flags = &source[flags_start..self.pos];
        let allowed = if self.options.ecma6 { "gimuy" } else { "gim" };
        let duplicated = flags
            .char_indices()
            .any(|(i, f)| flags[i + f.len_utf8()..].contains(f));
        if duplicated || flags.chars().any(|f| !allowed.contains(f)) {
            return Err(LexError::new(start.offset, "Invalid regular expression flag"));
        }

        Ok(self.finish(
            TokenKind::Regexp,
            TokenValue::Regex {
                pattern,
                flags: flags.to_string(),
            },
            start,
            had_lt,
        ))
    }

    // ── JSX ─────────────────────────────────────────────────────────────────

    /// Tokens that read differently inside a JSX tag.  Anything else falls
    /// back to the ordinary tokenizer.
    fn read_jsx_tag_token(&mut self, start: Position, had_lt: bool) -> LexResult<Option<Token>> {
        let Some(c) = self.peek() else {
            return Ok(None);
        };
        let tok = match c {
            '>' => self.punct(TokenKind::JsxTagEnd, start, had_lt),
            '/' => {
                self.advance();
                self.finish_op(TokenKind::Slash, start, had_lt)
            }
            '"' | '\'' => self.read_jsx_string(c, start, had_lt)?,
            c if is_id_start(c) => {
                let mut name = String::new();
                while let Some(nc) = self.peek() {
                    if !(is_id_continue(nc) || nc == '-') {
                        break;
                    }
                    self.advance();
                    name.push(nc);
                }
                self.finish(TokenKind::JsxName, TokenValue::Str(name), start, had_lt)
            }
            _ => return Ok(None),
        };
        Ok(Some(tok))
    }

    fn read_jsx_string(&mut self, quote: char, start: Position, had_lt: bool) -> LexResult<Token> {
        self.advance(); // opening quote
        let mut out = String::new();
        loop {
            match self.peek() {
                None => return Err(LexError::new(start.offset, "Unterminated string constant")),
                Some(c) if c == quote => {
                    self.advance();
                    break;
                }
                Some('&') => {
                    self.advance();
                    out.push_str(&self.read_entity());
                }
                Some(_) => self.advance_into(&mut out),
            }
        }
        Ok(self.finish(TokenKind::String, TokenValue::Str(out), start, had_lt))
    }

    fn read_jsx_child(&mut self) -> LexResult<Token> {
        let start = self.current_pos();
        let mut text = String::new();
        loop {
            match self.peek() {
                None => return Err(LexError::new(start.offset, "Unterminated JSX contents")),
                Some(c @ ('<' | '{')) => {
                    if self.pos > start.offset {
                        return Ok(self.finish(
                            TokenKind::JsxText,
                            TokenValue::Str(text),
                            start,
                            false,
                        ));
                    }
                    if c == '<' {
                        return Ok(self.punct(TokenKind::JsxTagStart, start, false));
                    }
                    return Ok(self.punct(TokenKind::LeftBrace, start, false));
                }
                Some('&') => {
                    self.advance();
                    text.push_str(&self.read_entity());
                }
                Some(_) => self.advance_into(&mut text),
            }
        }
    }

    /// Decode a character reference after its `&`.  Unknown or unterminated
    /// references decode to a literal `&` and consume nothing further.
    fn read_entity(&mut self) -> String {
        let source = self.source;
        let rest = &source[self.pos..];
        let semi = rest
            .char_indices()
            .take(10)
            .find(|&(_, c)| c == ';')
            .map(|(i, _)| i);
        if let Some(semi) = semi {
            let name = &rest[..semi];
            let decoded = match name.strip_prefix('#') {
                Some(num) => {
                    let cp = match num.strip_prefix('x') {
                        Some(hex) => u32::from_str_radix(hex, 16).ok(),
                        None => num.parse().ok(),
                    };
                    cp.and_then(char::from_u32)
                }
                None => named_entity(name),
            };
            if let Some(ch) = decoded {
                for _ in rest[..=semi].chars() {
                    self.advance();
                }
                return ch.to_string();
            }
        }
        "&".to_string()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Numeric parsing helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Fold a run of digits in `radix` into an `f64` (no overflow for long hex
/// literals, unlike an integer parse).
fn fold_digits(digits: &str, radix: u32) -> f64 {
    digits
        .chars()
        .filter_map(|c| c.to_digit(radix))
        .fold(0.0, |acc, d| acc * f64::from(radix) + f64::from(d))
}

fn parse_decimal(raw: &str, at: usize) -> LexResult<f64> {
    raw.parse::<f64>()
        .map_err(|_| LexError::new(at, "Invalid number"))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
