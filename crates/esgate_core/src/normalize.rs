//! Output normalization of tokens and comments.
//!
//! Engine tokens are reshaped into the Esprima token schema
//! `{type, value, range?, loc?}` and comments into
//! `{type: "Block" | "Line", value, range?, loc?}`.  Fields whose source
//! data was not requested are omitted rather than set to `null`.

use serde::Serialize;

use crate::parser::ast::{LineCol, SourceLocation};
use crate::parser::scanner::{Position, RawComment, Span, Token, TokenKind, TokenValue};

/// Which position data to attach to normalized output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputPositions<'a> {
    /// Attach `range: [start, end]`.
    pub range: bool,
    /// Attach `loc: {start, end}`.
    pub loc: bool,
    /// File name recorded as `loc.source`.
    pub source: Option<&'a str>,
}

impl OutputPositions<'_> {
    fn range_of(&self, span: &Span) -> Option<[usize; 2]> {
        self.range.then_some([span.start.offset, span.end.offset])
    }

    fn loc_of(&self, span: &Span) -> Option<SourceLocation> {
        self.loc.then(|| SourceLocation {
            start: line_col(span.start),
            end: line_col(span.end),
            source: self.source.map(str::to_string),
        })
    }
}

fn line_col(pos: Position) -> LineCol {
    LineCol {
        line: pos.line,
        column: pos.column,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tokens
// ─────────────────────────────────────────────────────────────────────────────

/// `{pattern, flags}` of a regular-expression token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegexInfo {
    /// Body between the slashes.
    pub pattern: String,
    /// Flag letters.
    pub flags: String,
}

/// A token in the public schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputToken {
    /// Schema type: `Identifier`, `Punctuator`, `Keyword`, `Numeric`, …
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// Normalized textual value.
    pub value: String,
    /// Pattern and flags, for `RegularExpression` tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regex: Option<RegexInfo>,
    /// `[start, end]` byte offsets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<[usize; 2]>,
    /// Line/column location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loc: Option<SourceLocation>,
}

/// Categories that are always reported as `Punctuator`.
fn is_fixed_punctuator(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Semicolon
            | TokenKind::Comma
            | TokenKind::LeftParen
            | TokenKind::RightParen
            | TokenKind::LeftBrace
            | TokenKind::RightBrace
            | TokenKind::Slash
            | TokenKind::Dot
            | TokenKind::LeftBracket
            | TokenKind::RightBracket
            | TokenKind::Ellipsis
            | TokenKind::Arrow
            | TokenKind::Star
    ) || kind.is_assign()
}

/// Reshape an engine token into the public token schema.
///
/// `source` is the text the token was read from.
pub fn normalize_token(token: &Token, source: &str, positions: &OutputPositions<'_>) -> OutputToken {
    let text = source.get(token.start()..token.end()).unwrap_or_default();
    let value = match &token.value {
        TokenValue::Str(s) => Some(s.as_str()),
        _ => None,
    };
    let mut regex = None;

    let (kind, value) = match token.kind {
        TokenKind::Name => ("Identifier", value.unwrap_or(text).to_string()),
        TokenKind::JsxTagStart => ("Punctuator", "<".to_string()),
        TokenKind::JsxTagEnd => ("Punctuator", ">".to_string()),
        kind if is_fixed_punctuator(kind) => {
            ("Punctuator", value.unwrap_or(kind.label()).to_string())
        }
        TokenKind::JsxName => ("JSXIdentifier", value.unwrap_or(text).to_string()),
        kind if kind.is_keyword() => ("Keyword", value.unwrap_or(kind.label()).to_string()),
        TokenKind::Num => {
            let n = match token.value {
                TokenValue::Number(n) => n,
                _ => f64::NAN,
            };
            ("Numeric", js_number_to_string(n))
        }
        TokenKind::String => ("String", json_quote(value.unwrap_or_default())),
        TokenKind::Template => ("Template", value.unwrap_or_default().to_string()),
        TokenKind::JsxText => ("JSXText", text.to_string()),
        TokenKind::Regexp => {
            if let TokenValue::Regex { pattern, flags } = &token.value {
                regex = Some(RegexInfo {
                    pattern: pattern.clone(),
                    flags: flags.clone(),
                });
            }
            ("RegularExpression", text.to_string())
        }
        kind => ("Punctuator", value.unwrap_or(kind.label()).to_string()),
    };

    OutputToken {
        kind,
        value,
        regex,
        range: positions.range_of(&token.span),
        loc: positions.loc_of(&token.span),
    }
}

/// Render `s` as a double-quoted JSON string literal.
pub fn json_quote(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

/// Format a number the way ECMAScript `Number.prototype.toString()` does.
pub fn js_number_to_string(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    if n < 0.0 {
        return format!("-{}", js_number_to_string(-n));
    }

    // `{:e}` yields the shortest round-trip digits as `d.ddde±x`.
    let sci = format!("{n:e}");
    let (mantissa, exp) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let exp: i32 = exp.parse().unwrap_or(0);
    let k = digits.len() as i32;
    let point = exp + 1;

    if k <= point && point <= 21 {
        format!("{digits}{}", "0".repeat((point - k) as usize))
    } else if 0 < point && point <= 21 {
        let (int, frac) = digits.split_at(point as usize);
        format!("{int}.{frac}")
    } else if -6 < point && point <= 0 {
        format!("0.{}{digits}", "0".repeat((-point) as usize))
    } else {
        let sign = if point - 1 < 0 { '-' } else { '+' };
        let (first, rest) = digits.split_at(1);
        let exp = (point - 1).abs();
        if rest.is_empty() {
            format!("{first}e{sign}{exp}")
        } else {
            format!("{first}.{rest}e{sign}{exp}")
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Comments
// ─────────────────────────────────────────────────────────────────────────────

/// A comment in the public schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comment {
    /// `"Block"` or `"Line"`.
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// Comment text without delimiters.
    pub value: String,
    /// `[start, end]` byte offsets, when supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<[usize; 2]>,
    /// Line/column location, when supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loc: Option<SourceLocation>,
}

impl Comment {
    /// Start offset, when a range was recorded.
    pub fn start(&self) -> Option<usize> {
        self.range.map(|[start, _]| start)
    }

    /// End offset, when a range was recorded.
    pub fn end(&self) -> Option<usize> {
        self.range.map(|[_, end]| end)
    }
}

/// Build a comment from its parts, omitting absent position data.
pub fn normalize_comment(
    block: bool,
    text: &str,
    range: Option<[usize; 2]>,
    loc: Option<SourceLocation>,
) -> Comment {
    Comment {
        kind: if block { "Block" } else { "Line" },
        value: text.to_string(),
        range,
        loc,
    }
}

/// Normalize a comment skipped by the scanner.
pub fn normalize_raw_comment(comment: &RawComment, positions: &OutputPositions<'_>) -> Comment {
    normalize_comment(
        comment.block,
        &comment.text,
        positions.range_of(&comment.span),
        positions.loc_of(&comment.span),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::scanner::{LexMode, Scanner, ScannerOptions};
    use serde_json::json;

    fn tokens(source: &str, positions: &OutputPositions<'_>) -> Vec<OutputToken> {
        let opts = ScannerOptions {
            ecma6: true,
            jsx: false,
        };
        let mut scanner = Scanner::new(source, opts);
        let mut out = Vec::new();
        loop {
            let tok = scanner.next_token(LexMode::Normal).unwrap();
            if tok.kind == TokenKind::Eof {
                return out;
            }
            out.push(normalize_token(&tok, source, positions));
        }
    }

    fn pairs(source: &str) -> Vec<(&'static str, String)> {
        tokens(source, &OutputPositions::default())
            .into_iter()
            .map(|t| (t.kind, t.value))
            .collect()
    }

    #[test]
    fn test_classification() {
        assert_eq!(
            pairs("var x = a => b;"),
            vec![
                ("Keyword", "var".to_string()),
                ("Identifier", "x".to_string()),
                ("Punctuator", "=".to_string()),
                ("Identifier", "a".to_string()),
                ("Punctuator", "=>".to_string()),
                ("Identifier", "b".to_string()),
                ("Punctuator", ";".to_string()),
            ]
        );
        assert_eq!(pairs("a += 1")[1], ("Punctuator", "+=".to_string()));
        assert_eq!(pairs("a ? b : c")[1], ("Punctuator", "?".to_string()));
        assert_eq!(pairs("true")[0], ("Keyword", "true".to_string()));
    }

    #[test]
    fn test_numeric_values_are_decimal() {
        assert_eq!(pairs("0b101")[0], ("Numeric", "5".to_string()));
        assert_eq!(pairs("0x1F")[0], ("Numeric", "31".to_string()));
        assert_eq!(pairs("1.50")[0], ("Numeric", "1.5".to_string()));
        assert_eq!(pairs("1e21")[0], ("Numeric", "1e+21".to_string()));
    }

    #[test]
    fn test_string_values_are_json() {
        assert_eq!(pairs(r"'a\tb'")[0], ("String", r#""a\tb""#.to_string()));
        assert_eq!(pairs(r#"'say "hi"'"#)[0], ("String", r#""say \"hi\"""#.to_string()));
    }

    #[test]
    fn test_regex_and_template() {
        let toks = tokens("/ab+/gi", &OutputPositions::default());
        assert_eq!(toks[0].kind, "RegularExpression");
        assert_eq!(toks[0].value, "/ab+/gi");
        assert_eq!(
            toks[0].regex,
            Some(RegexInfo {
                pattern: "ab+".into(),
                flags: "gi".into()
            })
        );
        let kinds: Vec<_> = pairs("`a${b}`").into_iter().map(|(k, _)| k).collect();
        assert_eq!(
            kinds,
            vec!["Punctuator", "Template", "Punctuator", "Identifier", "Punctuator", "Template", "Punctuator"]
        );
    }

    #[test]
    fn test_positions_only_when_requested() {
        let bare = serde_json::to_value(&tokens("x", &OutputPositions::default())[0]).unwrap();
        assert_eq!(bare, json!({"type": "Identifier", "value": "x"}));
        let positions = OutputPositions {
            range: true,
            loc: true,
            source: Some("in.js"),
        };
        let full = serde_json::to_value(&tokens(" x", &positions)[0]).unwrap();
        assert_eq!(
            full,
            json!({
                "type": "Identifier",
                "value": "x",
                "range": [1, 2],
                "loc": {"start": {"line": 1, "column": 1}, "end": {"line": 1, "column": 2}, "source": "in.js"}
            })
        );
    }

    #[test]
    fn test_comment_fields_omitted_when_absent() {
        let c = normalize_comment(true, " hi ", None, None);
        assert_eq!(serde_json::to_value(&c).unwrap(), json!({"type": "Block", "value": " hi "}));
        let c = normalize_comment(false, "x", Some([0, 3]), None);
        assert_eq!(
            serde_json::to_value(&c).unwrap(),
            json!({"type": "Line", "value": "x", "range": [0, 3]})
        );
        assert_eq!((c.start(), c.end()), (Some(0), Some(3)));
    }

    #[test]
    fn test_js_number_to_string() {
        let cases = [
            (0.0, "0"),
            (5.0, "5"),
            (0.1, "0.1"),
            (123.456, "123.456"),
            (1e21, "1e+21"),
            (1.5e-7, "1.5e-7"),
            (0.000001, "0.000001"),
            (1e20, "100000000000000000000"),
            (-2.5, "-2.5"),
            (f64::INFINITY, "Infinity"),
        ];
        for (n, expected) in cases {
            assert_eq!(js_number_to_string(n), expected, "formatting {n}");
        }
        assert_eq!(js_number_to_string(f64::NAN), "NaN");
    }
}
