//! JSX grammar extension.
//!
//! JSX switches the scanner between three lexing modes.  The parser always
//! knows which mode the *next* token must be read in, so every advance inside
//! an element names its mode explicitly:
//!
//! - tag names and attributes are read in [`LexMode::JsxTag`],
//! - text between children in [`LexMode::JsxChild`],
//! - embedded `{…}` expressions in [`LexMode::Normal`].

use super::ast::{Node, Value};
use super::hooks::ParseHooks;
use super::parser::{Marker, PResult, Parser};
use super::scanner::{LexMode, TokenKind};
use crate::syntax::NodeType;

impl<H: ParseHooks> Parser<'_, '_, H> {
    /// Parse a JSX element starting at the current `<`.  `after` is the mode
    /// the token following the element's final `>` is read in.
    pub(super) fn parse_jsx_element(&mut self, after: LexMode) -> PResult<Node> {
        let m = self.start_node();
        self.next_in(LexMode::JsxTag)?;
        self.parse_jsx_element_at(m, after)
    }

    /// Parse an element whose `<` has already been consumed.
    fn parse_jsx_element_at(&mut self, m: Marker, after: LexMode) -> PResult<Node> {
        let opening = self.parse_jsx_opening_element(m, after)?;
        let mut children = Vec::new();
        let mut closing = None;

        if !opening.flag("selfClosing") {
            loop {
                match self.tok.kind {
                    TokenKind::JsxTagStart => {
                        let child_m = self.start_node();
                        self.next_in(LexMode::JsxTag)?;
                        if self.eat_in(TokenKind::Slash, LexMode::JsxTag)? {
                            closing = Some(self.parse_jsx_closing_element(child_m, after)?);
                            break;
                        }
                        children.push(self.parse_jsx_element_at(child_m, LexMode::JsxChild)?);
                    }
                    TokenKind::JsxText => children.push(self.parse_jsx_text()?),
                    TokenKind::LeftBrace => {
                        children.push(self.parse_jsx_expression_container(LexMode::JsxChild)?);
                    }
                    _ => return Err(self.unexpected()),
                }
            }

            if let (Some(name), Some(closing)) = (opening.child("name"), closing.as_ref()) {
                let expected = qualified_name(name);
                let found = closing.child("name").map(qualified_name);
                if found.as_deref() != Some(expected.as_str()) {
                    return Err(self.raise(
                        closing.start,
                        format!("Expected corresponding JSX closing tag for <{expected}>"),
                    ));
                }
            }
        }

        let element = self.finish(
            m,
            NodeType::JSXElement,
            vec![
                ("openingElement", opening.into()),
                ("closingElement", closing.into()),
                ("children", children.into()),
            ],
        )?;
        if self.is(TokenKind::Relational) && self.tok_text() == "<" {
            return Err(self.raise(
                self.tok.start(),
                "Adjacent JSX elements must be wrapped in an enclosing tag",
            ));
        }
        Ok(element)
    }

    fn parse_jsx_opening_element(&mut self, m: Marker, after: LexMode) -> PResult<Node> {
        let name = self.parse_jsx_element_name()?;
        let mut attributes = Vec::new();
        while !self.is(TokenKind::Slash) && !self.is(TokenKind::JsxTagEnd) {
            attributes.push(self.parse_jsx_attribute()?);
        }
        let self_closing = self.eat_in(TokenKind::Slash, LexMode::JsxTag)?;
        let next_mode = if self_closing { after } else { LexMode::JsxChild };
        self.expect_in(TokenKind::JsxTagEnd, next_mode)?;
        self.finish(
            m,
            NodeType::JSXOpeningElement,
            vec![
                ("attributes", attributes.into()),
                ("name", name.into()),
                ("selfClosing", self_closing.into()),
            ],
        )
    }

    fn parse_jsx_closing_element(&mut self, m: Marker, after: LexMode) -> PResult<Node> {
        let name = self.parse_jsx_element_name()?;
        self.expect_in(TokenKind::JsxTagEnd, after)?;
        self.finish(m, NodeType::JSXClosingElement, vec![("name", name.into())])
    }

    // ── Names ───────────────────────────────────────────────────────────────

    fn parse_jsx_identifier(&mut self) -> PResult<Node> {
        let m = self.start_node();
        let name = match self.tok.kind {
            TokenKind::JsxName => self.tok_str(),
            kind if kind.is_keyword() => kind.label().to_string(),
            _ => return Err(self.unexpected()),
        };
        self.next_in(LexMode::JsxTag)?;
        self.finish(m, NodeType::JSXIdentifier, vec![("name", name.into())])
    }

    /// `name` or `namespace:name`.
    fn parse_jsx_namespaced_name(&mut self) -> PResult<Node> {
        let m = self.start_node();
        let name = self.parse_jsx_identifier()?;
        if !self.eat_in(TokenKind::Colon, LexMode::JsxTag)? {
            return Ok(name);
        }
        let local = self.parse_jsx_identifier()?;
        self.finish(
            m,
            NodeType::JSXNamespacedName,
            vec![("namespace", name.into()), ("name", local.into())],
        )
    }

    /// A tag name, possibly a member chain such as `a.b.c`.
    fn parse_jsx_element_name(&mut self) -> PResult<Node> {
        let m = self.start_node();
        let mut node = self.parse_jsx_namespaced_name()?;
        while self.eat_in(TokenKind::Dot, LexMode::JsxTag)? {
            let property = self.parse_jsx_identifier()?;
            node = self.finish(
                m,
                NodeType::JSXMemberExpression,
                vec![("object", node.into()), ("property", property.into())],
            )?;
        }
        Ok(node)
    }

    // ── Attributes ──────────────────────────────────────────────────────────

    fn parse_jsx_attribute(&mut self) -> PResult<Node> {
        let m = self.start_node();
        if self.is(TokenKind::LeftBrace) {
            self.next()?;
            self.expect(TokenKind::Ellipsis)?;
            let argument = self.parse_maybe_assign(false, None)?;
            self.expect_in(TokenKind::RightBrace, LexMode::JsxTag)?;
            return self.finish(
                m,
                NodeType::JSXSpreadAttribute,
                vec![("argument", argument.into())],
            );
        }
        let name = self.parse_jsx_namespaced_name()?;
        let value = if self.eat_in(TokenKind::Eq, LexMode::JsxTag)? {
            Some(self.parse_jsx_attribute_value()?)
        } else {
            None
        };
        self.finish(
            m,
            NodeType::JSXAttribute,
            vec![("name", name.into()), ("value", value.into())],
        )
    }

    fn parse_jsx_attribute_value(&mut self) -> PResult<Node> {
        match self.tok.kind {
            TokenKind::LeftBrace => {
                let container = self.parse_jsx_expression_container(LexMode::JsxTag)?;
                let empty = container
                    .child("expression")
                    .is_some_and(|e| e.kind == NodeType::JSXEmptyExpression);
                if empty {
                    return Err(self.raise(
                        container.start,
                        "JSX attributes must only be assigned a non-empty expression",
                    ));
                }
                Ok(container)
            }
            TokenKind::JsxTagStart => self.parse_jsx_element(LexMode::JsxTag),
            TokenKind::String => self.parse_jsx_string(LexMode::JsxTag),
            _ => Err(self.raise(
                self.tok.start(),
                "JSX value should be either an expression or a quoted JSX text",
            )),
        }
    }

    // ── Children ────────────────────────────────────────────────────────────

    /// `{expr}` or `{}`; the token after `}` is read in `after`.
    fn parse_jsx_expression_container(&mut self, after: LexMode) -> PResult<Node> {
        let m = self.start_node();
        self.next()?;
        let expression = if self.is(TokenKind::RightBrace) {
            let empty_m = Marker {
                pos: self.last_tok_end,
            };
            let end = self.tok.span.start;
            self.finish_at(empty_m, end, NodeType::JSXEmptyExpression, vec![])?
        } else {
            self.parse_expression(false, None)?
        };
        self.expect_in(TokenKind::RightBrace, after)?;
        self.finish(
            m,
            NodeType::JSXExpressionContainer,
            vec![("expression", expression.into())],
        )
    }

    fn parse_jsx_text(&mut self) -> PResult<Node> {
        self.parse_jsx_string(LexMode::JsxChild)
    }

    /// A text child or quoted attribute value as a `Literal`.
    fn parse_jsx_string(&mut self, next_mode: LexMode) -> PResult<Node> {
        let m = self.start_node();
        let value = self.tok_str();
        let raw = self.tok_text();
        self.next_in(next_mode)?;
        self.finish(
            m,
            NodeType::Literal,
            vec![("value", value.into()), ("raw", Value::from(raw))],
        )
    }
}

/// The source-like spelling of a tag name (`a`, `ns:a`, `a.b.c`).
fn qualified_name(name: &Node) -> String {
    match name.kind {
        NodeType::JSXIdentifier => name.str_field("name").unwrap_or_default().to_string(),
        NodeType::JSXNamespacedName => format!(
            "{}:{}",
            name.child("namespace").map(qualified_name).unwrap_or_default(),
            name.child("name").map(qualified_name).unwrap_or_default()
        ),
        NodeType::JSXMemberExpression => format!(
            "{}.{}",
            name.child("object").map(qualified_name).unwrap_or_default(),
            name.child("property").map(qualified_name).unwrap_or_default()
        ),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::super::parser::{EcmaVersion, EngineOptions, parse_program};
    use super::*;
    use crate::parser::hooks::NoHooks;

    fn jsx_options() -> EngineOptions {
        EngineOptions {
            ecma_version: EcmaVersion::Es2015,
            jsx: true,
            ..EngineOptions::default()
        }
    }

    fn parse_expr(src: &str) -> Node {
        let program = parse_program(src, &jsx_options(), &mut NoHooks).unwrap();
        let Some(Value::List(body)) = program.get("body") else {
            panic!("no body");
        };
        body[0].as_node().unwrap().child("expression").unwrap().clone()
    }

    fn children(element: &Node) -> Vec<Node> {
        match element.get("children") {
            Some(Value::List(items)) => items.iter().filter_map(|v| v.as_node().cloned()).collect(),
            _ => Vec::new(),
        }
    }

    #[test]
    fn test_self_closing_element() {
        let el = parse_expr("<div />;");
        assert_eq!(el.kind, NodeType::JSXElement);
        let opening = el.child("openingElement").unwrap();
        assert!(opening.flag("selfClosing"));
        assert!(el.get("closingElement").unwrap().is_null());
        assert_eq!((el.start, el.end), (0, 7));
    }

    #[test]
    fn test_children_and_attributes() {
        let el = parse_expr("<a href=\"x\" {...rest} b={1}>hi {name}<br/></a>");
        let opening = el.child("openingElement").unwrap();
        let Some(Value::List(attrs)) = opening.get("attributes") else {
            panic!("no attributes");
        };
        let kinds: Vec<_> = attrs.iter().map(|a| a.as_node().unwrap().kind).collect();
        assert_eq!(
            kinds,
            vec![NodeType::JSXAttribute, NodeType::JSXSpreadAttribute, NodeType::JSXAttribute]
        );
        let kids = children(&el);
        assert_eq!(kids.len(), 3);
        assert_eq!(kids[0].kind, NodeType::Literal);
        assert_eq!(kids[0].str_field("value"), Some("hi "));
        assert_eq!(kids[1].kind, NodeType::JSXExpressionContainer);
        assert_eq!(kids[2].kind, NodeType::JSXElement);
    }

    #[test]
    fn test_member_and_namespaced_names() {
        let el = parse_expr("<a.b.c></a.b.c>");
        let name = el.child("openingElement").unwrap().child("name").unwrap();
        assert_eq!(name.kind, NodeType::JSXMemberExpression);
        assert_eq!(qualified_name(name), "a.b.c");
        let el = parse_expr("<svg:rect />");
        let name = el.child("openingElement").unwrap().child("name").unwrap();
        assert_eq!(qualified_name(name), "svg:rect");
    }

    #[test]
    fn test_empty_expression_child() {
        let el = parse_expr("<a>{/* note */}</a>");
        let kids = children(&el);
        let empty = kids[0].child("expression").unwrap();
        assert_eq!(empty.kind, NodeType::JSXEmptyExpression);
        assert_eq!((empty.start, empty.end), (4, 14));
    }

    #[test]
    fn test_mismatched_closing_tag() {
        let err = parse_program("<a></b>", &jsx_options(), &mut NoHooks).unwrap_err();
        assert_eq!(err.message, "Expected corresponding JSX closing tag for <a>");
    }

    #[test]
    fn test_adjacent_elements() {
        let err = parse_program("<a/><b/>", &jsx_options(), &mut NoHooks).unwrap_err();
        assert_eq!(err.message, "Adjacent JSX elements must be wrapped in an enclosing tag");
    }

    #[test]
    fn test_empty_attribute_expression() {
        let err = parse_program("<a b={} />", &jsx_options(), &mut NoHooks).unwrap_err();
        assert_eq!(err.message, "JSX attributes must only be assigned a non-empty expression");
    }

    #[test]
    fn test_element_as_attribute_value() {
        let el = parse_expr("<a b=<c/> />");
        let opening = el.child("openingElement").unwrap();
        let Some(Value::List(attrs)) = opening.get("attributes") else {
            panic!("no attributes");
        };
        let value = attrs[0].as_node().unwrap().child("value").unwrap();
        assert_eq!(value.kind, NodeType::JSXElement);
    }
}
