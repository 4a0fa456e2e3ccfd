//! ESTree syntax-tree nodes.
//!
//! Nodes are dynamic: a [`Node`] carries its [`NodeType`] plus an ordered
//! list of kind-specific fields, which keeps the serialized shape identical
//! to the ESTree JSON schema (`{"type": …, <fields>, "range": …, "loc": …}`)
//! and lets hooks add fields such as `generator` or attached comments.
//!
//! The byte offsets [`Node::start`] / [`Node::end`] and the internal
//! [`NodeId`] are bookkeeping only and never serialized.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::normalize::Comment;
use crate::syntax::NodeType;

// ─────────────────────────────────────────────────────────────────────────────
// Source location
// ─────────────────────────────────────────────────────────────────────────────

/// A 1-based line and 0-based column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct LineCol {
    /// 1-based line number.
    pub line: u32,
    /// 0-based column number.
    pub column: u32,
}

/// The `loc` object of a node, token or comment.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SourceLocation {
    /// Location of the first character.
    pub start: LineCol,
    /// Location one past the last character.
    pub end: LineCol,
    /// Name of the source file, when the caller supplied one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Values
// ─────────────────────────────────────────────────────────────────────────────

/// Identifier of a node within one parse, assigned in completion order.
pub type NodeId = u32;

/// A field value of a [`Node`].
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// JSON `null` (absent optional child, array hole, …).
    #[default]
    Null,
    /// A boolean flag such as `computed` or `generator`.
    Bool(bool),
    /// A numeric literal value.
    Number(f64),
    /// A string: names, operators, literal values, `raw` text.
    Str(String),
    /// A child node.
    Node(Box<Node>),
    /// A list of values (usually nodes or nulls).
    List(Vec<Value>),
    /// A nested plain object, e.g. `regex` or a template element `value`.
    Object(Vec<(&'static str, Value)>),
    /// `leadingComments` / `trailingComments` attached to a node.
    Comments(Vec<Comment>),
}

impl Value {
    /// The child node, if this value holds one.
    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Value::Node(node) => Some(node),
            _ => None,
        }
    }

    /// The string payload, if this value holds one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The boolean payload, if this value holds one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<Node> for Value {
    fn from(node: Node) -> Self {
        Value::Node(Box::new(node))
    }
}

impl From<Option<Node>> for Value {
    fn from(node: Option<Node>) -> Self {
        node.map_or(Value::Null, Value::from)
    }
}

impl From<Vec<Node>> for Value {
    fn from(nodes: Vec<Node>) -> Self {
        Value::List(nodes.into_iter().map(Value::from).collect())
    }
}

impl From<Vec<Option<Node>>> for Value {
    fn from(nodes: Vec<Option<Node>>) -> Self {
        Value::List(nodes.into_iter().map(Value::from).collect())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Node
// ─────────────────────────────────────────────────────────────────────────────

/// One syntax-tree node.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// The node type.
    pub kind: NodeType,
    /// Byte offset of the first character.
    pub start: usize,
    /// Byte offset one past the last character.
    pub end: usize,
    /// Per-parse identity, used to key side tables.
    pub id: NodeId,
    /// `[start, end]`, when ranges are enabled.
    pub range: Option<[usize; 2]>,
    /// Line/column location, when locations are enabled.
    pub loc: Option<SourceLocation>,
    /// Kind-specific fields in serialization order.
    pub fields: Vec<(&'static str, Value)>,
}

impl Node {
    /// Look up a field by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| *k == name).map(|(_, v)| v)
    }

    /// Look up a field by name for modification.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.fields
            .iter_mut()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v)
    }

    /// `true` when the node has a field called `name`.
    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Set a field, replacing an existing value in place or appending.
    pub fn set(&mut self, name: &'static str, value: impl Into<Value>) {
        let value = value.into();
        match self.get_mut(name) {
            Some(slot) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Remove a field and return its value.
    pub fn take(&mut self, name: &str) -> Option<Value> {
        let idx = self.fields.iter().position(|(k, _)| *k == name)?;
        Some(self.fields.remove(idx).1)
    }

    /// Move the child node out of field `name`, leaving `null` in its slot.
    pub fn take_child(&mut self, name: &str) -> Option<Node> {
        match self.get_mut(name).map(std::mem::take) {
            Some(Value::Node(node)) => Some(*node),
            _ => None,
        }
    }

    /// The boolean field `name`, defaulting to `false`.
    pub fn flag(&self, name: &str) -> bool {
        self.get(name).and_then(Value::as_bool).unwrap_or(false)
    }

    /// The string field `name`.
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// The child node in field `name`.
    pub fn child(&self, name: &str) -> Option<&Node> {
        self.get(name).and_then(Value::as_node)
    }

    /// Visit every direct child node, including nodes inside lists.
    pub fn children_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.fields
            .iter_mut()
            .flat_map(|(_, v)| match v {
                Value::Node(n) => vec![n.as_mut()],
                Value::List(items) => items
                    .iter_mut()
                    .filter_map(|item| match item {
                        Value::Node(n) => Some(n.as_mut()),
                        _ => None,
                    })
                    .collect(),
                _ => Vec::new(),
            })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Serialization
// ─────────────────────────────────────────────────────────────────────────────

/// Serialize a number the way `JSON.stringify` does: integral values without
/// a fraction, non-finite values as `null`.
pub(crate) fn serialize_number<S: Serializer>(n: f64, serializer: S) -> Result<S::Ok, S::Error> {
    const MAX_SAFE: f64 = 9_007_199_254_740_991.0;
    if !n.is_finite() {
        serializer.serialize_none()
    } else if n.fract() == 0.0 && n.abs() <= MAX_SAFE {
        serializer.serialize_i64(n as i64)
    } else {
        serializer.serialize_f64(n)
    }
}

struct Fields<'a>(&'a [(&'static str, Value)]);

impl Serialize for Fields<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => serialize_number(*n, serializer),
            Value::Str(s) => serializer.serialize_str(s),
            Value::Node(node) => node.serialize(serializer),
            Value::List(items) => serializer.collect_seq(items),
            Value::Object(fields) => Fields(fields).serialize(serializer),
            Value::Comments(comments) => serializer.collect_seq(comments),
        }
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", self.kind.as_str())?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        if let Some(range) = &self.range {
            map.serialize_entry("range", range)?;
        }
        if let Some(loc) = &self.loc {
            map.serialize_entry("loc", loc)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ident(name: &str, id: NodeId) -> Node {
        Node {
            kind: NodeType::Identifier,
            start: 0,
            end: name.len(),
            id,
            range: None,
            loc: None,
            fields: vec![("name", name.into())],
        }
    }

    #[test]
    fn test_serialize_hides_offsets() {
        let mut node = ident("x", 7);
        node.range = Some([0, 1]);
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json, json!({"type": "Identifier", "name": "x", "range": [0, 1]}));
    }

    #[test]
    fn test_numbers_serialize_like_json_stringify() {
        let values = Value::List(vec![
            Value::Number(5.0),
            Value::Number(0.5),
            Value::Number(f64::INFINITY),
        ]);
        assert_eq!(serde_json::to_value(&values).unwrap(), json!([5, 0.5, null]));
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut node = ident("x", 0);
        node.set("generator", false);
        node.set("name", "y");
        assert_eq!(node.fields[0], ("name", Value::Str("y".into())));
        assert!(!node.flag("generator"));
        assert!(node.has("generator"));
        assert_eq!(node.take("generator"), Some(Value::Bool(false)));
        assert!(!node.has("generator"));
    }

    #[test]
    fn test_children_mut_walks_lists() {
        let mut parent = Node {
            kind: NodeType::ArrayExpression,
            start: 0,
            end: 6,
            id: 3,
            range: None,
            loc: None,
            fields: vec![(
                "elements",
                vec![Some(ident("a", 1)), None, Some(ident("b", 2))].into(),
            )],
        };
        let ids: Vec<_> = parent.children_mut().map(|n| n.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_loc_source_is_optional() {
        let loc = SourceLocation {
            start: LineCol { line: 1, column: 0 },
            end: LineCol { line: 1, column: 3 },
            source: None,
        };
        assert_eq!(
            serde_json::to_value(&loc).unwrap(),
            json!({"start": {"line": 1, "column": 0}, "end": {"line": 1, "column": 3}})
        );
    }
}
