//! Comment attachment.
//!
//! Comments are attached to the nearest preceding or following node in the
//! Esprima manner: every comment is fed in through
//! [`CommentAttachment::add_comment`] as the scanner skips it, and every
//! completed node through [`CommentAttachment::process_comment`].  Nodes are
//! owned by the tree being built, so decisions are recorded in a side table
//! keyed by [`NodeId`] and written into the finished tree by
//! [`CommentAttachment::attach`].

use std::collections::HashMap;

use crate::normalize::Comment;
use crate::parser::ast::{Node, NodeId, Value};
use crate::syntax::NodeType;

#[derive(Debug, Clone, Copy)]
struct StackEntry {
    id: NodeId,
    start: usize,
}

#[derive(Debug, Default)]
struct Attached {
    leading: Option<Vec<Comment>>,
    trailing: Option<Vec<Comment>>,
}

/// Per-parse comment attachment state.
#[derive(Debug, Default)]
pub struct CommentAttachment {
    leading: Vec<Comment>,
    trailing: Vec<Comment>,
    bottom_right: Vec<StackEntry>,
    attached: HashMap<NodeId, Attached>,
}

fn comment_start(c: &Comment) -> usize {
    c.start().unwrap_or_default()
}

fn comment_end(c: &Comment) -> usize {
    c.end().unwrap_or_default()
}

impl CommentAttachment {
    /// Fresh state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every pending comment and decision.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Record a comment skipped by the scanner.
    pub fn add_comment(&mut self, comment: &Comment) {
        self.trailing.push(comment.clone());
        self.leading.push(comment.clone());
    }

    /// Decide which pending comments belong to the just-completed `node`.
    pub fn process_comment(&mut self, node: &Node) {
        if node.kind == NodeType::Program
            && matches!(node.get("body"), Some(Value::List(body)) if !body.is_empty())
        {
            return;
        }

        let mut trailing = None;
        if let Some(first) = self.trailing.first() {
            if comment_start(first) >= node.end {
                trailing = Some(std::mem::take(&mut self.trailing));
            } else {
                self.trailing.clear();
            }
        } else if let Some(top) = self.bottom_right.last()
            && let Some(entry) = self.attached.get_mut(&top.id)
            && entry
                .trailing
                .as_ref()
                .and_then(|c| c.first())
                .is_some_and(|c| comment_start(c) >= node.end)
        {
            trailing = entry.trailing.take();
        }

        let mut last_child = None;
        while let Some(top) = self.bottom_right.last()
            && top.start >= node.start
        {
            last_child = self.bottom_right.pop();
        }

        let mut leading = None;
        if let Some(child) = last_child {
            if let Some(entry) = self.attached.get_mut(&child.id)
                && entry
                    .leading
                    .as_ref()
                    .and_then(|c| c.last())
                    .is_some_and(|c| comment_end(c) <= node.start)
            {
                leading = entry.leading.take();
            }
        } else {
            // Only comments that end before the node lead it; the rest lie
            // inside it and stay pending for its children or successors.
            let split = self
                .leading
                .iter()
                .position(|c| comment_end(c) > node.start)
                .unwrap_or(self.leading.len());
            if split > 0 {
                leading = Some(self.leading.drain(..split).collect());
            }
        }

        if leading.is_some() || trailing.is_some() {
            let entry = self.attached.entry(node.id).or_default();
            if leading.is_some() {
                entry.leading = leading;
            }
            if trailing.is_some() {
                entry.trailing = trailing;
            }
        }

        self.bottom_right.push(StackEntry {
            id: node.id,
            start: node.start,
        });
    }

    /// Write the recorded `leadingComments` / `trailingComments` into `root`
    /// and all of its descendants.
    pub fn attach(&self, root: &mut Node) {
        if self.attached.is_empty() {
            return;
        }
        self.attach_node(root);
    }

    fn attach_node(&self, node: &mut Node) {
        if let Some(entry) = self.attached.get(&node.id) {
            let lists = [
                ("leadingComments", &entry.leading),
                ("trailingComments", &entry.trailing),
            ];
            for (field, comments) in lists {
                if let Some(comments) = comments {
                    node.set(field, Value::Comments(comments.clone()));
                }
            }
        }
        for child in node.children_mut() {
            self.attach_node(child);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize_comment;

    fn comment(text: &str, start: usize, end: usize) -> Comment {
        normalize_comment(true, text, Some([start, end]), None)
    }

    fn node(kind: NodeType, id: NodeId, start: usize, end: usize) -> Node {
        Node {
            kind,
            start,
            end,
            id,
            range: Some([start, end]),
            loc: None,
            fields: Vec::new(),
        }
    }

    fn texts(node: &Node, field: &str) -> Vec<String> {
        match node.get(field) {
            Some(Value::Comments(items)) => items.iter().map(|c| c.value.clone()).collect(),
            _ => Vec::new(),
        }
    }

    /// `/*a*/ x; /*b*/`
    #[test]
    fn test_leading_moves_to_enclosing_statement() {
        let mut ca = CommentAttachment::new();
        ca.add_comment(&comment("a", 0, 5));
        let ident = node(NodeType::Identifier, 1, 6, 7);
        ca.process_comment(&ident);
        ca.add_comment(&comment("b", 9, 14));
        let mut stmt = node(NodeType::ExpressionStatement, 2, 6, 8);
        ca.process_comment(&stmt);

        stmt.set("expression", ident);
        ca.attach(&mut stmt);
        assert_eq!(texts(&stmt, "leadingComments"), vec!["a"]);
        assert_eq!(texts(&stmt, "trailingComments"), vec!["b"]);
        let inner = stmt.child("expression").unwrap();
        assert!(!inner.has("leadingComments"));
    }

    #[test]
    fn test_program_with_body_is_skipped() {
        let mut ca = CommentAttachment::new();
        ca.add_comment(&comment("a", 0, 5));
        let mut program = node(NodeType::Program, 0, 0, 10);
        program.set("body", vec![node(NodeType::EmptyStatement, 1, 6, 7)]);
        ca.process_comment(&program);
        ca.attach(&mut program);
        assert!(!program.has("leadingComments"));
    }

    #[test]
    fn test_comment_inside_node_stays_pending() {
        // `/*before*/ [ /*inside*/ ]`
        let mut ca = CommentAttachment::new();
        ca.add_comment(&comment("before", 0, 10));
        ca.add_comment(&comment("inside", 13, 23));
        ca.trailing.clear();
        let mut n = node(NodeType::ArrayExpression, 4, 11, 25);
        ca.process_comment(&n);
        ca.attach(&mut n);
        assert_eq!(texts(&n, "leadingComments"), vec!["before"]);
        assert!(!n.has("trailingComments"));
        assert_eq!(ca.leading.len(), 1);
        assert_eq!(ca.leading[0].value, "inside");
    }

    #[test]
    fn test_attached_comments_keep_schema_order() {
        let mut ca = CommentAttachment::new();
        ca.add_comment(&comment("a", 0, 5));
        let mut n = node(NodeType::Identifier, 1, 6, 7);
        ca.process_comment(&n);
        ca.attach(&mut n);
        let json = serde_json::to_string(&n).unwrap();
        assert!(json.contains(r#""leadingComments":[{"type":"Block","value":"a","range":[0,5]}]"#));
    }

    #[test]
    fn test_reset_clears_state() {
        let mut ca = CommentAttachment::new();
        ca.add_comment(&comment("a", 0, 5));
        ca.reset();
        let mut n = node(NodeType::Identifier, 1, 6, 7);
        ca.process_comment(&n);
        ca.attach(&mut n);
        assert!(!n.has("leadingComments"));
    }
}
