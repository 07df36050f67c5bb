//! AST for filter expressions and its SQL rendering.
//!
//! Nodes are immutable once the parser has built them. Field names and values
//! are stored already sanitized, so rendering is plain string assembly.

use std::fmt;
use std::mem;

use serde::Serialize;

/// A sanitized, snake_case field name. Only [`crate::sanitize::Sanitizer`]
/// creates these.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Identifier(String);

impl Identifier {
    pub(crate) fn new(name: String) -> Self {
        Self(name)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A ready-to-emit SQL literal: a quoted and escaped string, a bare number,
/// or `true`/`false`/`null`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Literal(String);

impl Literal {
    pub(crate) fn new(sql: String) -> Self {
        Self(sql)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Logical connective of a [`Node::Binary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BoolOp {
    And,
    Or,
}

impl BoolOp {
    pub fn as_sql(self) -> &'static str {
        match self {
            BoolOp::And => "AND",
            BoolOp::Or => "OR",
        }
    }

    fn separator(self) -> &'static str {
        match self {
            BoolOp::And => " AND ",
            BoolOp::Or => " OR ",
        }
    }
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CompOp {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
}

impl CompOp {
    pub fn as_sql(self) -> &'static str {
        match self {
            CompOp::Eq => "=",
            CompOp::Ne => "!=",
            CompOp::Gt => ">",
            CompOp::Ge => ">=",
            CompOp::Lt => "<",
            CompOp::Le => "<=",
        }
    }
}

impl fmt::Display for CompOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// A parsed filter expression.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    /// `left AND right` / `left OR right`
    Binary {
        op: BoolOp,
        left: Box<Node>,
        right: Box<Node>,
    },
    /// `NOT child`
    Not { child: Box<Node> },
    /// `field op value`, a leaf
    Condition {
        field: Identifier,
        op: CompOp,
        value: Literal,
    },
    /// `field IN (v1, v2, ...)`, a leaf. Values keep their source order.
    In {
        field: Identifier,
        values: Vec<Literal>,
    },
    /// A group the author wrote with explicit parentheses.
    Paren { child: Box<Node> },
}

impl Node {
    /// Renders the node as SQL. `level` is the nesting depth the node sits at,
    /// 0 for the whole expression.
    pub fn to_sql(&self, level: usize) -> String {
        let mut out = String::new();
        self.write_sql(&mut out, level);
        out
    }

    fn write_sql(&self, out: &mut String, level: usize) {
        // Explicit work stack: a long AND/OR chain is as deep as it is long.
        let mut pending = vec![Step::Node(self, level)];
        while let Some(step) = pending.pop() {
            let (node, level) = match step {
                Step::Text(text) => {
                    out.push_str(text);
                    continue;
                }
                Step::Node(node, level) => (node, level),
            };
            match node {
                Node::Condition { field, op, value } => {
                    out.push_str(field.as_str());
                    out.push(' ');
                    out.push_str(op.as_sql());
                    out.push(' ');
                    out.push_str(value.as_str());
                }
                Node::In { field, values } => {
                    out.push_str(field.as_str());
                    out.push_str(" IN (");
                    for (i, value) in values.iter().enumerate() {
                        if i > 0 {
                            out.push_str(", ");
                        }
                        out.push_str(value.as_str());
                    }
                    out.push(')');
                }
                Node::Binary { op, left, right } => {
                    let nested = level > 0;
                    if nested {
                        out.push('(');
                        pending.push(Step::Text(")"));
                    }
                    pending.push(Step::Node(right, level + 1));
                    pending.push(Step::Text(op.separator()));
                    pending.push(Step::Node(left, level + 1));
                }
                Node::Not { child } => {
                    let nested = level > 0;
                    if nested {
                        out.push('(');
                        pending.push(Step::Text(")"));
                    }
                    out.push_str("NOT ");
                    pending.push(Step::Node(child, level + 1));
                }
                Node::Paren { child } => {
                    // the author's own parentheses stand in for the implicit ones
                    out.push('(');
                    pending.push(Step::Text(")"));
                    pending.push(Step::Node(child, 0));
                }
            }
        }
    }

    /// Moves this node's children into `out`, leaving cheap leaves behind.
    fn take_children(&mut self, out: &mut Vec<Node>) {
        match self {
            Node::Binary { left, right, .. } => {
                out.push(mem::replace(left.as_mut(), Node::placeholder()));
                out.push(mem::replace(right.as_mut(), Node::placeholder()));
            }
            Node::Not { child } | Node::Paren { child } => {
                out.push(mem::replace(child.as_mut(), Node::placeholder()));
            }
            Node::Condition { .. } | Node::In { .. } => {}
        }
    }

    fn placeholder() -> Node {
        Node::In {
            field: Identifier(String::new()),
            values: Vec::new(),
        }
    }
}

enum Step<'n> {
    Node(&'n Node, usize),
    Text(&'static str),
}

impl Drop for Node {
    fn drop(&mut self) {
        let mut detached = Vec::new();
        self.take_children(&mut detached);
        while let Some(mut node) = detached.pop() {
            node.take_children(&mut detached);
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cond(field: &str, op: CompOp, value: &str) -> Node {
        Node::Condition {
            field: Identifier::new(field.to_string()),
            op,
            value: Literal::new(value.to_string()),
        }
    }

    fn binary(op: BoolOp, left: Node, right: Node) -> Node {
        Node::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    fn not(child: Node) -> Node {
        Node::Not { child: Box::new(child) }
    }

    fn paren(child: Node) -> Node {
        Node::Paren { child: Box::new(child) }
    }

    #[test]
    fn test_leaves_ignore_level() {
        let c = cond("age", CompOp::Gt, "18");
        assert_eq!(c.to_sql(0), "age > 18");
        assert_eq!(c.to_sql(5), "age > 18");

        let i = Node::In {
            field: Identifier::new("color".to_string()),
            values: vec![
                Literal::new("'red'".to_string()),
                Literal::new("'blue'".to_string()),
            ],
        };
        assert_eq!(i.to_sql(0), "color IN ('red', 'blue')");
        assert_eq!(i.to_sql(3), "color IN ('red', 'blue')");
    }

    #[test]
    fn test_binary_wraps_only_when_nested() {
        let and = binary(
            BoolOp::And,
            cond("age", CompOp::Gt, "30"),
            cond("status", CompOp::Eq, "'active'"),
        );
        assert_eq!(and.to_sql(0), "age > 30 AND status = 'active'");
        assert_eq!(and.to_sql(1), "(age > 30 AND status = 'active')");

        let or = binary(BoolOp::Or, and, cond("premium", CompOp::Eq, "true"));
        assert_eq!(
            or.to_sql(0),
            "(age > 30 AND status = 'active') OR premium = true"
        );
    }

    #[test]
    fn test_not_stacking() {
        let node = not(not(cond("name", CompOp::Eq, "'Bob'")));
        assert_eq!(node.to_sql(0), "NOT (NOT name = 'Bob')");
    }

    #[test]
    fn test_paren_renders_exactly_once() {
        let node = paren(paren(cond("name", CompOp::Eq, "'Bob'")));
        assert_eq!(node.to_sql(0), "((name = 'Bob'))");
        assert_eq!(node.to_sql(4), "((name = 'Bob'))");

        // a group inside NOT is not wrapped a second time
        let grouped = not(paren(binary(
            BoolOp::And,
            cond("a", CompOp::Lt, "1"),
            cond("b", CompOp::Ge, "2"),
        )));
        assert_eq!(grouped.to_sql(0), "NOT (a < 1 AND b >= 2)");
        assert_eq!(grouped.to_sql(1), "(NOT (a < 1 AND b >= 2))");
    }

    #[test]
    fn test_rendering_is_idempotent() {
        let node = binary(
            BoolOp::Or,
            not(cond("a", CompOp::Ne, "null")),
            paren(binary(
                BoolOp::And,
                cond("b", CompOp::Le, "2.5"),
                cond("c", CompOp::Eq, "'x'"),
            )),
        );
        let first = node.to_sql(0);
        assert_eq!(first, "(NOT a != null) OR (b <= 2.5 AND c = 'x')");
        for _ in 0..3 {
            assert_eq!(node.to_sql(0), first);
        }
        assert_eq!(node.to_string(), first);
    }

    #[test]
    fn test_long_chain_renders_and_drops() {
        let mut node = cond("f0", CompOp::Eq, "0");
        for i in 1..100_000 {
            node = binary(BoolOp::Or, node, cond(&format!("f{i}"), CompOp::Eq, &i.to_string()));
        }
        node = not(node);

        let sql = node.to_sql(0);
        assert!(sql.starts_with(&format!("NOT {}f0 = 0 OR f1 = 1)", "(".repeat(99_999))));
        assert!(sql.contains("(f0 = 0 OR f1 = 1) OR f2 = 2)"));
        assert!(sql.ends_with(" OR f99999 = 99999)"));
        drop(node);
    }

    #[test]
    fn test_serialize_is_tagged() {
        let node = not(cond("age", CompOp::Ge, "21"));
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "kind": "not",
                "child": {
                    "kind": "condition",
                    "field": "age",
                    "op": ">=",
                    "value": "21"
                }
            })
        );
    }
}
