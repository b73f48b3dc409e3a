// AST node representation.
//
// The external parser emits a program as one JSON document of nested
// arrays: an evaluable node is an array whose first element is the
// operation tag, e.g. `["+", ["lit", 1], ["lit", 2]]`. Leaves carry
// literal payloads and names. The evaluator trusts this shape beyond tag
// dispatch.

use serde::{Deserialize, Serialize};

use crate::runtime::error::{RuntimeError, RuntimeResult};

/// One element of the parsed program tree.
///
/// `Int` is listed before `Float` so that untagged deserialization keeps
/// whole JSON numbers integral.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Node>),
}

impl Node {
    /// Deserialize a JSON-encoded program as produced by the parser.
    pub fn from_json(source: &str) -> RuntimeResult<Node> {
        serde_json::from_str(source).map_err(|e| RuntimeError::JsonError(e.to_string()))
    }

    /// The operation tag of an evaluable node, if this node has one.
    pub fn tag(&self) -> Option<&str> {
        match self {
            Node::List(items) => match items.first() {
                Some(Node::Str(tag)) => Some(tag),
                _ => None,
            },
            _ => None,
        }
    }

    /// Everything after the tag. Empty for leaves and untagged lists.
    pub fn children(&self) -> &[Node] {
        match self {
            Node::List(items) if !items.is_empty() => &items[1..],
            _ => &[],
        }
    }

    /// The node as a bare name (variable, function or parameter name).
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Node::Str(s) => Some(s),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn deserializes_scalars_and_lists() {
        let node = Node::from_json(r#"["lit", 1]"#).unwrap();
        assert_eq!(
            node,
            Node::List(vec![Node::Str("lit".to_string()), Node::Int(1)])
        );

        assert_eq!(Node::from_json("null").unwrap(), Node::Nil);
        assert_eq!(Node::from_json("true").unwrap(), Node::Bool(true));
        assert_eq!(Node::from_json("1.5").unwrap(), Node::Float(1.5));
        assert_eq!(Node::from_json(r#""x""#).unwrap(), Node::Str("x".to_string()));
    }

    #[test]
    fn whole_numbers_stay_integral() {
        assert_eq!(Node::from_json("42").unwrap(), Node::Int(42));
    }

    #[test]
    fn tag_and_children_accessors() {
        let node = Node::from_json(r#"["stmts", ["lit", 1], ["lit", 2]]"#).unwrap();
        assert_eq!(node.tag(), Some("stmts"));
        assert_eq!(node.children().len(), 2);

        assert_eq!(Node::Int(1).tag(), None);
        assert!(Node::Int(1).children().is_empty());
        assert_eq!(Node::List(vec![]).tag(), None);
    }

    #[test]
    fn rejects_invalid_json() {
        let err = Node::from_json("[1, 2").unwrap_err();
        assert!(matches!(err, RuntimeError::JsonError(_)));
    }
}
