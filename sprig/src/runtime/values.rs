// Runtime value system.
//
// Scalars have value semantics. Arrays and maps are reference-semantics
// containers: cloning a `Value` clones the `Rc`, so every binding that
// received the same container observes mutations made through any other.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::ast::Node;
use crate::runtime::error::{RuntimeError, RuntimeResult};

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Nil,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Array(Rc<RefCell<Vec<Value>>>),
    Map(Rc<RefCell<IndexMap<MapKey, Value>>>),
}

/// The hashable scalar subset of `Value`, usable as a map key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MapKey {
    Nil,
    Boolean(bool),
    Integer(i64),
    String(String),
}

/// A global function table entry: either a forward to host-native
/// functionality or a user definition installed by `func_def`.
#[derive(Debug, Clone, PartialEq)]
pub enum FunctionDef {
    Builtin { native: String },
    UserDefined { params: Vec<String>, body: Node },
}

impl Value {
    /// Wrap elements in fresh shared array storage.
    pub fn array(elems: Vec<Value>) -> Value {
        Value::Array(Rc::new(RefCell::new(elems)))
    }

    /// Wrap entries in fresh shared map storage.
    pub fn map(entries: IndexMap<MapKey, Value>) -> Value {
        Value::Map(Rc::new(RefCell::new(entries)))
    }

    /// Only `nil` and `false` are falsy; everything else, including `0`,
    /// is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Boolean(b) => *b,
            Value::Nil => false,
            _ => true,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
        }
    }

    /// Convert to a map key, failing for floats and containers.
    pub fn as_map_key(&self, operation: &str) -> RuntimeResult<MapKey> {
        match self {
            Value::Nil => Ok(MapKey::Nil),
            Value::Boolean(b) => Ok(MapKey::Boolean(*b)),
            Value::Integer(n) => Ok(MapKey::Integer(*n)),
            Value::String(s) => Ok(MapKey::String(s.clone())),
            other => Err(RuntimeError::TypeError {
                expected: "integer, string, boolean or nil key".to_string(),
                actual: other.type_name().to_string(),
                operation: operation.to_string(),
            }),
        }
    }
}

/// Turn an AST subtree into a plain value tree. Used by the `parse`
/// builtin so a program can hold, and itself walk, another program's AST.
impl From<&Node> for Value {
    fn from(node: &Node) -> Self {
        match node {
            Node::Nil => Value::Nil,
            Node::Bool(b) => Value::Boolean(*b),
            Node::Int(n) => Value::Integer(*n),
            Node::Float(f) => Value::Float(*f),
            Node::Str(s) => Value::String(s.clone()),
            Node::List(items) => Value::array(items.iter().map(Value::from).collect()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_nested(f, &mut Vec::new())
    }
}

impl Value {
    /// Rendering tracks the containers currently open above this one, so a
    /// cyclic structure prints an elision marker instead of recursing
    /// forever.
    fn fmt_nested(&self, f: &mut fmt::Formatter<'_>, open: &mut Vec<*const ()>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", x),
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::Array(elems) => {
                let ptr = Rc::as_ptr(elems) as *const ();
                if open.contains(&ptr) {
                    return write!(f, "[...]");
                }
                open.push(ptr);
                write!(f, "[")?;
                for (i, v) in elems.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    v.fmt_nested(f, open)?;
                }
                open.pop();
                write!(f, "]")
            }
            Value::Map(entries) => {
                let ptr = Rc::as_ptr(entries) as *const ();
                if open.contains(&ptr) {
                    return write!(f, "{{...}}");
                }
                open.push(ptr);
                write!(f, "{{")?;
                for (i, (k, v)) in entries.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} => ", k)?;
                    v.fmt_nested(f, open)?;
                }
                open.pop();
                write!(f, "}}")
            }
        }
    }
}

impl fmt::Display for MapKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapKey::Nil => write!(f, "nil"),
            MapKey::Boolean(b) => write!(f, "{}", b),
            MapKey::Integer(n) => write!(f, "{}", n),
            MapKey::String(s) => write!(f, "\"{}\"", s),
        }
    }
}
