// Shared helpers for the integration tests.

use std::cell::RefCell;

use sprig::runtime::{HostInterface, RuntimeError, RuntimeResult, Value};
use sprig::Node;

/// Build an AST node from the JSON wire shape the parser emits.
pub fn node(v: serde_json::Value) -> Node {
    serde_json::from_value(v).expect("test AST should deserialize")
}

/// A host that records every forwarded call. It only understands `print`
/// (returning its last argument, like the production host); everything
/// else fails at the bridge.
#[derive(Debug, Default)]
pub struct RecordingHost {
    pub calls: RefCell<Vec<(String, Vec<Value>)>>,
}

impl HostInterface for RecordingHost {
    fn call_native(&self, name: &str, args: &[Value]) -> RuntimeResult<Value> {
        self.calls
            .borrow_mut()
            .push((name.to_string(), args.to_vec()));
        match name {
            "print" => Ok(args.last().cloned().unwrap_or(Value::Nil)),
            other => Err(RuntimeError::UndefinedFunction(other.to_string())),
        }
    }
}
