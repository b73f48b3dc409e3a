//! The builtin bridge between evaluated programs and host-native
//! functionality.

use std::fs;
use std::path::PathBuf;

use crate::ast::Node;
use crate::runtime::error::{RuntimeError, RuntimeResult};
use crate::runtime::values::Value;

/// Contract between the evaluator and the host environment.
///
/// The evaluator hands over a symbolic native name and already-evaluated
/// arguments, and takes the result on faith; unknown names fail with
/// `UndefinedFunction`.
pub trait HostInterface: std::fmt::Debug {
    fn call_native(&self, name: &str, args: &[Value]) -> RuntimeResult<Value>;
}

/// Production host: prints to stdout and reads program sources from disk.
#[derive(Debug, Default)]
pub struct StdHost {
    source_path: Option<PathBuf>,
}

impl StdHost {
    pub fn new() -> Self {
        StdHost { source_path: None }
    }

    /// A host that remembers where the running program came from, so
    /// `load` without arguments can re-read it.
    pub fn with_source_path(path: PathBuf) -> Self {
        StdHost {
            source_path: Some(path),
        }
    }

    fn print(&self, args: &[Value]) -> RuntimeResult<Value> {
        for arg in args {
            println!("{}", arg);
        }
        Ok(args.last().cloned().unwrap_or(Value::Nil))
    }

    /// The host has no module system; accept the call and move on so
    /// sources written against a module-loading host still run.
    fn require(&self, args: &[Value]) -> RuntimeResult<Value> {
        expect_arity("require", args, 1)?;
        expect_string("require", &args[0])?;
        Ok(Value::Boolean(true))
    }

    fn load(&self, args: &[Value]) -> RuntimeResult<Value> {
        let path = match args {
            [] => self.source_path.clone().ok_or_else(|| {
                RuntimeError::IoError("no program source configured".to_string())
            })?,
            [Value::String(p)] => PathBuf::from(p),
            [other] => return Err(type_error("load", "string", other)),
            _ => {
                return Err(RuntimeError::ArityMismatch {
                    function: "load".to_string(),
                    expected: 1,
                    actual: args.len(),
                })
            }
        };
        fs::read_to_string(&path)
            .map(Value::String)
            .map_err(|e| RuntimeError::IoError(format!("{}: {}", path.display(), e)))
    }

    /// Parse a JSON-encoded AST and hand it back as a plain value tree, so
    /// an interpreted program can itself interpret programs.
    fn parse(&self, args: &[Value]) -> RuntimeResult<Value> {
        expect_arity("parse", args, 1)?;
        let source = expect_string("parse", &args[0])?;
        let node = Node::from_json(source)?;
        Ok(Value::from(&node))
    }

    /// Generic forwarder: `call(name, args)` re-enters the bridge. This is
    /// how a self-hosted interpreter reaches host functionality for the
    /// programs it runs.
    fn forward(&self, args: &[Value]) -> RuntimeResult<Value> {
        expect_arity("call", args, 2)?;
        let name = expect_string("call", &args[0])?.to_string();
        let forwarded = match &args[1] {
            Value::Array(elems) => elems.borrow().clone(),
            other => return Err(type_error("call", "array", other)),
        };
        self.call_native(&name, &forwarded)
    }
}

impl HostInterface for StdHost {
    fn call_native(&self, name: &str, args: &[Value]) -> RuntimeResult<Value> {
        match name {
            "print" => self.print(args),
            "require" => self.require(args),
            "load" => self.load(args),
            "parse" => self.parse(args),
            "call" => self.forward(args),
            _ => Err(RuntimeError::UndefinedFunction(name.to_string())),
        }
    }
}

fn expect_arity(function: &str, args: &[Value], expected: usize) -> RuntimeResult<()> {
    if args.len() != expected {
        return Err(RuntimeError::ArityMismatch {
            function: function.to_string(),
            expected,
            actual: args.len(),
        });
    }
    Ok(())
}

fn expect_string<'a>(operation: &str, value: &'a Value) -> RuntimeResult<&'a str> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(type_error(operation, "string", other)),
    }
}

fn type_error(operation: &str, expected: &str, actual: &Value) -> RuntimeError {
    RuntimeError::TypeError {
        expected: expected.to_string(),
        actual: actual.type_name().to_string(),
        operation: operation.to_string(),
    }
}
