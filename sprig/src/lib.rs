//! Sprig: a tree-walking interpreter for a small dynamically-typed
//! scripting language.
//!
//! Programs arrive as JSON-encoded ASTs produced by an external parser;
//! the evaluator walks the tree depth-first, maintaining one global
//! function table per run and a flat local frame per call, and forwards
//! builtin calls to a [`runtime::HostInterface`] bridge.
//!
//! ```
//! use std::rc::Rc;
//! use sprig::runtime::{Runtime, StdHost, Value};
//!
//! let runtime = Runtime::new(Rc::new(StdHost::new()));
//! let result = runtime.run_source(r#"["+", ["lit", 1], ["lit", 2]]"#).unwrap();
//! assert_eq!(result, Value::Integer(3));
//! ```

pub mod ast;
pub mod runtime;

pub use ast::Node;
pub use runtime::{
    Evaluator, HostInterface, Runtime, RuntimeError, RuntimeResult, StdHost, Value,
};
