// Runtime system: the evaluator, environments, value model, builtin
// registry and the host bridge.

pub mod environment;
pub mod error;
pub mod evaluator;
pub mod host;
pub mod stdlib;
pub mod values;

pub use environment::{GlobalEnv, LocalEnv};
pub use error::{RuntimeError, RuntimeResult};
pub use evaluator::Evaluator;
pub use host::{HostInterface, StdHost};
pub use stdlib::StandardLibrary;
pub use values::{FunctionDef, MapKey, Value};

use std::rc::Rc;

use crate::ast::Node;

/// Convenience wrapper owning an evaluator wired to a host.
#[derive(Debug)]
pub struct Runtime {
    evaluator: Evaluator,
}

impl Runtime {
    pub fn new(host: Rc<dyn HostInterface>) -> Self {
        Runtime {
            evaluator: Evaluator::new(host),
        }
    }

    /// Run a whole program in one fresh top-level frame; the result is the
    /// value of the root node.
    pub fn run(&self, program: &Node) -> RuntimeResult<Value> {
        self.evaluator.evaluate(program)
    }

    /// Deserialize and run a JSON-encoded program in one step.
    pub fn run_source(&self, source: &str) -> RuntimeResult<Value> {
        let program = Node::from_json(source)?;
        self.evaluator.evaluate(&program)
    }
}
