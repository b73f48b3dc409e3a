// Environments: the process-wide function table and per-frame variable
// bindings.

use std::collections::HashMap;

use crate::runtime::error::{RuntimeError, RuntimeResult};
use crate::runtime::values::{FunctionDef, Value};

/// Global function table. There is exactly one per program run, shared by
/// every call frame; `func_def` grows it and nothing ever shrinks it.
#[derive(Debug, Clone, Default)]
pub struct GlobalEnv {
    functions: HashMap<String, FunctionDef>,
}

impl GlobalEnv {
    pub fn new() -> Self {
        GlobalEnv {
            functions: HashMap::new(),
        }
    }

    /// Install a definition. Redefining a name replaces the previous
    /// definition: the last `func_def` wins.
    pub fn define(&mut self, name: &str, def: FunctionDef) {
        self.functions.insert(name.to_string(), def);
    }

    pub fn lookup(&self, name: &str) -> RuntimeResult<FunctionDef> {
        self.functions
            .get(name)
            .cloned()
            .ok_or_else(|| RuntimeError::UndefinedFunction(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }
}

/// Per-call-frame variable bindings. Flat: there is no parent chain, so a
/// callee can never see its caller's locals and every variable assigned
/// anywhere in a function body is visible for the rest of that frame.
#[derive(Debug, Clone, Default)]
pub struct LocalEnv {
    bindings: HashMap<String, Value>,
}

impl LocalEnv {
    pub fn new() -> Self {
        LocalEnv {
            bindings: HashMap::new(),
        }
    }

    pub fn define(&mut self, name: &str, value: Value) {
        self.bindings.insert(name.to_string(), value);
    }

    pub fn lookup(&self, name: &str) -> RuntimeResult<Value> {
        self.bindings
            .get(name)
            .cloned()
            .ok_or_else(|| RuntimeError::UndefinedVariable(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn global_lookup_fails_for_unknown_names() {
        let env = GlobalEnv::new();
        assert_eq!(
            env.lookup("missing"),
            Err(RuntimeError::UndefinedFunction("missing".to_string()))
        );
    }

    #[test]
    fn last_definition_wins() {
        let mut env = GlobalEnv::new();
        env.define(
            "f",
            FunctionDef::Builtin {
                native: "first".to_string(),
            },
        );
        env.define(
            "f",
            FunctionDef::Builtin {
                native: "second".to_string(),
            },
        );
        assert_eq!(
            env.lookup("f").unwrap(),
            FunctionDef::Builtin {
                native: "second".to_string()
            }
        );
    }

    #[test]
    fn local_bindings_overwrite_and_resolve() {
        let mut env = LocalEnv::new();
        env.define("x", Value::Integer(1));
        env.define("x", Value::Integer(2));
        assert_eq!(env.lookup("x").unwrap(), Value::Integer(2));
        assert_eq!(
            env.lookup("y"),
            Err(RuntimeError::UndefinedVariable("y".to_string()))
        );
    }
}
