//! Builtin registry seeding.
//!
//! Every program starts with a global function table containing these
//! builtins. Each entry is a pure forward: the evaluator hands the native
//! name and evaluated arguments to the host bridge and never inspects what
//! the builtin does.

use crate::runtime::environment::GlobalEnv;
use crate::runtime::values::FunctionDef;

pub struct StandardLibrary;

impl StandardLibrary {
    /// Seed registry: script-visible name on the left, the native name the
    /// host bridge receives on the right.
    const BUILTINS: &'static [(&'static str, &'static str)] = &[
        ("print", "print"),
        ("require", "require"),
        ("parse", "parse"),
        ("load", "load"),
        ("call", "call"),
    ];

    /// Create the global function table a program run starts with.
    pub fn create_global_env() -> GlobalEnv {
        let mut env = GlobalEnv::new();
        for (name, native) in Self::BUILTINS {
            env.define(
                name,
                FunctionDef::Builtin {
                    native: (*native).to_string(),
                },
            );
        }
        env
    }
}
