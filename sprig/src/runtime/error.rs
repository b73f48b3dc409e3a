// Error handling for the sprig runtime.
//
// The interpreted language has no rescue construct, so every error here is
// fatal: it aborts the evaluation immediately and surfaces at the process
// boundary.

use thiserror::Error;

pub type RuntimeResult<T> = Result<T, RuntimeError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    /// `var_ref` on a name never assigned in the current frame.
    #[error("undefined variable: {0}")]
    UndefinedVariable(String),

    /// `func_call` on an unknown global name, or a native name the host
    /// bridge does not recognize.
    #[error("undefined function: {0}")]
    UndefinedFunction(String),

    #[error("division by zero")]
    DivisionByZero,

    /// Integer arithmetic whose result does not fit in an `i64`.
    #[error("integer overflow in {operation}")]
    IntegerOverflow { operation: String },

    #[error("index {index} out of bounds for array of length {length}")]
    IndexOutOfBounds { index: i64, length: usize },

    #[error("key not found: {key}")]
    KeyNotFound { key: String },

    /// Node tag outside the fixed vocabulary; a parser/evaluator contract
    /// violation.
    #[error("unrecognized node tag: {0}")]
    UnrecognizedNodeTag(String),

    #[error("arity mismatch in {function}: expected {expected}, got {actual}")]
    ArityMismatch {
        function: String,
        expected: usize,
        actual: usize,
    },

    #[error("type error in {operation}: expected {expected}, got {actual}")]
    TypeError {
        expected: String,
        actual: String,
        operation: String,
    },

    /// A node whose shape does not match its tag's fixed arity.
    #[error("malformed node: {0}")]
    MalformedNode(String),

    #[error("i/o error: {0}")]
    IoError(String),

    /// Program source that is not a valid JSON-encoded AST.
    #[error("invalid program source: {0}")]
    JsonError(String),
}
