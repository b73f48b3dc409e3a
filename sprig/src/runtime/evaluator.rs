// Tree-walking evaluator: dispatches on each node's tag and recurses
// depth-first. Single-threaded and strictly synchronous; recursion depth
// follows AST and call nesting and is bounded only by the host stack.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::ast::Node;
use crate::runtime::environment::{GlobalEnv, LocalEnv};
use crate::runtime::error::{RuntimeError, RuntimeResult};
use crate::runtime::host::HostInterface;
use crate::runtime::stdlib::StandardLibrary;
use crate::runtime::values::{FunctionDef, Value};

#[derive(Debug)]
pub struct Evaluator {
    globals: RefCell<GlobalEnv>,
    host: Rc<dyn HostInterface>,
}

impl Evaluator {
    /// Create an evaluator whose global table is seeded with the builtin
    /// registry.
    pub fn new(host: Rc<dyn HostInterface>) -> Self {
        Evaluator {
            globals: RefCell::new(StandardLibrary::create_global_env()),
            host,
        }
    }

    /// Evaluate a whole program in a fresh top-level frame.
    pub fn evaluate(&self, program: &Node) -> RuntimeResult<Value> {
        let mut locals = LocalEnv::new();
        self.eval_node(program, &mut locals)
    }

    /// Evaluate one node in the given frame.
    pub fn eval_node(&self, node: &Node, locals: &mut LocalEnv) -> RuntimeResult<Value> {
        let Node::List(items) = node else {
            return Err(RuntimeError::MalformedNode(format!(
                "expected a tagged list, got {:?}",
                node
            )));
        };
        let Some(Node::Str(tag)) = items.first() else {
            return Err(RuntimeError::MalformedNode(
                "node has no operation tag".to_string(),
            ));
        };
        let children = &items[1..];

        match tag.as_str() {
            "lit" => eval_lit(children),
            "+" => {
                let (lhs, rhs) = self.eval_operands("+", children, locals)?;
                add(lhs, rhs)
            }
            "-" => {
                let (lhs, rhs) = self.eval_operands("-", children, locals)?;
                sub(lhs, rhs)
            }
            "*" => {
                let (lhs, rhs) = self.eval_operands("*", children, locals)?;
                mul(lhs, rhs)
            }
            "/" => {
                let (lhs, rhs) = self.eval_operands("/", children, locals)?;
                div(lhs, rhs)
            }
            "%" => {
                let (lhs, rhs) = self.eval_operands("%", children, locals)?;
                rem(lhs, rhs)
            }
            "**" => {
                let (lhs, rhs) = self.eval_operands("**", children, locals)?;
                pow(lhs, rhs)
            }
            "<" => {
                let (lhs, rhs) = self.eval_operands("<", children, locals)?;
                compare_values(&lhs, &rhs, "<", Ordering::is_lt)
            }
            "<=" => {
                let (lhs, rhs) = self.eval_operands("<=", children, locals)?;
                compare_values(&lhs, &rhs, "<=", Ordering::is_le)
            }
            ">=" => {
                let (lhs, rhs) = self.eval_operands(">=", children, locals)?;
                compare_values(&lhs, &rhs, ">=", Ordering::is_ge)
            }
            ">" => {
                let (lhs, rhs) = self.eval_operands(">", children, locals)?;
                compare_values(&lhs, &rhs, ">", Ordering::is_gt)
            }
            "==" => {
                let (lhs, rhs) = self.eval_operands("==", children, locals)?;
                Ok(Value::Boolean(values_equal(&lhs, &rhs)))
            }
            "stmts" => {
                let mut last = Value::Nil;
                for child in children {
                    last = self.eval_node(child, locals)?;
                }
                Ok(last)
            }
            "var_assign" => self.eval_var_assign(children, locals),
            "var_ref" => match children {
                [name] => {
                    let name = expect_name("var_ref", name)?;
                    locals.lookup(name)
                }
                _ => Err(malformed("var_ref takes exactly one name")),
            },
            "if" => self.eval_if(children, locals),
            "while" => self.eval_while(children, locals),
            "while2" => self.eval_while2(children, locals),
            "func_def" => self.eval_func_def(children),
            "func_call" => self.eval_func_call(children, locals),
            "ary_new" => {
                let mut elems = Vec::with_capacity(children.len());
                for child in children {
                    elems.push(self.eval_node(child, locals)?);
                }
                Ok(Value::array(elems))
            }
            "ary_ref" => self.eval_index_read(children, locals),
            "ary_assign" => self.eval_index_write(children, locals),
            "hash_new" => self.eval_hash_new(children, locals),
            other => Err(RuntimeError::UnrecognizedNodeTag(other.to_string())),
        }
    }

    /// Evaluate the two operands of a binary node. The left operand is
    /// fully evaluated before the right, and both read the current frame's
    /// locals.
    fn eval_operands(
        &self,
        operation: &str,
        children: &[Node],
        locals: &mut LocalEnv,
    ) -> RuntimeResult<(Value, Value)> {
        let [lhs, rhs] = children else {
            return Err(malformed(&format!("{} takes exactly two operands", operation)));
        };
        let lhs = self.eval_node(lhs, locals)?;
        let rhs = self.eval_node(rhs, locals)?;
        Ok((lhs, rhs))
    }

    fn eval_var_assign(&self, children: &[Node], locals: &mut LocalEnv) -> RuntimeResult<Value> {
        let [name, expr] = children else {
            return Err(malformed("var_assign takes a name and an expression"));
        };
        let name = expect_name("var_assign", name)?;
        let value = self.eval_node(expr, locals)?;
        locals.define(name, value.clone());
        Ok(value)
    }

    fn eval_if(&self, children: &[Node], locals: &mut LocalEnv) -> RuntimeResult<Value> {
        let [condition, then_branch, else_branch] = children else {
            return Err(malformed("if takes a condition and two branches"));
        };
        if self.eval_node(condition, locals)?.is_truthy() {
            self.eval_node(then_branch, locals)
        } else {
            self.eval_node(else_branch, locals)
        }
    }

    fn eval_while(&self, children: &[Node], locals: &mut LocalEnv) -> RuntimeResult<Value> {
        let [condition, body] = children else {
            return Err(malformed("while takes a condition and a body"));
        };
        while self.eval_node(condition, locals)?.is_truthy() {
            self.eval_node(body, locals)?;
        }
        Ok(Value::Nil)
    }

    /// Do-while: the body runs once before the condition is first checked.
    fn eval_while2(&self, children: &[Node], locals: &mut LocalEnv) -> RuntimeResult<Value> {
        let [condition, body] = children else {
            return Err(malformed("while2 takes a condition and a body"));
        };
        self.eval_node(body, locals)?;
        while self.eval_node(condition, locals)?.is_truthy() {
            self.eval_node(body, locals)?;
        }
        Ok(Value::Nil)
    }

    fn eval_func_def(&self, children: &[Node]) -> RuntimeResult<Value> {
        let [name, params, body] = children else {
            return Err(malformed("func_def takes a name, a parameter list and a body"));
        };
        let name = expect_name("func_def", name)?;
        let Node::List(param_nodes) = params else {
            return Err(malformed("func_def parameter list must be a list of names"));
        };
        let params = param_nodes
            .iter()
            .map(|p| {
                p.as_name()
                    .map(str::to_string)
                    .ok_or_else(|| malformed("func_def parameters must be names"))
            })
            .collect::<RuntimeResult<Vec<String>>>()?;
        self.globals.borrow_mut().define(
            name,
            FunctionDef::UserDefined {
                params,
                body: body.clone(),
            },
        );
        Ok(Value::Nil)
    }

    fn eval_func_call(&self, children: &[Node], locals: &mut LocalEnv) -> RuntimeResult<Value> {
        let Some((name_node, arg_nodes)) = children.split_first() else {
            return Err(malformed("func_call takes a function name"));
        };
        let name = expect_name("func_call", name_node)?;

        let mut args = Vec::with_capacity(arg_nodes.len());
        for arg in arg_nodes {
            args.push(self.eval_node(arg, locals)?);
        }

        let def = self.globals.borrow().lookup(name)?;
        match def {
            FunctionDef::Builtin { native } => self.host.call_native(&native, &args),
            FunctionDef::UserDefined { params, body } => {
                if args.len() != params.len() {
                    return Err(RuntimeError::ArityMismatch {
                        function: name.to_string(),
                        expected: params.len(),
                        actual: args.len(),
                    });
                }
                // A fresh, flat frame: the callee never sees the caller's
                // locals. Containers pass by reference, so mutations made
                // through a parameter are visible to the caller.
                let mut frame = LocalEnv::new();
                for (param, arg) in params.iter().zip(args) {
                    frame.define(param, arg);
                }
                self.eval_node(&body, &mut frame)
            }
        }
    }

    fn eval_index_read(&self, children: &[Node], locals: &mut LocalEnv) -> RuntimeResult<Value> {
        let [target, index] = children else {
            return Err(malformed("ary_ref takes a target and an index"));
        };
        let target = self.eval_node(target, locals)?;
        let index = self.eval_node(index, locals)?;
        index_read(&target, &index)
    }

    fn eval_index_write(&self, children: &[Node], locals: &mut LocalEnv) -> RuntimeResult<Value> {
        let [target, index, value] = children else {
            return Err(malformed("ary_assign takes a target, an index and a value"));
        };
        let target = self.eval_node(target, locals)?;
        let index = self.eval_node(index, locals)?;
        let value = self.eval_node(value, locals)?;
        index_write(&target, &index, value)
    }

    fn eval_hash_new(&self, children: &[Node], locals: &mut LocalEnv) -> RuntimeResult<Value> {
        if children.len() % 2 != 0 {
            return Err(malformed("hash_new takes key/value pairs"));
        }
        let mut entries = IndexMap::with_capacity(children.len() / 2);
        for pair in children.chunks_exact(2) {
            let key = self.eval_node(&pair[0], locals)?;
            let value = self.eval_node(&pair[1], locals)?;
            // Later duplicates overwrite earlier ones.
            entries.insert(key.as_map_key("hash_new")?, value);
        }
        Ok(Value::map(entries))
    }
}

fn eval_lit(children: &[Node]) -> RuntimeResult<Value> {
    match children {
        [Node::List(_)] => Err(malformed("lit payload must be a scalar")),
        [leaf] => Ok(Value::from(leaf)),
        _ => Err(malformed("lit takes exactly one payload")),
    }
}

fn malformed(reason: &str) -> RuntimeError {
    RuntimeError::MalformedNode(reason.to_string())
}

fn expect_name<'a>(operation: &str, node: &'a Node) -> RuntimeResult<&'a str> {
    node.as_name()
        .ok_or_else(|| malformed(&format!("{} expects a name, got {:?}", operation, node)))
}

fn type_error(operation: &str, expected: &str, actual: &Value) -> RuntimeError {
    RuntimeError::TypeError {
        expected: expected.to_string(),
        actual: actual.type_name().to_string(),
        operation: operation.to_string(),
    }
}

fn as_f64(value: &Value, operation: &str) -> RuntimeResult<f64> {
    match value {
        Value::Integer(n) => Ok(*n as f64),
        Value::Float(x) => Ok(*x),
        other => Err(type_error(operation, "number", other)),
    }
}

fn overflow(operation: &str) -> RuntimeError {
    RuntimeError::IntegerOverflow {
        operation: operation.to_string(),
    }
}

/// Floored division: the quotient rounds toward negative infinity, as in
/// the language's integer semantics. `None` when the quotient is not
/// representable (`i64::MIN / -1`).
fn floor_div(a: i64, b: i64) -> Option<i64> {
    let q = a.checked_div(b)?;
    if a % b != 0 && (a < 0) != (b < 0) {
        Some(q - 1)
    } else {
        Some(q)
    }
}

/// Floored modulo: the result takes the sign of the divisor.
fn floor_mod(a: i64, b: i64) -> Option<i64> {
    let r = a.checked_rem(b)?;
    if r != 0 && (r < 0) != (b < 0) {
        Some(r + b)
    } else {
        Some(r)
    }
}

/// Floored modulo for floats, mirroring the integer rule: the result
/// takes the sign of the divisor. A zero divisor yields NaN per IEEE.
fn floor_mod_float(a: f64, b: f64) -> f64 {
    let r = a % b;
    if r != 0.0 && (r < 0.0) != (b < 0.0) {
        r + b
    } else {
        r
    }
}

fn add(lhs: Value, rhs: Value) -> RuntimeResult<Value> {
    match (&lhs, &rhs) {
        (Value::Integer(a), Value::Integer(b)) => a
            .checked_add(*b)
            .map(Value::Integer)
            .ok_or_else(|| overflow("+")),
        (Value::String(a), Value::String(b)) => Ok(Value::String(format!("{}{}", a, b))),
        (Value::Array(a), Value::Array(b)) => {
            // Concatenation builds a new array; neither operand is mutated.
            let mut out = a.borrow().clone();
            out.extend(b.borrow().iter().cloned());
            Ok(Value::array(out))
        }
        _ => {
            let a = as_f64(&lhs, "+").map_err(|_| type_error("+", "number, string or array", &lhs))?;
            let b = as_f64(&rhs, "+").map_err(|_| type_error("+", "number, string or array", &rhs))?;
            Ok(Value::Float(a + b))
        }
    }
}

fn sub(lhs: Value, rhs: Value) -> RuntimeResult<Value> {
    match (&lhs, &rhs) {
        (Value::Integer(a), Value::Integer(b)) => a
            .checked_sub(*b)
            .map(Value::Integer)
            .ok_or_else(|| overflow("-")),
        _ => Ok(Value::Float(as_f64(&lhs, "-")? - as_f64(&rhs, "-")?)),
    }
}

fn mul(lhs: Value, rhs: Value) -> RuntimeResult<Value> {
    match (&lhs, &rhs) {
        (Value::Integer(a), Value::Integer(b)) => a
            .checked_mul(*b)
            .map(Value::Integer)
            .ok_or_else(|| overflow("*")),
        _ => Ok(Value::Float(as_f64(&lhs, "*")? * as_f64(&rhs, "*")?)),
    }
}

fn div(lhs: Value, rhs: Value) -> RuntimeResult<Value> {
    match (&lhs, &rhs) {
        (Value::Integer(a), Value::Integer(b)) => {
            if *b == 0 {
                return Err(RuntimeError::DivisionByZero);
            }
            floor_div(*a, *b)
                .map(Value::Integer)
                .ok_or_else(|| overflow("/"))
        }
        // Float division follows IEEE, so a zero divisor yields infinity.
        _ => Ok(Value::Float(as_f64(&lhs, "/")? / as_f64(&rhs, "/")?)),
    }
}

fn rem(lhs: Value, rhs: Value) -> RuntimeResult<Value> {
    match (&lhs, &rhs) {
        (Value::Integer(a), Value::Integer(b)) => {
            if *b == 0 {
                return Err(RuntimeError::DivisionByZero);
            }
            floor_mod(*a, *b)
                .map(Value::Integer)
                .ok_or_else(|| overflow("%"))
        }
        _ => Ok(Value::Float(floor_mod_float(
            as_f64(&lhs, "%")?,
            as_f64(&rhs, "%")?,
        ))),
    }
}

fn pow(lhs: Value, rhs: Value) -> RuntimeResult<Value> {
    match (&lhs, &rhs) {
        (Value::Integer(a), Value::Integer(b)) => {
            // A non-negative integer exponent stays integral; a negative
            // one promotes to float.
            if let Ok(exp) = u32::try_from(*b) {
                a.checked_pow(exp)
                    .map(Value::Integer)
                    .ok_or_else(|| overflow("**"))
            } else {
                Ok(Value::Float((*a as f64).powf(*b as f64)))
            }
        }
        _ => Ok(Value::Float(as_f64(&lhs, "**")?.powf(as_f64(&rhs, "**")?))),
    }
}

fn compare_values(
    lhs: &Value,
    rhs: &Value,
    operation: &str,
    pred: impl Fn(Ordering) -> bool,
) -> RuntimeResult<Value> {
    let ordering = match (lhs, rhs) {
        (Value::String(a), Value::String(b)) => a.cmp(b),
        _ => {
            let a = as_f64(lhs, operation)?;
            let b = as_f64(rhs, operation)?;
            match a.partial_cmp(&b) {
                Some(o) => o,
                // NaN compares false against everything.
                None => return Ok(Value::Boolean(false)),
            }
        }
    };
    Ok(Value::Boolean(pred(ordering)))
}

/// Language-level equality: total over all values, numeric across the
/// integer/float divide, structural on containers, `false` across
/// differing types.
fn values_equal(a: &Value, b: &Value) -> bool {
    values_equal_nested(a, b, &mut Vec::new())
}

/// Container pairs whose comparison is already in progress higher up the
/// recursion are assumed equal, so cyclic structures terminate.
fn values_equal_nested(
    a: &Value,
    b: &Value,
    in_progress: &mut Vec<(*const (), *const ())>,
) -> bool {
    match (a, b) {
        (Value::Nil, Value::Nil) => true,
        (Value::Boolean(x), Value::Boolean(y)) => x == y,
        (Value::Integer(x), Value::Integer(y)) => x == y,
        (Value::Float(x), Value::Float(y)) => x == y,
        (Value::Integer(x), Value::Float(y)) | (Value::Float(y), Value::Integer(x)) => {
            (*x as f64) == *y
        }
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Array(x), Value::Array(y)) => {
            if Rc::ptr_eq(x, y) {
                return true;
            }
            let pair = (Rc::as_ptr(x) as *const (), Rc::as_ptr(y) as *const ());
            if in_progress.contains(&pair) {
                return true;
            }
            in_progress.push(pair);
            let x = x.borrow();
            let y = y.borrow();
            let equal = x.len() == y.len()
                && x.iter()
                    .zip(y.iter())
                    .all(|(v, w)| values_equal_nested(v, w, in_progress));
            in_progress.pop();
            equal
        }
        (Value::Map(x), Value::Map(y)) => {
            if Rc::ptr_eq(x, y) {
                return true;
            }
            let pair = (Rc::as_ptr(x) as *const (), Rc::as_ptr(y) as *const ());
            if in_progress.contains(&pair) {
                return true;
            }
            in_progress.push(pair);
            let x = x.borrow();
            let y = y.borrow();
            let equal = x.len() == y.len()
                && x.iter().all(|(k, v)| match y.get(k) {
                    Some(w) => values_equal_nested(v, w, in_progress),
                    None => false,
                });
            in_progress.pop();
            equal
        }
        _ => false,
    }
}

fn index_read(target: &Value, index: &Value) -> RuntimeResult<Value> {
    match target {
        Value::Array(elems) => {
            let elems = elems.borrow();
            let idx = expect_index(index)?;
            if idx < 0 || idx as usize >= elems.len() {
                return Err(RuntimeError::IndexOutOfBounds {
                    index: idx,
                    length: elems.len(),
                });
            }
            Ok(elems[idx as usize].clone())
        }
        Value::Map(entries) => {
            let key = index.as_map_key("ary_ref")?;
            entries
                .borrow()
                .get(&key)
                .cloned()
                .ok_or_else(|| RuntimeError::KeyNotFound {
                    key: key.to_string(),
                })
        }
        other => Err(type_error("ary_ref", "array or map", other)),
    }
}

fn index_write(target: &Value, index: &Value, value: Value) -> RuntimeResult<Value> {
    match target {
        Value::Array(elems) => {
            let idx = expect_index(index)?;
            let mut elems = elems.borrow_mut();
            if idx < 0 {
                return Err(RuntimeError::IndexOutOfBounds {
                    index: idx,
                    length: elems.len(),
                });
            }
            let idx = idx as usize;
            // Writing past the end grows the array, padding with nil.
            if idx >= elems.len() {
                elems.resize(idx + 1, Value::Nil);
            }
            elems[idx] = value.clone();
            Ok(value)
        }
        Value::Map(entries) => {
            let key = index.as_map_key("ary_assign")?;
            entries.borrow_mut().insert(key, value.clone());
            Ok(value)
        }
        other => Err(type_error("ary_assign", "array or map", other)),
    }
}

fn expect_index(index: &Value) -> RuntimeResult<i64> {
    match index {
        Value::Integer(n) => Ok(*n),
        other => Err(type_error("index", "integer", other)),
    }
}
