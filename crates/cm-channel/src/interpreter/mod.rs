//! # Script Interpreter
//!
//! The default executor. Evaluates request payloads in a small, sandboxed
//! expression language with no access to the host:
//!
//! ```text
//! 1 + 1                       → 2
//! "v" + 2                     → "v2"
//! 3 > 2 && "yes" || "no"      → "yes"
//! 1; return 7; 9              → 7
//! throw "boom"                → ThrownError: boom
//! ```
//!
//! The value of the last expression statement is the result; `return`
//! stops evaluation early.

mod lexer;
mod parser;

use crate::executor::{ExecutionError, ExecutionRequest, Executor};
use async_trait::async_trait;
use parser::{BinaryOp, Expr, LogicalOp, Stmt, UnaryOp};
use serde_json::{Number, Value};
use std::fmt;
use thiserror::Error;
use tracing::trace;

/// Default upper bound on script length, in bytes.
pub const DEFAULT_MAX_SCRIPT_LEN: usize = 64 * 1024;

/// Largest integer an f64 represents exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptValue {
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
}

impl ScriptValue {
    fn truthy(&self) -> bool {
        match self {
            ScriptValue::Null => false,
            ScriptValue::Bool(b) => *b,
            ScriptValue::Number(n) => *n != 0.0 && !n.is_nan(),
            ScriptValue::Str(s) => !s.is_empty(),
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            ScriptValue::Null => "null",
            ScriptValue::Bool(_) => "boolean",
            ScriptValue::Number(_) => "number",
            ScriptValue::Str(_) => "string",
        }
    }

    /// Convert into a JSON value. Whole numbers become integers;
    /// non-finite numbers have no JSON form and become `null`.
    #[must_use]
    pub fn into_json(self) -> Value {
        match self {
            ScriptValue::Null => Value::Null,
            ScriptValue::Bool(b) => Value::Bool(b),
            ScriptValue::Str(s) => Value::String(s),
            ScriptValue::Number(n) => {
                if n.is_finite() && n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
                    Value::Number(Number::from(n as i64))
                } else {
                    Number::from_f64(n).map_or(Value::Null, Value::Number)
                }
            }
        }
    }
}

impl fmt::Display for ScriptValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptValue::Null => write!(f, "null"),
            ScriptValue::Bool(b) => write!(f, "{}", b),
            ScriptValue::Number(n) => write!(f, "{}", n),
            ScriptValue::Str(s) => write!(f, "{}", s),
        }
    }
}

/// Script failures. [`ScriptError::kind`] is the class name reported to the
/// caller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScriptError {
    #[error("{message} (at offset {offset})")]
    Syntax { offset: usize, message: String },

    #[error("{name} is not defined")]
    Reference { name: String, offset: usize },

    #[error("{message}")]
    Type { message: String, offset: usize },

    #[error("{message}")]
    Range { message: String, offset: usize },

    #[error("{0}")]
    Thrown(String),
}

impl ScriptError {
    pub(crate) fn syntax(offset: usize, message: impl Into<String>) -> Self {
        ScriptError::Syntax {
            offset,
            message: message.into(),
        }
    }

    /// Failure class name.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            ScriptError::Syntax { .. } => "SyntaxError",
            ScriptError::Reference { .. } => "ReferenceError",
            ScriptError::Type { .. } => "TypeError",
            ScriptError::Range { .. } => "RangeError",
            ScriptError::Thrown(_) => "ThrownError",
        }
    }

    fn offset(&self) -> Option<usize> {
        match self {
            ScriptError::Syntax { offset, .. }
            | ScriptError::Reference { offset, .. }
            | ScriptError::Type { offset, .. }
            | ScriptError::Range { offset, .. } => Some(*offset),
            ScriptError::Thrown(_) => None,
        }
    }

    /// Convert into an executor failure, pointing the detail at `script`.
    #[must_use]
    pub fn into_execution_error(self, script: &str) -> ExecutionError {
        let detail = match self.offset() {
            Some(offset) => format!("{} at offset {} in `{}`", self.kind(), offset, script),
            None => format!("{} in `{}`", self.kind(), script),
        };
        ExecutionError::new(self.kind(), self.to_string()).with_detail(detail)
    }
}

/// Evaluate `source` and return the resulting value.
pub fn evaluate(source: &str) -> Result<ScriptValue, ScriptError> {
    let tokens = lexer::tokenize(source)?;
    let program = parser::parse(tokens)?;

    let mut last = ScriptValue::Null;
    for stmt in &program {
        match stmt {
            Stmt::Expr(expr) => last = eval(expr)?,
            Stmt::Return(expr) => {
                return match expr {
                    Some(expr) => eval(expr),
                    None => Ok(ScriptValue::Null),
                }
            }
            Stmt::Throw(expr) => return Err(ScriptError::Thrown(eval(expr)?.to_string())),
        }
    }
    Ok(last)
}

fn eval(expr: &Expr) -> Result<ScriptValue, ScriptError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Ident { name, offset } => Err(ScriptError::Reference {
            name: name.clone(),
            offset: *offset,
        }),
        Expr::Unary {
            op,
            offset,
            operand,
        } => {
            let value = eval(operand)?;
            match (op, value) {
                (UnaryOp::Not, value) => Ok(ScriptValue::Bool(!value.truthy())),
                (UnaryOp::Neg, ScriptValue::Number(n)) => Ok(ScriptValue::Number(-n)),
                (UnaryOp::Neg, other) => Err(ScriptError::Type {
                    message: format!("cannot negate a {}", other.type_name()),
                    offset: *offset,
                }),
            }
        }
        Expr::Logical { op, lhs, rhs } => {
            let left = eval(lhs)?;
            match (op, left.truthy()) {
                (LogicalOp::And, false) | (LogicalOp::Or, true) => Ok(left),
                _ => eval(rhs),
            }
        }
        Expr::Binary {
            op,
            offset,
            lhs,
            rhs,
        } => binary(*op, *offset, eval(lhs)?, eval(rhs)?),
    }
}

fn binary(
    op: BinaryOp,
    offset: usize,
    left: ScriptValue,
    right: ScriptValue,
) -> Result<ScriptValue, ScriptError> {
    use ScriptValue::{Bool, Number, Str};

    let type_error = |left: &ScriptValue, right: &ScriptValue| ScriptError::Type {
        message: format!(
            "unsupported operand types for {:?}: {} and {}",
            op,
            left.type_name(),
            right.type_name()
        ),
        offset,
    };

    match op {
        BinaryOp::Eq => Ok(Bool(left == right)),
        BinaryOp::NotEq => Ok(Bool(left != right)),
        BinaryOp::Add => match (&left, &right) {
            (Number(a), Number(b)) => Ok(Number(a + b)),
            (Str(_), _) | (_, Str(_)) => Ok(Str(format!("{}{}", left, right))),
            _ => Err(type_error(&left, &right)),
        },
        BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
            let (Number(a), Number(b)) = (&left, &right) else {
                return Err(type_error(&left, &right));
            };
            if matches!(op, BinaryOp::Div | BinaryOp::Rem) && *b == 0.0 {
                return Err(ScriptError::Range {
                    message: "division by zero".to_string(),
                    offset,
                });
            }
            Ok(Number(match op {
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                BinaryOp::Div => a / b,
                _ => a % b,
            }))
        }
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ordering = match (&left, &right) {
                (Number(a), Number(b)) => a.partial_cmp(b),
                (Str(a), Str(b)) => Some(a.cmp(b)),
                _ => return Err(type_error(&left, &right)),
            };
            let Some(ordering) = ordering else {
                return Ok(Bool(false));
            };
            Ok(Bool(match op {
                BinaryOp::Lt => ordering.is_lt(),
                BinaryOp::Le => ordering.is_le(),
                BinaryOp::Gt => ordering.is_gt(),
                _ => ordering.is_ge(),
            }))
        }
    }
}

/// Executor that evaluates the request payload as a script.
#[derive(Debug, Clone)]
pub struct ScriptInterpreter {
    max_script_len: usize,
}

impl ScriptInterpreter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_script_len: DEFAULT_MAX_SCRIPT_LEN,
        }
    }

    #[must_use]
    pub fn with_max_script_len(max_script_len: usize) -> Self {
        Self { max_script_len }
    }

    /// Evaluate `script` into a JSON value.
    pub fn run(&self, script: &str) -> Result<Value, ExecutionError> {
        if script.len() > self.max_script_len {
            return Err(ScriptError::Range {
                message: format!(
                    "script is {} bytes, limit is {}",
                    script.len(),
                    self.max_script_len
                ),
                offset: self.max_script_len,
            }
            .into_execution_error("<truncated>"));
        }

        evaluate(script)
            .map(ScriptValue::into_json)
            .map_err(|e| e.into_execution_error(script))
    }
}

impl Default for ScriptInterpreter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Executor for ScriptInterpreter {
    async fn execute(&self, request: ExecutionRequest) -> Result<Value, ExecutionError> {
        trace!(
            name = %request.name,
            call_id = %request.call_id,
            len = request.payload.len(),
            "Evaluating script"
        );
        self.run(&request.payload)
    }
}
