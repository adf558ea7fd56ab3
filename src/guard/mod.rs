//! Guard expressions: boolean preconditions over the actor state.
//!
//! Guards gate transitions that only exist some of the time, e.g. a troop
//! camp that is only clickable while troops are available:
//!
//! ```
//! use screenpilot::actor::ActorState;
//! use screenpilot::guard::{ExpressionEvaluator, GuardEvaluator};
//!
//! let mut state = ActorState::default();
//! state.set_fact("troops.infantry.state.isAvailable", true);
//!
//! let evaluator = GuardEvaluator::new();
//! assert!(evaluator.evaluate("troops.infantry.state.isAvailable", &state).unwrap());
//! ```
//!
//! Paths address the camelCase JSON form of [`ActorState`]. A path that does
//! not exist is an error, never an implicit `false`.

mod functions;
mod parser;

pub use parser::{BinaryOp, Expr, parse};

use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::actor::ActorState;
use crate::errors::GuardError;

/// Evaluates guard expressions against an actor state.
pub trait ExpressionEvaluator: Send + Sync {
    fn evaluate(&self, expr: &str, state: &ActorState) -> Result<bool, GuardError>;
}

/// Built-in evaluator with a parse cache.
#[derive(Debug, Default)]
pub struct GuardEvaluator {
    cache: Mutex<HashMap<String, Arc<Expr>>>,
}

impl GuardEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    fn compile(&self, expr: &str) -> Result<Arc<Expr>, GuardError> {
        if let Ok(cache) = self.cache.lock()
            && let Some(ast) = cache.get(expr)
        {
            return Ok(Arc::clone(ast));
        }

        let ast = Arc::new(parse(expr)?);
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(expr.to_string(), Arc::clone(&ast));
        }
        Ok(ast)
    }

    /// Parse without evaluating, to validate registry guards up front.
    pub fn check(&self, expr: &str) -> Result<(), GuardError> {
        self.compile(expr).map(|_| ())
    }
}

impl ExpressionEvaluator for GuardEvaluator {
    fn evaluate(&self, expr: &str, state: &ActorState) -> Result<bool, GuardError> {
        let ast = self.compile(expr)?;
        let root = state.to_value();
        let eval = Evaluation { expr, root: &root };
        match eval.value(&ast)? {
            Value::Bool(b) => Ok(b),
            other => Err(GuardError::NotBoolean {
                expr: expr.to_string(),
                found: other.to_string(),
            }),
        }
    }
}

struct Evaluation<'a> {
    expr: &'a str,
    root: &'a Value,
}

impl Evaluation<'_> {
    fn type_error(&self, message: impl Into<String>) -> GuardError {
        GuardError::Type {
            expr: self.expr.to_string(),
            message: message.into(),
        }
    }

    fn boolean(&self, ast: &Expr) -> Result<bool, GuardError> {
        match self.value(ast)? {
            Value::Bool(b) => Ok(b),
            other => Err(self.type_error(format!("expected a boolean operand, got {}", other))),
        }
    }

    fn value(&self, ast: &Expr) -> Result<Value, GuardError> {
        match ast {
            Expr::Literal(v) => Ok(v.clone()),
            Expr::Path(segments) => self.lookup(segments),
            Expr::Not(inner) => Ok(Value::Bool(!self.boolean(inner)?)),
            Expr::Neg(inner) => match self.value(inner)? {
                Value::Number(n) => {
                    if let Some(i) = n.as_i64() {
                        Ok(Value::from(-i))
                    } else {
                        Ok(Value::from(-n.as_f64().unwrap_or(0.0)))
                    }
                }
                other => Err(self.type_error(format!("cannot negate {}", other))),
            },
            Expr::And(lhs, rhs) => Ok(Value::Bool(self.boolean(lhs)? && self.boolean(rhs)?)),
            Expr::Or(lhs, rhs) => Ok(Value::Bool(self.boolean(lhs)? || self.boolean(rhs)?)),
            Expr::Compare(op, lhs, rhs) => {
                let lhs = self.value(lhs)?;
                let rhs = self.value(rhs)?;
                self.compare(*op, &lhs, &rhs).map(Value::Bool)
            }
            Expr::Call(name, args) => {
                let func = functions::builtin(name).ok_or_else(|| GuardError::UnknownFunction {
                    expr: self.expr.to_string(),
                    name: name.clone(),
                })?;
                let args = args
                    .iter()
                    .map(|arg| self.value(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                func(&args).map_err(|message| self.type_error(message))
            }
        }
    }

    fn lookup(&self, segments: &[String]) -> Result<Value, GuardError> {
        let mut current = self.root;
        for segment in segments {
            current = current.get(segment.as_str()).ok_or_else(|| GuardError::MissingField {
                expr: self.expr.to_string(),
                path: segments.join("."),
            })?;
        }
        Ok(current.clone())
    }

    fn compare(&self, op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<bool, GuardError> {
        let ordering = match (lhs, rhs) {
            (Value::Number(a), Value::Number(b)) => {
                let (a, b) = (a.as_f64().unwrap_or(f64::NAN), b.as_f64().unwrap_or(f64::NAN));
                a.partial_cmp(&b)
            }
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        };

        match op {
            BinaryOp::Eq => Ok(ordering.map_or(lhs == rhs, |o| o == Ordering::Equal)),
            BinaryOp::Ne => Ok(ordering.map_or(lhs != rhs, |o| o != Ordering::Equal)),
            _ => {
                let ordering = ordering.ok_or_else(|| {
                    self.type_error(format!("cannot compare {} {} {}", lhs, op.as_str(), rhs))
                })?;
                Ok(match op {
                    BinaryOp::Lt => ordering == Ordering::Less,
                    BinaryOp::Le => ordering != Ordering::Greater,
                    BinaryOp::Gt => ordering == Ordering::Greater,
                    _ => ordering != Ordering::Less,
                })
            }
        }
    }
}
