//! Helper functions callable from guards.

use serde_json::Value;

use crate::fuzzy::compare_text;

/// `compareText(needle, haystack)`: containment or one-edit fuzzy match.
/// Non-string arguments never match.
pub fn compare_text_fn(args: &[Value]) -> Result<Value, String> {
    match args {
        [Value::String(needle), Value::String(haystack)] => {
            Ok(Value::Bool(compare_text(needle, haystack)))
        }
        [_, _] => Ok(Value::Bool(false)),
        _ => Err(format!("compareText expects 2 arguments, got {}", args.len())),
    }
}

/// `isMin(x, ...)`: true when the first number is strictly below every other.
pub fn is_min(args: &[Value]) -> Result<Value, String> {
    Ok(Value::Bool(extremum(args, |first, other| first < other)))
}

/// `isMax(x, ...)`: true when the first number is strictly above every other.
pub fn is_max(args: &[Value]) -> Result<Value, String> {
    Ok(Value::Bool(extremum(args, |first, other| first > other)))
}

fn extremum(args: &[Value], wins: impl Fn(f64, f64) -> bool) -> bool {
    let Some((first, rest)) = args.split_first() else {
        return false;
    };
    if rest.is_empty() {
        return false;
    }
    let Some(first) = first.as_f64() else {
        return false;
    };
    rest.iter()
        .all(|v| v.as_f64().is_some_and(|other| wins(first, other)))
}

/// `lower(s)`.
pub fn lower(args: &[Value]) -> Result<Value, String> {
    match args {
        [Value::String(s)] => Ok(Value::String(s.to_lowercase())),
        [other] => Err(format!("lower expects a string, got {}", other)),
        _ => Err(format!("lower expects 1 argument, got {}", args.len())),
    }
}

pub type Builtin = fn(&[Value]) -> Result<Value, String>;

/// Look up a builtin by name.
pub fn builtin(name: &str) -> Option<Builtin> {
    let func: Builtin = match name {
        "compareText" => compare_text_fn,
        "isMin" => is_min,
        "isMax" => is_max,
        "lower" => lower,
        _ => return None,
    };
    Some(func)
}
