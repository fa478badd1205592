//! Operators over runtime values.

use std::cmp::Ordering;
use std::rc::Rc;

use crate::RuntimeError;
use crate::dict::Dict;
use crate::ir::{BinaryOp, CompareOp, UnaryOp};
use crate::value::{MAX_SEQUENCE, RECURSION_LIMIT, Value, too_long};

#[derive(Clone, Copy)]
enum Number {
    Int(i64),
    Float(f64),
}

fn number(value: &Value) -> Option<Number> {
    match *value {
        Value::Bool(value) => Some(Number::Int(i64::from(value))),
        Value::Int(value) => Some(Number::Int(value)),
        Value::Float(value) => Some(Number::Float(value)),
        _ => None,
    }
}

/// The integer a float is exactly equal to, when there is one.
pub(crate) fn integral(value: f64) -> Option<i64> {
    // 2^63 is exactly representable; everything in [-2^63, 2^63) converts losslessly.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    (value.fract() == 0.0 && (-LIMIT..LIMIT).contains(&value)).then_some(value as i64)
}

fn compare_numbers(a: Number, b: Number) -> Option<Ordering> {
    match (a, b) {
        (Number::Int(a), Number::Int(b)) => Some(a.cmp(&b)),
        (Number::Float(a), Number::Float(b)) => a.partial_cmp(&b),
        (Number::Int(a), Number::Float(b)) => compare_int_float(a, b),
        (Number::Float(a), Number::Int(b)) => compare_int_float(b, a).map(Ordering::reverse),
    }
}

/// Exact comparison, without rounding `a` to the nearest float.
fn compare_int_float(a: i64, b: f64) -> Option<Ordering> {
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if b.is_nan() {
        return None;
    }
    if b >= LIMIT {
        return Some(Ordering::Less);
    }
    if b < -LIMIT {
        return Some(Ordering::Greater);
    }

    let whole = b.trunc();
    match a.cmp(&(whole as i64)) {
        Ordering::Equal => 0.0.partial_cmp(&(b - whole)),
        ordering => Some(ordering),
    }
}

/// `a == b`.
pub fn equal(a: &Value, b: &Value) -> Result<bool, RuntimeError> {
    equal_at(a, b, 0)
}

/// Identity first, as containers do when comparing their items.
fn same_or_equal(a: &Value, b: &Value, depth: usize) -> Result<bool, RuntimeError> {
    Ok(identical(a, b) || equal_at(a, b, depth)?)
}

fn equal_at(a: &Value, b: &Value, depth: usize) -> Result<bool, RuntimeError> {
    if depth > RECURSION_LIMIT {
        return Err(RuntimeError::Recursion("in comparison"));
    }

    if let (Some(a), Some(b)) = (number(a), number(b)) {
        return Ok(compare_numbers(a, b) == Some(Ordering::Equal));
    }

    Ok(match (a, b) {
        (Value::None, Value::None) => true,
        (Value::Str(a), Value::Str(b)) => a == b,
        (Value::Bytes(a), Value::Bytes(b)) => a == b,
        (Value::Tuple(a), Value::Tuple(b)) => {
            Rc::ptr_eq(a, b) || sequences_equal(a, b, depth)?
        }
        (Value::List(a), Value::List(b)) => {
            Rc::ptr_eq(a, b) || sequences_equal(&a.borrow(), &b.borrow(), depth)?
        }
        (Value::Dict(a), Value::Dict(b)) => {
            if Rc::ptr_eq(a, b) {
                return Ok(true);
            }
            let (a, b) = (a.borrow(), b.borrow());
            if a.len() != b.len() {
                return Ok(false);
            }
            for (key, value) in a.iter() {
                match b.get(key)? {
                    Some(other) if same_or_equal(value, other, depth + 1)? => {}
                    _ => return Ok(false),
                }
            }
            true
        }
        (Value::Set(a), Value::Set(b)) => {
            Rc::ptr_eq(a, b) || {
                let (a, b) = (a.borrow(), b.borrow());
                a.len() == b.len() && is_subset(&a, &b)?
            }
        }
        (Value::Range(a), Value::Range(b)) => {
            let len = a.len();
            len == b.len()
                && (len == 0 || a.start == b.start)
                && (len <= 1 || a.step == b.step)
        }
        (Value::Builtin(a), Value::Builtin(b)) => a == b,
        (Value::Generator(a), Value::Generator(b)) => Rc::ptr_eq(a, b),
        _ => false,
    })
}

fn sequences_equal(a: &[Value], b: &[Value], depth: usize) -> Result<bool, RuntimeError> {
    if a.len() != b.len() {
        return Ok(false);
    }
    for (a, b) in a.iter().zip(b) {
        if !same_or_equal(a, b, depth + 1)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn is_subset(a: &Dict, b: &Dict) -> Result<bool, RuntimeError> {
    for key in a.keys() {
        if !b.contains(key)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// `a is b`: same object for containers, same value for scalars.
pub fn identical(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::None, Value::None) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Int(a), Value::Int(b)) => a == b,
        (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
        (Value::Str(a), Value::Str(b)) => Rc::ptr_eq(a, b),
        (Value::Bytes(a), Value::Bytes(b)) => Rc::ptr_eq(a, b),
        (Value::Tuple(a), Value::Tuple(b)) => Rc::ptr_eq(a, b) || (a.is_empty() && b.is_empty()),
        (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b),
        (Value::Set(a), Value::Set(b)) | (Value::Dict(a), Value::Dict(b)) => Rc::ptr_eq(a, b),
        (Value::Range(a), Value::Range(b)) => a == b,
        (Value::Builtin(a), Value::Builtin(b)) => a == b,
        (Value::Generator(a), Value::Generator(b)) => Rc::ptr_eq(a, b),
        _ => false,
    }
}

pub fn compare(op: CompareOp, a: &Value, b: &Value) -> Result<bool, RuntimeError> {
    match op {
        CompareOp::Eq => equal(a, b),
        CompareOp::NotEq => Ok(!equal(a, b)?),
        CompareOp::In => contains(b, a),
        CompareOp::NotIn => Ok(!contains(b, a)?),
        CompareOp::Is => Ok(identical(a, b)),
        CompareOp::IsNot => Ok(!identical(a, b)),
        CompareOp::Lt | CompareOp::Gt | CompareOp::LtE | CompareOp::GtE => order(op, a, b, 0),
    }
}

fn order(op: CompareOp, a: &Value, b: &Value, depth: usize) -> Result<bool, RuntimeError> {
    if depth > RECURSION_LIMIT {
        return Err(RuntimeError::Recursion("in comparison"));
    }

    let ordering = match (a, b) {
        (Value::Str(x), Value::Str(y)) => Some(x.cmp(y)),
        (Value::Bytes(x), Value::Bytes(y)) => Some(x.cmp(y)),
        (Value::Tuple(x), Value::Tuple(y)) => return order_sequences(op, x, y, depth),
        (Value::List(x), Value::List(y)) => {
            let (x, y) = (x.borrow().clone(), y.borrow().clone());
            return order_sequences(op, &x, &y, depth);
        }
        (Value::Set(x), Value::Set(y)) => {
            let (x, y) = (x.borrow(), y.borrow());
            return match op {
                CompareOp::LtE => is_subset(&x, &y),
                CompareOp::GtE => is_subset(&y, &x),
                CompareOp::Lt => Ok(x.len() < y.len() && is_subset(&x, &y)?),
                _ => Ok(y.len() < x.len() && is_subset(&y, &x)?),
            };
        }
        _ => match (number(a), number(b)) {
            (Some(x), Some(y)) => compare_numbers(x, y),
            _ => {
                return Err(RuntimeError::Type(format!(
                    "'{}' not supported between instances of '{}' and '{}'",
                    compare_symbol(op),
                    a.type_name(),
                    b.type_name()
                )));
            }
        },
    };

    // NaN is unordered: every ordering test is false.
    Ok(ordering.is_some_and(|ordering| match op {
        CompareOp::Lt => ordering.is_lt(),
        CompareOp::Gt => ordering.is_gt(),
        CompareOp::LtE => ordering.is_le(),
        _ => ordering.is_ge(),
    }))
}

/// Orders by the first differing item, then by length.
fn order_sequences(
    op: CompareOp,
    a: &[Value],
    b: &[Value],
    depth: usize,
) -> Result<bool, RuntimeError> {
    for (x, y) in a.iter().zip(b) {
        if !same_or_equal(x, y, depth + 1)? {
            return order(op, x, y, depth + 1);
        }
    }
    let ordering = a.len().cmp(&b.len());
    Ok(match op {
        CompareOp::Lt => ordering.is_lt(),
        CompareOp::Gt => ordering.is_gt(),
        CompareOp::LtE => ordering.is_le(),
        _ => ordering.is_ge(),
    })
}

fn compare_symbol(op: CompareOp) -> &'static str {
    match op {
        CompareOp::Lt => "<",
        CompareOp::Gt => ">",
        CompareOp::LtE => "<=",
        _ => ">=",
    }
}

/// `item in container`.
pub(crate) fn contains(container: &Value, item: &Value) -> Result<bool, RuntimeError> {
    match container {
        Value::Str(text) => match item {
            Value::Str(needle) => Ok(text.contains(&**needle)),
            _ => Err(RuntimeError::Type(format!(
                "'in <string>' requires string as left operand, not {}",
                item.type_name()
            ))),
        },
        Value::Bytes(bytes) => match item {
            Value::Bytes(needle) => {
                Ok(needle.is_empty()
                    || bytes.windows(needle.len()).any(|window| window == &**needle))
            }
            _ => match item.as_int() {
                Some(byte) => match u8::try_from(byte) {
                    Ok(byte) => Ok(bytes.contains(&byte)),
                    Err(_) => Err(RuntimeError::Value("byte must be in range(0, 256)".to_owned())),
                },
                None => Err(RuntimeError::Type(format!(
                    "a bytes-like object is required, not '{}'",
                    item.type_name()
                ))),
            },
        },
        Value::Set(dict) | Value::Dict(dict) => dict.borrow().contains(item),
        Value::Range(range) => Ok(match item {
            Value::Float(value) => integral(*value).is_some_and(|value| range.contains(value)),
            _ => item.as_int().is_some_and(|value| range.contains(value)),
        }),
        Value::Tuple(_) | Value::List(_) | Value::Generator(_) => {
            for candidate in container.iter()? {
                if same_or_equal(&candidate, item, 0)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        _ => Err(RuntimeError::Type(format!(
            "argument of type '{}' is not iterable",
            container.type_name()
        ))),
    }
}

pub(crate) fn unary(op: UnaryOp, operand: &Value) -> Result<Value, RuntimeError> {
    let unsupported = |symbol: &str| {
        RuntimeError::Type(format!(
            "bad operand type for unary {symbol}: '{}'",
            operand.type_name()
        ))
    };

    match op {
        UnaryOp::Not => Ok(Value::Bool(!operand.is_truthy())),
        UnaryOp::Plus => match number(operand) {
            Some(Number::Int(value)) => Ok(Value::Int(value)),
            Some(Number::Float(value)) => Ok(Value::Float(value)),
            None => Err(unsupported("+")),
        },
        UnaryOp::Minus => match number(operand) {
            Some(Number::Int(value)) => value.checked_neg().map(Value::Int).ok_or_else(overflow),
            Some(Number::Float(value)) => Ok(Value::Float(-value)),
            None => Err(unsupported("-")),
        },
        UnaryOp::Invert => match operand.as_int() {
            Some(value) => Ok(Value::Int(!value)),
            None => Err(unsupported("~")),
        },
    }
}

fn overflow() -> RuntimeError {
    RuntimeError::Overflow("integer result does not fit in 64 bits".to_owned())
}

pub(crate) fn binary(op: BinaryOp, a: &Value, b: &Value) -> Result<Value, RuntimeError> {
    if let (Some(x), Some(y)) = (number(a), number(b)) {
        if let Some(result) = arithmetic(op, x, y, a, b)? {
            return Ok(result);
        }
    }

    let result = match (op, a, b) {
        (BinaryOp::Add, Value::Str(x), Value::Str(y)) => {
            check_len(x.len().saturating_add(y.len()))?;
            Some(Value::str(&format!("{x}{y}")))
        }
        (BinaryOp::Add, Value::Bytes(x), Value::Bytes(y)) => {
            check_len(x.len().saturating_add(y.len()))?;
            Some(Value::Bytes(x.iter().chain(y.iter()).copied().collect()))
        }
        (BinaryOp::Add, Value::Tuple(x), Value::Tuple(y)) => {
            check_len(x.len().saturating_add(y.len()))?;
            Some(Value::Tuple(x.iter().chain(y.iter()).cloned().collect()))
        }
        (BinaryOp::Add, Value::List(x), Value::List(y)) => {
            let mut items = x.borrow().clone();
            check_len(items.len().saturating_add(y.borrow().len()))?;
            items.extend(y.borrow().iter().cloned());
            Some(Value::list(items))
        }
        (BinaryOp::Mul, sequence, count) | (BinaryOp::Mul, count, sequence)
            if count.as_int().is_some() && is_sequence(sequence) =>
        {
            Some(repeat(sequence, count.as_int().unwrap_or_default())?)
        }
        (
            BinaryOp::BitOr | BinaryOp::BitAnd | BinaryOp::BitXor | BinaryOp::Sub,
            Value::Set(x),
            Value::Set(y),
        ) => {
            Some(set_operation(op, &x.borrow(), &y.borrow())?)
        }
        _ => None,
    };

    result.ok_or_else(|| {
        RuntimeError::Type(format!(
            "unsupported operand type(s) for {}: '{}' and '{}'",
            op.symbol(),
            a.type_name(),
            b.type_name()
        ))
    })
}

fn is_sequence(value: &Value) -> bool {
    matches!(value, Value::Str(_) | Value::Bytes(_) | Value::Tuple(_) | Value::List(_))
}

fn check_len(len: usize) -> Result<(), RuntimeError> {
    if len > MAX_SEQUENCE { Err(too_long()) } else { Ok(()) }
}

fn repeat(sequence: &Value, count: i64) -> Result<Value, RuntimeError> {
    let count = usize::try_from(count).unwrap_or(0);
    let len = match sequence {
        Value::Str(text) => text.len(),
        Value::Bytes(bytes) => bytes.len(),
        Value::Tuple(items) => items.len(),
        Value::List(items) => items.borrow().len(),
        _ => 0,
    };
    check_len(len.checked_mul(count).ok_or_else(too_long)?)?;

    Ok(match sequence {
        Value::Str(text) => Value::str(&text.repeat(count)),
        Value::Bytes(bytes) => Value::Bytes(bytes.repeat(count).into()),
        Value::Tuple(items) => Value::Tuple(repeat_items(items, count).collect()),
        Value::List(items) => Value::list(repeat_items(&items.borrow(), count).collect()),
        _ => Value::None,
    })
}

fn repeat_items(items: &[Value], count: usize) -> impl Iterator<Item = Value> + '_ {
    (0..count).flat_map(move |_| items.iter().cloned())
}

fn set_operation(op: BinaryOp, x: &Dict, y: &Dict) -> Result<Value, RuntimeError> {
    let mut result = Dict::new();
    match op {
        BinaryOp::BitOr => {
            for key in x.keys().chain(y.keys()) {
                result.insert(key.clone(), Value::None)?;
            }
        }
        BinaryOp::BitAnd => {
            for key in x.keys() {
                if y.contains(key)? {
                    result.insert(key.clone(), Value::None)?;
                }
            }
        }
        BinaryOp::Sub => {
            for key in x.keys() {
                if !y.contains(key)? {
                    result.insert(key.clone(), Value::None)?;
                }
            }
        }
        _ => {
            for (from, other) in [(x, y), (y, x)] {
                for key in from.keys() {
                    if !other.contains(key)? {
                        result.insert(key.clone(), Value::None)?;
                    }
                }
            }
        }
    }
    Ok(Value::set(result))
}

/// Numeric operators; `None` when the operator does not apply to numbers.
fn arithmetic(
    op: BinaryOp,
    x: Number,
    y: Number,
    a: &Value,
    b: &Value,
) -> Result<Option<Value>, RuntimeError> {
    if let (Value::Bool(a), Value::Bool(b)) = (a, b) {
        match op {
            BinaryOp::BitAnd => return Ok(Some(Value::Bool(a & b))),
            BinaryOp::BitOr => return Ok(Some(Value::Bool(a | b))),
            BinaryOp::BitXor => return Ok(Some(Value::Bool(a ^ b))),
            _ => {}
        }
    }

    let value = match (x, y) {
        (Number::Int(x), Number::Int(y)) => int_arithmetic(op, x, y)?,
        (Number::Float(x), Number::Float(y)) => float_arithmetic(op, x, y)?,
        (Number::Int(x), Number::Float(y)) => float_arithmetic(op, x as f64, y)?,
        (Number::Float(x), Number::Int(y)) => float_arithmetic(op, x, y as f64)?,
    };
    Ok(value)
}

fn int_arithmetic(op: BinaryOp, x: i64, y: i64) -> Result<Option<Value>, RuntimeError> {
    let int = |value: Option<i64>| value.map(|value| Some(Value::Int(value))).ok_or_else(overflow);
    let by_zero = || RuntimeError::ZeroDivision("integer division or modulo by zero");

    match op {
        BinaryOp::Add => int(x.checked_add(y)),
        BinaryOp::Sub => int(x.checked_sub(y)),
        BinaryOp::Mul => int(x.checked_mul(y)),
        BinaryOp::Div => {
            if y == 0 {
                return Err(RuntimeError::ZeroDivision("division by zero"));
            }
            Ok(Some(Value::Float(x as f64 / y as f64)))
        }
        BinaryOp::FloorDiv => {
            if y == 0 {
                return Err(by_zero());
            }
            let quotient = x.checked_div(y).ok_or_else(overflow)?;
            let floored = if x % y != 0 && (x < 0) != (y < 0) { quotient - 1 } else { quotient };
            Ok(Some(Value::Int(floored)))
        }
        BinaryOp::Mod => {
            if y == 0 {
                return Err(by_zero());
            }
            let remainder = x.wrapping_rem(y);
            let wraps = remainder != 0 && (remainder < 0) != (y < 0);
            let floored = if wraps { remainder + y } else { remainder };
            Ok(Some(Value::Int(floored)))
        }
        BinaryOp::Pow => {
            if y < 0 {
                if x == 0 {
                    return Err(RuntimeError::ZeroDivision(
                        "0.0 cannot be raised to a negative power",
                    ));
                }
                return Ok(Some(Value::Float((x as f64).powf(y as f64))));
            }
            let value = match (x, y) {
                (_, 0) => Some(1),
                (0 | 1, _) => Some(x),
                (-1, _) => Some(if y % 2 == 0 { 1 } else { -1 }),
                _ => u32::try_from(y).ok().and_then(|y| x.checked_pow(y)),
            };
            int(value)
        }
        BinaryOp::LShift | BinaryOp::RShift => {
            if y < 0 {
                return Err(RuntimeError::Value("negative shift count".to_owned()));
            }
            if op == BinaryOp::RShift {
                let shifted = if y >= 64 { if x < 0 { -1 } else { 0 } } else { x >> y };
                return Ok(Some(Value::Int(shifted)));
            }
            if x == 0 {
                return Ok(Some(Value::Int(0)));
            }
            if y >= 64 {
                return Err(overflow());
            }
            let shifted = x << y;
            if shifted >> y != x {
                return Err(overflow());
            }
            Ok(Some(Value::Int(shifted)))
        }
        BinaryOp::BitOr => Ok(Some(Value::Int(x | y))),
        BinaryOp::BitXor => Ok(Some(Value::Int(x ^ y))),
        BinaryOp::BitAnd => Ok(Some(Value::Int(x & y))),
    }
}

fn float_arithmetic(op: BinaryOp, x: f64, y: f64) -> Result<Option<Value>, RuntimeError> {
    let value = match op {
        BinaryOp::Add => x + y,
        BinaryOp::Sub => x - y,
        BinaryOp::Mul => x * y,
        BinaryOp::Div => {
            if y == 0.0 {
                return Err(RuntimeError::ZeroDivision("float division by zero"));
            }
            x / y
        }
        BinaryOp::FloorDiv => {
            if y == 0.0 {
                return Err(RuntimeError::ZeroDivision("float floor division by zero"));
            }
            float_divmod(x, y).0
        }
        BinaryOp::Mod => {
            if y == 0.0 {
                return Err(RuntimeError::ZeroDivision("float modulo"));
            }
            float_divmod(x, y).1
        }
        BinaryOp::Pow => {
            if x == 0.0 && y < 0.0 {
                return Err(RuntimeError::ZeroDivision("0.0 cannot be raised to a negative power"));
            }
            if x < 0.0 && y.fract() != 0.0 && y.is_finite() {
                return Err(RuntimeError::Value(
                    "negative number cannot be raised to a fractional power".to_owned(),
                ));
            }
            x.powf(y)
        }
        _ => return Ok(None),
    };
    Ok(Some(Value::Float(value)))
}

/// Floor quotient and remainder; the remainder takes the sign of `y`.
fn float_divmod(x: f64, y: f64) -> (f64, f64) {
    let mut remainder = x % y;
    let mut quotient = (x - remainder) / y;
    if remainder != 0.0 {
        if (y < 0.0) != (remainder < 0.0) {
            remainder += y;
            quotient -= 1.0;
        }
    } else {
        remainder = 0.0f64.copysign(y);
    }

    let floored = if quotient != 0.0 {
        let floor = quotient.floor();
        if quotient - floor > 0.5 { floor + 1.0 } else { floor }
    } else {
        0.0f64.copysign(x / y)
    };
    (floored, remainder)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(value: i64) -> Value {
        Value::Int(value)
    }

    fn float(value: f64) -> Value {
        Value::Float(value)
    }

    fn op(op: BinaryOp, a: Value, b: Value) -> Value {
        binary(op, &a, &b).unwrap()
    }

    fn op_error(op: BinaryOp, a: Value, b: Value) -> String {
        binary(op, &a, &b).unwrap_err().to_string()
    }

    #[test]
    fn floor_semantics() {
        assert_eq!(op(BinaryOp::FloorDiv, int(7), int(2)), int(3));
        assert_eq!(op(BinaryOp::FloorDiv, int(-7), int(2)), int(-4));
        assert_eq!(op(BinaryOp::Mod, int(-7), int(2)), int(1));
        assert_eq!(op(BinaryOp::Mod, int(7), int(-2)), int(-1));
        assert_eq!(op(BinaryOp::Mod, int(i64::MIN), int(-1)), int(0));
        assert_eq!(op(BinaryOp::FloorDiv, float(-7.0), int(2)), float(-4.0));
        assert_eq!(op(BinaryOp::Mod, float(-7.5), int(2)), float(0.5));
        assert_eq!(op(BinaryOp::Div, int(1), int(4)), float(0.25));
    }

    #[test]
    fn arithmetic_errors() {
        assert_eq!(
            op_error(BinaryOp::FloorDiv, int(1), int(0)),
            "ZeroDivisionError: integer division or modulo by zero"
        );
        assert_eq!(op_error(BinaryOp::Div, int(1), int(0)), "ZeroDivisionError: division by zero");
        assert_eq!(
            op_error(BinaryOp::Div, float(1.0), float(0.0)),
            "ZeroDivisionError: float division by zero"
        );
        assert_eq!(
            op_error(BinaryOp::Add, int(i64::MAX), int(1)),
            "OverflowError: integer result does not fit in 64 bits"
        );
        assert_eq!(
            op_error(BinaryOp::Add, int(1), Value::str("a")),
            "TypeError: unsupported operand type(s) for +: 'int' and 'str'"
        );
        assert_eq!(op_error(BinaryOp::LShift, int(1), int(-1)), "ValueError: negative shift count");
        assert_eq!(
            op_error(BinaryOp::Mul, Value::str("ab"), int(1 << 40)),
            "OverflowError: sequence is too long"
        );
    }

    #[test]
    fn powers_and_shifts() {
        assert_eq!(op(BinaryOp::Pow, int(2), int(10)), int(1024));
        assert_eq!(op(BinaryOp::Pow, int(2), int(-1)), float(0.5));
        assert_eq!(op(BinaryOp::Pow, int(-1), int(1 << 40)), int(1));
        assert_eq!(op(BinaryOp::Pow, int(0), int(0)), int(1));
        assert_eq!(op(BinaryOp::LShift, int(3), int(4)), int(48));
        assert_eq!(op(BinaryOp::RShift, int(-9), int(100)), int(-1));
        assert!(binary(BinaryOp::LShift, &int(1), &int(62)).is_ok());
        assert!(binary(BinaryOp::LShift, &int(1), &int(63)).is_err());
        assert_eq!(op(BinaryOp::LShift, int(-1), int(63)), int(i64::MIN));
    }

    #[test]
    fn bools_and_sequences() {
        assert_eq!(op(BinaryOp::Add, Value::Bool(true), Value::Bool(true)), int(2));
        assert!(matches!(
            op(BinaryOp::BitAnd, Value::Bool(true), Value::Bool(false)),
            Value::Bool(false)
        ));
        assert_eq!(op(BinaryOp::Mul, int(2), Value::str("ab")), Value::str("abab"));
        assert_eq!(op(BinaryOp::Mul, Value::tuple(vec![int(1)]), int(-3)), Value::tuple(vec![]));
        assert_eq!(
            op(BinaryOp::Add, Value::list(vec![int(1)]), Value::list(vec![int(2)])),
            Value::list(vec![int(1), int(2)])
        );
    }

    #[test]
    fn mixed_number_comparison() {
        let big = (1i64 << 53) + 1;
        assert!(!equal(&int(big), &float((1i64 << 53) as f64)).unwrap());
        assert!(equal(&int(3), &float(3.0)).unwrap());
        assert!(equal(&Value::Bool(true), &int(1)).unwrap());
        assert!(compare(CompareOp::Lt, &int(2), &float(2.5)).unwrap());
        assert!(compare(CompareOp::Gt, &int(-2), &float(-2.5)).unwrap());
        assert!(!compare(CompareOp::Lt, &float(f64::NAN), &int(1)).unwrap());
        assert!(!compare(CompareOp::GtE, &float(f64::NAN), &int(1)).unwrap());
    }

    #[test]
    fn sequence_comparison() {
        let a = Value::tuple(vec![int(1), int(2)]);
        let b = Value::tuple(vec![int(1), int(3)]);
        assert!(compare(CompareOp::Lt, &a, &b).unwrap());
        assert!(compare(CompareOp::Lt, &Value::tuple(vec![int(1)]), &a).unwrap());
        assert!(compare(CompareOp::GtE, &Value::str("b"), &Value::str("abc")).unwrap());
        assert_eq!(
            compare(CompareOp::Lt, &int(1), &Value::str("a")).unwrap_err().to_string(),
            "TypeError: '<' not supported between instances of 'int' and 'str'"
        );
    }

    #[test]
    fn membership() {
        let list = Value::list(vec![int(1), Value::str("x")]);
        assert!(contains(&list, &float(1.0)).unwrap());
        assert!(!contains(&list, &int(2)).unwrap());
        assert!(contains(&Value::str("hello"), &Value::str("ell")).unwrap());
        assert!(contains(&Value::Bytes(Rc::from(&b"abc"[..])), &int(98)).unwrap());
        assert_eq!(
            contains(&int(3), &int(3)).unwrap_err().to_string(),
            "TypeError: argument of type 'int' is not iterable"
        );
    }

    #[test]
    fn unary_operators() {
        assert_eq!(unary(UnaryOp::Minus, &int(3)).unwrap(), int(-3));
        assert_eq!(unary(UnaryOp::Invert, &int(5)).unwrap(), int(-6));
        assert_eq!(unary(UnaryOp::Plus, &Value::Bool(true)).unwrap().type_name(), "int");
        assert!(unary(UnaryOp::Minus, &int(i64::MIN)).is_err());
        assert_eq!(
            unary(UnaryOp::Minus, &Value::str("a")).unwrap_err().to_string(),
            "TypeError: bad operand type for unary -: 'str'"
        );
    }
}
