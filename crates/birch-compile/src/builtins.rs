use crate::RuntimeError;
use crate::ir::CompareOp;
use crate::ops;
use crate::value::{Range, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Len,
    Abs,
    Min,
    Max,
    Range,
    List,
    Str,
    Int,
    Bool,
}

impl Builtin {
    pub const ALL: &'static [Builtin] = &[
        Builtin::Len,
        Builtin::Abs,
        Builtin::Min,
        Builtin::Max,
        Builtin::Range,
        Builtin::List,
        Builtin::Str,
        Builtin::Int,
        Builtin::Bool,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Len => "len",
            Builtin::Abs => "abs",
            Builtin::Min => "min",
            Builtin::Max => "max",
            Builtin::Range => "range",
            Builtin::List => "list",
            Builtin::Str => "str",
            Builtin::Int => "int",
            Builtin::Bool => "bool",
        }
    }

    pub fn lookup(name: &str) -> Option<Builtin> {
        Builtin::ALL.iter().copied().find(|builtin| builtin.name() == name)
    }

    pub fn call(self, args: &[Value]) -> Result<Value, RuntimeError> {
        match self {
            Builtin::Len => len(self.exactly_one(args)?),
            Builtin::Abs => abs(self.exactly_one(args)?),
            Builtin::Min => extreme(self, CompareOp::Lt, args),
            Builtin::Max => extreme(self, CompareOp::Gt, args),
            Builtin::Range => range(args),
            Builtin::List => match self.at_most(1, args)? {
                [] => Ok(Value::list(Vec::new())),
                [iterable, ..] => Ok(Value::list(iterable.to_vec()?)),
            },
            Builtin::Str => match self.at_most(1, args)? {
                [] => Ok(Value::str("")),
                [value, ..] => Ok(Value::str(&value.to_text()?)),
            },
            Builtin::Int => match self.at_most(2, args)? {
                [] => Ok(Value::Int(0)),
                [value] => int(value, None),
                [value, base, ..] => int(value, Some(base)),
            },
            Builtin::Bool => match self.at_most(1, args)? {
                [] => Ok(Value::Bool(false)),
                [value, ..] => Ok(Value::Bool(value.is_truthy())),
            },
        }
    }

    fn exactly_one(self, args: &[Value]) -> Result<&Value, RuntimeError> {
        match args {
            [arg] => Ok(arg),
            _ => Err(RuntimeError::Type(format!(
                "{}() takes exactly one argument ({} given)",
                self.name(),
                args.len()
            ))),
        }
    }

    fn at_most(self, max: usize, args: &[Value]) -> Result<&[Value], RuntimeError> {
        if args.len() > max {
            let plural = if max == 1 { "" } else { "s" };
            return Err(RuntimeError::Type(format!(
                "{} expected at most {max} argument{plural}, got {}",
                self.name(),
                args.len()
            )));
        }
        Ok(args)
    }
}

fn len(value: &Value) -> Result<Value, RuntimeError> {
    let len = match value {
        Value::Str(text) => text.chars().count(),
        Value::Bytes(bytes) => bytes.len(),
        Value::Tuple(items) => items.len(),
        Value::List(items) => items.borrow().len(),
        Value::Set(dict) | Value::Dict(dict) => dict.borrow().len(),
        Value::Range(range) => {
            return i64::try_from(range.len()).map(Value::Int).or(Err(RuntimeError::Overflow(
                "range length does not fit in 64 bits".to_owned(),
            )));
        }
        _ => {
            return Err(RuntimeError::Type(format!(
                "object of type '{}' has no len()",
                value.type_name()
            )));
        }
    };
    // Every container here is capped well below `i64::MAX` items.
    Ok(Value::Int(len as i64))
}

fn abs(value: &Value) -> Result<Value, RuntimeError> {
    match value {
        Value::Float(value) => Ok(Value::Float(value.abs())),
        _ => match value.as_int() {
            Some(value) => value.checked_abs().map(Value::Int).ok_or_else(|| {
                RuntimeError::Overflow("integer result does not fit in 64 bits".to_owned())
            }),
            None => Err(RuntimeError::Type(format!(
                "bad operand type for abs(): '{}'",
                value.type_name()
            ))),
        },
    }
}

/// `min` and `max`: over one iterable argument, or over the arguments.
fn extreme(builtin: Builtin, better: CompareOp, args: &[Value]) -> Result<Value, RuntimeError> {
    let candidates = match args {
        [] => {
            return Err(RuntimeError::Type(format!(
                "{} expected at least 1 argument, got 0",
                builtin.name()
            )));
        }
        [iterable] => iterable.to_vec()?,
        _ => args.to_vec(),
    };

    let mut candidates = candidates.into_iter();
    let Some(mut best) = candidates.next() else {
        return Err(RuntimeError::Value(format!("{}() arg is an empty sequence", builtin.name())));
    };
    for candidate in candidates {
        if ops::compare(better, &candidate, &best)? {
            best = candidate;
        }
    }
    Ok(best)
}

fn range(args: &[Value]) -> Result<Value, RuntimeError> {
    let integer = |value: &Value| {
        value.as_int().ok_or_else(|| {
            RuntimeError::Type(format!(
                "'{}' object cannot be interpreted as an integer",
                value.type_name()
            ))
        })
    };

    let (start, stop, step) = match args {
        [stop] => (0, integer(stop)?, 1),
        [start, stop] => (integer(start)?, integer(stop)?, 1),
        [start, stop, step] => (integer(start)?, integer(stop)?, integer(step)?),
        [] => {
            return Err(RuntimeError::Type("range expected at least 1 argument, got 0".to_owned()));
        }
        _ => {
            return Err(RuntimeError::Type(format!(
                "range expected at most 3 arguments, got {}",
                args.len()
            )));
        }
    };
    if step == 0 {
        return Err(RuntimeError::Value("range() arg 3 must not be zero".to_owned()));
    }
    Ok(Value::Range(Range { start, stop, step }))
}

fn int(value: &Value, base: Option<&Value>) -> Result<Value, RuntimeError> {
    if let Some(base) = base {
        let Value::Str(text) = value else {
            return Err(RuntimeError::Type(
                "int() can't convert non-string with explicit base".to_owned(),
            ));
        };
        let base = base
            .as_int()
            .filter(|&base| base == 0 || (2..=36).contains(&base))
            .ok_or_else(|| {
                RuntimeError::Value("int() base must be >= 2 and <= 36, or 0".to_owned())
            })?;
        return parse_int(text, base as u32);
    }

    match value {
        Value::Str(text) => parse_int(text, 10),
        Value::Float(value) => {
            if value.is_nan() {
                return Err(RuntimeError::Value("cannot convert float NaN to integer".to_owned()));
            }
            if value.is_infinite() {
                return Err(RuntimeError::Overflow(
                    "cannot convert float infinity to integer".to_owned(),
                ));
            }
            ops::integral(value.trunc()).map(Value::Int).ok_or_else(|| {
                RuntimeError::Overflow("integer result does not fit in 64 bits".to_owned())
            })
        }
        _ => match value.as_int() {
            Some(value) => Ok(Value::Int(value)),
            None => Err(RuntimeError::Type(format!(
                "int() argument must be a string or a real number, not '{}'",
                value.type_name()
            ))),
        },
    }
}

/// Parses `text` the way `int(text, base)` does; base 0 reads the prefix.
fn parse_int(text: &str, base: u32) -> Result<Value, RuntimeError> {
    let invalid = || {
        let repr = Value::str(text).repr().unwrap_or_default();
        RuntimeError::Value(format!("invalid literal for int() with base {base}: {repr}"))
    };

    let trimmed = text.trim();
    let (negative, unsigned) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let prefix = unsigned.get(..2).map(str::to_ascii_lowercase);
    let prefixed = match prefix.as_deref() {
        Some("0x") => Some(16),
        Some("0o") => Some(8),
        Some("0b") => Some(2),
        _ => None,
    };
    let (radix, digits) = match (base, prefixed) {
        (0, Some(radix)) => (radix, &unsigned[2..]),
        (0, None) => {
            if unsigned.len() > 1
                && unsigned.starts_with('0')
                && unsigned.bytes().any(|b| b != b'0' && b != b'_')
            {
                return Err(invalid());
            }
            (10, unsigned)
        }
        (base, Some(radix)) if base == radix => (radix, &unsigned[2..]),
        (base, _) => (base, unsigned),
    };
    let digits =
        digits.strip_prefix('_').filter(|_| digits.len() < unsigned.len()).unwrap_or(digits);

    if digits.is_empty()
        || digits.starts_with('_')
        || digits.ends_with('_')
        || digits.contains("__")
    {
        return Err(invalid());
    }

    let mut magnitude: i128 = 0;
    for c in digits.chars().filter(|&c| c != '_') {
        let digit = c.to_digit(radix).ok_or_else(invalid)?;
        magnitude = magnitude * i128::from(radix) + i128::from(digit);
        if magnitude > 1 << 63 {
            return Err(RuntimeError::Overflow("integer result does not fit in 64 bits".to_owned()));
        }
    }

    let value = if negative { -magnitude } else { magnitude };
    i64::try_from(value)
        .map(Value::Int)
        .or(Err(RuntimeError::Overflow("integer result does not fit in 64 bits".to_owned())))
}
