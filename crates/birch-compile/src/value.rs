//! Runtime values.
//!
//! Scalars are stored inline. Strings, bytes and tuples are shared immutable
//! slices; lists, dicts and sets are shared mutable cells, so assignment
//! aliases them the way the language expects.

use std::cell::RefCell;
use std::fmt::{self, Write as _};
use std::rc::Rc;

use crate::RuntimeError;
use crate::builtins::Builtin;
use crate::dict::Dict;

/// Bound on nesting for recursive operations over values (printing,
/// comparison and hashing).
pub(crate) const RECURSION_LIMIT: usize = 1000;

/// Longest sequence a single operation may build.
pub(crate) const MAX_SEQUENCE: usize = 1 << 24;

#[derive(Clone)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    Bytes(Rc<[u8]>),
    Tuple(Rc<[Value]>),
    List(Rc<RefCell<Vec<Value>>>),
    /// Members are the keys; every value is `None`.
    Set(Rc<RefCell<Dict>>),
    Dict(Rc<RefCell<Dict>>),
    Range(Range),
    Builtin(Builtin),
    /// An already evaluated generator expression, consumed once.
    Generator(Rc<RefCell<std::vec::IntoIter<Value>>>),
}

impl Value {
    pub fn str(text: &str) -> Self {
        Value::Str(Rc::from(text))
    }

    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub fn tuple(items: Vec<Value>) -> Self {
        Value::Tuple(Rc::from(items))
    }

    pub fn set(members: Dict) -> Self {
        Value::Set(Rc::new(RefCell::new(members)))
    }

    pub fn dict(entries: Dict) -> Self {
        Value::Dict(Rc::new(RefCell::new(entries)))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Bytes(_) => "bytes",
            Value::Tuple(_) => "tuple",
            Value::List(_) => "list",
            Value::Set(_) => "set",
            Value::Dict(_) => "dict",
            Value::Range(_) => "range",
            Value::Builtin(_) => "builtin_function_or_method",
            Value::Generator(_) => "generator",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(value) => *value,
            Value::Int(value) => *value != 0,
            Value::Float(value) => *value != 0.0,
            Value::Str(text) => !text.is_empty(),
            Value::Bytes(bytes) => !bytes.is_empty(),
            Value::Tuple(items) => !items.is_empty(),
            Value::List(items) => !items.borrow().is_empty(),
            Value::Set(dict) | Value::Dict(dict) => !dict.borrow().is_empty(),
            Value::Range(range) => range.len() != 0,
            Value::Builtin(_) | Value::Generator(_) => true,
        }
    }

    /// The integer value of ints and bools.
    pub fn as_int(&self) -> Option<i64> {
        match *self {
            Value::Bool(value) => Some(i64::from(value)),
            Value::Int(value) => Some(value),
            _ => None,
        }
    }

    /// `repr()` of the value.
    pub fn repr(&self) -> Result<String, RuntimeError> {
        let mut printer = Printer::default();
        printer.value(self, 0)?;
        Ok(printer.out)
    }

    /// `str()` of the value: strings print bare, everything else as its repr.
    pub fn to_text(&self) -> Result<String, RuntimeError> {
        match self {
            Value::Str(text) => Ok(text.to_string()),
            _ => self.repr(),
        }
    }

    /// Iterates the value the way a `for` loop does.
    pub fn iter(&self) -> Result<ValueIter, RuntimeError> {
        Ok(match self {
            Value::Str(text) => ValueIter::Items(
                text.chars()
                    .map(|c| Value::str(c.encode_utf8(&mut [0; 4])))
                    .collect::<Vec<_>>()
                    .into_iter(),
            ),
            Value::Bytes(bytes) => ValueIter::Items(
                bytes
                    .iter()
                    .map(|&byte| Value::Int(i64::from(byte)))
                    .collect::<Vec<_>>()
                    .into_iter(),
            ),
            Value::Tuple(items) => ValueIter::Items(items.to_vec().into_iter()),
            Value::List(list) => ValueIter::List { list: Rc::clone(list), index: 0 },
            Value::Set(dict) | Value::Dict(dict) => {
                ValueIter::Items(dict.borrow().keys().cloned().collect::<Vec<_>>().into_iter())
            }
            Value::Range(range) => ValueIter::Range { range: *range, index: 0 },
            Value::Generator(generator) => ValueIter::Generator(Rc::clone(generator)),
            _ => {
                return Err(RuntimeError::Type(format!(
                    "'{}' object is not iterable",
                    self.type_name()
                )));
            }
        })
    }

    /// Collects every item, refusing to build more than [`MAX_SEQUENCE`].
    pub fn to_vec(&self) -> Result<Vec<Value>, RuntimeError> {
        if let Value::Range(range) = self {
            if range.len() > MAX_SEQUENCE as u64 {
                return Err(too_long());
            }
        }

        let mut items = Vec::new();
        for item in self.iter()? {
            if items.len() == MAX_SEQUENCE {
                return Err(too_long());
            }
            items.push(item);
        }
        Ok(items)
    }
}

pub(crate) fn too_long() -> RuntimeError {
    RuntimeError::Overflow("sequence is too long".to_owned())
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.repr() {
            Ok(text) => f.write_str(&text),
            Err(_) => f.write_str("<...>"),
        }
    }
}

/// Equality as `==` sees it; `1 == 1.0 == True`.
impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        crate::ops::equal(self, other).unwrap_or(false)
    }
}

impl Drop for Value {
    fn drop(&mut self) {
        let mut stack = Vec::new();
        self.take_children(&mut stack);
        while let Some(mut value) = stack.pop() {
            value.take_children(&mut stack);
        }
    }
}

impl Value {
    /// Moves out the children of a container this value is the last owner of,
    /// so that dropping long chains never recurses.
    fn take_children(&mut self, stack: &mut Vec<Value>) {
        match self {
            Value::Tuple(items) => {
                if let Some(items) = Rc::get_mut(items) {
                    stack.extend(items.iter_mut().map(|item| std::mem::replace(item, Value::None)));
                }
            }
            Value::List(list) => {
                if let Some(list) = Rc::get_mut(list) {
                    stack.append(list.get_mut());
                }
            }
            Value::Set(dict) | Value::Dict(dict) => {
                if let Some(dict) = Rc::get_mut(dict) {
                    dict.get_mut().drain_into(stack);
                }
            }
            Value::Generator(generator) => {
                if let Some(generator) = Rc::get_mut(generator) {
                    stack.extend(generator.get_mut());
                }
            }
            _ => {}
        }
    }
}

/// `range(start, stop, step)`; `step` is never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub start: i64,
    pub stop: i64,
    pub step: i64,
}

impl Range {
    pub fn len(&self) -> u64 {
        let (start, stop, step) =
            (i128::from(self.start), i128::from(self.stop), i128::from(self.step));
        let len = if step > 0 && start < stop {
            (stop - start - 1) / step + 1
        } else if step < 0 && start > stop {
            (start - stop - 1) / -step + 1
        } else {
            0
        };
        len as u64
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The item at `index`, which must be below [`Range::len`].
    pub fn get(&self, index: u64) -> i64 {
        (i128::from(self.start) + i128::from(index) * i128::from(self.step)) as i64
    }

    pub fn contains(&self, value: i64) -> bool {
        let offset = i128::from(value) - i128::from(self.start);
        let in_bounds = if self.step > 0 {
            value >= self.start && value < self.stop
        } else {
            value <= self.start && value > self.stop
        };
        in_bounds && offset % i128::from(self.step) == 0
    }
}

pub enum ValueIter {
    Items(std::vec::IntoIter<Value>),
    List { list: Rc<RefCell<Vec<Value>>>, index: usize },
    Range { range: Range, index: u64 },
    Generator(Rc<RefCell<std::vec::IntoIter<Value>>>),
}

impl Iterator for ValueIter {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        match self {
            ValueIter::Items(items) => items.next(),
            // Reads through the cell on every step, so growth during the loop is seen.
            ValueIter::List { list, index } => {
                let item = list.borrow().get(*index).cloned()?;
                *index += 1;
                Some(item)
            }
            ValueIter::Range { range, index } => {
                if *index >= range.len() {
                    return None;
                }
                let item = range.get(*index);
                *index += 1;
                Some(Value::Int(item))
            }
            ValueIter::Generator(generator) => generator.borrow_mut().next(),
        }
    }
}

#[derive(Default)]
struct Printer {
    out: String,
    active: Vec<*const ()>,
}

impl Printer {
    fn value(&mut self, value: &Value, depth: usize) -> Result<(), RuntimeError> {
        if depth > RECURSION_LIMIT {
            return Err(RuntimeError::Recursion("while getting the repr of an object"));
        }

        match value {
            Value::None => self.out.push_str("None"),
            Value::Bool(true) => self.out.push_str("True"),
            Value::Bool(false) => self.out.push_str("False"),
            Value::Int(value) => {
                let _ = write!(self.out, "{value}");
            }
            Value::Float(value) => self.out.push_str(&float_repr(*value)),
            Value::Str(text) => string_repr(&mut self.out, text),
            Value::Bytes(bytes) => bytes_repr(&mut self.out, bytes),
            Value::Tuple(items) => {
                self.out.push('(');
                self.items(items, depth)?;
                if items.len() == 1 {
                    self.out.push(',');
                }
                self.out.push(')');
            }
            Value::List(list) => {
                let id = Rc::as_ptr(list).cast::<()>();
                if self.active.contains(&id) {
                    self.out.push_str("[...]");
                    return Ok(());
                }
                self.active.push(id);
                self.out.push('[');
                self.items(&list.borrow(), depth)?;
                self.out.push(']');
                self.active.pop();
            }
            Value::Set(dict) => {
                let dict = dict.borrow();
                if dict.is_empty() {
                    self.out.push_str("set()");
                    return Ok(());
                }
                self.out.push('{');
                for (index, key) in dict.keys().enumerate() {
                    if index > 0 {
                        self.out.push_str(", ");
                    }
                    self.value(key, depth + 1)?;
                }
                self.out.push('}');
            }
            Value::Dict(dict) => {
                let id = Rc::as_ptr(dict).cast::<()>();
                if self.active.contains(&id) {
                    self.out.push_str("{...}");
                    return Ok(());
                }
                self.active.push(id);
                self.out.push('{');
                for (index, (key, value)) in dict.borrow().iter().enumerate() {
                    if index > 0 {
                        self.out.push_str(", ");
                    }
                    self.value(key, depth + 1)?;
                    self.out.push_str(": ");
                    self.value(value, depth + 1)?;
                }
                self.out.push('}');
                self.active.pop();
            }
            Value::Range(Range { start, stop, step: 1 }) => {
                let _ = write!(self.out, "range({start}, {stop})");
            }
            Value::Range(Range { start, stop, step }) => {
                let _ = write!(self.out, "range({start}, {stop}, {step})");
            }
            Value::Builtin(builtin) => {
                let _ = write!(self.out, "<built-in function {}>", builtin.name());
            }
            Value::Generator(_) => self.out.push_str("<generator object <genexpr>>"),
        }
        Ok(())
    }

    fn items(&mut self, items: &[Value], depth: usize) -> Result<(), RuntimeError> {
        for (index, item) in items.iter().enumerate() {
            if index > 0 {
                self.out.push_str(", ");
            }
            self.value(item, depth + 1)?;
        }
        Ok(())
    }
}

/// Shortest round-tripping form, in exponent notation outside `1e-4..1e16`.
pub(crate) fn float_repr(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_owned();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_owned();
    }

    let magnitude = value.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        let text = format!("{value:e}");
        let (mantissa, exponent) = text.split_once('e').unwrap_or((&text, "0"));
        let (sign, digits) = match exponent.strip_prefix('-') {
            Some(digits) => ('-', digits),
            None => ('+', exponent),
        };
        return format!("{mantissa}e{sign}{digits:0>2}");
    }

    format!("{value:?}")
}

fn string_repr(out: &mut String, text: &str) {
    let quote = if text.contains('\'') && !text.contains('"') { '"' } else { '\'' };
    out.push(quote);
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if u32::from(c) < 0x20 || c == '\x7f' => {
                let _ = write!(out, "\\x{:02x}", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out.push(quote);
}

fn bytes_repr(out: &mut String, bytes: &[u8]) {
    let quote = if bytes.contains(&b'\'') && !bytes.contains(&b'"') { b'"' } else { b'\'' };
    out.push('b');
    out.push(char::from(quote));
    for &byte in bytes {
        match byte {
            b'\\' => out.push_str("\\\\"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            byte if byte == quote => {
                out.push('\\');
                out.push(char::from(byte));
            }
            0x20..0x7f => out.push(char::from(byte)),
            byte => {
                let _ = write!(out, "\\x{byte:02x}");
            }
        }
    }
    out.push(char::from(quote));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reprs() {
        let repr = |value: Value| value.repr().unwrap();
        assert_eq!(repr(Value::None), "None");
        assert_eq!(repr(Value::Bool(true)), "True");
        assert_eq!(repr(Value::Int(-3)), "-3");
        assert_eq!(repr(Value::str("it's")), "\"it's\"");
        assert_eq!(repr(Value::str("a\nb'\"")), "'a\\nb\\'\"'");
        assert_eq!(repr(Value::Bytes(Rc::from(&b"a\x00'"[..]))), "b\"a\\x00'\"");
        assert_eq!(repr(Value::tuple(vec![Value::Int(1)])), "(1,)");
        assert_eq!(repr(Value::tuple(vec![])), "()");
        assert_eq!(repr(Value::list(vec![Value::Int(1), Value::str("x")])), "[1, 'x']");
        assert_eq!(repr(Value::Range(Range { start: 0, stop: 3, step: 1 })), "range(0, 3)");
        assert_eq!(repr(Value::Range(Range { start: 9, stop: 0, step: -3 })), "range(9, 0, -3)");
    }

    #[test]
    fn floats() {
        assert_eq!(float_repr(1.0), "1.0");
        assert_eq!(float_repr(0.1), "0.1");
        assert_eq!(float_repr(-2.5), "-2.5");
        assert_eq!(float_repr(1e16), "1e+16");
        assert_eq!(float_repr(1.5e-5), "1.5e-05");
        assert_eq!(float_repr(123456789.0), "123456789.0");
        assert_eq!(float_repr(f64::INFINITY), "inf");
        assert_eq!(float_repr(f64::NAN), "nan");
        assert_eq!(float_repr(0.0), "0.0");
    }

    #[test]
    fn self_referencing_list() {
        let list = Value::list(vec![Value::Int(1)]);
        if let Value::List(cell) = &list {
            cell.borrow_mut().push(list.clone());
        }
        assert_eq!(list.repr().unwrap(), "[1, [...]]");
        if let Value::List(cell) = &list {
            cell.borrow_mut().clear();
        }
    }

    #[test]
    fn ranges() {
        let range = Range { start: 10, stop: 0, step: -3 };
        assert_eq!(range.len(), 4);
        assert_eq!(range.get(3), 1);
        assert!(range.contains(4));
        assert!(!range.contains(5));
        assert!(!range.contains(0));
        assert_eq!(Range { start: 0, stop: 0, step: 1 }.len(), 0);
        assert_eq!(Range { start: i64::MIN, stop: i64::MAX, step: 1 }.len(), u64::MAX);
    }

    #[test]
    fn deep_values_drop() {
        let mut value = Value::None;
        for _ in 0..200_000 {
            value = Value::list(vec![value]);
        }
        drop(value);

        let mut value = Value::None;
        for _ in 0..200_000 {
            value = Value::tuple(vec![value]);
        }
        assert!(value.repr().is_err());
    }

    #[test]
    fn iteration() {
        let items: Vec<_> = Value::str("ab").iter().unwrap().collect();
        assert_eq!(items, [Value::str("a"), Value::str("b")]);
        let range = Value::Range(Range { start: 0, stop: 5, step: 2 });
        let items: Vec<_> = range.iter().unwrap().collect();
        assert_eq!(items, [Value::Int(0), Value::Int(2), Value::Int(4)]);
        assert_eq!(
            Value::Int(1).iter().err().unwrap().to_string(),
            "TypeError: 'int' object is not iterable"
        );
    }
}
