//! Tree-walking evaluation of lowered code.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::RuntimeError;
use crate::builtins::Builtin;
use crate::dict::Dict;
use crate::ir::{
    BinaryOp, Body, BoolOp, ComprehensionKind, Constant, Entry, Expr, ExprData, Generator, Stmt,
    Subscript, Target,
};
use crate::ops;
use crate::value::{MAX_SEQUENCE, Range, Value, too_long};

/// Global variables of a running module.
#[derive(Debug, Clone, Default)]
pub struct Namespace {
    names: FxHashMap<Box<str>, Value>,
}

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.names.get(name)
    }

    pub fn insert(&mut self, name: &str, value: Value) {
        self.names.insert(name.into(), value);
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.names.remove(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// The artifact of [`crate::Interpreter`].
#[derive(Debug, Clone, PartialEq)]
pub struct Code {
    body: Body,
}

impl Code {
    pub(crate) fn new(body: Body) -> Self {
        Self { body }
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn is_expression(&self) -> bool {
        matches!(self.body.entry, Entry::Expression(_))
    }

    /// Evaluates in a fresh namespace.
    pub fn eval(&self) -> Result<Value, RuntimeError> {
        self.eval_with(&mut Namespace::new())
    }

    /// The value of an expression, or `None` after running a module.
    pub fn eval_with(&self, namespace: &mut Namespace) -> Result<Value, RuntimeError> {
        let mut evaluator = Evaluator { body: &self.body, namespace, scopes: Vec::new() };
        let result = match &self.body.entry {
            Entry::Expression(expr) => evaluator.expr(*expr),
            Entry::Module(stmts) => evaluator.block(stmts).map(|_| Value::None),
        };
        if let Err(error) = &result {
            log::debug!("evaluation failed: {error}");
        }
        result
    }

    pub fn exec(&self, namespace: &mut Namespace) -> Result<(), RuntimeError> {
        self.eval_with(namespace).map(drop)
    }
}

enum Flow {
    Next,
    Break,
    Continue,
}

/// A subscript after its bounds have been evaluated.
enum Key {
    Index(Value),
    Slice(Option<i64>, Option<i64>, Option<i64>),
}

struct Evaluator<'a> {
    body: &'a Body,
    namespace: &'a mut Namespace,
    /// Comprehension variables, innermost last.
    scopes: Vec<FxHashMap<Box<str>, Value>>,
}

impl<'a> Evaluator<'a> {
    fn block(&mut self, stmts: &'a [Stmt]) -> Result<Flow, RuntimeError> {
        for stmt in stmts {
            match self.stmt(stmt)? {
                Flow::Next => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Next)
    }

    fn stmt(&mut self, stmt: &'a Stmt) -> Result<Flow, RuntimeError> {
        match stmt {
            Stmt::Expr(expr) => {
                self.expr(*expr)?;
            }
            Stmt::Assign { targets, value } => {
                let value = self.expr(*value)?;
                for target in targets {
                    self.assign(target, value.clone())?;
                }
            }
            Stmt::AugAssign { target, op, value } => self.augmented_assign(target, *op, *value)?,
            Stmt::Delete(targets) => {
                for target in targets {
                    self.delete(target)?;
                }
            }
            Stmt::Pass => {}
            Stmt::If { branches, orelse } => {
                for (test, body) in branches {
                    if self.expr(*test)?.is_truthy() {
                        return self.block(body);
                    }
                }
                return self.block(orelse);
            }
            Stmt::While { test, body, orelse } => {
                while self.expr(*test)?.is_truthy() {
                    if let Flow::Break = self.block(body)? {
                        return Ok(Flow::Next);
                    }
                }
                return self.block(orelse);
            }
            Stmt::For { target, iter, body, orelse } => {
                let iterable = self.expr(*iter)?;
                for item in iterable.iter()? {
                    self.assign(target, item)?;
                    if let Flow::Break = self.block(body)? {
                        return Ok(Flow::Next);
                    }
                }
                return self.block(orelse);
            }
            Stmt::Break => return Ok(Flow::Break),
            Stmt::Continue => return Ok(Flow::Continue),
            Stmt::Assert { test, message } => {
                if !self.expr(*test)?.is_truthy() {
                    let message = match message {
                        Some(message) => Some(self.expr(*message)?.to_text()?),
                        None => None,
                    };
                    return Err(RuntimeError::Assertion(message));
                }
            }
        }
        Ok(Flow::Next)
    }

    /// Evaluates `expr`. Prefix operators and conditional branches are peeled
    /// off in a loop, so long runs of them stay off the native stack.
    fn expr(&mut self, mut expr: Expr) -> Result<Value, RuntimeError> {
        let body = self.body;
        let mut prefix = Vec::new();
        loop {
            match &body.exprs[expr] {
                ExprData::Unary(op, operand) => {
                    prefix.push(*op);
                    expr = *operand;
                }
                ExprData::IfElse { test, body: then, orelse } => {
                    expr = if self.expr(*test)?.is_truthy() { *then } else { *orelse };
                }
                _ => break,
            }
        }

        let mut value = self.operand(expr)?;
        for op in prefix.into_iter().rev() {
            value = ops::unary(op, &value)?;
        }
        Ok(value)
    }

    fn operand(&mut self, expr: Expr) -> Result<Value, RuntimeError> {
        let body = self.body;
        match &body.exprs[expr] {
            ExprData::Const(constant) => Ok(match constant {
                Constant::None => Value::None,
                Constant::Bool(value) => Value::Bool(*value),
                Constant::Int(value) => Value::Int(*value),
                Constant::Float(value) => Value::Float(*value),
                Constant::Str(text) => Value::str(text),
                Constant::Bytes(bytes) => Value::Bytes(Rc::from(&**bytes)),
            }),
            ExprData::Name(name) => self.load(name),
            ExprData::Unary(..) | ExprData::IfElse { .. } => self.expr(expr),
            ExprData::Binary(..) => {
                // `a + b + c` nests to the left; walk down to `a`, then fold.
                let mut operations = Vec::new();
                let mut lhs = expr;
                while let ExprData::Binary(left, op, rhs) = &body.exprs[lhs] {
                    operations.push((*op, *rhs));
                    lhs = *left;
                }

                let mut value = self.expr(lhs)?;
                for (op, rhs) in operations.into_iter().rev() {
                    let rhs = self.expr(rhs)?;
                    value = ops::binary(op, &value, &rhs)?;
                }
                Ok(value)
            }
            ExprData::Compare(first, rest) => {
                let mut lhs = self.expr(*first)?;
                for &(op, rhs) in rest {
                    let rhs = self.expr(rhs)?;
                    if !ops::compare(op, &lhs, &rhs)? {
                        return Ok(Value::Bool(false));
                    }
                    lhs = rhs;
                }
                Ok(Value::Bool(true))
            }
            ExprData::Bool(op, operands) => {
                let mut value = Value::None;
                for &operand in operands {
                    value = self.expr(operand)?;
                    let decided = match op {
                        BoolOp::And => !value.is_truthy(),
                        BoolOp::Or => value.is_truthy(),
                    };
                    if decided {
                        break;
                    }
                }
                Ok(value)
            }
            ExprData::Tuple(items) => Ok(Value::tuple(self.exprs(items)?)),
            ExprData::List(items) => Ok(Value::list(self.exprs(items)?)),
            ExprData::Set(items) => {
                let mut members = Dict::new();
                for &item in items {
                    members.insert(self.expr(item)?, Value::None)?;
                }
                Ok(Value::set(members))
            }
            ExprData::Dict(entries) => {
                let mut dict = Dict::new();
                for &(key, value) in entries {
                    let key = self.expr(key)?;
                    let value = self.expr(value)?;
                    dict.insert(key, value)?;
                }
                Ok(Value::dict(dict))
            }
            ExprData::Comprehension { kind, element, value, generators } => {
                self.comprehension(*kind, *element, *value, generators)
            }
            ExprData::Subscript(container, subscript) => {
                let container = self.expr(*container)?;
                let key = self.key(subscript)?;
                get_item(&container, &key)
            }
            ExprData::Call(callee, args) => {
                let callee = self.expr(*callee)?;
                let args = self.exprs(args)?;
                match &callee {
                    Value::Builtin(builtin) => builtin.call(&args),
                    _ => Err(RuntimeError::Type(format!(
                        "'{}' object is not callable",
                        callee.type_name()
                    ))),
                }
            }
        }
    }

    fn exprs(&mut self, exprs: &[Expr]) -> Result<Vec<Value>, RuntimeError> {
        exprs.iter().map(|&expr| self.expr(expr)).collect()
    }

    fn load(&self, name: &str) -> Result<Value, RuntimeError> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name))
            .or_else(|| self.namespace.get(name))
            .cloned()
            .or_else(|| Builtin::lookup(name).map(Value::Builtin))
            .ok_or_else(|| RuntimeError::Name(name.to_owned()))
    }

    fn store(&mut self, name: &str, value: Value) {
        match self.scopes.last_mut() {
            Some(scope) => {
                scope.insert(name.into(), value);
            }
            None => self.namespace.insert(name, value),
        }
    }

    fn key(&mut self, subscript: &Subscript) -> Result<Key, RuntimeError> {
        match subscript {
            Subscript::Index(index) => Ok(Key::Index(self.expr(*index)?)),
            Subscript::Slice { lower, upper, step } => {
                let mut bound = |bound: &Option<Expr>| -> Result<Option<i64>, RuntimeError> {
                    let Some(bound) = bound else { return Ok(None) };
                    match self.expr(*bound)? {
                        Value::None => Ok(None),
                        value => value.as_int().map(Some).ok_or_else(|| {
                            RuntimeError::Type("slice indices must be integers or None".to_owned())
                        }),
                    }
                };
                Ok(Key::Slice(bound(lower)?, bound(upper)?, bound(step)?))
            }
        }
    }

    fn assign(&mut self, target: &Target, value: Value) -> Result<(), RuntimeError> {
        match target {
            Target::Name(name) => self.store(name, value),
            Target::Subscript(container, subscript) => {
                let container = self.expr(*container)?;
                let key = self.key(subscript)?;
                set_item(&container, key, value)?;
            }
            Target::Sequence(targets) => {
                let items = value.to_vec()?;
                if items.len() > targets.len() {
                    return Err(RuntimeError::Value(format!(
                        "too many values to unpack (expected {})",
                        targets.len()
                    )));
                }
                if items.len() < targets.len() {
                    return Err(RuntimeError::Value(format!(
                        "not enough values to unpack (expected {}, got {})",
                        targets.len(),
                        items.len()
                    )));
                }
                for (target, item) in targets.iter().zip(items) {
                    self.assign(target, item)?;
                }
            }
        }
        Ok(())
    }

    fn augmented_assign(
        &mut self,
        target: &Target,
        op: BinaryOp,
        value: Expr,
    ) -> Result<(), RuntimeError> {
        match target {
            Target::Name(name) => {
                let current = self.load(name)?;
                let rhs = self.expr(value)?;
                let result = augmented(op, current, &rhs)?;
                self.store(name, result);
            }
            Target::Subscript(container, subscript) => {
                let container = self.expr(*container)?;
                let key = self.key(subscript)?;
                let current = get_item(&container, &key)?;
                let rhs = self.expr(value)?;
                let result = augmented(op, current, &rhs)?;
                set_item(&container, key, result)?;
            }
            Target::Sequence(_) => {
                return Err(RuntimeError::Type(
                    "illegal expression for augmented assignment".to_owned(),
                ));
            }
        }
        Ok(())
    }

    fn delete(&mut self, target: &Target) -> Result<(), RuntimeError> {
        match target {
            Target::Name(name) => {
                self.namespace.remove(name).ok_or_else(|| RuntimeError::Name(name.to_string()))?;
            }
            Target::Subscript(container, subscript) => {
                let container = self.expr(*container)?;
                let key = self.key(subscript)?;
                delete_item(&container, key)?;
            }
            Target::Sequence(targets) => {
                for target in targets {
                    self.delete(target)?;
                }
            }
        }
        Ok(())
    }

    /// Runs every clause eagerly; the first iterable is evaluated outside the
    /// comprehension's own scope.
    fn comprehension(
        &mut self,
        kind: ComprehensionKind,
        element: Expr,
        value: Option<Expr>,
        generators: &'a [Generator],
    ) -> Result<Value, RuntimeError> {
        let Some(first) = generators.first() else {
            return Err(RuntimeError::Type("comprehension without a loop".to_owned()));
        };
        let iterable = self.expr(first.iter)?;

        let mut out = Collector { kind, element, value, items: Vec::new(), dict: Dict::new() };
        self.scopes.push(FxHashMap::default());
        let result = self.generate(generators, iterable, &mut out);
        self.scopes.pop();
        result?;

        Ok(match kind {
            ComprehensionKind::List => Value::list(out.items),
            ComprehensionKind::Set => Value::set(out.dict),
            ComprehensionKind::Dict => Value::dict(out.dict),
            ComprehensionKind::Generator => {
                Value::Generator(Rc::new(RefCell::new(out.items.into_iter())))
            }
        })
    }

    fn generate(
        &mut self,
        generators: &'a [Generator],
        iterable: Value,
        out: &mut Collector,
    ) -> Result<(), RuntimeError> {
        let Some((generator, rest)) = generators.split_first() else {
            return Ok(());
        };

        'items: for item in iterable.iter()? {
            self.assign(&generator.target, item)?;
            for &condition in &generator.conditions {
                if !self.expr(condition)?.is_truthy() {
                    continue 'items;
                }
            }

            match rest.first() {
                Some(next) => {
                    let iterable = self.expr(next.iter)?;
                    self.generate(rest, iterable, out)?;
                }
                None => self.collect(out)?,
            }
        }
        Ok(())
    }

    fn collect(&mut self, out: &mut Collector) -> Result<(), RuntimeError> {
        let element = self.expr(out.element)?;
        match out.kind {
            ComprehensionKind::List | ComprehensionKind::Generator => {
                if out.items.len() == MAX_SEQUENCE {
                    return Err(too_long());
                }
                out.items.push(element);
            }
            ComprehensionKind::Set => out.dict.insert(element, Value::None)?,
            ComprehensionKind::Dict => {
                let value = match out.value {
                    Some(value) => self.expr(value)?,
                    None => Value::None,
                };
                out.dict.insert(element, value)?;
            }
        }
        Ok(())
    }
}

struct Collector {
    kind: ComprehensionKind,
    element: Expr,
    value: Option<Expr>,
    items: Vec<Value>,
    dict: Dict,
}

/// `x op= y`: lists extend in place, everything else rebinds.
fn augmented(op: BinaryOp, current: Value, rhs: &Value) -> Result<Value, RuntimeError> {
    if let (BinaryOp::Add, Value::List(list)) = (op, &current) {
        let items = rhs.to_vec()?;
        let mut list = list.borrow_mut();
        if list.len().saturating_add(items.len()) > MAX_SEQUENCE {
            return Err(too_long());
        }
        list.extend(items);
        drop(list);
        return Ok(current);
    }
    ops::binary(op, &current, rhs)
}

/// Start, stop and step of a slice over `len` items, clamped the way
/// sequences clamp them.
fn slice_indices(
    len: usize,
    lower: Option<i64>,
    upper: Option<i64>,
    step: Option<i64>,
) -> Result<(i128, i128, i128), RuntimeError> {
    let len = len as i128;
    let step = i128::from(step.unwrap_or(1));
    if step == 0 {
        return Err(RuntimeError::Value("slice step cannot be zero".to_owned()));
    }

    let clamp = |index: i64| {
        let index = i128::from(index);
        if index < 0 {
            let index = index + len;
            if index < 0 { if step < 0 { -1 } else { 0 } } else { index }
        } else if index >= len {
            if step < 0 { len - 1 } else { len }
        } else {
            index
        }
    };

    let start = lower.map_or(if step < 0 { len - 1 } else { 0 }, clamp);
    let stop = upper.map_or(if step < 0 { -1 } else { len }, clamp);
    Ok((start, stop, step))
}

/// Positions a slice selects, in order.
fn slice_positions(
    len: usize,
    lower: Option<i64>,
    upper: Option<i64>,
    step: Option<i64>,
) -> Result<Vec<usize>, RuntimeError> {
    let (start, stop, step) = slice_indices(len, lower, upper, step)?;
    let count = if step > 0 && start < stop {
        (stop - start - 1) / step + 1
    } else if step < 0 && stop < start {
        (start - stop - 1) / -step + 1
    } else {
        0
    };
    Ok((0..count).map(|k| (start + k * step) as usize).collect())
}

/// Position of `index` in a sequence of `len` items, counting negative
/// indices from the end.
fn position(len: usize, index: &Value, type_name: &str) -> Result<Option<usize>, RuntimeError> {
    let Some(index) = index.as_int() else {
        return Err(RuntimeError::Type(format!(
            "{type_name} indices must be integers or slices, not {}",
            index.type_name()
        )));
    };
    let index = if index < 0 { i128::from(index) + len as i128 } else { i128::from(index) };
    Ok(usize::try_from(index).ok().filter(|&index| index < len))
}

fn out_of_range(what: &str) -> RuntimeError {
    RuntimeError::Index(format!("{what} index out of range"))
}

fn get_item(container: &Value, key: &Key) -> Result<Value, RuntimeError> {
    match (container, key) {
        (Value::Dict(dict), Key::Index(key)) => match dict.borrow().get(key)? {
            Some(value) => Ok(value.clone()),
            None => Err(RuntimeError::Key(key.repr()?)),
        },
        (Value::Dict(_), Key::Slice(..)) => {
            Err(RuntimeError::Type("unhashable type: 'slice'".to_owned()))
        }
        (Value::List(list), Key::Index(index)) => {
            let list = list.borrow();
            let position =
                position(list.len(), index, "list")?.ok_or_else(|| out_of_range("list"))?;
            Ok(list[position].clone())
        }
        (Value::List(list), &Key::Slice(lower, upper, step)) => {
            let list = list.borrow();
            let positions = slice_positions(list.len(), lower, upper, step)?;
            Ok(Value::list(positions.into_iter().map(|position| list[position].clone()).collect()))
        }
        (Value::Tuple(items), Key::Index(index)) => {
            let position =
                position(items.len(), index, "tuple")?.ok_or_else(|| out_of_range("tuple"))?;
            Ok(items[position].clone())
        }
        (Value::Tuple(items), &Key::Slice(lower, upper, step)) => {
            let positions = slice_positions(items.len(), lower, upper, step)?;
            let items = positions.into_iter().map(|position| items[position].clone()).collect();
            Ok(Value::tuple(items))
        }
        (Value::Str(text), key) => {
            let chars: Vec<char> = text.chars().collect();
            match key {
                Key::Index(index) => {
                    let position =
                        position(chars.len(), index, "string")?
                            .ok_or_else(|| out_of_range("string"))?;
                    Ok(Value::str(chars[position].encode_utf8(&mut [0; 4])))
                }
                &Key::Slice(lower, upper, step) => {
                    let positions = slice_positions(chars.len(), lower, upper, step)?;
                    let text: String =
                        positions.into_iter().map(|position| chars[position]).collect();
                    Ok(Value::str(&text))
                }
            }
        }
        (Value::Bytes(bytes), Key::Index(index)) => {
            let position =
                position(bytes.len(), index, "byte")?.ok_or_else(|| out_of_range("byte"))?;
            Ok(Value::Int(i64::from(bytes[position])))
        }
        (Value::Bytes(bytes), &Key::Slice(lower, upper, step)) => {
            let positions = slice_positions(bytes.len(), lower, upper, step)?;
            Ok(Value::Bytes(positions.into_iter().map(|position| bytes[position]).collect()))
        }
        (Value::Range(range), Key::Index(index)) => {
            let len = usize::try_from(range.len()).unwrap_or(usize::MAX);
            let position =
                position(len, index, "range")?.ok_or_else(|| out_of_range("range object"))?;
            Ok(Value::Int(range.get(position as u64)))
        }
        (Value::Range(range), &Key::Slice(lower, upper, step)) => {
            slice_range(range, lower, upper, step)
        }
        _ => Err(RuntimeError::Type(format!(
            "'{}' object is not subscriptable",
            container.type_name()
        ))),
    }
}

fn slice_range(
    range: &Range,
    lower: Option<i64>,
    upper: Option<i64>,
    step: Option<i64>,
) -> Result<Value, RuntimeError> {
    let len = usize::try_from(range.len()).unwrap_or(usize::MAX);
    let (start, stop, step) = slice_indices(len, lower, upper, step)?;
    let at = |index: i128| i128::from(range.start) + index * i128::from(range.step);
    let fit = |value: i128| {
        i64::try_from(value)
            .map_err(|_| RuntimeError::Overflow("range bound does not fit in 64 bits".to_owned()))
    };
    Ok(Value::Range(Range {
        start: fit(at(start))?,
        stop: fit(at(stop))?,
        step: fit(step * i128::from(range.step))?,
    }))
}

fn set_item(container: &Value, key: Key, value: Value) -> Result<(), RuntimeError> {
    match (container, key) {
        (Value::Dict(dict), Key::Index(key)) => dict.borrow_mut().insert(key, value),
        (Value::List(list), Key::Index(index)) => {
            let mut list = list.borrow_mut();
            let position = position(list.len(), &index, "list")?
                .ok_or_else(|| out_of_range("list assignment"))?;
            list[position] = value;
            Ok(())
        }
        (Value::List(list), Key::Slice(lower, upper, step)) => {
            let items = value.to_vec()?;
            let mut list = list.borrow_mut();
            if step.unwrap_or(1) == 1 {
                let (start, stop, _) = slice_indices(list.len(), lower, upper, None)?;
                let start = start as usize;
                let stop = (stop as usize).max(start);
                if list.len() - (stop - start) + items.len() > MAX_SEQUENCE {
                    return Err(too_long());
                }
                let tail = list.split_off(stop);
                list.truncate(start);
                list.extend(items);
                list.extend(tail);
                return Ok(());
            }

            let positions = slice_positions(list.len(), lower, upper, step)?;
            if positions.len() != items.len() {
                return Err(RuntimeError::Value(format!(
                    "attempt to assign sequence of size {} to extended slice of size {}",
                    items.len(),
                    positions.len()
                )));
            }
            for (position, item) in positions.into_iter().zip(items) {
                list[position] = item;
            }
            Ok(())
        }
        _ => Err(RuntimeError::Type(format!(
            "'{}' object does not support item assignment",
            container.type_name()
        ))),
    }
}

fn delete_item(container: &Value, key: Key) -> Result<(), RuntimeError> {
    match (container, key) {
        (Value::Dict(dict), Key::Index(key)) => {
            let removed = dict.borrow_mut().remove(&key)?;
            match removed {
                Some(_) => Ok(()),
                None => Err(RuntimeError::Key(key.repr()?)),
            }
        }
        (Value::List(list), Key::Index(index)) => {
            let mut list = list.borrow_mut();
            let position = position(list.len(), &index, "list")?
                .ok_or_else(|| out_of_range("list assignment"))?;
            list.remove(position);
            Ok(())
        }
        (Value::List(list), Key::Slice(lower, upper, step)) => {
            let mut list = list.borrow_mut();
            let mut positions = slice_positions(list.len(), lower, upper, step)?;
            positions.sort_unstable();
            let mut index = 0;
            list.retain(|_| {
                let keep = positions.binary_search(&index).is_err();
                index += 1;
                keep
            });
            Ok(())
        }
        _ => Err(RuntimeError::Type(format!(
            "'{}' object does not support item deletion",
            container.type_name()
        ))),
    }
}
