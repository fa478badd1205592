//! Conversion between trees and flat values.

use birch_grammar::{Config, TreeKind, ValidationError, Violation};
use birch_syntax::{Node, Position, Symbol, WalkEvent};

use crate::{FlatValue, Tree};

/// Why a flat value could not even be read as a tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Malformed {
    #[error("expected a record")]
    NotARecord,
    #[error("record has no symbol")]
    EmptyRecord,
    #[error("record does not start with an integer symbol")]
    SymbolNotInt,
    #[error("{0} is not a symbol code")]
    UnknownSymbol(i64),
    #[error("terminal record has {0} fields, expected 2 or 4")]
    TerminalArity(usize),
    #[error("terminal text is not a string")]
    TextNotString,
    #[error("invalid position fields")]
    Position,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed tree: {0}")]
    MalformedInput(#[from] Malformed),
    #[error("invalid tree: {0}")]
    GrammarViolation(#[from] Violation),
    #[error("tree is nested deeper than {limit} levels")]
    ResourceExhausted { limit: usize },
}

impl DecodeError {
    /// Malformed shapes and grammar violations both mean "not a tree"; running
    /// out of depth budget does not.
    pub fn is_invalid_tree(&self) -> bool {
        !matches!(self, DecodeError::ResourceExhausted { .. })
    }
}

impl From<ValidationError> for DecodeError {
    fn from(error: ValidationError) -> Self {
        match error {
            ValidationError::Violation(violation) => DecodeError::GrammarViolation(violation),
            ValidationError::TooDeep { limit } => DecodeError::ResourceExhausted { limit },
        }
    }
}

/// Flattens `tree`. Terminals carry their line and column when
/// `include_position` is set and they have a position.
pub fn encode(tree: &Tree, include_position: bool) -> FlatValue {
    let mut stack: Vec<Vec<FlatValue>> = Vec::new();

    for event in tree.root().preorder() {
        let finished = match event {
            WalkEvent::Enter(node) if node.is_terminal() => terminal_record(node, include_position),
            WalkEvent::Enter(node) => {
                let mut fields = Vec::with_capacity(node.children().len() + 1);
                fields.push(symbol_field(node.symbol()));
                stack.push(fields);
                continue;
            }
            WalkEvent::Leave(node) if node.is_terminal() => continue,
            WalkEvent::Leave(_) => match stack.pop() {
                Some(fields) => FlatValue::Record(fields),
                None => break,
            },
        };

        match stack.last_mut() {
            Some(parent) => parent.push(finished),
            None => return finished,
        }
    }

    FlatValue::Record(Vec::new())
}

fn symbol_field(symbol: Symbol) -> FlatValue {
    FlatValue::Int(i64::from(symbol.raw()))
}

fn terminal_record(node: &Node, include_position: bool) -> FlatValue {
    let text = FlatValue::from(node.text().unwrap_or_default());
    match node.position().filter(|_| include_position) {
        Some(Position { line, column }) => FlatValue::Record(vec![
            symbol_field(node.symbol()),
            text,
            FlatValue::Int(i64::from(line)),
            FlatValue::Int(i64::from(column)),
        ]),
        None => FlatValue::Record(vec![symbol_field(node.symbol()), text]),
    }
}

pub fn decode(value: &FlatValue, kind: TreeKind) -> Result<Tree, DecodeError> {
    decode_with_config(value, kind, &Config::default())
}

/// Rebuilds a tree from an untrusted flat value.
///
/// The value is first read into nodes with an explicit work stack, failing with
/// [`DecodeError::ResourceExhausted`] as soon as it nests deeper than
/// `config.max_depth`; the result is then checked against the grammar.
pub fn decode_with_config(
    value: &FlatValue,
    kind: TreeKind,
    config: &Config,
) -> Result<Tree, DecodeError> {
    logged(
        read_tree(value, config.max_depth)
            .and_then(|root| Tree::new(root, kind, config).map_err(DecodeError::from)),
    )
}

/// Like [`decode`], taking the kind from the root symbol.
pub fn decode_any(value: &FlatValue) -> Result<Tree, DecodeError> {
    decode_any_with_config(value, &Config::default())
}

pub fn decode_any_with_config(value: &FlatValue, config: &Config) -> Result<Tree, DecodeError> {
    logged(read_tree(value, config.max_depth).and_then(|root| {
        let found = root.symbol();
        let kind = TreeKind::from_start_symbol(found).ok_or(Violation::NotAStartSymbol { found })?;
        Ok(Tree::new(root, kind, config)?)
    }))
}

fn logged(result: Result<Tree, DecodeError>) -> Result<Tree, DecodeError> {
    if let Err(error) = &result {
        log::debug!("rejected flat tree: {error}");
    }
    result
}

struct Frame<'a> {
    symbol: Symbol,
    fields: std::slice::Iter<'a, FlatValue>,
    children: Vec<Node>,
}

fn read_tree(value: &FlatValue, max_depth: usize) -> Result<Node, DecodeError> {
    let mut stack: Vec<Frame<'_>> = Vec::new();
    let mut pending = value;

    loop {
        if stack.len() >= max_depth {
            return Err(DecodeError::ResourceExhausted { limit: max_depth });
        }

        let (symbol, fields) = record_head(pending)?;
        let mut completed = if symbol.is_terminal() {
            Some(read_terminal(symbol, fields)?)
        } else {
            let children = Vec::with_capacity(fields.len());
            stack.push(Frame { symbol, fields: fields.iter(), children });
            None
        };

        loop {
            let Some(frame) = stack.last_mut() else {
                return completed.ok_or(DecodeError::MalformedInput(Malformed::EmptyRecord));
            };
            if let Some(node) = completed.take() {
                frame.children.push(node);
            }

            if let Some(child) = frame.fields.next() {
                pending = child;
                break;
            }

            let Frame { symbol, children, .. } = stack.pop().ok_or(Malformed::EmptyRecord)?;
            completed = Some(Node::non_terminal(symbol, children));
        }
    }
}

fn record_head(value: &FlatValue) -> Result<(Symbol, &[FlatValue]), DecodeError> {
    let items = value.as_record().ok_or(Malformed::NotARecord)?;
    let (head, fields) = items.split_first().ok_or(Malformed::EmptyRecord)?;
    let code = head.as_int().ok_or(Malformed::SymbolNotInt)?;
    let symbol = u16::try_from(code)
        .ok()
        .and_then(Symbol::from_raw)
        .ok_or(Malformed::UnknownSymbol(code))?;
    Ok((symbol, fields))
}

fn read_terminal(symbol: Symbol, fields: &[FlatValue]) -> Result<Node, Malformed> {
    let (text, position) = match fields {
        [text] => (text, None),
        [text, line, column] => (text, Some(read_position(line, column)?)),
        _ => return Err(Malformed::TerminalArity(fields.len() + 1)),
    };
    let text = text.as_str().ok_or(Malformed::TextNotString)?;
    Ok(Node::terminal(symbol, text, position))
}

fn read_position(line: &FlatValue, column: &FlatValue) -> Result<Position, Malformed> {
    let line = line.as_int().and_then(|line| u32::try_from(line).ok()).filter(|&line| line >= 1);
    let column = column
        .as_int()
        .and_then(|column| i32::try_from(column).ok())
        .filter(|&column| column >= Position::SYNTHETIC);

    match (line, column) {
        (Some(line), Some(column)) => Ok(Position::new(line, column)),
        _ => Err(Malformed::Position),
    }
}
