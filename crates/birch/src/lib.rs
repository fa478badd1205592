//! Concrete syntax trees for a Python dialect.
//!
//! Trees come from source text ([`expr`], [`suite`]) or from untrusted flat
//! values ([`sequence_to_tree`]). Either way they have been checked against the
//! grammar, so [`encode`] and [`compile`] can take them as they are.

pub use birch_compile::{
    Code, CompileError, Compiler, Interpreter, MAX_NESTING, Namespace, RuntimeError, SyntaxError,
    Value,
};
pub use birch_errors::{Diagnostic, Renderer};
pub use birch_grammar::{Config, ConfigError, GeneratorReturn, TreeKind, Violation};
pub use birch_parse::ParseError;
pub use birch_syntax::{NT_OFFSET, Node, Position, Symbol};
pub use birch_tree::{DecodeError, FlatValue, IncomparableType, Malformed, Tree, decode_any};

/// Parses a standalone expression.
pub fn expr(text: &str) -> Result<Tree, ParseError> {
    birch_parse::expr(text)
}

/// Parses a module body.
pub fn suite(text: &str) -> Result<Tree, ParseError> {
    birch_parse::suite(text)
}

pub fn parse(text: &str, kind: TreeKind, config: &Config) -> Result<Tree, ParseError> {
    match kind {
        TreeKind::Expression => birch_parse::expr_with_config(text, config),
        TreeKind::Suite => birch_parse::suite_with_config(text, config),
    }
}

/// Rebuilds a tree of the given kind from a flat value, rejecting anything
/// the grammar does not allow.
pub fn sequence_to_tree(value: &FlatValue, kind: TreeKind) -> Result<Tree, DecodeError> {
    birch_tree::decode(value, kind)
}

pub fn sequence_to_tree_with_config(
    value: &FlatValue,
    kind: TreeKind,
    config: &Config,
) -> Result<Tree, DecodeError> {
    birch_tree::decode_with_config(value, kind, config)
}

pub fn encode(tree: &Tree, include_position: bool) -> FlatValue {
    birch_tree::encode(tree, include_position)
}

/// Compiles with the bundled [`Interpreter`].
pub fn compile(tree: &Tree) -> Result<Code, CompileError> {
    Interpreter::default().compile(tree)
}
