//! Source text to validated syntax trees.

use birch_errors::Diagnostic;
use birch_grammar::{Config, TreeKind};
use birch_tree::Tree;

mod grammar;
mod parser;
#[cfg(test)]
mod tests;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("syntax error: {0}")]
    Syntax(Diagnostic),
    /// Nesting went past [`Config::max_depth`]; the parser stops descending there.
    #[error("tree is nested deeper than {limit} levels")]
    ResourceExhausted { limit: usize },
}

/// Parses a single expression (an `eval_input` tree).
pub fn expr(text: &str) -> Result<Tree, ParseError> {
    expr_with_config(text, &Config::default())
}

/// Parses a module body (a `file_input` tree).
pub fn suite(text: &str) -> Result<Tree, ParseError> {
    suite_with_config(text, &Config::default())
}

pub fn expr_with_config(text: &str, config: &Config) -> Result<Tree, ParseError> {
    parse(text, TreeKind::Expression, config)
}

pub fn suite_with_config(text: &str, config: &Config) -> Result<Tree, ParseError> {
    parse(text, TreeKind::Suite, config)
}

fn parse(text: &str, kind: TreeKind, config: &Config) -> Result<Tree, ParseError> {
    let mut parser = parser::Parser::new(text, config);
    match kind {
        TreeKind::Expression => grammar::eval_input(&mut parser),
        TreeKind::Suite => grammar::file_input(&mut parser),
    }

    parser
        .finish(kind, config)
        .inspect_err(|error| log::debug!("rejected {kind:?} source: {error}"))
}
