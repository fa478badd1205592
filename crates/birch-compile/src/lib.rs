//! Turning validated trees into something that runs.
//!
//! [`Compiler`] is the seam for code generators. [`Interpreter`] is the
//! backend shipped here: it lowers the tree into [`ir`] and evaluates it
//! directly.

use birch_grammar::Config;
use birch_tree::Tree;

mod builtins;
mod dict;
mod error;
mod eval;
pub mod ir;
mod literal;
mod lower;
mod ops;
mod value;

pub use builtins::Builtin;
pub use dict::Dict;
pub use error::{CompileError, RuntimeError, SyntaxError};
pub use eval::{Code, Namespace};
pub use ops::{compare, equal, identical};
pub use value::{Range, Value, ValueIter};

/// A backend that accepts validated trees.
pub trait Compiler {
    type Artifact;

    fn compile(&self, tree: &Tree) -> Result<Self::Artifact, CompileError>;
}

/// Deepest construct nesting the interpreter lowers and runs, counted in
/// bracketed expressions, subscripts, calls, exponents and blocks. Runs of
/// prefix operators, conditional `else` chains, flat operator chains and
/// `elif` chains do not count.
pub const MAX_NESTING: usize = 200;

/// Tree-walking backend producing [`Code`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interpreter {
    max_nesting: usize,
}

impl Interpreter {
    /// Nesting is bounded by [`MAX_NESTING`] or `config.max_depth`, whichever
    /// is smaller.
    pub fn new(config: &Config) -> Self {
        Self { max_nesting: config.max_depth.min(MAX_NESTING) }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl Compiler for Interpreter {
    type Artifact = Code;

    fn compile(&self, tree: &Tree) -> Result<Code, CompileError> {
        log::trace!("lowering {:?} tree", tree.kind());
        let body = lower::lower(tree.root(), self.max_nesting)
            .inspect_err(|error| log::debug!("compile failed: {error}"))?;
        Ok(Code::new(body))
    }
}
