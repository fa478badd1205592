use birch_syntax::Symbol;

/// Which start symbol a tree hangs from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TreeKind {
    /// A single expression, rooted at `eval_input`.
    Expression,
    /// A module body, rooted at `file_input`.
    Suite,
}

impl TreeKind {
    pub const fn start_symbol(self) -> Symbol {
        match self {
            TreeKind::Expression => Symbol::EVAL_INPUT,
            TreeKind::Suite => Symbol::FILE_INPUT,
        }
    }

    /// The kind whose start symbol is `symbol`, if any.
    pub const fn from_start_symbol(symbol: Symbol) -> Option<TreeKind> {
        match symbol {
            Symbol::EVAL_INPUT => Some(TreeKind::Expression),
            Symbol::FILE_INPUT => Some(TreeKind::Suite),
            _ => None,
        }
    }
}
