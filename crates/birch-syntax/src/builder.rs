//! Incremental builder for owned syntax trees.

use crate::{Node, Position, Symbol};

struct Opened {
    symbol: Symbol,
    children: Vec<Node>,
}

/// Builds a [`Node`] tree from start/token/finish events.
pub struct Builder {
    opened: Vec<Opened>,
    children_pool: Vec<Vec<Node>>,
    root: Option<Node>,
}

const DEFAULT_TREE_DEPTH: usize = 128;
const DEFAULT_CHILDREN_LEN: usize = 10;

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder {
    pub fn new() -> Self {
        Self {
            opened: Vec::with_capacity(DEFAULT_TREE_DEPTH),
            children_pool: Vec::with_capacity(DEFAULT_TREE_DEPTH),
            root: None,
        }
    }

    /// Retrieves a recycled children buffer or allocates a new one.
    fn new_children_vec(&mut self) -> Vec<Node> {
        self.children_pool.pop().unwrap_or_else(|| Vec::with_capacity(DEFAULT_CHILDREN_LEN))
    }

    /// Number of currently open non-terminals.
    #[inline]
    pub fn depth(&self) -> usize {
        self.opened.len()
    }

    /// Starts a new non-terminal.
    pub fn start_node(&mut self, symbol: Symbol) {
        assert!(self.root.is_none(), "the root node is already finished");
        let children = self.new_children_vec();
        self.opened.push(Opened { symbol, children });
    }

    /// Finishes the most recently started non-terminal.
    pub fn finish_node(&mut self) {
        let Opened { symbol, mut children } = self.opened.pop().expect("no opened nodes?");
        debug_assert!(!children.is_empty(), "{symbol} finished without children");

        let node = Node::non_terminal(symbol, children.drain(..).collect::<Box<[Node]>>());
        self.children_pool.push(children);
        self.attach(node);
    }

    /// Adds a terminal to the innermost open node.
    pub fn token(&mut self, symbol: Symbol, text: &str, position: Option<Position>) {
        self.attach(Node::terminal(symbol, text, position));
    }

    fn attach(&mut self, node: Node) {
        match self.opened.last_mut() {
            Some(parent) => parent.children.push(node),
            None => {
                assert!(self.root.is_none(), "more than one root");
                self.root = Some(node);
            }
        }
    }

    /// Finishes building and returns the root.
    pub fn finish(self) -> Node {
        assert!(self.opened.is_empty(), "you should finish every started node");
        self.root.expect("empty tree")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_nodes() {
        let mut builder = Builder::new();
        builder.start_node(Symbol::TRAILER);
        builder.token(Symbol::LPAR, "(", Some(Position::new(1, 3)));
        builder.start_node(Symbol::ARGLIST);
        assert_eq!(builder.depth(), 2);
        builder.start_node(Symbol::ARGUMENT);
        builder.token(Symbol::NAME, "x", Some(Position::new(1, 4)));
        builder.finish_node();
        builder.finish_node();
        builder.token(Symbol::RPAR, ")", Some(Position::new(1, 5)));
        builder.finish_node();

        let root = builder.finish();
        assert_eq!(root.symbol(), Symbol::TRAILER);
        assert_eq!(
            root.children().iter().map(Node::symbol).collect::<Vec<_>>(),
            [Symbol::LPAR, Symbol::ARGLIST, Symbol::RPAR]
        );
        assert_eq!(root.children()[1].children()[0].children()[0].text(), Some("x"));
    }

    #[test]
    #[should_panic(expected = "you should finish every started node")]
    fn unfinished_node() {
        let mut builder = Builder::new();
        builder.start_node(Symbol::ATOM);
        builder.token(Symbol::NAME, "x", None);
        builder.finish();
    }
}
