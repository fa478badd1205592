//! Owned, immutable tree nodes.

use std::fmt::{self, Write as _};

use crate::Symbol;

/// Source position of a terminal.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Position {
    /// 1-based line.
    pub line: u32,
    /// 0-based byte column, or [`Position::SYNTHETIC`] for tokens with no spelling in the source.
    pub column: i32,
}

impl Position {
    pub const SYNTHETIC: i32 = -1;

    pub fn new(line: u32, column: i32) -> Self {
        Self { line, column }
    }

    pub fn synthetic(line: u32) -> Self {
        Self { line, column: Self::SYNTHETIC }
    }
}

#[derive(Clone)]
enum Payload {
    Terminal { text: Box<str>, position: Option<Position> },
    NonTerminal { children: Box<[Node]> },
}

/// A terminal or non-terminal tree element.
///
/// Nodes expose no mutation: transformations build new trees.
#[derive(Clone)]
pub struct Node {
    symbol: Symbol,
    payload: Payload,
}

impl Node {
    pub fn terminal(symbol: Symbol, text: impl Into<Box<str>>, position: Option<Position>) -> Self {
        debug_assert!(symbol.is_terminal());
        Self { symbol, payload: Payload::Terminal { text: text.into(), position } }
    }

    pub fn non_terminal(symbol: Symbol, children: impl Into<Box<[Node]>>) -> Self {
        debug_assert!(!symbol.is_terminal());
        Self { symbol, payload: Payload::NonTerminal { children: children.into() } }
    }

    #[inline]
    pub fn symbol(&self) -> Symbol {
        self.symbol
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self.payload, Payload::Terminal { .. })
    }

    /// Token text; `None` for non-terminals.
    #[inline]
    pub fn text(&self) -> Option<&str> {
        match &self.payload {
            Payload::Terminal { text, .. } => Some(text),
            Payload::NonTerminal { .. } => None,
        }
    }

    /// Children in source order; empty for terminals.
    #[inline]
    pub fn children(&self) -> &[Node] {
        match &self.payload {
            Payload::Terminal { .. } => &[],
            Payload::NonTerminal { children } => children,
        }
    }

    #[inline]
    pub fn position(&self) -> Option<Position> {
        match self.payload {
            Payload::Terminal { position, .. } => position,
            Payload::NonTerminal { .. } => None,
        }
    }

    /// Position of the first terminal below this node that has one.
    pub fn first_position(&self) -> Option<Position> {
        self.terminals().find_map(Node::position)
    }

    pub fn child(&self, index: usize) -> Option<&Node> {
        self.children().get(index)
    }

    pub fn preorder(&self) -> Preorder<'_> {
        Preorder::new(self)
    }

    /// Leaves in source order.
    pub fn terminals(&self) -> impl Iterator<Item = &Node> {
        self.preorder().filter_map(|event| match event {
            WalkEvent::Enter(node) if node.is_terminal() => Some(node),
            _ => None,
        })
    }

    /// Number of nodes in this subtree, the node itself included.
    pub fn node_count(&self) -> usize {
        self.preorder().filter(|event| matches!(event, WalkEvent::Enter(_))).count()
    }

    /// Indented dump, one node per line.
    pub fn debug_dump(&self) -> String {
        let mut out = String::new();
        let mut indent = 0usize;

        for event in self.preorder() {
            match event {
                WalkEvent::Enter(node) => {
                    _ = write!(out, "{:indent$}{}", "", node.symbol.name(), indent = indent * 2);
                    if let Some(text) = node.text() {
                        _ = write!(out, " {text:?}");
                        if let Some(Position { line, column }) = node.position() {
                            _ = write!(out, " @{line}:{column}");
                        }
                    }
                    out.push('\n');
                    indent += 1;
                }
                WalkEvent::Leave(_) => indent -= 1,
            }
        }

        out
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        let Payload::NonTerminal { children } = &mut self.payload else { return };
        if children.iter().all(Node::is_terminal) {
            return;
        }

        let mut stack = std::mem::take(children).into_vec();
        while let Some(mut node) = stack.pop() {
            if let Payload::NonTerminal { children } = &mut node.payload {
                stack.extend(std::mem::take(children).into_vec());
            }
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.debug_dump())
    }
}

#[derive(Debug, Clone, Copy)]
pub enum WalkEvent<'a> {
    Enter(&'a Node),
    Leave(&'a Node),
}

/// Depth-first walk driven by an explicit stack, so arbitrarily deep trees never
/// recurse on the native stack.
pub struct Preorder<'a> {
    stack: Vec<(&'a Node, usize)>,
    start: Option<&'a Node>,
}

impl<'a> Preorder<'a> {
    fn new(start: &'a Node) -> Self {
        Self { stack: Vec::new(), start: Some(start) }
    }

    /// Number of nodes currently entered and not yet left.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}

impl<'a> Iterator for Preorder<'a> {
    type Item = WalkEvent<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(start) = self.start.take() {
            self.stack.push((start, 0));
            return Some(WalkEvent::Enter(start));
        }

        let (node, next_child) = self.stack.last_mut()?;
        let node = *node;
        match node.children().get(*next_child) {
            Some(child) => {
                *next_child += 1;
                self.stack.push((child, 0));
                Some(WalkEvent::Enter(child))
            }
            None => {
                self.stack.pop();
                Some(WalkEvent::Leave(node))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use expect_test::expect;

    use super::*;

    fn name(text: &str, column: i32) -> Node {
        Node::terminal(Symbol::NAME, text, Some(Position::new(1, column)))
    }

    #[test]
    fn accessors() {
        let node = Node::non_terminal(
            Symbol::DOTTED_NAME,
            vec![
                name("os", 0),
                Node::terminal(Symbol::DOT, ".", Some(Position::new(1, 2))),
                name("path", 3),
            ],
        );

        assert_eq!(node.symbol(), Symbol::DOTTED_NAME);
        assert_eq!(node.text(), None);
        assert_eq!(node.children().len(), 3);
        assert_eq!(node.child(2).and_then(Node::text), Some("path"));
        assert_eq!(node.first_position(), Some(Position::new(1, 0)));
        assert_eq!(node.node_count(), 4);
        assert_eq!(
            node.terminals().filter_map(Node::text).collect::<Vec<_>>(),
            ["os", ".", "path"]
        );
    }

    #[test]
    fn dump() {
        let node = Node::non_terminal(
            Symbol::IMPORT_NAME,
            vec![
                Node::terminal(Symbol::NAME, "import", Some(Position::new(1, 0))),
                Node::non_terminal(
                    Symbol::DOTTED_AS_NAMES,
                    vec![Node::non_terminal(
                        Symbol::DOTTED_AS_NAME,
                        vec![Node::non_terminal(Symbol::DOTTED_NAME, vec![name("sys", 7)])],
                    )],
                ),
                Node::terminal(Symbol::NEWLINE, "", None),
            ],
        );

        expect![[r#"
            import_name
              NAME "import" @1:0
              dotted_as_names
                dotted_as_name
                  dotted_name
                    NAME "sys" @1:7
              NEWLINE ""
        "#]]
        .assert_eq(&node.debug_dump());
    }

    #[test]
    fn walk_is_not_recursive() {
        let mut node = Node::terminal(Symbol::NAME, "x", None);
        for _ in 0..100_000 {
            node = Node::non_terminal(Symbol::ATOM, vec![node]);
        }

        let mut walk = node.preorder();
        let mut deepest = 0;
        while walk.next().is_some() {
            deepest = deepest.max(walk.depth());
        }
        assert_eq!(deepest, 100_001);
    }
}
