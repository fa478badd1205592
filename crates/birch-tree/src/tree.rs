use std::any::Any;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use birch_grammar::{Config, TreeKind, ValidationError, validate};
use birch_syntax::{Node, WalkEvent};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{FlatValue, decode_any, encode};

/// A validated syntax tree.
///
/// Clones share the same nodes. Comparison looks only at symbols, text and
/// shape; positions never matter. The order is the lexicographic order of the
/// position-free flat encodings, computed without building them.
#[derive(Clone)]
pub struct Tree {
    root: Arc<Node>,
    kind: TreeKind,
}

/// Returned when a tree is ordered against something that is not a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("trees can only be ordered against other trees")]
pub struct IncomparableType;

impl Tree {
    /// Wraps `root` after checking it against the grammar.
    pub fn new(root: Node, kind: TreeKind, config: &Config) -> Result<Self, ValidationError> {
        validate(&root, kind, config)?;
        Ok(Self { root: Arc::new(root), kind })
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn kind(&self) -> TreeKind {
        self.kind
    }

    pub fn is_expr(&self) -> bool {
        self.kind == TreeKind::Expression
    }

    pub fn is_suite(&self) -> bool {
        self.kind == TreeKind::Suite
    }

    pub fn encode(&self, include_position: bool) -> FlatValue {
        encode(self, include_position)
    }

    pub fn debug_dump(&self) -> String {
        self.root.debug_dump()
    }

    /// `==` against an arbitrary value; anything but a tree is unequal.
    pub fn eq_dyn(&self, other: &dyn Any) -> bool {
        other.downcast_ref::<Tree>().is_some_and(|other| self == other)
    }

    /// Ordering against an arbitrary value.
    pub fn partial_cmp_dyn(&self, other: &dyn Any) -> Result<Ordering, IncomparableType> {
        other.downcast_ref::<Tree>().map(|other| self.cmp(other)).ok_or(IncomparableType)
    }
}

fn compare(left: &Node, right: &Node) -> Ordering {
    let mut stack = vec![(std::slice::from_ref(left).iter(), std::slice::from_ref(right).iter())];

    while let Some((lefts, rights)) = stack.last_mut() {
        match (lefts.next(), rights.next()) {
            (None, None) => {
                stack.pop();
            }
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(left), Some(right)) => {
                let ordering = left
                    .symbol()
                    .cmp(&right.symbol())
                    .then_with(|| left.text().cmp(&right.text()));
                if ordering.is_ne() {
                    return ordering;
                }
                if !left.is_terminal() {
                    stack.push((left.children().iter(), right.children().iter()));
                }
            }
        }
    }

    Ordering::Equal
}

impl PartialEq for Tree {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.root, &other.root) || compare(&self.root, &other.root).is_eq()
    }
}

impl Eq for Tree {}

impl PartialOrd for Tree {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Tree {
    fn cmp(&self, other: &Self) -> Ordering {
        if Arc::ptr_eq(&self.root, &other.root) {
            return Ordering::Equal;
        }
        compare(&self.root, &other.root)
    }
}

impl Hash for Tree {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for event in self.root.preorder() {
            if let WalkEvent::Enter(node) = event {
                node.symbol().hash(state);
                match node.text() {
                    Some(text) => text.hash(state),
                    None => node.children().len().hash(state),
                }
            }
        }
    }
}

impl std::fmt::Debug for Tree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Tree({:?})\n{}", self.kind, self.root.debug_dump())
    }
}

impl Serialize for Tree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.encode(true).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Tree {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = FlatValue::deserialize(deserializer)?;
        decode_any(&value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use birch_syntax::{Position, Symbol};

    use super::*;

    fn expression(name: &str, line: u32) -> Tree {
        let chain = [
            Symbol::TESTLIST,
            Symbol::TEST,
            Symbol::OR_TEST,
            Symbol::AND_TEST,
            Symbol::NOT_TEST,
            Symbol::COMPARISON,
            Symbol::EXPR,
            Symbol::XOR_EXPR,
            Symbol::AND_EXPR,
            Symbol::SHIFT_EXPR,
            Symbol::ARITH_EXPR,
            Symbol::TERM,
            Symbol::FACTOR,
            Symbol::POWER,
            Symbol::ATOM,
        ];
        let name = Node::terminal(Symbol::NAME, name, Some(Position::new(line, 0)));
        let operand =
            chain.iter().rev().fold(name, |inner, &symbol| Node::non_terminal(symbol, vec![inner]));
        let root = Node::non_terminal(
            Symbol::EVAL_INPUT,
            vec![
                operand,
                Node::terminal(Symbol::NEWLINE, "", Some(Position::new(line, 1))),
                Node::terminal(Symbol::ENDMARKER, "", Some(Position::synthetic(line))),
            ],
        );
        Tree::new(root, TreeKind::Expression, &Config::default()).unwrap()
    }

    #[test]
    fn positions_do_not_matter() {
        let a = expression("x", 1);
        let b = expression("x", 40);
        assert_eq!(a, b);
        assert_eq!(a.cmp(&b), Ordering::Equal);

        let mut set = BTreeSet::new();
        set.insert(a);
        set.insert(b);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn order_follows_text() {
        let a = expression("a", 1);
        let b = expression("b", 1);
        let c = expression("c", 1);
        assert!(a < b && b < c && a < c);
        assert!(a <= a.clone());
        assert!(!(b < a));

        let mut trees = vec![c.clone(), a.clone(), b.clone()];
        trees.sort();
        assert_eq!(trees, [a, b, c]);
    }

    #[test]
    fn foreign_values() {
        let tree = expression("x", 1);
        assert!(tree.eq_dyn(&tree.clone()));
        assert!(!tree.eq_dyn(&"x"));
        assert!(!tree.eq_dyn(&42));
        assert_eq!(tree.partial_cmp_dyn(&expression("y", 1)), Ok(Ordering::Less));
        assert_eq!(tree.partial_cmp_dyn(&"x"), Err(IncomparableType));
    }

    #[test]
    fn hash_ignores_positions() {
        use std::collections::HashSet;

        let set: HashSet<Tree> =
            [expression("x", 1), expression("x", 9), expression("y", 1)].into();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn serde_round_trip() {
        let tree = expression("spam", 3);
        let json = serde_json::to_string(&tree).unwrap();
        assert!(json.starts_with("[257,[325,[300,"), "{json}");
        assert!(json.contains(r#"[1,"spam",3,0]"#), "{json}");

        let back: Tree = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tree);
        assert!(back.is_expr());
        assert_eq!(back.root().first_position(), Some(Position::new(3, 0)));

        let error = serde_json::from_str::<Tree>("[1, 2, 3]").unwrap_err();
        assert!(error.to_string().contains("malformed tree"), "{error}");
    }

    #[test]
    fn trees_are_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Tree>();
    }
}
