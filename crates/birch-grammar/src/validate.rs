//! Whole-tree validation against the production table.
//!
//! Trees from the parser and trees rebuilt from flat values both go through
//! [`validate`], so both paths accept exactly the same set of trees.

use birch_syntax::{Node, Symbol, WalkEvent};

use crate::{Config, GeneratorReturn, Grammar, TreeKind};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Violation {
    #[error("illegal {symbol} node with children [{}]", join(.children))]
    Production { symbol: Symbol, children: Vec<Symbol> },
    #[error("illegal text {text:?} for terminal {symbol}")]
    TerminalText { symbol: Symbol, text: String },
    #[error("tree must be rooted at {expected}, found {found}")]
    StartSymbol { expected: Symbol, found: Symbol },
    #[error("{found} is not a start symbol")]
    NotAStartSymbol { found: Symbol },
    #[error("'return' with argument inside generator")]
    GeneratorReturn,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error(transparent)]
    Violation(#[from] Violation),
    #[error("tree is nested deeper than {limit} levels")]
    TooDeep { limit: usize },
}

fn join(symbols: &[Symbol]) -> String {
    symbols.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

/// What a subtree contributes to the enclosing function.
#[derive(Debug, Default, Clone, Copy)]
struct Flags {
    returns_value: bool,
    yields: bool,
}

impl Flags {
    fn merge(&mut self, other: Flags) {
        self.returns_value |= other.returns_value;
        self.yields |= other.yields;
    }
}

/// An open non-terminal. `body` collects what its own scope body contributes,
/// which stays out of `flags`.
struct Frame {
    symbol: Symbol,
    flags: Flags,
    body: Flags,
}

impl Frame {
    fn new(symbol: Symbol) -> Self {
        Frame { symbol, flags: Flags::default(), body: Flags::default() }
    }
}

/// Whether `child` is the body of a new scope opened by `parent`. Parameter
/// defaults, annotations and class bases belong to the enclosing scope.
fn is_scope_body(parent: Symbol, child: Symbol) -> bool {
    match parent {
        Symbol::FUNCDEF | Symbol::CLASSDEF => child == Symbol::SUITE,
        Symbol::LAMBDEF | Symbol::LAMBDEF_NOCOND => {
            matches!(child, Symbol::TEST | Symbol::TEST_NOCOND)
        }
        _ => false,
    }
}

/// Checks `root` against the grammar: start symbol, every production, every
/// terminal spelling, the nesting bound and the generator-return rule.
///
/// Runs on an explicit stack; the native stack does not grow with the tree.
pub fn validate(root: &Node, kind: TreeKind, config: &Config) -> Result<(), ValidationError> {
    let grammar = Grammar::get();

    let expected = kind.start_symbol();
    if root.symbol() != expected {
        return Err(Violation::StartSymbol { expected, found: root.symbol() }.into());
    }

    let mut frames: Vec<Frame> = Vec::new();
    let mut walk = root.preorder();

    while let Some(event) = walk.next() {
        match event {
            WalkEvent::Enter(node) => {
                if walk.depth() > config.max_depth {
                    return Err(ValidationError::TooDeep { limit: config.max_depth });
                }

                match node.text() {
                    Some(text) => check_terminal(grammar, node.symbol(), text)?,
                    None => frames.push(Frame::new(node.symbol())),
                }
            }
            WalkEvent::Leave(node) if !node.is_terminal() => {
                let symbol = node.symbol();
                if !grammar.is_legal_production(symbol, node.children()) {
                    let children = node.children().iter().map(Node::symbol).collect();
                    return Err(Violation::Production { symbol, children }.into());
                }

                let Some(mut frame) = frames.pop() else { continue };
                match symbol {
                    Symbol::RETURN_STMT if node.children().len() > 1 => {
                        frame.flags.returns_value = true;
                    }
                    Symbol::YIELD_EXPR => frame.flags.yields = true,
                    Symbol::FUNCDEF
                        if frame.body.returns_value
                            && frame.body.yields
                            && config.generator_return == GeneratorReturn::Reject =>
                    {
                        return Err(Violation::GeneratorReturn.into());
                    }
                    _ => {}
                }

                if let Some(parent) = frames.last_mut() {
                    if is_scope_body(parent.symbol, symbol) {
                        parent.body.merge(frame.flags);
                    } else {
                        parent.flags.merge(frame.flags);
                    }
                }
            }
            WalkEvent::Leave(_) => {}
        }
    }

    Ok(())
}

fn check_terminal(grammar: &Grammar, symbol: Symbol, text: &str) -> Result<(), Violation> {
    let legal = match grammar.expected_spelling(symbol) {
        Some(spelling) => text == spelling,
        None => match symbol {
            Symbol::NAME => is_identifier(text),
            Symbol::NUMBER => is_number(text),
            Symbol::STRING => !text.is_empty(),
            _ => false,
        },
    };

    if legal { Ok(()) } else { Err(Violation::TerminalText { symbol, text: text.to_owned() }) }
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    chars.next().is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

fn is_number(text: &str) -> bool {
    let bytes = text.as_bytes();
    match bytes {
        [first, ..] if first.is_ascii_digit() => {}
        [b'.', second, ..] if second.is_ascii_digit() => {}
        _ => return false,
    }
    bytes.iter().all(|&b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'+' | b'-'))
}

#[cfg(test)]
mod tests {
    use birch_syntax::Position;

    use super::*;

    /// Productions between `test` and `atom` on a single-operand chain.
    const OPERAND_CHAIN: [Symbol; 13] = [
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
    ];

    fn leaf(symbol: Symbol, text: &str) -> Node {
        Node::terminal(symbol, text, None::<Position>)
    }

    fn node(symbol: Symbol, children: Vec<Node>) -> Node {
        Node::non_terminal(symbol, children)
    }

    fn operand(symbol: Symbol, text: &str) -> Node {
        chain(vec![leaf(symbol, text)])
    }

    /// A `test` whose only operand is an atom with `children`.
    fn chain(children: Vec<Node>) -> Node {
        OPERAND_CHAIN
            .iter()
            .rev()
            .fold(node(Symbol::ATOM, children), |inner, &outer| node(outer, vec![inner]))
    }

    fn parenthesized_yield() -> Node {
        chain(vec![
            leaf(Symbol::LPAR, "("),
            node(Symbol::YIELD_EXPR, vec![leaf(Symbol::NAME, "yield")]),
            leaf(Symbol::RPAR, ")"),
        ])
    }

    fn testlist(items: Vec<Node>) -> Node {
        node(Symbol::TESTLIST, items)
    }

    fn simple(small: Node) -> Node {
        node(
            Symbol::STMT,
            vec![node(
                Symbol::SIMPLE_STMT,
                vec![node(Symbol::SMALL_STMT, vec![small]), leaf(Symbol::NEWLINE, "")],
            )],
        )
    }

    fn file(stmts: Vec<Node>) -> Node {
        let mut children = stmts;
        children.push(leaf(Symbol::ENDMARKER, ""));
        node(Symbol::FILE_INPUT, children)
    }

    fn assignment(operator: Node) -> Node {
        node(
            Symbol::EXPR_STMT,
            vec![
                testlist(vec![operand(Symbol::NAME, "a")]),
                operator,
                testlist(vec![operand(Symbol::NAME, "b")]),
            ],
        )
    }

    fn check(root: &Node, kind: TreeKind) -> Result<(), ValidationError> {
        validate(root, kind, &Config::default())
    }

    #[test]
    fn accepts_assignment() {
        let tree = file(vec![simple(assignment(leaf(Symbol::EQUAL, "=")))]);
        assert_eq!(check(&tree, TreeKind::Suite), Ok(()));
    }

    #[test]
    fn accepts_expression() {
        let tree = node(
            Symbol::EVAL_INPUT,
            vec![
                testlist(vec![operand(Symbol::NUMBER, "1"), leaf(Symbol::COMMA, ",")]),
                leaf(Symbol::NEWLINE, ""),
                leaf(Symbol::ENDMARKER, ""),
            ],
        );
        assert_eq!(check(&tree, TreeKind::Expression), Ok(()));
        assert_eq!(
            check(&tree, TreeKind::Suite),
            Err(ValidationError::Violation(Violation::StartSymbol {
                expected: Symbol::FILE_INPUT,
                found: Symbol::EVAL_INPUT,
            }))
        );
    }

    #[test]
    fn double_comma() {
        let list = testlist(vec![
            operand(Symbol::NAME, "a"),
            leaf(Symbol::COMMA, ","),
            leaf(Symbol::COMMA, ","),
            operand(Symbol::NAME, "c"),
        ]);
        let tree = file(vec![simple(node(Symbol::EXPR_STMT, vec![list]))]);

        let error = check(&tree, TreeKind::Suite).unwrap_err();
        assert_eq!(
            error,
            ValidationError::Violation(Violation::Production {
                symbol: Symbol::TESTLIST,
                children: vec![Symbol::TEST, Symbol::COMMA, Symbol::COMMA, Symbol::TEST],
            })
        );
        assert_eq!(
            error.to_string(),
            "illegal testlist(325) node with children [test(300), COMMA(12), COMMA(12), test(300)]"
        );
    }

    #[test]
    fn wrong_operator_text() {
        let augassign = node(Symbol::AUGASSIGN, vec![leaf(Symbol::MINEQUAL, "$=")]);
        let tree = file(vec![simple(assignment(augassign))]);
        assert_eq!(
            check(&tree, TreeKind::Suite),
            Err(ValidationError::Violation(Violation::TerminalText {
                symbol: Symbol::MINEQUAL,
                text: "$=".to_owned(),
            }))
        );
    }

    #[test]
    fn global_without_keyword() {
        let global = node(Symbol::GLOBAL_STMT, vec![leaf(Symbol::NAME, "foo")]);
        let tree = file(vec![simple(global)]);
        assert!(matches!(
            check(&tree, TreeKind::Suite),
            Err(ValidationError::Violation(Violation::Production {
                symbol: Symbol::GLOBAL_STMT,
                ..
            }))
        ));
    }

    #[test]
    fn childless_non_terminal() {
        let tree = file(vec![simple(node(Symbol::PASS_STMT, vec![]))]);
        assert_eq!(
            check(&tree, TreeKind::Suite),
            Err(ValidationError::Violation(Violation::Production {
                symbol: Symbol::PASS_STMT,
                children: vec![],
            }))
        );
    }

    #[test]
    fn terminal_text() {
        let grammar = Grammar::get();
        assert!(check_terminal(grammar, Symbol::NAME, "_x1").is_ok());
        assert!(check_terminal(grammar, Symbol::NAME, "1x").is_err());
        assert!(check_terminal(grammar, Symbol::NAME, "").is_err());
        assert!(check_terminal(grammar, Symbol::NUMBER, ".5").is_ok());
        assert!(check_terminal(grammar, Symbol::NUMBER, "1e-3").is_ok());
        assert!(check_terminal(grammar, Symbol::NUMBER, "x1").is_err());
        assert!(check_terminal(grammar, Symbol::STRING, "''").is_ok());
        assert!(check_terminal(grammar, Symbol::STRING, "").is_err());
        assert!(check_terminal(grammar, Symbol::NEWLINE, "").is_ok());
        assert!(check_terminal(grammar, Symbol::NEWLINE, "\n").is_err());
    }

    #[test]
    fn depth_limit() {
        let tree = node(
            Symbol::EVAL_INPUT,
            vec![
                testlist(vec![operand(Symbol::NAME, "a")]),
                leaf(Symbol::NEWLINE, ""),
                leaf(Symbol::ENDMARKER, ""),
            ],
        );
        // eval_input, testlist, 13 chain productions, atom, NAME
        let config = Config::default().with_max_depth(17);
        assert_eq!(validate(&tree, TreeKind::Expression, &config), Ok(()));

        let config = Config::default().with_max_depth(16);
        assert_eq!(
            validate(&tree, TreeKind::Expression, &config),
            Err(ValidationError::TooDeep { limit: 16 })
        );
    }

    fn funcdef(name: &str, body: Vec<Node>) -> Node {
        let parameters =
            node(Symbol::PARAMETERS, vec![leaf(Symbol::LPAR, "("), leaf(Symbol::RPAR, ")")]);
        funcdef_with(name, parameters, None, body)
    }

    fn funcdef_with(
        name: &str,
        parameters: Node,
        annotation: Option<Node>,
        body: Vec<Node>,
    ) -> Node {
        let mut suite = vec![leaf(Symbol::NEWLINE, ""), leaf(Symbol::INDENT, "")];
        suite.extend(body);
        suite.push(leaf(Symbol::DEDENT, ""));

        let mut children = vec![leaf(Symbol::NAME, "def"), leaf(Symbol::NAME, name), parameters];
        if let Some(annotation) = annotation {
            children.push(leaf(Symbol::RARROW, "->"));
            children.push(annotation);
        }
        children.push(leaf(Symbol::COLON, ":"));
        children.push(node(Symbol::SUITE, suite));

        let def = node(Symbol::FUNCDEF, children);
        node(Symbol::STMT, vec![node(Symbol::COMPOUND_STMT, vec![def])])
    }

    fn return_value() -> Node {
        let ret = node(
            Symbol::RETURN_STMT,
            vec![leaf(Symbol::NAME, "return"), testlist(vec![operand(Symbol::NUMBER, "1")])],
        );
        simple(node(Symbol::FLOW_STMT, vec![ret]))
    }

    fn bare_return() -> Node {
        let ret = node(Symbol::RETURN_STMT, vec![leaf(Symbol::NAME, "return")]);
        simple(node(Symbol::FLOW_STMT, vec![ret]))
    }

    fn yield_stmt() -> Node {
        let expr = node(Symbol::YIELD_EXPR, vec![leaf(Symbol::NAME, "yield")]);
        simple(node(Symbol::FLOW_STMT, vec![node(Symbol::YIELD_STMT, vec![expr])]))
    }

    #[test]
    fn generator_return() {
        let tree = file(vec![funcdef("f", vec![return_value(), yield_stmt()])]);
        assert_eq!(
            check(&tree, TreeKind::Suite),
            Err(ValidationError::Violation(Violation::GeneratorReturn))
        );

        let config = Config::default().with_generator_return(GeneratorReturn::Allow);
        assert_eq!(validate(&tree, TreeKind::Suite, &config), Ok(()));

        let tree = file(vec![funcdef("f", vec![bare_return(), yield_stmt()])]);
        assert_eq!(check(&tree, TreeKind::Suite), Ok(()));
    }

    #[test]
    fn nested_functions_are_separate() {
        let inner = funcdef("g", vec![yield_stmt()]);
        let tree = file(vec![funcdef("f", vec![inner, return_value()])]);
        assert_eq!(check(&tree, TreeKind::Suite), Ok(()));
    }

    #[test]
    fn nested_defaults_belong_to_the_enclosing_function() {
        // def f():
        //     return 1
        //     def g(x=(yield)):
        //         return
        let parameters = node(
            Symbol::PARAMETERS,
            vec![
                leaf(Symbol::LPAR, "("),
                node(
                    Symbol::TYPEDARGSLIST,
                    vec![
                        node(Symbol::TFPDEF, vec![leaf(Symbol::NAME, "x")]),
                        leaf(Symbol::EQUAL, "="),
                        parenthesized_yield(),
                    ],
                ),
                leaf(Symbol::RPAR, ")"),
            ],
        );
        let inner = funcdef_with("g", parameters, None, vec![bare_return()]);
        let tree = file(vec![funcdef("f", vec![return_value(), inner])]);
        assert_eq!(
            check(&tree, TreeKind::Suite),
            Err(ValidationError::Violation(Violation::GeneratorReturn))
        );

        // def g() -> (yield): return
        let parameters =
            node(Symbol::PARAMETERS, vec![leaf(Symbol::LPAR, "("), leaf(Symbol::RPAR, ")")]);
        let inner = funcdef_with("g", parameters, Some(parenthesized_yield()), vec![bare_return()]);
        let tree = file(vec![funcdef("f", vec![inner, return_value()])]);
        assert_eq!(
            check(&tree, TreeKind::Suite),
            Err(ValidationError::Violation(Violation::GeneratorReturn))
        );
    }

    #[test]
    fn lambda_bodies_are_separate() {
        // f = lambda: (yield)
        let lambda = node(
            Symbol::LAMBDEF,
            vec![leaf(Symbol::NAME, "lambda"), leaf(Symbol::COLON, ":"), parenthesized_yield()],
        );
        let assign = node(
            Symbol::EXPR_STMT,
            vec![
                testlist(vec![operand(Symbol::NAME, "h")]),
                leaf(Symbol::EQUAL, "="),
                testlist(vec![node(Symbol::TEST, vec![lambda])]),
            ],
        );
        let tree = file(vec![funcdef("f", vec![simple(assign), return_value()])]);
        assert_eq!(check(&tree, TreeKind::Suite), Ok(()));
    }
}
