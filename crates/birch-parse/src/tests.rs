use std::fmt::Write as _;

use birch_grammar::{Config, GeneratorReturn};
use birch_syntax::{Node, Position};
use expect_test::expect;
use text_size::{TextRange, TextSize};

use crate::{ParseError, expr, expr_with_config, suite, suite_with_config};

/// Like `Node::debug_dump`, with single-child chains folded onto one line.
fn compact(root: &Node) -> String {
    let mut out = String::new();
    let mut stack = vec![(root, 0usize)];

    while let Some((mut node, indent)) = stack.pop() {
        _ = write!(out, "{:indent$}", "", indent = indent * 2);
        while let [child] = node.children() {
            _ = write!(out, "{} > ", node.symbol().name());
            node = child;
        }
        out.push_str(node.symbol().name());
        if let Some(text) = node.text() {
            _ = write!(out, " {text:?}");
        }
        if let Some(Position { line, column }) = node.position() {
            _ = write!(out, " @{line}:{column}");
        }
        out.push('\n');
        stack.extend(node.children().iter().rev().map(|child| (child, indent + 1)));
    }

    out
}

fn syntax_error(result: Result<birch_tree::Tree, ParseError>) -> (String, TextRange) {
    match result {
        Err(ParseError::Syntax(diagnostic)) => {
            (diagnostic.message().to_owned(), diagnostic.range())
        }
        other => panic!("expected a syntax error, got {other:?}"),
    }
}

fn range(start: u32, end: u32) -> TextRange {
    TextRange::new(TextSize::new(start), TextSize::new(end))
}

#[test]
fn name_expression() {
    let tree = expr("x").unwrap();
    assert!(tree.is_expr());
    expect![[r#"
        eval_input
          testlist > test > or_test > and_test > not_test > comparison > expr > xor_expr > and_expr > shift_expr > arith_expr > term > factor > power > atom > NAME "x" @1:0
          NEWLINE "" @1:1
          NEWLINE "" @1:-1
          ENDMARKER "" @1:-1
    "#]]
    .assert_eq(&compact(tree.root()));
}

#[test]
fn if_statement() {
    let tree = suite("if a:\n    b = 1\n").unwrap();
    assert!(tree.is_suite());
    expect![[r#"
        file_input
          stmt > compound_stmt > if_stmt
            NAME "if" @1:0
            test > or_test > and_test > not_test > comparison > expr > xor_expr > and_expr > shift_expr > arith_expr > term > factor > power > atom > NAME "a" @1:3
            COLON ":" @1:4
            suite
              NEWLINE "" @1:5
              INDENT "" @2:-1
              stmt > simple_stmt
                small_stmt > expr_stmt
                  testlist > test > or_test > and_test > not_test > comparison > expr > xor_expr > and_expr > shift_expr > arith_expr > term > factor > power > atom > NAME "b" @2:4
                  EQUAL "=" @2:6
                  testlist > test > or_test > and_test > not_test > comparison > expr > xor_expr > and_expr > shift_expr > arith_expr > term > factor > power > atom > NUMBER "1" @2:8
                NEWLINE "" @2:9
              DEDENT "" @2:-1
          NEWLINE "" @2:-1
          ENDMARKER "" @2:-1
    "#]]
    .assert_eq(&compact(tree.root()));
}

#[test]
fn assignment_terminals() {
    let tree = suite("a = b").unwrap();
    let terminals = tree
        .root()
        .terminals()
        .map(|node| (node.symbol().name(), node.text().unwrap_or_default()))
        .collect::<Vec<_>>();
    assert_eq!(terminals, [
        ("NAME", "a"),
        ("EQUAL", "="),
        ("NAME", "b"),
        ("NEWLINE", ""),
        ("NEWLINE", ""),
        ("ENDMARKER", "")
    ]);
}

#[test]
fn terminal_positions() {
    let tree = suite("def f(x):\n    return x + 1\n").unwrap();
    let positions = tree
        .root()
        .terminals()
        .map(|node| {
            let position = node.position().unwrap();
            (node.symbol().raw(), node.text().unwrap(), position.line, position.column)
        })
        .collect::<Vec<_>>();

    assert_eq!(positions, [
        (1, "def", 1, 0),
        (1, "f", 1, 4),
        (7, "(", 1, 5),
        (1, "x", 1, 6),
        (8, ")", 1, 7),
        (11, ":", 1, 8),
        (4, "", 1, 9),
        (5, "", 2, -1),
        (1, "return", 2, 4),
        (1, "x", 2, 11),
        (14, "+", 2, 13),
        (2, "1", 2, 15),
        (4, "", 2, 16),
        (6, "", 2, -1),
        (4, "", 2, -1),
        (0, "", 2, -1),
    ]);
}

#[test]
fn whitespace_does_not_change_the_tree() {
    assert_eq!(suite("a=b").unwrap(), suite("a   =\tb\n").unwrap());
    assert_eq!(expr("(1,\n 2)").unwrap(), expr("(1, 2)").unwrap());
    assert_ne!(suite("a = b").unwrap(), suite("a = c").unwrap());
}

#[test]
fn accepts_the_whole_language() {
    let text = r#"
import os.path as p, sys
from . import a
from ..pkg import (b as c, d,)
from x import *

@decorator
@dec.attr(1, key=2)
def f(a, b: int = 1, *args, c, d=2, **kwargs) -> None:
    global g
    nonlocal n
    x = y = [i ** 2 for i in range(10) if i % 2 if i]
    x += yield
    del x[0], y.z
    assert x, "msg" 'concatenated'
    with open(p) as fh, lock:
        pass
    try:
        raise ValueError("bad") from None
    except (TypeError, ValueError) as e:
        return
    except:
        pass
    else:
        pass
    finally:
        pass
    while not x and y or z:
        break
    else:
        continue
    for i, (j, k) in enumerate(items):
        print(*args, **kwargs)
    lambda_ = lambda a, *b, **c: a if b else c
    s = {1, 2}; t = {'a': 1, 'b': 2}; u = {k: v for k, v in t}; w = {i for i in s};
    z = x[1:2, ::3, :] + f()(1)[2].attr - -x ** -y
    q = a is not b, a not in b, not a in b, 1 < 2 <= 3 != 4
    r = (yield x)
    v = 0x1f | 1 ^ 2 & 3 << 4 >> 5 // 6 % 7 / 8 * ~9 if False else True

class C(Base, metaclass=M):
    def method(self):
        return self.x

if __name__ == "__main__":
    main()
elif x:
    pass
else:
    pass
"#;
    let tree = suite(text);
    assert!(tree.is_ok(), "{tree:?}");
}

#[test]
fn syntax_errors() {
    assert_eq!(syntax_error(suite("a = = b\n")), ("invalid syntax".to_owned(), range(4, 5)));
    assert_eq!(syntax_error(suite("  x = 1\n")).0, "unexpected indent");
    assert_eq!(syntax_error(suite("def = 1\n")).0, "expected a name");
    assert_eq!(syntax_error(suite("if x\n    y\n")).0, "expected ':'");
    assert_eq!(syntax_error(suite("try:\n    x\ny\n")).0, "expected 'except' or 'finally' block");
    assert_eq!(syntax_error(expr("1 2")).0, "expected end of input");
    assert_eq!(syntax_error(expr("")).0, "invalid syntax");
    assert_eq!(syntax_error(expr("(1,")).0, "unexpected EOF in multi-line statement");
    assert_eq!(syntax_error(expr("a $ b")).0, "invalid character '$'");
}

#[test]
fn errors_render_with_a_snippet() {
    let text = "a = = b\n";
    let Err(ParseError::Syntax(diagnostic)) = suite(text) else { panic!("expected an error") };
    let rendered =
        diagnostic.render(&birch_errors::Renderer::plain(), "<input>", text).to_string();
    assert!(rendered.contains("invalid syntax"), "{rendered}");
    assert!(rendered.contains("a = = b"), "{rendered}");
}

#[test]
fn nesting_limit() {
    let nested = |depth: usize| format!("{}{}", "[".repeat(depth), "]".repeat(depth));

    assert!(expr(&nested(93)).is_ok());
    assert_eq!(expr(&nested(100)), Err(ParseError::ResourceExhausted { limit: 1500 }));
    assert_eq!(
        suite(&format!("x = {}\n", nested(100))),
        Err(ParseError::ResourceExhausted { limit: 1500 })
    );

    let config = Config::default().with_max_depth(17);
    assert!(expr_with_config("x", &config).is_ok());
    assert_eq!(
        expr_with_config("x", &config.with_max_depth(16)),
        Err(ParseError::ResourceExhausted { limit: 16 })
    );
}

#[test]
fn generator_return() {
    let text = "def f():\n    yield 1\n    return 2\n";
    assert_eq!(syntax_error(suite(text)).0, "'return' with argument inside generator");

    let config = Config::default().with_generator_return(GeneratorReturn::Allow);
    assert!(suite_with_config(text, &config).is_ok());

    assert!(suite("def f():\n    yield 1\n    return\n").is_ok());
    assert!(suite("def f():\n    def g():\n        yield 1\n    return 2\n").is_ok());
}
