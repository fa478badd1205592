//! Lowering of concrete syntax trees into [`ir`](crate::ir).
//!
//! Single-child chains such as `test > or_test > ... > atom` carry no meaning
//! of their own and are skipped. The tree is already known to follow the
//! grammar, so the shape checks here only guard against trees that were
//! built by hand.

use birch_syntax::{Node, Symbol};
use la_arena::Arena;

use crate::error::{CompileError, SyntaxError};
use crate::ir::{
    BinaryOp, Body, BoolOp, CompareOp, ComprehensionKind, Constant, Entry, Expr, ExprData,
    Generator, Stmt, Subscript, Target, UnaryOp,
};
use crate::literal::{self, LiteralError, Text};

type Result<T, E = CompileError> = std::result::Result<T, E>;

pub(crate) fn lower(root: &Node, max_nesting: usize) -> Result<Body> {
    let mut lowerer = Lowerer { exprs: Arena::new(), loops: 0, depth: 0, max_nesting };
    let entry = match root.symbol() {
        Symbol::EVAL_INPUT => Entry::Expression(lowerer.expr(nth(root, 0)?)?),
        Symbol::FILE_INPUT => {
            let mut stmts = Vec::new();
            for child in root.children().iter().filter(|child| child.symbol() == Symbol::STMT) {
                lowerer.stmt(child, &mut stmts)?;
            }
            Entry::Module(stmts)
        }
        _ => return Err(malformed(root)),
    };
    Ok(Body { exprs: lowerer.exprs, entry })
}

/// Where a target appears, for error messages.
#[derive(Clone, Copy)]
enum Context {
    Store,
    Delete,
}

struct Lowerer {
    exprs: Arena<ExprData>,
    /// Enclosing loops of the statement being lowered.
    loops: usize,
    depth: usize,
    max_nesting: usize,
}

impl Lowerer {
    fn alloc(&mut self, data: ExprData) -> Expr {
        self.exprs.alloc(data)
    }

    fn nested<T>(&mut self, node: &Node, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= self.max_nesting {
            return Err(unsupported("nesting beyond the depth limit", node));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn stmt(&mut self, node: &Node, out: &mut Vec<Stmt>) -> Result<()> {
        self.nested(node, |this| {
            let inner = nth(node, 0)?;
            match inner.symbol() {
                Symbol::SIMPLE_STMT => this.simple_stmt(inner, out),
                Symbol::COMPOUND_STMT => {
                    out.push(this.compound_stmt(nth(inner, 0)?)?);
                    Ok(())
                }
                _ => Err(malformed(node)),
            }
        })
    }

    fn simple_stmt(&mut self, node: &Node, out: &mut Vec<Stmt>) -> Result<()> {
        for small in node.children().iter().filter(|child| child.symbol() == Symbol::SMALL_STMT) {
            out.push(self.small_stmt(nth(small, 0)?)?);
        }
        Ok(())
    }

    fn small_stmt(&mut self, node: &Node) -> Result<Stmt> {
        match node.symbol() {
            Symbol::EXPR_STMT => self.expr_stmt(node),
            Symbol::DEL_STMT => {
                let targets = nth(node, 1)?;
                let targets = items(targets)
                    .map(|target| self.target(target, Context::Delete))
                    .collect::<Result<_>>()?;
                Ok(Stmt::Delete(targets))
            }
            Symbol::PASS_STMT => Ok(Stmt::Pass),
            Symbol::FLOW_STMT => {
                let flow = nth(node, 0)?;
                match flow.symbol() {
                    Symbol::BREAK_STMT if self.loops > 0 => Ok(Stmt::Break),
                    Symbol::BREAK_STMT => Err(syntax("'break' outside loop", flow)),
                    Symbol::CONTINUE_STMT if self.loops > 0 => Ok(Stmt::Continue),
                    Symbol::CONTINUE_STMT => Err(syntax("'continue' not properly in loop", flow)),
                    Symbol::RETURN_STMT => Err(syntax("'return' outside function", flow)),
                    Symbol::YIELD_STMT => Err(syntax("'yield' outside function", flow)),
                    Symbol::RAISE_STMT => Err(unsupported("raise statement", flow)),
                    _ => Err(malformed(flow)),
                }
            }
            Symbol::IMPORT_STMT => Err(unsupported("import statement", node)),
            Symbol::GLOBAL_STMT => Err(unsupported("global statement", node)),
            Symbol::NONLOCAL_STMT => {
                Err(syntax("nonlocal declaration not allowed at module level", node))
            }
            Symbol::ASSERT_STMT => {
                let test = self.expr(nth(node, 1)?)?;
                let message = node.child(3).map(|message| self.expr(message)).transpose()?;
                Ok(Stmt::Assert { test, message })
            }
            _ => Err(malformed(node)),
        }
    }

    fn expr_stmt(&mut self, node: &Node) -> Result<Stmt> {
        match node.children() {
            [value] => Ok(Stmt::Expr(self.expr(value)?)),
            [target, op, value] if op.symbol() == Symbol::AUGASSIGN => {
                let target = self.augmented_target(target)?;
                let op = augmented_op(nth(op, 0)?)?;
                let value = self.expr(value)?;
                Ok(Stmt::AugAssign { target, op, value })
            }
            [targets @ .., value] => {
                let targets = targets
                    .iter()
                    .filter(|target| target.symbol() != Symbol::EQUAL)
                    .map(|target| self.target(target, Context::Store))
                    .collect::<Result<_>>()?;
                let value = self.expr(value)?;
                Ok(Stmt::Assign { targets, value })
            }
            [] => Err(malformed(node)),
        }
    }

    fn compound_stmt(&mut self, node: &Node) -> Result<Stmt> {
        let children = node.children();
        match node.symbol() {
            Symbol::IF_STMT => {
                let mut branches = Vec::new();
                let mut orelse = Vec::new();
                let mut index = 0;
                while let Some(keyword) = children.get(index) {
                    if keyword.text() == Some("else") {
                        orelse = self.suite(nth(node, index + 2)?)?;
                        break;
                    }
                    let test = self.expr(nth(node, index + 1)?)?;
                    branches.push((test, self.suite(nth(node, index + 3)?)?));
                    index += 4;
                }

                if branches.is_empty() {
                    return Err(malformed(node));
                }
                Ok(Stmt::If { branches, orelse })
            }
            Symbol::WHILE_STMT => {
                let test = self.expr(nth(node, 1)?)?;
                let body = self.loop_body(nth(node, 3)?)?;
                let orelse = children.get(6).map(|suite| self.suite(suite)).transpose()?;
                Ok(Stmt::While { test, body, orelse: orelse.unwrap_or_default() })
            }
            Symbol::FOR_STMT => {
                let target = self.target(nth(node, 1)?, Context::Store)?;
                let iter = self.expr(nth(node, 3)?)?;
                let body = self.loop_body(nth(node, 5)?)?;
                let orelse = children.get(8).map(|suite| self.suite(suite)).transpose()?;
                Ok(Stmt::For { target, iter, body, orelse: orelse.unwrap_or_default() })
            }
            Symbol::TRY_STMT => Err(unsupported("try statement", node)),
            Symbol::WITH_STMT => Err(unsupported("with statement", node)),
            Symbol::FUNCDEF => Err(unsupported("function definition", node)),
            Symbol::CLASSDEF => Err(unsupported("class definition", node)),
            Symbol::DECORATED => Err(unsupported("decorator", node)),
            _ => Err(malformed(node)),
        }
    }

    fn loop_body(&mut self, suite: &Node) -> Result<Vec<Stmt>> {
        self.loops += 1;
        let body = self.suite(suite);
        self.loops -= 1;
        body
    }

    fn suite(&mut self, node: &Node) -> Result<Vec<Stmt>> {
        let mut stmts = Vec::new();
        match node.children() {
            [simple] if simple.symbol() == Symbol::SIMPLE_STMT => {
                self.simple_stmt(simple, &mut stmts)?;
            }
            children => {
                for stmt in children.iter().filter(|child| child.symbol() == Symbol::STMT) {
                    self.stmt(stmt, &mut stmts)?;
                }
            }
        }
        Ok(stmts)
    }

    fn target(&mut self, node: &Node, context: Context) -> Result<Target> {
        self.nested(node, |this| this.target_inner(node, context))
    }

    fn target_inner(&mut self, node: &Node, context: Context) -> Result<Target> {
        let node = descend(node);
        let invalid = |what: &str| {
            let verb = match context {
                Context::Store => "assign to",
                Context::Delete => "delete",
            };
            syntax(format!("can't {verb} {what}"), node)
        };

        match node.symbol() {
            Symbol::NAME => match node.text().unwrap_or_default() {
                "None" | "True" | "False" => Err(invalid("keyword")),
                name => Ok(Target::Name(name.into())),
            },
            Symbol::NUMBER | Symbol::STRING => Err(invalid("literal")),
            Symbol::TESTLIST | Symbol::EXPRLIST | Symbol::TESTLIST_COMP => {
                if has_comp_for(node) {
                    return Err(invalid("generator expression"));
                }
                let targets =
                    items(node).map(|item| self.target(item, context)).collect::<Result<_>>()?;
                Ok(Target::Sequence(targets))
            }
            Symbol::ATOM => match node.children() {
                [open, close]
                    if open.symbol() != Symbol::LBRACE && close.symbol() != Symbol::STRING =>
                {
                    Ok(Target::Sequence(Vec::new()))
                }
                [open, inner, _] if open.symbol() == Symbol::LPAR => match inner.symbol() {
                    Symbol::YIELD_EXPR => Err(invalid("yield expression")),
                    _ => self.target(inner, context),
                },
                [open, inner, _] if open.symbol() == Symbol::LSQB => {
                    if has_comp_for(inner) {
                        return Err(invalid("list comprehension"));
                    }
                    let targets =
                        items(inner).map(|item| self.target(item, context)).collect::<Result<_>>()?;
                    Ok(Target::Sequence(targets))
                }
                _ => Err(invalid("literal")),
            },
            Symbol::POWER => match node.children() {
                [.., star, _] if star.symbol() == Symbol::DOUBLESTAR => Err(invalid("operator")),
                [.., trailer] => match nth(trailer, 0)?.symbol() {
                    Symbol::LSQB => {
                        let (value, subscript) = self.subscript_target(node)?;
                        Ok(Target::Subscript(value, subscript))
                    }
                    Symbol::LPAR => Err(invalid("function call")),
                    _ => Err(unsupported("attribute access", trailer)),
                },
                [] => Err(malformed(node)),
            },
            Symbol::COMPARISON => Err(invalid("comparison")),
            Symbol::TEST => Err(invalid("conditional expression")),
            Symbol::LAMBDEF | Symbol::LAMBDEF_NOCOND => Err(invalid("lambda")),
            Symbol::YIELD_EXPR => Err(invalid("yield expression")),
            Symbol::STAR_EXPR => Err(unsupported("starred assignment target", node)),
            _ => Err(invalid("operator")),
        }
    }

    /// The container and subscript of `power` nodes ending in `[...]`.
    fn subscript_target(&mut self, power: &Node) -> Result<(Expr, Subscript)> {
        let [atom, trailers @ .., last] = power.children() else {
            return Err(malformed(power));
        };
        let mut value = self.expr(atom)?;
        for trailer in trailers {
            value = self.trailer(value, trailer)?;
        }
        let subscript = self.subscript_list(nth(last, 1)?)?;
        Ok((value, subscript))
    }

    fn augmented_target(&mut self, node: &Node) -> Result<Target> {
        let node = descend(node);
        match node.symbol() {
            Symbol::NAME if !matches!(node.text(), Some("None" | "True" | "False")) => {
                Ok(Target::Name(node.text().unwrap_or_default().into()))
            }
            Symbol::POWER => match node.children() {
                [.., star, _] if star.symbol() == Symbol::DOUBLESTAR => {
                    Err(syntax("illegal expression for augmented assignment", node))
                }
                [.., trailer] if nth(trailer, 0)?.symbol() == Symbol::LSQB => {
                    let (value, subscript) = self.subscript_target(node)?;
                    Ok(Target::Subscript(value, subscript))
                }
                [.., trailer] if nth(trailer, 0)?.symbol() == Symbol::DOT => {
                    Err(unsupported("attribute access", trailer))
                }
                _ => Err(syntax("illegal expression for augmented assignment", node)),
            },
            _ => Err(syntax("illegal expression for augmented assignment", node)),
        }
    }

    fn expr(&mut self, node: &Node) -> Result<Expr> {
        self.nested(node, |this| this.expr_inner(descend(node)))
    }

    fn expr_inner(&mut self, node: &Node) -> Result<Expr> {
        let children = node.children();
        let data = match node.symbol() {
            Symbol::NAME => match node.text().unwrap_or_default() {
                "None" => ExprData::Const(Constant::None),
                "True" => ExprData::Const(Constant::Bool(true)),
                "False" => ExprData::Const(Constant::Bool(false)),
                name => ExprData::Name(name.into()),
            },
            Symbol::NUMBER => {
                let text = node.text().unwrap_or_default();
                ExprData::Const(literal::number(text).map_err(|error| literal_error(error, node))?)
            }
            Symbol::STRING => ExprData::Const(strings(std::slice::from_ref(node))?),
            Symbol::TESTLIST | Symbol::EXPRLIST | Symbol::TESTLIST_COMP => {
                ExprData::Tuple(self.items(node)?)
            }
            Symbol::TEST => return self.conditional(node),
            Symbol::LAMBDEF | Symbol::LAMBDEF_NOCOND => return Err(unsupported("lambda", node)),
            Symbol::OR_TEST => ExprData::Bool(BoolOp::Or, self.items(node)?),
            Symbol::AND_TEST => ExprData::Bool(BoolOp::And, self.items(node)?),
            Symbol::NOT_TEST | Symbol::FACTOR => return self.prefixed(node),
            Symbol::COMPARISON => {
                let [first, rest @ ..] = children else {
                    return Err(malformed(node));
                };
                let first = self.expr(first)?;
                let mut comparisons = Vec::with_capacity(rest.len() / 2);
                for pair in rest.chunks(2) {
                    let [op, operand] = pair else {
                        return Err(malformed(node));
                    };
                    comparisons.push((compare_op(op)?, self.expr(operand)?));
                }
                ExprData::Compare(first, comparisons)
            }
            Symbol::STAR_EXPR => return Err(unsupported("starred expression", node)),
            Symbol::EXPR
            | Symbol::XOR_EXPR
            | Symbol::AND_EXPR
            | Symbol::SHIFT_EXPR
            | Symbol::ARITH_EXPR
            | Symbol::TERM => return self.binary(node),
            Symbol::POWER => return self.power(node),
            Symbol::ATOM => return self.atom(node),
            Symbol::YIELD_EXPR => return Err(syntax("'yield' outside function", node)),
            _ => return Err(malformed(node)),
        };
        Ok(self.alloc(data))
    }

    /// `a if c else b if d else e`, walking the `else` chain in a loop.
    fn conditional(&mut self, node: &Node) -> Result<Expr> {
        let mut branches = Vec::new();
        let mut current = node;
        while current.symbol() == Symbol::TEST {
            let [body, _, test, _, orelse] = current.children() else {
                return Err(malformed(current));
            };
            branches.push((self.expr(body)?, self.expr(test)?));
            current = descend(orelse);
        }

        let mut orelse = self.expr(current)?;
        for (body, test) in branches.into_iter().rev() {
            orelse = self.alloc(ExprData::IfElse { test, body, orelse });
        }
        Ok(orelse)
    }

    /// A run of prefix operators such as `not not x` or `-~x`, collected in a
    /// loop and applied innermost first.
    fn prefixed(&mut self, node: &Node) -> Result<Expr> {
        let mut ops = Vec::new();
        let mut current = node;
        loop {
            let op = match (current.symbol(), current.children()) {
                (Symbol::NOT_TEST, [_, _]) => UnaryOp::Not,
                (Symbol::FACTOR, [op, _]) => match op.symbol() {
                    Symbol::PLUS => UnaryOp::Plus,
                    Symbol::MINUS => UnaryOp::Minus,
                    Symbol::TILDE => UnaryOp::Invert,
                    _ => return Err(malformed(current)),
                },
                _ => break,
            };
            ops.push(op);
            current = descend(nth(current, 1)?);
        }

        let mut operand = self.expr(current)?;
        for op in ops.into_iter().rev() {
            operand = self.alloc(ExprData::Unary(op, operand));
        }
        Ok(operand)
    }

    /// Lowers the items of a comma separated list.
    fn items(&mut self, node: &Node) -> Result<Vec<Expr>> {
        items(node).map(|item| self.expr(item)).collect()
    }

    /// Left-associative chain of binary operators.
    fn binary(&mut self, node: &Node) -> Result<Expr> {
        let [first, rest @ ..] = node.children() else {
            return Err(malformed(node));
        };
        let mut lhs = self.expr(first)?;
        for pair in rest.chunks(2) {
            let [op, rhs] = pair else {
                return Err(malformed(node));
            };
            let op = binary_op(op.symbol()).ok_or_else(|| malformed(op))?;
            let rhs = self.expr(rhs)?;
            lhs = self.alloc(ExprData::Binary(lhs, op, rhs));
        }
        Ok(lhs)
    }

    fn power(&mut self, node: &Node) -> Result<Expr> {
        let children = node.children();
        let (primary, exponent) = match children {
            [primary @ .., star, exponent] if star.symbol() == Symbol::DOUBLESTAR => {
                (primary, Some(exponent))
            }
            _ => (children, None),
        };
        let [atom, trailers @ ..] = primary else {
            return Err(malformed(node));
        };

        let mut value = self.expr(atom)?;
        for trailer in trailers {
            value = self.trailer(value, trailer)?;
        }
        if let Some(exponent) = exponent {
            let exponent = self.expr(exponent)?;
            value = self.alloc(ExprData::Binary(value, BinaryOp::Pow, exponent));
        }
        Ok(value)
    }

    fn trailer(&mut self, value: Expr, trailer: &Node) -> Result<Expr> {
        let data = match trailer.children() {
            [open, close] if open.symbol() == Symbol::LPAR && close.symbol() == Symbol::RPAR => {
                ExprData::Call(value, Vec::new())
            }
            [open, args, _] if open.symbol() == Symbol::LPAR => {
                ExprData::Call(value, self.arguments(args)?)
            }
            [open, subscripts, _] if open.symbol() == Symbol::LSQB => {
                ExprData::Subscript(value, self.subscript_list(subscripts)?)
            }
            _ => return Err(unsupported("attribute access", trailer)),
        };
        Ok(self.alloc(data))
    }

    fn arguments(&mut self, arglist: &Node) -> Result<Vec<Expr>> {
        let arguments: Vec<&Node> =
            arglist.children().iter().filter(|child| child.symbol() != Symbol::COMMA).collect();

        let mut exprs = Vec::with_capacity(arguments.len());
        for argument in &arguments {
            match argument.children() {
                _ if argument.symbol() != Symbol::ARGUMENT => {
                    return Err(unsupported("argument unpacking", argument));
                }
                [value] => exprs.push(self.expr(value)?),
                [element, comp_for] if comp_for.symbol() == Symbol::COMP_FOR => {
                    if arguments.len() > 1 {
                        return Err(syntax(
                            "Generator expression must be parenthesized if not sole argument",
                            argument,
                        ));
                    }
                    let kind = ComprehensionKind::Generator;
                    exprs.push(self.comprehension(kind, element, None, comp_for)?);
                }
                _ => return Err(unsupported("keyword argument", argument)),
            }
        }
        Ok(exprs)
    }

    fn subscript_list(&mut self, node: &Node) -> Result<Subscript> {
        if let [subscript] = node.children() {
            return self.subscript(subscript);
        }

        // `x[a, b]` indexes with a tuple.
        let mut indices = Vec::new();
        for subscript in items(node) {
            match subscript.children() {
                [index] if index.symbol() != Symbol::COLON => indices.push(self.expr(index)?),
                _ => return Err(unsupported("extended slice", subscript)),
            }
        }
        let tuple = self.alloc(ExprData::Tuple(indices));
        Ok(Subscript::Index(tuple))
    }

    fn subscript(&mut self, node: &Node) -> Result<Subscript> {
        match node.children() {
            [index] if index.symbol() != Symbol::COLON => {
                return Ok(Subscript::Index(self.expr(index)?));
            }
            _ => {}
        }

        let (mut lower, mut upper, mut step) = (None, None, None);
        let mut seen_colon = false;
        for child in node.children() {
            match child.symbol() {
                Symbol::COLON => seen_colon = true,
                Symbol::SLICEOP => step = child.child(1).map(|step| self.expr(step)).transpose()?,
                _ if seen_colon => upper = Some(self.expr(child)?),
                _ => lower = Some(self.expr(child)?),
            }
        }
        Ok(Subscript::Slice { lower, upper, step })
    }

    fn atom(&mut self, node: &Node) -> Result<Expr> {
        let data = match node.children() {
            [open, _] if open.symbol() == Symbol::LPAR => ExprData::Tuple(Vec::new()),
            [open, _] if open.symbol() == Symbol::LSQB => ExprData::List(Vec::new()),
            [open, _] if open.symbol() == Symbol::LBRACE => ExprData::Dict(Vec::new()),
            [open, inner, _] if open.symbol() == Symbol::LPAR => {
                if inner.symbol() == Symbol::YIELD_EXPR {
                    return Err(syntax("'yield' outside function", inner));
                }
                return match inner.children() {
                    [element, comp_for] if comp_for.symbol() == Symbol::COMP_FOR => {
                        self.comprehension(ComprehensionKind::Generator, element, None, comp_for)
                    }
                    _ => self.expr(inner),
                };
            }
            [open, inner, _] if open.symbol() == Symbol::LSQB => match inner.children() {
                [element, comp_for] if comp_for.symbol() == Symbol::COMP_FOR => {
                    return self.comprehension(ComprehensionKind::List, element, None, comp_for);
                }
                _ => ExprData::List(self.items(inner)?),
            },
            [open, inner, _] if open.symbol() == Symbol::LBRACE => return self.dict_or_set(inner),
            tokens @ [first, ..] if first.symbol() == Symbol::STRING => {
                ExprData::Const(strings(tokens)?)
            }
            _ => return Err(malformed(node)),
        };
        Ok(self.alloc(data))
    }

    fn dict_or_set(&mut self, node: &Node) -> Result<Expr> {
        let children = node.children();
        let is_dict = children.get(1).is_some_and(|child| child.symbol() == Symbol::COLON);

        let data = match children {
            [key, _, value, comp_for] if is_dict && comp_for.symbol() == Symbol::COMP_FOR => {
                return self.comprehension(ComprehensionKind::Dict, key, Some(value), comp_for);
            }
            [element, comp_for] if comp_for.symbol() == Symbol::COMP_FOR => {
                return self.comprehension(ComprehensionKind::Set, element, None, comp_for);
            }
            _ if is_dict => {
                let mut entries = Vec::with_capacity(children.len() / 4 + 1);
                for entry in children.chunks(4) {
                    let [key, _, value, ..] = entry else {
                        return Err(malformed(node));
                    };
                    entries.push((self.expr(key)?, self.expr(value)?));
                }
                ExprData::Dict(entries)
            }
            _ => ExprData::Set(self.items(node)?),
        };
        Ok(self.alloc(data))
    }

    fn comprehension(
        &mut self,
        kind: ComprehensionKind,
        element: &Node,
        value: Option<&Node>,
        comp_for: &Node,
    ) -> Result<Expr> {
        let element = self.expr(element)?;
        let value = value.map(|value| self.expr(value)).transpose()?;

        let mut generators: Vec<Generator> = Vec::new();
        let mut next = Some(comp_for);
        while let Some(clause) = next {
            next = match clause.symbol() {
                Symbol::COMP_ITER => clause.child(0),
                Symbol::COMP_FOR => {
                    let target = self.target(nth(clause, 1)?, Context::Store)?;
                    let iter = self.expr(nth(clause, 3)?)?;
                    generators.push(Generator { target, iter, conditions: Vec::new() });
                    clause.child(4)
                }
                Symbol::COMP_IF => {
                    let condition = self.expr(nth(clause, 1)?)?;
                    let generator = generators.last_mut().ok_or_else(|| malformed(clause))?;
                    generator.conditions.push(condition);
                    clause.child(2)
                }
                _ => return Err(malformed(clause)),
            };
        }

        Ok(self.alloc(ExprData::Comprehension { kind, element, value, generators }))
    }
}

/// Follows single-child links down to the node that determines the meaning.
fn descend(mut node: &Node) -> &Node {
    while let [only] = node.children() {
        // A bare `yield` keeps its own node.
        if node.symbol() == Symbol::YIELD_EXPR {
            break;
        }
        node = only;
    }
    node
}

/// The items of a comma separated list, commas dropped.
fn items(node: &Node) -> impl Iterator<Item = &Node> {
    node.children().iter().filter(|child| child.symbol() != Symbol::COMMA)
}

fn has_comp_for(node: &Node) -> bool {
    node.children().iter().any(|child| child.symbol() == Symbol::COMP_FOR)
}

fn nth(node: &Node, index: usize) -> Result<&Node> {
    node.child(index).ok_or_else(|| malformed(node))
}

/// Adjacent string literals concatenate; text and bytes cannot mix.
fn strings(tokens: &[Node]) -> Result<Constant> {
    let mut text: Option<String> = None;
    let mut bytes: Option<Vec<u8>> = None;

    for token in tokens {
        let decoded = literal::string(token.text().unwrap_or_default())
            .map_err(|error| literal_error(error, token))?;
        match decoded {
            Text::Str(part) if bytes.is_none() => {
                text.get_or_insert_with(String::new).push_str(&part);
            }
            Text::Bytes(part) if text.is_none() => bytes.get_or_insert_with(Vec::new).extend(part),
            _ => return Err(syntax("cannot mix bytes and nonbytes literals", token)),
        }
    }

    Ok(match (text, bytes) {
        (_, Some(bytes)) => Constant::Bytes(bytes.into()),
        (text, None) => Constant::Str(text.unwrap_or_default().into()),
    })
}

fn compare_op(node: &Node) -> Result<CompareOp> {
    let op = match node.children() {
        [op] => match op.symbol() {
            Symbol::LESS => CompareOp::Lt,
            Symbol::GREATER => CompareOp::Gt,
            Symbol::EQEQUAL => CompareOp::Eq,
            Symbol::GREATEREQUAL => CompareOp::GtE,
            Symbol::LESSEQUAL => CompareOp::LtE,
            Symbol::NOTEQUAL => CompareOp::NotEq,
            _ => match op.text() {
                Some("in") => CompareOp::In,
                Some("is") => CompareOp::Is,
                _ => return Err(malformed(node)),
            },
        },
        [first, second] => match (first.text(), second.text()) {
            (Some("not"), Some("in")) => CompareOp::NotIn,
            (Some("is"), Some("not")) => CompareOp::IsNot,
            _ => return Err(malformed(node)),
        },
        _ => return Err(malformed(node)),
    };
    Ok(op)
}

fn binary_op(symbol: Symbol) -> Option<BinaryOp> {
    Some(match symbol {
        Symbol::PLUS => BinaryOp::Add,
        Symbol::MINUS => BinaryOp::Sub,
        Symbol::STAR => BinaryOp::Mul,
        Symbol::SLASH => BinaryOp::Div,
        Symbol::DOUBLESLASH => BinaryOp::FloorDiv,
        Symbol::PERCENT => BinaryOp::Mod,
        Symbol::LEFTSHIFT => BinaryOp::LShift,
        Symbol::RIGHTSHIFT => BinaryOp::RShift,
        Symbol::VBAR => BinaryOp::BitOr,
        Symbol::CIRCUMFLEX => BinaryOp::BitXor,
        Symbol::AMPER => BinaryOp::BitAnd,
        _ => return None,
    })
}

fn augmented_op(token: &Node) -> Result<BinaryOp> {
    Ok(match token.symbol() {
        Symbol::PLUSEQUAL => BinaryOp::Add,
        Symbol::MINEQUAL => BinaryOp::Sub,
        Symbol::STAREQUAL => BinaryOp::Mul,
        Symbol::SLASHEQUAL => BinaryOp::Div,
        Symbol::DOUBLESLASHEQUAL => BinaryOp::FloorDiv,
        Symbol::PERCENTEQUAL => BinaryOp::Mod,
        Symbol::DOUBLESTAREQUAL => BinaryOp::Pow,
        Symbol::LEFTSHIFTEQUAL => BinaryOp::LShift,
        Symbol::RIGHTSHIFTEQUAL => BinaryOp::RShift,
        Symbol::VBAREQUAL => BinaryOp::BitOr,
        Symbol::CIRCUMFLEXEQUAL => BinaryOp::BitXor,
        Symbol::AMPEREQUAL => BinaryOp::BitAnd,
        _ => return Err(malformed(token)),
    })
}

fn syntax(message: impl Into<String>, node: &Node) -> CompileError {
    SyntaxError::new(message, node.first_position()).into()
}

fn unsupported(construct: &'static str, node: &Node) -> CompileError {
    CompileError::Unsupported { construct, position: node.first_position() }
}

fn malformed(node: &Node) -> CompileError {
    syntax(format!("malformed {}", node.symbol().name()), node)
}

fn literal_error(error: LiteralError, token: &Node) -> CompileError {
    match error {
        LiteralError::Syntax(message) => syntax(message, token),
        LiteralError::Unsupported(construct) => unsupported(construct, token),
    }
}
