use birch_syntax::Symbol::{self, *};
use birch_syntax::SymbolSet;

use super::exprs::{self, at_test_start};
use super::{comma_list, parameter_list, tfpdef};
use crate::parser::Parser;

const AUGMENTED_ASSIGNMENTS: SymbolSet = SymbolSet::new([
    PLUSEQUAL,
    MINEQUAL,
    STAREQUAL,
    SLASHEQUAL,
    PERCENTEQUAL,
    AMPEREQUAL,
    VBAREQUAL,
    CIRCUMFLEXEQUAL,
    LEFTSHIFTEQUAL,
    RIGHTSHIFTEQUAL,
    DOUBLESTAREQUAL,
    DOUBLESLASHEQUAL,
]);

fn at_compound_stmt(p: &Parser<'_>) -> bool {
    p.at(AT)
        || matches!(
            p.keyword(),
            Some("if" | "while" | "for" | "try" | "with" | "def" | "class")
        )
}

pub(crate) fn stmt(p: &mut Parser<'_>) {
    let m = p.start();
    if at_compound_stmt(p) {
        compound_stmt(p);
    } else {
        simple_stmt(p);
    }
    m.complete(p, STMT);
}

fn simple_stmt(p: &mut Parser<'_>) {
    let m = p.start();
    small_stmt(p);
    while p.eat(SEMI) && !p.at(NEWLINE) {
        small_stmt(p);
    }
    p.expect(NEWLINE);
    m.complete(p, SIMPLE_STMT);
}

fn small_stmt(p: &mut Parser<'_>) {
    let m = p.start();
    match p.keyword() {
        Some("del") => {
            let del = p.start();
            p.advance();
            exprs::exprlist(p);
            del.complete(p, DEL_STMT);
        }
        Some("pass") => single(p, PASS_STMT),
        Some("break" | "continue" | "return" | "raise" | "yield") => flow_stmt(p),
        Some("import" | "from") => import_stmt(p),
        Some("global") => names_stmt(p, GLOBAL_STMT),
        Some("nonlocal") => names_stmt(p, NONLOCAL_STMT),
        Some("assert") => {
            let assert = p.start();
            p.advance();
            exprs::test(p);
            if p.eat(COMMA) {
                exprs::test(p);
            }
            assert.complete(p, ASSERT_STMT);
        }
        _ => expr_stmt(p),
    }
    m.complete(p, SMALL_STMT);
}

/// A node wrapping the current token alone.
fn single(p: &mut Parser<'_>, symbol: Symbol) {
    let m = p.start();
    p.advance();
    m.complete(p, symbol);
}

fn names_stmt(p: &mut Parser<'_>, symbol: Symbol) {
    let m = p.start();
    p.advance();
    p.expect_name();
    while p.eat(COMMA) {
        p.expect_name();
    }
    m.complete(p, symbol);
}

fn expr_stmt(p: &mut Parser<'_>) {
    let m = p.start();
    exprs::testlist(p);
    if p.at_any(&AUGMENTED_ASSIGNMENTS) {
        single(p, AUGASSIGN);
        yield_or_testlist(p);
    } else {
        while p.eat(EQUAL) {
            yield_or_testlist(p);
        }
    }
    m.complete(p, EXPR_STMT);
}

fn yield_or_testlist(p: &mut Parser<'_>) {
    if p.at_keyword("yield") { exprs::yield_expr(p) } else { exprs::testlist(p) }
}

fn flow_stmt(p: &mut Parser<'_>) {
    let m = p.start();
    match p.keyword() {
        Some("break") => single(p, BREAK_STMT),
        Some("continue") => single(p, CONTINUE_STMT),
        Some("return") => {
            let ret = p.start();
            p.advance();
            if at_test_start(p) {
                exprs::testlist(p);
            }
            ret.complete(p, RETURN_STMT);
        }
        Some("raise") => {
            let raise = p.start();
            p.advance();
            if at_test_start(p) {
                exprs::test(p);
                if p.eat_keyword("from") {
                    exprs::test(p);
                }
            }
            raise.complete(p, RAISE_STMT);
        }
        _ => {
            let stmt = p.start();
            exprs::yield_expr(p);
            stmt.complete(p, YIELD_STMT);
        }
    }
    m.complete(p, FLOW_STMT);
}

fn import_stmt(p: &mut Parser<'_>) {
    let m = p.start();
    if p.at_keyword("import") {
        let import = p.start();
        p.advance();
        comma_list_strict(p, DOTTED_AS_NAMES, dotted_as_name);
        import.complete(p, IMPORT_NAME);
    } else {
        import_from(p);
    }
    m.complete(p, IMPORT_STMT);
}

fn import_from(p: &mut Parser<'_>) {
    let m = p.start();
    p.expect_keyword("from");
    let mut dots = 0;
    while p.eat(DOT) {
        dots += 1;
    }
    if dots == 0 || p.at_name() {
        dotted_name(p);
    }

    p.expect_keyword("import");
    if p.eat(LPAR) {
        import_as_names(p);
        p.expect(RPAR);
    } else if !p.eat(STAR) {
        import_as_names(p);
    }
    m.complete(p, IMPORT_FROM);
}

fn import_as_names(p: &mut Parser<'_>) {
    comma_list(p, IMPORT_AS_NAMES, import_as_name, |p| p.at_name());
}

fn import_as_name(p: &mut Parser<'_>) {
    let m = p.start();
    p.expect_name();
    if p.eat_keyword("as") {
        p.expect_name();
    }
    m.complete(p, IMPORT_AS_NAME);
}

fn dotted_as_name(p: &mut Parser<'_>) {
    let m = p.start();
    dotted_name(p);
    if p.eat_keyword("as") {
        p.expect_name();
    }
    m.complete(p, DOTTED_AS_NAME);
}

fn dotted_name(p: &mut Parser<'_>) {
    let m = p.start();
    p.expect_name();
    while p.eat(DOT) {
        p.expect_name();
    }
    m.complete(p, DOTTED_NAME);
}

/// `item (',' item)*` with no trailing comma.
fn comma_list_strict(p: &mut Parser<'_>, symbol: Symbol, item: fn(&mut Parser<'_>)) {
    let m = p.start();
    item(p);
    while p.eat(COMMA) {
        item(p);
    }
    m.complete(p, symbol);
}

fn compound_stmt(p: &mut Parser<'_>) {
    let m = p.start();
    match p.keyword() {
        Some("if") => if_stmt(p),
        Some("while") => while_stmt(p),
        Some("for") => for_stmt(p),
        Some("try") => try_stmt(p),
        Some("with") => with_stmt(p),
        Some("def") => funcdef(p),
        Some("class") => classdef(p),
        _ => decorated(p),
    }
    m.complete(p, COMPOUND_STMT);
}

/// `':' suite`
fn block(p: &mut Parser<'_>) {
    p.expect(COLON);
    suite(p);
}

fn else_block(p: &mut Parser<'_>) {
    if p.eat_keyword("else") {
        block(p);
    }
}

fn if_stmt(p: &mut Parser<'_>) {
    let m = p.start();
    p.advance();
    exprs::test(p);
    block(p);
    while p.eat_keyword("elif") {
        exprs::test(p);
        block(p);
    }
    else_block(p);
    m.complete(p, IF_STMT);
}

fn while_stmt(p: &mut Parser<'_>) {
    let m = p.start();
    p.advance();
    exprs::test(p);
    block(p);
    else_block(p);
    m.complete(p, WHILE_STMT);
}

fn for_stmt(p: &mut Parser<'_>) {
    let m = p.start();
    p.advance();
    exprs::exprlist(p);
    p.expect_keyword("in");
    exprs::testlist(p);
    block(p);
    else_block(p);
    m.complete(p, FOR_STMT);
}

fn try_stmt(p: &mut Parser<'_>) {
    let m = p.start();
    p.advance();
    block(p);

    if p.eat_keyword("finally") {
        block(p);
    } else {
        if !p.at_keyword("except") {
            p.error("expected 'except' or 'finally' block");
        }
        while p.at_keyword("except") {
            except_clause(p);
            block(p);
        }
        else_block(p);
        if p.eat_keyword("finally") {
            block(p);
        }
    }
    m.complete(p, TRY_STMT);
}

fn except_clause(p: &mut Parser<'_>) {
    let m = p.start();
    p.advance();
    if at_test_start(p) {
        exprs::test(p);
        if p.eat_keyword("as") {
            p.expect_name();
        }
    }
    m.complete(p, EXCEPT_CLAUSE);
}

fn with_stmt(p: &mut Parser<'_>) {
    let m = p.start();
    p.advance();
    with_item(p);
    while p.eat(COMMA) {
        with_item(p);
    }
    block(p);
    m.complete(p, WITH_STMT);
}

fn with_item(p: &mut Parser<'_>) {
    let m = p.start();
    exprs::test(p);
    if p.eat_keyword("as") {
        exprs::expr(p);
    }
    m.complete(p, WITH_ITEM);
}

fn suite(p: &mut Parser<'_>) {
    let m = p.start();
    if p.eat(NEWLINE) {
        p.expect(INDENT);
        loop {
            stmt(p);
            if p.at(DEDENT) || p.at(ENDMARKER) {
                break;
            }
        }
        p.expect(DEDENT);
    } else {
        simple_stmt(p);
    }
    m.complete(p, SUITE);
}

fn funcdef(p: &mut Parser<'_>) {
    let m = p.start();
    p.expect_keyword("def");
    p.expect_name();

    let parameters = p.start();
    p.expect(LPAR);
    if !p.at(RPAR) {
        parameter_list(p, TYPEDARGSLIST, tfpdef);
    }
    p.expect(RPAR);
    parameters.complete(p, PARAMETERS);

    if p.eat(RARROW) {
        exprs::test(p);
    }
    block(p);
    m.complete(p, FUNCDEF);
}

fn classdef(p: &mut Parser<'_>) {
    let m = p.start();
    p.expect_keyword("class");
    p.expect_name();
    if p.eat(LPAR) {
        if !p.at(RPAR) {
            exprs::arglist(p);
        }
        p.expect(RPAR);
    }
    block(p);
    m.complete(p, CLASSDEF);
}

fn decorated(p: &mut Parser<'_>) {
    let m = p.start();

    let decorators = p.start();
    while p.at(AT) {
        let decorator = p.start();
        p.advance();
        dotted_name(p);
        if p.eat(LPAR) {
            if !p.at(RPAR) {
                exprs::arglist(p);
            }
            p.expect(RPAR);
        }
        p.expect(NEWLINE);
        decorator.complete(p, DECORATOR);
    }
    decorators.complete(p, DECORATORS);

    match p.keyword() {
        Some("class") => classdef(p),
        Some("def") => funcdef(p),
        _ => p.error("expected a function or class definition"),
    }
    m.complete(p, DECORATED);
}
