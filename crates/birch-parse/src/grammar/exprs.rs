use birch_syntax::Symbol::*;
use birch_syntax::SymbolSet;

use super::{binary, comma_list, parameter_list, vfpdef};
use crate::parser::Parser;

const COMPARISON_OPERATORS: SymbolSet =
    SymbolSet::new([LESS, GREATER, EQEQUAL, GREATEREQUAL, LESSEQUAL, NOTEQUAL]);
const EXPR_OPERATORS: SymbolSet = SymbolSet::new([VBAR]);
const XOR_OPERATORS: SymbolSet = SymbolSet::new([CIRCUMFLEX]);
const AND_OPERATORS: SymbolSet = SymbolSet::new([AMPER]);
const SHIFT_OPERATORS: SymbolSet = SymbolSet::new([LEFTSHIFT, RIGHTSHIFT]);
const ARITH_OPERATORS: SymbolSet = SymbolSet::new([PLUS, MINUS]);
const TERM_OPERATORS: SymbolSet = SymbolSet::new([STAR, SLASH, PERCENT, DOUBLESLASH]);
const UNARY_OPERATORS: SymbolSet = SymbolSet::new([PLUS, MINUS, TILDE]);
const TRAILER_FIRST: SymbolSet = SymbolSet::new([LPAR, LSQB, DOT]);
const LITERAL_FIRST: SymbolSet =
    SymbolSet::new([NUMBER, STRING, LPAR, LSQB, LBRACE, PLUS, MINUS, TILDE]);

pub(crate) fn at_test_start(p: &Parser<'_>) -> bool {
    p.at_any(&LITERAL_FIRST)
        || p.at_name()
        || matches!(p.keyword(), Some("None" | "True" | "False" | "lambda" | "not"))
}

fn at_comp_op(p: &Parser<'_>) -> bool {
    p.at_any(&COMPARISON_OPERATORS) || matches!(p.keyword(), Some("in" | "not" | "is"))
}

fn at_comp_iter(p: &Parser<'_>) -> bool {
    p.at_keyword("for") || p.at_keyword("if")
}

pub(crate) fn test(p: &mut Parser<'_>) {
    let m = p.start();
    if p.at_keyword("lambda") {
        lambdef(p);
    } else {
        or_test(p);
        if p.eat_keyword("if") {
            or_test(p);
            p.expect_keyword("else");
            test(p);
        }
    }
    m.complete(p, TEST);
}

fn test_nocond(p: &mut Parser<'_>) {
    let m = p.start();
    if p.at_keyword("lambda") {
        let lambda = p.start();
        lambda_head(p);
        test_nocond(p);
        lambda.complete(p, LAMBDEF_NOCOND);
    } else {
        or_test(p);
    }
    m.complete(p, TEST_NOCOND);
}

fn lambdef(p: &mut Parser<'_>) {
    let m = p.start();
    lambda_head(p);
    test(p);
    m.complete(p, LAMBDEF);
}

/// `'lambda' [varargslist] ':'`
fn lambda_head(p: &mut Parser<'_>) {
    p.expect_keyword("lambda");
    if !p.at(COLON) {
        parameter_list(p, VARARGSLIST, vfpdef);
    }
    p.expect(COLON);
}

pub(crate) fn or_test(p: &mut Parser<'_>) {
    let m = p.start();
    and_test(p);
    while p.eat_keyword("or") {
        and_test(p);
    }
    m.complete(p, OR_TEST);
}

fn and_test(p: &mut Parser<'_>) {
    let m = p.start();
    not_test(p);
    while p.eat_keyword("and") {
        not_test(p);
    }
    m.complete(p, AND_TEST);
}

fn not_test(p: &mut Parser<'_>) {
    let m = p.start();
    if p.eat_keyword("not") {
        not_test(p);
    } else {
        comparison(p);
    }
    m.complete(p, NOT_TEST);
}

fn comparison(p: &mut Parser<'_>) {
    let m = p.start();
    expr(p);
    while at_comp_op(p) {
        comp_op(p);
        expr(p);
    }
    m.complete(p, COMPARISON);
}

fn comp_op(p: &mut Parser<'_>) {
    let m = p.start();
    if p.eat_keyword("not") {
        p.expect_keyword("in");
    } else if p.eat_keyword("is") {
        p.eat_keyword("not");
    } else {
        p.advance();
    }
    m.complete(p, COMP_OP);
}

fn star_expr(p: &mut Parser<'_>) {
    let m = p.start();
    p.expect(STAR);
    expr(p);
    m.complete(p, STAR_EXPR);
}

pub(crate) fn expr(p: &mut Parser<'_>) {
    binary(p, EXPR, &EXPR_OPERATORS, xor_expr);
}

fn xor_expr(p: &mut Parser<'_>) {
    binary(p, XOR_EXPR, &XOR_OPERATORS, and_expr);
}

fn and_expr(p: &mut Parser<'_>) {
    binary(p, AND_EXPR, &AND_OPERATORS, shift_expr);
}

fn shift_expr(p: &mut Parser<'_>) {
    binary(p, SHIFT_EXPR, &SHIFT_OPERATORS, arith_expr);
}

fn arith_expr(p: &mut Parser<'_>) {
    binary(p, ARITH_EXPR, &ARITH_OPERATORS, term);
}

fn term(p: &mut Parser<'_>) {
    binary(p, TERM, &TERM_OPERATORS, factor);
}

fn factor(p: &mut Parser<'_>) {
    let m = p.start();
    if p.at_any(&UNARY_OPERATORS) {
        p.advance();
        factor(p);
    } else {
        power(p);
    }
    m.complete(p, FACTOR);
}

fn power(p: &mut Parser<'_>) {
    let m = p.start();
    atom(p);
    while p.at_any(&TRAILER_FIRST) {
        trailer(p);
    }
    if p.eat(DOUBLESTAR) {
        factor(p);
    }
    m.complete(p, POWER);
}

fn atom(p: &mut Parser<'_>) {
    let m = p.start();
    match p.peek() {
        LPAR => {
            p.advance();
            if p.at_keyword("yield") {
                yield_expr(p);
            } else if !p.at(RPAR) {
                testlist_comp(p);
            }
            p.expect(RPAR);
        }
        LSQB => {
            p.advance();
            if !p.at(RSQB) {
                testlist_comp(p);
            }
            p.expect(RSQB);
        }
        LBRACE => {
            p.advance();
            if !p.at(RBRACE) {
                dictorsetmaker(p);
            }
            p.expect(RBRACE);
        }
        NUMBER => p.advance(),
        STRING => {
            while p.at(STRING) {
                p.advance();
            }
        }
        NAME if p.at_name() || matches!(p.keyword(), Some("None" | "True" | "False")) => {
            p.advance();
        }
        _ => p.error("invalid syntax"),
    }
    m.complete(p, ATOM);
}

fn testlist_comp(p: &mut Parser<'_>) {
    let m = p.start();
    test(p);
    if p.at_keyword("for") {
        comp_for(p);
    } else {
        while p.eat(COMMA) && at_test_start(p) {
            test(p);
        }
    }
    m.complete(p, TESTLIST_COMP);
}

fn trailer(p: &mut Parser<'_>) {
    let m = p.start();
    match p.peek() {
        LPAR => {
            p.advance();
            if !p.at(RPAR) {
                arglist(p);
            }
            p.expect(RPAR);
        }
        LSQB => {
            p.advance();
            comma_list(p, SUBSCRIPTLIST, subscript, |p| at_test_start(p) || p.at(COLON));
            p.expect(RSQB);
        }
        _ => {
            p.expect(DOT);
            p.expect_name();
        }
    }
    m.complete(p, TRAILER);
}

fn subscript(p: &mut Parser<'_>) {
    let m = p.start();
    if !p.at(COLON) {
        test(p);
    }
    if p.eat(COLON) {
        if at_test_start(p) {
            test(p);
        }
        if p.at(COLON) {
            let sliceop = p.start();
            p.advance();
            if at_test_start(p) {
                test(p);
            }
            sliceop.complete(p, SLICEOP);
        }
    }
    m.complete(p, SUBSCRIPT);
}

fn expr_or_star(p: &mut Parser<'_>) {
    if p.at(STAR) { star_expr(p) } else { expr(p) }
}

pub(crate) fn exprlist(p: &mut Parser<'_>) {
    comma_list(p, EXPRLIST, expr_or_star, |p| at_test_start(p) || p.at(STAR));
}

pub(crate) fn testlist(p: &mut Parser<'_>) {
    comma_list(p, TESTLIST, test, at_test_start);
}

fn dictorsetmaker(p: &mut Parser<'_>) {
    let m = p.start();
    test(p);
    let is_dict = p.eat(COLON);
    if is_dict {
        test(p);
    }

    if p.at_keyword("for") {
        comp_for(p);
    } else {
        while p.eat(COMMA) && at_test_start(p) {
            test(p);
            if is_dict {
                p.expect(COLON);
                test(p);
            }
        }
    }
    m.complete(p, DICTORSETMAKER);
}

pub(crate) fn arglist(p: &mut Parser<'_>) {
    let m = p.start();
    loop {
        if p.eat(STAR) {
            test(p);
            while p.eat(COMMA) {
                if p.eat(DOUBLESTAR) {
                    test(p);
                    break;
                }
                argument(p);
            }
            break;
        }
        if p.eat(DOUBLESTAR) {
            test(p);
            break;
        }

        argument(p);
        if !p.eat(COMMA) || !(at_test_start(p) || p.at(STAR) || p.at(DOUBLESTAR)) {
            break;
        }
    }
    m.complete(p, ARGLIST);
}

fn argument(p: &mut Parser<'_>) {
    let m = p.start();
    test(p);
    if p.at_keyword("for") {
        comp_for(p);
    } else if p.eat(EQUAL) {
        test(p);
    }
    m.complete(p, ARGUMENT);
}

fn comp_iter(p: &mut Parser<'_>) {
    let m = p.start();
    if p.at_keyword("for") {
        comp_for(p);
    } else {
        comp_if(p);
    }
    m.complete(p, COMP_ITER);
}

fn comp_for(p: &mut Parser<'_>) {
    let m = p.start();
    p.expect_keyword("for");
    exprlist(p);
    p.expect_keyword("in");
    or_test(p);
    if at_comp_iter(p) {
        comp_iter(p);
    }
    m.complete(p, COMP_FOR);
}

fn comp_if(p: &mut Parser<'_>) {
    let m = p.start();
    p.expect_keyword("if");
    test_nocond(p);
    if at_comp_iter(p) {
        comp_iter(p);
    }
    m.complete(p, COMP_IF);
}

pub(crate) fn yield_expr(p: &mut Parser<'_>) {
    let m = p.start();
    p.expect_keyword("yield");
    if at_test_start(p) {
        testlist(p);
    }
    m.complete(p, YIELD_EXPR);
}
