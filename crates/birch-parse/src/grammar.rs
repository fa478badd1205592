use birch_syntax::Symbol::{self, *};
use birch_syntax::SymbolSet;

use crate::parser::Parser;

pub(crate) mod exprs;
pub(crate) mod stmts;

pub(crate) fn file_input(p: &mut Parser<'_>) {
    let m = p.start();
    while !p.at(ENDMARKER) {
        if !p.eat(NEWLINE) {
            stmts::stmt(p);
        }
    }
    p.expect(ENDMARKER);
    m.complete(p, FILE_INPUT);
}

pub(crate) fn eval_input(p: &mut Parser<'_>) {
    let m = p.start();
    exprs::testlist(p);
    while p.eat(NEWLINE) {}
    p.expect(ENDMARKER);
    m.complete(p, EVAL_INPUT);
}

/// `operand (op operand)*` where `op` is any token of `operators`.
fn binary(
    p: &mut Parser<'_>,
    symbol: Symbol,
    operators: &SymbolSet,
    operand: fn(&mut Parser<'_>),
) {
    let m = p.start();
    operand(p);
    while p.at_any(operators) {
        p.advance();
        operand(p);
    }
    m.complete(p, symbol);
}

/// `first (',' item)* [',']`, stopping at a comma that no item follows.
fn comma_list(
    p: &mut Parser<'_>,
    symbol: Symbol,
    item: fn(&mut Parser<'_>),
    at_item: fn(&Parser<'_>) -> bool,
) {
    let m = p.start();
    item(p);
    while p.eat(COMMA) && at_item(p) {
        item(p);
    }
    m.complete(p, symbol);
}

/// Parameter lists of `def` (typed) and `lambda`.
fn parameter_list(p: &mut Parser<'_>, symbol: Symbol, param: fn(&mut Parser<'_>)) {
    let m = p.start();
    loop {
        if p.at(STAR) || p.at(DOUBLESTAR) {
            star_parameters(p, param);
            break;
        }

        param(p);
        if p.eat(EQUAL) {
            exprs::test(p);
        }
        if !p.eat(COMMA) || !(p.at_name() || p.at(STAR) || p.at(DOUBLESTAR)) {
            break;
        }
    }
    m.complete(p, symbol);
}

fn star_parameters(p: &mut Parser<'_>, param: fn(&mut Parser<'_>)) {
    if p.eat(DOUBLESTAR) {
        param(p);
        return;
    }

    p.expect(STAR);
    if p.at_name() {
        param(p);
    }
    while p.eat(COMMA) {
        if p.eat(DOUBLESTAR) {
            param(p);
            return;
        }
        param(p);
        if p.eat(EQUAL) {
            exprs::test(p);
        }
    }
}

pub(crate) fn tfpdef(p: &mut Parser<'_>) {
    let m = p.start();
    p.expect_name();
    if p.eat(COLON) {
        exprs::test(p);
    }
    m.complete(p, TFPDEF);
}

pub(crate) fn vfpdef(p: &mut Parser<'_>) {
    let m = p.start();
    p.expect_name();
    m.complete(p, VFPDEF);
}
