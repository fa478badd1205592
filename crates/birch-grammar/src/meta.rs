//! Reader for the EBNF notation the production table is written in.
//!
//! The notation is the classic one: `name: alternatives`, with `|`, `( )`,
//! `[ ]` for optional parts, `*`/`+` repetition, quoted keywords and operators
//! and upper-case token names. Continuation lines start with whitespace.

use birch_syntax::Symbol;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Label {
    /// A non-terminal child.
    Rule(Symbol),
    /// A terminal child of the given symbol. A plain `NAME` never matches a keyword.
    Token(Symbol),
    /// A NAME terminal with exactly this text.
    Keyword(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Pattern {
    Label(Label),
    Seq(Vec<Pattern>),
    Alt(Vec<Pattern>),
    Opt(Box<Pattern>),
    Star(Box<Pattern>),
    Plus(Box<Pattern>),
}

#[derive(Debug)]
pub(crate) struct RuleDef {
    pub(crate) symbol: Symbol,
    pub(crate) source: String,
    pub(crate) pattern: Pattern,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tok {
    Ident(&'static str),
    Quoted(&'static str),
    Colon,
    Bar,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Star,
    Plus,
}

/// Splits `text` into rule bodies, joining continuation lines.
fn rule_sources(text: &'static str) -> Vec<Vec<&'static str>> {
    let mut rules: Vec<Vec<&'static str>> = Vec::new();

    for line in text.lines() {
        let code = line.split('#').next().unwrap_or_default();
        if code.trim().is_empty() {
            continue;
        }

        if code.starts_with(char::is_whitespace) {
            rules.last_mut().expect("continuation line before the first rule").push(code);
        } else {
            rules.push(vec![code]);
        }
    }

    rules
}

fn lex(lines: &[&'static str]) -> Vec<Tok> {
    let mut tokens = Vec::new();

    for line in lines {
        let mut rest = *line;
        loop {
            rest = rest.trim_start();
            let Some(first) = rest.chars().next() else { break };

            let (tok, len) = match first {
                ':' => (Tok::Colon, 1),
                '|' => (Tok::Bar, 1),
                '(' => (Tok::LParen, 1),
                ')' => (Tok::RParen, 1),
                '[' => (Tok::LBracket, 1),
                ']' => (Tok::RBracket, 1),
                '*' => (Tok::Star, 1),
                '+' => (Tok::Plus, 1),
                '\'' => {
                    let end = rest[1..].find('\'').expect("unterminated quote in grammar") + 1;
                    (Tok::Quoted(&rest[1..end]), end + 1)
                }
                c if c.is_ascii_alphabetic() || c == '_' => {
                    let end = rest
                        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                        .unwrap_or(rest.len());
                    (Tok::Ident(&rest[..end]), end)
                }
                other => panic!("unexpected character {other:?} in grammar"),
            };

            tokens.push(tok);
            rest = &rest[len..];
        }
    }

    tokens
}

struct RuleParser {
    tokens: Vec<Tok>,
    pos: usize,
}

impl RuleParser {
    fn peek(&self) -> Option<Tok> {
        self.tokens.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<Tok> {
        let tok = self.peek();
        self.pos += 1;
        tok
    }

    fn expect(&mut self, expected: Tok) {
        let found = self.bump();
        assert_eq!(found, Some(expected), "malformed grammar rule");
    }

    fn alternatives(&mut self) -> Pattern {
        let mut alts = vec![self.sequence()];
        while self.peek() == Some(Tok::Bar) {
            self.bump();
            alts.push(self.sequence());
        }

        if alts.len() == 1 { alts.pop().expect("one alternative") } else { Pattern::Alt(alts) }
    }

    fn sequence(&mut self) -> Pattern {
        let mut items = Vec::new();
        while let Some(Tok::Ident(_) | Tok::Quoted(_) | Tok::LParen | Tok::LBracket) = self.peek() {
            items.push(self.item());
        }

        assert!(!items.is_empty(), "empty alternative in grammar");
        if items.len() == 1 { items.pop().expect("one item") } else { Pattern::Seq(items) }
    }

    fn item(&mut self) -> Pattern {
        if self.peek() == Some(Tok::LBracket) {
            self.bump();
            let inner = self.alternatives();
            self.expect(Tok::RBracket);
            return Pattern::Opt(Box::new(inner));
        }

        let atom = self.atom();
        match self.peek() {
            Some(Tok::Star) => {
                self.bump();
                Pattern::Star(Box::new(atom))
            }
            Some(Tok::Plus) => {
                self.bump();
                Pattern::Plus(Box::new(atom))
            }
            _ => atom,
        }
    }

    fn atom(&mut self) -> Pattern {
        match self.bump() {
            Some(Tok::LParen) => {
                let inner = self.alternatives();
                self.expect(Tok::RParen);
                inner
            }
            Some(Tok::Ident(name)) => {
                let symbol =
                    Symbol::from_name(name).unwrap_or_else(|| panic!("unknown symbol `{name}`"));
                Pattern::Label(if symbol.is_terminal() {
                    Label::Token(symbol)
                } else {
                    Label::Rule(symbol)
                })
            }
            Some(Tok::Quoted(text)) if text.starts_with(|c: char| c.is_ascii_alphabetic()) => {
                Pattern::Label(Label::Keyword(text))
            }
            Some(Tok::Quoted(text)) => {
                let symbol =
                    Symbol::from_spelling(text)
                        .unwrap_or_else(|| panic!("unknown operator `{text}`"));
                Pattern::Label(Label::Token(symbol))
            }
            other => panic!("unexpected {other:?} in grammar"),
        }
    }
}

/// Reads every rule of `text`. The grammar is compiled into the binary, so a
/// malformed rule is a bug and panics.
pub(crate) fn parse_rules(text: &'static str) -> Vec<RuleDef> {
    rule_sources(text)
        .into_iter()
        .map(|lines| {
            let source =
                lines.iter().map(|line| line.trim()).collect::<Vec<_>>().join(" ");
            let mut parser = RuleParser { tokens: lex(&lines), pos: 0 };

            let Some(Tok::Ident(name)) = parser.bump() else {
                panic!("rule must start with its name: {source}");
            };
            let symbol = Symbol::from_name(name)
                .filter(|symbol| !symbol.is_terminal())
                .unwrap_or_else(|| panic!("unknown production `{name}`"));
            parser.expect(Tok::Colon);

            let pattern = parser.alternatives();
            assert_eq!(parser.peek(), None, "trailing tokens in rule `{name}`");

            RuleDef { symbol, source, pattern }
        })
        .collect()
}

/// Every keyword mentioned in `pattern`.
pub(crate) fn keywords(pattern: &Pattern, out: &mut Vec<&'static str>) {
    match pattern {
        Pattern::Label(Label::Keyword(keyword)) => {
            if !out.contains(keyword) {
                out.push(keyword);
            }
        }
        Pattern::Label(_) => {}
        Pattern::Seq(items) | Pattern::Alt(items) => {
            items.iter().for_each(|item| keywords(item, out));
        }
        Pattern::Opt(inner) | Pattern::Star(inner) | Pattern::Plus(inner) => keywords(inner, out),
    }
}
