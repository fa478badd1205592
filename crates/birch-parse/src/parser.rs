use birch_errors::Diagnostic;
use birch_grammar::{Config, Grammar, TreeKind, ValidationError};
use birch_syntax::{Builder, Position, Symbol, SymbolSet};
use birch_tokenizer::{Token, Tokenizer};
use birch_tree::Tree;
use drop_bomb::DropBomb;
use line_index::{LineCol, LineIndex};
use text_size::{TextLen, TextRange, TextSize};

use crate::ParseError;

/// Recursive-descent driver over the token stream.
///
/// The first error poisons the parser: from then on it reports ENDMARKER and
/// consumes nothing, so every grammar loop winds down without further errors.
pub(crate) struct Parser<'a> {
    text: &'a str,
    tokenizer: Tokenizer<'a>,
    current: Token,
    events: Vec<Event>,
    open: usize,
    max_depth: usize,
    error: Option<ParseError>,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(text: &'a str, config: &Config) -> Self {
        let mut parser = Self {
            text,
            tokenizer: Tokenizer::new(text),
            current: Token {
                symbol: Symbol::ENDMARKER,
                range: TextRange::empty(TextSize::new(0)),
                synthetic: true,
            },
            events: Vec::new(),
            open: 0,
            max_depth: config.max_depth,
            error: None,
        };
        parser.bump();
        parser
    }

    fn bump(&mut self) {
        match self.tokenizer.next_token() {
            Ok(token) => self.current = token,
            Err(diagnostic) => self.fail(ParseError::Syntax(diagnostic)),
        }
    }

    fn fail(&mut self, error: ParseError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    fn poisoned(&self) -> bool {
        self.error.is_some()
    }

    pub(crate) fn peek(&self) -> Symbol {
        if self.poisoned() { Symbol::ENDMARKER } else { self.current.symbol }
    }

    pub(crate) fn at(&self, symbol: Symbol) -> bool {
        self.peek() == symbol
    }

    pub(crate) fn at_any(&self, set: &SymbolSet) -> bool {
        set.contains(self.peek())
    }

    /// The current token's text when it is a reserved word.
    pub(crate) fn keyword(&self) -> Option<&'a str> {
        if !self.at(Symbol::NAME) {
            return None;
        }
        let text = self.current.text(self.text);
        Grammar::get().is_keyword(text).then_some(text)
    }

    pub(crate) fn at_keyword(&self, keyword: &str) -> bool {
        self.keyword() == Some(keyword)
    }

    /// A NAME usable as an identifier.
    pub(crate) fn at_name(&self) -> bool {
        self.at(Symbol::NAME) && self.keyword().is_none()
    }

    pub(crate) fn advance(&mut self) {
        if self.poisoned() {
            return;
        }
        if self.open + 1 > self.max_depth {
            self.fail(ParseError::ResourceExhausted { limit: self.max_depth });
            return;
        }

        self.events.push(Event::Token(self.current));
        self.bump();
    }

    pub(crate) fn eat(&mut self, symbol: Symbol) -> bool {
        let found = self.at(symbol);
        if found {
            self.advance();
        }
        found
    }

    pub(crate) fn eat_keyword(&mut self, keyword: &str) -> bool {
        let found = self.at_keyword(keyword);
        if found {
            self.advance();
        }
        found
    }

    pub(crate) fn expect(&mut self, symbol: Symbol) {
        if !self.eat(symbol) {
            self.error(&format!("expected {}", describe(symbol)));
        }
    }

    pub(crate) fn expect_keyword(&mut self, keyword: &str) {
        if !self.eat_keyword(keyword) {
            self.error(&format!("expected '{keyword}'"));
        }
    }

    pub(crate) fn expect_name(&mut self) {
        if self.at_name() {
            self.advance();
        } else {
            self.error("expected a name");
        }
    }

    pub(crate) fn error(&mut self, message: &str) {
        if self.poisoned() {
            return;
        }
        let message = match self.current.symbol {
            Symbol::INDENT => "unexpected indent",
            Symbol::DEDENT => "unexpected dedent",
            _ => message,
        };
        let range = self.current.range;
        self.fail(ParseError::Syntax(Diagnostic::error(message, range)));
    }

    pub(crate) fn start(&mut self) -> Marker {
        if !self.poisoned() && self.open >= self.max_depth {
            self.fail(ParseError::ResourceExhausted { limit: self.max_depth });
        }

        let position = self.events.len() as u32;
        self.events.push(Event::Open);
        self.open += 1;
        Marker::new(position)
    }

    /// Replays the recorded events into a tree and validates it.
    pub(crate) fn finish(self, kind: TreeKind, config: &Config) -> Result<Tree, ParseError> {
        let Parser { text, events, error, .. } = self;
        if let Some(error) = error {
            return Err(error);
        }

        let index = LineIndex::new(text);
        let mut builder = Builder::new();
        for event in events {
            match event {
                Event::Open => unreachable!("every marker is completed"),
                Event::Start(symbol) => builder.start_node(symbol),
                Event::Finish => builder.finish_node(),
                Event::Token(token) => {
                    let LineCol { line, col } = index.line_col(token.range.start());
                    let column = if token.synthetic {
                        Position::SYNTHETIC
                    } else {
                        i32::try_from(col).unwrap_or(i32::MAX)
                    };
                    let position = Position::new(line + 1, column);
                    builder.token(token.symbol, token.text(text), Some(position));
                }
            }
        }

        Tree::new(builder.finish(), kind, config).map_err(|error| match error {
            ValidationError::TooDeep { limit } => ParseError::ResourceExhausted { limit },
            ValidationError::Violation(violation) => ParseError::Syntax(Diagnostic::error(
                violation.to_string(),
                TextRange::up_to(text.text_len()),
            )),
        })
    }
}

fn describe(symbol: Symbol) -> String {
    match symbol {
        Symbol::NEWLINE => "a newline".to_owned(),
        Symbol::INDENT => "an indented block".to_owned(),
        Symbol::DEDENT => "a dedent".to_owned(),
        Symbol::ENDMARKER => "end of input".to_owned(),
        _ => match symbol.spelling() {
            Some(spelling) => format!("'{spelling}'"),
            None => symbol.name().to_ascii_lowercase(),
        },
    }
}

enum Event {
    Open,
    Start(Symbol),
    Token(Token),
    Finish,
}

pub(crate) struct Marker {
    position: u32,
    bomb: DropBomb,
}

impl Marker {
    fn new(position: u32) -> Self {
        Self { position, bomb: DropBomb::new("Marker must be completed") }
    }

    pub(crate) fn complete(mut self, p: &mut Parser<'_>, symbol: Symbol) {
        self.bomb.defuse();
        p.events[self.position as usize] = Event::Start(symbol);
        p.events.push(Event::Finish);
        p.open -= 1;
    }
}
