mod cursor;

use std::collections::VecDeque;

use birch_errors::Diagnostic;
use birch_syntax::Symbol;
use cursor::Cursor;
use text_size::{TextLen, TextRange, TextSize};

const TAB_SIZE: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub symbol: Symbol,
    pub range: TextRange,
    /// Injected layout token with no spelling of its own in the source.
    pub synthetic: bool,
}

impl Token {
    fn synthetic(symbol: Symbol, at: TextSize) -> Self {
        Self { symbol, range: TextRange::empty(at), synthetic: true }
    }

    /// The token's spelling; layout tokens are spelled as the empty string.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        if self.symbol.is_layout() { "" } else { &source[self.range] }
    }
}

pub struct Tokenizer<'a> {
    text: &'a str,
    cursor: Cursor<'a>,
    indents: Vec<u32>,
    parens: u32,
    at_line_start: bool,
    line_has_tokens: bool,
    started: bool,
    finished: bool,
    pending: VecDeque<Token>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            cursor: Cursor::new(text),
            indents: vec![0],
            parens: 0,
            at_line_start: true,
            line_has_tokens: false,
            started: false,
            finished: false,
            pending: VecDeque::new(),
        }
    }

    fn offset(&self) -> TextSize {
        self.text.text_len() - self.cursor.remaining()
    }

    fn range(&self) -> TextRange {
        let end = self.offset();
        TextRange::new(end - self.cursor.pos_within_token(), end)
    }

    fn error(&self, message: impl Into<String>) -> Diagnostic {
        Diagnostic::error(message, self.range())
    }

    /// The next token. After the final ENDMARKER every call returns ENDMARKER again.
    pub fn next_token(&mut self) -> Result<Token, Diagnostic> {
        if let Some(token) = self.pending.pop_front() {
            return Ok(token);
        }

        loop {
            self.cursor.reset_pos_within_token();

            if self.at_line_start {
                let width = self.indent_width();
                if self.cursor.is_eof() {
                    return self.end_of_input();
                }
                if matches!(self.cursor.peek(), '#' | '\n' | '\r') {
                    self.cursor.advance_while(|c| c != '\n' && c != '\r');
                    self.eat_newline();
                    continue;
                }

                self.at_line_start = false;
                if let Some(token) = self.change_indentation(width)? {
                    return Ok(token);
                }
                self.cursor.reset_pos_within_token();
            }

            if self.cursor.is_eof() {
                return self.end_of_input();
            }

            match self.cursor.peek() {
                ' ' | '\t' | '\x0c' => {
                    self.cursor.advance();
                }
                '#' => self.cursor.advance_while(|c| c != '\n' && c != '\r'),
                '\\' => {
                    self.cursor.advance();
                    if !self.eat_newline() {
                        return Err(
                            self.error("unexpected character after line continuation character")
                        );
                    }
                }
                '\n' | '\r' => {
                    self.eat_newline();
                    if self.parens == 0 {
                        self.at_line_start = true;
                        self.line_has_tokens = false;
                        let range = self.range();
                        return Ok(Token { symbol: Symbol::NEWLINE, range, synthetic: false });
                    }
                }
                _ => {
                    let token = self.real_token()?;
                    self.started = true;
                    self.line_has_tokens = true;
                    return Ok(token);
                }
            }
        }
    }

    fn eat_newline(&mut self) -> bool {
        let mut eaten = false;
        if self.cursor.matches('\r') {
            self.cursor.advance();
            eaten = true;
        }
        if self.cursor.matches('\n') {
            self.cursor.advance();
            eaten = true;
        }
        eaten
    }

    fn indent_width(&mut self) -> u32 {
        let mut width = 0;
        loop {
            match self.cursor.peek() {
                ' ' => width += 1,
                '\t' => width = (width / TAB_SIZE + 1) * TAB_SIZE,
                '\x0c' => width = 0,
                _ => return width,
            }
            self.cursor.advance();
        }
    }

    fn change_indentation(&mut self, width: u32) -> Result<Option<Token>, Diagnostic> {
        let at = self.offset();
        let current = self.indents.last().copied().unwrap_or_default();

        if width > current {
            self.indents.push(width);
            return Ok(Some(Token::synthetic(Symbol::INDENT, at)));
        }

        while self.indents.last().is_some_and(|&indent| indent > width) {
            self.indents.pop();
            self.pending.push_back(Token::synthetic(Symbol::DEDENT, at));
        }
        if self.indents.last() != Some(&width) {
            return Err(Diagnostic::error(
                "unindent does not match any outer indentation level",
                TextRange::empty(at),
            ));
        }

        Ok(self.pending.pop_front())
    }

    fn end_of_input(&mut self) -> Result<Token, Diagnostic> {
        let end = self.text.text_len();
        let anchor = match self.text.as_bytes().last() {
            Some(b'\n' | b'\r') => end - TextSize::new(1),
            _ => end,
        };

        if !self.finished {
            if self.parens > 0 {
                return Err(Diagnostic::error(
                    "unexpected EOF in multi-line statement",
                    TextRange::empty(end),
                ));
            }

            self.finished = true;
            if self.line_has_tokens {
                let range = TextRange::empty(end);
                self.pending.push_back(Token { symbol: Symbol::NEWLINE, range, synthetic: false });
            }
            for _ in 1..self.indents.len() {
                self.pending.push_back(Token::synthetic(Symbol::DEDENT, anchor));
            }
            self.indents.truncate(1);
            if self.started {
                self.pending.push_back(Token::synthetic(Symbol::NEWLINE, anchor));
            }
            self.pending.push_back(Token::synthetic(Symbol::ENDMARKER, anchor));
        }

        Ok(self.pending.pop_front().unwrap_or(Token::synthetic(Symbol::ENDMARKER, anchor)))
    }

    fn real_token(&mut self) -> Result<Token, Diagnostic> {
        let first = self.cursor.peek();

        let symbol = if is_identifier_start(first) {
            self.cursor.advance();
            self.cursor.advance_while(is_identifier_continue);
            if matches!(self.cursor.peek(), '"' | '\'')
                && is_string_prefix(&self.text[self.range()])
            {
                self.string()?
            } else {
                Symbol::NAME
            }
        } else if first.is_ascii_digit()
            || (first == '.' && self.cursor.second().is_ascii_digit())
        {
            self.number();
            Symbol::NUMBER
        } else if matches!(first, '"' | '\'') {
            self.string()?
        } else {
            self.operator()?
        };

        Ok(Token { symbol, range: self.range(), synthetic: false })
    }

    fn string(&mut self) -> Result<Symbol, Diagnostic> {
        let quote = self.cursor.advance();
        let triple = self.cursor.peek() == quote && self.cursor.second() == quote;
        if triple {
            self.cursor.advance();
            self.cursor.advance();
        }

        let mut closing = 0;
        loop {
            if self.cursor.is_eof() {
                return Err(self.error(if triple {
                    "EOF while scanning triple-quoted string literal"
                } else {
                    "EOL while scanning string literal"
                }));
            }

            match self.cursor.advance() {
                '\\' => {
                    if self.cursor.advance() == '\r' && self.cursor.matches('\n') {
                        self.cursor.advance();
                    }
                    closing = 0;
                }
                c if c == quote => {
                    closing += 1;
                    if !triple || closing == 3 {
                        return Ok(Symbol::STRING);
                    }
                }
                '\n' | '\r' if !triple => {
                    return Err(self.error("EOL while scanning string literal"));
                }
                _ => closing = 0,
            }
        }
    }

    /// Reads the longest digit run that can belong to a literal. Malformed
    /// literals such as `0x` or `1e` are left for the compiler to reject.
    fn number(&mut self) {
        let first = self.cursor.advance();
        if first == '0' && matches!(self.cursor.peek(), 'x' | 'X' | 'o' | 'O' | 'b' | 'B') {
            self.cursor.advance();
            self.cursor.advance_while(|c| c.is_ascii_alphanumeric() || c == '_');
            return;
        }

        self.digits();
        if first != '.' && self.cursor.matches('.') {
            self.cursor.advance();
            self.digits();
        }
        if matches!(self.cursor.peek(), 'e' | 'E') {
            self.cursor.advance();
            if matches!(self.cursor.peek(), '+' | '-') {
                self.cursor.advance();
            }
            self.digits();
        }
        if matches!(self.cursor.peek(), 'j' | 'J') {
            self.cursor.advance();
        }
    }

    fn digits(&mut self) {
        self.cursor.advance_while(|c| c.is_ascii_digit() || c == '_');
    }

    fn operator(&mut self) -> Result<Symbol, Diagnostic> {
        let rest = self.cursor.rest();
        let found = [3, 2, 1]
            .into_iter()
            .find_map(|len| Some((len, rest.get(..len).and_then(Symbol::from_spelling)?)));

        let Some((len, symbol)) = found else {
            let c = self.cursor.advance();
            return Err(self.error(format!("invalid character {c:?}")));
        };

        self.cursor.advance_by(len);
        match symbol {
            Symbol::LPAR | Symbol::LSQB | Symbol::LBRACE => self.parens += 1,
            Symbol::RPAR | Symbol::RSQB | Symbol::RBRACE => {
                self.parens = self.parens.saturating_sub(1);
            }
            _ => {}
        }
        Ok(symbol)
    }
}

fn is_identifier_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

fn is_identifier_continue(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

fn is_string_prefix(text: &str) -> bool {
    matches!(text.to_ascii_lowercase().as_str(), "b" | "r" | "u" | "br" | "rb")
}

/// Tokenizes all of `text`, up to and including ENDMARKER.
pub fn tokenize(text: &str) -> Result<Vec<Token>, Diagnostic> {
    let mut tokenizer = Tokenizer::new(text);
    let mut tokens = Vec::new();
    loop {
        let token = tokenizer.next_token()?;
        tokens.push(token);
        if token.symbol == Symbol::ENDMARKER {
            return Ok(tokens);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fmt::Write as _;

    use expect_test::expect;

    use super::*;
    use Symbol::*;

    fn dump(text: &str) -> String {
        let mut out = String::new();
        for token in tokenize(text).unwrap() {
            if token.synthetic {
                _ = writeln!(out, "{} @{}", token.symbol.name(), u32::from(token.range.start()));
            } else {
                _ = writeln!(
                    out,
                    "{} {:?} {:?}",
                    token.symbol.name(),
                    token.text(text),
                    token.range
                );
            }
        }
        out
    }

    fn symbols(text: &str) -> Vec<Symbol> {
        tokenize(text).unwrap().into_iter().map(|token| token.symbol).collect()
    }

    fn error(text: &str) -> String {
        tokenize(text).unwrap_err().message().to_owned()
    }

    #[test]
    fn indented_block() {
        expect![[r#"
            NAME "if" 0..2
            NAME "x" 3..4
            COLON ":" 4..5
            NEWLINE "" 5..6
            INDENT @10
            NAME "y" 10..11
            EQUAL "=" 12..13
            NUMBER "1" 14..15
            NEWLINE "" 15..16
            DEDENT @15
            NEWLINE @15
            ENDMARKER @15
        "#]]
        .assert_eq(&dump("if x:\n    y = 1\n"));
    }

    #[test]
    fn missing_final_newline() {
        expect![[r#"
            NAME "x" 0..1
            NEWLINE "" 1..1
            NEWLINE @1
            ENDMARKER @1
        "#]]
        .assert_eq(&dump("x"));
    }

    #[test]
    fn empty_input() {
        assert_eq!(symbols(""), [ENDMARKER]);
        assert_eq!(symbols("\n\n# only a comment\n"), [ENDMARKER]);
    }

    #[test]
    fn nested_dedents() {
        assert_eq!(symbols("if a:\n  if b:\n    c\nd\n"), [
            NAME, NAME, COLON, NEWLINE, INDENT, NAME, NAME, COLON, NEWLINE, INDENT, NAME, NEWLINE,
            DEDENT, DEDENT, NAME, NEWLINE, NEWLINE, ENDMARKER
        ]);
    }

    #[test]
    fn blank_lines_and_comments() {
        assert_eq!(symbols("\n# c\nx  # trailing\n\n   \n"), [NAME, NEWLINE, NEWLINE, ENDMARKER]);
        assert_eq!(symbols("if a:\n    b\n\n    # c\n    d\n"), [
            NAME, NAME, COLON, NEWLINE, INDENT, NAME, NEWLINE, NAME, NEWLINE, DEDENT, NEWLINE,
            ENDMARKER
        ]);
    }

    #[test]
    fn implicit_and_explicit_joining() {
        assert_eq!(symbols("(1,\n    2)\n"), [
            LPAR, NUMBER, COMMA, NUMBER, RPAR, NEWLINE, NEWLINE, ENDMARKER
        ]);
        assert_eq!(symbols("x = 1 + \\\n    2\n"), [
            NAME, EQUAL, NUMBER, PLUS, NUMBER, NEWLINE, NEWLINE, ENDMARKER
        ]);
    }

    #[test]
    fn strings() {
        let text = r#"'a' "b" '''c
d''' rb'x' u"y" '\'' """"""
"#;
        let tokens = tokenize(text).unwrap();
        let strings = tokens
            .iter()
            .filter(|token| token.symbol == STRING)
            .map(|token| token.text(text))
            .collect::<Vec<_>>();
        assert_eq!(strings, [
            "'a'",
            "\"b\"",
            "'''c\nd'''",
            "rb'x'",
            "u\"y\"",
            r"'\''",
            "\"\"\"\"\"\"",
        ]);
        assert_eq!(tokens[0].text(text), "'a'");
    }

    #[test]
    fn numbers() {
        let text = "0x1f 1.5e-3 .5 10j 1_000 0o17 3.";
        let tokens = tokenize(text).unwrap();
        let numbers =
            tokens.iter().take_while(|token| token.symbol == NUMBER).map(|token| token.text(text));
        assert_eq!(numbers.collect::<Vec<_>>(), [
            "0x1f", "1.5e-3", ".5", "10j", "1_000", "0o17", "3."
        ]);
    }

    #[test]
    fn operators_take_the_longest_match() {
        assert_eq!(symbols("a **= b // c -> d != e <<= f . g"), [
            NAME,
            DOUBLESTAREQUAL,
            NAME,
            DOUBLESLASH,
            NAME,
            RARROW,
            NAME,
            NOTEQUAL,
            NAME,
            LEFTSHIFTEQUAL,
            NAME,
            DOT,
            NAME,
            NEWLINE,
            NEWLINE,
            ENDMARKER
        ]);
    }

    #[test]
    fn errors() {
        assert_eq!(error("a $ b"), "invalid character '$'");
        assert_eq!(error("a ! b"), "invalid character '!'");
        assert_eq!(error("(1,"), "unexpected EOF in multi-line statement");
        assert_eq!(error("'abc"), "EOL while scanning string literal");
        assert_eq!(error("'a\nb'"), "EOL while scanning string literal");
        assert_eq!(error("'''abc"), "EOF while scanning triple-quoted string literal");
        assert_eq!(error("if a:\n    b\n  c\n"), "unindent does not match any outer indentation level");
        assert_eq!(error("x = \\ 1"), "unexpected character after line continuation character");
    }

    #[test]
    fn endmarker_repeats() {
        let mut tokenizer = Tokenizer::new("x");
        for _ in 0..4 {
            tokenizer.next_token().unwrap();
        }
        assert_eq!(tokenizer.next_token().unwrap().symbol, ENDMARKER);
    }
}
