use std::fmt;

use birch_syntax::Position;

/// Why a tree could not be turned into code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error("{construct} is not supported{}", At(.position))]
    Unsupported { construct: &'static str, position: Option<Position> },
}

/// A grammatical tree the compiler still rejects, such as `1 = 2` or a
/// malformed escape sequence.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}{}", At(.position))]
pub struct SyntaxError {
    message: String,
    position: Option<Position>,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, position: Option<Position>) -> Self {
        Self { message: message.into(), position }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn position(&self) -> Option<Position> {
        self.position
    }
}

struct At<'a>(&'a Option<Position>);

impl fmt::Display for At<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self.0 {
            Some(Position { line, column }) if column >= 0 => {
                write!(f, " (line {line}, column {column})")
            }
            Some(Position { line, .. }) => write!(f, " (line {line})"),
            None => Ok(()),
        }
    }
}

/// A failure while running compiled code, named after the exception the
/// language would raise.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuntimeError {
    #[error("NameError: name '{0}' is not defined")]
    Name(String),
    #[error("TypeError: {0}")]
    Type(String),
    #[error("ZeroDivisionError: {0}")]
    ZeroDivision(&'static str),
    #[error("IndexError: {0}")]
    Index(String),
    #[error("KeyError: {0}")]
    Key(String),
    #[error("OverflowError: {0}")]
    Overflow(String),
    #[error("AssertionError{}", assertion_suffix(.0.as_deref()))]
    Assertion(Option<String>),
    #[error("ValueError: {0}")]
    Value(String),
    #[error("RecursionError: maximum recursion depth exceeded {0}")]
    Recursion(&'static str),
}

fn assertion_suffix(message: Option<&str>) -> String {
    message.map(|message| format!(": {message}")).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        let error = SyntaxError::new("can't assign to literal", Some(Position::new(1, 0)));
        assert_eq!(error.to_string(), "can't assign to literal (line 1, column 0)");
        assert_eq!(
            CompileError::Unsupported { construct: "lambda", position: None }.to_string(),
            "lambda is not supported"
        );
        assert_eq!(RuntimeError::Assertion(None).to_string(), "AssertionError");
        assert_eq!(
            RuntimeError::Assertion(Some("boom".into())).to_string(),
            "AssertionError: boom"
        );
        assert_eq!(
            RuntimeError::Name("x".into()).to_string(),
            "NameError: name 'x' is not defined"
        );
    }
}
