use std::fmt::Display;

pub use annotate_snippets::Renderer;
use annotate_snippets::{Level, Snippet};
pub use text_size::TextRange;

/// A syntax error pointing at a range of the source text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct Diagnostic {
    message: String,
    range: TextRange,
}

impl Diagnostic {
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn range(&self) -> TextRange {
        self.range
    }

    pub fn error(message: impl Into<String>, range: TextRange) -> Self {
        Self { message: message.into(), range }
    }

    pub fn render<'a>(
        &'a self,
        renderer: &'a Renderer,
        path: &'a str,
        text: &'a str,
    ) -> impl Display + 'a {
        let message = Level::Error.title(&self.message).snippet(
            Snippet::source(text)
                .origin(path)
                .annotation(Level::Error.span(self.range.into()).label("here"))
                .fold(true),
        );
        renderer.render(message)
    }
}

#[cfg(test)]
mod tests {
    use text_size::TextSize;

    use super::*;

    #[test]
    fn renders_the_offending_range() {
        let text = "x = (1,\n";
        let diagnostic =
            Diagnostic::error("expected `)`", TextRange::at(TextSize::new(7), TextSize::new(1)));

        assert_eq!(diagnostic.to_string(), "expected `)`");
        let rendered = diagnostic.render(&Renderer::plain(), "<input>", text).to_string();
        assert!(rendered.starts_with("error: expected `)`"), "{rendered}");
        assert!(rendered.contains("<input>"), "{rendered}");
        assert!(rendered.contains("x = (1,"), "{rendered}");
    }
}
