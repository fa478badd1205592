use std::sync::LazyLock;

use birch_syntax::{NT_OFFSET, Node, Symbol};

use crate::TreeKind;
use crate::meta::{self, Label};
use crate::nfa::Nfa;

const GRAMMAR_TEXT: &str = include_str!("python.gram");

static GRAMMAR: LazyLock<Grammar> = LazyLock::new(|| Grammar::from_text(GRAMMAR_TEXT));

struct Production {
    source: String,
    nfa: Nfa,
}

/// The production table: which child sequences every non-terminal admits.
///
/// Built once on first use and never mutated afterwards.
pub struct Grammar {
    productions: Vec<Production>,
    keywords: Vec<&'static str>,
}

impl Grammar {
    /// The process-wide table.
    pub fn get() -> &'static Grammar {
        &GRAMMAR
    }

    fn from_text(text: &'static str) -> Self {
        let rules = meta::parse_rules(text);
        let mut keywords = Vec::new();
        let mut productions = Vec::with_capacity(rules.len());

        for (index, rule) in rules.into_iter().enumerate() {
            assert_eq!(
                Some(rule.symbol),
                Symbol::NON_TERMINALS.get(index).copied(),
                "grammar rules must follow symbol code order"
            );
            meta::keywords(&rule.pattern, &mut keywords);
            productions.push(Production { nfa: Nfa::new(&rule.pattern), source: rule.source });
        }
        assert_eq!(productions.len(), Symbol::NON_TERMINALS.len(), "missing grammar rules");

        keywords.sort_unstable();
        log::trace!(
            "grammar table ready: {} productions, {} keywords",
            productions.len(),
            keywords.len()
        );

        Self { productions, keywords }
    }

    fn production(&self, symbol: Symbol) -> Option<&Production> {
        let index = symbol.raw().checked_sub(NT_OFFSET)?;
        self.productions.get(usize::from(index))
    }

    /// Whether `children` is one of the sequences `symbol` admits.
    ///
    /// Terminals are compared by symbol, except that NAME children are told
    /// apart by text: a keyword only matches its own quoted literal and never a
    /// plain `NAME`.
    pub fn is_legal_production(&self, symbol: Symbol, children: &[Node]) -> bool {
        let Some(production) = self.production(symbol) else {
            return false;
        };

        production.nfa.matches(children.len(), |label, index| {
            let child = &children[index];
            match label {
                Label::Rule(expected) => child.symbol() == expected,
                Label::Token(Symbol::NAME) => {
                    child.symbol() == Symbol::NAME
                        && child.text().is_some_and(|text| !self.is_keyword(text))
                }
                Label::Token(expected) => child.symbol() == expected,
                Label::Keyword(keyword) => {
                    child.symbol() == Symbol::NAME && child.text() == Some(keyword)
                }
            }
        })
    }

    pub fn is_keyword(&self, text: &str) -> bool {
        self.keywords.binary_search(&text).is_ok()
    }

    pub fn keywords(&self) -> &[&'static str] {
        &self.keywords
    }

    /// The EBNF text of the rule for `symbol`.
    pub fn rule_text(&self, symbol: Symbol) -> Option<&str> {
        self.production(symbol).map(|production| production.source.as_str())
    }

    pub fn start_symbol(&self, kind: TreeKind) -> Symbol {
        kind.start_symbol()
    }

    /// The only text a terminal may carry, for terminals with a fixed one.
    /// Layout tokens are spelled as the empty string.
    pub fn expected_spelling(&self, symbol: Symbol) -> Option<&'static str> {
        if symbol.is_layout() { Some("") } else { symbol.spelling() }
    }
}

#[cfg(test)]
mod tests {
    use birch_syntax::Position;

    use super::*;

    fn t(symbol: Symbol, text: &str) -> Node {
        Node::terminal(symbol, text, None::<Position>)
    }

    fn n(symbol: Symbol, children: Vec<Node>) -> Node {
        Node::non_terminal(symbol, children)
    }

    #[test]
    fn every_production_has_a_rule() {
        let grammar = Grammar::get();
        for &symbol in Symbol::NON_TERMINALS {
            let rule = grammar.rule_text(symbol).unwrap();
            assert!(rule.starts_with(&format!("{}:", symbol.name())), "{rule}");
        }
        assert_eq!(grammar.rule_text(Symbol::NAME), None);
    }

    #[test]
    fn keywords_come_from_the_rules() {
        let grammar = Grammar::get();
        for keyword in ["def", "return", "yield", "lambda", "None", "nonlocal", "is", "not"] {
            assert!(grammar.is_keyword(keyword), "{keyword}");
        }
        assert!(!grammar.is_keyword("print"));
        assert!(!grammar.is_keyword("self"));
    }

    #[test]
    fn global_needs_its_keyword() {
        let grammar = Grammar::get();
        let children = [t(Symbol::NAME, "global"), t(Symbol::NAME, "foo")];
        assert!(grammar.is_legal_production(Symbol::GLOBAL_STMT, &children));

        let children = [t(Symbol::NAME, "foo")];
        assert!(!grammar.is_legal_production(Symbol::GLOBAL_STMT, &children));

        let children = [t(Symbol::NAME, "global"), t(Symbol::NAME, "pass")];
        assert!(!grammar.is_legal_production(Symbol::GLOBAL_STMT, &children));
    }

    #[test]
    fn comparison_operators() {
        let grammar = Grammar::get();
        let is_not = [t(Symbol::NAME, "is"), t(Symbol::NAME, "not")];
        let not_is = [t(Symbol::NAME, "not"), t(Symbol::NAME, "is")];
        assert!(grammar.is_legal_production(Symbol::COMP_OP, &is_not));
        assert!(!grammar.is_legal_production(Symbol::COMP_OP, &not_is));
        assert!(grammar.is_legal_production(Symbol::COMP_OP, &[t(Symbol::NOTEQUAL, "!=")]));
    }

    #[test]
    fn augmented_assignment_operators() {
        let grammar = Grammar::get();
        assert!(grammar.is_legal_production(Symbol::AUGASSIGN, &[t(Symbol::MINEQUAL, "-=")]));
        assert!(!grammar.is_legal_production(Symbol::AUGASSIGN, &[t(Symbol::EQUAL, "=")]));
        assert!(!grammar.is_legal_production(Symbol::AUGASSIGN, &[]));
    }

    #[test]
    fn import_from_dots() {
        let grammar = Grammar::get();
        let dotted = || n(Symbol::DOTTED_NAME, vec![t(Symbol::NAME, "bogus")]);
        let names = || {
            n(
                Symbol::IMPORT_AS_NAMES,
                vec![n(Symbol::IMPORT_AS_NAME, vec![t(Symbol::NAME, "x")])],
            )
        };

        let relative = [
            t(Symbol::NAME, "from"),
            t(Symbol::DOT, "."),
            dotted(),
            t(Symbol::NAME, "import"),
            names(),
        ];
        assert!(grammar.is_legal_production(Symbol::IMPORT_FROM, &relative));

        let bare_dots =
            [t(Symbol::NAME, "from"), t(Symbol::DOT, "."), t(Symbol::NAME, "import"), names()];
        assert!(grammar.is_legal_production(Symbol::IMPORT_FROM, &bare_dots));

        let nothing = [t(Symbol::NAME, "from"), t(Symbol::NAME, "import"), names()];
        assert!(!grammar.is_legal_production(Symbol::IMPORT_FROM, &nothing));
    }

    #[test]
    fn spellings() {
        let grammar = Grammar::get();
        assert_eq!(grammar.expected_spelling(Symbol::MINEQUAL), Some("-="));
        assert_eq!(grammar.expected_spelling(Symbol::DEDENT), Some(""));
        assert_eq!(grammar.expected_spelling(Symbol::STRING), None);
        assert_eq!(grammar.start_symbol(TreeKind::Suite), Symbol::FILE_INPUT);
    }

    #[test]
    fn terminals_have_no_production() {
        let grammar = Grammar::get();
        assert!(!grammar.is_legal_production(Symbol::NAME, &[t(Symbol::NAME, "x")]));
    }
}
