use crate::{NT_OFFSET, Symbol};

const _: () = {
    let terminals = Symbol::TERMINALS;
    assert!(terminals[terminals.len() - 1].raw() < u64::BITS as u16);
    assert!(Symbol::MAX_RAW - NT_OFFSET < u128::BITS as u16);
};

/// A set of symbols that can be built in `const` items, for first sets and
/// operator tables.
///
/// Terminals and non-terminals live in separate words, so the unused codes
/// between the last terminal and [`NT_OFFSET`] take no space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SymbolSet {
    terminals: u64,
    non_terminals: u128,
}

impl SymbolSet {
    pub const fn new<const N: usize>(symbols: [Symbol; N]) -> Self {
        let mut set = SymbolSet { terminals: 0, non_terminals: 0 };
        let mut i = 0;
        while i < N {
            let raw = symbols[i].raw();
            if symbols[i].is_terminal() {
                set.terminals |= 1 << raw;
            } else {
                set.non_terminals |= 1 << (raw - NT_OFFSET);
            }
            i += 1;
        }
        set
    }

    pub const fn contains(&self, symbol: Symbol) -> bool {
        let raw = symbol.raw();
        if symbol.is_terminal() {
            self.terminals & (1 << raw) != 0
        } else {
            self.non_terminals & (1 << (raw - NT_OFFSET)) != 0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spans_terminals_and_productions() {
        const SET: SymbolSet = SymbolSet::new([Symbol::NAME, Symbol::YIELD_EXPR, Symbol::ATOM]);

        assert!(SET.contains(Symbol::NAME));
        assert!(SET.contains(Symbol::YIELD_EXPR));
        assert!(SET.contains(Symbol::ATOM));
        assert!(!SET.contains(Symbol::NUMBER));
        assert!(!SET.contains(Symbol::FILE_INPUT));
    }

    #[test]
    fn extremes() {
        const SET: SymbolSet = SymbolSet::new([Symbol::ENDMARKER, Symbol::FILE_INPUT]);

        assert!(SET.contains(Symbol::ENDMARKER));
        assert!(SET.contains(Symbol::FILE_INPUT));
        assert!(!SET.contains(Symbol::RARROW));
        assert!(SymbolSet::new([Symbol::RARROW]).contains(Symbol::RARROW));
        assert_eq!(SymbolSet::new([]), SymbolSet::default());
    }
}
