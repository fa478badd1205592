//! Numeric symbol codes for tokens and grammar productions.
//!
//! Terminal codes live below [`NT_OFFSET`], non-terminal codes at or above it.
//! The numbering is part of the flat-form wire format and must not change.

/// First non-terminal code.
pub const NT_OFFSET: u16 = 256;

macro_rules! symbols {
    (@spelling) => { None };
    (@spelling $spelling:literal) => { Some($spelling) };
    (
        terminals { $($t:ident = $t_code:literal $(=> $t_spelling:literal)?,)* }
        non_terminals { $($n:ident = $n_code:literal => $n_name:literal,)* }
    ) => {
        #[allow(non_camel_case_types)]
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
        #[repr(u16)]
        pub enum Symbol {
            $($t = $t_code,)*
            $($n = $n_code,)*
        }

        impl Symbol {
            /// Every terminal symbol, in code order.
            pub const TERMINALS: &'static [Symbol] = &[$(Symbol::$t,)*];
            /// Every non-terminal symbol, in code order.
            pub const NON_TERMINALS: &'static [Symbol] = &[$(Symbol::$n,)*];

            /// Maps a raw code back to its symbol.
            pub const fn from_raw(raw: u16) -> Option<Symbol> {
                match raw {
                    $($t_code => Some(Symbol::$t),)*
                    $($n_code => Some(Symbol::$n),)*
                    _ => None,
                }
            }

            /// Token names are upper case (`NAME`, `LPAR`), production names are
            /// the grammar rule names (`expr_stmt`).
            pub const fn name(self) -> &'static str {
                match self {
                    $(Symbol::$t => stringify!($t),)*
                    $(Symbol::$n => $n_name,)*
                }
            }

            /// The only legal text of a fixed-spelling terminal.
            pub const fn spelling(self) -> Option<&'static str> {
                match self {
                    $(Symbol::$t => symbols!(@spelling $($t_spelling)?),)*
                    _ => None,
                }
            }

            pub fn from_name(name: &str) -> Option<Symbol> {
                match name {
                    $(stringify!($t) => Some(Symbol::$t),)*
                    $($n_name => Some(Symbol::$n),)*
                    _ => None,
                }
            }
        }
    };
}

symbols! {
    terminals {
        ENDMARKER = 0,
        NAME = 1,
        NUMBER = 2,
        STRING = 3,
        NEWLINE = 4,
        INDENT = 5,
        DEDENT = 6,
        LPAR = 7 => "(",
        RPAR = 8 => ")",
        LSQB = 9 => "[",
        RSQB = 10 => "]",
        COLON = 11 => ":",
        COMMA = 12 => ",",
        SEMI = 13 => ";",
        PLUS = 14 => "+",
        MINUS = 15 => "-",
        STAR = 16 => "*",
        SLASH = 17 => "/",
        VBAR = 18 => "|",
        AMPER = 19 => "&",
        LESS = 20 => "<",
        GREATER = 21 => ">",
        EQUAL = 22 => "=",
        DOT = 23 => ".",
        PERCENT = 24 => "%",
        LBRACE = 25 => "{",
        RBRACE = 26 => "}",
        EQEQUAL = 27 => "==",
        NOTEQUAL = 28 => "!=",
        LESSEQUAL = 29 => "<=",
        GREATEREQUAL = 30 => ">=",
        TILDE = 31 => "~",
        CIRCUMFLEX = 32 => "^",
        LEFTSHIFT = 33 => "<<",
        RIGHTSHIFT = 34 => ">>",
        DOUBLESTAR = 35 => "**",
        PLUSEQUAL = 36 => "+=",
        MINEQUAL = 37 => "-=",
        STAREQUAL = 38 => "*=",
        SLASHEQUAL = 39 => "/=",
        PERCENTEQUAL = 40 => "%=",
        AMPEREQUAL = 41 => "&=",
        VBAREQUAL = 42 => "|=",
        CIRCUMFLEXEQUAL = 43 => "^=",
        LEFTSHIFTEQUAL = 44 => "<<=",
        RIGHTSHIFTEQUAL = 45 => ">>=",
        DOUBLESTAREQUAL = 46 => "**=",
        DOUBLESLASH = 47 => "//",
        DOUBLESLASHEQUAL = 48 => "//=",
        AT = 49 => "@",
        RARROW = 50 => "->",
    }
    non_terminals {
        FILE_INPUT = 256 => "file_input",
        EVAL_INPUT = 257 => "eval_input",
        DECORATOR = 258 => "decorator",
        DECORATORS = 259 => "decorators",
        DECORATED = 260 => "decorated",
        FUNCDEF = 261 => "funcdef",
        PARAMETERS = 262 => "parameters",
        TYPEDARGSLIST = 263 => "typedargslist",
        TFPDEF = 264 => "tfpdef",
        VARARGSLIST = 265 => "varargslist",
        VFPDEF = 266 => "vfpdef",
        STMT = 267 => "stmt",
        SIMPLE_STMT = 268 => "simple_stmt",
        SMALL_STMT = 269 => "small_stmt",
        EXPR_STMT = 270 => "expr_stmt",
        AUGASSIGN = 271 => "augassign",
        DEL_STMT = 272 => "del_stmt",
        PASS_STMT = 273 => "pass_stmt",
        FLOW_STMT = 274 => "flow_stmt",
        BREAK_STMT = 275 => "break_stmt",
        CONTINUE_STMT = 276 => "continue_stmt",
        RETURN_STMT = 277 => "return_stmt",
        YIELD_STMT = 278 => "yield_stmt",
        RAISE_STMT = 279 => "raise_stmt",
        IMPORT_STMT = 280 => "import_stmt",
        IMPORT_NAME = 281 => "import_name",
        IMPORT_FROM = 282 => "import_from",
        IMPORT_AS_NAME = 283 => "import_as_name",
        DOTTED_AS_NAME = 284 => "dotted_as_name",
        IMPORT_AS_NAMES = 285 => "import_as_names",
        DOTTED_AS_NAMES = 286 => "dotted_as_names",
        DOTTED_NAME = 287 => "dotted_name",
        GLOBAL_STMT = 288 => "global_stmt",
        NONLOCAL_STMT = 289 => "nonlocal_stmt",
        ASSERT_STMT = 290 => "assert_stmt",
        COMPOUND_STMT = 291 => "compound_stmt",
        IF_STMT = 292 => "if_stmt",
        WHILE_STMT = 293 => "while_stmt",
        FOR_STMT = 294 => "for_stmt",
        TRY_STMT = 295 => "try_stmt",
        WITH_STMT = 296 => "with_stmt",
        WITH_ITEM = 297 => "with_item",
        EXCEPT_CLAUSE = 298 => "except_clause",
        SUITE = 299 => "suite",
        TEST = 300 => "test",
        TEST_NOCOND = 301 => "test_nocond",
        LAMBDEF = 302 => "lambdef",
        LAMBDEF_NOCOND = 303 => "lambdef_nocond",
        OR_TEST = 304 => "or_test",
        AND_TEST = 305 => "and_test",
        NOT_TEST = 306 => "not_test",
        COMPARISON = 307 => "comparison",
        COMP_OP = 308 => "comp_op",
        STAR_EXPR = 309 => "star_expr",
        EXPR = 310 => "expr",
        XOR_EXPR = 311 => "xor_expr",
        AND_EXPR = 312 => "and_expr",
        SHIFT_EXPR = 313 => "shift_expr",
        ARITH_EXPR = 314 => "arith_expr",
        TERM = 315 => "term",
        FACTOR = 316 => "factor",
        POWER = 317 => "power",
        ATOM = 318 => "atom",
        TESTLIST_COMP = 319 => "testlist_comp",
        TRAILER = 320 => "trailer",
        SUBSCRIPTLIST = 321 => "subscriptlist",
        SUBSCRIPT = 322 => "subscript",
        SLICEOP = 323 => "sliceop",
        EXPRLIST = 324 => "exprlist",
        TESTLIST = 325 => "testlist",
        DICTORSETMAKER = 326 => "dictorsetmaker",
        CLASSDEF = 327 => "classdef",
        ARGLIST = 328 => "arglist",
        ARGUMENT = 329 => "argument",
        COMP_ITER = 330 => "comp_iter",
        COMP_FOR = 331 => "comp_for",
        COMP_IF = 332 => "comp_if",
        YIELD_EXPR = 333 => "yield_expr",
    }
}

impl Symbol {
    /// Largest code in use, terminal or not.
    pub const MAX_RAW: u16 = Symbol::YIELD_EXPR as u16;

    #[inline]
    pub const fn raw(self) -> u16 {
        self as u16
    }

    #[inline]
    pub const fn is_terminal(self) -> bool {
        (self as u16) < NT_OFFSET
    }

    /// NEWLINE, INDENT, DEDENT and ENDMARKER carry no text of their own.
    #[inline]
    pub const fn is_layout(self) -> bool {
        matches!(self, Symbol::NEWLINE | Symbol::INDENT | Symbol::DEDENT | Symbol::ENDMARKER)
    }

    /// Looks up a fixed-spelling terminal by its text, e.g. `"**="`.
    pub fn from_spelling(text: &str) -> Option<Symbol> {
        Symbol::TERMINALS.iter().copied().find(|symbol| symbol.spelling() == Some(text))
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name(), self.raw())
    }
}
