//! The production table every tree is checked against.

mod config;
mod kind;
mod meta;
mod nfa;
mod table;
mod validate;

pub use config::{Config, ConfigError, DEFAULT_MAX_DEPTH, GeneratorReturn};
pub use kind::TreeKind;
pub use table::Grammar;
pub use validate::{ValidationError, Violation, validate};
