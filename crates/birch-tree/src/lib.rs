//! Validated trees and their flat interchange form.

mod codec;
mod flat;
mod tree;

pub use birch_grammar::TreeKind;
pub use codec::{
    DecodeError, Malformed, decode, decode_any, decode_any_with_config, decode_with_config, encode,
};
pub use flat::FlatValue;
pub use tree::{IncomparableType, Tree};
