//! Concrete syntax tree: symbol codes, immutable nodes and the event-driven builder.

mod builder;
mod node;
mod symbol;
mod symbol_set;

/// Incremental builder for constructing a [`Node`] tree.
pub use builder::Builder;
/// Tree nodes and traversal.
pub use node::{Node, Position, Preorder, WalkEvent};
/// Token and production codes.
pub use symbol::{NT_OFFSET, Symbol};
/// Compact set for grouping `Symbol` values.
pub use symbol_set::SymbolSet;
