//! lfix AST - Core types for C translation units
//!
//! This crate defines the C syntax tree the refactoring passes operate on,
//! spans for source locations, a printer back to C text, and the
//! [`Frontend`] trait that parsers implement.

mod span;
mod types;
mod expr;
mod stmt;
mod decl;
mod forest;
mod printer;
pub mod visit;

pub use span::*;
pub use types::*;
pub use expr::*;
pub use stmt::*;
pub use decl::*;
pub use forest::*;
pub use printer::*;
