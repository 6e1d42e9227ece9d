//! lfix - Migrate a Plan 9 C linker into a reusable library
//!
//! This is the root workspace crate that hosts the end-to-end tests.
//! The implementation lives in the workspace member crates.

// Re-export main crates for convenience
pub use lfix_ast as ast;
pub use lfix_emit as emit;
pub use lfix_lexer as lexer;
pub use lfix_parser as parser;
pub use lfix_refactor as refactor;
pub use lfix_symbols as symbols;
