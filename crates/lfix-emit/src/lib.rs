//! lfix-emit: Snapshot emission
//!
//! Writes the retained symbols of a [`Program`](lfix_symbols::Program) as C
//! files grouped by output unit, one directory per stage, and diffs the
//! stage directories against each other.

mod diff;
mod emitter;
mod error;

pub use diff::{snapshot_name, write_diffs, STAGE_PAIRS};
pub use emitter::{EmitReport, Emitter, BUILD_IGNORE};
pub use error::EmitError;
