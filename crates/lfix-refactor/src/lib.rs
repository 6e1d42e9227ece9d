//! lfix-refactor: Program rewriting passes
//!
//! The passes of the migration, each a [`RefactorPass`]:
//!
//! - **Extract**: keep the closure of the root symbols
//! - **Localize**: give internal linkage to definitions used in one unit
//! - **Rename**: rename symbols and their references
//! - **Thread**: turn trigger globals into a threaded parameter
//!
//! # Usage
//!
//! ```ignore
//! use lfix_refactor::{MigrationPlan, Pipeline};
//!
//! let plan = MigrationPlan::default();
//! let pipeline = Pipeline::from_plan(&plan, link_fields);
//! pipeline.run(&mut program, |stage, name, program| {
//!     emitter.emit(program, &out.join(format!("l.{}", stage)))
//! })?;
//! ```

mod error;
pub mod passes;
mod pipeline;
mod plan;

pub use error::RefactorError;
pub use passes::{
    closure, Extract, Localize, ParamSpec, PassResult, PassWarning, RefactorPass, Rename, Thread,
    ThreadSpec,
};
pub use pipeline::Pipeline;
pub use plan::{ContextPlan, MigrationPlan};
