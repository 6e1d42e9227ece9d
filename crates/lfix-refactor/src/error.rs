//! Refactoring error types

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RefactorError {
    #[error("root symbol '{name}' not found")]
    MissingRoot { name: String },

    #[error("{pass}: trigger symbol '{name}' not found")]
    MissingTrigger { pass: String, name: String },

    #[error("cannot read plan {}: {source}", path.display())]
    PlanIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot list sources in {}: {source}", path.display())]
    SourceDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid plan {}: {source}", path.display())]
    PlanJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
