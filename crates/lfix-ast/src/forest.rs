//! Parsed translation units and the front-end interface

use serde::{Deserialize, Serialize};
use crate::{Decl, DeclId, FileId};

/// One input file handed to a front end
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: String,
    pub text: String,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }
}

/// A collection of translation units with references resolved.
///
/// Top-level declarations of every file live in one arena, in file order then
/// source order. `DeclId` indexes that arena.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Forest {
    pub files: Vec<String>,
    pub decls: Vec<Decl>,
}

impl Forest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&mut self, path: impl Into<String>) -> FileId {
        let id = FileId(self.files.len() as u32);
        self.files.push(path.into());
        id
    }

    pub fn push(&mut self, decl: Decl) -> DeclId {
        let id = DeclId(self.decls.len() as u32);
        self.decls.push(decl);
        id
    }

    pub fn file_path(&self, id: FileId) -> &str {
        self.files.get(id.0 as usize).map(String::as_str).unwrap_or("")
    }

    pub fn decl(&self, id: DeclId) -> &Decl {
        &self.decls[id.index()]
    }

    pub fn decl_mut(&mut self, id: DeclId) -> &mut Decl {
        &mut self.decls[id.index()]
    }

    /// Iterate over declarations with their ids
    pub fn iter(&self) -> impl Iterator<Item = (DeclId, &Decl)> {
        self.decls
            .iter()
            .enumerate()
            .map(|(i, d)| (DeclId(i as u32), d))
    }

    /// Path of the file a declaration came from
    pub fn decl_path(&self, id: DeclId) -> &str {
        self.file_path(self.decl(id).span.file)
    }

    /// Member names of the struct or union with the given tag
    pub fn aggregate_fields(&self, tag: &str) -> Option<Vec<String>> {
        self.decls.iter().find_map(|decl| match &decl.ty {
            crate::Type::Aggregate(agg) if agg.tag.as_deref() == Some(tag) && agg.body.is_some() => {
                Some(decl.ty.field_names().into_iter().map(String::from).collect())
            }
            _ => None,
        })
    }
}

/// A C front end: parses sources and resolves name references to
/// top-level declarations.
///
/// The pipeline only relies on this trait and the AST vocabulary, so a
/// different parser can be substituted for the bundled one.
pub trait Frontend {
    type Error: std::error::Error + 'static;

    fn read_many(&self, sources: &[SourceFile]) -> Result<Forest, Self::Error>;
}
