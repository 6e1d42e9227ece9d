//! Declaration AST nodes

use serde::{Deserialize, Serialize};
use crate::{Block, Expr, Param, Span, Type};

/// Stable index of a top-level declaration in a [`Forest`](crate::Forest)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DeclId(pub u32);

impl DeclId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Storage class as written. `None` at file scope means external linkage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Storage {
    #[default]
    None,
    Extern,
    Static,
    Typedef,
    Register,
    Auto,
}

impl Storage {
    pub fn keyword(self) -> Option<&'static str> {
        match self {
            Storage::None => None,
            Storage::Extern => Some("extern"),
            Storage::Static => Some("static"),
            Storage::Typedef => Some("typedef"),
            Storage::Register => Some("register"),
            Storage::Auto => Some("auto"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeclKind {
    Function,
    Variable,
    /// typedefs and struct/union/enum definitions
    Type,
}

/// A declaration: one declarator with its specifiers.
///
/// `int a, b;` produces two declarations sharing a base type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decl {
    /// Empty for bare tag declarations such as `struct Link { ... };`
    pub name: String,
    pub storage: Storage,
    pub ty: Type,
    pub init: Option<Init>,
    /// Present for function definitions
    pub body: Option<Block>,
    pub span: Span,
}

impl Decl {
    pub fn kind(&self) -> DeclKind {
        if self.storage == Storage::Typedef || self.name.is_empty() {
            DeclKind::Type
        } else if self.ty.is_func() {
            DeclKind::Function
        } else {
            DeclKind::Variable
        }
    }

    pub fn is_function(&self) -> bool {
        self.kind() == DeclKind::Function
    }

    /// A function with a body
    pub fn is_function_definition(&self) -> bool {
        self.is_function() && self.body.is_some()
    }

    /// A declaration that allocates storage or code in its unit
    pub fn is_definition(&self) -> bool {
        match self.kind() {
            DeclKind::Function => self.body.is_some(),
            DeclKind::Variable => self.storage != Storage::Extern || self.init.is_some(),
            DeclKind::Type => false,
        }
    }

    pub fn params(&self) -> Option<&[Param]> {
        self.ty.as_func().map(|f| f.params.as_slice())
    }
}

/// Variable initializer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Init {
    Expr(Expr),
    List(Vec<Init>),
    /// `.field = x` or `[i] = x` inside a list
    Designated {
        designator: Designator,
        init: Box<Init>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Designator {
    Field(String),
    Index(Expr),
}
