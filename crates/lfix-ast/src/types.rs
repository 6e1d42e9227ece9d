//! C type representation

use serde::{Deserialize, Serialize};
use crate::{Expr, Span};

/// A C type as written in a declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Type {
    /// Basic or typedef-named type with its qualifiers: `int`, `unsigned long`,
    /// `const char`, `Prog`
    Base(String),

    /// `struct`, `union` or `enum`, with or without a body
    Aggregate(Aggregate),

    /// Pointer to the inner type
    Ptr(Box<Type>),

    /// Array of the inner type with optional length
    Array(Box<Type>, Option<Box<Expr>>),

    /// Function returning a type
    Func(FuncType),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuncType {
    pub ret: Box<Type>,
    pub params: Vec<Param>,
    pub variadic: bool,
}

impl FuncType {
    /// True for `f()` and `f(void)`
    pub fn takes_no_args(&self) -> bool {
        if self.variadic {
            return false;
        }
        match self.params.as_slice() {
            [] => true,
            [only] => only.name.is_none() && only.ty.is_void(),
            _ => false,
        }
    }
}

/// A formal parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: Option<String>,
    pub ty: Type,
    pub span: Span,
}

impl Param {
    /// `type_name *name`, the shape used for threaded parameters
    pub fn pointer_to(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ty: Type::Ptr(Box::new(Type::Base(type_name.into()))),
            span: Span::dummy(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregateKind {
    Struct,
    Union,
    Enum,
}

impl AggregateKind {
    pub fn keyword(self) -> &'static str {
        match self {
            AggregateKind::Struct => "struct",
            AggregateKind::Union => "union",
            AggregateKind::Enum => "enum",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    pub kind: AggregateKind,
    pub tag: Option<String>,
    /// `None` for a bare reference such as `struct Link *`
    pub body: Option<AggregateBody>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AggregateBody {
    Fields(Vec<Field>),
    Enumerators(Vec<Enumerator>),
}

/// A struct or union member. Anonymous members have an empty name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub ty: Type,
    pub width: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enumerator {
    pub name: String,
    pub value: Option<Expr>,
}

impl Type {
    pub fn is_void(&self) -> bool {
        matches!(self, Type::Base(name) if name == "void")
    }

    pub fn is_func(&self) -> bool {
        matches!(self, Type::Func(_))
    }

    pub fn as_func(&self) -> Option<&FuncType> {
        match self {
            Type::Func(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_func_mut(&mut self) -> Option<&mut FuncType> {
        match self {
            Type::Func(f) => Some(f),
            _ => None,
        }
    }

    /// Names of the members of a struct or union body
    pub fn field_names(&self) -> Vec<&str> {
        match self {
            Type::Aggregate(Aggregate {
                body: Some(AggregateBody::Fields(fields)),
                ..
            }) => fields
                .iter()
                .filter(|f| !f.name.is_empty())
                .map(|f| f.name.as_str())
                .collect(),
            _ => Vec::new(),
        }
    }
}
