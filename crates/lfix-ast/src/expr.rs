//! Expression AST nodes

use serde::{Deserialize, Serialize};
use crate::{DeclId, Span, Type};

/// An expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    /// Identifier reference. `decl` is filled in by the front end when the name
    /// resolves to a top-level declaration; locals and unknown names stay `None`.
    Name {
        text: String,
        decl: Option<DeclId>,
    },

    /// Numeric literal, kept as written: `0x10`, `1.5e3`, `7UL`
    Number(String),

    /// Character literal including quotes: `'a'`
    Char(String),

    /// Adjacent string literals including quotes: `"a" "b"`
    Str(Vec<String>),

    /// Parenthesized expression, kept so printing reproduces the source
    Paren(Box<Expr>),

    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },

    Postfix {
        op: PostfixOp,
        operand: Box<Expr>,
    },

    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    Assign {
        op: AssignOp,
        target: Box<Expr>,
        value: Box<Expr>,
    },

    /// `cond ? then : otherwise`
    Cond {
        cond: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },

    /// Function call: `foo(a, b)`
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },

    /// `base[index]`
    Index {
        base: Box<Expr>,
        index: Box<Expr>,
    },

    /// `base.field` or `base->field`
    Member {
        base: Box<Expr>,
        field: String,
        arrow: bool,
    },

    Cast {
        ty: Type,
        expr: Box<Expr>,
    },

    SizeofExpr(Box<Expr>),

    SizeofType(Type),

    /// `va_arg(ap, type)`, whose second operand is a type name
    VaArg {
        ap: Box<Expr>,
        ty: Type,
    },

    /// `left, right`
    Comma {
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    AddrOf,
    Deref,
    Plus,
    Neg,
    Not,
    BitNot,
    PreInc,
    PreDec,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::AddrOf => "&",
            UnaryOp::Deref => "*",
            UnaryOp::Plus => "+",
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
            UnaryOp::PreInc => "++",
            UnaryOp::PreDec => "--",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostfixOp {
    Inc,
    Dec,
}

impl PostfixOp {
    pub fn symbol(self) -> &'static str {
        match self {
            PostfixOp::Inc => "++",
            PostfixOp::Dec => "--",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Mul,
    Div,
    Rem,
    Add,
    Sub,
    Shl,
    Shr,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
    BitAnd,
    BitXor,
    BitOr,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitXor => "^",
            BinaryOp::BitOr => "|",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }

    /// Binding strength, higher binds tighter
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::Or => 1,
            BinaryOp::And => 2,
            BinaryOp::BitOr => 3,
            BinaryOp::BitXor => 4,
            BinaryOp::BitAnd => 5,
            BinaryOp::Eq | BinaryOp::Ne => 6,
            BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge => 7,
            BinaryOp::Shl | BinaryOp::Shr => 8,
            BinaryOp::Add | BinaryOp::Sub => 9,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignOp {
    Assign,
    Mul,
    Div,
    Rem,
    Add,
    Sub,
    Shl,
    Shr,
    And,
    Xor,
    Or,
}

impl AssignOp {
    pub fn symbol(self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::Mul => "*=",
            AssignOp::Div => "/=",
            AssignOp::Rem => "%=",
            AssignOp::Add => "+=",
            AssignOp::Sub => "-=",
            AssignOp::Shl => "<<=",
            AssignOp::Shr => ">>=",
            AssignOp::And => "&=",
            AssignOp::Xor => "^=",
            AssignOp::Or => "|=",
        }
    }
}

/// The three expression shapes that create dependency edges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefShape<'a> {
    /// A bare identifier
    Name { text: &'a str, decl: Option<DeclId> },
    /// `&x`, with the declaration `x` resolves to
    AddrOf(Option<DeclId>),
    /// `f(...)`, with the declaration `f` resolves to
    Call(Option<DeclId>),
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// An unresolved identifier with no source position
    pub fn name(text: impl Into<String>) -> Self {
        Self {
            kind: ExprKind::Name {
                text: text.into(),
                decl: None,
            },
            span: Span::dummy(),
        }
    }

    /// Classify this node as one of the reference shapes, if it is one
    pub fn ref_shape(&self) -> Option<RefShape<'_>> {
        match &self.kind {
            ExprKind::Name { text, decl } => Some(RefShape::Name { text, decl: *decl }),
            ExprKind::Unary {
                op: UnaryOp::AddrOf,
                operand,
            } => Some(RefShape::AddrOf(operand.target())),
            ExprKind::Call { callee, .. } => Some(RefShape::Call(callee.target())),
            _ => None,
        }
    }

    /// The declaration an identifier resolves to, looking through parentheses
    pub fn target(&self) -> Option<DeclId> {
        match &self.kind {
            ExprKind::Name { decl, .. } => *decl,
            ExprKind::Paren(inner) => inner.target(),
            _ => None,
        }
    }

    /// The identifier node under any parentheses, for in-place renaming
    pub fn target_name_mut(&mut self) -> Option<&mut String> {
        match &mut self.kind {
            ExprKind::Name { text, .. } => Some(text),
            ExprKind::Paren(inner) => inner.target_name_mut(),
            _ => None,
        }
    }
}
