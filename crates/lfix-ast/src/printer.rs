//! C text printer
//!
//! Serializes declarations back to C in Plan 9 layout: tab indentation,
//! function return types on their own line, `if(x)` without a space.

use crate::{
    Aggregate, AggregateBody, Block, Decl, DeclKind, Designator, Expr, ExprKind, FuncType, Init,
    Param, Stmt, StmtKind, Type,
};

/// Trait for converting AST nodes to C source text.
pub trait ToC {
    /// Convert to C text at the given indentation level.
    fn to_c(&self, indent: usize) -> String;
}

fn indent_str(level: usize) -> String {
    "\t".repeat(level)
}

// ===== Types =====

impl Type {
    /// Render a declarator: the type wrapped around `name` the way C spells it.
    /// An empty name gives an abstract declarator as used in casts.
    pub fn declare(&self, name: &str) -> String {
        match self {
            Type::Base(base) => join_specifier(base, name),
            Type::Aggregate(agg) => join_specifier(&agg.specifier(0), name),
            Type::Ptr(inner) => {
                let star = format!("*{}", name);
                match inner.as_ref() {
                    Type::Array(..) | Type::Func(_) => inner.declare(&format!("({})", star)),
                    _ => inner.declare(&star),
                }
            }
            Type::Array(inner, len) => {
                let len = len.as_ref().map(|e| e.to_c(0)).unwrap_or_default();
                inner.declare(&format!("{}[{}]", name, len))
            }
            Type::Func(f) => f.ret.declare(&format!("{}({})", name, f.param_list())),
        }
    }
}

fn join_specifier(spec: &str, name: &str) -> String {
    if name.is_empty() {
        spec.to_string()
    } else {
        format!("{} {}", spec, name)
    }
}

impl FuncType {
    /// Parameter list without the enclosing parentheses
    pub fn param_list(&self) -> String {
        let mut parts: Vec<String> = self.params.iter().map(Param::to_text).collect();
        if self.variadic {
            parts.push("...".to_string());
        }
        parts.join(", ")
    }
}

impl Param {
    fn to_text(&self) -> String {
        self.ty.declare(self.name.as_deref().unwrap_or(""))
    }
}

impl Aggregate {
    /// `struct Tag`, or the full definition when a body is present
    pub fn specifier(&self, indent: usize) -> String {
        let mut out = self.kind.keyword().to_string();
        if let Some(tag) = &self.tag {
            out.push(' ');
            out.push_str(tag);
        }
        let Some(body) = &self.body else {
            return out;
        };
        let ind = indent_str(indent);
        let inner = indent_str(indent + 1);
        out.push('\n');
        out.push_str(&ind);
        out.push_str("{\n");
        match body {
            AggregateBody::Fields(fields) => {
                for f in fields {
                    out.push_str(&inner);
                    out.push_str(&f.ty.declare(&f.name));
                    if let Some(w) = &f.width {
                        out.push_str(&format!(" : {}", w.to_c(0)));
                    }
                    out.push_str(";\n");
                }
            }
            AggregateBody::Enumerators(items) => {
                for e in items {
                    out.push_str(&inner);
                    out.push_str(&e.name);
                    if let Some(v) = &e.value {
                        out.push_str(&format!(" = {}", v.to_c(0)));
                    }
                    out.push_str(",\n");
                }
            }
        }
        out.push_str(&ind);
        out.push('}');
        out
    }
}

// ===== Declarations =====

impl ToC for Decl {
    fn to_c(&self, indent: usize) -> String {
        let ind = indent_str(indent);
        let storage = self
            .storage
            .keyword()
            .map(|k| format!("{} ", k))
            .unwrap_or_default();

        if let (Some(body), Type::Func(f)) = (&self.body, &self.ty) {
            // return type on its own line, then name(params)
            let head = format!("{}({})", self.name, f.param_list());
            let ret = f.ret.declare("");
            return format!(
                "{}{}{}\n{}{}\n{}",
                ind,
                storage,
                ret,
                ind,
                head,
                body.to_c(indent)
            );
        }

        if let (DeclKind::Type, true, Type::Aggregate(agg)) =
            (self.kind(), self.name.is_empty(), &self.ty)
        {
            return format!("{}{};", ind, agg.specifier(indent));
        }

        let mut out = format!("{}{}{}", ind, storage, self.ty.declare(&self.name));
        if let Some(init) = &self.init {
            out.push_str(" = ");
            out.push_str(&init.to_c(indent));
        }
        out.push(';');
        out
    }
}

impl ToC for Init {
    fn to_c(&self, indent: usize) -> String {
        match self {
            Init::Expr(e) => e.to_c(indent),
            Init::Designated { designator, init } => match designator {
                Designator::Field(name) => format!(".{} = {}", name, init.to_c(indent)),
                Designator::Index(e) => format!("[{}] = {}", e.to_c(0), init.to_c(indent)),
            },
            Init::List(items) => {
                let nested = items.iter().any(|i| matches!(i, Init::List(_)))
                    || items.iter().any(
                        |i| matches!(i, Init::Designated { init, .. } if matches!(**init, Init::List(_))),
                    );
                if !nested {
                    let parts: Vec<String> = items.iter().map(|i| i.to_c(indent)).collect();
                    return format!("{{ {} }}", parts.join(", "));
                }
                // one element per line for tables
                let inner = indent_str(indent + 1);
                let mut out = String::from("{\n");
                for item in items {
                    out.push_str(&inner);
                    out.push_str(&item.to_c(indent + 1));
                    out.push_str(",\n");
                }
                out.push_str(&indent_str(indent));
                out.push('}');
                out
            }
        }
    }
}

// ===== Statements =====

impl ToC for Block {
    fn to_c(&self, indent: usize) -> String {
        let ind = indent_str(indent);
        let mut out = format!("{}{{\n", ind);
        for stmt in &self.stmts {
            out.push_str(&stmt.to_c(indent + 1));
            out.push('\n');
        }
        out.push_str(&ind);
        out.push('}');
        out
    }
}

/// Print a statement that hangs off a header such as `if(x)`: blocks open on
/// the header line, anything else goes on the next line one level deeper.
fn body_to_c(header: String, body: &Stmt, indent: usize) -> String {
    match &body.kind {
        StmtKind::Block(block) => format!("{} {}", header, block_inline(block, indent)),
        _ => format!("{}\n{}", header, body.to_c(indent + 1)),
    }
}

/// A block whose opening brace continues the current line
fn block_inline(block: &Block, indent: usize) -> String {
    let text = block.to_c(indent);
    text.trim_start_matches('\t').to_string()
}

impl ToC for Stmt {
    fn to_c(&self, indent: usize) -> String {
        let ind = indent_str(indent);
        match &self.kind {
            StmtKind::Empty => format!("{};", ind),
            StmtKind::Expr(e) => format!("{}{};", ind, e.to_c(indent)),
            StmtKind::Decl(decls) => decls
                .iter()
                .map(|d| d.to_c(indent))
                .collect::<Vec<_>>()
                .join("\n"),
            StmtKind::Block(block) => block.to_c(indent),
            StmtKind::If {
                cond,
                then,
                otherwise,
            } => {
                let mut out = body_to_c(format!("{}if({})", ind, cond.to_c(indent)), then, indent);
                if let Some(other) = otherwise {
                    let joiner = if matches!(then.kind, StmtKind::Block(_)) {
                        " else".to_string()
                    } else {
                        format!("\n{}else", ind)
                    };
                    match &other.kind {
                        StmtKind::If { .. } => {
                            out.push_str(&joiner);
                            out.push(' ');
                            out.push_str(other.to_c(indent).trim_start_matches('\t'));
                        }
                        _ => {
                            let tail = body_to_c(String::new(), other, indent);
                            out.push_str(&joiner);
                            out.push_str(&tail);
                        }
                    }
                }
                out
            }
            StmtKind::While { cond, body } => {
                body_to_c(format!("{}while({})", ind, cond.to_c(indent)), body, indent)
            }
            StmtKind::DoWhile { body, cond } => {
                let head = body_to_c(format!("{}do", ind), body, indent);
                let sep = if matches!(body.kind, StmtKind::Block(_)) {
                    " ".to_string()
                } else {
                    format!("\n{}", ind)
                };
                format!("{}{}while({});", head, sep, cond.to_c(indent))
            }
            StmtKind::For {
                init,
                cond,
                step,
                body,
            } => {
                let part = |e: &Option<Expr>| e.as_ref().map(|e| e.to_c(indent)).unwrap_or_default();
                let header = format!(
                    "{}for({}; {}; {})",
                    ind,
                    part(init),
                    part(cond),
                    part(step)
                );
                body_to_c(header, body, indent)
            }
            StmtKind::Switch { cond, body } => {
                body_to_c(format!("{}switch({})", ind, cond.to_c(indent)), body, indent)
            }
            StmtKind::Case(value) => {
                format!("{}case {}:", indent_str(indent.saturating_sub(1)), value.to_c(indent))
            }
            StmtKind::Default => format!("{}default:", indent_str(indent.saturating_sub(1))),
            StmtKind::Label(name) => format!("{}:", name),
            StmtKind::Goto(label) => format!("{}goto {};", ind, label),
            StmtKind::Break => format!("{}break;", ind),
            StmtKind::Continue => format!("{}continue;", ind),
            StmtKind::Return(None) => format!("{}return;", ind),
            StmtKind::Return(Some(e)) => format!("{}return {};", ind, e.to_c(indent)),
        }
    }
}

// ===== Expressions =====

impl ToC for Expr {
    fn to_c(&self, indent: usize) -> String {
        match &self.kind {
            ExprKind::Name { text, .. } => text.clone(),
            ExprKind::Number(text) | ExprKind::Char(text) => text.clone(),
            ExprKind::Str(parts) => parts.join(" "),
            ExprKind::Paren(inner) => format!("({})", inner.to_c(indent)),
            ExprKind::Unary { op, operand } => format!("{}{}", op.symbol(), operand.to_c(indent)),
            ExprKind::Postfix { op, operand } => format!("{}{}", operand.to_c(indent), op.symbol()),
            ExprKind::Binary { op, left, right } => format!(
                "{} {} {}",
                left.to_c(indent),
                op.symbol(),
                right.to_c(indent)
            ),
            ExprKind::Assign { op, target, value } => format!(
                "{} {} {}",
                target.to_c(indent),
                op.symbol(),
                value.to_c(indent)
            ),
            ExprKind::Cond {
                cond,
                then,
                otherwise,
            } => format!(
                "{} ? {} : {}",
                cond.to_c(indent),
                then.to_c(indent),
                otherwise.to_c(indent)
            ),
            ExprKind::Call { callee, args } => {
                let args: Vec<String> = args.iter().map(|a| a.to_c(indent)).collect();
                format!("{}({})", callee.to_c(indent), args.join(", "))
            }
            ExprKind::Index { base, index } => {
                format!("{}[{}]", base.to_c(indent), index.to_c(indent))
            }
            ExprKind::Member { base, field, arrow } => {
                let op = if *arrow { "->" } else { "." };
                format!("{}{}{}", base.to_c(indent), op, field)
            }
            ExprKind::Cast { ty, expr } => format!("({}){}", ty.declare(""), expr.to_c(indent)),
            ExprKind::SizeofExpr(e) => match e.kind {
                ExprKind::Paren(_) => format!("sizeof{}", e.to_c(indent)),
                _ => format!("sizeof {}", e.to_c(indent)),
            },
            ExprKind::SizeofType(ty) => format!("sizeof({})", ty.declare("")),
            ExprKind::VaArg { ap, ty } => {
                format!("va_arg({}, {})", ap.to_c(indent), ty.declare(""))
            }
            ExprKind::Comma { left, right } => {
                format!("{}, {}", left.to_c(indent), right.to_c(indent))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AggregateKind, BinaryOp, Span, Storage};

    fn make_span() -> Span {
        Span::dummy()
    }

    fn base(name: &str) -> Type {
        Type::Base(name.into())
    }

    fn func(ret: Type, params: Vec<Param>) -> Type {
        Type::Func(FuncType {
            ret: Box::new(ret),
            params,
            variadic: false,
        })
    }

    #[test]
    fn test_declare_pointer_and_array() {
        let ty = Type::Array(Box::new(Type::Ptr(Box::new(base("char")))), None);
        assert_eq!(ty.declare("argv"), "char *argv[]");
    }

    #[test]
    fn test_declare_function_pointer() {
        let f = func(base("int"), vec![Param::pointer_to("p", "Prog")]);
        let ty = Type::Ptr(Box::new(f));
        assert_eq!(ty.declare("fn"), "int (*fn)(Prog *p)");
    }

    #[test]
    fn test_abstract_declarator() {
        let ty = Type::Ptr(Box::new(base("uchar")));
        assert_eq!(ty.declare(""), "uchar *");
    }

    #[test]
    fn test_function_definition_layout() {
        let decl = Decl {
            name: "span".into(),
            storage: Storage::Static,
            ty: func(base("void"), vec![Param::pointer_to("ctxt", "Link")]),
            init: None,
            body: Some(Block {
                stmts: vec![Stmt::new(
                    StmtKind::Return(None),
                    make_span(),
                )],
                span: make_span(),
            }),
            span: make_span(),
        };
        assert_eq!(
            decl.to_c(0),
            "static void\nspan(Link *ctxt)\n{\n\treturn;\n}"
        );
    }

    #[test]
    fn test_if_else_layout() {
        let cond = Expr::new(
            ExprKind::Binary {
                op: BinaryOp::Eq,
                left: Box::new(Expr::name("a")),
                right: Box::new(Expr::new(ExprKind::Number("0".into()), make_span())),
            },
            make_span(),
        );
        let stmt = Stmt::new(
            StmtKind::If {
                cond,
                then: Box::new(Stmt::new(StmtKind::Break, make_span())),
                otherwise: Some(Box::new(Stmt::new(StmtKind::Continue, make_span()))),
            },
            make_span(),
        );
        assert_eq!(stmt.to_c(1), "\tif(a == 0)\n\t\tbreak;\n\telse\n\t\tcontinue;");
    }

    #[test]
    fn test_struct_definition() {
        let decl = Decl {
            name: String::new(),
            storage: Storage::None,
            ty: Type::Aggregate(Aggregate {
                kind: AggregateKind::Struct,
                tag: Some("Link".into()),
                body: Some(AggregateBody::Fields(vec![crate::Field {
                    name: "pc".into(),
                    ty: base("vlong"),
                    width: None,
                }])),
            }),
            init: None,
            body: None,
            span: make_span(),
        };
        assert_eq!(decl.to_c(0), "struct Link\n{\n\tvlong pc;\n};");
    }

    #[test]
    fn test_va_arg_prints_type_operand() {
        let expr = Expr::new(
            ExprKind::VaArg {
                ap: Box::new(Expr::name("arg")),
                ty: Type::Ptr(Box::new(base("Prog"))),
            },
            make_span(),
        );
        assert_eq!(expr.to_c(0), "va_arg(arg, Prog *)");
    }

    #[test]
    fn test_variable_with_initializer() {
        let decl = Decl {
            name: "nelem".into(),
            storage: Storage::None,
            ty: base("int"),
            init: Some(Init::Expr(Expr::new(ExprKind::Number("4".into()), make_span()))),
            body: None,
            span: make_span(),
        };
        assert_eq!(decl.to_c(0), "int nelem = 4;");
    }
}
