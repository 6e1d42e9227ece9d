//! lfix Parser - Recursive descent parser for a C subset
//!
//! Parses Plan 9 style C into the lfix AST and resolves references.
//! Key parsing challenges:
//! - No preprocessor: directives are skipped, so typedef names from headers
//!   are collected up front and undeclared type names are recognised by shape
//! - Declarators are inside-out and may nest (`Prog *(*f)(Link*)`)
//! - Storage-class macros such as `EXTERN` stand in for keywords

mod error;
mod parser;
mod resolve;

pub use error::*;
pub use parser::*;
pub use resolve::*;

use std::collections::{HashMap, HashSet};

use lfix_ast::{Forest, Frontend, SourceFile, Storage};
use lfix_lexer::{tokenize, Token, TokenKind};
use tracing::debug;

/// Typedef names supplied by the Plan 9 system headers
pub const SYSTEM_TYPEDEFS: &[&str] = &[
    "uchar", "ushort", "uint", "ulong", "vlong", "uvlong", "schar", "uintptr", "intptr", "usize",
    "Rune", "int8", "uint8", "int16", "uint16", "int32", "uint32", "int64", "uint64", "float32",
    "float64", "va_list", "jmp_buf", "Biobuf", "Fmt", "Dir", "Qid",
];

/// The bundled C front end
#[derive(Debug, Clone)]
pub struct CFrontend {
    typedefs: HashSet<String>,
    storage_macros: HashMap<String, Storage>,
}

impl Default for CFrontend {
    fn default() -> Self {
        Self {
            typedefs: SYSTEM_TYPEDEFS.iter().map(|s| s.to_string()).collect(),
            storage_macros: HashMap::from([("EXTERN".to_string(), Storage::Extern)]),
        }
    }
}

impl CFrontend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add typedef names the sources use but never declare
    pub fn with_typedefs<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.typedefs.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_storage_macro(mut self, name: impl Into<String>, storage: Storage) -> Self {
        self.storage_macros.insert(name.into(), storage);
        self
    }
}

impl Frontend for CFrontend {
    type Error = ParseError;

    fn read_many(&self, sources: &[SourceFile]) -> Result<Forest, ParseError> {
        let mut forest = Forest::new();
        let mut typedefs = self.typedefs.clone();

        let tokenized: Vec<Vec<Token>> = sources
            .iter()
            .map(|source| {
                let id = forest.add_file(source.path.clone());
                let tokens = tokenize(&source.text, id);
                typedefs.extend(typedef_names(&source.text, &tokens));
                tokens
            })
            .collect();

        for (source, tokens) in sources.iter().zip(tokenized) {
            let mut parser = Parser::new(&source.text, tokens, typedefs)
                .with_storage_macros(self.storage_macros.clone());
            let decls = parser.parse_unit()?;
            typedefs = parser.into_typedefs();
            debug!(file = %source.path, decls = decls.len(), "parsed");
            for decl in decls {
                forest.push(decl);
            }
        }

        resolve(&mut forest);
        Ok(forest)
    }
}

/// Parse a single source string with the default front end
pub fn parse(path: &str, source: &str) -> Result<Forest, ParseError> {
    CFrontend::default().read_many(&[SourceFile::new(path, source)])
}

/// Names declared by `typedef` at file scope, found without parsing so that
/// every file can see typedefs declared in any other.
fn typedef_names(source: &str, tokens: &[Token]) -> Vec<String> {
    let mut names = Vec::new();
    let mut depth = 0usize;
    let mut i = 0;

    while i < tokens.len() {
        match tokens[i].kind {
            TokenKind::LBrace => depth += 1,
            TokenKind::RBrace => depth = depth.saturating_sub(1),
            TokenKind::Typedef if depth == 0 => {
                let (found, next) = typedef_declarators(source, tokens, i + 1);
                names.extend(found);
                i = next;
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    names
}

/// Scan one typedef declaration starting at `start`; returns the declared
/// names and the index just past its `;`.
fn typedef_declarators(source: &str, tokens: &[Token], start: usize) -> (Vec<String>, usize) {
    let mut names = Vec::new();
    let mut braces = 0usize;
    let mut parens = 0usize;
    let mut i = start;

    while i < tokens.len() {
        let kind = tokens[i].kind;
        match kind {
            TokenKind::LBrace => braces += 1,
            TokenKind::RBrace => braces = braces.saturating_sub(1),
            TokenKind::LParen => parens += 1,
            TokenKind::RParen => parens = parens.saturating_sub(1),
            TokenKind::Semi if braces == 0 => return (names, i + 1),
            TokenKind::Eof => break,
            TokenKind::Ident if braces == 0 => {
                let next = tokens.get(i + 1).map(|t| t.kind);
                let prev = i.checked_sub(1).map(|p| tokens[p].kind);
                let plain = parens == 0
                    && matches!(
                        next,
                        Some(TokenKind::Semi | TokenKind::Comma | TokenKind::LBracket)
                    );
                // typedef int (*Handler)(void);
                let fnptr = parens == 1
                    && prev == Some(TokenKind::Star)
                    && next == Some(TokenKind::RParen);
                if plain || fnptr {
                    names.push(tokens[i].text(source).to_string());
                }
            }
            _ => {}
        }
        i += 1;
    }
    (names, i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lfix_ast::{ExprKind, FileId, StmtKind, ToC, Type, visit::Visitor};

    fn parse_ok(source: &str) -> Forest {
        let result = parse("x.c", source);
        assert!(result.is_ok(), "Failed to parse: {:?}", result.err());
        result.unwrap()
    }

    #[test]
    fn test_parse_function_definition() {
        let forest = parse_ok("static void\nspan(Link *ctxt, LSym *s)\n{\n\tint c;\n\tc = 0;\n}\n");
        assert_eq!(forest.decls.len(), 1);
        let decl = &forest.decls[0];
        assert_eq!(decl.name, "span");
        assert_eq!(decl.storage, Storage::Static);
        assert!(decl.is_function_definition());
        let params = decl.params().unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].name.as_deref(), Some("ctxt"));
        assert_eq!(
            params[0].ty,
            Type::Ptr(Box::new(Type::Base("Link".to_string())))
        );
    }

    #[test]
    fn test_parse_prototypes_and_variables() {
        let forest = parse_ok("void\tspan(void);\nint\taclass(Adr*);\nint32\tinstoffset, *pool;\nchar\t*anames[] = { \"XXX\", \"ADD\" };\n");
        let names: Vec<_> = forest.decls.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["span", "aclass", "instoffset", "pool", "anames"]);
        assert!(forest.decls[0].ty.as_func().unwrap().takes_no_args());
        assert!(!forest.decls[0].is_definition());
        assert!(forest.decls[2].is_definition());
        assert!(forest.decls[4].init.is_some());
    }

    #[test]
    fn test_typedef_from_other_file() {
        let sources = vec![
            SourceFile::new("a.c", "Optab *oplook(Prog *p) { return nil; }\nOptab optab[10];\n"),
            SourceFile::new("l.h", "typedef struct Optab Optab;\nstruct Optab { char as; uchar a1; };\n"),
        ];
        let forest = CFrontend::default().read_many(&sources).unwrap();
        assert_eq!(forest.files, vec!["a.c", "l.h"]);
        assert_eq!(forest.decls[1].name, "optab");
        assert_eq!(forest.aggregate_fields("Optab"), Some(vec!["as".to_string(), "a1".to_string()]));
        assert_eq!(forest.decl_path(lfix_ast::DeclId(2)), "l.h");
    }

    #[test]
    fn test_extern_macro() {
        let forest = parse_ok("EXTERN\tint32\tautosize;\nEXTERN\tProg*\tblitrl;\n");
        assert_eq!(forest.decls.len(), 2);
        assert_eq!(forest.decls[0].storage, Storage::Extern);
        assert!(!forest.decls[1].is_definition());
    }

    #[test]
    fn test_function_pointer_declarator() {
        let forest = parse_ok("void (*handler)(Link*, int);\n");
        let decl = &forest.decls[0];
        assert_eq!(decl.name, "handler");
        match &decl.ty {
            Type::Ptr(inner) => assert!(inner.is_func()),
            other => panic!("expected pointer to function, got {:?}", other),
        }
        assert!(!decl.is_function());
    }

    #[test]
    fn test_resolves_globals_and_skips_locals() {
        let source = "int pc;\nvoid helper(void);\nvoid\nf(int pc)\n{\n\tint x;\n\thelper();\n\tx = pc;\n}\nvoid\ng(void)\n{\n\tpc++;\n}\nvoid helper(void) {}\n";
        let forest = parse_ok(source);

        struct Names(Vec<(String, Option<lfix_ast::DeclId>)>);
        impl Visitor for Names {
            fn visit_expr(&mut self, expr: &lfix_ast::Expr) {
                if let ExprKind::Name { text, decl } = &expr.kind {
                    self.0.push((text.clone(), *decl));
                }
                lfix_ast::visit::walk_expr(self, expr);
            }
        }

        let mut f = Names(Vec::new());
        f.visit_decl(&forest.decls[2]);
        // helper resolves to its definition, pc is the parameter
        assert_eq!(f.0[0], ("helper".to_string(), Some(lfix_ast::DeclId(4))));
        assert!(f.0.iter().filter(|(n, _)| n == "pc").all(|(_, d)| d.is_none()));

        let mut g = Names(Vec::new());
        g.visit_decl(&forest.decls[3]);
        assert_eq!(g.0, vec![("pc".to_string(), Some(lfix_ast::DeclId(0)))]);
    }

    #[test]
    fn test_statements() {
        let source = r#"
void
follow(Link *ctxt, Prog *p)
{
	int i;
	Prog *q;

	for(i = 0; i < 10; i++) {
		if(p == nil)
			break;
		else if(p->as == AB)
			continue;
	}
	switch(p->as) {
	case ARET:
	default:
		q = (Prog*)p->pcond;
		goto out;
	}
	do
		p = p->link;
	while(p != nil);
out:
	return;
}
"#;
        let forest = parse_ok(source);
        let body = forest.decls[0].body.as_ref().unwrap();
        assert!(matches!(body.stmts[0].kind, StmtKind::Decl(_)));
        assert!(matches!(body.stmts[1].kind, StmtKind::Decl(_)));
        assert!(matches!(body.stmts[2].kind, StmtKind::For { .. }));
        assert!(matches!(body.stmts[3].kind, StmtKind::Switch { .. }));
        assert!(matches!(body.stmts[4].kind, StmtKind::DoWhile { .. }));
        assert!(matches!(body.stmts[5].kind, StmtKind::Label(ref l) if l == "out"));
    }

    #[test]
    fn test_cast_and_sizeof() {
        let forest = parse_ok("void f(void) { n = sizeof(Optab); p = (uchar*)q; m = sizeof(vlong); }");
        let body = forest.decls[0].body.as_ref().unwrap();
        let values: Vec<_> = body
            .stmts
            .iter()
            .map(|s| match &s.kind {
                StmtKind::Expr(lfix_ast::Expr {
                    kind: ExprKind::Assign { value, .. },
                    ..
                }) => value.kind.clone(),
                other => panic!("unexpected {:?}", other),
            })
            .collect();
        assert!(matches!(values[0], ExprKind::SizeofExpr(_)));
        assert!(matches!(values[1], ExprKind::Cast { .. }));
        assert!(matches!(values[2], ExprKind::SizeofType(_)));
    }

    #[test]
    fn test_va_arg_takes_type_name() {
        let source = "int\nAconv(Fmt *fp)\n{\n\tint a;\n\tProg *p;\n\n\ta = va_arg(fp->args, int);\n\tp = va_arg(fp->args, Prog*);\n\treturn a;\n}\n";
        let forest = parse_ok(source);
        let body = forest.decls[0].body.as_ref().unwrap();
        let types: Vec<_> = body.stmts[2..4]
            .iter()
            .map(|s| match &s.kind {
                StmtKind::Expr(lfix_ast::Expr {
                    kind: ExprKind::Assign { value, .. },
                    ..
                }) => match &value.kind {
                    ExprKind::VaArg { ap, ty } => {
                        assert!(matches!(ap.kind, ExprKind::Member { arrow: true, .. }));
                        ty.declare("")
                    }
                    other => panic!("unexpected {:?}", other),
                },
                other => panic!("unexpected {:?}", other),
            })
            .collect();
        assert_eq!(types, vec!["int", "Prog *"]);
        assert!(forest.decls[0].to_c(0).contains("\ta = va_arg(fp->args, int);"));
        assert!(forest.decls[0].to_c(0).contains("\tp = va_arg(fp->args, Prog *);"));
    }

    #[test]
    fn test_struct_with_bitfields_and_designators() {
        let forest = parse_ok(
            "struct Opcross { uchar a : 4, b : 4; };\nstatic Optab tab[] = { [0] = { 1, 2 }, { .as = 3 } };\n",
        );
        assert_eq!(forest.decls[0].name, "");
        assert_eq!(forest.decls[1].storage, Storage::Static);
    }

    #[test]
    fn test_parse_error_has_span() {
        let err = parse("x.c", "int f(void) {\n\treturn 1\n}\n").unwrap_err();
        match &err {
            ParseError::UnexpectedToken { expected, .. } => assert_eq!(expected, "';'"),
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(err.span().line, 3);
    }

    #[test]
    fn test_typedef_scan() {
        let source = "typedef struct Link Link, *PLink;\ntypedef int (*Handler)(void);\nstruct S { int typedef_like; };\n";
        let tokens = tokenize(source, FileId(0));
        let names = typedef_names(source, &tokens);
        assert_eq!(names, vec!["Link", "PLink", "Handler"]);
    }
}
