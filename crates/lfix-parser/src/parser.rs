//! Recursive descent parser implementation

use std::collections::{HashMap, HashSet};

use lfix_ast::*;
use lfix_lexer::{Token, TokenKind};

use crate::ParseError;

/// Specifiers shared by every declarator of one declaration
struct Specifiers {
    storage: Storage,
    ty: Type,
    /// A type word was written (as opposed to implicit `int`)
    has_type: bool,
}

/// Declarator derivation, listed from the name outward
enum Derive {
    Ptr,
    Array(Option<Box<Expr>>),
    Func(Vec<Param>, bool),
}

impl Derive {
    fn apply(self, ty: Type) -> Type {
        match self {
            Derive::Ptr => Type::Ptr(Box::new(ty)),
            Derive::Array(len) => Type::Array(Box::new(ty), len),
            Derive::Func(params, variadic) => Type::Func(FuncType {
                ret: Box::new(ty),
                params,
                variadic,
            }),
        }
    }
}

pub struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    typedefs: HashSet<String>,
    storage_macros: HashMap<String, Storage>,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str, tokens: Vec<Token>, typedefs: HashSet<String>) -> Self {
        Self {
            source,
            tokens,
            pos: 0,
            typedefs,
            storage_macros: HashMap::new(),
        }
    }

    /// Identifiers that stand for a storage class, such as `EXTERN`
    pub fn with_storage_macros(mut self, macros: HashMap<String, Storage>) -> Self {
        self.storage_macros = macros;
        self
    }

    /// Typedef names known so far, including those this parser declared
    pub fn into_typedefs(self) -> HashSet<String> {
        self.typedefs
    }

    // === Utilities ===

    fn current(&self) -> &Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.pos.min(last)]
    }

    fn peek(&self) -> TokenKind {
        self.current().kind
    }

    fn peek_ahead(&self, n: usize) -> TokenKind {
        self.tokens
            .get(self.pos + n)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    fn text_ahead(&self, n: usize) -> &'a str {
        match self.tokens.get(self.pos + n) {
            Some(t) if t.kind == TokenKind::Ident => t.text(self.source),
            _ => "",
        }
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek() == kind
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        if self.at(kind) {
            Ok(self.advance())
        } else {
            Err(ParseError::unexpected(
                kind.describe(),
                self.peek(),
                self.current().span,
            ))
        }
    }

    fn text(&self, token: &Token) -> &'a str {
        token.text(self.source)
    }

    fn span(&self) -> Span {
        self.current().span
    }

    /// Span of the most recently consumed token
    fn prev_span(&self) -> Span {
        match self.pos.checked_sub(1) {
            Some(i) => self.tokens[i].span,
            None => self.span(),
        }
    }

    fn ident(&mut self) -> Result<String, ParseError> {
        let token = self.consume(TokenKind::Ident)?;
        Ok(self.text(&token).to_string())
    }

    // === Lookahead heuristics ===

    fn is_typedef_at(&self, n: usize) -> bool {
        self.peek_ahead(n) == TokenKind::Ident && self.typedefs.contains(self.text_ahead(n))
    }

    /// Number of `*` tokens starting `n` tokens ahead
    fn stars_at(&self, n: usize) -> usize {
        let mut count = 0;
        while self.peek_ahead(n + count) == TokenKind::Star {
            count += 1;
        }
        count
    }

    /// An undeclared identifier at `n` that is used as a type name:
    /// `Prog *p`, `Prog p` or the abstract `Prog*)`.
    fn unknown_type_at(&self, n: usize) -> bool {
        match self.peek_ahead(n + 1) {
            TokenKind::Ident => true,
            TokenKind::Star => {
                let after = n + 1 + self.stars_at(n + 1);
                matches!(
                    self.peek_ahead(after),
                    TokenKind::Ident | TokenKind::RParen | TokenKind::Comma
                )
            }
            _ => false,
        }
    }

    /// Whether the statement at the cursor is a local declaration
    fn starts_local_decl(&self) -> bool {
        let kind = self.peek();
        if kind.is_storage() || kind.is_type_keyword() {
            return true;
        }
        if kind != TokenKind::Ident {
            return false;
        }
        let text = self.text_ahead(0);
        if self.storage_macros.contains_key(text) {
            return true;
        }
        match self.peek_ahead(1) {
            TokenKind::Ident => true,
            TokenKind::Star => {
                if self.typedefs.contains(text) {
                    return true;
                }
                let after = 1 + self.stars_at(1);
                self.peek_ahead(after) == TokenKind::Ident
                    && matches!(
                        self.peek_ahead(after + 1),
                        TokenKind::Semi | TokenKind::Comma | TokenKind::Eq | TokenKind::LBracket
                    )
            }
            TokenKind::LParen => {
                self.typedefs.contains(text) && self.peek_ahead(2) == TokenKind::Star
            }
            _ => false,
        }
    }

    /// Whether `(` at `n - 1` opens a type name, for casts and `sizeof`
    fn type_name_at(&self, n: usize) -> bool {
        let kind = self.peek_ahead(n);
        if kind.is_type_keyword() || self.is_typedef_at(n) {
            return true;
        }
        if kind != TokenKind::Ident {
            return false;
        }
        let stars = self.stars_at(n + 1);
        stars > 0 && self.peek_ahead(n + 1 + stars) == TokenKind::RParen
    }

    // === Translation unit ===

    /// Parse every external declaration in the token stream
    pub fn parse_unit(&mut self) -> Result<Vec<Decl>, ParseError> {
        let mut decls = Vec::new();
        while !self.at(TokenKind::Eof) {
            if self.eat(TokenKind::Semi) {
                continue;
            }
            self.parse_external(&mut decls)?;
        }
        Ok(decls)
    }

    fn parse_external(&mut self, out: &mut Vec<Decl>) -> Result<(), ParseError> {
        let start = self.span();
        let specs = self.parse_specifiers(false)?;

        if self.at(TokenKind::Semi) {
            let end = self.advance().span;
            out.push(Decl {
                name: String::new(),
                storage: specs.storage,
                ty: specs.ty,
                init: None,
                body: None,
                span: start.merge(end),
            });
            return Ok(());
        }

        self.parse_declarators(&specs, start, true, out)
    }

    /// Parse `declarator [= init], ...;` or a function definition
    fn parse_declarators(
        &mut self,
        specs: &Specifiers,
        start: Span,
        allow_body: bool,
        out: &mut Vec<Decl>,
    ) -> Result<(), ParseError> {
        loop {
            let name_span = self.span();
            let (name, ty) = self.parse_declarator(specs.ty.clone())?;
            let name = name.ok_or(ParseError::MissingName { span: name_span })?;

            if specs.storage == Storage::Typedef {
                self.typedefs.insert(name.clone());
            }

            if allow_body && ty.is_func() && self.at(TokenKind::LBrace) {
                let body = self.parse_block()?;
                let span = start.merge(body.span);
                out.push(Decl {
                    name,
                    storage: specs.storage,
                    ty,
                    init: None,
                    body: Some(body),
                    span,
                });
                return Ok(());
            }

            let init = if self.eat(TokenKind::Eq) {
                Some(self.parse_initializer()?)
            } else {
                None
            };

            out.push(Decl {
                name,
                storage: specs.storage,
                ty,
                init,
                body: None,
                span: start.merge(self.prev_span()),
            });

            if !self.eat(TokenKind::Comma) {
                self.consume(TokenKind::Semi)?;
                return Ok(());
            }
        }
    }

    // === Types ===

    fn parse_specifiers(&mut self, in_params: bool) -> Result<Specifiers, ParseError> {
        let mut storage = Storage::None;
        let mut words: Vec<&'a str> = Vec::new();
        let mut aggregate = None;
        let mut has_type = false;

        loop {
            let kind = self.peek();
            match kind {
                TokenKind::Auto => storage = Storage::Auto,
                TokenKind::Extern => storage = Storage::Extern,
                TokenKind::Register => storage = Storage::Register,
                TokenKind::Static => storage = Storage::Static,
                TokenKind::Typedef => storage = Storage::Typedef,
                TokenKind::Inline => {}
                TokenKind::Const | TokenKind::Volatile => {
                    let token = self.current().clone();
                    words.push(self.text(&token));
                }
                TokenKind::Struct | TokenKind::Union | TokenKind::Enum => {
                    aggregate = Some(self.parse_aggregate()?);
                    has_type = true;
                    continue;
                }
                _ if kind.is_type_keyword() => {
                    let token = self.current().clone();
                    words.push(self.text(&token));
                    has_type = true;
                }
                TokenKind::Ident => {
                    let text = self.text_ahead(0);
                    if let Some(st) = self.storage_macros.get(text) {
                        storage = *st;
                    } else if has_type {
                        break;
                    } else if self.typedefs.contains(text)
                        || self.unknown_type_at(0)
                        || (in_params
                            && matches!(self.peek_ahead(1), TokenKind::Comma | TokenKind::RParen))
                    {
                        words.push(text);
                        has_type = true;
                    } else {
                        break;
                    }
                }
                _ => break,
            }
            self.advance();
        }

        let ty = match aggregate {
            Some(agg) => Type::Aggregate(agg),
            None if has_type => Type::Base(words.join(" ")),
            None if words.is_empty() => Type::Base("int".to_string()),
            None => Type::Base(format!("{} int", words.join(" "))),
        };

        Ok(Specifiers {
            storage,
            ty,
            has_type,
        })
    }

    fn parse_aggregate(&mut self) -> Result<Aggregate, ParseError> {
        let kind = match self.advance().kind {
            TokenKind::Struct => AggregateKind::Struct,
            TokenKind::Union => AggregateKind::Union,
            _ => AggregateKind::Enum,
        };

        let tag = if self.at(TokenKind::Ident) {
            Some(self.ident()?)
        } else {
            None
        };

        if !self.eat(TokenKind::LBrace) {
            if tag.is_none() {
                return Err(ParseError::unexpected(
                    "tag or '{'",
                    self.peek(),
                    self.span(),
                ));
            }
            return Ok(Aggregate {
                kind,
                tag,
                body: None,
            });
        }

        let body = if kind == AggregateKind::Enum {
            AggregateBody::Enumerators(self.parse_enumerators()?)
        } else {
            AggregateBody::Fields(self.parse_fields()?)
        };
        self.consume(TokenKind::RBrace)?;

        Ok(Aggregate {
            kind,
            tag,
            body: Some(body),
        })
    }

    fn parse_enumerators(&mut self) -> Result<Vec<Enumerator>, ParseError> {
        let mut items = Vec::new();
        while !self.at(TokenKind::RBrace) {
            let name = self.ident()?;
            let value = if self.eat(TokenKind::Eq) {
                Some(self.parse_cond()?)
            } else {
                None
            };
            items.push(Enumerator { name, value });
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        Ok(items)
    }

    fn parse_fields(&mut self) -> Result<Vec<Field>, ParseError> {
        let mut fields = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
            let specs = self.parse_specifiers(false)?;

            // anonymous struct or union member
            if self.eat(TokenKind::Semi) {
                fields.push(Field {
                    name: String::new(),
                    ty: specs.ty,
                    width: None,
                });
                continue;
            }

            loop {
                let (name, ty) = self.parse_declarator(specs.ty.clone())?;
                let width = if self.eat(TokenKind::Colon) {
                    Some(self.parse_cond()?)
                } else {
                    None
                };
                fields.push(Field {
                    name: name.unwrap_or_default(),
                    ty,
                    width,
                });
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            self.consume(TokenKind::Semi)?;
        }
        Ok(fields)
    }

    /// Parse a (possibly abstract) declarator and build its type on `base`
    fn parse_declarator(&mut self, base: Type) -> Result<(Option<String>, Type), ParseError> {
        let (name, ops) = self.parse_derivations()?;
        let ty = ops.into_iter().rev().fold(base, |ty, op| op.apply(ty));
        Ok((name, ty))
    }

    fn parse_derivations(&mut self) -> Result<(Option<String>, Vec<Derive>), ParseError> {
        let mut pointers = 0;
        while self.eat(TokenKind::Star) {
            pointers += 1;
            while self.eat(TokenKind::Const) || self.eat(TokenKind::Volatile) {}
        }

        let (name, mut ops) = if self.at(TokenKind::LParen) && self.peek_ahead(1) == TokenKind::Star {
            self.advance();
            let inner = self.parse_derivations()?;
            self.consume(TokenKind::RParen)?;
            inner
        } else if self.at(TokenKind::Ident) {
            (Some(self.ident()?), Vec::new())
        } else {
            (None, Vec::new())
        };

        loop {
            if self.eat(TokenKind::LBracket) {
                let len = if self.at(TokenKind::RBracket) {
                    None
                } else {
                    Some(Box::new(self.parse_cond()?))
                };
                self.consume(TokenKind::RBracket)?;
                ops.push(Derive::Array(len));
            } else if self.eat(TokenKind::LParen) {
                let (params, variadic) = self.parse_params()?;
                ops.push(Derive::Func(params, variadic));
            } else {
                break;
            }
        }

        for _ in 0..pointers {
            ops.push(Derive::Ptr);
        }
        Ok((name, ops))
    }

    /// Parameter list after the opening `(`
    fn parse_params(&mut self) -> Result<(Vec<Param>, bool), ParseError> {
        let mut params = Vec::new();
        let mut variadic = false;

        if self.eat(TokenKind::RParen) {
            return Ok((params, variadic));
        }

        loop {
            if self.eat(TokenKind::Ellipsis) {
                variadic = true;
                break;
            }
            let start = self.span();
            let specs = self.parse_specifiers(true)?;
            let (name, ty) = self.parse_declarator(specs.ty)?;
            params.push(Param {
                name,
                ty,
                span: start.merge(self.prev_span()),
            });
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }

        self.consume(TokenKind::RParen)?;
        Ok((params, variadic))
    }

    fn parse_type_name(&mut self) -> Result<Type, ParseError> {
        let specs = self.parse_specifiers(true)?;
        if !specs.has_type && self.at(TokenKind::Ident) {
            return Err(ParseError::unexpected("type name", self.peek(), self.span()));
        }
        let (_, ty) = self.parse_declarator(specs.ty)?;
        Ok(ty)
    }

    // === Statements ===

    pub fn parse_block(&mut self) -> Result<Block, ParseError> {
        let start = self.consume(TokenKind::LBrace)?.span;
        let mut stmts = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
            stmts.push(self.parse_stmt()?);
        }
        let end = self.consume(TokenKind::RBrace)?.span;
        Ok(Block {
            stmts,
            span: start.merge(end),
        })
    }

    fn parse_paren_expr(&mut self) -> Result<Expr, ParseError> {
        self.consume(TokenKind::LParen)?;
        let expr = self.parse_expr()?;
        self.consume(TokenKind::RParen)?;
        Ok(expr)
    }

    fn parse_stmt(&mut self) -> Result<Stmt, ParseError> {
        let start = self.span();

        let kind = match self.peek() {
            TokenKind::LBrace => StmtKind::Block(self.parse_block()?),
            TokenKind::Semi => {
                self.advance();
                StmtKind::Empty
            }
            TokenKind::If => {
                self.advance();
                let cond = self.parse_paren_expr()?;
                let then = Box::new(self.parse_stmt()?);
                let otherwise = if self.eat(TokenKind::Else) {
                    Some(Box::new(self.parse_stmt()?))
                } else {
                    None
                };
                StmtKind::If {
                    cond,
                    then,
                    otherwise,
                }
            }
            TokenKind::While => {
                self.advance();
                let cond = self.parse_paren_expr()?;
                let body = Box::new(self.parse_stmt()?);
                StmtKind::While { cond, body }
            }
            TokenKind::Do => {
                self.advance();
                let body = Box::new(self.parse_stmt()?);
                self.consume(TokenKind::While)?;
                let cond = self.parse_paren_expr()?;
                self.consume(TokenKind::Semi)?;
                StmtKind::DoWhile { body, cond }
            }
            TokenKind::For => {
                self.advance();
                self.consume(TokenKind::LParen)?;
                let init = self.parse_opt_expr(TokenKind::Semi)?;
                self.consume(TokenKind::Semi)?;
                let cond = self.parse_opt_expr(TokenKind::Semi)?;
                self.consume(TokenKind::Semi)?;
                let step = self.parse_opt_expr(TokenKind::RParen)?;
                self.consume(TokenKind::RParen)?;
                let body = Box::new(self.parse_stmt()?);
                StmtKind::For {
                    init,
                    cond,
                    step,
                    body,
                }
            }
            TokenKind::Switch => {
                self.advance();
                let cond = self.parse_paren_expr()?;
                let body = Box::new(self.parse_stmt()?);
                StmtKind::Switch { cond, body }
            }
            TokenKind::Case => {
                self.advance();
                let value = self.parse_cond()?;
                self.consume(TokenKind::Colon)?;
                StmtKind::Case(value)
            }
            TokenKind::Default => {
                self.advance();
                self.consume(TokenKind::Colon)?;
                StmtKind::Default
            }
            TokenKind::Break => {
                self.advance();
                self.consume(TokenKind::Semi)?;
                StmtKind::Break
            }
            TokenKind::Continue => {
                self.advance();
                self.consume(TokenKind::Semi)?;
                StmtKind::Continue
            }
            TokenKind::Return => {
                self.advance();
                let value = self.parse_opt_expr(TokenKind::Semi)?;
                self.consume(TokenKind::Semi)?;
                StmtKind::Return(value)
            }
            TokenKind::Goto => {
                self.advance();
                let label = self.ident()?;
                self.consume(TokenKind::Semi)?;
                StmtKind::Goto(label)
            }
            TokenKind::Ident if self.peek_ahead(1) == TokenKind::Colon => {
                let label = self.ident()?;
                self.advance();
                StmtKind::Label(label)
            }
            _ if self.starts_local_decl() => {
                let specs = self.parse_specifiers(false)?;
                let mut decls = Vec::new();
                if self.at(TokenKind::Semi) {
                    self.advance();
                    decls.push(Decl {
                        name: String::new(),
                        storage: specs.storage,
                        ty: specs.ty,
                        init: None,
                        body: None,
                        span: start.merge(self.prev_span()),
                    });
                } else {
                    self.parse_declarators(&specs, start, false, &mut decls)?;
                }
                StmtKind::Decl(decls)
            }
            _ => {
                let expr = self.parse_expr()?;
                self.consume(TokenKind::Semi)?;
                StmtKind::Expr(expr)
            }
        };

        Ok(Stmt::new(kind, start.merge(self.prev_span())))
    }

    fn parse_opt_expr(&mut self, end: TokenKind) -> Result<Option<Expr>, ParseError> {
        if self.at(end) {
            Ok(None)
        } else {
            Ok(Some(self.parse_expr()?))
        }
    }

    // === Initializers ===

    fn parse_initializer(&mut self) -> Result<Init, ParseError> {
        if !self.eat(TokenKind::LBrace) {
            return Ok(Init::Expr(self.parse_assign()?));
        }

        let mut items = Vec::new();
        while !self.at(TokenKind::RBrace) {
            let item = if self.at(TokenKind::Dot) && self.peek_ahead(1) == TokenKind::Ident {
                self.advance();
                let field = self.ident()?;
                self.consume(TokenKind::Eq)?;
                Init::Designated {
                    designator: Designator::Field(field),
                    init: Box::new(self.parse_initializer()?),
                }
            } else if self.eat(TokenKind::LBracket) {
                let index = self.parse_cond()?;
                self.consume(TokenKind::RBracket)?;
                self.eat(TokenKind::Eq);
                Init::Designated {
                    designator: Designator::Index(index),
                    init: Box::new(self.parse_initializer()?),
                }
            } else {
                self.parse_initializer()?
            };
            items.push(item);
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.consume(TokenKind::RBrace)?;
        Ok(Init::List(items))
    }

    // === Expressions ===

    pub fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_assign()?;
        while self.eat(TokenKind::Comma) {
            let right = self.parse_assign()?;
            let span = left.span.merge(right.span);
            left = Expr::new(
                ExprKind::Comma {
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }
        Ok(left)
    }

    fn parse_assign(&mut self) -> Result<Expr, ParseError> {
        let target = self.parse_cond()?;
        let op = match self.peek() {
            TokenKind::Eq => AssignOp::Assign,
            TokenKind::StarEq => AssignOp::Mul,
            TokenKind::SlashEq => AssignOp::Div,
            TokenKind::PercentEq => AssignOp::Rem,
            TokenKind::PlusEq => AssignOp::Add,
            TokenKind::MinusEq => AssignOp::Sub,
            TokenKind::ShlEq => AssignOp::Shl,
            TokenKind::ShrEq => AssignOp::Shr,
            TokenKind::AmpEq => AssignOp::And,
            TokenKind::CaretEq => AssignOp::Xor,
            TokenKind::PipeEq => AssignOp::Or,
            _ => return Ok(target),
        };
        self.advance();
        let value = self.parse_assign()?;
        let span = target.span.merge(value.span);
        Ok(Expr::new(
            ExprKind::Assign {
                op,
                target: Box::new(target),
                value: Box::new(value),
            },
            span,
        ))
    }

    fn parse_cond(&mut self) -> Result<Expr, ParseError> {
        let cond = self.parse_binary(1)?;
        if !self.eat(TokenKind::Question) {
            return Ok(cond);
        }
        let then = self.parse_expr()?;
        self.consume(TokenKind::Colon)?;
        let otherwise = self.parse_cond()?;
        let span = cond.span.merge(otherwise.span);
        Ok(Expr::new(
            ExprKind::Cond {
                cond: Box::new(cond),
                then: Box::new(then),
                otherwise: Box::new(otherwise),
            },
            span,
        ))
    }

    fn binary_op(&self) -> Option<BinaryOp> {
        let op = match self.peek() {
            TokenKind::Star => BinaryOp::Mul,
            TokenKind::Slash => BinaryOp::Div,
            TokenKind::Percent => BinaryOp::Rem,
            TokenKind::Plus => BinaryOp::Add,
            TokenKind::Minus => BinaryOp::Sub,
            TokenKind::Shl => BinaryOp::Shl,
            TokenKind::Shr => BinaryOp::Shr,
            TokenKind::Lt => BinaryOp::Lt,
            TokenKind::Gt => BinaryOp::Gt,
            TokenKind::Le => BinaryOp::Le,
            TokenKind::Ge => BinaryOp::Ge,
            TokenKind::EqEq => BinaryOp::Eq,
            TokenKind::Ne => BinaryOp::Ne,
            TokenKind::Amp => BinaryOp::BitAnd,
            TokenKind::Caret => BinaryOp::BitXor,
            TokenKind::Pipe => BinaryOp::BitOr,
            TokenKind::AndAnd => BinaryOp::And,
            TokenKind::OrOr => BinaryOp::Or,
            _ => return None,
        };
        Some(op)
    }

    /// Precedence climbing over the binary operators
    fn parse_binary(&mut self, min_prec: u8) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;
        while let Some(op) = self.binary_op() {
            let prec = op.precedence();
            if prec < min_prec {
                break;
            }
            self.advance();
            let right = self.parse_binary(prec + 1)?;
            let span = left.span.merge(right.span);
            left = Expr::new(
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let start = self.span();

        let op = match self.peek() {
            TokenKind::Amp => Some(UnaryOp::AddrOf),
            TokenKind::Star => Some(UnaryOp::Deref),
            TokenKind::Plus => Some(UnaryOp::Plus),
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Bang => Some(UnaryOp::Not),
            TokenKind::Tilde => Some(UnaryOp::BitNot),
            TokenKind::PlusPlus => Some(UnaryOp::PreInc),
            TokenKind::MinusMinus => Some(UnaryOp::PreDec),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let operand = self.parse_unary()?;
            let span = start.merge(operand.span);
            return Ok(Expr::new(
                ExprKind::Unary {
                    op,
                    operand: Box::new(operand),
                },
                span,
            ));
        }

        if self.eat(TokenKind::Sizeof) {
            if self.at(TokenKind::LParen) && self.type_name_at(1) {
                self.advance();
                let ty = self.parse_type_name()?;
                self.consume(TokenKind::RParen)?;
                return Ok(Expr::new(ExprKind::SizeofType(ty), start.merge(self.prev_span())));
            }
            let operand = self.parse_unary()?;
            let span = start.merge(operand.span);
            return Ok(Expr::new(ExprKind::SizeofExpr(Box::new(operand)), span));
        }

        if self.at(TokenKind::LParen) && self.type_name_at(1) {
            self.advance();
            let ty = self.parse_type_name()?;
            self.consume(TokenKind::RParen)?;
            let expr = self.parse_unary()?;
            let span = start.merge(expr.span);
            return Ok(Expr::new(
                ExprKind::Cast {
                    ty,
                    expr: Box::new(expr),
                },
                span,
            ));
        }

        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;

        loop {
            let kind = match self.peek() {
                TokenKind::LParen => {
                    self.advance();
                    let mut args = Vec::new();
                    if !self.at(TokenKind::RParen) {
                        loop {
                            args.push(self.parse_assign()?);
                            if !self.eat(TokenKind::Comma) {
                                break;
                            }
                        }
                    }
                    self.consume(TokenKind::RParen)?;
                    ExprKind::Call {
                        callee: Box::new(expr),
                        args,
                    }
                }
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_expr()?;
                    self.consume(TokenKind::RBracket)?;
                    ExprKind::Index {
                        base: Box::new(expr),
                        index: Box::new(index),
                    }
                }
                TokenKind::Dot | TokenKind::Arrow => {
                    let arrow = self.advance().kind == TokenKind::Arrow;
                    let field = self.ident()?;
                    ExprKind::Member {
                        base: Box::new(expr),
                        field,
                        arrow,
                    }
                }
                TokenKind::PlusPlus | TokenKind::MinusMinus => {
                    let op = if self.advance().kind == TokenKind::PlusPlus {
                        PostfixOp::Inc
                    } else {
                        PostfixOp::Dec
                    };
                    ExprKind::Postfix {
                        op,
                        operand: Box::new(expr),
                    }
                }
                _ => break,
            };
            let span = match &kind {
                ExprKind::Call { callee, .. } => callee.span,
                ExprKind::Index { base, .. } | ExprKind::Member { base, .. } => base.span,
                ExprKind::Postfix { operand, .. } => operand.span,
                _ => self.prev_span(),
            };
            expr = Expr::new(kind, span.merge(self.prev_span()));
        }

        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let start = self.span();

        match self.peek() {
            TokenKind::Ident if self.text_ahead(0) == "va_arg" && self.peek_ahead(1) == TokenKind::LParen => {
                self.advance();
                self.advance();
                let ap = self.parse_assign()?;
                self.consume(TokenKind::Comma)?;
                let ty = self.parse_type_name()?;
                self.consume(TokenKind::RParen)?;
                Ok(Expr::new(
                    ExprKind::VaArg {
                        ap: Box::new(ap),
                        ty,
                    },
                    start.merge(self.prev_span()),
                ))
            }
            TokenKind::Ident => {
                let text = self.ident()?;
                Ok(Expr::new(ExprKind::Name { text, decl: None }, start))
            }
            TokenKind::Number => {
                let token = self.advance();
                Ok(Expr::new(ExprKind::Number(self.text(&token).to_string()), start))
            }
            TokenKind::CharLit => {
                let token = self.advance();
                Ok(Expr::new(ExprKind::Char(self.text(&token).to_string()), start))
            }
            TokenKind::StringLit => {
                let mut parts = Vec::new();
                while self.at(TokenKind::StringLit) {
                    let token = self.advance();
                    parts.push(self.text(&token).to_string());
                }
                Ok(Expr::new(ExprKind::Str(parts), start.merge(self.prev_span())))
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.consume(TokenKind::RParen)?;
                Ok(Expr::new(
                    ExprKind::Paren(Box::new(inner)),
                    start.merge(self.prev_span()),
                ))
            }
            TokenKind::Eof => Err(ParseError::UnexpectedEof { span: start }),
            _ => Err(ParseError::InvalidExpression { span: start }),
        }
    }
}
