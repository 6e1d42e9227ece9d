//! Token definitions for the C subset

use logos::Logos;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[logos(skip r"[ \t\r\n\f\v]+")]                // Skip whitespace
#[logos(skip r"//[^\n]*")]                      // Skip line comments
#[logos(skip r"/\*([^*]|\*+[^*/])*\*+/")]       // Skip block comments
#[logos(skip r"#([^\\\n]|\\(.|\n))*")]          // Skip preprocessor lines
pub enum TokenKind {
    // === Storage classes ===
    #[token("auto")]
    Auto,
    #[token("extern")]
    Extern,
    #[token("register")]
    Register,
    #[token("static")]
    Static,
    #[token("typedef")]
    Typedef,
    #[token("inline")]
    Inline,

    // === Type specifiers and qualifiers ===
    #[token("void")]
    Void,
    #[token("char")]
    Char,
    #[token("short")]
    Short,
    #[token("int")]
    Int,
    #[token("long")]
    Long,
    #[token("float")]
    Float,
    #[token("double")]
    Double,
    #[token("signed")]
    Signed,
    #[token("unsigned")]
    Unsigned,
    #[token("const")]
    Const,
    #[token("volatile")]
    Volatile,
    #[token("struct")]
    Struct,
    #[token("union")]
    Union,
    #[token("enum")]
    Enum,

    // === Statements ===
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("while")]
    While,
    #[token("do")]
    Do,
    #[token("for")]
    For,
    #[token("switch")]
    Switch,
    #[token("case")]
    Case,
    #[token("default")]
    Default,
    #[token("break")]
    Break,
    #[token("continue")]
    Continue,
    #[token("return")]
    Return,
    #[token("goto")]
    Goto,
    #[token("sizeof")]
    Sizeof,

    // === Literals ===
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,
    #[regex(r"(0[xX][0-9a-fA-F]+|[0-9]+(\.[0-9]*)?([eE][+-]?[0-9]+)?|\.[0-9]+([eE][+-]?[0-9]+)?)[uUlLfF]*")]
    Number,
    #[regex(r"'([^'\\\n]|\\.)*'")]
    CharLit,
    #[regex(r#""([^"\\\n]|\\.)*""#)]
    StringLit,

    // === Delimiters ===
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(";")]
    Semi,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token("?")]
    Question,
    #[token("...")]
    Ellipsis,

    // === Operators ===
    #[token(".")]
    Dot,
    #[token("->")]
    Arrow,
    #[token("++")]
    PlusPlus,
    #[token("--")]
    MinusMinus,
    #[token("&")]
    Amp,
    #[token("*")]
    Star,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("~")]
    Tilde,
    #[token("!")]
    Bang,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("<<")]
    Shl,
    #[token(">>")]
    Shr,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("<=")]
    Le,
    #[token(">=")]
    Ge,
    #[token("==")]
    EqEq,
    #[token("!=")]
    Ne,
    #[token("^")]
    Caret,
    #[token("|")]
    Pipe,
    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,
    #[token("=")]
    Eq,
    #[token("*=")]
    StarEq,
    #[token("/=")]
    SlashEq,
    #[token("%=")]
    PercentEq,
    #[token("+=")]
    PlusEq,
    #[token("-=")]
    MinusEq,
    #[token("<<=")]
    ShlEq,
    #[token(">>=")]
    ShrEq,
    #[token("&=")]
    AmpEq,
    #[token("^=")]
    CaretEq,
    #[token("|=")]
    PipeEq,

    // Special
    Error,
    Eof,
}

impl TokenKind {
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::Auto => "'auto'",
            TokenKind::Extern => "'extern'",
            TokenKind::Register => "'register'",
            TokenKind::Static => "'static'",
            TokenKind::Typedef => "'typedef'",
            TokenKind::Inline => "'inline'",
            TokenKind::Void => "'void'",
            TokenKind::Char => "'char'",
            TokenKind::Short => "'short'",
            TokenKind::Int => "'int'",
            TokenKind::Long => "'long'",
            TokenKind::Float => "'float'",
            TokenKind::Double => "'double'",
            TokenKind::Signed => "'signed'",
            TokenKind::Unsigned => "'unsigned'",
            TokenKind::Const => "'const'",
            TokenKind::Volatile => "'volatile'",
            TokenKind::Struct => "'struct'",
            TokenKind::Union => "'union'",
            TokenKind::Enum => "'enum'",
            TokenKind::If => "'if'",
            TokenKind::Else => "'else'",
            TokenKind::While => "'while'",
            TokenKind::Do => "'do'",
            TokenKind::For => "'for'",
            TokenKind::Switch => "'switch'",
            TokenKind::Case => "'case'",
            TokenKind::Default => "'default'",
            TokenKind::Break => "'break'",
            TokenKind::Continue => "'continue'",
            TokenKind::Return => "'return'",
            TokenKind::Goto => "'goto'",
            TokenKind::Sizeof => "'sizeof'",
            TokenKind::Ident => "identifier",
            TokenKind::Number => "number",
            TokenKind::CharLit => "character literal",
            TokenKind::StringLit => "string literal",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::Semi => "';'",
            TokenKind::Comma => "','",
            TokenKind::Colon => "':'",
            TokenKind::Question => "'?'",
            TokenKind::Ellipsis => "'...'",
            TokenKind::Dot => "'.'",
            TokenKind::Arrow => "'->'",
            TokenKind::PlusPlus => "'++'",
            TokenKind::MinusMinus => "'--'",
            TokenKind::Amp => "'&'",
            TokenKind::Star => "'*'",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Tilde => "'~'",
            TokenKind::Bang => "'!'",
            TokenKind::Slash => "'/'",
            TokenKind::Percent => "'%'",
            TokenKind::Shl => "'<<'",
            TokenKind::Shr => "'>>'",
            TokenKind::Lt => "'<'",
            TokenKind::Gt => "'>'",
            TokenKind::Le => "'<='",
            TokenKind::Ge => "'>='",
            TokenKind::EqEq => "'=='",
            TokenKind::Ne => "'!='",
            TokenKind::Caret => "'^'",
            TokenKind::Pipe => "'|'",
            TokenKind::AndAnd => "'&&'",
            TokenKind::OrOr => "'||'",
            TokenKind::Eq => "'='",
            TokenKind::StarEq => "'*='",
            TokenKind::SlashEq => "'/='",
            TokenKind::PercentEq => "'%='",
            TokenKind::PlusEq => "'+='",
            TokenKind::MinusEq => "'-='",
            TokenKind::ShlEq => "'<<='",
            TokenKind::ShrEq => "'>>='",
            TokenKind::AmpEq => "'&='",
            TokenKind::CaretEq => "'^='",
            TokenKind::PipeEq => "'|='",
            TokenKind::Error => "invalid token",
            TokenKind::Eof => "end of file",
        }
    }

    /// Storage-class keywords
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            TokenKind::Auto
                | TokenKind::Extern
                | TokenKind::Register
                | TokenKind::Static
                | TokenKind::Typedef
                | TokenKind::Inline
        )
    }

    /// Keywords that can begin a type name
    pub fn is_type_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::Void
                | TokenKind::Char
                | TokenKind::Short
                | TokenKind::Int
                | TokenKind::Long
                | TokenKind::Float
                | TokenKind::Double
                | TokenKind::Signed
                | TokenKind::Unsigned
                | TokenKind::Const
                | TokenKind::Volatile
                | TokenKind::Struct
                | TokenKind::Union
                | TokenKind::Enum
        )
    }
}
