use crate::{Channel, LineColumn, RawToken};
use logos::{Lexer, Logos};

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(super) enum Kind {
    #[regex(r"[ \t\r\n\f]+")]
    Ws,

    #[regex(r"//[^\n]*\n?")]
    LineComment,

    #[token("/*", lex_block_comment)]
    Comment,

    #[token("abstract")]
    Abstract,
    #[token("boolean")]
    Boolean,
    #[token("break")]
    Break,
    #[token("byte")]
    Byte,
    #[token("char")]
    Char,
    #[token("class")]
    Class,
    #[token("continue")]
    Continue,
    #[token("do")]
    Do,
    #[token("double")]
    Double,
    #[token("else")]
    Else,
    #[token("extends")]
    Extends,
    #[token("final")]
    Final,
    #[token("float")]
    Float,
    #[token("for")]
    For,
    #[token("if")]
    If,
    #[token("int")]
    Int,
    #[token("long")]
    Long,
    #[token("new")]
    New,
    #[token("private")]
    Private,
    #[token("protected")]
    Protected,
    #[token("public")]
    Public,
    #[token("return")]
    Return,
    #[token("short")]
    Short,
    #[token("static")]
    Static,
    #[token("this")]
    This,
    #[token("void")]
    Void,
    #[token("while")]
    While,

    #[regex(r"[0-9][0-9_]*[lL]?")]
    DecimalLiteral,
    #[regex(r"0[xX][0-9a-fA-F][0-9a-fA-F_]*[lL]?")]
    HexLiteral,
    #[regex(r"[0-9]+\.[0-9]*([eE][+-]?[0-9]+)?[fFdD]?")]
    FloatLiteral,
    #[token("true")]
    #[token("false")]
    BoolLiteral,
    #[regex(r"'([^'\\\n]|\\[^\n])'")]
    CharLiteral,
    #[regex(r#""([^"\\\n]|\\[^\n])*""#)]
    StringLiteral,
    #[token("null")]
    NullLiteral,

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBrack,
    #[token("]")]
    RBrack,
    #[token(";")]
    Semi,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,

    #[token("=")]
    Assign,
    #[token(">")]
    Gt,
    #[token("<")]
    Lt,
    #[token("!")]
    Bang,
    #[token("~")]
    Tilde,
    #[token("?")]
    Question,
    #[token(":")]
    Colon,
    #[token("==")]
    Equal,
    #[token("<=")]
    Le,
    #[token(">=")]
    Ge,
    #[token("!=")]
    NotEqual,
    #[token("&&")]
    And,
    #[token("||")]
    Or,
    #[token("++")]
    Inc,
    #[token("--")]
    Dec,
    #[token("+")]
    Add,
    #[token("-")]
    Sub,
    #[token("*")]
    Mul,
    #[token("/")]
    Div,
    #[token("&")]
    BitAnd,
    #[token("|")]
    BitOr,
    #[token("^")]
    Caret,
    #[token("%")]
    Mod,
    #[token("+=")]
    AddAssign,
    #[token("-=")]
    SubAssign,
    #[token("*=")]
    MulAssign,
    #[token("/=")]
    DivAssign,

    #[regex(r"[a-zA-Z_$][a-zA-Z0-9_$]*")]
    Identifier,

    // Synthetic token for input the lexer does not recognize
    ErrorChar,
    // Synthetic token marking the end of input
    Eof,
}

impl Kind {
    pub(super) fn name(self) -> &'static str {
        match self {
            Kind::Ws => "WS",
            Kind::LineComment => "LINE_COMMENT",
            Kind::Comment => "COMMENT",
            Kind::Abstract => "ABSTRACT",
            Kind::Boolean => "BOOLEAN",
            Kind::Break => "BREAK",
            Kind::Byte => "BYTE",
            Kind::Char => "CHAR",
            Kind::Class => "CLASS",
            Kind::Continue => "CONTINUE",
            Kind::Do => "DO",
            Kind::Double => "DOUBLE",
            Kind::Else => "ELSE",
            Kind::Extends => "EXTENDS",
            Kind::Final => "FINAL",
            Kind::Float => "FLOAT",
            Kind::For => "FOR",
            Kind::If => "IF",
            Kind::Int => "INT",
            Kind::Long => "LONG",
            Kind::New => "NEW",
            Kind::Private => "PRIVATE",
            Kind::Protected => "PROTECTED",
            Kind::Public => "PUBLIC",
            Kind::Return => "RETURN",
            Kind::Short => "SHORT",
            Kind::Static => "STATIC",
            Kind::This => "THIS",
            Kind::Void => "VOID",
            Kind::While => "WHILE",
            Kind::DecimalLiteral => "DECIMAL_LITERAL",
            Kind::HexLiteral => "HEX_LITERAL",
            Kind::FloatLiteral => "FLOAT_LITERAL",
            Kind::BoolLiteral => "BOOL_LITERAL",
            Kind::CharLiteral => "CHAR_LITERAL",
            Kind::StringLiteral => "STRING_LITERAL",
            Kind::NullLiteral => "NULL_LITERAL",
            Kind::LParen => "LPAREN",
            Kind::RParen => "RPAREN",
            Kind::LBrace => "LBRACE",
            Kind::RBrace => "RBRACE",
            Kind::LBrack => "LBRACK",
            Kind::RBrack => "RBRACK",
            Kind::Semi => "SEMI",
            Kind::Comma => "COMMA",
            Kind::Dot => "DOT",
            Kind::Assign => "ASSIGN",
            Kind::Gt => "GT",
            Kind::Lt => "LT",
            Kind::Bang => "BANG",
            Kind::Tilde => "TILDE",
            Kind::Question => "QUESTION",
            Kind::Colon => "COLON",
            Kind::Equal => "EQUAL",
            Kind::Le => "LE",
            Kind::Ge => "GE",
            Kind::NotEqual => "NOTEQUAL",
            Kind::And => "AND",
            Kind::Or => "OR",
            Kind::Inc => "INC",
            Kind::Dec => "DEC",
            Kind::Add => "ADD",
            Kind::Sub => "SUB",
            Kind::Mul => "MUL",
            Kind::Div => "DIV",
            Kind::BitAnd => "BITAND",
            Kind::BitOr => "BITOR",
            Kind::Caret => "CARET",
            Kind::Mod => "MOD",
            Kind::AddAssign => "ADD_ASSIGN",
            Kind::SubAssign => "SUB_ASSIGN",
            Kind::MulAssign => "MUL_ASSIGN",
            Kind::DivAssign => "DIV_ASSIGN",
            Kind::Identifier => "IDENTIFIER",
            Kind::ErrorChar => "ERROR_CHAR",
            Kind::Eof => "EOF",
        }
    }

    pub(super) fn channel(self) -> Channel {
        match self {
            Kind::Ws | Kind::LineComment | Kind::Comment => Channel::Hidden,
            _ => Channel::Visible,
        }
    }

    pub(super) fn is_primitive_type(self) -> bool {
        matches!(
            self,
            Kind::Boolean
                | Kind::Byte
                | Kind::Char
                | Kind::Short
                | Kind::Int
                | Kind::Long
                | Kind::Float
                | Kind::Double
        )
    }

    pub(super) fn is_modifier(self) -> bool {
        matches!(
            self,
            Kind::Public
                | Kind::Protected
                | Kind::Private
                | Kind::Static
                | Kind::Abstract
                | Kind::Final
        )
    }

    pub(super) fn is_literal(self) -> bool {
        matches!(
            self,
            Kind::DecimalLiteral
                | Kind::HexLiteral
                | Kind::FloatLiteral
                | Kind::BoolLiteral
                | Kind::CharLiteral
                | Kind::StringLiteral
                | Kind::NullLiteral
        )
    }
}

// An unterminated comment runs to the end of input
fn lex_block_comment(lexer: &mut Lexer<Kind>) -> Option<()> {
    let remainder: &str = lexer.remainder();
    let len = remainder.find("*/").map_or(remainder.len(), |end| end + 2);
    lexer.bump(len);
    Some(())
}

/// Slices the whole `source` into tokens, followed by an empty `EOF` token.
///
/// Returns the kinds alongside the tokens, index for index.
pub(super) fn lex(source: &str) -> (Vec<RawToken<'_>>, Vec<Kind>) {
    let mut tokens = Vec::new();
    let mut kinds = Vec::new();
    let mut start = LineColumn::START;

    let mut lexer = Kind::lexer(source);
    while let Some(result) = lexer.next() {
        let kind = result.unwrap_or(Kind::ErrorChar);
        let text = lexer.slice();
        tokens.push(RawToken { kind: kind.name(), text, channel: kind.channel(), start });
        kinds.push(kind);
        start = start.advance(text);
    }

    tokens.push(RawToken { kind: Kind::Eof.name(), text: "", channel: Channel::Visible, start });
    kinds.push(Kind::Eof);

    (tokens, kinds)
}
