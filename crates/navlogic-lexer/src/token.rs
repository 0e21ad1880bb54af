//! Token types for the NavLogic lexer.
//!
//! Defines [`TokenKind`] covering every lexeme of the scripting subset and
//! [`Token`], which pairs a kind with a source [`Span`].

use navlogic_types::Span;
use std::fmt;

/// The 5 reserved words. Everything else — including `on`, `edge`,
/// `inav`, `Math` — is an ordinary identifier the parser interprets
/// positionally.
pub const KEYWORDS: &[&str] = &["const", "let", "var", "if", "else"];

/// A single token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    /// Create a new token.
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Every token kind in the scripting subset.
///
/// `===`/`!==` are accepted at the character level and collapse onto
/// [`TokenKind::EqEq`]/[`TokenKind::BangEq`]; operands are integers, so
/// strict and loose equality coincide.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // ── Literals ──────────────────────────────────────────────
    /// Integer literal: `42`
    NumberLit(i32),
    /// `true`
    True,
    /// `false`
    False,

    // ── Identifiers & keywords ────────────────────────────────
    /// `flight`, `homeDistance`, `on`, `Math`
    Identifier(String),
    /// `const`
    Const,
    /// `let`
    Let,
    /// `var`
    Var,
    /// `if`
    If,
    /// `else`
    Else,

    // ── Operators ─────────────────────────────────────────────
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `==` (also `===`)
    EqEq,
    /// `!=` (also `!==`)
    BangEq,
    /// `<`
    Less,
    /// `>`
    Greater,
    /// `<=`
    LessEq,
    /// `>=`
    GreaterEq,
    /// `&&`
    AmpAmp,
    /// `||`
    PipePipe,
    /// `!`
    Bang,

    // ── Assignment forms ──────────────────────────────────────
    /// `=`
    Eq,
    /// `+=`
    PlusEq,
    /// `-=`
    MinusEq,
    /// `*=`
    StarEq,
    /// `/=`
    SlashEq,
    /// `++`
    PlusPlus,
    /// `--`
    MinusMinus,

    // ── Punctuation ───────────────────────────────────────────
    /// `=>`
    FatArrow,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `,`
    Comma,
    /// `:`
    Colon,
    /// `.`
    Dot,
    /// `;`
    Semicolon,

    // ── Special ───────────────────────────────────────────────
    /// End of file
    Eof,
}

impl TokenKind {
    /// Look up a reserved word. Returns `None` for ordinary identifiers.
    pub fn from_keyword(s: &str) -> Option<TokenKind> {
        Some(match s {
            "const" => TokenKind::Const,
            "let" => TokenKind::Let,
            "var" => TokenKind::Var,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            _ => return None,
        })
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::NumberLit(n) => write!(f, "{n}"),
            TokenKind::True => f.write_str("true"),
            TokenKind::False => f.write_str("false"),
            TokenKind::Identifier(s) => f.write_str(s),
            TokenKind::Const => f.write_str("const"),
            TokenKind::Let => f.write_str("let"),
            TokenKind::Var => f.write_str("var"),
            TokenKind::If => f.write_str("if"),
            TokenKind::Else => f.write_str("else"),
            TokenKind::Plus => f.write_str("+"),
            TokenKind::Minus => f.write_str("-"),
            TokenKind::Star => f.write_str("*"),
            TokenKind::Slash => f.write_str("/"),
            TokenKind::Percent => f.write_str("%"),
            TokenKind::EqEq => f.write_str("=="),
            TokenKind::BangEq => f.write_str("!="),
            TokenKind::Less => f.write_str("<"),
            TokenKind::Greater => f.write_str(">"),
            TokenKind::LessEq => f.write_str("<="),
            TokenKind::GreaterEq => f.write_str(">="),
            TokenKind::AmpAmp => f.write_str("&&"),
            TokenKind::PipePipe => f.write_str("||"),
            TokenKind::Bang => f.write_str("!"),
            TokenKind::Eq => f.write_str("="),
            TokenKind::PlusEq => f.write_str("+="),
            TokenKind::MinusEq => f.write_str("-="),
            TokenKind::StarEq => f.write_str("*="),
            TokenKind::SlashEq => f.write_str("/="),
            TokenKind::PlusPlus => f.write_str("++"),
            TokenKind::MinusMinus => f.write_str("--"),
            TokenKind::FatArrow => f.write_str("=>"),
            TokenKind::LParen => f.write_str("("),
            TokenKind::RParen => f.write_str(")"),
            TokenKind::LBrace => f.write_str("{"),
            TokenKind::RBrace => f.write_str("}"),
            TokenKind::LBracket => f.write_str("["),
            TokenKind::RBracket => f.write_str("]"),
            TokenKind::Comma => f.write_str(","),
            TokenKind::Colon => f.write_str(":"),
            TokenKind::Dot => f.write_str("."),
            TokenKind::Semicolon => f.write_str(";"),
            TokenKind::Eof => f.write_str("end of file"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_keyword_recognises_all() {
        for &kw in KEYWORDS {
            assert!(
                TokenKind::from_keyword(kw).is_some(),
                "from_keyword should recognise '{kw}'"
            );
        }
        assert_eq!(TokenKind::from_keyword("true"), Some(TokenKind::True));
        assert_eq!(TokenKind::from_keyword("false"), Some(TokenKind::False));
    }

    #[test]
    fn test_from_keyword_returns_none_for_identifiers() {
        for name in ["on", "edge", "inav", "Math", "gvar", "flight", "Const", "IF"] {
            assert!(
                TokenKind::from_keyword(name).is_none(),
                "'{name}' must lex as an identifier"
            );
        }
    }

    #[test]
    fn test_display_roundtrip_keywords() {
        for &kw in KEYWORDS {
            let kind = TokenKind::from_keyword(kw).unwrap();
            assert_eq!(kind.to_string(), kw);
        }
    }

    #[test]
    fn test_display_operators() {
        assert_eq!(TokenKind::EqEq.to_string(), "==");
        assert_eq!(TokenKind::AmpAmp.to_string(), "&&");
        assert_eq!(TokenKind::FatArrow.to_string(), "=>");
        assert_eq!(TokenKind::PlusPlus.to_string(), "++");
        assert_eq!(TokenKind::PlusEq.to_string(), "+=");
    }

    #[test]
    fn test_token_construction() {
        let span = Span::new(1, 1, 1, 2);
        let token = Token::new(TokenKind::If, span);
        assert_eq!(token.kind, TokenKind::If);
        assert_eq!(token.span, span);
    }
}
