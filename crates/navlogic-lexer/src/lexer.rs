//! Core NavLogic lexer — converts source text to a token stream.
//!
//! Features:
//! - All scripting-subset tokens (5 reserved words, operators, punctuation,
//!   integer literals)
//! - Both comment styles stripped (`//` and `/* */`)
//! - `===`/`!==` collapsed onto `==`/`!=`
//! - Error recovery: collects up to 20 errors instead of stopping at the
//!   first
//! - Whitespace (including newlines) is insignificant; statements are
//!   semicolon-terminated

use navlogic_types::{CompileErrors, ErrorCode, ScriptError, SourceFile, Span};

use crate::token::{Token, TokenKind};

/// The NavLogic lexer.
///
/// Converts source text into a vector of [`Token`]s, collecting up to
/// [`navlogic_types::MAX_ERRORS`] errors along the way.
pub struct Lexer<'src> {
    /// The full source text as bytes.
    source: &'src [u8],
    /// Source file for error reporting.
    source_file: &'src SourceFile,
    /// Current byte offset into `source`.
    pos: usize,
    /// Current line number (1-based).
    line: u32,
    /// Current column number (1-based).
    col: u32,
    /// Collected errors.
    errors: CompileErrors,
}

/// Result of lexing: tokens + any errors collected.
pub struct LexResult {
    /// The token stream (always ends with [`TokenKind::Eof`]).
    pub tokens: Vec<Token>,
    /// Errors encountered during lexing.
    pub errors: CompileErrors,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source file.
    pub fn new(source_file: &'src SourceFile) -> Self {
        Self {
            source: source_file.source.as_bytes(),
            source_file,
            pos: 0,
            line: 1,
            col: 1,
            errors: CompileErrors::empty(),
        }
    }

    /// Lex the entire source file into a token stream.
    pub fn lex(mut self) -> LexResult {
        let mut tokens = Vec::new();

        loop {
            if self.errors.total_errors >= navlogic_types::MAX_ERRORS {
                break;
            }
            let token = self.scan_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        if tokens.last().map(|t| &t.kind) != Some(&TokenKind::Eof) {
            tokens.push(Token::new(TokenKind::Eof, self.current_span()));
        }

        LexResult {
            tokens,
            errors: self.errors,
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Character-level helpers
    // ─────────────────────────────────────────────────────────────

    fn peek(&self) -> Option<u8> {
        self.source.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.source.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let ch = self.source.get(self.pos).copied()?;
        self.pos += 1;
        if ch == b'\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn current_span(&self) -> Span {
        Span::point(self.line, self.col)
    }

    fn span_from(&self, start_line: u32, start_col: u32) -> Span {
        Span::new(
            start_line,
            start_col,
            self.line,
            self.col.saturating_sub(1).max(1),
        )
    }

    fn emit_error(&mut self, code: ErrorCode, message: impl Into<String>, span: Span) {
        let source_line = self.source_file.line(span.line).unwrap_or("").to_string();
        let err = ScriptError::new(&self.source_file.name, code, message, span, source_line);
        self.errors.push_error(err);
    }

    // ─────────────────────────────────────────────────────────────
    // Whitespace & comments
    // ─────────────────────────────────────────────────────────────

    /// Skip whitespace (newlines included) and both comment styles.
    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(b' ' | b'\t' | b'\r' | b'\n') => {
                    self.advance();
                }
                Some(b'/') if self.peek_at(1) == Some(b'/') => {
                    while let Some(ch) = self.peek() {
                        if ch == b'\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                Some(b'/') if self.peek_at(1) == Some(b'*') => {
                    let start_line = self.line;
                    let start_col = self.col;
                    self.advance();
                    self.advance();
                    let mut closed = false;
                    while let Some(ch) = self.peek() {
                        if ch == b'*' && self.peek_at(1) == Some(b'/') {
                            self.advance();
                            self.advance();
                            closed = true;
                            break;
                        }
                        self.advance();
                    }
                    if !closed {
                        let span = self.span_from(start_line, start_col);
                        self.emit_error(
                            ErrorCode::UNTERMINATED_COMMENT,
                            "unterminated block comment",
                            span,
                        );
                    }
                }
                _ => break,
            }
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Token scanning
    // ─────────────────────────────────────────────────────────────

    fn scan_token(&mut self) -> Token {
        self.skip_trivia();

        // At the error cap the stream is cut short rather than scanned on.
        if self.errors.total_errors >= navlogic_types::MAX_ERRORS {
            return Token::new(TokenKind::Eof, self.current_span());
        }

        if self.at_end() {
            return Token::new(TokenKind::Eof, self.current_span());
        }

        let start_line = self.line;
        let start_col = self.col;
        let start_pos = self.pos;
        let ch = self.advance().unwrap();

        macro_rules! tok {
            ($kind:expr) => {
                Token::new($kind, self.span_from(start_line, start_col))
            };
        }

        match ch {
            b'0'..=b'9' => self.scan_number(start_line, start_col, start_pos),
            b'a'..=b'z' | b'A'..=b'Z' | b'_' | b'$' => {
                self.scan_identifier(start_line, start_col, start_pos)
            }

            b'+' => match self.peek() {
                Some(b'+') => {
                    self.advance();
                    tok!(TokenKind::PlusPlus)
                }
                Some(b'=') => {
                    self.advance();
                    tok!(TokenKind::PlusEq)
                }
                _ => tok!(TokenKind::Plus),
            },
            b'-' => match self.peek() {
                Some(b'-') => {
                    self.advance();
                    tok!(TokenKind::MinusMinus)
                }
                Some(b'=') => {
                    self.advance();
                    tok!(TokenKind::MinusEq)
                }
                _ => tok!(TokenKind::Minus),
            },
            b'*' => {
                if self.peek() == Some(b'=') {
                    self.advance();
                    tok!(TokenKind::StarEq)
                } else {
                    tok!(TokenKind::Star)
                }
            }
            b'/' => {
                // Comments were consumed by skip_trivia, so this is division.
                if self.peek() == Some(b'=') {
                    self.advance();
                    tok!(TokenKind::SlashEq)
                } else {
                    tok!(TokenKind::Slash)
                }
            }
            b'%' => tok!(TokenKind::Percent),

            b'=' => {
                if self.peek() == Some(b'>') {
                    self.advance();
                    tok!(TokenKind::FatArrow)
                } else if self.peek() == Some(b'=') {
                    self.advance();
                    // Collapse `===` onto `==`.
                    if self.peek() == Some(b'=') {
                        self.advance();
                    }
                    tok!(TokenKind::EqEq)
                } else {
                    tok!(TokenKind::Eq)
                }
            }
            b'!' => {
                if self.peek() == Some(b'=') {
                    self.advance();
                    if self.peek() == Some(b'=') {
                        self.advance();
                    }
                    tok!(TokenKind::BangEq)
                } else {
                    tok!(TokenKind::Bang)
                }
            }
            b'<' => {
                if self.peek() == Some(b'=') {
                    self.advance();
                    tok!(TokenKind::LessEq)
                } else {
                    tok!(TokenKind::Less)
                }
            }
            b'>' => {
                if self.peek() == Some(b'=') {
                    self.advance();
                    tok!(TokenKind::GreaterEq)
                } else {
                    tok!(TokenKind::Greater)
                }
            }
            b'&' => {
                if self.peek() == Some(b'&') {
                    self.advance();
                    tok!(TokenKind::AmpAmp)
                } else {
                    let span = self.span_from(start_line, start_col);
                    self.emit_error(
                        ErrorCode::UNEXPECTED_CHARACTER,
                        "bitwise '&' is not supported; use '&&'",
                        span,
                    );
                    self.scan_token()
                }
            }
            b'|' => {
                if self.peek() == Some(b'|') {
                    self.advance();
                    tok!(TokenKind::PipePipe)
                } else {
                    let span = self.span_from(start_line, start_col);
                    self.emit_error(
                        ErrorCode::UNEXPECTED_CHARACTER,
                        "bitwise '|' is not supported; use '||'",
                        span,
                    );
                    self.scan_token()
                }
            }

            b'(' => tok!(TokenKind::LParen),
            b')' => tok!(TokenKind::RParen),
            b'{' => tok!(TokenKind::LBrace),
            b'}' => tok!(TokenKind::RBrace),
            b'[' => tok!(TokenKind::LBracket),
            b']' => tok!(TokenKind::RBracket),
            b',' => tok!(TokenKind::Comma),
            b':' => tok!(TokenKind::Colon),
            b'.' => tok!(TokenKind::Dot),
            b';' => tok!(TokenKind::Semicolon),

            _ => {
                let span = self.span_from(start_line, start_col);
                self.emit_error(
                    ErrorCode::UNEXPECTED_CHARACTER,
                    format!("unexpected character '{}'", ch as char),
                    span,
                );
                // Error recovery: skip the character and try again.
                self.scan_token()
            }
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Number literals
    // ─────────────────────────────────────────────────────────────

    fn scan_number(&mut self, start_line: u32, start_col: u32, start_pos: usize) -> Token {
        while let Some(b'0'..=b'9') = self.peek() {
            self.advance();
        }

        // All operands are signed 32-bit integers; a decimal point is a
        // hard error, not a silent truncation.
        if self.peek() == Some(b'.') && matches!(self.peek_at(1), Some(b'0'..=b'9')) {
            self.advance();
            while let Some(b'0'..=b'9') = self.peek() {
                self.advance();
            }
            let span = self.span_from(start_line, start_col);
            self.emit_error(
                ErrorCode::INVALID_NUMBER,
                "floating point is not supported; operands are 32-bit integers",
                span,
            );
            return Token::new(TokenKind::NumberLit(0), span);
        }

        let span = self.span_from(start_line, start_col);
        let text = std::str::from_utf8(&self.source[start_pos..self.pos]).unwrap_or("0");
        match text.parse::<i32>() {
            Ok(value) => Token::new(TokenKind::NumberLit(value), span),
            Err(_) => {
                self.emit_error(
                    ErrorCode::INVALID_NUMBER,
                    format!("integer literal '{text}' does not fit in 32 bits"),
                    span,
                );
                Token::new(TokenKind::NumberLit(0), span)
            }
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Identifiers & keywords
    // ─────────────────────────────────────────────────────────────

    fn scan_identifier(&mut self, start_line: u32, start_col: u32, start_pos: usize) -> Token {
        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == b'_' || ch == b'$' {
                self.advance();
            } else {
                break;
            }
        }

        let span = self.span_from(start_line, start_col);
        let text = std::str::from_utf8(&self.source[start_pos..self.pos]).unwrap_or("");
        let kind = TokenKind::from_keyword(text)
            .unwrap_or_else(|| TokenKind::Identifier(text.to_string()));
        Token::new(kind, span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> LexResult {
        let file = SourceFile::new("test.js", source);
        Lexer::new(&file).lex()
    }

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source).tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_empty_source() {
        let result = lex("");
        assert_eq!(result.tokens.len(), 1);
        assert_eq!(result.tokens[0].kind, TokenKind::Eof);
        assert!(!result.errors.has_errors());
    }

    #[test]
    fn test_compound_operators_longest_match() {
        assert_eq!(
            kinds("++ += + => == = >= > <= !="),
            vec![
                TokenKind::PlusPlus,
                TokenKind::PlusEq,
                TokenKind::Plus,
                TokenKind::FatArrow,
                TokenKind::EqEq,
                TokenKind::Eq,
                TokenKind::GreaterEq,
                TokenKind::Greater,
                TokenKind::LessEq,
                TokenKind::BangEq,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_strict_equality_collapses() {
        assert_eq!(
            kinds("a === 1; b !== 2;"),
            kinds("a == 1; b != 2;"),
        );
    }

    #[test]
    fn test_number_out_of_range() {
        let result = lex("let x = 99999999999;");
        assert!(result.errors.has_errors());
        assert_eq!(result.errors.errors[0].code, ErrorCode::INVALID_NUMBER);
    }

    #[test]
    fn test_float_rejected() {
        let result = lex("let x = 3.14;");
        assert!(result.errors.has_errors());
        assert_eq!(result.errors.errors[0].code, ErrorCode::INVALID_NUMBER);
    }

    #[test]
    fn test_member_chain_spans() {
        let result = lex("flight.homeDistance");
        let t = &result.tokens;
        assert_eq!(t[0].kind, TokenKind::Identifier("flight".into()));
        assert_eq!(t[1].kind, TokenKind::Dot);
        assert_eq!(t[2].kind, TokenKind::Identifier("homeDistance".into()));
        assert_eq!(t[0].span.column, 1);
        assert_eq!(t[2].span.column, 8);
    }

    #[test]
    fn test_comments_stripped() {
        let src = "// line comment\nlet x = 1; /* block\ncomment */ var y = 2;";
        let ks = kinds(src);
        assert_eq!(ks[0], TokenKind::Let);
        assert!(ks.contains(&TokenKind::Var));
        assert!(!lex(src).errors.has_errors());
    }

    #[test]
    fn test_unterminated_block_comment() {
        let result = lex("var x = 1; /* never closed");
        assert!(result.errors.has_errors());
        assert_eq!(
            result.errors.errors[0].code,
            ErrorCode::UNTERMINATED_COMMENT
        );
    }

    #[test]
    fn test_unexpected_character_recovers() {
        let result = lex("let x @ = 1;");
        assert!(result.errors.has_errors());
        assert_eq!(
            result.errors.errors[0].code,
            ErrorCode::UNEXPECTED_CHARACTER
        );
        // The rest of the stream still lexes.
        let ks: Vec<_> = result.tokens.into_iter().map(|t| t.kind).collect();
        assert!(ks.contains(&TokenKind::Eq));
        assert!(ks.contains(&TokenKind::NumberLit(1)));
    }

    #[test]
    fn test_line_and_column_tracking() {
        let result = lex("let a = 1;\nvar b = 2;");
        let var_tok = result
            .tokens
            .iter()
            .find(|t| t.kind == TokenKind::Var)
            .unwrap();
        assert_eq!(var_tok.span.line, 2);
        assert_eq!(var_tok.span.column, 1);
    }

    #[test]
    fn test_dollar_identifier() {
        assert_eq!(
            kinds("$tmp"),
            vec![TokenKind::Identifier("$tmp".into()), TokenKind::Eof]
        );
    }
}
