//! NavLogic parser: converts a token stream into an AST.

mod parse_expr;
mod parse_stmt;
mod parser;

pub use parser::{ParseResult, Parser};

use navlogic_types::{CompileErrors, SourceFile};

/// Lex and parse a source string in one step.
///
/// Lexer errors short-circuit the parse; the returned buffer then carries
/// only the lexer diagnostics.
pub fn parse_source(source_file: &SourceFile) -> ParseResult {
    let lex_result = navlogic_lexer::Lexer::new(source_file).lex();
    if lex_result.errors.has_errors() {
        return ParseResult {
            program: None,
            errors: lex_result.errors,
        };
    }
    let mut result = Parser::new(lex_result.tokens, source_file).parse();
    merge_warnings(&mut result.errors, lex_result.errors);
    result
}

fn merge_warnings(into: &mut CompileErrors, from: CompileErrors) {
    for warning in from.warnings {
        into.push_warning(warning);
    }
}
