mod ast;
mod eval;
mod lexer;
mod parser;

pub use ast::{CmpOp, FilterAst};
pub use eval::eval;
pub use parser::parse;

/// Parses `expr`, logging and returning `None` on any failure — the
/// behavior every rule kind wants: a bad expression excludes only that
/// rule's AST, never the whole load.
pub fn parse_or_log(rule_id: u64, expr: &str) -> Option<FilterAst> {
    match parse(expr) {
        Ok(ast) => Some(ast),
        Err(err) => {
            tracing::error!(rule_id, error = %err, "failed to parse filter expression, rule will never match");
            None
        }
    }
}
