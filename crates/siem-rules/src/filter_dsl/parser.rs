//! Recursive-descent parser over the token stream produced by [`lexer`].
//!
//! `expr := cmp (('and' | 'or') cmp)*`, folded strictly left-to-right: `a
//! and b or c` is `Or(And(a, b), c)`. There is no `and`/`or` precedence
//! distinction — this is intentional, not an oversight.

use super::ast::{CmpOp, FilterAst};
use super::lexer::{self, Token};
use crate::error::RuleError;

pub fn parse(input: &str) -> Result<FilterAst, RuleError> {
    let tokens = lexer::tokenize(input)?;
    if tokens.is_empty() {
        return Err(RuleError::FilterParse("empty expression".to_string()));
    }
    let mut parser = Parser { tokens, pos: 0 };
    let ast = parser.parse_expr()?;
    if parser.pos != parser.tokens.len() {
        return Err(RuleError::FilterParse(format!(
            "trailing tokens after position {}",
            parser.pos
        )));
    }
    Ok(ast)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn parse_expr(&mut self) -> Result<FilterAst, RuleError> {
        let mut left = self.parse_cmp()?;
        loop {
            match self.peek() {
                Some(Token::And) => {
                    self.pos += 1;
                    let right = self.parse_cmp()?;
                    left = FilterAst::And(Box::new(left), Box::new(right));
                }
                Some(Token::Or) => {
                    self.pos += 1;
                    let right = self.parse_cmp()?;
                    left = FilterAst::Or(Box::new(left), Box::new(right));
                }
                _ => break,
            }
        }
        Ok(left)
    }

    fn parse_cmp(&mut self) -> Result<FilterAst, RuleError> {
        let field = match self.next() {
            Some(Token::Name(name)) => name,
            other => {
                return Err(RuleError::FilterParse(format!(
                    "expected field name, got {other:?}"
                )))
            }
        };
        let op = match self.next() {
            Some(Token::Eq) => CmpOp::Eq,
            Some(Token::Ne) => CmpOp::Ne,
            other => {
                return Err(RuleError::FilterParse(format!(
                    "expected '==' or '!=', got {other:?}"
                )))
            }
        };
        let literal = match self.next() {
            Some(Token::String(s)) => s,
            other => {
                return Err(RuleError::FilterParse(format!(
                    "expected string literal, got {other:?}"
                )))
            }
        };
        Ok(FilterAst::Cmp { field, op, literal })
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scenario_2_from_spec() {
        let ast = parse("event.provider == 'http_json' and event.category == 'test'").unwrap();
        assert_eq!(
            ast,
            FilterAst::And(
                Box::new(FilterAst::Cmp {
                    field: "event.provider".into(),
                    op: CmpOp::Eq,
                    literal: "http_json".into(),
                }),
                Box::new(FilterAst::Cmp {
                    field: "event.category".into(),
                    op: CmpOp::Eq,
                    literal: "test".into(),
                }),
            )
        );
    }

    #[test]
    fn left_to_right_with_no_precedence() {
        let ast = parse("a == '1' and b == '2' or c == '3'").unwrap();
        let a = Box::new(FilterAst::Cmp {
            field: "a".into(),
            op: CmpOp::Eq,
            literal: "1".into(),
        });
        let b = Box::new(FilterAst::Cmp {
            field: "b".into(),
            op: CmpOp::Eq,
            literal: "2".into(),
        });
        let c = Box::new(FilterAst::Cmp {
            field: "c".into(),
            op: CmpOp::Eq,
            literal: "3".into(),
        });
        assert_eq!(ast, FilterAst::Or(Box::new(FilterAst::And(a, b)), c));
    }

    #[test]
    fn empty_expression_is_a_parse_error() {
        assert!(parse("").is_err());
        assert!(parse("   ").is_err());
    }

    #[test]
    fn trailing_tokens_are_a_parse_error() {
        assert!(parse("a == '1' extra").is_err());
    }
}
