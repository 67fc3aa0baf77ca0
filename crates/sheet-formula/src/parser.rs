//! Recursive-descent parser for the minimal arithmetic grammar (§3b):
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := factor (('*' | '/') factor)*
//! factor  := '-' factor | '(' expr ')' | number | cell_ref
//! ```

use crate::ast::{Expr, Op};
use crate::error::ParseError;
use crate::lexer::Lexer;
use crate::position::Position;
use crate::token::Token;

pub fn parse(input: &str) -> Result<Expr, ParseError> {
    let mut parser = Parser::new(input);
    let expr = parser.parse_expr()?;
    parser.expect_eof()?;
    Ok(expr)
}

struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token();
        Parser { lexer, current }
    }

    fn advance(&mut self) -> Token {
        let next = self.lexer.next_token();
        std::mem::replace(&mut self.current, next)
    }

    fn expect_eof(&self) -> Result<(), ParseError> {
        if self.current == Token::Eof {
            Ok(())
        } else {
            Err(ParseError::new(format!(
                "unexpected trailing token `{}`",
                self.current
            )))
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_term()?;
        loop {
            let op = match self.current {
                Token::Plus => Op::Add,
                Token::Minus => Op::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_term()?;
            lhs = Expr::Bin(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_term(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_factor()?;
        loop {
            let op = match self.current {
                Token::Star => Op::Mul,
                Token::Slash => Op::Div,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_factor()?;
            lhs = Expr::Bin(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_factor(&mut self) -> Result<Expr, ParseError> {
        match self.advance() {
            Token::Minus => Ok(Expr::Neg(Box::new(self.parse_factor()?))),
            Token::LParen => {
                let inner = self.parse_expr()?;
                if self.current != Token::RParen {
                    return Err(ParseError::new(format!(
                        "expected `)`, found `{}`",
                        self.current
                    )));
                }
                self.advance();
                Ok(inner)
            }
            Token::Number(n) => Ok(Expr::Number(n)),
            Token::Ident(name) => Position::parse(&name)
                .map(Expr::Ref)
                .ok_or_else(|| ParseError::new(format!("not a cell reference: `{}`", name))),
            other => Err(ParseError::new(format!("unexpected token `{}`", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_single_number() {
        assert_eq!(parse("42").unwrap(), Expr::Number(42.0));
    }

    #[test]
    fn parses_a_cell_reference() {
        assert_eq!(parse("A1").unwrap(), Expr::Ref(Position::new(0, 0)));
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let e = parse("1+2*3").unwrap();
        assert_eq!(e.to_string(), "1+2*3");
        let e = parse("(1+2)*3").unwrap();
        assert_eq!(e.to_string(), "(1+2)*3");
    }

    #[test]
    fn supports_unary_minus() {
        let e = parse("-A1+1").unwrap();
        assert_eq!(e.to_string(), "-A1+1");
    }

    #[test]
    fn rejects_unbalanced_parens() {
        assert!(parse("(1+2").is_err());
        assert!(parse("1+2)").is_err());
    }

    #[test]
    fn rejects_empty_input() {
        assert!(parse("").is_err());
    }

    #[test]
    fn rejects_trailing_garbage() {
        assert!(parse("1 2").is_err());
    }

    #[test]
    fn rejects_malformed_cell_reference() {
        assert!(parse("1A").is_err());
    }
}
