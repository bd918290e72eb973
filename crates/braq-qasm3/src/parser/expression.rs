//! Expression parsing for QASM3.

use super::Parser;
use crate::ast::{BinOp, Expression};
use crate::error::{ParseError, ParseResult};
use crate::lexer::Token;

impl Parser {
    /// Parse an expression.
    pub(super) fn parse_expression(&mut self) -> ParseResult<Expression> {
        self.parse_binary_expr(0)
    }

    /// Parse binary expression with precedence climbing.
    fn parse_binary_expr(&mut self, min_prec: u8) -> ParseResult<Expression> {
        let mut left = self.parse_unary_expr()?;

        while let Some(op) = self.peek_binary_op() {
            let prec = op_precedence(op);
            if prec < min_prec {
                break;
            }
            self.advance(); // consume operator

            // `**` is right-associative
            let next_prec = if op == BinOp::Pow { prec } else { prec + 1 };
            let right = self.parse_binary_expr(next_prec)?;
            left = Expression::BinOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    /// Parse unary expression.
    fn parse_unary_expr(&mut self) -> ParseResult<Expression> {
        if self.consume(&Token::Minus) {
            let expr = self.parse_unary_expr()?;
            return Ok(Expression::Neg(Box::new(expr)));
        }
        if self.consume(&Token::Plus) {
            return self.parse_unary_expr();
        }
        self.parse_primary_expr()
    }

    /// Parse primary expression.
    #[allow(clippy::cast_possible_wrap)]
    fn parse_primary_expr(&mut self) -> ParseResult<Expression> {
        let token = self
            .advance()
            .ok_or_else(|| ParseError::UnexpectedEof("expression".into()))?;

        match token {
            // Very large integer literals are uncommon in QASM3.
            Token::IntLiteral(v) => Ok(Expression::Int(v as i64)),
            Token::FloatLiteral(v) => Ok(Expression::Float(v)),
            Token::ImagLiteral(v) => Ok(Expression::Imag(v)),
            Token::Pi => Ok(Expression::Pi),
            Token::Tau => Ok(Expression::Tau),
            Token::Euler => Ok(Expression::Euler),
            Token::Identifier(name) => Ok(Expression::Identifier(name)),
            Token::LParen => {
                let expr = self.parse_expression()?;
                self.expect(Token::RParen)?;
                Ok(Expression::Paren(Box::new(expr)))
            }
            other => Err(self.unexpected("expression", &other)),
        }
    }

    /// Peek at binary operator.
    fn peek_binary_op(&self) -> Option<BinOp> {
        match self.peek()? {
            Token::Plus => Some(BinOp::Add),
            Token::Minus => Some(BinOp::Sub),
            Token::Star => Some(BinOp::Mul),
            Token::Slash => Some(BinOp::Div),
            Token::Power => Some(BinOp::Pow),
            _ => None,
        }
    }

    /// Parse expression list.
    pub(super) fn parse_expression_list(&mut self) -> ParseResult<Vec<Expression>> {
        if self.check(&Token::RParen) {
            return Ok(vec![]);
        }
        let mut exprs = vec![self.parse_expression()?];
        while self.consume(&Token::Comma) {
            exprs.push(self.parse_expression()?);
        }
        Ok(exprs)
    }

    /// Parse a matrix literal `[[a, b], [c, d]]`.
    pub(super) fn parse_matrix(&mut self) -> ParseResult<Vec<Vec<Expression>>> {
        self.expect(Token::LBracket)?;
        let mut rows = vec![self.parse_matrix_row()?];
        while self.consume(&Token::Comma) {
            rows.push(self.parse_matrix_row()?);
        }
        self.expect(Token::RBracket)?;
        Ok(rows)
    }

    fn parse_matrix_row(&mut self) -> ParseResult<Vec<Expression>> {
        self.expect(Token::LBracket)?;
        let mut row = vec![self.parse_expression()?];
        while self.consume(&Token::Comma) {
            row.push(self.parse_expression()?);
        }
        self.expect(Token::RBracket)?;
        Ok(row)
    }
}

/// Get operator precedence.
fn op_precedence(op: BinOp) -> u8 {
    match op {
        BinOp::Add | BinOp::Sub => 1,
        BinOp::Mul | BinOp::Div => 2,
        BinOp::Pow => 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_expr(source: &str) -> Expression {
        let mut parser = Parser::new(source, 0).unwrap();
        parser.parse_expression().unwrap()
    }

    #[test]
    fn test_precedence() {
        let expr = parse_expr("1.0 + 2.0 * 3.0");
        assert_eq!(expr.as_f64(), Some(7.0));

        let expr = parse_expr("2 ** 3 ** 2");
        assert_eq!(expr.as_f64(), Some(512.0));
    }

    #[test]
    fn test_negative_pi() {
        let expr = parse_expr("-π");
        assert_eq!(expr.as_f64(), Some(-std::f64::consts::PI));
    }

    #[test]
    fn test_complex_entry() {
        let expr = parse_expr("0.5 - 1.5im");
        assert!(matches!(
            expr,
            Expression::BinOp { op: BinOp::Sub, ref right, .. } if **right == Expression::Imag(1.5)
        ));
    }

    #[test]
    fn test_matrix_literal() {
        let mut parser = Parser::new("[[0.0, 1.0], [1.0, 0.0]]", 0).unwrap();
        let rows = parser.parse_matrix().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][0], Expression::Float(1.0));
    }
}
