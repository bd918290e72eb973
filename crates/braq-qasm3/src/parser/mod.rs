//! Parser for the Braket dialect of `OpenQASM` 3.

mod expression;
mod lowering;
mod pragma;
mod statement;

pub(crate) use lowering::lower_to_circuit;

use braq_ir::Circuit;

use crate::ast::Program;
use crate::error::{ParseError, ParseResult};
use crate::lexer::{SpannedToken, Token, tokenize};

/// Parse a QASM3 source string into a Circuit.
pub fn parse(source: &str) -> ParseResult<Circuit> {
    let program = parse_ast(source)?;
    lower_to_circuit(&program)
}

/// Parse a QASM3 source string into an AST Program.
pub fn parse_ast(source: &str) -> ParseResult<Program> {
    let mut parser = Parser::new(source, 0)?;
    parser.parse_program()
}

/// Parser state.
pub(super) struct Parser {
    pub(super) tokens: Vec<SpannedToken>,
    pub(super) pos: usize,
    /// Byte offset of the parsed text within the whole source.
    offset: usize,
}

#[allow(clippy::unnecessary_wraps)]
impl Parser {
    /// Create a new parser over `source`, which starts at byte `offset` of
    /// the original text.
    pub(super) fn new(source: &str, offset: usize) -> ParseResult<Self> {
        let token_results = tokenize(source);
        let mut tokens = Vec::new();

        for result in token_results {
            match result {
                Ok(t) => tokens.push(t),
                Err((span, msg)) => {
                    return Err(ParseError::LexerError {
                        position: offset + span.start,
                        message: msg,
                    });
                }
            }
        }

        Ok(Self {
            tokens,
            pos: 0,
            offset,
        })
    }

    /// Check if we've reached the end.
    pub(super) fn is_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Byte position of the most recently consumed token.
    pub(super) fn position(&self) -> usize {
        let local = self
            .tokens
            .get(self.pos.saturating_sub(1))
            .map_or(0, |t| t.span.start);
        self.offset + local
    }

    /// Peek at the current token.
    pub(super) fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    /// Advance and return the current token.
    pub(super) fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos)?.token.clone();
        self.pos += 1;
        Some(token)
    }

    /// Error for an unexpected token just consumed.
    pub(super) fn unexpected(&self, expected: &str, found: &Token) -> ParseError {
        ParseError::UnexpectedToken {
            position: self.position(),
            expected: expected.into(),
            found: found.to_string(),
        }
    }

    /// Expect a specific token.
    #[allow(clippy::needless_pass_by_value)]
    pub(super) fn expect(&mut self, expected: Token) -> ParseResult<()> {
        let found = self
            .advance()
            .ok_or_else(|| ParseError::UnexpectedEof(format!("expected {expected}")))?;

        if std::mem::discriminant(&found) != std::mem::discriminant(&expected) {
            return Err(self.unexpected(&expected.to_string(), &found));
        }
        Ok(())
    }

    /// Check if current token matches.
    pub(super) fn check(&self, token: &Token) -> bool {
        self.peek()
            .is_some_and(|t| std::mem::discriminant(t) == std::mem::discriminant(token))
    }

    /// Consume token if it matches.
    pub(super) fn consume(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Parse the entire program.
    fn parse_program(&mut self) -> ParseResult<Program> {
        // Parse version
        self.expect(Token::OpenQasm)?;
        let version = self.parse_version()?;
        self.expect(Token::Semicolon)?;

        // Parse statements
        let mut statements = Vec::new();
        while !self.is_eof() {
            statements.push(self.parse_statement()?);
        }

        Ok(Program {
            version,
            statements,
        })
    }

    /// Parse version number.
    fn parse_version(&mut self) -> ParseResult<String> {
        match self.advance() {
            Some(Token::FloatLiteral(v)) if v.trunc() == 3.0 => Ok(format!("{v:?}")),
            Some(Token::IntLiteral(3)) => Ok("3.0".into()),
            Some(other) => Err(ParseError::InvalidVersion(other.to_string())),
            None => Err(ParseError::UnexpectedEof("version number".into())),
        }
    }

    /// Parse an identifier.
    pub(super) fn parse_identifier(&mut self) -> ParseResult<String> {
        match self.advance() {
            Some(Token::Identifier(s)) => Ok(s),
            Some(other) => Err(self.unexpected("identifier", &other)),
            None => Err(ParseError::UnexpectedEof("identifier".into())),
        }
    }

    /// Parse identifier list.
    pub(super) fn parse_identifier_list(&mut self) -> ParseResult<Vec<String>> {
        let mut ids = vec![self.parse_identifier()?];
        while self.consume(&Token::Comma) {
            ids.push(self.parse_identifier()?);
        }
        Ok(ids)
    }

    /// Parse an integer literal.
    pub(super) fn parse_int_literal(&mut self) -> ParseResult<u64> {
        match self.advance() {
            Some(Token::IntLiteral(v)) => Ok(v),
            Some(other) => Err(self.unexpected("integer", &other)),
            None => Err(ParseError::UnexpectedEof("integer".into())),
        }
    }

    /// Parse an integer literal that must fit a `u32`.
    pub(super) fn parse_u32_literal(&mut self) -> ParseResult<u32> {
        let value = self.parse_int_literal()?;
        u32::try_from(value).map_err(|_| ParseError::Generic(format!("{value} exceeds u32::MAX")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Statement;
    use braq_ir::Qubit;

    #[test]
    fn test_parse_bell_state() {
        let source = r"
            OPENQASM 3.0;
            bit[2] b;
            qubit[2] q;
            h q[0];
            cnot q[0], q[1];
            b[0] = measure q[0];
            b[1] = measure q[1];
        ";

        let circuit = parse(source).unwrap();
        assert_eq!(circuit.qubit_count(), 2);
        assert_eq!(circuit.measure_targets(), &[Qubit(0), Qubit(1)]);
        assert_eq!(circuit.depth(), 3);
    }

    #[test]
    fn test_parse_parameterized() {
        let source = r"
            OPENQASM 3.0;
            input float theta;
            qubit q;
            rx(pi/2) q;
            ry(theta) q;
            rz(0.5) q;
        ";

        let circuit = parse(source).unwrap();
        assert_eq!(circuit.qubit_count(), 1);
        assert_eq!(circuit.depth(), 3);
        assert_eq!(circuit.parameters().len(), 1);
    }

    #[test]
    fn test_parse_ast_keeps_pragmas() {
        let source = "OPENQASM 3.0;\nqubit[1] q;\nh q[0];\n#pragma braket result state_vector\n";
        let program = parse_ast(source).unwrap();
        assert_eq!(program.version, "3.0");
        assert!(matches!(program.statements.last(), Some(Statement::Pragma(_))));
    }

    #[test]
    fn test_parse_error_undefined() {
        let source = r"
            OPENQASM 3.0;
            h undefined[0];
        ";

        assert!(matches!(
            parse(source),
            Err(ParseError::UndefinedIdentifier(name)) if name == "undefined"
        ));
    }

    #[test]
    fn test_error_position_points_at_token() {
        let source = "OPENQASM 3.0;\nqubit[2] q;\nh q[0]";
        let err = parse(source).unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedEof(_)));

        let source = "OPENQASM 3.0;\nqubit[2] 5;";
        let err = parse(source).unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { position: 23, .. }));
    }

    #[test]
    fn test_rejects_other_versions() {
        assert!(matches!(
            parse("OPENQASM 2.0;"),
            Err(ParseError::InvalidVersion(_))
        ));
    }
}
