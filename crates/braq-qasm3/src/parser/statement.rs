//! Statement parsing for QASM3.

use super::Parser;
use crate::ast::{BitRef, GateCall, QubitRef, Statement};
use crate::error::{ParseError, ParseResult};
use crate::lexer::Token;

impl Parser {
    /// Parse a statement.
    pub(super) fn parse_statement(&mut self) -> ParseResult<Statement> {
        let token = self
            .peek()
            .cloned()
            .ok_or_else(|| ParseError::UnexpectedEof("statement".into()))?;

        match token {
            Token::Include => self.parse_include(),
            Token::Input => self.parse_input_decl(),
            Token::Qubit => self.parse_qubit_decl(),
            Token::Bit => self.parse_bit_decl(),
            Token::Measure => self.parse_measure(),
            Token::Box => self.parse_box(),
            Token::Pragma(text) => {
                let start = self.tokens[self.pos].span.start + "#pragma".len();
                self.advance();
                Ok(Statement::Pragma(Parser::parse_pragma(&text, start)?))
            }
            Token::Identifier(_) | Token::GateU => self.parse_identifier_statement(),
            Token::Cal
            | Token::Defcal
            | Token::Gate
            | Token::Def
            | Token::If
            | Token::For
            | Token::While
            | Token::Reset
            | Token::Barrier => {
                self.advance();
                Err(ParseError::Unsupported(format!("'{token}' statements")))
            }
            _ => {
                self.advance();
                Err(self.unexpected("statement", &token))
            }
        }
    }

    /// Parse include statement.
    fn parse_include(&mut self) -> ParseResult<Statement> {
        self.expect(Token::Include)?;
        let path = match self.advance() {
            Some(Token::StringLiteral(s)) => s,
            Some(other) => return Err(self.unexpected("string literal", &other)),
            None => return Err(ParseError::UnexpectedEof("include path".into())),
        };
        self.expect(Token::Semicolon)?;
        Ok(Statement::Include(path))
    }

    /// Parse `input float name;`.
    fn parse_input_decl(&mut self) -> ParseResult<Statement> {
        self.expect(Token::Input)?;
        self.expect(Token::Float)?;
        let name = self.parse_identifier()?;
        self.expect(Token::Semicolon)?;
        Ok(Statement::InputDecl { name })
    }

    /// Parse an optional `[n]` size designator.
    fn parse_size(&mut self) -> ParseResult<Option<u32>> {
        if self.consume(&Token::LBracket) {
            let size = self.parse_u32_literal()?;
            self.expect(Token::RBracket)?;
            Ok(Some(size))
        } else {
            Ok(None)
        }
    }

    /// Parse qubit declaration.
    fn parse_qubit_decl(&mut self) -> ParseResult<Statement> {
        self.expect(Token::Qubit)?;
        let size = self.parse_size()?;
        let name = self.parse_identifier()?;
        self.expect(Token::Semicolon)?;

        Ok(Statement::QubitDecl { name, size })
    }

    /// Parse bit declaration.
    fn parse_bit_decl(&mut self) -> ParseResult<Statement> {
        self.expect(Token::Bit)?;
        let size = self.parse_size()?;
        let name = self.parse_identifier()?;
        self.expect(Token::Semicolon)?;

        Ok(Statement::BitDecl { name, size })
    }

    /// Parse measure statement: `measure q -> b;` or `measure q;`.
    fn parse_measure(&mut self) -> ParseResult<Statement> {
        self.expect(Token::Measure)?;

        let qubits = self.parse_qubit_refs()?;
        let bits = if self.consume(&Token::Arrow) {
            self.parse_bit_refs()?
        } else {
            vec![]
        };

        self.expect(Token::Semicolon)?;

        Ok(Statement::Measure { qubits, bits })
    }

    /// Parse `box { ... }`.
    fn parse_box(&mut self) -> ParseResult<Statement> {
        self.expect(Token::Box)?;
        self.expect(Token::LBrace)?;
        let mut body = Vec::new();
        while !self.check(&Token::RBrace) {
            if self.is_eof() {
                return Err(ParseError::UnexpectedEof("'}' closing box".into()));
            }
            body.push(self.parse_statement()?);
        }
        self.expect(Token::RBrace)?;
        Ok(Statement::Box(body))
    }

    /// Parse statement starting with identifier (gate call or assignment).
    fn parse_identifier_statement(&mut self) -> ParseResult<Statement> {
        let name = match self.advance() {
            Some(Token::Identifier(s)) => s,
            Some(Token::GateU) => "U".to_string(),
            Some(other) => return Err(self.unexpected("identifier", &other)),
            None => return Err(ParseError::UnexpectedEof("identifier".into())),
        };

        // Check for assignment: b = measure q; or b[0] = measure q[0];
        if self.check(&Token::Eq) || self.check(&Token::LBracket) {
            return self.parse_assignment(name);
        }

        // Otherwise it's a gate call
        self.parse_gate_call(name)
    }

    /// Parse a measure assignment; the circuit model has no other classical
    /// assignments.
    fn parse_assignment(&mut self, target: String) -> ParseResult<Statement> {
        let index = if self.consume(&Token::LBracket) {
            let idx = self.parse_u32_literal()?;
            self.expect(Token::RBracket)?;
            Some(idx)
        } else {
            None
        };

        self.expect(Token::Eq)?;
        if !self.consume(&Token::Measure) {
            return Err(ParseError::Unsupported(format!(
                "classical assignment to '{target}'"
            )));
        }
        let qubits = self.parse_qubit_refs()?;
        self.expect(Token::Semicolon)?;

        Ok(Statement::Measure {
            qubits,
            bits: vec![BitRef {
                register: target,
                index,
            }],
        })
    }

    /// Parse gate call.
    fn parse_gate_call(&mut self, name: String) -> ParseResult<Statement> {
        let params = if self.consume(&Token::LParen) {
            let p = self.parse_expression_list()?;
            self.expect(Token::RParen)?;
            p
        } else {
            vec![]
        };

        let qubits = self.parse_qubit_refs()?;
        self.expect(Token::Semicolon)?;

        Ok(Statement::Gate(GateCall {
            name,
            params,
            qubits,
        }))
    }

    /// Parse qubit references.
    pub(super) fn parse_qubit_refs(&mut self) -> ParseResult<Vec<QubitRef>> {
        let mut refs = vec![self.parse_qubit_ref()?];
        while self.consume(&Token::Comma) {
            refs.push(self.parse_qubit_ref()?);
        }
        Ok(refs)
    }

    /// Parse a single qubit reference: `q`, `q[i]` or `$i`.
    pub(super) fn parse_qubit_ref(&mut self) -> ParseResult<QubitRef> {
        if let Some(Token::PhysicalQubit(n)) = self.peek() {
            let n = *n;
            self.advance();
            return Ok(QubitRef::Physical(n));
        }
        let register = self.parse_identifier()?;

        if self.consume(&Token::LBracket) {
            let index = self.parse_u32_literal()?;
            self.expect(Token::RBracket)?;
            Ok(QubitRef::single(register, index))
        } else {
            Ok(QubitRef::register(register))
        }
    }

    /// Parse bit references.
    fn parse_bit_refs(&mut self) -> ParseResult<Vec<BitRef>> {
        let mut refs = vec![self.parse_bit_ref()?];
        while self.consume(&Token::Comma) {
            refs.push(self.parse_bit_ref()?);
        }
        Ok(refs)
    }

    /// Parse a single bit reference.
    fn parse_bit_ref(&mut self) -> ParseResult<BitRef> {
        let register = self.parse_identifier()?;

        let index = if self.consume(&Token::LBracket) {
            let index = self.parse_u32_literal()?;
            self.expect(Token::RBracket)?;
            Some(index)
        } else {
            None
        };
        Ok(BitRef { register, index })
    }
}
