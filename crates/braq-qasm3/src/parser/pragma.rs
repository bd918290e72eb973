//! Parsing of `#pragma braket ...` lines.
//!
//! The lexer hands a whole pragma line over as one token; its text is
//! tokenized again here and parsed with the regular expression and qubit
//! reference rules.

use tracing::debug;

use super::Parser;
use crate::ast::{
    ObservableFactor, ObservableFactorKind, ObservableResultKind, Pragma, PragmaTarget,
    ResultPragma,
};
use crate::error::{ParseError, ParseResult};
use crate::lexer::Token;

impl Parser {
    /// Parse the text following `#pragma`, located at byte `offset`.
    pub(super) fn parse_pragma(text: &str, offset: usize) -> ParseResult<Pragma> {
        if text.split_whitespace().next() != Some("braket") {
            debug!(pragma = text.trim(), "keeping non-braket pragma");
            return Ok(Pragma::Other(text.trim().to_string()));
        }
        let mut parser = Parser::new(text, offset)?;
        parser.advance();

        let kind = parser.parse_identifier()?;
        let pragma = match kind.as_str() {
            "verbatim" => Pragma::Verbatim,
            "unitary" => {
                parser.expect(Token::LParen)?;
                let matrix = parser.parse_matrix()?;
                parser.expect(Token::RParen)?;
                let qubits = parser.parse_qubit_refs()?;
                Pragma::Unitary { matrix, qubits }
            }
            "noise" => {
                let name = parser.parse_identifier()?;
                let params = if parser.consume(&Token::LParen) {
                    let p = parser.parse_expression_list()?;
                    parser.expect(Token::RParen)?;
                    p
                } else {
                    vec![]
                };
                let qubits = parser.parse_qubit_refs()?;
                Pragma::Noise {
                    name,
                    params,
                    qubits,
                }
            }
            "result" => Pragma::Result(parser.parse_result_pragma()?),
            other => {
                return Err(ParseError::Unsupported(format!("pragma 'braket {other}'")));
            }
        };

        if let Some(extra) = parser.advance() {
            return Err(parser.unexpected("end of pragma", &extra));
        }
        Ok(pragma)
    }

    /// Consume `keyword` if it is the next identifier.
    fn consume_keyword(&mut self, keyword: &str) -> bool {
        if matches!(self.peek(), Some(Token::Identifier(s)) if s == keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn parse_result_pragma(&mut self) -> ParseResult<ResultPragma> {
        let kind = self.parse_identifier()?;
        let observable_kind = match kind.as_str() {
            "expectation" => Some(ObservableResultKind::Expectation),
            "variance" => Some(ObservableResultKind::Variance),
            "sample" => Some(ObservableResultKind::Sample),
            _ => None,
        };
        if let Some(kind) = observable_kind {
            return Ok(ResultPragma::Observable {
                kind,
                factors: self.parse_observable()?,
            });
        }

        match kind.as_str() {
            "probability" => Ok(ResultPragma::Probability(self.parse_pragma_target()?)),
            "density_matrix" => Ok(ResultPragma::DensityMatrix(self.parse_pragma_target()?)),
            "state_vector" => Ok(ResultPragma::StateVector),
            "amplitude" => {
                let mut states = vec![self.parse_string()?];
                while self.consume(&Token::Comma) {
                    states.push(self.parse_string()?);
                }
                Ok(ResultPragma::Amplitude(states))
            }
            "adjoint_gradient" => {
                if !self.consume_keyword("expectation") {
                    return Err(ParseError::Unsupported(
                        "adjoint_gradient of anything but an expectation".into(),
                    ));
                }
                self.expect(Token::LParen)?;
                let factors = self.parse_observable()?;
                self.expect(Token::RParen)?;
                let parameters = if self.consume_keyword("all") {
                    vec![]
                } else {
                    self.parse_identifier_list()?
                };
                Ok(ResultPragma::AdjointGradient {
                    factors,
                    parameters,
                })
            }
            other => Err(ParseError::Unsupported(format!("result type '{other}'"))),
        }
    }

    /// Parse `x(q[0]) @ hermitian([[...]]) q[1], q[2] @ z all`.
    fn parse_observable(&mut self) -> ParseResult<Vec<ObservableFactor>> {
        let mut factors = vec![self.parse_observable_factor()?];
        while self.consume(&Token::At) {
            factors.push(self.parse_observable_factor()?);
        }
        Ok(factors)
    }

    fn parse_observable_factor(&mut self) -> ParseResult<ObservableFactor> {
        let name = self.parse_identifier()?;
        if name == "hermitian" {
            self.expect(Token::LParen)?;
            let matrix = self.parse_matrix()?;
            self.expect(Token::RParen)?;
            return Ok(ObservableFactor {
                kind: ObservableFactorKind::Hermitian(matrix),
                target: self.parse_pragma_target()?,
            });
        }

        let target = if self.consume(&Token::LParen) {
            let qubit = self.parse_qubit_ref()?;
            self.expect(Token::RParen)?;
            PragmaTarget::Qubits(vec![qubit])
        } else if self.consume_keyword("all") {
            PragmaTarget::All
        } else {
            let found = self
                .advance()
                .ok_or_else(|| ParseError::UnexpectedEof("observable target".into()))?;
            return Err(self.unexpected("'(' or 'all'", &found));
        };
        Ok(ObservableFactor {
            kind: ObservableFactorKind::Named(name),
            target,
        })
    }

    /// Parse `all`, a qubit list, or nothing (meaning all).
    fn parse_pragma_target(&mut self) -> ParseResult<PragmaTarget> {
        if self.is_eof() || self.consume_keyword("all") {
            Ok(PragmaTarget::All)
        } else {
            Ok(PragmaTarget::Qubits(self.parse_qubit_refs()?))
        }
    }

    fn parse_string(&mut self) -> ParseResult<String> {
        match self.advance() {
            Some(Token::StringLiteral(s)) => Ok(s),
            Some(other) => Err(self.unexpected("string literal", &other)),
            None => Err(ParseError::UnexpectedEof("string literal".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::QubitRef;

    fn pragma(text: &str) -> Pragma {
        Parser::parse_pragma(text, 0).unwrap()
    }

    #[test]
    fn test_tensor_product_observable() {
        let Pragma::Result(ResultPragma::Observable { kind, factors }) =
            pragma(" braket result expectation x(q[0]) @ hermitian([[1.0, 0.0], [0.0, -1.0]]) q[2]")
        else {
            panic!("expected an observable result");
        };
        assert_eq!(kind, ObservableResultKind::Expectation);
        assert_eq!(factors.len(), 2);
        assert!(matches!(&factors[0].kind, ObservableFactorKind::Named(n) if n == "x"));
        assert_eq!(
            factors[1].target,
            PragmaTarget::Qubits(vec![QubitRef::single("q", 2)])
        );
    }

    #[test]
    fn test_all_targets() {
        assert!(matches!(
            pragma(" braket result probability all"),
            Pragma::Result(ResultPragma::Probability(PragmaTarget::All))
        ));
        assert!(matches!(
            pragma(" braket result density_matrix"),
            Pragma::Result(ResultPragma::DensityMatrix(PragmaTarget::All))
        ));
        let Pragma::Result(ResultPragma::Observable { factors, .. }) =
            pragma(" braket result sample z all")
        else {
            panic!("expected an observable result");
        };
        assert_eq!(factors[0].target, PragmaTarget::All);
    }

    #[test]
    fn test_noise_and_unitary() {
        assert!(matches!(
            pragma(" braket noise pauli_channel(0.1, 0.2, 0.3) $1"),
            Pragma::Noise { ref name, ref params, ref qubits }
                if name == "pauli_channel" && params.len() == 3 && qubits == &[QubitRef::Physical(1)]
        ));
        assert!(matches!(
            pragma(" braket unitary([[0, 1.0im], [-1.0im, 0]]) q[0]"),
            Pragma::Unitary { ref matrix, .. } if matrix.len() == 2
        ));
    }

    #[test]
    fn test_adjoint_gradient() {
        let Pragma::Result(ResultPragma::AdjointGradient {
            factors,
            parameters,
        }) = pragma(" braket result adjoint_gradient expectation(z(q[0]) @ x(q[1])) theta, phi")
        else {
            panic!("expected an adjoint gradient");
        };
        assert_eq!(factors.len(), 2);
        assert_eq!(parameters, vec!["theta".to_string(), "phi".to_string()]);
    }

    #[test]
    fn test_amplitude_and_foreign_pragmas() {
        assert!(matches!(
            pragma(r#" braket result amplitude "00", "11""#),
            Pragma::Result(ResultPragma::Amplitude(ref s)) if s.len() == 2
        ));
        assert!(matches!(pragma(" vendor setting #3"), Pragma::Other(ref s) if s == "vendor setting #3"));
    }

    #[test]
    fn test_trailing_tokens_rejected() {
        assert!(Parser::parse_pragma(" braket result state_vector q[0]", 0).is_err());
    }
}
