//! Lexer for `OpenQASM` 3.

use logos::Logos;

/// Tokens for `OpenQASM` 3.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip r"//[^\n]*")]
#[logos(skip r"/\*[^*]*\*+(?:[^/*][^*]*\*+)*/")]
pub enum Token {
    // Keywords
    #[token("OPENQASM")]
    OpenQasm,

    #[token("include")]
    Include,

    #[token("qubit")]
    Qubit,

    #[token("bit")]
    Bit,

    #[token("float")]
    Float,

    #[token("input")]
    Input,

    #[token("measure")]
    Measure,

    #[token("box")]
    Box,

    // Recognized so they can be rejected by name.
    #[token("cal")]
    Cal,

    #[token("defcal")]
    Defcal,

    #[token("gate")]
    Gate,

    #[token("def")]
    Def,

    #[token("if")]
    If,

    #[token("for")]
    For,

    #[token("while")]
    While,

    #[token("reset")]
    Reset,

    #[token("barrier")]
    Barrier,

    // Built-in gates (higher priority than identifier)
    #[token("U", priority = 3)]
    GateU,

    // Constants
    #[token("pi")]
    #[token("π")]
    Pi,

    #[token("tau")]
    #[token("τ")]
    Tau,

    #[token("euler")]
    Euler,

    // Literals
    #[regex(r"[0-9]+\.[0-9]*([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    FloatLiteral(f64),

    #[regex(r"[0-9]+", |lex| lex.slice().parse::<u64>().ok())]
    IntLiteral(u64),

    /// Imaginary literal such as `0.5im`; holds the coefficient.
    #[regex(r"[0-9]+(\.[0-9]*)?([eE][+-]?[0-9]+)?im", |lex| {
        let s = lex.slice();
        s[..s.len() - 2].parse::<f64>().ok()
    })]
    ImagLiteral(f64),

    #[regex(r#""[^"]*""#, |lex| {
        let s = lex.slice();
        Some(s[1..s.len()-1].to_string())
    })]
    StringLiteral(String),

    // Identifiers
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Identifier(String),

    /// Hardware qubit reference `$n`.
    #[regex(r"\$[0-9]+", |lex| lex.slice()[1..].parse::<u32>().ok())]
    PhysicalQubit(u32),

    /// A `#pragma` line; holds the text after the keyword.
    #[regex(r"#pragma[^\n]*", |lex| lex.slice()["#pragma".len()..].to_string())]
    Pragma(String),

    // Operators and punctuation
    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Star,

    #[token("/")]
    Slash,

    #[token("**")]
    Power,

    #[token("=")]
    Eq,

    #[token("->")]
    Arrow,

    #[token("@")]
    At,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token(";")]
    Semicolon,

    #[token(",")]
    Comma,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::OpenQasm => write!(f, "OPENQASM"),
            Token::Include => write!(f, "include"),
            Token::Qubit => write!(f, "qubit"),
            Token::Bit => write!(f, "bit"),
            Token::Float => write!(f, "float"),
            Token::Input => write!(f, "input"),
            Token::Measure => write!(f, "measure"),
            Token::Box => write!(f, "box"),
            Token::Cal => write!(f, "cal"),
            Token::Defcal => write!(f, "defcal"),
            Token::Gate => write!(f, "gate"),
            Token::Def => write!(f, "def"),
            Token::If => write!(f, "if"),
            Token::For => write!(f, "for"),
            Token::While => write!(f, "while"),
            Token::Reset => write!(f, "reset"),
            Token::Barrier => write!(f, "barrier"),
            Token::GateU => write!(f, "U"),
            Token::Pi => write!(f, "π"),
            Token::Tau => write!(f, "τ"),
            Token::Euler => write!(f, "euler"),
            Token::FloatLiteral(v) => write!(f, "{v}"),
            Token::IntLiteral(v) => write!(f, "{v}"),
            Token::ImagLiteral(v) => write!(f, "{v}im"),
            Token::StringLiteral(s) => write!(f, "\"{s}\""),
            Token::Identifier(s) => write!(f, "{s}"),
            Token::PhysicalQubit(n) => write!(f, "${n}"),
            Token::Pragma(s) => write!(f, "#pragma{s}"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Power => write!(f, "**"),
            Token::Eq => write!(f, "="),
            Token::Arrow => write!(f, "->"),
            Token::At => write!(f, "@"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::Semicolon => write!(f, ";"),
            Token::Comma => write!(f, ","),
        }
    }
}

/// A token with its span information.
#[derive(Debug, Clone)]
pub struct SpannedToken {
    pub token: Token,
    pub span: std::ops::Range<usize>,
}

/// Tokenize a QASM3 source string.
pub fn tokenize(source: &str) -> Vec<Result<SpannedToken, (std::ops::Range<usize>, String)>> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        if let Ok(token) = result {
            tokens.push(Ok(SpannedToken { token, span }));
        } else {
            let slice = &source[span.clone()];
            tokens.push(Err((span, format!("Invalid token: '{slice}'"))));
        }
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(source: &str) -> Vec<Token> {
        tokenize(source)
            .into_iter()
            .filter_map(Result::ok)
            .map(|t| t.token)
            .collect()
    }

    #[test]
    fn test_basic_tokens() {
        let tokens = tokens("OPENQASM 3.0;");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0], Token::OpenQasm);
        assert!(matches!(tokens[1], Token::FloatLiteral(v) if (v - 3.0).abs() < 0.001));
        assert_eq!(tokens[2], Token::Semicolon);
    }

    #[test]
    fn test_measure_assignment() {
        let tokens = tokens("b[0] = measure q[1];");
        assert!(matches!(tokens[0], Token::Identifier(ref s) if s == "b"));
        assert_eq!(tokens[1], Token::LBracket);
        assert_eq!(tokens[2], Token::IntLiteral(0));
        assert_eq!(tokens[4], Token::Eq);
        assert_eq!(tokens[5], Token::Measure);
    }

    #[test]
    fn test_unicode_constants_and_physical_qubits() {
        let tokens = tokens("rx(-π) $3; rz(τ) $0;");
        assert_eq!(tokens[2], Token::Minus);
        assert_eq!(tokens[3], Token::Pi);
        assert_eq!(tokens[5], Token::PhysicalQubit(3));
        assert_eq!(tokens[9], Token::Tau);
        assert_eq!(tokens[11], Token::PhysicalQubit(0));
    }

    #[test]
    fn test_imaginary_literals() {
        let tokens = tokens("0.5 - 1.0im 2im 1e-3im");
        assert_eq!(tokens[0], Token::FloatLiteral(0.5));
        assert_eq!(tokens[2], Token::ImagLiteral(1.0));
        assert_eq!(tokens[3], Token::ImagLiteral(2.0));
        assert_eq!(tokens[4], Token::ImagLiteral(1e-3));
    }

    #[test]
    fn test_pragma_is_one_token() {
        let tokens = tokens("#pragma braket result expectation x(q[0])\nh q[0];");
        assert_eq!(
            tokens[0],
            Token::Pragma(" braket result expectation x(q[0])".into())
        );
        assert!(matches!(tokens[1], Token::Identifier(ref s) if s == "h"));
    }

    #[test]
    fn test_comments() {
        let source = r"
            // This is a comment
            qubit q;
            /* Multi-line
               comment */
            bit b;
        ";
        assert_eq!(tokens(source).len(), 6);
    }
}
