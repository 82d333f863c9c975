//! Lexer for `OpenQASM` 2.0.

use logos::Logos;

/// Tokens for `OpenQASM` 2.0.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip r"//[^\n]*")]
pub enum Token {
    // Keywords
    #[token("OPENQASM")]
    OpenQasm,

    #[token("include")]
    Include,

    #[token("qreg")]
    QReg,

    #[token("creg")]
    CReg,

    #[token("gate")]
    Gate,

    #[token("opaque")]
    Opaque,

    #[token("measure")]
    Measure,

    #[token("reset")]
    Reset,

    #[token("barrier")]
    Barrier,

    #[token("snapshot")]
    Snapshot,

    #[token("show_probabilities")]
    Probabilities,

    #[token("if")]
    If,

    #[token("pi")]
    Pi,

    // Built-in gates (higher priority than identifier)
    #[token("U", priority = 5)]
    GateU,

    #[token("CX", priority = 5)]
    GateCx,

    #[token("swap")]
    Swap,

    // Unary functions inside expressions
    #[token("sin")]
    Sin,

    #[token("cos")]
    Cos,

    #[token("tan")]
    Tan,

    #[token("exp")]
    Exp,

    #[token("ln")]
    Ln,

    #[token("sqrt")]
    Sqrt,

    // Literals
    #[regex(r"[0-9]+\.[0-9]*([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    Real(f64),

    #[regex(r"[0-9]+", |lex| lex.slice().parse::<u64>().ok())]
    NnInteger(u64),

    #[regex(r#""[^"]*""#, |lex| {
        let s = lex.slice();
        Some(s[1..s.len() - 1].to_string())
    })]
    Str(String),

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Identifier(String),

    // Operators and punctuation
    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Star,

    #[token("/")]
    Slash,

    #[token("^")]
    Caret,

    #[token("==")]
    EqEq,

    #[token(">")]
    Gt,

    #[token("->")]
    Arrow,

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

    #[token(",")]
    Comma,

    #[token(";")]
    Semicolon,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::OpenQasm => write!(f, "OPENQASM"),
            Token::Include => write!(f, "include"),
            Token::QReg => write!(f, "qreg"),
            Token::CReg => write!(f, "creg"),
            Token::Gate => write!(f, "gate"),
            Token::Opaque => write!(f, "opaque"),
            Token::Measure => write!(f, "measure"),
            Token::Reset => write!(f, "reset"),
            Token::Barrier => write!(f, "barrier"),
            Token::Snapshot => write!(f, "snapshot"),
            Token::Probabilities => write!(f, "show_probabilities"),
            Token::If => write!(f, "if"),
            Token::Pi => write!(f, "pi"),
            Token::GateU => write!(f, "U"),
            Token::GateCx => write!(f, "CX"),
            Token::Swap => write!(f, "swap"),
            Token::Sin => write!(f, "sin"),
            Token::Cos => write!(f, "cos"),
            Token::Tan => write!(f, "tan"),
            Token::Exp => write!(f, "exp"),
            Token::Ln => write!(f, "ln"),
            Token::Sqrt => write!(f, "sqrt"),
            Token::Real(v) => write!(f, "{v}"),
            Token::NnInteger(v) => write!(f, "{v}"),
            Token::Str(s) => write!(f, "\"{s}\""),
            Token::Identifier(s) => write!(f, "{s}"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Caret => write!(f, "^"),
            Token::EqEq => write!(f, "=="),
            Token::Gt => write!(f, ">"),
            Token::Arrow => write!(f, "->"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::Comma => write!(f, ","),
            Token::Semicolon => write!(f, ";"),
        }
    }
}

/// A token with its source position.
#[derive(Debug, Clone)]
pub struct SpannedToken {
    /// The token itself.
    pub token: Token,
    /// 1-based line.
    pub line: u32,
    /// 1-based column.
    pub col: u32,
}

/// Tokenize one source buffer, tracking line and column per token.
pub fn tokenize(source: &str) -> Result<Vec<SpannedToken>, crate::error::ParseError> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();

    // byte offsets of line starts, for line/column resolution
    let mut line_starts = vec![0usize];
    for (i, b) in source.bytes().enumerate() {
        if b == b'\n' {
            line_starts.push(i + 1);
        }
    }
    let locate = |offset: usize| -> (u32, u32) {
        let line = line_starts.partition_point(|s| *s <= offset);
        let col = offset - line_starts[line - 1] + 1;
        (line as u32, col as u32)
    };

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let (line, col) = locate(span.start);
        match result {
            Ok(token) => tokens.push(SpannedToken { token, line, col }),
            Err(()) => {
                return Err(crate::error::ParseError::Lex {
                    line,
                    col,
                    message: format!("unrecognised input '{}'", &source[span]),
                });
            }
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_tokens() {
        let tokens = tokenize("OPENQASM 2.0;").unwrap();
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].token, Token::OpenQasm);
        assert!(matches!(tokens[1].token, Token::Real(v) if (v - 2.0).abs() < 1e-9));
        assert_eq!(tokens[2].token, Token::Semicolon);
    }

    #[test]
    fn test_builtin_gates_not_identifiers() {
        let tokens = tokenize("U CX swap").unwrap();
        assert_eq!(tokens[0].token, Token::GateU);
        assert_eq!(tokens[1].token, Token::GateCx);
        assert_eq!(tokens[2].token, Token::Swap);
    }

    #[test]
    fn test_measure_arrow() {
        let tokens = tokenize("measure q -> c;").unwrap();
        assert_eq!(tokens[0].token, Token::Measure);
        assert!(matches!(tokens[1].token, Token::Identifier(ref s) if s == "q"));
        assert_eq!(tokens[2].token, Token::Arrow);
    }

    #[test]
    fn test_comments_skipped() {
        let tokens = tokenize("// i 2 1 0\nqreg q[3];").unwrap();
        assert_eq!(tokens[0].token, Token::QReg);
    }

    #[test]
    fn test_line_col_tracking() {
        let tokens = tokenize("qreg q[2];\ncreg c[2];").unwrap();
        let creg = tokens.iter().find(|t| t.token == Token::CReg).unwrap();
        assert_eq!(creg.line, 2);
        assert_eq!(creg.col, 1);
    }

    #[test]
    fn test_lex_error_position() {
        let err = tokenize("qreg q[2];\n  ?").unwrap_err();
        match err {
            crate::error::ParseError::Lex { line, col, .. } => {
                assert_eq!(line, 2);
                assert_eq!(col, 3);
            }
            other => panic!("expected lex error, got {other:?}"),
        }
    }

    #[test]
    fn test_numeric_payloads() {
        let tokens = tokenize("3 0.25 2e3").unwrap();
        assert!(matches!(tokens[0].token, Token::NnInteger(3)));
        assert!(matches!(tokens[1].token, Token::Real(v) if (v - 0.25).abs() < 1e-12));
        assert!(matches!(tokens[2].token, Token::Real(v) if (v - 2000.0).abs() < 1e-9));
    }
}
