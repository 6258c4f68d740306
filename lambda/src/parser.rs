//! Recursive descent parser over a queue of tokens.
//!
//! ```text
//! Term        -> Abstraction
//! Abstraction -> '\' Name '.' Abstraction | Application
//! Application -> Atom Atom*
//! Atom        -> '(' Term ')' | Name
//! ```

use std::collections::VecDeque;

use thiserror::Error;

use crate::{
    ast::{Term, TermRef},
    lexer::{self, LexicalError, Token, TokenKind},
};

#[derive(Clone, PartialEq, Eq, Debug, Error)]
pub enum ParseError {
    #[error("expected {expected}, got {found}")]
    Unexpected {
        expected: TokenKind,
        found: TokenKind,
    },
    #[error("expected {expected}, got end of input")]
    UnexpectedEnd { expected: TokenKind },
    #[error("tokens remaining after parsing")]
    TokensRemaining,
}
pub type Result<T> = std::result::Result<T, ParseError>;

/// Failure of either front-end stage on a whole string.
#[derive(Clone, PartialEq, Eq, Debug, Error)]
pub enum SyntaxError {
    #[error("lex error: {0}")]
    Lexical(#[from] LexicalError),
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
}

fn expect(tokens: &mut VecDeque<Token>, expected: TokenKind) -> Result<Token> {
    match tokens.pop_front() {
        Some(token) if token.kind() == expected => Ok(token),
        Some(token) => Err(ParseError::Unexpected {
            expected,
            found: token.kind(),
        }),
        None => Err(ParseError::UnexpectedEnd { expected }),
    }
}

fn parse_name(tokens: &mut VecDeque<Token>) -> Result<String> {
    match tokens.pop_front() {
        Some(Token::Name(name)) => Ok(name),
        Some(token) => Err(ParseError::Unexpected {
            expected: TokenKind::Name,
            found: token.kind(),
        }),
        None => Err(ParseError::UnexpectedEnd {
            expected: TokenKind::Name,
        }),
    }
}

fn starts_atom(token: Option<&Token>) -> bool {
    matches!(token, Some(Token::LParen | Token::Name(_)))
}

fn parse_atom(tokens: &mut VecDeque<Token>) -> Result<TermRef> {
    if let Some(Token::LParen) = tokens.front() {
        tokens.pop_front();
        let term = parse_term(tokens)?;
        expect(tokens, TokenKind::RightParen)?;
        Ok(term)
    } else {
        Ok(Term::var(parse_name(tokens)?))
    }
}

fn parse_application(tokens: &mut VecDeque<Token>) -> Result<TermRef> {
    let mut term = parse_atom(tokens)?;
    while starts_atom(tokens.front()) {
        let rhs = parse_atom(tokens)?;
        term = Term::apply(term, rhs);
    }
    Ok(term)
}

fn parse_abstraction(tokens: &mut VecDeque<Token>) -> Result<TermRef> {
    if let Some(Token::Lambda) = tokens.front() {
        tokens.pop_front();
        let name = parse_name(tokens)?;
        expect(tokens, TokenKind::Dot)?;
        let body = parse_abstraction(tokens)?;
        Ok(Term::abs(name, body))
    } else {
        parse_application(tokens)
    }
}

fn parse_term(tokens: &mut VecDeque<Token>) -> Result<TermRef> {
    parse_abstraction(tokens)
}

/// Parses a whole queue; leftover tokens are an error.
pub fn parse(mut tokens: VecDeque<Token>) -> Result<TermRef> {
    let term = parse_term(&mut tokens)?;
    if tokens.is_empty() {
        Ok(term)
    } else {
        Err(ParseError::TokensRemaining)
    }
}

pub fn parse_str(input: &str) -> std::result::Result<TermRef, SyntaxError> {
    let tokens = lexer::lex(input).collect::<std::result::Result<VecDeque<_>, _>>()?;
    Ok(parse(tokens)?)
}

/// Parsing stage of the REPL pipeline.
#[derive(Clone, Copy, Default, Debug)]
pub struct LambdaParser;

impl util::pipeline::Parser<Token> for LambdaParser {
    type Term = TermRef;
    type Error = ParseError;

    fn parse(&self, tokens: VecDeque<Token>) -> Result<TermRef> {
        parse(tokens)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ast::{apply, lambda, var};

    #[test]
    fn test_parse() {
        assert_eq!(parse_str("x").unwrap(), var!("x"));
        assert_eq!(parse_str("\\x.x").unwrap(), lambda!("x", var!("x")));
        assert_eq!(parse_str("(x y)").unwrap(), apply!(var!("x"), var!("y")));
        assert_eq!(parse_str("((x))").unwrap(), var!("x"));
    }

    #[test]
    fn test_associativity() {
        assert_eq!(
            parse_str("a b c").unwrap(),
            apply!(apply!(var!("a"), var!("b")), var!("c"))
        );
        assert_eq!(
            parse_str("a (b c)").unwrap(),
            apply!(var!("a"), apply!(var!("b"), var!("c")))
        );
        assert_eq!(
            parse_str("\\x.\\y.x y").unwrap(),
            lambda!("x", lambda!("y", apply!(var!("x"), var!("y"))))
        );
        assert_eq!(
            parse_str("(\\x.x) y").unwrap(),
            apply!(lambda!("x", var!("x")), var!("y"))
        );
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            parse_str("(x"),
            Err(SyntaxError::Parse(ParseError::UnexpectedEnd {
                expected: TokenKind::RightParen
            }))
        );
        assert_eq!(
            parse_str("x )"),
            Err(SyntaxError::Parse(ParseError::TokensRemaining))
        );
        assert_eq!(
            parse_str("\\x x").unwrap_err().to_string(),
            "parse error: expected DOT, got NAME"
        );
        assert_eq!(
            parse_str("\\.x").unwrap_err().to_string(),
            "parse error: expected NAME, got DOT"
        );
        assert_eq!(
            parse(VecDeque::new()),
            Err(ParseError::UnexpectedEnd {
                expected: TokenKind::Name
            })
        );
        assert!(matches!(parse_str("x $"), Err(SyntaxError::Lexical(_))));
    }

    #[test]
    fn test_display_parses_back() {
        for input in [
            "(\\x.x x) (\\y.y)",
            "\\f.\\s.\\b.b f s",
            "a (\\x.x) (b c) d",
        ] {
            let term = parse_str(input).unwrap();
            assert_eq!(parse_str(&format!("{term:#}")).unwrap(), term);
        }
    }
}
