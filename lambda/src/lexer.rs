use lexgen::lexer;
use thiserror::Error;

pub type Loc = lexgen_util::Loc;
pub type LexerError = lexgen_util::LexerError<LexicalError>;

#[derive(Clone, Copy, PartialEq, Eq, Hash, derive_more::Display, Debug)]
pub enum TokenKind {
    #[display(fmt = "LEFT_PAREN")]
    LeftParen,
    #[display(fmt = "RIGHT_PAREN")]
    RightParen,
    #[display(fmt = "LAMBDA")]
    Lambda,
    #[display(fmt = "DOT")]
    Dot,
    #[display(fmt = "NAME")]
    Name,
}

#[derive(Clone, PartialEq, Eq, derive_more::Display, Debug)]
pub enum Token {
    #[display(fmt = "(")]
    LParen,
    #[display(fmt = ")")]
    RParen,
    #[display(fmt = "\\")]
    Lambda,
    #[display(fmt = ".")]
    Dot,
    #[display(fmt = "{_0}")]
    Name(String),
}

impl Token {
    pub fn kind(&self) -> TokenKind {
        match self {
            Token::LParen => TokenKind::LeftParen,
            Token::RParen => TokenKind::RightParen,
            Token::Lambda => TokenKind::Lambda,
            Token::Dot => TokenKind::Dot,
            Token::Name(_) => TokenKind::Name,
        }
    }

    /// The literal text this token was matched from.
    pub fn text(&self) -> &str {
        match self {
            Token::LParen => "(",
            Token::RParen => ")",
            Token::Lambda => "\\",
            Token::Dot => ".",
            Token::Name(name) => name,
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Error)]
pub enum LexicalError {
    #[error("Unable to match token: {text}")]
    Unmatched { text: String, offset: usize },
}

lexer! {
    pub Lexer -> Token;
    type Error = LexicalError;
    let ws = [' '];
    let alpha = ['a'-'z' 'A'-'Z'];

    $ws,
    "(" = Token::LParen,
    ")" = Token::RParen,
    "\\" = Token::Lambda,
    "." = Token::Dot,
    $alpha+ => |lexer| lexer.return_(Token::Name(lexer.match_().to_string())),
}

/// Pull-based tokens of a single line. Ends after the first error.
pub struct TokenStream<'input, I> {
    input: &'input str,
    inner: I,
    finished: bool,
}

pub fn lex(
    input: &str,
) -> TokenStream<'_, impl Iterator<Item = Result<(Loc, Token, Loc), LexerError>> + '_> {
    TokenStream {
        input,
        inner: Lexer::new(input),
        finished: false,
    }
}

impl<'input, I> TokenStream<'input, I> {
    fn convert_error(&self, e: LexerError) -> LexicalError {
        let offset = e.location.byte_idx;
        match e.kind {
            lexgen_util::LexerErrorKind::Custom(e) => e,
            lexgen_util::LexerErrorKind::InvalidToken => {
                let text = self
                    .input
                    .get(offset..)
                    .and_then(|rest| rest.chars().next())
                    .map(String::from)
                    .unwrap_or_default();
                LexicalError::Unmatched { text, offset }
            }
        }
    }
}

impl<'input, I> Iterator for TokenStream<'input, I>
where
    I: Iterator<Item = Result<(Loc, Token, Loc), LexerError>>,
{
    type Item = Result<Token, LexicalError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.inner.next() {
            Some(Ok((_, token, _))) => Some(Ok(token)),
            Some(Err(e)) => {
                self.finished = true;
                Some(Err(self.convert_error(e)))
            }
            None => {
                self.finished = true;
                None
            }
        }
    }
}

/// Lexing stage of the REPL pipeline.
#[derive(Clone, Copy, Default, Debug)]
pub struct LambdaLexer;

impl util::pipeline::Lexer for LambdaLexer {
    type Token = Token;
    type Error = LexicalError;

    fn lex<'i>(&self, line: &'i str) -> impl Iterator<Item = Result<Token, LexicalError>> + 'i {
        lex(line)
    }
}

#[cfg(test)]
mod test {
    use super::{Token::*, *};

    fn tokens(input: &str) -> Result<Vec<Token>, LexicalError> {
        lex(input).collect()
    }

    #[test]
    fn test_tokens() {
        assert_eq!(tokens("").unwrap(), vec![]);
        assert_eq!(tokens("   ").unwrap(), vec![]);
        assert_eq!(
            tokens("\\x.x").unwrap(),
            vec![Lambda, Name("x".into()), Dot, Name("x".into())]
        );
        assert_eq!(
            tokens("(foo  Bar)").unwrap(),
            vec![
                LParen,
                Name("foo".into()),
                Name("Bar".into()),
                RParen
            ]
        );
    }

    #[test]
    fn test_kind_and_text() {
        let all = tokens("( ) \\ . abc").unwrap();
        let kinds = all.iter().map(Token::kind).collect::<Vec<_>>();
        assert_eq!(
            kinds,
            vec![
                TokenKind::LeftParen,
                TokenKind::RightParen,
                TokenKind::Lambda,
                TokenKind::Dot,
                TokenKind::Name
            ]
        );
        let texts = all.iter().map(Token::text).collect::<Vec<_>>();
        assert_eq!(texts, vec!["(", ")", "\\", ".", "abc"]);
        assert_eq!(TokenKind::RightParen.to_string(), "RIGHT_PAREN");
    }

    #[test]
    fn test_error() {
        assert_eq!(
            tokens("#"),
            Err(LexicalError::Unmatched {
                text: "#".into(),
                offset: 0
            })
        );
        let mut stream = lex("x 1 y");
        assert_eq!(stream.next(), Some(Ok(Name("x".into()))));
        let err = stream.next().unwrap().unwrap_err();
        assert_eq!(err.to_string(), "Unable to match token: 1");
        // the rest of the line is dropped
        assert_eq!(stream.next(), None);
    }
}
