use std::{fs, path::Path};

use anyhow::Context as _;
use rpds::{HashTrieMap, HashTrieSet};
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    ast::{Term, TermRef},
    lexer::{self, Token},
    numerals::{self, NumeralError},
    parser::{self, SyntaxError},
};

const PRELUDE: &str = include_str!("prelude.lam");

#[derive(Clone, PartialEq, Eq, Debug, Error)]
pub enum PreludeError {
    #[error("line {line}: expected `name = term`")]
    MissingEquals { line: usize },
    #[error("line {line}: `{name}` is not a valid name")]
    InvalidName { line: usize, name: String },
    #[error("line {line}: `{name}` is defined twice")]
    Duplicate { line: usize, name: String },
    #[error("line {line}: {source}")]
    Syntax { line: usize, source: SyntaxError },
    #[error("line {line}: {source}")]
    Numeral { line: usize, source: NumeralError },
}

/// Named definitions consulted for free variables during reduction.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Context {
    definitions: HashTrieMap<String, TermRef>,
    /// Names occurring free in some definition.
    free: HashTrieSet<String>,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    pub fn new() -> Self {
        Self {
            definitions: HashTrieMap::new(),
            free: HashTrieSet::new(),
        }
    }

    /// The bundled definitions: booleans, pairs and numeral arithmetic.
    pub fn prelude() -> Result<Self, PreludeError> {
        Self::parse_definitions(PRELUDE)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let source = fs::read_to_string(path)
            .with_context(|| format!("failed to read prelude {}", path.display()))?;
        let context = Self::parse_definitions(&source)
            .with_context(|| format!("failed to load prelude {}", path.display()))?;
        info!(path = %path.display(), definitions = context.len(), "loaded prelude");
        Ok(context)
    }

    /// Reads `name = term` lines. Blank lines and `#` comments are skipped,
    /// and a decimal right-hand side stands for its Church numeral.
    pub fn parse_definitions(source: &str) -> Result<Self, PreludeError> {
        let mut context = Self::new();
        for (index, text) in source.lines().enumerate() {
            let line = index + 1;
            let text = text.trim();
            if text.is_empty() || text.starts_with('#') {
                continue;
            }
            let (name, body) = text
                .split_once('=')
                .ok_or(PreludeError::MissingEquals { line })?;
            let name = parse_name(name.trim()).ok_or_else(|| PreludeError::InvalidName {
                line,
                name: name.trim().to_string(),
            })?;
            if context.contains(&name) {
                return Err(PreludeError::Duplicate { line, name });
            }
            let body = body.trim();
            let term = if body.starts_with(|c: char| c.is_ascii_digit() || c == '-') {
                numerals::parse_numeral(body)
                    .map_err(|source| PreludeError::Numeral { line, source })?
            } else {
                parser::parse_str(body).map_err(|source| PreludeError::Syntax { line, source })?
            };
            debug!(%name, "definition: {term:#}");
            context = context.insert(name, term);
        }
        Ok(context)
    }

    pub fn get(&self, name: &str) -> Option<&TermRef> {
        self.definitions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    /// A new context with `name` bound to `term`; `self` is left as is.
    pub fn insert(&self, name: impl Into<String>, term: TermRef) -> Self {
        let free = term
            .free_names()
            .iter()
            .fold(self.free.clone(), |free, x| free.insert(x.clone()));
        Self {
            definitions: self.definitions.insert(name.into(), term),
            free,
        }
    }

    /// Whether an unfolded definition may still mention `name` free, i.e.
    /// `name` occurs free in a definition and is not itself defined.
    pub fn leaks(&self, name: &str) -> bool {
        self.free.contains(name) && !self.contains(name)
    }

    pub fn len(&self) -> usize {
        self.definitions.size()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TermRef)> {
        self.definitions
            .iter()
            .map(|(name, term)| (name.as_str(), term))
    }

    /// The name whose definition is structurally equal to `term`. The smallest
    /// name wins when several definitions coincide.
    pub fn name_of(&self, term: &Term) -> Option<&str> {
        self.iter()
            .filter(|&(_, definition)| **definition == *term)
            .map(|(name, _)| name)
            .min()
    }
}

impl FromIterator<(String, TermRef)> for Context {
    fn from_iter<I: IntoIterator<Item = (String, TermRef)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |context, (name, term)| context.insert(name, term))
    }
}

fn parse_name(text: &str) -> Option<String> {
    let mut tokens = lexer::lex(text);
    match (tokens.next(), tokens.next()) {
        (Some(Ok(Token::Name(name))), None) => Some(name),
        _ => None,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        ast::{lambda, var},
        lexer::TokenKind,
        parser::ParseError,
    };

    #[test]
    fn test_prelude() {
        let context = Context::prelude().unwrap();
        assert_eq!(context.len(), 10);
        assert_eq!(
            context.get("true"),
            Some(&lambda!("t", lambda!("f", var!("t"))))
        );
        for name in [
            "true", "false", "and", "pair", "first", "second", "zero", "succ", "plus", "times",
        ] {
            assert!(context.contains(name), "{name}");
        }
        assert_eq!(context.name_of(&numerals::to_numeral(0)), Some("zero"));
        assert_eq!(context.name_of(&var!("x")), None);
    }

    #[test]
    fn test_parse_definitions() {
        let context = Context::parse_definitions(
            "# comment\n\n  id = \\x.x  \nthree = 3\nk = \\x.\\y.x\n",
        )
        .unwrap();
        assert_eq!(context.len(), 3);
        assert_eq!(context.get("id"), Some(&lambda!("x", var!("x"))));
        assert_eq!(context.get("three"), Some(&numerals::to_numeral(3)));
    }

    #[test]
    fn test_parse_definitions_errors() {
        assert_eq!(
            Context::parse_definitions("id \\x.x"),
            Err(PreludeError::MissingEquals { line: 1 })
        );
        assert_eq!(
            Context::parse_definitions("\nfoo bar = x"),
            Err(PreludeError::InvalidName {
                line: 2,
                name: "foo bar".to_string()
            })
        );
        assert_eq!(
            Context::parse_definitions("a = x\na = y"),
            Err(PreludeError::Duplicate {
                line: 2,
                name: "a".to_string()
            })
        );
        assert_eq!(
            Context::parse_definitions("a = (x"),
            Err(PreludeError::Syntax {
                line: 1,
                source: SyntaxError::Parse(ParseError::UnexpectedEnd {
                    expected: TokenKind::RightParen
                })
            })
        );
        assert_eq!(
            Context::parse_definitions("a = -2")
                .unwrap_err()
                .to_string(),
            "line 1: Invalid numeral: -2 is less than zero"
        );
    }

    #[test]
    fn test_leaks() {
        let context = Context::prelude().unwrap();
        assert!(["true", "false", "zero", "plus", "x"]
            .iter()
            .all(|name| !context.leaks(name)));
        let open = Context::parse_definitions("k = \\a.y\nloop = loop").unwrap();
        assert!(open.leaks("y"));
        assert!(!open.leaks("a"));
        assert!(!open.leaks("loop"));
    }

    #[test]
    fn test_insert_is_persistent() {
        let empty = Context::new();
        let one = empty.insert("id", lambda!("x", var!("x")));
        assert!(empty.is_empty());
        assert_eq!(one.len(), 1);
        let collected = [("id".to_string(), lambda!("x", var!("x")))]
            .into_iter()
            .collect::<Context>();
        assert_eq!(collected, one);
    }
}
