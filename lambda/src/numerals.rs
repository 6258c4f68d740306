//! Church numerals: `n` is `\s.\z.s (s (... z))` with `n` applications of `s`.

use thiserror::Error;

use crate::ast::{Term, TermRef};

#[derive(Clone, PartialEq, Eq, Debug, Error)]
pub enum NumeralError {
    #[error("Unable to parse {0} as numeral")]
    Invalid(String),
    #[error("Invalid numeral: {0} is less than zero")]
    Negative(i64),
}

pub fn to_numeral(n: u64) -> TermRef {
    let body = (0..n).fold(Term::var("z"), |body, _| Term::apply(Term::var("s"), body));
    Term::abs("s", Term::abs("z", body))
}

pub fn from_numeral(term: &Term) -> Option<u64> {
    let Term::Abs(s, body) = term else {
        return None;
    };
    let Term::Abs(z, body) = body.as_ref() else {
        return None;
    };
    let mut body = body;
    let mut count = 0;
    loop {
        match body.as_ref() {
            Term::Var(x) if x == z => return Some(count),
            // with `s == z` the inner binder hides `s`
            Term::Apply(f, arg) if s != z && matches!(f.as_ref(), Term::Var(x) if x == s) => {
                count += 1;
                body = arg;
            }
            _ => return None,
        }
    }
}

/// The numeral's decimal text as a variable, or `term` itself.
pub fn contract_numeral(term: &TermRef) -> TermRef {
    match from_numeral(term) {
        Some(n) => Term::var(n.to_string()),
        None => term.clone(),
    }
}

pub fn parse_numeral(text: &str) -> Result<TermRef, NumeralError> {
    let n = text
        .parse::<i64>()
        .map_err(|_| NumeralError::Invalid(text.to_string()))?;
    let n = u64::try_from(n).map_err(|_| NumeralError::Negative(n))?;
    Ok(to_numeral(n))
}
