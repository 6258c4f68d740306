use std::convert::Infallible;

use rpds::HashTrieSet;
use thiserror::Error;
use tracing::trace;

use crate::{
    ast::{Term, TermRef},
    context::Context,
    numerals,
};

#[derive(Clone, PartialEq, Eq, Debug, Error)]
pub enum EvalError {
    #[error("could not reduce term to value: {0}")]
    NotAValue(TermRef),
    #[error("reduction did not converge within {0} steps")]
    DidNotConverge(usize),
}
pub type Result<T> = std::result::Result<T, EvalError>;

fn fresh_name(name: &str, taken: impl Fn(&str) -> bool) -> String {
    let mut fresh = format!("{name}'");
    while taken(&fresh) {
        fresh.push('\'');
    }
    fresh
}

/// `term[target := replacement]`, renaming binders that would capture a free
/// variable of `replacement`.
pub fn substitute(target: &str, replacement: &TermRef, term: &TermRef) -> TermRef {
    use Term::*;
    match term.as_ref() {
        Var(x) if x == target => replacement.clone(),
        Var(_) => term.clone(),
        Abs(x, _) if x == target => term.clone(),
        Abs(x, body) if replacement.occurs_free(x) && body.occurs_free(target) => {
            let fresh = fresh_name(x, |name| {
                replacement.occurs_free(name) || body.occurs_free(name)
            });
            let renamed = substitute(x, &Term::var(fresh.as_str()), body);
            Term::abs(fresh, substitute(target, replacement, &renamed))
        }
        Abs(x, body) => Term::abs(x.as_str(), substitute(target, replacement, body)),
        Apply(lhs, rhs) => Term::apply(
            substitute(target, replacement, lhs),
            substitute(target, replacement, rhs),
        ),
    }
}

trait Fuel {
    type Error;
    fn burn(&mut self) -> std::result::Result<(), Self::Error>;
}

struct Unlimited;

impl Fuel for Unlimited {
    type Error = Infallible;
    fn burn(&mut self) -> std::result::Result<(), Infallible> {
        Ok(())
    }
}

struct Limited {
    limit: usize,
    used: usize,
}

impl Fuel for Limited {
    type Error = EvalError;
    fn burn(&mut self) -> Result<()> {
        if self.used == self.limit {
            return Err(EvalError::DidNotConverge(self.limit));
        }
        self.used += 1;
        Ok(())
    }
}

struct Reduction<'c, F> {
    context: &'c Context,
    fuel: F,
}

impl<'c, F: Fuel> Reduction<'c, F> {
    fn new(context: &'c Context, fuel: F) -> Self {
        Self { context, fuel }
    }

    /// Leftmost-outermost reduction. Names in `bound` are binders of an
    /// enclosing abstraction and hide context entries of the same name.
    fn reduce(
        &mut self,
        term: &TermRef,
        bound: &HashTrieSet<String>,
    ) -> std::result::Result<TermRef, F::Error> {
        use Term::*;
        Ok(match term.as_ref() {
            Var(x) if !bound.contains(x) => {
                let context = self.context;
                match context.get(x) {
                    Some(definition) => {
                        self.fuel.burn()?;
                        self.reduce(definition, &HashTrieSet::new())?
                    }
                    None => term.clone(),
                }
            }
            Var(_) => term.clone(),
            // an unfolded definition would be captured by this binder
            Abs(x, body) if self.context.leaks(x) => {
                let context = self.context;
                let fresh = fresh_name(x, |name| body.occurs_free(name) || context.leaks(name));
                let body = substitute(x, &Term::var(fresh.as_str()), body);
                let body = self.reduce(&body, &bound.insert(fresh.clone()))?;
                Term::abs(fresh, body)
            }
            Abs(x, body) => Term::abs(x.as_str(), self.reduce(body, &bound.insert(x.clone()))?),
            Apply(lhs, rhs) => {
                let lhs = self.reduce(lhs, bound)?;
                if let Abs(x, body) = lhs.as_ref() {
                    self.fuel.burn()?;
                    let contractum = substitute(x, rhs, body);
                    trace!("beta: ({lhs:#}) ({rhs:#}) -> {contractum:#}");
                    self.reduce(&contractum, bound)?
                } else {
                    Term::apply(lhs.clone(), self.reduce(rhs, bound)?)
                }
            }
        })
    }

    fn normalize(&mut self, term: &TermRef) -> std::result::Result<TermRef, F::Error> {
        self.reduce(term, &HashTrieSet::new())
    }
}

/// Reduces `term` to normal form. Diverges on terms without one.
pub fn reduce(term: &TermRef, context: &Context) -> TermRef {
    match Reduction::new(context, Unlimited).normalize(term) {
        Ok(normal) => normal,
        Err(never) => match never {},
    }
}

/// Like [`reduce`], but fails once more than `limit` steps were taken. Beta
/// steps and unfoldings of context definitions both count.
pub fn reduce_bounded(term: &TermRef, context: &Context, limit: usize) -> Result<TermRef> {
    Reduction::new(context, Limited { limit, used: 0 }).normalize(term)
}

/// A normal form that is an abstraction.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Value {
    term: TermRef,
    folded: Option<TermRef>,
}

impl Value {
    fn new(normal: TermRef) -> Result<Self> {
        if normal.is_abs() {
            Ok(Self {
                term: normal,
                folded: None,
            })
        } else {
            Err(EvalError::NotAValue(normal))
        }
    }

    pub fn term(&self) -> &TermRef {
        &self.term
    }

    /// Displays as the term folded into context names and numerals.
    pub fn folded(self, context: &Context) -> Self {
        let folded = fold_with(&self.term, &|term: &Term| {
            context
                .name_of(term)
                .map(str::to_string)
                .or_else(|| numerals::from_numeral(term).map(|n| n.to_string()))
        });
        Self {
            folded: Some(folded),
            ..self
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(self.folded.as_ref().unwrap_or(&self.term), f)
    }
}

pub fn evaluate(term: &TermRef, context: &Context) -> Result<Value> {
    Value::new(reduce(term, context))
}

pub fn evaluate_bounded(term: &TermRef, context: &Context, limit: usize) -> Result<Value> {
    Value::new(reduce_bounded(term, context, limit)?)
}

/// Top-down rewrite: the outermost subterm `name_of` recognises becomes a variable.
fn fold_with(term: &TermRef, name_of: &impl Fn(&Term) -> Option<String>) -> TermRef {
    use Term::*;
    if let Some(name) = name_of(term.as_ref()) {
        return Term::var(name);
    }
    match term.as_ref() {
        Var(_) => term.clone(),
        Abs(x, body) => Term::abs(x.as_str(), fold_with(body, name_of)),
        Apply(lhs, rhs) => Term::apply(fold_with(lhs, name_of), fold_with(rhs, name_of)),
    }
}

/// Replaces subterms equal to a context definition with the definition's name.
pub fn contract(term: &TermRef, context: &Context) -> TermRef {
    fold_with(term, &|term: &Term| context.name_of(term).map(str::to_string))
}

/// Evaluation stage of the REPL pipeline.
#[derive(Clone, Copy, Default, Debug)]
pub struct Reducer {
    /// Step bound per evaluation; `None` reduces without limit.
    pub fuel: Option<usize>,
    pub contract: bool,
}

impl util::pipeline::Evaluator<TermRef> for Reducer {
    type Context = Context;
    type Value = Value;
    type Error = EvalError;

    fn evaluate(&self, term: TermRef, context: &Context) -> Result<Value> {
        let value = match self.fuel {
            Some(limit) => evaluate_bounded(&term, context, limit)?,
            None => evaluate(&term, context)?,
        };
        Ok(if self.contract {
            value.folded(context)
        } else {
            value
        })
    }
}
