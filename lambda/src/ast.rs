use std::rc::Rc;

use rpds::HashTrieSet;

pub type TermRef = Rc<Term>;

#[derive(PartialEq, Eq, Debug)]
pub enum Term {
    /// `x`
    Var(String),
    /// `\x.t`
    Abs(String, TermRef),
    /// `t t`
    Apply(TermRef, TermRef),
}

impl Term {
    pub fn var(name: impl Into<String>) -> TermRef {
        Rc::new(Term::Var(name.into()))
    }

    pub fn abs(name: impl Into<String>, body: TermRef) -> TermRef {
        Rc::new(Term::Abs(name.into(), body))
    }

    pub fn apply(lhs: TermRef, rhs: TermRef) -> TermRef {
        Rc::new(Term::Apply(lhs, rhs))
    }

    pub fn is_abs(&self) -> bool {
        matches!(self, Term::Abs(_, _))
    }

    /// Whether `name` occurs free somewhere in this term.
    pub fn occurs_free(&self, name: &str) -> bool {
        match self {
            Term::Var(x) => x == name,
            Term::Abs(x, body) => x != name && body.occurs_free(name),
            Term::Apply(lhs, rhs) => lhs.occurs_free(name) || rhs.occurs_free(name),
        }
    }

    pub fn free_names(&self) -> HashTrieSet<String> {
        fn collect(term: &Term, bound: &HashTrieSet<String>, free: &mut HashTrieSet<String>) {
            match term {
                Term::Var(x) if !bound.contains(x) => free.insert_mut(x.clone()),
                Term::Var(_) => {}
                Term::Abs(x, body) => collect(body, &bound.insert(x.clone()), free),
                Term::Apply(lhs, rhs) => {
                    collect(lhs, bound, free);
                    collect(rhs, bound, free);
                }
            }
        }
        let mut free = HashTrieSet::new();
        collect(self, &HashTrieSet::new(), &mut free);
        free
    }
}

/// `{}` prints the bare form (`\x.body`, `lhs rhs`) without re-inserting parentheses.
/// `{:#}` adds the parentheses needed to read the term back in.
impl std::fmt::Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn fmt_parenthesized(term: &Term, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            use Term::*;
            match term {
                Var(x) => f.write_str(x),
                Abs(x, body) => {
                    f.write_str("\\")?;
                    f.write_str(x)?;
                    f.write_str(".")?;
                    fmt_parenthesized(body, f)
                }
                Apply(lhs, rhs) => {
                    if lhs.is_abs() {
                        f.write_str("(")?;
                        fmt_parenthesized(lhs, f)?;
                        f.write_str(")")?;
                    } else {
                        fmt_parenthesized(lhs, f)?;
                    }
                    f.write_str(" ")?;
                    if matches!(rhs.as_ref(), Var(_)) {
                        fmt_parenthesized(rhs, f)
                    } else {
                        f.write_str("(")?;
                        fmt_parenthesized(rhs, f)?;
                        f.write_str(")")
                    }
                }
            }
        }
        if f.alternate() {
            return fmt_parenthesized(self, f);
        }
        match self {
            Term::Var(x) => f.write_str(x),
            Term::Abs(x, body) => f.write_fmt(format_args!("\\{x}.{body}")),
            Term::Apply(lhs, rhs) => f.write_fmt(format_args!("{lhs} {rhs}")),
        }
    }
}

#[cfg(test)]
macro_rules! var {
    ($x:expr) => {
        $crate::ast::Term::var($x)
    };
}
#[cfg(test)]
macro_rules! lambda {
    ($x:expr, $body:expr) => {
        $crate::ast::Term::abs($x, $body)
    };
}
#[cfg(test)]
macro_rules! apply {
    ($lhs:expr, $rhs:expr) => {
        $crate::ast::Term::apply($lhs, $rhs)
    };
}
#[cfg(test)]
pub(crate) use {apply, lambda, var};

#[cfg(test)]
mod test {
    use super::*;
    use crate::parser::parse_str;

    #[test]
    fn test_equality() {
        let a = lambda!("x", apply!(var!("x"), var!("y")));
        let b = lambda!("x", apply!(var!("x"), var!("y")));
        let c = lambda!("z", apply!(var!("z"), var!("y")));
        assert!(!Rc::ptr_eq(&a, &b));
        assert_eq!(a, b);
        assert_eq!(b, a);
        assert_eq!(a, a.clone());
        // no alpha-equivalence at this level
        assert_ne!(a, c);
        assert_ne!(var!("x"), lambda!("x", var!("x")));
    }

    #[test]
    fn test_parsed_equality() {
        for input in ["x", "\\x.x", "a b c", "\\x.\\y.x (y y)", "(\\t.\\f.t) u"] {
            assert_eq!(parse_str(input).unwrap(), parse_str(input).unwrap(), "{input}");
        }
        let a = parse_str("\\s.\\z.s z").unwrap();
        let b = parse_str("\\s.\\z.(s z)").unwrap();
        let c = lambda!("s", lambda!("z", apply!(var!("s"), var!("z"))));
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(a, c);
        assert_ne!(parse_str("a b c").unwrap(), parse_str("a (b c)").unwrap());
    }

    #[test]
    fn test_occurs_free() {
        let t = apply!(lambda!("x", var!("x")), var!("x"));
        assert!(t.occurs_free("x"));
        assert!(!lambda!("x", var!("x")).occurs_free("x"));
        assert!(lambda!("x", var!("y")).occurs_free("y"));
        assert!(!var!("y").occurs_free("x"));
    }

    #[test]
    fn test_free_names() {
        let t = apply!(lambda!("x", apply!(var!("x"), var!("y"))), var!("z"));
        let mut names = t.free_names().iter().cloned().collect::<Vec<_>>();
        names.sort();
        assert_eq!(names, vec!["y", "z"]);
        assert!(lambda!("x", var!("x")).free_names().is_empty());
    }

    #[test]
    fn test_display() {
        let t = apply!(lambda!("x", var!("x")), apply!(var!("a"), var!("b")));
        assert_eq!(t.to_string(), "\\x.x a b");
        assert_eq!(format!("{t:#}"), "(\\x.x) (a b)");

        let t = apply!(apply!(var!("a"), lambda!("y", var!("y"))), var!("b"));
        assert_eq!(format!("{t:#}"), "a (\\y.y) b");
        assert_eq!(
            format!("{:#}", lambda!("s", lambda!("z", var!("z")))),
            "\\s.\\z.z"
        );
    }
}
