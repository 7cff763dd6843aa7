//! Capability binder.
//!
//! Content is written either as `fn(&T) -> R` or as
//! `fn(&T, &[f64]) -> R`; the author says which by picking a [`Signature`]
//! variant at registration time. Binding captures the configured
//! parameter list and yields one uniform closure shape.

use std::fmt;
use std::sync::Arc;

use crate::error::ParameterError;

/// A parameter-bound predicate or extractor over one object type.
pub type Bound<T, R> = Arc<dyn Fn(&T) -> R + Send + Sync>;

/// An unbound function assembled at registration time from another
/// signature.
pub type Derived<T, R> = Arc<dyn Fn(&T, &[f64]) -> R + Send + Sync>;

/// Parameter counts a parameterized function accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    AnyOf(&'static [usize]),
    AtLeast(usize),
    Any,
}

impl Arity {
    pub fn admits(self, count: usize) -> bool {
        match self {
            Arity::Exactly(n) => count == n,
            Arity::AnyOf(allowed) => allowed.contains(&count),
            Arity::AtLeast(n) => count >= n,
            Arity::Any => true,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exactly(n) => write!(f, "{n}"),
            Arity::AnyOf(allowed) => {
                let rendered: Vec<String> = allowed.iter().map(usize::to_string).collect();
                write!(f, "{}", rendered.join(" or "))
            }
            Arity::AtLeast(n) => write!(f, "at least {n}"),
            Arity::Any => write!(f, "any number of"),
        }
    }
}

/// A registered raw function together with its parameter capability.
pub enum Signature<T, R> {
    Plain(fn(&T) -> R),
    Parameterized(Arity, fn(&T, &[f64]) -> R),
    /// Already bound; accepts no further parameters. Used for content
    /// assembled at configuration time.
    Bound(Bound<T, R>),
    Derived(Arity, Derived<T, R>),
}

impl<T, R> Signature<T, R> {
    pub fn plain(call: fn(&T) -> R) -> Self {
        Signature::Plain(call)
    }

    pub fn parameterized(arity: Arity, call: fn(&T, &[f64]) -> R) -> Self {
        Signature::Parameterized(arity, call)
    }

    pub fn arity(&self) -> Arity {
        match self {
            Signature::Plain(_) | Signature::Bound(_) => Arity::Exactly(0),
            Signature::Parameterized(arity, _) | Signature::Derived(arity, _) => *arity,
        }
    }
}

impl<T: 'static, R: 'static> Signature<T, R> {
    /// Captures `parameters` and returns the uniform closure. The count is
    /// checked here so a malformed configuration fails before any spill is
    /// read.
    pub fn bind(&self, name: &str, parameters: &[f64]) -> Result<Bound<T, R>, ParameterError> {
        let arity = self.arity();
        if !arity.admits(parameters.len()) {
            return Err(ParameterError::Arity {
                name: name.to_string(),
                expected: arity,
                got: parameters.len(),
            });
        }
        Ok(match self {
            Signature::Plain(call) => {
                let call = *call;
                Arc::new(move |object: &T| call(object))
            }
            Signature::Parameterized(_, call) => {
                let call = *call;
                let parameters = parameters.to_vec();
                Arc::new(move |object: &T| call(object, &parameters))
            }
            Signature::Bound(bound) => Arc::clone(bound),
            Signature::Derived(_, call) => {
                let call = Arc::clone(call);
                let parameters = parameters.to_vec();
                Arc::new(move |object: &T| call(object, &parameters))
            }
        })
    }
}

fn flag(pass: bool) -> f64 {
    if pass { 1.0 } else { 0.0 }
}

impl<T: 'static> Signature<T, bool> {
    /// The predicate read as a 0/1 variable. Parameter capability is kept.
    pub fn to_flag(&self) -> Signature<T, f64> {
        match self {
            Signature::Plain(call) => {
                let call = *call;
                Signature::Derived(
                    Arity::Exactly(0),
                    Arc::new(move |object: &T, _: &[f64]| flag(call(object))),
                )
            }
            Signature::Parameterized(arity, call) => {
                let call = *call;
                Signature::Derived(
                    *arity,
                    Arc::new(move |object: &T, parameters: &[f64]| flag(call(object, parameters))),
                )
            }
            Signature::Bound(bound) => {
                let bound = Arc::clone(bound);
                Signature::Bound(Arc::new(move |object: &T| flag(bound(object))))
            }
            Signature::Derived(arity, call) => {
                let call = Arc::clone(call);
                Signature::Derived(
                    *arity,
                    Arc::new(move |object: &T, parameters: &[f64]| flag(call(object, parameters))),
                )
            }
        }
    }
}

impl<T, R> Clone for Signature<T, R> {
    fn clone(&self) -> Self {
        match self {
            Signature::Plain(call) => Signature::Plain(*call),
            Signature::Parameterized(arity, call) => Signature::Parameterized(*arity, *call),
            Signature::Bound(bound) => Signature::Bound(Arc::clone(bound)),
            Signature::Derived(arity, call) => Signature::Derived(*arity, Arc::clone(call)),
        }
    }
}

impl<T, R> fmt::Debug for Signature<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signature::Plain(_) => f.write_str("Signature::Plain"),
            Signature::Parameterized(arity, _) => write!(f, "Signature::Parameterized({arity})"),
            Signature::Bound(_) => f.write_str("Signature::Bound"),
            Signature::Derived(arity, _) => write!(f, "Signature::Derived({arity})"),
        }
    }
}

/// Logical negation of a bound predicate.
pub fn negate<T: 'static>(cut: Bound<T, bool>) -> Bound<T, bool> {
    Arc::new(move |object: &T| !cut(object))
}

/// Short-circuit conjunction in declared order; empty means always true.
pub fn all_of<T: 'static>(cuts: Vec<Bound<T, bool>>) -> Bound<T, bool> {
    Arc::new(move |object: &T| cuts.iter().all(|cut| cut(object)))
}
