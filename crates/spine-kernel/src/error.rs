//! Error types for registration, binding, and branch compilation.
//!
//! Data-shape anomalies are not errors: they resolve to the NaN sentinel
//! inside content and never surface here.

use crate::bind::Arity;

/// Failures of the name-keyed registries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// A canonical name was registered twice during startup.
    #[error("{registry}: `{name}` is already registered")]
    DuplicateName { registry: String, name: String },

    /// A configuration asked for a name nothing registered.
    #[error("{registry}: `{name}` is not registered")]
    NameNotFound { registry: String, name: String },
}

/// A parameter list does not fit the bound function's arity.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParameterError {
    #[error("`{name}` expects {expected} parameter(s), got {got}")]
    Arity {
        name: String,
        expected: Arity,
        got: usize,
    },
}

/// Everything that can go wrong while compiling a branch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Parameter(#[from] ParameterError),

    /// A cut whose object type the chosen mode never visits.
    #[error("cut `{cut}` of type `{object}` cannot be applied in `{mode}` mode")]
    CutNotApplicable {
        cut: String,
        object: String,
        mode: String,
    },

    /// A variable target the chosen mode cannot reach.
    #[error("illegal variable type `{target}` for variable `{variable}` in `{mode}` mode")]
    IllegalTarget {
        target: String,
        variable: String,
        mode: String,
    },

    #[error("empty {what} name")]
    EmptyName { what: &'static str },

    /// Selectors lift particle variables to interactions only.
    #[error("selector `{selector}` cannot be used with variable type `{target}`")]
    UnknownSelector { selector: String, target: String },
}
