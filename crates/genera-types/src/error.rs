use thiserror::Error;

use crate::store::ClassId;

/// Failures of generics resolution.
///
/// Types and bindings are rendered into the message when the error is raised, so errors stay
/// meaningful without access to the [`crate::TypeEnv`] that produced them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenericsError {
    #[error("variable {name} (declared by {declaration}) is not present in generics {generics}")]
    UnknownVariable {
        name: String,
        declaration: String,
        generics: String,
    },

    #[error(
        "variable {name} is declared by {declared_by} and can't be resolved in the current context; \
         switch to {suggestion} first\n{hierarchy}"
    )]
    WrongContext {
        name: String,
        declared_by: String,
        suggestion: String,
        hierarchy: String,
    },

    #[error(
        "interface {interface} appears in the hierarchy of {root} with incompatible values for \
         {variable}: {first} and {second}"
    )]
    IncompatibleInterface {
        root: String,
        interface: String,
        variable: String,
        first: String,
        second: String,
    },

    #[error("failed to resolve hierarchy of {root}{generics}: {source}")]
    HierarchyResolution {
        root: String,
        generics: String,
        #[source]
        source: Box<GenericsError>,
    },

    #[error("incompatible types: {first} and {second}")]
    IncompatibleTypes { first: String, second: String },

    #[error(
        "failed to track generics of {root} from {known}{known_generics}: variable {variable}: {source}"
    )]
    Tracking {
        root: String,
        known: String,
        known_generics: String,
        variable: String,
        #[source]
        source: Box<GenericsError>,
    },

    #[error("{root} is not assignable to {requested}: type not in hierarchy\n{hierarchy}")]
    TypeNotInHierarchy {
        root: String,
        requested: String,
        hierarchy: String,
    },

    #[error("{what} index {index} is out of range for {owner} ({count} available)")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        count: usize,
        owner: String,
    },

    #[error("{what} {name} not found in {owner}; available: {available}")]
    UnknownName {
        what: &'static str,
        name: String,
        available: String,
        owner: String,
    },

    #[error("class #{} is not defined", .0.to_raw())]
    MissingClass(ClassId),
}

pub type Result<T, E = GenericsError> = std::result::Result<T, E>;
