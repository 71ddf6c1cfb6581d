//! Declarative class models for `genera-types`.
//!
//! A model file (JSON or TOML) declares classes with Java-like signatures; loading it yields a
//! [`genera_types::TypeStore`] that also contains the minimal JDK.

mod error;
mod load;
mod model;
mod signature;

pub use error::{LoadError, Result};
pub use load::{load_model, load_model_file, Model};
pub use model::{ClassModel, ConstructorModel, FieldModel, MethodModel, ModelFile, TypeParamModel};
pub use signature::{parse_signature, TypeVariables};
