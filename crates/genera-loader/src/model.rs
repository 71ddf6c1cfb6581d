//! Serialized class declarations.
//!
//! A model file lists classes the way they would be declared in Java source, with every type
//! written as a signature string:
//!
//! ```toml
//! [[classes]]
//! name = "com.example.Repository"
//! kind = "interface"
//! type_params = [{ name = "T", bounds = ["Comparable<T>"] }]
//! implements = ["java.lang.Iterable<T>"]
//!
//! [[classes.methods]]
//! name = "find"
//! params = ["long"]
//! returns = "T"
//! ```

use std::path::Path;

use genera_types::ClassKind;
use serde::{Deserialize, Serialize};

use crate::error::{LoadError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelFile {
    #[serde(default)]
    pub classes: Vec<ClassModel>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassModel {
    /// Binary name (`com.example.Outer$Inner`).
    pub name: String,
    #[serde(default = "ClassModel::default_kind")]
    pub kind: ClassKind,
    #[serde(default)]
    pub type_params: Vec<TypeParamModel>,
    /// Superclass signature. Classes without one extend `Object`.
    #[serde(default)]
    pub extends: Option<String>,
    #[serde(default)]
    pub implements: Vec<String>,
    #[serde(default)]
    pub enclosing: Option<String>,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub fields: Vec<FieldModel>,
    #[serde(default)]
    pub methods: Vec<MethodModel>,
    #[serde(default)]
    pub constructors: Vec<ConstructorModel>,
}

impl ClassModel {
    fn default_kind() -> ClassKind {
        ClassKind::Class
    }

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ClassKind::Class,
            type_params: Vec::new(),
            extends: None,
            implements: Vec::new(),
            enclosing: None,
            is_static: false,
            fields: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeParamModel {
    pub name: String,
    /// Upper bound signatures; may refer to the variable itself.
    #[serde(default)]
    pub bounds: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldModel {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub is_static: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MethodModel {
    pub name: String,
    #[serde(default)]
    pub type_params: Vec<TypeParamModel>,
    #[serde(default)]
    pub params: Vec<String>,
    #[serde(default = "MethodModel::default_returns")]
    pub returns: String,
    #[serde(default)]
    pub is_static: bool,
}

impl MethodModel {
    fn default_returns() -> String {
        "void".to_owned()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConstructorModel {
    #[serde(default)]
    pub type_params: Vec<TypeParamModel>,
    #[serde(default)]
    pub params: Vec<String>,
}

impl ModelFile {
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|source| LoadError::Json {
            path: "<string>".to_owned(),
            source,
        })
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|source| LoadError::Toml {
            path: "<string>".to_owned(),
            source,
        })
    }

    /// Read a model file, choosing the format from its extension.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        let parse: fn(&str) -> Result<Self> = match extension.as_deref() {
            Some("json") => Self::from_json_str,
            Some("toml") => Self::from_toml_str,
            _ => return Err(LoadError::UnsupportedFormat { path: display }),
        };

        let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: display.clone(),
            source,
        })?;
        parse(&text).map_err(|err| match err {
            LoadError::Json { source, .. } => LoadError::Json {
                path: display.clone(),
                source,
            },
            LoadError::Toml { source, .. } => LoadError::Toml {
                path: display.clone(),
                source,
            },
            other => other,
        })
    }
}
