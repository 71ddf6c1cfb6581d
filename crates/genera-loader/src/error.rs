use thiserror::Error;

pub type Result<T, E = LoadError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read model file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse JSON model {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to parse TOML model {path}: {source}")]
    Toml {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("unsupported model file {path}: expected a .json or .toml extension")]
    UnsupportedFormat { path: String },

    #[error("unknown class `{name}` in {context}")]
    UnknownClass { name: String, context: String },

    #[error("unknown type variable `{name}` in {context}")]
    UnknownVariable { name: String, context: String },

    #[error("malformed signature `{signature}` at offset {offset}: {message}")]
    MalformedSignature {
        signature: String,
        offset: usize,
        message: String,
    },

    #[error("class `{0}` is declared more than once")]
    DuplicateClass(String),
}
