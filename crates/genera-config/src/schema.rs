use schemars::schema::RootSchema;
use schemars::schema_for;

use crate::GeneraConfig;

/// JSON schema for `genera.toml`, for editor integration and CI validation.
#[must_use]
pub fn json_schema() -> RootSchema {
    schema_for!(GeneraConfig)
}
