//! JSON Schema generation for machine-readable outputs.
//!
//! Covers the `extract --json` report and the `extraction-summary.json` file.
//! Schemas are generated with schemars and printed by the `schema` subcommand.

use schemars::{schema_for, Schema};
use std::collections::BTreeMap;

/// All schemas, keyed by name. BTreeMap keeps the output order stable.
pub fn all_schemas() -> BTreeMap<&'static str, Schema> {
    let mut schemas = BTreeMap::new();

    schemas.insert(
        "extract",
        schema_for!(crate::cmd::extract::ExtractJsonOutput),
    );
    schemas.insert("summary", schema_for!(wp_extract::writer::Summary));
    schemas.insert("post", schema_for!(wp_extract::record::Post));

    schemas
}

/// Generate a single schema by name.
pub fn get_schema(name: &str) -> Option<Schema> {
    all_schemas().remove(name)
}

/// List all available schema names.
pub fn schema_names() -> Vec<&'static str> {
    all_schemas().keys().copied().collect()
}
