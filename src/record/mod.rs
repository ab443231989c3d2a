//! Positional schemas that turn raw rows into named records.
//!
//! A [`RowSchema`] lists attribute names in column order. [`map_row`] applies
//! it to a tokenized row, normalizing every field; rows shorter than the
//! schema's required minimum are dropped rather than partially built.

mod meta;
mod post;

pub use meta::{PostMeta, META_SCHEMA};
pub use post::{MetaMap, Post, POST_SCHEMA};

use crate::parser::normalize_field;

/// Column layout of one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowSchema {
    /// Table name without the installation prefix (`posts`, `postmeta`)
    pub table_suffix: &'static str,
    /// Attribute names in column order
    pub attributes: &'static [&'static str],
    /// Minimum number of fields a row must have to be mapped
    pub required: usize,
}

impl RowSchema {
    /// Column index of an attribute
    pub fn index_of(&self, attribute: &str) -> Option<usize> {
        self.attributes.iter().position(|a| *a == attribute)
    }

    /// Full table name for a given prefix, e.g. `wp_` + `posts`
    pub fn table_name(&self, prefix: &str) -> String {
        format!("{}{}", prefix, self.table_suffix)
    }
}

/// A row with its fields normalized and bound to a schema.
#[derive(Debug, Clone)]
pub struct MappedRow {
    schema: &'static RowSchema,
    values: Vec<Option<String>>,
}

impl MappedRow {
    /// Value of an attribute, if the row carried it.
    pub fn get(&self, attribute: &str) -> Option<&str> {
        let idx = self.schema.index_of(attribute)?;
        self.values.get(idx)?.as_deref()
    }

    /// Move an attribute's value out of the row; missing values become "".
    pub fn take(&mut self, attribute: &str) -> String {
        self.take_or(attribute, "")
    }

    /// Move an attribute's value out of the row, falling back to `default`
    /// when the field is absent or empty.
    pub fn take_or(&mut self, attribute: &str, default: &str) -> String {
        let value = self
            .schema
            .index_of(attribute)
            .and_then(|idx| self.values.get_mut(idx))
            .and_then(Option::take)
            .filter(|v| !v.is_empty());
        value.unwrap_or_else(|| default.to_string())
    }

    pub fn schema(&self) -> &'static RowSchema {
        self.schema
    }
}

/// Apply a schema to a raw row.
///
/// Returns `None` when the row has fewer than `schema.required` fields.
/// Fields beyond the schema are ignored.
pub fn map_row(row: &[&str], schema: &'static RowSchema) -> Option<MappedRow> {
    if row.len() < schema.required {
        return None;
    }

    let values = schema
        .attributes
        .iter()
        .enumerate()
        .map(|(idx, _)| row.get(idx).map(|raw| normalize_field(raw).into_owned()))
        .collect();

    Some(MappedRow { schema, values })
}

/// Records that can be built from a positional row.
pub trait FromRow: Sized {
    fn schema() -> &'static RowSchema;

    fn from_mapped(row: MappedRow) -> Self;

    /// Map and build in one step; `None` when the row is too short.
    fn from_row(row: &[&str]) -> Option<Self> {
        map_row(row, Self::schema()).map(Self::from_mapped)
    }
}
