use super::{FromRow, MappedRow, RowSchema};
use serde::{Deserialize, Serialize};

/// Column layout of `wp_postmeta`. `meta_id` is read positionally but not kept.
pub static META_SCHEMA: RowSchema = RowSchema {
    table_suffix: "postmeta",
    attributes: &["meta_id", "post_id", "meta_key", "meta_value"],
    required: 4,
};

/// One metadata entry, owned by the post whose `ID` equals `post_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostMeta {
    pub post_id: String,
    pub meta_key: String,
    pub meta_value: String,
}

impl PostMeta {
    pub fn new(
        post_id: impl Into<String>,
        meta_key: impl Into<String>,
        meta_value: impl Into<String>,
    ) -> Self {
        Self {
            post_id: post_id.into(),
            meta_key: meta_key.into(),
            meta_value: meta_value.into(),
        }
    }
}

impl FromRow for PostMeta {
    fn schema() -> &'static RowSchema {
        &META_SCHEMA
    }

    fn from_mapped(mut row: MappedRow) -> Self {
        Self {
            post_id: row.take("post_id").trim().to_string(),
            meta_key: row.take("meta_key"),
            meta_value: row.take("meta_value"),
        }
    }
}
