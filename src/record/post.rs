use super::{FromRow, MappedRow, RowSchema};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Meta key to meta value, ordered for stable output
pub type MetaMap = BTreeMap<String, String>;

/// Column layout of `wp_posts`.
///
/// `comment_count` is the last column; when it is empty or NULL it falls back
/// to `"0"`.
pub static POST_SCHEMA: RowSchema = RowSchema {
    table_suffix: "posts",
    attributes: &[
        "ID",
        "post_author",
        "post_date",
        "post_date_gmt",
        "post_content",
        "post_title",
        "post_excerpt",
        "post_status",
        "comment_status",
        "ping_status",
        "post_password",
        "post_name",
        "to_ping",
        "pinged",
        "post_modified",
        "post_modified_gmt",
        "post_content_filtered",
        "post_parent",
        "guid",
        "menu_order",
        "post_type",
        "post_mime_type",
        "comment_count",
    ],
    required: 23,
};

/// A row of the posts table with its metadata attached.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Post {
    #[serde(rename = "ID")]
    pub id: String,
    pub post_author: String,
    pub post_date: String,
    pub post_date_gmt: String,
    pub post_content: String,
    pub post_title: String,
    pub post_excerpt: String,
    pub post_status: String,
    pub comment_status: String,
    pub ping_status: String,
    pub post_password: String,
    pub post_name: String,
    pub to_ping: String,
    pub pinged: String,
    pub post_modified: String,
    pub post_modified_gmt: String,
    pub post_content_filtered: String,
    pub post_parent: String,
    pub guid: String,
    pub menu_order: String,
    pub post_type: String,
    pub post_mime_type: String,
    pub comment_count: String,
    /// Metadata joined in by the aggregator
    #[serde(default)]
    pub meta: MetaMap,
}

impl Post {
    /// Read an attribute by its column name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        let value = match name {
            "ID" => &self.id,
            "post_author" => &self.post_author,
            "post_date" => &self.post_date,
            "post_date_gmt" => &self.post_date_gmt,
            "post_content" => &self.post_content,
            "post_title" => &self.post_title,
            "post_excerpt" => &self.post_excerpt,
            "post_status" => &self.post_status,
            "comment_status" => &self.comment_status,
            "ping_status" => &self.ping_status,
            "post_password" => &self.post_password,
            "post_name" => &self.post_name,
            "to_ping" => &self.to_ping,
            "pinged" => &self.pinged,
            "post_modified" => &self.post_modified,
            "post_modified_gmt" => &self.post_modified_gmt,
            "post_content_filtered" => &self.post_content_filtered,
            "post_parent" => &self.post_parent,
            "guid" => &self.guid,
            "menu_order" => &self.menu_order,
            "post_type" => &self.post_type,
            "post_mime_type" => &self.post_mime_type,
            "comment_count" => &self.comment_count,
            _ => return None,
        };
        Some(value)
    }

    pub fn is_published(&self) -> bool {
        self.post_status == "publish"
    }
}

impl FromRow for Post {
    fn schema() -> &'static RowSchema {
        &POST_SCHEMA
    }

    fn from_mapped(mut row: MappedRow) -> Self {
        Self {
            id: row.take("ID").trim().to_string(),
            post_author: row.take("post_author"),
            post_date: row.take("post_date"),
            post_date_gmt: row.take("post_date_gmt"),
            post_content: row.take("post_content"),
            post_title: row.take("post_title"),
            post_excerpt: row.take("post_excerpt"),
            post_status: row.take("post_status"),
            comment_status: row.take("comment_status"),
            ping_status: row.take("ping_status"),
            post_password: row.take("post_password"),
            post_name: row.take("post_name"),
            to_ping: row.take("to_ping"),
            pinged: row.take("pinged"),
            post_modified: row.take("post_modified"),
            post_modified_gmt: row.take("post_modified_gmt"),
            post_content_filtered: row.take("post_content_filtered"),
            post_parent: row.take("post_parent"),
            guid: row.take("guid"),
            menu_order: row.take("menu_order"),
            post_type: row.take("post_type"),
            post_mime_type: row.take("post_mime_type"),
            comment_count: row.take_or("comment_count", "0"),
            meta: MetaMap::new(),
        }
    }
}
