//! JSON output for extracted posts.
//!
//! One pretty-printed file per classification subset, one with every post,
//! and a summary. Text is written as UTF-8 with non-ASCII characters kept
//! as-is.

use crate::classify::{Classification, ALL_POSTS_FILE, SUMMARY_FILE};
use crate::extractor::ExtractStats;
use crate::record::Post;
use schemars::JsonSchema;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const WRITER_BUFFER_SIZE: usize = 256 * 1024;

/// Posts whose content is longer than this count as having content.
pub const CONTENT_THRESHOLD: usize = 100;

/// One post as listed in the summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct SummaryEntry {
    #[serde(rename = "ID")]
    pub id: String,
    pub title: String,
    pub slug: String,
    #[serde(rename = "type")]
    pub post_type: String,
    pub has_content: bool,
}

impl SummaryEntry {
    fn from_post(post: &Post) -> Self {
        Self {
            id: post.id.clone(),
            title: post.post_title.clone(),
            slug: post.post_name.clone(),
            post_type: post.post_type.clone(),
            has_content: post.post_content.chars().count() > CONTENT_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct SubsetSummary {
    pub count: usize,
    pub file: String,
    pub list: Vec<SummaryEntry>,
}

/// Contents of `extraction-summary.json`.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct Summary {
    pub extraction_date: String,
    pub total_posts: usize,
    pub total_meta_entries: usize,
    pub orphan_meta_posts: usize,
    pub subsets: BTreeMap<String, SubsetSummary>,
    pub statistics: ExtractStats,
}

impl Summary {
    pub fn build(
        posts: &[Post],
        classification: &Classification<'_>,
        meta_entries: usize,
        orphan_meta_posts: usize,
        stats: &ExtractStats,
        extraction_date: String,
    ) -> Self {
        let subsets = classification
            .subsets
            .iter()
            .map(|subset| {
                let summary = SubsetSummary {
                    count: subset.len(),
                    file: subset.rule.file_name(),
                    list: subset.posts.iter().map(|p| SummaryEntry::from_post(p)).collect(),
                };
                (subset.name().to_string(), summary)
            })
            .collect();

        Self {
            extraction_date,
            total_posts: posts.len(),
            total_meta_entries: meta_entries,
            orphan_meta_posts,
            subsets,
            statistics: stats.clone(),
        }
    }
}

pub struct OutputWriter {
    output_dir: PathBuf,
}

impl OutputWriter {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn ensure_output_dir(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.output_dir)
    }

    /// Serialize `value` as pretty JSON into `<output_dir>/<name>`.
    pub fn write_json<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> anyhow::Result<PathBuf> {
        let path = self.output_dir.join(name);
        let file = File::create(&path)
            .map_err(|e| anyhow::anyhow!("failed to create {}: {}", path.display(), e))?;
        let mut writer = BufWriter::with_capacity(WRITER_BUFFER_SIZE, file);
        serde_json::to_writer_pretty(&mut writer, value)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(path)
    }

    /// Write every subset, all posts and the summary. Returns the files
    /// written, in that order.
    pub fn write_extraction(
        &self,
        posts: &[Post],
        classification: &Classification<'_>,
        summary: &Summary,
    ) -> anyhow::Result<Vec<PathBuf>> {
        self.ensure_output_dir()?;

        let mut written = Vec::with_capacity(classification.subsets.len() + 2);
        for subset in &classification.subsets {
            written.push(self.write_json(&subset.rule.file_name(), &subset.posts)?);
        }
        written.push(self.write_json(ALL_POSTS_FILE, posts)?);
        written.push(self.write_json(SUMMARY_FILE, summary)?);

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::RuleTable;
    use tempfile::TempDir;

    fn page(id: &str, title: &str, content: &str) -> Post {
        Post {
            id: id.to_string(),
            post_title: title.to_string(),
            post_name: title.to_lowercase(),
            post_content: content.to_string(),
            post_type: "page".to_string(),
            post_status: "publish".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_summary_counts() {
        let posts = vec![page("1", "Home", &"x".repeat(150)), page("2", "Clinic", "")];
        let rules = RuleTable::default();
        let classification = rules.classify(&posts);
        let summary = Summary::build(
            &posts,
            &classification,
            0,
            0,
            &ExtractStats::default(),
            "2025-01-01".to_string(),
        );

        assert_eq!(summary.total_posts, 2);
        let pages = &summary.subsets["pages"];
        assert_eq!(pages.count, 2);
        assert_eq!(pages.file, "pages-content.json");
        assert!(pages.list[0].has_content);
        assert!(!pages.list[1].has_content);
        assert_eq!(summary.subsets["locations"].list[0].id, "2");
    }

    #[test]
    fn test_write_extraction_preserves_non_ascii() {
        let dir = TempDir::new().unwrap();
        let writer = OutputWriter::new(dir.path().join("out"));
        let posts = vec![page("1", "Café Ünïcode", "")];
        let rules = RuleTable::default();
        let classification = rules.classify(&posts);
        let summary = Summary::build(
            &posts,
            &classification,
            0,
            0,
            &ExtractStats::default(),
            "2025-01-01".to_string(),
        );

        let files = writer
            .write_extraction(&posts, &classification, &summary)
            .unwrap();
        assert_eq!(files.len(), rules.subsets.len() + 2);

        let all = fs::read_to_string(dir.path().join("out").join(ALL_POSTS_FILE)).unwrap();
        assert!(all.contains("Café Ünïcode"));
        let parsed: Vec<Post> = serde_json::from_str(&all).unwrap();
        assert_eq!(parsed, posts);

        let summary_text = fs::read_to_string(dir.path().join("out").join(SUMMARY_FILE)).unwrap();
        assert!(summary_text.contains("\"extraction_date\": \"2025-01-01\""));
    }
}
