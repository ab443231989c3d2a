//! YAML rule table for post classification.
//!
//! ```yaml
//! subsets:
//!   - name: services
//!     file: services-complete.json
//!     all:
//!       - field: post_status
//!         equals: [publish]
//!     any:
//!       - field: post_title
//!         contains: [botox, laser]
//!       - field: post_type
//!         equals: [service, services]
//! ```

use crate::record::POST_SCHEMA;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path};

/// How a field value is tested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Match {
    /// Exact equality with any of the values
    Equals(Vec<String>),
    /// Case-insensitive substring match with any of the keywords
    Contains(Vec<String>),
}

/// A test against one post attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Predicate {
    /// Post attribute name (`post_title`, `post_name`, `post_type`, ...)
    pub field: String,
    #[serde(flatten)]
    pub matcher: Match,
}

impl Predicate {
    pub fn equals(field: &str, values: &[&str]) -> Self {
        Self {
            field: field.to_string(),
            matcher: Match::Equals(values.iter().map(|v| v.to_string()).collect()),
        }
    }

    pub fn contains(field: &str, keywords: &[&str]) -> Self {
        Self {
            field: field.to_string(),
            matcher: Match::Contains(keywords.iter().map(|k| k.to_lowercase()).collect()),
        }
    }
}

/// Definition of one derived subset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubsetRule {
    pub name: String,
    /// Output file name; `<name>.json` when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Predicates that must all hold
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub all: Vec<Predicate>,
    /// Predicates of which at least one must hold (ignored when empty)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub any: Vec<Predicate>,
}

impl SubsetRule {
    pub fn file_name(&self) -> String {
        self.file
            .clone()
            .unwrap_or_else(|| format!("{}.json", self.name))
    }
}

/// Ordered list of subset definitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTable {
    pub subsets: Vec<SubsetRule>,
}

const SERVICE_KEYWORDS: &[&str] = &[
    "botox",
    "filler",
    "mohs",
    "surgery",
    "skin cancer",
    "acne",
    "cosmetic",
    "laser",
    "treatment",
    "procedure",
    "peel",
    "microneedling",
    "rejuvenation",
];

const LOCATION_KEYWORDS: &[&str] = &[
    "trussville",
    "pell city",
    "gadsden",
    "location",
    "office",
    "clinic",
];

const PROVIDER_KEYWORDS: &[&str] = &[
    "dr.",
    "doctor",
    "physician",
    "provider",
    "dermatologist",
    "pa-c",
    "np",
];

fn keyword_subset(name: &str, file: &str, keywords: &[&str], post_types: &[&str]) -> SubsetRule {
    SubsetRule {
        name: name.to_string(),
        file: Some(file.to_string()),
        all: vec![Predicate::equals("post_status", &["publish"])],
        any: vec![
            Predicate::contains("post_title", keywords),
            Predicate::contains("post_name", keywords),
            Predicate::equals("post_type", post_types),
        ],
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        Self {
            subsets: vec![
                SubsetRule {
                    name: "pages".to_string(),
                    file: Some("pages-content.json".to_string()),
                    all: vec![
                        Predicate::equals("post_type", &["page"]),
                        Predicate::equals("post_status", &["publish"]),
                    ],
                    any: Vec::new(),
                },
                keyword_subset(
                    "services",
                    "services-complete.json",
                    SERVICE_KEYWORDS,
                    &["service", "services"],
                ),
                keyword_subset(
                    "locations",
                    "locations-complete.json",
                    LOCATION_KEYWORDS,
                    &["location", "locations"],
                ),
                keyword_subset(
                    "providers",
                    "providers-complete.json",
                    PROVIDER_KEYWORDS,
                    &["provider", "providers", "doctor", "team"],
                ),
                SubsetRule {
                    name: "menu_items".to_string(),
                    file: Some("menu-structure.json".to_string()),
                    all: vec![Predicate::equals("post_type", &["nav_menu_item"])],
                    any: Vec::new(),
                },
            ],
        }
    }
}

impl RuleTable {
    /// Parse and validate a YAML rule table.
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let mut table: RuleTable =
            serde_yaml_ng::from_str(yaml).context("invalid classification rules")?;
        table.lowercase_keywords();
        table.validate()?;
        Ok(table)
    }

    /// Load a YAML rule table from disk.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read rules file: {}", path.display()))?;
        Self::from_yaml_str(&content)
            .with_context(|| format!("failed to load rules from {}", path.display()))
    }

    pub fn to_yaml(&self) -> anyhow::Result<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Reject unknown attribute names, duplicate subset names and duplicate
    /// output files.
    pub fn validate(&self) -> anyhow::Result<()> {
        let mut names = Vec::new();
        let mut files = Vec::new();

        for subset in &self.subsets {
            if subset.name.trim().is_empty() {
                anyhow::bail!("subset with empty name");
            }
            if names.contains(&subset.name) {
                anyhow::bail!("duplicate subset name: {}", subset.name);
            }
            names.push(subset.name.clone());

            let file = subset.file_name();
            if !is_plain_file_name(&file) {
                anyhow::bail!(
                    "subset {}: file must be a plain file name, got: {}",
                    subset.name,
                    file
                );
            }
            if file == ALL_POSTS_FILE || file == SUMMARY_FILE || files.contains(&file) {
                anyhow::bail!("subset {} uses a reserved or duplicate file: {}", subset.name, file);
            }
            files.push(file);

            for predicate in subset.all.iter().chain(&subset.any) {
                if POST_SCHEMA.index_of(&predicate.field).is_none() {
                    anyhow::bail!(
                        "subset {}: unknown field '{}'",
                        subset.name,
                        predicate.field
                    );
                }
            }
        }

        Ok(())
    }

    fn lowercase_keywords(&mut self) {
        for subset in &mut self.subsets {
            for predicate in subset.all.iter_mut().chain(subset.any.iter_mut()) {
                if let Match::Contains(keywords) = &mut predicate.matcher {
                    for keyword in keywords.iter_mut() {
                        *keyword = keyword.to_lowercase();
                    }
                }
            }
        }
    }
}

/// True when `file` is a single path component with no directory parts.
fn is_plain_file_name(file: &str) -> bool {
    let mut components = Path::new(file).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !file.contains(['/', '\\'])
}

/// File holding every post
pub const ALL_POSTS_FILE: &str = "all-posts.json";
/// File holding the extraction summary
pub const SUMMARY_FILE: &str = "extraction-summary.json";
