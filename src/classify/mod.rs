//! Heuristic classification of posts into named subsets.
//!
//! Subsets are described by a declarative [`RuleTable`]; a post may land in
//! several subsets, but appears at most once in each. Matching is keyword
//! based and deliberately loose, so subsets can contain false positives and
//! miss posts that use none of the keywords.

mod rules;

pub use rules::{Match, Predicate, RuleTable, SubsetRule, ALL_POSTS_FILE, SUMMARY_FILE};

use crate::record::Post;
use ahash::AHashSet;

impl Predicate {
    /// Evaluate against a post. Unknown fields never match.
    pub fn matches(&self, post: &Post) -> bool {
        let Some(value) = post.attribute(&self.field) else {
            return false;
        };
        match &self.matcher {
            Match::Equals(values) => values.iter().any(|v| v == value),
            Match::Contains(keywords) => {
                if keywords.is_empty() || value.is_empty() {
                    return false;
                }
                let lower = value.to_lowercase();
                keywords.iter().any(|k| lower.contains(k.as_str()))
            }
        }
    }
}

impl SubsetRule {
    pub fn matches(&self, post: &Post) -> bool {
        self.all.iter().all(|p| p.matches(post))
            && (self.any.is_empty() || self.any.iter().any(|p| p.matches(post)))
    }
}

/// One derived subset: references into the classified posts.
#[derive(Debug, Clone)]
pub struct Subset<'a> {
    pub rule: &'a SubsetRule,
    pub posts: Vec<&'a Post>,
}

impl Subset<'_> {
    pub fn name(&self) -> &str {
        &self.rule.name
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.posts.iter().map(|p| p.id.as_str()).collect()
    }
}

/// Result of classifying a post collection, in rule-table order.
#[derive(Debug, Clone)]
pub struct Classification<'a> {
    pub subsets: Vec<Subset<'a>>,
}

impl<'a> Classification<'a> {
    pub fn get(&self, name: &str) -> Option<&Subset<'a>> {
        self.subsets.iter().find(|s| s.rule.name == name)
    }
}

impl RuleTable {
    /// Select the posts of every subset, deduplicated by post id in
    /// first-seen order.
    pub fn classify<'a>(&'a self, posts: &'a [Post]) -> Classification<'a> {
        let subsets = self
            .subsets
            .iter()
            .map(|rule| {
                let mut seen: AHashSet<&str> = AHashSet::new();
                let selected = posts
                    .iter()
                    .filter(|&post| rule.matches(post))
                    .filter(|&post| seen.insert(post.id.as_str()))
                    .collect();
                Subset {
                    rule,
                    posts: selected,
                }
            })
            .collect();

        Classification { subsets }
    }
}
