//! Joins post metadata onto posts.
//!
//! The join runs after both tables have been read completely: the
//! [`Aggregator`] owns the posts and the metadata grouped by owning post id,
//! and [`Aggregator::merge`] produces enriched copies without touching its own
//! state, so running it repeatedly gives the same result.

use crate::record::{MetaMap, Post, PostMeta};
use ahash::{AHashMap, AHashSet};

pub struct Aggregator {
    posts: Vec<Post>,
    meta: AHashMap<String, MetaMap>,
    meta_entries: usize,
}

impl Aggregator {
    /// Take ownership of both collections and group the metadata by post id.
    ///
    /// Within one post, a repeated meta key keeps the value seen last.
    pub fn new(posts: Vec<Post>, metas: Vec<PostMeta>) -> Self {
        let meta_entries = metas.len();
        let mut meta: AHashMap<String, MetaMap> = AHashMap::new();

        for entry in metas {
            meta.entry(entry.post_id)
                .or_default()
                .insert(entry.meta_key, entry.meta_value);
        }

        Self {
            posts,
            meta,
            meta_entries,
        }
    }

    /// Posts with their metadata attached.
    ///
    /// Each post's `meta` is replaced by the grouping for its id (empty when
    /// there is none), never extended.
    pub fn merge(&self) -> Vec<Post> {
        self.posts
            .iter()
            .map(|post| {
                let mut merged = post.clone();
                merged.meta = self.meta.get(&post.id).cloned().unwrap_or_default();
                merged
            })
            .collect()
    }

    /// Consume the aggregator, attaching metadata in place.
    pub fn into_merged(self) -> Vec<Post> {
        let Self {
            mut posts,
            mut meta,
            ..
        } = self;

        // Posts sharing an id all receive the grouping.
        let mut counts: AHashMap<&str, usize> = AHashMap::new();
        for post in &posts {
            *counts.entry(post.id.as_str()).or_default() += 1;
        }
        let shared: AHashSet<String> = counts
            .into_iter()
            .filter(|(_, n)| *n > 1)
            .map(|(id, _)| id.to_string())
            .collect();

        for post in &mut posts {
            post.meta = if shared.contains(&post.id) {
                meta.get(&post.id).cloned().unwrap_or_default()
            } else {
                meta.remove(&post.id).unwrap_or_default()
            };
        }
        posts
    }

    /// Ids that own metadata but match no post, sorted.
    pub fn orphans(&self) -> Vec<&str> {
        let known: AHashSet<&str> = self.posts.iter().map(|p| p.id.as_str()).collect();
        let mut orphans: Vec<&str> = self
            .meta
            .keys()
            .map(String::as_str)
            .filter(|id| !known.contains(id))
            .collect();
        orphans.sort_unstable();
        orphans
    }

    /// Metadata grouped under a post id, whether or not that post exists.
    pub fn meta_for(&self, post_id: &str) -> Option<&MetaMap> {
        self.meta.get(post_id)
    }

    pub fn post_count(&self) -> usize {
        self.posts.len()
    }

    /// Number of metadata rows received, before grouping.
    pub fn meta_entry_count(&self) -> usize {
        self.meta_entries
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }
}
