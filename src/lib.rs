//! Extract WordPress posts and post metadata from SQL dump files.
//!
//! The pipeline, leaves first:
//!
//! - [`parser`]: statement reader, `VALUES` tokenizer and field normalizer
//! - [`record`]: positional schemas mapping rows to [`record::Post`] and
//!   [`record::PostMeta`]
//! - [`aggregate`]: joins metadata onto posts
//! - [`classify`]: rule-table classification into derived subsets
//! - [`writer`]: JSON output
//! - [`extractor`]: drives the above over a (possibly compressed) dump

pub mod aggregate;
pub mod classify;
pub mod extractor;
pub mod parser;
pub mod progress;
pub mod record;
pub mod writer;
