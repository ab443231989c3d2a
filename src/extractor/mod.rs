//! Streams a dump and collects posts and post metadata.
//!
//! Extraction is two-phase: every `INSERT` into the posts and metadata tables
//! is tokenized and mapped while the dump is read one statement at a time,
//! and only once the input is exhausted are the two collections joined with
//! the [`Aggregator`].

use crate::aggregate::Aggregator;
use crate::parser::{determine_buffer_size, rows_from_statement, Parser, StatementType};
use crate::progress::ProgressReader;
use crate::record::{FromRow, Post, PostMeta, META_SCHEMA, POST_SCHEMA};
use anyhow::Context;
use schemars::JsonSchema;
use serde::Serialize;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Default WordPress table prefix
pub const DEFAULT_TABLE_PREFIX: &str = "wp_";

/// Names of the two tables the extractor reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNames {
    pub posts: String,
    pub meta: String,
}

impl TableNames {
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            posts: POST_SCHEMA.table_name(prefix),
            meta: META_SCHEMA.table_name(prefix),
        }
    }
}

impl Default for TableNames {
    fn default() -> Self {
        Self::with_prefix(DEFAULT_TABLE_PREFIX)
    }
}

/// Counters gathered while reading a dump.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, JsonSchema)]
pub struct ExtractStats {
    /// Statements read from the dump, of any kind
    pub statements_processed: u64,
    /// INSERT statements targeting the posts or metadata table
    pub insert_statements: u64,
    /// Rows tokenized from the posts table
    pub post_rows: u64,
    /// Rows tokenized from the metadata table
    pub meta_rows: u64,
    /// Rows with fewer fields than their schema requires
    pub rows_dropped: u64,
    /// INSERT statements whose value list ended mid-row
    pub truncated_statements: u64,
    /// Decompressed bytes scanned
    pub bytes_processed: u64,
}

/// Everything extracted from one dump.
#[derive(Debug, Clone)]
pub struct Extraction {
    /// Posts in dump order, metadata attached
    pub posts: Vec<Post>,
    /// Post ids that own metadata but have no post row
    pub orphan_post_ids: Vec<String>,
    /// Metadata rows mapped, before grouping
    pub meta_entries: usize,
    pub stats: ExtractStats,
}

/// Compression format detected from file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    Bzip2,
    Xz,
    Zstd,
}

impl Compression {
    /// Detect compression format from file extension
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match ext.as_deref() {
            Some("gz" | "gzip") => Compression::Gzip,
            Some("bz2" | "bzip2") => Compression::Bzip2,
            Some("xz" | "lzma") => Compression::Xz,
            Some("zst" | "zstd") => Compression::Zstd,
            _ => Compression::None,
        }
    }

    /// Wrap a reader with the appropriate decompressor
    pub fn wrap_reader<'a>(&self, reader: Box<dyn Read + 'a>) -> std::io::Result<Box<dyn Read + 'a>> {
        Ok(match self {
            Compression::None => reader,
            Compression::Gzip => Box::new(flate2::read::MultiGzDecoder::new(reader)),
            Compression::Bzip2 => Box::new(bzip2::read::MultiBzDecoder::new(reader)),
            Compression::Xz => Box::new(xz2::read::XzDecoder::new_multi_decoder(reader)),
            Compression::Zstd => Box::new(zstd::stream::read::Decoder::new(reader)?),
        })
    }
}

impl std::fmt::Display for Compression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Compression::None => write!(f, "none"),
            Compression::Gzip => write!(f, "gzip"),
            Compression::Bzip2 => write!(f, "bzip2"),
            Compression::Xz => write!(f, "xz"),
            Compression::Zstd => write!(f, "zstd"),
        }
    }
}

#[derive(Default)]
pub struct ExtractorConfig {
    pub tables: TableNames,
    pub progress_fn: Option<Box<dyn FnMut(u64)>>,
}

pub struct Extractor {
    input_file: PathBuf,
    config: ExtractorConfig,
}

impl Extractor {
    pub fn new(input_file: PathBuf) -> Self {
        Self {
            input_file,
            config: ExtractorConfig::default(),
        }
    }

    pub fn with_tables(mut self, tables: TableNames) -> Self {
        self.config.tables = tables;
        self
    }

    pub fn with_progress<F: FnMut(u64) + 'static>(mut self, f: F) -> Self {
        self.config.progress_fn = Some(Box::new(f));
        self
    }

    pub fn extract(mut self) -> anyhow::Result<Extraction> {
        let file = File::open(&self.input_file)
            .with_context(|| format!("failed to open {}", self.input_file.display()))?;
        let file_size = file.metadata()?.len();
        let buffer_size = determine_buffer_size(file_size);

        let compression = Compression::from_path(&self.input_file);

        let reader: Box<dyn Read> = match self.config.progress_fn.take() {
            Some(cb) => compression.wrap_reader(Box::new(ProgressReader::new(file, cb)))?,
            None => compression.wrap_reader(Box::new(file))?,
        };

        debug!(
            file = %self.input_file.display(),
            %compression,
            posts_table = %self.config.tables.posts,
            meta_table = %self.config.tables.meta,
            "starting extraction"
        );

        extract_from_reader(reader, buffer_size, &self.config.tables)
            .with_context(|| format!("failed to read {}", self.input_file.display()))
    }
}

/// Run the extraction over any reader of uncompressed SQL.
pub fn extract_from_reader<R: Read>(
    reader: R,
    buffer_size: usize,
    tables: &TableNames,
) -> std::io::Result<Extraction> {
    let mut parser = Parser::new(reader, buffer_size);
    let mut collector = RowCollector::new(tables);

    while let Some(stmt) = parser.read_statement()? {
        collector.process_statement(&stmt);
    }

    Ok(collector.finish())
}

/// Phase one: accumulates mapped rows per table.
struct RowCollector<'t> {
    tables: &'t TableNames,
    posts: Vec<Post>,
    metas: Vec<PostMeta>,
    stats: ExtractStats,
}

impl<'t> RowCollector<'t> {
    fn new(tables: &'t TableNames) -> Self {
        Self {
            tables,
            posts: Vec::new(),
            metas: Vec::new(),
            stats: ExtractStats::default(),
        }
    }

    fn process_statement(&mut self, stmt: &[u8]) {
        self.stats.statements_processed += 1;
        self.stats.bytes_processed += stmt.len() as u64;

        let (stmt_type, table_name) = Parser::<&[u8]>::parse_statement(stmt);
        if stmt_type != StatementType::Insert {
            return;
        }

        let is_posts = table_name == self.tables.posts;
        if !is_posts && table_name != self.tables.meta {
            return;
        }

        self.stats.insert_statements += 1;
        let text = String::from_utf8_lossy(stmt);
        let mut rows = rows_from_statement(&text);

        let (seen, dropped) = if is_posts {
            collect_rows(&mut rows, &mut self.posts)
        } else {
            collect_rows(&mut rows, &mut self.metas)
        };

        if is_posts {
            self.stats.post_rows += seen;
        } else {
            self.stats.meta_rows += seen;
        }
        self.stats.rows_dropped += dropped;

        debug!(table = %table_name, rows = seen, dropped, "processed insert");

        if dropped > 0 {
            debug!(
                table = %table_name,
                dropped,
                "rows with too few fields were skipped"
            );
        }

        if rows.truncated() {
            self.stats.truncated_statements += 1;
            warn!(
                table = %table_name,
                rows_read = seen,
                offset = rows.position(),
                "value list ended mid-row; remaining rows in this statement were lost"
            );
        }
    }

    /// Phase two: join metadata onto posts.
    fn finish(self) -> Extraction {
        let meta_entries = self.metas.len();
        let aggregator = Aggregator::new(self.posts, self.metas);

        let orphan_post_ids: Vec<String> =
            aggregator.orphans().into_iter().map(str::to_string).collect();
        if !orphan_post_ids.is_empty() {
            debug!(count = orphan_post_ids.len(), "metadata without a matching post");
        }

        Extraction {
            posts: aggregator.into_merged(),
            orphan_post_ids,
            meta_entries,
            stats: self.stats,
        }
    }
}

/// Map every row of an iterator into `out`; returns (rows seen, rows dropped).
fn collect_rows<'a, T, I>(rows: &mut I, out: &mut Vec<T>) -> (u64, u64)
where
    T: FromRow,
    I: Iterator<Item = Vec<&'a str>>,
{
    let mut seen = 0;
    let mut dropped = 0;
    for row in rows {
        seen += 1;
        match T::from_row(&row) {
            Some(record) => out.push(record),
            None => dropped += 1,
        }
    }
    (seen, dropped)
}
