pub(crate) mod extract;
mod rows;
mod rules;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;
use wp_extract::extractor::{TableNames, DEFAULT_TABLE_PREFIX};

#[derive(Parser)]
#[command(name = "wp-extract")]
#[command(version)]
#[command(
    about = "Extract WordPress posts and post metadata from SQL dump files into JSON",
    long_about = None
)]
pub struct Cli {
    /// Log diagnostics (dropped rows, truncated statements) to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract posts and metadata, classify them and write JSON files
    Extract {
        /// Input SQL dump (supports .gz, .bz2, .xz, .zst compression)
        file: PathBuf,

        /// Output directory for JSON files
        #[arg(short, long, default_value = "extracted-content")]
        output: PathBuf,

        /// Table prefix used by the WordPress installation
        #[arg(long, default_value = DEFAULT_TABLE_PREFIX)]
        prefix: String,

        /// Posts table name (overrides --prefix)
        #[arg(long)]
        posts_table: Option<String>,

        /// Post metadata table name (overrides --prefix)
        #[arg(long)]
        meta_table: Option<String>,

        /// YAML file with classification rules (default: built-in rules)
        #[arg(short, long)]
        rules: Option<PathBuf>,

        /// Show progress during extraction
        #[arg(short, long)]
        progress: bool,

        /// Parse and classify without writing files
        #[arg(long)]
        dry_run: bool,

        /// Output a JSON report instead of human-readable text
        #[arg(long)]
        json: bool,
    },

    /// Print the rows of one table's INSERT statements as JSON arrays
    Rows {
        /// Input SQL dump (supports .gz, .bz2, .xz, .zst compression)
        file: PathBuf,

        /// Table to print (e.g. wp_posts)
        #[arg(short, long)]
        table: String,

        /// Stop after this many rows
        #[arg(short, long)]
        limit: Option<usize>,

        /// Print fields exactly as they appear in the dump
        #[arg(long)]
        raw: bool,
    },

    /// Print the built-in classification rules as YAML
    Rules {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print JSON Schemas for machine-readable outputs
    Schema {
        /// Schema name (extract, post, summary); all when omitted
        name: Option<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn resolve_tables(prefix: &str, posts: Option<String>, meta: Option<String>) -> TableNames {
    let mut tables = TableNames::with_prefix(prefix);
    if let Some(posts) = posts {
        tables.posts = posts;
    }
    if let Some(meta) = meta {
        tables.meta = meta;
    }
    tables
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Extract {
            file,
            output,
            prefix,
            posts_table,
            meta_table,
            rules,
            progress,
            dry_run,
            json,
        } => extract::run(
            file,
            output,
            resolve_tables(&prefix, posts_table, meta_table),
            rules,
            progress,
            dry_run,
            json,
        ),
        Commands::Rows {
            file,
            table,
            limit,
            raw,
        } => rows::run(file, table, limit, raw),
        Commands::Rules { output } => rules::run(output),
        Commands::Schema { name } => run_schema(name),
        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "wp-extract", &mut io::stdout());
            Ok(())
        }
    }
}

fn run_schema(name: Option<String>) -> anyhow::Result<()> {
    match name {
        Some(name) => {
            let Some(schema) = crate::json_schema::get_schema(&name) else {
                anyhow::bail!(
                    "unknown schema: {} (available: {})",
                    name,
                    crate::json_schema::schema_names().join(", ")
                );
            };
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
        None => {
            let all = crate::json_schema::all_schemas();
            println!("{}", serde_json::to_string_pretty(&all)?);
        }
    }
    Ok(())
}
