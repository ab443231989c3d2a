use indicatif::{ProgressBar, ProgressStyle};
use schemars::JsonSchema;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Instant;
use wp_extract::classify::{Classification, RuleTable};
use wp_extract::extractor::{Compression, ExtractStats, Extractor, TableNames};
use wp_extract::writer::{OutputWriter, Summary};

/// How many entries per subset the text report lists
const REPORT_LIMIT: usize = 15;

/// JSON output for the extract command
#[derive(Serialize, JsonSchema)]
pub(crate) struct ExtractJsonOutput {
    input_file: String,
    output_dir: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    compression: Option<String>,
    posts_table: String,
    meta_table: String,
    dry_run: bool,
    total_posts: usize,
    meta_entries: usize,
    orphan_meta_posts: usize,
    subsets: BTreeMap<String, usize>,
    files_written: Vec<String>,
    statistics: ExtractStats,
    elapsed_secs: f64,
}

pub fn run(
    file: PathBuf,
    output: PathBuf,
    tables: TableNames,
    rules: Option<PathBuf>,
    progress: bool,
    dry_run: bool,
    json: bool,
) -> anyhow::Result<()> {
    if !file.exists() {
        anyhow::bail!("input file does not exist: {}", file.display());
    }

    let rule_table = match &rules {
        Some(path) => RuleTable::from_file(path)?,
        None => RuleTable::default(),
    };

    let file_size = std::fs::metadata(&file)?.len();
    let file_size_mb = file_size as f64 / (1024.0 * 1024.0);

    let compression = Compression::from_path(&file);
    let compression_str = if compression != Compression::None {
        if !json {
            println!("Detected compression: {}", compression);
        }
        Some(compression.to_string())
    } else {
        None
    };

    if !json {
        println!(
            "{}Extracting from: {} ({:.2} MB)",
            if dry_run { "Dry run: " } else { "" },
            file.display(),
            file_size_mb
        );
        println!("Tables: {}, {}", tables.posts, tables.meta);
        if let Some(path) = &rules {
            println!("Rules: {}", path.display());
        }
        println!();
    }

    let mut extractor = Extractor::new(file.clone()).with_tables(tables.clone());

    let start_time = Instant::now();

    let extraction = if progress && !json {
        let pb = ProgressBar::new(file_size);
        pb.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({percent}%) {msg}",
            )?
            .progress_chars("█▓▒░  ")
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        let pb_clone = pb.clone();
        extractor = extractor.with_progress(move |bytes| pb_clone.set_position(bytes));

        let extraction = extractor.extract()?;
        pb.finish_with_message("done");
        extraction
    } else {
        extractor.extract()?
    };

    let classification = rule_table.classify(&extraction.posts);
    let summary = Summary::build(
        &extraction.posts,
        &classification,
        extraction.meta_entries,
        extraction.orphan_post_ids.len(),
        &extraction.stats,
        chrono::Local::now().format("%Y-%m-%d").to_string(),
    );

    let files_written = if dry_run {
        Vec::new()
    } else {
        OutputWriter::new(output.clone()).write_extraction(
            &extraction.posts,
            &classification,
            &summary,
        )?
    };

    let elapsed = start_time.elapsed();

    if json {
        let output_json = ExtractJsonOutput {
            input_file: file.display().to_string(),
            output_dir: output.display().to_string(),
            compression: compression_str,
            posts_table: tables.posts,
            meta_table: tables.meta,
            dry_run,
            total_posts: extraction.posts.len(),
            meta_entries: extraction.meta_entries,
            orphan_meta_posts: extraction.orphan_post_ids.len(),
            subsets: classification
                .subsets
                .iter()
                .map(|s| (s.name().to_string(), s.len()))
                .collect(),
            files_written: files_written
                .iter()
                .map(|p| p.display().to_string())
                .collect(),
            statistics: extraction.stats.clone(),
            elapsed_secs: elapsed.as_secs_f64(),
        };
        println!("{}", serde_json::to_string_pretty(&output_json)?);
        return Ok(());
    }

    print_report(&extraction.stats, &classification, extraction.posts.len());
    println!();
    println!(
        "Metadata: {} entries ({} post ids without a post row)",
        extraction.meta_entries,
        extraction.orphan_post_ids.len()
    );
    if extraction.stats.rows_dropped > 0 || extraction.stats.truncated_statements > 0 {
        println!(
            "Warning: {} rows dropped (too few fields), {} statements truncated",
            extraction.stats.rows_dropped, extraction.stats.truncated_statements
        );
    }

    if dry_run {
        println!("\n✓ Dry run completed in {:.3?}", elapsed);
    } else {
        println!(
            "\n✓ Wrote {} files to {} in {:.3?}",
            files_written.len(),
            output.display(),
            elapsed
        );
    }

    Ok(())
}

fn print_report(stats: &ExtractStats, classification: &Classification<'_>, total_posts: usize) {
    println!("=== EXTRACTION SUMMARY ===");
    println!("Statements scanned: {}", stats.statements_processed);
    println!("Posts: {}", total_posts);
    for subset in &classification.subsets {
        println!("{}: {}", subset.name(), subset.len());
    }

    for subset in &classification.subsets {
        if subset.is_empty() {
            continue;
        }
        println!("\n=== {} ===", subset.name().to_uppercase());
        for (i, post) in subset.posts.iter().take(REPORT_LIMIT).enumerate() {
            println!("{}. {}", i + 1, post.post_title);
            println!(
                "   Type: {}, Slug: {}, Content: {} chars",
                post.post_type,
                post.post_name,
                post.post_content.chars().count()
            );
        }
        if subset.len() > REPORT_LIMIT {
            println!("   ... and {} more", subset.len() - REPORT_LIMIT);
        }
    }
}
