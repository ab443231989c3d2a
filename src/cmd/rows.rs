use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::PathBuf;
use tracing::warn;
use wp_extract::extractor::Compression;
use wp_extract::parser::{
    determine_buffer_size, normalize_row, rows_from_statement, Parser, StatementType,
};

/// Print every row of `table` as one JSON array per line.
pub fn run(file: PathBuf, table: String, limit: Option<usize>, raw: bool) -> anyhow::Result<()> {
    if !file.exists() {
        anyhow::bail!("input file does not exist: {}", file.display());
    }

    let handle = File::open(&file)?;
    let buffer_size = determine_buffer_size(handle.metadata()?.len());
    let reader: Box<dyn Read> = Compression::from_path(&file).wrap_reader(Box::new(handle))?;
    let mut parser = Parser::new(reader, buffer_size);

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut printed = 0usize;

    'statements: while let Some(stmt) = parser.read_statement()? {
        let (stmt_type, name) = Parser::<&[u8]>::parse_statement(&stmt);
        if stmt_type != StatementType::Insert || name != table {
            continue;
        }

        let text = String::from_utf8_lossy(&stmt);
        let mut rows = rows_from_statement(&text);
        for row in rows.by_ref() {
            if limit.is_some_and(|max| printed >= max) {
                break 'statements;
            }
            let line = if raw {
                serde_json::to_string(&row)?
            } else {
                serde_json::to_string(&normalize_row(&row))?
            };
            writeln!(out, "{}", line)?;
            printed += 1;
        }

        if rows.truncated() {
            warn!(table = %table, "value list ended mid-row; later rows were lost");
        }
    }

    out.flush()?;

    if printed == 0 && limit != Some(0) {
        eprintln!("No rows found for table '{}'", table);
    }

    Ok(())
}
