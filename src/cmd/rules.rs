use std::fs;
use std::path::PathBuf;
use wp_extract::classify::RuleTable;

const HEADER: &str = "# wp-extract classification rules\n\
# Pass this file to `wp-extract extract --rules <file>`.\n\
# A post joins a subset when every `all` predicate holds and, if `any` is\n\
# present, at least one `any` predicate holds. `equals` is exact, `contains`\n\
# is a case-insensitive substring match.\n\n";

/// Print or write the built-in rule table.
pub fn run(output: Option<PathBuf>) -> anyhow::Result<()> {
    let yaml = format!("{}{}", HEADER, RuleTable::default().to_yaml()?);

    match output {
        Some(path) => {
            fs::write(&path, yaml)?;
            eprintln!("Wrote rules to {}", path.display());
        }
        None => print!("{}", yaml),
    }

    Ok(())
}
