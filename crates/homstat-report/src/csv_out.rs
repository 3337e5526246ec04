//! Writing result tables to CSV files.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use polars::prelude::{CsvWriter, DataFrame, SerWriter};
use tracing::info;

#[derive(Debug, Clone)]
pub struct CsvOutputOptions {
    pub output_dir: PathBuf,
    /// Resolve target paths and log them without touching the filesystem.
    pub dry_run: bool,
}

impl CsvOutputOptions {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            dry_run: false,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// Write one table under the output directory, returning the target path.
///
/// The directory is created on demand. In dry-run mode nothing is written
/// and the directory is not created; the returned path is where the file
/// would have gone.
pub fn write_table(
    df: &mut DataFrame,
    options: &CsvOutputOptions,
    file_name: &str,
) -> Result<PathBuf> {
    let path = options.output_dir.join(file_name);
    if options.dry_run {
        info!(path = %path.display(), rows = df.height(), "dry run, output not written");
        return Ok(path);
    }
    std::fs::create_dir_all(&options.output_dir).with_context(|| {
        format!(
            "Failed to create output directory: {}",
            options.output_dir.display()
        )
    })?;
    write_csv(df, &path)?;
    info!(path = %path.display(), rows = df.height(), "output written");
    Ok(path)
}

/// Write several named tables, returning the target paths in order.
pub fn write_tables(
    tables: &mut [(String, DataFrame)],
    options: &CsvOutputOptions,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(tables.len());
    for (file_name, df) in tables {
        written.push(write_table(df, options, file_name)?);
    }
    Ok(written)
}

fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    CsvWriter::new(file)
        .include_header(true)
        .finish(df)
        .with_context(|| format!("Failed to write CSV: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::{NamedFrom, Series};

    fn sample() -> DataFrame {
        DataFrame::new(vec![
            Series::new("Country".into(), vec!["Spain", "France"]).into(),
            Series::new("Year".into(), vec![2000i32, 2001]).into(),
        ])
        .unwrap()
    }

    #[test]
    fn writes_csv_and_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let options = CsvOutputOptions::new(dir.path().join("nested").join("out"));
        let path = write_table(&mut sample(), &options, "table.csv").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("Country,Year"));
        assert_eq!(content.lines().count(), 3);
    }

    #[test]
    fn dry_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let options = CsvOutputOptions::new(dir.path().join("out")).dry_run(true);
        let path = write_table(&mut sample(), &options, "table.csv").unwrap();

        assert!(!path.exists());
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn write_tables_returns_paths_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let options = CsvOutputOptions::new(dir.path());
        let mut tables = vec![
            ("a.csv".to_string(), sample()),
            ("b.csv".to_string(), sample()),
        ];
        let written = write_tables(&mut tables, &options).unwrap();
        assert_eq!(written.len(), 2);
        assert!(written[0].ends_with("a.csv"));
        assert!(written[1].ends_with("b.csv"));
    }
}
