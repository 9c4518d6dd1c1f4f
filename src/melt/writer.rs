use crate::melt::flatten::unique_name;
use crate::melt::registry::TableRegistry;
use crate::melt::table::Table;
use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::borrow::Cow;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Header of the optional row number column
pub const INDEX_COLUMN: &str = "";

/// Output directory plus the files writers must never overwrite
struct OutputDir {
    dir: PathBuf,
    protected: Vec<PathBuf>,
}

impl OutputDir {
    fn create(output_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(output_dir).context("Failed to create output directory")?;
        Ok(OutputDir {
            dir: output_dir.to_path_buf(),
            protected: Vec::new(),
        })
    }

    fn protect<I, P>(&mut self, paths: I)
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.protected
            .extend(paths.into_iter().map(|p| canonical(p.as_ref())));
    }

    fn target(&self, stem: &str, extension: &str) -> Result<PathBuf> {
        let path = self.dir.join(format!("{}.{}", stem, extension));
        if self.protected.contains(&canonical(&path)) {
            bail!("Refusing to overwrite input file: {}", path.display());
        }
        Ok(path)
    }

    /// One file per table with columns, in registry order
    ///
    /// Every path is checked before anything is written. Contexts whose
    /// file names clash get a numeric suffix.
    fn plan<'r>(
        &self,
        registry: &'r TableRegistry,
        extension: &str,
    ) -> Result<Vec<(&'r str, &'r Table, PathBuf)>> {
        let mut used: HashSet<String> = HashSet::new();
        let mut targets = Vec::with_capacity(registry.len());

        for (name, table) in registry.iter() {
            if table.width() == 0 {
                info!(table = name, rows = table.len(), "skipping table without columns");
                continue;
            }

            let base = file_stem(name);
            let stem = unique_name(base.to_string(), |s| used.contains(s));
            if stem != base {
                warn!(table = name, file = stem.as_str(), "file name clash, writing under a suffixed name");
            }
            targets.push((name, table, self.target(&stem, extension)?));
            used.insert(stem);
        }

        Ok(targets)
    }
}

/// Writes each table to `<dir>/<context>.csv`
pub struct CsvTableWriter {
    out: OutputDir,
    include_index: bool,
}

impl CsvTableWriter {
    /// Create a writer for `output_dir`, creating the directory if needed
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Result<Self> {
        Ok(CsvTableWriter {
            out: OutputDir::create(output_dir.as_ref())?,
            include_index: false,
        })
    }

    /// Prefix every row with its 0-based row number
    pub fn with_index(mut self, include_index: bool) -> Self {
        self.include_index = include_index;
        self
    }

    /// Never write over any of `inputs`
    pub fn protect<I, P>(mut self, inputs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.out.protect(inputs);
        self
    }

    pub fn write_table(&self, name: &str, table: &Table) -> Result<PathBuf> {
        let path = self.out.target(&file_stem(name), "csv")?;
        self.write_to(&path, name, table)?;
        Ok(path)
    }

    /// Write every table with columns; returns the files written, in registry order
    pub fn write_registry(&self, registry: &TableRegistry) -> Result<Vec<PathBuf>> {
        let targets = self.out.plan(registry, "csv")?;
        for (name, table, path) in &targets {
            self.write_to(path, name, table)?;
        }
        Ok(targets.into_iter().map(|(_, _, path)| path).collect())
    }

    fn write_to(&self, path: &Path, name: &str, table: &Table) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("Failed to open file: {}", path.display()))?;

        let mut header: Vec<&str> = Vec::with_capacity(table.width() + 1);
        if self.include_index {
            header.push(INDEX_COLUMN);
        }
        header.extend(table.columns().iter().map(String::as_str));
        writer.write_record(&header).context("Failed to write CSV header")?;

        for (idx, row) in table.rows().iter().enumerate() {
            let mut record: Vec<Cow<'_, str>> = Vec::with_capacity(row.len() + 1);
            if self.include_index {
                record.push(Cow::Owned(idx.to_string()));
            }
            record.extend(row.iter().map(render_cell));
            writer
                .write_record(record.iter().map(|cell| cell.as_bytes()))
                .context("Failed to write CSV row")?;
        }

        writer.flush().context("Failed to flush writer")?;
        info!(table = name, rows = table.len(), path = %path.display(), "wrote table");
        Ok(())
    }
}

/// Writes each table to `<dir>/<context>.jsonl`, one object per row
pub struct JsonlTableWriter {
    out: OutputDir,
}

impl JsonlTableWriter {
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Result<Self> {
        Ok(JsonlTableWriter {
            out: OutputDir::create(output_dir.as_ref())?,
        })
    }

    /// Never write over any of `inputs`
    pub fn protect<I, P>(mut self, inputs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.out.protect(inputs);
        self
    }

    pub fn write_table(&self, name: &str, table: &Table) -> Result<PathBuf> {
        let path = self.out.target(&file_stem(name), "jsonl")?;
        write_jsonl(&path, name, table)?;
        Ok(path)
    }

    pub fn write_registry(&self, registry: &TableRegistry) -> Result<Vec<PathBuf>> {
        let targets = self.out.plan(registry, "jsonl")?;
        for (name, table, path) in &targets {
            write_jsonl(path, name, table)?;
        }
        Ok(targets.into_iter().map(|(_, _, path)| path).collect())
    }
}

fn write_jsonl(path: &Path, name: &str, table: &Table) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to open file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    for record in table.records() {
        let json = serde_json::to_string(&record).context("Failed to serialize row")?;
        writeln!(writer, "{}", json).context("Failed to write row")?;
    }

    writer.flush().context("Failed to flush writer")?;
    info!(table = name, rows = table.len(), path = %path.display(), "wrote table");
    Ok(())
}

/// Text of one CSV cell: null is empty, strings are raw, the rest is JSON
fn render_cell(value: &Value) -> Cow<'_, str> {
    match value {
        Value::Null => Cow::Borrowed(""),
        Value::String(s) => Cow::Borrowed(s.as_str()),
        other => Cow::Owned(other.to_string()),
    }
}

/// Context names are raw JSON keys; keep them from escaping the output dir
fn file_stem(name: &str) -> Cow<'_, str> {
    if name.is_empty() {
        return Cow::Borrowed("_");
    }
    if name.contains(['/', '\\']) || name == "." || name == ".." {
        return Cow::Owned(name.replace(['/', '\\', '.'], "_"));
    }
    Cow::Borrowed(name)
}

/// Resolve symlinks and relative parts so the same file compares equal
fn canonical(path: &Path) -> PathBuf {
    if let Ok(resolved) = path.canonicalize() {
        return resolved;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(file)) => parent
            .canonicalize()
            .map(|p| p.join(file))
            .unwrap_or_else(|_| path.to_path_buf()),
        _ => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    fn sample_registry() -> TableRegistry {
        let rows: Vec<Map<String, Value>> = vec![
            json!({"json.id": 7, "sku": "X1", "qty": 2, "tags": ["a", "b"]}),
            json!({"json.id": 7, "sku": "X, 2", "qty": null, "tags": []}),
        ]
        .into_iter()
        .filter_map(|v| v.as_object().cloned())
        .collect();

        let mut registry = TableRegistry::new();
        registry.insert("orders", Table::from_records(rows));
        registry
    }

    #[test]
    fn test_csv_writer() {
        let dir = tempfile::tempdir().unwrap();
        let writer = CsvTableWriter::new(dir.path()).unwrap();

        let written = writer.write_registry(&sample_registry()).unwrap();
        assert_eq!(written, [dir.path().join("orders.csv")]);

        let content = std::fs::read_to_string(&written[0]).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "json.id,sku,qty,tags");
        assert_eq!(lines[1], r#"7,X1,2,"[""a"",""b""]""#);
        assert_eq!(lines[2], r#"7,"X, 2",,[]"#);
    }

    #[test]
    fn test_csv_writer_with_index() {
        let dir = tempfile::tempdir().unwrap();
        let writer = CsvTableWriter::new(dir.path().join("out")).unwrap().with_index(true);

        let written = writer.write_registry(&sample_registry()).unwrap();
        let content = std::fs::read_to_string(&written[0]).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], ",json.id,sku,qty,tags");
        assert!(lines[1].starts_with("0,7,X1"));
        assert!(lines[2].starts_with("1,7,"));
    }

    #[test]
    fn test_jsonl_writer_keeps_column_order() {
        let dir = tempfile::tempdir().unwrap();
        let writer = JsonlTableWriter::new(dir.path()).unwrap();

        let written = writer.write_registry(&sample_registry()).unwrap();
        let content = std::fs::read_to_string(&written[0]).unwrap();
        let first = content.lines().next().unwrap();
        assert_eq!(first, r#"{"json.id":7,"sku":"X1","qty":2,"tags":["a","b"]}"#);
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn test_refuses_to_overwrite_input_named_after_context() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("orders.jsonl");
        let original = "{\"id\":1,\"orders\":[{\"sku\":\"A\"}]}\n";
        std::fs::write(&input, original).unwrap();

        let mut registry = sample_registry();
        registry.insert(
            "json",
            Table::from_records(json!({"id": 1}).as_object().cloned()),
        );

        let writer = JsonlTableWriter::new(dir.path()).unwrap().protect([&input]);
        let err = writer.write_registry(&registry).unwrap_err();
        assert!(err.to_string().contains("Refusing to overwrite input file"));

        // Checked up front: nothing written, input untouched
        assert_eq!(std::fs::read_to_string(&input).unwrap(), original);
        assert!(!dir.path().join("json.jsonl").exists());

        // Same file reached through a different spelling of the directory
        let dotted = dir.path().join(".");
        let writer = JsonlTableWriter::new(&dotted).unwrap().protect([&input]);
        assert!(writer.write_table("orders", registry.get("orders").unwrap()).is_err());
        assert_eq!(std::fs::read_to_string(&input).unwrap(), original);
    }

    #[test]
    fn test_clashing_file_names_are_suffixed() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = TableRegistry::new();
        registry.insert("a/b", Table::from_records(json!({"x": 1}).as_object().cloned()));
        registry.insert("a_b", Table::from_records(json!({"y": 2}).as_object().cloned()));

        let written = CsvTableWriter::new(dir.path()).unwrap().write_registry(&registry).unwrap();
        assert_eq!(written, [dir.path().join("a_b.csv"), dir.path().join("a_b1.csv")]);

        assert!(std::fs::read_to_string(&written[0]).unwrap().starts_with("x\n"));
        assert!(std::fs::read_to_string(&written[1]).unwrap().starts_with("y\n"));
    }

    #[test]
    fn test_tables_without_columns_are_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = sample_registry();
        registry.insert("json", Table::from_records(vec![Map::new()]));

        let written = CsvTableWriter::new(dir.path()).unwrap().write_registry(&registry).unwrap();
        assert_eq!(written, [dir.path().join("orders.csv")]);
        assert!(!dir.path().join("json.csv").exists());
    }

    #[test]
    fn test_file_stem_sanitizes_paths() {
        assert_eq!(file_stem("orders"), "orders");
        assert_eq!(file_stem("a.b"), "a.b");
        assert_eq!(file_stem("../etc"), "___etc");
        assert_eq!(file_stem(""), "_");
    }
}
