//! Reading documents from disk
//!
//! Every file is parsed lazily as the batch pulls from the iterator, so only
//! one document is held in memory on the input side at a time. Parsing goes
//! through simd-json straight into `serde_json::Value`.

use crate::melt::error::{MeltError, MeltResult};
use crate::melt::types::Document;
use anyhow::{Context, Result};
use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::info;

/// Parse one JSON text into a document
pub fn parse_document(source: Option<&str>, mut bytes: Vec<u8>) -> MeltResult<Document> {
    let value: Value = simd_json::serde::from_slice(&mut bytes).map_err(|e| MeltError::Parse {
        source_name: source.unwrap_or("<memory>").to_string(),
        message: e.to_string(),
    })?;

    Ok(Document {
        source: source.map(str::to_string),
        value,
    })
}

/// Files in `folder` matching any of `patterns`, sorted and de-duplicated
pub fn files_matching<P: AsRef<Path>>(folder: P, patterns: &[&str]) -> Result<Vec<PathBuf>> {
    let folder = folder.as_ref();
    let base = glob::Pattern::escape(&folder.to_string_lossy());

    let mut files = Vec::new();
    for pattern in patterns {
        let full = format!("{}/{}", base, pattern);
        let entries = glob::glob(&full).with_context(|| format!("Invalid file pattern: {}", full))?;
        for entry in entries {
            files.push(entry.context("Failed to read directory entry")?);
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

/// `*.json` files in `folder`
pub fn json_files_in<P: AsRef<Path>>(folder: P) -> Result<Vec<PathBuf>> {
    files_matching(folder, &["*.json"])
}

/// `*.jsonl` and `*.ndjson` files in `folder`
pub fn ndjson_files_in<P: AsRef<Path>>(folder: P) -> Result<Vec<PathBuf>> {
    files_matching(folder, &["*.jsonl", "*.ndjson"])
}

/// One document per file
pub fn read_documents<I, P>(paths: I) -> impl Iterator<Item = MeltResult<Document>>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    paths.into_iter().map(|path| read_document(path.as_ref()))
}

pub fn read_document(path: &Path) -> MeltResult<Document> {
    info!("Parsing {}", path.display());
    let bytes = std::fs::read(path).map_err(|source| MeltError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_document(Some(&path.display().to_string()), bytes)
}

/// One document per non-blank line, sourced as `path:line`
pub fn read_ndjson<I, P>(paths: I) -> impl Iterator<Item = MeltResult<Document>>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    paths
        .into_iter()
        .flat_map(|path| ndjson_lines(path.as_ref().to_path_buf()))
}

fn ndjson_lines(path: PathBuf) -> Box<dyn Iterator<Item = MeltResult<Document>>> {
    info!("Parsing {}", path.display());
    let file = match File::open(&path) {
        Ok(file) => file,
        Err(source) => return Box::new(std::iter::once(Err(MeltError::Io { path, source }))),
    };

    let name = path.display().to_string();
    Box::new(
        BufReader::new(file)
            .lines()
            .enumerate()
            .filter_map(move |(idx, line)| match line {
                Err(source) => Some(Err(MeltError::Io {
                    path: path.clone(),
                    source,
                })),
                Ok(line) if line.trim().is_empty() => None,
                Ok(line) => Some(parse_document(
                    Some(&format!("{}:{}", name, idx + 1)),
                    line.into_bytes(),
                )),
            }),
    )
}
