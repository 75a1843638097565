//! Directory scanner: one data file per table.
//!
//! ```text
//! sitedata/
//!   papers.csv      ─► tables["papers"]     (list of string records)
//!   speakers.yml    ─► tables["speakers"]
//!   faq.json        ─► tables["faq"]        (any JSON document)
//!   notes.txt       ─► ignored
//! ```

use super::error::DataError;
use serde_json::{Map, Value};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

/// Parse strategy, chosen from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Json,
    Csv,
    Tsv,
    Yaml,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str())? {
            "json" => Some(Self::Json),
            "csv" => Some(Self::Csv),
            "tsv" => Some(Self::Tsv),
            "yml" | "yaml" => Some(Self::Yaml),
            _ => None,
        }
    }
}

/// Raw result of scanning a data directory.
#[derive(Debug, Default)]
pub struct LoadedData {
    /// Table name (file stem) → parsed document
    pub tables: BTreeMap<String, Value>,
    /// Every file that produced a table, for the file watcher
    pub watch_list: Vec<PathBuf>,
}

/// Load every recognized file directly inside `dir`.
///
/// Hidden files and subdirectories are skipped. Files are visited in name
/// order so the watch list is stable.
pub fn load_dir(dir: &Path) -> Result<LoadedData, DataError> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|err| DataError::Io(dir.to_path_buf(), err))?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && !is_hidden(path))
        .collect();
    paths.sort();

    let mut loaded = LoadedData::default();
    let mut sources: BTreeMap<String, PathBuf> = BTreeMap::new();

    for path in paths {
        let Some(format) = SourceFormat::from_path(&path) else {
            continue;
        };
        let Some(name) = path.file_stem().and_then(|s| s.to_str()).map(str::to_owned) else {
            continue;
        };

        if let Some(first) = sources.get(&name) {
            return Err(DataError::DuplicateTable {
                name,
                first: first.clone(),
                second: path,
            });
        }

        let value = parse_file(&path, format)?;
        loaded.tables.insert(name.clone(), value);
        loaded.watch_list.push(path.clone());
        sources.insert(name, path);
    }

    Ok(loaded)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}

/// Parse one file into a data value.
pub fn parse_file(path: &Path, format: SourceFormat) -> Result<Value, DataError> {
    let content =
        fs::read_to_string(path).map_err(|err| DataError::Io(path.to_path_buf(), err))?;

    match format {
        SourceFormat::Json => serde_json::from_str(&content).map_err(|source| DataError::Json {
            path: path.to_path_buf(),
            source,
        }),
        SourceFormat::Yaml => {
            serde_yaml_ng::from_str(&content).map_err(|source| DataError::Yaml {
                path: path.to_path_buf(),
                source,
            })
        }
        SourceFormat::Csv => parse_delimited(&content, b',').map_err(|source| DataError::Csv {
            path: path.to_path_buf(),
            source,
        }),
        SourceFormat::Tsv => parse_delimited(&content, b'\t').map_err(|source| DataError::Csv {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Header row + data rows → list of `{header: cell}` records, header order kept.
fn parse_delimited(content: &str, delimiter: u8) -> Result<Value, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_reader(content.as_bytes());

    let headers = reader.headers()?.clone();
    let mut records = Vec::new();

    for row in reader.records() {
        let row = row?;
        let record: Map<String, Value> = headers
            .iter()
            .zip(row.iter())
            .map(|(key, cell)| (key.to_owned(), Value::String(cell.to_owned())))
            .collect();
        records.push(Value::Object(record));
    }

    Ok(Value::Array(records))
}
