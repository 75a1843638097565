//! Data loading error types.
//!
//! Every variant is fatal: the site is never served from a partially
//! loaded data directory.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("`{path}` is not valid JSON")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("`{path}` is not valid CSV")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("`{path}` is not valid YAML")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml_ng::Error,
    },

    #[error("table `{name}` is defined twice: `{first}` and `{second}`")]
    DuplicateTable {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("required table `{0}` is missing from the data directory")]
    MissingTable(&'static str),

    #[error("table `{0}` must be a list of records")]
    NotASequence(&'static str),

    #[error("record #{index} in `{table}` has no `UID` field")]
    MissingUid { table: &'static str, index: usize },

    #[error("record #{index} in `{table}` has an unusable UID `{uid}`")]
    InvalidUid {
        table: &'static str,
        index: usize,
        uid: String,
    },

    #[error("record #{index} in `{table}` is malformed")]
    InvalidRecord {
        table: &'static str,
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("UID `{uid}` appears more than once in `{table}`")]
    DuplicateUid { table: &'static str, uid: String },

    #[error("`{table}` refers to UID `{uid}`, which is not in `{target}`")]
    DanglingReference {
        table: &'static str,
        target: &'static str,
        uid: String,
    },
}
