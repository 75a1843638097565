//! Typed records for the entity tables.
//!
//! Raw tables are kept as loaded (`serde_json::Value`) so they can be served
//! verbatim. The entity tables are additionally parsed into these structs at
//! load time, which is where malformed data is reported.

use serde::{Deserialize, Deserializer, Serialize};
use std::{borrow::Borrow, fmt};

/// Unique identifier of a record within its table.
///
/// Sources may store it as a string or an integer; it is kept in string
/// form because it travels through URL paths and file names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Uid(String);

impl Uid {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Usable as a single path segment and URL component: non-empty, no
    /// separators, query/fragment marks or `%`, not `.`/`..`.
    pub fn is_path_safe(&self) -> bool {
        !self.0.is_empty()
            && self.0 != "."
            && self.0 != ".."
            && !self.0.contains(['/', '\\', '?', '#', '%'])
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Uid {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Uid {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl<'de> Deserialize<'de> for Uid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(serde_json::Number),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => Self(s),
            Raw::Number(n) => Self(n.to_string()),
        })
    }
}

/// A single text-like value. YAML and JSON sources write `1984` or `true`
/// where a string is meant; those are kept in their source spelling.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Number(serde_json::Number),
    Bool(bool),
}

impl From<Scalar> for String {
    fn from(scalar: Scalar) -> Self {
        match scalar {
            Scalar::Text(s) => s,
            Scalar::Number(n) => n.to_string(),
            Scalar::Bool(b) => b.to_string(),
        }
    }
}

/// `deserialize_with` for text fields that may hold a bare number or bool.
fn scalar_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Scalar::deserialize(deserializer).map(String::from)
}

/// A field holding several values: either a real list or one string
/// joined with `|` (CSV cells can only do the latter).
///
/// Numbers and bools count as text, `null` (an empty YAML key) as an empty
/// list, and `null` items inside a list are skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListField {
    List(Vec<String>),
    Delimited(String),
}

impl Default for ListField {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

impl<'de> Deserialize<'de> for ListField {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Null,
            List(Vec<Option<Scalar>>),
            One(Scalar),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Null => Self::default(),
            Raw::List(items) => Self::List(items.into_iter().flatten().map(String::from).collect()),
            Raw::One(scalar) => Self::Delimited(scalar.into()),
        })
    }
}

impl ListField {
    pub const SEPARATOR: char = '|';

    /// Normalize to a list of trimmed, non-empty entries.
    pub fn to_vec(&self) -> Vec<String> {
        let entries: Vec<&str> = match self {
            Self::List(items) => items.iter().map(String::as_str).collect(),
            Self::Delimited(joined) => joined.split(Self::SEPARATOR).collect(),
        };
        entries
            .into_iter()
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(str::to_owned)
            .collect()
    }
}

/// Implemented by the record type of each indexed table.
pub trait Entity: for<'de> Deserialize<'de> {
    /// Name of the table (file stem) the records come from.
    const TABLE: &'static str;

    fn uid(&self) -> &Uid;
}

/// Row of the `papers` table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PaperRecord {
    #[serde(rename = "UID")]
    pub uid: Uid,
    #[serde(deserialize_with = "scalar_text")]
    pub title: String,
    #[serde(rename = "abstract", deserialize_with = "scalar_text")]
    pub summary: String,
    #[serde(default)]
    pub authors: ListField,
    #[serde(default)]
    pub keywords: ListField,
    #[serde(default)]
    pub sessions: ListField,
    #[serde(default)]
    pub pdf_url: Option<String>,
    #[serde(default)]
    pub code_link: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
}

impl Entity for PaperRecord {
    const TABLE: &'static str = "papers";

    fn uid(&self) -> &Uid {
        &self.uid
    }
}

/// Row of the `speakers` table. Speaker pages render the raw record, so
/// only the required fields are checked here.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SpeakerRecord {
    #[serde(rename = "UID")]
    pub uid: Uid,
    #[serde(deserialize_with = "scalar_text")]
    pub title: String,
    #[serde(rename = "abstract", deserialize_with = "scalar_text")]
    pub summary: String,
}

impl Entity for SpeakerRecord {
    const TABLE: &'static str = "speakers";

    fn uid(&self) -> &Uid {
        &self.uid
    }
}

/// Row of the `workshops` table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorkshopRecord {
    #[serde(rename = "UID")]
    pub uid: Uid,
    #[serde(deserialize_with = "scalar_text")]
    pub title: String,
    #[serde(rename = "abstract", deserialize_with = "scalar_text")]
    pub summary: String,
    #[serde(default)]
    pub authors: ListField,
}

impl Entity for WorkshopRecord {
    const TABLE: &'static str = "workshops";

    fn uid(&self) -> &Uid {
        &self.uid
    }
}

/// Entry of the optional `highlighted` table: a pointer into `papers`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HighlightRecord {
    #[serde(rename = "UID")]
    pub uid: Uid,
}
