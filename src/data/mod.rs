//! Site data: flat files loaded once into immutable tables.
//!
//! # Architecture
//!
//! ```text
//! sitedata/*.{json,csv,tsv,yml}
//!        │
//!        ▼  loader::load_dir
//! tables: BTreeMap<name, Value>  ──────────────► serve_<name>.json (verbatim)
//!        │
//!        ▼  typed parse + UidIndex::build
//! papers / speakers / workshops: EntityTable<T>  ─► item pages, papers.json
//! ```
//!
//! Any problem (missing table, malformed record, duplicate UID) is a
//! [`DataError`] raised here, before a single page is rendered.

mod error;
pub mod format;
mod index;
pub mod loader;
pub mod types;

pub use error::DataError;
pub use index::UidIndex;
pub use loader::LoadedData;
pub use types::{Entity, PaperRecord, SpeakerRecord, WorkshopRecord};

use serde::Deserialize;
use serde_json::Value;
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};
use types::HighlightRecord;

/// Records of one indexed table, in source order, plus their UID index.
#[derive(Debug, Clone)]
pub struct EntityTable<T> {
    records: Vec<T>,
    index: UidIndex,
}

impl<T: Entity> EntityTable<T> {
    /// Parse every record of `table` into `T` and index it.
    fn from_table(table: &Value) -> Result<Self, DataError> {
        let rows = table.as_array().ok_or(DataError::NotASequence(T::TABLE))?;

        let records = rows
            .iter()
            .enumerate()
            .map(|(index, row)| {
                if row.get("UID").is_none() {
                    return Err(DataError::MissingUid {
                        table: T::TABLE,
                        index,
                    });
                }
                T::deserialize(row).map_err(|source| DataError::InvalidRecord {
                    table: T::TABLE,
                    index,
                    source,
                })
            })
            .collect::<Result<Vec<T>, _>>()?;

        let index = UidIndex::build(T::TABLE, records.iter().map(|record| record.uid()))?;
        Ok(Self { records, index })
    }

    pub fn get(&self, uid: &str) -> Option<&T> {
        self.index.position(uid).map(|pos| &self.records[pos])
    }

    /// Position of `uid` in the source table.
    pub fn position(&self, uid: &str) -> Option<usize> {
        self.index.position(uid)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Everything loaded from the data directory.
///
/// Never mutated after [`SiteData::load`]; a reload builds a new value.
#[derive(Debug, Clone)]
pub struct SiteData {
    tables: BTreeMap<String, Value>,
    papers: EntityTable<PaperRecord>,
    speakers: EntityTable<SpeakerRecord>,
    workshops: EntityTable<WorkshopRecord>,
    highlighted: Vec<HighlightRecord>,
    watch_list: Vec<PathBuf>,
}

impl SiteData {
    /// Load and validate every table in `dir`.
    pub fn load(dir: &Path) -> Result<Self, DataError> {
        Self::from_loaded(loader::load_dir(dir)?)
    }

    /// Validate already-parsed tables and build the indexes.
    pub fn from_loaded(loaded: LoadedData) -> Result<Self, DataError> {
        let LoadedData { tables, watch_list } = loaded;

        let papers = EntityTable::from_table(require(&tables, PaperRecord::TABLE)?)?;
        let speakers = EntityTable::from_table(require(&tables, SpeakerRecord::TABLE)?)?;
        let workshops = EntityTable::from_table(require(&tables, WorkshopRecord::TABLE)?)?;
        let highlighted = parse_highlighted(tables.get(HIGHLIGHTED), &papers)?;

        Ok(Self {
            tables,
            papers,
            speakers,
            workshops,
            highlighted,
            watch_list,
        })
    }

    pub fn table(&self, name: &str) -> Option<&Value> {
        self.tables.get(name)
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn papers(&self) -> &EntityTable<PaperRecord> {
        &self.papers
    }

    pub fn speakers(&self) -> &EntityTable<SpeakerRecord> {
        &self.speakers
    }

    pub fn workshops(&self) -> &EntityTable<WorkshopRecord> {
        &self.workshops
    }

    /// Papers featured on the schedule page, in `highlighted` order.
    pub fn highlighted_papers(&self) -> impl Iterator<Item = &PaperRecord> {
        self.highlighted
            .iter()
            .filter_map(|h| self.papers.get(h.uid.as_str()))
    }

    /// The loaded record for `uid` in one of the indexed tables, exactly as
    /// it appears in [`SiteData::table`].
    pub fn record(&self, table: &str, uid: &str) -> Option<&Value> {
        let position = match table {
            PaperRecord::TABLE => self.papers.position(uid),
            SpeakerRecord::TABLE => self.speakers.position(uid),
            WorkshopRecord::TABLE => self.workshops.position(uid),
            _ => None,
        }?;
        self.tables.get(table)?.get(position)
    }

    /// `config` table: site-wide values for templates.
    pub fn site_config(&self) -> Value {
        self.tables
            .get("config")
            .cloned()
            .unwrap_or_else(|| Value::Object(Default::default()))
    }

    /// A list nested in a singleton table, e.g. `faq.FAQ`; empty if absent.
    pub fn nested_list(&self, table: &str, key: &str) -> Value {
        self.tables
            .get(table)
            .and_then(|t| t.get(key))
            .cloned()
            .unwrap_or_else(|| Value::Array(Vec::new()))
    }

    /// Files the data was loaded from.
    pub fn watch_list(&self) -> &[PathBuf] {
        &self.watch_list
    }
}

const HIGHLIGHTED: &str = "highlighted";

fn require<'a>(
    tables: &'a BTreeMap<String, Value>,
    name: &'static str,
) -> Result<&'a Value, DataError> {
    tables.get(name).ok_or(DataError::MissingTable(name))
}

/// Parse the optional `highlighted` table; every entry must name a paper.
fn parse_highlighted(
    table: Option<&Value>,
    papers: &EntityTable<PaperRecord>,
) -> Result<Vec<HighlightRecord>, DataError> {
    let Some(table) = table else {
        return Ok(Vec::new());
    };
    let rows = table.as_array().ok_or(DataError::NotASequence(HIGHLIGHTED))?;

    rows.iter()
        .enumerate()
        .map(|(index, row)| {
            let entry = HighlightRecord::deserialize(row).map_err(|source| {
                DataError::InvalidRecord {
                    table: HIGHLIGHTED,
                    index,
                    source,
                }
            })?;
            if papers.get(entry.uid.as_str()).is_none() {
                return Err(DataError::DanglingReference {
                    table: HIGHLIGHTED,
                    target: PaperRecord::TABLE,
                    uid: entry.uid.to_string(),
                });
            }
            Ok(entry)
        })
        .collect()
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn load_fixture() -> (TempDir, SiteData) {
        let dir = fixture::site_dir();
        let data = SiteData::load(&dir.path().join("sitedata")).unwrap();
        (dir, data)
    }

    fn minimal(papers: &str) -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("papers.json"), papers).unwrap();
        fs::write(dir.path().join("speakers.json"), "[]").unwrap();
        fs::write(dir.path().join("workshops.json"), "[]").unwrap();
        dir
    }

    #[test]
    fn test_load_fixture() {
        let (_dir, data) = load_fixture();

        assert_eq!(data.papers().len(), 2);
        assert_eq!(data.speakers().len(), 1);
        assert_eq!(data.workshops().len(), 1);
        assert_eq!(
            data.table_names().collect::<Vec<_>>(),
            vec!["committee", "config", "faq", "highlighted", "papers", "speakers", "workshops"]
        );
        assert_eq!(data.watch_list().len(), 7);
    }

    #[test]
    fn test_formatted_authors_from_fixture() {
        let (_dir, data) = load_fixture();
        let authors: Vec<_> = data
            .papers()
            .iter()
            .map(|p| format::format_paper(p).authors)
            .collect();

        assert_eq!(authors, vec![vec!["A", "B"], vec!["C", "D"]]);
    }

    #[test]
    fn test_workshop_csv_organizers() {
        let (_dir, data) = load_fixture();
        let workshop = data.workshops().get("w1").unwrap();

        assert_eq!(format::format_workshop(workshop).organizers, vec!["Ada", "Grace"]);
    }

    #[test]
    fn test_record_lookup_returns_loaded_record() {
        let (_dir, data) = load_fixture();

        for (table, uids) in [
            ("papers", vec!["p1", "p2"]),
            ("speakers", vec!["s1"]),
            ("workshops", vec!["w1"]),
        ] {
            let rows = data.table(table).unwrap().as_array().unwrap();
            for uid in uids {
                let record = data.record(table, uid).unwrap();
                assert!(std::ptr::eq(record, rows.iter().find(|r| r["UID"] == uid).unwrap()));
            }
        }
        assert!(data.record("papers", "nonexistent-999").is_none());
        assert!(data.record("faq", "p1").is_none());
    }

    #[test]
    fn test_highlighted_papers() {
        let (_dir, data) = load_fixture();
        let titles: Vec<_> = data.highlighted_papers().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Lists"]);
    }

    #[test]
    fn test_singleton_tables() {
        let (_dir, data) = load_fixture();

        assert_eq!(data.site_config()["name"], json!("TestConf"));
        assert_eq!(data.nested_list("committee", "committee")[0]["name"], json!("Grace Hopper"));
        assert_eq!(data.nested_list("faq", "FAQ").as_array().unwrap().len(), 1);
        assert_eq!(data.nested_list("absent", "anything"), json!([]));
    }

    #[test]
    fn test_numeric_uid_lookup() {
        let dir = minimal(r#"[{"UID": 7, "title": "Seven", "abstract": "x"}]"#);
        let data = SiteData::load(dir.path()).unwrap();

        assert_eq!(data.papers().get("7").unwrap().title, "Seven");
        assert_eq!(data.record("papers", "7").unwrap()["UID"], json!(7));
    }

    #[test]
    fn test_yaml_papers_with_loose_scalars() {
        let dir = minimal("[]");
        fs::remove_file(dir.path().join("papers.json")).unwrap();
        fs::write(
            dir.path().join("papers.yml"),
            "\
- UID: p1
  title: 1984
  abstract: Orwell, revisited.
  authors:
  keywords: [2020, nlp]
  sessions: true
- UID: 2
  title: Plain
  abstract: 3.5
  authors: [Ada, ~, Grace]
",
        )
        .unwrap();

        let data = SiteData::load(dir.path()).unwrap();
        let first = data.papers().get("p1").unwrap();
        assert_eq!(first.title, "1984");
        assert!(first.authors.to_vec().is_empty());
        assert_eq!(first.keywords.to_vec(), vec!["2020", "nlp"]);
        assert_eq!(first.sessions.to_vec(), vec!["true"]);

        let second = data.papers().get("2").unwrap();
        assert_eq!(second.summary, "3.5");
        assert_eq!(second.authors.to_vec(), vec!["Ada", "Grace"]);
    }

    #[test]
    fn test_missing_required_table() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("papers.json"), "[]").unwrap();
        fs::write(dir.path().join("speakers.json"), "[]").unwrap();

        let err = SiteData::load(dir.path()).unwrap_err();
        assert!(matches!(err, DataError::MissingTable("workshops")));
    }

    #[test]
    fn test_missing_uid() {
        let dir = minimal(r#"[{"UID": "a", "title": "t", "abstract": "x"}, {"title": "t", "abstract": "x"}]"#);

        let err = SiteData::load(dir.path()).unwrap_err();
        assert!(matches!(err, DataError::MissingUid { table: "papers", index: 1 }));
    }

    #[test]
    fn test_duplicate_uid_rejected() {
        let dir = minimal(
            r#"[{"UID": "a", "title": "one", "abstract": "x"}, {"UID": "a", "title": "two", "abstract": "y"}]"#,
        );

        let err = SiteData::load(dir.path()).unwrap_err();
        assert!(matches!(err, DataError::DuplicateUid { table: "papers", .. }));
    }

    #[test]
    fn test_malformed_record() {
        let dir = minimal(r#"[{"UID": "a", "title": ["not", "a", "string"], "abstract": "x"}]"#);

        let err = SiteData::load(dir.path()).unwrap_err();
        assert!(matches!(err, DataError::InvalidRecord { table: "papers", index: 0, .. }));
    }

    #[test]
    fn test_entity_table_must_be_list() {
        let dir = minimal(r#"{"UID": "a"}"#);

        let err = SiteData::load(dir.path()).unwrap_err();
        assert!(matches!(err, DataError::NotASequence("papers")));
    }

    #[test]
    fn test_dangling_highlight() {
        let dir = minimal(r#"[{"UID": "a", "title": "t", "abstract": "x"}]"#);
        fs::write(dir.path().join("highlighted.csv"), "UID\nzzz\n").unwrap();

        let err = SiteData::load(dir.path()).unwrap_err();
        assert!(matches!(err, DataError::DanglingReference { ref uid, .. } if uid == "zzz"));
    }
}
