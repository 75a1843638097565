//! UID → position index for the entity tables.

use super::{error::DataError, types::Uid};
use rustc_hash::FxHashMap;

/// Maps each UID to the position of its record in the loaded table.
///
/// Built once; duplicate or path-unsafe UIDs are rejected at build time.
#[derive(Debug, Default, Clone)]
pub struct UidIndex {
    positions: FxHashMap<Uid, usize>,
}

impl UidIndex {
    pub fn build<'a>(
        table: &'static str,
        uids: impl IntoIterator<Item = &'a Uid>,
    ) -> Result<Self, DataError> {
        let mut positions = FxHashMap::default();

        for (index, uid) in uids.into_iter().enumerate() {
            if !uid.is_path_safe() {
                return Err(DataError::InvalidUid {
                    table,
                    index,
                    uid: uid.to_string(),
                });
            }
            if positions.insert(uid.clone(), index).is_some() {
                return Err(DataError::DuplicateUid {
                    table,
                    uid: uid.to_string(),
                });
            }
        }

        Ok(Self { positions })
    }

    #[inline]
    pub fn position(&self, uid: &str) -> Option<usize> {
        self.positions.get(uid).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uids(raw: &[&str]) -> Vec<Uid> {
        raw.iter().map(|s| Uid::from(*s)).collect()
    }

    #[test]
    fn test_positions() {
        let index = UidIndex::build("papers", &uids(&["a", "b", "c"])).unwrap();

        assert_eq!(index.position("a"), Some(0));
        assert_eq!(index.position("c"), Some(2));
        assert_eq!(index.position("nonexistent-999"), None);
    }

    #[test]
    fn test_duplicate_rejected() {
        let err = UidIndex::build("speakers", &uids(&["x", "y", "x"])).unwrap_err();
        assert!(matches!(
            err,
            DataError::DuplicateUid { table: "speakers", ref uid } if uid == "x"
        ));
    }

    #[test]
    fn test_unsafe_uid_rejected() {
        let err = UidIndex::build("papers", &uids(&["ok", "../etc"])).unwrap_err();
        assert!(matches!(err, DataError::InvalidUid { index: 1, .. }));
    }

    #[test]
    fn test_empty() {
        let index = UidIndex::build("workshops", &[]).unwrap();
        assert_eq!(index.position(""), None);
    }
}
