use std::collections::HashMap;

use crate::models::record::CanonicalRecord;

/// Identifier-keyed accumulator with last-write-wins semantics.
///
/// A record seen again replaces the earlier value but keeps the position of
/// its first appearance, so iteration order stays the upstream order.
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    records: Vec<CanonicalRecord>,
    index: HashMap<String, usize>,
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, returning the value it replaced.
    pub fn insert(&mut self, record: CanonicalRecord) -> Option<CanonicalRecord> {
        match self.index.get(&record.id) {
            Some(&slot) => Some(std::mem::replace(&mut self.records[slot], record)),
            None => {
                self.index.insert(record.id.clone(), self.records.len());
                self.records.push(record);
                None
            }
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_vec(self) -> Vec<CanonicalRecord> {
        self.records
    }
}

impl Extend<CanonicalRecord> for RecordSet {
    fn extend<I: IntoIterator<Item = CanonicalRecord>>(&mut self, iter: I) {
        for record in iter {
            self.insert(record);
        }
    }
}

impl FromIterator<CanonicalRecord> for RecordSet {
    fn from_iter<I: IntoIterator<Item = CanonicalRecord>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_duplicate_wins_and_keeps_first_position() {
        let mut first = CanonicalRecord::new("a", "Old title");
        first.tags = vec!["old".into()];
        let second = CanonicalRecord::new("b", "Other");
        let mut replacement = CanonicalRecord::new("a", "New title");
        replacement.tags = vec!["new".into()];

        let set: RecordSet = vec![first, second, replacement.clone()].into_iter().collect();

        assert_eq!(set.len(), 2);
        let records = set.into_vec();
        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(records[0], replacement);
    }

    #[test]
    fn insert_returns_replaced_value() {
        let mut set = RecordSet::new();
        assert!(set.insert(CanonicalRecord::new("a", "One")).is_none());
        let old = set.insert(CanonicalRecord::new("a", "Two")).unwrap();
        assert_eq!(old.title, "One");
        assert_eq!(set.into_vec()[0].title, "Two");
    }
}
