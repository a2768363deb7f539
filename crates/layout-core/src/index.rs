use std::collections::HashMap;

use crate::media::{MediaRecord, RecordKey};

/// Records of one (year, month)
pub type Bucket = HashMap<RecordKey, MediaRecord>;

/// year -> month -> records, built by the scanner and consumed by dedup and
/// the writer. Buckets are created on first insert and dropped when emptied,
/// so every bucket present holds at least one record.
#[derive(Debug, Default)]
pub struct TimeIndex {
    /// Years in first-seen order; sorted on demand
    years: Vec<i32>,
    buckets: HashMap<i32, HashMap<u32, Bucket>>,
}

impl TimeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &RecordKey) -> bool {
        let (year, month) = key.bucket();
        self.bucket(year, month).is_some_and(|b| b.contains_key(key))
    }

    /// Insert a record. Returns `false`, leaving the index untouched, if the
    /// key is already present.
    pub fn insert(&mut self, key: RecordKey, record: MediaRecord) -> bool {
        let (year, month) = key.bucket();
        let months = self.buckets.entry(year).or_insert_with(|| {
            self.years.push(year);
            HashMap::new()
        });
        let bucket = months.entry(month).or_default();
        if bucket.contains_key(&key) {
            return false;
        }
        bucket.insert(key, record);
        true
    }

    pub fn remove(&mut self, key: &RecordKey) -> Option<MediaRecord> {
        let (year, month) = key.bucket();
        let months = self.buckets.get_mut(&year)?;
        let bucket = months.get_mut(&month)?;
        let removed = bucket.remove(key);
        if bucket.is_empty() {
            months.remove(&month);
        }
        if months.is_empty() {
            self.buckets.remove(&year);
            self.years.retain(|&y| y != year);
        }
        removed
    }

    pub fn get(&self, key: &RecordKey) -> Option<&MediaRecord> {
        let (year, month) = key.bucket();
        self.bucket(year, month)?.get(key)
    }

    pub fn bucket(&self, year: i32, month: u32) -> Option<&Bucket> {
        self.buckets.get(&year)?.get(&month)
    }

    /// Years holding at least one record, ascending
    pub fn years(&self) -> Vec<i32> {
        let mut years = self.years.clone();
        years.sort_unstable();
        years
    }

    /// Non-empty months of `year`, 1..=12 ascending
    pub fn months(&self, year: i32) -> Vec<u32> {
        match self.buckets.get(&year) {
            Some(months) => (1..=12).filter(|m| months.contains_key(m)).collect(),
            None => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.buckets
            .values()
            .flat_map(|months| months.values())
            .map(Bucket::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn key(name: &str, ts: i64) -> RecordKey {
        RecordKey::new(name, DateTime::from_timestamp(ts, 0).unwrap())
    }

    // 2019-03-01, 2018-12-31, 2019-07-15 (UTC)
    const MAR_2019: i64 = 1_551_398_400;
    const DEC_2018: i64 = 1_546_214_400;
    const JUL_2019: i64 = 1_563_148_800;

    #[test]
    fn test_insert_is_idempotent() {
        let mut index = TimeIndex::new();
        assert!(index.insert(key("a.jpg.json", MAR_2019), MediaRecord::new("/in/x", "a.jpg")));
        assert!(!index.insert(key("a.jpg.json", MAR_2019), MediaRecord::new("/in/y", "a.jpg")));
        assert_eq!(index.len(), 1);
        let kept = index.get(&key("a.jpg.json", MAR_2019)).unwrap();
        assert_eq!(kept.source_dir.to_str(), Some("/in/x"));
    }

    #[test]
    fn test_years_and_months_sorted() {
        let mut index = TimeIndex::new();
        index.insert(key("a.json", JUL_2019), MediaRecord::new("/in", "a"));
        index.insert(key("b.json", DEC_2018), MediaRecord::new("/in", "b"));
        index.insert(key("c.json", MAR_2019), MediaRecord::new("/in", "c"));
        assert_eq!(index.years(), vec![2018, 2019]);
        assert_eq!(index.months(2019), vec![3, 7]);
        assert_eq!(index.months(2018), vec![12]);
        assert!(index.months(2020).is_empty());
    }

    #[test]
    fn test_remove_drops_empty_buckets() {
        let mut index = TimeIndex::new();
        let k = key("a.json", DEC_2018);
        index.insert(k.clone(), MediaRecord::new("/in", "a"));
        index.insert(key("b.json", MAR_2019), MediaRecord::new("/in", "b"));
        assert!(index.remove(&k).is_some());
        assert!(!index.contains(&k));
        assert!(index.bucket(2018, 12).is_none());
        assert_eq!(index.years(), vec![2019]);
        assert!(index.remove(&k).is_none());
    }
}
