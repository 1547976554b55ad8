//! 📜 Round History Model
//!
//! Typed model for resolved rounds (Big/Small outcomes) and the rolling
//! history store the ensemble reads from. Entries are kept newest-first,
//! deduplicated by issue id; the append path is the only mutation.

use serde::{Deserialize, Serialize};

/// Midpoint of the 0-9 draw range: numbers >= 5 classify as Big.
pub const BIG_MIDPOINT: u8 = 5;

/// Binary classification of a round result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Big,
    Small,
}

impl Outcome {
    /// Derive from the raw drawn number (0-9)
    pub fn from_number(number: u8) -> Self {
        if number >= BIG_MIDPOINT {
            Outcome::Big
        } else {
            Outcome::Small
        }
    }

    /// The opposite side
    pub fn flip(&self) -> Self {
        match self {
            Outcome::Big => Outcome::Small,
            Outcome::Small => Outcome::Big,
        }
    }

    /// Single-character signature code ('B' / 'S')
    pub fn code(&self) -> char {
        match self {
            Outcome::Big => 'B',
            Outcome::Small => 'S',
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Big => "Big",
            Outcome::Small => "Small",
        }
    }
}

/// Secondary even/odd classification, retained for display only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Parity {
    Single,
    Double,
}

impl Parity {
    /// Derive from the raw drawn number (even = Double, odd = Single)
    pub fn from_number(number: u8) -> Self {
        if number % 2 == 0 {
            Parity::Double
        } else {
            Parity::Single
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Parity::Single => "Single",
            Parity::Double => "Double",
        }
    }
}

/// One resolved round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Monotonically increasing round identifier
    pub issue_id: u64,

    /// Raw drawn value (0-9)
    pub number: u8,

    /// Derived Big/Small outcome
    pub size: Outcome,

    /// Derived Single/Double parity (display only, unused by the ensemble)
    pub parity: Parity,
}

impl HistoryEntry {
    /// Build an entry from a raw draw, deriving size and parity
    pub fn from_number(issue_id: u64, number: u8) -> Self {
        Self {
            issue_id,
            number,
            size: Outcome::from_number(number),
            parity: Parity::from_number(number),
        }
    }
}

/// Ordered, deduplicated, append-only view of past rounds, newest-first
#[derive(Debug, Default, Clone)]
pub struct HistoryStore {
    entries: Vec<HistoryEntry>,
    /// Optional cap on retained entries (0 = unbounded)
    capacity: usize,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create a store that retains at most `capacity` entries (0 = unbounded)
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity,
        }
    }

    /// Append a resolved round, maintaining newest-first order
    ///
    /// Returns false (no-op) if the issue id is already present. Out-of-order
    /// arrivals are inserted at their ordered position.
    pub fn append(&mut self, entry: HistoryEntry) -> bool {
        // Newest-first: issue ids strictly decreasing along the vec
        match self.entries.binary_search_by(|e| entry.issue_id.cmp(&e.issue_id)) {
            Ok(_) => false,
            Err(pos) => {
                self.entries.insert(pos, entry);
                if self.capacity > 0 && self.entries.len() > self.capacity {
                    self.entries.truncate(self.capacity);
                }
                true
            }
        }
    }

    /// Contiguous slice starting at `start_offset`, or an empty slice if the
    /// requested range exceeds available history
    pub fn window(&self, start_offset: usize, length: usize) -> &[HistoryEntry] {
        if start_offset + length > self.entries.len() {
            return &[];
        }
        &self.entries[start_offset..start_offset + length]
    }

    /// Full newest-first view
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Most recent resolved round, if any
    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.first()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_derivation() {
        assert_eq!(Outcome::from_number(0), Outcome::Small);
        assert_eq!(Outcome::from_number(4), Outcome::Small);
        assert_eq!(Outcome::from_number(5), Outcome::Big);
        assert_eq!(Outcome::from_number(9), Outcome::Big);
    }

    #[test]
    fn test_parity_derivation() {
        assert_eq!(Parity::from_number(2), Parity::Double);
        assert_eq!(Parity::from_number(7), Parity::Single);
    }

    #[test]
    fn test_flip_and_code() {
        assert_eq!(Outcome::Big.flip(), Outcome::Small);
        assert_eq!(Outcome::Small.flip(), Outcome::Big);
        assert_eq!(Outcome::Big.code(), 'B');
        assert_eq!(Outcome::Small.code(), 'S');
    }

    #[test]
    fn test_append_keeps_newest_first() {
        let mut store = HistoryStore::new();
        assert!(store.append(HistoryEntry::from_number(100, 7)));
        assert!(store.append(HistoryEntry::from_number(101, 2)));
        assert!(store.append(HistoryEntry::from_number(102, 9)));

        let ids: Vec<u64> = store.entries().iter().map(|e| e.issue_id).collect();
        assert_eq!(ids, vec![102, 101, 100]);
    }

    #[test]
    fn test_append_rejects_duplicates() {
        let mut store = HistoryStore::new();
        assert!(store.append(HistoryEntry::from_number(100, 7)));
        assert!(!store.append(HistoryEntry::from_number(100, 3)));
        assert_eq!(store.len(), 1);
        assert_eq!(store.latest().unwrap().number, 7);
    }

    #[test]
    fn test_append_out_of_order() {
        let mut store = HistoryStore::new();
        store.append(HistoryEntry::from_number(102, 9));
        store.append(HistoryEntry::from_number(100, 1));
        store.append(HistoryEntry::from_number(101, 6));

        let ids: Vec<u64> = store.entries().iter().map(|e| e.issue_id).collect();
        assert_eq!(ids, vec![102, 101, 100]);
    }

    #[test]
    fn test_capacity_truncates_oldest() {
        let mut store = HistoryStore::with_capacity(3);
        for issue in 1..=5u64 {
            store.append(HistoryEntry::from_number(issue, 5));
        }
        let ids: Vec<u64> = store.entries().iter().map(|e| e.issue_id).collect();
        assert_eq!(ids, vec![5, 4, 3]);
    }

    #[test]
    fn test_window_bounds() {
        let mut store = HistoryStore::new();
        for issue in 1..=5u64 {
            store.append(HistoryEntry::from_number(issue, 8));
        }
        assert_eq!(store.window(0, 3).len(), 3);
        assert_eq!(store.window(2, 3).len(), 3);
        // Range past the end yields an empty slice, not an error
        assert!(store.window(3, 3).is_empty());
        assert!(store.window(0, 6).is_empty());
    }

    #[test]
    fn test_latest_is_newest() {
        let mut store = HistoryStore::new();
        assert!(store.latest().is_none());
        store.append(HistoryEntry::from_number(1, 2));
        store.append(HistoryEntry::from_number(3, 9));
        store.append(HistoryEntry::from_number(2, 8));
        assert_eq!(store.latest().unwrap().issue_id, 3);
    }
}
