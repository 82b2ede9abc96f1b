// crates/popatlas-core/src/rank.rs

use crate::model::{PopulationRecord, RankingEntry};

/// Top-`limit` records by descending count, numbered from 1.
///
/// The sort is stable: equal counts keep their input order.
///
/// ```rust
/// use popatlas_core::model::PopulationRecord;
/// use popatlas_core::rank::rank;
///
/// let rec = |name: &str, count| PopulationRecord {
///     identifier_code: None,
///     display_name: name.into(),
///     year: 2024,
///     count,
/// };
/// let top = rank(&[rec("a", 5), rec("b", 5), rec("c", 3)], 2);
/// assert_eq!(top.len(), 2);
/// assert_eq!((top[0].record.name(), top[0].rank), ("a", 1));
/// assert_eq!((top[1].record.name(), top[1].rank), ("b", 2));
/// ```
pub fn rank(records: &[PopulationRecord], limit: usize) -> Vec<RankingEntry> {
    let mut order: Vec<&PopulationRecord> = records.iter().collect();
    // `sort_by` is stable.
    order.sort_by(|a, b| b.count.cmp(&a.count));

    order
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(i, record)| RankingEntry {
            record: record.clone(),
            rank: i + 1,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(name: &str, count: u64) -> PopulationRecord {
        PopulationRecord {
            identifier_code: None,
            display_name: name.into(),
            year: 2024,
            count,
        }
    }

    #[test]
    fn bound_is_min_of_limit_and_len() {
        let records: Vec<_> = (1..=4).map(|i| rec(&i.to_string(), i)).collect();
        assert_eq!(rank(&records, 10).len(), 4);
        assert_eq!(rank(&records, 2).len(), 2);
        assert!(rank(&records, 0).is_empty());
        assert!(rank(&[], 10).is_empty());
    }

    #[test]
    fn descending_with_stable_ties() {
        let records = vec![
            rec("a", 3),
            rec("b", 7),
            rec("c", 3),
            rec("d", 7),
            rec("e", 1),
        ];
        let out = rank(&records, 10);
        let names: Vec<&str> = out.iter().map(|e| e.record.name()).collect();
        assert_eq!(names, ["b", "d", "a", "c", "e"]);
        let ranks: Vec<usize> = out.iter().map(|e| e.rank).collect();
        assert_eq!(ranks, [1, 2, 3, 4, 5]);
        assert!(out.windows(2).all(|w| w[0].record.count >= w[1].record.count));
    }

    #[test]
    fn input_is_untouched() {
        let records = vec![rec("x", 1), rec("y", 2)];
        let _ = rank(&records, 1);
        assert_eq!(records[0].name(), "x");
    }
}
