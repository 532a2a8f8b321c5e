//! Deterministic stable merge sort.
//!
//! Sort order used throughout the toolkit:
//! 1. Partitions: chromosome name, ordinal byte comparison
//! 2. Records within a partition: start coordinate, ascending
//! 3. Ties: input order preserved
//!
//! The sort works on owned vectors and moves elements; it never needs
//! `Clone` or random access.

use crate::interval::Positioned;
use std::cmp::Ordering;

/// Stable merge sort of an owned vector.
///
/// Sequences of length 0 and 1 are returned unchanged.
pub fn merge_sort_by<T, F>(mut items: Vec<T>, cmp: &F) -> Vec<T>
where
    F: Fn(&T, &T) -> Ordering,
{
    if items.len() < 2 {
        return items;
    }

    let right = items.split_off(items.len() / 2);
    let left = merge_sort_by(items, cmp);
    let right = merge_sort_by(right, cmp);

    merge(left, right, cmp)
}

fn merge<T, F>(left: Vec<T>, right: Vec<T>, cmp: &F) -> Vec<T>
where
    F: Fn(&T, &T) -> Ordering,
{
    let mut out = Vec::with_capacity(left.len() + right.len());
    let mut a = left.into_iter().peekable();
    let mut b = right.into_iter().peekable();

    loop {
        // Left wins ties: this is what keeps the sort stable.
        let take_left = match (a.peek(), b.peek()) {
            (Some(x), Some(y)) => cmp(x, y) != Ordering::Greater,
            _ => break,
        };
        if take_left {
            out.extend(a.next());
        } else {
            out.extend(b.next());
        }
    }

    out.extend(a);
    out.extend(b);
    out
}

/// Sort records ascending by start, keeping input order among equal starts.
pub fn sort_by_start<T: Positioned>(items: Vec<T>) -> Vec<T> {
    merge_sort_by(items, &|a: &T, b: &T| a.start().cmp(&b.start()))
}

/// Check that records are non-decreasing by start.
pub fn is_sorted_by_start<T: Positioned>(items: &[T]) -> bool {
    items.windows(2).all(|w| w[0].start() <= w[1].start())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interval::{IntervalRecord, SignalRecord};

    fn rec(start: u64, tag: &str) -> IntervalRecord {
        IntervalRecord::new("chr1", start, start + 10).with_source(tag)
    }

    #[test]
    fn test_degenerate_lengths() {
        let empty: Vec<IntervalRecord> = Vec::new();
        assert!(sort_by_start(empty).is_empty());

        let one = sort_by_start(vec![rec(5, "a")]);
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].source_text, "a");

        let two = sort_by_start(vec![rec(9, "a"), rec(2, "b")]);
        assert_eq!(two[0].start, 2);
        assert_eq!(two[1].start, 9);

        let two_sorted = sort_by_start(vec![rec(2, "a"), rec(9, "b")]);
        assert_eq!(two_sorted[0].source_text, "a");
    }

    #[test]
    fn test_stability_among_equal_starts() {
        let sorted = sort_by_start(vec![rec(5, "idx0"), rec(5, "idx1"), rec(3, "idx2")]);

        let tags: Vec<&str> = sorted.iter().map(|r| r.source_text.as_str()).collect();
        assert_eq!(tags, vec!["idx2", "idx0", "idx1"]);
    }

    #[test]
    fn test_stability_large_run_of_ties() {
        let input: Vec<IntervalRecord> = (0..100)
            .map(|i| rec((i % 4) as u64, &i.to_string()))
            .collect();
        let sorted = sort_by_start(input);

        assert!(is_sorted_by_start(&sorted));
        for w in sorted.windows(2) {
            if w[0].start == w[1].start {
                let a: usize = w[0].source_text.parse().unwrap();
                let b: usize = w[1].source_text.parse().unwrap();
                assert!(a < b, "tie order broken: {} before {}", a, b);
            }
        }
    }

    #[test]
    fn test_sort_is_idempotent() {
        let input = vec![
            SignalRecord::new("chr1", 30, 40, 1.0),
            SignalRecord::new("chr1", 10, 20, 2.0),
            SignalRecord::new("chr1", 10, 15, 3.0),
            SignalRecord::new("chr1", 0, 5, 4.0),
        ];
        let once = sort_by_start(input);
        let twice = sort_by_start(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_merge_sort_by_names() {
        let names = vec!["chr2", "chr10", "chr1", "chrX"];
        let sorted = merge_sort_by(names, &|a: &&str, b: &&str| a.cmp(b));
        // Ordinal comparison, not natural order
        assert_eq!(sorted, vec!["chr1", "chr10", "chr2", "chrX"]);
    }
}
