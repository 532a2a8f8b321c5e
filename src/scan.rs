//! Marker-advancing overlap scan over a sorted record list.
//!
//! A sweep over one chromosome issues query windows in non-decreasing start
//! order. The [`ScanCursor`] remembers how far into the sorted records the
//! sweep has permanently moved (the marker), so each query resumes there
//! instead of at the list head. For sorted input the total work per
//! chromosome is O(N + M) plus the size of the reported overlaps.
//!
//! Marker invariant: every record before `position` ends at or before
//! `floor` (half-open) or before `floor` (closed), so it cannot overlap any
//! window starting at or after `floor`. A window starting before `floor`
//! breaks the invariant and is answered by a rescan from the head.

use crate::config::is_strict_order;
use crate::error::ScanError;
use crate::interval::{Positioned, Window};
use log::debug;

/// When a cursor moves its marker forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MarkerPolicy {
    /// Carry the marker across the whole chromosome; it is committed by the
    /// leading window of each outer query (see [`ScanCursor::begin_query`]).
    #[default]
    Carry,
    /// Commit after every window. Only valid for a strictly non-decreasing
    /// series of windows, such as the sub-windows of one window walk.
    Follow,
    /// Never commit: every window scans from the head. O(N * M); this is the
    /// reference behaviour used to check the other policies.
    Rewind,
}

/// Overlap predicate used by a seek.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlapRule {
    /// `q.start < r.end && r.start < q.end`
    HalfOpen,
    /// `q.end >= r.start && q.start <= r.end`, as used for peak-vs-peak
    /// comparison where touching peaks count as overlapping.
    Closed,
}

impl OverlapRule {
    #[inline]
    fn hits(self, q_start: u64, q_end: u64, r_start: u64, r_end: u64) -> bool {
        match self {
            OverlapRule::HalfOpen => q_start < r_end && r_start < q_end,
            OverlapRule::Closed => q_end >= r_start && q_start <= r_end,
        }
    }

    /// True when `r` and every record after it start too late to overlap.
    #[inline]
    fn past(self, q_end: u64, r_start: u64) -> bool {
        match self {
            OverlapRule::HalfOpen => r_start >= q_end,
            OverlapRule::Closed => r_start > q_end,
        }
    }
}

/// Coarse state of a cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// No marker yet; the next seek starts at the list head.
    Uninitialized,
    /// The marker points at or before the first unconsumed overlap.
    Positioned,
    /// The marker is past the last record.
    Exhausted,
}

/// Counters for one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    pub seeks: usize,
    pub examined: usize,
    pub rescans: usize,
}

impl SweepStats {
    pub fn merge(&mut self, other: &SweepStats) {
        self.seeks += other.seeks;
        self.examined += other.examined;
        self.rescans += other.rescans;
    }
}

/// Sweep state for one chromosome and one record list.
///
/// Never share a cursor between chromosomes or between record lists: a
/// second sweep over the same chromosome (a denominator track, say) needs
/// its own cursor.
#[derive(Debug, Clone, Default)]
pub struct ScanCursor {
    position: usize,
    floor: Option<u64>,
    policy: MarkerPolicy,
    leading: bool,
    stats: SweepStats,
}

impl ScanCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: MarkerPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Whether the marker holds a usable position.
    #[inline]
    pub fn hint_valid(&self) -> bool {
        self.floor.is_some()
    }

    #[inline]
    pub fn policy(&self) -> MarkerPolicy {
        self.policy
    }

    pub fn state(&self, len: usize) -> CursorState {
        match self.floor {
            None => CursorState::Uninitialized,
            Some(_) if self.position >= len => CursorState::Exhausted,
            Some(_) => CursorState::Positioned,
        }
    }

    pub fn stats(&self) -> SweepStats {
        self.stats
    }

    /// Announce a new outer query (feature, summit, region).
    ///
    /// With [`MarkerPolicy::Carry`] the next seek is the query's leading
    /// window and may move the marker. Pass `commit = false` when the
    /// query's windows are not anchored on its sort key (a minus-strand
    /// feature anchored on its end, for instance); the marker then stays
    /// where it is and later queries do not have to rescan.
    pub fn begin_query(&mut self, commit: bool) {
        self.leading = commit;
    }

    /// A cursor for the sub-windows of one window walk, starting at this
    /// cursor's marker. Its marker follows every sub-window.
    pub fn walk(&self) -> ScanCursor {
        let policy = match self.policy {
            MarkerPolicy::Rewind => MarkerPolicy::Rewind,
            _ => MarkerPolicy::Follow,
        };
        ScanCursor {
            position: self.position,
            floor: self.floor,
            policy,
            leading: false,
            stats: SweepStats::default(),
        }
    }

    /// Fold a finished walk's counters back into this cursor.
    pub fn absorb(&mut self, walk: &ScanCursor) {
        self.stats.merge(&walk.stats);
    }

    fn should_commit(&self, rescanned: bool) -> bool {
        match self.policy {
            MarkerPolicy::Rewind => false,
            MarkerPolicy::Follow => true,
            MarkerPolicy::Carry => self.leading && !rescanned,
        }
    }

    fn commit(&mut self, position: usize, floor: u64) {
        self.position = position;
        self.floor = Some(floor);
    }
}

/// Result of one seek.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Seek {
    /// Index of the first overlapping record, if any.
    pub first: Option<usize>,
    /// Whether the seek had to restart at the list head.
    pub rescanned: bool,
}

/// Finds the first record overlapping each query window of a sweep.
#[derive(Debug, Clone)]
pub struct OverlapScanner<'a, T: Positioned> {
    chrom: &'a str,
    records: &'a [T],
    rule: OverlapRule,
}

impl<'a, T: Positioned> OverlapScanner<'a, T> {
    /// Scanner over records sorted by start, with half-open overlap.
    pub fn new(chrom: &'a str, records: &'a [T]) -> Self {
        Self {
            chrom,
            records,
            rule: OverlapRule::HalfOpen,
        }
    }

    pub fn with_rule(mut self, rule: OverlapRule) -> Self {
        self.rule = rule;
        self
    }

    #[inline]
    pub fn records(&self) -> &'a [T] {
        self.records
    }

    #[inline]
    pub fn chrom(&self) -> &'a str {
        self.chrom
    }

    #[inline]
    pub fn rule(&self) -> OverlapRule {
        self.rule
    }

    /// Seek the first record overlapping a half-open window.
    pub fn seek(&self, cursor: &mut ScanCursor, window: &Window) -> Result<Seek, ScanError> {
        self.seek_range(cursor, window.start, window.end)
    }

    /// Seek the first record overlapping `[start, end]` under this scanner's
    /// rule. Point queries (`start == end`) are allowed with the closed rule.
    pub fn seek_range(
        &self,
        cursor: &mut ScanCursor,
        start: u64,
        end: u64,
    ) -> Result<Seek, ScanError> {
        cursor.stats.seeks += 1;

        let (from, rescanned) = match cursor.floor {
            Some(floor) if start < floor => {
                if is_strict_order() {
                    return Err(ScanError::UnsortedInputViolation {
                        chrom: self.chrom.to_string(),
                        previous: floor,
                        start,
                    });
                }
                debug!(
                    "{}: window start {} is behind marker floor {}, rescanning from head",
                    self.chrom, start, floor
                );
                cursor.stats.rescans += 1;
                (0, true)
            }
            Some(_) if cursor.policy != MarkerPolicy::Rewind => (cursor.position, false),
            _ => (0, false),
        };

        let mut idx = from;
        let mut first = None;
        while let Some(record) = self.records.get(idx) {
            cursor.stats.examined += 1;
            if self.rule.hits(start, end, record.start(), record.end()) {
                first = Some(idx);
                break;
            }
            if self.rule.past(end, record.start()) {
                break;
            }
            idx += 1;
        }

        // Everything before `idx` was skipped because it ends before `start`,
        // so `idx` is a valid marker for any later window starting at or
        // after `start`, hit or miss.
        if cursor.should_commit(rescanned) {
            cursor.commit(idx, start);
        }
        cursor.leading = false;

        Ok(Seek { first, rescanned })
    }

    /// Indices of every record overlapping the range, starting from a seek
    /// result and stopping at the first record that starts past the range.
    ///
    /// Records between the first hit and the stop point that do not overlap
    /// (possible when records overlap each other) are skipped.
    pub fn overlapping_from(
        &self,
        first: usize,
        start: u64,
        end: u64,
    ) -> impl Iterator<Item = usize> + 'a {
        let rule = self.rule;
        let records = self.records;
        (first..records.len())
            .take_while(move |&i| !rule.past(end, records[i].start()))
            .filter(move |&i| rule.hits(start, end, records[i].start(), records[i].end()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::set_strict_order;
    use crate::interval::SignalRecord;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};
    use serial_test::serial;

    fn signals(ranges: &[(u64, u64)]) -> Vec<SignalRecord> {
        ranges
            .iter()
            .map(|&(s, e)| SignalRecord::new("chr1", s, e, 1.0))
            .collect()
    }

    fn win(start: u64, end: u64) -> Window {
        Window::new(start, end).unwrap()
    }

    #[test]
    fn test_seek_finds_first_overlap() {
        let sig = signals(&[(0, 10), (10, 20), (20, 30)]);
        let scanner = OverlapScanner::new("chr1", &sig);
        let mut cursor = ScanCursor::new();

        cursor.begin_query(true);
        let seek = scanner.seek(&mut cursor, &win(15, 25)).unwrap();
        assert_eq!(seek.first, Some(1));
        assert!(!seek.rescanned);
        assert_eq!(cursor.position(), 1);
        assert_eq!(cursor.state(sig.len()), CursorState::Positioned);
    }

    #[test]
    fn test_seek_stops_at_first_record_past_window() {
        let sig = signals(&[(0, 10), (50, 60), (70, 80)]);
        let scanner = OverlapScanner::new("chr1", &sig);
        let mut cursor = ScanCursor::new();

        cursor.begin_query(true);
        let seek = scanner.seek(&mut cursor, &win(20, 30)).unwrap();
        assert_eq!(seek.first, None);
        // (0,10) ends before 20 and is skipped for good; (50,60) stops the scan
        assert_eq!(cursor.stats().examined, 2);
        assert_eq!(cursor.position(), 1);
    }

    #[test]
    fn test_empty_record_list() {
        let sig: Vec<SignalRecord> = Vec::new();
        let scanner = OverlapScanner::new("chr1", &sig);
        let mut cursor = ScanCursor::new();
        assert_eq!(cursor.state(0), CursorState::Uninitialized);

        cursor.begin_query(true);
        let seek = scanner.seek(&mut cursor, &win(0, 100)).unwrap();
        assert_eq!(seek.first, None);
        assert_eq!(cursor.state(0), CursorState::Exhausted);
    }

    #[test]
    fn test_window_right_of_last_record() {
        let sig = signals(&[(0, 10), (10, 20)]);
        let scanner = OverlapScanner::new("chr1", &sig);
        let mut cursor = ScanCursor::new();

        cursor.begin_query(true);
        assert_eq!(scanner.seek(&mut cursor, &win(100, 200)).unwrap().first, None);
        assert_eq!(cursor.state(sig.len()), CursorState::Exhausted);

        // Later windows return immediately
        let before = cursor.stats().examined;
        cursor.begin_query(true);
        assert_eq!(scanner.seek(&mut cursor, &win(300, 400)).unwrap().first, None);
        assert_eq!(cursor.stats().examined, before);
    }

    #[test]
    fn test_marker_only_moves_on_leading_window() {
        let sig = signals(&[(0, 10), (20, 30), (40, 50)]);
        let scanner = OverlapScanner::new("chr1", &sig);
        let mut cursor = ScanCursor::new();

        cursor.begin_query(true);
        scanner.seek(&mut cursor, &win(5, 8)).unwrap();
        assert_eq!(cursor.position(), 0);

        // Second window of the same query does not move the marker
        scanner.seek(&mut cursor, &win(45, 48)).unwrap();
        assert_eq!(cursor.position(), 0);

        cursor.begin_query(true);
        scanner.seek(&mut cursor, &win(25, 28)).unwrap();
        assert_eq!(cursor.position(), 1);
    }

    #[test]
    fn test_commit_suppressed() {
        let sig = signals(&[(0, 10), (20, 30)]);
        let scanner = OverlapScanner::new("chr1", &sig);
        let mut cursor = ScanCursor::new();

        cursor.begin_query(false);
        scanner.seek(&mut cursor, &win(25, 28)).unwrap();
        assert!(!cursor.hint_valid());
    }

    #[test]
    #[serial]
    fn test_backward_window_rescans() {
        let sig = signals(&[(0, 10), (20, 30), (40, 50)]);
        let scanner = OverlapScanner::new("chr1", &sig);
        let mut cursor = ScanCursor::new();

        cursor.begin_query(true);
        assert_eq!(scanner.seek(&mut cursor, &win(42, 45)).unwrap().first, Some(2));
        assert_eq!(cursor.position(), 2);

        cursor.begin_query(true);
        let seek = scanner.seek(&mut cursor, &win(5, 25)).unwrap();
        assert!(seek.rescanned);
        assert_eq!(seek.first, Some(0));
        // A rescan never drags the marker backwards
        assert_eq!(cursor.position(), 2);
        assert_eq!(cursor.stats().rescans, 1);
    }

    #[test]
    fn test_rewind_policy_never_commits() {
        let sig = signals(&[(0, 10), (20, 30)]);
        let scanner = OverlapScanner::new("chr1", &sig);
        let mut cursor = ScanCursor::with_policy(MarkerPolicy::Rewind);

        cursor.begin_query(true);
        scanner.seek(&mut cursor, &win(25, 28)).unwrap();
        assert!(!cursor.hint_valid());
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_walk_cursor_follows_every_window() {
        let sig = signals(&[(0, 10), (20, 30), (40, 50)]);
        let scanner = OverlapScanner::new("chr1", &sig);
        let outer = ScanCursor::new();

        let mut walk = outer.walk();
        assert_eq!(walk.policy(), MarkerPolicy::Follow);
        scanner.seek(&mut walk, &win(22, 24)).unwrap();
        assert_eq!(walk.position(), 1);
        scanner.seek(&mut walk, &win(44, 46)).unwrap();
        assert_eq!(walk.position(), 2);
    }

    #[test]
    fn test_closed_rule_counts_touching_records() {
        let peaks = signals(&[(150, 160), (190, 210), (200, 300)]);
        let scanner = OverlapScanner::new("chr1", &peaks).with_rule(OverlapRule::Closed);
        let mut cursor = ScanCursor::new();

        cursor.begin_query(true);
        let seek = scanner.seek_range(&mut cursor, 100, 200).unwrap();
        assert_eq!(seek.first, Some(0));
        let hits: Vec<usize> = scanner.overlapping_from(0, 100, 200).collect();
        // (200, 300) touches the query end
        assert_eq!(hits, vec![0, 1, 2]);
    }

    #[test]
    fn test_overlapping_from_skips_nested_gaps() {
        // Records overlapping each other: (0,100) covers the query, (10,20)
        // does not reach it, (40,60) does.
        let sig = signals(&[(0, 100), (10, 20), (40, 60), (90, 95)]);
        let scanner = OverlapScanner::new("chr1", &sig);
        let hits: Vec<usize> = scanner.overlapping_from(0, 30, 70).collect();
        assert_eq!(hits, vec![0, 2]);
    }

    #[test]
    #[serial]
    fn test_strict_order_rejects_backward_window() {
        let sig = signals(&[(0, 10), (20, 30), (40, 50)]);
        let scanner = OverlapScanner::new("chr1", &sig);
        let mut cursor = ScanCursor::new();

        set_strict_order(true);
        cursor.begin_query(true);
        scanner.seek(&mut cursor, &win(42, 45)).unwrap();
        cursor.begin_query(true);
        let err = scanner.seek(&mut cursor, &win(5, 25));
        set_strict_order(false);

        assert_eq!(
            err,
            Err(ScanError::UnsortedInputViolation {
                chrom: "chr1".to_string(),
                previous: 42,
                start: 5,
            })
        );
    }

    fn random_track(rng: &mut SmallRng, n: usize, span: u64) -> Vec<SignalRecord> {
        let mut out: Vec<SignalRecord> = (0..n)
            .map(|_| {
                let start = rng.gen_range(0..span);
                let len = rng.gen_range(1..60);
                SignalRecord::new("chr1", start, start + len, 1.0)
            })
            .collect();
        out.sort_by_key(|s| s.start);
        out
    }

    fn brute_force(records: &[SignalRecord], w: &Window) -> Vec<usize> {
        (0..records.len())
            .filter(|&i| w.overlaps(records[i].start, records[i].end))
            .collect()
    }

    #[test]
    #[serial]
    fn test_carried_marker_matches_brute_force() {
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..50 {
            let sig = random_track(&mut rng, 200, 5_000);
            let scanner = OverlapScanner::new("chr1", &sig);

            let mut starts: Vec<u64> = (0..150).map(|_| rng.gen_range(0..5_100)).collect();
            starts.sort_unstable();

            let mut carried = ScanCursor::new();
            let mut rewound = ScanCursor::with_policy(MarkerPolicy::Rewind);
            for start in starts {
                // each query has a leading window and two trailing ones
                let windows = [
                    win(start, start + rng.gen_range(1..80)),
                    win(start + 40, start + 90),
                    win(start + 100, start + 101),
                ];
                carried.begin_query(true);
                rewound.begin_query(true);
                for w in &windows {
                    let a = scanner.seek(&mut carried, w).unwrap();
                    let b = scanner.seek(&mut rewound, w).unwrap();
                    let fast: Vec<usize> = a
                        .first
                        .map(|f| scanner.overlapping_from(f, w.start, w.end).collect())
                        .unwrap_or_default();
                    let slow: Vec<usize> = b
                        .first
                        .map(|f| scanner.overlapping_from(f, w.start, w.end).collect())
                        .unwrap_or_default();
                    assert_eq!(fast, brute_force(&sig, w));
                    assert_eq!(slow, fast);
                }
            }
            assert_eq!(carried.stats().rescans, 0);
        }
    }

    #[test]
    fn test_carried_marker_is_linear_on_gapped_input() {
        // Signal on even positions, queries in the odd gaps: nothing ever
        // overlaps, yet each record is passed only once.
        let sig: Vec<SignalRecord> = (0..1_000u64)
            .map(|i| SignalRecord::new("chr1", 2 * i, 2 * i + 1, 1.0))
            .collect();
        let scanner = OverlapScanner::new("chr1", &sig);
        let mut cursor = ScanCursor::new();
        for i in 0..1_000u64 {
            cursor.begin_query(true);
            let seek = scanner.seek(&mut cursor, &win(2 * i + 1, 2 * i + 2)).unwrap();
            assert_eq!(seek.first, None);
        }
        assert!(cursor.stats().examined <= 2 * sig.len() + 1);
    }
}
