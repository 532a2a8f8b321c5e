//! Length-weighted signal aggregation over query windows.
//!
//! Each signal block contributes `value × overlap length` to a window, where
//! the overlap is clipped to the window. Sums accumulate in `f64`; dividing
//! by a window length, exon length or read length is left to the caller.

use crate::error::ScanError;
use crate::interval::{SignalRecord, Window};
use crate::scan::{MarkerPolicy, OverlapScanner, ScanCursor, SweepStats};
use std::fmt;

/// Sum `value × clipped length` over the blocks from `first` onwards,
/// stopping at the first block that starts at or after the window end.
///
/// Blocks in between that do not reach the window (possible when blocks
/// overlap each other) contribute zero.
pub fn weighted_sum(signals: &[SignalRecord], first: usize, window: &Window) -> f64 {
    let mut sum = 0.0f64;
    for block in signals.get(first..).unwrap_or_default() {
        if block.start >= window.end {
            break;
        }
        let len = window.clipped_len(block.start, block.end);
        sum += block.value as f64 * len as f64;
    }
    sum
}

/// Quotient of two aggregated sums.
///
/// A denominator that sums to zero gives `Undefined`, written as `NA`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Ratio {
    Value(f64),
    /// The denominator summed to exactly zero.
    Undefined,
}

impl Ratio {
    pub fn new(numerator: f64, denominator: f64) -> Self {
        if denominator == 0.0 {
            Ratio::Undefined
        } else {
            Ratio::Value(numerator / denominator)
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Ratio::Value(v) => Some(*v),
            Ratio::Undefined => None,
        }
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ratio::Value(v) => write!(f, "{:.6}", v),
            Ratio::Undefined => write!(f, "NA"),
        }
    }
}

fn window_sum(
    scanner: &OverlapScanner<'_, SignalRecord>,
    cursor: &mut ScanCursor,
    window: &Window,
) -> Result<f64, ScanError> {
    let seek = scanner.seek(cursor, window)?;
    Ok(seek
        .first
        .map(|first| weighted_sum(scanner.records(), first, window))
        .unwrap_or(0.0))
}

/// Weighted sums for one sweep over one chromosome's signal track.
///
/// Owns the cursor for that sweep; build a new aggregator for the next
/// chromosome or for a second track on the same chromosome.
#[derive(Debug)]
pub struct SweepAggregator<'a> {
    scanner: OverlapScanner<'a, SignalRecord>,
    cursor: ScanCursor,
}

impl<'a> SweepAggregator<'a> {
    pub fn new(chrom: &'a str, signals: &'a [SignalRecord]) -> Self {
        Self::with_policy(chrom, signals, MarkerPolicy::Carry)
    }

    pub fn with_policy(chrom: &'a str, signals: &'a [SignalRecord], policy: MarkerPolicy) -> Self {
        Self {
            scanner: OverlapScanner::new(chrom, signals),
            cursor: ScanCursor::with_policy(policy),
        }
    }

    /// Start the next outer record. See [`ScanCursor::begin_query`].
    pub fn begin_query(&mut self, commit: bool) {
        self.cursor.begin_query(commit);
    }

    /// Weighted sum over one window.
    pub fn sum(&mut self, window: &Window) -> Result<f64, ScanError> {
        window_sum(&self.scanner, &mut self.cursor, window)
    }

    /// Like [`sum`](Self::sum), but `None` when no block overlaps `window`.
    pub fn covered_sum(&mut self, window: &Window) -> Result<Option<f64>, ScanError> {
        let seek = self.scanner.seek(&mut self.cursor, window)?;
        Ok(seek
            .first
            .map(|first| weighted_sum(self.scanner.records(), first, window)))
    }

    /// Total weighted sum over a list of windows, e.g. the exons of one
    /// transcript. The first window is the record's leading window.
    pub fn sum_all(&mut self, windows: &[Window]) -> Result<f64, ScanError> {
        let mut total = 0.0;
        for window in windows {
            total += self.sum(window)?;
        }
        Ok(total)
    }

    /// Per-window sums for a non-decreasing walk of windows.
    ///
    /// `None` entries (windows wholly left of the chromosome start) yield 0.
    /// The first real window moves the sweep marker; the rest of the walk
    /// runs on a local cursor that follows every sub-window.
    pub fn walk<I>(&mut self, windows: I) -> Result<Vec<f64>, ScanError>
    where
        I: IntoIterator<Item = Option<Window>>,
    {
        let mut sums = Vec::new();
        let mut local: Option<ScanCursor> = None;

        for window in windows {
            let Some(window) = window else {
                sums.push(0.0);
                continue;
            };
            let sum = match local.as_mut() {
                Some(cursor) => window_sum(&self.scanner, cursor, &window)?,
                None => {
                    let sum = window_sum(&self.scanner, &mut self.cursor, &window)?;
                    local = Some(self.cursor.walk());
                    sum
                }
            };
            sums.push(sum);
        }

        if let Some(cursor) = local {
            self.cursor.absorb(&cursor);
        }
        Ok(sums)
    }

    pub fn chrom(&self) -> &'a str {
        self.scanner.chrom()
    }

    pub fn stats(&self) -> SweepStats {
        self.cursor.stats()
    }
}
