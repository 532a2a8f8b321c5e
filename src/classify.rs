//! Peak-versus-peak overlap classification.
//!
//! Each query record of set A is labelled overlapping or non-overlapping
//! against the sorted records of set B on the same chromosome. Touching
//! records count as overlapping (closed test).

use crate::error::ScanError;
use crate::interval::IntervalRecord;
use crate::partition::PartitionSet;
use crate::scan::{OverlapRule, OverlapScanner, ScanCursor};
use log::debug;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlapLabel {
    Overlapping,
    NonOverlapping,
}

impl fmt::Display for OverlapLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverlapLabel::Overlapping => write!(f, "Over"),
            OverlapLabel::NonOverlapping => write!(f, "NonOver"),
        }
    }
}

/// Stop at the first hit, or count every hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClassifyMode {
    #[default]
    FirstMatch,
    Count,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub label: OverlapLabel,
    /// Number of B records hit; at most 1 in first-match mode.
    pub count: usize,
}

impl Classification {
    pub const NONE: Classification = Classification {
        label: OverlapLabel::NonOverlapping,
        count: 0,
    };

    fn from_count(count: usize) -> Self {
        let label = if count > 0 {
            OverlapLabel::Overlapping
        } else {
            OverlapLabel::NonOverlapping
        };
        Self { label, count }
    }

    #[inline]
    pub fn is_overlapping(&self) -> bool {
        self.label == OverlapLabel::Overlapping
    }
}

/// A query record with its classification.
#[derive(Debug, Clone, Copy)]
pub struct ClassifiedRecord<'a> {
    pub record: &'a IntervalRecord,
    pub classification: Classification,
}

/// Everything one classification run produces.
#[derive(Debug, Default)]
pub struct ClassifyReport<'a> {
    pub annotated: Vec<ClassifiedRecord<'a>>,
    pub overlapping: Vec<&'a IntervalRecord>,
    pub non_overlapping: Vec<&'a IntervalRecord>,
}

impl<'a> ClassifyReport<'a> {
    pub fn total(&self) -> usize {
        self.annotated.len()
    }

    /// Fraction of overlapping queries, 0 for an empty run.
    pub fn overlap_fraction(&self) -> f64 {
        if self.annotated.is_empty() {
            0.0
        } else {
            self.overlapping.len() as f64 / self.annotated.len() as f64
        }
    }

    fn push(&mut self, record: &'a IntervalRecord, classification: Classification) {
        if classification.is_overlapping() {
            self.overlapping.push(record);
        } else {
            self.non_overlapping.push(record);
        }
        self.annotated.push(ClassifiedRecord {
            record,
            classification,
        });
    }
}

/// Classifies query intervals against a second interval set.
#[derive(Debug, Clone, Copy, Default)]
pub struct OverlapClassifier {
    /// When set, each query is the closed range `[start - hw, start + hw]`
    /// around its start instead of its own extent.
    pub half_window: Option<u64>,
    pub mode: ClassifyMode,
}

impl OverlapClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_half_window(mut self, half_window: Option<u64>) -> Self {
        self.half_window = half_window;
        self
    }

    pub fn with_mode(mut self, mode: ClassifyMode) -> Self {
        self.mode = mode;
        self
    }

    /// Closed query range for a record.
    pub fn query_range(&self, record: &IntervalRecord) -> (u64, u64) {
        match self.half_window {
            Some(hw) => (record.start.saturating_sub(hw), record.start + hw),
            None => (record.start, record.end),
        }
    }

    /// Classify the sorted queries of one chromosome against sorted targets.
    ///
    /// `targets == None` means the chromosome is absent from B: every query
    /// is non-overlapping and no scan happens.
    pub fn classify_partition(
        &self,
        chrom: &str,
        queries: &[IntervalRecord],
        targets: Option<&[IntervalRecord]>,
    ) -> Result<Vec<Classification>, ScanError> {
        let Some(targets) = targets else {
            return Ok(vec![Classification::NONE; queries.len()]);
        };

        let scanner = OverlapScanner::new(chrom, targets).with_rule(OverlapRule::Closed);
        let mut cursor = ScanCursor::new();
        let mut out = Vec::with_capacity(queries.len());

        for query in queries {
            let (start, end) = self.query_range(query);
            cursor.begin_query(true);
            let seek = scanner.seek_range(&mut cursor, start, end)?;
            let count = match (seek.first, self.mode) {
                (None, _) => 0,
                (Some(_), ClassifyMode::FirstMatch) => 1,
                (Some(first), ClassifyMode::Count) => {
                    scanner.overlapping_from(first, start, end).count()
                }
            };
            out.push(Classification::from_count(count));
        }

        debug!(
            "{}: classified {} queries against {} targets ({} seeks, {} examined)",
            chrom,
            queries.len(),
            targets.len(),
            cursor.stats().seeks,
            cursor.stats().examined
        );
        Ok(out)
    }

    /// Classify every query of `a` against `b`. Both sets must be sorted.
    ///
    /// Records are reported in partition order, then start order.
    pub fn classify<'a>(
        &self,
        a: &'a PartitionSet,
        b: &PartitionSet,
    ) -> Result<ClassifyReport<'a>, ScanError> {
        let mut report = ClassifyReport::default();
        for partition in a.iter() {
            let targets = b.get(partition.name()).map(|p| p.intervals.as_slice());
            let classes = self.classify_partition(partition.name(), &partition.intervals, targets)?;
            for (record, class) in partition.intervals.iter().zip(classes) {
                report.push(record, class);
            }
        }
        Ok(report)
    }
}
