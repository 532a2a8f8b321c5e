//! Query window generation: summit-centred walks, region modes, exons.
//!
//! Every strategy produces half-open windows for the aggregator and tells
//! the sweep whether its windows are anchored on the record start, which
//! is what keeps the sweep marker moving forward.

use crate::aggregate::SweepAggregator;
use crate::error::{GaError, Result, ScanError};
use crate::interval::{IntervalRecord, Strand, Window};
use std::fmt;
use std::str::FromStr;

/// Fixed-step walk of equal windows across `[anchor - hw, anchor + hw]`.
///
/// Slot `i` is centred on `anchor - hw + i * step`. For minus-strand
/// records the anchor is the record end and slots are mirrored, so slot 0
/// is always the upstream end of the profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowWalk {
    pub half_window: u64,
    pub step: u64,
    pub width: u64,
}

impl WindowWalk {
    pub fn new(half_window: u64, step: u64, width: u64) -> Result<Self> {
        if step == 0 {
            return Err(GaError::InvalidArgument("step must be positive".to_string()));
        }
        if width == 0 {
            return Err(GaError::InvalidArgument("window size must be positive".to_string()));
        }
        Ok(Self {
            half_window,
            step,
            width,
        })
    }

    /// Number of windows per record.
    #[inline]
    pub fn slots(&self) -> usize {
        (2 * self.half_window / self.step) as usize + 1
    }

    /// Position of each slot relative to the anchor, upstream first.
    pub fn relative_positions(&self) -> impl Iterator<Item = i64> + '_ {
        (0..self.slots()).map(move |i| i as i64 * self.step as i64 - self.half_window as i64)
    }

    /// Anchor coordinate: the end for minus-strand records, else the start.
    #[inline]
    pub fn anchor(record: &IntervalRecord) -> u64 {
        if record.strand.is_minus() {
            record.end
        } else {
            record.start
        }
    }

    /// Windows of the walk in coordinate order. `None` marks windows lying
    /// wholly left of the chromosome start.
    pub fn windows(&self, anchor: u64) -> impl Iterator<Item = Option<Window>> + '_ {
        let first = anchor as i64 - self.half_window as i64 - (self.width / 2) as i64;
        (0..self.slots()).map(move |i| {
            let start = first + (i as u64 * self.step) as i64;
            Window::from_signed(start, start + self.width as i64)
                .ok()
                .flatten()
        })
    }

    /// Output slot of the `i`-th window in coordinate order.
    #[inline]
    pub fn slot(&self, i: usize, strand: Strand) -> usize {
        if strand.is_minus() {
            self.slots() - 1 - i
        } else {
            i
        }
    }

    /// Mean signal per base in every slot of the record's walk.
    pub fn profile(
        &self,
        aggregator: &mut SweepAggregator<'_>,
        record: &IntervalRecord,
    ) -> std::result::Result<Vec<f64>, ScanError> {
        aggregator.begin_query(!record.strand.is_minus());
        let sums = aggregator.walk(self.windows(Self::anchor(record)))?;

        let mut out = vec![0.0; self.slots()];
        for (i, sum) in sums.into_iter().enumerate() {
            out[self.slot(i, record.strand)] = sum / self.width as f64;
        }
        Ok(out)
    }
}

/// How the per-region window is derived from a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionMode {
    /// `[start - hw, start + hw)` around the summit.
    Summit,
    /// The record itself.
    Region,
    /// `2*hw` upstream of the TSS.
    UpTss,
    /// `2*hw` downstream of the TSS.
    TssDown,
    /// `2*hw` on both sides of the TSS.
    UpTssDown,
    /// `2*hw` upstream of the TES.
    UpTes,
    /// `2*hw` downstream of the TES.
    TesDown,
    /// `2*hw` on both sides of the TES.
    UpTesDown,
}

impl RegionMode {
    pub fn name(&self) -> &'static str {
        match self {
            RegionMode::Summit => "smt",
            RegionMode::Region => "region",
            RegionMode::UpTss => "up-tss",
            RegionMode::TssDown => "tss-dw",
            RegionMode::UpTssDown => "up-tss-dw",
            RegionMode::UpTes => "up-tes",
            RegionMode::TesDown => "tes-dw",
            RegionMode::UpTesDown => "up-tes-dw",
        }
    }

    fn is_tes(&self) -> bool {
        matches!(
            self,
            RegionMode::UpTes | RegionMode::TesDown | RegionMode::UpTesDown
        )
    }

    /// Signed span for `record`. `hw` is the half window; flank modes
    /// extend `2*hw` from the TSS or TES.
    ///
    /// TSS modes treat any strand other than `-` as plus; TES modes treat
    /// any strand other than `+` as minus.
    pub fn span(&self, record: &IntervalRecord, hw: u64) -> RegionSpan {
        let st = record.start as i64;
        let ed = record.end as i64;
        let hw = hw as i64;
        let hw2 = hw * 2;
        let minus = record.strand.is_minus();
        let plus = record.strand == Strand::Plus;

        let (start, end) = match self {
            RegionMode::Summit => (st - hw, st + hw),
            RegionMode::Region => (st, ed),
            RegionMode::UpTss if minus => (ed, ed + hw2),
            RegionMode::UpTss => (st - hw2, st),
            RegionMode::TssDown if minus => (ed - hw2, ed),
            RegionMode::TssDown => (st, st + hw2),
            RegionMode::UpTssDown if minus => (ed - hw2, ed + hw2),
            RegionMode::UpTssDown => (st - hw2, st + hw2),
            RegionMode::UpTes if plus => (ed - hw2, ed),
            RegionMode::UpTes => (st, st + hw2),
            RegionMode::TesDown if plus => (ed, ed + hw2),
            RegionMode::TesDown => (st - hw2, st),
            RegionMode::UpTesDown if plus => (ed - hw2, ed + hw2),
            RegionMode::UpTesDown => (st - hw2, st + hw2),
        };
        RegionSpan { start, end }
    }

    /// Whether the span is computed from the record start, so the sweep
    /// marker may follow it.
    pub fn anchored_on_start(&self, strand: Strand) -> bool {
        if self.is_tes() {
            strand != Strand::Plus
        } else {
            !strand.is_minus()
        }
    }
}

impl FromStr for RegionMode {
    type Err = GaError;

    fn from_str(s: &str) -> Result<Self> {
        let mode = match s {
            "smt" => RegionMode::Summit,
            "region" => RegionMode::Region,
            "up-tss" => RegionMode::UpTss,
            "tss-dw" => RegionMode::TssDown,
            "up-tss-dw" => RegionMode::UpTssDown,
            "up-tes" => RegionMode::UpTes,
            "tes-dw" => RegionMode::TesDown,
            "up-tes-dw" => RegionMode::UpTesDown,
            other => {
                return Err(GaError::InvalidArgument(format!(
                    "unknown region mode '{}'",
                    other
                )))
            }
        };
        Ok(mode)
    }
}

impl fmt::Display for RegionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A region before clipping to the chromosome start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionSpan {
    pub start: i64,
    pub end: i64,
}

impl RegionSpan {
    /// Unclipped length; the per-base mean divides by this.
    pub fn len(&self) -> u64 {
        (self.end - self.start).max(0) as u64
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Scan window, `Ok(None)` if the span lies left of the chromosome.
    pub fn window(&self) -> std::result::Result<Option<Window>, ScanError> {
        Window::from_signed(self.start, self.end)
    }
}

/// Total length of a transcript's exons.
pub fn exon_length(blocks: &[Window]) -> u64 {
    blocks.iter().map(Window::len).sum()
}
