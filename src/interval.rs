//! Core record types for query intervals, signal blocks and scan windows.
//!
//! All coordinates are 0-based, half-open (`[start, end)`), as in bedGraph.
//! Inputs that use 1-based closed coordinates go through
//! [`Window::from_one_based`] and nowhere else.

use crate::error::ScanError;
use std::fmt;
use std::rc::Rc;

/// Strand orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Strand {
    Plus,
    Minus,
    #[default]
    Unknown,
}

impl Strand {
    pub fn from_char(c: char) -> Self {
        match c {
            '+' => Strand::Plus,
            '-' => Strand::Minus,
            _ => Strand::Unknown,
        }
    }

    /// Parse a strand column; only the first character is inspected.
    pub fn from_field(field: &str) -> Self {
        field.chars().next().map(Strand::from_char).unwrap_or_default()
    }

    #[inline]
    pub fn is_minus(&self) -> bool {
        matches!(self, Strand::Minus)
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strand::Plus => write!(f, "+"),
            Strand::Minus => write!(f, "-"),
            Strand::Unknown => write!(f, "."),
        }
    }
}

/// A validated, non-empty half-open query range on one chromosome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Window {
    pub start: u64,
    pub end: u64,
}

impl Window {
    /// Create a window, rejecting `end <= start`.
    #[inline]
    pub fn new(start: u64, end: u64) -> Result<Self, ScanError> {
        if end <= start {
            return Err(ScanError::ZeroLengthWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// Convert a 1-based closed range `[start, end]` to half-open.
    ///
    /// This is the one place where the "start - 1" shift happens: the end
    /// coordinate is already exclusive once the start moves down by one.
    #[inline]
    pub fn from_one_based(start: u64, end: u64) -> Result<Self, ScanError> {
        if start == 0 {
            return Err(ScanError::ZeroLengthWindow { start, end });
        }
        Self::new(start - 1, end)
    }

    /// Build a window from signed coordinates produced by window arithmetic
    /// around an anchor.
    ///
    /// The part left of coordinate 0 is clipped off. Returns `Ok(None)` when
    /// the whole window lies left of the chromosome start, since no signal
    /// can exist there.
    pub fn from_signed(start: i64, end: i64) -> Result<Option<Self>, ScanError> {
        if end <= start {
            return Err(ScanError::ZeroLengthWindow {
                start: start.max(0) as u64,
                end: end.max(0) as u64,
            });
        }
        if end <= 0 {
            return Ok(None);
        }
        Ok(Some(Self {
            start: start.max(0) as u64,
            end: end as u64,
        }))
    }

    /// Window length in bases.
    #[inline]
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    /// Always false for a constructed window; kept for API symmetry.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Half-open overlap test against `[start, end)`.
    #[inline]
    pub fn overlaps(&self, start: u64, end: u64) -> bool {
        self.start < end && start < self.end
    }

    /// Length of `[start, end)` clipped to this window (0 when disjoint).
    #[inline]
    pub fn clipped_len(&self, start: u64, end: u64) -> u64 {
        let lo = self.start.max(start);
        let hi = self.end.min(end);
        hi.saturating_sub(lo)
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// A genomic feature, peak, summit or reference transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalRecord {
    pub chrom: Rc<str>,
    pub start: u64,
    pub end: u64,
    pub strand: Strand,
    /// The input line the record came from, without its line terminator.
    pub source_text: String,
    /// Exon blocks for reference transcripts; empty for peaks and summits.
    pub blocks: Vec<Window>,
}

impl IntervalRecord {
    pub fn new(chrom: impl Into<Rc<str>>, start: u64, end: u64) -> Self {
        Self {
            chrom: chrom.into(),
            start,
            end,
            strand: Strand::Unknown,
            source_text: String::new(),
            blocks: Vec::new(),
        }
    }

    pub fn with_strand(mut self, strand: Strand) -> Self {
        self.strand = strand;
        self
    }

    pub fn with_source(mut self, text: impl Into<String>) -> Self {
        self.source_text = text.into();
        self
    }

    pub fn with_blocks(mut self, blocks: Vec<Window>) -> Self {
        self.blocks = blocks;
        self
    }

    #[inline]
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

impl fmt::Display for IntervalRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.source_text.is_empty() {
            write!(f, "{}\t{}\t{}", self.chrom, self.start, self.end)
        } else {
            write!(f, "{}", self.source_text)
        }
    }
}

/// One piecewise-constant block of a signal track.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalRecord {
    pub chrom: Rc<str>,
    pub start: u64,
    pub end: u64,
    pub value: f32,
}

impl SignalRecord {
    pub fn new(chrom: impl Into<Rc<str>>, start: u64, end: u64, value: f32) -> Self {
        Self {
            chrom: chrom.into(),
            start,
            end,
            value,
        }
    }

    #[inline]
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// Anything the sweep can order by start coordinate.
pub trait Positioned {
    fn start(&self) -> u64;
    fn end(&self) -> u64;
}

impl Positioned for IntervalRecord {
    #[inline]
    fn start(&self) -> u64 {
        self.start
    }
    #[inline]
    fn end(&self) -> u64 {
        self.end
    }
}

impl Positioned for SignalRecord {
    #[inline]
    fn start(&self) -> u64 {
        self.start
    }
    #[inline]
    fn end(&self) -> u64 {
        self.end
    }
}
