//! Chromosome-partitioned record storage.
//!
//! A [`PartitionSet`] holds one [`ChromosomePartition`] per distinct
//! chromosome name for one coordinate axis (queries, signal, denominator
//! signal, ...). Partitions are built in any order, sorted once, and then
//! swept any number of times.

use crate::error::{GaError, Result, ScanError};
use crate::interval::{IntervalRecord, SignalRecord};
use crate::sort::{is_sorted_by_start, merge_sort_by, sort_by_start};
use rustc_hash::FxHashMap;
use std::rc::Rc;

/// All records of one chromosome for one dataset.
#[derive(Debug, Clone, Default)]
pub struct ChromosomePartition {
    name: Rc<str>,
    pub intervals: Vec<IntervalRecord>,
    pub signals: Vec<SignalRecord>,
}

impl ChromosomePartition {
    pub fn new(name: impl Into<Rc<str>>) -> Self {
        Self {
            name: name.into(),
            intervals: Vec::new(),
            signals: Vec::new(),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared handle to the chromosome name, for building records.
    #[inline]
    pub fn key(&self) -> Rc<str> {
        Rc::clone(&self.name)
    }

    /// Sort intervals and signals by start, stably.
    pub fn sort(&mut self) {
        self.intervals = sort_by_start(std::mem::take(&mut self.intervals));
        self.signals = sort_by_start(std::mem::take(&mut self.signals));
    }

    pub fn is_sorted(&self) -> bool {
        is_sorted_by_start(&self.intervals) && is_sorted_by_start(&self.signals)
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty() && self.signals.is_empty()
    }
}

/// Partitions of one dataset keyed by chromosome name.
#[derive(Debug, Default)]
pub struct PartitionSet {
    partitions: Vec<ChromosomePartition>,
    index: FxHashMap<Rc<str>, usize>,
}

impl PartitionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the shared name handle for `chrom`, creating its partition on
    /// first use.
    pub fn key(&mut self, chrom: &str) -> Result<Rc<str>> {
        Ok(self.partition_mut(chrom)?.key())
    }

    fn partition_mut(&mut self, chrom: &str) -> Result<&mut ChromosomePartition> {
        if chrom.is_empty() {
            return Err(GaError::EmptyChromosomeName);
        }
        let idx = match self.index.get(chrom) {
            Some(&idx) => idx,
            None => {
                let partition = ChromosomePartition::new(chrom);
                let idx = self.partitions.len();
                self.index.insert(partition.key(), idx);
                self.partitions.push(partition);
                idx
            }
        };
        Ok(&mut self.partitions[idx])
    }

    /// Append an interval to its chromosome's partition.
    pub fn add_interval(&mut self, record: IntervalRecord) -> Result<()> {
        let chrom = Rc::clone(&record.chrom);
        self.partition_mut(&chrom)?.intervals.push(record);
        Ok(())
    }

    /// Append a signal block to its chromosome's partition.
    pub fn add_signal(&mut self, record: SignalRecord) -> Result<()> {
        let chrom = Rc::clone(&record.chrom);
        self.partition_mut(&chrom)?.signals.push(record);
        Ok(())
    }

    /// Insert a fully built partition.
    ///
    /// Unlike `add_*`, which merge into an existing partition, this fails if
    /// a partition with the same name already exists.
    pub fn insert_partition(&mut self, partition: ChromosomePartition) -> Result<()> {
        if partition.name().is_empty() {
            return Err(GaError::EmptyChromosomeName);
        }
        if self.index.contains_key(partition.name()) {
            return Err(GaError::DuplicateChromosomeKey(partition.name().to_string()));
        }
        self.index.insert(partition.key(), self.partitions.len());
        self.partitions.push(partition);
        Ok(())
    }

    /// Sort partitions by name and every partition's records by start.
    pub fn sort(&mut self) {
        let partitions = std::mem::take(&mut self.partitions);
        let mut partitions = merge_sort_by(
            partitions,
            &|a: &ChromosomePartition, b: &ChromosomePartition| a.name().cmp(b.name()),
        );
        for partition in partitions.iter_mut() {
            partition.sort();
        }

        self.index.clear();
        for (idx, partition) in partitions.iter().enumerate() {
            self.index.insert(partition.key(), idx);
        }
        self.partitions = partitions;
    }

    pub fn is_sorted(&self) -> bool {
        self.partitions
            .windows(2)
            .all(|w| w[0].name() <= w[1].name())
            && self.partitions.iter().all(|p| p.is_sorted())
    }

    #[inline]
    pub fn get(&self, chrom: &str) -> Option<&ChromosomePartition> {
        self.index.get(chrom).map(|&idx| &self.partitions[idx])
    }

    /// Signal blocks of `chrom`, or `UnknownChromosome`.
    pub fn signals(&self, chrom: &str) -> std::result::Result<&[SignalRecord], ScanError> {
        self.get(chrom)
            .map(|p| p.signals.as_slice())
            .ok_or_else(|| ScanError::UnknownChromosome(chrom.to_string()))
    }

    /// Intervals of `chrom`, or `UnknownChromosome`.
    pub fn intervals(&self, chrom: &str) -> std::result::Result<&[IntervalRecord], ScanError> {
        self.get(chrom)
            .map(|p| p.intervals.as_slice())
            .ok_or_else(|| ScanError::UnknownChromosome(chrom.to_string()))
    }

    #[inline]
    pub fn contains(&self, chrom: &str) -> bool {
        self.index.contains_key(chrom)
    }

    /// Partitions in current order (name order after [`sort`](Self::sort)).
    pub fn iter(&self) -> impl Iterator<Item = &ChromosomePartition> {
        self.partitions.iter()
    }

    pub fn chromosomes(&self) -> impl Iterator<Item = &str> {
        self.partitions.iter().map(|p| p.name())
    }

    /// Number of partitions.
    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }

    pub fn interval_count(&self) -> usize {
        self.partitions.iter().map(|p| p.intervals.len()).sum()
    }

    pub fn signal_count(&self) -> usize {
        self.partitions.iter().map(|p| p.signals.len()).sum()
    }
}
