//! Genome table: chromosome sizes, used to draw random background sites.
//!
//! Format: tab-delimited `chrom\tsize` per line.

use crate::error::{GaError, Result};
use crate::input::open_reader;
use crate::input::parsing::{should_skip_line, trim_newline, Columns};
use crate::interval::IntervalRecord;
use crate::partition::PartitionSet;
use rand::Rng;
use rustc_hash::FxHashMap;
use std::io::BufRead;
use std::path::Path;

/// Chromosome sizes in input order.
#[derive(Debug, Clone, Default)]
pub struct GenomeTable {
    sizes: FxHashMap<String, u64>,
    order: Vec<String>,
}

impl GenomeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::read(open_reader(path.as_ref())?)
    }

    pub fn read<R: BufRead>(mut reader: R) -> Result<Self> {
        let mut table = Self::new();
        let mut buffer = String::new();
        let mut line_number = 0;

        loop {
            buffer.clear();
            if reader.read_line(&mut buffer)? == 0 {
                break;
            }
            line_number += 1;
            let line = trim_newline(&buffer).trim();
            if should_skip_line(line.as_bytes()) {
                continue;
            }
            let cols = Columns::new(line, line_number);
            let size = cols.position(1, "size")?;
            table.insert(cols.get(0, "chromosome")?, size);
        }

        Ok(table)
    }

    /// Insert or replace a chromosome size.
    pub fn insert(&mut self, chrom: &str, size: u64) {
        if self.sizes.insert(chrom.to_string(), size).is_none() {
            self.order.push(chrom.to_string());
        }
    }

    #[inline]
    pub fn size(&self, chrom: &str) -> Option<u64> {
        self.sizes.get(chrom).copied()
    }

    pub fn chromosomes(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Draw as many uniformly random point sites per chromosome as `like`
    /// has records there, keeping `margin` bases clear of both ends.
    ///
    /// The result is sorted and ready for a sweep.
    pub fn random_sites<R: Rng>(
        &self,
        like: &PartitionSet,
        margin: u64,
        rng: &mut R,
    ) -> Result<PartitionSet> {
        let mut sites = PartitionSet::new();
        for partition in like.iter() {
            let name = partition.name();
            let size = self.size(name).ok_or_else(|| {
                GaError::InvalidArgument(format!("chromosome '{}' is not in the genome table", name))
            })?;
            let hi = size.saturating_sub(margin);
            if hi <= margin {
                return Err(GaError::InvalidArgument(format!(
                    "chromosome '{}' ({} bp) is too short for a {} bp margin",
                    name, size, margin
                )));
            }
            let key = sites.key(name)?;
            for _ in 0..partition.intervals.len() {
                let pos = rng.gen_range(margin..hi);
                sites.add_interval(IntervalRecord::new(key.clone(), pos, pos + 1))?;
            }
        }
        sites.sort();
        Ok(sites)
    }
}
