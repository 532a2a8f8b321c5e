//! RPKM command implementation.
//!
//! Sums an expression track over the exons of every reference transcript
//! and normalises by exon length and read length.

use crate::aggregate::SweepAggregator;
use crate::error::{Result, ScanError};
use crate::input::{load_signal, ReferenceColumns, ReferenceReader, SignalFormat};
use crate::interval::IntervalRecord;
use crate::output::{file_stem, parent_dir, TableWriter};
use crate::partition::PartitionSet;
use crate::windows::exon_length;
use log::{debug, info};
use std::io::Write;
use std::path::{Path, PathBuf};

/// RPKM command configuration.
#[derive(Debug, Clone)]
pub struct RpkmCommand {
    /// Sequencing read length.
    pub read_length: u64,
    pub columns: ReferenceColumns,
    /// First line of the reference file is a header.
    pub header: bool,
}

impl Default for RpkmCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl RpkmCommand {
    pub fn new() -> Self {
        Self {
            read_length: 101,
            columns: ReferenceColumns::default(),
            header: false,
        }
    }

    /// `<expression dir>/RPKM_of_<expression>_<reference>.txt`
    pub fn output_path(expression: &Path, reference: &Path) -> PathBuf {
        parent_dir(expression).join(format!(
            "RPKM_of_{}_{}.txt",
            file_stem(expression),
            file_stem(reference)
        ))
    }

    /// RPKM from an exon signal sum; `None` for a transcript without
    /// exon bases.
    #[inline]
    pub fn rpkm(&self, sum: f64, exon_len: u64) -> Option<f64> {
        if exon_len == 0 || self.read_length == 0 {
            return None;
        }
        Some(sum / (exon_len as f64 / 1000.0) / self.read_length as f64)
    }

    /// RPKM of every transcript, in partition then start order.
    ///
    /// Transcripts on a chromosome the expression track lacks get 0.
    pub fn compute<'a>(
        &self,
        reference: &'a PartitionSet,
        expression: &PartitionSet,
    ) -> Result<Vec<(&'a IntervalRecord, Option<f64>)>> {
        let mut rows = Vec::with_capacity(reference.interval_count());

        for partition in reference.iter() {
            let chrom = partition.name();
            let signals = match expression.signals(chrom) {
                Ok(signals) => signals,
                Err(ScanError::UnknownChromosome(_)) => {
                    debug!("{}: not in expression track, RPKM is 0", chrom);
                    rows.extend(partition.intervals.iter().map(|t| (t, Some(0.0))));
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let mut aggregator = SweepAggregator::new(chrom, signals);
            for transcript in &partition.intervals {
                aggregator.begin_query(true);
                let sum = aggregator.sum_all(&transcript.blocks)?;
                rows.push((transcript, self.rpkm(sum, exon_length(&transcript.blocks))));
            }

            let stats = aggregator.stats();
            debug!(
                "{}: {} transcripts, {} seeks, {} blocks examined, {} rescans",
                chrom,
                partition.intervals.len(),
                stats.seeks,
                stats.examined,
                stats.rescans
            );
        }

        Ok(rows)
    }

    /// Write the reference lines with their RPKM appended.
    pub fn write<W: Write>(
        &self,
        header: Option<&str>,
        rows: &[(&IntervalRecord, Option<f64>)],
        out: &mut TableWriter<W>,
    ) -> Result<()> {
        if let Some(header) = header {
            out.write_line(header)?;
        }
        for (transcript, value) in rows {
            out.write_with_value(&transcript.source_text, *value)?;
        }
        out.flush()
    }

    /// Load both inputs, compute and write the table. Returns the output path.
    pub fn run(
        &self,
        expression: &Path,
        format: SignalFormat,
        reference: &Path,
    ) -> Result<PathBuf> {
        let reader = ReferenceReader::new(self.columns).with_header(self.header);
        let mut transcripts = reader.read_path(reference)?;
        transcripts.records.sort();
        let signal = load_signal(expression, format)?;

        let rows = self.compute(&transcripts.records, &signal)?;
        let path = Self::output_path(expression, reference);
        let mut out = TableWriter::create(&path)?;
        self.write(transcripts.header.as_deref(), &rows, &mut out)?;

        info!("wrote RPKM of {} transcripts to {}", rows.len(), path.display());
        Ok(path)
    }
}
