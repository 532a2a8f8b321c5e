//! Region command implementation.
//!
//! Reports the mean signal per base inside one window per record, with the
//! window chosen by a [`RegionMode`], or the ratio of two tracks over that
//! window when a denominator track is given.

use crate::aggregate::{Ratio, SweepAggregator};
use crate::error::{Result, ScanError};
use crate::input::{load_signal, load_table, ColumnSpec, SignalFormat, TabularReader};
use crate::interval::IntervalRecord;
use crate::output::{file_stem, parent_dir, TableWriter};
use crate::partition::PartitionSet;
use crate::windows::RegionMode;
use log::{debug, info, warn};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Region command configuration.
#[derive(Debug, Clone)]
pub struct RegionCommand {
    pub mode: RegionMode,
    pub half_window: u64,
    pub columns: ColumnSpec,
    pub header: bool,
}

impl Default for RegionCommand {
    fn default() -> Self {
        Self::new(RegionMode::Summit)
    }
}

impl RegionCommand {
    pub fn new(mode: RegionMode) -> Self {
        Self {
            mode,
            half_window: 1000,
            columns: ColumnSpec::default(),
            header: false,
        }
    }

    /// `<signal dir>/<signal>_around_<regions>_halfwid<hw>_mode_<mode>[_devided<denominator>].txt`
    pub fn output_path(
        &self,
        signal: &Path,
        regions: &Path,
        denominator: Option<&Path>,
    ) -> PathBuf {
        let mut name = format!(
            "{}_around_{}_halfwid{}_mode_{}",
            file_stem(signal),
            file_stem(regions),
            self.half_window,
            self.mode
        );
        if let Some(d) = denominator {
            name.push_str("_devided");
            name.push_str(&file_stem(d));
        }
        name.push_str(".txt");
        parent_dir(signal).join(name)
    }

    /// Value of every record, in partition then start order.
    ///
    /// Records on a chromosome the signal lacks get 0, and so do windows no
    /// signal block overlaps, denominator or not. With a denominator, a
    /// chromosome missing from it is an error, and a zero denominator sum
    /// gives `None` with a warning. An empty window also gives `None`.
    pub fn compute<'a>(
        &self,
        regions: &'a PartitionSet,
        signal: &PartitionSet,
        denominator: Option<&PartitionSet>,
    ) -> Result<Vec<(&'a IntervalRecord, Option<f64>)>> {
        let mut rows = Vec::with_capacity(regions.interval_count());

        for partition in regions.iter() {
            let chrom = partition.name();
            let signals = match signal.signals(chrom) {
                Ok(signals) => signals,
                Err(ScanError::UnknownChromosome(_)) => {
                    debug!("{}: not in signal track, values are 0", chrom);
                    rows.extend(partition.intervals.iter().map(|r| (r, Some(0.0))));
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            let mut numerator = SweepAggregator::new(chrom, signals);
            let mut divisor = match denominator {
                Some(set) => Some(SweepAggregator::new(chrom, set.signals(chrom)?)),
                None => None,
            };

            for record in &partition.intervals {
                let value = self.record_value(record, &mut numerator, divisor.as_mut())?;
                rows.push((record, value));
            }

            let stats = numerator.stats();
            debug!(
                "{}: {} regions, {} seeks, {} blocks examined, {} rescans",
                chrom,
                partition.intervals.len(),
                stats.seeks,
                stats.examined,
                stats.rescans
            );
        }

        Ok(rows)
    }

    fn record_value(
        &self,
        record: &IntervalRecord,
        numerator: &mut SweepAggregator<'_>,
        divisor: Option<&mut SweepAggregator<'_>>,
    ) -> Result<Option<f64>> {
        let span = self.mode.span(record, self.half_window);
        if span.is_empty() {
            warn!(
                "region {}-{} on {} is empty. NA is returned.",
                span.start, span.end, record.chrom
            );
            return Ok(None);
        }
        let commit = self.mode.anchored_on_start(record.strand);
        // No signal left of the chromosome start.
        let Some(window) = span.window()? else {
            return Ok(Some(0.0));
        };

        numerator.begin_query(commit);
        // An uncovered window is 0 with or without a denominator.
        let Some(sum) = numerator.covered_sum(&window)? else {
            return Ok(Some(0.0));
        };
        let Some(divisor) = divisor else {
            return Ok(Some(sum / span.len() as f64));
        };

        divisor.begin_query(commit);
        let ratio = Ratio::new(sum, divisor.sum(&window)?);
        if ratio == Ratio::Undefined {
            warn!(
                "signal denominator for region {} on {} is zero. NA is returned.",
                window, record.chrom
            );
        }
        Ok(ratio.value())
    }

    /// Write the input lines with the value appended.
    pub fn write<W: Write>(
        &self,
        header: Option<&str>,
        rows: &[(&IntervalRecord, Option<f64>)],
        out: &mut TableWriter<W>,
    ) -> Result<()> {
        if let Some(header) = header {
            out.write_with_field(header, "signal_region")?;
        }
        for (record, value) in rows {
            out.write_with_value(&record.source_text, *value)?;
        }
        out.flush()
    }

    pub fn run(
        &self,
        regions: &Path,
        signal: &Path,
        format: SignalFormat,
        denominator: Option<&Path>,
    ) -> Result<PathBuf> {
        let input = load_table(regions, &TabularReader::new(self.columns).with_header(self.header))?;
        let sig = load_signal(signal, format)?;
        let sig_d = denominator.map(|d| load_signal(d, format)).transpose()?;

        let rows = self.compute(&input.records, &sig, sig_d.as_ref())?;
        let path = self.output_path(signal, regions, denominator);
        let mut out = TableWriter::create(&path)?;
        self.write(input.header.as_deref(), &rows, &mut out)?;

        let na = rows.iter().filter(|(_, v)| v.is_none()).count();
        info!(
            "wrote {} regions ({} NA) to {}",
            rows.len(),
            na,
            path.display()
        );
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GaError;
    use crate::interval::{SignalRecord, Strand};
    use approx::assert_relative_eq;

    fn regions(records: &[(&str, u64, u64, Strand)]) -> PartitionSet {
        let mut set = PartitionSet::new();
        for &(chrom, start, end, strand) in records {
            let rec = IntervalRecord::new(chrom, start, end)
                .with_strand(strand)
                .with_source(format!("{}\t{}\t{}", chrom, start, end));
            set.add_interval(rec).unwrap();
        }
        set.sort();
        set
    }

    fn track(blocks: &[(&str, u64, u64, f32)]) -> PartitionSet {
        let mut set = PartitionSet::new();
        for &(chrom, start, end, value) in blocks {
            set.add_signal(SignalRecord::new(chrom, start, end, value)).unwrap();
        }
        set.sort();
        set
    }

    #[test]
    fn test_summit_mean() {
        let cmd = RegionCommand {
            half_window: 10,
            ..RegionCommand::new(RegionMode::Summit)
        };
        let r = regions(&[("chr1", 100, 101, Strand::Unknown), ("chr9", 5, 6, Strand::Unknown)]);
        let s = track(&[("chr1", 95, 105, 2.0)]);

        let rows = cmd.compute(&r, &s, None).unwrap();
        // [90,110): 10 bases at 2.0 over 20 bases
        assert_relative_eq!(rows[0].1.unwrap(), 1.0);
        assert_eq!(rows[1].1, Some(0.0));
    }

    #[test]
    fn test_clipped_window_keeps_full_length() {
        let cmd = RegionCommand {
            half_window: 50,
            ..RegionCommand::new(RegionMode::Summit)
        };
        let r = regions(&[("chr1", 10, 11, Strand::Unknown)]);
        let s = track(&[("chr1", 0, 100, 1.0)]);
        let rows = cmd.compute(&r, &s, None).unwrap();
        // [-40, 60) clipped to [0, 60): 60 / 100
        assert_relative_eq!(rows[0].1.unwrap(), 0.6);
    }

    #[test]
    fn test_strand_aware_tss_modes() {
        let cmd = RegionCommand {
            half_window: 50,
            ..RegionCommand::new(RegionMode::UpTss)
        };
        let r = regions(&[
            ("chr1", 1000, 2000, Strand::Plus),
            ("chr1", 1000, 2000, Strand::Minus),
        ]);
        let s = track(&[("chr1", 900, 1000, 1.0), ("chr1", 2000, 2050, 4.0)]);
        let rows = cmd.compute(&r, &s, None).unwrap();
        let plus = rows.iter().find(|(rec, _)| rec.strand == Strand::Plus).unwrap();
        let minus = rows.iter().find(|(rec, _)| rec.strand == Strand::Minus).unwrap();
        // plus: [900, 1000) all at 1.0
        assert_relative_eq!(plus.1.unwrap(), 1.0);
        // minus: [2000, 2100), half of it at 4.0
        assert_relative_eq!(minus.1.unwrap(), 2.0);
    }

    #[test]
    fn test_ratio_with_denominator() {
        let cmd = RegionCommand::new(RegionMode::Region);
        let r = regions(&[("chr1", 0, 100, Strand::Unknown), ("chr1", 500, 600, Strand::Unknown)]);
        let s = track(&[("chr1", 0, 100, 3.0), ("chr1", 500, 600, 1.0)]);
        let d = track(&[("chr1", 0, 100, 1.5)]);

        let rows = cmd.compute(&r, &s, Some(&d)).unwrap();
        assert_relative_eq!(rows[0].1.unwrap(), 2.0);
        // the second region has no denominator signal
        assert_eq!(rows[1].1, None);
    }

    #[test]
    fn test_uncovered_window_is_zero_with_denominator() {
        let cmd = RegionCommand {
            half_window: 50,
            ..RegionCommand::new(RegionMode::UpTss)
        };
        let r = regions(&[
            ("chr1", 0, 50, Strand::Plus),
            ("chr1", 1000, 1100, Strand::Plus),
            ("chr1", 2000, 2100, Strand::Plus),
        ]);
        let s = track(&[("chr1", 1900, 2000, 2.0)]);
        let d = track(&[("chr1", 500, 600, 1.0)]);

        let rows = cmd.compute(&r, &s, Some(&d)).unwrap();
        // [-100, 0) lies left of the chromosome
        assert_eq!(rows[0].1, Some(0.0));
        // [900, 1000): no signal and no denominator
        assert_eq!(rows[1].1, Some(0.0));
        // [1900, 2000): signal but a zero denominator
        assert_eq!(rows[2].1, None);
    }

    #[test]
    fn test_missing_denominator_chromosome_is_an_error() {
        let cmd = RegionCommand::new(RegionMode::Region);
        let r = regions(&[("chr2", 0, 100, Strand::Unknown)]);
        let s = track(&[("chr2", 0, 100, 1.0)]);
        let d = track(&[("chr1", 0, 100, 1.0)]);
        let err = cmd.compute(&r, &s, Some(&d)).unwrap_err();
        assert!(matches!(err, GaError::Scan(ScanError::UnknownChromosome(_))));
    }

    #[test]
    fn test_zero_half_window_is_na() {
        let cmd = RegionCommand {
            half_window: 0,
            ..RegionCommand::new(RegionMode::Summit)
        };
        let r = regions(&[("chr1", 10, 11, Strand::Unknown)]);
        let s = track(&[("chr1", 0, 100, 1.0)]);
        let rows = cmd.compute(&r, &s, None).unwrap();
        assert_eq!(rows[0].1, None);
    }

    #[test]
    fn test_write_and_name() {
        let r = regions(&[("chr1", 0, 10, Strand::Unknown)]);
        let rec = &r.intervals("chr1").unwrap()[0];
        let mut buf = Vec::new();
        {
            let mut out = TableWriter::new(&mut buf);
            RegionCommand::default()
                .write(Some("chr\tst\ted"), &[(rec, Some(0.5))], &mut out)
                .unwrap();
        }
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "chr\tst\ted\tsignal_region\nchr1\t0\t10\t0.500000\n"
        );

        let cmd = RegionCommand {
            half_window: 200,
            ..RegionCommand::new(RegionMode::UpTssDown)
        };
        let path = cmd.output_path(
            Path::new("/s/pol2.bg"),
            Path::new("/r/genes.txt"),
            Some(Path::new("/s/input.bg")),
        );
        assert_eq!(
            path,
            PathBuf::from("/s/pol2_around_genes_halfwid200_mode_up-tss-dw_devidedinput.txt")
        );
    }
}
