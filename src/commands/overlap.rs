//! Overlap command implementation.
//!
//! Splits the peaks of file A into those touching a peak of file B and
//! those that do not, and writes an annotated copy plus a summary.

use crate::classify::{ClassifyMode, ClassifyReport, OverlapClassifier};
use crate::error::Result;
use crate::input::{load_table, ColumnSpec, TabularReader};
use crate::interval::IntervalRecord;
use crate::output::{file_extension, file_stem, parent_dir, TableWriter};
use log::info;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Overlap command configuration.
#[derive(Debug, Clone, Default)]
pub struct OverlapCommand {
    pub columns_a: ColumnSpec,
    pub columns_b: ColumnSpec,
    /// Compare `[start - hw, start + hw]` of each A record instead of its extent.
    pub half_window: Option<u64>,
    /// Report the number of B peaks hit, not just the label.
    pub count: bool,
    /// First line of each file is a header.
    pub header: bool,
}

/// Paths of the four tables one run writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlapOutputs {
    pub overlapping: PathBuf,
    pub non_overlapping: PathBuf,
    pub annotated: PathBuf,
    pub summary: PathBuf,
}

impl OverlapOutputs {
    /// `<A dir>/<A>[_hw<N>]_{over,nonover,vs}_<B><A ext>` and
    /// `<A dir>/<A>[_hw<N>]_vs_<B>_summary.txt`.
    pub fn new(a: &Path, b: &Path, half_window: Option<u64>) -> Self {
        let dir = parent_dir(a);
        let prefix = match half_window {
            Some(hw) if hw > 0 => format!("{}_hw{}", file_stem(a), hw),
            _ => file_stem(a),
        };
        let b_name = file_stem(b);
        let ext = file_extension(a);
        Self {
            overlapping: dir.join(format!("{}_over_{}{}", prefix, b_name, ext)),
            non_overlapping: dir.join(format!("{}_nonover_{}{}", prefix, b_name, ext)),
            annotated: dir.join(format!("{}_vs_{}{}", prefix, b_name, ext)),
            summary: dir.join(format!("{}_vs_{}_summary.txt", prefix, b_name)),
        }
    }
}

impl OverlapCommand {
    pub fn new() -> Self {
        Self::default()
    }

    fn classifier(&self) -> OverlapClassifier {
        let mode = if self.count {
            ClassifyMode::Count
        } else {
            ClassifyMode::FirstMatch
        };
        OverlapClassifier::new()
            .with_half_window(self.half_window.filter(|&hw| hw > 0))
            .with_mode(mode)
    }

    fn write_records<W: Write>(
        header: Option<&str>,
        records: &[&IntervalRecord],
        out: &mut TableWriter<W>,
    ) -> Result<()> {
        if let Some(header) = header {
            out.write_line(header)?;
        }
        for record in records {
            out.write_line(&record.source_text)?;
        }
        out.flush()
    }

    /// A records with `Over`/`NonOver` (and the hit count) appended.
    pub fn write_annotated<W: Write>(
        &self,
        header: Option<&str>,
        report: &ClassifyReport<'_>,
        out: &mut TableWriter<W>,
    ) -> Result<()> {
        if let Some(header) = header {
            out.write_str(header)?;
            out.write_str(if self.count {
                "\toverlap_flag\tcount"
            } else {
                "\toverlap_flag"
            })?;
            out.write_newline()?;
        }
        for item in &report.annotated {
            out.write_str(&item.record.source_text)?;
            out.write_tab()?;
            out.write_str(&item.classification.label.to_string())?;
            if self.count {
                out.write_tab()?;
                out.write_int(item.classification.count)?;
            }
            out.write_newline()?;
        }
        out.flush()
    }

    /// `name total Over NonOver` with fractions in parentheses.
    pub fn write_summary<W: Write>(
        &self,
        name: &str,
        report: &ClassifyReport<'_>,
        out: &mut TableWriter<W>,
    ) -> Result<()> {
        let total = report.total();
        let fraction = |n: usize| if total == 0 { 0.0 } else { n as f64 / total as f64 };
        out.write_line("name\ttotal\tOver\tNonOver")?;
        out.write_line(&format!(
            "{}\t{}\t{}({:.3})\t{}({:.3})",
            name,
            total,
            report.overlapping.len(),
            fraction(report.overlapping.len()),
            report.non_overlapping.len(),
            fraction(report.non_overlapping.len())
        ))?;
        out.flush()
    }

    /// Classify A against B and write all four tables.
    pub fn run(&self, a: &Path, b: &Path) -> Result<OverlapOutputs> {
        let input_a = load_table(a, &TabularReader::new(self.columns_a).with_header(self.header))?;
        let input_b = load_table(b, &TabularReader::new(self.columns_b).with_header(self.header))?;

        let report = self.classifier().classify(&input_a.records, &input_b.records)?;
        let outputs = OverlapOutputs::new(a, b, self.half_window);
        let header = input_a.header.as_deref();

        Self::write_records(
            header,
            &report.overlapping,
            &mut TableWriter::create(&outputs.overlapping)?,
        )?;
        Self::write_records(
            header,
            &report.non_overlapping,
            &mut TableWriter::create(&outputs.non_overlapping)?,
        )?;
        self.write_annotated(header, &report, &mut TableWriter::create(&outputs.annotated)?)?;
        self.write_summary(&file_stem(a), &report, &mut TableWriter::create(&outputs.summary)?)?;

        info!(
            "{} of {} peaks overlap {} ({:.1}%)",
            report.overlapping.len(),
            report.total(),
            b.display(),
            report.overlap_fraction() * 100.0
        );
        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::PartitionSet;

    fn set(records: &[(&str, u64, u64)]) -> PartitionSet {
        let mut set = PartitionSet::new();
        for &(chrom, start, end) in records {
            let rec = IntervalRecord::new(chrom, start, end)
                .with_source(format!("{}\t{}\t{}", chrom, start, end));
            set.add_interval(rec).unwrap();
        }
        set.sort();
        set
    }

    fn render<F>(f: F) -> String
    where
        F: FnOnce(&mut TableWriter<&mut Vec<u8>>) -> Result<()>,
    {
        let mut buf = Vec::new();
        f(&mut TableWriter::new(&mut buf)).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_annotated_and_summary() {
        let a = set(&[("chr1", 100, 200), ("chr1", 500, 600), ("chr2", 10, 20)]);
        let b = set(&[("chr1", 150, 160), ("chr1", 190, 210)]);
        let cmd = OverlapCommand {
            count: true,
            ..OverlapCommand::new()
        };
        let report = cmd.classifier().classify(&a, &b).unwrap();

        let annotated = render(|w| cmd.write_annotated(Some("chr\tst\ted"), &report, w));
        assert_eq!(
            annotated,
            "chr\tst\ted\toverlap_flag\tcount\n\
             chr1\t100\t200\tOver\t2\n\
             chr1\t500\t600\tNonOver\t0\n\
             chr2\t10\t20\tNonOver\t0\n"
        );

        let summary = render(|w| cmd.write_summary("a", &report, w));
        assert_eq!(summary, "name\ttotal\tOver\tNonOver\na\t3\t1(0.333)\t2(0.667)\n");
    }

    #[test]
    fn test_first_match_label_only() {
        let a = set(&[("chr1", 100, 200)]);
        let b = set(&[("chr1", 200, 300)]);
        let cmd = OverlapCommand::new();
        let report = cmd.classifier().classify(&a, &b).unwrap();
        let annotated = render(|w| cmd.write_annotated(None, &report, w));
        // touching peaks overlap
        assert_eq!(annotated, "chr1\t100\t200\tOver\n");
    }

    #[test]
    fn test_empty_summary() {
        let report = ClassifyReport::default();
        let summary = render(|w| OverlapCommand::new().write_summary("a", &report, w));
        assert!(summary.ends_with("a\t0\t0(0.000)\t0(0.000)\n"));
    }

    #[test]
    fn test_output_names() {
        let plain = OverlapOutputs::new(Path::new("/d/a.bed"), Path::new("/e/b.bed"), None);
        assert_eq!(plain.overlapping, PathBuf::from("/d/a_over_b.bed"));
        assert_eq!(plain.non_overlapping, PathBuf::from("/d/a_nonover_b.bed"));
        assert_eq!(plain.annotated, PathBuf::from("/d/a_vs_b.bed"));
        assert_eq!(plain.summary, PathBuf::from("/d/a_vs_b_summary.txt"));

        let hw = OverlapOutputs::new(Path::new("/d/a.bed"), Path::new("b.bed"), Some(50));
        assert_eq!(hw.overlapping, PathBuf::from("/d/a_hw50_over_b.bed"));
    }
}
