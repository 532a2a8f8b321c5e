//! Readers for peak, summit and reference-transcript tables.
//!
//! Every data line becomes one [`IntervalRecord`] carrying the line itself
//! as source text, so tools can re-emit it with extra columns appended.

use super::open_reader;
use super::parsing::{parse_position_list, should_skip_line, trim_newline, Columns};
use crate::error::{GaError, Result};
use crate::interval::{IntervalRecord, Strand, Window};
use crate::partition::PartitionSet;
use std::io::BufRead;
use std::path::Path;

/// 0-based column numbers of a peak or summit table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub chrom: usize,
    pub start: usize,
    pub end: usize,
    pub strand: Option<usize>,
}

impl Default for ColumnSpec {
    fn default() -> Self {
        Self {
            chrom: 0,
            start: 1,
            end: 2,
            strand: None,
        }
    }
}

/// Records of one table grouped by chromosome, plus its header line.
#[derive(Debug, Default)]
pub struct TabularInput {
    pub header: Option<String>,
    pub records: PartitionSet,
}

/// Line-oriented table reader shared by the peak and reference readers.
struct LineReader<R: BufRead> {
    reader: R,
    line_number: usize,
    buffer: String,
}

impl<R: BufRead> LineReader<R> {
    fn new(reader: R) -> Self {
        Self {
            reader,
            line_number: 0,
            buffer: String::with_capacity(1024),
        }
    }

    /// Next raw line without its terminator and its 1-based line number,
    /// or None at end of input.
    fn next_line(&mut self) -> Result<Option<(usize, &str)>> {
        self.buffer.clear();
        if self.reader.read_line(&mut self.buffer)? == 0 {
            return Ok(None);
        }
        self.line_number += 1;
        Ok(Some((self.line_number, trim_newline(&self.buffer))))
    }
}

/// Reader for peak and summit tables with configurable columns.
#[derive(Debug, Clone, Copy, Default)]
pub struct TabularReader {
    pub columns: ColumnSpec,
    /// Keep the first line as a header instead of parsing it.
    pub header: bool,
}

impl TabularReader {
    pub fn new(columns: ColumnSpec) -> Self {
        Self {
            columns,
            header: false,
        }
    }

    pub fn with_header(mut self, header: bool) -> Self {
        self.header = header;
        self
    }

    pub fn read_path<P: AsRef<Path>>(&self, path: P) -> Result<TabularInput> {
        self.read(open_reader(path.as_ref())?)
    }

    /// Read every record. Blank, `#`, `track` and `browser` lines are
    /// skipped. A start column equal to the end column gives point records.
    pub fn read<R: BufRead>(&self, reader: R) -> Result<TabularInput> {
        let mut lines = LineReader::new(reader);
        let mut input = TabularInput::default();

        if self.header {
            input.header = lines.next_line()?.map(|(_, line)| line.to_string());
        }

        while let Some((line_number, line)) = lines.next_line()? {
            if should_skip_line(line.as_bytes()) {
                continue;
            }
            let cols = Columns::new(line, line_number);
            let start = cols.position(self.columns.start, "start")?;
            let end = cols.position(self.columns.end, "end")?;
            if end < start {
                return Err(GaError::Parse {
                    line: cols.line_number(),
                    message: format!("start ({}) > end ({})", start, end),
                });
            }
            let strand = match self.columns.strand {
                Some(col) => Strand::from_field(cols.get(col, "strand")?),
                None => Strand::Unknown,
            };
            let chrom = input.records.key(cols.get(self.columns.chrom, "chromosome")?)?;
            let record = IntervalRecord::new(chrom, start, end)
                .with_strand(strand)
                .with_source(line);
            input.records.add_interval(record)?;
        }

        Ok(input)
    }
}

/// Column layout of a reference transcript table (genePred style).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceColumns {
    pub chrom: usize,
    pub start: usize,
    pub end: usize,
    pub strand: usize,
    pub exon_starts: usize,
    pub exon_ends: usize,
}

impl Default for ReferenceColumns {
    fn default() -> Self {
        Self {
            chrom: 2,
            start: 4,
            end: 5,
            strand: 3,
            exon_starts: 9,
            exon_ends: 10,
        }
    }
}

/// Reader for reference transcripts with exon lists.
///
/// Exon starts are 1-based closed coordinates and exon ends are inclusive;
/// each exon becomes the half-open window `[start - 1, end)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceReader {
    pub columns: ReferenceColumns,
    pub header: bool,
}

impl ReferenceReader {
    pub fn new(columns: ReferenceColumns) -> Self {
        Self {
            columns,
            header: false,
        }
    }

    pub fn with_header(mut self, header: bool) -> Self {
        self.header = header;
        self
    }

    pub fn read_path<P: AsRef<Path>>(&self, path: P) -> Result<TabularInput> {
        self.read(open_reader(path.as_ref())?)
    }

    pub fn read<R: BufRead>(&self, reader: R) -> Result<TabularInput> {
        let mut lines = LineReader::new(reader);
        let mut input = TabularInput::default();

        if self.header {
            input.header = lines.next_line()?.map(|(_, line)| line.to_string());
        }

        while let Some((line_number, line)) = lines.next_line()? {
            if should_skip_line(line.as_bytes()) {
                continue;
            }
            let cols = Columns::new(line, line_number);
            let start = cols.position(self.columns.start, "start")?;
            let end = cols.position(self.columns.end, "end")?;
            let strand = Strand::from_field(cols.get(self.columns.strand, "strand")?);
            let blocks = exon_windows(&cols, &self.columns)?;

            let chrom = input.records.key(cols.get(self.columns.chrom, "chromosome")?)?;
            let record = IntervalRecord::new(chrom, start, end)
                .with_strand(strand)
                .with_source(line)
                .with_blocks(blocks);
            input.records.add_interval(record)?;
        }

        Ok(input)
    }
}

fn exon_windows(cols: &Columns<'_>, layout: &ReferenceColumns) -> Result<Vec<Window>> {
    let line = cols.line_number();
    let starts = parse_position_list(cols.get(layout.exon_starts, "exon starts")?, line)?;
    let ends = parse_position_list(cols.get(layout.exon_ends, "exon ends")?, line)?;
    if starts.len() != ends.len() {
        return Err(GaError::Parse {
            line,
            message: format!(
                "{} exon starts but {} exon ends",
                starts.len(),
                ends.len()
            ),
        });
    }

    starts
        .iter()
        .zip(&ends)
        .map(|(&s, &e)| {
            Window::from_one_based(s, e).map_err(|err| GaError::Parse {
                line,
                message: format!("invalid exon {}-{}: {}", s, e, err),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_peaks_with_header() {
        let data = "name\tchr\tst\ted\n#skip\nchr2\t300\t400\nchr1\t100\t200\tp2\n";
        let input = TabularReader::default()
            .with_header(true)
            .read(Cursor::new(data))
            .unwrap();

        assert_eq!(input.header.as_deref(), Some("name\tchr\tst\ted"));
        assert_eq!(input.records.interval_count(), 2);
        let chr1 = input.records.intervals("chr1").unwrap();
        assert_eq!(chr1[0].start, 100);
        assert_eq!(chr1[0].source_text, "chr1\t100\t200\tp2");
    }

    #[test]
    fn test_custom_columns_and_strand() {
        let data = "p1\tchrX\t-\t500\t500\n";
        let cols = ColumnSpec {
            chrom: 1,
            start: 3,
            end: 4,
            strand: Some(2),
        };
        let input = TabularReader::new(cols).read(Cursor::new(data)).unwrap();
        let rec = &input.records.intervals("chrX").unwrap()[0];
        assert_eq!(rec.strand, Strand::Minus);
        assert_eq!((rec.start, rec.end), (500, 500));
    }

    #[test]
    fn test_bad_coordinate_reports_line() {
        let data = "chr1\t100\t200\nchr1\tabc\t300\n";
        let err = TabularReader::default().read(Cursor::new(data)).unwrap_err();
        assert!(matches!(err, GaError::Parse { line: 2, .. }));

        let reversed = "chr1\t300\t200\n";
        assert!(TabularReader::default().read(Cursor::new(reversed)).is_err());
    }

    #[test]
    fn test_reference_exons_are_shifted_once() {
        let line = "NM_1\tGENE\tchr1\t+\t0\t300\t0\t300\t2\t1,201,\t100,300,\n";
        let input = ReferenceReader::default().read(Cursor::new(line)).unwrap();
        let rec = &input.records.intervals("chr1").unwrap()[0];

        assert_eq!(rec.strand, Strand::Plus);
        assert_eq!(rec.blocks, vec![Window::new(0, 100).unwrap(), Window::new(200, 300).unwrap()]);
        assert_eq!(rec.source_text, trim_newline(line));
    }

    #[test]
    fn test_reference_exon_list_mismatch() {
        let line = "NM_1\tGENE\tchr1\t+\t0\t300\t0\t300\t2\t1,201,\t100,\n";
        assert!(ReferenceReader::default().read(Cursor::new(line)).is_err());
    }
}
