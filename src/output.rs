//! Buffered tab-separated output and output file naming.
//!
//! Integers go through itoa; floats are written with six decimals to match
//! the tables the tools have always produced.

use crate::aggregate::Ratio;
use crate::error::Result;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Buffer size for TableWriter (1MB default).
const DEFAULT_BUFFER_SIZE: usize = 1024 * 1024;

/// Tab-separated table writer.
pub struct TableWriter<W: Write> {
    writer: BufWriter<W>,
    itoa_buf: itoa::Buffer,
}

impl TableWriter<File> {
    /// Create (or truncate) `path` for writing.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(File::create(path)?))
    }
}

impl<W: Write> TableWriter<W> {
    pub fn new(output: W) -> Self {
        Self::with_capacity(DEFAULT_BUFFER_SIZE, output)
    }

    pub fn with_capacity(capacity: usize, output: W) -> Self {
        Self {
            writer: BufWriter::with_capacity(capacity, output),
            itoa_buf: itoa::Buffer::new(),
        }
    }

    /// Write a full line as-is with newline.
    #[inline]
    pub fn write_line(&mut self, line: &str) -> Result<()> {
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    #[inline]
    pub fn write_str(&mut self, s: &str) -> Result<()> {
        self.writer.write_all(s.as_bytes())?;
        Ok(())
    }

    #[inline]
    pub fn write_tab(&mut self) -> Result<()> {
        self.writer.write_all(b"\t")?;
        Ok(())
    }

    #[inline]
    pub fn write_newline(&mut self) -> Result<()> {
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    #[inline]
    pub fn write_int<I: itoa::Integer>(&mut self, n: I) -> Result<()> {
        self.writer.write_all(self.itoa_buf.format(n).as_bytes())?;
        Ok(())
    }

    /// Write a float with six decimal places.
    #[inline]
    pub fn write_float(&mut self, f: f64) -> Result<()> {
        write!(self.writer, "{:.6}", f)?;
        Ok(())
    }

    #[inline]
    pub fn write_na(&mut self) -> Result<()> {
        self.writer.write_all(b"NA")?;
        Ok(())
    }

    /// Write a value, or `NA` for `None`.
    #[inline]
    pub fn write_value(&mut self, value: Option<f64>) -> Result<()> {
        match value {
            Some(v) => self.write_float(v),
            None => self.write_na(),
        }
    }

    #[inline]
    pub fn write_ratio(&mut self, ratio: Ratio) -> Result<()> {
        self.write_value(ratio.value())
    }

    /// Write `source\tvalue\n`.
    pub fn write_with_value(&mut self, source: &str, value: Option<f64>) -> Result<()> {
        self.write_str(source)?;
        self.write_tab()?;
        self.write_value(value)?;
        self.write_newline()
    }

    /// Write `source\tfield\n`.
    pub fn write_with_field(&mut self, source: &str, field: &str) -> Result<()> {
        self.write_str(source)?;
        self.write_tab()?;
        self.write_str(field)?;
        self.write_newline()
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// File name without its last extension (`peaks.bed` -> `peaks`,
/// `sig.wig.gz` -> `sig.wig`).
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Last extension including its dot (`.bed`), or an empty string.
pub fn file_extension(path: &Path) -> String {
    path.extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default()
}

/// Directory holding `path`; `.` for bare file names.
pub fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render<F>(f: F) -> String
    where
        F: FnOnce(&mut TableWriter<&mut Vec<u8>>) -> Result<()>,
    {
        let mut buf = Vec::new();
        {
            let mut w = TableWriter::new(&mut buf);
            f(&mut w).unwrap();
            w.flush().unwrap();
        }
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_value_columns() {
        let out = render(|w| {
            w.write_with_value("chr1\t10\t20", Some(1.0 / 3.0))?;
            w.write_with_value("chr1\t30\t40", None)?;
            w.write_int(42u64)?;
            w.write_tab()?;
            w.write_ratio(Ratio::new(1.0, 4.0))?;
            w.write_newline()
        });
        assert_eq!(out, "chr1\t10\t20\t0.333333\nchr1\t30\t40\tNA\n42\t0.250000\n");
    }

    #[test]
    fn test_fields_and_lines() {
        let out = render(|w| {
            w.write_line("header")?;
            w.write_with_field("a\tb", "Over")
        });
        assert_eq!(out, "header\na\tb\tOver\n");
    }

    #[test]
    fn test_path_helpers() {
        assert_eq!(file_stem(Path::new("/data/peaks.bed")), "peaks");
        assert_eq!(file_stem(Path::new("sig.wig.gz")), "sig.wig");
        assert_eq!(file_extension(Path::new("/data/peaks.bed")), ".bed");
        assert_eq!(file_extension(Path::new("peaks")), "");
        assert_eq!(parent_dir(Path::new("peaks.bed")), PathBuf::from("."));
        assert_eq!(parent_dir(Path::new("/data/peaks.bed")), PathBuf::from("/data"));
    }
}
