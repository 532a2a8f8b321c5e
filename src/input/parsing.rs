//! Low-level field extraction for tab-separated genome files.

use crate::error::{GaError, Result};
use memchr::memchr;

/// Fast u64 parsing without allocation.
///
/// Returns None if the input is empty or contains non-digit characters.
#[inline(always)]
pub fn parse_u64_fast(bytes: &[u8]) -> Option<u64> {
    if bytes.is_empty() {
        return None;
    }
    let mut n: u64 = 0;
    for &b in bytes {
        let d = b.wrapping_sub(b'0');
        if d > 9 {
            return None;
        }
        n = n.checked_mul(10)?.checked_add(d as u64)?;
    }
    Some(n)
}

/// Check if a line carries no record (blank, comment, track or browser line).
#[inline(always)]
pub fn should_skip_line(line: &[u8]) -> bool {
    line.is_empty() || line[0] == b'#' || line.starts_with(b"track") || line.starts_with(b"browser")
}

/// Strip a trailing `\n` or `\r\n`.
#[inline]
pub fn trim_newline(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

/// Iterator over the tab-separated fields of a line.
pub struct Fields<'a> {
    rest: Option<&'a str>,
}

impl<'a> Iterator for Fields<'a> {
    type Item = &'a str;

    #[inline]
    fn next(&mut self) -> Option<&'a str> {
        let rest = self.rest?;
        match memchr(b'\t', rest.as_bytes()) {
            Some(tab) => {
                self.rest = Some(&rest[tab + 1..]);
                Some(&rest[..tab])
            }
            None => {
                self.rest = None;
                Some(rest)
            }
        }
    }
}

#[inline]
pub fn fields(line: &str) -> Fields<'_> {
    Fields { rest: Some(line) }
}

/// Fields of a line collected for random access by column number.
#[derive(Debug)]
pub struct Columns<'a> {
    line_number: usize,
    fields: Vec<&'a str>,
}

impl<'a> Columns<'a> {
    pub fn new(line: &'a str, line_number: usize) -> Self {
        Self {
            line_number,
            fields: fields(line).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Column `col` (0-based), or a parse error naming it.
    pub fn get(&self, col: usize, name: &str) -> Result<&'a str> {
        self.fields.get(col).copied().ok_or_else(|| GaError::Parse {
            line: self.line_number,
            message: format!(
                "missing {} column {} (line has {} columns)",
                name,
                col,
                self.fields.len()
            ),
        })
    }

    /// Column `col` parsed as a coordinate.
    pub fn position(&self, col: usize, name: &str) -> Result<u64> {
        let field = self.get(col, name)?;
        parse_u64_fast(field.as_bytes()).ok_or_else(|| GaError::Parse {
            line: self.line_number,
            message: format!("invalid {} position: '{}'", name, field),
        })
    }

    /// Column `col` parsed as a signal value.
    pub fn value(&self, col: usize) -> Result<f32> {
        let field = self.get(col, "value")?;
        field.trim().parse().map_err(|_| GaError::Parse {
            line: self.line_number,
            message: format!("invalid signal value: '{}'", field),
        })
    }

    pub fn line_number(&self) -> usize {
        self.line_number
    }
}

/// Parse a comma-separated coordinate list such as `"100,250,400,"`.
/// Empty items (the trailing comma) are ignored.
pub fn parse_position_list(field: &str, line_number: usize) -> Result<Vec<u64>> {
    field
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            parse_u64_fast(s.as_bytes()).ok_or_else(|| GaError::Parse {
                line: line_number,
                message: format!("invalid position in list: '{}'", s),
            })
        })
        .collect()
}

/// Value of a `key=value` token in a wiggle declaration line.
pub fn declaration_value<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    line.split_ascii_whitespace().find_map(|token| {
        let (k, v) = token.split_once('=')?;
        (k == key).then_some(v)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_u64_fast() {
        assert_eq!(parse_u64_fast(b"12345"), Some(12345));
        assert_eq!(parse_u64_fast(b"0"), Some(0));
        assert_eq!(parse_u64_fast(b""), None);
        assert_eq!(parse_u64_fast(b"-5"), None);
        assert_eq!(parse_u64_fast(b"123abc"), None);
        assert_eq!(parse_u64_fast(b"18446744073709551616"), None);
    }

    #[test]
    fn test_should_skip_line() {
        assert!(should_skip_line(b""));
        assert!(should_skip_line(b"#comment"));
        assert!(should_skip_line(b"track type=bedGraph"));
        assert!(should_skip_line(b"browser position chr1:1-100"));
        assert!(!should_skip_line(b"chr1\t100\t200\t1.5"));
    }

    #[test]
    fn test_fields_keep_empty_columns() {
        let f: Vec<&str> = fields("a\t\tc").collect();
        assert_eq!(f, vec!["a", "", "c"]);
        let single: Vec<&str> = fields("chr1").collect();
        assert_eq!(single, vec!["chr1"]);
    }

    #[test]
    fn test_columns_errors_name_the_column() {
        let cols = Columns::new("chr1\t100\tabc", 7);
        assert_eq!(cols.position(1, "start").unwrap(), 100);
        match cols.position(2, "end") {
            Err(GaError::Parse { line, message }) => {
                assert_eq!(line, 7);
                assert!(message.contains("end"));
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert!(cols.get(5, "strand").is_err());
    }

    #[test]
    fn test_position_list_trailing_comma() {
        assert_eq!(parse_position_list("100,250,400,", 1).unwrap(), vec![100, 250, 400]);
        assert!(parse_position_list("", 1).unwrap().is_empty());
        assert!(parse_position_list("10,x,", 1).is_err());
    }

    #[test]
    fn test_declaration_value() {
        let line = "fixedStep chrom=chr3 start=400601 step=100 span=5";
        assert_eq!(declaration_value(line, "chrom"), Some("chr3"));
        assert_eq!(declaration_value(line, "span"), Some("5"));
        assert_eq!(declaration_value(line, "missing"), None);
    }

    #[test]
    fn test_trim_newline() {
        assert_eq!(trim_newline("abc\r\n"), "abc");
        assert_eq!(trim_newline("abc\n"), "abc");
        assert_eq!(trim_newline("abc"), "abc");
    }
}
