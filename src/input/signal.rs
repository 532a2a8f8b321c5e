//! Signal track readers: bedGraph and wiggle.
//!
//! Both readers append [`SignalRecord`]s to a [`PartitionSet`]; the caller
//! sorts the set once all files are read.

use super::parsing::{declaration_value, parse_u64_fast, should_skip_line, trim_newline, Columns};
use crate::error::{GaError, Result};
use crate::interval::SignalRecord;
use crate::partition::PartitionSet;
use log::debug;
use std::io::BufRead;
use std::rc::Rc;

/// Read a bedGraph track (`chrom start end value`, 0-based half-open).
///
/// Returns the number of blocks added.
pub fn read_bedgraph<R: BufRead>(mut reader: R, set: &mut PartitionSet) -> Result<usize> {
    let mut buffer = String::with_capacity(256);
    let mut line_number = 0;
    let mut added = 0;

    loop {
        buffer.clear();
        if reader.read_line(&mut buffer)? == 0 {
            break;
        }
        line_number += 1;
        let line = trim_newline(&buffer);
        if should_skip_line(line.as_bytes()) {
            continue;
        }

        let cols = Columns::new(line, line_number);
        let start = cols.position(1, "start")?;
        let end = cols.position(2, "end")?;
        let value = cols.value(3)?;
        if end <= start {
            return Err(GaError::Parse {
                line: line_number,
                message: format!("empty signal block {}-{}", start, end),
            });
        }
        let chrom = set.key(cols.get(0, "chromosome")?)?;
        set.add_signal(SignalRecord::new(chrom, start, end, value))?;
        added += 1;
    }

    debug!("read {} bedGraph blocks", added);
    Ok(added)
}

/// Data section a wiggle line belongs to.
enum WigSection {
    None,
    Fixed {
        chrom: Rc<str>,
        next: u64,
        step: u64,
        span: u64,
    },
    Variable {
        chrom: Rc<str>,
        span: u64,
    },
}

fn declaration_u64(line: &str, key: &str, line_number: usize) -> Result<Option<u64>> {
    match declaration_value(line, key) {
        None => Ok(None),
        Some(v) => parse_u64_fast(v.as_bytes())
            .map(Some)
            .ok_or_else(|| GaError::Parse {
                line: line_number,
                message: format!("invalid {}= value '{}'", key, v),
            }),
    }
}

fn required_chrom<'a>(line: &'a str, line_number: usize) -> Result<&'a str> {
    declaration_value(line, "chrom").ok_or_else(|| GaError::Parse {
        line: line_number,
        message: "step declaration without chrom=".to_string(),
    })
}

fn one_based(pos: u64, line_number: usize) -> Result<u64> {
    pos.checked_sub(1).ok_or_else(|| GaError::Parse {
        line: line_number,
        message: "wiggle positions are 1-based; got 0".to_string(),
    })
}

fn parse_value(field: &str, line_number: usize) -> Result<f32> {
    field.trim().parse().map_err(|_| GaError::Parse {
        line: line_number,
        message: format!("invalid signal value: '{}'", field),
    })
}

/// Read a wiggle track with `fixedStep` and/or `variableStep` sections.
///
/// Positions are 1-based and converted to 0-based blocks of `span` bases.
/// Entries with value 0 carry no signal and are dropped.
pub fn read_wig<R: BufRead>(mut reader: R, set: &mut PartitionSet) -> Result<usize> {
    let mut buffer = String::with_capacity(256);
    let mut line_number = 0;
    let mut added = 0;
    let mut section = WigSection::None;

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

        if line.starts_with("fixedStep") {
            let chrom = set.key(required_chrom(line, line_number)?)?;
            let start = declaration_u64(line, "start", line_number)?.ok_or_else(|| {
                GaError::Parse {
                    line: line_number,
                    message: "fixedStep without start=".to_string(),
                }
            })?;
            let step = declaration_u64(line, "step", line_number)?.unwrap_or(1);
            let span = declaration_u64(line, "span", line_number)?.unwrap_or(1);
            section = WigSection::Fixed {
                chrom,
                next: one_based(start, line_number)?,
                step,
                span,
            };
            continue;
        }
        if line.starts_with("variableStep") {
            let chrom = set.key(required_chrom(line, line_number)?)?;
            let span = declaration_u64(line, "span", line_number)?.unwrap_or(1);
            section = WigSection::Variable { chrom, span };
            continue;
        }

        let record = match &mut section {
            WigSection::None => {
                return Err(GaError::Parse {
                    line: line_number,
                    message: "data line before any step declaration".to_string(),
                })
            }
            WigSection::Fixed {
                chrom,
                next,
                step,
                span,
            } => {
                let value = parse_value(line, line_number)?;
                let start = *next;
                *next += *step;
                (value != 0.0).then(|| SignalRecord::new(Rc::clone(chrom), start, start + *span, value))
            }
            WigSection::Variable { chrom, span } => {
                let (pos, value) = line.split_once(char::is_whitespace).ok_or_else(|| {
                    GaError::Parse {
                        line: line_number,
                        message: format!("expected 'position value', got '{}'", line),
                    }
                })?;
                let pos = parse_u64_fast(pos.as_bytes()).ok_or_else(|| GaError::Parse {
                    line: line_number,
                    message: format!("invalid position '{}'", pos),
                })?;
                let value = parse_value(value, line_number)?;
                let start = one_based(pos, line_number)?;
                (value != 0.0).then(|| SignalRecord::new(Rc::clone(chrom), start, start + *span, value))
            }
        };

        if let Some(record) = record {
            set.add_signal(record)?;
            added += 1;
        }
    }

    debug!("read {} wiggle entries", added);
    Ok(added)
}
