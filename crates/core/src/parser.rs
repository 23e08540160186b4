//! Parser for the delimited KPI text format
//!
//! ```text
//! battAlias;country;continent;climate;iso_a3;model_series;var;val;descr;cnt_vhcl
//! Batt_1;Germany;Europe;normal;DEU;Series_1;variable_1;100;Test;10
//! ```
//!
//! The header only fixes the expected column count. Rows with a different
//! column count are dropped without an error, and non-integer `val`/`cnt_vhcl`
//! fields become `NaN`.

use crate::error::{Error, Result};
use crate::record::KpiRecord;
use serde::Serialize;
use tracing::debug;

/// Default field delimiter of the wire format
pub const DEFAULT_DELIMITER: char = ';';

/// A data line that was skipped because of its column count
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SkippedLine {
    /// 1-based line number in the source text (the header is line 1)
    pub line: usize,
    /// Number of fields found on the line
    pub fields: usize,
}

/// What the parser saw while reading a dataset
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ParseReport {
    /// Column count of the header line
    pub header_columns: usize,
    /// Non-empty lines after the header
    pub data_lines: usize,
    /// Blank lines after the header
    pub blank_lines: usize,
    /// Lines dropped for a column-count mismatch
    pub skipped: Vec<SkippedLine>,
}

impl ParseReport {
    /// Number of records produced
    pub fn parsed(&self) -> usize {
        self.data_lines - self.skipped.len()
    }
}

/// Parser for KPI delimited text
#[derive(Debug, Clone)]
pub struct KpiParser {
    delimiter: char,
}

impl KpiParser {
    /// Create a parser for the `;`-delimited wire format
    pub fn new() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
        }
    }

    /// Create a parser with a different field delimiter
    pub fn with_delimiter(delimiter: char) -> Self {
        Self { delimiter }
    }

    /// Parse raw text into records, preserving line order
    pub fn parse(&self, text: &str) -> Vec<KpiRecord> {
        self.parse_with_report(text).0
    }

    /// Parse raw text and report which lines were dropped
    pub fn parse_with_report(&self, text: &str) -> (Vec<KpiRecord>, ParseReport) {
        let mut records = Vec::new();
        let mut report = ParseReport::default();

        let mut lines = text.split('\n');

        let header = match lines.next() {
            Some(header) => header,
            None => return (records, report),
        };
        report.header_columns = header.split(self.delimiter).count();

        for (index, line) in lines.enumerate() {
            // The header is line 1
            let line_number = index + 2;
            let line = line.trim();

            if line.is_empty() {
                report.blank_lines += 1;
                continue;
            }
            report.data_lines += 1;

            let fields: Vec<&str> = line.split(self.delimiter).collect();
            if fields.len() != report.header_columns {
                debug!(
                    "Skipping malformed line {}: expected {} fields, got {}",
                    line_number,
                    report.header_columns,
                    fields.len()
                );
                report.skipped.push(SkippedLine {
                    line: line_number,
                    fields: fields.len(),
                });
                continue;
            }

            match record_from_fields(&fields) {
                Some(record) => records.push(record),
                None => {
                    // A header narrower than the wire format: nothing can be mapped
                    debug!(
                        "Skipping line {}: {} fields cannot fill a record",
                        line_number,
                        fields.len()
                    );
                    report.skipped.push(SkippedLine {
                        line: line_number,
                        fields: fields.len(),
                    });
                }
            }
        }

        debug!(
            "Parsed {} records ({} skipped, {} blank)",
            records.len(),
            report.skipped.len(),
            report.blank_lines
        );

        (records, report)
    }
}

impl Default for KpiParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Map fields positionally onto a record. Extra trailing columns are ignored.
fn record_from_fields(fields: &[&str]) -> Option<KpiRecord> {
    if fields.len() < 10 {
        return None;
    }

    Some(KpiRecord {
        batt_alias: fields[0].to_string(),
        country: fields[1].to_string(),
        continent: fields[2].to_string(),
        climate: fields[3].to_string(),
        iso_a3: fields[4].trim().to_uppercase(),
        model_series: fields[5].to_string(),
        variable: fields[6].to_string(),
        value: parse_int(fields[7]),
        description: fields[8].to_string(),
        count: parse_int(fields[9]),
    })
}

/// Base-10 integer parse that reads the leading digits and ignores the rest.
///
/// `"12abc"` gives 12, `"3.7"` gives 3, and a field without leading digits
/// gives `NaN`.
pub fn parse_int(field: &str) -> f64 {
    let s = field.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let end = digits
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return f64::NAN;
    }

    // f64 parse keeps arbitrarily long digit runs finite (up to 1e308)
    let magnitude: f64 = digits[..end].parse().unwrap_or(f64::NAN);
    if negative {
        -magnitude
    } else {
        magnitude
    }
}

/// Parse KPI records from a file
pub fn parse_from_file(path: &std::path::Path) -> Result<Vec<KpiRecord>> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(KpiParser::new().parse(&content))
}

/// Parse KPI records from a string
pub fn parse_from_string(text: &str) -> Vec<KpiRecord> {
    KpiParser::new().parse(text)
}
