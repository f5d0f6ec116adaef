//! Row-at-a-time CSV parsing with progress snapshots.
//!
//! A [`ParseRun`] owns its accumulator. Callers only ever see clones of it
//! through [`ParseRun::snapshot`] / [`ParseRun::advance`], and the final
//! state through [`ParseRun::finish`], which consumes the run.

use crate::core::serializer;
use crate::domain::model::{ParseOptions, ParseSnapshot, Row, RowError, SerializerOptions};
use crate::utils::error::Result;
use std::collections::VecDeque;
use std::io::Cursor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// A data row was appended at this index.
    Row(usize),
    Exhausted,
}

/// Extent of one record in the input, as seen by a quote-aware line scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RecordSpan {
    start: usize,
    end: usize,
    unclosed_quote: bool,
}

impl RecordSpan {
    fn is_blank(&self) -> bool {
        self.start == self.end
    }
}

/// Walks the input the way the csv reader does, one record at a time.
///
/// The csv reader drops blank lines and reads an unterminated quoted field to
/// the end of the input without complaint. Scanning the same bytes in step
/// with it recovers both.
#[derive(Debug)]
struct RecordScanner {
    pos: usize,
    delimiter: u8,
}

impl RecordScanner {
    fn new(delimiter: u8) -> Self {
        Self { pos: 0, delimiter }
    }

    fn next_span(&mut self, bytes: &[u8]) -> Option<RecordSpan> {
        if self.pos >= bytes.len() {
            return None;
        }

        let start = self.pos;
        let mut in_quotes = false;
        let mut at_field_start = true;
        let mut i = start;

        while i < bytes.len() {
            let byte = bytes[i];
            if in_quotes {
                if byte == b'"' {
                    if bytes.get(i + 1) == Some(&b'"') {
                        i += 2;
                        continue;
                    }
                    in_quotes = false;
                }
                i += 1;
                continue;
            }

            match byte {
                b'\n' => {
                    self.pos = i + 1;
                    return Some(RecordSpan { start, end: i, unclosed_quote: false });
                }
                b'\r' => {
                    self.pos = if bytes.get(i + 1) == Some(&b'\n') { i + 2 } else { i + 1 };
                    return Some(RecordSpan { start, end: i, unclosed_quote: false });
                }
                b'"' if at_field_start => {
                    in_quotes = true;
                    at_field_start = false;
                }
                b if b == self.delimiter => at_field_start = true,
                _ => at_field_start = false,
            }
            i += 1;
        }

        self.pos = bytes.len();
        Some(RecordSpan {
            start,
            end: bytes.len(),
            unclosed_quote: in_quotes,
        })
    }
}

#[derive(Debug)]
struct PendingRecord {
    values: Vec<String>,
    unclosed_quote: bool,
}

impl PendingRecord {
    /// A blank line reads as a single empty field.
    fn blank() -> Self {
        Self {
            values: vec![String::new()],
            unclosed_quote: false,
        }
    }
}

pub struct ParseRun {
    reader: csv::Reader<Cursor<Vec<u8>>>,
    record: csv::StringRecord,
    scanner: RecordScanner,
    pending: VecDeque<PendingRecord>,
    state: ParseSnapshot,
    header_seen: bool,
    exhausted: bool,
    skip_empty_lines: bool,
    output: SerializerOptions,
}

impl ParseRun {
    pub fn new(run: u64, text: String, options: ParseOptions, output: SerializerOptions) -> Self {
        let reader = csv::ReaderBuilder::new()
            .delimiter(options.delimiter)
            .has_headers(false)
            .flexible(true)
            .from_reader(Cursor::new(text.into_bytes()));

        Self {
            reader,
            record: csv::StringRecord::new(),
            scanner: RecordScanner::new(options.delimiter),
            pending: VecDeque::new(),
            state: ParseSnapshot::empty(run),
            header_seen: false,
            exhausted: false,
            skip_empty_lines: options.skip_empty_lines,
            output,
        }
    }

    pub fn run_id(&self) -> u64 {
        self.state.run
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Parses at most one data row. The header is consumed on the way to the first one.
    ///
    /// Blank lines between records become rows of one empty field unless the
    /// run was configured to skip them. Blank lines after the last record are
    /// never reported.
    pub fn step(&mut self) -> Result<Progress> {
        if let Some(pending) = self.pending.pop_front() {
            return Ok(Progress::Row(self.push_row(pending)));
        }
        if self.exhausted {
            return Ok(Progress::Exhausted);
        }

        let mut blank_lines = 0;
        loop {
            let Some(span) = self.scanner.next_span(self.reader.get_ref().get_ref()) else {
                self.exhausted = true;
                return Ok(Progress::Exhausted);
            };
            if span.is_blank() {
                blank_lines += 1;
                continue;
            }

            if !self.reader.read_record(&mut self.record)? {
                self.exhausted = true;
                return Ok(Progress::Exhausted);
            }
            let values: Vec<String> = self.record.iter().map(str::to_string).collect();

            if !self.header_seen {
                self.state.fields = values;
                self.header_seen = true;
                blank_lines = 0;
                tracing::debug!("Captured {} header fields", self.state.fields.len());
                continue;
            }

            if self.skip_empty_lines {
                tracing::debug!("Skipped {} blank lines", blank_lines);
            } else {
                self.pending
                    .extend(std::iter::repeat_with(PendingRecord::blank).take(blank_lines));
            }
            self.pending.push_back(PendingRecord {
                values,
                unclosed_quote: span.unclosed_quote,
            });
            break;
        }

        match self.pending.pop_front() {
            Some(pending) => Ok(Progress::Row(self.push_row(pending))),
            None => Ok(Progress::Exhausted),
        }
    }

    fn push_row(&mut self, pending: PendingRecord) -> usize {
        let index = self.state.rows.len();
        let row = self.build_row(index, pending);
        self.state.errors.extend(row.errors.iter().cloned());
        self.state.rows.push(row);
        self.state.rows_processed += 1;
        index
    }

    fn build_row(&self, index: usize, pending: PendingRecord) -> Row {
        let fields = &self.state.fields;
        let parsed = pending.values.len();

        let mut values = pending.values.into_iter();
        let named = fields
            .iter()
            .zip(values.by_ref())
            .map(|(field, value)| (field.clone(), value))
            .collect();
        let extra = values.collect();

        let mut errors = Vec::new();
        if parsed != fields.len() {
            let error = RowError::field_mismatch(index, fields.len(), parsed);
            tracing::debug!("Row {}: {}", index, error.message);
            errors.push(error);
        }
        if pending.unclosed_quote {
            let error = RowError::missing_quotes(index);
            tracing::debug!("Row {}: {}", index, error.message);
            errors.push(error);
        }

        Row {
            index,
            values: named,
            extra,
            errors,
        }
    }

    /// Parses up to `max_rows` rows and returns the resulting snapshot.
    pub fn advance(&mut self, max_rows: usize) -> Result<ParseSnapshot> {
        for _ in 0..max_rows {
            if self.step()? == Progress::Exhausted {
                break;
            }
        }
        Ok(self.snapshot())
    }

    pub fn snapshot(&self) -> ParseSnapshot {
        self.state.clone()
    }

    /// Consumes whatever input is left, marks the run complete and serializes it.
    pub fn finish(mut self) -> Result<ParseSnapshot> {
        while self.step()? != Progress::Exhausted {}

        let serialized = serializer::serialize(&self.state.rows, &self.state.fields, &self.output)?;
        self.state.complete = true;
        self.state.serialized = Some(serialized);

        tracing::info!(
            "Parse run {} complete: {} rows, {} columns, {} errors",
            self.state.run,
            self.state.row_count(),
            self.state.column_count(),
            self.state.error_count()
        );

        Ok(self.state)
    }
}

/// Parses the whole text in one go.
pub fn parse_all(
    text: &str,
    options: ParseOptions,
    output: SerializerOptions,
) -> Result<ParseSnapshot> {
    ParseRun::new(0, text.to_string(), options, output).finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{RowErrorCode, RowErrorKind};

    fn run(text: &str) -> ParseRun {
        ParseRun::new(1, text.to_string(), ParseOptions::default(), SerializerOptions::default())
    }

    #[test]
    fn test_rows_are_numbered_in_order() {
        let snapshot = run("A,B\n1,2\n3,4\n5,6").finish().unwrap();

        assert_eq!(snapshot.fields, vec!["A", "B"]);
        let indices: Vec<usize> = snapshot.rows.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(snapshot.rows_processed, 3);
        assert_eq!(snapshot.rows[2].get("B"), Some("6"));
        assert!(snapshot.errors.is_empty());
    }

    #[test]
    fn test_snapshots_grow_monotonically() {
        let mut parse = run("A\n1\n2\n3\n4\n5");
        let mut previous = parse.snapshot();
        assert_eq!(previous.rows_processed, 0);

        while !parse.is_exhausted() {
            let next = parse.advance(2).unwrap();
            assert!(!next.complete);
            assert!(next.serialized.is_none());
            assert_eq!(next.rows_processed, next.rows.len());
            assert!(next.rows_processed >= previous.rows_processed);
            assert_eq!(&next.rows[..previous.rows.len()], &previous.rows[..]);
            previous = next;
        }

        assert_eq!(previous.rows_processed, 5);
        let done = parse.finish().unwrap();
        assert!(done.complete);
        assert_eq!(done.rows, previous.rows);
    }

    #[test]
    fn test_quoted_fields() {
        let snapshot = run("A,B\n\"x,y\",\"line1\nline2\"\n\"say \"\"hi\"\"\",z")
            .finish()
            .unwrap();

        assert_eq!(snapshot.rows.len(), 2);
        assert_eq!(snapshot.rows[0].get("A"), Some("x,y"));
        assert_eq!(snapshot.rows[0].get("B"), Some("line1\nline2"));
        assert_eq!(snapshot.rows[1].get("A"), Some("say \"hi\""));
    }

    #[test]
    fn test_malformed_row_is_contained() {
        let snapshot = run("A,B,C\n1,2,3\n4\n5,6,7,8\n9,10,11").finish().unwrap();

        assert_eq!(snapshot.rows.len(), 4);
        assert_eq!(snapshot.errors.len(), 2);

        let short = &snapshot.rows[1];
        assert_eq!(short.get("A"), Some("4"));
        assert_eq!(short.get("B"), None);
        assert_eq!(short.errors[0].code, RowErrorCode::TooFewFields);
        assert_eq!(short.errors[0].row, 1);

        let long = &snapshot.rows[2];
        assert_eq!(long.extra, vec!["8"]);
        assert_eq!(long.errors[0].code, RowErrorCode::TooManyFields);

        assert!(!snapshot.rows[0].has_errors());
        assert!(!snapshot.rows[3].has_errors());
        assert_eq!(snapshot.rows[3].get("C"), Some("11"));
        assert_eq!(snapshot.rows[3].index, 3);
    }

    #[test]
    fn test_finish_serializes_once_complete() {
        let snapshot = run("A,B\n1,2").finish().unwrap();
        assert!(snapshot.complete);
        assert_eq!(snapshot.serialized.as_deref(), Some("A,B\r\n1,2"));
    }

    #[test]
    fn test_empty_input() {
        let snapshot = run("").finish().unwrap();
        assert!(snapshot.complete);
        assert!(snapshot.rows.is_empty());
        assert!(snapshot.fields.is_empty());
        assert!(!snapshot.is_exportable());
    }

    #[test]
    fn test_semicolon_delimiter() {
        let snapshot = parse_all(
            "A;B\n1;2,5",
            ParseOptions {
                delimiter: b';',
                ..ParseOptions::default()
            },
            SerializerOptions::default(),
        )
        .unwrap();
        assert_eq!(snapshot.rows[0].get("B"), Some("2,5"));
    }

    #[test]
    fn test_unclosed_quote_is_reported() {
        let snapshot = run("A,B\n1,\"x\n2,3\n4,5").finish().unwrap();

        assert_eq!(snapshot.rows.len(), 1);
        assert_eq!(snapshot.rows[0].get("B"), Some("x\n2,3\n4,5"));
        assert_eq!(snapshot.errors.len(), 1);
        assert_eq!(snapshot.errors[0].kind, RowErrorKind::Quotes);
        assert_eq!(snapshot.errors[0].code, RowErrorCode::MissingQuotes);
        assert_eq!(snapshot.errors[0].row, 0);
        assert_eq!(snapshot.rows[0].errors, snapshot.errors);
    }

    #[test]
    fn test_quote_inside_unquoted_field_is_literal() {
        let snapshot = run("A,B\n5\" tall,2\n3,4").finish().unwrap();

        assert_eq!(snapshot.rows.len(), 2);
        assert_eq!(snapshot.rows[0].get("A"), Some("5\" tall"));
        assert!(snapshot.errors.is_empty());
    }

    #[test]
    fn test_blank_line_becomes_errored_row() {
        let snapshot = run("A,B\n1,2\n\n3,4").finish().unwrap();

        assert_eq!(snapshot.rows.len(), 3);
        assert_eq!(snapshot.errors.len(), 1);
        assert_eq!(snapshot.errors[0].row, 1);
        assert_eq!(snapshot.errors[0].code, RowErrorCode::TooFewFields);
        assert_eq!(snapshot.rows[1].get("A"), Some(""));
        assert_eq!(snapshot.rows[2].index, 2);
        assert_eq!(snapshot.rows[2].get("B"), Some("4"));
        assert_eq!(snapshot.serialized.as_deref(), Some("A,B\r\n1,2\r\n,\r\n3,4"));
    }

    #[test]
    fn test_blank_lines_across_crlf_and_quotes() {
        let snapshot = run("A,B\r\n\"x\r\n\r\ny\",1\r\n\r\n\r\n2,3").finish().unwrap();

        assert_eq!(snapshot.rows.len(), 4);
        assert_eq!(snapshot.rows[0].get("A"), Some("x\r\n\r\ny"));
        let errored: Vec<usize> = snapshot.errors.iter().map(|e| e.row).collect();
        assert_eq!(errored, vec![1, 2]);
        assert_eq!(snapshot.rows[3].get("A"), Some("2"));
    }

    #[test]
    fn test_skip_empty_lines_option() {
        let snapshot = parse_all(
            "A,B\n\n1,2\n\n\n3,4",
            ParseOptions {
                skip_empty_lines: true,
                ..ParseOptions::default()
            },
            SerializerOptions::default(),
        )
        .unwrap();

        assert_eq!(snapshot.rows.len(), 2);
        assert!(snapshot.errors.is_empty());
        assert_eq!(snapshot.rows[1].index, 1);
    }

    #[test]
    fn test_blank_lines_before_header_are_ignored() {
        let snapshot = run("\n\nA,B\n1,2").finish().unwrap();
        assert_eq!(snapshot.fields, vec!["A", "B"]);
        assert_eq!(snapshot.rows.len(), 1);
        assert!(snapshot.errors.is_empty());
    }

    #[test]
    fn test_duplicate_header_names_keep_their_values() {
        let snapshot = run("A,A\n1,2").finish().unwrap();
        assert_eq!(snapshot.rows[0].values[1], ("A".to_string(), "2".to_string()));
        assert_eq!(snapshot.serialized.as_deref(), Some("A,A\r\n1,2"));
    }
}
