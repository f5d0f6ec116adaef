use crate::utils::error::Result;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Decoded contents of one imported file. Never mutated; a new import replaces it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawDocument {
    text: String,
}

impl RawDocument {
    /// Strict UTF-8 decode. Leading and trailing whitespace is dropped, so a
    /// trailing newline in the export does not turn into an empty data row.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let text = String::from_utf8(bytes)?;
        Ok(Self::from_text(&text))
    }

    pub fn from_text(text: &str) -> Self {
        Self {
            text: text.trim().to_string(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowErrorKind {
    FieldMismatch,
    Quotes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowErrorCode {
    TooFewFields,
    TooManyFields,
    MissingQuotes,
}

/// A recoverable problem found while parsing one data row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    #[serde(rename = "type")]
    pub kind: RowErrorKind,
    pub code: RowErrorCode,
    pub message: String,
    pub row: usize,
}

impl RowError {
    pub fn field_mismatch(row: usize, expected: usize, parsed: usize) -> Self {
        let (code, label) = if parsed < expected {
            (RowErrorCode::TooFewFields, "Too few fields")
        } else {
            (RowErrorCode::TooManyFields, "Too many fields")
        };

        Self {
            kind: RowErrorKind::FieldMismatch,
            code,
            message: format!(
                "{}: expected {} fields but parsed {}",
                label, expected, parsed
            ),
            row,
        }
    }

    /// A quoted field that is still open at the end of the input.
    pub fn missing_quotes(row: usize) -> Self {
        Self {
            kind: RowErrorKind::Quotes,
            code: RowErrorCode::MissingQuotes,
            message: "Quoted field unterminated".to_string(),
            row,
        }
    }
}

/// One parsed data record.
///
/// `values` keeps header order. Fields beyond the header end up in `extra`;
/// fields missing at the end of a short row are simply absent.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Row {
    pub index: usize,
    pub values: Vec<(String, String)>,
    pub extra: Vec<String>,
    pub errors: Vec<RowError>,
}

impl Row {
    pub fn get(&self, field: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value.as_str())
    }

    /// Value of the header column at `position`. Falls back to a lookup by
    /// name when the row was not built in header order, which keeps
    /// duplicate header names apart.
    pub fn value_at(&self, position: usize, field: &str) -> Option<&str> {
        match self.values.get(position) {
            Some((name, value)) if name == field => Some(value.as_str()),
            _ => self.get(field),
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("row", &self.index)?;
        for (field, value) in &self.values {
            map.serialize_entry(field, value)?;
        }
        if !self.extra.is_empty() {
            map.serialize_entry("__parsed_extra", &self.extra)?;
        }
        if !self.errors.is_empty() {
            map.serialize_entry("error", &self.errors)?;
        }
        map.end()
    }
}

/// Immutable point-in-time view of one parse run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ParseSnapshot {
    pub run: u64,
    pub rows: Vec<Row>,
    pub fields: Vec<String>,
    pub errors: Vec<RowError>,
    pub rows_processed: usize,
    pub complete: bool,
    pub serialized: Option<String>,
}

impl ParseSnapshot {
    pub fn empty(run: u64) -> Self {
        Self {
            run,
            ..Self::default()
        }
    }

    /// A finished run with nothing in it: no document, or one that failed to import.
    pub fn settled(run: u64) -> Self {
        Self {
            run,
            complete: true,
            serialized: Some(String::new()),
            ..Self::default()
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.fields.len()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Same gate as the original download button: finished and non-empty.
    pub fn is_exportable(&self) -> bool {
        self.complete && !self.rows.is_empty() && self.serialized.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum LineTerminator {
    #[default]
    Crlf,
    Lf,
    Cr,
}

impl LineTerminator {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineTerminator::Crlf => "\r\n",
            LineTerminator::Lf => "\n",
            LineTerminator::Cr => "\r",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum QuoteStyle {
    /// Values are written verbatim, even when they contain the delimiter.
    #[default]
    Never,
    Necessary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    pub delimiter: u8,
    /// Drop blank lines instead of turning them into rows with a field-count error.
    pub skip_empty_lines: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            skip_empty_lines: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerializerOptions {
    pub delimiter: u8,
    pub line_terminator: LineTerminator,
    pub quote_style: QuoteStyle,
}

impl Default for SerializerOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            line_terminator: LineTerminator::Crlf,
            quote_style: QuoteStyle::Never,
        }
    }
}

/// A finished, encoded output file handed to a [`ResultSink`](crate::domain::ports::ResultSink).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub name: String,
    pub size: usize,
    pub bytes: Vec<u8>,
}

impl Artifact {
    pub fn from_text(name: impl Into<String>, text: &str) -> Self {
        let bytes = text.as_bytes().to_vec();
        Self {
            name: name.into(),
            size: bytes.len(),
            bytes,
        }
    }
}
