use crate::domain::model::{LineTerminator, QuoteStyle, Row, SerializerOptions};
use crate::utils::error::{Result, TidyError};

/// Writes the header and one line per row, joined by the configured
/// terminator. There is no terminator after the last line.
///
/// Values are taken by header position, so duplicate field names keep their
/// own values. Missing trailing values are written as empty strings.
pub fn serialize(rows: &[Row], fields: &[String], options: &SerializerOptions) -> Result<String> {
    let terminator = options.line_terminator.as_str();
    if fields.is_empty() {
        // The csv writer cannot express a record with zero fields.
        return Ok(vec![""; rows.len() + 1].join(terminator));
    }

    let mut writer = csv::WriterBuilder::new()
        .delimiter(options.delimiter)
        .quote_style(match options.quote_style {
            QuoteStyle::Never => csv::QuoteStyle::Never,
            QuoteStyle::Necessary => csv::QuoteStyle::Necessary,
        })
        .terminator(match options.line_terminator {
            LineTerminator::Crlf => csv::Terminator::CRLF,
            LineTerminator::Lf => csv::Terminator::Any(b'\n'),
            LineTerminator::Cr => csv::Terminator::Any(b'\r'),
        })
        .flexible(true)
        .from_writer(Vec::new());

    writer.write_record(fields)?;
    for row in rows {
        writer.write_record(
            fields
                .iter()
                .enumerate()
                .map(|(position, field)| row.value_at(position, field).unwrap_or("")),
        )?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| TidyError::IoError(e.into_error()))?;
    let mut text = String::from_utf8(bytes)?;
    if text.ends_with(terminator) {
        text.truncate(text.len() - terminator.len());
    }
    Ok(text)
}
