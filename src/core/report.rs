use crate::domain::model::{ParseSnapshot, RowError};

pub fn summary(snapshot: &ParseSnapshot) -> String {
    format!(
        "{} rows, {} columns, {} errors",
        snapshot.row_count(),
        snapshot.column_count(),
        snapshot.error_count()
    )
}

/// Tab-separated preview of the first `limit` rows.
///
/// The first column is the row number; rows with parse errors get a `!` after it.
pub fn preview_table(snapshot: &ParseSnapshot, limit: usize) -> String {
    if !snapshot.complete {
        return format!("Please wait ... {} rows so far", snapshot.rows_processed);
    }

    let mut lines = Vec::with_capacity(limit.min(snapshot.rows.len()) + 1);
    let mut header = vec!["row".to_string()];
    header.extend(snapshot.fields.iter().cloned());
    lines.push(header.join("\t"));

    for row in snapshot.rows.iter().take(limit) {
        let marker = if row.has_errors() { "!" } else { "" };
        let mut cells = vec![format!("{}{}", row.index, marker)];
        cells.extend(
            snapshot
                .fields
                .iter()
                .enumerate()
                .map(|(position, field)| one_line(row.value_at(position, field).unwrap_or(""))),
        );
        lines.push(cells.join("\t"));
    }

    if snapshot.rows.len() > limit {
        lines.push(format!("... {} more rows", snapshot.rows.len() - limit));
    }

    lines.join("\n")
}

/// The error list as a `type | code | message | row` table.
pub fn error_table(errors: &[RowError]) -> String {
    let mut lines = vec!["type\tcode\tmessage\trow".to_string()];
    lines.extend(errors.iter().map(|error| {
        format!(
            "{:?}\t{:?}\t{}\t{}",
            error.kind, error.code, error.message, error.row
        )
    }));
    lines.join("\n")
}

fn one_line(value: &str) -> String {
    value.replace(['\r', '\n'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::parser::parse_all;
    use crate::domain::model::{ParseOptions, SerializerOptions};

    fn parsed(text: &str) -> ParseSnapshot {
        parse_all(text, ParseOptions::default(), SerializerOptions::default()).unwrap()
    }

    #[test]
    fn test_summary_counts() {
        let snapshot = parsed("A,B\n1,2\n3");
        assert_eq!(summary(&snapshot), "2 rows, 2 columns, 1 errors");
    }

    #[test]
    fn test_preview_marks_errored_rows() {
        let snapshot = parsed("A,B\n1,2\n3\n\"x\ny\",4");
        let preview = preview_table(&snapshot, 10);
        let lines: Vec<&str> = preview.lines().collect();

        assert_eq!(lines[0], "row\tA\tB");
        assert_eq!(lines[1], "0\t1\t2");
        assert_eq!(lines[2], "1!\t3\t");
        assert_eq!(lines[3], "2\tx y\t4");
    }

    #[test]
    fn test_preview_shows_duplicate_columns() {
        let snapshot = parsed("A,A\n1,2");
        let preview = preview_table(&snapshot, 10);
        assert_eq!(preview, "row\tA\tA\n0\t1\t2");
    }

    #[test]
    fn test_error_table_lists_unterminated_quote() {
        let snapshot = parsed("A,B\n1,\"open");
        assert_eq!(
            error_table(&snapshot.errors),
            "type\tcode\tmessage\trow\nQuotes\tMissingQuotes\tQuoted field unterminated\t0"
        );
    }

    #[test]
    fn test_preview_limit() {
        let snapshot = parsed("A\n1\n2\n3");
        let preview = preview_table(&snapshot, 1);
        assert!(preview.ends_with("... 2 more rows"));
    }

    #[test]
    fn test_preview_waits_for_completion() {
        let snapshot = ParseSnapshot {
            rows_processed: 7,
            ..ParseSnapshot::empty(3)
        };
        assert_eq!(preview_table(&snapshot, 5), "Please wait ... 7 rows so far");
    }

    #[test]
    fn test_error_table() {
        let snapshot = parsed("A,B\n1");
        assert_eq!(
            error_table(&snapshot.errors),
            "type\tcode\tmessage\trow\nFieldMismatch\tTooFewFields\tToo few fields: expected 2 fields but parsed 1\t0"
        );
    }
}
