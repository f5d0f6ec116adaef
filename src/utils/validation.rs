use crate::core::transform::TransformRegistry;
use crate::utils::error::{TidyError, Result};
use std::collections::HashSet;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(TidyError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(TidyError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

/// A bare file name: no directory separators, no parent references.
pub fn validate_file_name(field_name: &str, name: &str) -> Result<()> {
    validate_non_empty_string(field_name, name)?;

    if name.contains('/') || name.contains('\\') || name == "." || name == ".." {
        return Err(TidyError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: name.to_string(),
            reason: "File name must not contain path components".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(TidyError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

/// Delimiters are single ASCII bytes that cannot be confused with quoting or line breaks.
pub fn validate_delimiter(field_name: &str, delimiter: char) -> Result<()> {
    if !delimiter.is_ascii() {
        return Err(TidyError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: delimiter.to_string(),
            reason: "Delimiter must be a single ASCII character".to_string(),
        });
    }

    if matches!(delimiter, '"' | '\n' | '\r') {
        return Err(TidyError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: delimiter.escape_default().to_string(),
            reason: "Delimiter cannot be a quote or line break".to_string(),
        });
    }

    Ok(())
}

pub fn validate_transform_ids<'a, I>(field_name: &str, ids: I) -> Result<()>
where
    I: IntoIterator<Item = &'a str>,
{
    let known: HashSet<&str> = TransformRegistry::standard().ids().collect();

    for id in ids {
        if !known.contains(id) {
            tracing::debug!("{} references unregistered transform '{}'", field_name, id);
            return Err(TidyError::UnknownTransform { id: id.to_string() });
        }
    }

    Ok(())
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| TidyError::MissingConfigError {
        field: field_name.to_string(),
    })
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(TidyError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("batch_size", 5, 1).is_ok());
        assert!(validate_positive_number("batch_size", 0, 1).is_err());
    }

    #[test]
    fn test_validate_delimiter() {
        assert!(validate_delimiter("delimiter", ',').is_ok());
        assert!(validate_delimiter("delimiter", ';').is_ok());
        assert!(validate_delimiter("delimiter", '\t').is_ok());
        assert!(validate_delimiter("delimiter", '"').is_err());
        assert!(validate_delimiter("delimiter", '\n').is_err());
        assert!(validate_delimiter("delimiter", 'ø').is_err());
    }

    #[test]
    fn test_validate_file_name() {
        assert!(validate_file_name("file_name", "output.csv").is_ok());
        assert!(validate_file_name("file_name", "").is_err());
        assert!(validate_file_name("file_name", "../output.csv").is_err());
        assert!(validate_file_name("file_name", "dir/output.csv").is_err());
    }

    #[test]
    fn test_validate_transform_ids() {
        assert!(validate_transform_ids("disable", ["remove-decimals"]).is_ok());
        assert!(matches!(
            validate_transform_ids("disable", ["remove-decimals", "shuffle"]),
            Err(TidyError::UnknownTransform { id }) if id == "shuffle"
        ));
    }

    #[test]
    fn test_validate_required_field() {
        let present = Some(3usize);
        let missing: Option<usize> = None;
        assert_eq!(*validate_required_field("input", &present).unwrap(), 3);
        assert!(validate_required_field("input", &missing).is_err());
    }
}
