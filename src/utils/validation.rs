use crate::utils::error::{EtlError, Result};
use std::collections::HashSet;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.trim().is_empty() {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

/// A bare file name: no directory components, resolved against a configured directory.
pub fn validate_file_name(field_name: &str, name: &str) -> Result<()> {
    validate_non_empty_string(field_name, name)?;

    if name.contains('/') || name.contains('\\') || name == "." || name == ".." {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: name.to_string(),
            reason: "Expected a file name without directory components".to_string(),
        });
    }

    Ok(())
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| EtlError::MissingConfigError {
        field: field_name.to_string(),
    })
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_unique_names(field_name: &str, names: &[String]) -> Result<()> {
    if names.is_empty() {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: "[]".to_string(),
            reason: "At least one column name is required".to_string(),
        });
    }

    let mut seen = HashSet::new();
    for name in names {
        validate_non_empty_string(field_name, name)?;
        if !seen.insert(name.as_str()) {
            return Err(EtlError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: name.clone(),
                reason: "Duplicate column name".to_string(),
            });
        }
    }
    Ok(())
}

pub fn validate_delimiter(field_name: &str, delimiter: &str) -> Result<u8> {
    match delimiter.as_bytes() {
        [byte] if byte.is_ascii() && *byte != b'"' && *byte != b'\n' && *byte != b'\r' => {
            Ok(*byte)
        }
        _ => Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: delimiter.to_string(),
            reason: "Delimiter must be a single ASCII character other than a quote or newline"
                .to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_path() {
        assert!(validate_path("paths.raw_dir", "/data/raw").is_ok());
        assert!(validate_path("paths.raw_dir", "").is_err());
        assert!(validate_path("paths.raw_dir", "bad\0path").is_err());
    }

    #[test]
    fn test_validate_file_name() {
        assert!(validate_file_name("inputs.source_file", "patients.csv").is_ok());
        assert!(validate_file_name("inputs.source_file", "../patients.csv").is_err());
        assert!(validate_file_name("inputs.source_file", "  ").is_err());
    }

    #[test]
    fn test_validate_unique_names() {
        let names = vec!["patient_id".to_string(), "age".to_string()];
        assert!(validate_unique_names("inputs.expected_columns", &names).is_ok());

        let dupes = vec!["age".to_string(), "age".to_string()];
        assert!(validate_unique_names("inputs.expected_columns", &dupes).is_err());
        assert!(validate_unique_names("inputs.expected_columns", &[]).is_err());
    }

    #[test]
    fn test_validate_delimiter() {
        assert_eq!(validate_delimiter("inputs.delimiter", ",").unwrap(), b',');
        assert_eq!(validate_delimiter("inputs.delimiter", "\t").unwrap(), b'\t');
        assert!(validate_delimiter("inputs.delimiter", ",,").is_err());
        assert!(validate_delimiter("inputs.delimiter", "\"").is_err());
    }

    #[test]
    fn test_validate_required_field() {
        let present = Some("value".to_string());
        let absent: Option<String> = None;
        assert!(validate_required_field("paths.raw_dir", &present).is_ok());
        match validate_required_field("paths.raw_dir", &absent) {
            Err(EtlError::MissingConfigError { field }) => assert_eq!(field, "paths.raw_dir"),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
