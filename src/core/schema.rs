use crate::domain::model::{Dataset, ValidationOutcome};
use crate::utils::error::{EtlError, Result};

/// Presence-only header check. Extra columns pass through; every missing
/// column is reported, in expected order.
pub fn validate_columns(dataset: &Dataset, expected: &[String]) -> Result<ValidationOutcome> {
    let outcome = ValidationOutcome {
        missing: expected
            .iter()
            .filter(|column| !dataset.has_column(column))
            .cloned()
            .collect(),
        extra: dataset
            .columns
            .iter()
            .filter(|column| !expected.contains(column))
            .cloned()
            .collect(),
    };

    if !outcome.passed() {
        return Err(EtlError::ValidationError {
            missing: outcome.missing,
            found: dataset.columns.clone(),
        });
    }

    if !outcome.extra.is_empty() {
        tracing::info!(
            "Passing through {} unexpected column(s): {}",
            outcome.extra.len(),
            outcome.extra.join(", ")
        );
    }

    Ok(outcome)
}
