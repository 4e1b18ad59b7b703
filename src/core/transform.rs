use crate::config::{CastType, Derivation, RowFilter, TransformConfig};
use crate::domain::model::{Dataset, Record};
use crate::utils::error::{EtlError, Result};
use serde_json::Value;
use std::collections::{HashMap, HashSet};

pub const MIGRATED_AT_COLUMN: &str = "migrated_at_utc";
pub const RUN_ID_COLUMN: &str = "run_id";

/// Per-run values stamped into audit columns.
#[derive(Debug, Clone)]
pub struct RunStamp {
    pub run_id: String,
    pub migrated_at: String,
}

#[derive(Debug, Clone)]
pub struct TransformOutput {
    pub dataset: Dataset,
    pub rows_filtered: usize,
}

/// Where each output column's value comes from.
enum ColumnSource<'a> {
    Source {
        column: &'a str,
        cast: Option<CastType>,
    },
    Derived(&'a Derivation),
    MigratedAt,
    RunId,
}

struct OutputColumn<'a> {
    name: String,
    source: ColumnSource<'a>,
}

/// Applies the configured rules to every row. Nothing is returned unless
/// every row converts; the first failing row aborts the whole transform.
pub fn apply_rules(
    input: &Dataset,
    rules: &TransformConfig,
    stamp: &RunStamp,
) -> Result<TransformOutput> {
    let plan = plan_columns(input, rules)?;

    let mut records = Vec::with_capacity(input.len());
    let mut rows_filtered = 0;

    for (index, record) in input.records.iter().enumerate() {
        let row = index + 1;

        if let Some(filter) = &rules.filter {
            if !passes_filter(record, filter) {
                rows_filtered += 1;
                continue;
            }
        }

        let mut data = HashMap::with_capacity(plan.len());
        for column in &plan {
            let value = match &column.source {
                ColumnSource::Source { column: name, cast } => {
                    let value = record.get(name).cloned().unwrap_or(Value::Null);
                    match cast {
                        Some(cast) => cast_value(&value, *cast)
                            .map_err(|message| EtlError::transform(*name, row, message))?,
                        None => value,
                    }
                }
                ColumnSource::Derived(derivation) => derive_value(derivation, record, row)?,
                ColumnSource::MigratedAt => Value::String(stamp.migrated_at.clone()),
                ColumnSource::RunId => Value::String(stamp.run_id.clone()),
            };
            data.insert(column.name.clone(), value);
        }
        records.push(Record { data });
    }

    if rows_filtered > 0 {
        tracing::info!("Row filter dropped {} of {} rows", rows_filtered, input.len());
    }

    let columns = plan.into_iter().map(|column| column.name).collect();
    Ok(TransformOutput {
        dataset: Dataset::new(columns, records),
        rows_filtered,
    })
}

fn plan_columns<'a>(
    input: &'a Dataset,
    rules: &'a TransformConfig,
) -> Result<Vec<OutputColumn<'a>>> {
    for (column, rule) in &rules.rules {
        match &rule.derive {
            Some(derivation) => {
                for source in derivation.sources() {
                    if !input.has_column(source) {
                        return Err(rule_error(
                            column,
                            source,
                            "derive source column is not in the source data",
                        ));
                    }
                }
            }
            None if !input.has_column(column) => {
                return Err(rule_error(column, column, "column is not in the source data"));
            }
            None => {}
        }
    }

    if let Some(filter) = &rules.filter {
        if !input.has_column(&filter.column) {
            return Err(EtlError::InvalidConfigValueError {
                field: "transform.filter.column".to_string(),
                value: filter.column.clone(),
                reason: "column is not in the source data".to_string(),
            });
        }
    }

    let mut plan: Vec<OutputColumn> = input
        .columns
        .iter()
        .map(|column| {
            let rule = rules.rules.get(column);
            OutputColumn {
                name: rule
                    .and_then(|r| r.rename.clone())
                    .unwrap_or_else(|| column.clone()),
                source: ColumnSource::Source {
                    column: column.as_str(),
                    cast: rule.and_then(|r| r.cast),
                },
            }
        })
        .collect();

    for (column, rule) in &rules.rules {
        if let Some(derivation) = &rule.derive {
            plan.push(OutputColumn {
                name: column.clone(),
                source: ColumnSource::Derived(derivation),
            });
        }
    }

    if rules.add_columns.migrated_at_utc {
        plan.push(OutputColumn {
            name: MIGRATED_AT_COLUMN.to_string(),
            source: ColumnSource::MigratedAt,
        });
    }
    if rules.add_columns.run_id {
        plan.push(OutputColumn {
            name: RUN_ID_COLUMN.to_string(),
            source: ColumnSource::RunId,
        });
    }

    let mut seen = HashSet::new();
    for column in &plan {
        if !seen.insert(column.name.as_str()) {
            return Err(EtlError::InvalidConfigValueError {
                field: "transform.rules".to_string(),
                value: column.name.clone(),
                reason: "more than one output column would carry this name".to_string(),
            });
        }
    }

    Ok(plan)
}

fn rule_error(rule: &str, column: &str, reason: &str) -> EtlError {
    EtlError::InvalidConfigValueError {
        field: format!("transform.rules.{}", rule),
        value: column.to_string(),
        reason: reason.to_string(),
    }
}

fn text_of(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

// Non-numeric values never pass.
fn passes_filter(record: &Record, filter: &RowFilter) -> bool {
    parse_number(&record.text(&filter.column))
        .map(|value| value >= filter.min)
        .unwrap_or(false)
}

pub fn cast_value(value: &Value, cast: CastType) -> std::result::Result<Value, String> {
    let raw = text_of(value);
    let text = raw.trim();

    if text.is_empty() && cast != CastType::String {
        return Err(format!("empty value cannot be cast to {}", cast.as_str()));
    }

    match cast {
        CastType::String => Ok(Value::String(raw)),
        CastType::Integer => text
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| format!("cannot cast {:?} to integer", raw)),
        CastType::Float => parse_number(text)
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| format!("cannot cast {:?} to float", raw)),
        CastType::Boolean => match text.to_ascii_lowercase().as_str() {
            "true" | "yes" | "y" | "1" => Ok(Value::Bool(true)),
            "false" | "no" | "n" | "0" => Ok(Value::Bool(false)),
            _ => Err(format!("cannot cast {:?} to boolean", raw)),
        },
    }
}

fn derive_value(derivation: &Derivation, record: &Record, row: usize) -> Result<Value> {
    let value = match derivation {
        Derivation::Copy { from } => record.get(from).cloned().unwrap_or(Value::Null),
        Derivation::Constant { value } => Value::String(value.clone()),
        Derivation::Concat { from, separator } => Value::String(
            from.iter()
                .map(|column| record.text(column))
                .collect::<Vec<_>>()
                .join(separator),
        ),
        Derivation::Uppercase { from } => Value::String(record.text(from).to_uppercase()),
        Derivation::Lowercase { from } => Value::String(record.text(from).to_lowercase()),
        Derivation::Trim { from } => Value::String(record.text(from).trim().to_string()),
        Derivation::Scale { from, factor } => scale(&record.text(from), *factor)
            .ok_or_else(|| {
                EtlError::transform(
                    from.as_str(),
                    row,
                    format!("cannot scale {:?} by {}", record.text(from), factor),
                )
            })?,
    };
    Ok(value)
}

// Integers scaled by a whole factor stay integers.
fn scale(text: &str, factor: f64) -> Option<Value> {
    let text = text.trim();
    if factor.fract() == 0.0 && factor.abs() < i64::MAX as f64 {
        if let Ok(int) = text.parse::<i64>() {
            return int.checked_mul(factor as i64).map(Value::from);
        }
    }
    parse_number(text)
        .map(|n| n * factor)
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
}
