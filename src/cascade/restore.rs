//! Revalidation of a restored configuration against the live workbook.
//!
//! A persisted configuration is only trusted one level at a time: the
//! parameter must still exist and accept all values before the worksheet is
//! looked at, and the worksheet must still exist before its columns are
//! fetched. Failure at any level is drift, which the engine recovers from by
//! falling back to ordinary selection at that level.
//!
//! # Key Principles
//!
//! - **One level per resolution**: each check runs against the response that
//!   resolved that step. A deeper level is never checked after a failure.
//!
//! - **Live types win**: the data type comes from the live parameter, not the
//!   persisted `dataType`, so a parameter whose type changed is caught at the
//!   field level.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{Configuration, DataType, FieldInfo, ParameterInfo, Step};

/// The persisted selections still awaiting revalidation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreTarget {
    pub parameter: Option<String>,
    pub worksheet: Option<String>,
    pub field: Option<String>,
}

impl RestoreTarget {
    /// Builds a target from a configuration, or `None` if it was never
    /// finalized.
    pub fn from_configuration(config: &Configuration) -> Option<RestoreTarget> {
        config.configured.then(|| RestoreTarget {
            parameter: config.parameter.clone(),
            worksheet: config.worksheet.clone(),
            field: config.field.clone(),
        })
    }
}

/// Why a restored configuration no longer matches the workbook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DriftReason {
    /// The persisted settings had no value for this step.
    MissingValue { step: Step },

    /// The query for this step failed, so nothing could be confirmed.
    SourceUnavailable { step: Step, message: String },

    /// No parameter with the persisted name exists.
    ParameterMissing { name: String },

    /// The parameter exists but now restricts its allowable values.
    ParameterRestricted { name: String },

    /// No worksheet with the persisted name exists.
    WorksheetMissing { name: String },

    /// The worksheet has no column with the persisted name.
    FieldMissing { worksheet: String, name: String },

    /// The column exists but its type no longer matches the parameter.
    FieldTypeMismatch {
        name: String,
        expected: DataType,
        actual: DataType,
    },
}

impl DriftReason {
    /// The step at which the cascade stopped trusting the persisted values.
    pub fn step(&self) -> Step {
        match self {
            DriftReason::MissingValue { step } | DriftReason::SourceUnavailable { step, .. } => {
                *step
            }
            DriftReason::ParameterMissing { .. } | DriftReason::ParameterRestricted { .. } => {
                Step::Parameter
            }
            DriftReason::WorksheetMissing { .. } => Step::Worksheet,
            DriftReason::FieldMissing { .. } | DriftReason::FieldTypeMismatch { .. } => {
                Step::Field
            }
        }
    }
}

impl fmt::Display for DriftReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriftReason::MissingValue { step } => write!(f, "no saved {}", step),
            DriftReason::SourceUnavailable { step, message } => {
                write!(f, "could not list {} options: {}", step, message)
            }
            DriftReason::ParameterMissing { name } => {
                write!(f, "parameter '{}' no longer exists", name)
            }
            DriftReason::ParameterRestricted { name } => {
                write!(f, "parameter '{}' no longer accepts all values", name)
            }
            DriftReason::WorksheetMissing { name } => {
                write!(f, "worksheet '{}' no longer exists", name)
            }
            DriftReason::FieldMissing { worksheet, name } => {
                write!(f, "field '{}' not found on worksheet '{}'", name, worksheet)
            }
            DriftReason::FieldTypeMismatch {
                name,
                expected,
                actual,
            } => write!(
                f,
                "field '{}' has type {} but the parameter is {}",
                name, actual, expected
            ),
        }
    }
}

/// Checks the persisted parameter against the live parameter list.
pub fn validate_parameter<'a>(
    target: Option<&str>,
    parameters: &'a [ParameterInfo],
) -> Result<&'a ParameterInfo, DriftReason> {
    let name = target.ok_or(DriftReason::MissingValue {
        step: Step::Parameter,
    })?;
    let param = parameters
        .iter()
        .find(|p| p.name == name)
        .ok_or_else(|| DriftReason::ParameterMissing {
            name: name.to_string(),
        })?;
    if !param.accepts_all {
        return Err(DriftReason::ParameterRestricted {
            name: name.to_string(),
        });
    }
    Ok(param)
}

/// Checks the persisted worksheet against the live worksheet list.
pub fn validate_worksheet<'a>(
    target: Option<&'a str>,
    worksheets: &[String],
) -> Result<&'a str, DriftReason> {
    let name = target.ok_or(DriftReason::MissingValue {
        step: Step::Worksheet,
    })?;
    if worksheets.iter().any(|w| w == name) {
        Ok(name)
    } else {
        Err(DriftReason::WorksheetMissing {
            name: name.to_string(),
        })
    }
}

/// Checks the persisted field against the worksheet's live columns.
pub fn validate_field<'a>(
    target: Option<&'a str>,
    worksheet: &str,
    columns: &[FieldInfo],
    data_type: Option<&DataType>,
) -> Result<&'a str, DriftReason> {
    let name = target.ok_or(DriftReason::MissingValue { step: Step::Field })?;
    let column = columns
        .iter()
        .find(|c| c.field_name == name)
        .ok_or_else(|| DriftReason::FieldMissing {
            worksheet: worksheet.to_string(),
            name: name.to_string(),
        })?;
    match data_type {
        Some(expected) if *expected == column.data_type => Ok(name),
        Some(expected) => Err(DriftReason::FieldTypeMismatch {
            name: name.to_string(),
            expected: expected.clone(),
            actual: column.data_type.clone(),
        }),
        None => Err(DriftReason::MissingValue {
            step: Step::Parameter,
        }),
    }
}
