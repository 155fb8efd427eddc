//! Candidate derivation.
//!
//! Pure functions turning a [`QueryResponse`] into the option list of a step.
//! Order is always source order.

use crate::effects::{Query, QueryResponse};
use crate::types::{DataType, FieldInfo, ParameterInfo, Step};

/// The query that resolves `step`, given the locked upstream values.
///
/// Returns `None` when a required upstream value is missing.
pub fn query_for(step: Step, worksheet: Option<&str>) -> Option<Query> {
    match step {
        Step::Parameter => Some(Query::Parameters),
        Step::Worksheet => Some(Query::Worksheets),
        Step::Field => worksheet.map(|w| Query::Fields {
            worksheet: w.to_string(),
        }),
    }
}

/// Names of parameters that accept all values.
pub fn parameter_options(parameters: &[ParameterInfo]) -> Vec<String> {
    parameters
        .iter()
        .filter(|p| p.accepts_all)
        .map(|p| p.name.clone())
        .collect()
}

/// Names of columns whose type equals the parameter's type.
pub fn field_options(columns: &[FieldInfo], data_type: Option<&DataType>) -> Vec<String> {
    let Some(data_type) = data_type else {
        return Vec::new();
    };
    columns
        .iter()
        .filter(|c| &c.data_type == data_type)
        .map(|c| c.field_name.clone())
        .collect()
}

/// Options for `step` from a response, or `None` if the response answers a
/// different query.
pub fn options_for(
    step: Step,
    response: &QueryResponse,
    data_type: Option<&DataType>,
) -> Option<Vec<String>> {
    match (step, response) {
        (Step::Parameter, QueryResponse::Parameters(params)) => Some(parameter_options(params)),
        (Step::Worksheet, QueryResponse::Worksheets(sheets)) => Some(sheets.clone()),
        (Step::Field, QueryResponse::Fields(columns)) => Some(field_options(columns, data_type)),
        _ => None,
    }
}
