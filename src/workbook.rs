//! An in-memory workbook that answers option queries.
//!
//! Loaded from a JSON description by the binary, and built directly in tests.
//!
//! # File Format
//!
//! ```text
//! {
//!   "parameters": [{ "name": "Region", "data_type": "string", "accepts_all": true }],
//!   "worksheets": [{ "name": "Sales", "columns": [{ "field_name": "Region", "data_type": "string" }] }]
//! }
//! ```

use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::effects::{OptionSource, Query, QueryResponse};
use crate::types::{FieldInfo, ParameterInfo};

/// Errors that can occur when loading or querying a workbook.
#[derive(Debug, Error)]
pub enum WorkbookError {
    /// IO error while reading the description.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The description is not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Summary data was requested for a worksheet that does not exist.
    #[error("worksheet '{0}' not found")]
    UnknownWorksheet(String),
}

/// A worksheet and the columns of its summary data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worksheet {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<FieldInfo>,
}

/// A static workbook.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workbook {
    #[serde(default)]
    pub parameters: Vec<ParameterInfo>,
    #[serde(default)]
    pub worksheets: Vec<Worksheet>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a workbook description from a JSON file.
    pub fn load(path: &Path) -> Result<Self, WorkbookError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn with_parameter(mut self, name: &str, data_type: &str, accepts_all: bool) -> Self {
        self.parameters
            .push(ParameterInfo::new(name, data_type, accepts_all));
        self
    }

    /// Adds a worksheet with `(field_name, data_type)` columns.
    pub fn with_worksheet(mut self, name: &str, columns: &[(&str, &str)]) -> Self {
        self.worksheets.push(Worksheet {
            name: name.to_string(),
            columns: columns
                .iter()
                .map(|(field, data_type)| FieldInfo::new(*field, *data_type))
                .collect(),
        });
        self
    }

    pub fn without_worksheet(mut self, name: &str) -> Self {
        self.worksheets.retain(|w| w.name != name);
        self
    }

    pub fn worksheet_names(&self) -> Vec<String> {
        self.worksheets.iter().map(|w| w.name.clone()).collect()
    }

    pub fn columns(&self, worksheet: &str) -> Result<Vec<FieldInfo>, WorkbookError> {
        self.worksheets
            .iter()
            .find(|w| w.name == worksheet)
            .map(|w| w.columns.clone())
            .ok_or_else(|| WorkbookError::UnknownWorksheet(worksheet.to_string()))
    }

    /// Answers a query synchronously.
    pub fn answer(&self, query: &Query) -> Result<QueryResponse, WorkbookError> {
        match query {
            Query::Parameters => Ok(QueryResponse::Parameters(self.parameters.clone())),
            Query::Worksheets => Ok(QueryResponse::Worksheets(self.worksheet_names())),
            Query::Fields { worksheet } => self.columns(worksheet).map(QueryResponse::Fields),
        }
    }
}

impl OptionSource for Workbook {
    type Error = WorkbookError;

    async fn list_parameters(&self) -> Result<Vec<ParameterInfo>, Self::Error> {
        Ok(self.parameters.clone())
    }

    async fn list_worksheets(&self) -> Result<Vec<String>, Self::Error> {
        Ok(self.worksheet_names())
    }

    async fn list_fields(&self, worksheet: &str) -> Result<Vec<FieldInfo>, Self::Error> {
        self.columns(worksheet)
    }
}
