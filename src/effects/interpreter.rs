//! Collaborator traits.
//!
//! These traits define how effects are executed:
//! - [`OptionSource`] answers workbook queries
//! - [`SettingsStore`] holds the persisted key/value settings
//! - [`DialogCloser`] closes the configuration dialog once settings are durable
//!
//! The trait-based design enables in-memory doubles for testing (see
//! `test_utils`) and the JSON-backed implementations used by the binary.
//!
//! # Example (mock for testing)
//!
//! ```ignore
//! struct FixedWorkbook {
//!     worksheets: Vec<String>,
//! }
//!
//! impl OptionSource for FixedWorkbook {
//!     type Error = String;
//!
//!     async fn list_parameters(&self) -> Result<Vec<ParameterInfo>, Self::Error> {
//!         Ok(vec![])
//!     }
//!
//!     async fn list_worksheets(&self) -> Result<Vec<String>, Self::Error> {
//!         Ok(self.worksheets.clone())
//!     }
//!
//!     async fn list_fields(&self, _worksheet: &str) -> Result<Vec<FieldInfo>, Self::Error> {
//!         Err("no summary data".to_string())
//!     }
//! }
//! ```

use std::collections::HashMap;
use std::fmt;
use std::future::Future;

use super::{Query, QueryResponse};
use crate::types::{FieldInfo, ParameterInfo};

/// Answers queries about the live workbook.
pub trait OptionSource {
    /// The error type returned by this source.
    type Error: fmt::Display;

    /// All parameters, in workbook order.
    fn list_parameters(
        &self,
    ) -> impl Future<Output = Result<Vec<ParameterInfo>, Self::Error>> + Send;

    /// All worksheet names, in dashboard order.
    fn list_worksheets(&self) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send;

    /// The columns of `worksheet`'s summary data, in column order.
    fn list_fields(
        &self,
        worksheet: &str,
    ) -> impl Future<Output = Result<Vec<FieldInfo>, Self::Error>> + Send;
}

/// Key/value settings persisted with the dashboard.
///
/// Reads and writes are local; only `save` waits for the host to make the
/// values durable.
pub trait SettingsStore {
    /// The error type returned when a save is not acknowledged.
    type Error: fmt::Display;

    /// A copy of every stored setting.
    fn get_all(&self) -> HashMap<String, String>;

    /// Stages a value. Not durable until `save` succeeds.
    fn set(&mut self, key: &str, value: String);

    /// Makes staged values durable.
    fn save(&mut self) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// Closes the configuration dialog, handing a payload back to the host.
pub trait DialogCloser {
    /// The error type returned by this closer.
    type Error: fmt::Display;

    fn close(&self, payload: &str) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// Executes a [`Query`] against `source`, flattening the error to a message.
pub async fn run_query<S: OptionSource>(source: &S, query: &Query) -> Result<QueryResponse, String> {
    match query {
        Query::Parameters => source
            .list_parameters()
            .await
            .map(QueryResponse::Parameters)
            .map_err(|e| e.to_string()),
        Query::Worksheets => source
            .list_worksheets()
            .await
            .map(QueryResponse::Worksheets)
            .map_err(|e| e.to_string()),
        Query::Fields { worksheet } => source
            .list_fields(worksheet)
            .await
            .map(QueryResponse::Fields)
            .map_err(|e| e.to_string()),
    }
}
