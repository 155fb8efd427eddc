//! Effects-as-data for the configuration cascade.
//!
//! The cascade engine never talks to the workbook or the settings store
//! directly. Each operation returns the effects it needs, and a driver (the
//! [`ConfigurationFacade`](crate::facade::ConfigurationFacade)) executes them
//! through the interpreter traits and feeds results back. This keeps every
//! transition testable without I/O.

use serde::{Deserialize, Serialize};

use crate::types::{FieldInfo, ParameterInfo, Step};

pub mod interpreter;

pub use interpreter::{DialogCloser, OptionSource, SettingsStore, run_query};

/// A query against the live workbook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "query", rename_all = "snake_case")]
pub enum Query {
    /// Every parameter in the workbook.
    Parameters,
    /// Every worksheet on the dashboard.
    Worksheets,
    /// The columns of one worksheet's summary data.
    Fields { worksheet: String },
}

/// The answer to a [`Query`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "response", content = "items", rename_all = "snake_case")]
pub enum QueryResponse {
    Parameters(Vec<ParameterInfo>),
    Worksheets(Vec<String>),
    Fields(Vec<FieldInfo>),
}

/// A request to (re)derive the candidates of one step.
///
/// `generation` is the engine generation at the time of the request; a result
/// carrying any other generation is discarded on arrival.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveRequest {
    pub step: Step,
    pub generation: u64,
    pub query: Query,
}

/// An operation the engine needs performed on its behalf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect_type", rename_all = "snake_case")]
pub enum Effect {
    /// Run a query and hand the result back to the engine.
    Resolve(ResolveRequest),

    /// Write the given key/value pairs and wait for the store to acknowledge.
    Persist { entries: Vec<(String, String)> },

    /// Close the dialog. Only executed after a successful `Persist`.
    CloseDialog { worksheet: String },
}
