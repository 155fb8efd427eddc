//! The persisted configuration and the workbook shapes it is validated against.

use serde::{Deserialize, Serialize};

use super::options::{DataType, DisplayOptions};

/// The finalized selection plus its display options.
///
/// `configured` is only true when all three steps were locked and a data type
/// was derived from the parameter.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Configuration {
    pub parameter: Option<String>,
    pub worksheet: Option<String>,
    pub field: Option<String>,
    pub data_type: Option<DataType>,
    pub display: DisplayOptions,
    pub configured: bool,
}

/// A workbook parameter as reported by the option source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterInfo {
    pub name: String,
    pub data_type: DataType,
    /// Whether the parameter's allowable values are unrestricted.
    pub accepts_all: bool,
}

impl ParameterInfo {
    pub fn new(name: impl Into<String>, data_type: impl Into<DataType>, accepts_all: bool) -> Self {
        ParameterInfo {
            name: name.into(),
            data_type: data_type.into(),
            accepts_all,
        }
    }
}

/// A column of a worksheet's summary data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldInfo {
    pub field_name: String,
    pub data_type: DataType,
}

impl FieldInfo {
    pub fn new(field_name: impl Into<String>, data_type: impl Into<DataType>) -> Self {
        FieldInfo {
            field_name: field_name.into(),
            data_type: data_type.into(),
        }
    }
}
