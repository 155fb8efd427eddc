//! Core domain types for the configuration cascade.
//!
//! This module contains the step model, the persisted configuration and the
//! workbook shapes the cascade is resolved against.

pub mod configuration;
pub mod options;
pub mod step;

// Re-export commonly used types at the module level
pub use configuration::{Configuration, FieldInfo, ParameterInfo};
pub use options::{
    Color, DataType, DateFormat, DisplayOptionChange, DisplayOptions, SortOrder,
    date_format_samples, date_locale,
};
pub use step::{
    CandidateList, LOADING, NO_FIELDS_FOUND, NO_PARAMETERS_FOUND, NO_WORKSHEETS_FOUND, Step,
    StepState, is_sentinel,
};
