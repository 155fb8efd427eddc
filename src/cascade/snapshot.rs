//! Read-only projection of the engine for rendering.

use serde::{Deserialize, Serialize};

use super::restore::DriftReason;
use crate::types::{DataType, DisplayOptions, Step};

/// How one step should be drawn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepView {
    pub step: Step,
    /// Selected value, or the sentinel in place of it.
    pub display_value: String,
    /// Options in source order, or a single sentinel.
    pub candidates: Vec<String>,
    pub locked: bool,
    pub enabled: bool,
    pub can_lock: bool,
    pub can_unlock: bool,
}

/// Everything the dialog needs to render, frozen at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeSnapshot {
    pub steps: [StepView; 3],
    pub data_type: Option<DataType>,
    pub configured: bool,
    pub display: DisplayOptions,
    /// Set when a saved configuration had to be reselected.
    pub drift: Option<DriftReason>,
    pub string_options_visible: bool,
    pub date_options_visible: bool,
    pub delimiter_editable: bool,
    /// Whether the OK button may be pressed.
    pub ok_enabled: bool,
    /// The step whose candidates are loading, if any.
    pub loading: Option<Step>,
}

impl CascadeSnapshot {
    pub fn step(&self, step: Step) -> &StepView {
        &self.steps[step.index()]
    }
}
