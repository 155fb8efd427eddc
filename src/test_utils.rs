//! Shared test doubles and arbitrary generators for property-based testing.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use proptest::prelude::*;

use crate::effects::{DialogCloser, OptionSource, SettingsStore};
use crate::types::{FieldInfo, ParameterInfo, Step};
use crate::workbook::Workbook;

/// Five parameters (one restricted) and two worksheets of mixed column types.
pub fn scenario_workbook() -> Workbook {
    Workbook::new()
        .with_parameter("P1", "string", true)
        .with_parameter("P2", "string", true)
        .with_parameter("Fixed", "string", false)
        .with_parameter("Count", "int", true)
        .with_parameter("When", "date", true)
        .with_worksheet("Sheet1", &[("F1", "string"), ("Sales", "float"), ("N", "int")])
        .with_worksheet("Sheet2", &[("F2", "string"), ("Day", "date")])
}

/// In-memory settings that distinguish staged values from durable ones.
#[derive(Debug, Clone, Default)]
pub struct MemorySettings {
    staged: HashMap<String, String>,
    durable: HashMap<String, String>,
    failures_remaining: u32,
    pub save_attempts: u32,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Settings that were already saved by an earlier session.
    pub fn with_entries(entries: Vec<(String, String)>) -> Self {
        let values: HashMap<_, _> = entries.into_iter().collect();
        MemorySettings {
            staged: values.clone(),
            durable: values,
            ..Self::default()
        }
    }

    /// Makes the next `times` saves fail.
    pub fn failing(mut self, times: u32) -> Self {
        self.failures_remaining = times;
        self
    }

    pub fn durable(&self) -> &HashMap<String, String> {
        &self.durable
    }
}

impl SettingsStore for MemorySettings {
    type Error = String;

    fn get_all(&self) -> HashMap<String, String> {
        self.staged.clone()
    }

    fn set(&mut self, key: &str, value: String) {
        self.staged.insert(key.to_string(), value);
    }

    async fn save(&mut self) -> Result<(), String> {
        self.save_attempts += 1;
        if self.failures_remaining > 0 {
            self.failures_remaining -= 1;
            return Err("host did not acknowledge the save".to_string());
        }
        self.durable = self.staged.clone();
        Ok(())
    }
}

/// Records every close request. Clones share the record.
#[derive(Debug, Clone, Default)]
pub struct RecordingCloser {
    closed: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

impl RecordingCloser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        RecordingCloser {
            fail: true,
            ..Self::default()
        }
    }

    pub fn closed(&self) -> Vec<String> {
        self.closed.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl DialogCloser for RecordingCloser {
    type Error = String;

    async fn close(&self, payload: &str) -> Result<(), String> {
        if self.fail {
            return Err("dialog already gone".to_string());
        }
        if let Ok(mut closed) = self.closed.lock() {
            closed.push(payload.to_string());
        }
        Ok(())
    }
}

/// A source whose every query fails.
#[derive(Debug, Clone, Default)]
pub struct FailingSource;

impl OptionSource for FailingSource {
    type Error = String;

    async fn list_parameters(&self) -> Result<Vec<ParameterInfo>, String> {
        Err("workbook unavailable".to_string())
    }

    async fn list_worksheets(&self) -> Result<Vec<String>, String> {
        Err("workbook unavailable".to_string())
    }

    async fn list_fields(&self, _worksheet: &str) -> Result<Vec<FieldInfo>, String> {
        Err("workbook unavailable".to_string())
    }
}

/// A workbook that answers field queries only after `delay`.
#[derive(Debug, Clone)]
pub struct SlowFields {
    pub workbook: Workbook,
    pub delay: Duration,
}

impl OptionSource for SlowFields {
    type Error = String;

    async fn list_parameters(&self) -> Result<Vec<ParameterInfo>, String> {
        Ok(self.workbook.parameters.clone())
    }

    async fn list_worksheets(&self) -> Result<Vec<String>, String> {
        Ok(self.workbook.worksheet_names())
    }

    async fn list_fields(&self, worksheet: &str) -> Result<Vec<FieldInfo>, String> {
        tokio::time::sleep(self.delay).await;
        self.workbook.columns(worksheet).map_err(|e| e.to_string())
    }
}

pub fn arb_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        Just(Step::Parameter),
        Just(Step::Worksheet),
        Just(Step::Field)
    ]
}

pub fn arb_data_type() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("string".to_string()),
        Just("int".to_string()),
        Just("float".to_string()),
        Just("date".to_string()),
        Just("bool".to_string()),
    ]
}

/// Arbitrary persisted settings: known keys with plausible or garbage values.
pub fn arb_settings() -> impl Strategy<Value = HashMap<String, String>> {
    let value = prop_oneof![
        Just("true".to_string()),
        Just("false".to_string()),
        Just(String::new()),
        "[0-9]{1,2}",
        "#[0-9a-fA-F]{6}",
        "[a-zA-Z|,;]{1,3}",
    ];
    let key = prop::sample::select(vec![
        "selParam",
        "selWorksheet",
        "selField",
        "bg",
        "txt",
        "sort",
        "ignoreSelection",
        "useFormattedValues",
        "includeAllValue",
        "delimiter",
        "multiselect",
        "autoUpdate",
        "dateFormatIndex",
        "dateFormat",
        "unrelated",
    ]);
    (
        prop::collection::hash_map(key.prop_map(str::to_string), value, 0..15),
        arb_data_type(),
    )
        .prop_map(|(mut settings, data_type)| {
            settings.insert("configured".to_string(), "true".to_string());
            settings.insert("dataType".to_string(), data_type);
            settings
        })
}
