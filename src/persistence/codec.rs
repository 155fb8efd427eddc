//! Translation between [`Configuration`] and the host's string settings.
//!
//! The host stores every value as a string, with booleans as the literals
//! `"true"`/`"false"`. That encoding stops here: the rest of the crate only
//! sees typed values. Anything missing or unparseable decodes to its default.

use std::collections::HashMap;

use tracing::warn;

use crate::types::{Color, Configuration, DataType, DateFormat, DisplayOptions, SortOrder};

/// Setting keys shared with the rendering extension.
pub mod keys {
    pub const PARAMETER: &str = "selParam";
    pub const WORKSHEET: &str = "selWorksheet";
    pub const FIELD: &str = "selField";
    pub const BACKGROUND: &str = "bg";
    pub const TEXT: &str = "txt";
    pub const SORT: &str = "sort";
    pub const IGNORE_SELECTION: &str = "ignoreSelection";
    pub const USE_FORMATTED_VALUES: &str = "useFormattedValues";
    pub const INCLUDE_ALL_VALUE: &str = "includeAllValue";
    pub const DELIMITER: &str = "delimiter";
    pub const MULTISELECT: &str = "multiselect";
    pub const AUTO_UPDATE: &str = "autoUpdate";
    pub const DATA_TYPE: &str = "dataType";
    pub const DATE_FORMAT_INDEX: &str = "dateFormatIndex";
    /// Older dialogs read the index back under this name.
    pub const LEGACY_DATE_FORMAT: &str = "dateFormat";
    pub const CONFIGURED: &str = "configured";
}

fn flag(settings: &HashMap<String, String>, key: &str) -> bool {
    settings.get(key).is_some_and(|v| v == "true")
}

fn text<'a>(settings: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    settings
        .get(key)
        .map(String::as_str)
        .filter(|v| !v.is_empty())
}

fn encode_flag(value: bool) -> String {
    (if value { "true" } else { "false" }).to_string()
}

fn decode_color(settings: &HashMap<String, String>, key: &str, default: Color) -> Color {
    match text(settings, key) {
        Some(raw) => Color::parse(raw).unwrap_or_else(|| {
            warn!(key, value = raw, "ignoring malformed colour setting");
            default
        }),
        None => default,
    }
}

fn decode_date_format(settings: &HashMap<String, String>) -> DateFormat {
    let Some(raw) = text(settings, keys::DATE_FORMAT_INDEX)
        .or_else(|| text(settings, keys::LEGACY_DATE_FORMAT))
    else {
        return DateFormat::default();
    };
    raw.trim()
        .parse::<usize>()
        .ok()
        .and_then(DateFormat::from_index)
        .unwrap_or_else(|| {
            warn!(value = raw, "ignoring out-of-range date format index");
            DateFormat::default()
        })
}

fn decode_display(settings: &HashMap<String, String>) -> DisplayOptions {
    let defaults = DisplayOptions::default();

    let sort = match text(settings, keys::SORT) {
        Some(raw) => SortOrder::parse(raw).unwrap_or_else(|| {
            warn!(value = raw, "ignoring unknown sort order");
            defaults.sort
        }),
        None => defaults.sort,
    };

    let delimiter = match text(settings, keys::DELIMITER) {
        Some(raw) => {
            let mut chars = raw.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => c,
                _ => {
                    warn!(value = raw, "ignoring multi-character delimiter");
                    defaults.delimiter
                }
            }
        }
        None => defaults.delimiter,
    };

    DisplayOptions {
        background: decode_color(settings, keys::BACKGROUND, defaults.background),
        text: decode_color(settings, keys::TEXT, defaults.text),
        sort,
        ignore_selection: flag(settings, keys::IGNORE_SELECTION),
        use_formatted_values: flag(settings, keys::USE_FORMATTED_VALUES),
        include_all_value: flag(settings, keys::INCLUDE_ALL_VALUE),
        multiselect: flag(settings, keys::MULTISELECT),
        delimiter,
        auto_update: flag(settings, keys::AUTO_UPDATE),
        date_format: decode_date_format(settings),
    }
}

/// Decodes a finalized configuration from the host's settings.
///
/// Returns `None` unless the settings are marked `configured`. String-only
/// options are cleared when the persisted type is not `string`.
pub fn decode(settings: &HashMap<String, String>) -> Option<Configuration> {
    if !flag(settings, keys::CONFIGURED) {
        return None;
    }

    let data_type = text(settings, keys::DATA_TYPE).and_then(DataType::parse);
    let mut display = decode_display(settings);
    display.prune_string_options(data_type.as_ref());

    Some(Configuration {
        parameter: text(settings, keys::PARAMETER).map(str::to_string),
        worksheet: text(settings, keys::WORKSHEET).map(str::to_string),
        field: text(settings, keys::FIELD).map(str::to_string),
        data_type,
        display,
        configured: true,
    })
}

/// Encodes a configuration as key/value pairs for the host.
///
/// Typed options that do not apply to `data_type` are written as their
/// defaults.
pub fn encode(config: &Configuration) -> Vec<(String, String)> {
    let mut display = config.display.clone();
    display.prune_string_options(config.data_type.as_ref());
    display.prune_date_options(config.data_type.as_ref());

    let entries = [
        (keys::PARAMETER, config.parameter.clone().unwrap_or_default()),
        (keys::WORKSHEET, config.worksheet.clone().unwrap_or_default()),
        (keys::FIELD, config.field.clone().unwrap_or_default()),
        (keys::BACKGROUND, display.background.to_string()),
        (keys::TEXT, display.text.to_string()),
        (keys::SORT, display.sort.as_str().to_string()),
        (keys::IGNORE_SELECTION, encode_flag(display.ignore_selection)),
        (
            keys::USE_FORMATTED_VALUES,
            encode_flag(display.use_formatted_values),
        ),
        (keys::INCLUDE_ALL_VALUE, encode_flag(display.include_all_value)),
        (keys::DELIMITER, display.delimiter.to_string()),
        (keys::MULTISELECT, encode_flag(display.multiselect)),
        (keys::AUTO_UPDATE, encode_flag(display.auto_update)),
        (
            keys::DATA_TYPE,
            config
                .data_type
                .as_ref()
                .map(|t| t.to_string())
                .unwrap_or_default(),
        ),
        (
            keys::DATE_FORMAT_INDEX,
            display.date_format.index().to_string(),
        ),
        (keys::CONFIGURED, encode_flag(config.configured)),
    ];

    entries
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}
