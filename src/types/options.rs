//! Data types and display options.
//!
//! Display options are cosmetic: they never affect which steps are valid.
//! Some of them are only meaningful for a particular parameter type, and those
//! are pruned whenever the type says they cannot apply.

use std::fmt;

use chrono::{Locale, NaiveDate};
use serde::{Deserialize, Serialize};

/// Declared type of a parameter or column (`"string"`, `"int"`, `"date"`, ...).
///
/// Values are compared verbatim; the workbook decides the vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataType(String);

impl DataType {
    pub const STRING: &'static str = "string";
    pub const DATE: &'static str = "date";

    /// Parses a persisted or reported type. Empty input has no type.
    pub fn parse(s: &str) -> Option<DataType> {
        let s = s.trim();
        if s.is_empty() {
            None
        } else {
            Some(DataType(s.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_string(&self) -> bool {
        self.0 == Self::STRING
    }

    pub fn is_date(&self) -> bool {
        self.0 == Self::DATE
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DataType {
    fn from(s: &str) -> Self {
        DataType(s.to_string())
    }
}

/// Sort order of the generated parameter list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    pub fn parse(s: &str) -> Option<SortOrder> {
        match s {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }
}

/// A `#rrggbb` colour.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(String);

impl Color {
    /// Parses `#rrggbb`, normalising hex digits to lowercase.
    pub fn parse(s: &str) -> Option<Color> {
        let hex = s.strip_prefix('#')?;
        if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
            Some(Color(format!("#{}", hex.to_ascii_lowercase())))
        } else {
            None
        }
    }

    pub fn white() -> Self {
        Color("#ffffff".to_string())
    }

    pub fn black() -> Self {
        Color("#000000".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Rendering presets for date parameters, persisted by index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateFormat {
    #[default]
    LocaleDefault,
    ShortNumeric,
    LongWithWeekday,
    Long,
    AbbreviatedMonth,
    MonthYear,
}

impl DateFormat {
    pub const ALL: [DateFormat; 6] = [
        DateFormat::LocaleDefault,
        DateFormat::ShortNumeric,
        DateFormat::LongWithWeekday,
        DateFormat::Long,
        DateFormat::AbbreviatedMonth,
        DateFormat::MonthYear,
    ];

    pub fn from_index(index: usize) -> Option<DateFormat> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        Self::ALL
            .iter()
            .position(|f| *f == self)
            .unwrap_or_default()
    }

    /// `strftime` pattern for this preset.
    ///
    /// `%x` is the locale's own numeric date.
    pub fn pattern(self) -> &'static str {
        match self {
            DateFormat::LocaleDefault => "%x",
            DateFormat::ShortNumeric => "%-m/%-d/%y",
            DateFormat::LongWithWeekday => "%A, %B %-d, %Y",
            DateFormat::Long => "%B %-d, %Y",
            DateFormat::AbbreviatedMonth => "%b %-d, %Y",
            DateFormat::MonthYear => "%B %Y",
        }
    }

    pub fn render(self, date: NaiveDate, locale: Locale) -> String {
        date.format_localized(self.pattern(), locale).to_string()
    }
}

/// Resolves a language tag such as `en`, `de-AT` or `fr_FR` to a date locale.
///
/// A bare language picks its home region (`en` is `en_US`).
pub fn date_locale(tag: &str) -> Option<Locale> {
    let tag = tag.trim().replace('-', "_");
    if let Ok(locale) = Locale::try_from(tag.as_str()) {
        return Some(locale);
    }

    let language = tag.split('_').next()?.to_ascii_lowercase();
    let region = match language.as_str() {
        "en" => "US".to_string(),
        other => other.to_ascii_uppercase(),
    };
    Locale::try_from(format!("{}_{}", language, region).as_str()).ok()
}

/// One sample per preset, in index order, for the date format selector.
pub fn date_format_samples(date: NaiveDate, locale: Locale) -> Vec<String> {
    DateFormat::ALL.iter().map(|f| f.render(date, locale)).collect()
}

/// Cosmetic and behavioural options stored alongside the cascade selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayOptions {
    pub background: Color,
    pub text: Color,
    pub sort: SortOrder,
    pub ignore_selection: bool,
    pub use_formatted_values: bool,
    /// String parameters only.
    pub include_all_value: bool,
    /// String parameters only.
    pub multiselect: bool,
    pub delimiter: char,
    pub auto_update: bool,
    /// Date parameters only.
    pub date_format: DateFormat,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        DisplayOptions {
            background: Color::white(),
            text: Color::black(),
            sort: SortOrder::Asc,
            ignore_selection: false,
            use_formatted_values: false,
            include_all_value: false,
            multiselect: false,
            delimiter: '|',
            auto_update: false,
            date_format: DateFormat::LocaleDefault,
        }
    }
}

impl DisplayOptions {
    /// Clears string-only options unless `data_type` is `string`.
    pub fn prune_string_options(&mut self, data_type: Option<&DataType>) {
        if !data_type.is_some_and(DataType::is_string) {
            self.include_all_value = false;
            self.multiselect = false;
        }
    }

    /// Resets the date format unless `data_type` is `date`.
    pub fn prune_date_options(&mut self, data_type: Option<&DataType>) {
        if !data_type.is_some_and(DataType::is_date) {
            self.date_format = DateFormat::default();
        }
    }
}

/// A single edit to [`DisplayOptions`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "option", content = "value", rename_all = "snake_case")]
pub enum DisplayOptionChange {
    Background(String),
    Text(String),
    Sort(SortOrder),
    IgnoreSelection(bool),
    UseFormattedValues(bool),
    IncludeAllValue(bool),
    Multiselect(bool),
    Delimiter(String),
    AutoUpdate(bool),
    DateFormatIndex(usize),
}
