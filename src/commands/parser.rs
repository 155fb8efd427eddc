//! Parser for dialog commands.
//!
//! Pure: turns one input line into a [`Command`] without touching the
//! session.

use crate::persistence::codec::keys;
use crate::types::{DisplayOptionChange, SortOrder, Step};

use super::types::Command;

/// Parses one line of input.
///
/// # Parsing Rules
///
/// - Command words and step names are case-insensitive
/// - Whitespace between tokens is flexible (spaces, tabs)
/// - Trailing whitespace is kept, since it may be a delimiter value
/// - `set` takes the same keys the settings are stored under
/// - Returns `None` for blank lines and anything unrecognised
///
/// # Examples
///
/// ```
/// use param_cascade::commands::{parse_command, Command};
/// use param_cascade::types::Step;
///
/// assert_eq!(parse_command("lock parameter"), Some(Command::Lock(Step::Parameter)));
/// assert_eq!(
///     parse_command("select worksheet Sales by Region"),
///     Some(Command::Select { step: Step::Worksheet, value: "Sales by Region".into() })
/// );
/// assert_eq!(parse_command("dance"), None);
/// ```
pub fn parse_command(line: &str) -> Option<Command> {
    let (word, rest) = split_first_word(line.trim_start());

    match word.to_ascii_lowercase().as_str() {
        "show" => Some(Command::Show),
        "select" => {
            let (step, value) = split_first_word(rest.trim_start());
            let value = value.trim();
            if value.is_empty() {
                return None;
            }
            Some(Command::Select {
                step: parse_step(step)?,
                value: value.to_string(),
            })
        }
        "lock" => parse_step(rest.trim()).map(Command::Lock),
        "unlock" => parse_step(rest.trim()).map(Command::Unlock),
        "reset" => Some(Command::Reset),
        "set" => parse_option(rest.trim_start()).map(Command::Set),
        "dates" => Some(Command::Dates),
        "ok" | "finalize" => Some(Command::Finalize),
        "quit" | "cancel" => Some(Command::Quit),
        _ => None,
    }
}

fn parse_step(word: &str) -> Option<Step> {
    match word.to_ascii_lowercase().as_str() {
        "parameter" | "param" => Some(Step::Parameter),
        "worksheet" | "sheet" => Some(Step::Worksheet),
        "field" => Some(Step::Field),
        _ => None,
    }
}

fn parse_flag(word: &str) -> Option<bool> {
    match word.to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" => Some(true),
        "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

/// Parses `<key> <value>` into an option change.
///
/// The delimiter value is taken verbatim (after one separating space), so a
/// space can itself be chosen as the delimiter.
fn parse_option(text: &str) -> Option<DisplayOptionChange> {
    let (key, rest) = split_first_word(text);
    let value = rest.trim();

    let is = |k: &str| key.eq_ignore_ascii_case(k);

    if is(keys::BACKGROUND) {
        Some(DisplayOptionChange::Background(value.to_string()))
    } else if is(keys::TEXT) {
        Some(DisplayOptionChange::Text(value.to_string()))
    } else if is(keys::SORT) {
        SortOrder::parse(value).map(DisplayOptionChange::Sort)
    } else if is(keys::IGNORE_SELECTION) {
        parse_flag(value).map(DisplayOptionChange::IgnoreSelection)
    } else if is(keys::USE_FORMATTED_VALUES) {
        parse_flag(value).map(DisplayOptionChange::UseFormattedValues)
    } else if is(keys::INCLUDE_ALL_VALUE) {
        parse_flag(value).map(DisplayOptionChange::IncludeAllValue)
    } else if is(keys::MULTISELECT) {
        parse_flag(value).map(DisplayOptionChange::Multiselect)
    } else if is(keys::AUTO_UPDATE) {
        parse_flag(value).map(DisplayOptionChange::AutoUpdate)
    } else if is(keys::DELIMITER) {
        let raw = rest.strip_prefix(|c: char| c.is_ascii_whitespace())?;
        Some(DisplayOptionChange::Delimiter(raw.to_string()))
    } else if is(keys::DATE_FORMAT_INDEX) || is(keys::LEGACY_DATE_FORMAT) {
        value
            .parse::<usize>()
            .ok()
            .map(DisplayOptionChange::DateFormatIndex)
    } else {
        None
    }
}

/// Splits text at the first whitespace, returning (word, rest).
/// If no whitespace, returns (text, "").
fn split_first_word(text: &str) -> (&str, &str) {
    match text.find(|c: char| c.is_ascii_whitespace()) {
        Some(pos) => (&text[..pos], &text[pos..]),
        None => (text, ""),
    }
}
