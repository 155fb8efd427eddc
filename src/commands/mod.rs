//! Line-oriented commands for driving a configuration session.
//!
//! # Supported Commands
//!
//! - `show` - Prints the current snapshot
//! - `select <step> <value>` - Changes a step's pending selection
//! - `lock <step>` / `unlock <step>` - Commits or reopens a step
//! - `reset` - Clears every step and option
//! - `set <key> <value>` - Edits a display option, keyed like the settings
//! - `dates` - Lists the date format presets
//! - `ok` - Saves and closes
//! - `quit` - Leaves without saving
//!
//! # Example
//!
//! ```
//! use param_cascade::commands::{parse_command, Command};
//! use param_cascade::types::{DisplayOptionChange, Step};
//!
//! assert_eq!(parse_command("unlock worksheet"), Some(Command::Unlock(Step::Worksheet)));
//! assert_eq!(
//!     parse_command("set includeAllValue true"),
//!     Some(Command::Set(DisplayOptionChange::IncludeAllValue(true)))
//! );
//! ```

mod parser;
mod types;

pub use parser::parse_command;
pub use types::Command;
