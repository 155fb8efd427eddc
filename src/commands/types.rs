//! Commands accepted by the interactive dialog driver.

use serde::{Deserialize, Serialize};

use crate::types::{DisplayOptionChange, Step};

/// A parsed dialog command, one per input line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Prints the current snapshot: `show`
    Show,

    /// Changes a step's pending selection: `select <step> <value>`
    ///
    /// The value is the rest of the line, so names may contain spaces.
    Select { step: Step, value: String },

    /// Locks a step: `lock <step>`
    Lock(Step),

    /// Unlocks a step: `unlock <step>`
    Unlock(Step),

    /// Clears everything: `reset`
    Reset,

    /// Edits a display option: `set <key> <value>`, keyed like the settings.
    Set(DisplayOptionChange),

    /// Lists the date format presets for today: `dates`
    Dates,

    /// Saves and closes: `ok` or `finalize`
    Finalize,

    /// Leaves without saving: `quit` or `cancel`
    Quit,
}
