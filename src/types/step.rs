//! Cascade steps and the per-step state they carry.
//!
//! The three steps are strictly ordered: a worksheet can only be chosen once a
//! parameter is locked, and a field only once the worksheet is locked. Each
//! step owns a [`StepState`] whose candidate list is re-derived from the live
//! workbook whenever an upstream step changes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Placeholder shown while a step's candidates are being fetched.
pub const LOADING: &str = "Loading...";

/// Shown when the workbook has no parameter that accepts all values.
pub const NO_PARAMETERS_FOUND: &str = "No open input parameters found!";

/// Shown when the dashboard has no worksheets.
pub const NO_WORKSHEETS_FOUND: &str = "No worksheets found!";

/// Shown when the locked worksheet has no column of the parameter's type.
pub const NO_FIELDS_FOUND: &str = "No fields found that match parameter!";

/// One of the three ordered cascade stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Parameter,
    Worksheet,
    Field,
}

impl Step {
    /// All steps, upstream first.
    pub const ALL: [Step; 3] = [Step::Parameter, Step::Worksheet, Step::Field];

    /// Position of this step in the cascade (0-based).
    pub fn index(self) -> usize {
        match self {
            Step::Parameter => 0,
            Step::Worksheet => 1,
            Step::Field => 2,
        }
    }

    /// The step resolved after this one is locked.
    pub fn next(self) -> Option<Step> {
        match self {
            Step::Parameter => Some(Step::Worksheet),
            Step::Worksheet => Some(Step::Field),
            Step::Field => None,
        }
    }

    /// Steps that must be locked before this one may be enabled.
    pub fn upstream(self) -> impl Iterator<Item = Step> {
        Step::ALL.into_iter().filter(move |s| *s < self)
    }

    /// Steps invalidated when this one is unlocked.
    pub fn downstream(self) -> impl Iterator<Item = Step> {
        Step::ALL.into_iter().filter(move |s| *s > self)
    }

    /// The sentinel shown when this step resolves to no candidates.
    pub fn empty_sentinel(self) -> &'static str {
        match self {
            Step::Parameter => NO_PARAMETERS_FOUND,
            Step::Worksheet => NO_WORKSHEETS_FOUND,
            Step::Field => NO_FIELDS_FOUND,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Step::Parameter => "parameter",
            Step::Worksheet => "worksheet",
            Step::Field => "field",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returns true if `value` is one of the reserved placeholder strings.
///
/// Workbook objects could in principle carry these names; the engine never
/// compares selections against sentinels by string, only through
/// [`CandidateList`], so this is used for input validation at the boundary.
pub fn is_sentinel(value: &str) -> bool {
    matches!(
        value,
        LOADING | NO_PARAMETERS_FOUND | NO_WORKSHEETS_FOUND | NO_FIELDS_FOUND
    )
}

/// The candidate options of a step.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "status", content = "options", rename_all = "snake_case")]
pub enum CandidateList {
    /// Never resolved, or cleared by an upstream unlock.
    #[default]
    Unresolved,

    /// A resolution is in flight.
    Loading,

    /// Live options in source order. Never empty.
    Resolved(Vec<String>),

    /// The resolution returned nothing usable.
    NoneFound,
}

impl CandidateList {
    /// Builds a list from resolved options, collapsing an empty set to
    /// [`CandidateList::NoneFound`].
    pub fn from_options(options: Vec<String>) -> Self {
        if options.is_empty() {
            CandidateList::NoneFound
        } else {
            CandidateList::Resolved(options)
        }
    }

    /// Returns true if `value` is a real (non-sentinel) option.
    pub fn contains(&self, value: &str) -> bool {
        match self {
            CandidateList::Resolved(options) => options.iter().any(|o| o == value),
            _ => false,
        }
    }

    pub fn first(&self) -> Option<&str> {
        match self {
            CandidateList::Resolved(options) => options.first().map(String::as_str),
            _ => None,
        }
    }

    /// The list as the UI renders it, with sentinels expanded.
    pub fn display(&self, step: Step) -> Vec<String> {
        match self {
            CandidateList::Unresolved => Vec::new(),
            CandidateList::Loading => vec![LOADING.to_string()],
            CandidateList::Resolved(options) => options.clone(),
            CandidateList::NoneFound => vec![step.empty_sentinel().to_string()],
        }
    }
}

/// State of a single cascade step.
///
/// Fields are only mutated by the cascade engine; everything else reads them
/// through the accessors or a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StepState {
    pub(crate) selected: Option<String>,
    pub(crate) candidates: CandidateList,
    pub(crate) locked: bool,
    pub(crate) enabled: bool,
}

impl StepState {
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn candidates(&self) -> &CandidateList {
        &self.candidates
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns true for `{Empty, [], unlocked, disabled}`.
    pub fn is_cleared(&self) -> bool {
        *self == StepState::default()
    }

    /// The value shown in the step's selector.
    pub fn display_value(&self, step: Step) -> String {
        match (&self.candidates, &self.selected) {
            (CandidateList::Loading, _) => LOADING.to_string(),
            (CandidateList::NoneFound, _) => step.empty_sentinel().to_string(),
            (_, Some(value)) => value.clone(),
            (_, None) => String::new(),
        }
    }

    /// Whether the lock action is currently available.
    pub fn can_lock(&self) -> bool {
        self.enabled
            && !self.locked
            && self
                .selected
                .as_deref()
                .is_some_and(|v| self.candidates.contains(v))
    }

    pub(crate) fn clear(&mut self) {
        *self = StepState::default();
    }

    pub(crate) fn begin_loading(&mut self) {
        self.selected = None;
        self.candidates = CandidateList::Loading;
        self.locked = false;
        self.enabled = false;
    }

    /// Fills the step with freshly resolved options and selects the first.
    pub(crate) fn populate(&mut self, options: Vec<String>) {
        self.candidates = CandidateList::from_options(options);
        self.selected = self.candidates.first().map(str::to_string);
        self.enabled = matches!(self.candidates, CandidateList::Resolved(_));
        self.locked = false;
    }

    /// Locks a restored value that has just been validated against `options`.
    pub(crate) fn lock_restored(&mut self, value: String, options: Vec<String>) {
        self.candidates = CandidateList::from_options(options);
        self.selected = Some(value);
        self.locked = true;
        self.enabled = false;
    }
}
