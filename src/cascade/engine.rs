//! Cascade engine for the parameter → worksheet → field selection.
//!
//! The `CascadeEngine` owns the whole selection aggregate and is the only
//! place it is mutated. Operations validate their preconditions, update state
//! and return effects to be executed by a driver. Query results come back
//! through [`CascadeEngine::apply_resolution`], tagged with the generation
//! they were requested under.

use thiserror::Error;
use tracing::{debug, info, warn};

use super::resolve::{options_for, query_for};
use super::restore::{
    DriftReason, RestoreTarget, validate_field, validate_parameter, validate_worksheet,
};
use super::snapshot::{CascadeSnapshot, StepView};
use crate::effects::{Effect, QueryResponse, ResolveRequest};
use crate::persistence::codec;
use crate::types::{
    Color, Configuration, DataType, DateFormat, DisplayOptionChange, DisplayOptions,
    ParameterInfo, Step, StepState, is_sentinel,
};

/// Errors that can occur in cascade operations.
///
/// All of these are contract violations by the caller; the UI is expected to
/// prevent them by honouring `enabled`/`can_lock`/`loading` in the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CascadeError {
    /// The operation's preconditions do not hold for this step.
    #[error("invalid transition on {step}: {reason}")]
    InvalidTransition { step: Step, reason: String },

    /// A resolution is in flight; structural changes must wait for it.
    #[error("{step} candidates are still loading")]
    ResolutionInFlight { step: Step },

    /// A display option cannot be changed in the current state.
    #[error("invalid option change: {0}")]
    InvalidOption(String),

    /// Finalize was called before all three steps were locked.
    #[error("configuration is not complete")]
    NotConfigured,
}

impl CascadeError {
    fn invalid(step: Step, reason: impl Into<String>) -> Self {
        CascadeError::InvalidTransition {
            step,
            reason: reason.into(),
        }
    }
}

/// Result type for cascade operations.
pub type Result<T> = std::result::Result<T, CascadeError>;

/// The result of a query, handed back to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub step: Step,
    pub generation: u64,
    pub outcome: std::result::Result<QueryResponse, String>,
}

impl Resolution {
    /// Pairs a request with its outcome.
    pub fn for_request(
        request: &ResolveRequest,
        outcome: std::result::Result<QueryResponse, String>,
    ) -> Self {
        Resolution {
            step: request.step,
            generation: request.generation,
            outcome,
        }
    }
}

/// What happened to a resolution handed to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionOutcome {
    /// The step was populated (or drift was handled) and these effects follow.
    Applied(Vec<Effect>),

    /// The resolution was superseded and ignored.
    Discarded,
}

impl ResolutionOutcome {
    pub fn into_effects(self) -> Vec<Effect> {
        match self {
            ResolutionOutcome::Applied(effects) => effects,
            ResolutionOutcome::Discarded => Vec::new(),
        }
    }
}

/// The selection aggregate and its transition rules.
///
/// Invariants maintained after every public call:
/// - a step is only enabled while every upstream step is locked
/// - a locked step's selection is one of its candidates
/// - `configured` implies all three steps are locked and a data type is known
/// - at most one resolution is pending, for the current `generation`
#[derive(Debug, Clone, Default)]
pub struct CascadeEngine {
    steps: [StepState; 3],

    /// Live parameters from the last parameter resolution.
    parameters: Vec<ParameterInfo>,

    data_type: Option<DataType>,
    display: DisplayOptions,
    configured: bool,

    /// Bumped by every request; stale resolutions carry an older value.
    generation: u64,
    pending: Option<Step>,

    /// Persisted selections still being revalidated.
    restore: Option<RestoreTarget>,

    /// Why the last restore fell back to manual selection, if it did.
    drift: Option<DriftReason>,
}

impl CascadeEngine {
    /// Creates an empty engine. Nothing is resolved until `begin` or `reset`.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self, step: Step) -> &StepState {
        &self.steps[step.index()]
    }

    pub fn data_type(&self) -> Option<&DataType> {
        self.data_type.as_ref()
    }

    pub fn display(&self) -> &DisplayOptions {
        &self.display
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The step whose resolution is in flight, if any.
    pub fn pending(&self) -> Option<Step> {
        self.pending
    }

    pub fn drift(&self) -> Option<&DriftReason> {
        self.drift.as_ref()
    }

    /// Returns true while a persisted configuration is being revalidated.
    pub fn is_restoring(&self) -> bool {
        self.restore.is_some()
    }

    fn state_mut(&mut self, step: Step) -> &mut StepState {
        &mut self.steps[step.index()]
    }

    fn locked_value(&self, step: Step) -> Option<&str> {
        let state = self.step(step);
        if state.locked { state.selected() } else { None }
    }

    /// Starts a session, optionally revalidating a persisted configuration.
    ///
    /// Display options are taken from `restored` regardless of whether its
    /// selections survive revalidation.
    pub fn begin(&mut self, restored: Option<Configuration>) -> Vec<Effect> {
        self.clear_all();

        if let Some(config) = restored {
            let mut display = config.display.clone();
            display.prune_string_options(config.data_type.as_ref());
            self.display = display;
            self.restore = RestoreTarget::from_configuration(&config);
            if self.restore.is_some() {
                info!(
                    parameter = ?config.parameter,
                    worksheet = ?config.worksheet,
                    field = ?config.field,
                    "revalidating saved configuration"
                );
            }
        }

        self.request(Step::Parameter).into_iter().collect()
    }

    /// Changes the pending selection of an enabled step.
    pub fn select(&mut self, step: Step, value: &str) -> Result<()> {
        let state = self.step(step);
        if !state.enabled {
            return Err(CascadeError::invalid(step, "step is disabled"));
        }
        if is_sentinel(value) || !state.candidates.contains(value) {
            return Err(CascadeError::invalid(
                step,
                format!("'{}' is not a candidate", value),
            ));
        }

        self.state_mut(step).selected = Some(value.to_string());
        Ok(())
    }

    /// Commits a step's selection and resolves the next step.
    ///
    /// Locking an already locked step is a no-op.
    pub fn lock(&mut self, step: Step) -> Result<Vec<Effect>> {
        self.ensure_settled()?;

        let state = self.step(step);
        if state.locked {
            return Ok(Vec::new());
        }
        if !state.enabled {
            return Err(CascadeError::invalid(step, "step is not enabled"));
        }
        let value = match state.selected() {
            Some(v) if state.candidates.contains(v) => v.to_string(),
            Some(v) => {
                return Err(CascadeError::invalid(
                    step,
                    format!("'{}' is not a candidate", v),
                ));
            }
            None => return Err(CascadeError::invalid(step, "nothing selected")),
        };

        if step == Step::Parameter {
            let data_type = self
                .parameters
                .iter()
                .find(|p| p.name == value)
                .map(|p| p.data_type.clone())
                .ok_or_else(|| CascadeError::invalid(step, "parameter type unknown"))?;
            self.set_data_type(Some(data_type));
        }

        let state = self.state_mut(step);
        state.locked = true;
        state.enabled = false;
        debug!(%step, value = %value, "step locked");

        if step == Step::Field {
            self.configured = self.data_type.is_some();
        }

        Ok(step
            .next()
            .and_then(|next| self.request(next))
            .into_iter()
            .collect())
    }

    /// Reopens a step, clearing every step after it.
    ///
    /// Unlocking a step that is not locked is a no-op.
    pub fn unlock(&mut self, step: Step) -> Result<Vec<Effect>> {
        self.ensure_settled()?;

        if !self.step(step).locked {
            return Ok(Vec::new());
        }

        for downstream in step.downstream() {
            self.state_mut(downstream).clear();
        }
        if step == Step::Parameter {
            self.set_data_type(None);
        }
        self.configured = false;
        self.restore = None;
        debug!(%step, "step unlocked");

        Ok(self.request(step).into_iter().collect())
    }

    /// Clears every step and option and resolves parameters from scratch.
    ///
    /// Any resolution still in flight is superseded.
    pub fn reset(&mut self) -> Vec<Effect> {
        self.clear_all();
        info!("configuration reset");
        self.request(Step::Parameter).into_iter().collect()
    }

    /// Edits a display option.
    pub fn set_option(&mut self, change: DisplayOptionChange) -> Result<()> {
        let is_string = self.data_type.as_ref().is_some_and(DataType::is_string);
        let is_date = self.data_type.as_ref().is_some_and(DataType::is_date);
        let display = &mut self.display;

        match change {
            DisplayOptionChange::Background(raw) => {
                display.background = parse_color(&raw)?;
            }
            DisplayOptionChange::Text(raw) => {
                display.text = parse_color(&raw)?;
            }
            DisplayOptionChange::Sort(sort) => display.sort = sort,
            DisplayOptionChange::IgnoreSelection(v) => display.ignore_selection = v,
            DisplayOptionChange::UseFormattedValues(v) => display.use_formatted_values = v,
            DisplayOptionChange::AutoUpdate(v) => display.auto_update = v,
            DisplayOptionChange::IncludeAllValue(v) => {
                if !is_string {
                    return Err(CascadeError::InvalidOption(
                        "\"(All)\" is only available for string parameters".to_string(),
                    ));
                }
                display.include_all_value = v;
            }
            DisplayOptionChange::Multiselect(v) => {
                if !is_string {
                    return Err(CascadeError::InvalidOption(
                        "multiple selection is only available for string parameters".to_string(),
                    ));
                }
                display.multiselect = v;
            }
            DisplayOptionChange::Delimiter(raw) => {
                if !is_string || !display.multiselect {
                    return Err(CascadeError::InvalidOption(
                        "delimiter only applies to multiple selection".to_string(),
                    ));
                }
                let mut chars = raw.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => display.delimiter = c,
                    _ => {
                        return Err(CascadeError::InvalidOption(format!(
                            "delimiter must be one character, got '{}'",
                            raw
                        )));
                    }
                }
            }
            DisplayOptionChange::DateFormatIndex(index) => {
                if !is_date {
                    return Err(CascadeError::InvalidOption(
                        "date format is only available for date parameters".to_string(),
                    ));
                }
                display.date_format = DateFormat::from_index(index).ok_or_else(|| {
                    CascadeError::InvalidOption(format!("no date format at index {}", index))
                })?;
            }
        }
        Ok(())
    }

    /// Returns the effects that persist the configuration and close the dialog.
    ///
    /// Requires every step to be locked. The engine state is not changed; a
    /// failed save can simply be retried.
    pub fn finalize(&self) -> Result<Vec<Effect>> {
        self.ensure_settled()?;
        let worksheet = self.locked_value(Step::Worksheet);
        let (true, Some(worksheet)) = (self.configured, worksheet) else {
            return Err(CascadeError::NotConfigured);
        };

        Ok(vec![
            Effect::Persist {
                entries: codec::encode(&self.configuration()),
            },
            Effect::CloseDialog {
                worksheet: worksheet.to_string(),
            },
        ])
    }

    /// The current configuration, as it would be persisted.
    pub fn configuration(&self) -> Configuration {
        Configuration {
            parameter: self.locked_value(Step::Parameter).map(str::to_string),
            worksheet: self.locked_value(Step::Worksheet).map(str::to_string),
            field: self.locked_value(Step::Field).map(str::to_string),
            data_type: self.data_type.clone(),
            display: self.display.clone(),
            configured: self.configured,
        }
    }

    /// An immutable projection for rendering.
    pub fn snapshot(&self) -> CascadeSnapshot {
        let is_string = self.data_type.as_ref().is_some_and(DataType::is_string);
        let settled = self.pending.is_none();
        let steps = Step::ALL.map(|step| {
            let state = self.step(step);
            StepView {
                step,
                display_value: state.display_value(step),
                candidates: state.candidates.display(step),
                locked: state.locked,
                enabled: state.enabled,
                can_lock: settled && state.can_lock(),
                can_unlock: settled && state.locked,
            }
        });

        CascadeSnapshot {
            steps,
            data_type: self.data_type.clone(),
            configured: self.configured,
            display: self.display.clone(),
            drift: self.drift.clone(),
            string_options_visible: is_string,
            date_options_visible: self.data_type.as_ref().is_some_and(DataType::is_date),
            delimiter_editable: is_string && self.display.multiselect,
            ok_enabled: settled
                && self.configured
                && self.locked_value(Step::Worksheet).is_some(),
            loading: self.pending,
        }
    }

    /// Hands a query result back to the engine.
    ///
    /// Results for a superseded request are discarded. During a restore, the
    /// persisted value for the step is revalidated against the result; on
    /// success it is locked and the next step requested, on failure the
    /// restore is abandoned and the step falls back to normal selection.
    pub fn apply_resolution(&mut self, resolution: Resolution) -> ResolutionOutcome {
        let Resolution {
            step,
            generation,
            outcome,
        } = resolution;

        if generation != self.generation || self.pending != Some(step) {
            debug!(
                %step,
                generation,
                current = self.generation,
                "discarding superseded resolution"
            );
            return ResolutionOutcome::Discarded;
        }
        self.pending = None;

        let response = match outcome {
            Ok(response) => Some(response),
            Err(message) => {
                warn!(%step, error = %message, "candidate query failed");
                if self.restore.is_some() {
                    self.abandon_restore(DriftReason::SourceUnavailable { step, message });
                }
                None
            }
        };

        if let Some(QueryResponse::Parameters(params)) = &response {
            self.parameters = params.clone();
        }

        let options = response
            .as_ref()
            .and_then(|r| {
                let options = options_for(step, r, self.data_type.as_ref());
                if options.is_none() {
                    warn!(%step, "resolution answered a different query");
                }
                options
            })
            .unwrap_or_default();

        if self.restore.is_some() {
            match response.as_ref().map(|r| self.revalidate(step, r)) {
                Some(Ok(value)) => {
                    return ResolutionOutcome::Applied(self.lock_restored(step, value, options));
                }
                Some(Err(reason)) => self.abandon_restore(reason),
                None => self.abandon_restore(DriftReason::SourceUnavailable {
                    step,
                    message: "unexpected response".to_string(),
                }),
            }
        }

        self.state_mut(step).populate(options);
        debug!(
            %step,
            candidates = self.step(step).candidates.display(step).len(),
            "step resolved"
        );
        ResolutionOutcome::Applied(Vec::new())
    }

    /// Checks the persisted value of `step` against a live response.
    fn revalidate(
        &mut self,
        step: Step,
        response: &QueryResponse,
    ) -> std::result::Result<String, DriftReason> {
        let Some(target) = self.restore.as_ref() else {
            return Err(DriftReason::MissingValue { step });
        };

        match (step, response) {
            (Step::Parameter, QueryResponse::Parameters(params)) => {
                let param = validate_parameter(target.parameter.as_deref(), params)?;
                let (name, data_type) = (param.name.clone(), param.data_type.clone());
                self.set_data_type(Some(data_type));
                Ok(name)
            }
            (Step::Worksheet, QueryResponse::Worksheets(sheets)) => {
                validate_worksheet(target.worksheet.as_deref(), sheets).map(str::to_string)
            }
            (Step::Field, QueryResponse::Fields(columns)) => {
                let worksheet = self.locked_value(Step::Worksheet).unwrap_or_default();
                validate_field(
                    target.field.as_deref(),
                    worksheet,
                    columns,
                    self.data_type.as_ref(),
                )
                .map(str::to_string)
            }
            _ => Err(DriftReason::SourceUnavailable {
                step,
                message: "unexpected response".to_string(),
            }),
        }
    }

    fn lock_restored(&mut self, step: Step, value: String, options: Vec<String>) -> Vec<Effect> {
        debug!(%step, value = %value, "restored value still valid");
        self.state_mut(step).lock_restored(value, options);

        match step.next() {
            Some(next) => self.request(next).into_iter().collect(),
            None => {
                self.configured = self.data_type.is_some();
                self.restore = None;
                info!("saved configuration revalidated");
                Vec::new()
            }
        }
    }

    fn abandon_restore(&mut self, reason: DriftReason) {
        warn!(step = %reason.step(), reason = %reason, "saved configuration drifted, reselect required");
        if reason.step() == Step::Parameter {
            self.set_data_type(None);
        }
        self.restore = None;
        self.configured = false;
        self.drift = Some(reason);
    }

    /// Records the live parameter type.
    ///
    /// String-only options are dropped as soon as a non-string type is
    /// known. Clearing the type keeps them, so a restored choice survives
    /// until a parameter of another type is locked.
    fn set_data_type(&mut self, data_type: Option<DataType>) {
        if data_type.is_some() {
            self.display.prune_string_options(data_type.as_ref());
        }
        self.data_type = data_type;
    }

    /// Marks `step` as loading and returns the request that resolves it.
    fn request(&mut self, step: Step) -> Option<Effect> {
        let Some(query) = query_for(step, self.locked_value(Step::Worksheet)) else {
            warn!(%step, "cannot resolve without a locked worksheet");
            return None;
        };

        self.generation += 1;
        self.pending = Some(step);
        self.state_mut(step).begin_loading();
        debug!(%step, generation = self.generation, "requesting candidates");

        Some(Effect::Resolve(ResolveRequest {
            step,
            generation: self.generation,
            query,
        }))
    }

    fn ensure_settled(&self) -> Result<()> {
        match self.pending {
            Some(step) => Err(CascadeError::ResolutionInFlight { step }),
            None => Ok(()),
        }
    }

    fn clear_all(&mut self) {
        for state in &mut self.steps {
            state.clear();
        }
        self.parameters.clear();
        self.data_type = None;
        self.display = DisplayOptions::default();
        self.configured = false;
        self.pending = None;
        self.restore = None;
        self.drift = None;
    }
}

fn parse_color(raw: &str) -> Result<Color> {
    Color::parse(raw)
        .ok_or_else(|| CascadeError::InvalidOption(format!("'{}' is not a #rrggbb colour", raw)))
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
