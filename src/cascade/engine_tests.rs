//! Unit tests and property tests for the cascade engine.
//!
//! Tests answer the engine's resolve effects synchronously from a
//! [`Workbook`], which is how the facade drives it minus the I/O.

use std::collections::{HashMap, VecDeque};

use proptest::prelude::*;

use super::*;
use crate::effects::Query;
use crate::test_utils::{arb_step, scenario_workbook};
use crate::types::{
    CandidateList, NO_FIELDS_FOUND, NO_PARAMETERS_FOUND, NO_WORKSHEETS_FOUND, SortOrder,
};
use crate::workbook::Workbook;

// ─────────────────────────────────────────────────────────────────────────────
// Test Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn settle(engine: &mut CascadeEngine, workbook: &Workbook, effects: Vec<Effect>) {
    let mut queue: VecDeque<Effect> = effects.into();
    while let Some(effect) = queue.pop_front() {
        if let Effect::Resolve(request) = effect {
            let outcome = workbook.answer(&request.query).map_err(|e| e.to_string());
            let resolution = Resolution::for_request(&request, outcome);
            queue.extend(engine.apply_resolution(resolution).into_effects());
        }
    }
}

fn started(workbook: &Workbook) -> CascadeEngine {
    let mut engine = CascadeEngine::new();
    let effects = engine.begin(None);
    settle(&mut engine, workbook, effects);
    engine
}

fn lock(engine: &mut CascadeEngine, workbook: &Workbook, step: Step) {
    let effects = engine.lock(step).unwrap();
    settle(engine, workbook, effects);
}

fn select_and_lock(engine: &mut CascadeEngine, workbook: &Workbook, step: Step, value: &str) {
    engine.select(step, value).unwrap();
    lock(engine, workbook, step);
}

fn fully_configured(workbook: &Workbook) -> CascadeEngine {
    let mut engine = started(workbook);
    select_and_lock(&mut engine, workbook, Step::Parameter, "P1");
    select_and_lock(&mut engine, workbook, Step::Worksheet, "Sheet1");
    select_and_lock(&mut engine, workbook, Step::Field, "F1");
    engine
}

fn saved(parameter: &str, worksheet: &str, field: &str, data_type: &str) -> Configuration {
    Configuration {
        parameter: Some(parameter.to_string()),
        worksheet: Some(worksheet.to_string()),
        field: Some(field.to_string()),
        data_type: DataType::parse(data_type),
        display: DisplayOptions::default(),
        configured: true,
    }
}

fn restored(workbook: &Workbook, config: Configuration) -> CascadeEngine {
    let mut engine = CascadeEngine::new();
    let effects = engine.begin(Some(config));
    settle(&mut engine, workbook, effects);
    engine
}

fn options(engine: &CascadeEngine, step: Step) -> Vec<String> {
    match engine.step(step).candidates() {
        CandidateList::Resolved(options) => options.clone(),
        _ => Vec::new(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Resolution
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn begin_requests_parameters_and_shows_loading() {
    let mut engine = CascadeEngine::new();
    let effects = engine.begin(None);

    assert_eq!(effects.len(), 1);
    let Effect::Resolve(request) = &effects[0] else {
        panic!("expected a resolve effect");
    };
    assert_eq!(request.step, Step::Parameter);
    assert_eq!(request.query, Query::Parameters);
    assert_eq!(engine.pending(), Some(Step::Parameter));
    assert_eq!(
        engine.snapshot().step(Step::Parameter).display_value,
        crate::types::LOADING
    );
}

#[test]
fn parameters_filtered_and_first_selected() {
    let engine = started(&scenario_workbook());

    let param = engine.step(Step::Parameter);
    assert_eq!(options(&engine, Step::Parameter), vec!["P1", "P2", "Count", "When"]);
    assert_eq!(param.selected(), Some("P1"));
    assert!(param.is_enabled());
    assert!(!engine.step(Step::Worksheet).is_enabled());
    assert!(!engine.step(Step::Field).is_enabled());
}

#[test]
fn no_open_parameters_shows_sentinel() {
    let workbook = Workbook::new().with_parameter("Fixed", "string", false);
    let mut engine = started(&workbook);

    let view = engine.snapshot();
    assert_eq!(view.step(Step::Parameter).candidates, vec![NO_PARAMETERS_FOUND]);
    assert!(!view.step(Step::Parameter).enabled);
    assert!(!view.step(Step::Parameter).can_lock);
    assert!(matches!(
        engine.lock(Step::Parameter),
        Err(CascadeError::InvalidTransition { .. })
    ));
}

#[test]
fn full_scenario_reaches_configured() {
    let workbook = Workbook::new()
        .with_parameter("P1", "string", true)
        .with_parameter("P2", "string", true)
        .with_worksheet("Sheet1", &[("F1", "string"), ("Amount", "float")]);
    let mut engine = started(&workbook);

    lock(&mut engine, &workbook, Step::Parameter);
    assert_eq!(engine.data_type().map(DataType::as_str), Some("string"));
    assert_eq!(options(&engine, Step::Worksheet), vec!["Sheet1"]);

    lock(&mut engine, &workbook, Step::Worksheet);
    assert_eq!(options(&engine, Step::Field), vec!["F1"]);

    lock(&mut engine, &workbook, Step::Field);
    assert!(engine.is_configured());
    assert!(engine.snapshot().ok_enabled);
}

#[test]
fn no_worksheets_disables_step() {
    let workbook = Workbook::new().with_parameter("P1", "string", true);
    let mut engine = started(&workbook);
    lock(&mut engine, &workbook, Step::Parameter);

    let view = engine.snapshot();
    let sheet = view.step(Step::Worksheet);
    assert_eq!(sheet.candidates, vec![NO_WORKSHEETS_FOUND]);
    assert_eq!(sheet.display_value, NO_WORKSHEETS_FOUND);
    assert!(!sheet.enabled);
    assert!(!sheet.can_lock);
}

#[test]
fn no_matching_fields_disables_step() {
    let workbook = scenario_workbook();
    let mut engine = started(&workbook);
    select_and_lock(&mut engine, &workbook, Step::Parameter, "When");
    select_and_lock(&mut engine, &workbook, Step::Worksheet, "Sheet1");

    let view = engine.snapshot();
    assert_eq!(view.step(Step::Field).candidates, vec![NO_FIELDS_FOUND]);
    assert!(!view.step(Step::Field).enabled);
}

#[test]
fn failed_query_looks_like_empty_result() {
    let mut engine = CascadeEngine::new();
    let effects = engine.begin(None);
    let Effect::Resolve(request) = &effects[0] else {
        panic!("expected a resolve effect");
    };
    engine.apply_resolution(Resolution::for_request(request, Err("offline".into())));

    assert_eq!(engine.step(Step::Parameter).candidates(), &CandidateList::NoneFound);
    assert_eq!(engine.pending(), None);
}

// ─────────────────────────────────────────────────────────────────────────────
// Transitions
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn select_requires_enabled_step() {
    let mut engine = started(&scenario_workbook());
    let err = engine.select(Step::Worksheet, "Sheet1").unwrap_err();
    assert!(matches!(
        err,
        CascadeError::InvalidTransition {
            step: Step::Worksheet,
            ..
        }
    ));
}

#[test]
fn select_rejects_non_candidates_and_sentinels() {
    let mut engine = started(&scenario_workbook());
    assert!(engine.select(Step::Parameter, "Fixed").is_err());
    assert!(engine.select(Step::Parameter, crate::types::LOADING).is_err());
    assert!(engine.select(Step::Parameter, "P2").is_ok());
    assert!(engine.select(Step::Parameter, "P2").is_ok());
    assert_eq!(engine.step(Step::Parameter).selected(), Some("P2"));
}

#[test]
fn select_has_no_downstream_effect() {
    let workbook = scenario_workbook();
    let mut engine = started(&workbook);
    engine.select(Step::Parameter, "P2").unwrap();
    assert!(engine.step(Step::Worksheet).is_cleared());
    assert_eq!(engine.pending(), None);
}

#[test]
fn lock_is_rejected_while_loading() {
    let workbook = scenario_workbook();
    let mut engine = started(&workbook);
    let effects = engine.lock(Step::Parameter).unwrap();
    assert_eq!(effects.len(), 1);

    assert_eq!(
        engine.unlock(Step::Parameter),
        Err(CascadeError::ResolutionInFlight {
            step: Step::Worksheet
        })
    );
    assert!(engine.lock(Step::Worksheet).is_err());
    assert!(!engine.snapshot().step(Step::Parameter).can_unlock);
}

#[test]
fn lock_twice_is_a_no_op() {
    let workbook = scenario_workbook();
    let mut engine = started(&workbook);
    lock(&mut engine, &workbook, Step::Parameter);
    let generation = engine.generation();

    assert_eq!(engine.lock(Step::Parameter), Ok(Vec::new()));
    assert_eq!(engine.generation(), generation);
}

#[test]
fn unlock_of_unlocked_step_is_a_no_op() {
    let workbook = scenario_workbook();
    let mut engine = started(&workbook);
    let before = engine.snapshot();
    assert_eq!(engine.unlock(Step::Parameter), Ok(Vec::new()));
    assert_eq!(engine.snapshot(), before);
}

#[test]
fn unlock_parameter_clears_everything_downstream() {
    let workbook = scenario_workbook();
    let mut engine = fully_configured(&workbook);

    let effects = engine.unlock(Step::Parameter).unwrap();
    assert!(!engine.is_configured());
    assert_eq!(engine.data_type(), None);
    assert!(engine.step(Step::Worksheet).is_cleared());
    assert!(engine.step(Step::Field).is_cleared());

    settle(&mut engine, &workbook, effects);
    let param = engine.step(Step::Parameter);
    assert!(!param.is_locked());
    assert!(param.is_enabled());
    assert_eq!(param.selected(), Some("P1"));
}

#[test]
fn unlock_worksheet_keeps_parameter() {
    let workbook = scenario_workbook();
    let mut engine = fully_configured(&workbook);

    let effects = engine.unlock(Step::Worksheet).unwrap();
    settle(&mut engine, &workbook, effects);

    assert!(engine.step(Step::Parameter).is_locked());
    assert_eq!(engine.data_type().map(DataType::as_str), Some("string"));
    assert!(engine.step(Step::Worksheet).is_enabled());
    assert!(engine.step(Step::Field).is_cleared());
    assert!(!engine.snapshot().ok_enabled);
}

#[test]
fn switching_worksheet_refreshes_fields() {
    let workbook = scenario_workbook();
    let mut engine = fully_configured(&workbook);

    let effects = engine.unlock(Step::Worksheet).unwrap();
    settle(&mut engine, &workbook, effects);
    select_and_lock(&mut engine, &workbook, Step::Worksheet, "Sheet2");

    assert_eq!(options(&engine, Step::Field), vec!["F2"]);
}

#[test]
fn reset_supersedes_pending_resolution() {
    let workbook = scenario_workbook();
    let mut engine = started(&workbook);
    let stale = engine.lock(Step::Parameter).unwrap();

    let fresh = engine.reset();
    settle(&mut engine, &workbook, fresh);

    // The worksheet answer requested before the reset arrives late.
    let Effect::Resolve(request) = &stale[0] else {
        panic!("expected a resolve effect");
    };
    let late = Resolution::for_request(request, workbook.answer(&request.query).map_err(|e| e.to_string()));
    assert_eq!(engine.apply_resolution(late), ResolutionOutcome::Discarded);

    assert!(engine.step(Step::Worksheet).is_cleared());
    assert!(!engine.step(Step::Parameter).is_locked());
}

#[test]
fn reset_clears_options_and_selection() {
    let workbook = scenario_workbook();
    let mut engine = fully_configured(&workbook);
    engine.set_option(DisplayOptionChange::AutoUpdate(true)).unwrap();

    let effects = engine.reset();
    settle(&mut engine, &workbook, effects);

    assert_eq!(engine.configuration().parameter, None);
    assert_eq!(engine.display(), &DisplayOptions::default());
    assert!(!engine.is_configured());
    assert!(engine.step(Step::Parameter).is_enabled());
}

// ─────────────────────────────────────────────────────────────────────────────
// Display options
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn string_options_need_string_parameter() {
    let workbook = scenario_workbook();
    let mut engine = started(&workbook);
    assert!(engine.set_option(DisplayOptionChange::Multiselect(true)).is_err());

    select_and_lock(&mut engine, &workbook, Step::Parameter, "P1");
    engine.set_option(DisplayOptionChange::Multiselect(true)).unwrap();
    engine.set_option(DisplayOptionChange::IncludeAllValue(true)).unwrap();
    engine.set_option(DisplayOptionChange::Delimiter(",".into())).unwrap();

    assert!(engine.snapshot().delimiter_editable);
    assert_eq!(engine.display().delimiter, ',');
    assert!(engine.set_option(DisplayOptionChange::Delimiter(",,".into())).is_err());
    assert!(engine.set_option(DisplayOptionChange::Delimiter(String::new())).is_err());
}

#[test]
fn locking_non_string_parameter_prunes_string_options() {
    let workbook = scenario_workbook();
    let mut engine = started(&workbook);
    select_and_lock(&mut engine, &workbook, Step::Parameter, "P1");
    engine.set_option(DisplayOptionChange::Multiselect(true)).unwrap();
    engine.set_option(DisplayOptionChange::IncludeAllValue(true)).unwrap();

    let effects = engine.unlock(Step::Parameter).unwrap();
    settle(&mut engine, &workbook, effects);
    select_and_lock(&mut engine, &workbook, Step::Parameter, "Count");

    assert!(!engine.display().multiselect);
    assert!(!engine.display().include_all_value);
    assert!(!engine.snapshot().string_options_visible);
}

#[test]
fn date_format_needs_date_parameter() {
    let workbook = scenario_workbook();
    let mut engine = started(&workbook);
    assert!(engine.set_option(DisplayOptionChange::DateFormatIndex(2)).is_err());

    select_and_lock(&mut engine, &workbook, Step::Parameter, "When");
    assert!(engine.snapshot().date_options_visible);
    engine.set_option(DisplayOptionChange::DateFormatIndex(2)).unwrap();
    assert_eq!(engine.display().date_format, DateFormat::LongWithWeekday);
    assert!(engine.set_option(DisplayOptionChange::DateFormatIndex(6)).is_err());
}

#[test]
fn cosmetic_options_always_editable() {
    let mut engine = CascadeEngine::new();
    engine.set_option(DisplayOptionChange::Background("#112233".into())).unwrap();
    engine.set_option(DisplayOptionChange::Sort(SortOrder::Desc)).unwrap();
    assert!(engine.set_option(DisplayOptionChange::Text("blue".into())).is_err());
    assert_eq!(engine.display().background.as_str(), "#112233");
    assert_eq!(engine.display().sort, SortOrder::Desc);
}

// ─────────────────────────────────────────────────────────────────────────────
// Finalize
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn finalize_requires_configuration() {
    let workbook = scenario_workbook();
    let mut engine = started(&workbook);
    assert_eq!(engine.finalize(), Err(CascadeError::NotConfigured));

    select_and_lock(&mut engine, &workbook, Step::Parameter, "P1");
    select_and_lock(&mut engine, &workbook, Step::Worksheet, "Sheet1");
    assert_eq!(engine.finalize(), Err(CascadeError::NotConfigured));
}

#[test]
fn finalize_persists_then_closes_with_worksheet() {
    let engine = fully_configured(&scenario_workbook());
    let effects = engine.finalize().unwrap();

    let [Effect::Persist { entries }, Effect::CloseDialog { worksheet }] = effects.as_slice()
    else {
        panic!("unexpected effects: {:?}", effects);
    };
    assert_eq!(worksheet, "Sheet1");
    let stored: HashMap<_, _> = entries.iter().cloned().collect();
    assert_eq!(stored["selParam"], "P1");
    assert_eq!(stored["selField"], "F1");
    assert_eq!(stored["configured"], "true");
}

#[test]
fn finalize_then_restore_roundtrips() {
    let workbook = scenario_workbook();
    let mut engine = fully_configured(&workbook);
    engine.set_option(DisplayOptionChange::Multiselect(true)).unwrap();
    engine.set_option(DisplayOptionChange::Background("#336699".into())).unwrap();

    let Effect::Persist { entries } = &engine.finalize().unwrap()[0] else {
        panic!("expected persist first");
    };
    let stored: HashMap<_, _> = entries.iter().cloned().collect();
    let reloaded = restored(&workbook, codec::decode(&stored).unwrap());

    assert_eq!(reloaded.configuration(), engine.configuration());
    for step in Step::ALL {
        assert!(reloaded.step(step).is_locked());
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Restore and drift
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn restore_with_unchanged_workbook_locks_everything() {
    let workbook = scenario_workbook();
    let engine = restored(&workbook, saved("P1", "Sheet1", "F1", "string"));

    assert!(engine.is_configured());
    assert!(!engine.is_restoring());
    assert_eq!(engine.drift(), None);
    assert_eq!(engine.step(Step::Field).selected(), Some("F1"));
    assert!(engine.snapshot().ok_enabled);
}

#[test]
fn restore_with_missing_parameter_falls_back() {
    let workbook = scenario_workbook();
    let engine = restored(&workbook, saved("Gone", "Sheet1", "F1", "string"));

    assert!(!engine.is_configured());
    assert!(matches!(
        engine.drift(),
        Some(DriftReason::ParameterMissing { .. })
    ));
    let param = engine.step(Step::Parameter);
    assert!(!param.is_locked());
    assert!(param.is_enabled());
    assert_eq!(param.selected(), Some("P1"));
    assert!(engine.step(Step::Worksheet).is_cleared());
    assert!(engine.step(Step::Field).is_cleared());
    assert_eq!(engine.data_type(), None);
}

#[test]
fn restore_with_restricted_parameter_falls_back() {
    let workbook = scenario_workbook();
    let engine = restored(&workbook, saved("Fixed", "Sheet1", "F1", "string"));

    assert!(matches!(
        engine.drift(),
        Some(DriftReason::ParameterRestricted { .. })
    ));
    assert!(!engine.step(Step::Parameter).is_locked());
}

#[test]
fn restore_with_missing_worksheet_keeps_parameter() {
    let workbook = scenario_workbook();
    let engine = restored(&workbook, saved("P1", "Deleted", "F1", "string"));

    assert!(!engine.is_configured());
    assert!(engine.step(Step::Parameter).is_locked());
    let sheet = engine.step(Step::Worksheet);
    assert!(!sheet.is_locked());
    assert!(sheet.is_enabled());
    assert_eq!(options(&engine, Step::Worksheet), vec!["Sheet1", "Sheet2"]);
    assert!(engine.step(Step::Field).is_cleared());
    assert!(matches!(
        engine.drift(),
        Some(DriftReason::WorksheetMissing { .. })
    ));
}

#[test]
fn restore_with_type_changed_field_offers_matching_fields() {
    let workbook = scenario_workbook();
    let engine = restored(&workbook, saved("P1", "Sheet1", "N", "string"));

    assert!(!engine.is_configured());
    assert!(engine.step(Step::Worksheet).is_locked());
    assert_eq!(options(&engine, Step::Field), vec!["F1"]);
    assert!(engine.step(Step::Field).is_enabled());
    assert!(matches!(
        engine.drift(),
        Some(DriftReason::FieldTypeMismatch { .. })
    ));
}

#[test]
fn restore_uses_live_parameter_type() {
    // Saved as string, but the parameter is now an int.
    let workbook = Workbook::new()
        .with_parameter("P1", "int", true)
        .with_worksheet("Sheet1", &[("F1", "string"), ("N", "int")]);
    let engine = restored(&workbook, saved("P1", "Sheet1", "F1", "string"));

    assert_eq!(engine.data_type().map(DataType::as_str), Some("int"));
    assert_eq!(options(&engine, Step::Field), vec!["N"]);
    assert!(!engine.is_configured());
}

#[test]
fn restore_with_missing_value_falls_back_at_that_step() {
    let workbook = scenario_workbook();
    let mut config = saved("P1", "Sheet1", "F1", "string");
    config.worksheet = None;
    let engine = restored(&workbook, config);

    assert_eq!(
        engine.drift(),
        Some(&DriftReason::MissingValue {
            step: Step::Worksheet
        })
    );
    assert!(engine.step(Step::Worksheet).is_enabled());
}

#[test]
fn restore_with_failed_query_reports_unavailable() {
    let mut engine = CascadeEngine::new();
    let effects = engine.begin(Some(saved("P1", "Sheet1", "F1", "string")));
    let Effect::Resolve(request) = &effects[0] else {
        panic!("expected a resolve effect");
    };
    engine.apply_resolution(Resolution::for_request(request, Err("timeout".into())));

    assert!(matches!(
        engine.drift(),
        Some(DriftReason::SourceUnavailable { .. })
    ));
    assert!(!engine.is_restoring());
    assert_eq!(engine.step(Step::Parameter).candidates(), &CandidateList::NoneFound);
}

#[test]
fn restore_keeps_display_options_despite_drift() {
    let workbook = scenario_workbook();
    let mut config = saved("Gone", "Sheet1", "F1", "string");
    config.display.background = Color::parse("#123456").unwrap();
    config.display.multiselect = true;
    config.display.include_all_value = true;
    let mut engine = restored(&workbook, config);

    assert!(engine.drift().is_some());
    assert_eq!(engine.data_type(), None);
    assert_eq!(engine.display().background.as_str(), "#123456");
    assert!(engine.display().multiselect);
    assert!(engine.display().include_all_value);

    select_and_lock(&mut engine, &workbook, Step::Parameter, "P1");
    assert!(engine.display().multiselect);
    assert!(engine.display().include_all_value);
    assert!(engine.snapshot().string_options_visible);
}

#[test]
fn unlocking_parameter_keeps_string_options_until_type_changes() {
    let workbook = scenario_workbook();
    let mut engine = started(&workbook);
    select_and_lock(&mut engine, &workbook, Step::Parameter, "P1");
    engine.set_option(DisplayOptionChange::Multiselect(true)).unwrap();

    let effects = engine.unlock(Step::Parameter).unwrap();
    settle(&mut engine, &workbook, effects);
    assert!(engine.display().multiselect);

    select_and_lock(&mut engine, &workbook, Step::Parameter, "P2");
    assert!(engine.display().multiselect);
}

#[test]
fn restore_prunes_string_options_for_other_types() {
    let workbook = scenario_workbook();
    let mut config = saved("Count", "Sheet1", "N", "int");
    config.display.include_all_value = true;
    config.display.auto_update = true;
    let engine = restored(&workbook, config);

    assert!(engine.is_configured());
    assert!(!engine.display().include_all_value);
    assert!(engine.display().auto_update);
}

// ─────────────────────────────────────────────────────────────────────────────
// Property tests
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Op {
    Select(Step, usize),
    Lock(Step),
    Unlock(Step),
    Reset,
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (arb_step(), 0usize..4).prop_map(|(s, i)| Op::Select(s, i)),
        4 => arb_step().prop_map(Op::Lock),
        2 => arb_step().prop_map(Op::Unlock),
        1 => Just(Op::Reset),
    ]
}

fn apply_op(engine: &mut CascadeEngine, workbook: &Workbook, op: &Op) {
    match op {
        Op::Select(step, index) => {
            if let Some(value) = options(engine, *step).get(*index) {
                let _ = engine.select(*step, value);
            }
        }
        Op::Lock(step) => {
            if let Ok(effects) = engine.lock(*step) {
                settle(engine, workbook, effects);
            }
        }
        Op::Unlock(step) => {
            if let Ok(effects) = engine.unlock(*step) {
                settle(engine, workbook, effects);
            }
        }
        Op::Reset => {
            let effects = engine.reset();
            settle(engine, workbook, effects);
        }
    }
}

fn assert_invariants(engine: &CascadeEngine) {
    for step in Step::ALL {
        let state = engine.step(step);
        if state.is_enabled() {
            for upstream in step.upstream() {
                assert!(
                    engine.step(upstream).is_locked(),
                    "{} enabled while {} unlocked",
                    step,
                    upstream
                );
            }
        }
        if state.is_locked() {
            let value = state.selected().expect("locked step has a value");
            assert!(state.candidates().contains(value));
            for upstream in step.upstream() {
                assert!(engine.step(upstream).is_locked());
            }
        }
    }
    if engine.is_configured() {
        assert!(Step::ALL.iter().all(|s| engine.step(*s).is_locked()));
        assert!(engine.data_type().is_some());
    }
    assert_eq!(engine.pending(), None);
}

proptest! {
    /// No step is ever enabled while an upstream step is unlocked, and the
    /// other aggregate invariants hold after every settled operation.
    #[test]
    fn invariants_hold_for_any_operation_sequence(
        ops in prop::collection::vec(arb_op(), 0..40)
    ) {
        let workbook = scenario_workbook();
        let mut engine = started(&workbook);
        assert_invariants(&engine);
        for op in &ops {
            apply_op(&mut engine, &workbook, op);
            assert_invariants(&engine);
        }
    }

    /// Unlocking step i always clears every step after it.
    #[test]
    fn unlock_clears_all_downstream(
        ops in prop::collection::vec(arb_op(), 0..30),
        step in arb_step(),
    ) {
        let workbook = scenario_workbook();
        let mut engine = started(&workbook);
        for op in &ops {
            apply_op(&mut engine, &workbook, op);
        }
        if engine.step(step).is_locked() {
            let effects = engine.unlock(step).unwrap();
            for downstream in step.downstream() {
                prop_assert!(engine.step(downstream).is_cleared());
            }
            settle(&mut engine, &workbook, effects);
            for downstream in step.downstream() {
                prop_assert!(engine.step(downstream).is_cleared());
            }
            prop_assert!(!engine.is_configured());
        }
    }

    /// A saved worksheet that no longer exists never restores as configured.
    #[test]
    fn missing_worksheet_never_restores_configured(
        parameter in prop::sample::select(vec!["P1", "Count", "Gone", "Fixed"]),
    ) {
        let workbook = scenario_workbook().without_worksheet("Sheet1");
        let engine = restored(&workbook, saved(parameter, "Sheet1", "F1", "string"));

        prop_assert!(!engine.is_configured());
        prop_assert!(!engine.step(Step::Worksheet).is_locked());
        prop_assert!(engine.step(Step::Field).is_cleared());
        assert_invariants(&engine);
    }

    /// Locking is idempotent: repeating it changes nothing.
    #[test]
    fn repeated_lock_is_idempotent(ops in prop::collection::vec(arb_op(), 0..20), step in arb_step()) {
        let workbook = scenario_workbook();
        let mut engine = started(&workbook);
        for op in &ops {
            apply_op(&mut engine, &workbook, op);
        }
        apply_op(&mut engine, &workbook, &Op::Lock(step));
        let once = engine.snapshot();
        apply_op(&mut engine, &workbook, &Op::Lock(step));
        prop_assert_eq!(engine.snapshot(), once);
    }
}
