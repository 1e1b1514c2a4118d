use std::time::{Duration, Instant};

use serde_json::{Map, Value, json};

use form_spec::{
    CallbackError, DebounceOutcome, FormBuilderValue, FormCallbacks, FormConfig, FormMode,
    FormSession, SubmitOutcome, mutate,
};

fn contact() -> FormBuilderValue {
    FormBuilderValue::from_json(include_str!("../tests/fixtures/contact_form.json"))
        .expect("deserialize")
}

#[derive(Default)]
struct Recorder {
    created: Vec<Map<String, Value>>,
    updated: Vec<Map<String, Value>>,
    debounced: Vec<Map<String, Value>>,
    fail: bool,
}

impl FormCallbacks for Recorder {
    fn on_create(&mut self, values: &Map<String, Value>) -> Result<(), CallbackError> {
        if self.fail {
            return Err(CallbackError::new("backend unavailable"));
        }
        self.created.push(values.clone());
        Ok(())
    }

    fn on_update(&mut self, changed: &Map<String, Value>) -> Result<(), CallbackError> {
        if self.fail {
            return Err(CallbackError::new("backend unavailable"));
        }
        self.updated.push(changed.clone());
        Ok(())
    }

    fn on_debounce_update(&mut self, changed: &Map<String, Value>) -> Result<(), CallbackError> {
        if self.fail {
            return Err(CallbackError::new("backend unavailable"));
        }
        self.debounced.push(changed.clone());
        Ok(())
    }
}

fn update_config() -> FormConfig {
    FormConfig {
        debounce_ms: 200,
        mode: FormMode::Update,
    }
}

fn existing_record() -> Map<String, Value> {
    let Value::Object(map) = json!({
        "fullName": "Jo",
        "age": 30,
        "country": "no",
        "newsletter": { "weekly": false },
        "phones": []
    }) else {
        unreachable!()
    };
    map
}

#[test]
fn pristine_and_invalid_forms_cannot_submit() {
    let mut session = FormSession::new(&contact(), FormConfig::default());
    let mut recorder = Recorder::default();
    assert!(!session.is_dirty());
    assert!(!session.can_submit());
    assert_eq!(session.submit(&mut recorder), SubmitOutcome::Pristine);

    let now = Instant::now();
    assert!(session.set_value("fullName", json!("Jo"), now));
    assert!(session.is_dirty());
    assert!(!session.can_submit());
    match session.submit(&mut recorder) {
        SubmitOutcome::Invalid(result) => {
            assert!(result.errors_for("age").next().is_some());
        }
        other => panic!("expected invalid, got {:?}", other),
    }
    assert!(recorder.created.is_empty());
}

#[test]
fn create_mode_submits_every_value() {
    let mut session = FormSession::new(&contact(), FormConfig::default());
    let mut recorder = Recorder::default();
    let now = Instant::now();
    session.set_value("fullName", json!("Jo"), now);
    session.set_value("age", json!(44), now);
    session.set_value("country", json!("se"), now);
    assert!(session.can_submit());

    match session.submit(&mut recorder) {
        SubmitOutcome::Submitted(values) => assert_eq!(values.len(), 5),
        other => panic!("expected submitted, got {:?}", other),
    }
    assert_eq!(recorder.created.len(), 1);
    assert_eq!(recorder.created[0]["newsletter"], json!({ "weekly": false }));
    assert!(!session.is_dirty());
}

#[test]
fn update_mode_submits_only_changes() {
    let mut session = FormSession::with_values(&contact(), update_config(), &existing_record());
    let mut recorder = Recorder::default();
    assert!(session.validation().valid);
    assert!(!session.can_submit());

    session.set_value("age", json!(31), Instant::now());
    assert_eq!(session.dirty_values().len(), 1);
    match session.submit(&mut recorder) {
        SubmitOutcome::Submitted(changed) => {
            assert_eq!(Value::Object(changed), json!({ "age": 31 }));
        }
        other => panic!("expected submitted, got {:?}", other),
    }
    assert_eq!(recorder.updated.len(), 1);
    assert!(recorder.created.is_empty());
}

#[test]
fn failed_submission_keeps_edits() {
    let mut session = FormSession::with_values(&contact(), update_config(), &existing_record());
    let mut recorder = Recorder {
        fail: true,
        ..Recorder::default()
    };
    session.set_value("age", json!(31), Instant::now());
    assert!(matches!(
        session.submit(&mut recorder),
        SubmitOutcome::Failed(_)
    ));
    assert!(session.is_dirty());
    assert_eq!(session.values()["age"], json!(31));
}

#[test]
fn debounce_waits_for_quiet_period() {
    let mut session = FormSession::with_values(&contact(), update_config(), &existing_record());
    let mut recorder = Recorder::default();
    let start = Instant::now();

    session.set_value("fullName", json!("Joe"), start);
    assert_eq!(
        session.poll(start + Duration::from_millis(100), &mut recorder),
        None
    );
    session.set_value("fullName", json!("Joel"), start + Duration::from_millis(150));
    assert_eq!(
        session.poll(start + Duration::from_millis(300), &mut recorder),
        None
    );

    let outcome = session.poll(start + Duration::from_millis(400), &mut recorder);
    match outcome {
        Some(DebounceOutcome::Sent(changed)) => {
            assert_eq!(Value::Object(changed), json!({ "fullName": "Joel" }));
        }
        other => panic!("expected debounced update, got {:?}", other),
    }
    assert_eq!(recorder.debounced.len(), 1);
    assert!(!session.is_dirty());
    assert_eq!(
        session.poll(start + Duration::from_millis(900), &mut recorder),
        None
    );
}

#[test]
fn failed_debounce_keeps_dirty_state() {
    let mut session = FormSession::with_values(&contact(), update_config(), &existing_record());
    let mut recorder = Recorder {
        fail: true,
        ..Recorder::default()
    };
    let start = Instant::now();
    session.set_value("country", json!("se"), start);
    let outcome = session.poll(start + Duration::from_secs(1), &mut recorder);
    assert!(matches!(outcome, Some(DebounceOutcome::Failed(_))));
    assert!(session.is_dirty());
    assert_eq!(session.dirty_values().len(), 1);
}

#[test]
fn create_mode_never_debounces() {
    let mut session = FormSession::new(&contact(), FormConfig::default());
    let mut recorder = Recorder::default();
    let start = Instant::now();
    session.set_value("fullName", json!("Jo"), start);
    assert_eq!(
        session.poll(start + Duration::from_secs(5), &mut recorder),
        None
    );
}

#[test]
fn unknown_keys_are_ignored() {
    let mut session = FormSession::new(&contact(), FormConfig::default());
    assert!(!session.set_value("nickname", json!("jj"), Instant::now()));
    assert!(!session.is_dirty());
}

#[test]
fn rows_are_added_with_child_defaults() {
    let mut session = FormSession::new(&contact(), FormConfig::default());
    let now = Instant::now();
    assert!(session.add_row("phones", now));
    assert_eq!(session.values()["phones"], json!([{ "number": "" }]));
    assert!(session.field_errors("phones").next().is_some());
    assert!(session.remove_row("phones", 0, now));
    assert_eq!(session.values()["phones"], json!([]));
    assert!(!session.remove_row("phones", 0, now));
    assert!(!session.add_row("fullName", now));
}

#[test]
fn reset_restores_baseline() {
    let mut session = FormSession::with_values(&contact(), update_config(), &existing_record());
    session.set_value("fullName", json!("Someone"), Instant::now());
    session.reset();
    assert!(!session.is_dirty());
    assert_eq!(session.values()["fullName"], json!("Jo"));
}

#[test]
fn definition_changes_rederive_defaults() {
    let tree = contact();
    let mut session = FormSession::new(&tree, FormConfig::default());
    session.set_value("fullName", json!("Jo"), Instant::now());

    let tree = mutate::delete_field(&tree, 0, "f-age");
    let tree = mutate::promote_empty_field(
        &tree,
        "f-slot",
        &form_spec::FieldType::Text.default_kind(),
    );
    assert!(session.sync_definition(&tree));

    assert!(!session.values().contains_key("age"));
    assert_eq!(session.values()["pending"], json!(""));
    assert_eq!(session.values()["fullName"], json!("Jo"));
    assert!(session.field_errors("age").next().is_none());

    assert!(!session.sync_definition(&tree));
}
