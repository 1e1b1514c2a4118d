use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::debug;

use form_spec::{
    BuilderAction, CallbackError, DndItem, FormBuilder, FormBuilderValue, FormCallbacks,
    FormConfig, FormError, FormSchema, FormSession, SubmitOutcome, check_definition,
    derive_defaults, dnd::resolve_drop, render_builder_ui as spec_render_builder_ui,
    render_preview as spec_render_preview, render_text as spec_render_text, validate,
    values_schema,
};

const DEFAULT_FORM: &str = include_str!("../../form-spec/tests/fixtures/contact_form.json");

#[derive(Debug, Error)]
enum ComponentError {
    #[error("failed to parse config: {0}")]
    ConfigParse(#[source] serde_json::Error),
    #[error(transparent)]
    Form(#[from] FormError),
    #[error("failed to parse values: {0}")]
    ValuesParse(#[source] serde_json::Error),
    #[error("failed to parse builder action: {0}")]
    ActionParse(#[source] serde_json::Error),
    #[error("failed to parse drag item: {0}")]
    DragParse(#[source] serde_json::Error),
    #[error("json encode error: {0}")]
    JsonEncode(#[source] serde_json::Error),
}

#[derive(Debug, Deserialize, Serialize, Default)]
struct ComponentConfig {
    #[serde(default)]
    form_json: Option<String>,
    #[serde(default)]
    form_config: FormConfig,
}

fn parse_config(config_json: &str) -> Result<ComponentConfig, ComponentError> {
    if config_json.trim().is_empty() {
        Ok(ComponentConfig::default())
    } else {
        serde_json::from_str(config_json).map_err(ComponentError::ConfigParse)
    }
}

fn load_form(config: &ComponentConfig) -> Result<FormBuilderValue, ComponentError> {
    let form_json = config.form_json.as_deref().unwrap_or(DEFAULT_FORM);
    Ok(FormBuilderValue::from_json(form_json)?)
}

fn load(config_json: &str) -> Result<(ComponentConfig, FormBuilderValue), ComponentError> {
    let config = parse_config(config_json)?;
    let form = load_form(&config)?;
    Ok((config, form))
}

fn parse_values(values_json: &str) -> Result<Map<String, Value>, ComponentError> {
    if values_json.trim().is_empty() {
        return Ok(Map::new());
    }
    serde_json::from_str(values_json).map_err(ComponentError::ValuesParse)
}

fn respond(result: Result<Value, ComponentError>) -> String {
    match result {
        Ok(value) => serde_json::to_string(&value).unwrap_or_else(|error| {
            json!({"error": format!("json encode: {}", error)}).to_string()
        }),
        Err(err) => json!({ "error": err.to_string() }).to_string(),
    }
}

fn respond_string(result: Result<String, ComponentError>) -> String {
    match result {
        Ok(value) => value,
        Err(err) => json!({ "error": err.to_string() }).to_string(),
    }
}

/// The configured form in its sectioned shape.
pub fn describe(config_json: &str) -> String {
    respond(load(config_json).and_then(|(_, form)| {
        serde_json::to_value(form).map_err(ComponentError::JsonEncode)
    }))
}

pub fn check_form(config_json: &str) -> String {
    respond(load(config_json).and_then(|(_, form)| {
        let issues = check_definition(&form);
        Ok(json!({
            "valid": issues.is_empty(),
            "issues": serde_json::to_value(issues).map_err(ComponentError::JsonEncode)?,
        }))
    }))
}

pub fn get_value_schema(config_json: &str) -> String {
    respond(load(config_json).map(|(_, form)| values_schema(&form)))
}

pub fn get_default_values(config_json: &str) -> String {
    respond(load(config_json).map(|(_, form)| Value::Object(derive_defaults(&form))))
}

pub fn validate_values(config_json: &str, values_json: &str) -> String {
    respond(load(config_json).and_then(|(_, form)| {
        let values = Value::Object(parse_values(values_json)?);
        let result = validate(&FormSchema::from_form(&form), &values);
        serde_json::to_value(result).map_err(ComponentError::JsonEncode)
    }))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ActionInput {
    Many(Vec<BuilderAction>),
    One(BuilderAction),
}

/// Apply one builder action, or a list of them, to the configured form.
pub fn apply_action(config_json: &str, action_json: &str) -> String {
    respond(load(config_json).and_then(|(_, form)| {
        let input: ActionInput =
            serde_json::from_str(action_json).map_err(ComponentError::ActionParse)?;
        let actions = match input {
            ActionInput::Many(actions) => actions,
            ActionInput::One(action) => vec![action],
        };
        let mut builder = FormBuilder::new(form);
        let applied = builder.apply_all(&actions);
        debug!(applied, requested = actions.len(), "builder actions applied");
        Ok(json!({
            "changed": applied > 0,
            "applied": applied,
            "form": serde_json::to_value(builder.tree()).map_err(ComponentError::JsonEncode)?,
        }))
    }))
}

/// Resolve a completed drag gesture and apply the resulting mutation.
pub fn apply_drop(config_json: &str, active_json: &str, over_json: &str) -> String {
    respond(load(config_json).and_then(|(_, form)| {
        let active: DndItem =
            serde_json::from_str(active_json).map_err(ComponentError::DragParse)?;
        let over: Option<DndItem> =
            serde_json::from_str(over_json).map_err(ComponentError::DragParse)?;
        let action = over.as_ref().and_then(|over| resolve_drop(&active, over));
        let form = match &action {
            Some(action) => action.apply(&form),
            None => form,
        };
        Ok(json!({
            "accepted": action.is_some(),
            "action": serde_json::to_value(&action).map_err(ComponentError::JsonEncode)?,
            "form": serde_json::to_value(form).map_err(ComponentError::JsonEncode)?,
        }))
    }))
}

pub fn render_builder_ui(config_json: &str) -> String {
    respond(load(config_json).map(|(_, form)| spec_render_builder_ui(&form)))
}

/// Session opened on the form's defaults with `values_json` typed in.
fn edited_session(
    config: &ComponentConfig,
    form: &FormBuilderValue,
    baseline_json: &str,
    values_json: &str,
) -> Result<FormSession, ComponentError> {
    let baseline = parse_values(baseline_json)?;
    let values = parse_values(values_json)?;
    let mut session = FormSession::with_values(form, config.form_config.clone(), &baseline);
    let now = Instant::now();
    for (key, value) in values {
        session.set_value(&key, value, now);
    }
    Ok(session)
}

pub fn render_preview(config_json: &str, values_json: &str) -> String {
    respond(load(config_json).and_then(|(config, form)| {
        let session = edited_session(&config, &form, "", values_json)?;
        Ok(spec_render_preview(&form, &session))
    }))
}

pub fn render_text(config_json: &str, values_json: &str) -> String {
    respond_string(load(config_json).and_then(|(config, form)| {
        let session = edited_session(&config, &form, "", values_json)?;
        Ok(spec_render_text(&form, Some(&session)))
    }))
}

#[derive(Default)]
struct CapturedSubmission {
    callback: Option<&'static str>,
}

impl FormCallbacks for CapturedSubmission {
    fn on_create(&mut self, _values: &Map<String, Value>) -> Result<(), CallbackError> {
        self.callback = Some("on_create");
        Ok(())
    }

    fn on_update(&mut self, _changed: &Map<String, Value>) -> Result<(), CallbackError> {
        self.callback = Some("on_update");
        Ok(())
    }
}

/// Submit `values_json` edited on top of `baseline_json` and report what the
/// configured mode would send.
pub fn submit(config_json: &str, baseline_json: &str, values_json: &str) -> String {
    respond(load(config_json).and_then(|(config, form)| {
        let mut session = edited_session(&config, &form, baseline_json, values_json)?;
        let mut captured = CapturedSubmission::default();
        let response = match session.submit(&mut captured) {
            SubmitOutcome::Pristine => json!({ "status": "pristine" }),
            SubmitOutcome::Invalid(result) => json!({
                "status": "invalid",
                "validation": serde_json::to_value(result).map_err(ComponentError::JsonEncode)?,
            }),
            SubmitOutcome::Submitted(payload) => json!({
                "status": "submitted",
                "callback": captured.callback,
                "values": payload,
            }),
            SubmitOutcome::Failed(err) => json!({
                "status": "failed",
                "error": err.to_string(),
            }),
        };
        Ok(response)
    }))
}
