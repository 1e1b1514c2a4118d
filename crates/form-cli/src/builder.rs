use std::fs;
use std::path::Path;

use form_spec::{BuilderAction, FormBuilder, FormBuilderValue, FormConfig, load_form};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::{debug, info};

use super::CliResult;

/// A form document read from disk, kept alongside its source text for the
/// component entry points.
pub struct LoadedForm {
    pub source: String,
    pub form: FormBuilderValue,
}

impl LoadedForm {
    /// Component config carrying this form.
    pub fn component_config(&self, config: &FormConfig) -> String {
        json!({
            "form_json": self.source,
            "form_config": config,
        })
        .to_string()
    }
}

pub fn read_form(path: &Path) -> CliResult<LoadedForm> {
    let source = fs::read_to_string(path)?;
    let form = load_form(&source)?;
    debug!(path = %path.display(), sections = form.sections.len(), "form loaded");
    Ok(LoadedForm { source, form })
}

pub fn read_values(path: Option<&Path>) -> CliResult<Map<String, Value>> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path)?;
            Ok(form_spec::parse_values(&text)?)
        }
        None => Ok(Map::new()),
    }
}

pub fn read_config(path: Option<&Path>) -> CliResult<FormConfig> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path)?;
            Ok(serde_json::from_str(&text)?)
        }
        None => Ok(FormConfig::default()),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ActionScript {
    Many(Vec<BuilderAction>),
    One(BuilderAction),
}

/// Read a builder action, or a list of them, from a JSON file.
pub fn read_actions(path: &Path) -> CliResult<Vec<BuilderAction>> {
    let text = fs::read_to_string(path)?;
    let script: ActionScript = serde_json::from_str(&text)?;
    Ok(match script {
        ActionScript::Many(actions) => actions,
        ActionScript::One(action) => vec![action],
    })
}

/// Replay `actions` against `form`; returns the edited tree and how many
/// actions changed it.
pub fn apply_script(
    form: FormBuilderValue,
    actions: &[BuilderAction],
) -> (FormBuilderValue, usize) {
    let mut builder = FormBuilder::new(form);
    let applied = builder.apply_all(actions);
    info!(
        applied,
        skipped = actions.len() - applied,
        revision = builder.revision(),
        "action script replayed"
    );
    (builder.into_tree(), applied)
}

/// Pretty-print `value` to `out`, or to stdout when no path is given.
pub fn write_json(out: Option<&Path>, value: &Value) -> CliResult<()> {
    let pretty = serde_json::to_string_pretty(value)?;
    match out {
        Some(path) => {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, format!("{}\n", pretty))?;
            debug!(path = %path.display(), "json written");
        }
        None => println!("{}", pretty),
    }
    Ok(())
}
