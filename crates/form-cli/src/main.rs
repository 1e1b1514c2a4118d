pub mod builder;

mod wizard;

use builder::{apply_script, read_actions, read_config, read_form, read_values, write_json};
use clap::{Parser, Subcommand, ValueEnum};
use component_form_builder::{
    render_builder_ui as component_builder_ui, render_preview as component_preview,
    render_text as component_text,
};
use form_spec::{
    CallbackError, FieldKind, FieldNode, FormBuilderValue, FormCallbacks, FormSchema,
    FormSession, SubmitOutcome, ValidationResult, check_definition, definition_schema,
    derive_defaults, validate, values_schema,
};
use serde_json::{Map, Value};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use wizard::{FillPresenter, PromptContext, Verbosity, parse_answer, parse_boolean};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Form builder CLI",
    long_about = "Checks, edits, renders and fills form builder documents"
)]
struct Cli {
    /// Show debug logs and extra prompt details.
    #[arg(long, global = true, alias = "debug")]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum RenderFormat {
    /// Indented outline of sections and fields.
    Text,
    /// Preview widgets with values and errors.
    Json,
    /// Builder canvas with palette, cards and drop targets.
    Builder,
}

#[derive(Subcommand)]
enum Command {
    /// Report structural problems in a form document.
    Check {
        /// Path to the form document (sectioned or legacy shape).
        #[arg(long, value_name = "FORM")]
        form: PathBuf,
    },
    /// Print the default values derived from a form.
    Defaults {
        #[arg(long, value_name = "FORM")]
        form: PathBuf,
        /// Write the defaults to this file instead of stdout.
        #[arg(long, value_name = "OUT")]
        out: Option<PathBuf>,
    },
    /// Print the JSON Schema of a form's values, or of form documents.
    Schema {
        #[arg(long, value_name = "FORM", required_unless_present = "definition")]
        form: Option<PathBuf>,
        /// Emit the schema of the form document format itself.
        #[arg(long, conflicts_with = "form")]
        definition: bool,
        #[arg(long, value_name = "OUT")]
        out: Option<PathBuf>,
    },
    /// Validate a values file against a form.
    Validate {
        #[arg(long, value_name = "FORM")]
        form: PathBuf,
        /// Path to the values JSON object.
        #[arg(long, value_name = "VALUES")]
        values: PathBuf,
    },
    /// Render a form for display.
    Render {
        #[arg(long, value_name = "FORM")]
        form: PathBuf,
        /// Optional values typed into the preview.
        #[arg(long, value_name = "VALUES")]
        values: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = RenderFormat::Text)]
        format: RenderFormat,
    },
    /// Replay builder actions against a form and emit the edited document.
    Apply {
        #[arg(long, value_name = "FORM")]
        form: PathBuf,
        /// JSON file holding one action or a list of actions.
        #[arg(long, value_name = "ACTIONS")]
        actions: PathBuf,
        #[arg(long, value_name = "OUT")]
        out: Option<PathBuf>,
    },
    /// Fill a form interactively and submit it.
    Fill {
        #[arg(long, value_name = "FORM")]
        form: PathBuf,
        /// Fill session config (mode, debounce).
        #[arg(long, value_name = "CONFIG")]
        config: Option<PathBuf>,
        /// Existing record to edit; fields start from these values.
        #[arg(long, value_name = "VALUES")]
        values: Option<PathBuf>,
    },
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Command::Check { form } => run_check(form),
        Command::Defaults { form, out } => run_defaults(form, out),
        Command::Schema {
            form,
            definition,
            out,
        } => run_schema(form, definition, out),
        Command::Validate { form, values } => run_validate(form, values),
        Command::Render {
            form,
            values,
            format,
        } => run_render(form, values, format),
        Command::Apply { form, actions, out } => run_apply(form, actions, out),
        Command::Fill {
            form,
            config,
            values,
        } => run_fill(form, config, values, cli.verbose),
    }
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn run_check(form_path: PathBuf) -> CliResult<()> {
    let source = fs::read_to_string(&form_path)?;
    let form = FormBuilderValue::from_json(&source)?;
    let issues = check_definition(&form);
    if issues.is_empty() {
        println!(
            "Form OK: {} section(s), {} field(s)",
            form.sections.len(),
            form.top_level_fields().count()
        );
        return Ok(());
    }

    println!("Form has {} problem(s):", issues.len());
    for issue in &issues {
        let location = issue
            .field_id
            .as_deref()
            .or(issue.section.as_deref())
            .unwrap_or("form");
        println!("  {} [{}] {}", location, issue.code, issue.message);
    }
    Err("form definition check failed".into())
}

fn run_defaults(form_path: PathBuf, out: Option<PathBuf>) -> CliResult<()> {
    let loaded = read_form(&form_path)?;
    let defaults = derive_defaults(&loaded.form);
    write_json(out.as_deref(), &Value::Object(defaults))
}

fn run_schema(
    form_path: Option<PathBuf>,
    definition: bool,
    out: Option<PathBuf>,
) -> CliResult<()> {
    let schema = if definition {
        definition_schema()
    } else {
        let form_path = form_path.ok_or("pass --form or --definition")?;
        values_schema(&read_form(&form_path)?.form)
    };
    write_json(out.as_deref(), &schema)
}

fn run_validate(form_path: PathBuf, values_path: PathBuf) -> CliResult<()> {
    let loaded = read_form(&form_path)?;
    let values_json = fs::read_to_string(values_path)?;
    let values: Value = serde_json::from_str(&values_json)?;

    let result = validate(&FormSchema::from_form(&loaded.form), &values);
    println!(
        "Validation result: {}",
        if result.valid { "valid" } else { "invalid" }
    );
    describe_validation(&result);

    if result.valid {
        Ok(())
    } else {
        Err("validation failed".into())
    }
}

fn describe_validation(result: &ValidationResult) {
    if !result.errors.is_empty() {
        println!("Errors:");
        for error in &result.errors {
            println!(
                "  {} - {}",
                error.path.as_deref().unwrap_or("/"),
                error.message
            );
        }
    }
    if !result.unknown_fields.is_empty() {
        println!("Unknown fields: {}", result.unknown_fields.join(", "));
    }
}

fn run_render(
    form_path: PathBuf,
    values: Option<PathBuf>,
    format: RenderFormat,
) -> CliResult<()> {
    let loaded = read_form(&form_path)?;
    let config = loaded.component_config(&Default::default());
    let values_json = serde_json::to_string(&read_values(values.as_deref())?)?;
    let output = match format {
        RenderFormat::Text => component_text(&config, &values_json),
        RenderFormat::Json => pretty(&component_preview(&config, &values_json))?,
        RenderFormat::Builder => pretty(&component_builder_ui(&config))?,
    };
    println!("{}", output);
    Ok(())
}

fn pretty(payload: &str) -> CliResult<String> {
    let value: Value = serde_json::from_str(payload)?;
    if let Some(error) = value.get("error").and_then(Value::as_str) {
        return Err(error.to_string().into());
    }
    Ok(serde_json::to_string_pretty(&value)?)
}

fn run_apply(
    form_path: PathBuf,
    actions_path: PathBuf,
    out: Option<PathBuf>,
) -> CliResult<()> {
    let loaded = read_form(&form_path)?;
    let actions = read_actions(&actions_path)?;
    let (tree, applied) = apply_script(loaded.form, &actions);
    eprintln!("Applied {} of {} action(s).", applied, actions.len());
    write_json(out.as_deref(), &serde_json::to_value(&tree)?)
}

/// Prints what a real backend would receive on submission.
#[derive(Default)]
struct SubmissionPrinter {
    callback: Option<&'static str>,
}

impl FormCallbacks for SubmissionPrinter {
    fn on_create(&mut self, _values: &Map<String, Value>) -> Result<(), CallbackError> {
        self.callback = Some("on_create");
        Ok(())
    }

    fn on_update(&mut self, _changed: &Map<String, Value>) -> Result<(), CallbackError> {
        self.callback = Some("on_update");
        Ok(())
    }
}

fn run_fill(
    form_path: PathBuf,
    config_path: Option<PathBuf>,
    values_path: Option<PathBuf>,
    verbose: bool,
) -> CliResult<()> {
    let loaded = read_form(&form_path)?;
    let config = read_config(config_path.as_deref())?;
    let baseline = read_values(values_path.as_deref())?;
    let mut session = FormSession::with_values(&loaded.form, config, &baseline);
    let presenter = FillPresenter::new(Verbosity::from_verbose(verbose));

    let prompts: Vec<(&str, &FieldNode)> = loaded
        .form
        .sections
        .iter()
        .flat_map(|section| {
            section
                .fields
                .iter()
                .filter(|field| field.field_type().holds_value())
                .map(move |field| (section.name.as_str(), field))
        })
        .collect();
    let total = prompts.len();
    let mut pending: Vec<usize> = (0..total).collect();
    info!(fields = total, mode = ?session.config().mode, "fill started");

    loop {
        let mut current_section = None;
        for &index in &pending {
            let (section, field) = prompts[index];
            if current_section != Some(section) {
                presenter.show_section(section);
                current_section = Some(section);
            }
            let current = session.values().get(&field.camel_case_name).cloned();
            let value = prompt_field(&presenter, field, index + 1, total, current.as_ref())?;
            session.set_value(&field.camel_case_name, value, Instant::now());
        }

        let mut printer = SubmissionPrinter::default();
        match session.submit(&mut printer) {
            SubmitOutcome::Pristine => {
                println!("Nothing changed; nothing to submit.");
                return Ok(());
            }
            SubmitOutcome::Submitted(payload) => {
                presenter.show_completion(printer.callback.unwrap_or("submit"), &payload);
                return Ok(());
            }
            SubmitOutcome::Failed(err) => return Err(err.into()),
            SubmitOutcome::Invalid(result) => {
                presenter.show_validation(&result);
                pending = (0..total)
                    .filter(|&index| {
                        let key = prompts[index].1.camel_case_name.as_str();
                        result.errors_for(key).next().is_some()
                    })
                    .collect();
                debug!(retry = pending.len(), "re-prompting invalid fields");
                if pending.is_empty() {
                    return Err("values failed validation".into());
                }
            }
        }
    }
}

fn prompt_field(
    presenter: &FillPresenter,
    field: &FieldNode,
    index: usize,
    total: usize,
    current: Option<&Value>,
) -> CliResult<Value> {
    let context = PromptContext::new(field, index, total);
    presenter.show_prompt(&context);

    if let FieldKind::Switch(switch) = &field.kind {
        let mut flags = Map::new();
        for option in &switch.options {
            let on = current
                .and_then(|value| value.get(&option.camel_case_name))
                .and_then(Value::as_bool)
                .unwrap_or(false);
            let title = if option.label.is_empty() {
                &option.name
            } else {
                &option.label
            };
            let flag = prompt_bool(title, on)?;
            flags.insert(option.camel_case_name.clone(), Value::Bool(flag));
        }
        return Ok(Value::Object(flags));
    }

    let default = current.and_then(display_value);
    loop {
        let raw = prompt_line(">", default.as_deref())?;
        match parse_answer(field, &raw) {
            Ok(value) => return Ok(value),
            Err(err) => presenter.show_parse_error(&err),
        }
    }
}

fn display_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) if text.is_empty() => None,
        Value::String(text) => Some(text.clone()),
        Value::Array(items) if items.is_empty() => None,
        other => Some(other.to_string()),
    }
}

fn prompt_line(prompt: &str, default: Option<&str>) -> CliResult<String> {
    if let Some(default_value) = default {
        print!("{} [{}]: ", prompt, default_value);
    } else {
        print!("{}: ", prompt);
    }
    io::stdout().flush()?;
    let mut line = String::new();
    if io::stdin().read_line(&mut line)? == 0 {
        return Err("input closed before the form was complete".into());
    }
    let trimmed = line.trim();
    if trimmed.is_empty() {
        Ok(default.unwrap_or_default().to_string())
    } else {
        Ok(trimmed.to_string())
    }
}

fn prompt_bool(prompt: &str, default: bool) -> CliResult<bool> {
    let prompt_text = format!("{} (y/n)", prompt.trim());
    let default_hint = if default { "Y" } else { "N" };
    loop {
        let line = prompt_line(&prompt_text, Some(default_hint))?;
        match parse_boolean(&line) {
            Ok(flag) => return Ok(flag),
            Err(err) => println!("Invalid answer '{}'. {}", line, err.user_message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_cmd::Command;
    use assert_fs::TempDir;
    use assert_fs::prelude::*;
    use serde_json::json;
    use std::path::Path;

    fn fixture(name: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../form-spec/tests/fixtures")
            .join(name)
    }

    fn cli() -> Command {
        Command::cargo_bin("form-builder").expect("binary exists")
    }

    fn stdout_of(output: &std::process::Output) -> String {
        String::from_utf8_lossy(&output.stdout).into_owned()
    }

    #[test]
    fn parse_answer_number_keeps_integers() {
        let field = FieldNode::new("Age", form_spec::FieldType::Number.default_kind());
        assert_eq!(parse_answer(&field, "42").expect("number"), json!(42));
        assert_eq!(parse_answer(&field, "").expect("blank"), Value::Null);
        assert!(parse_answer(&field, "forty").is_err());
    }

    #[test]
    fn parse_answer_choice_accepts_label_or_value() {
        let form = FormBuilderValue::from_json(
            &fs::read_to_string(fixture("contact_form.json")).expect("fixture"),
        )
        .expect("form");
        let country = form.find_field("f-country").expect("country");
        let FieldKind::Select(choice) = &country.kind else {
            panic!("country is a select");
        };
        let label = choice.options[1].label.clone();
        assert_eq!(
            parse_answer(country, &label.to_uppercase()).expect("label"),
            json!("se")
        );
        assert_eq!(parse_answer(country, "no").expect("value"), json!("no"));
        assert!(parse_answer(country, "dk").is_err());
    }

    #[test]
    fn parse_boolean_accepts_yes() {
        assert!(parse_boolean("yes").expect("bool"));
        assert!(!parse_boolean("N").expect("bool"));
        assert!(parse_boolean("maybe").is_err());
    }

    #[test]
    fn display_value_hides_blank_values() {
        assert_eq!(display_value(&Value::Null), None);
        assert_eq!(display_value(&json!("")), None);
        assert_eq!(display_value(&json!(3)), Some("3".into()));
    }

    #[test]
    fn check_reports_ok_form() {
        let output = cli()
            .args(["check", "--form"])
            .arg(fixture("contact_form.json"))
            .output()
            .expect("run");
        assert!(output.status.success());
        assert!(stdout_of(&output).contains("Form OK: 2 section(s)"));
    }

    #[test]
    fn check_fails_on_broken_form() {
        let output = cli()
            .args(["check", "--form"])
            .arg(fixture("broken_form.json"))
            .output()
            .expect("run");
        assert!(!output.status.success());
        let stdout = stdout_of(&output);
        assert!(stdout.contains("problem(s)"));
        assert!(stdout.contains("dup"));
    }

    #[test]
    fn defaults_are_written_to_file() {
        let temp = TempDir::new().expect("temp dir");
        let out = temp.child("defaults.json");
        cli()
            .args(["defaults", "--form"])
            .arg(fixture("legacy_form.json"))
            .arg("--out")
            .arg(out.path())
            .assert()
            .success();
        let written: Value =
            serde_json::from_str(&fs::read_to_string(out.path()).expect("read")).expect("json");
        assert_eq!(written["plan"], json!("basic"));
        assert_eq!(written["email"], json!(""));
    }

    #[test]
    fn schema_definition_needs_no_form() {
        let output = cli()
            .args(["schema", "--definition"])
            .output()
            .expect("run");
        assert!(output.status.success());
        let schema: Value = serde_json::from_slice(&output.stdout).expect("json");
        assert!(schema.is_object());
    }

    #[test]
    fn validate_exits_non_zero_on_invalid_values() {
        let temp = TempDir::new().expect("temp dir");
        let values = temp.child("values.json");
        values
            .write_str(&json!({ "fullName": "Jo", "age": 10, "country": "no" }).to_string())
            .expect("write values");

        let output = cli()
            .args(["validate", "--form"])
            .arg(fixture("contact_form.json"))
            .arg("--values")
            .arg(values.path())
            .output()
            .expect("run");
        assert!(!output.status.success());
        let stdout = stdout_of(&output);
        assert!(stdout.contains("Validation result: invalid"));
        assert!(stdout.contains("/age"));
    }

    #[test]
    fn render_text_outlines_sections() {
        let output = cli()
            .args(["render", "--form"])
            .arg(fixture("contact_form.json"))
            .output()
            .expect("run");
        assert!(output.status.success());
        let stdout = stdout_of(&output);
        assert!(stdout.contains("Section: Contact"));
        assert!(stdout.contains("Section: Extra"));
    }

    #[test]
    fn render_builder_emits_palette() {
        let output = cli()
            .args(["render", "--format", "builder", "--form"])
            .arg(fixture("contact_form.json"))
            .output()
            .expect("run");
        assert!(output.status.success());
        let ui: Value = serde_json::from_slice(&output.stdout).expect("json");
        assert_eq!(ui["palette"].as_array().map(Vec::len), Some(10));
    }

    #[test]
    fn apply_replays_actions_into_output_file() {
        let temp = TempDir::new().expect("temp dir");
        let actions = temp.child("actions.json");
        actions
            .write_str(
                &json!([
                    { "action": "create_section", "name": "Billing" },
                    { "action": "create_section", "name": "Billing" },
                    { "action": "create_field", "section_index": 2, "name": "Invoice Email" }
                ])
                .to_string(),
            )
            .expect("write actions");
        let out = temp.child("edited.json");

        let output = cli()
            .args(["apply", "--form"])
            .arg(fixture("contact_form.json"))
            .arg("--actions")
            .arg(actions.path())
            .arg("--out")
            .arg(out.path())
            .output()
            .expect("run");
        assert!(output.status.success());
        assert!(String::from_utf8_lossy(&output.stderr).contains("Applied 2 of 3"));

        let edited: Value =
            serde_json::from_str(&fs::read_to_string(out.path()).expect("read")).expect("json");
        assert_eq!(edited["sections"][2]["name"], "Billing");
        assert_eq!(
            edited["sections"][2]["fields"][0]["camelCaseName"],
            "invoiceEmail"
        );
    }

    #[test]
    fn fill_submits_legacy_form_in_create_mode() {
        let output = cli()
            .args(["fill", "--form"])
            .arg(fixture("legacy_form.json"))
            .write_stdin("ana@example.com\n\n\n")
            .output()
            .expect("run");
        assert!(output.status.success());
        let stdout = stdout_of(&output);
        assert!(stdout.contains("== Form =="));
        assert!(stdout.contains("on_create payload:"));
        assert!(stdout.contains("\"email\": \"ana@example.com\""));
        assert!(stdout.contains("\"plan\": \"basic\""));
    }

    #[test]
    fn fill_reprompts_invalid_fields() {
        let output = cli()
            .args(["fill", "--form"])
            .arg(fixture("legacy_form.json"))
            .write_stdin("ab\n\n\nabc\n")
            .output()
            .expect("run");
        assert!(output.status.success());
        assert!(String::from_utf8_lossy(&output.stderr).contains("Please fix the following"));
        assert!(stdout_of(&output).contains("\"email\": \"abc\""));
    }

    #[test]
    fn fill_update_mode_sends_changes_only() {
        let temp = TempDir::new().expect("temp dir");
        let config = temp.child("config.json");
        config
            .write_str(r#"{ "mode": "update" }"#)
            .expect("write config");
        let values = temp.child("record.json");
        values
            .write_str(
                &json!({ "email": "old@example.com", "startDate": null, "plan": "basic" })
                    .to_string(),
            )
            .expect("write record");

        let output = cli()
            .args(["fill", "--form"])
            .arg(fixture("legacy_form.json"))
            .arg("--config")
            .arg(config.path())
            .arg("--values")
            .arg(values.path())
            .write_stdin("\n\npro\n")
            .output()
            .expect("run");
        assert!(output.status.success());
        let stdout = stdout_of(&output);
        assert!(stdout.contains("on_update payload:"));
        assert!(stdout.contains("\"plan\": \"pro\""));
        assert!(!stdout.contains("old@example.com\","));
    }

    #[test]
    fn fill_fails_when_input_runs_out() {
        cli()
            .args(["fill", "--form"])
            .arg(fixture("legacy_form.json"))
            .write_stdin("")
            .assert()
            .failure();
    }
}
