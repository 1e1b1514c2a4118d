use form_spec::{FieldKind, FieldNode, FieldType, ValidationResult};
use serde_json::{Map, Number, Value};

/// Controls which bits of state the fill prompt prints.
#[derive(Copy, Clone, Eq, PartialEq)]
pub enum Verbosity {
    /// Clean output: field prompts only.
    Clean,
    /// Verbose output: field keys, option values, error codes.
    Verbose,
}

impl Verbosity {
    pub fn from_verbose(verbose: bool) -> Self {
        if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Clean
        }
    }

    pub fn is_verbose(&self) -> bool {
        matches!(self, Verbosity::Verbose)
    }
}

/// Prints section headers, prompts and results of a fill session.
pub struct FillPresenter {
    verbosity: Verbosity,
}

impl FillPresenter {
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }

    pub fn show_section(&self, name: &str) {
        println!("== {} ==", name);
    }

    pub fn show_prompt(&self, prompt: &PromptContext) {
        let mut line = format!("{}/{} {}", prompt.index, prompt.total, prompt.title);
        if prompt.required {
            line.push_str(" *");
        }
        if let Some(hint) = &prompt.hint {
            line.push(' ');
            line.push_str(hint);
        }
        if self.verbosity.is_verbose() {
            line.push_str(&format!(" <{}>", prompt.key));
        }
        println!("{}", line);
        if let Some(description) = &prompt.description {
            println!("{}", description);
        }
        if !prompt.choices.is_empty() {
            println!("Choices: {}", prompt.choices.join(", "));
        }
    }

    pub fn show_parse_error(&self, error: &AnswerParseError) {
        eprintln!("Invalid answer: {}", error.user_message);
        if self.verbosity.is_verbose()
            && let Some(debug) = &error.debug_message
        {
            eprintln!("  Expected: {}", debug);
        }
    }

    pub fn show_validation(&self, result: &ValidationResult) {
        eprintln!("Please fix the following:");
        for error in &result.errors {
            let mut line = format!(
                " - {}: {}",
                error.path.as_deref().unwrap_or(""),
                error.message
            );
            if self.verbosity.is_verbose()
                && let Some(code) = &error.code
            {
                line.push_str(&format!(" [{}]", code));
            }
            eprintln!("{}", line);
        }
    }

    pub fn show_completion(&self, callback: &str, values: &Map<String, Value>) {
        println!("Done ✅");
        println!("{} payload:", callback);
        match serde_json::to_string_pretty(values) {
            Ok(pretty) => println!("{}", pretty),
            Err(err) => eprintln!("Failed to serialize values to JSON: {}", err),
        }
    }
}

/// Context used to format a single prompt.
pub struct PromptContext {
    pub index: usize,
    pub total: usize,
    pub key: String,
    pub title: String,
    pub description: Option<String>,
    pub required: bool,
    pub hint: Option<String>,
    pub choices: Vec<String>,
}

impl PromptContext {
    pub fn new(field: &FieldNode, index: usize, total: usize) -> Self {
        let title = if field.label.trim().is_empty() {
            field.name.clone()
        } else {
            field.label.clone()
        };
        Self {
            index,
            total,
            key: field.camel_case_name.clone(),
            title,
            description: field.description.clone(),
            required: is_required(field),
            hint: hint(field),
            choices: choice_labels(field),
        }
    }
}

fn is_required(field: &FieldNode) -> bool {
    match &field.kind {
        FieldKind::Number(number) => number.required,
        FieldKind::Date(date) => date.required,
        FieldKind::Select(choice) | FieldKind::Combobox(choice) => choice.required,
        FieldKind::RadioGroup(radio) => radio.required,
        FieldKind::Text(text) => text.rules.min_length.is_some_and(|min| min > 0),
        FieldKind::Textarea(text) => text.rules.min_length.is_some_and(|min| min > 0),
        _ => false,
    }
}

fn hint(field: &FieldNode) -> Option<String> {
    match field.field_type() {
        FieldType::Number => Some("(number)".to_string()),
        FieldType::Date => Some("(YYYY-MM-DD)".to_string()),
        FieldType::Switch => Some("(yes/no per option)".to_string()),
        FieldType::Array => Some("(JSON list of entries)".to_string()),
        _ => None,
    }
}

fn choice_labels(field: &FieldNode) -> Vec<String> {
    match &field.kind {
        FieldKind::Select(choice) | FieldKind::Combobox(choice) => choice
            .options
            .iter()
            .map(|option| format!("{} ({})", option.label, option.value))
            .collect(),
        FieldKind::RadioGroup(radio) => radio
            .options
            .iter()
            .map(|option| format!("{} ({})", option.label, option.value))
            .collect(),
        _ => Vec::new(),
    }
}

/// Error produced when parsing answers from the user.
#[derive(Debug)]
pub struct AnswerParseError {
    pub user_message: String,
    pub debug_message: Option<String>,
}

impl AnswerParseError {
    pub fn new(user_message: impl Into<String>, debug_message: Option<String>) -> Self {
        Self {
            user_message: user_message.into(),
            debug_message,
        }
    }
}

/// Convert one line of input into the value shape of `field`.
///
/// Switch fields are prompted option by option; see [`parse_boolean`].
pub fn parse_answer(field: &FieldNode, raw: &str) -> Result<Value, AnswerParseError> {
    let raw = raw.trim();
    match &field.kind {
        FieldKind::Text(_) | FieldKind::Textarea(_) => Ok(Value::String(raw.to_string())),
        FieldKind::Number(_) => {
            if raw.is_empty() {
                Ok(Value::Null)
            } else {
                parse_number(raw)
            }
        }
        FieldKind::Date(_) => {
            if raw.is_empty() {
                Ok(Value::Null)
            } else {
                Ok(Value::String(raw.to_string()))
            }
        }
        FieldKind::Select(choice) | FieldKind::Combobox(choice) => {
            let options: Vec<(&str, &str)> = choice
                .options
                .iter()
                .map(|option| (option.label.as_str(), option.value.as_str()))
                .collect();
            parse_choice(&options, raw)
        }
        FieldKind::RadioGroup(radio) => {
            let options: Vec<(&str, &str)> = radio
                .options
                .iter()
                .map(|option| (option.label.as_str(), option.value.as_str()))
                .collect();
            parse_choice(&options, raw)
        }
        FieldKind::Array(_) => parse_list(raw),
        FieldKind::Switch(_) | FieldKind::Title | FieldKind::Empty => Err(AnswerParseError::new(
            "This field does not take a typed answer.",
            None,
        )),
    }
}

pub fn parse_boolean(raw: &str) -> Result<bool, AnswerParseError> {
    match raw.trim().to_lowercase().as_str() {
        "false" | "f" | "no" | "n" | "0" => Ok(false),
        "true" | "t" | "yes" | "y" | "1" => Ok(true),
        _ => Err(AnswerParseError::new(
            "Please enter yes or no.",
            Some("expected boolean (y/n/true/false)".to_string()),
        )),
    }
}

fn parse_number(raw: &str) -> Result<Value, AnswerParseError> {
    if let Ok(integer) = raw.parse::<i64>() {
        return Ok(Value::Number(Number::from(integer)));
    }
    raw.parse::<f64>()
        .map_err(|_| {
            AnswerParseError::new(
                "Please enter a number.",
                Some("expected number".to_string()),
            )
        })
        .and_then(|value| {
            Number::from_f64(value).map(Value::Number).ok_or_else(|| {
                AnswerParseError::new(
                    "Please enter a finite number.",
                    Some("number must be finite".to_string()),
                )
            })
        })
}

fn parse_choice(options: &[(&str, &str)], raw: &str) -> Result<Value, AnswerParseError> {
    if raw.is_empty() {
        return Ok(Value::Null);
    }
    options
        .iter()
        .find(|(label, value)| *value == raw || label.eq_ignore_ascii_case(raw))
        .map(|(_, value)| Value::String(value.to_string()))
        .ok_or_else(|| {
            let allowed = options
                .iter()
                .map(|(_, value)| *value)
                .collect::<Vec<_>>()
                .join(", ");
            AnswerParseError::new(
                "Please pick one of the listed choices.",
                Some(format!("one of: {}", allowed)),
            )
        })
}

fn parse_list(raw: &str) -> Result<Value, AnswerParseError> {
    if raw.is_empty() {
        return Ok(Value::Array(Vec::new()));
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(value @ Value::Array(_)) => Ok(value),
        Ok(_) => Err(AnswerParseError::new(
            "Please enter a JSON list of entries.",
            Some("expected JSON array of objects".to_string()),
        )),
        Err(err) => Err(AnswerParseError::new(
            "Please enter a JSON list of entries.",
            Some(err.to_string()),
        )),
    }
}
