use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::numeric::{count_digits, round};
use crate::schema::{FieldSchema, FormSchema, SchemaEntry};
use crate::spec::field::NumberRules;

static NULL: Value = Value::Null;

/// A single field-level failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(default)]
    pub errors: Vec<ValidationError>,
    #[serde(default)]
    pub unknown_fields: Vec<String>,
}

impl ValidationResult {
    /// Errors attached to the top-level key `field`.
    pub fn errors_for<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a ValidationError> {
        self.errors
            .iter()
            .filter(move |error| error.field.as_deref() == Some(field))
    }
}

/// Validate `values` against `schema`.
pub fn validate(schema: &FormSchema, values: &Value) -> ValidationResult {
    match parse(schema, values) {
        Ok(_) => ValidationResult {
            valid: true,
            ..ValidationResult::default()
        },
        Err(result) => result,
    }
}

/// Validate `values` and return the parsed output, with rounding rules
/// applied and missing switch options filled in.
pub fn parse(schema: &FormSchema, values: &Value) -> Result<Value, ValidationResult> {
    let mut errors = Vec::new();
    let mut unknown_fields = Vec::new();

    let Some(map) = values.as_object() else {
        errors.push(ValidationError {
            field: None,
            path: Some(String::new()),
            message: "expected an object of field values".into(),
            code: Some("type_mismatch".into()),
        });
        return Err(ValidationResult {
            valid: false,
            errors,
            unknown_fields,
        });
    };

    let output = parse_object(schema, map, "", None, &mut errors, &mut unknown_fields);

    if errors.is_empty() && unknown_fields.is_empty() {
        Ok(Value::Object(output))
    } else {
        Err(ValidationResult {
            valid: false,
            errors,
            unknown_fields,
        })
    }
}

fn parse_object(
    schema: &FormSchema,
    map: &Map<String, Value>,
    prefix: &str,
    root_field: Option<&str>,
    errors: &mut Vec<ValidationError>,
    unknown_fields: &mut Vec<String>,
) -> Map<String, Value> {
    let mut output = Map::new();
    for entry in &schema.entries {
        let value = map.get(&entry.key).unwrap_or(&NULL);
        let path = format!("{}/{}", prefix, entry.key);
        let field = root_field.unwrap_or(entry.key.as_str());
        let ctx = Ctx { entry, path, field };
        match parse_value(&ctx, value, errors, unknown_fields) {
            Ok(parsed) => {
                output.insert(entry.key.clone(), parsed);
            }
            Err(error) => errors.push(error),
        }
    }
    for key in map.keys() {
        if schema.get(key).is_none() {
            unknown_fields.push(format!("{}/{}", prefix, key));
        }
    }
    output
}

struct Ctx<'a> {
    entry: &'a SchemaEntry,
    path: String,
    field: &'a str,
}

impl Ctx<'_> {
    fn error(&self, message: impl Into<String>, code: &str) -> ValidationError {
        ValidationError {
            field: Some(self.field.to_string()),
            path: Some(self.path.clone()),
            message: message.into(),
            code: Some(code.into()),
        }
    }

    fn required(&self) -> ValidationError {
        self.error(format!("{} is required", self.entry.label), "required")
    }

    fn mismatch(&self, expected: &str) -> ValidationError {
        self.error(format!("Expected {}", expected), "type_mismatch")
    }
}

fn parse_value(
    ctx: &Ctx<'_>,
    value: &Value,
    errors: &mut Vec<ValidationError>,
    unknown_fields: &mut Vec<String>,
) -> Result<Value, ValidationError> {
    match &ctx.entry.schema {
        FieldSchema::Text {
            min_length,
            max_length,
        } => parse_text(ctx, value, *min_length, *max_length),
        FieldSchema::Number { required, rules } => parse_number(ctx, value, *required, rules),
        FieldSchema::Date { required } => parse_date(ctx, value, *required),
        FieldSchema::Choice { required, values } => parse_choice(ctx, value, *required, values),
        FieldSchema::Switch { keys } => parse_switch(ctx, value, keys),
        FieldSchema::Array {
            min_items,
            max_items,
            item,
        } => {
            let Some(rows) = value.as_array() else {
                return Err(ctx.mismatch("a list of entries"));
            };
            if let Some(min) = min_items
                && rows.len() < *min as usize
            {
                return Err(ctx.error(format!("Add at least {} entries", min), "min_items"));
            }
            if let Some(max) = max_items
                && rows.len() > *max as usize
            {
                return Err(ctx.error(format!("Add at most {} entries", max), "max_items"));
            }
            let mut parsed_rows = Vec::with_capacity(rows.len());
            for (idx, row) in rows.iter().enumerate() {
                let row_path = format!("{}/{}", ctx.path, idx);
                match row.as_object() {
                    Some(row_map) => {
                        let parsed = parse_object(
                            item,
                            row_map,
                            &row_path,
                            Some(ctx.field),
                            errors,
                            unknown_fields,
                        );
                        parsed_rows.push(Value::Object(parsed));
                    }
                    None => errors.push(ValidationError {
                        field: Some(ctx.field.to_string()),
                        path: Some(row_path),
                        message: "Expected an entry object".into(),
                        code: Some("type_mismatch".into()),
                    }),
                }
            }
            Ok(Value::Array(parsed_rows))
        }
    }
}

fn parse_text(
    ctx: &Ctx<'_>,
    value: &Value,
    min_length: Option<u32>,
    max_length: Option<u32>,
) -> Result<Value, ValidationError> {
    let text = match value {
        Value::String(text) => text,
        Value::Null => return Err(ctx.required()),
        _ => return Err(ctx.mismatch("text")),
    };
    let length = text.chars().count();
    if let Some(min) = min_length
        && length < min as usize
    {
        return Err(ctx.error(
            format!("Must be at least {} characters", min),
            "min_length",
        ));
    }
    if let Some(max) = max_length
        && length > max as usize
    {
        return Err(ctx.error(
            format!("Must be at most {} characters", max),
            "max_length",
        ));
    }
    Ok(value.clone())
}

fn parse_number(
    ctx: &Ctx<'_>,
    value: &Value,
    required: bool,
    rules: &NumberRules,
) -> Result<Value, ValidationError> {
    let raw = match value {
        Value::Number(number) => number.as_f64().ok_or_else(|| ctx.mismatch("a number"))?,
        Value::Null if required => return Err(ctx.required()),
        Value::Null => return Ok(Value::Null),
        _ => return Err(ctx.mismatch("a number")),
    };

    let number = match rules.rounding {
        Some(mode) => round(raw, rules.precision.unwrap_or(0), mode),
        None => raw,
    };

    if rules.integer && number.fract() != 0.0 {
        return Err(ctx.error("Must be a whole number", "integer"));
    }
    if rules.positive && number <= 0.0 {
        return Err(ctx.error("Must be positive", "positive"));
    }
    if rules.negative && number >= 0.0 {
        return Err(ctx.error("Must be negative", "negative"));
    }
    if let Some(bound) = rules.greater_than
        && number <= bound
    {
        return Err(ctx.error(format!("Must be greater than {}", bound), "greater_than"));
    }
    if let Some(bound) = rules.greater_than_or_equal_to
        && number < bound
    {
        return Err(ctx.error(
            format!("Must be greater than or equal to {}", bound),
            "greater_than_or_equal_to",
        ));
    }
    if let Some(bound) = rules.less_than
        && number >= bound
    {
        return Err(ctx.error(format!("Must be less than {}", bound), "less_than"));
    }
    if let Some(bound) = rules.less_than_or_equal_to
        && number > bound
    {
        return Err(ctx.error(
            format!("Must be less than or equal to {}", bound),
            "less_than_or_equal_to",
        ));
    }
    if let Some(digits) = rules.exact_digits
        && count_digits(number) != digits as usize
    {
        return Err(ctx.error(
            format!("Must have exactly {} digits", digits),
            "exact_digits",
        ));
    }

    if rules.rounding.is_none() {
        return Ok(value.clone());
    }
    Number::from_f64(number)
        .map(Value::Number)
        .ok_or_else(|| ctx.mismatch("a finite number"))
}

fn parse_date(ctx: &Ctx<'_>, value: &Value, required: bool) -> Result<Value, ValidationError> {
    match value {
        Value::Null => {
            if required {
                Err(ctx.required())
            } else {
                Ok(Value::Null)
            }
        }
        Value::String(text) if text.trim().is_empty() => {
            if required {
                Err(ctx.required())
            } else {
                Ok(Value::Null)
            }
        }
        Value::String(text) => {
            let parsed = NaiveDate::parse_from_str(text, "%Y-%m-%d").is_ok()
                || DateTime::parse_from_rfc3339(text).is_ok();
            if parsed {
                Ok(value.clone())
            } else {
                Err(ctx.error("Expected a date (YYYY-MM-DD)", "invalid_date"))
            }
        }
        _ => Err(ctx.mismatch("a date")),
    }
}

fn parse_choice(
    ctx: &Ctx<'_>,
    value: &Value,
    required: bool,
    values: &[String],
) -> Result<Value, ValidationError> {
    match value {
        Value::Null => {
            if required {
                Err(ctx.required())
            } else {
                Ok(Value::Null)
            }
        }
        Value::String(text) if text.is_empty() && required => Err(ctx.required()),
        Value::String(text) if text.is_empty() => Ok(Value::Null),
        Value::String(text) => {
            if values.iter().any(|candidate| candidate == text) {
                Ok(value.clone())
            } else {
                Err(ctx.error("Select one of the available options", "invalid_option"))
            }
        }
        _ => Err(ctx.mismatch("an option value")),
    }
}

fn parse_switch(ctx: &Ctx<'_>, value: &Value, keys: &[String]) -> Result<Value, ValidationError> {
    let empty = Map::new();
    let map = match value {
        Value::Object(map) => map,
        Value::Null => &empty,
        _ => return Err(ctx.mismatch("a set of toggles")),
    };
    let mut output = Map::new();
    for key in keys {
        match map.get(key) {
            None | Some(Value::Null) => {
                output.insert(key.clone(), Value::Bool(false));
            }
            Some(Value::Bool(flag)) => {
                output.insert(key.clone(), Value::Bool(*flag));
            }
            Some(_) => {
                return Err(ValidationError {
                    field: Some(ctx.field.to_string()),
                    path: Some(format!("{}/{}", ctx.path, key)),
                    message: "Expected true or false".into(),
                    code: Some("type_mismatch".into()),
                });
            }
        }
    }
    Ok(Value::Object(output))
}
