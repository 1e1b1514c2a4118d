use serde_json::{Map, Value, json};

use crate::schema::{FieldSchema, FormSchema};
use crate::spec::form::FormBuilderValue;

/// JSON Schema describing the values a form accepts.
pub fn generate(form: &FormBuilderValue) -> Value {
    object_schema(&FormSchema::from_form(form))
}

pub fn object_schema(schema: &FormSchema) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for entry in &schema.entries {
        let mut property = field_schema(&entry.schema);
        if let Some(object) = property.as_object_mut() {
            object.insert("title".into(), Value::String(entry.label.clone()));
            object.insert(
                "x-field-type".into(),
                Value::String(entry.field_type.as_str().into()),
            );
        }
        if is_required(&entry.schema) {
            required.push(Value::String(entry.key.clone()));
        }
        properties.insert(entry.key.clone(), property);
    }

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    })
}

fn is_required(schema: &FieldSchema) -> bool {
    match schema {
        FieldSchema::Text { .. } | FieldSchema::Switch { .. } | FieldSchema::Array { .. } => true,
        FieldSchema::Number { required, .. }
        | FieldSchema::Date { required }
        | FieldSchema::Choice { required, .. } => *required,
    }
}

fn field_schema(schema: &FieldSchema) -> Value {
    match schema {
        FieldSchema::Text {
            min_length,
            max_length,
        } => {
            let mut map = Map::new();
            map.insert("type".into(), json!("string"));
            if let Some(min) = min_length {
                map.insert("minLength".into(), json!(min));
            }
            if let Some(max) = max_length {
                map.insert("maxLength".into(), json!(max));
            }
            Value::Object(map)
        }
        FieldSchema::Number { required, rules } => {
            let mut map = Map::new();
            let base = if rules.integer { "integer" } else { "number" };
            map.insert("type".into(), nullable(base, *required));
            if let Some(bound) = rules.greater_than {
                map.insert("exclusiveMinimum".into(), json!(bound));
            }
            if let Some(bound) = rules.greater_than_or_equal_to {
                map.insert("minimum".into(), json!(bound));
            }
            if let Some(bound) = rules.less_than {
                map.insert("exclusiveMaximum".into(), json!(bound));
            }
            if let Some(bound) = rules.less_than_or_equal_to {
                map.insert("maximum".into(), json!(bound));
            }
            if rules.positive && rules.greater_than.is_none() {
                map.insert("exclusiveMinimum".into(), json!(0));
            }
            if rules.negative && rules.less_than.is_none() {
                map.insert("exclusiveMaximum".into(), json!(0));
            }
            Value::Object(map)
        }
        FieldSchema::Date { required } => json!({
            "type": nullable("string", *required),
            "format": "date",
        }),
        FieldSchema::Choice { required, values } => {
            let mut options: Vec<Value> = values.iter().cloned().map(Value::String).collect();
            if !required {
                options.push(Value::Null);
            }
            json!({
                "type": nullable("string", *required),
                "enum": options,
            })
        }
        FieldSchema::Switch { keys } => {
            let properties: Map<String, Value> = keys
                .iter()
                .map(|key| (key.clone(), json!({ "type": "boolean" })))
                .collect();
            json!({
                "type": "object",
                "properties": properties,
                "additionalProperties": false,
            })
        }
        FieldSchema::Array {
            min_items,
            max_items,
            item,
        } => {
            let mut map = Map::new();
            map.insert("type".into(), json!("array"));
            map.insert("items".into(), object_schema(item));
            if let Some(min) = min_items {
                map.insert("minItems".into(), json!(min));
            }
            if let Some(max) = max_items {
                map.insert("maxItems".into(), json!(max));
            }
            Value::Object(map)
        }
    }
}

fn nullable(kind: &str, required: bool) -> Value {
    if required {
        json!(kind)
    } else {
        json!([kind, "null"])
    }
}
