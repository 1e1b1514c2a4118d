use serde_json::{Map, Number, Value};

use crate::spec::field::{FieldKind, FieldNode};
use crate::spec::form::FormBuilderValue;

/// Default value of every value-holding field, keyed by camelCaseName.
///
/// The first field claiming a key wins, matching schema derivation.
pub fn derive_defaults(form: &FormBuilderValue) -> Map<String, Value> {
    defaults_for(form.top_level_fields())
}

pub fn defaults_for<'a>(fields: impl IntoIterator<Item = &'a FieldNode>) -> Map<String, Value> {
    let mut map = Map::new();
    for field in fields {
        if field.camel_case_name.is_empty() || map.contains_key(&field.camel_case_name) {
            continue;
        }
        if let Some(value) = default_value(field) {
            map.insert(field.camel_case_name.clone(), value);
        }
    }
    map
}

/// Baseline for one node; `None` for nodes that hold no value.
pub fn default_value(field: &FieldNode) -> Option<Value> {
    let value = match &field.kind {
        FieldKind::Text(_) | FieldKind::Textarea(_) => Value::String(String::new()),
        FieldKind::Number(number) => number
            .default_value
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        FieldKind::Date(date) => date
            .default_value
            .clone()
            .map(Value::String)
            .unwrap_or(Value::Null),
        FieldKind::Select(choice) | FieldKind::Combobox(choice) => choice
            .default_value
            .clone()
            .map(Value::String)
            .unwrap_or(Value::Null),
        FieldKind::RadioGroup(radio) => radio
            .default_value
            .clone()
            .map(Value::String)
            .unwrap_or(Value::Null),
        FieldKind::Switch(switch) => Value::Object(
            switch
                .options
                .iter()
                .map(|option| (option.camel_case_name.clone(), Value::Bool(false)))
                .collect(),
        ),
        FieldKind::Array(_) => Value::Array(Vec::new()),
        FieldKind::Title | FieldKind::Empty => return None,
    };
    Some(value)
}

/// One row of an array-field populated with its children's defaults.
pub fn array_row_defaults(field: &FieldNode) -> Option<Map<String, Value>> {
    field.children().map(defaults_for)
}
