use std::collections::HashSet;

use serde_json::{Map, Value};
use tracing::warn;

use crate::defaults::default_value;
use crate::spec::field::{FieldKind, FieldNode, FieldType, NumberRules};
use crate::spec::form::FormBuilderValue;

/// Validator for a single value, one variant per value-holding field type.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldSchema {
    Text {
        min_length: Option<u32>,
        max_length: Option<u32>,
    },
    Number {
        required: bool,
        rules: NumberRules,
    },
    Date {
        required: bool,
    },
    Choice {
        required: bool,
        values: Vec<String>,
    },
    Switch {
        keys: Vec<String>,
    },
    Array {
        min_items: Option<u32>,
        max_items: Option<u32>,
        item: FormSchema,
    },
}

/// Schema entry bound to the camelCaseName it validates.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaEntry {
    pub key: String,
    pub field_type: FieldType,
    pub label: String,
    pub schema: FieldSchema,
    pub default: Value,
}

/// Object schema: an ordered set of keyed field validators.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FormSchema {
    pub entries: Vec<SchemaEntry>,
}

impl FormSchema {
    /// Derive the schema of the whole form; sections share one namespace.
    pub fn from_form(form: &FormBuilderValue) -> Self {
        Self::from_fields(form.top_level_fields())
    }

    pub fn from_fields<'a>(fields: impl IntoIterator<Item = &'a FieldNode>) -> Self {
        let mut seen = HashSet::new();
        let mut entries = Vec::new();
        for field in fields {
            let (Some(schema), Some(default)) = (field_schema(field), default_value(field)) else {
                continue;
            };
            if field.camel_case_name.is_empty() {
                warn!(
                    field_id = %field.id,
                    "field has no camelCaseName; leaving it out of the schema"
                );
                continue;
            }
            if !seen.insert(field.camel_case_name.clone()) {
                warn!(
                    field_id = %field.id,
                    key = %field.camel_case_name,
                    "camelCaseName already used by an earlier field; it is shadowed"
                );
                continue;
            }
            entries.push(SchemaEntry {
                key: field.camel_case_name.clone(),
                field_type: field.field_type(),
                label: display_label(field),
                schema,
                default,
            });
        }
        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&SchemaEntry> {
        self.entries.iter().find(|entry| entry.key == key)
    }

    /// Default value of every entry, keyed like the values it validates.
    pub fn defaults(&self) -> Map<String, Value> {
        self.entries
            .iter()
            .map(|entry| (entry.key.clone(), entry.default.clone()))
            .collect()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.key.as_str())
    }

    /// Key and type of every entry, recursively; changes whenever the field
    /// set changes.
    pub fn signature(&self) -> Vec<(String, FieldType)> {
        let mut out = Vec::new();
        self.collect_signature("", &mut out);
        out
    }

    fn collect_signature(&self, prefix: &str, out: &mut Vec<(String, FieldType)>) {
        for entry in &self.entries {
            let path = format!("{}/{}", prefix, entry.key);
            out.push((path.clone(), entry.field_type));
            if let FieldSchema::Array { item, .. } = &entry.schema {
                item.collect_signature(&path, out);
            }
        }
    }
}

fn display_label(field: &FieldNode) -> String {
    if field.label.trim().is_empty() {
        field.name.clone()
    } else {
        field.label.clone()
    }
}

/// Validator for one node; `None` for decorative or untyped nodes.
pub fn field_schema(field: &FieldNode) -> Option<FieldSchema> {
    let schema = match &field.kind {
        FieldKind::Text(text) => FieldSchema::Text {
            min_length: text.rules.min_length,
            max_length: text.rules.max_length,
        },
        FieldKind::Textarea(text) => FieldSchema::Text {
            min_length: text.rules.min_length,
            max_length: text.rules.max_length,
        },
        FieldKind::Number(number) => FieldSchema::Number {
            required: number.required,
            rules: number.rules.clone(),
        },
        FieldKind::Date(date) => FieldSchema::Date {
            required: date.required,
        },
        FieldKind::Select(choice) | FieldKind::Combobox(choice) => FieldSchema::Choice {
            required: choice.required,
            values: choice
                .options
                .iter()
                .map(|option| option.value.clone())
                .collect(),
        },
        FieldKind::RadioGroup(radio) => FieldSchema::Choice {
            required: radio.required,
            values: radio
                .options
                .iter()
                .map(|option| option.value.clone())
                .collect(),
        },
        FieldKind::Switch(switch) => FieldSchema::Switch {
            keys: switch
                .options
                .iter()
                .map(|option| option.camel_case_name.clone())
                .collect(),
        },
        FieldKind::Array(array) => FieldSchema::Array {
            min_items: array.min_items,
            max_items: array.max_items,
            item: FormSchema::from_fields(&array.fields),
        },
        FieldKind::Title | FieldKind::Empty => return None,
    };
    Some(schema)
}
