use std::collections::BTreeMap;

use serde_json::{Map, Value, json};

use crate::dnd::DndData;
use crate::session::FormSession;
use crate::spec::field::{FieldKind, FieldNode, FieldType};
use crate::spec::form::FormBuilderValue;

/// The three fragments the builder shows for one field of a given type.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldComponents {
    /// Editable field card in the canvas.
    pub field: Value,
    /// Popover with the "Field Type" and "Rules" tabs.
    pub tooltip: Value,
    /// Palette entry in the sidebar.
    pub sidebar_field: Value,
}

const FIELD_TYPE_TAB: &str = "Field Type";
const RULES_TAB: &str = "Rules";

/// Dispatch table for `field_id`: one entry per field type, no fallback.
pub fn field_components(field_id: &str) -> BTreeMap<FieldType, FieldComponents> {
    FieldType::PALETTE
        .iter()
        .chain(std::iter::once(&FieldType::Empty))
        .map(|field_type| (*field_type, components_for(field_id, *field_type)))
        .collect()
}

fn components_for(field_id: &str, field_type: FieldType) -> FieldComponents {
    let tag = field_type.as_str();
    FieldComponents {
        field: json!({
            "component": tag,
            "fieldId": field_id,
        }),
        tooltip: json!({
            "component": format!("{}-tooltip", tag),
            "fieldId": field_id,
            "tabs": [
                {
                    "title": FIELD_TYPE_TAB,
                    "attributes": type_attributes(field_type),
                },
                {
                    "title": RULES_TAB,
                    "attributes": rule_attributes(field_type),
                }
            ],
        }),
        sidebar_field: json!({
            "component": "sidebar-field",
            "type": tag,
            "label": field_type.display_name(),
            "dnd": DndData::palette(field_type),
        }),
    }
}

fn type_attributes(field_type: FieldType) -> &'static [&'static str] {
    match field_type {
        FieldType::Text => &[
            "label",
            "description",
            "placeholder",
            "orientation",
            "showCharacterCount",
            "showClearButton",
            "showErrorMessage",
        ],
        FieldType::Textarea => &[
            "label",
            "description",
            "placeholder",
            "orientation",
            "rows",
            "showCharacterCount",
            "showErrorMessage",
        ],
        FieldType::Number => &[
            "label",
            "description",
            "placeholder",
            "unitText",
            "defaultValue",
            "showErrorMessage",
        ],
        FieldType::Date => &["label", "description", "placeholder", "defaultValue"],
        FieldType::Select | FieldType::Combobox => &[
            "label",
            "description",
            "placeholder",
            "options",
            "defaultValue",
        ],
        FieldType::RadioGroup => &["label", "description", "options", "defaultValue"],
        FieldType::Switch => &["label", "description", "options"],
        FieldType::Array => &["label", "description", "fields"],
        FieldType::Title => &["label", "description"],
        FieldType::Empty => &["name"],
    }
}

fn rule_attributes(field_type: FieldType) -> &'static [&'static str] {
    match field_type {
        FieldType::Text | FieldType::Textarea => &["minLength", "maxLength"],
        FieldType::Number => &[
            "required",
            "greaterThan",
            "greaterThanOrEqualTo",
            "lessThan",
            "lessThanOrEqualTo",
            "positive",
            "negative",
            "integer",
            "exactDigits",
            "precision",
            "rounding",
        ],
        FieldType::Date
        | FieldType::Select
        | FieldType::Combobox
        | FieldType::RadioGroup => &["required"],
        FieldType::Array => &["minItems", "maxItems"],
        FieldType::Switch | FieldType::Title | FieldType::Empty => &[],
    }
}

/// Palette entries in display order.
pub fn render_palette() -> Value {
    Value::Array(
        FieldType::PALETTE
            .iter()
            .map(|field_type| components_for("", *field_type).sidebar_field)
            .collect(),
    )
}

/// The builder canvas: sections, field cards with their tooltips and drag
/// data, and the palette.
pub fn render_builder_ui(tree: &FormBuilderValue) -> Value {
    let sections = tree
        .sections
        .iter()
        .enumerate()
        .map(|(index, section)| {
            json!({
                "index": index,
                "name": section.name,
                "dnd": DndData::section(),
                "fields": section
                    .fields
                    .iter()
                    .map(|field| builder_card(field, None))
                    .collect::<Vec<_>>(),
            })
        })
        .collect::<Vec<_>>();

    json!({
        "palette": render_palette(),
        "sections": sections,
    })
}

fn builder_card(field: &FieldNode, array_id: Option<&str>) -> Value {
    let field_type = field.field_type();
    let mut table = field_components(&field.id);
    let Some(components) = table.remove(&field_type) else {
        return Value::Null;
    };

    let mut card = match components.field {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    if let Ok(Value::Object(attributes)) = serde_json::to_value(field) {
        card.insert("attributes".into(), Value::Object(attributes));
    }
    let dnd = match array_id {
        Some(array_id) => DndData::array_field(array_id, field_type),
        None => DndData::form_field(field_type),
    };
    card.insert("dnd".into(), json!(dnd));
    card.insert("tooltip".into(), components.tooltip);
    if let Some(children) = field.children() {
        card.insert(
            "fields".into(),
            Value::Array(
                children
                    .iter()
                    .map(|child| builder_card(child, Some(&field.id)))
                    .collect(),
            ),
        );
    }
    Value::Object(card)
}

/// The fill/preview form bound to a session's values and errors.
pub fn render_preview(tree: &FormBuilderValue, session: &FormSession) -> Value {
    let values = session.values();
    let sections = tree
        .sections
        .iter()
        .map(|section| {
            let fields = section
                .fields
                .iter()
                .filter_map(|field| {
                    preview_widget(field, values.get(&field.camel_case_name), Some(session))
                })
                .collect::<Vec<_>>();
            json!({
                "name": section.name,
                "fields": fields,
            })
        })
        .collect::<Vec<_>>();

    json!({
        "sections": sections,
        "valid": session.validation().valid,
        "dirty": session.is_dirty(),
        "submit": {
            "enabled": session.can_submit(),
        },
    })
}

fn preview_widget(
    field: &FieldNode,
    value: Option<&Value>,
    session: Option<&FormSession>,
) -> Option<Value> {
    let field_type = field.field_type();
    if field_type == FieldType::Empty {
        return None;
    }

    let mut map = Map::new();
    map.insert("component".into(), json!(field_type.as_str()));
    map.insert("id".into(), json!(field.id));
    map.insert("key".into(), json!(field.camel_case_name));
    map.insert("label".into(), json!(field_label(field)));
    if let Some(description) = &field.description {
        map.insert("description".into(), json!(description));
    }

    match &field.kind {
        FieldKind::Text(text) => {
            map.insert("placeholder".into(), json!(text.placeholder));
            map.insert("orientation".into(), json!(text.orientation));
            map.insert("showClearButton".into(), json!(text.show_clear_button));
            if text.show_character_count {
                let count = value.and_then(Value::as_str).map_or(0, |s| s.chars().count());
                map.insert("characterCount".into(), json!(count));
            }
        }
        FieldKind::Textarea(text) => {
            map.insert("placeholder".into(), json!(text.placeholder));
            map.insert("rows".into(), json!(text.rows));
            if text.show_character_count {
                let count = value.and_then(Value::as_str).map_or(0, |s| s.chars().count());
                map.insert("characterCount".into(), json!(count));
            }
        }
        FieldKind::Number(number) => {
            map.insert("placeholder".into(), json!(number.placeholder));
            map.insert("required".into(), json!(number.required));
            if let Some(unit) = &number.unit_text {
                map.insert("unitText".into(), json!(unit));
            }
        }
        FieldKind::Date(date) => {
            map.insert("placeholder".into(), json!(date.placeholder));
            map.insert("required".into(), json!(date.required));
        }
        FieldKind::Select(choice) | FieldKind::Combobox(choice) => {
            map.insert("placeholder".into(), json!(choice.placeholder));
            map.insert("required".into(), json!(choice.required));
            map.insert("options".into(), json!(choice.options));
        }
        FieldKind::RadioGroup(radio) => {
            map.insert("required".into(), json!(radio.required));
            map.insert("options".into(), json!(radio.options));
        }
        FieldKind::Switch(switch) => {
            map.insert("options".into(), json!(switch.options));
        }
        FieldKind::Array(array) => {
            let rows = value.and_then(Value::as_array).cloned().unwrap_or_default();
            let rendered_rows = rows
                .iter()
                .map(|row| {
                    Value::Array(
                        array
                            .fields
                            .iter()
                            .filter_map(|child| {
                                preview_widget(child, row.get(&child.camel_case_name), None)
                            })
                            .collect(),
                    )
                })
                .collect::<Vec<_>>();
            map.insert("rows".into(), Value::Array(rendered_rows));
            map.insert("minItems".into(), json!(array.min_items));
            map.insert("maxItems".into(), json!(array.max_items));
        }
        FieldKind::Title | FieldKind::Empty => {}
    }

    if field_type.holds_value() {
        map.insert("value".into(), value.cloned().unwrap_or(Value::Null));
    }
    if let Some(session) = session {
        let errors = session
            .field_errors(&field.camel_case_name)
            .map(|error| {
                json!({
                    "path": error.path,
                    "message": error.message,
                    "code": error.code,
                })
            })
            .collect::<Vec<_>>();
        if !errors.is_empty() && shows_errors(field) {
            map.insert("errors".into(), Value::Array(errors));
        }
    }
    Some(Value::Object(map))
}

fn shows_errors(field: &FieldNode) -> bool {
    match &field.kind {
        FieldKind::Text(text) => text.show_error_message,
        FieldKind::Textarea(text) => text.show_error_message,
        FieldKind::Number(number) => number.show_error_message,
        _ => true,
    }
}

fn field_label(field: &FieldNode) -> &str {
    if field.label.trim().is_empty() {
        &field.name
    } else {
        &field.label
    }
}

/// Human-friendly outline of the form, with current values when a session
/// is supplied.
pub fn render_text(tree: &FormBuilderValue, session: Option<&FormSession>) -> String {
    let mut lines = Vec::new();
    let total: usize = tree.sections.iter().map(|section| section.fields.len()).sum();
    lines.push(format!(
        "Form: {} section(s), {} field(s)",
        tree.sections.len(),
        total
    ));

    for section in &tree.sections {
        lines.push(format!("Section: {}", section.name));
        if section.fields.is_empty() {
            lines.push("  (no fields)".to_string());
        }
        for field in &section.fields {
            outline_field(field, 1, session, &mut lines);
        }
    }

    if let Some(session) = session {
        let status = if session.validation().valid {
            "valid"
        } else {
            "invalid"
        };
        lines.push(format!(
            "Status: {}{}",
            status,
            if session.is_dirty() { ", modified" } else { "" }
        ));
        for error in &session.validation().errors {
            lines.push(format!(
                "  ! {}: {}",
                error.path.as_deref().unwrap_or(""),
                error.message
            ));
        }
    }

    lines.join("\n")
}

fn outline_field(
    field: &FieldNode,
    depth: usize,
    session: Option<&FormSession>,
    lines: &mut Vec<String>,
) {
    let indent = "  ".repeat(depth);
    let mut entry = format!(
        "{}- {} ({}) [{}]",
        indent,
        field_label(field),
        field.camel_case_name,
        field.field_type()
    );
    if depth == 1
        && let Some(value) =
            session.and_then(|session| session.values().get(&field.camel_case_name))
    {
        entry.push_str(&format!(" = {}", value_to_display(value)));
    }
    lines.push(entry);
    if let Some(children) = field.children() {
        for child in children {
            outline_field(child, depth + 1, session, lines);
        }
    }
}

fn value_to_display(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(num) => num.to_string(),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}
