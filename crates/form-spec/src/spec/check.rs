use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::naming;
use crate::spec::field::{FieldKind, FieldNode, FieldType};
use crate::spec::form::FormBuilderValue;

/// A single structural problem found in a form definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefinitionIssue {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
}

impl DefinitionIssue {
    fn new(code: &str, message: String) -> Self {
        Self {
            code: code.into(),
            message,
            field_id: None,
            section: None,
        }
    }

    fn field(mut self, id: &str) -> Self {
        self.field_id = Some(id.to_string());
        self
    }

    fn section(mut self, name: &str) -> Self {
        self.section = Some(name.to_string());
        self
    }
}

/// Report every invariant the tree violates. An empty list means the
/// definition is well formed.
pub fn check_definition(value: &FormBuilderValue) -> Vec<DefinitionIssue> {
    let mut issues = Vec::new();

    let mut section_names = HashSet::new();
    for section in &value.sections {
        if section.name.trim().is_empty() {
            issues.push(DefinitionIssue::new(
                "empty_section_name",
                "section name cannot be empty".into(),
            ));
        }
        if !section_names.insert(section.name.as_str()) {
            issues.push(
                DefinitionIssue::new(
                    "duplicate_section",
                    format!("duplicate section name '{}'", section.name),
                )
                .section(&section.name),
            );
        }
    }

    let mut ids = HashSet::new();
    for section in &value.sections {
        for field in &section.fields {
            check_field(field, &section.name, &mut ids, &mut issues);
        }
    }

    for camel in naming::duplicates(value.top_level_fields()) {
        issues.push(DefinitionIssue::new(
            "duplicate_name",
            format!("camelCaseName '{}' is used by more than one field", camel),
        ));
    }

    issues
}

fn check_field(
    field: &FieldNode,
    section: &str,
    ids: &mut HashSet<String>,
    issues: &mut Vec<DefinitionIssue>,
) {
    if field.id.trim().is_empty() {
        issues.push(
            DefinitionIssue::new("empty_id", format!("field '{}' has no id", field.name))
                .section(section),
        );
    } else if !ids.insert(field.id.clone()) {
        issues.push(
            DefinitionIssue::new("duplicate_id", format!("duplicate field id '{}'", field.id))
                .field(&field.id)
                .section(section),
        );
    }

    match &field.kind {
        FieldKind::Number(number) => {
            if let Err(conflict) = number.rules.check() {
                issues.push(
                    DefinitionIssue::new("number_rules", conflict.to_string())
                        .field(&field.id)
                        .section(section),
                );
            }
        }
        FieldKind::Text(text) => check_lengths(
            field,
            text.rules.min_length,
            text.rules.max_length,
            section,
            issues,
        ),
        FieldKind::Textarea(text) => check_lengths(
            field,
            text.rules.min_length,
            text.rules.max_length,
            section,
            issues,
        ),
        FieldKind::Select(choice) | FieldKind::Combobox(choice) if choice.options.is_empty() => {
            issues.push(
                DefinitionIssue::new(
                    "no_options",
                    format!("field '{}' must define at least one option", field.name),
                )
                .field(&field.id)
                .section(section),
            );
        }
        FieldKind::RadioGroup(radio) if radio.options.is_empty() => {
            issues.push(
                DefinitionIssue::new(
                    "no_options",
                    format!("field '{}' must define at least one option", field.name),
                )
                .field(&field.id)
                .section(section),
            );
        }
        FieldKind::Array(array) => {
            if let (Some(min), Some(max)) = (array.min_items, array.max_items)
                && min > max
            {
                issues.push(
                    DefinitionIssue::new(
                        "array_bounds",
                        format!("minItems {} cannot exceed maxItems {}", min, max),
                    )
                    .field(&field.id)
                    .section(section),
                );
            }
            for camel in naming::duplicates(&array.fields) {
                issues.push(
                    DefinitionIssue::new(
                        "duplicate_name",
                        format!(
                            "camelCaseName '{}' is used twice inside '{}'",
                            camel, field.name
                        ),
                    )
                    .field(&field.id)
                    .section(section),
                );
            }
            for child in &array.fields {
                if child.field_type() == FieldType::Title {
                    issues.push(
                        DefinitionIssue::new(
                            "title_in_array",
                            format!("array-field '{}' cannot hold a title field", field.name),
                        )
                        .field(&child.id)
                        .section(section),
                    );
                }
                check_field(child, section, ids, issues);
            }
        }
        _ => {}
    }
}

fn check_lengths(
    field: &FieldNode,
    min: Option<u32>,
    max: Option<u32>,
    section: &str,
    issues: &mut Vec<DefinitionIssue>,
) {
    if let (Some(min), Some(max)) = (min, max)
        && min > max
    {
        issues.push(
            DefinitionIssue::new(
                "length_bounds",
                format!("minLength {} cannot exceed maxLength {}", min, max),
            )
            .field(&field.id)
            .section(section),
        );
    }
}
