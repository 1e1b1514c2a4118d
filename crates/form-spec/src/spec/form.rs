use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::FormError;
use crate::spec::field::FieldNode;

/// Name given to the single section produced from a legacy flat document.
pub const LEGACY_SECTION_NAME: &str = "Form";

/// Named top-level grouping of fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Section {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldNode>,
}

impl Section {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            fields: Vec::new(),
        }
    }
}

/// The whole form definition edited by the builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
pub struct FormBuilderValue {
    pub sections: Vec<Section>,
}

/// Flat single-list shape still produced by older hosts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LegacyForm {
    pub form: Vec<FieldNode>,
}

/// Any accepted on-disk shape of a form definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum FormDocument {
    Sectioned(FormBuilderValue),
    Legacy(LegacyForm),
}

impl From<FormDocument> for FormBuilderValue {
    fn from(document: FormDocument) -> Self {
        match document {
            FormDocument::Sectioned(value) => value,
            FormDocument::Legacy(legacy) => FormBuilderValue {
                sections: vec![Section {
                    name: LEGACY_SECTION_NAME.to_string(),
                    fields: legacy.form,
                }],
            },
        }
    }
}

impl FormBuilderValue {
    /// Parse either document shape.
    pub fn from_json(json: &str) -> Result<Self, FormError> {
        let document: FormDocument = serde_json::from_str(json).map_err(FormError::Parse)?;
        Ok(document.into())
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, FormError> {
        let document: FormDocument = serde_json::from_value(value).map_err(FormError::Parse)?;
        Ok(document.into())
    }

    pub fn section_index(&self, name: &str) -> Option<usize> {
        self.sections
            .iter()
            .position(|section| section.name == name.trim())
    }

    /// Top-level fields of every section, in order.
    pub fn top_level_fields(&self) -> impl Iterator<Item = &FieldNode> {
        self.sections.iter().flat_map(|section| section.fields.iter())
    }

    /// Depth-first lookup, descending into array-fields.
    pub fn find_field(&self, id: &str) -> Option<&FieldNode> {
        self.sections
            .iter()
            .find_map(|section| find_in(&section.fields, id))
    }

    /// Index of the section whose top-level list holds `id`.
    pub fn section_of(&self, id: &str) -> Option<usize> {
        self.sections
            .iter()
            .position(|section| section.fields.iter().any(|field| field.id == id))
    }

    /// Every id in the tree, including nested array contents.
    pub fn flatten_ids(&self) -> Vec<String> {
        let mut ids = Vec::new();
        for field in self.top_level_fields() {
            field.collect_ids(&mut ids);
        }
        ids
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.find_field(id).is_some()
    }

    /// Whether `id` is a direct child of some array-field.
    pub fn is_array_child(&self, id: &str) -> bool {
        self.sections
            .iter()
            .any(|section| holds_array_child(&section.fields, id))
    }
}

fn holds_array_child(fields: &[FieldNode], id: &str) -> bool {
    fields.iter().any(|field| match field.children() {
        Some(children) => {
            children.iter().any(|child| child.id == id) || holds_array_child(children, id)
        }
        None => false,
    })
}

pub(crate) fn find_in<'a>(fields: &'a [FieldNode], id: &str) -> Option<&'a FieldNode> {
    for field in fields {
        if field.id == id {
            return Some(field);
        }
        if let Some(found) = field.children().and_then(|children| find_in(children, id)) {
            return Some(found);
        }
    }
    None
}

pub(crate) fn find_in_mut<'a>(fields: &'a mut [FieldNode], id: &str) -> Option<&'a mut FieldNode> {
    for field in fields.iter_mut() {
        if field.id == id {
            return Some(field);
        }
        if let Some(found) = field
            .children_mut()
            .and_then(|children| find_in_mut(children, id))
        {
            return Some(found);
        }
    }
    None
}

/// The list (section or array-field contents) that directly holds `id`.
pub(crate) fn list_containing_mut<'a>(
    fields: &'a mut Vec<FieldNode>,
    id: &str,
) -> Option<&'a mut Vec<FieldNode>> {
    if fields.iter().any(|field| field.id == id) {
        return Some(fields);
    }
    for field in fields.iter_mut() {
        if let Some(found) = field
            .children_mut()
            .and_then(|children| list_containing_mut(children, id))
        {
            return Some(found);
        }
    }
    None
}
