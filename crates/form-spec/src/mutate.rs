use std::collections::HashSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::naming::{is_taken, to_camel_case};
use crate::spec::field::{FieldKind, FieldNode, FieldType};
use crate::spec::form::{FormBuilderValue, Section, find_in_mut, list_containing_mut};

/// Partial attribute set merged onto a field.
///
/// Keys absent from the patch are left untouched; a key present with `null`
/// clears a nullable attribute.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct FieldPatch(pub Map<String, Value>);

impl FieldPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

/// Serializable form of every builder mutation, consumed by [`reduce`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum BuilderAction {
    CreateSection {
        name: String,
    },
    DeleteSection {
        name: String,
    },
    ReorderSections {
        from: String,
        to: String,
    },
    CreateField {
        section_index: usize,
        name: String,
    },
    UpdateField {
        field_id: String,
        patch: FieldPatch,
    },
    DeleteField {
        section_index: usize,
        field_id: String,
    },
    ReorderField {
        from_id: String,
        to_id: String,
    },
    PromoteField {
        field_id: String,
        field_type: FieldType,
    },
    CreateArrayField {
        array_field_id: String,
        name: String,
    },
    UpdateArrayField {
        array_field_id: String,
        child_id: String,
        patch: FieldPatch,
    },
    DeleteArrayField {
        array_field_id: String,
        index: usize,
    },
    MoveIntoArray {
        array_field_id: String,
        field: FieldNode,
    },
}

/// Apply a single action.
pub fn reduce(tree: &FormBuilderValue, action: &BuilderAction) -> FormBuilderValue {
    match action {
        BuilderAction::CreateSection { name } => create_section(tree, name),
        BuilderAction::DeleteSection { name } => delete_section(tree, name),
        BuilderAction::ReorderSections { from, to } => reorder_sections(tree, from, to),
        BuilderAction::CreateField {
            section_index,
            name,
        } => create_field(tree, *section_index, name),
        BuilderAction::UpdateField { field_id, patch } => update_field(tree, field_id, patch),
        BuilderAction::DeleteField {
            section_index,
            field_id,
        } => delete_field(tree, *section_index, field_id),
        BuilderAction::ReorderField { from_id, to_id } => reorder_field(tree, from_id, to_id),
        BuilderAction::PromoteField {
            field_id,
            field_type,
        } => promote_empty_field(tree, field_id, &field_type.default_kind()),
        BuilderAction::CreateArrayField {
            array_field_id,
            name,
        } => create_array_field(tree, array_field_id, name),
        BuilderAction::UpdateArrayField {
            array_field_id,
            child_id,
            patch,
        } => update_array_field(tree, array_field_id, child_id, patch),
        BuilderAction::DeleteArrayField {
            array_field_id,
            index,
        } => delete_array_field(tree, array_field_id, *index),
        BuilderAction::MoveIntoArray {
            array_field_id,
            field,
        } => move_into_array(tree, array_field_id, field.clone()),
    }
}

/// Whether a section called `name` may be added.
pub fn can_create_section(tree: &FormBuilderValue, name: &str) -> bool {
    !name.trim().is_empty() && tree.section_index(name).is_none()
}

pub fn create_section(tree: &FormBuilderValue, name: &str) -> FormBuilderValue {
    if !can_create_section(tree, name) {
        debug!(name, "section name empty or already used; ignoring");
        return tree.clone();
    }
    let mut next = tree.clone();
    next.sections.push(Section::new(name));
    next
}

pub fn delete_section(tree: &FormBuilderValue, name: &str) -> FormBuilderValue {
    let mut next = tree.clone();
    match next.section_index(name) {
        Some(index) => {
            next.sections.remove(index);
        }
        None => debug!(name, "section not found; ignoring delete"),
    }
    next
}

pub fn reorder_sections(tree: &FormBuilderValue, from: &str, to: &str) -> FormBuilderValue {
    let mut next = tree.clone();
    let (Some(from_idx), Some(to_idx)) = (next.section_index(from), next.section_index(to)) else {
        debug!(from, to, "section reorder endpoint missing; ignoring");
        return next;
    };
    array_move(&mut next.sections, from_idx, to_idx);
    next
}

/// Whether a field called `name` may be appended to section `section_index`.
///
/// The derived camelCaseName must be non-empty and unused among the
/// top-level fields of every section, which share one value namespace.
pub fn can_create_field(tree: &FormBuilderValue, section_index: usize, name: &str) -> bool {
    let camel = to_camel_case(name);
    section_index < tree.sections.len()
        && !camel.is_empty()
        && !is_taken(tree.top_level_fields(), &camel)
}

/// Append a fresh `empty` field to a section.
pub fn create_field(tree: &FormBuilderValue, section_index: usize, name: &str) -> FormBuilderValue {
    if !can_create_field(tree, section_index, name) {
        debug!(section_index, name, "field cannot be created; ignoring");
        return tree.clone();
    }
    let mut next = tree.clone();
    next.sections[section_index].fields.push(FieldNode::empty(name));
    next
}

/// Shallow-merge `patch` onto the field with `field_id`, wherever it lives.
pub fn update_field(
    tree: &FormBuilderValue,
    field_id: &str,
    patch: &FieldPatch,
) -> FormBuilderValue {
    let Some(current) = tree.find_field(field_id) else {
        debug!(field_id, "field not found; ignoring update");
        return tree.clone();
    };
    let Some(merged) = merge_patch(current, patch) else {
        return tree.clone();
    };
    if merged.field_type() == FieldType::Title && tree.is_array_child(field_id) {
        debug!(field_id, "array-fields cannot hold title fields; ignoring update");
        return tree.clone();
    }

    let mut next = tree.clone();
    if let Some(slot) = next
        .sections
        .iter_mut()
        .find_map(|section| find_in_mut(&mut section.fields, field_id))
    {
        *slot = merged;
    }
    if has_duplicate_ids(&next) {
        warn!(field_id, "update would duplicate field ids; ignoring");
        return tree.clone();
    }
    next
}

fn merge_patch(current: &FieldNode, patch: &FieldPatch) -> Option<FieldNode> {
    let mut encoded = match serde_json::to_value(current) {
        Ok(value) => value,
        Err(err) => {
            warn!(field_id = %current.id, error = %err, "field could not be encoded");
            return None;
        }
    };
    let object = encoded.as_object_mut()?;
    for (key, value) in patch.iter() {
        if key == "id" || key == "camelCaseName" {
            debug!(field_id = %current.id, key, "patch cannot change a derived key; skipping");
            continue;
        }
        object.insert(key.clone(), value.clone());
    }

    let merged: FieldNode = match serde_json::from_value(encoded) {
        Ok(node) => node,
        Err(err) => {
            warn!(
                field_id = %current.id,
                error = %err,
                "patch produces an invalid field; ignoring"
            );
            return None;
        }
    };
    if let FieldKind::Number(number) = &merged.kind
        && let Err(conflict) = number.rules.check()
    {
        warn!(field_id = %current.id, %conflict, "patch produces invalid number rules; ignoring");
        return None;
    }
    Some(merged)
}

/// Remove a top-level field of one section, along with its subtree.
pub fn delete_field(
    tree: &FormBuilderValue,
    section_index: usize,
    field_id: &str,
) -> FormBuilderValue {
    let mut next = tree.clone();
    let Some(section) = next.sections.get_mut(section_index) else {
        debug!(section_index, "section not found; ignoring delete");
        return next;
    };
    match section.fields.iter().position(|field| field.id == field_id) {
        Some(index) => {
            section.fields.remove(index);
        }
        None => debug!(field_id, section_index, "field not in section; ignoring delete"),
    }
    next
}

/// Remove the child at `index` of the array-field `array_field_id`.
pub fn delete_array_field(
    tree: &FormBuilderValue,
    array_field_id: &str,
    index: usize,
) -> FormBuilderValue {
    let mut next = tree.clone();
    match array_children_mut(&mut next, array_field_id) {
        Some(children) if index < children.len() => {
            children.remove(index);
        }
        _ => debug!(array_field_id, index, "array child not found; ignoring delete"),
    }
    next
}

/// Move the element `from_id` to the position of `to_id` within the list
/// that holds both: a section, or the same array-field.
pub fn reorder_field(tree: &FormBuilderValue, from_id: &str, to_id: &str) -> FormBuilderValue {
    let mut next = tree.clone();
    if from_id == to_id {
        return next;
    }
    let mut moved = false;
    for section in next.sections.iter_mut() {
        if let Some(list) = list_containing_mut(&mut section.fields, from_id) {
            let from_idx = list.iter().position(|field| field.id == from_id);
            let to_idx = list.iter().position(|field| field.id == to_id);
            if let (Some(from_idx), Some(to_idx)) = (from_idx, to_idx) {
                array_move(list, from_idx, to_idx);
                moved = true;
            }
            break;
        }
    }
    if moved {
        return next;
    }
    debug!(from_id, to_id, "reorder endpoints not in one list; ignoring");
    tree.clone()
}

/// Swap the node's type and variant attributes for `defaults` in one step,
/// keeping id, names, label and description.
pub fn promote_empty_field(
    tree: &FormBuilderValue,
    target_field_id: &str,
    defaults: &FieldKind,
) -> FormBuilderValue {
    if defaults.field_type() == FieldType::Title && tree.is_array_child(target_field_id) {
        debug!(target_field_id, "array-fields cannot hold title fields; ignoring promote");
        return tree.clone();
    }
    let mut next = tree.clone();
    match next
        .sections
        .iter_mut()
        .find_map(|section| find_in_mut(&mut section.fields, target_field_id))
    {
        Some(node) => {
            if node.field_type() != FieldType::Empty {
                debug!(
                    target_field_id,
                    from = %node.field_type(),
                    to = %defaults.field_type(),
                    "retyping a field that already has a type"
                );
            }
            node.kind = defaults.clone();
        }
        None => debug!(target_field_id, "promote target not found; ignoring"),
    }
    next
}

/// Append `new_field` to the contents of an array-field.
pub fn move_into_array(
    tree: &FormBuilderValue,
    array_field_id: &str,
    new_field: FieldNode,
) -> FormBuilderValue {
    if new_field.field_type() == FieldType::Title {
        debug!(array_field_id, field_id = %new_field.id, "array-fields cannot hold title fields");
        return tree.clone();
    }
    let existing: HashSet<String> = tree.flatten_ids().into_iter().collect();
    let mut incoming = Vec::new();
    new_field.collect_ids(&mut incoming);
    if incoming.iter().any(|id| existing.contains(id)) {
        warn!(
            array_field_id,
            field_id = %new_field.id,
            "field ids already present in the tree; ignoring insert"
        );
        return tree.clone();
    }

    let mut next = tree.clone();
    let Some(children) = array_children_mut(&mut next, array_field_id) else {
        debug!(array_field_id, "array-field not found; ignoring insert");
        return tree.clone();
    };
    if is_taken(children.iter(), &new_field.camel_case_name) {
        debug!(array_field_id, name = %new_field.name, "name already used in array; ignoring");
        return tree.clone();
    }
    children.push(new_field);
    next
}

/// Append a fresh `empty` child to an array-field.
pub fn create_array_field(
    tree: &FormBuilderValue,
    array_field_id: &str,
    name: &str,
) -> FormBuilderValue {
    if to_camel_case(name).is_empty() {
        debug!(array_field_id, name, "array child name is empty; ignoring");
        return tree.clone();
    }
    move_into_array(tree, array_field_id, FieldNode::empty(name))
}

/// Update a direct child of an array-field.
pub fn update_array_field(
    tree: &FormBuilderValue,
    array_field_id: &str,
    child_id: &str,
    patch: &FieldPatch,
) -> FormBuilderValue {
    let is_child = tree
        .find_field(array_field_id)
        .and_then(FieldNode::children)
        .is_some_and(|children| children.iter().any(|child| child.id == child_id));
    if !is_child {
        debug!(array_field_id, child_id, "array child not found; ignoring update");
        return tree.clone();
    }
    update_field(tree, child_id, patch)
}

fn array_children_mut<'a>(
    tree: &'a mut FormBuilderValue,
    array_field_id: &str,
) -> Option<&'a mut Vec<FieldNode>> {
    tree.sections
        .iter_mut()
        .find_map(|section| find_in_mut(&mut section.fields, array_field_id))
        .and_then(FieldNode::children_mut)
}

fn has_duplicate_ids(tree: &FormBuilderValue) -> bool {
    let ids = tree.flatten_ids();
    let unique: HashSet<&String> = ids.iter().collect();
    unique.len() != ids.len()
}

/// Remove the element at `from` and reinsert it at `to`.
pub fn array_move<T>(items: &mut Vec<T>, from: usize, to: usize) {
    if from >= items.len() || to >= items.len() || from == to {
        return;
    }
    let item = items.remove(from);
    items.insert(to, item);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_move_forward_and_back() {
        let mut items = vec!['a', 'b', 'c', 'd'];
        array_move(&mut items, 0, 2);
        assert_eq!(items, vec!['b', 'c', 'a', 'd']);
        array_move(&mut items, 3, 0);
        assert_eq!(items, vec!['d', 'b', 'c', 'a']);
    }

    #[test]
    fn array_move_out_of_range_is_noop() {
        let mut items = vec![1, 2, 3];
        array_move(&mut items, 5, 0);
        assert_eq!(items, vec![1, 2, 3]);
    }

    #[test]
    fn patch_round_trips_through_json() {
        let patch: FieldPatch =
            serde_json::from_str(r#"{"label":"Email","description":null}"#).expect("patch");
        assert_eq!(patch.0.len(), 2);
        assert!(patch.0["description"].is_null());
    }
}
