use std::time::Instant;

use serde_json::{Map, Value, json};

use form_spec::{
    BuilderAction, CallbackError, FieldPatch, FieldType, FormBuilderValue, FormCallbacks,
    FormConfig, FormSession, Section, SubmitOutcome, check_definition,
    mutate::{
        can_create_section, create_array_field, create_field, create_section, delete_array_field,
        delete_field, delete_section, move_into_array, promote_empty_field, reduce,
        reorder_field, reorder_sections, update_array_field, update_field,
    },
    spec::{FieldKind, FieldNode},
};

fn fixture(name: &str) -> &'static str {
    match name {
        "contact_form" => include_str!("../tests/fixtures/contact_form.json"),
        "legacy_form" => include_str!("../tests/fixtures/legacy_form.json"),
        _ => panic!("unknown fixture {}", name),
    }
}

fn contact() -> FormBuilderValue {
    FormBuilderValue::from_json(fixture("contact_form")).expect("deserialize")
}

fn section_ids(tree: &FormBuilderValue, index: usize) -> Vec<String> {
    tree.sections[index]
        .fields
        .iter()
        .map(|field| field.id.clone())
        .collect()
}

#[derive(Default)]
struct CreatedValues(Vec<Map<String, Value>>);

impl FormCallbacks for CreatedValues {
    fn on_create(&mut self, values: &Map<String, Value>) -> Result<(), CallbackError> {
        self.0.push(values.clone());
        Ok(())
    }
}

#[test]
fn contact_full_name_scenario() {
    let tree = FormBuilderValue::default();
    let tree = create_section(&tree, "Contact");
    let tree = create_field(&tree, 0, "Full Name");

    let field = &tree.sections[0].fields[0];
    assert_eq!(field.field_type(), FieldType::Empty);
    assert_eq!(field.name, "Full Name");
    assert_eq!(field.camel_case_name, "fullName");
    assert_eq!(field.label, "Full Name");
    assert!(!field.id.is_empty());

    let id = field.id.clone();
    let tree = promote_empty_field(&tree, &id, &FieldType::Text.default_kind());
    let rules = FieldPatch::new().set("rules", json!({ "minLength": 2, "maxLength": 50 }));
    let tree = update_field(&tree, &id, &rules);

    let field = tree.find_field(&id).expect("field");
    match &field.kind {
        FieldKind::Text(text) => {
            assert_eq!(text.rules.min_length, Some(2));
            assert_eq!(text.rules.max_length, Some(50));
        }
        other => panic!("expected text field, got {:?}", other),
    }
    assert_eq!(field.camel_case_name, "fullName");

    let defaults = form_spec::derive_defaults(&tree);
    assert_eq!(defaults.get("fullName"), Some(&json!("")));

    let mut session = FormSession::new(&tree, FormConfig::default());
    let mut created = CreatedValues::default();
    session.set_value("fullName", json!("A"), Instant::now());
    match session.submit(&mut created) {
        SubmitOutcome::Invalid(result) => {
            let error = result.errors_for("fullName").next().expect("fullName error");
            assert_eq!(error.code.as_deref(), Some("min_length"));
        }
        other => panic!("expected invalid, got {:?}", other),
    }
    assert!(created.0.is_empty());

    session.set_value("fullName", json!("Alice"), Instant::now());
    match session.submit(&mut created) {
        SubmitOutcome::Submitted(values) => {
            assert_eq!(Value::Object(values), json!({ "fullName": "Alice" }));
        }
        other => panic!("expected submitted, got {:?}", other),
    }
    assert_eq!(created.0.len(), 1);
    assert_eq!(Value::Object(created.0[0].clone()), json!({ "fullName": "Alice" }));
}

#[test]
fn create_field_ignores_blank_and_colliding_names() {
    let tree = create_section(&FormBuilderValue::default(), "Main");
    assert_eq!(create_field(&tree, 0, "   "), tree);
    assert_eq!(create_field(&tree, 0, "!!!"), tree);
    assert_eq!(create_field(&tree, 3, "Email"), tree);

    let tree = create_field(&tree, 0, "Email");
    assert_eq!(create_field(&tree, 0, " email "), tree);
}

#[test]
fn camel_case_names_share_one_namespace_across_sections() {
    let tree = contact();
    let next = create_field(&tree, 1, "Full Name");
    assert_eq!(next, tree);
}

#[test]
fn duplicate_section_names_are_rejected() {
    let tree = create_section(&FormBuilderValue::default(), "Contact");
    assert!(!can_create_section(&tree, "Contact"));
    assert!(!can_create_section(&tree, "  Contact "));
    assert!(!can_create_section(&tree, ""));
    assert_eq!(create_section(&tree, "Contact"), tree);
    assert_eq!(tree.sections.len(), 1);
}

#[test]
fn update_with_missing_id_is_identity() {
    let tree = contact();
    let next = update_field(&tree, "nope", &FieldPatch::new().set("label", "x"));
    assert_eq!(next, tree);
}

#[test]
fn update_skips_absent_keys() {
    let tree = contact();
    let next = update_field(&tree, "f-full-name", &FieldPatch::new().set("label", "Name"));
    let field = next.find_field("f-full-name").expect("field");
    assert_eq!(field.label, "Name");
    assert_eq!(field.name, "Full Name");
    match &field.kind {
        FieldKind::Text(text) => {
            assert_eq!(text.placeholder, "Jane Doe");
            assert_eq!(text.rules.min_length, Some(2));
            assert_eq!(text.rules.max_length, Some(40));
        }
        other => panic!("expected text field, got {:?}", other),
    }
}

#[test]
fn update_replaces_rules_whole() {
    let tree = contact();
    let next = update_field(
        &tree,
        "f-full-name",
        &FieldPatch::new().set("rules", json!({ "maxLength": 10 })),
    );
    match &next.find_field("f-full-name").expect("field").kind {
        FieldKind::Text(text) => {
            assert_eq!(text.rules.min_length, None);
            assert_eq!(text.rules.max_length, Some(10));
        }
        other => panic!("expected text field, got {:?}", other),
    }
}

#[test]
fn update_reaches_nested_array_children() {
    let tree = contact();
    let next = update_field(
        &tree,
        "f-phone-number",
        &FieldPatch::new().set("label", "Phone number"),
    );
    let child = next.find_field("f-phone-number").expect("child");
    assert_eq!(child.label, "Phone number");
    assert_eq!(next.sections[0], tree.sections[0]);
}

fn nested_arrays() -> FormBuilderValue {
    let text = |id: &str, name: &str, camel: &str| {
        json!({
            "id": id,
            "name": name,
            "camelCaseName": camel,
            "label": name,
            "type": "text-field",
            "placeholder": "type here"
        })
    };
    let value = json!({
        "sections": [{
            "name": "Main",
            "fields": [{
                "id": "outer",
                "name": "Outer",
                "camelCaseName": "outer",
                "label": "Outer",
                "description": "Outer rows",
                "type": "array-field",
                "minItems": 1,
                "fields": [
                    {
                        "id": "inner",
                        "name": "Inner",
                        "camelCaseName": "inner",
                        "label": "Inner",
                        "type": "array-field",
                        "maxItems": 4,
                        "fields": [
                            text("leaf", "Leaf", "leaf"),
                            text("sibling", "Sibling", "sibling")
                        ]
                    },
                    text("outer-note", "Note", "note")
                ]
            }]
        }]
    });
    FormBuilderValue::from_value(value).expect("nested arrays")
}

#[test]
fn update_reaches_leaf_of_nested_arrays() {
    let tree = nested_arrays();
    let next = update_field(&tree, "leaf", &FieldPatch::new().set("label", "Leaf name"));

    let mut expected = tree.clone();
    let outer = &mut expected.sections[0].fields[0];
    let inner = &mut outer.children_mut().expect("outer children")[0];
    inner.children_mut().expect("inner children")[0].label = "Leaf name".into();
    assert_eq!(next, expected);

    let outer = &next.sections[0].fields[0];
    let FieldKind::Array(outer_array) = &outer.kind else {
        panic!("outer is an array-field");
    };
    assert_eq!(outer.description.as_deref(), Some("Outer rows"));
    assert_eq!(outer_array.min_items, Some(1));
    let FieldKind::Array(inner_array) = &outer_array.fields[0].kind else {
        panic!("inner is an array-field");
    };
    assert_eq!(inner_array.max_items, Some(4));
    assert_eq!(inner_array.fields[1], tree.find_field("sibling").expect("sibling").clone());
    assert_eq!(outer_array.fields[1], tree.find_field("outer-note").expect("note").clone());
}

#[test]
fn update_keeps_camel_case_name() {
    let tree = contact();
    let next = update_field(
        &tree,
        "f-age",
        &FieldPatch::new().set("camelCaseName", "fullName"),
    );
    assert_eq!(next, tree);
    assert!(check_definition(&next).is_empty());
    assert!(form_spec::derive_defaults(&next).contains_key("age"));

    let patch = FieldPatch::new()
        .set("camelCaseName", "years")
        .set("label", "Years");
    let next = update_field(&tree, "f-age", &patch);
    let field = next.find_field("f-age").expect("age");
    assert_eq!(field.label, "Years");
    assert_eq!(field.camel_case_name, "age");
}

#[test]
fn array_fields_never_hold_titles() {
    let tree = contact();
    let retype = FieldPatch::new().set("type", "title-field");
    assert_eq!(update_field(&tree, "f-phone-number", &retype), tree);
    assert_eq!(
        update_array_field(&tree, "f-phones", "f-phone-number", &retype),
        tree
    );
    assert_eq!(
        promote_empty_field(&tree, "f-phone-slot", &FieldType::Title.default_kind()),
        tree
    );
    let heading = FieldNode::new("Row Heading", FieldType::Title.default_kind());
    assert_eq!(move_into_array(&tree, "f-phones", heading), tree);

    let promoted = promote_empty_field(&tree, "f-slot", &FieldType::Title.default_kind());
    assert_eq!(
        promoted.find_field("f-slot").map(|field| field.field_type()),
        Some(FieldType::Title)
    );
}

#[test]
fn definition_check_flags_title_inside_array() {
    let value = json!({
        "sections": [{
            "name": "Main",
            "fields": [{
                "id": "rows",
                "name": "Rows",
                "camelCaseName": "rows",
                "label": "Rows",
                "type": "array-field",
                "fields": [{
                    "id": "row-title",
                    "name": "Row Title",
                    "camelCaseName": "rowTitle",
                    "label": "Row Title",
                    "type": "title-field"
                }]
            }]
        }]
    });
    let tree = FormBuilderValue::from_value(value).expect("form");
    let issues = check_definition(&tree);
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].code, "title_in_array");
    assert_eq!(issues[0].field_id.as_deref(), Some("row-title"));
}

#[test]
fn update_never_changes_id() {
    let tree = contact();
    let next = update_field(&tree, "f-age", &FieldPatch::new().set("id", "other"));
    assert!(next.contains_id("f-age"));
    assert!(!next.contains_id("other"));
}

#[test]
fn update_rejects_conflicting_number_rules() {
    let tree = contact();
    let patch = FieldPatch::new().set(
        "rules",
        json!({ "greaterThan": 1, "greaterThanOrEqualTo": 2 }),
    );
    assert_eq!(update_field(&tree, "f-age", &patch), tree);

    let patch = FieldPatch::new().set("rules", json!({ "greaterThan": 10, "lessThan": 10 }));
    assert_eq!(update_field(&tree, "f-age", &patch), tree);

    let patch = FieldPatch::new().set("rules", json!({ "greaterThan": 0, "lessThan": 120 }));
    assert_ne!(update_field(&tree, "f-age", &patch), tree);
}

#[test]
fn update_rejects_undecodable_attributes() {
    let tree = contact();
    let patch = FieldPatch::new().set("rules", json!({ "minLength": "two" }));
    assert_eq!(update_field(&tree, "f-full-name", &patch), tree);
}

#[test]
fn delete_shrinks_ids_by_subtree_size() {
    let tree = contact();
    let before = tree.flatten_ids().len();
    let size = tree.find_field("f-phones").expect("array").subtree_size();
    assert_eq!(size, 3);

    let next = delete_field(&tree, 1, "f-phones");
    assert_eq!(next.flatten_ids().len(), before - size);
    assert!(!next.contains_id("f-phone-number"));
}

#[test]
fn delete_only_looks_in_the_given_section() {
    let tree = contact();
    assert_eq!(delete_field(&tree, 1, "f-age"), tree);
    assert_eq!(delete_field(&tree, 9, "f-age"), tree);
}

#[test]
fn delete_array_child_by_index() {
    let tree = contact();
    let next = delete_array_field(&tree, "f-phones", 0);
    let children = next
        .find_field("f-phones")
        .and_then(FieldNode::children)
        .expect("children");
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].id, "f-phone-slot");

    assert_eq!(delete_array_field(&tree, "f-phones", 5), tree);
    assert_eq!(delete_array_field(&tree, "f-age", 0), tree);
}

#[test]
fn reorder_is_a_permutation() {
    let tree = contact();
    let next = reorder_field(&tree, "f-full-name", "f-country");
    assert_eq!(
        section_ids(&next, 0),
        vec!["f-age", "f-country", "f-full-name", "f-newsletter"]
    );

    let mut before = tree.flatten_ids();
    let mut after = next.flatten_ids();
    before.sort();
    after.sort();
    assert_eq!(before, after);
}

#[test]
fn reorder_with_missing_or_equal_endpoints_is_identity() {
    let tree = contact();
    assert_eq!(reorder_field(&tree, "f-age", "missing"), tree);
    assert_eq!(reorder_field(&tree, "f-age", "f-age"), tree);
}

#[test]
fn reorder_does_not_cross_lists() {
    let tree = contact();
    assert_eq!(reorder_field(&tree, "f-age", "f-heading"), tree);
    assert_eq!(reorder_field(&tree, "f-phone-number", "f-age"), tree);
}

#[test]
fn reorder_inside_array() {
    let tree = contact();
    let next = reorder_field(&tree, "f-phone-slot", "f-phone-number");
    let ids: Vec<&str> = next
        .find_field("f-phones")
        .and_then(FieldNode::children)
        .expect("children")
        .iter()
        .map(|child| child.id.as_str())
        .collect();
    assert_eq!(ids, vec!["f-phone-slot", "f-phone-number"]);
}

#[test]
fn sections_can_be_reordered_and_deleted() {
    let tree = contact();
    let next = reorder_sections(&tree, "Extra", "Contact");
    assert_eq!(next.sections[0].name, "Extra");
    assert_eq!(reorder_sections(&tree, "Extra", "Nope"), tree);

    let next = delete_section(&tree, "Contact");
    assert_eq!(next.sections.len(), 1);
    assert!(!next.contains_id("f-age"));
    assert_eq!(delete_section(&tree, "Nope"), tree);
}

#[test]
fn promote_keeps_base_attributes() {
    let tree = contact();
    let next = promote_empty_field(&tree, "f-slot", &FieldType::Number.default_kind());
    let field = next.find_field("f-slot").expect("field");
    assert_eq!(field.field_type(), FieldType::Number);
    assert_eq!(field.name, "Pending");
    assert_eq!(field.camel_case_name, "pending");

    assert_eq!(
        promote_empty_field(&tree, "missing", &FieldType::Text.default_kind()),
        tree
    );
}

#[test]
fn promote_inside_array() {
    let tree = contact();
    let next = promote_empty_field(&tree, "f-phone-slot", &FieldType::Select.default_kind());
    let child = next.find_field("f-phone-slot").expect("child");
    match &child.kind {
        FieldKind::Select(choice) => assert_eq!(choice.options.len(), 2),
        other => panic!("expected select field, got {:?}", other),
    }
}

#[test]
fn move_into_array_appends_and_rejects_duplicates() {
    let tree = contact();
    let field = FieldNode::new("Extension", FieldType::Text.default_kind());
    let id = field.id.clone();
    let next = move_into_array(&tree, "f-phones", field.clone());
    let children = next
        .find_field("f-phones")
        .and_then(FieldNode::children)
        .expect("children");
    assert_eq!(children.last().map(|child| child.id.as_str()), Some(id.as_str()));

    assert_eq!(move_into_array(&next, "f-phones", field), next);
    assert_eq!(
        move_into_array(&tree, "f-age", FieldNode::empty("Other")),
        tree
    );

    let mut clash = FieldNode::empty("Other");
    clash.id = "f-age".into();
    assert_eq!(move_into_array(&tree, "f-phones", clash), tree);
}

#[test]
fn array_children_are_created_and_updated() {
    let tree = contact();
    let next = create_array_field(&tree, "f-phones", "Label");
    let children = next
        .find_field("f-phones")
        .and_then(FieldNode::children)
        .expect("children");
    assert_eq!(children.len(), 3);
    assert_eq!(children[2].camel_case_name, "label");
    assert_eq!(create_array_field(&next, "f-phones", "label"), next);
    assert_eq!(create_array_field(&tree, "f-phones", " "), tree);

    let updated = update_array_field(
        &tree,
        "f-phones",
        "f-phone-number",
        &FieldPatch::new().set("label", "Digits"),
    );
    assert_eq!(
        updated.find_field("f-phone-number").map(|f| f.label.as_str()),
        Some("Digits")
    );
    assert_eq!(
        update_array_field(&tree, "f-phones", "f-age", &FieldPatch::new().set("label", "x")),
        tree
    );
}

#[test]
fn reducer_replays_action_scripts() {
    let actions: Vec<BuilderAction> = serde_json::from_value(json!([
        { "action": "create_section", "name": "Contact" },
        { "action": "create_field", "section_index": 0, "name": "Full Name" },
        { "action": "create_section", "name": "Contact" }
    ]))
    .expect("actions");

    let tree = actions
        .iter()
        .fold(FormBuilderValue::default(), |tree, action| reduce(&tree, action));
    assert_eq!(tree.sections.len(), 1);
    assert_eq!(tree.sections[0].fields[0].camel_case_name, "fullName");

    let id = tree.sections[0].fields[0].id.clone();
    let tree = reduce(
        &tree,
        &BuilderAction::PromoteField {
            field_id: id.clone(),
            field_type: FieldType::Date,
        },
    );
    assert_eq!(
        tree.find_field(&id).map(FieldNode::field_type),
        Some(FieldType::Date)
    );
}

#[test]
fn legacy_documents_load_as_one_section() {
    let tree = FormBuilderValue::from_json(fixture("legacy_form")).expect("legacy");
    assert_eq!(tree.sections.len(), 1);
    assert_eq!(tree.sections[0].name, "Form");
    assert_eq!(tree.sections[0].fields.len(), 3);

    let encoded = serde_json::to_value(&tree).expect("encode");
    assert!(encoded.get("form").is_none());
    assert!(encoded.get("sections").is_some());
}

#[test]
fn empty_section_round_trips() {
    let tree = FormBuilderValue {
        sections: vec![Section::new("Only")],
    };
    let encoded = serde_json::to_string(&tree).expect("encode");
    let decoded = FormBuilderValue::from_json(&encoded).expect("decode");
    assert_eq!(decoded, tree);
}
