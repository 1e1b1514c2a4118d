#![allow(missing_docs)]

pub mod builder;
pub mod config;
pub mod defaults;
pub mod dnd;
pub mod error;
pub mod mutate;
pub mod naming;
pub mod numeric;
pub mod render;
pub mod schema;
pub mod session;
pub mod spec;
pub mod validate;
pub mod values_schema;

use serde_json::{Map, Value};

pub use builder::FormBuilder;
pub use config::{FormConfig, FormMode};
pub use defaults::derive_defaults;
pub use dnd::{
    DndData, DndItem, DragEvent, DragSession, DragState, DropAction, DropOutcome, DropZone,
};
pub use error::{CallbackError, FormError};
pub use mutate::{BuilderAction, FieldPatch, reduce};
pub use naming::to_camel_case;
pub use numeric::Rounding;
pub use render::{
    FieldComponents, field_components, render_builder_ui, render_palette, render_preview,
    render_text,
};
pub use schema::{FieldSchema, FormSchema};
pub use session::{DebounceOutcome, FormCallbacks, FormSession, SubmitOutcome};
pub use spec::{
    DefinitionIssue, FieldKind, FieldNode, FieldType, FormBuilderValue, FormDocument, Section,
    check_definition,
};
pub use validate::{ValidationError, ValidationResult, validate};
pub use values_schema::generate as values_schema;

/// Parse a form document in either shape and reject structural problems.
pub fn load_form(json: &str) -> Result<FormBuilderValue, FormError> {
    let form = FormBuilderValue::from_json(json)?;
    let issues = check_definition(&form);
    if issues.is_empty() {
        Ok(form)
    } else {
        Err(FormError::Definition(issues))
    }
}

/// Parse a JSON object of field values.
pub fn parse_values(json: &str) -> Result<Map<String, Value>, FormError> {
    serde_json::from_str(json).map_err(FormError::Values)
}

/// JSON Schema of the accepted form document shapes.
pub fn definition_schema() -> Value {
    serde_json::to_value(schemars::schema_for!(FormDocument)).unwrap_or(Value::Null)
}
