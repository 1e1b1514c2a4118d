pub mod check;
pub mod field;
pub mod form;

pub use check::{DefinitionIssue, check_definition};
pub use field::{
    ArrayField, ChoiceField, ChoiceOption, DateField, FieldKind, FieldNode, FieldType,
    NumberField, NumberRules, Orientation, RadioGroupField, RadioOption, RuleConflict,
    SwitchField, SwitchOption, TextField, TextRules, TextareaField, new_field_id,
};
pub use form::{FormBuilderValue, FormDocument, LegacyForm, Section};
