use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::naming::to_camel_case;
use crate::numeric::Rounding;

/// Discriminant of a [`FieldKind`], used as the key of the palette and
/// rendering tables.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
pub enum FieldType {
    #[serde(rename = "text-field")]
    Text,
    #[serde(rename = "textarea-field")]
    Textarea,
    #[serde(rename = "number-field")]
    Number,
    #[serde(rename = "date-field")]
    Date,
    #[serde(rename = "switch-field")]
    Switch,
    #[serde(rename = "radio-group-field")]
    RadioGroup,
    #[serde(rename = "select-field")]
    Select,
    #[serde(rename = "combobox-field")]
    Combobox,
    #[serde(rename = "array-field")]
    Array,
    #[serde(rename = "title-field")]
    Title,
    #[serde(rename = "empty")]
    Empty,
}

impl FieldType {
    /// Every type that can be dragged from the palette.
    pub const PALETTE: [FieldType; 10] = [
        FieldType::Text,
        FieldType::Textarea,
        FieldType::Number,
        FieldType::Date,
        FieldType::Switch,
        FieldType::RadioGroup,
        FieldType::Select,
        FieldType::Combobox,
        FieldType::Array,
        FieldType::Title,
    ];

    /// Tag used on the wire and in drag-and-drop variants.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text-field",
            FieldType::Textarea => "textarea-field",
            FieldType::Number => "number-field",
            FieldType::Date => "date-field",
            FieldType::Switch => "switch-field",
            FieldType::RadioGroup => "radio-group-field",
            FieldType::Select => "select-field",
            FieldType::Combobox => "combobox-field",
            FieldType::Array => "array-field",
            FieldType::Title => "title-field",
            FieldType::Empty => "empty",
        }
    }

    /// Human label shown in the palette sidebar.
    pub fn display_name(&self) -> &'static str {
        match self {
            FieldType::Text => "Text",
            FieldType::Textarea => "Textarea",
            FieldType::Number => "Number",
            FieldType::Date => "Date",
            FieldType::Switch => "Switch",
            FieldType::RadioGroup => "Radio Group",
            FieldType::Select => "Select",
            FieldType::Combobox => "Combobox",
            FieldType::Array => "Array",
            FieldType::Title => "Title",
            FieldType::Empty => "Empty",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::PALETTE
            .iter()
            .chain(std::iter::once(&FieldType::Empty))
            .copied()
            .find(|kind| kind.as_str() == tag)
    }

    /// Whether values of this type participate in the derived schema.
    pub fn holds_value(&self) -> bool {
        !matches!(self, FieldType::Title | FieldType::Empty)
    }

    /// Attribute template merged onto a node when it is promoted to this type.
    pub fn default_kind(&self) -> FieldKind {
        match self {
            FieldType::Text => FieldKind::Text(TextField::default()),
            FieldType::Textarea => FieldKind::Textarea(TextareaField::default()),
            FieldType::Number => FieldKind::Number(NumberField::default()),
            FieldType::Date => FieldKind::Date(DateField::default()),
            FieldType::Switch => FieldKind::Switch(SwitchField {
                options: vec![SwitchOption::new("Enabled")],
            }),
            FieldType::RadioGroup => FieldKind::RadioGroup(RadioGroupField {
                required: true,
                default_value: None,
                options: vec![
                    RadioOption::new("Option 1", "option1"),
                    RadioOption::new("Option 2", "option2"),
                ],
            }),
            FieldType::Select => FieldKind::Select(ChoiceField::with_sample_options()),
            FieldType::Combobox => FieldKind::Combobox(ChoiceField::with_sample_options()),
            FieldType::Array => FieldKind::Array(ArrayField::default()),
            FieldType::Title => FieldKind::Title,
            FieldType::Empty => FieldKind::Empty,
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FieldType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::from_tag(value.trim()).ok_or_else(|| format!("unknown field type '{}'", value))
    }
}

fn default_true() -> bool {
    true
}

fn default_rows() -> u32 {
    3
}

/// Layout of label and input for text-like fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Horizontal,
    #[default]
    Vertical,
    Responsive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct TextRules {
    #[serde(default)]
    pub min_length: Option<u32>,
    #[serde(default)]
    pub max_length: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TextField {
    #[serde(default)]
    pub placeholder: String,
    #[serde(default)]
    pub orientation: Orientation,
    #[serde(default)]
    pub show_character_count: bool,
    #[serde(default)]
    pub show_clear_button: bool,
    #[serde(default = "default_true")]
    pub show_error_message: bool,
    #[serde(default)]
    pub rules: TextRules,
}

impl Default for TextField {
    fn default() -> Self {
        Self {
            placeholder: String::new(),
            orientation: Orientation::default(),
            show_character_count: false,
            show_clear_button: false,
            show_error_message: true,
            rules: TextRules::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TextareaField {
    #[serde(default)]
    pub placeholder: String,
    #[serde(default)]
    pub orientation: Orientation,
    #[serde(default)]
    pub show_character_count: bool,
    #[serde(default = "default_true")]
    pub show_error_message: bool,
    #[serde(default = "default_rows")]
    pub rows: u32,
    #[serde(default)]
    pub rules: TextRules,
}

impl Default for TextareaField {
    fn default() -> Self {
        Self {
            placeholder: String::new(),
            orientation: Orientation::default(),
            show_character_count: false,
            show_error_message: true,
            rows: default_rows(),
            rules: TextRules::default(),
        }
    }
}

/// Numeric constraints. At most one bound per side may be set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct NumberRules {
    #[serde(default)]
    pub greater_than: Option<f64>,
    #[serde(default)]
    pub greater_than_or_equal_to: Option<f64>,
    #[serde(default)]
    pub less_than: Option<f64>,
    #[serde(default)]
    pub less_than_or_equal_to: Option<f64>,
    #[serde(default)]
    pub positive: bool,
    #[serde(default)]
    pub negative: bool,
    #[serde(default)]
    pub integer: bool,
    #[serde(default)]
    pub exact_digits: Option<u32>,
    #[serde(default)]
    pub precision: Option<u32>,
    #[serde(default)]
    pub rounding: Option<Rounding>,
}

/// Reasons a [`NumberRules`] value is rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuleConflict {
    #[error("greaterThan and greaterThanOrEqualTo are mutually exclusive")]
    LowerBounds,
    #[error("lessThan and lessThanOrEqualTo are mutually exclusive")]
    UpperBounds,
    #[error("lower bound {lower} must be below upper bound {upper}")]
    EmptyRange { lower: f64, upper: f64 },
    #[error("positive and negative cannot both be required")]
    Sign,
}

impl NumberRules {
    pub fn lower_bound(&self) -> Option<f64> {
        self.greater_than.or(self.greater_than_or_equal_to)
    }

    pub fn upper_bound(&self) -> Option<f64> {
        self.less_than.or(self.less_than_or_equal_to)
    }

    pub fn check(&self) -> Result<(), RuleConflict> {
        if self.greater_than.is_some() && self.greater_than_or_equal_to.is_some() {
            return Err(RuleConflict::LowerBounds);
        }
        if self.less_than.is_some() && self.less_than_or_equal_to.is_some() {
            return Err(RuleConflict::UpperBounds);
        }
        if let (Some(lower), Some(upper)) = (self.lower_bound(), self.upper_bound())
            && lower >= upper
        {
            return Err(RuleConflict::EmptyRange { lower, upper });
        }
        if self.positive && self.negative {
            return Err(RuleConflict::Sign);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NumberField {
    #[serde(default)]
    pub placeholder: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_text: Option<String>,
    #[serde(default = "default_true")]
    pub show_error_message: bool,
    #[serde(default = "default_true")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<f64>,
    #[serde(default)]
    pub rules: NumberRules,
}

impl Default for NumberField {
    fn default() -> Self {
        Self {
            placeholder: String::new(),
            unit_text: None,
            show_error_message: true,
            required: true,
            default_value: None,
            rules: NumberRules::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DateField {
    #[serde(default)]
    pub placeholder: String,
    #[serde(default = "default_true")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

impl Default for DateField {
    fn default() -> Self {
        Self {
            placeholder: String::new(),
            required: true,
            default_value: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ChoiceOption {
    pub label: String,
    pub value: String,
}

impl ChoiceOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Shared payload of `select-field` and `combobox-field`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceField {
    #[serde(default)]
    pub placeholder: String,
    #[serde(default = "default_true")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(default)]
    pub options: Vec<ChoiceOption>,
}

impl ChoiceField {
    fn with_sample_options() -> Self {
        Self {
            placeholder: "Select an option".into(),
            required: true,
            default_value: None,
            options: vec![
                ChoiceOption::new("Option 1", "option1"),
                ChoiceOption::new("Option 2", "option2"),
            ],
        }
    }

    pub fn contains(&self, value: &str) -> bool {
        self.options.iter().any(|option| option.value == value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SwitchOption {
    pub name: String,
    pub camel_case_name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SwitchOption {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            camel_case_name: to_camel_case(name),
            label: name.trim().to_string(),
            description: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
pub struct SwitchField {
    #[serde(default)]
    pub options: Vec<SwitchOption>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RadioOption {
    pub label: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl RadioOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            description: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RadioGroupField {
    #[serde(default = "default_true")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(default)]
    pub options: Vec<RadioOption>,
}

/// Repeatable group of nested fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct ArrayField {
    #[serde(default)]
    pub fields: Vec<FieldNode>,
    #[serde(default)]
    pub min_items: Option<u32>,
    #[serde(default)]
    pub max_items: Option<u32>,
}

/// Variant-specific attributes, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type")]
pub enum FieldKind {
    #[serde(rename = "text-field")]
    Text(TextField),
    #[serde(rename = "textarea-field")]
    Textarea(TextareaField),
    #[serde(rename = "number-field")]
    Number(NumberField),
    #[serde(rename = "date-field")]
    Date(DateField),
    #[serde(rename = "switch-field")]
    Switch(SwitchField),
    #[serde(rename = "radio-group-field")]
    RadioGroup(RadioGroupField),
    #[serde(rename = "select-field")]
    Select(ChoiceField),
    #[serde(rename = "combobox-field")]
    Combobox(ChoiceField),
    #[serde(rename = "array-field")]
    Array(ArrayField),
    #[serde(rename = "title-field")]
    Title,
    #[serde(rename = "empty")]
    Empty,
}

impl FieldKind {
    pub fn field_type(&self) -> FieldType {
        match self {
            FieldKind::Text(_) => FieldType::Text,
            FieldKind::Textarea(_) => FieldType::Textarea,
            FieldKind::Number(_) => FieldType::Number,
            FieldKind::Date(_) => FieldType::Date,
            FieldKind::Switch(_) => FieldType::Switch,
            FieldKind::RadioGroup(_) => FieldType::RadioGroup,
            FieldKind::Select(_) => FieldType::Select,
            FieldKind::Combobox(_) => FieldType::Combobox,
            FieldKind::Array(_) => FieldType::Array,
            FieldKind::Title => FieldType::Title,
            FieldKind::Empty => FieldType::Empty,
        }
    }
}

/// A single node of the form tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldNode {
    pub id: String,
    pub name: String,
    pub camel_case_name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl FieldNode {
    /// New untyped slot with a fresh id.
    pub fn empty(name: &str) -> Self {
        Self::new(name, FieldKind::Empty)
    }

    pub fn new(name: &str, kind: FieldKind) -> Self {
        Self {
            id: new_field_id(),
            name: name.trim().to_string(),
            camel_case_name: to_camel_case(name),
            label: name.trim().to_string(),
            description: None,
            kind,
        }
    }

    pub fn field_type(&self) -> FieldType {
        self.kind.field_type()
    }

    /// Nested fields when this node is an array-field.
    pub fn children(&self) -> Option<&[FieldNode]> {
        match &self.kind {
            FieldKind::Array(array) => Some(&array.fields),
            _ => None,
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<FieldNode>> {
        match &mut self.kind {
            FieldKind::Array(array) => Some(&mut array.fields),
            _ => None,
        }
    }

    /// Number of nodes in this subtree, the node itself included.
    pub fn subtree_size(&self) -> usize {
        1 + self
            .children()
            .map(|children| children.iter().map(FieldNode::subtree_size).sum())
            .unwrap_or(0)
    }

    pub fn collect_ids(&self, out: &mut Vec<String>) {
        out.push(self.id.clone());
        if let Some(children) = self.children() {
            for child in children {
                child.collect_ids(out);
            }
        }
    }
}

/// Random identifier assigned to a node at creation.
pub fn new_field_id() -> String {
    Uuid::new_v4().simple().to_string()
}
