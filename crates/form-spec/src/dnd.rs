use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::mutate::{promote_empty_field, reorder_field, reorder_sections};
use crate::spec::field::FieldType;
use crate::spec::form::FormBuilderValue;

/// Palette item; also tagged with the concrete field-type id.
pub const FIELD: &str = "FIELD";
/// Top-level field of a section.
pub const FORM_FIELD: &str = "FORM_FIELD";
/// Field nested inside an array-field.
pub const FORM_ARRAY_FIELD: &str = "FORM_ARRAY_FIELD";
/// Whole section.
pub const SECTION_FIELD: &str = "SECTION_FIELD";
/// Untyped top-level slot accepting palette items.
pub const FORM_FIELD_DROPPABLE: &str = "FORM_FIELD_DROPPABLE";
/// Untyped slot inside an array-field accepting palette items.
pub const FORM_FIELD_DROPPABLE_ARRAY: &str = "FORM_FIELD_DROPPABLE_ARRAY";

/// Compatibility tags carried by draggables and drop targets.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DndData {
    /// What the element is.
    #[serde(default)]
    pub variant: Vec<String>,
    /// What the element takes when used as a drop target.
    #[serde(default)]
    pub accepts: Vec<String>,
    /// Array-field owning the element, for elements nested in one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
}

impl DndData {
    pub fn palette(field_type: FieldType) -> Self {
        Self {
            variant: vec![FIELD.into(), field_type.as_str().into()],
            accepts: Vec::new(),
            container: None,
        }
    }

    /// A top-level field: reorderable, and a typing target while empty.
    pub fn form_field(field_type: FieldType) -> Self {
        let mut variant = vec![FORM_FIELD.to_string()];
        let mut accepts = vec![FORM_FIELD.to_string()];
        if field_type == FieldType::Empty {
            variant.push(FORM_FIELD_DROPPABLE.into());
            accepts.push(FIELD.into());
        }
        Self {
            variant,
            accepts,
            container: None,
        }
    }

    pub fn array_field(array_field_id: &str, field_type: FieldType) -> Self {
        let mut variant = vec![FORM_ARRAY_FIELD.to_string()];
        let mut accepts = vec![FORM_ARRAY_FIELD.to_string()];
        if field_type == FieldType::Empty {
            variant.push(FORM_FIELD_DROPPABLE_ARRAY.into());
            accepts.push(FIELD.into());
        }
        Self {
            variant,
            accepts,
            container: Some(array_field_id.to_string()),
        }
    }

    pub fn section() -> Self {
        Self {
            variant: vec![SECTION_FIELD.into()],
            accepts: vec![SECTION_FIELD.into()],
            container: None,
        }
    }

    pub fn is(&self, tag: &str) -> bool {
        self.variant.iter().any(|candidate| candidate == tag)
    }

    pub fn takes(&self, tag: &str) -> bool {
        self.accepts.iter().any(|candidate| candidate == tag)
    }

    /// Whether an item carrying `item` may be dropped here.
    pub fn accepts_item(&self, item: &DndData) -> bool {
        item.variant.iter().any(|tag| self.takes(tag))
    }

    /// Concrete type of a palette item.
    pub fn palette_type(&self) -> Option<FieldType> {
        if !self.is(FIELD) {
            return None;
        }
        self.variant.iter().find_map(|tag| {
            FieldType::PALETTE
                .iter()
                .copied()
                .find(|field_type| field_type.as_str() == tag)
        })
    }
}

/// Descriptor of the dragged element or of the target under the pointer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DndItem {
    pub id: String,
    #[serde(default)]
    pub data: DndData,
}

impl DndItem {
    pub fn new(id: impl Into<String>, data: DndData) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }
}

/// Lifecycle events reported by the pointer tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DragEvent {
    Start { active: DndItem },
    Over { over: Option<DndItem> },
    End { over: Option<DndItem> },
    Cancel,
}

/// Mutation a valid drop stands for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DropAction {
    Promote {
        target_id: String,
        field_type: FieldType,
    },
    ReorderFields {
        from_id: String,
        to_id: String,
    },
    ReorderSections {
        from: String,
        to: String,
    },
}

impl DropAction {
    pub fn apply(&self, tree: &FormBuilderValue) -> FormBuilderValue {
        match self {
            DropAction::Promote {
                target_id,
                field_type,
            } => promote_empty_field(tree, target_id, &field_type.default_kind()),
            DropAction::ReorderFields { from_id, to_id } => reorder_field(tree, from_id, to_id),
            DropAction::ReorderSections { from, to } => reorder_sections(tree, from, to),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    /// Start/over bookkeeping; nothing to apply.
    Pending,
    Dropped(DropAction),
    /// Released outside any target or on an incompatible one.
    Rejected,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        active: DndItem,
        over: Option<DndItem>,
    },
}

/// Per-interaction state machine: idle, dragging, then dropped or cancelled.
#[derive(Debug, Clone, Default)]
pub struct DragSession {
    state: DragState,
}

impl DragSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    /// Element being dragged, for drawing its overlay.
    pub fn active(&self) -> Option<&DndItem> {
        match &self.state {
            DragState::Dragging { active, .. } => Some(active),
            DragState::Idle => None,
        }
    }

    pub fn handle(&mut self, event: DragEvent) -> DropOutcome {
        match event {
            DragEvent::Start { active } => {
                debug!(id = %active.id, variant = ?active.data.variant, "drag started");
                self.state = DragState::Dragging { active, over: None };
                DropOutcome::Pending
            }
            DragEvent::Over { over } => {
                if let DragState::Dragging { over: current, .. } = &mut self.state {
                    *current = over;
                }
                DropOutcome::Pending
            }
            DragEvent::End { over } => match std::mem::take(&mut self.state) {
                DragState::Dragging { active, .. } => match over {
                    Some(target) => match resolve_drop(&active, &target) {
                        Some(action) => DropOutcome::Dropped(action),
                        None => DropOutcome::Rejected,
                    },
                    None => DropOutcome::Rejected,
                },
                DragState::Idle => {
                    debug!("drag end without a drag in progress");
                    DropOutcome::Rejected
                }
            },
            DragEvent::Cancel => {
                self.state = DragState::Idle;
                DropOutcome::Cancelled
            }
        }
    }
}

/// Decide what dropping `active` onto `over` means, if anything.
pub fn resolve_drop(active: &DndItem, over: &DndItem) -> Option<DropAction> {
    if !over.data.accepts_item(&active.data) {
        debug!(
            active = %active.id,
            over = %over.id,
            "drop target does not accept the dragged variant"
        );
        return None;
    }

    if let Some(field_type) = active.data.palette_type() {
        if field_type == FieldType::Title && over.data.is(FORM_FIELD_DROPPABLE_ARRAY) {
            debug!(over = %over.id, "title fields cannot go inside an array-field");
            return None;
        }
        let droppable =
            over.data.is(FORM_FIELD_DROPPABLE) || over.data.is(FORM_FIELD_DROPPABLE_ARRAY);
        return droppable.then(|| DropAction::Promote {
            target_id: over.id.clone(),
            field_type,
        });
    }

    if active.id == over.id {
        return None;
    }

    if active.data.is(SECTION_FIELD) && over.data.is(SECTION_FIELD) {
        return Some(DropAction::ReorderSections {
            from: active.id.clone(),
            to: over.id.clone(),
        });
    }

    if active.data.is(FORM_ARRAY_FIELD) && over.data.is(FORM_ARRAY_FIELD) {
        if active.data.container != over.data.container {
            debug!(active = %active.id, over = %over.id, "array fields belong to different arrays");
            return None;
        }
        return Some(DropAction::ReorderFields {
            from_id: active.id.clone(),
            to_id: over.id.clone(),
        });
    }

    if active.data.is(FORM_FIELD) && over.data.is(FORM_FIELD) {
        return Some(DropAction::ReorderFields {
            from_id: active.id.clone(),
            to_id: over.id.clone(),
        });
    }

    None
}

/// One registered drop target. Zones act independently: a zone only
/// responds to a release that happens over itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropZone {
    pub target: DndItem,
}

impl DropZone {
    pub fn new(target: DndItem) -> Self {
        Self { target }
    }

    pub fn on_drop(&self, active: &DndItem, over: Option<&DndItem>) -> Option<DropAction> {
        let over = over?;
        if over.id != self.target.id || !self.target.data.accepts_item(&active.data) {
            return None;
        }
        resolve_drop(active, &self.target)
    }
}
