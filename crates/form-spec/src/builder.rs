use serde_json::{Map, Value};
use tracing::debug;

use crate::config::FormConfig;
use crate::dnd::{DragEvent, DragSession, DropOutcome};
use crate::mutate::{self, BuilderAction, FieldPatch};
use crate::render;
use crate::session::FormSession;
use crate::spec::form::FormBuilderValue;

/// Holds the current form tree and routes UI callbacks to the mutation
/// engine. Every callback reports whether the tree changed.
#[derive(Debug, Clone, Default)]
pub struct FormBuilder {
    tree: FormBuilderValue,
    drag: DragSession,
    revision: u64,
}

impl FormBuilder {
    pub fn new(tree: FormBuilderValue) -> Self {
        Self {
            tree,
            drag: DragSession::new(),
            revision: 0,
        }
    }

    pub fn tree(&self) -> &FormBuilderValue {
        &self.tree
    }

    pub fn into_tree(self) -> FormBuilderValue {
        self.tree
    }

    /// Incremented on every effective mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn drag(&self) -> &DragSession {
        &self.drag
    }

    pub fn dispatch(&mut self, action: &BuilderAction) -> bool {
        let next = mutate::reduce(&self.tree, action);
        self.commit(next)
    }

    pub fn apply_all<'a>(&mut self, actions: impl IntoIterator<Item = &'a BuilderAction>) -> usize {
        actions
            .into_iter()
            .filter(|action| self.dispatch(action))
            .count()
    }

    /// Gate for the "add section" affordance.
    pub fn can_add_section(&self, name: &str) -> bool {
        mutate::can_create_section(&self.tree, name)
    }

    /// Gate for the "add field" affordance.
    pub fn can_add_field(&self, section_index: usize, name: &str) -> bool {
        mutate::can_create_field(&self.tree, section_index, name)
    }

    pub fn on_section_create(&mut self, name: &str) -> bool {
        self.dispatch(&BuilderAction::CreateSection {
            name: name.to_string(),
        })
    }

    pub fn on_section_delete(&mut self, name: &str) -> bool {
        self.dispatch(&BuilderAction::DeleteSection {
            name: name.to_string(),
        })
    }

    pub fn on_field_create(&mut self, section_index: usize, name: &str) -> bool {
        self.dispatch(&BuilderAction::CreateField {
            section_index,
            name: name.to_string(),
        })
    }

    pub fn on_field_update(&mut self, field_id: &str, patch: FieldPatch) -> bool {
        self.dispatch(&BuilderAction::UpdateField {
            field_id: field_id.to_string(),
            patch,
        })
    }

    pub fn on_field_reorder(&mut self, from_id: &str, to_id: &str) -> bool {
        self.dispatch(&BuilderAction::ReorderField {
            from_id: from_id.to_string(),
            to_id: to_id.to_string(),
        })
    }

    /// Delete a top-level field wherever its section is.
    pub fn on_field_delete(&mut self, field_id: &str) -> bool {
        let Some(section_index) = self.tree.section_of(field_id) else {
            debug!(field_id, "field is not a top-level field; ignoring delete");
            return false;
        };
        self.dispatch(&BuilderAction::DeleteField {
            section_index,
            field_id: field_id.to_string(),
        })
    }

    pub fn on_array_field_create(&mut self, array_field_id: &str, name: &str) -> bool {
        self.dispatch(&BuilderAction::CreateArrayField {
            array_field_id: array_field_id.to_string(),
            name: name.to_string(),
        })
    }

    pub fn on_array_field_update(
        &mut self,
        array_field_id: &str,
        child_id: &str,
        patch: FieldPatch,
    ) -> bool {
        self.dispatch(&BuilderAction::UpdateArrayField {
            array_field_id: array_field_id.to_string(),
            child_id: child_id.to_string(),
            patch,
        })
    }

    pub fn on_array_field_delete(&mut self, array_field_id: &str, index: usize) -> bool {
        self.dispatch(&BuilderAction::DeleteArrayField {
            array_field_id: array_field_id.to_string(),
            index,
        })
    }

    /// Feed a pointer-tracker event; a valid drop is applied immediately.
    pub fn on_drag_event(&mut self, event: DragEvent) -> DropOutcome {
        let outcome = self.drag.handle(event);
        if let DropOutcome::Dropped(action) = &outcome {
            let next = action.apply(&self.tree);
            if !self.commit(next) {
                debug!(?action, "drop resolved but left the tree unchanged");
            }
        }
        outcome
    }

    pub fn render_ui(&self) -> Value {
        render::render_builder_ui(&self.tree)
    }

    /// Fresh preview/fill session for the current tree.
    pub fn preview_session(&self, config: FormConfig) -> FormSession {
        FormSession::new(&self.tree, config)
    }

    /// Update an existing preview after edits; returns whether its field set
    /// changed.
    pub fn sync_preview(&self, session: &mut FormSession) -> bool {
        session.sync_definition(&self.tree)
    }

    pub fn defaults(&self) -> Map<String, Value> {
        crate::defaults::derive_defaults(&self.tree)
    }

    fn commit(&mut self, next: FormBuilderValue) -> bool {
        if next == self.tree {
            return false;
        }
        self.tree = next;
        self.revision += 1;
        true
    }
}
