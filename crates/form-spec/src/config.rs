use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

fn default_debounce_ms() -> u64 {
    500
}

/// Whether the fill form creates a new record or edits an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum FormMode {
    #[default]
    Create,
    Update,
}

/// Options of a fill session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FormConfig {
    /// Quiet period after the last change before `on_debounce_update` fires.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default)]
    pub mode: FormMode,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            mode: FormMode::default(),
        }
    }
}

impl FormConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
