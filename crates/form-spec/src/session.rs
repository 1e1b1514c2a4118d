use std::time::Instant;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::config::{FormConfig, FormMode};
use crate::error::CallbackError;
use crate::schema::{FieldSchema, FormSchema, SchemaEntry};
use crate::spec::field::FieldType;
use crate::spec::form::FormBuilderValue;
use crate::validate::{ValidationError, ValidationResult, parse};

/// Submission hooks implemented by the embedding application.
pub trait FormCallbacks {
    /// Receives every parsed value when a new record is submitted.
    fn on_create(&mut self, _values: &Map<String, Value>) -> Result<(), CallbackError> {
        Ok(())
    }

    /// Receives only the values that differ from the baseline.
    fn on_update(&mut self, _changed: &Map<String, Value>) -> Result<(), CallbackError> {
        Ok(())
    }

    fn on_debounce_update(&mut self, _changed: &Map<String, Value>) -> Result<(), CallbackError> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Nothing changed since the last reset.
    Pristine,
    Invalid(ValidationResult),
    /// The callback accepted this payload; the baseline now matches.
    Submitted(Map<String, Value>),
    /// The callback failed; edits are kept.
    Failed(CallbackError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DebounceOutcome {
    Sent(Map<String, Value>),
    Failed(CallbackError),
}

/// State of one fill form bound to a form definition.
#[derive(Debug, Clone)]
pub struct FormSession {
    config: FormConfig,
    schema: FormSchema,
    values: Map<String, Value>,
    baseline: Map<String, Value>,
    validation: ValidationResult,
    last_change: Option<Instant>,
}

impl FormSession {
    pub fn new(form: &FormBuilderValue, config: FormConfig) -> Self {
        Self::with_values(form, config, &Map::new())
    }

    /// Open the form on an existing record; `initial` overrides defaults for
    /// the keys the form knows about.
    pub fn with_values(
        form: &FormBuilderValue,
        config: FormConfig,
        initial: &Map<String, Value>,
    ) -> Self {
        let schema = FormSchema::from_form(form);
        let mut baseline = schema.defaults();
        for (key, value) in initial {
            if baseline.contains_key(key) {
                baseline.insert(key.clone(), value.clone());
            } else {
                debug!(key, "initial value has no matching field; dropping it");
            }
        }
        let mut session = Self {
            config,
            schema,
            values: baseline.clone(),
            baseline,
            validation: ValidationResult::default(),
            last_change: None,
        };
        session.revalidate();
        session
    }

    pub fn config(&self) -> &FormConfig {
        &self.config
    }

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn baseline(&self) -> &Map<String, Value> {
        &self.baseline
    }

    pub fn validation(&self) -> &ValidationResult {
        &self.validation
    }

    pub fn field_errors<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a ValidationError> {
        self.validation.errors_for(key)
    }

    /// Re-derive schema and defaults after the definition changed.
    ///
    /// Values of fields that survive with the same type are kept; new fields
    /// get their defaults and removed fields are dropped. Returns whether the
    /// field set changed.
    pub fn sync_definition(&mut self, form: &FormBuilderValue) -> bool {
        let schema = FormSchema::from_form(form);
        let changed = schema.signature() != self.schema.signature();
        if changed {
            self.values = reconcile_object(&self.schema, &schema, &self.values);
            self.baseline = reconcile_object(&self.schema, &schema, &self.baseline);
            debug!(fields = schema.entries.len(), "field set changed; defaults re-derived");
        }
        self.schema = schema;
        self.revalidate();
        changed
    }

    /// Record a value change; ignored for keys the form does not define.
    pub fn set_value(&mut self, key: &str, value: Value, now: Instant) -> bool {
        if self.schema.get(key).is_none() {
            debug!(key, "no field with this key; ignoring change");
            return false;
        }
        self.values.insert(key.to_string(), value);
        self.last_change = Some(now);
        self.revalidate();
        true
    }

    /// Append a row of defaults to an array-field value.
    pub fn add_row(&mut self, key: &str, now: Instant) -> bool {
        let Some(SchemaEntry {
            schema: FieldSchema::Array { item, .. },
            ..
        }) = self.schema.get(key)
        else {
            debug!(key, "not an array-field; ignoring add row");
            return false;
        };
        let row = Value::Object(item.defaults());
        let mut rows = self
            .values
            .get(key)
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        rows.push(row);
        self.set_value(key, Value::Array(rows), now)
    }

    pub fn remove_row(&mut self, key: &str, index: usize, now: Instant) -> bool {
        let Some(mut rows) = self.values.get(key).and_then(Value::as_array).cloned() else {
            return false;
        };
        if index >= rows.len() {
            debug!(key, index, "row not found; ignoring remove");
            return false;
        }
        rows.remove(index);
        self.set_value(key, Value::Array(rows), now)
    }

    pub fn is_dirty(&self) -> bool {
        self.values != self.baseline
    }

    /// Values that differ from the last-reset baseline.
    pub fn dirty_values(&self) -> Map<String, Value> {
        self.values
            .iter()
            .filter(|(key, value)| self.baseline.get(*key) != Some(*value))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Submission is allowed only for a valid, modified form.
    pub fn can_submit(&self) -> bool {
        self.validation.valid && self.is_dirty()
    }

    /// Drop unsaved edits.
    pub fn reset(&mut self) {
        self.values = self.baseline.clone();
        self.last_change = None;
        self.revalidate();
    }

    pub fn submit(&mut self, callbacks: &mut dyn FormCallbacks) -> SubmitOutcome {
        if !self.is_dirty() {
            return SubmitOutcome::Pristine;
        }
        let parsed = match parse(&self.schema, &Value::Object(self.values.clone())) {
            Ok(Value::Object(parsed)) => parsed,
            Ok(_) => Map::new(),
            Err(result) => {
                debug!(errors = result.errors.len(), "submission blocked by validation");
                self.validation = result.clone();
                return SubmitOutcome::Invalid(result);
            }
        };

        let (payload, result) = match self.config.mode {
            FormMode::Create => {
                let result = callbacks.on_create(&parsed);
                (parsed, result)
            }
            FormMode::Update => {
                let changed = self.changed_subset(&parsed);
                let result = callbacks.on_update(&changed);
                (changed, result)
            }
        };

        match result {
            Ok(()) => {
                info!(fields = payload.len(), mode = ?self.config.mode, "form submitted");
                self.baseline = self.values.clone();
                self.last_change = None;
                SubmitOutcome::Submitted(payload)
            }
            Err(err) => {
                warn!(error = %err, "submission callback failed; keeping edits");
                SubmitOutcome::Failed(err)
            }
        }
    }

    /// Fire `on_debounce_update` once the quiet period since the last change
    /// has elapsed. Only update-mode sessions propagate debounced changes.
    pub fn poll(
        &mut self,
        now: Instant,
        callbacks: &mut dyn FormCallbacks,
    ) -> Option<DebounceOutcome> {
        if self.config.mode != FormMode::Update {
            return None;
        }
        let last = self.last_change?;
        if now.saturating_duration_since(last) < self.config.debounce() {
            return None;
        }
        self.last_change = None;
        if !self.is_dirty() {
            return None;
        }
        let parsed = match parse(&self.schema, &Value::Object(self.values.clone())) {
            Ok(Value::Object(parsed)) => parsed,
            Ok(_) => return None,
            Err(_) => {
                debug!("debounced update skipped while the form is invalid");
                return None;
            }
        };
        let changed = self.changed_subset(&parsed);
        match callbacks.on_debounce_update(&changed) {
            Ok(()) => {
                debug!(fields = changed.len(), "debounced update sent");
                self.baseline = self.values.clone();
                Some(DebounceOutcome::Sent(changed))
            }
            Err(err) => {
                warn!(error = %err, "debounced update failed; keeping edits for retry");
                Some(DebounceOutcome::Failed(err))
            }
        }
    }

    fn changed_subset(&self, parsed: &Map<String, Value>) -> Map<String, Value> {
        self.dirty_values()
            .keys()
            .filter_map(|key| parsed.get(key).map(|value| (key.clone(), value.clone())))
            .collect()
    }

    fn revalidate(&mut self) {
        let values = Value::Object(self.values.clone());
        self.validation = crate::validate::validate(&self.schema, &values);
    }
}

fn reconcile_object(
    old: &FormSchema,
    new: &FormSchema,
    values: &Map<String, Value>,
) -> Map<String, Value> {
    new.entries
        .iter()
        .map(|entry| {
            let value = match (old.get(&entry.key), values.get(&entry.key)) {
                (Some(previous), Some(value)) if previous.field_type == entry.field_type => {
                    reconcile_value(previous, entry, value)
                }
                _ => entry.default.clone(),
            };
            (entry.key.clone(), value)
        })
        .collect()
}

fn reconcile_value(previous: &SchemaEntry, entry: &SchemaEntry, value: &Value) -> Value {
    match (&previous.schema, &entry.schema, entry.field_type) {
        (FieldSchema::Array { item: old_item, .. }, FieldSchema::Array { item, .. }, _) => {
            let rows = value
                .as_array()
                .map(|rows| {
                    rows.iter()
                        .map(|row| {
                            let empty = Map::new();
                            let row = row.as_object().unwrap_or(&empty);
                            Value::Object(reconcile_object(old_item, item, row))
                        })
                        .collect()
                })
                .unwrap_or_default();
            Value::Array(rows)
        }
        (_, FieldSchema::Switch { keys }, FieldType::Switch) => {
            let current = value.as_object();
            Value::Object(
                keys.iter()
                    .map(|key| {
                        let flag = current
                            .and_then(|map| map.get(key))
                            .and_then(Value::as_bool)
                            .unwrap_or(false);
                        (key.clone(), Value::Bool(flag))
                    })
                    .collect(),
            )
        }
        _ => value.clone(),
    }
}
