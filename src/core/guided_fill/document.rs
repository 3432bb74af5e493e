//! Form document: the target the guided-fill machine writes into.
//!
//! The state machine never touches the UI tree directly; it goes through the
//! [`FieldStore`] trait, which gives it field lookup, label resolution and
//! value writes. [`FormDocument`] is the server-side implementation, built
//! from the form definition the client sends at session configuration time.
//! Rendering (and any downstream listeners on the real document) reacts to
//! the `field_update` events the session layer emits after each write.

use std::collections::HashMap;

/// Opaque identifier of one form field. Order of appearance in a guided-fill
/// run defines the fill sequence.
pub type FieldId = String;

/// Field lookup and write capability injected into the guided-fill machine.
pub trait FieldStore {
    /// Whether the document contains the field.
    fn contains(&self, id: &str) -> bool;

    /// Human-friendly label for the field, if one was defined.
    fn label(&self, id: &str) -> Option<String>;

    /// Writes a value into the field. Returns false when the field is
    /// missing from the document.
    fn write(&mut self, id: &str, value: &str) -> bool;

    /// Current value of the field, if present and ever written.
    fn value(&self, id: &str) -> Option<String>;
}

/// One field of the form definition.
#[derive(Debug, Clone)]
struct FormField {
    label: Option<String>,
    value: Option<String>,
}

/// In-memory form document mirroring the client's form.
#[derive(Debug, Default)]
pub struct FormDocument {
    fields: HashMap<FieldId, FormField>,
}

impl FormDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field to the document. Later definitions replace earlier ones.
    pub fn add_field(&mut self, id: impl Into<FieldId>, label: Option<String>, value: Option<String>) {
        self.fields.insert(id.into(), FormField { label, value });
    }

    /// Number of fields in the document.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FieldStore for FormDocument {
    fn contains(&self, id: &str) -> bool {
        self.fields.contains_key(id)
    }

    fn label(&self, id: &str) -> Option<String> {
        self.fields.get(id).and_then(|f| f.label.clone())
    }

    fn write(&mut self, id: &str, value: &str) -> bool {
        match self.fields.get_mut(id) {
            Some(field) => {
                field.value = Some(value.to_string());
                true
            }
            None => false,
        }
    }

    fn value(&self, id: &str) -> Option<String> {
        self.fields.get(id).and_then(|f| f.value.clone())
    }
}
