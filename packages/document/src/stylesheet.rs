//! Stylesheets: id-keyed bags of style fields.

use serde_json::{Map, Value};

/// A stylesheet is an open-ended field bag. Individual fields are
/// replaced by partial updates; deletion removes the sheet wholesale.
#[derive(Debug, Clone, Default)]
pub struct StyleSheet {
    pub id: String,
    pub fields: Map<String, Value>,
}

impl StyleSheet {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: Map::new(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}
