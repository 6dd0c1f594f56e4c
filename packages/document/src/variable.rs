//! Variables: document-global or node-local named values.

use std::collections::BTreeMap;

use serde_json::Value;

/// A declared variable. `value` is the authored value; `default` is a
/// default-value expression evaluated when an instance scope is
/// seeded. The expression language is currently literals only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Variable {
    pub id: String,
    pub value: Option<Value>,
    pub default: Option<Value>,
}

impl Variable {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            value: None,
            default: None,
        }
    }

    /// Evaluate the default-value expression for scope seeding. Falls
    /// back to the authored value when no explicit default exists.
    pub fn default_value(&self) -> Option<Value> {
        self.default.clone().or_else(|| self.value.clone())
    }
}

/// An ordered collection of variables. BTreeMap keeps iteration
/// deterministic, which keeps seeding and event order deterministic.
#[derive(Debug, Clone, Default)]
pub struct VariableCollection {
    vars: BTreeMap<String, Variable>,
}

impl VariableCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&Variable> {
        self.vars.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Variable> {
        self.vars.get_mut(id)
    }

    pub fn insert(&mut self, var: Variable) {
        self.vars.insert(var.id.clone(), var);
    }

    pub fn remove(&mut self, id: &str) -> Option<Variable> {
        self.vars.remove(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.vars.values()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}
