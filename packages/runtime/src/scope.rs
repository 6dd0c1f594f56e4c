//! Hierarchical variable scopes.
//!
//! Scopes live in an arena owned by the runtime session rather than
//! hanging off instances directly; parent links are ids, so lookup
//! walks the chain without any shared ownership. A scope is created
//! with its instance and destroyed with it.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::warn;

/// Index into the session's scope arena. Internal to a session; ids
/// are only valid against the `Scopes` that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableAction {
    Create,
    Update,
    Delete,
}

/// Published synchronously to a scope's subscribers on every local
/// write, in application order.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableEvent {
    pub id: String,
    pub action: VariableAction,
    pub value: Option<Value>,
}

type Subscriber = Box<dyn Fn(&VariableEvent)>;

struct Scope {
    vars: BTreeMap<String, Value>,
    parent: Option<ScopeId>,
    subscribers: Vec<Subscriber>,
}

/// Arena of scope environments.
#[derive(Default)]
pub struct Scopes {
    slots: Vec<Option<Scope>>,
    free: Vec<usize>,
}

impl Scopes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, parent: Option<ScopeId>) -> ScopeId {
        let scope = Scope {
            vars: BTreeMap::new(),
            parent,
            subscribers: Vec::new(),
        };
        match self.free.pop() {
            Some(index) => {
                self.slots[index] = Some(scope);
                ScopeId(index)
            }
            None => {
                self.slots.push(Some(scope));
                ScopeId(self.slots.len() - 1)
            }
        }
    }

    pub fn destroy(&mut self, id: ScopeId) {
        if let Some(slot) = self.slots.get_mut(id.0) {
            if slot.take().is_some() {
                self.free.push(id.0);
            }
        }
    }

    pub fn parent(&self, id: ScopeId) -> Option<ScopeId> {
        self.scope(id).and_then(|scope| scope.parent)
    }

    pub fn set_parent(&mut self, id: ScopeId, parent: Option<ScopeId>) {
        if let Some(scope) = self.scope_mut(id) {
            scope.parent = parent;
        }
    }

    /// Resolve a variable, falling back along the parent chain. An
    /// unset variable is `None`, not an error.
    pub fn get(&self, id: ScopeId, var: &str) -> Option<&Value> {
        let mut current = Some(id);
        while let Some(scope_id) = current {
            let scope = self.scope(scope_id)?;
            if let Some(value) = scope.vars.get(var) {
                return Some(value);
            }
            current = scope.parent;
        }
        None
    }

    /// Whether the variable is bound here or anywhere up the chain.
    pub fn exists(&self, id: ScopeId, var: &str) -> bool {
        self.get(id, var).is_some()
    }

    /// Whether the variable is bound in this scope itself.
    pub fn exists_local(&self, id: ScopeId, var: &str) -> bool {
        self.scope(id)
            .map(|scope| scope.vars.contains_key(var))
            .unwrap_or(false)
    }

    /// Write a variable into this scope (never the parent chain) and
    /// notify this scope's subscribers.
    pub fn set(&mut self, id: ScopeId, var: &str, value: Value) {
        let action = {
            let scope = match self.scope_mut(id) {
                Some(scope) => scope,
                None => {
                    warn!(scope = id.0, var, "set on destroyed scope ignored");
                    return;
                }
            };
            let action = if scope.vars.contains_key(var) {
                VariableAction::Update
            } else {
                VariableAction::Create
            };
            scope.vars.insert(var.to_string(), value.clone());
            action
        };
        self.publish(
            id,
            VariableEvent {
                id: var.to_string(),
                action,
                value: Some(value),
            },
        );
    }

    /// Seed a default value: a no-op when the variable is already
    /// bound locally, so repeated seeding never clobbers a value set
    /// in between. Returns whether a binding was created.
    pub fn seed_default(&mut self, id: ScopeId, var: &str, value: Value) -> bool {
        if self.exists_local(id, var) {
            return false;
        }
        self.set(id, var, value);
        true
    }

    /// Drop a local binding, notifying subscribers with the last
    /// value before removal.
    pub fn remove(&mut self, id: ScopeId, var: &str) -> Option<Value> {
        let value = self.scope_mut(id)?.vars.remove(var)?;
        self.publish(
            id,
            VariableEvent {
                id: var.to_string(),
                action: VariableAction::Delete,
                value: Some(value.clone()),
            },
        );
        Some(value)
    }

    pub fn subscribe(&mut self, id: ScopeId, subscriber: impl Fn(&VariableEvent) + 'static) {
        if let Some(scope) = self.scope_mut(id) {
            scope.subscribers.push(Box::new(subscriber));
        }
    }

    fn scope(&self, id: ScopeId) -> Option<&Scope> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    fn scope_mut(&mut self, id: ScopeId) -> Option<&mut Scope> {
        self.slots.get_mut(id.0).and_then(Option::as_mut)
    }

    fn publish(&self, id: ScopeId, event: VariableEvent) {
        if let Some(scope) = self.scope(id) {
            for subscriber in &scope.subscribers {
                subscriber(&event);
            }
        }
    }
}
