//! Lexical scopes and versioned variable bindings.
//!
//! Level 0 is the outermost scope and is never popped. A binding remembers the
//! level it was declared at and the level of its latest write; the two differ
//! exactly when a nested scope wrote it and a reconciliation is owed.

use indexmap::IndexMap;

use crate::error::{LowerError, Result};
use crate::graph::NodeId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    /// Target type name (`System.Single`).
    pub ty: String,
    /// Node currently producing the variable's value. `None` until assigned.
    pub producer: Option<NodeId>,
    pub defining_level: usize,
    pub last_write_level: usize,
    /// Value as of the latest write at the defining level.
    pub checkpoint_source: Option<NodeId>,
    /// Register materialized by the first reconciliation. Set at most once.
    pub register: Option<NodeId>,
}

impl Binding {
    fn new(ty: &str, producer: Option<NodeId>, level: usize) -> Self {
        Self {
            ty: ty.to_string(),
            producer,
            defining_level: level,
            last_write_level: level,
            checkpoint_source: producer,
            register: None,
        }
    }

    /// Written from a nested scope since declaration.
    pub fn is_dirty(&self) -> bool {
        self.last_write_level != self.defining_level
    }
}

type Scope = IndexMap<String, Binding>;

#[derive(Debug, Clone)]
pub struct ScopeStack {
    scopes: Vec<Scope>,
    /// Routine parameters waiting for the routine body's scope.
    pending: Scope,
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeStack {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::new()],
            pending: Scope::new(),
        }
    }

    /// Current nesting depth (index of the innermost scope).
    pub fn depth(&self) -> usize {
        self.scopes.len() - 1
    }

    /// Queues a parameter binding for the next [`push`](Self::push).
    pub fn stage_parameter(&mut self, name: &str, ty: &str, producer: NodeId) -> Result<()> {
        if self.pending.contains_key(name) {
            return Err(LowerError::DuplicateDeclaration(name.to_string()));
        }
        self.pending
            .insert(name.to_string(), Binding::new(ty, Some(producer), 0));
        Ok(())
    }

    /// Opens a scope. Staged parameters are absorbed into it, exactly once.
    pub fn push(&mut self) {
        let level = self.scopes.len();
        let mut scope = std::mem::take(&mut self.pending);
        for binding in scope.values_mut() {
            binding.defining_level = level;
            binding.last_write_level = level;
        }
        self.scopes.push(scope);
    }

    pub fn pop(&mut self) -> Result<Scope> {
        if self.scopes.len() <= 1 {
            return Err(LowerError::MalformedCollectionState(
                "scope popped without a matching push".to_string(),
            ));
        }
        self.scopes
            .pop()
            .ok_or_else(|| LowerError::MalformedCollectionState("empty scope stack".to_string()))
    }

    pub fn declare(&mut self, name: &str, ty: &str, producer: Option<NodeId>) -> Result<()> {
        let level = self.depth();
        let scope = self
            .scopes
            .last_mut()
            .ok_or_else(|| LowerError::MalformedCollectionState("empty scope stack".to_string()))?;
        if scope.contains_key(name) {
            return Err(LowerError::DuplicateDeclaration(name.to_string()));
        }
        scope.insert(name.to_string(), Binding::new(ty, producer, level));
        Ok(())
    }

    /// Innermost binding of `name`.
    pub fn resolve(&self, name: &str) -> Result<&Binding> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name))
            .ok_or_else(|| LowerError::UnknownIdentifier(name.to_string()))
    }

    fn resolve_mut(&mut self, name: &str) -> Result<&mut Binding> {
        self.scopes
            .iter_mut()
            .rev()
            .find_map(|scope| scope.get_mut(name))
            .ok_or_else(|| LowerError::UnknownIdentifier(name.to_string()))
    }

    /// Records a new producer for `name` at the current depth.
    pub fn write(&mut self, name: &str, producer: NodeId) -> Result<()> {
        let level = self.depth();
        let binding = self.resolve_mut(name)?;
        binding.producer = Some(producer);
        binding.last_write_level = level;
        if level == binding.defining_level {
            binding.checkpoint_source = Some(producer);
        }
        Ok(())
    }

    /// Names of the bindings at `level` owing a reconciliation, in declaration order.
    pub fn dirty_at(&self, level: usize) -> Vec<String> {
        self.scopes
            .get(level)
            .map(|scope| {
                scope
                    .iter()
                    .filter(|(_, binding)| binding.is_dirty())
                    .map(|(name, _)| name.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn binding_at_mut(&mut self, level: usize, name: &str) -> Result<&mut Binding> {
        self.scopes
            .get_mut(level)
            .and_then(|scope| scope.get_mut(name))
            .ok_or_else(|| LowerError::UnknownIdentifier(name.to_string()))
    }
}
