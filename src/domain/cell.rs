//! Persistent cell store.
//!
//! State lives in slots keyed by `(scope, position)`. A scope is a named
//! node of the computation graph, interned once from
//! `(parent scope, name, occurrence)`; the position counts slot visits
//! inside that scope during one cycle. A slot remembers the [`SlotKind`]
//! it was created with, and revisiting it as another kind is a structural
//! error reported by the evaluation context.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// A reference cell handed out by [`crate::domain::context::Context::cell`].
pub type Shared<T> = Rc<RefCell<T>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKind {
    Ref,
    Memo,
    Series,
    Effect,
}

impl fmt::Display for SlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotKind::Ref => write!(f, "ref"),
            SlotKind::Memo => write!(f, "memo"),
            SlotKind::Series => write!(f, "series"),
            SlotKind::Effect => write!(f, "effect"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(u32);

impl ScopeId {
    pub const ROOT: ScopeId = ScopeId(0);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotKey {
    pub scope: ScopeId,
    pub position: u32,
}

impl SlotKey {
    pub fn new(scope: ScopeId, position: u32) -> Self {
        Self { scope, position }
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.scope.0, self.position)
    }
}

/// Result of visiting a slot: its key and whether this visit created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Visit {
    pub key: SlotKey,
    pub fresh: bool,
}

/// Memoized value together with the dependencies it was computed from.
pub(crate) struct MemoCell<D, T> {
    pub(crate) deps: D,
    pub(crate) value: T,
}

struct Slot {
    kind: SlotKind,
    payload: Option<Box<dyn Any>>,
}

#[derive(Default)]
pub struct CellStore {
    slots: HashMap<SlotKey, Slot>,
    scope_paths: Vec<String>,
    scope_index: HashMap<(ScopeId, String, u32), ScopeId>,
}

impl CellStore {
    pub fn new() -> Self {
        Self {
            slots: HashMap::new(),
            scope_paths: vec!["root".to_string()],
            scope_index: HashMap::new(),
        }
    }

    /// Intern the child scope `name` (its `occurrence`-th use under `parent`).
    pub fn child_scope(&mut self, parent: ScopeId, name: &str, occurrence: u32) -> ScopeId {
        let key = (parent, name.to_string(), occurrence);
        if let Some(&id) = self.scope_index.get(&key) {
            return id;
        }
        let id = ScopeId(self.scope_paths.len() as u32);
        let parent_path = &self.scope_paths[parent.0 as usize];
        let path = if occurrence == 0 {
            format!("{parent_path}/{name}")
        } else {
            format!("{parent_path}/{name}#{occurrence}")
        };
        self.scope_paths.push(path);
        self.scope_index.insert(key, id);
        id
    }

    pub fn scope_path(&self, scope: ScopeId) -> &str {
        &self.scope_paths[scope.0 as usize]
    }

    /// Human-readable slot address, e.g. `root/RSI/EMA#1@0`.
    pub fn describe(&self, key: SlotKey) -> String {
        format!("{}@{}", self.scope_path(key.scope), key.position)
    }

    pub fn kind_of(&self, key: SlotKey) -> Option<SlotKind> {
        self.slots.get(&key).map(|s| s.kind)
    }

    /// Reserve a slot of `kind`; the payload is filled right after by the caller.
    pub fn reserve(&mut self, key: SlotKey, kind: SlotKind) {
        self.slots.insert(key, Slot { kind, payload: None });
    }

    pub fn fill(&mut self, key: SlotKey, payload: Box<dyn Any>) {
        if let Some(slot) = self.slots.get_mut(&key) {
            slot.payload = Some(payload);
        }
    }

    pub fn holds<T: 'static>(&self, key: SlotKey) -> bool {
        self.slots
            .get(&key)
            .and_then(|s| s.payload.as_ref())
            .is_some_and(|p| p.is::<T>())
    }

    pub fn payload_mut<T: 'static>(&mut self, key: SlotKey) -> Option<&mut T> {
        self.slots
            .get_mut(&key)
            .and_then(|s| s.payload.as_mut())
            .and_then(|p| p.downcast_mut::<T>())
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn scope_count(&self) -> usize {
        self.scope_paths.len()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }
}
