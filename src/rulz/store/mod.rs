//! # Storage Layer
//!
//! This module defines the persistence abstraction for rulz. The [`RuleStore`]
//! trait lets the manager work with interchangeable backends.
//!
//! ## Design Rationale
//!
//! Storage is abstracted behind a trait to:
//! - Enable **testing** with `MemoryStore` (no filesystem or network needed)
//! - Allow the **remote document collection** and the **local JSON file** to
//!   be swapped per session without touching manager logic
//! - Keep validation and scope resolution **decoupled** from persistence
//!
//! ## Implementations
//!
//! - [`local::LocalStore`]: JSON-file storage
//!   - One `rules.json` document holding the whole rule array
//!   - Whole-file replace on every write, atomic via tmp + rename
//!   - Missing file reads as an empty rule set
//!
//! - [`remote::RemoteStore`]: HTTP document-collection storage
//!   - Connects with bounded, optionally exponential retry
//!   - One document per rule, keyed by rule id
//!
//! - [`memory::MemoryStore`]: in-memory storage for testing
//!   - No persistence
//!   - Can simulate write failures to exercise fallback and rollback paths
//!
//! The backend chosen at initialization stays active for the session; when a
//! remote write fails and local fallback is enabled, the manager retries that
//! single write against a `LocalStore` without re-selecting.

use crate::error::Result;
use crate::model::Rule;
use std::fmt;
use uuid::Uuid;

pub mod local;
pub mod memory;
pub mod remote;

/// Which kind of backend is serving a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Local,
    Remote,
    Memory,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BackendKind::Local => "local",
            BackendKind::Remote => "remote",
            BackendKind::Memory => "memory",
        };
        f.write_str(name)
    }
}

/// Abstract interface for durable rule storage.
///
/// All methods take `&self`; implementations use interior mutability where
/// they hold state, since the engine is single-threaded per session.
pub trait RuleStore {
    /// Which backend this is, for status reporting.
    fn kind(&self) -> BackendKind;

    /// Load every stored rule. Backends make no ordering promise here;
    /// the manager normalizes its cache to creation order.
    fn list_rules(&self) -> Result<Vec<Rule>>;

    /// Save a rule (create or update by rule id).
    fn save_rule(&self, rule: &Rule) -> Result<()>;

    /// Delete a rule permanently. Returns whether a record was found;
    /// deleting an absent id is not an error.
    fn delete_rule(&self, id: &Uuid) -> Result<bool>;

    /// Delete every stored rule.
    fn clear_rules(&self) -> Result<()>;
}

// A shared handle is a store too; lets an embedder (or a test) keep a view
// into a backend the manager owns.
impl<S: RuleStore> RuleStore for std::rc::Rc<S> {
    fn kind(&self) -> BackendKind {
        (**self).kind()
    }

    fn list_rules(&self) -> Result<Vec<Rule>> {
        (**self).list_rules()
    }

    fn save_rule(&self, rule: &Rule) -> Result<()> {
        (**self).save_rule(rule)
    }

    fn delete_rule(&self, id: &Uuid) -> Result<bool> {
        (**self).delete_rule(id)
    }

    fn clear_rules(&self) -> Result<()> {
        (**self).clear_rules()
    }
}
