//! # Rulz Architecture
//!
//! Rulz is a **UI-agnostic rule engine** for AI code-completion
//! personalization: users author short natural-language coding preferences,
//! scope them, and the engine decides which ones apply to the editing
//! context at hand. Editor commands, prompt assembly, and any generative
//! HTTP calls live in the embedding application; this crate only owns the
//! rules themselves.
//!
//! ## The Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Manager (manager.rs)                                       │
//! │  - Single entry point: add/remove/list/resolve/subscribe    │
//! │  - Selects the backend once per session, owns the cache     │
//! │  - Optimistic mutation with rollback, per-op fallback       │
//! └─────────────────────────────────────────────────────────────┘
//!                 │                         │
//!                 ▼                         ▼
//! ┌───────────────────────────┐ ┌───────────────────────────────┐
//! │  Rules (model.rs,         │ │  Storage (store/)             │
//! │  validate.rs, scope.rs)   │ │  - RuleStore trait            │
//! │  - Rule entity & scopes   │ │  - LocalStore: one JSON file  │
//! │  - Text normalization     │ │  - RemoteStore: HTTP document │
//! │  - Context resolution     │ │    collection w/ retry        │
//! │  - Custom-scope registry  │ │  - MemoryStore: tests         │
//! └───────────────────────────┘ └───────────────────────────────┘
//! ```
//!
//! Supporting modules: `workspace.rs` discovers the workspace root (and with
//! it the local file location and the default project path), `config.rs`
//! carries the session configuration, `events.rs` notifies subscribers of
//! durable mutations, `error.rs` is the crate-wide error enum.
//!
//! ## Key Principles
//!
//! - **One backend per session.** Remote storage is attempted only when a
//!   real endpoint is configured; a failed connect falls back to the local
//!   file (if enabled) and the choice then stands for the session. A later
//!   remote write failure degrades that single write to the local file and
//!   is visible via [`manager::ConnectionInfo`], never swallowed.
//! - **The cache answers reads.** The manager loads all rules at
//!   initialization and serves `get_rules`/resolution from memory; backends
//!   only see writes afterwards.
//! - **No I/O assumptions.** Nothing here writes to stdout or installs a
//!   logger; the engine logs through the `log` facade and returns structured
//!   `Result`s.
//!
//! ## Typical Use
//!
//! ```no_run
//! use rulz::config::RulzConfig;
//! use rulz::manager::RuleManager;
//! use rulz::model::RuleScope;
//! use rulz::workspace::WorkspacePaths;
//!
//! # fn main() -> rulz::error::Result<()> {
//! let paths = WorkspacePaths::discover(&std::env::current_dir()?)?;
//! let config = RulzConfig::load(paths.config_dir())?;
//!
//! let mut manager = RuleManager::new(config, paths);
//! manager.initialize()?;
//!
//! manager.add_rule("Prefer iterators over index loops", RuleScope::Language, Some("rust"), None)?;
//! let applicable = manager.active_rules_for_context(Some("rust"));
//! # let _ = applicable;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod manager;
pub mod model;
pub mod scope;
pub mod store;
pub mod validate;
pub mod workspace;

pub use config::RulzConfig;
pub use error::{Result, RulzError};
pub use events::{RuleEvent, Subscription};
pub use manager::{ConnectionInfo, RuleManager};
pub use model::{Rule, RuleContext, RuleFilter, RuleScope};
