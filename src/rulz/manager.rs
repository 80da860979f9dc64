//! # Rule Manager
//!
//! The manager is the single entry point for everything the engine does. It
//! owns the active backend, the optional local fallback, the in-memory rule
//! cache, the custom-scope registry, and the change listeners.
//!
//! ## Role and Responsibilities
//!
//! The manager:
//! - **Selects** a backend once per session (remote if configured and
//!   reachable, else local)
//! - **Validates** input before anything enters storage
//! - **Caches** the full rule set in memory, in creation order, so reads
//!   never hit the backend
//! - **Persists optimistically**: the cache is updated first, the write goes
//!   out, and the cache change is rolled back if the write fails on every
//!   available backend
//! - **Notifies** listeners only after a mutation is durable
//!
//! ## What the Manager Does NOT Do
//!
//! - Re-evaluate backend selection mid-session. A failed remote write falls
//!   back to the local file for that one operation; the degradation is
//!   logged and visible in [`ConnectionInfo`], but the remote stays selected.
//! - Cross-process coordination. The local file is last-writer-wins between
//!   processes; within the process the store's own lock covers interleaving.

use crate::config::RulzConfig;
use crate::error::{Result, RulzError};
use crate::events::{ListenerRegistry, RuleEvent, Subscription};
use crate::model::{Rule, RuleContext, RuleFilter, RuleScope};
use crate::scope::{resolve_rules, CustomScopeRegistry};
use crate::store::local::LocalStore;
use crate::store::remote::RemoteStore;
use crate::store::{BackendKind, RuleStore};
use crate::validate::{normalize_rule_text, validate_rule_text, validate_scope_fields};
use crate::workspace::WorkspacePaths;
use std::path::PathBuf;
use uuid::Uuid;

/// Status snapshot for observability; see [`RuleManager::connection_info`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    /// Active backend kind; `None` before initialization or after dispose.
    pub backend_kind: Option<BackendKind>,
    /// True while the remote backend is selected and no write has degraded
    /// to the local fallback.
    pub remote_connected: bool,
    pub fallback_enabled: bool,
    pub total_rules: usize,
}

pub struct RuleManager {
    config: RulzConfig,
    paths: WorkspacePaths,
    backend: Option<Box<dyn RuleStore>>,
    fallback: Option<Box<dyn RuleStore>>,
    rules: Vec<Rule>,
    scopes: CustomScopeRegistry,
    listeners: ListenerRegistry,
    remote_connected: bool,
}

impl RuleManager {
    /// Create a manager that has not selected a backend yet; call
    /// [`initialize`](Self::initialize) before any operation.
    pub fn new(config: RulzConfig, paths: WorkspacePaths) -> Self {
        Self {
            config,
            paths,
            backend: None,
            fallback: None,
            rules: Vec::new(),
            scopes: CustomScopeRegistry::new(),
            listeners: ListenerRegistry::new(),
            remote_connected: false,
        }
    }

    /// Create a manager around injected backends, already initialized.
    /// This is the seam tests and embedders use to skip backend selection.
    pub fn with_backends(
        config: RulzConfig,
        paths: WorkspacePaths,
        backend: Box<dyn RuleStore>,
        fallback: Option<Box<dyn RuleStore>>,
    ) -> Result<Self> {
        let remote_connected = backend.kind() == BackendKind::Remote;
        let mut manager = Self {
            config,
            paths,
            backend: Some(backend),
            fallback,
            rules: Vec::new(),
            scopes: CustomScopeRegistry::new(),
            listeners: ListenerRegistry::new(),
            remote_connected,
        };
        manager.load_cache()?;
        Ok(manager)
    }

    /// Select a backend per the session policy and load the rule cache.
    ///
    /// Remote is attempted only when the configured URI differs from the
    /// placeholder. On remote failure the local file takes over when
    /// fallback is enabled; otherwise this fails with `StorageUnavailable`.
    /// Calling again after a successful initialization is a no-op.
    pub fn initialize(&mut self) -> Result<()> {
        if self.backend.is_some() {
            return Ok(());
        }

        if self.config.remote_configured() {
            match RemoteStore::connect(&self.config) {
                Ok(remote) => {
                    log::info!("rule storage: remote backend at {}", self.config.remote_uri);
                    self.backend = Some(Box::new(remote));
                    self.remote_connected = true;
                    if self.config.fallback_to_local {
                        self.fallback = Some(Box::new(self.local_store()));
                    }
                }
                Err(err) if self.config.fallback_to_local => {
                    log::warn!("remote rule storage unavailable, using local file: {}", err);
                    self.backend = Some(Box::new(self.local_store()));
                }
                Err(err) => {
                    return Err(RulzError::StorageUnavailable(err.to_string()));
                }
            }
        } else {
            log::info!("rule storage: local file at {}", self.paths.rules_file().display());
            self.backend = Some(Box::new(self.local_store()));
        }

        if let Err(err) = self.load_cache() {
            // A remote that connected but cannot serve reads counts as a
            // failed selection; fall to local while still inside init.
            if self.remote_connected && self.config.fallback_to_local {
                log::warn!("remote rule load failed, using local file: {}", err);
                self.backend = Some(Box::new(self.local_store()));
                self.fallback = None;
                self.remote_connected = false;
                self.load_cache()?;
            } else {
                return Err(err);
            }
        }

        Ok(())
    }

    fn local_store(&self) -> LocalStore {
        LocalStore::new(self.paths.rules_file())
    }

    fn load_cache(&mut self) -> Result<()> {
        let backend = self.backend()?;
        let mut rules = backend.list_rules()?;
        // The remote collection returns newest first; normalize to creation
        // order so resolution ordering matches the local backend.
        rules.sort_by_key(|r| r.created_at);
        self.rules = rules;
        Ok(())
    }

    fn backend(&self) -> Result<&dyn RuleStore> {
        self.backend.as_deref().ok_or_else(|| {
            RulzError::StorageUnavailable("manager is not initialized or was disposed".to_string())
        })
    }

    /// Write one rule through the active backend, degrading to the fallback
    /// for this operation only.
    fn persist_save(&mut self, rule: &Rule) -> Result<()> {
        let primary = match self.backend()?.save_rule(rule) {
            Ok(()) => return Ok(()),
            Err(err) => err,
        };
        match &self.fallback {
            Some(fallback) => match fallback.save_rule(rule) {
                Ok(()) => {
                    log::warn!("rule write degraded to fallback backend: {}", primary);
                    self.remote_connected = false;
                    Ok(())
                }
                Err(fb_err) => Err(RulzError::Persistence(format!(
                    "{primary}; fallback: {fb_err}"
                ))),
            },
            None => Err(RulzError::Persistence(primary.to_string())),
        }
    }

    fn persist_delete(&mut self, id: &Uuid) -> Result<()> {
        let primary = match self.backend()?.delete_rule(id) {
            Ok(_) => return Ok(()),
            Err(err) => err,
        };
        match &self.fallback {
            Some(fallback) => match fallback.delete_rule(id) {
                Ok(_) => {
                    log::warn!("rule delete degraded to fallback backend: {}", primary);
                    self.remote_connected = false;
                    Ok(())
                }
                Err(fb_err) => Err(RulzError::Persistence(format!(
                    "{primary}; fallback: {fb_err}"
                ))),
            },
            None => Err(RulzError::Persistence(primary.to_string())),
        }
    }

    fn persist_clear(&mut self) -> Result<()> {
        let primary = match self.backend()?.clear_rules() {
            Ok(()) => return Ok(()),
            Err(err) => err,
        };
        match &self.fallback {
            Some(fallback) => match fallback.clear_rules() {
                Ok(()) => {
                    log::warn!("rule clear degraded to fallback backend: {}", primary);
                    self.remote_connected = false;
                    Ok(())
                }
                Err(fb_err) => Err(RulzError::Persistence(format!(
                    "{primary}; fallback: {fb_err}"
                ))),
            },
            None => Err(RulzError::Persistence(primary.to_string())),
        }
    }

    /// Validate, store, and announce a new rule. Returns the stored record.
    ///
    /// `language_scope` is only consulted for language-scoped rules, and
    /// `project_path` only for project-scoped ones; a project rule without
    /// an explicit path defaults to the open workspace root.
    pub fn add_rule(
        &mut self,
        text: &str,
        scope: RuleScope,
        language_scope: Option<&str>,
        project_path: Option<PathBuf>,
    ) -> Result<Rule> {
        self.backend()?;

        let normalized = normalize_rule_text(text);
        validate_rule_text(&normalized)?;

        let project_path = match scope {
            RuleScope::Project => project_path.or_else(|| self.paths.project_root.clone()),
            _ => None,
        };
        let language_scope = match scope {
            RuleScope::Language => language_scope,
            _ => None,
        };
        validate_scope_fields(&scope, language_scope, project_path.as_deref())?;

        let max = self.config.max_rules_per_scope;
        let in_scope = self.rules.iter().filter(|r| r.scope == scope).count();
        if in_scope >= max {
            return Err(RulzError::ScopeLimitReached {
                scope: scope.to_string(),
                max,
            });
        }

        let mut rule = Rule::new(normalized, scope);
        rule.language_scope = language_scope.map(|s| s.trim().to_string());
        rule.project_path = project_path;

        // Optimistic append, rolled back if no backend takes the write
        self.rules.push(rule.clone());
        if let Err(err) = self.persist_save(&rule) {
            log::debug!("rolling back cached rule {} after write failure", rule.rule_id);
            self.rules.pop();
            return Err(err);
        }

        self.listeners.emit(&RuleEvent::Added(rule.clone()));
        Ok(rule)
    }

    /// Hard-delete a rule. Removing an unknown id is an idempotent no-op
    /// reporting `false`; no event fires for it.
    pub fn remove_rule(&mut self, id: &Uuid) -> Result<bool> {
        self.backend()?;

        let Some(position) = self.rules.iter().position(|r| r.rule_id == *id) else {
            return Ok(false);
        };

        let removed = self.rules.remove(position);
        if let Err(err) = self.persist_delete(id) {
            log::debug!("restoring cached rule {} after delete failure", id);
            self.rules.insert(position, removed);
            return Err(err);
        }

        self.listeners.emit(&RuleEvent::Removed(removed));
        Ok(true)
    }

    /// Delete every stored rule. Returns how many were removed.
    pub fn clear_rules(&mut self) -> Result<usize> {
        self.backend()?;
        self.persist_clear()?;
        let removed = self.rules.len();
        self.rules.clear();
        log::debug!("cleared {} rule(s)", removed);
        self.listeners.emit(&RuleEvent::Cleared { removed });
        Ok(removed)
    }

    /// Flip the soft-enable toggle on a rule without deleting it.
    pub fn set_rule_active(&mut self, id: &Uuid, active: bool) -> Result<Rule> {
        self.backend()?;

        let position = self
            .rules
            .iter()
            .position(|r| r.rule_id == *id)
            .ok_or(RulzError::RuleNotFound(*id))?;

        let previous = self.rules[position].clone();
        self.rules[position].is_active = active;
        self.rules[position].touch();
        let updated = self.rules[position].clone();

        if let Err(err) = self.persist_save(&updated) {
            self.rules[position] = previous;
            return Err(err);
        }

        self.listeners.emit(&RuleEvent::Updated(updated.clone()));
        Ok(updated)
    }

    /// Snapshot of the cached rules matching `filter`. Explicit filter
    /// fields are authoritative; the open workspace root is inferred only
    /// when filtering by project scope without an explicit path. Unfiltered
    /// calls include inactive rules so they stay enumerable.
    pub fn get_rules(&self, filter: &RuleFilter) -> Vec<Rule> {
        let mut effective = filter.clone();
        if effective.scope == Some(RuleScope::Project) && effective.project_path.is_none() {
            effective.project_path = self.paths.project_root.clone();
        }
        self.rules
            .iter()
            .filter(|r| effective.matches(r))
            .cloned()
            .collect()
    }

    /// Resolve the active rules for the current workspace and the given
    /// language, returning just the texts in application order.
    pub fn active_rules_for_context(&self, language_id: Option<&str>) -> Vec<String> {
        let context = RuleContext {
            language_id: language_id.map(|s| s.to_string()),
            project_path: self.paths.project_root.clone(),
            file_path: None,
        };
        self.active_rules_for(&context)
    }

    /// Resolve the active rules for an explicit context; callers that know
    /// the current file path use this so custom-scope predicates can see it.
    pub fn active_rules_for(&self, context: &RuleContext) -> Vec<String> {
        resolve_rules(&self.rules, context, &self.scopes)
            .into_iter()
            .map(|r| r.rule_text.clone())
            .collect()
    }

    /// Register a custom scope predicate; built-in names are reserved.
    pub fn register_custom_scope<F>(&mut self, name: impl Into<String>, predicate: F) -> Result<()>
    where
        F: Fn(&RuleContext) -> bool + 'static,
    {
        self.scopes.register(name, predicate)
    }

    pub fn subscribe<F>(&mut self, listener: F) -> Subscription
    where
        F: Fn(&RuleEvent) + 'static,
    {
        self.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        self.listeners.unsubscribe(subscription)
    }

    pub fn connection_info(&self) -> ConnectionInfo {
        ConnectionInfo {
            backend_kind: self.backend.as_deref().map(|b| b.kind()),
            remote_connected: self.remote_connected,
            fallback_enabled: self.config.fallback_to_local,
            total_rules: self.rules.len(),
        }
    }

    /// True while the remote backend is selected and healthy.
    pub fn is_remote_connected(&self) -> bool {
        self.remote_connected
    }

    pub fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    /// Root of the open workspace, if one was discovered.
    pub fn workspace_root(&self) -> Option<&std::path::Path> {
        self.paths.project_root.as_deref()
    }

    /// Release the backend (dropping any remote connection) and clear
    /// listeners and the cache. Idempotent; mutations afterwards fail with
    /// `StorageUnavailable` and reads see an empty set.
    pub fn dispose(&mut self) {
        self.backend = None;
        self.fallback = None;
        self.remote_connected = false;
        self.rules.clear();
        self.listeners.clear();
    }
}
