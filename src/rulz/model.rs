use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

/// Built-in scope names. Anything else is a custom scope.
pub const SCOPE_GLOBAL: &str = "global";
pub const SCOPE_PROJECT: &str = "project";
pub const SCOPE_LANGUAGE: &str = "language";

/// Where a rule applies. Serialized as a bare string so rule documents
/// stay readable and custom scopes need no schema change.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RuleScope {
    Global,
    Project,
    Language,
    Custom(String),
}

impl RuleScope {
    pub fn as_str(&self) -> &str {
        match self {
            RuleScope::Global => SCOPE_GLOBAL,
            RuleScope::Project => SCOPE_PROJECT,
            RuleScope::Language => SCOPE_LANGUAGE,
            RuleScope::Custom(name) => name,
        }
    }

    /// True for the three scope names the engine owns.
    pub fn is_builtin_name(name: &str) -> bool {
        matches!(name, SCOPE_GLOBAL | SCOPE_PROJECT | SCOPE_LANGUAGE)
    }
}

impl From<String> for RuleScope {
    fn from(name: String) -> Self {
        match name.as_str() {
            SCOPE_GLOBAL => RuleScope::Global,
            SCOPE_PROJECT => RuleScope::Project,
            SCOPE_LANGUAGE => RuleScope::Language,
            _ => RuleScope::Custom(name),
        }
    }
}

impl From<RuleScope> for String {
    fn from(scope: RuleScope) -> Self {
        scope.as_str().to_string()
    }
}

impl fmt::Display for RuleScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One stored personalization rule.
///
/// Field names are camelCase on the wire so the local file and the remote
/// collection share one document shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub rule_id: Uuid,
    pub rule_text: String,
    pub scope: RuleScope,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_path: Option<PathBuf>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    // Older rule files predate the toggle; absent means enabled.
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl Rule {
    pub fn new(rule_text: String, scope: RuleScope) -> Self {
        let now = Utc::now();
        Self {
            rule_id: Uuid::new_v4(),
            rule_text,
            scope,
            language_scope: None,
            project_path: None,
            created_at: now,
            updated_at: now,
            is_active: true,
        }
    }

    /// Bump the modification timestamp. Called right before a backend write.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// The editing situation rules are resolved against. `file_path` is only
/// consulted by custom-scope predicates; the built-in scopes never read it.
#[derive(Debug, Clone, Default)]
pub struct RuleContext {
    pub language_id: Option<String>,
    pub project_path: Option<PathBuf>,
    pub file_path: Option<PathBuf>,
}

impl RuleContext {
    pub fn with_language(mut self, language_id: impl Into<String>) -> Self {
        self.language_id = Some(language_id.into());
        self
    }

    pub fn with_project(mut self, project_path: impl Into<PathBuf>) -> Self {
        self.project_path = Some(project_path.into());
        self
    }

    pub fn with_file(mut self, file_path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(file_path.into());
        self
    }
}

/// Criteria for narrowing a rule listing. `None` fields match everything.
#[derive(Debug, Clone, Default)]
pub struct RuleFilter {
    pub scope: Option<RuleScope>,
    pub language_id: Option<String>,
    pub project_path: Option<PathBuf>,
    pub active: Option<bool>,
}

impl RuleFilter {
    pub fn matches(&self, rule: &Rule) -> bool {
        if let Some(scope) = &self.scope {
            if &rule.scope != scope {
                return false;
            }
        }
        if let Some(language_id) = &self.language_id {
            if rule.language_scope.as_deref() != Some(language_id.as_str()) {
                return false;
            }
        }
        if let Some(project_path) = &self.project_path {
            if rule.project_path.as_deref() != Some(project_path.as_path()) {
                return false;
            }
        }
        if let Some(active) = self.active {
            if rule.is_active != active {
                return false;
            }
        }
        true
    }
}
