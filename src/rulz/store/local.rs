use super::{BackendKind, RuleStore};
use crate::error::{Result, RulzError};
use crate::model::Rule;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use uuid::Uuid;

/// JSON-file backend: the whole rule set lives in one `rules.json` array.
///
/// Every write is a whole-file replace. A process-local mutex wraps the
/// read-modify-write sequence so interleaved operations cannot tear the file;
/// cross-process writers are last-writer-wins.
pub struct LocalStore {
    rules_file: PathBuf,
    write_lock: Mutex<()>,
}

impl LocalStore {
    pub fn new(rules_file: PathBuf) -> Self {
        Self {
            rules_file,
            write_lock: Mutex::new(()),
        }
    }

    pub fn rules_file(&self) -> &Path {
        &self.rules_file
    }

    fn load(&self) -> Result<Vec<Rule>> {
        if !self.rules_file.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.rules_file).map_err(RulzError::Io)?;
        let rules: Vec<Rule> =
            serde_json::from_str(&content).map_err(RulzError::Serialization)?;
        Ok(rules)
    }

    fn write_all(&self, rules: &[Rule]) -> Result<()> {
        if let Some(parent) = self.rules_file.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(RulzError::Io)?;
            }
        }

        let content = serde_json::to_string_pretty(rules).map_err(RulzError::Serialization)?;

        // Atomic write: tmp file in the same directory, then rename over
        let tmp_name = format!(".rules-{}.tmp", Uuid::new_v4());
        let tmp_path = match self.rules_file.parent() {
            Some(parent) => parent.join(tmp_name),
            None => PathBuf::from(tmp_name),
        };
        fs::write(&tmp_path, content).map_err(RulzError::Io)?;
        fs::rename(&tmp_path, &self.rules_file).map_err(RulzError::Io)?;

        Ok(())
    }
}

impl RuleStore for LocalStore {
    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    fn list_rules(&self) -> Result<Vec<Rule>> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| RulzError::Store("rule file lock poisoned".to_string()))?;
        self.load()
    }

    fn save_rule(&self, rule: &Rule) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| RulzError::Store("rule file lock poisoned".to_string()))?;

        let mut rules = self.load()?;
        match rules.iter_mut().find(|r| r.rule_id == rule.rule_id) {
            Some(existing) => *existing = rule.clone(),
            None => rules.push(rule.clone()),
        }
        self.write_all(&rules)
    }

    fn delete_rule(&self, id: &Uuid) -> Result<bool> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| RulzError::Store("rule file lock poisoned".to_string()))?;

        let mut rules = self.load()?;
        let before = rules.len();
        rules.retain(|r| r.rule_id != *id);
        if rules.len() == before {
            return Ok(false);
        }
        self.write_all(&rules)?;
        Ok(true)
    }

    fn clear_rules(&self) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| RulzError::Store("rule file lock poisoned".to_string()))?;
        self.write_all(&[])
    }
}
