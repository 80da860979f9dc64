use super::{BackendKind, RuleStore};
use crate::error::{Result, RulzError};
use crate::model::Rule;
use std::cell::RefCell;
use uuid::Uuid;

/// In-memory storage backend for testing.
///
/// Uses `RefCell` for interior mutability since the engine is
/// single-threaded per session. The write-error switch makes every mutation
/// fail, which is how fallback and rollback paths are exercised without
/// touching disk or network.
#[derive(Default)]
pub struct MemoryStore {
    rules: RefCell<Vec<Rule>>,
    simulate_write_error: RefCell<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable write-error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        *self.simulate_write_error.borrow_mut() = simulate;
    }

    fn check_write(&self) -> Result<()> {
        if *self.simulate_write_error.borrow() {
            return Err(RulzError::Store("Simulated write error".to_string()));
        }
        Ok(())
    }
}

impl RuleStore for MemoryStore {
    fn kind(&self) -> BackendKind {
        BackendKind::Memory
    }

    fn list_rules(&self) -> Result<Vec<Rule>> {
        Ok(self.rules.borrow().clone())
    }

    fn save_rule(&self, rule: &Rule) -> Result<()> {
        self.check_write()?;
        let mut rules = self.rules.borrow_mut();
        match rules.iter_mut().find(|r| r.rule_id == rule.rule_id) {
            Some(existing) => *existing = rule.clone(),
            None => rules.push(rule.clone()),
        }
        Ok(())
    }

    fn delete_rule(&self, id: &Uuid) -> Result<bool> {
        self.check_write()?;
        let mut rules = self.rules.borrow_mut();
        let before = rules.len();
        rules.retain(|r| r.rule_id != *id);
        Ok(rules.len() != before)
    }

    fn clear_rules(&self) -> Result<()> {
        self.check_write()?;
        self.rules.borrow_mut().clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RuleScope;

    #[test]
    fn stores_and_lists_rules() {
        let store = MemoryStore::new();
        let rule = Rule::new("Keep functions short".to_string(), RuleScope::Global);
        store.save_rule(&rule).unwrap();

        let listed = store.list_rules().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].rule_id, rule.rule_id);
    }

    #[test]
    fn simulated_write_error_fails_every_mutation() {
        let store = MemoryStore::new();
        let rule = Rule::new("Doomed".to_string(), RuleScope::Global);
        store.save_rule(&rule).unwrap();

        store.set_simulate_write_error(true);
        assert!(store.save_rule(&rule).is_err());
        assert!(store.delete_rule(&rule.rule_id).is_err());
        assert!(store.clear_rules().is_err());

        // Reads still work and the stored rule is untouched
        assert_eq!(store.list_rules().unwrap().len(), 1);

        store.set_simulate_write_error(false);
        assert!(store.delete_rule(&rule.rule_id).unwrap());
    }

    #[test]
    fn delete_on_missing_id_is_false_not_an_error() {
        let store = MemoryStore::new();
        assert!(!store.delete_rule(&Uuid::new_v4()).unwrap());
    }
}
