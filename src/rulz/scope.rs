//! Scope resolution: which stored rules apply to an editing context.
//!
//! Applicable rules are collected in a fixed group order — global, then
//! project, then language, then custom scopes — and each group keeps the
//! rules' creation order. The caller gets one flat, ordered list.

use crate::error::{Result, RulzError};
use crate::model::{Rule, RuleContext, RuleScope};
use std::collections::HashMap;

/// A custom-scope predicate: decides whether rules under that scope name
/// apply to the given context.
pub type ScopePredicate = Box<dyn Fn(&RuleContext) -> bool>;

/// Session-local registry of custom scope names to predicates.
///
/// Registration never touches persistence; custom-scoped rules are stored
/// like any other rule and simply stay inert until their scope name has a
/// predicate here.
#[derive(Default)]
pub struct CustomScopeRegistry {
    predicates: HashMap<String, ScopePredicate>,
}

impl CustomScopeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a predicate for `name`. The three built-in scope names are
    /// reserved. Registering an existing name replaces its predicate.
    pub fn register<F>(&mut self, name: impl Into<String>, predicate: F) -> Result<()>
    where
        F: Fn(&RuleContext) -> bool + 'static,
    {
        let name = name.into();
        if RuleScope::is_builtin_name(&name) {
            return Err(RulzError::ReservedScopeName(name));
        }
        self.predicates.insert(name, Box::new(predicate));
        Ok(())
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.predicates.contains_key(name)
    }

    /// Evaluates the predicate for `name`; unknown names never apply.
    pub fn applies(&self, name: &str, context: &RuleContext) -> bool {
        match self.predicates.get(name) {
            Some(predicate) => predicate(context),
            None => false,
        }
    }
}

/// Collects the active rules applicable to `context`, in application order.
pub fn resolve_rules<'a>(
    rules: &'a [Rule],
    context: &RuleContext,
    scopes: &CustomScopeRegistry,
) -> Vec<&'a Rule> {
    let active = || rules.iter().filter(|r| r.is_active);

    let global = active().filter(|r| r.scope == RuleScope::Global);

    let project = active().filter(|r| {
        r.scope == RuleScope::Project
            && match (&r.project_path, &context.project_path) {
                (Some(rule_path), Some(ctx_path)) => rule_path == ctx_path,
                _ => false,
            }
    });

    let language = active().filter(|r| {
        r.scope == RuleScope::Language
            && match (&r.language_scope, &context.language_id) {
                (Some(rule_lang), Some(ctx_lang)) => rule_lang == ctx_lang,
                _ => false,
            }
    });

    let custom = active().filter(|r| match &r.scope {
        RuleScope::Custom(name) => scopes.applies(name, context),
        _ => false,
    });

    global
        .chain(project)
        .chain(language)
        .chain(custom)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn rule(text: &str, scope: RuleScope) -> Rule {
        Rule::new(text.to_string(), scope)
    }

    fn language_rule(text: &str, language: &str) -> Rule {
        let mut r = rule(text, RuleScope::Language);
        r.language_scope = Some(language.to_string());
        r
    }

    fn project_rule(text: &str, path: &str) -> Rule {
        let mut r = rule(text, RuleScope::Project);
        r.project_path = Some(PathBuf::from(path));
        r
    }

    fn texts(rules: &[&Rule]) -> Vec<String> {
        rules.iter().map(|r| r.rule_text.clone()).collect()
    }

    #[test]
    fn groups_come_back_in_fixed_order() {
        // Stored deliberately out of group order.
        let rules = vec![
            language_rule("lang rule", "rust"),
            rule("global rule", RuleScope::Global),
            project_rule("project rule", "/work/app"),
        ];
        let context = RuleContext::default()
            .with_language("rust")
            .with_project("/work/app");

        let resolved = resolve_rules(&rules, &context, &CustomScopeRegistry::new());
        assert_eq!(
            texts(&resolved),
            vec!["global rule", "project rule", "lang rule"]
        );
    }

    #[test]
    fn insertion_order_is_kept_within_a_group() {
        let rules = vec![
            rule("first", RuleScope::Global),
            rule("second", RuleScope::Global),
            rule("third", RuleScope::Global),
        ];

        let resolved = resolve_rules(&rules, &RuleContext::default(), &CustomScopeRegistry::new());
        assert_eq!(texts(&resolved), vec!["first", "second", "third"]);
    }

    #[test]
    fn inactive_rules_never_resolve() {
        let mut dormant = rule("dormant", RuleScope::Global);
        dormant.is_active = false;
        let rules = vec![dormant, rule("live", RuleScope::Global)];

        let resolved = resolve_rules(&rules, &RuleContext::default(), &CustomScopeRegistry::new());
        assert_eq!(texts(&resolved), vec!["live"]);
    }

    #[test]
    fn foreign_project_and_language_rules_are_skipped() {
        let rules = vec![
            project_rule("mine", "/work/app"),
            project_rule("other project", "/work/elsewhere"),
            language_rule("rust", "rust"),
            language_rule("python", "python"),
        ];
        let context = RuleContext::default()
            .with_language("rust")
            .with_project("/work/app");

        let resolved = resolve_rules(&rules, &context, &CustomScopeRegistry::new());
        assert_eq!(texts(&resolved), vec!["mine", "rust"]);
    }

    #[test]
    fn project_rules_need_a_context_project() {
        let rules = vec![project_rule("mine", "/work/app")];
        let resolved = resolve_rules(&rules, &RuleContext::default(), &CustomScopeRegistry::new());
        assert!(resolved.is_empty());
    }

    #[test]
    fn custom_scope_applies_only_when_registered_and_true() {
        let rules = vec![
            rule("test files", RuleScope::Custom("tests".to_string())),
            rule("unregistered", RuleScope::Custom("mystery".to_string())),
        ];

        let mut scopes = CustomScopeRegistry::new();
        scopes
            .register("tests", |ctx: &RuleContext| {
                ctx.language_id.as_deref() == Some("rust")
            })
            .unwrap();

        let matching = RuleContext::default().with_language("rust");
        let resolved = resolve_rules(&rules, &matching, &scopes);
        assert_eq!(texts(&resolved), vec!["test files"]);

        let non_matching = RuleContext::default().with_language("go");
        assert!(resolve_rules(&rules, &non_matching, &scopes).is_empty());
    }

    #[test]
    fn builtin_scope_names_cannot_be_registered() {
        let mut scopes = CustomScopeRegistry::new();
        for name in ["global", "project", "language"] {
            let err = scopes.register(name, |_| true).unwrap_err();
            assert!(matches!(err, RulzError::ReservedScopeName(_)));
        }
        assert!(!scopes.is_registered("global"));
    }

    #[test]
    fn re_registering_replaces_the_predicate() {
        let mut scopes = CustomScopeRegistry::new();
        scopes.register("tests", |_| true).unwrap();
        scopes.register("tests", |_| false).unwrap();
        assert!(!scopes.applies("tests", &RuleContext::default()));
    }
}
