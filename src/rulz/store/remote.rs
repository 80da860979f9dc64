//! HTTP backend against a remote rule collection.
//!
//! The remote store speaks a small document-collection protocol:
//!
//! ```text
//! GET    {base}/ping          health probe, used while connecting
//! GET    {base}/rules         all rule documents, newest first
//! PUT    {base}/rules/{id}    insert or replace one document
//! DELETE {base}/rules/{id}    delete one document (404 = was absent)
//! DELETE {base}/rules         drop the whole collection
//! ```
//!
//! Connecting retries with a bounded, optionally exponential backoff; once
//! the attempt budget is spent the connect fails for good. There is no
//! background reconnection, the manager applies its fallback policy instead.

use super::{BackendKind, RuleStore};
use crate::config::RulzConfig;
use crate::error::{Result, RulzError};
use crate::model::Rule;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use std::thread;
use std::time::Duration;
use uuid::Uuid;

/// Backoff schedule for remote connection attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub exponential: bool,
}

impl RetryPolicy {
    pub fn from_config(config: &RulzConfig) -> Self {
        Self {
            max_attempts: config.retry_attempts.max(1),
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
            exponential: config.exponential_backoff,
        }
    }

    /// Delay to wait after failed attempt `attempt` (1-based): doubles per
    /// attempt when exponential, else constant.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if !self.exponential {
            return self.base_delay;
        }
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor)
    }
}

#[derive(Debug)]
pub struct RemoteStore {
    base_url: String,
    client: Client,
    retry: RetryPolicy,
}

impl RemoteStore {
    /// Connect to the configured endpoint, retrying per the config's backoff
    /// schedule. Fails with `ConnectionExhausted` once attempts run out,
    /// carrying the last underlying error.
    pub fn connect(config: &RulzConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .pool_max_idle_per_host(config.max_pool_size)
            .build()
            .map_err(RulzError::Remote)?;

        let store = Self {
            base_url: config.remote_uri.trim_end_matches('/').to_string(),
            client,
            retry: RetryPolicy::from_config(config),
        };

        let mut last_error = String::new();
        for attempt in 1..=store.retry.max_attempts {
            log::debug!(
                "connecting to remote rule store (attempt {}/{})",
                attempt,
                store.retry.max_attempts
            );
            match store.ping() {
                Ok(()) => return Ok(store),
                Err(err) => {
                    log::warn!("remote rule store connect attempt {} failed: {}", attempt, err);
                    last_error = err.to_string();
                    if attempt < store.retry.max_attempts {
                        thread::sleep(store.retry.delay_for_attempt(attempt));
                    }
                }
            }
        }

        Err(RulzError::ConnectionExhausted {
            attempts: store.retry.max_attempts,
            last: last_error,
        })
    }

    fn ping(&self) -> Result<()> {
        self.client
            .get(format!("{}/ping", self.base_url))
            .send()?
            .error_for_status()?;
        Ok(())
    }

    fn rule_url(&self, id: &Uuid) -> String {
        format!("{}/rules/{}", self.base_url, id)
    }
}

impl RuleStore for RemoteStore {
    fn kind(&self) -> BackendKind {
        BackendKind::Remote
    }

    fn list_rules(&self) -> Result<Vec<Rule>> {
        let rules = self
            .client
            .get(format!("{}/rules", self.base_url))
            .send()?
            .error_for_status()?
            .json::<Vec<Rule>>()?;
        Ok(rules)
    }

    fn save_rule(&self, rule: &Rule) -> Result<()> {
        self.client
            .put(self.rule_url(&rule.rule_id))
            .json(rule)
            .send()?
            .error_for_status()?;
        Ok(())
    }

    fn delete_rule(&self, id: &Uuid) -> Result<bool> {
        let response = self.client.delete(self.rule_url(id)).send()?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        response.error_for_status()?;
        Ok(true)
    }

    fn clear_rules(&self) -> Result<()> {
        self.client
            .delete(format!("{}/rules", self.base_url))
            .send()?
            .error_for_status()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(exponential: bool) -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            exponential,
        }
    }

    #[test]
    fn exponential_delays_double_per_attempt() {
        let retry = policy(true);
        assert_eq!(retry.delay_for_attempt(1), Duration::from_millis(500));
        assert_eq!(retry.delay_for_attempt(2), Duration::from_millis(1000));
        assert_eq!(retry.delay_for_attempt(3), Duration::from_millis(2000));
    }

    #[test]
    fn constant_delays_stay_at_the_base() {
        let retry = policy(false);
        assert_eq!(retry.delay_for_attempt(1), Duration::from_millis(500));
        assert_eq!(retry.delay_for_attempt(2), Duration::from_millis(500));
        assert_eq!(retry.delay_for_attempt(3), Duration::from_millis(500));
    }

    #[test]
    fn policy_comes_from_config_with_at_least_one_attempt() {
        let mut config = RulzConfig::default();
        config.retry_attempts = 0;
        config.retry_base_delay_ms = 50;
        config.exponential_backoff = false;

        let retry = RetryPolicy::from_config(&config);
        assert_eq!(retry.max_attempts, 1);
        assert_eq!(retry.base_delay, Duration::from_millis(50));
        assert!(!retry.exponential);
    }

    #[test]
    fn unreachable_endpoint_exhausts_the_attempt_budget() {
        let mut config = RulzConfig::default();
        // Port 1 refuses connections immediately
        config.remote_uri = "http://127.0.0.1:1".to_string();
        config.retry_attempts = 2;
        config.retry_base_delay_ms = 1;
        config.connect_timeout_ms = 200;
        config.request_timeout_ms = 200;

        let err = RemoteStore::connect(&config).unwrap_err();
        match err {
            RulzError::ConnectionExhausted { attempts, last } => {
                assert_eq!(attempts, 2);
                assert!(!last.is_empty());
            }
            other => panic!("expected ConnectionExhausted, got {other:?}"),
        }
    }
}
