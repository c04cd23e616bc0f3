//! Loosely typed metadata maps and the well-known keys read from them.
//!
//! The identity provider stores metadata as free-form JSON objects. Hearth
//! never interprets values beyond two checks: string equality and
//! *presence*. A key is present when it exists and its value is not `null`,
//! `false`, `""`, or `0`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Subscription lifecycle state (`"active"`, `"trialing"`, ...).
pub const SUBSCRIPTION_STATUS: &str = "subscriptionStatus";
/// Billing subscription identifier written by the payment integration.
pub const STRIPE_SUBSCRIPTION_ID: &str = "stripeSubscriptionId";
/// Generic subscription identifier.
pub const SUBSCRIPTION_ID: &str = "subscriptionId";
/// Plan identifier (`"pro"`, `"agent"`, ...).
pub const PLAN: &str = "plan";
/// Explicit role marker.
pub const ROLE: &str = "role";
/// Set once the user finished the basic profile setup.
pub const ONBOARDING_COMPLETE: &str = "onboardingComplete";
/// Set once an agent finished the seller-specific setup.
pub const AGENT_ONBOARDING_COMPLETE: &str = "agentOnboardingComplete";

/// A string-keyed JSON object attached to a user or organization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(Map<String, Value>);

impl Metadata {
    /// Create an empty metadata map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or overwrite a key.
    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_owned(), value.into());
    }

    /// Raw value for a key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// The value for `key` if it is a JSON string.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Whether `key` holds a string equal to `expected`.
    #[must_use]
    pub fn str_eq(&self, key: &str, expected: &str) -> bool {
        self.get_str(key) == Some(expected)
    }

    /// Whether `key` is present (exists and is not `null`, `false`, `""`, or `0`).
    #[must_use]
    pub fn is_present(&self, key: &str) -> bool {
        match self.0.get(key) {
            None | Some(Value::Null | Value::Bool(false)) => false,
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f.abs() > 0.0),
            Some(Value::Bool(true) | Value::Array(_) | Value::Object(_)) => true,
        }
    }

    /// Whether the map has no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for Metadata {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn presence_follows_truthiness() {
        let meta = Metadata::new()
            .with("null", Value::Null)
            .with("false", false)
            .with("true", true)
            .with("empty", "")
            .with("text", "x")
            .with("zero", 0)
            .with("one", 1)
            .with("list", json!([]));

        assert!(!meta.is_present("missing"));
        assert!(!meta.is_present("null"));
        assert!(!meta.is_present("false"));
        assert!(!meta.is_present("empty"));
        assert!(!meta.is_present("zero"));
        assert!(meta.is_present("true"));
        assert!(meta.is_present("text"));
        assert!(meta.is_present("one"));
        assert!(meta.is_present("list"));
    }

    #[test]
    fn str_eq_ignores_non_string_values() {
        let meta = Metadata::new()
            .with(SUBSCRIPTION_STATUS, "active")
            .with(PLAN, 3);
        assert!(meta.str_eq(SUBSCRIPTION_STATUS, "active"));
        assert!(!meta.str_eq(SUBSCRIPTION_STATUS, "Active"));
        assert!(!meta.str_eq(PLAN, "3"));
    }

    #[test]
    fn deserializes_from_plain_object() {
        let meta: Metadata =
            serde_json::from_value(json!({ "onboardingComplete": true })).unwrap();
        assert!(meta.is_present(ONBOARDING_COMPLETE));
        assert!(!meta.is_empty());
    }
}
