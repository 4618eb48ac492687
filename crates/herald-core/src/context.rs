//! Execution context for a single invocation.
//!
//! A [`CommandContext`] is the immutable snapshot handed to handlers,
//! conditions and cross validators: the sender, the raw token array, and the
//! parsed name→value map. One is built per invocation and discarded when the
//! handler (or its async task) finishes; nothing in it is ever shared across
//! invocations, so it needs no synchronization.

use std::collections::HashMap;
use std::sync::Arc;

use crate::sender::Sender;
use crate::value::{ArgValue, FromArgValue};

/// The immutable per-invocation snapshot.
///
/// Argument names are case-insensitive; an argument is present only if it was
/// supplied or backfilled from a default. Conditional arguments whose
/// condition evaluated false are entirely absent.
pub struct CommandContext {
    sender: Arc<dyn Sender>,
    label: String,
    raw: Vec<String>,
    values: HashMap<String, ArgValue>,
}

impl CommandContext {
    /// Creates a context from parsed values.
    ///
    /// Keys are lowercased on insertion so lookups are case-insensitive.
    pub fn new(
        sender: Arc<dyn Sender>,
        label: impl Into<String>,
        raw: Vec<String>,
        values: HashMap<String, ArgValue>,
    ) -> Self {
        let values = values
            .into_iter()
            .map(|(k, v)| (k.to_lowercase(), v))
            .collect();
        Self {
            sender,
            label: label.into(),
            raw,
            values,
        }
    }

    /// The sender that invoked the command.
    pub fn sender(&self) -> &Arc<dyn Sender> {
        &self.sender
    }

    /// The alias the command was invoked under.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The raw token array, exactly as dispatched.
    pub fn raw_args(&self) -> &[String] {
        &self.raw
    }

    /// Returns the parsed value for `name`, if present.
    pub fn value(&self, name: &str) -> Option<&ArgValue> {
        self.values.get(&name.to_lowercase())
    }

    /// Returns the parsed value for `name`, extracted as `T`.
    ///
    /// `None` means the argument is absent *or* has a different kind; use
    /// [`value`](Self::value) to distinguish.
    pub fn get<T: FromArgValue>(&self, name: &str) -> Option<T> {
        self.value(name).and_then(T::from_arg_value)
    }

    /// Returns `true` if a value was recorded for `name`.
    pub fn has(&self, name: &str) -> bool {
        self.values.contains_key(&name.to_lowercase())
    }

    /// Number of recorded values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if no values were recorded.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Snapshot of the value map as JSON, for diagnostics.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.values
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }
}

impl std::fmt::Debug for CommandContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandContext")
            .field("label", &self.label)
            .field("raw", &self.raw)
            .field("values", &self.values)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct NullSender;

    #[async_trait]
    impl Sender for NullSender {
        fn name(&self) -> &str {
            "null"
        }

        fn has_permission(&self, _node: &str) -> bool {
            true
        }

        fn is_player(&self) -> bool {
            false
        }

        async fn send(&self, _text: &str) {}
    }

    fn ctx(values: HashMap<String, ArgValue>) -> CommandContext {
        CommandContext::new(Arc::new(NullSender), "test", vec!["5".into()], values)
    }

    #[test]
    fn lookups_are_case_insensitive() {
        let mut values = HashMap::new();
        values.insert("Count".to_string(), ArgValue::Int(5));
        let ctx = ctx(values);

        assert_eq!(ctx.get::<i64>("count"), Some(5));
        assert_eq!(ctx.get::<i64>("COUNT"), Some(5));
        assert!(ctx.has("coUnt"));
    }

    #[test]
    fn typed_get_rejects_wrong_kind() {
        let mut values = HashMap::new();
        values.insert("count".to_string(), ArgValue::Int(5));
        let ctx = ctx(values);

        assert_eq!(ctx.get::<String>("count"), None);
        assert!(ctx.value("count").is_some());
    }

    #[test]
    fn json_snapshot() {
        let mut values = HashMap::new();
        values.insert("x".to_string(), ArgValue::Int(1));
        values.insert("y".to_string(), ArgValue::Str("z".into()));
        let json = ctx(values).to_json();

        assert_eq!(json["x"], serde_json::json!(1));
        assert_eq!(json["y"], serde_json::json!("z"));
    }
}
