//! Validation engine.
//!
//! Two layers of checks run after parsing:
//!
//! - **Per-value rules** ([`ValidationRules`]) attached to one argument,
//!   applied in a fixed order — type-specific range (numeric min/max or
//!   string length), pattern, custom predicate, membership in the predefined
//!   set. The first failing rule wins; later rules are not evaluated.
//! - **Cross validators** registered on the command, run in registration
//!   order over the fully-populated context only after every individual
//!   value validated. The first validator returning a message aborts.

use std::sync::Arc;

use regex::Regex;

use herald_core::{ArgValue, CommandContext, CommandFailure, HookError};

/// A custom per-value predicate with its failure message.
pub(crate) type CustomRule = (Arc<dyn Fn(&ArgValue) -> bool + Send + Sync>, String);

/// A cross-argument validator.
///
/// Returns `Ok(None)` to pass, `Ok(Some(message))` to reject the value set,
/// or `Err` for a fault (classified as an internal error by the dispatcher).
pub type CrossValidator =
    Arc<dyn Fn(&CommandContext) -> Result<Option<String>, HookError> + Send + Sync>;

/// The per-argument constraint block.
///
/// All constraints are optional; an empty block accepts everything. Range
/// invariants (`min <= max`) are enforced when the owning argument is built,
/// never re-checked at parse time.
#[derive(Default, Clone)]
pub struct ValidationRules {
    pub(crate) min: Option<f64>,
    pub(crate) max: Option<f64>,
    pub(crate) min_len: Option<usize>,
    pub(crate) max_len: Option<usize>,
    pub(crate) pattern: Option<Regex>,
    pub(crate) one_of: Vec<String>,
    pub(crate) suggest: bool,
    pub(crate) default: Option<ArgValue>,
    pub(crate) custom: Option<CustomRule>,
}

impl ValidationRules {
    /// The configured default value, if any.
    pub fn default_value(&self) -> Option<&ArgValue> {
        self.default.as_ref()
    }

    /// The predefined completion set (empty when unset).
    pub fn completions(&self) -> &[String] {
        &self.one_of
    }

    /// Whether parse failures should offer did-you-mean suggestions.
    pub fn suggests(&self) -> bool {
        self.suggest
    }

    /// Applies the rules to a parsed value.
    ///
    /// Returns the first failing rule's message, or `Ok` when every
    /// configured rule passes.
    pub fn check(&self, value: &ArgValue) -> Result<(), String> {
        if let Some(n) = value.as_float() {
            if let Some(min) = self.min
                && n < min
            {
                return Err(format!("must be at least {min}"));
            }
            if let Some(max) = self.max
                && n > max
            {
                return Err(format!("must be at most {max}"));
            }
        }

        if let Some(s) = value.as_str() {
            let len = s.chars().count();
            if let Some(min_len) = self.min_len
                && len < min_len
            {
                return Err(format!("must be at least {min_len} characters"));
            }
            if let Some(max_len) = self.max_len
                && len > max_len
            {
                return Err(format!("must be at most {max_len} characters"));
            }
            if let Some(pattern) = &self.pattern
                && !pattern.is_match(s)
            {
                return Err(format!("must match {}", pattern.as_str()));
            }
        }

        if let Some((predicate, message)) = &self.custom
            && !predicate(value)
        {
            return Err(message.clone());
        }

        if !self.one_of.is_empty() {
            let text = value.to_string();
            if !self.one_of.iter().any(|c| c.eq_ignore_ascii_case(&text)) {
                return Err(format!("must be one of: {}", self.one_of.join(", ")));
            }
        }

        Ok(())
    }
}

impl std::fmt::Debug for ValidationRules {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationRules")
            .field("min", &self.min)
            .field("max", &self.max)
            .field("min_len", &self.min_len)
            .field("max_len", &self.max_len)
            .field("pattern", &self.pattern.as_ref().map(Regex::as_str))
            .field("one_of", &self.one_of)
            .field("default", &self.default)
            .finish_non_exhaustive()
    }
}

/// Runs the command's cross validators over the completed context.
///
/// First `Some(message)` aborts with `CrossValidation`; a validator fault
/// aborts with `Internal`. Remaining validators do not run either way.
pub(crate) fn run_cross_validators(
    validators: &[CrossValidator],
    ctx: &CommandContext,
) -> Result<(), CommandFailure> {
    for validator in validators {
        match validator(ctx) {
            Ok(None) => {}
            Ok(Some(message)) => return Err(CommandFailure::CrossValidation { message }),
            Err(fault) => {
                tracing::error!(fault = %fault, "cross validator faulted");
                return Err(CommandFailure::Internal {
                    stage: "cross-validation".into(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::testutil::MockSender;

    fn ctx_with(values: HashMap<String, ArgValue>) -> CommandContext {
        CommandContext::new(Arc::new(MockSender::new("t")), "test", Vec::new(), values)
    }

    #[test]
    fn numeric_range() {
        let rules = ValidationRules {
            min: Some(1.0),
            max: Some(10.0),
            ..Default::default()
        };
        assert!(rules.check(&ArgValue::Int(5)).is_ok());
        assert!(rules.check(&ArgValue::Float(10.0)).is_ok());
        assert!(rules.check(&ArgValue::Int(0)).is_err());
        assert!(rules.check(&ArgValue::Float(10.5)).is_err());
    }

    #[test]
    fn string_length_counts_chars() {
        let rules = ValidationRules {
            min_len: Some(2),
            max_len: Some(4),
            ..Default::default()
        };
        assert!(rules.check(&ArgValue::Str("héllo".into())).is_err());
        assert!(rules.check(&ArgValue::Str("héll".into())).is_ok());
        assert!(rules.check(&ArgValue::Str("h".into())).is_err());
    }

    #[test]
    fn first_failing_rule_wins() {
        // Length fails before the custom predicate is consulted.
        let calls = Arc::new(AtomicUsize::new(0));
        let calls2 = Arc::clone(&calls);
        let rules = ValidationRules {
            min_len: Some(10),
            custom: Some((
                Arc::new(move |_| {
                    calls2.fetch_add(1, Ordering::SeqCst);
                    false
                }),
                "never seen".into(),
            )),
            ..Default::default()
        };
        let err = rules.check(&ArgValue::Str("short".into())).unwrap_err();
        assert!(err.contains("characters"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn membership_is_case_insensitive() {
        let rules = ValidationRules {
            one_of: vec!["north".into(), "south".into()],
            ..Default::default()
        };
        assert!(rules.check(&ArgValue::Str("NORTH".into())).is_ok());
        assert!(rules.check(&ArgValue::Str("up".into())).is_err());
    }

    #[test]
    fn pattern_rule() {
        let rules = ValidationRules {
            pattern: Some(Regex::new(r"^[a-z]+$").unwrap()),
            ..Default::default()
        };
        assert!(rules.check(&ArgValue::Str("abc".into())).is_ok());
        assert!(rules.check(&ArgValue::Str("Abc1".into())).is_err());
    }

    #[test]
    fn cross_validator_short_circuits() {
        let second_ran = Arc::new(AtomicUsize::new(0));
        let second_ran2 = Arc::clone(&second_ran);

        let validators: Vec<CrossValidator> = vec![
            Arc::new(|_| Ok(Some("first always fails".into()))),
            Arc::new(move |_| {
                second_ran2.fetch_add(1, Ordering::SeqCst);
                Ok(None)
            }),
        ];

        let ctx = ctx_with(HashMap::new());
        let err = run_cross_validators(&validators, &ctx).unwrap_err();
        assert!(matches!(err, CommandFailure::CrossValidation { .. }));
        assert_eq!(second_ran.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn cross_validator_fault_is_internal() {
        let validators: Vec<CrossValidator> =
            vec![Arc::new(|_| Err(HookError::new("storage exploded")))];
        let ctx = ctx_with(HashMap::new());
        let err = run_cross_validators(&validators, &ctx).unwrap_err();
        assert!(matches!(err, CommandFailure::Internal { .. }));
    }
}
