//! Argument specifications.
//!
//! An [`ArgSpec`] is the immutable descriptor for one positional argument:
//! its parser, optionality, greediness, per-argument permission, condition,
//! transformer and validation rules. Specs are built once through
//! [`ArgSpec::builder`] and owned exclusively by their command; the parsing
//! loop only ever reads them.

use std::sync::Arc;

use regex::Regex;

use herald_core::{ArgValue, BuildError, BuildResult, CommandContext, HookError};

use crate::parser::ArgParser;
use crate::validate::ValidationRules;

/// A condition predicate evaluated against the values parsed so far.
///
/// `Ok(false)` skips the argument without consuming a token; a fault aborts
/// the whole command as an internal error.
pub type Condition = Arc<dyn Fn(&CommandContext) -> Result<bool, HookError> + Send + Sync>;

/// A value transformer applied after parsing and before validation.
pub type Transformer = Arc<dyn Fn(ArgValue) -> Result<ArgValue, HookError> + Send + Sync>;

/// An immutable positional-argument descriptor.
#[derive(Clone)]
pub struct ArgSpec {
    name: String,
    optional: bool,
    greedy: bool,
    permission: Option<String>,
    parser: Arc<dyn ArgParser>,
    condition: Option<Condition>,
    transformer: Option<Transformer>,
    rules: ValidationRules,
}

impl ArgSpec {
    /// Starts building an argument with the given name and parser.
    pub fn builder(name: impl Into<String>, parser: impl ArgParser + 'static) -> ArgBuilder {
        ArgBuilder {
            name: name.into(),
            optional: false,
            greedy: false,
            permission: None,
            parser: Arc::new(parser),
            condition: None,
            transformer: None,
            rules: ValidationRules::default(),
            pattern_src: None,
        }
    }

    /// The argument name (unique within a command, case-insensitive).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the argument may be omitted.
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Whether the argument consumes all remaining tokens.
    pub fn is_greedy(&self) -> bool {
        self.greedy
    }

    /// The per-argument permission node, if any.
    pub fn permission(&self) -> Option<&str> {
        self.permission.as_deref()
    }

    /// The leaf parser.
    pub fn parser(&self) -> &Arc<dyn ArgParser> {
        &self.parser
    }

    /// The condition predicate, if any.
    pub(crate) fn condition(&self) -> Option<&Condition> {
        self.condition.as_ref()
    }

    /// The value transformer, if any.
    pub(crate) fn transformer(&self) -> Option<&Transformer> {
        self.transformer.as_ref()
    }

    /// The validation rule block.
    pub fn rules(&self) -> &ValidationRules {
        &self.rules
    }
}

impl std::fmt::Debug for ArgSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArgSpec")
            .field("name", &self.name)
            .field("optional", &self.optional)
            .field("greedy", &self.greedy)
            .field("permission", &self.permission)
            .field("type", &self.parser.type_name())
            .field("rules", &self.rules)
            .finish_non_exhaustive()
    }
}

/// Fluent builder for [`ArgSpec`].
pub struct ArgBuilder {
    name: String,
    optional: bool,
    greedy: bool,
    permission: Option<String>,
    parser: Arc<dyn ArgParser>,
    condition: Option<Condition>,
    transformer: Option<Transformer>,
    rules: ValidationRules,
    pattern_src: Option<String>,
}

impl ArgBuilder {
    /// Marks the argument as optional.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Marks the argument as greedy (joins all remaining tokens).
    ///
    /// Position and parser-shape constraints are checked when the owning
    /// command is built, since they depend on the surrounding argument list.
    pub fn greedy(mut self) -> Self {
        self.greedy = true;
        self
    }

    /// Requires a permission node to supply this argument.
    pub fn permission(mut self, node: impl Into<String>) -> Self {
        self.permission = Some(node.into());
        self
    }

    /// Sets a condition over the values parsed so far; when it evaluates
    /// false the argument is skipped entirely.
    pub fn condition<F>(mut self, f: F) -> Self
    where
        F: Fn(&CommandContext) -> Result<bool, HookError> + Send + Sync + 'static,
    {
        self.condition = Some(Arc::new(f));
        self
    }

    /// Sets a transformer applied to the parsed value before validation.
    pub fn transform<F>(mut self, f: F) -> Self
    where
        F: Fn(ArgValue) -> Result<ArgValue, HookError> + Send + Sync + 'static,
    {
        self.transformer = Some(Arc::new(f));
        self
    }

    /// Minimum numeric value (inclusive).
    pub fn min(mut self, min: f64) -> Self {
        self.rules.min = Some(min);
        self
    }

    /// Maximum numeric value (inclusive).
    pub fn max(mut self, max: f64) -> Self {
        self.rules.max = Some(max);
        self
    }

    /// Inclusive string length range, in characters.
    pub fn length(mut self, min: usize, max: usize) -> Self {
        self.rules.min_len = Some(min);
        self.rules.max_len = Some(max);
        self
    }

    /// Pattern the (string) value must match; compiled at build time.
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern_src = Some(pattern.into());
        self
    }

    /// Predefined completion set used for tab completion, membership
    /// validation and did-you-mean suggestions.
    pub fn completions<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rules.one_of = values.into_iter().map(Into::into).collect();
        self
    }

    /// Opts into did-you-mean suggestions on parse failure.
    pub fn suggest(mut self) -> Self {
        self.rules.suggest = true;
        self
    }

    /// Default value backfilled when the (optional) argument is absent.
    pub fn default_value(mut self, value: impl Into<ArgValue>) -> Self {
        self.rules.default = Some(value.into());
        self
    }

    /// Custom predicate with its failure message.
    pub fn validate<F>(mut self, predicate: F, message: impl Into<String>) -> Self
    where
        F: Fn(&ArgValue) -> bool + Send + Sync + 'static,
    {
        self.rules.custom = Some((Arc::new(predicate), message.into()));
        self
    }

    /// Finalizes the spec, checking the rule-block invariants.
    pub fn finish(mut self) -> BuildResult<ArgSpec> {
        if let (Some(min), Some(max)) = (self.rules.min, self.rules.max)
            && min > max
        {
            return Err(BuildError::InvalidRange {
                argument: self.name,
            });
        }
        if let (Some(min), Some(max)) = (self.rules.min_len, self.rules.max_len)
            && min > max
        {
            return Err(BuildError::InvalidRange {
                argument: self.name,
            });
        }
        if let Some(src) = self.pattern_src {
            match Regex::new(&src) {
                Ok(re) => self.rules.pattern = Some(re),
                Err(err) => {
                    return Err(BuildError::InvalidPattern {
                        argument: self.name,
                        reason: err.to_string(),
                    });
                }
            }
        }

        Ok(ArgSpec {
            name: self.name,
            optional: self.optional,
            greedy: self.greedy,
            permission: self.permission,
            parser: self.parser,
            condition: self.condition,
            transformer: self.transformer,
            rules: self.rules,
        })
    }
}
