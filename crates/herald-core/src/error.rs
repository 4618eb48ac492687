//! Unified error types for the herald core.
//!
//! Errors fall into two very different classes:
//!
//! - [`BuildError`] — configuration-contract violations discovered while a
//!   command spec is being built. These are developer errors and abort
//!   construction; they are never produced at dispatch time.
//! - [`CommandFailure`] — the runtime failure taxonomy. Exactly one failure
//!   is produced per failed invocation, reported through the message catalog,
//!   and resolved as "handled" by the dispatcher.
//!
//! User-supplied callbacks (conditions, transformers, guards, validators,
//! fault handlers) report faults as [`HookError`]; command handlers report
//! faults as [`HandlerError`].

use std::time::Duration;

use thiserror::Error;

// =============================================================================
// Build-time errors
// =============================================================================

/// Errors raised while building a command spec.
///
/// All of these are fatal: a spec that violates its structural invariants is
/// never constructed, so dispatch can rely on the invariants without
/// re-checking them.
#[derive(Debug, Clone, Error)]
pub enum BuildError {
    /// Two arguments share a case-insensitive name.
    #[error("command '{command}': duplicate argument name '{name}'")]
    DuplicateArgName {
        /// The command being built.
        command: String,
        /// The colliding argument name.
        name: String,
    },

    /// A required argument was declared after an optional one.
    #[error("command '{command}': required argument '{name}' follows an optional argument")]
    RequiredAfterOptional {
        /// The command being built.
        command: String,
        /// The offending required argument.
        name: String,
    },

    /// A greedy argument is not in the last position.
    #[error("command '{command}': greedy argument '{name}' must be last")]
    GreedyNotLast {
        /// The command being built.
        command: String,
        /// The offending greedy argument.
        name: String,
    },

    /// A greedy argument uses a parser that cannot absorb multiple tokens.
    #[error("command '{command}': greedy argument '{name}' must use a string parser")]
    GreedyNotString {
        /// The command being built.
        command: String,
        /// The offending greedy argument.
        name: String,
    },

    /// Two subcommand aliases collide.
    #[error("command '{command}': duplicate subcommand alias '{alias}'")]
    DuplicateAlias {
        /// The command being built.
        command: String,
        /// The colliding alias.
        alias: String,
    },

    /// A parser reported a blank type name.
    #[error("command '{command}': argument '{name}' has a parser with a blank type name")]
    BlankTypeName {
        /// The command being built.
        command: String,
        /// The argument whose parser is misconfigured.
        name: String,
    },

    /// A validation range has `min > max`.
    #[error("argument '{argument}': validation range has min > max")]
    InvalidRange {
        /// The argument whose rules are misconfigured.
        argument: String,
    },

    /// A validation pattern failed to compile.
    #[error("argument '{argument}': invalid pattern: {reason}")]
    InvalidPattern {
        /// The argument whose rules are misconfigured.
        argument: String,
        /// The regex compile error.
        reason: String,
    },

    /// The help page size is zero.
    #[error("command '{command}': help page size must be at least 1")]
    InvalidPageSize {
        /// The command being built.
        command: String,
    },
}

/// Result type for build operations.
pub type BuildResult<T> = Result<T, BuildError>;

// =============================================================================
// Runtime failure taxonomy
// =============================================================================

/// The scope a cooldown gate applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownScope {
    /// One gate shared by every sender.
    Server,
    /// One gate per sender identity.
    User,
}

/// Distinguishes the two argument-count mismatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageKind {
    /// Fewer tokens than required arguments.
    TooFew,
    /// Unconsumed tokens remain after the last non-greedy argument.
    TooMany,
}

/// A failed invocation, classified.
///
/// Exactly one of these is produced per failed dispatch. The dispatcher
/// reports it through the message catalog and resolves the invocation as
/// handled; callers observe it in the dispatch outcome, never as an escaped
/// error (the synchronous handler-fault case is [`HandlerError`], not this).
#[derive(Debug, Clone, Error)]
pub enum CommandFailure {
    /// The sender lacks the command's permission node.
    #[error("missing permission")]
    Permission,

    /// The command is player-only and the sender is not a player.
    #[error("command is player-only")]
    PlayerOnly,

    /// A guard predicate rejected the invocation (or faulted).
    #[error("guard '{name}' rejected the command")]
    GuardFailed {
        /// The guard's name.
        name: String,
    },

    /// A cooldown gate is still closed.
    #[error("on cooldown ({remaining:?} remaining)")]
    Cooldown {
        /// Which gate rejected the invocation.
        scope: CooldownScope,
        /// Time left, rounded up to whole seconds.
        remaining: Duration,
    },

    /// The token count does not match the argument list.
    #[error("wrong number of arguments")]
    Usage {
        /// Whether there were too few or too many tokens.
        kind: UsageKind,
    },

    /// A token failed its argument's parser.
    #[error("argument '{argument}' is not a valid {expected}")]
    Parsing {
        /// The argument that rejected the token.
        argument: String,
        /// The parser's declared type name.
        expected: String,
        /// The parser's failure reason, if it gave one.
        reason: Option<String>,
        /// Ranked did-you-mean candidates (possibly empty).
        suggestions: Vec<String>,
    },

    /// A parsed value failed a validation rule.
    #[error("argument '{argument}': {message}")]
    Validation {
        /// The argument that failed.
        argument: String,
        /// The first failing rule's message.
        message: String,
    },

    /// The sender lacks a per-argument permission node.
    #[error("missing permission for argument '{argument}'")]
    ArgumentPermission {
        /// The gated argument.
        argument: String,
    },

    /// A cross-argument validator rejected the full value set.
    #[error("{message}")]
    CrossValidation {
        /// The validator's message.
        message: String,
    },

    /// An advanced async handler exceeded its deadline.
    #[error("timed out after {limit:?}")]
    Timeout {
        /// The configured deadline.
        limit: Duration,
    },

    /// The handler faulted on an async path.
    #[error("handler failed: {reason}")]
    Execution {
        /// The handler's error message.
        reason: String,
    },

    /// A user-supplied callback faulted outside its contract.
    #[error("internal error in {stage}")]
    Internal {
        /// Which pipeline stage the fault occurred in.
        stage: String,
    },
}

impl CommandFailure {
    /// Returns the taxonomy kind, for logging and matching.
    pub fn kind(&self) -> FailureKind {
        match self {
            CommandFailure::Permission => FailureKind::Permission,
            CommandFailure::PlayerOnly => FailureKind::PlayerOnly,
            CommandFailure::GuardFailed { .. } => FailureKind::GuardFailed,
            CommandFailure::Cooldown { .. } => FailureKind::Cooldown,
            CommandFailure::Usage { .. } => FailureKind::Usage,
            CommandFailure::Parsing { .. } => FailureKind::Parsing,
            CommandFailure::Validation { .. } => FailureKind::Validation,
            CommandFailure::ArgumentPermission { .. } => FailureKind::ArgumentPermission,
            CommandFailure::CrossValidation { .. } => FailureKind::CrossValidation,
            CommandFailure::Timeout { .. } => FailureKind::Timeout,
            CommandFailure::Execution { .. } => FailureKind::Execution,
            CommandFailure::Internal { .. } => FailureKind::Internal,
        }
    }
}

/// The flat failure taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Command permission denied.
    Permission,
    /// Player-only restriction.
    PlayerOnly,
    /// Guard rejection.
    GuardFailed,
    /// Cooldown gate closed.
    Cooldown,
    /// Argument-count mismatch.
    Usage,
    /// Token failed a parser.
    Parsing,
    /// Value failed a rule.
    Validation,
    /// Per-argument permission denied.
    ArgumentPermission,
    /// Cross-argument validator rejection.
    CrossValidation,
    /// Async deadline exceeded.
    Timeout,
    /// Handler fault.
    Execution,
    /// Fault in a user-supplied callback.
    Internal,
}

// =============================================================================
// Callback faults
// =============================================================================

/// A fault raised by a user-supplied callback.
///
/// Conditions, transformers, guards, cross validators and fault handlers all
/// return `Result<_, HookError>`; the dispatcher classifies the fault at the
/// boundary per the failure taxonomy.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct HookError(String);

impl HookError {
    /// Creates a hook fault with the given message.
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the fault message.
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl From<String> for HookError {
    fn from(msg: String) -> Self {
        Self(msg)
    }
}

impl From<&str> for HookError {
    fn from(msg: &str) -> Self {
        Self(msg.to_string())
    }
}

/// A fault raised by a command handler.
///
/// On the synchronous path this is the one error class that escapes the
/// dispatch entry point (after being reported to the sender), so a host-level
/// error boundary can still observe it. On async paths it is caught and
/// logged, never propagated.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct HandlerError(String);

impl HandlerError {
    /// Creates a handler fault with the given message.
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the fault message.
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl From<String> for HandlerError {
    fn from(msg: String) -> Self {
        Self(msg)
    }
}

impl From<&str> for HandlerError {
    fn from(msg: &str) -> Self {
        Self(msg.to_string())
    }
}
