//! Command specifications.
//!
//! A [`CommandSpec`] bundles everything the dispatcher needs to run one
//! command: its argument list, subcommand table, guards, cooldowns, hooks
//! and executor. Specs are built once through [`CommandBuilder`], checked
//! against their structural invariants at build time, and immutable (and
//! `Arc`-shared) thereafter — dispatch never re-validates them, no matter
//! how many invocations run concurrently.
//!
//! Ownership flows strictly downward: a parent's subcommand map owns its
//! children, and each child holds only a [`Weak`] back-reference used to
//! reconstruct the display path.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use herald_core::{BuildError, BuildResult, CommandContext, CommandFailure, HandlerError, HookError, Sender};

use crate::arg::ArgSpec;
use crate::dispatch::{DispatchOutcome, Progress};
use crate::validate::CrossValidator;

/// A type-erased command handler.
pub type HandlerFn =
    Arc<dyn Fn(Arc<CommandContext>) -> BoxFuture<'static, Result<(), HandlerError>> + Send + Sync>;

/// A type-erased advanced handler: receives a cancellation token it must
/// poll cooperatively and a progress reporter.
pub type AdvancedHandlerFn = Arc<
    dyn Fn(
            Arc<CommandContext>,
            CancellationToken,
            Progress,
        ) -> BoxFuture<'static, Result<(), HandlerError>>
        + Send
        + Sync,
>;

/// A before-execution hook; `Err(reason)` aborts the invocation.
pub type BeforeHook = Arc<dyn Fn(&dyn Sender, &CommandSpec) -> Result<(), String> + Send + Sync>;

/// An after-execution hook; purely observational.
pub type AfterHook = Arc<dyn Fn(&InvocationSummary) + Send + Sync>;

/// A custom fault handler. `Ok(true)` suppresses the default user-facing
/// message; a fault from the handler itself falls back to the default.
pub type FaultHandler = Arc<dyn Fn(&dyn Sender, &CommandFailure) -> Result<bool, HookError> + Send + Sync>;

/// Result summary handed to after-execution hooks.
#[derive(Debug, Clone)]
pub struct InvocationSummary {
    /// Full path of the command that ran.
    pub command: String,
    /// How the dispatch resolved.
    pub outcome: DispatchOutcome,
    /// Wall time spent in dispatch (excludes detached async handlers).
    pub elapsed: Duration,
}

/// How the handler is executed.
#[derive(Clone)]
pub enum Executor {
    /// Inline on the dispatching task; a handler fault propagates to the
    /// caller after being reported.
    Sync(HandlerFn),
    /// On a background task; faults are caught and logged, never propagated.
    Async(HandlerFn),
    /// On a background task with cooperative cancellation, progress
    /// reporting, and an optional timeout race.
    Advanced {
        /// The handler.
        handler: AdvancedHandlerFn,
        /// Deadline for the timeout race, if any.
        timeout: Option<Duration>,
    },
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Executor::Sync(_) => f.write_str("Sync"),
            Executor::Async(_) => f.write_str("Async"),
            Executor::Advanced { timeout, .. } => {
                f.debug_struct("Advanced").field("timeout", timeout).finish()
            }
        }
    }
}

/// A boolean precondition over the sender, independent of parsed arguments.
#[derive(Clone)]
pub struct Guard {
    name: String,
    predicate: Arc<dyn Fn(&dyn Sender) -> Result<bool, HookError> + Send + Sync>,
}

impl Guard {
    /// An infallible guard.
    pub fn new<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&dyn Sender) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            predicate: Arc::new(move |sender| Ok(predicate(sender))),
        }
    }

    /// A guard whose predicate may fault; a fault counts as a rejection.
    pub fn fallible<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&dyn Sender) -> Result<bool, HookError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            predicate: Arc::new(predicate),
        }
    }

    /// The guard's name, used in reports.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn check(&self, sender: &dyn Sender) -> Result<bool, HookError> {
        (self.predicate)(sender)
    }
}

/// Help rendering settings.
#[derive(Debug, Clone, Copy)]
pub struct HelpSettings {
    /// Whether the command renders help pages at all.
    pub enabled: bool,
    /// Entries per page (at least 1, checked at build).
    pub page_size: usize,
}

impl Default for HelpSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            page_size: 10,
        }
    }
}

/// An immutable, shareable command definition.
pub struct CommandSpec {
    name: String,
    aliases: Vec<String>,
    description: String,
    permission: Option<String>,
    player_only: bool,
    send_errors: bool,
    sanitize_input: bool,
    fuzzy_matching: bool,
    help: HelpSettings,
    executor: Option<Executor>,
    args: Vec<ArgSpec>,
    subcommands: HashMap<String, Arc<CommandSpec>>,
    sub_order: Vec<Arc<CommandSpec>>,
    guards: Vec<Guard>,
    cross_validators: Vec<CrossValidator>,
    before_hooks: Vec<BeforeHook>,
    after_hooks: Vec<AfterHook>,
    cooldown_user: Option<Duration>,
    cooldown_server: Option<Duration>,
    fault_handler: Option<FaultHandler>,
    usage: String,
    parent: Weak<CommandSpec>,
}

impl CommandSpec {
    /// Starts building a command.
    pub fn builder(name: impl Into<String>) -> CommandBuilder {
        CommandBuilder::new(name)
    }

    /// The primary name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Alternative invocation names (not including the primary name).
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// The help description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The command permission node, if any.
    pub fn permission(&self) -> Option<&str> {
        self.permission.as_deref()
    }

    /// Whether only players may invoke the command.
    pub fn is_player_only(&self) -> bool {
        self.player_only
    }

    /// Whether failures are reported to the sender.
    pub fn sends_errors(&self) -> bool {
        self.send_errors
    }

    /// Whether textual values are sanitized after parsing.
    pub fn sanitizes_input(&self) -> bool {
        self.sanitize_input
    }

    /// Whether unmatched first tokens may route by similarity.
    pub fn fuzzy_matching(&self) -> bool {
        self.fuzzy_matching
    }

    /// Help settings.
    pub fn help(&self) -> &HelpSettings {
        &self.help
    }

    /// The executor, if the command has its own handler.
    pub fn executor(&self) -> Option<&Executor> {
        self.executor.as_ref()
    }

    /// The ordered argument list.
    pub fn args(&self) -> &[ArgSpec] {
        &self.args
    }

    /// Number of required (non-optional) arguments.
    pub fn required_count(&self) -> usize {
        self.args.iter().filter(|a| !a.is_optional()).count()
    }

    /// Looks up a subcommand by alias, case-insensitively.
    pub fn subcommand(&self, alias: &str) -> Option<&Arc<CommandSpec>> {
        self.subcommands.get(&alias.to_lowercase())
    }

    /// All registered subcommand aliases (lowercased).
    pub fn subcommand_aliases(&self) -> impl Iterator<Item = &str> {
        self.subcommands.keys().map(String::as_str)
    }

    /// Unique subcommand specs in insertion order (for help).
    pub fn subcommands_ordered(&self) -> &[Arc<CommandSpec>] {
        &self.sub_order
    }

    /// Returns `true` if the command has any subcommands.
    pub fn has_subcommands(&self) -> bool {
        !self.sub_order.is_empty()
    }

    pub(crate) fn guards(&self) -> &[Guard] {
        &self.guards
    }

    pub(crate) fn cross_validators(&self) -> &[CrossValidator] {
        &self.cross_validators
    }

    pub(crate) fn before_hooks(&self) -> &[BeforeHook] {
        &self.before_hooks
    }

    pub(crate) fn after_hooks(&self) -> &[AfterHook] {
        &self.after_hooks
    }

    /// Per-user cooldown window, if any.
    pub fn cooldown_user(&self) -> Option<Duration> {
        self.cooldown_user
    }

    /// Server-wide cooldown window, if any.
    pub fn cooldown_server(&self) -> Option<Duration> {
        self.cooldown_server
    }

    pub(crate) fn fault_handler(&self) -> Option<&FaultHandler> {
        self.fault_handler.as_ref()
    }

    /// The usage line, cached at build time.
    pub fn usage(&self) -> &str {
        &self.usage
    }

    /// Reconstructs the full command path by walking parent references
    /// upward. The path is never stored redundantly.
    pub fn full_path(&self) -> String {
        let mut parts = vec![self.name.clone()];
        let mut parent = self.parent.upgrade();
        while let Some(p) = parent {
            parts.push(p.name.clone());
            parent = p.parent.upgrade();
        }
        parts.reverse();
        parts.join(" ")
    }
}

impl std::fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandSpec")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("args", &self.args)
            .field("subcommands", &self.sub_order.len())
            .field("usage", &self.usage)
            .finish_non_exhaustive()
    }
}

fn build_usage(path: &str, args: &[ArgSpec]) -> String {
    let mut usage = format!("/{path}");
    for arg in args {
        usage.push(' ');
        if arg.is_greedy() {
            usage.push_str(&format!("[{}...]", arg.name()));
        } else if arg.is_optional() {
            usage.push_str(&format!("[{}]", arg.name()));
        } else {
            usage.push_str(&format!("<{}>", arg.name()));
        }
    }
    usage
}

/// Fluent builder for [`CommandSpec`].
///
/// Structural invariants are checked by [`build`](Self::build) across the
/// whole tree before anything is constructed, so a returned spec always
/// satisfies them.
pub struct CommandBuilder {
    name: String,
    aliases: Vec<String>,
    description: String,
    permission: Option<String>,
    player_only: bool,
    send_errors: bool,
    sanitize_input: bool,
    fuzzy_matching: bool,
    help: HelpSettings,
    executor: Option<Executor>,
    timeout: Option<Duration>,
    args: Vec<ArgSpec>,
    children: Vec<CommandBuilder>,
    guards: Vec<Guard>,
    cross_validators: Vec<CrossValidator>,
    before_hooks: Vec<BeforeHook>,
    after_hooks: Vec<AfterHook>,
    cooldown_user: Option<Duration>,
    cooldown_server: Option<Duration>,
    fault_handler: Option<FaultHandler>,
}

impl CommandBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            description: String::new(),
            permission: None,
            player_only: false,
            send_errors: true,
            sanitize_input: false,
            fuzzy_matching: true,
            help: HelpSettings::default(),
            executor: None,
            timeout: None,
            args: Vec::new(),
            children: Vec::new(),
            guards: Vec::new(),
            cross_validators: Vec::new(),
            before_hooks: Vec::new(),
            after_hooks: Vec::new(),
            cooldown_user: None,
            cooldown_server: None,
            fault_handler: None,
        }
    }

    /// Adds an invocation alias.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Sets the help description.
    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = text.into();
        self
    }

    /// Requires a permission node to invoke the command.
    pub fn permission(mut self, node: impl Into<String>) -> Self {
        self.permission = Some(node.into());
        self
    }

    /// Restricts the command to players.
    pub fn player_only(mut self, player_only: bool) -> Self {
        self.player_only = player_only;
        self
    }

    /// Toggles failure reporting to the sender (default on).
    pub fn send_errors(mut self, send: bool) -> Self {
        self.send_errors = send;
        self
    }

    /// Enables input sanitization for textual values.
    pub fn sanitize_input(mut self, sanitize: bool) -> Self {
        self.sanitize_input = sanitize;
        self
    }

    /// Toggles fuzzy subcommand matching (default on).
    pub fn fuzzy_matching(mut self, fuzzy: bool) -> Self {
        self.fuzzy_matching = fuzzy;
        self
    }

    /// Disables help rendering for this command.
    pub fn disable_help(mut self) -> Self {
        self.help.enabled = false;
        self
    }

    /// Sets the help page size (must be at least 1; checked at build).
    pub fn help_page_size(mut self, size: usize) -> Self {
        self.help.page_size = size;
        self
    }

    /// Appends an argument.
    pub fn arg(mut self, arg: ArgSpec) -> Self {
        self.args.push(arg);
        self
    }

    /// Attaches a subcommand.
    pub fn subcommand(mut self, child: CommandBuilder) -> Self {
        self.children.push(child);
        self
    }

    /// Appends a guard.
    pub fn guard(mut self, guard: Guard) -> Self {
        self.guards.push(guard);
        self
    }

    /// Appends a cross-argument validator.
    pub fn cross_validate<F>(mut self, f: F) -> Self
    where
        F: Fn(&CommandContext) -> Result<Option<String>, HookError> + Send + Sync + 'static,
    {
        self.cross_validators.push(Arc::new(f));
        self
    }

    /// Appends a before-execution hook.
    pub fn before<F>(mut self, f: F) -> Self
    where
        F: Fn(&dyn Sender, &CommandSpec) -> Result<(), String> + Send + Sync + 'static,
    {
        self.before_hooks.push(Arc::new(f));
        self
    }

    /// Appends an after-execution hook.
    pub fn after<F>(mut self, f: F) -> Self
    where
        F: Fn(&InvocationSummary) + Send + Sync + 'static,
    {
        self.after_hooks.push(Arc::new(f));
        self
    }

    /// Sets the per-user cooldown window.
    pub fn cooldown_user(mut self, window: Duration) -> Self {
        self.cooldown_user = Some(window);
        self
    }

    /// Sets the server-wide cooldown window.
    pub fn cooldown_server(mut self, window: Duration) -> Self {
        self.cooldown_server = Some(window);
        self
    }

    /// Installs a custom fault handler.
    pub fn on_fault<F>(mut self, f: F) -> Self
    where
        F: Fn(&dyn Sender, &CommandFailure) -> Result<bool, HookError> + Send + Sync + 'static,
    {
        self.fault_handler = Some(Arc::new(f));
        self
    }

    /// Sets a synchronous handler, run inline on the dispatching task.
    pub fn run<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Arc<CommandContext>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.executor = Some(Executor::Sync(Arc::new(move |ctx| Box::pin(f(ctx)))));
        self
    }

    /// Sets a basic asynchronous handler, run on a background task.
    pub fn run_async<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Arc<CommandContext>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.executor = Some(Executor::Async(Arc::new(move |ctx| Box::pin(f(ctx)))));
        self
    }

    /// Sets an advanced asynchronous handler with cancellation and progress
    /// support. Combine with [`timeout`](Self::timeout) for a deadline race.
    pub fn run_advanced<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Arc<CommandContext>, CancellationToken, Progress) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.executor = Some(Executor::Advanced {
            handler: Arc::new(move |ctx, token, progress| Box::pin(f(ctx, token, progress))),
            timeout: None,
        });
        self
    }

    /// Sets the deadline for an advanced handler.
    pub fn timeout(mut self, deadline: Duration) -> Self {
        self.timeout = Some(deadline);
        self
    }

    /// Builds the command tree.
    ///
    /// The whole tree is validated first; construction only happens once
    /// every invariant holds, so a partially-built tree is never observable.
    pub fn build(self) -> BuildResult<Arc<CommandSpec>> {
        self.validate()?;
        Ok(self.assemble(Weak::new(), ""))
    }

    fn validate(&self) -> BuildResult<()> {
        if self.help.page_size == 0 {
            return Err(BuildError::InvalidPageSize {
                command: self.name.clone(),
            });
        }

        let mut seen_names: Vec<String> = Vec::new();
        let mut seen_optional = false;
        for (i, arg) in self.args.iter().enumerate() {
            let lower = arg.name().to_lowercase();
            if seen_names.contains(&lower) {
                return Err(BuildError::DuplicateArgName {
                    command: self.name.clone(),
                    name: arg.name().to_string(),
                });
            }
            seen_names.push(lower);

            if arg.parser().type_name().trim().is_empty() {
                return Err(BuildError::BlankTypeName {
                    command: self.name.clone(),
                    name: arg.name().to_string(),
                });
            }

            if arg.is_optional() || arg.is_greedy() {
                seen_optional = true;
            } else if seen_optional {
                return Err(BuildError::RequiredAfterOptional {
                    command: self.name.clone(),
                    name: arg.name().to_string(),
                });
            }

            if arg.is_greedy() {
                if i + 1 != self.args.len() {
                    return Err(BuildError::GreedyNotLast {
                        command: self.name.clone(),
                        name: arg.name().to_string(),
                    });
                }
                if !arg.parser().supports_greedy() {
                    return Err(BuildError::GreedyNotString {
                        command: self.name.clone(),
                        name: arg.name().to_string(),
                    });
                }
            }
        }

        let mut seen_aliases: Vec<String> = Vec::new();
        for child in &self.children {
            for alias in child.invocation_names() {
                let lower = alias.to_lowercase();
                if seen_aliases.contains(&lower) {
                    return Err(BuildError::DuplicateAlias {
                        command: self.name.clone(),
                        alias,
                    });
                }
                seen_aliases.push(lower);
            }
            child.validate()?;
        }

        Ok(())
    }

    /// The child's primary name plus its aliases.
    fn invocation_names(&self) -> Vec<String> {
        let mut names = vec![self.name.clone()];
        names.extend(self.aliases.iter().cloned());
        names
    }

    fn assemble(self, parent: Weak<CommandSpec>, path: &str) -> Arc<CommandSpec> {
        Arc::new_cyclic(|weak: &Weak<CommandSpec>| {
            let full_path = if path.is_empty() {
                self.name.clone()
            } else {
                format!("{path} {}", self.name)
            };
            let usage = build_usage(&full_path, &self.args);

            let mut subcommands = HashMap::new();
            let mut sub_order = Vec::new();
            for child in self.children {
                let aliases = child.invocation_names();
                let spec = child.assemble(weak.clone(), &full_path);
                for alias in aliases {
                    subcommands.insert(alias.to_lowercase(), Arc::clone(&spec));
                }
                sub_order.push(spec);
            }

            let executor = match (self.executor, self.timeout) {
                (Some(Executor::Advanced { handler, .. }), deadline) => {
                    Some(Executor::Advanced {
                        handler,
                        timeout: deadline,
                    })
                }
                (executor, _) => executor,
            };

            CommandSpec {
                name: self.name,
                aliases: self.aliases,
                description: self.description,
                permission: self.permission,
                player_only: self.player_only,
                send_errors: self.send_errors,
                sanitize_input: self.sanitize_input,
                fuzzy_matching: self.fuzzy_matching,
                help: self.help,
                executor,
                args: self.args,
                subcommands,
                sub_order,
                guards: self.guards,
                cross_validators: self.cross_validators,
                before_hooks: self.before_hooks,
                after_hooks: self.after_hooks,
                cooldown_user: self.cooldown_user,
                cooldown_server: self.cooldown_server,
                fault_handler: self.fault_handler,
                usage,
                parent,
            }
        })
    }
}
