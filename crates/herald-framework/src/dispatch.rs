//! The execution dispatcher.
//!
//! [`Dispatcher`] drives one invocation through the fixed gate order:
//!
//! ```text
//! permission → player-only → guards → before-hooks → cooldown gates
//!     → help/route → parse → cross-validate → cooldown update
//!     → handler → after-hooks
//! ```
//!
//! Any gate may resolve the invocation with a typed [`CommandFailure`];
//! exactly one catalog message is sent per failure (plus at most one
//! did-you-mean line), and nothing escapes the entry point uncaught — except
//! a synchronous handler fault, which is deliberately rethrown after being
//! reported so a host-level error boundary can still observe it.
//!
//! The dispatcher owns no per-invocation state; it is a cheap bundle of
//! `Arc`'d collaborators (catalog, scheduler, cooldown store) and can be
//! cloned freely into background tasks.

use std::sync::Arc;
use std::time::Instant;

use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, debug_span, error, warn};

use herald_core::{
    CommandFailure, CooldownScope, DefaultCatalog, HandlerError, Message, MessageCatalog,
    Scheduler, Sender, TokioScheduler, UsageKind,
};

use crate::command::{CommandSpec, Executor, InvocationSummary};
use crate::cooldown::{self, CooldownStore, MemoryCooldownStore};
use crate::help;
use crate::parse;
use crate::router::{self, Route};
use crate::validate;

/// How a dispatch resolved.
#[derive(Debug, Clone)]
pub enum DispatchOutcome {
    /// The handler ran inline and returned successfully (or the command has
    /// no handler and everything validated).
    Completed,
    /// The handler was scheduled on a background task; its result is
    /// reported asynchronously.
    Scheduled,
    /// A help page was rendered instead of executing.
    HelpShown {
        /// The page actually shown, after clamping.
        page: usize,
    },
    /// The invocation failed one of the gates; the failure was reported.
    Failed(CommandFailure),
}

/// Progress reporter handed to advanced handlers.
///
/// Reports are marshaled onto the scheduler's main context when one is
/// registered; otherwise they are delivered inline from the worker.
#[derive(Clone)]
pub struct Progress {
    sender: Arc<dyn Sender>,
    scheduler: Arc<dyn Scheduler>,
}

impl Progress {
    /// Delivers a progress line to the sender.
    pub async fn report(&self, text: impl Into<String>) {
        let text = text.into();
        if self.scheduler.has_main_context() {
            let sender = Arc::clone(&self.sender);
            self.scheduler
                .run_on_main(Box::pin(async move { sender.send(&text).await }));
        } else {
            self.sender.send(&text).await;
        }
    }
}

/// The command execution dispatcher.
#[derive(Clone)]
pub struct Dispatcher {
    catalog: Arc<dyn MessageCatalog>,
    scheduler: Arc<dyn Scheduler>,
    cooldowns: Arc<dyn CooldownStore>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    /// Creates a dispatcher with the default catalog, scheduler and
    /// in-memory cooldown store.
    pub fn new() -> Self {
        Self {
            catalog: Arc::new(DefaultCatalog),
            scheduler: Arc::new(TokioScheduler),
            cooldowns: Arc::new(MemoryCooldownStore::new()),
        }
    }

    /// Replaces the message catalog.
    pub fn with_catalog(mut self, catalog: Arc<dyn MessageCatalog>) -> Self {
        self.catalog = catalog;
        self
    }

    /// Replaces the scheduler.
    pub fn with_scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Replaces the cooldown store.
    pub fn with_cooldown_store(mut self, store: Arc<dyn CooldownStore>) -> Self {
        self.cooldowns = store;
        self
    }

    /// Dispatches one invocation of `command` with the given raw tokens.
    ///
    /// All failures are reported and returned inside the outcome; the only
    /// `Err` this produces is a synchronous handler fault.
    pub async fn dispatch(
        &self,
        command: &Arc<CommandSpec>,
        sender: Arc<dyn Sender>,
        tokens: Vec<String>,
    ) -> Result<DispatchOutcome, HandlerError> {
        let label = command.name().to_string();
        self.clone()
            .run(Arc::clone(command), sender, label, tokens)
            .await
    }

    // Boxed so subcommand delegation can recurse.
    fn run(
        self,
        command: Arc<CommandSpec>,
        sender: Arc<dyn Sender>,
        label: String,
        tokens: Vec<String>,
    ) -> BoxFuture<'static, Result<DispatchOutcome, HandlerError>> {
        Box::pin(async move {
            let span = debug_span!(
                "dispatch",
                command = %command.full_path(),
                sender = %sender.name(),
            );
            async {
                let start = Instant::now();
                let result = self.execute(&command, &sender, &label, tokens).await;

                let outcome = match &result {
                    Ok(outcome) => outcome.clone(),
                    Err(err) => DispatchOutcome::Failed(CommandFailure::Execution {
                        reason: err.message().to_string(),
                    }),
                };
                let summary = InvocationSummary {
                    command: command.full_path(),
                    outcome,
                    elapsed: start.elapsed(),
                };
                for hook in command.after_hooks() {
                    hook(&summary);
                }

                result
            }
            .instrument(span)
            .await
        })
    }

    async fn execute(
        &self,
        command: &Arc<CommandSpec>,
        sender: &Arc<dyn Sender>,
        label: &str,
        tokens: Vec<String>,
    ) -> Result<DispatchOutcome, HandlerError> {
        if let Some(node) = command.permission()
            && !sender.has_permission(node)
        {
            return Ok(self.fail(command, sender, CommandFailure::Permission).await);
        }

        if command.is_player_only() && !sender.is_player() {
            return Ok(self.fail(command, sender, CommandFailure::PlayerOnly).await);
        }

        for guard in command.guards() {
            match guard.check(sender.as_ref()) {
                Ok(true) => {}
                Ok(false) => {
                    let failure = CommandFailure::GuardFailed {
                        name: guard.name().to_string(),
                    };
                    return Ok(self.fail(command, sender, failure).await);
                }
                Err(fault) => {
                    // A faulting guard counts as a failing guard.
                    warn!(guard = guard.name(), fault = %fault, "guard faulted");
                    let failure = CommandFailure::GuardFailed {
                        name: guard.name().to_string(),
                    };
                    return Ok(self.fail(command, sender, failure).await);
                }
            }
        }

        for hook in command.before_hooks() {
            if let Err(reason) = hook(sender.as_ref(), command) {
                debug!(reason = %reason, "before-hook aborted dispatch");
                let failure = CommandFailure::GuardFailed { name: reason };
                return Ok(self.fail(command, sender, failure).await);
            }
        }

        let path = command.full_path();
        let now = Instant::now();
        if let Some(window) = command.cooldown_server()
            && let Some(remaining) = cooldown::remaining(
                self.cooldowns.as_ref(),
                &cooldown::server_key(&path),
                window,
                now,
            )
        {
            let failure = CommandFailure::Cooldown {
                scope: CooldownScope::Server,
                remaining,
            };
            return Ok(self.fail(command, sender, failure).await);
        }
        if let Some(window) = command.cooldown_user()
            && let Some(remaining) = cooldown::remaining(
                self.cooldowns.as_ref(),
                &cooldown::user_key(&path, sender.name()),
                window,
                now,
            )
        {
            let failure = CommandFailure::Cooldown {
                scope: CooldownScope::User,
                remaining,
            };
            return Ok(self.fail(command, sender, failure).await);
        }

        if command.has_subcommands() {
            match tokens.first() {
                None => {
                    if command.executor().is_none() && command.help().enabled {
                        return Ok(self.show_help(command, sender, 1).await);
                    }
                }
                Some(first) => match router::route(command, first) {
                    Route::Delegate(child) => {
                        let rest = tokens[1..].to_vec();
                        return self
                            .clone()
                            .run(child, Arc::clone(sender), first.clone(), rest)
                            .await;
                    }
                    Route::HelpPage(page) => {
                        return Ok(self.show_help(command, sender, page).await);
                    }
                    Route::Parse => {}
                },
            }
        }

        let ctx = match parse::parse_args(command, sender, label, &tokens) {
            Ok(ctx) => Arc::new(ctx),
            Err(failure) => return Ok(self.fail(command, sender, failure).await),
        };

        if let Err(failure) = validate::run_cross_validators(command.cross_validators(), &ctx) {
            return Ok(self.fail(command, sender, failure).await);
        }

        // The ledger is written on successful validation, regardless of what
        // the handler does afterwards.
        let now = Instant::now();
        if command.cooldown_server().is_some() {
            self.cooldowns.set(&cooldown::server_key(&path), now);
        }
        if command.cooldown_user().is_some() {
            self.cooldowns
                .set(&cooldown::user_key(&path, sender.name()), now);
        }

        match command.executor() {
            None => Ok(DispatchOutcome::Completed),

            Some(Executor::Sync(handler)) => match handler(Arc::clone(&ctx)).await {
                Ok(()) => Ok(DispatchOutcome::Completed),
                Err(err) => {
                    error!(command = %path, error = %err, "synchronous handler failed");
                    let failure = CommandFailure::Execution {
                        reason: err.message().to_string(),
                    };
                    self.report(command, sender, &failure).await;
                    // Deliberately rethrown after reporting.
                    Err(err)
                }
            },

            Some(Executor::Async(handler)) => {
                let fut = handler(Arc::clone(&ctx));
                let this = self.clone();
                let command = Arc::clone(command);
                let sender = Arc::clone(sender);
                self.scheduler.spawn(Box::pin(async move {
                    if let Err(err) = fut.await {
                        error!(
                            command = %command.full_path(),
                            error = %err,
                            "async handler failed"
                        );
                        let failure = CommandFailure::Execution {
                            reason: err.message().to_string(),
                        };
                        this.report(&command, &sender, &failure).await;
                    }
                }));
                Ok(DispatchOutcome::Scheduled)
            }

            Some(Executor::Advanced { handler, timeout }) => {
                let token = CancellationToken::new();
                let progress = Progress {
                    sender: Arc::clone(sender),
                    scheduler: Arc::clone(&self.scheduler),
                };
                let fut = handler(Arc::clone(&ctx), token.clone(), progress);
                let this = self.clone();
                let command = Arc::clone(command);
                let sender = Arc::clone(sender);
                let deadline = *timeout;
                self.scheduler.spawn(Box::pin(async move {
                    // The handler gets its own task: a timed-out handler that
                    // ignores its token keeps running detached, and its
                    // eventual result is discarded.
                    let handle = tokio::spawn(fut);
                    let joined = match deadline {
                        Some(limit) => match tokio::time::timeout(limit, handle).await {
                            Ok(joined) => joined,
                            Err(_) => {
                                token.cancel();
                                warn!(
                                    command = %command.full_path(),
                                    limit_ms = limit.as_millis() as u64,
                                    "advanced handler timed out"
                                );
                                let failure = CommandFailure::Timeout { limit };
                                this.report(&command, &sender, &failure).await;
                                return;
                            }
                        },
                        None => handle.await,
                    };
                    match joined {
                        Ok(Ok(())) => {}
                        Ok(Err(err)) => {
                            error!(
                                command = %command.full_path(),
                                error = %err,
                                "advanced handler failed"
                            );
                            let failure = CommandFailure::Execution {
                                reason: err.message().to_string(),
                            };
                            this.report(&command, &sender, &failure).await;
                        }
                        Err(join_err) => {
                            error!(
                                command = %command.full_path(),
                                error = %join_err,
                                "advanced handler aborted"
                            );
                            let failure = CommandFailure::Execution {
                                reason: join_err.to_string(),
                            };
                            this.report(&command, &sender, &failure).await;
                        }
                    }
                }));
                Ok(DispatchOutcome::Scheduled)
            }
        }
    }

    async fn fail(
        &self,
        command: &Arc<CommandSpec>,
        sender: &Arc<dyn Sender>,
        failure: CommandFailure,
    ) -> DispatchOutcome {
        self.report(command, sender, &failure).await;
        DispatchOutcome::Failed(failure)
    }

    /// Reports a failure to the sender: at most one catalog message plus one
    /// did-you-mean line, subject to the send-errors toggle and the
    /// command's fault handler.
    async fn report(
        &self,
        command: &Arc<CommandSpec>,
        sender: &Arc<dyn Sender>,
        failure: &CommandFailure,
    ) {
        debug!(kind = ?failure.kind(), "command failed");
        if !command.sends_errors() {
            return;
        }

        if let Some(handler) = command.fault_handler() {
            match handler(sender.as_ref(), failure) {
                Ok(true) => return,
                Ok(false) => {}
                Err(fault) => {
                    // The fault handler is itself fault-isolated: fall back
                    // to the built-in message.
                    error!(fault = %fault, "fault handler faulted");
                }
            }
        }

        let message = failure_message(command, failure);
        sender.send(&self.catalog.render(&message)).await;

        if let CommandFailure::Parsing { suggestions, .. } = failure
            && !suggestions.is_empty()
        {
            let hint = Message::DidYouMean {
                suggestions: suggestions.clone(),
            };
            sender.send(&self.catalog.render(&hint)).await;
        }
    }

    async fn show_help(
        &self,
        command: &Arc<CommandSpec>,
        sender: &Arc<dyn Sender>,
        requested: usize,
    ) -> DispatchOutcome {
        let (page, messages) = help::render_page(command, requested);
        for message in &messages {
            sender.send(&self.catalog.render(message)).await;
        }
        DispatchOutcome::HelpShown { page }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher").finish_non_exhaustive()
    }
}

/// Maps a failure to its catalog message.
fn failure_message(command: &CommandSpec, failure: &CommandFailure) -> Message {
    match failure {
        CommandFailure::Permission => Message::NoPermission,
        CommandFailure::PlayerOnly => Message::PlayerOnly,
        CommandFailure::GuardFailed { name } => Message::GuardFailed {
            guard: name.clone(),
        },
        CommandFailure::Cooldown { remaining, .. } => Message::Cooldown {
            remaining_secs: remaining.as_secs(),
        },
        CommandFailure::Usage {
            kind: UsageKind::TooFew,
        } => Message::Usage {
            usage: command.usage().to_string(),
        },
        CommandFailure::Usage {
            kind: UsageKind::TooMany,
        } => Message::TooManyArguments {
            usage: command.usage().to_string(),
        },
        CommandFailure::Parsing {
            argument,
            expected,
            reason,
            ..
        } => Message::ParseFailed {
            argument: argument.clone(),
            expected: expected.clone(),
            reason: reason.clone(),
        },
        CommandFailure::Validation { argument, message } => Message::ValidationFailed {
            argument: argument.clone(),
            message: message.clone(),
        },
        CommandFailure::ArgumentPermission { argument } => Message::ArgumentPermission {
            argument: argument.clone(),
        },
        CommandFailure::CrossValidation { message } => Message::CrossValidationFailed {
            message: message.clone(),
        },
        CommandFailure::Timeout { limit } => Message::Timeout {
            limit_secs: limit.as_secs(),
        },
        CommandFailure::Execution { .. } => Message::ExecutionFailed,
        CommandFailure::Internal { .. } => Message::InternalError,
    }
}
