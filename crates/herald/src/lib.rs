//! # Herald
//!
//! A typed, host-agnostic command definition and dispatch engine.
//!
//! ## Overview
//!
//! Herald turns raw token streams (chat commands, console lines) into typed,
//! validated handler invocations. Commands are declared once through a
//! fluent builder, checked against their structural invariants at build
//! time, and dispatched concurrently against immutable specs.
//!
//! ## Architecture
//!
//! One invocation flows through a fixed pipeline:
//!
//! ```text
//! ┌────────┐   ┌────────────────────────────┐   ┌──────────────────────┐
//! │ tokens │──▶│ gates: permission, guards, │──▶│ route: subcommands,  │
//! │        │   │ cooldown ledger            │   │ fuzzy match, help    │
//! └────────┘   └────────────────────────────┘   └──────────┬───────────┘
//!                                                          │
//!              ┌────────────────────────────┐   ┌──────────▼───────────┐
//!              │ executor: sync / async /   │◀──│ parse + validate:    │
//!              │ advanced (cancel, timeout, │   │ typed context        │
//!              │ progress)                  │   └──────────────────────┘
//!              └────────────────────────────┘
//! ```
//!
//! The host stays behind three small traits — [`Sender`](core::Sender),
//! [`Scheduler`](core::Scheduler) and [`MessageCatalog`](core::MessageCatalog)
//! — so the engine never assumes a particular chat platform, game server or
//! output format.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use herald::prelude::*;
//!
//! let command = CommandSpec::builder("ban")
//!     .description("Ban a player")
//!     .permission("mod.ban")
//!     .arg(ArgSpec::builder("target", StringParser).finish()?)
//!     .arg(ArgSpec::builder("reason", StringParser).greedy().optional().finish()?)
//!     .run_async(|ctx| async move {
//!         let target: String = ctx.get("target").unwrap_or_default();
//!         ctx.sender().send(&format!("Banned {target}")).await;
//!         Ok(())
//!     })
//!     .build()?;
//!
//! let dispatcher = Dispatcher::new();
//! dispatcher.dispatch(&command, sender, tokens).await?;
//! ```

pub use herald_core as core;
pub use herald_framework as framework;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use herald::prelude::*;
/// ```
pub mod prelude {
    // Building command trees
    pub use herald_framework::{ArgSpec, CommandSpec, Guard, HelpSettings};

    // Leaf parsers
    pub use herald_framework::{ArgParser, BoolParser, FloatParser, FnParser, IntParser, StringParser};

    // Dispatching
    pub use herald_framework::{DispatchOutcome, Dispatcher, Progress};

    // Tab completion
    pub use herald_framework::{complete, completion_state};

    // Values and contexts inside handlers
    pub use herald_core::{ArgValue, CommandContext, FromArgValue};

    // Host integration seams
    pub use herald_core::{MessageCatalog, Scheduler, Sender};

    // Error types surfaced at the API boundary
    pub use herald_core::{BuildError, CommandFailure, HandlerError, HookError};
}
