//! # Herald Framework
//!
//! The command definition and dispatch engine built on top of the core
//! types.
//!
//! This layer provides:
//! - Typed argument specs with parsers, conditions, transformers and
//!   validation rules
//! - The token parsing loop that turns raw tokens into a typed context
//! - Subcommand routing with similarity-based correction
//! - The execution dispatcher (sync, async and advanced-async paths) with
//!   guards, cooldowns, hooks and fault reporting
//! - Help pagination and tab completion
//!
//! A command tree is declared once through [`CommandSpec::builder`],
//! validated at build time, and dispatched through a [`Dispatcher`]:
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use herald_framework::{ArgSpec, CommandSpec, Dispatcher, IntParser};
//!
//! # async fn demo(sender: Arc<dyn herald_core::Sender>) -> Result<(), Box<dyn std::error::Error>> {
//! let command = CommandSpec::builder("roll")
//!     .description("Roll some dice")
//!     .arg(ArgSpec::builder("sides", IntParser).min(2.0).finish()?)
//!     .run(|ctx| async move {
//!         let sides: i64 = ctx.get("sides").unwrap_or(6);
//!         ctx.sender().send(&format!("You rolled a d{sides}!")).await;
//!         Ok(())
//!     })
//!     .build()?;
//!
//! let dispatcher = Dispatcher::new();
//! dispatcher.dispatch(&command, sender, vec!["20".into()]).await?;
//! # Ok(())
//! # }
//! ```

pub mod arg;
pub mod command;
pub mod complete;
pub mod cooldown;
pub mod dispatch;
pub mod parser;
pub mod validate;

mod fuzzy;
mod help;
mod parse;
mod router;

#[cfg(test)]
pub(crate) mod testutil;

pub use arg::{ArgBuilder, ArgSpec, Condition, Transformer};
pub use command::{
    AdvancedHandlerFn, AfterHook, BeforeHook, CommandBuilder, CommandSpec, Executor, FaultHandler,
    Guard, HandlerFn, HelpSettings, InvocationSummary,
};
pub use complete::{CompletionState, complete, completion_state};
pub use cooldown::{CooldownStore, MemoryCooldownStore};
pub use dispatch::{DispatchOutcome, Dispatcher, Progress};
pub use parser::{
    ArgParser, BoolParser, FloatParser, FnParser, IntParser, ParseFail, ParseOutcome, StringParser,
};
pub use validate::{CrossValidator, ValidationRules};
