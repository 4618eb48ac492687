//! # Herald Core
//!
//! Foundation types for the herald command dispatch engine.
//!
//! This crate defines the data model and the external seams the pipeline in
//! `herald-framework` is built on:
//!
//! - **Value model**: the closed [`ArgValue`] union and [`FromArgValue`]
//!   typed extraction.
//! - **Context**: the immutable per-invocation [`CommandContext`] snapshot.
//! - **Error taxonomy**: build-time [`BuildError`], the runtime
//!   [`CommandFailure`] classification, and the callback fault types.
//! - **External collaborators**: the [`Sender`] identity/delivery seam, the
//!   [`Scheduler`] task policy seam, and the [`MessageCatalog`] string seam.
//!
//! The engine never talks to a host directly; everything outward goes through
//! these traits, so herald-core has no opinion about what it is embedded in.

pub mod catalog;
pub mod context;
pub mod error;
pub mod scheduler;
pub mod sender;
pub mod value;

pub use catalog::{DefaultCatalog, Message, MessageCatalog};
pub use context::CommandContext;
pub use error::{
    BuildError, BuildResult, CommandFailure, CooldownScope, FailureKind, HandlerError, HookError,
    UsageKind,
};
pub use scheduler::{Scheduler, TokioScheduler};
pub use sender::Sender;
pub use value::{ArgValue, FromArgValue};
