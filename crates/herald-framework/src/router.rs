//! Subcommand routing.
//!
//! Given the first raw token of an invocation, decide whether to delegate to
//! a subcommand, interpret the token as a help page number, or fall through
//! to the current command's own argument parsing. Matching priority:
//!
//! 1. exact case-insensitive alias match
//! 2. 1-based help page number (when help is enabled)
//! 3. fuzzy similarity against all aliases (when fuzzy matching is enabled),
//!    taken only when a unique best candidate clears the threshold
//! 4. help page 1 when help is enabled, else plain argument parsing

use std::sync::Arc;

use tracing::debug;

use crate::command::CommandSpec;
use crate::fuzzy::{SIMILARITY_THRESHOLD, similarity};

/// The routing decision for a first token.
pub(crate) enum Route {
    /// Delegate the remaining tokens to this child's full dispatch cycle.
    Delegate(Arc<CommandSpec>),
    /// Render the given 1-based help page.
    HelpPage(usize),
    /// Treat the token as a regular argument of the current command.
    Parse,
}

/// Routes the first token of an invocation.
///
/// Only meaningful for commands with subcommands; callers handle the
/// no-subcommand and no-token cases.
pub(crate) fn route(command: &CommandSpec, first: &str) -> Route {
    if let Some(child) = command.subcommand(first) {
        return Route::Delegate(Arc::clone(child));
    }

    if command.help().enabled
        && let Ok(page) = first.parse::<usize>()
        && page >= 1
    {
        return Route::HelpPage(page);
    }

    if command.fuzzy_matching()
        && let Some(child) = fuzzy_lookup(command, first)
    {
        return Route::Delegate(child);
    }

    if command.help().enabled {
        Route::HelpPage(1)
    } else {
        Route::Parse
    }
}

/// Finds the unique best alias by similarity, if it clears the threshold.
///
/// Ambiguity between distinct children (two different specs tied for best)
/// disables the fuzzy route rather than guessing.
fn fuzzy_lookup(command: &CommandSpec, input: &str) -> Option<Arc<CommandSpec>> {
    let mut best_score = 0.0f64;
    let mut best: Vec<&str> = Vec::new();

    for alias in command.subcommand_aliases() {
        let score = similarity(input, alias);
        if score < SIMILARITY_THRESHOLD {
            continue;
        }
        if score > best_score {
            best_score = score;
            best = vec![alias];
        } else if score == best_score {
            best.push(alias);
        }
    }

    let first = *best.first()?;
    let child = command.subcommand(first)?;
    // Ties are fine when every tied alias names the same child.
    if best
        .iter()
        .all(|alias| command.subcommand(alias).is_some_and(|c| Arc::ptr_eq(c, child)))
    {
        debug!(input = %input, matched = first, score = best_score, "fuzzy-routed subcommand");
        Some(Arc::clone(child))
    } else {
        debug!(input = %input, candidates = best.len(), "ambiguous fuzzy match, not routing");
        None
    }
}
