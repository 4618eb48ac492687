//! Sender abstraction.
//!
//! A [`Sender`] is whoever invoked the command: a player, a console, a chat
//! user. The engine needs exactly three things from it — a stable identity
//! for cooldown keying, a permission check, and a way to deliver text — and
//! assumes nothing more.

use async_trait::async_trait;

/// The invoking identity behind a command.
#[async_trait]
pub trait Sender: Send + Sync {
    /// A stable name/id, used for per-user cooldown keys and logging.
    fn name(&self) -> &str;

    /// Checks whether the sender holds the given permission node.
    fn has_permission(&self, node: &str) -> bool;

    /// Returns `true` if the sender is a player (as opposed to e.g. a
    /// console), for player-only commands.
    fn is_player(&self) -> bool;

    /// Delivers a line of text to the sender.
    ///
    /// Delivery failures are the host's concern; the engine logs and moves on.
    async fn send(&self, text: &str);
}
