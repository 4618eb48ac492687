//! Cooldown ledger.
//!
//! The one piece of shared mutable state in the engine: last-invocation
//! timestamps per command (server-wide) and per command+user. It lives
//! behind the small [`CooldownStore`] trait so hosts can swap in persistent
//! or distributed storage; the default is an in-memory map.
//!
//! Entries are written only after an invocation has fully parsed and
//! validated — permission, guard, cooldown and parse failures never touch
//! the ledger — and are never deleted. Cardinality is bounded by the host's
//! command set times its active users.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Keyed timestamp storage for cooldown bookkeeping.
///
/// Implementations must be safe under concurrent get/set for the same key;
/// invocations of one command by different users race by design.
pub trait CooldownStore: Send + Sync {
    /// The last recorded timestamp for `key`, if any.
    fn get(&self, key: &str) -> Option<Instant>;

    /// Records `at` as the last invocation for `key`, overwriting.
    fn set(&self, key: &str, at: Instant);
}

/// The default in-memory store.
#[derive(Default)]
pub struct MemoryCooldownStore {
    entries: Mutex<HashMap<String, Instant>>,
}

impl MemoryCooldownStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl CooldownStore for MemoryCooldownStore {
    fn get(&self, key: &str) -> Option<Instant> {
        self.entries.lock().get(key).copied()
    }

    fn set(&self, key: &str, at: Instant) {
        self.entries.lock().insert(key.to_string(), at);
    }
}

/// Server-wide ledger key for a command path.
pub(crate) fn server_key(command_path: &str) -> String {
    format!("cmd:{command_path}")
}

/// Per-user ledger key for a command path and sender identity.
pub(crate) fn user_key(command_path: &str, user: &str) -> String {
    format!("cmd:{command_path}:user:{user}")
}

/// Checks one cooldown gate.
///
/// Returns the remaining time, rounded up to whole seconds for display, when
/// the gate is still closed; `None` when it is open.
pub(crate) fn remaining(
    store: &dyn CooldownStore,
    key: &str,
    window: Duration,
    now: Instant,
) -> Option<Duration> {
    let last = store.get(key)?;
    let elapsed = now.saturating_duration_since(last);
    let left = window.checked_sub(elapsed)?;
    if left.is_zero() {
        return None;
    }
    let mut secs = left.as_secs();
    if left.subsec_nanos() > 0 {
        secs += 1;
    }
    Some(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_when_never_invoked() {
        let store = MemoryCooldownStore::new();
        let now = Instant::now();
        assert_eq!(
            remaining(&store, "cmd:spawn", Duration::from_secs(5), now),
            None
        );
    }

    #[test]
    fn closed_within_window_rounds_up() {
        let store = MemoryCooldownStore::new();
        let start = Instant::now();
        store.set("cmd:spawn", start);

        let probe = start + Duration::from_millis(1500);
        let left = remaining(&store, "cmd:spawn", Duration::from_secs(5), probe).unwrap();
        // 3.5s left, displayed as 4s.
        assert_eq!(left, Duration::from_secs(4));
        assert!(left <= Duration::from_secs(5));
    }

    #[test]
    fn reopens_after_window() {
        let store = MemoryCooldownStore::new();
        let start = Instant::now();
        store.set("cmd:spawn", start);

        let probe = start + Duration::from_secs(5);
        assert_eq!(
            remaining(&store, "cmd:spawn", Duration::from_secs(5), probe),
            None
        );
    }

    #[test]
    fn keys_are_scoped() {
        assert_eq!(server_key("admin reload"), "cmd:admin reload");
        assert_eq!(
            user_key("admin reload", "steve"),
            "cmd:admin reload:user:steve"
        );
    }

    #[test]
    fn overwrite_updates_gate() {
        let store = MemoryCooldownStore::new();
        let start = Instant::now();
        store.set("k", start);
        store.set("k", start + Duration::from_secs(10));
        let probe = start + Duration::from_secs(11);
        let left = remaining(&store, "k", Duration::from_secs(5), probe).unwrap();
        assert_eq!(left, Duration::from_secs(4));
    }
}
