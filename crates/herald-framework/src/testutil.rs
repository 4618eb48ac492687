//! Shared test doubles for the framework's test modules.

use std::sync::Mutex;

use async_trait::async_trait;

use herald_core::Sender;

/// A recording sender: grants permissions from an allow-list and remembers
/// every line delivered to it.
pub struct MockSender {
    name: String,
    player: bool,
    granted: Vec<String>,
    sent: Mutex<Vec<String>>,
}

impl MockSender {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            player: true,
            granted: vec!["*".to_string()],
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Restricts the sender to exactly these permission nodes.
    pub fn with_permissions(mut self, granted: &[&str]) -> Self {
        self.granted = granted.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Makes the sender a non-player (console-like).
    pub fn console(mut self) -> Self {
        self.player = false;
        self
    }

    /// Everything sent so far.
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sender for MockSender {
    fn name(&self) -> &str {
        &self.name
    }

    fn has_permission(&self, node: &str) -> bool {
        self.granted.iter().any(|g| g == "*" || g == node)
    }

    fn is_player(&self) -> bool {
        self.player
    }

    async fn send(&self, text: &str) {
        self.sent.lock().unwrap().push(text.to_string());
    }
}
