//! Message catalog.
//!
//! Every user-facing string the engine produces goes through a
//! [`MessageCatalog`]: a pure mapping from a typed [`Message`] to display
//! text. The engine itself hard-codes nothing, so hosts can localize or
//! restyle output by swapping the catalog.

/// A user-facing message with its typed parameters.
///
/// One variant per thing the engine can say. Parameters are plain data so a
/// catalog implementation never needs to reach back into the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// The sender lacks the command's permission.
    NoPermission,
    /// The command is restricted to players.
    PlayerOnly,
    /// A guard rejected the invocation.
    GuardFailed {
        /// The guard's name.
        guard: String,
    },
    /// A cooldown gate is still closed.
    Cooldown {
        /// Whole seconds remaining, rounded up.
        remaining_secs: u64,
    },
    /// Wrong number of arguments; show the usage line.
    Usage {
        /// The command's cached usage string.
        usage: String,
    },
    /// Extra tokens after the last argument; show the usage line.
    TooManyArguments {
        /// The command's cached usage string.
        usage: String,
    },
    /// A token failed its argument's parser.
    ParseFailed {
        /// The argument name.
        argument: String,
        /// The parser's declared type name.
        expected: String,
        /// The parser's failure reason, if any.
        reason: Option<String>,
    },
    /// Supplementary suggestion line after a parse failure.
    DidYouMean {
        /// Ranked candidates, best first.
        suggestions: Vec<String>,
    },
    /// A value failed a validation rule.
    ValidationFailed {
        /// The argument name.
        argument: String,
        /// The failing rule's message.
        message: String,
    },
    /// The sender lacks a per-argument permission.
    ArgumentPermission {
        /// The gated argument.
        argument: String,
    },
    /// A cross-argument validator rejected the value set.
    CrossValidationFailed {
        /// The validator's message.
        message: String,
    },
    /// An advanced async handler hit its deadline.
    Timeout {
        /// The deadline in whole seconds.
        limit_secs: u64,
    },
    /// The handler faulted.
    ExecutionFailed,
    /// A user-supplied callback faulted.
    InternalError,
    /// Header line of a help page.
    HelpHeader {
        /// Full path of the command the help is for.
        command: String,
        /// 1-based page number (after clamping).
        page: usize,
        /// Total page count.
        pages: usize,
    },
    /// One subcommand entry on a help page.
    HelpLine {
        /// The subcommand's cached usage string.
        usage: String,
        /// The subcommand's description.
        description: String,
    },
    /// Footer/navigation line of a help page.
    HelpFooter {
        /// 1-based page number.
        page: usize,
        /// Total page count.
        pages: usize,
    },
    /// Help was requested but there is nothing to list.
    HelpEmpty,
}

/// A pure mapping from messages to display strings.
pub trait MessageCatalog: Send + Sync {
    /// Renders the message as display text.
    fn render(&self, msg: &Message) -> String;
}

/// The built-in English catalog.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultCatalog;

impl MessageCatalog for DefaultCatalog {
    fn render(&self, msg: &Message) -> String {
        match msg {
            Message::NoPermission => "You do not have permission to use this command.".into(),
            Message::PlayerOnly => "This command can only be used by players.".into(),
            Message::GuardFailed { guard } => {
                format!("You cannot use this command right now ({guard}).")
            }
            Message::Cooldown { remaining_secs } => {
                format!("This command is on cooldown for another {remaining_secs}s.")
            }
            Message::Usage { usage } => format!("Usage: {usage}"),
            Message::TooManyArguments { usage } => {
                format!("Too many arguments. Usage: {usage}")
            }
            Message::ParseFailed {
                argument,
                expected,
                reason,
            } => match reason {
                Some(reason) => format!("'{argument}' is not a valid {expected}: {reason}"),
                None => format!("'{argument}' is not a valid {expected}."),
            },
            Message::DidYouMean { suggestions } => {
                format!("Did you mean: {}?", suggestions.join(", "))
            }
            Message::ValidationFailed { argument, message } => {
                format!("Invalid value for '{argument}': {message}")
            }
            Message::ArgumentPermission { argument } => {
                format!("You do not have permission to use the '{argument}' argument.")
            }
            Message::CrossValidationFailed { message } => message.clone(),
            Message::Timeout { limit_secs } => {
                format!("The command took too long and was cancelled after {limit_secs}s.")
            }
            Message::ExecutionFailed => "An error occurred while running the command.".into(),
            Message::InternalError => "An internal error occurred.".into(),
            Message::HelpHeader {
                command,
                page,
                pages,
            } => format!("--- Help: {command} (page {page}/{pages}) ---"),
            Message::HelpLine { usage, description } => {
                if description.is_empty() {
                    usage.clone()
                } else {
                    format!("{usage} - {description}")
                }
            }
            Message::HelpFooter { page, pages } => {
                if *page < *pages {
                    format!("Use the page number to see more ({}/{pages}).", page)
                } else {
                    format!("Page {page}/{pages}.")
                }
            }
            Message::HelpEmpty => "There is nothing to show here.".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_renders_parameters() {
        let catalog = DefaultCatalog;
        let text = catalog.render(&Message::Cooldown { remaining_secs: 4 });
        assert!(text.contains("4s"));

        let text = catalog.render(&Message::DidYouMean {
            suggestions: vec!["reload".into(), "help".into()],
        });
        assert!(text.contains("reload, help"));
    }

    #[test]
    fn parse_failed_with_and_without_reason() {
        let catalog = DefaultCatalog;
        let with = catalog.render(&Message::ParseFailed {
            argument: "count".into(),
            expected: "int".into(),
            reason: Some("out of range".into()),
        });
        assert!(with.contains("out of range"));

        let without = catalog.render(&Message::ParseFailed {
            argument: "count".into(),
            expected: "int".into(),
            reason: None,
        });
        assert!(without.ends_with("int."));
    }
}
