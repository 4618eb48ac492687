//! Tab-completion surface.
//!
//! Exposes enough of the parsing state for an external completion renderer:
//! which argument position the cursor is in, and how many of the prior
//! tokens parse and validate successfully (validate-on-tab). Candidate lists
//! are finite, ordered, and freshly computed on every call — nothing here is
//! cached.
//!
//! Rendering is the host's concern; this module only produces the strings.

use std::collections::HashMap;
use std::sync::Arc;

use herald_core::{ArgValue, CommandContext, Sender};

use crate::command::CommandSpec;

/// Parsing state at the cursor, for completion purposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionState {
    /// Index of the argument the cursor is in, or `None` when every
    /// argument already has a token.
    pub current_arg: Option<usize>,
    /// How many of the prior tokens parsed and validated successfully.
    pub validated: usize,
}

/// Computes the parsing state for the tokens before the cursor.
///
/// The cursor walks the argument list the same way the parsing loop does:
/// condition-false arguments are skipped without consuming a token, and a
/// trailing greedy argument pins the cursor, absorbing every remaining
/// token. With `validate` off, tokens are assumed good and only positions
/// are tracked.
pub fn completion_state(
    command: &CommandSpec,
    sender: &Arc<dyn Sender>,
    prior: &[String],
    validate: bool,
) -> CompletionState {
    let args = command.args();
    let mut values: HashMap<String, ArgValue> = HashMap::new();
    let mut validated = 0usize;
    let mut token_idx = 0usize;
    let mut arg_idx = 0usize;

    while arg_idx < args.len() && token_idx < prior.len() {
        let arg = &args[arg_idx];

        if let Some(condition) = arg.condition() {
            let partial = CommandContext::new(
                Arc::clone(sender),
                command.name(),
                prior.to_vec(),
                values.clone(),
            );
            match condition(&partial) {
                Ok(true) => {}
                Ok(false) => {
                    arg_idx += 1;
                    continue;
                }
                // A faulting condition ends the walk; completion must never
                // surface an error.
                Err(_) => break,
            }
        }

        if arg.is_greedy() {
            // The greedy tail owns the cursor from here on; its string
            // parser accepts anything, so the tail counts as validated
            // unless an earlier token already failed.
            if !validate || validated == token_idx {
                validated = prior.len();
            }
            return CompletionState {
                current_arg: Some(arg_idx),
                validated,
            };
        }

        let token = &prior[token_idx];
        if validate {
            let good = match arg.parser().parse(token, sender.as_ref()) {
                Ok(value) => arg.rules().check(&value).is_ok() && {
                    values.insert(arg.name().to_string(), value);
                    true
                },
                Err(_) => false,
            };
            if good {
                validated = token_idx + 1;
            }
        }
        token_idx += 1;
        arg_idx += 1;
    }

    CompletionState {
        current_arg: if arg_idx < args.len() {
            Some(arg_idx)
        } else if args.last().is_some_and(|a| a.is_greedy()) {
            Some(args.len() - 1)
        } else {
            None
        },
        validated: if validate { validated } else { prior.len() },
    }
}

/// Produces the candidate strings for the token being typed.
///
/// The last token is the partial being completed (an empty partial when
/// there are no tokens). Fully-typed leading tokens descend through exact
/// subcommand matches first; at a subcommand position the candidates are the
/// children's invocation names, filtered by the sender's permissions, then
/// the current argument's predefined completion set. Matching is
/// case-insensitive prefix matching, and order follows declaration order.
pub fn complete(
    command: &Arc<CommandSpec>,
    sender: &Arc<dyn Sender>,
    tokens: &[String],
) -> Vec<String> {
    let (partial, mut prior) = match tokens.split_last() {
        Some((last, rest)) => (last.as_str(), rest),
        None => ("", &[][..]),
    };
    let partial_lower = partial.to_lowercase();

    let mut command = command;
    while let Some(first) = prior.first() {
        let Some(child) = command.subcommand(first) else {
            break;
        };
        command = child;
        prior = &prior[1..];
    }

    let mut out = Vec::new();

    if prior.is_empty() {
        for child in command.subcommands_ordered() {
            if let Some(node) = child.permission()
                && !sender.has_permission(node)
            {
                continue;
            }
            let names =
                std::iter::once(child.name()).chain(child.aliases().iter().map(String::as_str));
            for name in names {
                if name.to_lowercase().starts_with(&partial_lower) {
                    out.push(name.to_string());
                }
            }
        }
    }

    let state = completion_state(command, sender, prior, true);
    if let Some(idx) = state.current_arg {
        let arg = &command.args()[idx];
        let allowed = arg
            .permission()
            .is_none_or(|node| sender.has_permission(node));
        if allowed {
            for candidate in arg.rules().completions() {
                if candidate.to_lowercase().starts_with(&partial_lower)
                    && !out.contains(candidate)
                {
                    out.push(candidate.clone());
                }
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arg::ArgSpec;
    use crate::parser::{IntParser, StringParser};
    use crate::testutil::MockSender;

    fn toks(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    fn warp() -> Arc<CommandSpec> {
        CommandSpec::builder("warp")
            .arg(
                ArgSpec::builder("name", StringParser)
                    .completions(["home", "hub", "mall"])
                    .finish()
                    .unwrap(),
            )
            .arg(
                ArgSpec::builder("speed", StringParser)
                    .optional()
                    .completions(["fast", "slow"])
                    .finish()
                    .unwrap(),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn completes_argument_values_by_prefix() {
        let command = warp();
        let sender: Arc<dyn Sender> = Arc::new(MockSender::new("steve"));

        assert_eq!(
            complete(&command, &sender, &toks(&["h"])),
            vec!["home".to_string(), "hub".to_string()]
        );
        // Empty partial offers the whole set.
        assert_eq!(
            complete(&command, &sender, &toks(&[""])),
            vec!["home".to_string(), "hub".to_string(), "mall".to_string()]
        );
        // Second argument position.
        assert_eq!(
            complete(&command, &sender, &toks(&["home", "f"])),
            vec!["fast".to_string()]
        );
        // Past the last argument there is nothing to offer.
        assert!(complete(&command, &sender, &toks(&["home", "fast", "x"])).is_empty());
    }

    #[test]
    fn completes_subcommand_names_with_permission_filter() {
        let command = CommandSpec::builder("admin")
            .subcommand(CommandSpec::builder("reload").alias("rl").permission("admin.reload"))
            .subcommand(CommandSpec::builder("restart").permission("admin.restart"))
            .subcommand(CommandSpec::builder("backup"))
            .build()
            .unwrap();

        let full: Arc<dyn Sender> = Arc::new(MockSender::new("op"));
        assert_eq!(
            complete(&command, &full, &toks(&["re"])),
            vec!["reload".to_string(), "restart".to_string()]
        );
        // Alias names complete too.
        assert_eq!(
            complete(&command, &full, &toks(&["rl"])),
            vec!["rl".to_string()]
        );

        let limited: Arc<dyn Sender> =
            Arc::new(MockSender::new("user").with_permissions(&["admin.restart"]));
        assert_eq!(
            complete(&command, &limited, &toks(&["re"])),
            vec!["restart".to_string()]
        );
    }

    #[test]
    fn descends_through_typed_subcommands() {
        let command = CommandSpec::builder("admin")
            .subcommand(CommandSpec::builder("warp").arg(
                ArgSpec::builder("name", StringParser)
                    .completions(["home", "hub"])
                    .finish()
                    .unwrap(),
            ))
            .build()
            .unwrap();
        let sender: Arc<dyn Sender> = Arc::new(MockSender::new("steve"));

        assert_eq!(
            complete(&command, &sender, &toks(&["warp", "hu"])),
            vec!["hub".to_string()]
        );
    }

    #[test]
    fn state_tracks_validated_prefix() {
        let command = CommandSpec::builder("pay")
            .arg(ArgSpec::builder("target", StringParser).finish().unwrap())
            .arg(ArgSpec::builder("amount", IntParser).finish().unwrap())
            .arg(ArgSpec::builder("note", StringParser).optional().finish().unwrap())
            .build()
            .unwrap();
        let sender: Arc<dyn Sender> = Arc::new(MockSender::new("steve"));

        let state = completion_state(&command, &sender, &toks(&["alex", "50"]), true);
        assert_eq!(state.current_arg, Some(2));
        assert_eq!(state.validated, 2);

        // The bad token stops the validated prefix but not the cursor.
        let state = completion_state(&command, &sender, &toks(&["alex", "lots"]), true);
        assert_eq!(state.current_arg, Some(2));
        assert_eq!(state.validated, 1);

        // Validation off: positions only.
        let state = completion_state(&command, &sender, &toks(&["alex", "lots"]), false);
        assert_eq!(state.current_arg, Some(2));
        assert_eq!(state.validated, 2);
    }

    #[test]
    fn greedy_tail_pins_the_cursor() {
        let command = CommandSpec::builder("ban")
            .arg(ArgSpec::builder("target", StringParser).finish().unwrap())
            .arg(
                ArgSpec::builder("reason", StringParser)
                    .greedy()
                    .completions(["griefing", "spam"])
                    .finish()
                    .unwrap(),
            )
            .build()
            .unwrap();
        let sender: Arc<dyn Sender> = Arc::new(MockSender::new("steve"));

        let state = completion_state(&command, &sender, &toks(&["alex", "was", "very"]), true);
        assert_eq!(state.current_arg, Some(1));

        assert_eq!(
            complete(&command, &sender, &toks(&["alex", "gri"])),
            vec!["griefing".to_string()]
        );
    }
}
