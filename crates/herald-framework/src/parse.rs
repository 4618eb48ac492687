//! The token parsing loop.
//!
//! Consumes a raw token array against a command's ordered argument list and
//! produces either a completed [`CommandContext`] or the first failure.
//!
//! The loop keeps two independent cursors: conditional arguments can be
//! skipped without consuming a token, and a trailing greedy argument consumes
//! every remaining token in one step, so argument index and token index move
//! at different rates.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, error};

use herald_core::{ArgValue, CommandContext, CommandFailure, Sender, UsageKind};

use crate::command::CommandSpec;
use crate::fuzzy;

/// Runs the parsing loop.
///
/// `label` is the alias the command was invoked under; it is recorded in the
/// produced context. Fails fast with `Usage` before any parser runs when
/// there are fewer tokens than required arguments.
pub(crate) fn parse_args(
    command: &CommandSpec,
    sender: &Arc<dyn Sender>,
    label: &str,
    tokens: &[String],
) -> Result<CommandContext, CommandFailure> {
    if command.required_count() > tokens.len() {
        return Err(CommandFailure::Usage {
            kind: UsageKind::TooFew,
        });
    }

    let args = command.args();
    let mut values: HashMap<String, ArgValue> = HashMap::new();
    let mut token_idx = 0usize;

    for (arg_idx, arg) in args.iter().enumerate() {
        if token_idx >= tokens.len() {
            break;
        }

        // Condition sees only what has been parsed so far.
        if let Some(condition) = arg.condition() {
            let partial = CommandContext::new(
                Arc::clone(sender),
                label,
                tokens.to_vec(),
                values.clone(),
            );
            match condition(&partial) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(fault) => {
                    error!(
                        command = command.name(),
                        argument = arg.name(),
                        fault = %fault,
                        "argument condition faulted"
                    );
                    return Err(CommandFailure::Internal {
                        stage: "condition".into(),
                    });
                }
            }
        }

        if let Some(node) = arg.permission()
            && !sender.has_permission(node)
        {
            return Err(CommandFailure::ArgumentPermission {
                argument: arg.name().to_string(),
            });
        }

        let is_last = arg_idx + 1 == args.len();
        let token = if is_last && arg.is_greedy() {
            let joined = tokens[token_idx..].join(" ");
            token_idx = tokens.len();
            joined
        } else {
            let t = tokens[token_idx].clone();
            token_idx += 1;
            t
        };

        let mut value = match arg.parser().parse(&token, sender.as_ref()) {
            Ok(value) => value,
            Err(fail) => {
                let suggestions = if command.sends_errors() && arg.rules().suggests() {
                    fuzzy::rank_suggestions(
                        &token,
                        arg.rules().completions().iter().map(String::as_str),
                    )
                } else {
                    Vec::new()
                };
                debug!(
                    command = command.name(),
                    argument = arg.name(),
                    token = %token,
                    "token failed to parse"
                );
                return Err(CommandFailure::Parsing {
                    argument: arg.name().to_string(),
                    expected: arg.parser().type_name().to_string(),
                    reason: fail.reason,
                    suggestions,
                });
            }
        };

        if command.sanitizes_input()
            && let ArgValue::Str(text) = &value
        {
            value = ArgValue::Str(sanitize(text));
        }

        if let Some(transformer) = arg.transformer() {
            value = match transformer(value) {
                Ok(value) => value,
                Err(fault) => {
                    error!(
                        command = command.name(),
                        argument = arg.name(),
                        fault = %fault,
                        "argument transformer faulted"
                    );
                    return Err(CommandFailure::Internal {
                        stage: "transformer".into(),
                    });
                }
            };
        }

        if let Err(message) = arg.rules().check(&value) {
            return Err(CommandFailure::Validation {
                argument: arg.name().to_string(),
                message,
            });
        }

        values.insert(arg.name().to_string(), value);
    }

    // Backfill defaults for any argument that recorded no value, including
    // arguments skipped by a false condition.
    for arg in args {
        if !values.contains_key(arg.name())
            && let Some(default) = arg.rules().default_value()
        {
            values.insert(arg.name().to_string(), default.clone());
        }
    }

    let last_is_greedy = args.last().is_some_and(|a| a.is_greedy());
    if token_idx < tokens.len() && !last_is_greedy {
        return Err(CommandFailure::Usage {
            kind: UsageKind::TooMany,
        });
    }

    Ok(CommandContext::new(
        Arc::clone(sender),
        label,
        tokens.to_vec(),
        values,
    ))
}

/// Strips control characters and the chat color marker, escapes
/// markup-significant characters, and collapses whitespace runs.
pub(crate) fn sanitize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_space = false;
    for ch in input.chars() {
        if ch.is_control() || ch == '§' {
            continue;
        }
        if ch.is_whitespace() {
            pending_space = !out.is_empty();
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        if matches!(ch, '*' | '_' | '`' | '~') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use herald_core::HookError;

    use crate::arg::ArgSpec;
    use crate::command::CommandSpec;
    use crate::parser::{ArgParser, FnParser, IntParser, ParseOutcome, StringParser};
    use crate::testutil::MockSender;

    fn sender() -> Arc<dyn Sender> {
        Arc::new(MockSender::new("tester"))
    }

    fn parse(
        command: &CommandSpec,
        tokens: &[&str],
    ) -> Result<CommandContext, CommandFailure> {
        let tokens: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();
        parse_args(command, &sender(), command.name(), &tokens)
    }

    #[test]
    fn round_trip_with_default() {
        let command = CommandSpec::builder("cmd")
            .arg(ArgSpec::builder("x", IntParser).finish().unwrap())
            .arg(
                ArgSpec::builder("y", StringParser)
                    .optional()
                    .default_value("z")
                    .finish()
                    .unwrap(),
            )
            .build()
            .unwrap();

        let ctx = parse(&command, &["5"]).unwrap();
        assert_eq!(ctx.get::<i64>("x"), Some(5));
        assert_eq!(ctx.get::<String>("y"), Some("z".to_string()));

        let ctx = parse(&command, &["5", "hello"]).unwrap();
        assert_eq!(ctx.get::<String>("y"), Some("hello".to_string()));

        let err = parse(&command, &[]).unwrap_err();
        assert!(matches!(
            err,
            CommandFailure::Usage {
                kind: UsageKind::TooFew
            }
        ));

        let err = parse(&command, &["5", "hello", "extra"]).unwrap_err();
        assert!(matches!(
            err,
            CommandFailure::Usage {
                kind: UsageKind::TooMany
            }
        ));
    }

    #[test]
    fn short_circuits_before_any_parser_runs() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls2 = Arc::clone(&calls);
        let counting = FnParser::new("counted", move |token, _: &dyn Sender| -> ParseOutcome {
            calls2.fetch_add(1, Ordering::SeqCst);
            Ok(ArgValue::Str(token.to_string()))
        });

        let command = CommandSpec::builder("cmd")
            .arg(ArgSpec::builder("a", counting).finish().unwrap())
            .arg(ArgSpec::builder("b", IntParser).finish().unwrap())
            .build()
            .unwrap();

        let err = parse(&command, &["only-one"]).unwrap_err();
        assert!(matches!(err, CommandFailure::Usage { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn greedy_capture_joins_tokens() {
        let command = CommandSpec::builder("cmd")
            .arg(
                ArgSpec::builder("reason", StringParser)
                    .greedy()
                    .finish()
                    .unwrap(),
            )
            .build()
            .unwrap();

        let ctx = parse(&command, &["a", "b", "c"]).unwrap();
        assert_eq!(ctx.get::<String>("reason"), Some("a b c".to_string()));
    }

    #[test]
    fn condition_false_skips_without_consuming() {
        let command = CommandSpec::builder("cmd")
            .arg(ArgSpec::builder("mode", StringParser).finish().unwrap())
            .arg(
                ArgSpec::builder("extra", StringParser)
                    .optional()
                    .condition(|ctx| Ok(ctx.get::<String>("mode").as_deref() == Some("full")))
                    .finish()
                    .unwrap(),
            )
            .build()
            .unwrap();

        // Condition true: token consumed by "extra".
        let ctx = parse(&command, &["full", "detail"]).unwrap();
        assert_eq!(ctx.get::<String>("extra"), Some("detail".to_string()));

        // Condition false: the extra token is unexpected.
        let err = parse(&command, &["basic", "detail"]).unwrap_err();
        assert!(matches!(
            err,
            CommandFailure::Usage {
                kind: UsageKind::TooMany
            }
        ));
    }

    #[test]
    fn condition_false_absent_unless_defaulted() {
        let no_default = CommandSpec::builder("cmd")
            .arg(ArgSpec::builder("mode", StringParser).finish().unwrap())
            .arg(
                ArgSpec::builder("extra", StringParser)
                    .optional()
                    .condition(|_| Ok(false))
                    .finish()
                    .unwrap(),
            )
            .build()
            .unwrap();
        let ctx = parse(&no_default, &["basic"]).unwrap();
        assert!(!ctx.has("extra"));

        let with_default = CommandSpec::builder("cmd")
            .arg(ArgSpec::builder("mode", StringParser).finish().unwrap())
            .arg(
                ArgSpec::builder("extra", StringParser)
                    .optional()
                    .condition(|_| Ok(false))
                    .default_value("fallback")
                    .finish()
                    .unwrap(),
            )
            .build()
            .unwrap();
        let ctx = parse(&with_default, &["basic"]).unwrap();
        assert_eq!(ctx.get::<String>("extra"), Some("fallback".to_string()));
    }

    #[test]
    fn condition_fault_is_internal_error() {
        let command = CommandSpec::builder("cmd")
            .arg(ArgSpec::builder("mode", StringParser).finish().unwrap())
            .arg(
                ArgSpec::builder("extra", StringParser)
                    .optional()
                    .condition(|_| Err(HookError::new("boom")))
                    .finish()
                    .unwrap(),
            )
            .build()
            .unwrap();

        let err = parse(&command, &["basic", "detail"]).unwrap_err();
        assert!(matches!(err, CommandFailure::Internal { .. }));
    }

    #[test]
    fn parse_failure_carries_suggestions() {
        let command = CommandSpec::builder("cmd")
            .arg(
                ArgSpec::builder(
                    "mode",
                    FnParser::new("mode", |token, _| match token {
                        "survival" | "creative" => Ok(ArgValue::Str(token.to_string())),
                        _ => Err(crate::parser::ParseFail::bare()),
                    }),
                )
                .completions(["survival", "creative"])
                .suggest()
                .finish()
                .unwrap(),
            )
            .build()
            .unwrap();

        let err = parse(&command, &["surivval"]).unwrap_err();
        match err {
            CommandFailure::Parsing { suggestions, .. } => {
                assert_eq!(suggestions.first().map(String::as_str), Some("survival"));
            }
            other => panic!("expected parsing failure, got {other:?}"),
        }
    }

    #[test]
    fn transformer_applies_before_validation() {
        let command = CommandSpec::builder("cmd")
            .arg(
                ArgSpec::builder("n", IntParser)
                    .transform(|v| Ok(ArgValue::Int(v.as_int().unwrap_or(0) * 2)))
                    .max(10.0)
                    .finish()
                    .unwrap(),
            )
            .build()
            .unwrap();

        let ctx = parse(&command, &["4"]).unwrap();
        assert_eq!(ctx.get::<i64>("n"), Some(8));

        // 6 doubles to 12, which the max rule rejects.
        let err = parse(&command, &["6"]).unwrap_err();
        assert!(matches!(err, CommandFailure::Validation { .. }));
    }

    #[test]
    fn argument_permission_gate() {
        let command = CommandSpec::builder("cmd")
            .arg(
                ArgSpec::builder("target", StringParser)
                    .permission("cmd.target.other")
                    .finish()
                    .unwrap(),
            )
            .build()
            .unwrap();

        let restricted: Arc<dyn Sender> =
            Arc::new(MockSender::new("limited").with_permissions(&["unrelated.node"]));
        let tokens = vec!["steve".to_string()];
        let err = parse_args(&command, &restricted, "cmd", &tokens).unwrap_err();
        assert!(matches!(err, CommandFailure::ArgumentPermission { .. }));
    }

    #[test]
    fn sanitizer_cleans_textual_values() {
        assert_eq!(sanitize("hello\u{7}  world"), "hello world");
        assert_eq!(sanitize("§4red *bold*"), "4red \\*bold\\*");
        assert_eq!(sanitize("  padded\t\tout  "), "padded out");
    }

    #[test]
    fn sanitization_is_opt_in() {
        let command = CommandSpec::builder("cmd")
            .sanitize_input(true)
            .arg(
                ArgSpec::builder("text", StringParser)
                    .greedy()
                    .finish()
                    .unwrap(),
            )
            .build()
            .unwrap();

        let ctx = parse(&command, &["*hi*", "there"]).unwrap();
        assert_eq!(ctx.get::<String>("text"), Some("\\*hi\\* there".to_string()));
    }
}
