//! Help page formatting.
//!
//! Renders a bounded page of subcommand summaries. Subcommands are sorted
//! into four buckets by argument shape — no arguments, optional-only, mixed,
//! required-only, in that display order — with ties broken by insertion
//! order, then paginated at the command's configured page size.
//!
//! Out-of-range page numbers clamp to the nearest valid page rather than
//! reporting emptily; a command with nothing to list renders the catalog's
//! empty message.

use herald_core::Message;

use crate::command::CommandSpec;

/// Display buckets, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum HelpBucket {
    NoArgs,
    OptionalOnly,
    Mixed,
    RequiredOnly,
}

pub(crate) fn bucket_of(spec: &CommandSpec) -> HelpBucket {
    let required = spec.args().iter().any(|a| !a.is_optional());
    let optional = spec.args().iter().any(|a| a.is_optional());
    match (required, optional) {
        (false, false) => HelpBucket::NoArgs,
        (false, true) => HelpBucket::OptionalOnly,
        (true, true) => HelpBucket::Mixed,
        (true, false) => HelpBucket::RequiredOnly,
    }
}

/// Renders one help page as catalog messages: header, entry lines, footer.
///
/// `requested` is 1-based and clamps into the valid range.
pub(crate) fn render_page(command: &CommandSpec, requested: usize) -> (usize, Vec<Message>) {
    let mut entries: Vec<_> = command.subcommands_ordered().iter().collect();
    if entries.is_empty() {
        return (1, vec![Message::HelpEmpty]);
    }
    // Stable sort keeps insertion order within each bucket.
    entries.sort_by_key(|spec| bucket_of(spec));

    let page_size = command.help().page_size.max(1);
    let pages = entries.len().div_ceil(page_size);
    let page = requested.clamp(1, pages);

    let mut messages = Vec::with_capacity(page_size + 2);
    messages.push(Message::HelpHeader {
        command: command.full_path(),
        page,
        pages,
    });
    for spec in entries.iter().skip((page - 1) * page_size).take(page_size) {
        messages.push(Message::HelpLine {
            usage: spec.usage().to_string(),
            description: spec.description().to_string(),
        });
    }
    messages.push(Message::HelpFooter { page, pages });

    (page, messages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arg::ArgSpec;
    use crate::parser::IntParser;

    fn with_args(name: &str, required: usize, optional: usize) -> crate::command::CommandBuilder {
        let mut builder = CommandSpec::builder(name);
        for i in 0..required {
            builder = builder.arg(
                ArgSpec::builder(format!("r{i}"), IntParser)
                    .finish()
                    .unwrap(),
            );
        }
        for i in 0..optional {
            builder = builder.arg(
                ArgSpec::builder(format!("o{i}"), IntParser)
                    .optional()
                    .finish()
                    .unwrap(),
            );
        }
        builder
    }

    #[test]
    fn buckets_order_entries() {
        let root = CommandSpec::builder("root")
            .subcommand(with_args("required", 2, 0))
            .subcommand(with_args("mixed", 1, 1))
            .subcommand(with_args("plain", 0, 0))
            .subcommand(with_args("optional", 0, 2))
            .build()
            .unwrap();

        let (page, messages) = render_page(&root, 1);
        assert_eq!(page, 1);
        let lines: Vec<&str> = messages
            .iter()
            .filter_map(|m| match m {
                Message::HelpLine { usage, .. } => Some(usage.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(
            lines,
            vec![
                "/root plain",
                "/root optional [o0] [o1]",
                "/root mixed <r0> [o0]",
                "/root required <r0> <r1>",
            ]
        );
    }

    #[test]
    fn insertion_order_breaks_ties() {
        let root = CommandSpec::builder("root")
            .subcommand(with_args("b", 0, 0))
            .subcommand(with_args("a", 0, 0))
            .build()
            .unwrap();

        let (_, messages) = render_page(&root, 1);
        let lines: Vec<&str> = messages
            .iter()
            .filter_map(|m| match m {
                Message::HelpLine { usage, .. } => Some(usage.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(lines, vec!["/root b", "/root a"]);
    }

    #[test]
    fn pagination_and_clamping() {
        let mut builder = CommandSpec::builder("root").help_page_size(2);
        for name in ["a", "b", "c", "d", "e"] {
            builder = builder.subcommand(with_args(name, 0, 0));
        }
        let root = builder.build().unwrap();

        let (page, messages) = render_page(&root, 3);
        assert_eq!(page, 3);
        let lines = messages
            .iter()
            .filter(|m| matches!(m, Message::HelpLine { .. }))
            .count();
        assert_eq!(lines, 1);

        // Past the end clamps to the last page.
        let (page, _) = render_page(&root, 99);
        assert_eq!(page, 3);

        // Page zero clamps to the first page.
        let (page, _) = render_page(&root, 0);
        assert_eq!(page, 1);
    }

    #[test]
    fn empty_tree_renders_empty_message() {
        let root = CommandSpec::builder("root").build().unwrap();
        let (_, messages) = render_page(&root, 1);
        assert_eq!(messages, vec![Message::HelpEmpty]);
    }
}
