//! Classification of inbound updates: figure out whether an update is a
//! command invocation or plain text, and pull out any field value supplied
//! inline with the invocation.

use std::collections::HashMap;

use crossbot_core::{
    Command, CommandRegistry, CommandSurface, CrossbotError, InboundKind, Result,
};

/// What an inbound update turned out to be.
#[derive(Debug)]
pub(crate) enum Classification {
    Command {
        command: Command,
        initial_fields: HashMap<String, String>,
    },
    Text,
    /// Nothing to do (empty text, or a command addressed to a different bot).
    Ignore,
}

/// Classifies one update against the registry. On a fixed command surface an
/// unknown invocation is an error; free-text surfaces let users type any
/// slash text, so unknown commands degrade to text.
pub(crate) fn classify(
    registry: &CommandRegistry,
    kind: &InboundKind,
    surface: CommandSurface,
    own_handle: &str,
) -> Result<Classification> {
    match kind {
        InboundKind::Command { name, args } => {
            if !registry.has(name) {
                return Err(CrossbotError::UnknownCommand(name.clone()));
            }
            Ok(Classification::Command {
                command: registry.get(name)?,
                initial_fields: args.clone(),
            })
        }
        InboundKind::Text { text } => {
            let text = text.trim();
            if text.is_empty() {
                return Ok(Classification::Ignore);
            }
            match surface {
                CommandSurface::FreeText => classify_free_text(registry, text, own_handle),
                CommandSurface::Fixed => Ok(Classification::Text),
            }
        }
        // migration is handled before classification
        InboundKind::Migration { .. } => Ok(Classification::Ignore),
    }
}

fn classify_free_text(
    registry: &CommandRegistry,
    text: &str,
    own_handle: &str,
) -> Result<Classification> {
    let Some(rest) = text.strip_prefix('/') else {
        return Ok(Classification::Text);
    };
    let token = rest.split_whitespace().next().unwrap_or("");
    let (name, addressed_bot) = token.split_once('@').unwrap_or((token, ""));

    // a command for some other bot in the same group is none of our business
    if !addressed_bot.is_empty() && !addressed_bot.eq_ignore_ascii_case(own_handle) {
        return Ok(Classification::Ignore);
    }

    if !name.is_empty() && registry.has(name) {
        let command = registry.get(name)?;
        let initial_fields = extract_inline_field(&command, text);
        return Ok(Classification::Command {
            command,
            initial_fields,
        });
    }

    Ok(Classification::Text)
}

/// When a command has exactly one required field, trailing text after the
/// command token is taken as that field's value.
fn extract_inline_field(command: &Command, text: &str) -> HashMap<String, String> {
    let mut fields = HashMap::new();
    let mut required = command.required_fields();
    let (Some(field), None) = (required.next(), required.next()) else {
        return fields;
    };
    if let Some((_, rest)) = text.split_once(char::is_whitespace) {
        let rest = rest.trim();
        if !rest.is_empty() {
            fields.insert(field.name.clone(), rest.to_string());
        }
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbot_core::CommandField;

    fn registry() -> CommandRegistry {
        let registry = CommandRegistry::new();
        registry.register(Command::new("ping", "pings", false).unwrap());
        registry.register(
            Command::new("greet", "greets", false)
                .unwrap()
                .with_field(CommandField::new("name", "name", true)),
        );
        registry
    }

    fn text(t: &str) -> InboundKind {
        InboundKind::Text {
            text: t.to_string(),
        }
    }

    #[test]
    fn test_known_slash_command_classified() {
        let c = classify(&registry(), &text("/ping"), CommandSurface::FreeText, "me").unwrap();
        assert!(matches!(c, Classification::Command { command, .. } if command.name() == "ping"));
    }

    #[test]
    fn test_unknown_slash_degrades_to_text_on_free_surface() {
        let c = classify(&registry(), &text("/whoami"), CommandSurface::FreeText, "me").unwrap();
        assert!(matches!(c, Classification::Text));
    }

    #[test]
    fn test_unknown_command_errors_on_fixed_surface() {
        let kind = InboundKind::Command {
            name: "whoami".to_string(),
            args: HashMap::new(),
        };
        let result = classify(&registry(), &kind, CommandSurface::Fixed, "me");
        assert!(matches!(result, Err(CrossbotError::UnknownCommand(_))));
    }

    #[test]
    fn test_command_for_other_bot_ignored() {
        let c = classify(
            &registry(),
            &text("/ping@other_bot"),
            CommandSurface::FreeText,
            "me",
        )
        .unwrap();
        assert!(matches!(c, Classification::Ignore));
    }

    #[test]
    fn test_command_addressed_to_self_accepted() {
        let c = classify(&registry(), &text("/ping@Me"), CommandSurface::FreeText, "me").unwrap();
        assert!(matches!(c, Classification::Command { .. }));
    }

    #[test]
    fn test_inline_argument_lands_in_single_required_field() {
        let c = classify(
            &registry(),
            &text("/greet Ada Lovelace"),
            CommandSurface::FreeText,
            "me",
        )
        .unwrap();
        match c {
            Classification::Command { initial_fields, .. } => {
                assert_eq!(initial_fields.get("name").map(String::as_str), Some("Ada Lovelace"));
            }
            other => panic!("expected command, got {other:?}"),
        }
    }

    #[test]
    fn test_no_inline_argument_leaves_fields_empty() {
        let c = classify(&registry(), &text("/greet"), CommandSurface::FreeText, "me").unwrap();
        match c {
            Classification::Command { initial_fields, .. } => assert!(initial_fields.is_empty()),
            other => panic!("expected command, got {other:?}"),
        }
    }

    #[test]
    fn test_plain_text_is_text() {
        let c = classify(&registry(), &text("hello there"), CommandSurface::FreeText, "me").unwrap();
        assert!(matches!(c, Classification::Text));
        let c = classify(&registry(), &text(""), CommandSurface::FreeText, "me").unwrap();
        assert!(matches!(c, Classification::Ignore));
    }
}
