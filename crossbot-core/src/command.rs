//! Command definitions: [`Command`], [`CommandField`], and the name/description limits
//! every supported platform can live with.

use serde::{Deserialize, Serialize};

use crate::error::{CrossbotError, Result};

/// Longest command name any supported platform accepts.
pub const MAX_NAME_LEN: usize = 32;
/// Longest command description any supported platform accepts.
pub const MAX_DESCRIPTION_LEN: usize = 200;

/// A field within a command. `required` fields are collected via follow-up
/// prompts when not supplied inline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandField {
    pub name: String,
    pub description: String,
    pub required: bool,
}

impl CommandField {
    pub fn new(name: &str, description: &str, required: bool) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            required,
        }
    }
}

/// A bot command registered with all supported platforms.
///
/// Name and description are validated at construction; a command that fails
/// the limits of any platform is never created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Command {
    name: String,
    description: String,
    admin_only: bool,
    fields: Vec<CommandField>,
}

impl Command {
    /// Creates a command. Fails if `name` is longer than [`MAX_NAME_LEN`] or
    /// contains characters outside `[0-9A-Za-z_]`, or if `description` is
    /// longer than [`MAX_DESCRIPTION_LEN`].
    pub fn new(name: &str, description: &str, admin_only: bool) -> Result<Self> {
        validate_name(name)?;
        validate_description(description)?;
        Ok(Self {
            name: name.to_string(),
            description: description.to_string(),
            admin_only,
            fields: Vec::new(),
        })
    }

    /// Appends a field (builder style).
    pub fn with_field(mut self, field: CommandField) -> Self {
        self.fields.push(field);
        self
    }

    /// Replaces the name; same validation as construction.
    pub fn set_name(&mut self, name: &str) -> Result<()> {
        validate_name(name)?;
        self.name = name.to_string();
        Ok(())
    }

    /// Replaces the description; same validation as construction.
    pub fn set_description(&mut self, description: &str) -> Result<()> {
        validate_description(description)?;
        self.description = description.to_string();
        Ok(())
    }

    /// Lowercases the stored name in place. Registration normalizes through this
    /// so lookups are case-insensitive.
    pub(crate) fn normalize_name(&mut self) {
        self.name.make_ascii_lowercase();
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn admin_only(&self) -> bool {
        self.admin_only
    }

    pub fn fields(&self) -> &[CommandField] {
        &self.fields
    }

    /// The required fields, in declaration order (the order follow-ups are asked in).
    pub fn required_fields(&self) -> impl Iterator<Item = &CommandField> {
        self.fields.iter().filter(|f| f.required)
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.len() > MAX_NAME_LEN || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(CrossbotError::Validation(format!(
            "command name {name} does not meet requirements of all platforms"
        )));
    }
    Ok(())
}

fn validate_description(description: &str) -> Result<()> {
    if description.len() > MAX_DESCRIPTION_LEN {
        return Err(CrossbotError::Validation(format!(
            "a command description is not short enough for all platforms (max: {MAX_DESCRIPTION_LEN})"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_name_accepted() {
        let command = Command::new("Ping_01", "a ping", false).unwrap();
        assert_eq!(command.name(), "Ping_01");
        assert!(!command.admin_only());
    }

    #[test]
    fn test_name_too_long_rejected() {
        let long = "a".repeat(33);
        assert!(Command::new(&long, "desc", false).is_err());
        // 32 is still fine
        let max = "a".repeat(32);
        assert!(Command::new(&max, "desc", false).is_ok());
    }

    #[test]
    fn test_name_bad_charset_rejected() {
        for name in ["with space", "dash-ed", "ünicode", "semi;colon", "/slash"] {
            assert!(Command::new(name, "desc", false).is_err(), "{name} should fail");
        }
    }

    #[test]
    fn test_description_too_long_rejected() {
        let long = "d".repeat(201);
        assert!(Command::new("ok", &long, false).is_err());
        let max = "d".repeat(200);
        assert!(Command::new("ok", &max, false).is_ok());
    }

    #[test]
    fn test_set_name_revalidates() {
        let mut command = Command::new("ok", "desc", false).unwrap();
        assert!(command.set_name("not ok").is_err());
        assert_eq!(command.name(), "ok");
    }

    #[test]
    fn test_required_fields_in_order() {
        let command = Command::new("greet", "greets", false)
            .unwrap()
            .with_field(CommandField::new("name", "your name", true))
            .with_field(CommandField::new("note", "a note", false))
            .with_field(CommandField::new("city", "your city", true));
        let required: Vec<_> = command.required_fields().map(|f| f.name.as_str()).collect();
        assert_eq!(required, vec!["name", "city"]);
    }
}
