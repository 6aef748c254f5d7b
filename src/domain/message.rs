//! Message normalization for `signMessage`.
//!
//! The provider distinguishes free text from hex payloads and other
//! pre-tagged content by prefix. Anything not already carrying one of
//! the recognized prefixes is tagged with the default text prefix.

/// Prefixes the provider understands out of the box.
pub const DEFAULT_PREFIXES: [&str; 3] = ["0x", "UOS", "message:"];

/// Prefix prepended to untagged free-text messages.
pub const TEXT_PREFIX: &str = "message:";

/// Prefix table used to normalize outgoing messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageFormat {
    prefixes: Vec<String>,
    text_prefix: String,
}

impl Default for MessageFormat {
    fn default() -> Self {
        Self {
            prefixes: DEFAULT_PREFIXES.iter().map(|p| p.to_string()).collect(),
            text_prefix: TEXT_PREFIX.to_string(),
        }
    }
}

impl MessageFormat {
    /// Build a format from a custom prefix table.
    pub fn new(prefixes: Vec<String>, text_prefix: impl Into<String>) -> Self {
        Self {
            prefixes,
            text_prefix: text_prefix.into(),
        }
    }

    /// Whether `message` already starts with a recognized prefix.
    pub fn is_tagged(&self, message: &str) -> bool {
        self.prefixes
            .iter()
            .any(|p| !p.is_empty() && message.starts_with(p.as_str()))
    }

    /// Return the message as the provider should receive it.
    pub fn format(&self, message: &str) -> String {
        if self.is_tagged(message) {
            message.to_string()
        } else {
            format!("{}{}", self.text_prefix, message)
        }
    }
}

/// Normalize a message with the default prefix table.
pub fn format_message(message: &str) -> String {
    MessageFormat::default().format(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_text_gets_prefix() {
        assert_eq!(format_message("hello"), "message:hello");
        assert_eq!(format_message(""), "message:");
    }

    #[test]
    fn test_tagged_messages_pass_through() {
        assert_eq!(format_message("0xdead"), "0xdead");
        assert_eq!(format_message("message:hi"), "message:hi");
        assert_eq!(format_message("UOS1.0000 transfer"), "UOS1.0000 transfer");
    }

    #[test]
    fn test_prefix_match_is_case_sensitive() {
        assert_eq!(format_message("0Xdead"), "message:0Xdead");
        assert_eq!(format_message("Message:hi"), "message:Message:hi");
    }

    #[test]
    fn test_custom_table() {
        let format = MessageFormat::new(vec!["hex:".into()], "text:");
        assert_eq!(format.format("hex:00"), "hex:00");
        assert_eq!(format.format("0xdead"), "text:0xdead");
    }
}
