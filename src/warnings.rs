//! # Warning Collection
//!
//! Non-fatal issues (missing palette entries, defaulted config keys, failed
//! spawns) are logged as they happen and kept in memory so they can be
//! printed once the terminal has been restored.

use std::fmt::Write as _;

/// Ordered, de-duplicated list of warnings gathered during a session.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Warnings {
    messages: Vec<String>,
}

impl Warnings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning. Repeated messages are kept only once.
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{}", message);
        self.push(message);
    }

    /// Record an error that did not stop the launcher.
    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::error!("{}", message);
        self.push(format!("!! ERROR !!: {message}"));
    }

    fn push(&mut self, message: String) {
        if !self.messages.contains(&message) {
            self.messages.push(message);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.messages.iter().map(String::as_str)
    }

    /// Render the end-of-session report, or `None` when there is nothing to say.
    pub fn report(&self) -> Option<String> {
        if self.messages.is_empty() {
            return None;
        }
        let mut out = String::from("Warnings during execution:\n");
        for message in &self.messages {
            let _ = writeln!(out, " - {message}");
        }
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warnings_are_deduplicated() {
        let mut warnings = Warnings::new();
        warnings.warn("'button' is missing from the palette");
        warnings.warn("'button' is missing from the palette");
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_errors_are_marked() {
        let mut warnings = Warnings::new();
        warnings.error("spawn failed");
        assert_eq!(warnings.iter().next(), Some("!! ERROR !!: spawn failed"));
    }

    #[test]
    fn test_report() {
        let mut warnings = Warnings::new();
        assert!(warnings.report().is_none());

        warnings.warn("first");
        warnings.warn("second");
        assert_eq!(
            warnings.report().as_deref(),
            Some("Warnings during execution:\n - first\n - second\n")
        );
    }
}
