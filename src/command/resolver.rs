use regex::Regex;
use std::sync::OnceLock;

use crate::command::table::{Command, CommandTable};
use crate::error::ConfigError;

/// `{formatter}query`, where the formatter prefix is optional.
static TOKEN_RE: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();

fn token_regex() -> Result<&'static Regex, ConfigError> {
    TOKEN_RE
        .get_or_init(|| Regex::new(r"^(?:\{([^}]+)\})?(.+)$"))
        .as_ref()
        .map_err(|e| ConfigError::TokenPattern(e.clone()))
}

/// A layout token split into its optional display formatter and the query
/// used to look up a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutToken {
    pub formatter: Option<String>,
    pub query: String,
}

impl LayoutToken {
    /// Parse raw layout text. Returns `None` for empty input.
    ///
    /// A bare `{name}` with nothing after it is treated as a query in its
    /// own right, since the query part may not be empty.
    pub fn parse(raw: &str) -> Result<Option<Self>, ConfigError> {
        let Some(caps) = token_regex()?.captures(raw) else {
            return Ok(None);
        };
        Ok(caps.get(2).map(|query| Self {
            formatter: caps.get(1).map(|m| m.as_str().to_string()),
            query: query.as_str().to_string(),
        }))
    }
}

/// Looks up commands by case-insensitive substring, first match in
/// declaration order.
#[derive(Debug, Clone, Copy)]
pub struct KeyResolver<'a> {
    commands: &'a CommandTable,
}

impl<'a> KeyResolver<'a> {
    pub fn new(commands: &'a CommandTable) -> Self {
        Self { commands }
    }

    /// Find the first command whose label contains `query`, ignoring case.
    /// `query` is matched as-is; no formatter prefix is stripped.
    pub fn find(&self, query: &str) -> Option<&'a Command> {
        let needle = query.to_lowercase();
        self.commands
            .iter()
            .find(|c| c.label.to_lowercase().contains(&needle))
    }

    /// Resolve a raw layout token (formatter prefix allowed) to a command.
    pub fn resolve(&self, raw: &str) -> Result<&'a Command, ConfigError> {
        let unresolved = || ConfigError::UnresolvedKey {
            token: raw.to_string(),
        };
        let token = LayoutToken::parse(raw)?.ok_or_else(unresolved)?;
        self.find(&token.query).ok_or_else(unresolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::table::ExecSpec;

    fn table() -> CommandTable {
        [
            ("▶ Play", "echo playing"),
            ("⏹ Stop", "echo stopping"),
            ("Playlist", "echo list"),
            ("Rewind", "echo rewinding"),
        ]
        .into_iter()
        .map(|(label, cmd)| (label, ExecSpec::Shell(cmd.to_string())))
        .collect()
    }

    #[test]
    fn test_parse_plain_token() {
        let token = LayoutToken::parse("Play").unwrap().expect("token");
        assert_eq!(token.formatter, None);
        assert_eq!(token.query, "Play");
    }

    #[test]
    fn test_parse_formatter_prefix() {
        let token = LayoutToken::parse("{item_header}tail_header_dynamic_label")
            .unwrap()
            .expect("token");
        assert_eq!(token.formatter.as_deref(), Some("item_header"));
        assert_eq!(token.query, "tail_header_dynamic_label");
    }

    #[test]
    fn test_parse_formatter_without_query() {
        let token = LayoutToken::parse("{bold}").unwrap().expect("token");
        assert_eq!(token.formatter, None);
        assert_eq!(token.query, "{bold}");
    }

    #[test]
    fn test_parse_empty() {
        assert!(LayoutToken::parse("").unwrap().is_none());
    }

    #[test]
    fn test_token_pattern_compiles_once() {
        let first = token_regex().expect("pattern compiles");
        let second = token_regex().expect("pattern compiles");
        assert!(std::ptr::eq(first, second));
        assert!(first.is_match("{bold}Play"));
    }

    #[test]
    fn test_resolve_substring_case_insensitive() {
        let table = table();
        let resolver = KeyResolver::new(&table);
        let cmd = resolver.resolve("play").expect("resolves");
        assert_eq!(cmd.label, "▶ Play");
        let cmd = resolver.resolve("REW").expect("resolves");
        assert_eq!(cmd.label, "Rewind");
    }

    #[test]
    fn test_resolve_first_match_wins() {
        let table = table();
        let resolver = KeyResolver::new(&table);
        // Both "▶ Play" and "Playlist" contain "play"; declaration order decides.
        for _ in 0..3 {
            assert_eq!(resolver.resolve("Play").expect("resolves").label, "▶ Play");
        }
        assert_eq!(resolver.resolve("list").expect("resolves").label, "Playlist");
    }

    #[test]
    fn test_resolve_strips_formatter() {
        let table = table();
        let resolver = KeyResolver::new(&table);
        let cmd = resolver.resolve("{bold}stop").expect("resolves");
        assert_eq!(cmd.label, "⏹ Stop");
    }

    #[test]
    fn test_resolve_unknown_is_error() {
        let table = table();
        let resolver = KeyResolver::new(&table);
        let err = resolver.resolve("Eject").expect_err("no such command");
        assert_eq!(err.to_string(), "could not find command key: Eject");
    }

    #[test]
    fn test_find_returns_none_without_error() {
        let table = table();
        assert!(KeyResolver::new(&table).find("missing").is_none());
    }
}
