use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// How a command is executed.
///
/// A single string goes through the system shell so pipes and redirection
/// work; an argument vector is executed directly and never shell-interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExecSpec {
    Shell(String),
    Args(Vec<String>),
}

impl ExecSpec {
    pub fn is_shell(&self) -> bool {
        matches!(self, ExecSpec::Shell(_))
    }
}

impl fmt::Display for ExecSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecSpec::Shell(line) => write!(f, "{line}"),
            ExecSpec::Args(args) => write!(f, "{args:?}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub label: String,
    pub exec: ExecSpec,
}

/// Commands keyed by label, in declaration order.
///
/// Order matters: fuzzy lookups return the first match, and a launcher
/// without a layout shows every command in this order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandTable {
    commands: Vec<Command>,
}

impl CommandTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a command. Re-inserting an existing label replaces its exec spec
    /// but keeps its original position.
    pub fn insert(&mut self, label: impl Into<String>, exec: ExecSpec) {
        let label = label.into();
        if let Some(existing) = self.commands.iter_mut().find(|c| c.label == label) {
            existing.exec = exec;
        } else {
            self.commands.push(Command { label, exec });
        }
    }

    pub fn get(&self, label: &str) -> Option<&Command> {
        self.commands.iter().find(|c| c.label == label)
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.commands.iter().position(|c| c.label == label)
    }

    pub fn by_index(&self, index: usize) -> Option<&Command> {
        self.commands.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().map(|c| c.label.as_str())
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl<L: Into<String>> FromIterator<(L, ExecSpec)> for CommandTable {
    fn from_iter<I: IntoIterator<Item = (L, ExecSpec)>>(iter: I) -> Self {
        let mut table = CommandTable::new();
        for (label, exec) in iter {
            table.insert(label, exec);
        }
        table
    }
}

impl Serialize for CommandTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.commands.len()))?;
        for command in &self.commands {
            map.serialize_entry(&command.label, &command.exec)?;
        }
        map.end()
    }
}

struct CommandTableVisitor;

impl<'de> Visitor<'de> for CommandTableVisitor {
    type Value = CommandTable;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a table of labels mapped to a shell string or an argument list")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut table = CommandTable::new();
        while let Some((label, exec)) = access.next_entry::<String, ExecSpec>()? {
            table.insert(label, exec);
        }
        Ok(table)
    }
}

// Entries are visited in document order, which keeps declaration order
// intact as long as the format crate preserves it.
impl<'de> Deserialize<'de> for CommandTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(CommandTableVisitor)
    }
}
