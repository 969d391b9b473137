//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//


use crate::config::CliConfig;
use crate::handler::CommandHandler;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// A registered command: its handler plus the text shown by help
#[derive(Clone)]
pub struct CommandEntry {
    handler: Arc<dyn CommandHandler>,
    help: String,
    usage: String,
}

impl CommandEntry {
    /// Handler invoked for the command
    pub fn handler(&self) -> &Arc<dyn CommandHandler> {
        &self.handler
    }

    /// Help text, possibly several lines
    pub fn help(&self) -> &str {
        &self.help
    }

    /// Usage text, possibly several lines
    pub fn usage(&self) -> &str {
        &self.usage
    }
}

impl std::fmt::Debug for CommandEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandEntry")
            .field("help", &self.help)
            .field("usage", &self.usage)
            .finish_non_exhaustive()
    }
}

/// A command matched against the start of an argument list
#[derive(Debug, Clone)]
pub struct CommandMatch {
    /// Number of leading tokens forming the command name
    pub tokens: usize,
    /// Normalized command name
    pub name: String,
    /// The matched entry
    pub entry: CommandEntry,
}

/// Table of command names shared by every context of a CLI.
///
/// Names are whitespace-collapsed, so `"show   version"` and
/// `"show version"` are the same command. Iteration is alphabetical.
#[derive(Default)]
pub struct CommandRegistry {
    commands: Mutex<BTreeMap<String, CommandEntry>>,
}

impl CommandRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    fn commands(&self) -> MutexGuard<'_, BTreeMap<String, CommandEntry>> {
        self.commands.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register one or more newline separated synonyms for a handler.
    ///
    /// Returns `false`, registering nothing, if no name is given or any of
    /// the synonyms already exists.
    pub fn register(
        &self,
        names: &str,
        handler: Arc<dyn CommandHandler>,
        help: &str,
        usage: &str,
    ) -> bool {
        let names = split_names(names);
        if names.is_empty() {
            return false;
        }
        let mut commands = self.commands();
        if names.iter().any(|name| commands.contains_key(name)) {
            debug!(?names, "Command already registered");
            return false;
        }
        for name in names {
            debug!(command = %name, "Registered command");
            commands.insert(
                name,
                CommandEntry {
                    handler: Arc::clone(&handler),
                    help: help.to_string(),
                    usage: usage.to_string(),
                },
            );
        }
        true
    }

    /// Remove every listed synonym, returning whether any existed
    pub fn remove(&self, names: &str) -> bool {
        let mut commands = self.commands();
        let mut removed = false;
        for name in split_names(names) {
            removed |= commands.remove(&name).is_some();
        }
        removed
    }

    /// Find a command by name
    pub fn lookup(&self, name: &str) -> Option<CommandEntry> {
        self.commands().get(&normalize_name(name)).cloned()
    }

    /// Find the longest registered name formed by leading `tokens`.
    ///
    /// Every prefix length is tried from one token up to all of them, each
    /// hit replacing the previous one, so `show version` wins over `show`.
    pub fn find_longest<S: AsRef<str>>(&self, tokens: &[S]) -> Option<CommandMatch> {
        let commands = self.commands();
        let mut found = None;
        let mut name = String::new();
        for (index, token) in tokens.iter().enumerate() {
            if index > 0 {
                name.push(' ');
            }
            name.push_str(token.as_ref());
            if let Some(entry) = commands.get(&name) {
                found = Some(CommandMatch {
                    tokens: index + 1,
                    name: name.clone(),
                    entry: entry.clone(),
                });
            }
        }
        found
    }

    /// Snapshot of all commands in alphabetical order
    pub fn entries(&self) -> Vec<(String, CommandEntry)> {
        self.commands()
            .iter()
            .map(|(name, entry)| (name.clone(), entry.clone()))
            .collect()
    }

    /// Number of registered names
    pub fn len(&self) -> usize {
        self.commands().len()
    }

    /// Check whether no command is registered
    pub fn is_empty(&self) -> bool {
        self.commands().is_empty()
    }

    /// Render the help screen: preamble, then one aligned block per command.
    ///
    /// Usage lines read `Usage: <command> <usage>`, the same form
    /// [`Arguments::write_usage`](crate::Arguments::write_usage) prints.
    pub fn render_help(&self, config: &CliConfig) -> String {
        let entries = self.entries();
        let width = entries.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
        let indent = " ".repeat(width + 3);

        let mut text = String::new();
        text.push_str(&config.help_preamble);
        text.push('\n');
        for (name, entry) in &entries {
            let mut lines: Vec<String> = entry.help.lines().map(str::to_string).collect();
            let mut usage = entry.usage.lines();
            if let Some(first) = usage.next() {
                lines.push(format!("{}{name} {first}", config.usage_prefix));
                lines.extend(usage.map(str::to_string));
            }

            text.push_str(&format!("{name:<width$}"));
            for (index, line) in lines.iter().enumerate() {
                if index == 0 {
                    text.push_str("   ");
                } else {
                    text.push('\n');
                    text.push_str(&indent);
                }
                text.push_str(line);
            }
            text.push('\n');
        }
        text
    }
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("commands", &self.commands().keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Collapse runs of whitespace in a command name to single spaces
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn split_names(names: &str) -> Vec<String> {
    let mut split: Vec<String> = names
        .split('\n')
        .map(normalize_name)
        .filter(|name| !name.is_empty())
        .collect();
    split.dedup();
    split
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::handler_fn;

    fn noop() -> Arc<dyn CommandHandler> {
        Arc::new(handler_fn(|_args| Ok(())))
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  show   version \t"), "show version");
        assert_eq!(normalize_name("status"), "status");
        assert_eq!(normalize_name("   "), "");
    }

    #[test]
    fn test_register_synonyms() {
        let registry = CommandRegistry::new();
        assert!(registry.register("list\nls", noop(), "List things", ""));
        assert_eq!(registry.len(), 2);
        let list = registry.lookup("list").unwrap();
        let ls = registry.lookup("ls").unwrap();
        assert!(Arc::ptr_eq(list.handler(), ls.handler()));
        assert_eq!(ls.help(), "List things");
    }

    #[test]
    fn test_register_is_atomic() {
        let registry = CommandRegistry::new();
        assert!(registry.register("ls", noop(), "", ""));
        assert!(!registry.register("dir\nls", noop(), "", ""));
        assert!(registry.lookup("dir").is_none());
        assert_eq!(registry.len(), 1);
        assert!(!registry.register("\n  \n", noop(), "", ""));
    }

    #[test]
    fn test_remove() {
        let registry = CommandRegistry::new();
        registry.register("list\nls", noop(), "", "");
        assert!(registry.remove("ls\nmissing"));
        assert!(registry.lookup("ls").is_none());
        assert!(registry.lookup("list").is_some());
        assert!(!registry.remove("ls"));
    }

    #[test]
    fn test_find_longest_prefers_longest() {
        let registry = CommandRegistry::new();
        registry.register("show", noop(), "", "");
        registry.register("show version", noop(), "", "");
        registry.register("show status", noop(), "", "");

        let found = registry.find_longest(&["show", "version", "extra"]).unwrap();
        assert_eq!(found.tokens, 2);
        assert_eq!(found.name, "show version");

        let found = registry.find_longest(&["show", "bogus"]).unwrap();
        assert_eq!(found.tokens, 1);
        assert_eq!(found.name, "show");
    }

    #[test]
    fn test_find_longest_skips_gaps() {
        let registry = CommandRegistry::new();
        registry.register("set ip address", noop(), "", "");
        let found = registry.find_longest(&["set", "ip", "address", "10.0.0.1"]).unwrap();
        assert_eq!(found.tokens, 3);
        assert!(registry.find_longest(&["set", "ip"]).is_none());
        assert!(registry.find_longest::<&str>(&[]).is_none());
    }

    #[test]
    fn test_render_help_alignment() {
        let registry = CommandRegistry::new();
        registry.register("ls", noop(), "List things", "[dir]");
        registry.register("show version", noop(), "Show version\nand build", "");
        let config = CliConfig::default().with_help_preamble("Commands:");

        let help = registry.render_help(&config);
        let expected = "Commands:\n\
            ls             List things\n\
            \x20              Usage: ls [dir]\n\
            show version   Show version\n\
            \x20              and build\n";
        assert_eq!(help, expected);
    }
}
