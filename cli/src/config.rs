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


//! CLI configuration
//!
//! Every user-visible string of the line protocol lives here so a server can
//! re-skin its sessions without touching the session engine.
//!
//! ```
//! use telecli_cli::CliConfig;
//!
//! let config = CliConfig::default()
//!     .with_prompt("router# ")
//!     .with_login("admin", "secret")
//!     .with_require_echo(true);
//! assert_eq!(config.initial_state(), telecli_cli::ContextState::Username);
//! ```

use crate::types::ContextState;

/// Default help preamble
pub const DEFAULT_HELP_PREAMBLE: &str = "Use ? or \"help\" to display help\n\
Use ! to list history\n\
Use !n to repeat the n'th command\n\
Use !! to repeat the last command\n\
\n\
Commands available are:";

/// Session strings and login settings shared by every context of a CLI
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Replacement for every `\n` written to a context
    pub newline: String,
    /// Characters that erase the last character of the line
    pub edit_characters: String,
    /// Prompt shown while accepting commands
    pub prompt: String,
    /// Prompt shown while waiting for the user name
    pub username_prompt: String,
    /// Prompt shown while waiting for the password
    pub password_prompt: String,
    /// Newline separated, case-insensitive exit commands
    pub exit_command: String,
    /// Newline separated, case-insensitive help commands
    pub help_command: String,
    /// Command repeating the last history entry
    pub repeat_command: String,
    /// Prefix listing history (`!`) and selecting an entry (`!N`)
    pub history_command: String,
    /// Prefix of usage lines
    pub usage_prefix: String,
    /// Separator between the command name and an error message
    pub command_error_prefix: String,
    /// Message for a line that matches no command
    pub unknown_command_error: String,
    /// Message for a history reference that does not exist
    pub no_history_error: String,
    /// Text printed before the command list
    pub help_preamble: String,
    /// Echo typed characters back (the transport does not echo on its own)
    pub require_echo: bool,
    /// Required user name, empty disables the prompt
    pub username: String,
    /// Required password, empty disables the prompt
    pub password: String,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            newline: "\r\n".to_string(),
            edit_characters: "\x08\x7f".to_string(),
            prompt: "CLI> ".to_string(),
            username_prompt: "Username: ".to_string(),
            password_prompt: "Password: ".to_string(),
            exit_command: "exit\nquit".to_string(),
            help_command: "?\nhelp".to_string(),
            repeat_command: "!!".to_string(),
            history_command: "!".to_string(),
            usage_prefix: "Usage: ".to_string(),
            command_error_prefix: ": error: ".to_string(),
            unknown_command_error: "Unknown command".to_string(),
            no_history_error: "No command history".to_string(),
            help_preamble: DEFAULT_HELP_PREAMBLE.to_string(),
            require_echo: false,
            username: String::new(),
            password: String::new(),
        }
    }
}

impl CliConfig {
    /// Set the output newline sequence
    pub fn with_newline(mut self, newline: impl Into<String>) -> Self {
        self.newline = newline.into();
        self
    }

    /// Set the edit (erase) characters
    pub fn with_edit_characters(mut self, characters: impl Into<String>) -> Self {
        self.edit_characters = characters.into();
        self
    }

    /// Set the command prompt
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Set the user name prompt
    pub fn with_username_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.username_prompt = prompt.into();
        self
    }

    /// Set the password prompt
    pub fn with_password_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.password_prompt = prompt.into();
        self
    }

    /// Set the exit command synonyms
    pub fn with_exit_command(mut self, command: impl Into<String>) -> Self {
        self.exit_command = command.into();
        self
    }

    /// Set the help command synonyms
    pub fn with_help_command(mut self, command: impl Into<String>) -> Self {
        self.help_command = command.into();
        self
    }

    /// Set the repeat command
    pub fn with_repeat_command(mut self, command: impl Into<String>) -> Self {
        self.repeat_command = command.into();
        self
    }

    /// Set the history command prefix
    pub fn with_history_command(mut self, command: impl Into<String>) -> Self {
        self.history_command = command.into();
        self
    }

    /// Set the usage prefix
    pub fn with_usage_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.usage_prefix = prefix.into();
        self
    }

    /// Set the per-command error prefix
    pub fn with_command_error_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.command_error_prefix = prefix.into();
        self
    }

    /// Set the unknown command message
    pub fn with_unknown_command_error(mut self, message: impl Into<String>) -> Self {
        self.unknown_command_error = message.into();
        self
    }

    /// Set the missing history message
    pub fn with_no_history_error(mut self, message: impl Into<String>) -> Self {
        self.no_history_error = message.into();
        self
    }

    /// Set the help preamble
    pub fn with_help_preamble(mut self, preamble: impl Into<String>) -> Self {
        self.help_preamble = preamble.into();
        self
    }

    /// Echo typed characters back to the peer
    pub fn with_require_echo(mut self, enabled: bool) -> Self {
        self.require_echo = enabled;
        self
    }

    /// Set the user name and password gating command entry
    pub fn with_login(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    /// State a new context starts in, and returns to after a failed login
    pub fn initial_state(&self) -> ContextState {
        if !self.username.is_empty() {
            ContextState::Username
        } else if !self.password.is_empty() {
            ContextState::Password
        } else {
            ContextState::CommandEntry
        }
    }

    /// Check a line against the exit command synonyms
    pub fn is_exit_command(&self, line: &str) -> bool {
        matches_synonym(&self.exit_command, line)
    }

    /// Check a line against the help command synonyms
    pub fn is_help_command(&self, line: &str) -> bool {
        matches_synonym(&self.help_command, line)
    }

    /// Check whether a byte erases the previous character
    pub fn is_edit_character(&self, byte: u8) -> bool {
        self.edit_characters.bytes().any(|edit| edit == byte)
    }
}

fn matches_synonym(synonyms: &str, line: &str) -> bool {
    synonyms
        .split('\n')
        .map(str::trim)
        .filter(|synonym| !synonym.is_empty())
        .any(|synonym| synonym.eq_ignore_ascii_case(line))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CliConfig::default();
        assert_eq!(config.newline, "\r\n");
        assert_eq!(config.prompt, "CLI> ");
        assert_eq!(config.unknown_command_error, "Unknown command");
        assert_eq!(config.no_history_error, "No command history");
        assert!(!config.require_echo);
        assert_eq!(config.initial_state(), ContextState::CommandEntry);
    }

    #[test]
    fn test_initial_state() {
        let config = CliConfig::default().with_login("admin", "");
        assert_eq!(config.initial_state(), ContextState::Username);
        let config = CliConfig::default().with_login("", "secret");
        assert_eq!(config.initial_state(), ContextState::Password);
        let config = CliConfig::default().with_login("admin", "secret");
        assert_eq!(config.initial_state(), ContextState::Username);
    }

    #[test]
    fn test_synonym_matching() {
        let config = CliConfig::default();
        assert!(config.is_exit_command("exit"));
        assert!(config.is_exit_command("QUIT"));
        assert!(!config.is_exit_command("exits"));
        assert!(config.is_help_command("?"));
        assert!(config.is_help_command("Help"));
        assert!(!config.is_help_command(""));
    }

    #[test]
    fn test_edit_characters() {
        let config = CliConfig::default();
        assert!(config.is_edit_character(0x08));
        assert!(config.is_edit_character(0x7f));
        assert!(!config.is_edit_character(b'a'));

        let config = config.with_edit_characters("#");
        assert!(config.is_edit_character(b'#'));
        assert!(!config.is_edit_character(0x7f));
    }
}
