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


use crate::{CliResult, Context};
use std::fmt;

/// Parsed view of one submitted command line.
///
/// Created per dispatched line. Text written through [`fmt::Write`] is
/// buffered and sent to the owning context when the handler returns or on
/// [`Arguments::flush`].
pub struct Arguments<'a> {
    context: &'a Context,
    line: String,
    tokens: Vec<String>,
    command: String,
    usage: String,
    output: String,
}

impl<'a> Arguments<'a> {
    /// Tokenize `line` for `context`
    pub fn new(context: &'a Context, line: &str) -> Self {
        Self {
            context,
            line: line.to_string(),
            tokens: tokenize(line),
            command: String::new(),
            usage: String::new(),
            output: String::new(),
        }
    }

    /// Record the matched command and drop its tokens
    pub(crate) fn bind(&mut self, tokens: usize, command: String, usage: &str) {
        self.shift(tokens);
        self.command = command;
        self.usage = usage.to_string();
    }

    /// The context the line was entered on
    pub fn context(&self) -> &'a Context {
        self.context
    }

    /// The line as submitted
    pub fn line(&self) -> &str {
        &self.line
    }

    /// Name of the matched command
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Usage text of the matched command
    pub fn usage(&self) -> &str {
        &self.usage
    }

    /// Number of remaining parameters
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Check whether no parameter remains
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Parameter at `index`
    pub fn get(&self, index: usize) -> Option<&str> {
        self.tokens.get(index).map(String::as_str)
    }

    /// Iterate over the remaining parameters
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }

    /// All remaining parameters
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Drop up to `count` leading parameters
    pub fn shift(&mut self, count: usize) {
        let count = count.min(self.tokens.len());
        self.tokens.drain(..count);
    }

    /// Queue `<command>: error: <message>`
    pub fn write_error(&mut self, message: &str) {
        self.output.push_str(&self.command);
        self.output.push_str(&self.context.config().command_error_prefix);
        self.output.push_str(message);
        self.output.push('\n');
    }

    /// Queue `Usage: <command> <usage>`
    pub fn write_usage(&mut self) {
        let prefix = &self.context.config().usage_prefix;
        self.output.push_str(prefix);
        self.output.push_str(&self.command);
        if !self.usage.is_empty() {
            self.output.push(' ');
            self.output.push_str(&self.usage);
        }
        self.output.push('\n');
    }

    /// Text queued but not yet sent
    pub fn pending_output(&self) -> &str {
        &self.output
    }

    /// Send queued output to the context
    pub async fn flush(&mut self) -> CliResult<()> {
        if self.output.is_empty() {
            return Ok(());
        }
        let output = std::mem::take(&mut self.output);
        self.context.write_str(&output).await
    }
}

impl fmt::Write for Arguments<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.output.push_str(s);
        Ok(())
    }
}

impl fmt::Debug for Arguments<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arguments")
            .field("context", &self.context.id())
            .field("command", &self.command)
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}

/// Split a line on whitespace, keeping double-quoted runs together.
///
/// Inside quotes `\"` and `\\` are escapes; the quotes themselves are dropped.
pub fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quoted = false;
    let mut chars = line.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                quoted = !quoted;
                in_token = true;
            }
            '\\' if quoted => match chars.next() {
                Some(escaped) => current.push(escaped),
                None => current.push('\\'),
            },
            ch if ch.is_whitespace() && !quoted => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            ch => {
                current.push(ch);
                in_token = true;
            }
        }
    }
    if in_token {
        tokens.push(current);
    }
    tokens
}
