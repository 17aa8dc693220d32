//! Line-oriented user I/O for the interactive session.

use crate::Result;
use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin, Stdout};

/// Reads lines from and writes lines to the user.
#[async_trait::async_trait]
pub trait Console: Send {
    /// The next line of input without its line ending, or `None` at end of input.
    async fn read_line(&mut self) -> Result<Option<String>>;

    /// Writes `line` followed by a newline.
    async fn write_line(&mut self, line: &str) -> Result<()>;
}

/// A `Console` over stdin and stdout.
#[derive(Debug)]
pub struct Terminal {
    input: Lines<BufReader<Stdin>>,
    output: Stdout,
}

impl Terminal {
    pub fn new() -> Self {
        Self {
            input: BufReader::new(tokio::io::stdin()).lines(),
            output: tokio::io::stdout(),
        }
    }
}

impl Default for Terminal {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Console for Terminal {
    async fn read_line(&mut self) -> Result<Option<String>> {
        self.input
            .next_line()
            .await
            .context("Unable to read from stdin")
    }

    async fn write_line(&mut self, line: &str) -> Result<()> {
        self.output
            .write_all(format!("{line}\n").as_bytes())
            .await
            .context("Unable to write to stdout")?;
        self.output
            .flush()
            .await
            .context("Unable to flush stdout")
    }
}

/// A `Console` that replays canned input and records everything written.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct ScriptedConsole {
    input: std::collections::VecDeque<String>,
    output: Vec<String>,
}

#[cfg(test)]
impl ScriptedConsole {
    pub(crate) fn new<S: Into<String>>(input: impl IntoIterator<Item = S>) -> Self {
        Self {
            input: input.into_iter().map(Into::into).collect(),
            output: Vec::new(),
        }
    }

    pub(crate) fn output(&self) -> &[String] {
        &self.output
    }

    /// Whether any written line contains `text`.
    pub(crate) fn printed(&self, text: &str) -> bool {
        self.output.iter().any(|line| line.contains(text))
    }
}

#[cfg(test)]
#[async_trait::async_trait]
impl Console for ScriptedConsole {
    async fn read_line(&mut self) -> Result<Option<String>> {
        Ok(self.input.pop_front())
    }

    async fn write_line(&mut self, line: &str) -> Result<()> {
        self.output.push(line.to_string());
        Ok(())
    }
}
