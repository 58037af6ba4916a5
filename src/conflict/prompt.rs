//! Decision providers for the conflict resolver
//!
//! The resolver never touches stdin directly; it asks a `DecisionProvider`,
//! so tests and non-interactive runs can answer without a terminal.

use crate::error::{Error, Result};
use dialoguer::{theme::ColorfulTheme, Input};
use std::collections::VecDeque;
use std::io::{BufRead, IsTerminal, Write};

pub trait DecisionProvider {
    /// Ask for one of `options`; returns the raw answer.
    fn ask_choice(&mut self, prompt: &str, options: &[&str]) -> Result<String>;

    /// Ask for free text.
    fn ask_text(&mut self, prompt: &str) -> Result<String>;
}

/// Prompts on the terminal, or reads answers line by line from stdin when
/// stdin/stderr are not a terminal.
pub struct TerminalPrompter;

impl TerminalPrompter {
    fn interactive() -> bool {
        std::io::stdin().is_terminal() && std::io::stderr().is_terminal()
    }

    fn read_line(prompt: &str) -> Result<String> {
        let mut stderr = std::io::stderr();
        write!(stderr, "{prompt} ")?;
        stderr.flush()?;

        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line)?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    fn input(prompt: &str, allow_empty: bool) -> Result<String> {
        Input::<String>::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .allow_empty(allow_empty)
            .interact_text()
            .map_err(|e| Error::Prompt(e.to_string()))
    }
}

impl DecisionProvider for TerminalPrompter {
    fn ask_choice(&mut self, prompt: &str, options: &[&str]) -> Result<String> {
        let prompt = format!("{prompt} {}", options.join(" / "));
        if Self::interactive() {
            Self::input(&prompt, true)
        } else {
            Self::read_line(&prompt)
        }
    }

    fn ask_text(&mut self, prompt: &str) -> Result<String> {
        if Self::interactive() {
            Self::input(prompt, true)
        } else {
            Self::read_line(prompt)
        }
    }
}

/// Replays queued answers in order.
#[derive(Debug, Default, Clone)]
pub struct ScriptedDecisions {
    answers: VecDeque<String>,
    asked: Vec<String>,
}

impl ScriptedDecisions {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { answers: answers.into_iter().map(Into::into).collect(), asked: Vec::new() }
    }

    /// Prompts shown so far, in order
    pub fn asked(&self) -> &[String] {
        &self.asked
    }

    fn next(&mut self, prompt: &str) -> Result<String> {
        self.asked.push(prompt.to_string());
        self.answers
            .pop_front()
            .ok_or_else(|| Error::Prompt(format!("no scripted answer for '{prompt}'")))
    }
}

impl DecisionProvider for ScriptedDecisions {
    fn ask_choice(&mut self, prompt: &str, _options: &[&str]) -> Result<String> {
        self.next(prompt)
    }

    fn ask_text(&mut self, prompt: &str) -> Result<String> {
        self.next(prompt)
    }
}

/// Answers every conflict the same way, for `--on-conflict`.
#[derive(Debug, Clone)]
pub struct FixedDecision {
    choice: String,
    rename_to: Option<String>,
}

impl FixedDecision {
    pub fn overwrite() -> Self {
        Self { choice: "o".to_string(), rename_to: None }
    }

    pub fn cancel() -> Self {
        Self { choice: "c".to_string(), rename_to: None }
    }

    pub fn rename(name: impl Into<String>) -> Self {
        Self { choice: "r".to_string(), rename_to: Some(name.into()) }
    }
}

impl DecisionProvider for FixedDecision {
    fn ask_choice(&mut self, _prompt: &str, _options: &[&str]) -> Result<String> {
        Ok(self.choice.clone())
    }

    fn ask_text(&mut self, _prompt: &str) -> Result<String> {
        // Only the first rename gets the configured name
        Ok(self.rename_to.take().unwrap_or_default())
    }
}
