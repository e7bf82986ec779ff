use std::borrow::Cow::{self, Borrowed, Owned};

use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};

use crate::shell::is_exit_command;

/// Completes and highlights the exit keywords.
#[derive(Clone)]
pub struct CliHelper {
    commands: Vec<String>,
}

impl CliHelper {
    pub fn new() -> Self {
        Self {
            commands: vec![
                ragdoll_core::messages::BYE.to_string(),
                ragdoll_core::messages::EXIT.to_string(),
            ],
        }
    }

    fn matching<'a>(&'a self, line: &'a str) -> impl Iterator<Item = &'a String> + 'a {
        let lower = line.to_lowercase();
        self.commands
            .iter()
            .filter(move |cmd| !lower.is_empty() && cmd.starts_with(&lower))
    }

    /// Untyped tail of the first keyword the typed prefix matches.
    fn remaining(&self, typed: &str) -> Option<String> {
        let typed_len = typed.to_lowercase().len();
        self.matching(typed)
            .find_map(|cmd| cmd.get(typed_len..).filter(|rest| !rest.is_empty()))
            .map(str::to_string)
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let candidates = self
            .matching(&line[..pos])
            .map(|cmd| Pair {
                display: cmd.clone(),
                replacement: cmd.clone(),
            })
            .collect();
        Ok((0, candidates))
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if is_exit_command(line) {
            Owned(line.bright_yellow().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        self.remaining(&line[..pos])
    }
}

impl Validator for CliHelper {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hints_only_exit_keywords() {
        let helper = CliHelper::new();
        assert_eq!(helper.matching("b").collect::<Vec<_>>(), vec!["bye"]);
        assert_eq!(helper.matching("EX").collect::<Vec<_>>(), vec!["exit"]);
        assert_eq!(helper.matching("who").count(), 0);
        assert_eq!(helper.matching("").count(), 0);
    }

    #[test]
    fn hint_completes_uppercase_prefix() {
        let helper = CliHelper::new();
        assert_eq!(helper.remaining("EX").as_deref(), Some("it"));
        assert_eq!(helper.remaining("By").as_deref(), Some("e"));
        assert_eq!(helper.remaining("exit"), None);
        assert_eq!(helper.remaining("who"), None);
    }
}
