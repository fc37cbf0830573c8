use std::io::{self, IsTerminal, Read};

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::error::ConsoleError;

/// Where the console reads piped payloads and confirmation answers from.
pub trait Input {
    /// Everything piped on stdin, or `None` when stdin is a terminal.
    fn piped(&mut self) -> Result<Option<String>, ConsoleError>;

    /// Ask a yes/no question. Anything but an answer starting with `y` is no.
    fn confirm(&mut self, prompt: &str) -> Result<bool, ConsoleError>;
}

/// Process stdin.
#[derive(Default)]
pub struct StdInput {
    consumed: bool,
}

impl Input for StdInput {
    fn piped(&mut self) -> Result<Option<String>, ConsoleError> {
        if self.consumed || io::stdin().is_terminal() {
            return Ok(None);
        }
        self.consumed = true;
        let mut text = String::new();
        io::stdin().read_to_string(&mut text)?;
        Ok(Some(text))
    }

    fn confirm(&mut self, prompt: &str) -> Result<bool, ConsoleError> {
        let mut rl = DefaultEditor::new()?;
        match rl.readline(prompt) {
            Ok(line) => Ok(is_yes(&line)),
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

pub fn is_yes(answer: &str) -> bool {
    answer.trim().to_ascii_uppercase().starts_with('Y')
}

/// Canned input for tests.
#[cfg(test)]
#[derive(Default)]
pub struct ScriptedInput {
    pub piped: Option<String>,
    pub answer: bool,
    pub prompts: Vec<String>,
}

#[cfg(test)]
impl Input for ScriptedInput {
    fn piped(&mut self) -> Result<Option<String>, ConsoleError> {
        Ok(self.piped.take())
    }

    fn confirm(&mut self, prompt: &str) -> Result<bool, ConsoleError> {
        self.prompts.push(prompt.to_string());
        Ok(self.answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_yes() {
        assert!(is_yes("y"));
        assert!(is_yes(" Yes\n"));
        assert!(!is_yes(""));
        assert!(!is_yes("n"));
        assert!(!is_yes("nope, yes"));
    }

    #[test]
    fn test_scripted_input_pipes_once() {
        let mut input = ScriptedInput {
            piped: Some("{}".to_string()),
            ..Default::default()
        };
        assert_eq!(input.piped().unwrap().as_deref(), Some("{}"));
        assert_eq!(input.piped().unwrap(), None);
    }
}
