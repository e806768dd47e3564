//! Terminal I/O for the CLI
//!
//! - Report: one pretty JSON object on stdout
//! - Prompts: questions on stderr, answers read from stdin
//! - UTF-8 only

use std::io::{self, BufRead, Write};

use async_trait::async_trait;
use serde::Serialize;

use crate::dispatch::CancelFlag;

/// Asks the operator yes/no questions
#[async_trait]
pub trait Prompter: Send {
    async fn confirm(&mut self, question: &str) -> io::Result<bool>;
}

/// Prompts on the terminal
///
/// Stdin is read on a blocking thread. Cancelling the run answers no to the
/// pending question and to every later one.
#[derive(Debug, Default)]
pub struct TerminalPrompter {
    cancel: CancelFlag,
}

impl TerminalPrompter {
    pub fn new(cancel: CancelFlag) -> Self {
        Self { cancel }
    }
}

#[async_trait]
impl Prompter for TerminalPrompter {
    async fn confirm(&mut self, question: &str) -> io::Result<bool> {
        if self.cancel.is_cancelled() {
            return Ok(false);
        }

        let question = question.to_string();
        let answer = tokio::task::spawn_blocking(move || {
            let stdin = io::stdin();
            let mut stderr = io::stderr();
            confirm(&question, &mut stdin.lock(), &mut stderr)
        });

        tokio::select! {
            joined = answer => joined.map_err(|e| io::Error::new(io::ErrorKind::Other, e))?,
            _ = self.cancel.cancelled() => {
                eprintln!();
                Ok(false)
            }
        }
    }
}

/// Answers every question the same way
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

#[async_trait]
impl Prompter for FixedAnswer {
    async fn confirm(&mut self, _question: &str) -> io::Result<bool> {
        Ok(self.0)
    }
}

/// Ask `question` and read a y/N answer; end of input means no
pub fn confirm<R: BufRead, W: Write>(question: &str, input: &mut R, output: &mut W) -> io::Result<bool> {
    write!(output, "{} [y/N] ", question)?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        writeln!(output)?;
        return Ok(false);
    }

    Ok(matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

/// Write a JSON document to stdout
pub fn write_json<T: Serialize>(value: &T) -> io::Result<()> {
    let mut stdout = io::stdout();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    stdout.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn ask(answer: &str) -> (bool, String) {
        let mut input = Cursor::new(answer.as_bytes().to_vec());
        let mut output = Vec::new();
        let result = confirm("Restore 3 objects?", &mut input, &mut output).unwrap();
        (result, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_yes_answers() {
        assert!(ask("y\n").0);
        assert!(ask("YES\n").0);
        assert!(ask("  yes  \n").0);
    }

    #[test]
    fn test_default_is_no() {
        assert!(!ask("\n").0);
        assert!(!ask("nope\n").0);
        assert!(!ask("").0);
    }

    #[test]
    fn test_question_written() {
        let (_, output) = ask("n\n");
        assert_eq!(output, "Restore 3 objects? [y/N] ");
    }

    #[tokio::test]
    async fn test_fixed_answer() {
        assert!(FixedAnswer(true).confirm("anything").await.unwrap());
        assert!(!FixedAnswer(false).confirm("anything").await.unwrap());
    }

    #[tokio::test]
    async fn test_terminal_prompter_cancelled_answers_no() {
        let cancel = CancelFlag::new();
        cancel.cancel();
        let mut prompter = TerminalPrompter::new(cancel);

        assert!(!prompter.confirm("Restore 3 objects?").await.unwrap());
    }
}
