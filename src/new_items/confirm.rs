use anyhow::Result;
use std::io::{self, BufRead, Write};

/// Asked once per new item; `false` skips the item.
pub trait Confirm {
    fn confirm(&mut self, question: &str) -> Result<bool>;
}

/// Unattended runs
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysConfirm;

impl Confirm for AlwaysConfirm {
    fn confirm(&mut self, _question: &str) -> Result<bool> {
        Ok(true)
    }
}

/// Prints the question and reads the answer from stdin; only `y` confirms.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&mut self, question: &str) -> Result<bool> {
        print!("{question}\nContinue? ");
        io::stdout().flush()?;
        let mut answer = String::new();
        io::stdin().lock().read_line(&mut answer)?;
        Ok(is_yes(&answer))
    }
}

fn is_yes(answer: &str) -> bool {
    answer.trim() == "y"
}
