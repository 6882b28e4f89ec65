//! Terminal notices and prompts.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::io::{self, BufRead, Write};

use floricultura_storefront::{Confirmer, Notice, NoticeLevel, Notifier};

/// Prints notices: info to stdout, warnings and errors to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Info => println!("{}", notice.message),
            NoticeLevel::Warning => eprintln!("! {}", notice.message),
            NoticeLevel::Error => eprintln!("✗ {}", notice.message),
        }
    }
}

/// Asks on the terminal, unless `--yes` was given.
#[derive(Debug, Clone, Copy)]
pub enum TerminalConfirmer {
    Ask,
    AssumeYes,
}

impl TerminalConfirmer {
    pub const fn new(assume_yes: bool) -> Self {
        if assume_yes { Self::AssumeYes } else { Self::Ask }
    }
}

impl Confirmer for TerminalConfirmer {
    fn confirm(&self, prompt: &str) -> bool {
        match self {
            Self::AssumeYes => true,
            Self::Ask => {
                print!("{prompt} [s/N] ");
                read_line().is_some_and(|answer| is_yes(&answer))
            }
        }
    }
}

/// Read a value from stdin after showing `label`.
pub fn prompt(label: &str) -> Option<String> {
    print!("{label}: ");
    read_line()
}

fn read_line() -> Option<String> {
    io::stdout().flush().ok()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line).ok()?;
    Some(line.trim().to_owned())
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.to_lowercase().as_str(), "s" | "sim" | "y" | "yes")
}
