//! Operator input: one command per line on stdin.
//!
//! The reader thread only parses lines and forwards them; it never touches the
//! controller. EOF ends the program like a quit command does.
use std::io::{self, BufRead};
use std::thread::{self, JoinHandle};

use crossbeam_channel::Sender;
use log::{debug, info};
use options_common::{Result, TrackerError};

const QUIT_WORDS: [&str; 4] = [":q", ":quit", "quit", "exit"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorCommand {
    /// Raw ticker text; validated by the controller.
    SwitchTicker(String),
    Quit,
}

impl OperatorCommand {
    /// Parse one input line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Option<OperatorCommand> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return None;
        }
        if QUIT_WORDS.iter().any(|word| trimmed.eq_ignore_ascii_case(word)) {
            return Some(OperatorCommand::Quit);
        }
        Some(OperatorCommand::SwitchTicker(trimmed.to_string()))
    }
}

/// Forward commands read from `reader` until quit, EOF or a closed receiver.
///
/// EOF is forwarded as [`OperatorCommand::Quit`].
pub fn read_commands<R: BufRead>(reader: R, tx: &Sender<OperatorCommand>) -> Result<()> {
    for line in reader.lines() {
        let Some(command) = OperatorCommand::parse(&line?) else {
            continue;
        };
        let quit = command == OperatorCommand::Quit;
        tx.send(command)
            .map_err(|e| TrackerError::ChannelSend(e.to_string()))?;
        if quit {
            return Ok(());
        }
    }
    debug!("input closed");
    tx.send(OperatorCommand::Quit)
        .map_err(|e| TrackerError::ChannelSend(e.to_string()))
}

/// Read stdin on a detached thread.
pub fn spawn_stdin_reader(tx: Sender<OperatorCommand>) -> Result<JoinHandle<()>> {
    let handle = thread::Builder::new()
        .name("stdin".to_string())
        .spawn(move || {
            let stdin = io::stdin();
            if let Err(e) = read_commands(stdin.lock(), &tx) {
                // A closed receiver means the pump is already gone.
                info!("stdin reader stopped: {}", e);
            }
        })?;
    Ok(handle)
}
