use tracing::warn;

use crate::domain::{Command, DeadLetterQueue, Error};

/// Reports rejected commands on stderr and in the log.
#[derive(Default, Debug)]
pub struct StdErrDLQ {}

impl DeadLetterQueue for StdErrDLQ {
    fn report(&self, command: Option<&Command>, error: &Error) {
        let retryable = error.is_retryable();
        match command {
            Some(cmd) => {
                warn!(command = %cmd, %error, retryable, "command rejected");
                eprintln!("DLQ Report - Command: {} - Error: {}", cmd, error);
            }
            None => {
                warn!(%error, retryable, "unreadable command");
                eprintln!("DLQ Report - Error: {}", error);
            }
        }
    }
}
