//! Parsing of `argocd admin settings resource-overrides health` output
//!
//! Only `STATUS:` and `MESSAGE:` lines carry meaning. Everything else is
//! kept for the case log.

use crate::health::HealthStatus;

const STATUS_LABEL: &str = "STATUS";
const MESSAGE_LABEL: &str = "MESSAGE";

/// One classified line of CLI output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputLine<'a> {
    Status(&'a str),
    Message(&'a str),
    Unrecognized(&'a str),
}

impl<'a> OutputLine<'a> {
    /// Classify a line by the label before its first colon
    ///
    /// Values are trimmed. Lines without a colon are unrecognized.
    pub fn parse(line: &'a str) -> Self {
        match line.split_once(':') {
            Some((STATUS_LABEL, value)) => Self::Status(value.trim()),
            Some((MESSAGE_LABEL, value)) => Self::Message(value.trim()),
            _ => Self::Unrecognized(line),
        }
    }
}

/// Health status folded out of a whole output buffer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedOutput {
    pub status: HealthStatus,
    /// Lines that were neither STATUS nor MESSAGE, in order
    pub unrecognized: Vec<String>,
}

impl ParsedOutput {
    /// Scan `stdout` line by line; later labels overwrite earlier ones
    pub fn from_stdout(stdout: &str) -> Self {
        let mut parsed = Self::default();
        for line in stdout.lines() {
            match OutputLine::parse(line) {
                OutputLine::Status(value) => parsed.status.set_status(value),
                OutputLine::Message(value) => parsed.status.set_message(value),
                OutputLine::Unrecognized(line) => {
                    tracing::debug!(line, "unrecognized output line");
                    parsed.unrecognized.push(line.to_string());
                }
            }
        }
        parsed
    }
}
