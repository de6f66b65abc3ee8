//! Response classifier
//!
//! Decides whether a successfully transported response is a failure
//! reported by the game server. Pure functions over text; nothing here
//! touches the network or can fail.

use serde::Serialize;

/// Case-sensitive phrases servers use when rejecting a command
pub const ERROR_INDICATORS: [&str; 9] = [
    "Error:",
    "Unknown command",
    "No player was found",
    "Unable to modify",
    "Invalid",
    "Incorrect argument",
    "Expected",
    "Cannot",
    "Failed",
];

/// Message used when a command succeeded without output
pub const EXECUTED_MESSAGE: &str = "Command executed";

/// Uniform success/failure verdict for one response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub success: bool,
    pub message: String,
    pub data: Option<String>,
}

/// Returns true if `text` contains a server-side rejection phrase
///
/// Empty text is not an error: many commands succeed silently.
pub fn is_error(text: &str) -> bool {
    !text.is_empty() && ERROR_INDICATORS.iter().any(|marker| text.contains(marker))
}

/// Turn response text into a [`Verdict`]
pub fn classify(text: &str) -> Verdict {
    if text.trim().is_empty() {
        return Verdict {
            success: true,
            message: EXECUTED_MESSAGE.to_string(),
            data: None,
        };
    }

    if is_error(text) {
        return Verdict {
            success: false,
            message: text.to_string(),
            data: None,
        };
    }

    Verdict {
        success: true,
        message: text.to_string(),
        data: Some(text.to_string()),
    }
}

/// Raw response text paired with its error flag
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandResult {
    pub raw_text: String,
    pub is_error: bool,
}

impl CommandResult {
    /// Wrap raw command output, flagging it with [`is_error`]
    pub fn from_text(text: impl Into<String>) -> Self {
        let raw_text = text.into();
        let is_error = is_error(&raw_text);
        Self { raw_text, is_error }
    }

    /// Full verdict for this result
    pub fn verdict(&self) -> Verdict {
        classify(&self.raw_text)
    }
}
