/// Error types for wishcraft
///
/// Almost nothing in the engine fails: unknown ids, missing handlers and
/// out-of-context wishes come back as `None` or an empty list. The variants
/// here cover API misuse and the file plumbing around snapshots and config.

use thiserror::Error;

/// Main error type for wishcraft operations
#[derive(Error, Debug)]
pub enum WishError {
    /// Something that isn't a string, number or bool was used as a magic word
    /// or as a query fragment
    #[error("Invalid magic word: {0}")]
    InvalidMagicWord(String),

    /// A path rule regex that doesn't compile
    #[error("Invalid path pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// I/O errors (snapshot and config files)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for wishcraft operations
pub type Result<T> = std::result::Result<T, WishError>;

impl WishError {
    /// Convert to a message fit for the terminal
    pub fn user_message(&self) -> String {
        match self {
            WishError::InvalidMagicWord(what) => {
                format!("Magic words must be strings, numbers or booleans, got {}", what)
            }
            WishError::InvalidPattern(e) => {
                format!("Path rule has a bad regular expression. Details: {}", e)
            }
            WishError::Io(e) => {
                format!("File system error. Check permissions. Details: {}", e)
            }
            WishError::Serialization(e) => {
                format!("Data format error: {}", e)
            }
            WishError::Config(msg) => {
                format!("Configuration issue: {}", msg)
            }
        }
    }
}
