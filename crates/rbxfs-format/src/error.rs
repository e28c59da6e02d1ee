//! Error types for rbxfs-format

/// Result type for rbxfs-format operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in rbxfs-format operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unsupported file extension `{ext}`")]
    Unsupported { ext: String },

    #[error("selection not supported by {format} format")]
    Selection { format: &'static str },

    #[error("{kind} selection {index} out of bounds ({value} >= {max})")]
    Bounds {
        format: &'static str,
        kind: &'static str,
        index: usize,
        value: usize,
        max: usize,
    },

    #[error("failed to encode {format}: {message}")]
    Encode {
        format: &'static str,
        message: String,
    },

    #[error("failed to decode {format}: {message}")]
    Decode {
        format: &'static str,
        message: String,
    },

    #[error("{format} format is not implemented")]
    NotImplemented { format: &'static str },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn encode(format: &'static str, message: impl Into<String>) -> Self {
        Self::Encode {
            format,
            message: message.into(),
        }
    }

    pub fn decode(format: &'static str, message: impl Into<String>) -> Self {
        Self::Decode {
            format,
            message: message.into(),
        }
    }
}
