//! Error types for rbxfs-cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from rbxfs-core
    #[error(transparent)]
    Core(#[from] rbxfs_core::Error),

    /// Error from rbxfs-fs
    #[error(transparent)]
    Fs(#[from] rbxfs_fs::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
