//! Filesystem layer for rbxfs
//!
//! Repository discovery, relative path handling for planned actions, and
//! safe I/O primitives. Everything above this crate reasons about paths as
//! forward-slash segment lists; platform-native paths appear only at I/O
//! boundaries.

pub mod constants;
pub mod error;
pub mod io;
pub mod layout;
pub mod path;

pub use constants::RepoFile;
pub use error::{Error, Result};
pub use path::RelPath;
