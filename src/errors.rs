//! Each module owns a `thiserror` enum for its own failure modes
//! (`resp::ReaderError`, `storage::StorageError`, `command::CommandError`,
//! `config::ConfigError`); this module just re-exports the `anyhow` types
//! used to collect them at the process boundary in `main`.

pub use anyhow::{Context, Result};
