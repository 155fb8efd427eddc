//! Persistence of the finalized configuration.
//!
//! # Architecture
//!
//! - **Codec**: typed [`Configuration`](crate::types::Configuration) to and
//!   from the host's flat string settings. All string encoding lives here.
//! - **File store**: a [`SettingsStore`](crate::effects::SettingsStore)
//!   backed by a JSON file, written atomically.
//! - **Retry**: backoff policy applied when a save is not acknowledged.
//!
//! # Crash Safety
//!
//! Settings are written to a temp file, fsynced, renamed over the old file,
//! and the directory fsynced. The dialog is only closed after that succeeds.

pub mod codec;
pub mod file_store;
pub mod fsync;
pub mod retry;

pub use codec::{decode, encode};
pub use file_store::{JsonFileSettings, StoreError};
pub use retry::RetryConfig;
