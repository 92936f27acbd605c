//! Developer CLI for `SessionKit`.
//!
//! Runs the reuse checks and the app sign-in against a wallet configuration kept
//! in a local JSON file, with key material supplied on the command line.

pub mod commands;
pub mod file_service;

use std::path::PathBuf;

/// Default location of the wallet configuration file (`<data dir>/sessionkit/wallet-config.json`).
#[must_use]
pub fn default_config_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sessionkit")
        .join("wallet-config.json")
}
