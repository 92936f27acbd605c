//! `SessionKit` is the app-side sign-in core for decentralized-identity wallets.
//!
//! It decides whether a wallet identity has been used with this or other
//! applications, registers the application with the wallet configuration once
//! per identity, and assembles the per-application session record.
//!
//! Key derivation, association-token signing and all network transport are
//! provided by the host through [`IdentityKeychain`] and [`WalletConfigService`].
#![deny(clippy::all, clippy::pedantic, clippy::nursery)]

mod app;
pub use app::*;

mod defaults;
pub use defaults::*;

mod error;
pub use error::*;

pub mod ffi;

/// Foreign logger bridge.
pub mod logger;

mod registration;
pub use registration::*;

pub mod reuse_policy;
pub use reuse_policy::{ReuseAdvisory, Verdict};

mod session;
pub use session::*;

mod session_store;
pub use session_store::*;

mod traits;
pub use traits::*;

mod wallet_config;
pub use wallet_config::*;

uniffi::setup_scaffolding!("sessionkit_core");
