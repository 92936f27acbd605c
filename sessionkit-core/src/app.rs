//! Identity of the application users sign in to.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::SessionKitError;

/// A permission the application requests from the wallet on sign-in.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumString,
    Display,
    Serialize,
    Deserialize,
    uniffi::Enum,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Read and write access to the app's own Gaia storage bucket.
    StoreWrite,
    /// Publish data so other users of the app can discover it.
    PublishData,
    /// Request the user's email address.
    Email,
}

/// The application configuration, supplied once at startup and treated as immutable.
///
/// The `app_origin` is the key under which the app is registered in every
/// identity of the wallet configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, uniffi::Record)]
pub struct AppConfig {
    /// The origin of the application, e.g. `https://brace.to`.
    pub app_origin: String,
    /// Human readable application name shown by the wallet.
    pub app_name: String,
    /// URL of the application icon.
    pub app_icon_url: String,
    /// Scopes requested on sign-in.
    pub scopes: Vec<Scope>,
}

impl AppConfig {
    /// Creates a configuration with the default icon (`<origin>/logo192.png`) and
    /// the `store_write` scope.
    #[must_use]
    pub fn new(app_origin: &str, app_name: &str) -> Self {
        let app_origin = app_origin.trim_end_matches('/').to_string();
        Self {
            app_icon_url: format!("{app_origin}/logo192.png"),
            app_origin,
            app_name: app_name.to_string(),
            scopes: vec![Scope::StoreWrite],
        }
    }

    /// Checks that the configuration can be used as a registration key.
    ///
    /// # Errors
    /// Returns `InvalidInput` if the origin is not an http(s) URL with a host,
    /// the name is empty, or no scope is requested.
    pub fn validate(&self) -> Result<(), SessionKitError> {
        let host = self
            .app_origin
            .strip_prefix("https://")
            .or_else(|| self.app_origin.strip_prefix("http://"))
            .and_then(|rest| rest.split(['/', '?', '#']).next())
            .map(str::trim);
        if host.is_none_or(str::is_empty) {
            return Err(SessionKitError::InvalidInput {
                attribute: "app_origin".to_string(),
                reason: "origin must be an http(s) URL with a host".to_string(),
            });
        }
        if self.app_name.trim().is_empty() {
            return Err(SessionKitError::InvalidInput {
                attribute: "app_name".to_string(),
                reason: "name must not be empty".to_string(),
            });
        }
        if self.scopes.is_empty() {
            return Err(SessionKitError::InvalidInput {
                attribute: "scopes".to_string(),
                reason: "at least one scope is required".to_string(),
            });
        }
        Ok(())
    }

    /// Scopes in their wire form (`store_write`, ...).
    #[must_use]
    pub fn scope_names(&self) -> Vec<String> {
        self.scopes.iter().map(ToString::to_string).collect()
    }
}
