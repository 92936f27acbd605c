//! Typed model of the wallet configuration (`wallet-config.json`) kept in the user's Gaia hub.
//!
//! The reuse-policy predicates read the configuration as an untrusted JSON
//! document (see [`crate::reuse_policy`]); this typed model is what gets written
//! back when an app registration is recorded. Entries of other apps and fields the
//! model does not know are carried through untouched.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{app::AppConfig, error::SessionKitError};

/// A completed registration of one identity with one application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, uniffi::Record)]
#[serde(rename_all = "camelCase")]
pub struct AppEntry {
    /// Origin of the registered application.
    pub origin: String,
    /// Scopes granted to the application.
    pub scopes: Vec<String>,
    /// Last sign-in time, in milliseconds since the Unix epoch.
    pub last_login_at: u64,
    /// Application icon URL.
    pub app_icon: String,
    /// Application name.
    pub name: String,
}

impl AppEntry {
    /// Builds the entry written for `app` at sign-in time `last_login_at` (ms).
    #[must_use]
    pub fn new(app: &AppConfig, last_login_at: u64) -> Self {
        Self {
            origin: app.app_origin.clone(),
            scopes: app.scope_names(),
            last_login_at,
            app_icon: app.app_icon_url.clone(),
            name: app.app_name.clone(),
        }
    }
}

/// One identity of the wallet together with the apps it was used with.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConfigIdentity {
    /// Registered username, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Registered apps, keyed by application origin. Entries are kept as written
    /// by whichever wallet registered them.
    #[serde(default)]
    pub apps: BTreeMap<String, Value>,
    /// Fields not covered by the model.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ConfigIdentity {
    /// Returns the entry registered for `origin`, if it has the [`AppEntry`] shape.
    #[must_use]
    pub fn app(&self, origin: &str) -> Option<AppEntry> {
        self.apps
            .get(origin)
            .and_then(|entry| AppEntry::deserialize(entry).ok())
    }
}

/// The wallet configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletConfig {
    /// Identities in wallet order; the index is the identity index used by the wallet.
    #[serde(default)]
    pub identities: Vec<ConfigIdentity>,
    /// When set, the user opted out of the identity reuse warning.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hide_warning_for_reusing_identity: Option<bool>,
    /// Fields not covered by the model.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WalletConfig {
    /// Creates an empty configuration for a wallet with `identity_count` identities.
    #[must_use]
    pub fn for_identities(identity_count: usize) -> Self {
        Self {
            identities: vec![ConfigIdentity::default(); identity_count],
            hide_warning_for_reusing_identity: None,
            extra: Map::new(),
        }
    }

    /// Parses a configuration from its JSON form.
    ///
    /// # Errors
    /// Returns `SerializationError` if the document does not match the model.
    pub fn from_json(json: &str) -> Result<Self, SessionKitError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes the configuration to the JSON form stored in the hub.
    ///
    /// # Errors
    /// Returns `SerializationError` if serialization fails.
    pub fn to_json(&self) -> Result<String, SessionKitError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Returns the configuration as an untrusted document for the reuse-policy predicates.
    ///
    /// # Errors
    /// Returns `SerializationError` if serialization fails.
    pub fn to_document(&self) -> Result<Value, SessionKitError> {
        Ok(serde_json::to_value(self)?)
    }

    /// Records `app` under the identity at `identity_index`, replacing an older entry
    /// for the same origin. Every other entry is left as is.
    ///
    /// # Errors
    /// - `InvalidInput` if no identity exists at `identity_index`.
    /// - `SerializationError` if the entry cannot be serialized.
    pub fn register_app(
        &mut self,
        identity_index: u32,
        app: AppEntry,
    ) -> Result<(), SessionKitError> {
        let identity = usize::try_from(identity_index)
            .ok()
            .and_then(|index| self.identities.get_mut(index))
            .ok_or_else(|| SessionKitError::InvalidInput {
                attribute: "identity_index".to_string(),
                reason: format!("no identity at index {identity_index}"),
            })?;
        identity
            .apps
            .insert(app.origin.clone(), serde_json::to_value(&app)?);
        Ok(())
    }
}
