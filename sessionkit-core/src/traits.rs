//! Host interfaces for the wallet SDK collaborators the sign-in flow depends on.
//!
//! Network transport, wallet-configuration storage and key derivation all live
//! behind these traits; they are implemented by the host (or by foreign code
//! through `UniFFI`).

use serde::{Deserialize, Serialize};

use crate::{error::SessionKitError, wallet_config::AppEntry};

/// Connection details for a Gaia storage hub, as produced by the wallet SDK.
///
/// Opaque to the sign-in flow: it is only handed back to the collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, uniffi::Record)]
#[serde(rename_all = "camelCase")]
pub struct HubConfig {
    /// Address of the key that authenticates with the hub.
    pub address: String,
    /// URL prefix under which hub files are readable.
    pub url_prefix: String,
    /// Authorization token for hub writes.
    pub token: String,
    /// Hub server URL.
    pub server: String,
}

/// Access to the wallet configuration of the signed-in wallet.
#[uniffi::export(with_foreign)]
pub trait WalletConfigService: Send + Sync {
    /// Returns the wallet configuration currently known to the wallet as JSON, if any.
    ///
    /// The document is treated as untrusted: it may be partial or malformed.
    fn wallet_config(&self) -> Option<String>;

    /// Creates the hub configuration for the wallet on the hub at `hub_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the hub cannot be reached or refuses the wallet key.
    fn create_hub_config(&self, hub_url: String) -> Result<HubConfig, SessionKitError>;

    /// Fetches the wallet configuration from the hub, creating an empty one if missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be fetched or created.
    fn get_or_create_config(&self, hub_config: HubConfig) -> Result<(), SessionKitError>;

    /// Writes `app` under the identity at `identity_index` and uploads the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the identity does not exist or the upload fails.
    fn update_config_with_auth(
        &self,
        identity_index: u32,
        hub_config: HubConfig,
        app: AppEntry,
    ) -> Result<(), SessionKitError>;
}

/// Signing material of the identity that signs in.
#[uniffi::export(with_foreign)]
pub trait IdentityKeychain: Send + Sync {
    /// Derives the identity's private key for the app at `app_origin`, hex encoded.
    ///
    /// # Errors
    ///
    /// Returns an error if the key cannot be derived.
    fn app_private_key(&self, app_origin: String) -> Result<String, SessionKitError>;

    /// Signs the Gaia association token binding the public key of `app_private_key`
    /// to the identity key.
    ///
    /// The implementation owns `app_private_key` and should wipe it once signed.
    ///
    /// # Errors
    ///
    /// Returns an error if signing fails.
    fn gaia_association_token(
        &self,
        app_private_key: String,
    ) -> Result<String, SessionKitError>;
}
