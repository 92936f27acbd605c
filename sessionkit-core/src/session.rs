//! Assembly of the per-application session record (`userData`).

use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use zeroize::{Zeroize, Zeroizing};

use crate::{
    app::AppConfig,
    defaults::{default_profile, DEFAULT_GAIA_HUB_URL, DID_BTC_ADDR_PREFIX},
    error::SessionKitError,
    traits::IdentityKeychain,
};

/// Profile key under which the Stacks address is exposed to the app.
pub const STX_ADDRESS_KEY: &str = "stxAddress";

/// Hex digits of a secp256k1 private key without the compression suffix.
const APP_PRIVATE_KEY_HEX_LEN: usize = 64;

/// The identity signing in, as provided by the wallet.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppIdentity {
    /// The identity address.
    pub address: String,
    /// The identity's default username, if one is registered.
    #[serde(default)]
    pub default_username: Option<String>,
    /// The identity's stored profile, if one was fetched.
    #[serde(default)]
    pub profile: Option<Map<String, Value>>,
}

/// Values derived for the session outside of the record itself.
pub struct DerivedSession {
    /// Hub the app stores its files on.
    pub hub_url: String,
    /// Decentralized identifier of the identity.
    pub decentralized_id: String,
    /// Identity private key for this app.
    pub app_private_key: SecretString,
    /// Token binding the app public key to the identity key.
    pub gaia_association_token: String,
}

impl fmt::Debug for DerivedSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedSession")
            .field("hub_url", &self.hub_url)
            .field("decentralized_id", &self.decentralized_id)
            .field("gaia_association_token", &self.gaia_association_token)
            .finish_non_exhaustive()
    }
}

impl DerivedSession {
    /// Derives the session values for `identity` signing in to `app`.
    ///
    /// The app private key and the association token come from `keychain`.
    ///
    /// # Errors
    /// - `InvalidInput` if the identity has no address or the keychain returns a key
    ///   that is not hex encoded.
    /// - Any error raised by the keychain.
    pub fn derive(
        identity: &AppIdentity,
        app: &AppConfig,
        keychain: &dyn IdentityKeychain,
    ) -> Result<Self, SessionKitError> {
        if identity.address.trim().is_empty() {
            return Err(SessionKitError::InvalidInput {
                attribute: "address".to_string(),
                reason: "identity address is empty".to_string(),
            });
        }

        let raw_key = Zeroizing::new(keychain.app_private_key(app.app_origin.clone())?);
        validate_app_private_key(&raw_key)?;

        // The keychain owns the copy it is handed; `raw_key` is wiped on return.
        let gaia_association_token = keychain.gaia_association_token(String::clone(&raw_key))?;
        let app_private_key = SecretString::from(raw_key.as_str());

        Ok(Self {
            hub_url: resolve_hub_url(identity.profile.as_ref()),
            decentralized_id: make_did_from_address(&identity.address),
            app_private_key,
            gaia_association_token,
        })
    }
}

/// The canonical session record handed to the session store.
///
/// Every key is serialized, including the legacy fields which are always `null`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    /// Username of the identity, empty when none is registered.
    pub username: String,
    /// Profile merged with the default profile.
    pub profile: Map<String, Value>,
    /// Email address. Never requested by this flow.
    pub email: Option<String>,
    /// Decentralized identifier of the identity.
    #[serde(rename = "decentralizedID")]
    pub decentralized_id: String,
    /// Address of the identity.
    pub identity_address: String,
    /// Identity private key for this app, hex encoded.
    pub app_private_key: String,
    /// Legacy Blockstack Core session token.
    pub core_session_token: Option<String>,
    /// Legacy authentication response token.
    pub auth_response_token: Option<String>,
    /// Gaia hub the app stores its files on.
    pub hub_url: String,
    /// Legacy Blockstack Core node.
    pub core_node: Option<String>,
    /// Token binding the app key to the identity key for hub writes.
    pub gaia_association_token: String,
}

impl SessionRecord {
    /// Serializes the record in its `userData` JSON form.
    ///
    /// # Errors
    /// Returns `SerializationError` if serialization fails.
    pub fn to_json(&self) -> Result<String, SessionKitError> {
        Ok(serde_json::to_string(self)?)
    }
}

impl fmt::Debug for SessionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionRecord")
            .field("username", &self.username)
            .field("decentralized_id", &self.decentralized_id)
            .field("identity_address", &self.identity_address)
            .field("app_private_key", &"<redacted>")
            .field("hub_url", &self.hub_url)
            .finish_non_exhaustive()
    }
}

impl Drop for SessionRecord {
    fn drop(&mut self) {
        self.app_private_key.zeroize();
    }
}

/// Builds the session record from the identity and its derived values.
///
/// The profile is merged as described in [`merge_profile`] with an empty `stxAddress`.
/// The record's copy of the app private key is wiped when the record is dropped.
#[must_use]
pub fn build_session_record(identity: &AppIdentity, derived: &DerivedSession) -> SessionRecord {
    SessionRecord {
        username: identity.default_username.clone().unwrap_or_default(),
        profile: merge_profile(identity.profile.as_ref(), ""),
        email: None,
        decentralized_id: derived.decentralized_id.clone(),
        identity_address: identity.address.clone(),
        app_private_key: derived.app_private_key.expose_secret().to_string(),
        core_session_token: None,
        auth_response_token: None,
        hub_url: derived.hub_url.clone(),
        core_node: None,
        gaia_association_token: derived.gaia_association_token.clone(),
    }
}

/// Merges the stored profile over the default profile, then sets the computed fields.
///
/// Precedence, lowest first:
/// 1. the default profile (`@type`, `@context`)
/// 2. fields of the stored profile
/// 3. `stxAddress`, always set to `stx_address`
#[must_use]
pub fn merge_profile(stored: Option<&Map<String, Value>>, stx_address: &str) -> Map<String, Value> {
    let mut profile = default_profile();
    if let Some(stored) = stored {
        profile.extend(stored.iter().map(|(key, value)| (key.clone(), value.clone())));
    }
    profile.insert(
        STX_ADDRESS_KEY.to_string(),
        Value::String(stx_address.to_string()),
    );
    profile
}

/// Returns the hub URL set in the profile under `api.gaiaHubUrl`, falling back to
/// [`DEFAULT_GAIA_HUB_URL`].
#[must_use]
pub fn resolve_hub_url(profile: Option<&Map<String, Value>>) -> String {
    profile
        .and_then(|profile| profile.get("api"))
        .and_then(Value::as_object)
        .and_then(|api| api.get("gaiaHubUrl"))
        .and_then(Value::as_str)
        .filter(|url| !url.trim().is_empty())
        .unwrap_or(DEFAULT_GAIA_HUB_URL)
        .to_string()
}

/// Returns the decentralized identifier of an identity address (`did:btc-addr:<address>`).
#[must_use]
pub fn make_did_from_address(address: &str) -> String {
    format!("{DID_BTC_ADDR_PREFIX}{address}")
}

fn validate_app_private_key(key: &str) -> Result<(), SessionKitError> {
    let invalid = |reason: &str| SessionKitError::InvalidInput {
        attribute: "app_private_key".to_string(),
        reason: reason.to_string(),
    };
    if key.len() < APP_PRIVATE_KEY_HEX_LEN {
        return Err(invalid("key is shorter than 32 bytes"));
    }
    let decoded = hex::decode(key).map_err(|_| invalid("key is not hex encoded"))?;
    drop(Zeroizing::new(decoded));
    Ok(())
}
