use serde_json::{Map, Value};

/// The Gaia hub used when the profile carries no `api.gaiaHubUrl` override.
pub const DEFAULT_GAIA_HUB_URL: &str = "https://hub.blockstack.org";

/// Prefix of decentralized identifiers derived from an identity address.
pub const DID_BTC_ADDR_PREFIX: &str = "did:btc-addr:";

/// Fields every profile starts from before the stored profile is applied.
const DEFAULT_PROFILE_FIELDS: [(&str, &str); 2] =
    [("@type", "Person"), ("@context", "http://schema.org")];

/// Returns the library-wide default profile (`{"@type": "Person", "@context": "http://schema.org"}`).
#[must_use]
pub fn default_profile() -> Map<String, Value> {
    DEFAULT_PROFILE_FIELDS
        .iter()
        .map(|(key, value)| ((*key).to_string(), Value::String((*value).to_string())))
        .collect()
}
