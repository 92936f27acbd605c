//! JSON-based entry points for foreign bindings.
//!
//! Wallet configurations, identities and session records cross the binding
//! boundary as JSON text; these wrappers parse them and delegate to the Rust API.

use std::sync::Arc;

use crate::{
    app::AppConfig,
    error::SessionKitError,
    reuse_policy::{self, parse_wallet_config, ReuseAdvisory, Verdict},
    session::{build_session_record, AppIdentity, DerivedSession},
    traits::IdentityKeychain,
};

/// Whether the wallet configuration shows use with apps other than `app_origin`.
///
/// Invalid JSON yields `Verdict::Undetermined`.
#[uniffi::export]
#[allow(clippy::needless_pass_by_value)]
pub fn check_used_with_other_apps(
    wallet_config_json: Option<String>,
    app_origin: &str,
) -> Verdict {
    match parse_wallet_config(wallet_config_json.as_deref()) {
        Ok(document) => reuse_policy::evaluate_used_with_other_apps(document.as_ref(), app_origin),
        Err(verdict) => verdict,
    }
}

/// Whether the wallet configuration shows a registration with `app_origin`, for the
/// identity at `identity_index` or, when `None`, for any identity.
///
/// Invalid JSON yields `Verdict::Undetermined`.
#[uniffi::export]
#[allow(clippy::needless_pass_by_value)]
pub fn check_used_before(
    wallet_config_json: Option<String>,
    identity_index: Option<u32>,
    app_origin: &str,
) -> Verdict {
    match parse_wallet_config(wallet_config_json.as_deref()) {
        Ok(document) => {
            reuse_policy::evaluate_used_before(document.as_ref(), identity_index, app_origin)
        }
        Err(verdict) => verdict,
    }
}

/// Evaluates the restore-time reuse advisory for `app_origin`.
#[uniffi::export]
#[allow(clippy::needless_pass_by_value)]
pub fn evaluate_reuse_advisory(
    wallet_config_json: Option<String>,
    app_origin: &str,
) -> ReuseAdvisory {
    match parse_wallet_config(wallet_config_json.as_deref()) {
        Ok(document) => reuse_policy::reuse_advisory(document.as_ref(), app_origin),
        Err(verdict) => ReuseAdvisory {
            used_with_other_apps: verdict.clone(),
            used_before: verdict,
            warn: false,
        },
    }
}

/// Builds the session record for the identity given as JSON without touching the
/// wallet configuration, and returns it as JSON.
///
/// # Errors
/// - `SerializationError` if `identity_json` cannot be parsed.
/// - `SessionBuild` if the session values cannot be derived.
#[uniffi::export]
#[allow(clippy::needless_pass_by_value)]
pub fn build_session_json(
    identity_json: &str,
    app: AppConfig,
    keychain: Arc<dyn IdentityKeychain>,
) -> Result<String, SessionKitError> {
    let identity: AppIdentity = serde_json::from_str(identity_json)?;
    let derived = DerivedSession::derive(&identity, &app, keychain.as_ref())
        .map_err(|err| SessionKitError::session_build(&err))?;
    build_session_record(&identity, &derived).to_json()
}

#[cfg(test)]
mod tests {
    use super::*;

    const APP: &str = "https://brace.to";

    struct StaticKeychain;

    impl IdentityKeychain for StaticKeychain {
        fn app_private_key(&self, _app_origin: String) -> Result<String, SessionKitError> {
            Ok("ab".repeat(32))
        }

        fn gaia_association_token(
            &self,
            _app_private_key: String,
        ) -> Result<String, SessionKitError> {
            Ok("token".to_string())
        }
    }

    #[test]
    fn test_checks_accept_json() {
        let config = r#"{"identities":[{"apps":{"https://other.example":{}}}]}"#.to_string();
        assert_eq!(check_used_with_other_apps(Some(config.clone()), APP), Verdict::Yes);
        assert_eq!(check_used_before(Some(config.clone()), Some(0), APP), Verdict::No);
        assert!(evaluate_reuse_advisory(Some(config), APP).warn);
    }

    #[test]
    fn test_invalid_json_fails_open() {
        let advisory = evaluate_reuse_advisory(Some("][".to_string()), APP);
        assert!(!advisory.warn);
        assert!(!advisory.used_before.is_determined());
        assert!(!check_used_with_other_apps(Some("][".to_string()), APP).as_bool());
    }

    #[test]
    fn test_build_session_json() {
        let json = build_session_json(
            r#"{"address":"1abc","defaultUsername":"alice.id"}"#,
            AppConfig::new(APP, "Brace.to"),
            Arc::new(StaticKeychain),
        )
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["username"], "alice.id");
        assert_eq!(value["decentralizedID"], "did:btc-addr:1abc");
        assert_eq!(value["hubUrl"], "https://hub.blockstack.org");
    }

    #[test]
    fn test_build_session_json_rejects_bad_identity() {
        let err = build_session_json(
            "{}",
            AppConfig::new(APP, "Brace.to"),
            Arc::new(StaticKeychain),
        )
        .unwrap_err();
        assert!(matches!(err, SessionKitError::SerializationError { .. }));
    }
}
