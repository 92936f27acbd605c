//! Implementation of the CLI subcommands.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use eyre::{Result, WrapErr};
use sessionkit_core::{
    build_session_record, ffi, AppConfig, AppIdentity, AppSignIn, DerivedSession,
    IdentityKeychain, ReuseAdvisory, SessionKitError, SessionRecord, SessionStore, Verdict,
};

use crate::file_service::{read_optional, FileConfigService};

/// Keychain returning key material supplied on the command line.
#[derive(Clone)]
pub struct StaticKeychain {
    app_private_key: String,
    association_token: String,
}

impl StaticKeychain {
    /// Uses `app_private_key` for every app and `association_token` as the signed token.
    #[must_use]
    pub const fn new(app_private_key: String, association_token: String) -> Self {
        Self {
            app_private_key,
            association_token,
        }
    }
}

impl std::fmt::Debug for StaticKeychain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticKeychain").finish_non_exhaustive()
    }
}

impl IdentityKeychain for StaticKeychain {
    fn app_private_key(&self, _app_origin: String) -> Result<String, SessionKitError> {
        Ok(self.app_private_key.clone())
    }

    fn gaia_association_token(
        &self,
        _app_private_key: String,
    ) -> Result<String, SessionKitError> {
        Ok(self.association_token.clone())
    }
}

/// Evaluates the reuse advisory for the wallet configuration at `config`.
///
/// A missing or unparseable file is evaluated as the fail-open policy dictates.
///
/// # Errors
/// Returns an error if the file exists but cannot be read.
pub fn check_reuse(config: &Path, app: &AppConfig) -> Result<ReuseAdvisory> {
    let document = read_document(config)?;
    Ok(ffi::evaluate_reuse_advisory(document, &app.app_origin))
}

/// Checks whether the app is registered with the identity at `identity_index`, or
/// with any identity when `None`.
///
/// # Errors
/// Returns an error if the file exists but cannot be read.
pub fn used_before(config: &Path, identity_index: Option<u32>, app: &AppConfig) -> Result<Verdict> {
    let document = read_document(config)?;
    Ok(ffi::check_used_before(document, identity_index, &app.app_origin))
}

/// Builds the session record for the identity in `identity` without registering.
///
/// # Errors
/// Returns an error if the identity cannot be read or the session values cannot be derived.
pub fn build_session(
    identity: &Path,
    app: &AppConfig,
    keychain: &StaticKeychain,
) -> Result<SessionRecord> {
    let identity = read_identity(identity)?;
    let derived = DerivedSession::derive(&identity, app, keychain)?;
    Ok(build_session_record(&identity, &derived))
}

/// Arguments of [`sign_in`].
#[derive(Debug)]
pub struct SignInArgs<'a> {
    /// Wallet configuration file, created when missing.
    pub config: &'a Path,
    /// Number of identities in the wallet.
    pub identity_count: usize,
    /// Identity to sign in with.
    pub identity_index: u32,
    /// Identity JSON file.
    pub identity: &'a Path,
    /// Where to write the session record, if anywhere.
    pub session_out: Option<&'a Path>,
}

/// Registers the app with the identity if needed and builds its session record.
///
/// # Errors
/// Returns an error if any step of the sign-in fails or the session cannot be written.
pub fn sign_in(
    args: &SignInArgs<'_>,
    app: AppConfig,
    keychain: &StaticKeychain,
) -> Result<SessionRecord> {
    let identity = read_identity(args.identity)?;
    let service = Arc::new(FileConfigService::new(args.config, args.identity_count));
    let store = Arc::new(SessionStore::new());
    let gate = AppSignIn::new(app, service, store.clone())?;

    let record = gate.sign_in(args.identity_index, &identity, keychain, None)?;
    tracing::info!(
        origin = %gate.app().app_origin,
        identity_index = args.identity_index,
        "signed in"
    );

    if let Some(out) = args.session_out {
        let json = store
            .session_json()?
            .ok_or_else(|| eyre::eyre!("session store is empty after sign-in"))?;
        fs::write(out, json).wrap_err_with(|| format!("writing {}", out.display()))?;
    }
    Ok(record)
}

fn read_document(path: &Path) -> Result<Option<String>> {
    let document =
        read_optional(path).wrap_err_with(|| format!("reading {}", path.display()))?;
    if document.is_none() {
        tracing::debug!(path = %path.display(), "no wallet config");
    }
    Ok(document)
}

fn read_identity(path: &Path) -> Result<AppIdentity> {
    let contents =
        fs::read_to_string(path).wrap_err_with(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&contents).wrap_err_with(|| format!("parsing {}", path.display()))
}
