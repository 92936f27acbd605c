//! Sign-in to the app: one-time registration with the wallet configuration, then
//! session assembly.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};
use std::time::{SystemTime, UNIX_EPOCH};

use strum::Display;

use crate::{
    app::AppConfig,
    defaults::DEFAULT_GAIA_HUB_URL,
    error::SessionKitError,
    reuse_policy::{evaluate_used_before, parse_wallet_config, Verdict},
    session::{build_session_record, AppIdentity, DerivedSession, SessionRecord},
    session_store::SessionStore,
    traits::{IdentityKeychain, WalletConfigService},
    wallet_config::AppEntry,
};

/// The collaborator call a registration failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, uniffi::Enum)]
#[strum(serialize_all = "snake_case")]
pub enum RegistrationStep {
    /// Creating the Gaia hub configuration.
    CreateHubConfig,
    /// Fetching or creating the wallet configuration.
    GetOrCreateConfig,
    /// Writing the app entry into the wallet configuration.
    UpdateConfigWithAuth,
}

/// Registration state of an (identity, app) pair after [`AppSignIn::ensure_registered`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum RegistrationState {
    /// The identity was already registered; the wallet configuration was not touched.
    AlreadyRegistered,
    /// The app entry was written by this call.
    NewlyRegistered,
}

/// Signs identities in to one application.
///
/// Registration writes happen at most once per (identity, app) pair. Only one
/// sign-in runs at a time on a given `AppSignIn`; a concurrent call fails with
/// [`SessionKitError::SignInInProgress`].
#[derive(uniffi::Object)]
pub struct AppSignIn {
    app: AppConfig,
    config_service: Arc<dyn WalletConfigService>,
    store: Arc<SessionStore>,
    in_flight: Mutex<()>,
}

impl fmt::Debug for AppSignIn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppSignIn")
            .field("app", &self.app)
            .finish_non_exhaustive()
    }
}

#[uniffi::export]
impl AppSignIn {
    /// Creates the sign-in flow for `app`, storing sessions into `store`.
    ///
    /// # Errors
    /// Returns `InvalidInput` if the app configuration is invalid.
    #[uniffi::constructor]
    pub fn new(
        app: AppConfig,
        config_service: Arc<dyn WalletConfigService>,
        store: Arc<SessionStore>,
    ) -> Result<Self, SessionKitError> {
        app.validate()?;
        Ok(Self {
            app,
            config_service,
            store,
            in_flight: Mutex::new(()),
        })
    }

    /// Registers the app with the identity at `identity_index` unless it already is.
    ///
    /// `now_ms` overrides the sign-in time recorded in the app entry.
    ///
    /// # Errors
    /// - `SignInInProgress` if another sign-in is running.
    /// - `Registration` if any collaborator call fails.
    pub fn ensure_registered(
        &self,
        identity_index: u32,
        now_ms: Option<u64>,
    ) -> Result<RegistrationState, SessionKitError> {
        let _guard = self.begin()?;
        self.register(identity_index, now_ms)
    }

    /// Signs in the identity given as JSON (`address`, `defaultUsername`, `profile`)
    /// and returns the session record as JSON.
    ///
    /// # Errors
    /// See [`AppSignIn::sign_in`]; additionally `SerializationError` if
    /// `identity_json` cannot be parsed.
    pub fn sign_in_json(
        &self,
        identity_index: u32,
        identity_json: &str,
        keychain: Arc<dyn IdentityKeychain>,
        now_ms: Option<u64>,
    ) -> Result<String, SessionKitError> {
        let identity: AppIdentity = serde_json::from_str(identity_json)?;
        self.sign_in(identity_index, &identity, keychain.as_ref(), now_ms)?
            .to_json()
    }
}

impl AppSignIn {
    /// The application this flow signs in to.
    #[must_use]
    pub const fn app(&self) -> &AppConfig {
        &self.app
    }

    /// Signs `identity` in: registers the app if needed, derives the session values,
    /// builds the record and stores it.
    ///
    /// Nothing is stored unless every step succeeds.
    ///
    /// # Errors
    /// - `SignInInProgress` if another sign-in is running.
    /// - `Registration` if registering the app fails.
    /// - `SessionBuild` if the session values cannot be derived.
    pub fn sign_in(
        &self,
        identity_index: u32,
        identity: &AppIdentity,
        keychain: &dyn IdentityKeychain,
        now_ms: Option<u64>,
    ) -> Result<SessionRecord, SessionKitError> {
        let _guard = self.begin()?;
        let result = self.sign_in_locked(identity_index, identity, keychain, now_ms);
        if let Err(err) = &result {
            log::error!("sign-in to {} aborted: {err}", self.app.app_origin);
        }
        result
    }

    fn sign_in_locked(
        &self,
        identity_index: u32,
        identity: &AppIdentity,
        keychain: &dyn IdentityKeychain,
        now_ms: Option<u64>,
    ) -> Result<SessionRecord, SessionKitError> {
        self.register(identity_index, now_ms)?;

        let derived = DerivedSession::derive(identity, &self.app, keychain)
            .map_err(|err| SessionKitError::session_build(&err))?;
        let record = build_session_record(identity, &derived);

        self.store.set(record.clone());
        log::debug!(
            "identity {identity_index} signed in to {}",
            self.app.app_origin
        );
        Ok(record)
    }

    fn register(
        &self,
        identity_index: u32,
        now_ms: Option<u64>,
    ) -> Result<RegistrationState, SessionKitError> {
        let origin = &self.app.app_origin;
        let verdict = match parse_wallet_config(self.config_service.wallet_config().as_deref())
        {
            Ok(document) => evaluate_used_before(document.as_ref(), Some(identity_index), origin),
            Err(verdict) => verdict,
        };

        match verdict {
            Verdict::Yes => {
                log::debug!("identity {identity_index} already registered with {origin}");
                return Ok(RegistrationState::AlreadyRegistered);
            }
            Verdict::Undetermined { reason } => {
                log::debug!("registering identity {identity_index} with {origin}: {reason}");
            }
            Verdict::No => {}
        }

        let entry = AppEntry::new(&self.app, unix_millis(now_ms)?);

        let hub_config = self
            .config_service
            .create_hub_config(DEFAULT_GAIA_HUB_URL.to_string())
            .map_err(|err| SessionKitError::registration(RegistrationStep::CreateHubConfig, &err))?;
        self.config_service
            .get_or_create_config(hub_config.clone())
            .map_err(|err| {
                SessionKitError::registration(RegistrationStep::GetOrCreateConfig, &err)
            })?;
        self.config_service
            .update_config_with_auth(identity_index, hub_config, entry)
            .map_err(|err| {
                SessionKitError::registration(RegistrationStep::UpdateConfigWithAuth, &err)
            })?;

        log::debug!("identity {identity_index} registered with {origin}");
        Ok(RegistrationState::NewlyRegistered)
    }

    fn begin(&self) -> Result<MutexGuard<'_, ()>, SessionKitError> {
        match self.in_flight.try_lock() {
            Ok(guard) => Ok(guard),
            Err(TryLockError::Poisoned(poisoned)) => Ok(poisoned.into_inner()),
            Err(TryLockError::WouldBlock) => Err(SessionKitError::SignInInProgress),
        }
    }
}

fn unix_millis(now_ms: Option<u64>) -> Result<u64, SessionKitError> {
    if let Some(now_ms) = now_ms {
        return Ok(now_ms);
    }
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|err| SessionKitError::Generic {
            error: format!("Critical. Unable to determine SystemTime: {err}"),
        })?;
    u64::try_from(elapsed.as_millis()).map_err(|err| SessionKitError::Generic {
        error: format!("system time out of range: {err}"),
    })
}
