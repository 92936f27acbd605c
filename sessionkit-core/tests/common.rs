//! Common test utilities shared across integration tests.

#![allow(dead_code, missing_docs)]

use std::sync::Mutex;

use sessionkit_core::{
    AppEntry, HubConfig, IdentityKeychain, RegistrationStep, SessionKitError,
    WalletConfig, WalletConfigService,
};

pub const APP_ORIGIN: &str = "https://brace.to";
pub const APP_PRIVATE_KEY: &str =
    "a5c61c6ca7b3e7e55edee68566aeab22e4da26baa285c7bd10e8d2218aa3b229";

/// Wallet configuration service keeping the hub document in memory.
///
/// Records every collaborator call and can be told to fail at one step.
pub struct InMemoryConfigService {
    document: Mutex<Option<String>>,
    identity_count: usize,
    calls: Mutex<Vec<RegistrationStep>>,
    fail_at: Option<RegistrationStep>,
}

impl InMemoryConfigService {
    /// A wallet with `identity_count` identities and no configuration yet.
    pub fn new(identity_count: usize) -> Self {
        Self {
            document: Mutex::new(None),
            identity_count,
            calls: Mutex::new(Vec::new()),
            fail_at: None,
        }
    }

    /// A wallet whose configuration is `document`, verbatim.
    pub fn with_document(identity_count: usize, document: &str) -> Self {
        let service = Self::new(identity_count);
        *service.document.lock().unwrap() = Some(document.to_string());
        service
    }

    /// Makes the collaborator call at `step` fail.
    pub fn failing_at(mut self, step: RegistrationStep) -> Self {
        self.fail_at = Some(step);
        self
    }

    pub fn calls(&self) -> Vec<RegistrationStep> {
        self.calls.lock().unwrap().clone()
    }

    pub fn update_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|step| **step == RegistrationStep::UpdateConfigWithAuth)
            .count()
    }

    /// The hub document, verbatim.
    pub fn document(&self) -> Option<String> {
        self.document.lock().unwrap().clone()
    }

    pub fn config(&self) -> Option<WalletConfig> {
        self.document
            .lock()
            .unwrap()
            .as_deref()
            .and_then(|json| WalletConfig::from_json(json).ok())
    }

    fn record(&self, step: RegistrationStep) -> Result<(), SessionKitError> {
        self.calls.lock().unwrap().push(step);
        if self.fail_at == Some(step) {
            return Err(SessionKitError::Generic {
                error: "hub unreachable".to_string(),
            });
        }
        Ok(())
    }
}

impl WalletConfigService for InMemoryConfigService {
    fn wallet_config(&self) -> Option<String> {
        self.document.lock().unwrap().clone()
    }

    fn create_hub_config(&self, hub_url: String) -> Result<HubConfig, SessionKitError> {
        self.record(RegistrationStep::CreateHubConfig)?;
        Ok(HubConfig {
            address: "1JeTQ5cQjsD57YGcsVFhwT7iuQUXJR6BSk".to_string(),
            url_prefix: "https://gaia.blockstack.org/hub/".to_string(),
            token: "v1:token".to_string(),
            server: hub_url,
        })
    }

    fn get_or_create_config(&self, _hub_config: HubConfig) -> Result<(), SessionKitError> {
        self.record(RegistrationStep::GetOrCreateConfig)?;
        let mut document = self.document.lock().unwrap();
        match document.as_deref() {
            Some(json) => WalletConfig::from_json(json).map(|_| ()),
            None => {
                let config = WalletConfig::for_identities(self.identity_count);
                *document = Some(config.to_json()?);
                Ok(())
            }
        }
    }

    fn update_config_with_auth(
        &self,
        identity_index: u32,
        _hub_config: HubConfig,
        app: AppEntry,
    ) -> Result<(), SessionKitError> {
        self.record(RegistrationStep::UpdateConfigWithAuth)?;
        let mut config = self.config().ok_or_else(|| SessionKitError::Generic {
            error: "wallet config missing".to_string(),
        })?;
        config.register_app(identity_index, app)?;
        *self.document.lock().unwrap() = Some(config.to_json()?);
        Ok(())
    }
}

/// Keychain returning a fixed app key and a token derived from it.
pub struct FixedKeychain;

impl IdentityKeychain for FixedKeychain {
    fn app_private_key(&self, _app_origin: String) -> Result<String, SessionKitError> {
        Ok(APP_PRIVATE_KEY.to_string())
    }

    fn gaia_association_token(
        &self,
        app_private_key: String,
    ) -> Result<String, SessionKitError> {
        Ok(format!("association:{}", &app_private_key[..16]))
    }
}

/// Keychain whose signer is unavailable.
pub struct FailingKeychain;

impl IdentityKeychain for FailingKeychain {
    fn app_private_key(&self, _app_origin: String) -> Result<String, SessionKitError> {
        Ok(APP_PRIVATE_KEY.to_string())
    }

    fn gaia_association_token(
        &self,
        _app_private_key: String,
    ) -> Result<String, SessionKitError> {
        Err(SessionKitError::Generic {
            error: "signer unavailable".to_string(),
        })
    }
}
