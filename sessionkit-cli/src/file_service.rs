//! Wallet configuration kept in a local JSON file instead of a Gaia hub.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use sessionkit_core::{AppEntry, HubConfig, SessionKitError, WalletConfig, WalletConfigService};

/// A [`WalletConfigService`] backed by a `wallet-config.json` file.
///
/// Hub configuration is simulated: the returned [`HubConfig`] only records the hub URL.
#[derive(Debug, Clone)]
pub struct FileConfigService {
    path: PathBuf,
    identity_count: usize,
}

impl FileConfigService {
    /// Uses the file at `path` for a wallet with `identity_count` identities.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, identity_count: usize) -> Self {
        Self {
            path: path.into(),
            identity_count,
        }
    }

    /// The configuration file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Option<String>, SessionKitError> {
        read_optional(&self.path).map_err(|err| io_error(&self.path, &err))
    }

    fn write(&self, config: &WalletConfig) -> Result<(), SessionKitError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|err| io_error(parent, &err))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, config.to_json()?).map_err(|err| io_error(&tmp, &err))?;
        fs::rename(&tmp, &self.path).map_err(|err| io_error(&self.path, &err))
    }
}

impl WalletConfigService for FileConfigService {
    fn wallet_config(&self) -> Option<String> {
        match self.read() {
            Ok(contents) => contents,
            Err(err) => {
                tracing::warn!("{err}");
                None
            }
        }
    }

    fn create_hub_config(&self, hub_url: String) -> Result<HubConfig, SessionKitError> {
        Ok(HubConfig {
            address: String::new(),
            url_prefix: format!("{}/hub/", hub_url.trim_end_matches('/')),
            token: String::new(),
            server: hub_url,
        })
    }

    fn get_or_create_config(&self, _hub_config: HubConfig) -> Result<(), SessionKitError> {
        match self.read()? {
            Some(json) => WalletConfig::from_json(&json).map(|_| ()).map_err(|err| {
                SessionKitError::Generic {
                    error: format!("{} is not a wallet config: {err}", self.path.display()),
                }
            }),
            None => {
                tracing::info!(path = %self.path.display(), "creating wallet config");
                self.write(&WalletConfig::for_identities(self.identity_count))
            }
        }
    }

    fn update_config_with_auth(
        &self,
        identity_index: u32,
        _hub_config: HubConfig,
        app: AppEntry,
    ) -> Result<(), SessionKitError> {
        let json = self.read()?.ok_or_else(|| SessionKitError::Generic {
            error: format!("{} does not exist", self.path.display()),
        })?;
        let mut config = WalletConfig::from_json(&json)?;
        config.register_app(identity_index, app)?;
        self.write(&config)
    }
}

/// Reads the file at `path`, or `None` if it does not exist.
///
/// # Errors
/// Returns any I/O error other than `NotFound`.
pub fn read_optional(path: &Path) -> std::io::Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err),
    }
}

fn io_error(path: &Path, err: &std::io::Error) -> SessionKitError {
    SessionKitError::Generic {
        error: format!("{}: {err}", path.display()),
    }
}
