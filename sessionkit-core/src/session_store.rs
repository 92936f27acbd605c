//! Session store handle shared by the host between sign-in and sign-out.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::{error::SessionKitError, session::SessionRecord};

/// Holds the session record of the signed-in user.
///
/// Created once at application start and passed explicitly to whoever needs the
/// session; cleared with [`SessionStore::sign_user_out`].
#[derive(Debug, Default, uniffi::Object)]
pub struct SessionStore {
    session: Mutex<Option<SessionRecord>>,
}

#[uniffi::export]
impl SessionStore {
    /// Creates an empty store.
    #[uniffi::constructor]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a session record is stored.
    pub fn is_user_signed_in(&self) -> bool {
        self.lock().is_some()
    }

    /// Returns the stored record in its `userData` JSON form.
    ///
    /// # Errors
    /// Returns `SerializationError` if the record cannot be serialized.
    pub fn session_json(&self) -> Result<Option<String>, SessionKitError> {
        self.lock().as_ref().map(SessionRecord::to_json).transpose()
    }

    /// Discards the stored record.
    pub fn sign_user_out(&self) {
        if self.lock().take().is_some() {
            log::debug!("session cleared");
        }
    }
}

impl SessionStore {
    /// Returns a copy of the stored record.
    #[must_use]
    pub fn get(&self) -> Option<SessionRecord> {
        self.lock().clone()
    }

    /// Replaces the stored record.
    pub fn set(&self, record: SessionRecord) {
        *self.lock() = Some(record);
    }

    fn lock(&self) -> MutexGuard<'_, Option<SessionRecord>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Map;

    use super::*;

    fn record() -> SessionRecord {
        SessionRecord {
            username: "alice.id".to_string(),
            profile: Map::new(),
            email: None,
            decentralized_id: "did:btc-addr:1abc".to_string(),
            identity_address: "1abc".to_string(),
            app_private_key: "00".repeat(32),
            core_session_token: None,
            auth_response_token: None,
            hub_url: "https://hub.blockstack.org".to_string(),
            core_node: None,
            gaia_association_token: "token".to_string(),
        }
    }

    #[test]
    fn test_lifecycle() {
        let store = SessionStore::new();
        assert!(!store.is_user_signed_in());
        assert_eq!(store.session_json().unwrap(), None);

        store.set(record());
        assert!(store.is_user_signed_in());
        assert_eq!(store.get().unwrap().username, "alice.id");
        let json = store.session_json().unwrap().unwrap();
        assert!(json.contains("\"decentralizedID\":\"did:btc-addr:1abc\""));

        store.sign_user_out();
        assert!(!store.is_user_signed_in());
        assert!(store.get().is_none());
    }
}
