use thiserror::Error;

/// Error outputs from `SessionKit`
#[derive(Debug, Error, uniffi::Error)]
pub enum SessionKitError {
    /// The presented input is not valid for the requested operation
    #[error("invalid_input_{attribute}: {reason}")]
    InvalidInput {
        /// The attribute that is invalid
        attribute: String,
        /// The reason the input is invalid
        reason: String,
    },
    /// Unexpected error serializing or parsing information
    #[error("serialization_error: {error}")]
    SerializationError {
        /// The error message from the serialization
        error: String,
    },
    /// A step of the app registration with the wallet configuration failed.
    ///
    /// The sign-in flow is aborted and no session is stored.
    #[error("registration_failed at {step}: {reason}")]
    Registration {
        /// The registration step that failed (e.g. `create_hub_config`)
        step: String,
        /// The reason reported by the collaborator
        reason: String,
    },
    /// The session record could not be assembled.
    #[error("session_build_failed: {reason}")]
    SessionBuild {
        /// The reason the record could not be assembled
        reason: String,
    },
    /// Another sign-in is already running on the same gate.
    #[error("sign_in_in_progress")]
    SignInInProgress,
    /// Unexpected error from a foreign callback implementation.
    #[error("unexpected_callback_error: {reason}")]
    UnexpectedCallback {
        /// The reason reported by the binding layer
        reason: String,
    },
    /// A generic error that doesn't fit any other category.
    #[error("{error}")]
    Generic {
        /// The details of the error
        error: String,
    },
}

impl From<serde_json::Error> for SessionKitError {
    fn from(error: serde_json::Error) -> Self {
        Self::SerializationError {
            error: error.to_string(),
        }
    }
}

impl From<uniffi::UnexpectedUniFFICallbackError> for SessionKitError {
    fn from(error: uniffi::UnexpectedUniFFICallbackError) -> Self {
        Self::UnexpectedCallback {
            reason: error.reason,
        }
    }
}

impl SessionKitError {
    /// Wraps an error raised by a registration collaborator with the step it came from.
    pub(crate) fn registration(step: impl ToString, error: &Self) -> Self {
        Self::Registration {
            step: step.to_string(),
            reason: error.to_string(),
        }
    }

    /// Wraps an error raised while deriving or assembling the session record.
    pub(crate) fn session_build(error: &Self) -> Self {
        Self::SessionBuild {
            reason: error.to_string(),
        }
    }
}
