use solace_core::error::SolaceError;

/// User-facing message when the host has no speech recognition.
pub const UNSUPPORTED_MESSAGE: &str = "Voice input is not supported on this device.";

/// User-facing message when microphone access was refused.
pub const PERMISSION_DENIED_MESSAGE: &str = "Microphone permission was denied.";

/// User-facing message for any other recognition failure.
pub const GENERIC_ERROR_MESSAGE: &str = "Voice input error. Try again.";

/// Errors returned by the voice controllers.
#[derive(Debug, thiserror::Error)]
pub enum VoiceError {
    #[error("voice input is already listening")]
    AlreadyListening,

    #[error("voice input is not listening")]
    NotListening,

    #[error("voice capability unavailable: {0}")]
    Unavailable(String),

    #[error("speech capability error: {0}")]
    Capability(String),
}

impl From<VoiceError> for SolaceError {
    fn from(err: VoiceError) -> Self {
        SolaceError::Voice(err.to_string())
    }
}

/// Typed reason carried by a recognition error event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoiceErrorReason {
    /// The user or platform refused microphone access.
    PermissionDenied,
    GenericError,
}

impl VoiceErrorReason {
    /// Classify a host error code such as `"not-allowed"`.
    pub fn from_code(code: &str) -> Self {
        match code {
            "not-allowed" | "service-not-allowed" | "permission-denied" => {
                VoiceErrorReason::PermissionDenied
            }
            _ => VoiceErrorReason::GenericError,
        }
    }

    /// Guidance shown to the user for this reason.
    pub fn user_message(&self) -> &'static str {
        match self {
            VoiceErrorReason::PermissionDenied => PERMISSION_DENIED_MESSAGE,
            VoiceErrorReason::GenericError => GENERIC_ERROR_MESSAGE,
        }
    }
}

impl std::fmt::Display for VoiceErrorReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VoiceErrorReason::PermissionDenied => write!(f, "permission-denied"),
            VoiceErrorReason::GenericError => write!(f, "generic-error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voice_error_display() {
        assert_eq!(
            VoiceError::AlreadyListening.to_string(),
            "voice input is already listening"
        );
        assert_eq!(
            VoiceError::Unavailable("no recognizer".to_string()).to_string(),
            "voice capability unavailable: no recognizer"
        );
    }

    #[test]
    fn test_voice_error_into_solace_error() {
        let err: SolaceError = VoiceError::Capability("no device".to_string()).into();
        assert!(matches!(err, SolaceError::Voice(msg) if msg.contains("no device")));
    }

    #[test]
    fn test_reason_from_code() {
        assert_eq!(
            VoiceErrorReason::from_code("not-allowed"),
            VoiceErrorReason::PermissionDenied
        );
        assert_eq!(
            VoiceErrorReason::from_code("service-not-allowed"),
            VoiceErrorReason::PermissionDenied
        );
        assert_eq!(
            VoiceErrorReason::from_code("network"),
            VoiceErrorReason::GenericError
        );
        assert_eq!(VoiceErrorReason::from_code(""), VoiceErrorReason::GenericError);
    }

    #[test]
    fn test_reason_messages_are_distinct() {
        assert_eq!(
            VoiceErrorReason::PermissionDenied.user_message(),
            "Microphone permission was denied."
        );
        assert_eq!(
            VoiceErrorReason::GenericError.user_message(),
            "Voice input error. Try again."
        );
        assert_eq!(VoiceErrorReason::PermissionDenied.to_string(), "permission-denied");
    }
}
