//! Error types for the chat layer.

use solace_core::error::SolaceError;
use solace_storage::StoreError;

/// Errors a caller of the chat layer can observe.
///
/// Communication failures with the reply service never appear here; they are
/// absorbed into fallback content.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("a message is already being sent")]
    SendInFlight,
    #[error("session not found: {0}")]
    SessionNotFound(uuid::Uuid),
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<StoreError> for ChatError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => ChatError::SessionNotFound(id.0),
            other => ChatError::Storage(other.to_string()),
        }
    }
}

impl From<SolaceError> for ChatError {
    fn from(err: SolaceError) -> Self {
        ChatError::Storage(err.to_string())
    }
}

impl From<ChatError> for SolaceError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::Storage(msg) => SolaceError::Storage(msg),
            other => SolaceError::Chat(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solace_core::types::SessionId;

    #[test]
    fn test_chat_error_display() {
        assert_eq!(ChatError::EmptyMessage.to_string(), "message cannot be empty");
        assert_eq!(
            ChatError::SendInFlight.to_string(),
            "a message is already being sent"
        );

        let id = uuid::Uuid::new_v4();
        assert_eq!(
            ChatError::SessionNotFound(id).to_string(),
            format!("session not found: {}", id)
        );

        assert_eq!(
            ChatError::Storage("disk full".to_string()).to_string(),
            "storage error: disk full"
        );
    }

    #[test]
    fn test_chat_error_from_store_error() {
        let id = SessionId::new();
        let err: ChatError = StoreError::NotFound(id).into();
        assert!(matches!(err, ChatError::SessionNotFound(u) if u == id.0));

        let err: ChatError = StoreError::Backend("locked".to_string()).into();
        match err {
            ChatError::Storage(msg) => assert!(msg.contains("locked")),
            _ => panic!("Expected Storage variant"),
        }
    }

    #[test]
    fn test_chat_error_from_solace_error() {
        let err: ChatError = SolaceError::Storage("connection lost".to_string()).into();
        match err {
            ChatError::Storage(msg) => assert!(msg.contains("connection lost")),
            _ => panic!("Expected Storage variant"),
        }
    }

    #[test]
    fn test_chat_error_into_solace_error() {
        let err: SolaceError = ChatError::EmptyMessage.into();
        assert_eq!(err.to_string(), "Chat error: message cannot be empty");

        let err: SolaceError = ChatError::SendInFlight.into();
        assert!(matches!(err, SolaceError::Chat(_)));

        let err: SolaceError = ChatError::SessionNotFound(uuid::Uuid::new_v4()).into();
        assert!(matches!(err, SolaceError::Chat(msg) if msg.starts_with("session not found")));

        let err: SolaceError = ChatError::Storage("disk full".to_string()).into();
        assert!(matches!(err, SolaceError::Storage(msg) if msg == "disk full"));
    }

    #[test]
    fn test_chat_error_is_debug() {
        let err = ChatError::SendInFlight;
        let debug = format!("{:?}", err);
        assert!(debug.contains("SendInFlight"));
    }
}
