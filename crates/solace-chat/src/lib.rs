//! Conversational core for Solace.
//!
//! Message exchange with the remote reply service, mood inference, session
//! summaries with a local fallback, and printable HTML export.

pub mod error;
pub mod exchange;
pub mod export;
pub mod mood;
pub mod service;
pub mod summary;

pub use error::ChatError;
pub use exchange::{ExchangeOutcome, MessageExchange, CRISIS_ADVISORY, FALLBACK_REPLY};
pub use export::{ExportDocument, ExportFormatter};
pub use mood::infer as infer_mood;
pub use service::{
    HttpReplyService, ReplyPayload, ReplyService, ServiceError, SummaryMessage, SummaryPayload,
};
pub use summary::{SessionStats, SessionSummaryText, SummaryGenerator, SummarySource};
