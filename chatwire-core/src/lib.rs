//! Chatwire Core Library
//!
//! A client for a chat-completion HTTP service. The centre of the crate is the
//! streaming response consumer: it turns an arbitrarily chunked byte stream
//! into ordered text increments and one final [`ResponseRecord`], tolerating
//! split or fused frames, mixed payload shapes, malformed payloads and
//! mid-flight cancellation.
//!
//! ```no_run
//! use chatwire_core::{ChatwireConfig, ConversationMessage, HistoryPolicy, RequestCodec,
//!     RequestOptions, TransportSession};
//!
//! # async fn run() -> Result<(), chatwire_core::ChatError> {
//! let session = TransportSession::from_config(&ChatwireConfig::from_env())?;
//! let history = vec![ConversationMessage::user("Hello")];
//! let payload = RequestCodec::new().build(
//!     &history,
//!     &RequestOptions::new("gpt-4").with_streaming(true),
//!     HistoryPolicy::Full,
//! );
//! let record = session.send(&payload, |text| print!("{text}")).await?;
//! println!("\n[{}]", record.model);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod conversation;
pub mod error;
pub mod http;
pub mod ledger;
pub mod protocol;
pub mod session;
pub mod stream;

pub use config::{load_from_json, load_from_yaml, ChatwireConfig, ConfigError};
pub use conversation::Conversation;
pub use error::{ChatError, ChatResult};
pub use http::{HttpClient, HttpTransport};
pub use ledger::{UsageEntry, UsageLedger};
pub use protocol::{
    ChatRequestPayload, ConversationMessage, FinishReason, HistoryPolicy, RequestCodec,
    RequestOptions, ResponseRecord, Role,
};
pub use session::TransportSession;
pub use stream::AttemptState;

/// Returns the version of the Chatwire Core library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
