//! Conversation history on top of a [`TransportSession`]

use crate::config::{ChatwireConfig, DefaultConfig};
use crate::error::{ChatError, ChatResult};
use crate::ledger::{UsageEntry, UsageLedger};
use crate::protocol::codec::{HistoryPolicy, RequestCodec, DEFAULT_TEMPERATURE};
use crate::protocol::types::{ConversationMessage, RequestOptions, ResponseRecord};
use crate::session::TransportSession;
use std::sync::Arc;
use tracing::debug;

/// Append-only chat history with a usage ledger.
///
/// The user message is appended before the request goes out, so the history
/// shows it whatever the outcome. The assistant reply is appended only when
/// the response completes.
#[derive(Debug)]
pub struct Conversation {
    session: Arc<TransportSession>,
    codec: RequestCodec,
    defaults: DefaultConfig,
    messages: Vec<ConversationMessage>,
    ledger: UsageLedger,
}

impl Conversation {
    /// Start an empty conversation over a session, using the fixed codec defaults
    pub fn new(session: Arc<TransportSession>) -> Self {
        Self {
            session,
            codec: RequestCodec::new(),
            defaults: DefaultConfig::default(),
            messages: Vec::new(),
            ledger: UsageLedger::new(),
        }
    }

    /// Start an empty conversation with the request defaults from `config`
    pub fn from_config(session: Arc<TransportSession>, config: &ChatwireConfig) -> Self {
        Self {
            codec: RequestCodec::with_defaults(
                config.defaults.max_tokens,
                config.defaults.temperature,
            ),
            defaults: config.defaults.clone(),
            ..Self::new(session)
        }
    }

    /// Options naming the default model and stream mode. Token and
    /// temperature limits are left to the codec fallbacks.
    pub fn default_options(&self) -> RequestOptions {
        RequestOptions::new(self.defaults.model.clone()).with_streaming(self.defaults.stream)
    }

    pub fn default_policy(&self) -> HistoryPolicy {
        self.defaults.history
    }

    /// Handle for cancelling the request in flight from elsewhere
    pub fn cancel_handle(&self) -> Arc<TransportSession> {
        Arc::clone(&self.session)
    }

    /// Seed the history, e.g. with a system prompt
    pub fn push(&mut self, message: ConversationMessage) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[ConversationMessage] {
        &self.messages
    }

    pub fn ledger(&self) -> &UsageLedger {
        &self.ledger
    }

    /// Drop the history. The ledger is kept.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Send a user message.
    ///
    /// Returns `Ok(None)` when the request was cancelled: cancellation is
    /// silent and leaves no assistant reply behind. An empty model in
    /// `options` is replaced by the default model.
    pub async fn send<S>(
        &mut self,
        user_text: impl Into<String>,
        options: &RequestOptions,
        policy: HistoryPolicy,
        sink: S,
    ) -> ChatResult<Option<ResponseRecord>>
    where
        S: FnMut(&str) + Send,
    {
        self.messages.push(ConversationMessage::user(user_text));

        let mut payload = self.codec.build(&self.messages, options, policy);
        if payload.options.model.is_empty() {
            payload.options.model = self.defaults.model.clone();
        }
        let temperature = payload.options.temperature.unwrap_or(DEFAULT_TEMPERATURE);

        match self.session.send(&payload, sink).await {
            Ok(record) => {
                self.messages
                    .push(ConversationMessage::assistant(record.message.clone()));
                self.ledger
                    .record(UsageEntry::from_record(&record, temperature));
                Ok(Some(record))
            }
            Err(ChatError::Cancelled) => {
                debug!("Conversation send cancelled");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Send a user message with the configured model, stream mode and
    /// history policy
    pub async fn send_with_defaults<S>(
        &mut self,
        user_text: impl Into<String>,
        sink: S,
    ) -> ChatResult<Option<ResponseRecord>>
    where
        S: FnMut(&str) + Send,
    {
        let options = self.default_options();
        let policy = self.default_policy();
        self.send(user_text, &options, policy, sink).await
    }
}
