use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::conversation_state::ConversationState;
use super::persona::{EMPTY_REPLY_TEXT, SYSTEM_PROMPT, TECHNICAL_DIFFICULTY_TEXT};
use crate::pollinations_client::{ChatApi, ChatApiError, ChatRequest, WireMessage};

/// Trailing history entries sent with each request: ten prior turns plus the
/// message just typed.
pub const CONTEXT_WINDOW: usize = 11;

pub const TEMPERATURE: f64 = 1.0;

/// Owns one chat session and talks to the chat endpoint on its behalf.
///
/// Observers get whole [`ConversationState`] snapshots through
/// [`ConversationController::subscribe`]. Each send publishes two updates:
/// the user message with the typing flag raised, then the reply with the
/// typing flag lowered.
pub struct ConversationController {
    api: Box<dyn ChatApi>,
    model: String,
    state: watch::Sender<ConversationState>,
}

impl ConversationController {
    pub fn new(api: Box<dyn ChatApi>, model: &str) -> Self {
        let (state, _) = watch::channel(ConversationState::new());
        Self {
            api,
            model: model.to_string(),
            state,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ConversationState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> ConversationState {
        self.state.borrow().clone()
    }

    /// Sends `text` and records the reply. Blank input is ignored.
    ///
    /// Failures never escape: they become an in-character reply plus a
    /// `last_error` the caller can show or dismiss.
    pub async fn send_message(&mut self, text: &str) {
        if text.trim().is_empty() {
            return;
        }

        self.state.send_modify(|state| {
            state.add_user_message(text);
            state.is_typing = true;
            state.last_error = None;
        });

        let request = self.build_request();
        debug!("Sending {} messages to the chat API", request.messages.len());
        let pending = PendingReply { state: &self.state, settled: false };
        let outcome = self.api.chat(&request).await;
        pending.settle(outcome);
    }

    pub fn reset_conversation(&mut self) {
        info!("Resetting conversation");
        self.state.send_modify(ConversationState::reset);
    }

    pub fn dismiss_error(&mut self) {
        self.state.send_modify(|state| state.last_error = None);
    }

    /// The persona prompt followed by the tail of the history.
    pub fn build_request(&self) -> ChatRequest {
        let state = self.state.borrow();

        let mut messages = Vec::with_capacity(CONTEXT_WINDOW + 1);
        messages.push(WireMessage::new("system", SYSTEM_PROMPT));
        messages.extend(
            state
                .recent(CONTEXT_WINDOW)
                .iter()
                .map(|message| WireMessage::new(message.role(), &message.text)),
        );

        ChatRequest {
            model: self.model.clone(),
            messages,
            temperature: TEMPERATURE,
            stream: false,
            is_private: false,
        }
    }
}

/// Completes the turn opened by `send_message`. If the send future is
/// dropped before the reply arrives, the turn is closed as a failure.
struct PendingReply<'a> {
    state: &'a watch::Sender<ConversationState>,
    settled: bool,
}

impl PendingReply<'_> {
    fn settle(mut self, outcome: Result<Option<String>, ChatApiError>) {
        self.settled = true;
        self.state.send_modify(|state| {
            match outcome {
                Ok(Some(reply)) => state.add_assistant_message(&reply),
                Ok(None) => {
                    warn!("Chat API returned no usable content");
                    state.add_assistant_message(EMPTY_REPLY_TEXT);
                }
                Err(e) => {
                    warn!("Chat request failed: {}", e);
                    state.last_error = Some(e.user_message());
                    state.add_assistant_message(TECHNICAL_DIFFICULTY_TEXT);
                }
            }
            state.is_typing = false;
        });
    }
}

impl Drop for PendingReply<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let err = ChatApiError::Other("request cancelled".to_string());
        warn!("Chat request dropped before completion");
        self.state.send_modify(|state| {
            state.last_error = Some(err.user_message());
            state.add_assistant_message(TECHNICAL_DIFFICULTY_TEXT);
            state.is_typing = false;
        });
    }
}
