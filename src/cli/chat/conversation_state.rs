use chrono::Utc;

use super::persona::GREETING_TEXT;

/// A single line of the conversation, either typed by the user or spoken by
/// the sage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub text: String,
    pub is_user: bool,
    /// Creation time in epoch milliseconds.
    pub timestamp: i64,
}

impl ChatMessage {
    pub fn user(text: &str) -> Self {
        Self::new(text, true)
    }

    pub fn assistant(text: &str) -> Self {
        Self::new(text, false)
    }

    fn new(text: &str, is_user: bool) -> Self {
        Self {
            text: text.to_string(),
            is_user,
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    /// Role tag used on the wire.
    pub fn role(&self) -> &'static str {
        if self.is_user {
            "user"
        } else {
            "assistant"
        }
    }
}

/// Snapshot of a chat session.
///
/// `history` always starts with the greeting and only grows, except through
/// [`ConversationState::reset`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationState {
    history: Vec<ChatMessage>,
    pub is_typing: bool,
    pub last_error: Option<String>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self {
            history: vec![ChatMessage::assistant(GREETING_TEXT)],
            is_typing: false,
            last_error: None,
        }
    }

    pub fn add_user_message(&mut self, message: &str) {
        self.history.push(ChatMessage::user(message));
    }

    pub fn add_assistant_message(&mut self, message: &str) {
        self.history.push(ChatMessage::assistant(message));
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// The trailing `n` messages, or the whole history if it is shorter.
    pub fn recent(&self, n: usize) -> &[ChatMessage] {
        let start = self.history.len().saturating_sub(n);
        &self.history[start..]
    }

    /// Back to the lone greeting, with any error cleared.
    pub fn reset(&mut self) {
        self.history.clear();
        self.history.push(ChatMessage::assistant(GREETING_TEXT));
        self.last_error = None;
    }
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_greeting_only() {
        let state = ConversationState::new();
        assert_eq!(state.history().len(), 1);
        assert_eq!(state.history()[0].text, GREETING_TEXT);
        assert!(!state.history()[0].is_user);
        assert!(!state.is_typing);
        assert!(state.last_error.is_none());
    }

    #[test]
    fn recent_takes_the_tail() {
        let mut state = ConversationState::new();
        for i in 0..20 {
            state.add_user_message(&format!("question {i}"));
        }

        let tail = state.recent(11);
        assert_eq!(tail.len(), 11);
        assert_eq!(tail[0].text, "question 9");
        assert_eq!(tail[10].text, "question 19");

        assert_eq!(ConversationState::new().recent(11).len(), 1);
    }

    #[test]
    fn reset_restores_greeting_and_clears_error() {
        let mut state = ConversationState::new();
        state.add_user_message("Hello");
        state.add_assistant_message("Greetings");
        state.last_error = Some("Request timed out. Please try again.".to_string());

        state.reset();

        assert_eq!(state.history().len(), 1);
        assert_eq!(state.history()[0].text, GREETING_TEXT);
        assert!(state.last_error.is_none());
    }

    #[test]
    fn roles_follow_author() {
        assert_eq!(ChatMessage::user("a").role(), "user");
        assert_eq!(ChatMessage::assistant("b").role(), "assistant");
    }
}
