//! Per-window session state and the request lifecycle.
//!
//! Handlers get a `&mut SessionState` (directly, or through a UI signal) instead of
//! reaching for ambient globals. The lifecycle replaces a bare `loading` flag so a
//! second submit can't start while a response is still arriving.

use crate::error::{EMPTY_INPUT_MESSAGE, FailureKind, QueryError};
use crate::types::{ChatMessage, HistoryEntry, ResponseMode, Role, ThemeMode};
use time::OffsetDateTime;
use tracing::warn;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RequestState {
    #[default]
    Idle,
    Sending,
    Streaming,
    Complete,
    Failed(FailureKind),
    Cancelled,
}

impl RequestState {
    pub fn is_busy(self) -> bool {
        matches!(self, RequestState::Sending | RequestState::Streaming)
    }

    fn can_become(self, next: RequestState) -> bool {
        use RequestState::*;
        match (self, next) {
            (Idle | Complete | Failed(_) | Cancelled, Sending) => true,
            (Sending, Streaming | Complete | Failed(_) | Cancelled) => true,
            (Streaming, Complete | Failed(_) | Cancelled) => true,
            _ => false,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SessionState {
    pub theme: ThemeMode,
    pub input: String,
    /// Body of the last one-shot answer.
    pub response: String,
    pub error: Option<String>,
    messages: Vec<ChatMessage>,
    history: Vec<HistoryEntry>,
    state: RequestState,
    mode: ResponseMode,
    expanded_history: Option<usize>,
    follow_output: bool,
    scroll_epoch: u64,
    copied: bool,
}

impl SessionState {
    pub fn new(theme: ThemeMode) -> Self {
        Self {
            theme,
            input: String::new(),
            response: String::new(),
            error: None,
            messages: Vec::new(),
            history: Vec::new(),
            state: RequestState::Idle,
            mode: ResponseMode::default(),
            expanded_history: None,
            follow_output: true,
            scroll_epoch: 0,
            copied: false,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    pub fn loading(&self) -> bool {
        self.state.is_busy()
    }

    pub fn expanded_history(&self) -> Option<usize> {
        self.expanded_history
    }

    pub fn follow_output(&self) -> bool {
        self.follow_output
    }

    /// Bumped every time new output should scroll the view to the bottom.
    pub fn scroll_epoch(&self) -> u64 {
        self.scroll_epoch
    }

    pub fn copied(&self) -> bool {
        self.copied
    }

    fn transition(&mut self, next: RequestState) -> bool {
        if self.state.can_become(next) {
            self.state = next;
            true
        } else {
            warn!(from = ?self.state, to = ?next, "ignored request state change");
            false
        }
    }

    /// Validate `text` and move into `Sending`. Returns the payload to send.
    pub fn begin_request(&mut self, text: &str, mode: ResponseMode) -> Result<String, QueryError> {
        if self.state.is_busy() {
            return Err(QueryError::Busy);
        }
        if text.trim().is_empty() {
            self.error = Some(EMPTY_INPUT_MESSAGE.to_string());
            return Err(QueryError::EmptyInput);
        }

        self.transition(RequestState::Sending);
        self.mode = mode;
        self.error = None;
        self.response.clear();
        self.follow_output = true;
        if mode == ResponseMode::Stream {
            self.messages.push(ChatMessage::user(text));
            self.input.clear();
            self.request_scroll();
        }
        Ok(text.to_string())
    }

    /// The body is open: add the assistant message the stream will fill.
    pub fn start_stream(&mut self) {
        if self.transition(RequestState::Streaming) {
            self.messages.push(ChatMessage::assistant(String::new()));
        }
    }

    /// Replace the in-progress assistant text. Returns whether the view should follow.
    pub fn publish(&mut self, text: &str) -> bool {
        if self.state != RequestState::Streaming {
            return false;
        }
        if let Some(last) = self.messages.last_mut() {
            if last.role == Role::Assistant {
                last.content.clear();
                last.content.push_str(text);
            }
        }
        if self.follow_output {
            self.request_scroll();
        }
        self.follow_output
    }

    pub fn finish_one_shot(&mut self, query: &str, response: &str) {
        if self.transition(RequestState::Complete) {
            self.response = response.to_string();
            self.history.insert(
                0,
                HistoryEntry {
                    query: query.to_string(),
                    response: response.to_string(),
                    created_at: OffsetDateTime::now_utc(),
                },
            );
            // entries shifted down by one
            self.expanded_history = self.expanded_history.map(|idx| idx + 1);
        }
    }

    pub fn finish_stream(&mut self) {
        self.transition(RequestState::Complete);
    }

    pub fn fail(&mut self, err: &QueryError) {
        self.error = Some(err.user_message(self.mode));
        match err.kind() {
            Some(kind) => {
                self.transition(RequestState::Failed(kind));
                self.drop_empty_assistant();
            }
            None if *err == QueryError::Cancelled => self.cancel(),
            None => {}
        }
    }

    /// Stop the in-flight request. Partial assistant text stays.
    pub fn cancel(&mut self) {
        if self.transition(RequestState::Cancelled) {
            self.drop_empty_assistant();
        }
    }

    fn drop_empty_assistant(&mut self) {
        let empty_tail = self
            .messages
            .last()
            .is_some_and(|msg| msg.role == Role::Assistant && msg.content.is_empty());
        if empty_tail {
            self.messages.pop();
        }
    }

    fn request_scroll(&mut self) {
        self.scroll_epoch = self.scroll_epoch.wrapping_add(1);
    }

    /// The user scrolled away from (false) or back to (true) the bottom.
    pub fn set_follow_output(&mut self, follow: bool) {
        self.follow_output = follow;
    }

    /// Expand `index`, or collapse it if it is already the expanded entry.
    pub fn toggle_history(&mut self, index: usize) {
        if index >= self.history.len() {
            return;
        }
        self.expanded_history = if self.expanded_history == Some(index) {
            None
        } else {
            Some(index)
        };
    }

    pub fn clear_conversation(&mut self) {
        if self.state.is_busy() {
            return;
        }
        self.messages.clear();
        self.error = None;
        self.state = RequestState::Idle;
    }

    pub fn mark_copied(&mut self) {
        self.copied = true;
    }

    pub fn clear_copied(&mut self) {
        self.copied = false;
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(ThemeMode::default())
    }
}
