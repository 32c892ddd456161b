//! Chat session state: message history, draft, busy flag, error banner,
//! theme and expanded sources.
//!
//! All mutation happens on the event loop that owns the session. The only
//! asynchronous step (the API call) happens outside: [`ChatSession::submit`]
//! hands out a [`PendingQuery`] and the caller feeds the outcome back through
//! [`ChatSession::complete`].

use std::collections::HashSet;

use uuid::Uuid;

use crate::client::ClientError;
use crate::clipboard::ClipboardSink;
use crate::messages::{ChatResponse, Source};
use crate::prefs::PrefStore;
use crate::theme::Theme;

pub const WELCOME_TEXT: &str = "Ask me anything about phone reviews.\n\nExamples:\n• Galaxy S24 battery issues?\n• Best phone under $500 for battery?\n• iPhone 15 camera complaints?";

pub const NO_ANSWER_TEXT: &str = "No answer returned.";

pub const COPY_FAILED_TEXT: &str = "Copy failed (clipboard unavailable).";

const REQUEST_FAILED_TEXT: &str = "Request failed";

pub const SUGGESTED_PROMPTS: [&str; 5] = [
    "Galaxy S24 battery issues?",
    "Best phone under $500 for battery life",
    "Common camera complaints for iPhone 15",
    "Is the Pixel 8 overheating? What do reviews say?",
    "Best value phone with good performance",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId(Uuid);

impl MessageId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// One entry of the chat. Never mutated after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub timestamp: String,
    pub text: String,
    pub sources: Vec<Source>,
}

impl Message {
    fn new(role: Role, text: impl Into<String>, sources: Vec<Source>) -> Self {
        Self {
            id: MessageId::new(),
            role,
            timestamp: now_time(),
            text: text.into(),
            sources,
        }
    }

    fn welcome() -> Self {
        Self::new(Role::Assistant, WELCOME_TEXT, Vec::new())
    }

    /// Only assistant messages with at least one source get a sources toggle.
    pub fn has_sources(&self) -> bool {
        self.role == Role::Assistant && !self.sources.is_empty()
    }
}

/// Local `HH:MM`.
pub fn now_time() -> String {
    chrono::Local::now().format("%H:%M").to_string()
}

/// A submitted query waiting for its API response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingQuery {
    pub query: String,
    epoch: u64,
}

#[derive(Debug)]
pub struct ChatSession {
    messages: Vec<Message>,
    draft: String,
    busy: bool,
    error: Option<String>,
    theme: Theme,
    expanded: HashSet<MessageId>,
    suggested: Vec<String>,
    prefs: Option<PrefStore>,
    epoch: u64,
}

impl ChatSession {
    /// Session without durable preferences.
    pub fn new(theme: Theme) -> Self {
        Self {
            messages: vec![Message::welcome()],
            draft: String::new(),
            busy: false,
            error: None,
            theme,
            expanded: HashSet::new(),
            suggested: SUGGESTED_PROMPTS.iter().map(|p| p.to_string()).collect(),
            prefs: None,
            epoch: 0,
        }
    }

    /// Session whose theme is read from, and written back to, `prefs`.
    pub fn with_prefs(prefs: PrefStore) -> Self {
        let theme = Theme::load(&prefs);
        let mut session = Self::new(theme);
        session.prefs = Some(prefs);
        session
    }

    /// Replace the suggested prompts. An empty list keeps the defaults.
    pub fn with_suggested_prompts(mut self, prompts: Vec<String>) -> Self {
        if !prompts.is_empty() {
            self.suggested = prompts;
        }
        self
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn message(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn suggested_prompts(&self) -> &[String] {
        &self.suggested
    }

    pub fn can_send(&self) -> bool {
        !self.busy && !self.draft.trim().is_empty()
    }

    /// Copy suggested prompt `index` into the draft. Disabled while busy.
    pub fn insert_prompt(&mut self, index: usize) -> bool {
        if self.busy {
            return false;
        }
        match self.suggested.get(index) {
            Some(prompt) => {
                self.draft = prompt.clone();
                true
            }
            None => false,
        }
    }

    /// Send the current draft. The draft is cleared only when sent.
    pub fn submit(&mut self) -> Option<PendingQuery> {
        if !self.can_send() {
            return None;
        }
        let text = std::mem::take(&mut self.draft);
        self.submit_text(&text)
    }

    /// Append the user message and mark the session busy. Blank input and
    /// input while busy are ignored.
    pub fn submit_text(&mut self, text: &str) -> Option<PendingQuery> {
        let clean = text.trim();
        if clean.is_empty() || self.busy {
            tracing::debug!(busy = self.busy, "submission ignored");
            return None;
        }
        self.error = None;
        self.messages.push(Message::new(Role::User, clean, Vec::new()));
        self.busy = true;
        Some(PendingQuery {
            query: clean.to_string(),
            epoch: self.epoch,
        })
    }

    /// Apply the outcome of `pending`. Returns `false` when the query belongs
    /// to a chat that has since been reset; nothing changes in that case.
    pub fn complete(
        &mut self,
        pending: PendingQuery,
        result: Result<ChatResponse, ClientError>,
    ) -> bool {
        if pending.epoch != self.epoch {
            tracing::debug!(query = %pending.query, "dropping response for a reset chat");
            return false;
        }
        match result {
            Ok(response) => {
                let text = if response.answer.is_empty() {
                    NO_ANSWER_TEXT.to_string()
                } else {
                    response.answer
                };
                self.messages.push(Message::new(Role::Assistant, text, response.sources));
            }
            Err(e) => {
                let message = e.to_string();
                tracing::warn!(error = %message, "chat request failed");
                self.error = Some(if message.is_empty() {
                    REQUEST_FAILED_TEXT.to_string()
                } else {
                    message
                });
            }
        }
        self.busy = false;
        true
    }

    /// Start a new chat: welcome message only, no draft, error or busy state.
    pub fn reset(&mut self) {
        self.messages = vec![Message::welcome()];
        self.draft.clear();
        self.error = None;
        self.busy = false;
        self.expanded.clear();
        self.epoch += 1;
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.theme = self.theme.toggled();
        if let Some(prefs) = &self.prefs {
            self.theme.persist(prefs);
        }
        self.theme
    }

    /// Flip the sources panel of message `id`. Returns the new expanded state.
    pub fn toggle_sources(&mut self, id: MessageId) -> bool {
        if !self.message(id).is_some_and(Message::has_sources) {
            return false;
        }
        if self.expanded.remove(&id) {
            false
        } else {
            self.expanded.insert(id);
            true
        }
    }

    pub fn is_expanded(&self, id: MessageId) -> bool {
        self.expanded.contains(&id)
    }

    /// Copy the text of message `id`. A clipboard failure sets a non-fatal
    /// error instead of propagating.
    pub fn copy_message(&mut self, id: MessageId, clipboard: &mut dyn ClipboardSink) -> bool {
        let Some(text) = self.message(id).map(|m| m.text.clone()) else {
            return false;
        };
        match clipboard.write_text(&text) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "copy failed");
                self.error = Some(COPY_FAILED_TEXT.to_string());
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::ClipboardError;
    use crate::messages::SourceMetadata;

    #[derive(Default)]
    struct MemoryClipboard {
        contents: Option<String>,
        fail: bool,
    }

    impl ClipboardSink for MemoryClipboard {
        fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
            if self.fail {
                return Err(ClipboardError("no display".into()));
            }
            self.contents = Some(text.to_string());
            Ok(())
        }
    }

    fn answer(text: &str, sources: usize) -> ChatResponse {
        ChatResponse {
            answer: text.into(),
            sources: (0..sources)
                .map(|i| Source {
                    snippet: format!("snippet {i}"),
                    metadata: SourceMetadata::default(),
                })
                .collect(),
        }
    }

    fn status_error() -> ClientError {
        ClientError::Status {
            status: 500,
            body: "boom".into(),
        }
    }

    #[test]
    fn starts_with_single_welcome_message() {
        let session = ChatSession::new(Theme::Dark);
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.messages()[0].role, Role::Assistant);
        assert_eq!(session.messages()[0].text, WELCOME_TEXT);
        assert!(!session.is_busy());
    }

    #[test]
    fn successful_round_adds_two_messages() {
        let mut session = ChatSession::new(Theme::Dark);
        session.set_draft("  Galaxy S24 battery?  ");
        let pending = session.submit().expect("should send");
        assert_eq!(pending.query, "Galaxy S24 battery?");
        assert_eq!(session.messages().len(), 2);
        assert_eq!(session.messages()[1].role, Role::User);
        assert_eq!(session.messages()[1].text, "Galaxy S24 battery?");
        assert!(session.is_busy());
        assert_eq!(session.draft(), "");

        assert!(session.complete(pending, Ok(answer("X", 0))));
        assert_eq!(session.messages().len(), 3);
        let last = session.messages().last().unwrap();
        assert_eq!(last.text, "X");
        assert!(!last.has_sources());
        assert!(!session.is_busy());
    }

    #[test]
    fn blank_input_is_noop() {
        let mut session = ChatSession::new(Theme::Dark);
        session.set_draft(" \n\t ");
        assert!(session.submit().is_none());
        assert!(session.submit_text("   ").is_none());
        assert_eq!(session.messages().len(), 1);
        assert!(!session.is_busy());
    }

    #[test]
    fn rejects_submission_while_busy() {
        let mut session = ChatSession::new(Theme::Dark);
        let first = session.submit_text("first").unwrap();
        assert!(session.submit_text("second").is_none());
        session.set_draft("third");
        assert!(!session.can_send());
        assert!(session.submit().is_none());
        assert_eq!(session.draft(), "third");
        assert_eq!(session.messages().len(), 2);

        session.complete(first, Ok(answer("a", 0)));
        assert!(session.submit().is_some());
    }

    #[test]
    fn failure_sets_error_without_assistant_message() {
        let mut session = ChatSession::new(Theme::Dark);
        let pending = session.submit_text("q").unwrap();
        session.complete(pending, Err(status_error()));
        assert_eq!(session.messages().len(), 2);
        assert_eq!(session.error(), Some("API error 500: boom"));
        assert!(!session.is_busy());

        // Retrying clears the banner.
        session.submit_text("q again").unwrap();
        assert_eq!(session.error(), None);
    }

    #[test]
    fn empty_answer_uses_placeholder() {
        let mut session = ChatSession::new(Theme::Dark);
        let pending = session.submit_text("q").unwrap();
        session.complete(pending, Ok(answer("", 0)));
        assert_eq!(session.messages().last().unwrap().text, NO_ANSWER_TEXT);
    }

    #[test]
    fn reset_restores_welcome_and_clears_state() {
        let mut session = ChatSession::new(Theme::Dark);
        let pending = session.submit_text("q").unwrap();
        session.complete(pending, Err(status_error()));
        session.submit_text("again").unwrap();
        session.set_draft("half typed");

        session.reset();
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.messages()[0].text, WELCOME_TEXT);
        assert_eq!(session.error(), None);
        assert!(!session.is_busy());
        assert_eq!(session.draft(), "");
    }

    #[test]
    fn response_after_reset_is_discarded() {
        let mut session = ChatSession::new(Theme::Dark);
        let stale = session.submit_text("old").unwrap();
        session.reset();
        let fresh = session.submit_text("new").unwrap();

        assert!(!session.complete(stale, Ok(answer("old answer", 0))));
        assert!(session.is_busy());
        assert_eq!(session.messages().len(), 2);

        assert!(session.complete(fresh, Ok(answer("new answer", 0))));
        assert_eq!(session.messages().last().unwrap().text, "new answer");
    }

    #[test]
    fn message_ids_are_unique() {
        let mut session = ChatSession::new(Theme::Dark);
        for i in 0..5 {
            let p = session.submit_text(&format!("q{i}")).unwrap();
            session.complete(p, Ok(answer("a", 1)));
        }
        let ids: HashSet<_> = session.messages().iter().map(|m| m.id).collect();
        assert_eq!(ids.len(), session.messages().len());
    }

    #[test]
    fn sources_toggle_only_for_assistant_with_sources() {
        let mut session = ChatSession::new(Theme::Dark);
        let p = session.submit_text("q").unwrap();
        session.complete(p, Ok(answer("a", 2)));

        let user_id = session.messages()[1].id;
        let bot_id = session.messages()[2].id;
        let welcome_id = session.messages()[0].id;

        assert!(!session.toggle_sources(user_id));
        assert!(!session.toggle_sources(welcome_id));
        assert!(session.toggle_sources(bot_id));
        assert!(session.is_expanded(bot_id));
        assert!(!session.toggle_sources(bot_id));
        assert!(!session.is_expanded(bot_id));

        session.toggle_sources(bot_id);
        session.reset();
        assert!(!session.is_expanded(bot_id));
    }

    #[test]
    fn insert_prompt_fills_draft_unless_busy() {
        let mut session = ChatSession::new(Theme::Dark);
        assert!(session.insert_prompt(1));
        assert_eq!(session.draft(), SUGGESTED_PROMPTS[1]);
        assert!(!session.insert_prompt(99));

        session.submit().unwrap();
        assert!(!session.insert_prompt(0));
        assert_eq!(session.draft(), "");
    }

    #[test]
    fn custom_suggested_prompts() {
        let session = ChatSession::new(Theme::Dark).with_suggested_prompts(vec!["one".into()]);
        assert_eq!(session.suggested_prompts(), ["one".to_string()]);
        let session = ChatSession::new(Theme::Dark).with_suggested_prompts(Vec::new());
        assert_eq!(session.suggested_prompts().len(), SUGGESTED_PROMPTS.len());
    }

    #[test]
    fn copy_writes_text_or_sets_error() {
        let mut session = ChatSession::new(Theme::Dark);
        let id = session.messages()[0].id;

        let mut ok = MemoryClipboard::default();
        assert!(session.copy_message(id, &mut ok));
        assert_eq!(ok.contents.as_deref(), Some(WELCOME_TEXT));
        assert_eq!(session.error(), None);

        let mut blocked = MemoryClipboard {
            fail: true,
            ..Default::default()
        };
        assert!(!session.copy_message(id, &mut blocked));
        assert_eq!(session.error(), Some(COPY_FAILED_TEXT));
    }

    #[test]
    fn theme_toggle_persists_through_prefs() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = PrefStore::open(dir.path().join("prefs.yaml"));
        prefs.set("theme", "light");

        let mut session = ChatSession::with_prefs(prefs.clone());
        assert_eq!(session.theme(), Theme::Light);
        assert_eq!(session.toggle_theme(), Theme::Dark);
        assert_eq!(prefs.get("theme").as_deref(), Some("dark"));
        assert_eq!(session.toggle_theme(), Theme::Light);
        assert_eq!(prefs.get("theme").as_deref(), Some("light"));
    }
}
