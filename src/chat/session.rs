//! Turn orchestration
//!
//! `ChatSession` owns the in-memory conversation and drives one turn from
//! prompt to persisted reply: append the user message, append a pending
//! placeholder so the caller can render it immediately, persist the user
//! row, run the generation call against the pre-append history snapshot,
//! then resolve the placeholder in place under its original id and persist
//! the model row.
//!
//! Taking `&mut self` for a submission means a caller cannot start a second
//! turn while one is in flight on the same session; the resolve step is
//! still guarded by an id existence check so a result arriving after a
//! conversation reset is discarded instead of resurrecting a dead
//! placeholder.

use crate::attachment::Attachment;
use crate::chat::composer::compose;
use crate::chat::message::ChatMessage;
use crate::chat_mode::ChatMode;
use crate::error::Result;
use crate::providers::Provider;
use crate::storage::{SqliteStorage, StoredMessage};
use std::sync::Arc;

/// Reply text substituted when the generation call fails
fn failure_text(error: &anyhow::Error) -> String {
    format!("Sorry, something went wrong while generating a response: {}", error)
}

/// An interactive conversation bound to a provider and a history store
pub struct ChatSession {
    messages: Vec<ChatMessage>,
    provider: Arc<dyn Provider>,
    storage: Arc<SqliteStorage>,
    user_id: Option<String>,
}

impl ChatSession {
    /// Create a session with no authenticated user and an empty conversation
    pub fn new(provider: Arc<dyn Provider>, storage: Arc<SqliteStorage>) -> Self {
        Self {
            messages: Vec::new(),
            provider,
            storage,
            user_id: None,
        }
    }

    /// The current conversation, oldest first
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// The authenticated user, if any
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Bind or unbind the authenticated user
    ///
    /// Every auth transition resets the conversation wholesale; a new user
    /// never sees the previous user's in-memory turns.
    pub fn set_user(&mut self, user_id: Option<String>) {
        self.user_id = user_id;
        self.messages.clear();
    }

    /// Clear the conversation for a new chat
    pub fn reset(&mut self) {
        self.messages.clear();
    }

    /// Replace the conversation with a reconstructed thread
    ///
    /// The in-memory conversation is always swapped wholesale, never
    /// partially merged.
    pub fn load(&mut self, thread: Vec<ChatMessage>) {
        self.messages = thread;
    }

    /// Text of the most recent resolved model reply, for speech playback
    pub fn last_reply_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == crate::chat::message::Role::Model && !m.is_pending())
            .map(|m| m.text())
    }

    /// Submit one conversation turn
    ///
    /// A blank prompt with no attachment, or a session with no signed-in
    /// user, is a silent no-op. Generation failure never surfaces as an
    /// error; it becomes the reply text. Persistence failures are logged
    /// and not retried.
    ///
    /// # Arguments
    ///
    /// * `prompt` - The user's utterance
    /// * `mode` - Response mode for this turn
    /// * `attachment` - Optional attachment, consumed by the user message
    pub async fn submit_turn(
        &mut self,
        prompt: &str,
        mode: ChatMode,
        attachment: Option<Attachment>,
    ) -> Result<()> {
        let Some(user_id) = self.user_id.clone() else {
            tracing::debug!("Ignoring turn submission without a signed-in user");
            return Ok(());
        };
        if prompt.trim().is_empty() && attachment.is_none() {
            tracing::debug!("Ignoring empty turn submission");
            return Ok(());
        }

        // Composed against the history as it exists right now: the request
        // carries the new prompt as explicit current-turn input, never as
        // replayed history.
        let request = compose(&self.messages, prompt, mode, attachment.as_ref())?;

        let user_message = ChatMessage::user(prompt, attachment);
        let user_row = StoredMessage::user_row(&user_id, &user_message, mode);
        self.messages.push(user_message);

        let placeholder = ChatMessage::placeholder();
        let placeholder_id = placeholder.id.clone();
        self.messages.push(placeholder);

        if let Err(e) = self.storage.insert_message(&user_row) {
            tracing::warn!("Failed to persist user turn: {}", e);
        }

        let (text, sources) = match self.provider.generate(&request).await {
            Ok(generation) => (generation.text, generation.sources),
            Err(e) => {
                tracing::error!("Generation call failed: {}", e);
                (failure_text(&e), Vec::new())
            }
        };

        let Some(message) = self.messages.iter_mut().find(|m| m.id == placeholder_id) else {
            tracing::debug!(
                "Conversation changed while generating; discarding result for {}",
                placeholder_id
            );
            return Ok(());
        };
        message.resolve(text, sources);

        match StoredMessage::model_row(&user_id, message, mode) {
            Ok(model_row) => {
                if let Err(e) = self.storage.insert_message(&model_row) {
                    tracing::warn!("Failed to persist model turn: {}", e);
                }
            }
            Err(e) => tracing::warn!("Failed to encode model turn: {}", e),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::message::Role;
    use crate::error::TalviError;
    use crate::providers::{Generation, GenerationRequest, Source};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::tempdir;

    /// Provider that returns a fixed reply and records every request
    struct ScriptedProvider {
        reply: std::result::Result<Generation, String>,
        requests: Mutex<Vec<GenerationRequest>>,
    }

    impl ScriptedProvider {
        fn replying(text: &str, sources: Vec<Source>) -> Self {
            Self {
                reply: Ok(Generation::with_sources(text, sources)),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                reply: Err(message.to_string()),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Provider for ScriptedProvider {
        async fn generate(&self, request: &GenerationRequest) -> crate::error::Result<Generation> {
            self.requests.lock().unwrap().push(request.clone());
            match &self.reply {
                Ok(generation) => Ok(generation.clone()),
                Err(message) => Err(TalviError::Provider(message.clone()).into()),
            }
        }
    }

    fn session_with(
        provider: ScriptedProvider,
    ) -> (tempfile::TempDir, Arc<ScriptedProvider>, ChatSession) {
        let dir = tempdir().expect("tempdir");
        let storage =
            Arc::new(SqliteStorage::new_with_path(dir.path().join("history.db")).expect("open"));
        let provider = Arc::new(provider);
        let mut session = ChatSession::new(provider.clone(), storage);
        session.set_user(Some("u1".to_string()));
        (dir, provider, session)
    }

    #[tokio::test]
    async fn test_submit_appends_user_then_resolved_model() {
        let (_dir, _provider, mut session) =
            session_with(ScriptedProvider::replying("Answer", Vec::new()));

        session
            .submit_turn("Hello", ChatMode::Normal, None)
            .await
            .unwrap();

        let messages = session.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].text(), "Hello");
        assert_eq!(messages[1].role, Role::Model);
        assert!(!messages[1].is_pending());
        assert_eq!(messages[1].text(), "Answer");
    }

    #[tokio::test]
    async fn test_blank_submission_is_noop() {
        let (_dir, provider, mut session) =
            session_with(ScriptedProvider::replying("Answer", Vec::new()));

        session
            .submit_turn("   ", ChatMode::Normal, None)
            .await
            .unwrap();

        assert!(session.messages().is_empty());
        assert!(provider.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unauthenticated_submission_is_noop() {
        let (_dir, provider, mut session) =
            session_with(ScriptedProvider::replying("Answer", Vec::new()));
        session.set_user(None);

        session
            .submit_turn("Hello", ChatMode::Normal, None)
            .await
            .unwrap();

        assert!(session.messages().is_empty());
        assert!(provider.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_generation_failure_becomes_reply_text() {
        let (_dir, _provider, mut session) =
            session_with(ScriptedProvider::failing("connection refused"));

        session
            .submit_turn("Hello", ChatMode::Normal, None)
            .await
            .unwrap();

        let messages = session.messages();
        assert_eq!(messages.len(), 2);
        assert!(!messages[1].is_pending());
        assert!(messages[1].text().contains("connection refused"));
        assert!(messages[1].sources().is_empty());
    }

    #[tokio::test]
    async fn test_generation_sees_pre_append_history() {
        let (_dir, provider, mut session) =
            session_with(ScriptedProvider::replying("Answer", Vec::new()));

        session
            .submit_turn("First", ChatMode::Normal, None)
            .await
            .unwrap();
        session
            .submit_turn("Second", ChatMode::Normal, None)
            .await
            .unwrap();

        let requests = provider.requests.lock().unwrap();
        // First request: no history, just the current turn.
        assert_eq!(requests[0].contents.len(), 1);
        // Second request: the two resolved turns as history plus the
        // current turn; never the in-flight placeholder.
        assert_eq!(requests[1].contents.len(), 3);
        assert_eq!(requests[1].contents[0].role, "user");
        assert_eq!(requests[1].contents[1].role, "model");
        assert_eq!(requests[1].contents[2].role, "user");
    }

    #[tokio::test]
    async fn test_both_turns_are_persisted_under_their_ids() {
        let dir = tempdir().expect("tempdir");
        let storage =
            Arc::new(SqliteStorage::new_with_path(dir.path().join("history.db")).expect("open"));
        let provider = Arc::new(ScriptedProvider::replying(
            "Answer",
            vec![Source {
                uri: "https://example.com".to_string(),
                title: "Example".to_string(),
            }],
        ));
        let mut session = ChatSession::new(provider, storage.clone());
        session.set_user(Some("u1".to_string()));

        session
            .submit_turn("Hello", ChatMode::Deep, None)
            .await
            .unwrap();

        let log = storage.list_for_user("u1").unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].role, Role::User);
        assert_eq!(log[1].role, Role::Model);
        // Storage ids match the in-memory ids, including the placeholder's.
        assert_eq!(log[0].id, session.messages()[0].id);
        assert_eq!(log[1].id, session.messages()[1].id);
        assert_eq!(log[0].mode, ChatMode::Deep);
        assert!(log[1].sources.is_some());
    }

    #[tokio::test]
    async fn test_attachment_rides_on_user_message_only() {
        let (_dir, provider, mut session) =
            session_with(ScriptedProvider::replying("Answer", Vec::new()));

        let att = Attachment::text("doc.txt", "document body");
        session
            .submit_turn("Summarize", ChatMode::Normal, Some(att))
            .await
            .unwrap();
        session
            .submit_turn("And again", ChatMode::Normal, None)
            .await
            .unwrap();

        assert!(session.messages()[0].attachment.is_some());

        // The second request replays the first turn as plain text; the
        // document template never leaks into replayed history beyond the
        // text it produced.
        let requests = provider.requests.lock().unwrap();
        assert_eq!(requests[1].contents[0].parts.len(), 1);
    }

    #[tokio::test]
    async fn test_auth_transition_resets_conversation() {
        let (_dir, _provider, mut session) =
            session_with(ScriptedProvider::replying("Answer", Vec::new()));

        session
            .submit_turn("Hello", ChatMode::Normal, None)
            .await
            .unwrap();
        assert_eq!(session.messages().len(), 2);

        session.set_user(Some("u2".to_string()));
        assert!(session.messages().is_empty());
    }

    #[tokio::test]
    async fn test_load_replaces_conversation_wholesale() {
        let (_dir, _provider, mut session) =
            session_with(ScriptedProvider::replying("Answer", Vec::new()));

        session
            .submit_turn("Hello", ChatMode::Normal, None)
            .await
            .unwrap();

        let thread = vec![ChatMessage::user("restored", None)];
        session.load(thread);

        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.messages()[0].text(), "restored");
    }

    #[tokio::test]
    async fn test_last_reply_text() {
        let (_dir, _provider, mut session) =
            session_with(ScriptedProvider::replying("Answer", Vec::new()));

        assert!(session.last_reply_text().is_none());

        session
            .submit_turn("Hello", ChatMode::Normal, None)
            .await
            .unwrap();
        assert_eq!(session.last_reply_text(), Some("Answer"));
    }
}
