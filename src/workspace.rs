//! The operator's workspace
//!
//! Wires the inbox store, the copilot runtime, the draft channel and the
//! reply composer together. Each workspace owns its own instances; nothing
//! here is process-global.

mod composer;

pub use composer::Composer;

use crate::clock::{Clock, SystemClock};
use crate::config::WorkspaceConfig;
use crate::copilot::{visible_window, AssistantProfile, Catalog, CatalogError, PanelView};
use crate::draft::DraftChannel;
use crate::inbox::{
    seed, ConversationId, ConversationStore, InboxAction, InboxSnapshot, MessageId, NewMessage,
};
use crate::runtime::{self, CopilotHandle, PanelEvent, RuntimeStopped};
use crate::state_machine::{CopilotContext, RenderFrame, SessionId, Stage};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error(transparent)]
    RuntimeStopped(#[from] RuntimeStopped),
    #[error("failed to load conversations: {0}")]
    Seed(#[from] seed::SeedError),
    #[error("failed to load response catalog: {0}")]
    Catalog(#[from] CatalogError),
}

pub struct Workspace {
    store: ConversationStore,
    drafts: DraftChannel,
    copilot: CopilotHandle,
    catalog: Arc<Catalog>,
    config: WorkspaceConfig,
    active: Option<ConversationId>,
    composer: Composer,
}

impl Workspace {
    /// Assemble a workspace and start its copilot runtime.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(
        snapshot: InboxSnapshot,
        catalog: Catalog,
        config: WorkspaceConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let store = ConversationStore::new(snapshot, clock);
        let catalog = Arc::new(catalog);
        let context = CopilotContext::new(catalog.clone(), &config);
        let copilot = runtime::spawn(context, store.clone());

        Self {
            store,
            drafts: DraftChannel::new(),
            copilot,
            catalog,
            config,
            active: None,
            composer: Composer::default(),
        }
    }

    /// Load seed data and catalog as configured and start the workspace
    ///
    /// # Errors
    ///
    /// The configured seed or catalog file cannot be loaded.
    pub fn from_config(config: WorkspaceConfig) -> Result<Self, WorkspaceError> {
        let snapshot = match &config.seed_path {
            Some(path) => seed::load_file(path)?,
            None => seed::bundled()?,
        };
        let catalog = match &config.catalog_path {
            Some(path) => Catalog::load_file(path)?,
            None => Catalog::builtin(),
        };
        tracing::info!(
            conversations = snapshot.len(),
            unread = snapshot.total_unread(),
            responses = catalog.entries().count(),
            "Workspace loaded"
        );
        Ok(Self::new(snapshot, catalog, config, Arc::new(SystemClock)))
    }

    // ========================================================================
    // Conversations
    // ========================================================================

    /// Open a conversation, marking everything in it read.
    ///
    /// Returns `false` for an unknown id, leaving the selection unchanged.
    pub fn select_conversation(&mut self, conversation_id: &ConversationId) -> bool {
        if !self.store.contains(conversation_id) {
            tracing::debug!(%conversation_id, "Ignoring selection of unknown conversation");
            return false;
        }
        let snapshot = self.store.mark_all_read(conversation_id);
        tracing::info!(
            %conversation_id,
            total_unread = snapshot.total_unread(),
            "Conversation opened"
        );
        self.active = Some(conversation_id.clone());
        true
    }

    /// Mark a single message read; unknown ids and read messages are no-ops
    pub fn mark_message_read(
        &self,
        conversation_id: &ConversationId,
        message_id: MessageId,
    ) -> bool {
        let before = self.store.snapshot();
        let after = self.store.mark_message_read(conversation_id, message_id);
        !Arc::ptr_eq(&before, &after)
    }

    pub fn active_conversation(&self) -> Option<&ConversationId> {
        self.active.as_ref()
    }

    /// Send an operator reply; blank text and unknown ids are ignored
    pub fn send_composed_message(&self, conversation_id: &ConversationId, text: &str) -> bool {
        self.append(conversation_id, NewMessage::agent(text))
    }

    /// Send the composer text to the active conversation and clear it
    pub fn send_composer(&mut self) -> bool {
        let Some(conversation_id) = self.active.clone() else {
            return false;
        };
        if self.composer.is_blank() {
            return false;
        }
        let text = self.composer.take();
        self.send_composed_message(&conversation_id, &text)
    }

    /// Simulate a message arriving from the contact
    pub fn receive_contact_message(&self, conversation_id: &ConversationId, text: &str) -> bool {
        self.append(conversation_id, NewMessage::contact(text))
    }

    fn append(&self, conversation_id: &ConversationId, message: NewMessage) -> bool {
        match self.store.try_dispatch(&InboxAction::AppendMessage {
            conversation_id: conversation_id.clone(),
            message,
        }) {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(error = %e, "Message not sent");
                false
            }
        }
    }

    // ========================================================================
    // Copilot
    // ========================================================================

    /// Ask the copilot about the active conversation.
    ///
    /// Returns `Ok(None)` when the question is blank or no conversation is
    /// open.
    ///
    /// # Errors
    ///
    /// The copilot runtime has stopped.
    pub async fn submit_question(&self, text: &str) -> Result<Option<SessionId>, WorkspaceError> {
        let question = text.trim();
        if question.is_empty() {
            return Ok(None);
        }
        let Some(conversation_id) = self.active.clone() else {
            tracing::debug!("Question ignored, no active conversation");
            return Ok(None);
        };
        let session_id = self.copilot.submit(conversation_id.clone(), question).await?;
        tracing::info!(%session_id, %conversation_id, "Copilot session started");
        Ok(Some(session_id))
    }

    /// Ask one of the catalog's suggested questions
    ///
    /// # Errors
    ///
    /// The copilot runtime has stopped.
    pub async fn submit_suggestion(&self, index: usize) -> Result<Option<SessionId>, WorkspaceError> {
        match self.catalog.suggestions().get(index) {
            Some(question) => self.submit_question(question).await,
            None => Ok(None),
        }
    }

    /// Dismiss the answer in flight
    ///
    /// # Errors
    ///
    /// The copilot runtime has stopped.
    pub async fn cancel_copilot(&self) -> Result<(), WorkspaceError> {
        Ok(self.copilot.cancel().await?)
    }

    /// Hand text to the composer through the draft channel
    pub fn insert_assistant_response(&self, text: impl Into<String>) {
        self.drafts.publish(text);
    }

    /// Hand the finished answer to the composer when the panel offers it
    /// for the open conversation
    pub fn insert_latest_response(&self) -> bool {
        let frame = self.copilot.current_frame();
        if frame.stage != Stage::Complete
            || !frame.offers_insert
            || frame.conversation_id.is_none()
            || frame.conversation_id != self.active
        {
            return false;
        }
        self.insert_assistant_response(frame.text);
        true
    }

    /// Pull a pending draft into the composer; a draft is applied once
    pub fn sync_composer(&mut self) -> bool {
        match self.drafts.consume_once() {
            Some(draft) => {
                self.composer.apply_draft(draft);
                true
            }
            None => false,
        }
    }

    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    pub fn composer_mut(&mut self) -> &mut Composer {
        &mut self.composer
    }

    pub fn drafts(&self) -> DraftChannel {
        self.drafts.clone()
    }

    // ========================================================================
    // Read side
    // ========================================================================

    pub fn snapshot(&self) -> Arc<InboxSnapshot> {
        self.store.snapshot()
    }

    pub fn unread_count(&self, conversation_id: &ConversationId) -> Option<usize> {
        self.store.unread_count(conversation_id)
    }

    pub fn total_unread(&self) -> usize {
        self.store.total_unread()
    }

    /// The copilot panel for the active conversation
    pub fn copilot_view(&self) -> PanelView {
        let snapshot = self.store.snapshot();
        let conversation = self
            .active
            .as_ref()
            .and_then(|id| snapshot.conversation(id));
        match conversation {
            Some(conversation) => visible_window(
                conversation,
                &self.copilot.current_frame(),
                self.config.max_visible_messages,
            ),
            None => PanelView::greeting(),
        }
    }

    pub fn current_frame(&self) -> RenderFrame {
        self.copilot.current_frame()
    }

    pub fn subscribe_panel(&self) -> broadcast::Receiver<PanelEvent> {
        self.copilot.subscribe()
    }

    pub fn profile(&self) -> &AssistantProfile {
        self.catalog.profile()
    }

    pub fn suggestions(&self) -> &[String] {
        self.catalog.suggestions()
    }
}
