//! Chat widget state
//!
//! `ChatWidget` owns everything the widget shows: the message list for the
//! selected context, the input buffer, the edit session and the
//! visibility/expansion toggles. It never performs I/O itself. Operations
//! that need the server return a [`Request`]; the caller runs it (see
//! [`Request::execute`]) and feeds the resulting [`Outcome`] back through
//! [`ChatWidget::apply`], which may ask for a follow-up re-fetch.
//!
//! Reconciliation rules:
//! - a list response replaces the list wholesale, but only if it answers the
//!   most recent list request for the current context
//! - sends are appended optimistically with a pending key; the create response
//!   replaces that entry in place, then the list is re-fetched
//! - updates and deletes are not applied locally; the re-fetch shows them

use crate::api::{ApiError, MessageApi};
use crate::input::InputBuffer;
use crate::message::{ChatContext, ChatKey, Message, User};

/// Local identifier of an optimistic entry
pub type PendingKey = u64;

/// Quick actions offered below a non-empty conversation
pub const SUGGESTED_ACTIONS: [&str; 2] = ["Create Report this month", "Call Lead"];

/// A message as held by the widget
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub message: Message,
    /// Set while the create request for this optimistic entry is in flight
    pub pending: Option<PendingKey>,
}

impl Entry {
    fn confirmed(message: Message) -> Self {
        Self {
            message,
            pending: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Widget shown, input not focused
    Viewing,
    /// Typing a new message
    Composing,
    /// Input bound to an existing, persisted message
    Editing { target: Message },
}

impl Mode {
    pub fn is_typing(&self) -> bool {
        !matches!(self, Mode::Viewing)
    }
}

/// Network work requested by the widget
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    List { key: ChatKey, ticket: u64 },
    Create { key: ChatKey, pending: PendingKey, message: Message },
    Update { key: ChatKey, id: String, message: Message },
    Delete { key: ChatKey, id: String },
}

/// Result of running a [`Request`]
#[derive(Debug)]
pub enum Outcome {
    Listed { key: ChatKey, ticket: u64, result: Result<Vec<Message>, ApiError> },
    Created { key: ChatKey, pending: PendingKey, result: Result<Vec<Message>, ApiError> },
    Updated { key: ChatKey, id: String, result: Result<(), ApiError> },
    Deleted { key: ChatKey, id: String, result: Result<(), ApiError> },
}

impl Request {
    pub fn key(&self) -> &ChatKey {
        match self {
            Request::List { key, .. }
            | Request::Create { key, .. }
            | Request::Update { key, .. }
            | Request::Delete { key, .. } => key,
        }
    }

    pub async fn execute(self, api: &dyn MessageApi) -> Outcome {
        match self {
            Request::List { key, ticket } => {
                let result = api.list_messages(&key).await;
                Outcome::Listed { key, ticket, result }
            }
            Request::Create { key, pending, message } => {
                let result = api.create_message(&key, &message).await;
                Outcome::Created { key, pending, result }
            }
            Request::Update { key, id, message } => {
                let result = api.update_message(&key, &id, &message).await;
                Outcome::Updated { key, id, result }
            }
            Request::Delete { key, id } => {
                let result = api.delete_message(&key, &id).await;
                Outcome::Deleted { key, id, result }
            }
        }
    }
}

pub struct ChatWidget {
    user: User,
    context: ChatContext,
    mode: Mode,
    visible: bool,
    expanded: bool,
    input: InputBuffer,
    entries: Vec<Entry>,
    // Ticket of the most recent list request; older responses are dropped
    latest_ticket: u64,
    loading: bool,
    next_pending: PendingKey,
    in_flight: usize,
}

impl ChatWidget {
    pub fn new(user: User, context: ChatContext) -> Self {
        Self {
            user,
            context,
            mode: Mode::Viewing,
            visible: true,
            expanded: false,
            input: InputBuffer::new(),
            entries: Vec::new(),
            latest_ticket: 0,
            loading: false,
            next_pending: 0,
            in_flight: 0,
        }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn context(&self) -> ChatContext {
        self.context
    }

    pub fn key(&self) -> ChatKey {
        ChatKey::new(self.user.id.clone(), self.context)
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn input(&self) -> &InputBuffer {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut InputBuffer {
        &mut self.input
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.entries.iter().map(|e| &e.message)
    }

    /// A list request for the current context has not been answered yet
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Any request is outstanding
    pub fn is_busy(&self) -> bool {
        self.loading || self.in_flight > 0
    }

    /// A sent message is waiting for the server's reply
    pub fn is_sending(&self) -> bool {
        self.entries.iter().any(|e| e.pending.is_some())
    }

    /// Id of the message bound to the input, if editing
    pub fn editing_id(&self) -> Option<&str> {
        match &self.mode {
            Mode::Editing { target } => target.id.as_deref(),
            _ => None,
        }
    }

    // Visibility

    pub fn toggle_visible(&mut self) {
        if self.visible {
            self.blur_input();
        }
        self.visible = !self.visible;
    }

    pub fn toggle_expanded(&mut self) {
        self.expanded = !self.expanded;
    }

    // Mode transitions

    pub fn focus_input(&mut self) {
        if self.mode == Mode::Viewing {
            self.mode = Mode::Composing;
        }
    }

    /// Leave the input. A draft is kept; an edit is cancelled.
    pub fn blur_input(&mut self) {
        if let Mode::Editing { .. } = self.mode {
            self.input.clear();
        }
        self.mode = Mode::Viewing;
    }

    /// Bind the input to the entry at `index`. Returns false if that entry
    /// has no server id yet.
    pub fn begin_edit(&mut self, index: usize) -> bool {
        let Some(entry) = self.entries.get(index) else {
            return false;
        };
        if entry.pending.is_some() || !entry.message.is_persisted() {
            log::warn!("[chat] cannot edit a message the server has not stored yet");
            return false;
        }

        let target = entry.message.clone();
        self.input.set(target.content.clone());
        self.mode = Mode::Editing { target };
        true
    }

    pub fn cancel_edit(&mut self) {
        if let Mode::Editing { .. } = self.mode {
            self.input.clear();
            self.mode = Mode::Composing;
        }
    }

    /// Put a suggested action's text into the input
    pub fn suggest(&mut self, index: usize) {
        if let Some(action) = SUGGESTED_ACTIONS.get(index) {
            self.input.set(*action);
            self.mode = Mode::Composing;
        }
    }

    // Server operations

    /// Ask for the current context's list
    pub fn refresh(&mut self) -> Request {
        self.latest_ticket += 1;
        self.loading = true;
        Request::List {
            key: self.key(),
            ticket: self.latest_ticket,
        }
    }

    /// Switch to `context`; the old list is dropped and the new one fetched
    pub fn set_context(&mut self, context: ChatContext) -> Option<Request> {
        if context == self.context {
            return None;
        }
        self.cancel_edit();
        self.context = context;
        self.entries.clear();
        Some(self.refresh())
    }

    /// Send the input as a new message, or as the edited content when editing.
    /// Blank input sends nothing.
    pub fn submit(&mut self) -> Option<Request> {
        if self.input.is_blank() {
            return None;
        }

        let content = self.input.take();
        let key = self.key();
        self.in_flight += 1;

        match std::mem::replace(&mut self.mode, Mode::Composing) {
            Mode::Editing { target } => {
                // begin_edit only accepts persisted messages
                let id = target.id.clone().unwrap_or_default();
                let message = Message { content, ..target };
                Some(Request::Update { key, id, message })
            }
            previous => {
                self.mode = previous;
                let message = Message::user(content);
                let pending = self.next_pending;
                self.next_pending += 1;
                self.entries.push(Entry {
                    message: message.clone(),
                    pending: Some(pending),
                });
                Some(Request::Create { key, pending, message })
            }
        }
    }

    /// Delete the entry at `index` on the server. The entry stays until the
    /// re-fetch confirms it is gone.
    pub fn delete(&mut self, index: usize) -> Option<Request> {
        let id = self.entries.get(index)?.message.id.clone();
        let Some(id) = id else {
            log::warn!("[chat] cannot delete a message the server has not stored yet");
            return None;
        };

        if self.editing_id() == Some(id.as_str()) {
            self.cancel_edit();
        }
        self.in_flight += 1;
        Some(Request::Delete { key: self.key(), id })
    }

    /// Fold a finished request into the state. May return a re-fetch.
    pub fn apply(&mut self, outcome: Outcome) -> Option<Request> {
        match outcome {
            Outcome::Listed { key, ticket, result } => {
                if key.context != self.context || ticket != self.latest_ticket {
                    log::debug!(
                        "[chat] dropping stale list response for {} (ticket {})",
                        key,
                        ticket
                    );
                    return None;
                }
                self.loading = false;
                match result {
                    Ok(messages) => self.replace_all(messages),
                    Err(err) => log::error!("[chat] error fetching messages for {}: {}", key, err),
                }
                None
            }
            Outcome::Created { key, pending, result } => {
                self.in_flight = self.in_flight.saturating_sub(1);
                if key.context != self.context {
                    return None;
                }
                match result {
                    Ok(created) => self.confirm_pending(pending, created),
                    Err(err) => {
                        log::error!("[chat] error sending message to {}: {}", key, err);
                        // No longer pending, so the re-fetch drops it
                        if let Some(entry) =
                            self.entries.iter_mut().find(|e| e.pending == Some(pending))
                        {
                            entry.pending = None;
                        }
                    }
                }
                Some(self.refresh())
            }
            Outcome::Updated { key, id, result } => {
                self.in_flight = self.in_flight.saturating_sub(1);
                if let Err(err) = result {
                    log::error!("[chat] error updating message {} in {}: {}", id, key, err);
                }
                (key.context == self.context).then(|| self.refresh())
            }
            Outcome::Deleted { key, id, result } => {
                self.in_flight = self.in_flight.saturating_sub(1);
                if let Err(err) = result {
                    log::error!("[chat] error deleting message {} in {}: {}", id, key, err);
                }
                (key.context == self.context).then(|| self.refresh())
            }
        }
    }

    /// Server list wins, except for sends that are still in flight
    fn replace_all(&mut self, messages: Vec<Message>) {
        let still_pending: Vec<Entry> = self
            .entries
            .drain(..)
            .filter(|e| e.pending.is_some())
            .collect();
        self.entries = messages.into_iter().map(Entry::confirmed).collect();
        self.entries.extend(still_pending);
    }

    /// Swap an optimistic entry for what the server stored, skipping
    /// messages the list already holds
    fn confirm_pending(&mut self, pending: PendingKey, created: Vec<Message>) {
        let Some(pos) = self.entries.iter().position(|e| e.pending == Some(pending)) else {
            log::debug!("[chat] pending entry {} already gone", pending);
            return;
        };

        let fresh: Vec<Entry> = created
            .into_iter()
            .filter(|m| match &m.id {
                Some(id) => !self
                    .entries
                    .iter()
                    .any(|e| e.message.id.as_deref() == Some(id.as_str())),
                None => true,
            })
            .map(Entry::confirmed)
            .collect();
        self.entries.splice(pos..=pos, fresh);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::LineType;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory stand-in for the chat backend. Every user message gets a
    /// canned system reply, like the real assistant.
    #[derive(Default)]
    struct FakeBackend {
        chats: Mutex<HashMap<ChatContext, Vec<Message>>>,
        next_id: Mutex<u32>,
        calls: Mutex<Vec<&'static str>>,
        fail_lists: Mutex<bool>,
    }

    impl FakeBackend {
        fn with(context: ChatContext, contents: &[&str]) -> Self {
            let backend = Self::default();
            for content in contents {
                let message = backend.stored(LineType::System, content);
                backend.chats.lock().unwrap().entry(context).or_default().push(message);
            }
            backend
        }

        fn stored(&self, line_type: LineType, content: &str) -> Message {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            Message {
                id: Some(format!("m{}", *next)),
                line_type,
                content: content.to_string(),
                created_date: Some("2024-10-01T12:00:00".to_string()),
            }
        }

        fn contents(&self, context: ChatContext) -> Vec<String> {
            self.chats
                .lock()
                .unwrap()
                .get(&context)
                .map(|msgs| msgs.iter().map(|m| m.content.clone()).collect())
                .unwrap_or_default()
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }

        fn unavailable() -> ApiError {
            ApiError::Status {
                status: 503,
                url: "http://localhost:8000/api".to_string(),
            }
        }
    }

    #[async_trait]
    impl MessageApi for FakeBackend {
        async fn list_messages(&self, key: &ChatKey) -> Result<Vec<Message>, ApiError> {
            self.calls.lock().unwrap().push("list");
            if *self.fail_lists.lock().unwrap() {
                return Err(Self::unavailable());
            }
            Ok(self.chats.lock().unwrap().get(&key.context).cloned().unwrap_or_default())
        }

        async fn create_message(
            &self,
            key: &ChatKey,
            message: &Message,
        ) -> Result<Vec<Message>, ApiError> {
            self.calls.lock().unwrap().push("create");
            let stored = self.stored(message.line_type, &message.content);
            let reply = self.stored(LineType::System, &format!("re: {}", message.content));
            let mut chats = self.chats.lock().unwrap();
            let chat = chats.entry(key.context).or_default();
            chat.push(stored.clone());
            chat.push(reply.clone());
            Ok(vec![stored, reply])
        }

        async fn update_message(
            &self,
            key: &ChatKey,
            id: &str,
            message: &Message,
        ) -> Result<(), ApiError> {
            self.calls.lock().unwrap().push("update");
            let mut chats = self.chats.lock().unwrap();
            let chat = chats.entry(key.context).or_default();
            match chat.iter_mut().find(|m| m.id.as_deref() == Some(id)) {
                Some(existing) => {
                    existing.content = message.content.clone();
                    Ok(())
                }
                None => Err(Self::unavailable()),
            }
        }

        async fn delete_message(&self, key: &ChatKey, id: &str) -> Result<(), ApiError> {
            self.calls.lock().unwrap().push("delete");
            let mut chats = self.chats.lock().unwrap();
            chats.entry(key.context).or_default().retain(|m| m.id.as_deref() != Some(id));
            Ok(())
        }
    }

    fn dana() -> User {
        User {
            id: "u42".to_string(),
            name: "Dana".to_string(),
            email: "dana@example.com".to_string(),
        }
    }

    /// Run a request and every follow-up it triggers
    async fn settle(widget: &mut ChatWidget, api: &FakeBackend, request: Option<Request>) {
        let mut next = request;
        while let Some(request) = next {
            let outcome = request.execute(api).await;
            next = widget.apply(outcome);
        }
    }

    fn shown(widget: &ChatWidget) -> Vec<String> {
        widget.messages().map(|m| m.content.clone()).collect()
    }

    async fn mounted(api: &FakeBackend) -> ChatWidget {
        let mut widget = ChatWidget::new(dana(), ChatContext::Onboarding);
        let request = widget.refresh();
        settle(&mut widget, api, Some(request)).await;
        widget
    }

    #[tokio::test]
    async fn test_mount_lists_current_context() {
        let api = FakeBackend::with(ChatContext::Onboarding, &["Welcome aboard"]);
        let widget = mounted(&api).await;
        assert_eq!(shown(&widget), vec!["Welcome aboard"]);
        assert!(!widget.is_loading());
        assert!(widget.is_visible());
        assert_eq!(widget.mode(), &Mode::Viewing);
    }

    #[tokio::test]
    async fn test_switching_contexts_shows_each_list() {
        let api = FakeBackend::with(ChatContext::Onboarding, &["onboarding hello"]);
        api.chats.lock().unwrap().insert(
            ChatContext::Sales,
            vec![api.stored(LineType::System, "sales pitch")],
        );
        let mut widget = mounted(&api).await;

        let request = widget.set_context(ChatContext::Sales);
        assert!(widget.entries().is_empty());
        settle(&mut widget, &api, request).await;
        assert_eq!(shown(&widget), vec!["sales pitch"]);

        let request = widget.set_context(ChatContext::Onboarding);
        settle(&mut widget, &api, request).await;
        assert_eq!(shown(&widget), vec!["onboarding hello"]);
        assert_eq!(api.calls(), vec!["list", "list", "list"]);
    }

    #[tokio::test]
    async fn test_selecting_current_context_is_noop() {
        let api = FakeBackend::with(ChatContext::Onboarding, &["hi"]);
        let mut widget = mounted(&api).await;
        assert!(widget.set_context(ChatContext::Onboarding).is_none());
        assert_eq!(shown(&widget), vec!["hi"]);
    }

    #[tokio::test]
    async fn test_blank_input_sends_nothing() {
        let api = FakeBackend::default();
        let mut widget = mounted(&api).await;
        widget.focus_input();
        widget.input_mut().set("   \t ");
        assert!(widget.submit().is_none());
        assert!(widget.entries().is_empty());
        assert_eq!(api.calls(), vec!["list"]);
    }

    #[tokio::test]
    async fn test_send_appends_optimistically_then_converges() {
        let api = FakeBackend::default();
        let mut widget = mounted(&api).await;
        widget.focus_input();
        widget.input_mut().set("How do I start?");

        let request = widget.submit();
        assert!(matches!(request, Some(Request::Create { .. })));
        assert_eq!(widget.input().text(), "");
        assert_eq!(widget.mode(), &Mode::Composing);
        assert_eq!(shown(&widget), vec!["How do I start?"]);
        assert!(widget.entries()[0].pending.is_some());
        assert!(widget.is_busy());
        assert!(widget.is_sending());

        settle(&mut widget, &api, request).await;
        assert_eq!(shown(&widget), vec!["How do I start?", "re: How do I start?"]);
        assert!(widget.entries().iter().all(|e| e.pending.is_none() && e.message.is_persisted()));
        assert!(!widget.is_busy());
        assert!(!widget.is_sending());
        assert_eq!(api.calls(), vec!["list", "create", "list"]);
    }

    #[tokio::test]
    async fn test_create_response_replaces_optimistic_entry_in_place() {
        let api = FakeBackend::with(ChatContext::Onboarding, &["Welcome"]);
        let mut widget = mounted(&api).await;
        widget.input_mut().set("question");
        let request = widget.submit().unwrap();

        let outcome = request.execute(&api).await;
        let follow_up = widget.apply(outcome);

        // Before the re-fetch lands: no duplicate of the sent message
        assert_eq!(shown(&widget), vec!["Welcome", "question", "re: question"]);
        assert!(matches!(follow_up, Some(Request::List { .. })));
    }

    #[tokio::test]
    async fn test_list_during_send_keeps_pending_entry_without_duplicates() {
        let api = FakeBackend::with(ChatContext::Onboarding, &["Welcome"]);
        let mut widget = mounted(&api).await;
        widget.input_mut().set("first");
        let create = widget.submit().unwrap();

        // The server stores the message, then a refresh answers before the create does
        let created = create.execute(&api).await;
        let refresh = widget.refresh();
        let listed = refresh.execute(&api).await;
        widget.apply(listed);
        assert_eq!(shown(&widget), vec!["Welcome", "first", "re: first", "first"]);

        widget.apply(created);
        assert_eq!(shown(&widget), vec!["Welcome", "first", "re: first"]);
    }

    #[tokio::test]
    async fn test_failed_send_is_dropped_by_refetch() {
        struct RejectingCreate(FakeBackend);

        #[async_trait]
        impl MessageApi for RejectingCreate {
            async fn list_messages(&self, key: &ChatKey) -> Result<Vec<Message>, ApiError> {
                self.0.list_messages(key).await
            }
            async fn create_message(
                &self,
                _: &ChatKey,
                _: &Message,
            ) -> Result<Vec<Message>, ApiError> {
                Err(FakeBackend::unavailable())
            }
            async fn update_message(
                &self,
                key: &ChatKey,
                id: &str,
                m: &Message,
            ) -> Result<(), ApiError> {
                self.0.update_message(key, id, m).await
            }
            async fn delete_message(&self, key: &ChatKey, id: &str) -> Result<(), ApiError> {
                self.0.delete_message(key, id).await
            }
        }

        let api = RejectingCreate(FakeBackend::with(ChatContext::Onboarding, &["Welcome"]));
        let mut widget = ChatWidget::new(dana(), ChatContext::Onboarding);
        let mut next = Some(widget.refresh());
        while let Some(request) = next {
            next = widget.apply(request.execute(&api).await);
        }

        widget.input_mut().set("lost");
        let create = widget.submit().unwrap();
        let follow_up = widget.apply(create.execute(&api).await);
        assert_eq!(shown(&widget), vec!["Welcome", "lost"]);
        assert!(widget.entries()[1].pending.is_none());

        let refresh = follow_up.unwrap();
        widget.apply(refresh.execute(&api).await);
        assert_eq!(shown(&widget), vec!["Welcome"]);
    }

    #[tokio::test]
    async fn test_edit_issues_update_not_create() {
        let api = FakeBackend::with(ChatContext::Onboarding, &["tpyo here"]);
        let mut widget = mounted(&api).await;

        assert!(widget.begin_edit(0));
        assert_eq!(widget.input().text(), "tpyo here");
        assert_eq!(widget.editing_id(), Some("m1"));

        widget.input_mut().set("typo here");
        let request = widget.submit();
        match &request {
            Some(Request::Update { id, message, .. }) => {
                assert_eq!(id, "m1");
                assert_eq!(message.content, "typo here");
                assert_eq!(message.line_type, LineType::System);
            }
            other => panic!("expected an update, got {:?}", other),
        }
        assert_eq!(widget.mode(), &Mode::Composing);
        assert_eq!(widget.input().text(), "");
        // No optimistic change for updates
        assert_eq!(shown(&widget), vec!["tpyo here"]);

        settle(&mut widget, &api, request).await;
        assert_eq!(shown(&widget), vec!["typo here"]);
        assert_eq!(api.calls(), vec!["list", "update", "list"]);
    }

    #[tokio::test]
    async fn test_cannot_edit_or_delete_unsaved_entry() {
        let api = FakeBackend::default();
        let mut widget = mounted(&api).await;
        widget.input_mut().set("in flight");
        let _create = widget.submit();

        assert!(!widget.begin_edit(0));
        assert!(widget.delete(0).is_none());
        assert!(!widget.begin_edit(5));
    }

    #[tokio::test]
    async fn test_cancel_edit_returns_to_composing() {
        let api = FakeBackend::with(ChatContext::Onboarding, &["hello"]);
        let mut widget = mounted(&api).await;
        widget.begin_edit(0);
        widget.cancel_edit();
        assert_eq!(widget.mode(), &Mode::Composing);
        assert_eq!(widget.input().text(), "");
    }

    #[tokio::test]
    async fn test_blur_keeps_draft_but_drops_edit() {
        let api = FakeBackend::with(ChatContext::Onboarding, &["hello"]);
        let mut widget = mounted(&api).await;

        widget.focus_input();
        widget.input_mut().set("draft");
        widget.blur_input();
        assert_eq!(widget.mode(), &Mode::Viewing);
        assert_eq!(widget.input().text(), "draft");

        widget.begin_edit(0);
        widget.blur_input();
        assert_eq!(widget.mode(), &Mode::Viewing);
        assert_eq!(widget.input().text(), "");
    }

    #[tokio::test]
    async fn test_delete_removes_after_refetch() {
        let api = FakeBackend::with(ChatContext::Onboarding, &["keep", "remove"]);
        let mut widget = mounted(&api).await;

        let request = widget.delete(1);
        assert!(matches!(&request, Some(Request::Delete { id, .. }) if id == "m2"));
        assert_eq!(shown(&widget), vec!["keep", "remove"]);

        settle(&mut widget, &api, request).await;
        assert_eq!(shown(&widget), vec!["keep"]);
    }

    #[tokio::test]
    async fn test_deleting_message_under_edit_cancels_edit() {
        let api = FakeBackend::with(ChatContext::Onboarding, &["only"]);
        let mut widget = mounted(&api).await;
        widget.begin_edit(0);
        let request = widget.delete(0);
        assert_eq!(widget.mode(), &Mode::Composing);
        assert_eq!(widget.input().text(), "");
        settle(&mut widget, &api, request).await;
        assert!(widget.entries().is_empty());
    }

    #[tokio::test]
    async fn test_context_switch_cancels_edit() {
        let api = FakeBackend::with(ChatContext::Onboarding, &["hello"]);
        let mut widget = mounted(&api).await;
        widget.begin_edit(0);
        let request = widget.set_context(ChatContext::Sales);
        assert_eq!(widget.mode(), &Mode::Composing);
        assert_eq!(widget.input().text(), "");
        settle(&mut widget, &api, request).await;
        assert!(widget.entries().is_empty());
    }

    #[tokio::test]
    async fn test_stale_list_from_previous_context_is_dropped() {
        let api = FakeBackend::with(ChatContext::Onboarding, &["onboarding"]);
        api.chats.lock().unwrap().insert(
            ChatContext::Sales,
            vec![api.stored(LineType::System, "sales")],
        );
        let mut widget = ChatWidget::new(dana(), ChatContext::Onboarding);

        let first = widget.refresh();
        let second = widget.set_context(ChatContext::Sales).unwrap();

        // The Sales response lands first, then the superseded Onboarding one
        let sales = second.execute(&api).await;
        let onboarding = first.execute(&api).await;
        widget.apply(sales);
        widget.apply(onboarding);

        assert_eq!(widget.context(), ChatContext::Sales);
        assert_eq!(shown(&widget), vec!["sales"]);
    }

    #[tokio::test]
    async fn test_older_list_in_same_context_is_dropped() {
        let api = FakeBackend::with(ChatContext::Onboarding, &["old"]);
        let mut widget = ChatWidget::new(dana(), ChatContext::Onboarding);

        let older = widget.refresh();
        let older = older.execute(&api).await;
        api.chats.lock().unwrap().insert(
            ChatContext::Onboarding,
            vec![api.stored(LineType::System, "new")],
        );
        let newer = widget.refresh().execute(&api).await;

        widget.apply(newer);
        widget.apply(older);
        assert_eq!(shown(&widget), vec!["new"]);
        assert!(!widget.is_loading());
    }

    #[tokio::test]
    async fn test_failed_list_keeps_previous_messages() {
        let api = FakeBackend::with(ChatContext::Onboarding, &["still here"]);
        let mut widget = mounted(&api).await;

        *api.fail_lists.lock().unwrap() = true;
        let request = widget.refresh();
        settle(&mut widget, &api, Some(request)).await;

        assert_eq!(shown(&widget), vec!["still here"]);
        assert!(!widget.is_loading());
    }

    #[tokio::test]
    async fn test_mutation_for_old_context_does_not_refetch() {
        let api = FakeBackend::with(ChatContext::Onboarding, &["hello"]);
        let mut widget = mounted(&api).await;
        let delete = widget.delete(0).unwrap();
        let switch = widget.set_context(ChatContext::Sales);
        settle(&mut widget, &api, switch).await;

        let outcome = delete.execute(&api).await;
        assert!(widget.apply(outcome).is_none());
        assert!(!widget.is_busy());
    }

    #[test]
    fn test_hiding_blurs_input_and_toggles_are_local() {
        let mut widget = ChatWidget::new(dana(), ChatContext::Sales);
        widget.focus_input();
        widget.toggle_visible();
        assert!(!widget.is_visible());
        assert_eq!(widget.mode(), &Mode::Viewing);

        widget.toggle_visible();
        widget.toggle_expanded();
        assert!(widget.is_visible());
        assert!(widget.is_expanded());
        assert!(!widget.is_busy());
    }

    #[test]
    fn test_suggested_action_fills_input() {
        let mut widget = ChatWidget::new(dana(), ChatContext::Sales);
        widget.suggest(1);
        assert_eq!(widget.input().text(), "Call Lead");
        assert_eq!(widget.mode(), &Mode::Composing);
        widget.suggest(9);
        assert_eq!(widget.input().text(), "Call Lead");
    }
}
