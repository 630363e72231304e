use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use ava_core::{
    render_content, ApiError, ChatContext, ChatWidget, Config, GateState, Outcome, Request,
    SessionGate, User,
};

pub struct App {
    // Core state
    pub should_quit: bool,
    pub config: Config,
    pub gate: SessionGate,
    pub widget: Option<ChatWidget>,

    // Message selection (for edit/delete/open link)
    pub selection: ListState,
    // Keep the newest message in view until the user scrolls up
    pub follow_tail: bool,

    // Context picker state
    pub show_context_picker: bool,
    pub context_picker_state: ListState,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Panel area for mouse hit-testing (updated during render)
    pub chat_area: Option<Rect>,

    // Persist the selected context to the config file
    pub remember_context: bool,

    // Requests waiting to be dispatched by the event loop
    requests: Vec<Request>,
}

impl App {
    pub fn new(config: Config) -> Self {
        Self {
            should_quit: false,
            config,
            gate: SessionGate::new(),
            widget: None,

            selection: ListState::default(),
            follow_tail: true,

            show_context_picker: false,
            context_picker_state: ListState::default(),

            animation_frame: 0,

            chat_area: None,

            remember_context: true,

            requests: Vec::new(),
        }
    }

    pub fn gate_state(&self) -> &GateState {
        self.gate.state()
    }

    /// Session check finished: mount the widget if someone is signed in
    pub fn on_session(&mut self, result: Result<Option<User>, ApiError>) {
        if let Some(user) = self.gate.resolve(result).cloned() {
            let mut widget = ChatWidget::new(user, self.config.context());
            let request = widget.refresh();
            self.widget = Some(widget);
            self.queue(Some(request));
        }
    }

    pub fn on_outcome(&mut self, outcome: Outcome) {
        let follow_up = match self.widget.as_mut() {
            Some(widget) => widget.apply(outcome),
            None => {
                log::debug!("[app] dropping chat outcome, widget not mounted");
                None
            }
        };
        self.queue(follow_up);
        self.sync_selection();
    }

    pub fn queue(&mut self, request: Option<Request>) {
        if let Some(request) = request {
            self.requests.push(request);
        }
    }

    pub fn take_requests(&mut self) -> Vec<Request> {
        std::mem::take(&mut self.requests)
    }

    // Widget actions that talk to the server

    pub fn submit(&mut self) {
        let request = self.widget.as_mut().and_then(|w| w.submit());
        if request.is_some() {
            self.follow_tail = true;
        }
        self.queue(request);
        self.sync_selection();
    }

    pub fn delete_selected(&mut self) {
        let request = match (self.widget.as_mut(), self.selection.selected()) {
            (Some(widget), Some(i)) => widget.delete(i),
            _ => None,
        };
        self.queue(request);
    }

    pub fn edit_selected(&mut self) {
        if let (Some(widget), Some(i)) = (self.widget.as_mut(), self.selection.selected()) {
            widget.begin_edit(i);
        }
    }

    pub fn refresh(&mut self) {
        let request = self.widget.as_mut().map(|w| w.refresh());
        self.queue(request);
    }

    pub fn switch_context(&mut self, context: ChatContext) {
        let request = self.widget.as_mut().and_then(|w| w.set_context(context));
        if request.is_none() {
            return;
        }

        self.selection.select(None);
        self.follow_tail = true;
        self.queue(request);

        if self.remember_context {
            if let Err(err) = Config::save_default_context(context) {
                log::warn!("[app] could not save default context: {}", err);
            }
        }
    }

    pub fn next_context(&mut self) {
        if let Some(context) = self.widget.as_ref().map(|w| w.context().next()) {
            self.switch_context(context);
        }
    }

    /// Drop the widget and return the URL the browser should open
    pub fn logout(&mut self) -> String {
        self.gate.sign_out();
        self.widget = None;
        self.selection.select(None);
        self.show_context_picker = false;
        self.config.logout_url()
    }

    // Message selection

    fn entry_count(&self) -> usize {
        self.widget.as_ref().map(|w| w.entries().len()).unwrap_or(0)
    }

    pub fn select_next(&mut self) {
        let len = self.entry_count();
        if len > 0 {
            let i = self.selection.selected().map(|i| i + 1).unwrap_or(0);
            self.selection.select(Some(i.min(len - 1)));
            self.follow_tail = i + 1 >= len;
        }
    }

    pub fn select_prev(&mut self) {
        let len = self.entry_count();
        if len > 0 {
            let i = self.selection.selected().unwrap_or(len);
            self.selection.select(Some(i.saturating_sub(1)));
            self.follow_tail = false;
        }
    }

    pub fn select_first(&mut self) {
        if self.entry_count() > 0 {
            self.selection.select(Some(0));
            self.follow_tail = false;
        }
    }

    pub fn select_last(&mut self) {
        let len = self.entry_count();
        if len > 0 {
            self.selection.select(Some(len - 1));
        }
        self.follow_tail = true;
    }

    /// Keep the selection inside the list after it changed size
    pub fn sync_selection(&mut self) {
        let len = self.entry_count();
        if len == 0 {
            self.selection.select(None);
        } else if self.follow_tail {
            self.selection.select(Some(len - 1));
        } else if let Some(i) = self.selection.selected() {
            if i >= len {
                self.selection.select(Some(len - 1));
            }
        }
    }

    /// Web address of the selected message's document, if it has one
    pub fn selected_link(&self) -> Option<String> {
        let widget = self.widget.as_ref()?;
        let entry = widget.entries().get(self.selection.selected()?)?;
        render_content(&entry.message.content).web_url().map(String::from)
    }

    // Context picker methods

    pub fn open_context_picker(&mut self) {
        let current = self.widget.as_ref().map(|w| w.context()).unwrap_or_default();
        let i = ChatContext::selectable().iter().position(|c| *c == current).unwrap_or(0);
        self.context_picker_state.select(Some(i));
        self.show_context_picker = true;
    }

    pub fn context_picker_nav_down(&mut self) {
        let len = ChatContext::selectable().len();
        let i = self.context_picker_state.selected().unwrap_or(0);
        self.context_picker_state.select(Some((i + 1).min(len - 1)));
    }

    pub fn context_picker_nav_up(&mut self) {
        let i = self.context_picker_state.selected().unwrap_or(0);
        self.context_picker_state.select(Some(i.saturating_sub(1)));
    }

    pub fn select_context_from_picker(&mut self) {
        let picked = self
            .context_picker_state
            .selected()
            .and_then(|i| ChatContext::selectable().get(i).copied());
        self.show_context_picker = false;
        if let Some(context) = picked {
            self.switch_context(context);
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.widget.as_ref().map(|w| w.is_busy()).unwrap_or(false) {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }
}
