use std::sync::Arc;

use chatview_core::{ChatBackend, ChatError, ChatExchange, ChatSession};
use ratatui::layout::Rect;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use crate::tui::AppEvent;

/// Columns moved per horizontal scroll step in code panels
const CODE_SCROLL_STEP: u16 = 4;

pub struct App {
    // Core state
    pub should_quit: bool,
    pub session: ChatSession,
    backend: Arc<dyn ChatBackend>,
    events: UnboundedSender<AppEvent>,

    // Labels
    pub endpoint: String,
    pub placeholder: String,

    // Transcript scroll state (max values are refreshed on every draw)
    pub scroll: u16,
    pub max_scroll: u16,
    pub follow_latest: bool,
    seen_revision: u64,
    pub chat_height: u16,

    // Horizontal offset shared by all code panels
    pub code_scroll: u16,
    pub max_code_scroll: u16,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Panel area for mouse hit-testing (updated during render)
    pub chat_area: Option<Rect>,
}

impl App {
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        events: UnboundedSender<AppEvent>,
        endpoint: &str,
        placeholder: &str,
    ) -> Self {
        Self {
            should_quit: false,
            session: ChatSession::new(),
            backend,
            events,

            endpoint: endpoint.to_string(),
            placeholder: placeholder.to_string(),

            scroll: 0,
            max_scroll: 0,
            follow_latest: true,
            seen_revision: 0,
            chat_height: 0,

            code_scroll: 0,
            max_code_scroll: 0,

            animation_frame: 0,

            chat_area: None,
        }
    }

    /// Send the draft in a background task. The reply comes back as
    /// `AppEvent::Reply`; nothing happens if the session refuses to submit.
    pub fn submit(&mut self) -> bool {
        let Some(message) = self.session.begin_submit() else {
            return false;
        };

        // Keep the "Thinking" line in view
        self.follow_latest = true;
        self.animation_frame = 0;

        let backend = Arc::clone(&self.backend);
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = backend.send(&message).await;
            if events.send(AppEvent::Reply(result)).is_err() {
                debug!("event loop gone before chat reply arrived");
            }
        });
        true
    }

    pub fn on_reply(&mut self, result: Result<ChatExchange, ChatError>) {
        self.session.complete_submit(result);
        self.sync_scroll();
    }

    /// Follow the newest turn whenever the transcript has grown since the
    /// last time we looked.
    pub fn sync_scroll(&mut self) {
        let revision = self.session.transcript().revision();
        if revision != self.seen_revision {
            self.seen_revision = revision;
            self.follow_latest = true;
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.session.is_loading() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll = self.scroll.min(self.max_scroll).saturating_sub(lines);
        self.follow_latest = false;
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_add(lines).min(self.max_scroll);
        // Reaching the bottom resumes following new turns
        self.follow_latest = self.scroll >= self.max_scroll;
    }

    pub fn page_up(&mut self) {
        self.scroll_up(self.chat_height.max(2) / 2);
    }

    pub fn page_down(&mut self) {
        self.scroll_down(self.chat_height.max(2) / 2);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll = self.max_scroll;
        self.follow_latest = true;
    }

    pub fn code_scroll_left(&mut self) {
        self.code_scroll = self.code_scroll.saturating_sub(CODE_SCROLL_STEP);
    }

    pub fn code_scroll_right(&mut self) {
        self.code_scroll = self
            .code_scroll
            .saturating_add(CODE_SCROLL_STEP)
            .min(self.max_code_scroll);
    }

    /// Called after layout with the real sizes of the transcript
    pub fn update_scroll_bounds(&mut self, total_lines: u16, visible_height: u16, max_code_scroll: u16) {
        self.chat_height = visible_height;
        self.max_scroll = total_lines.saturating_sub(visible_height);
        self.scroll = if self.follow_latest {
            self.max_scroll
        } else {
            self.scroll.min(self.max_scroll)
        };
        self.max_code_scroll = max_code_scroll;
        self.code_scroll = self.code_scroll.min(max_code_scroll);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use chatview_core::error::StatusCode;
    use chatview_core::Turn;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::mpsc;

    /// Backend that answers every message with a fixed reply
    pub(crate) struct EchoBackend {
        pub calls: AtomicUsize,
    }

    #[async_trait]
    impl ChatBackend for EchoBackend {
        async fn send(&self, message: &str) -> Result<ChatExchange, ChatError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ChatExchange {
                user_message: Turn::user(message),
                bot_response: Turn::assistant("hello"),
            })
        }
    }

    pub(crate) fn test_app() -> (App, Arc<EchoBackend>, mpsc::UnboundedReceiver<AppEvent>) {
        let backend = Arc::new(EchoBackend { calls: AtomicUsize::new(0) });
        let (tx, rx) = mpsc::unbounded_channel();
        let app = App::new(backend.clone(), tx, "http://localhost/api/chat/", "Ask...");
        (app, backend, rx)
    }

    fn type_text(app: &mut App, text: &str) {
        app.session.edit(|draft| text.chars().for_each(|c| draft.insert(c)));
    }

    #[tokio::test]
    async fn test_submit_round_trip_through_event_channel() {
        let (mut app, backend, mut rx) = test_app();
        type_text(&mut app, "hi");

        assert!(app.submit());
        assert!(app.session.is_loading());
        // A second submit while loading is refused
        assert!(!app.submit());

        let Some(AppEvent::Reply(result)) = rx.recv().await else {
            panic!("expected a reply event");
        };
        app.on_reply(result);

        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
        assert!(!app.session.is_loading());
        assert_eq!(app.session.transcript().len(), 2);
        assert_eq!(app.session.draft().text(), "");
    }

    #[tokio::test]
    async fn test_blank_draft_spawns_nothing() {
        let (mut app, backend, mut rx) = test_app();
        type_text(&mut app, "   ");
        assert!(!app.submit());
        assert!(rx.try_recv().is_err());
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_new_turns_resume_following() {
        let (mut app, _backend, _rx) = test_app();
        app.update_scroll_bounds(100, 20, 0);
        app.scroll_up(10);
        assert!(!app.follow_latest);
        assert_eq!(app.scroll, 70);

        type_text(&mut app, "hi");
        app.session.begin_submit();
        app.on_reply(Ok(ChatExchange {
            user_message: Turn::user("hi"),
            bot_response: Turn::assistant("hello"),
        }));
        assert!(app.follow_latest);

        app.update_scroll_bounds(110, 20, 0);
        assert_eq!(app.scroll, 90);
    }

    #[test]
    fn test_failed_reply_does_not_move_view() {
        let (mut app, _backend, _rx) = test_app();
        app.update_scroll_bounds(100, 20, 0);
        app.scroll_up(30);

        type_text(&mut app, "hi");
        app.session.begin_submit();
        app.on_reply(Err(ChatError::Status {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: String::new(),
        }));
        assert!(!app.follow_latest);
        assert!(!app.session.is_loading());
    }

    #[test]
    fn test_scrolling_to_bottom_resumes_following() {
        let (mut app, _backend, _rx) = test_app();
        app.update_scroll_bounds(50, 10, 0);
        app.scroll_up(5);
        assert!(!app.follow_latest);
        app.scroll_down(2);
        assert!(!app.follow_latest);
        app.scroll_down(10);
        assert!(app.follow_latest);
        assert_eq!(app.scroll, 40);
    }

    #[test]
    fn test_code_scroll_is_clamped() {
        let (mut app, _backend, _rx) = test_app();
        app.update_scroll_bounds(10, 10, 6);
        app.code_scroll_right();
        app.code_scroll_right();
        assert_eq!(app.code_scroll, 6);
        app.code_scroll_left();
        assert_eq!(app.code_scroll, 2);
        app.update_scroll_bounds(10, 10, 0);
        assert_eq!(app.code_scroll, 0);
    }
}
