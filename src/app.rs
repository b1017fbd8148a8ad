use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::api::ChatClient;
use crate::session;

/// Canned opening message; also what the transcript resets to on clear.
/// The trailing double-space before the newline is a markdown line break.
pub const GREETING: &str = "Hi! I'm **StudyBot**.  \nWhat would you like to learn about today?";

/// One-keystroke prompts offered while the transcript holds only the greeting.
pub const SUGGESTED_TOPICS: [&str; 4] = [
    "Create a study plan for Biology",
    "Quiz me on World History",
    "Explain Quantum Physics simply",
    "Tips for managing exam stress",
];

/// Shown when the reply task itself dies (panic or cancellation), as opposed
/// to the request failing inside the client.
pub const REPLY_FALLBACK: &str = "Sorry, I'm having trouble connecting right now.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    User,
    Bot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// The whole conversation state. Mutated only from the event loop, so a
/// request in flight is represented by plain fields rather than any locking.
pub struct App {
    pub should_quit: bool,
    pub input_mode: InputMode,

    // Transcript: append-only, reset wholesale by clear_chat
    pub messages: Vec<Message>,
    pub loading: bool,
    pending_reply: Option<JoinHandle<String>>,

    // Input line
    pub input: String,
    pub cursor: usize, // char index into input

    // Transcript viewport
    pub chat_scroll: u16,
    pub chat_height: u16,
    pub chat_width: u16,
    pub animation_frame: u8,

    // Backend
    pub session_id: String,
    client: ChatClient,
}

impl App {
    pub fn new(client: ChatClient) -> Self {
        Self {
            should_quit: false,
            // Focus starts on the input line, like a chat box should
            input_mode: InputMode::Editing,

            messages: vec![greeting_message()],
            loading: false,
            pending_reply: None,

            input: String::new(),
            cursor: 0,

            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            animation_frame: 0,

            session_id: session::generate_session_id(),
            client,
        }
    }

    /// Suggested topics are offered only before the first exchange.
    pub fn shows_suggested_topics(&self) -> bool {
        self.messages.len() == 1 && !self.loading
    }

    pub fn send_current_input(&mut self) {
        let text = self.input.clone();
        self.send_message(&text);
    }

    pub fn send_suggested_topic(&mut self, index: usize) {
        if let Some(topic) = SUGGESTED_TOPICS.get(index) {
            self.send_message(topic);
        }
    }

    /// Append the user message and spawn the backend call. Whitespace-only
    /// input is a no-op, and so is sending while a reply is pending.
    pub fn send_message(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() || self.pending_reply.is_some() {
            return;
        }

        self.messages.push(Message {
            role: Role::User,
            content: text.to_string(),
        });
        self.input.clear();
        self.cursor = 0;
        self.loading = true;
        self.scroll_to_bottom();

        let client = self.client.clone();
        let message = text.to_string();
        let thread_id = self.session_id.clone();
        self.pending_reply = Some(tokio::spawn(async move {
            client.send(&message, &thread_id).await
        }));
    }

    /// Called on tick: if the reply task has finished, append its result.
    /// The task returns a displayable string even on request failure; a
    /// join error means the task itself died and gets the second apology.
    pub async fn poll_reply(&mut self) {
        let finished = self
            .pending_reply
            .as_ref()
            .map(|task| task.is_finished())
            .unwrap_or(false);
        if !finished {
            return;
        }

        if let Some(task) = self.pending_reply.take() {
            let reply = match task.await {
                Ok(text) => text,
                Err(err) => {
                    tracing::error!("reply task failed: {err}");
                    REPLY_FALLBACK.to_string()
                }
            };
            self.messages.push(Message {
                role: Role::Bot,
                content: reply,
            });
            self.loading = false;
            // Focus returns to the input line once the reply lands
            self.input_mode = InputMode::Editing;
            self.scroll_to_bottom();
        }
    }

    /// Reset the transcript to the greeting, discarding all history. A reply
    /// still in flight is left alone and will append after the greeting,
    /// matching the fire-and-forget network model.
    pub fn clear_chat(&mut self) {
        self.messages = vec![greeting_message()];
        self.chat_scroll = 0;
    }

    pub fn tick_animation(&mut self) {
        if self.loading {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        let max = self.transcript_lines().saturating_sub(self.chat_height);
        if self.chat_scroll < max {
            self.chat_scroll += 1;
        }
    }

    pub fn scroll_to_top(&mut self) {
        self.chat_scroll = 0;
    }

    /// Scroll so the newest message (and the typing indicator while loading)
    /// is visible at the bottom of the viewport.
    pub fn scroll_to_bottom(&mut self) {
        let total = self.transcript_lines();
        let visible = if self.chat_height > 0 { self.chat_height } else { 20 };

        if total > visible {
            self.chat_scroll = total - visible;
        } else {
            self.chat_scroll = 0;
        }
    }

    /// Estimate of rendered transcript lines, accounting for wrapping at the
    /// current chat width. Mirrors the layout in ui.rs: a label line per
    /// message, the wrapped content, and a blank separator.
    fn transcript_lines(&self) -> u16 {
        // Character count is an approximation of display width, good enough
        // for keeping the bottom in view
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total: u16 = 0;
        for msg in &self.messages {
            total += 1; // label line
            for line in msg.content.lines() {
                let chars = line.chars().count();
                total += if chars == 0 {
                    1
                } else {
                    ((chars / wrap_width) + 1) as u16
                };
            }
            total += 1; // separator
        }

        if self.loading {
            total += 2; // label + typing indicator
        }

        total
    }
}

fn greeting_message() -> Message {
    Message {
        role: Role::Bot,
        content: GREETING.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::api::CONNECT_FALLBACK;

    use super::*;

    // Nothing listens on port 1, so requests fail fast with the fallback.
    fn app_with_dead_backend() -> App {
        App::new(ChatClient::new("http://127.0.0.1:1"))
    }

    async fn resolve_pending(app: &mut App) {
        for _ in 0..200 {
            app.poll_reply().await;
            if !app.loading {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("reply never resolved");
    }

    #[test]
    fn starts_with_only_the_greeting() {
        let app = app_with_dead_backend();
        assert_eq!(app.messages.len(), 1);
        assert_eq!(app.messages[0].role, Role::Bot);
        assert_eq!(app.messages[0].content, GREETING);
        assert!(app.shows_suggested_topics());
    }

    #[tokio::test]
    async fn whitespace_only_send_is_a_noop() {
        let mut app = app_with_dead_backend();

        app.send_message("");
        app.send_message("   \t  ");

        assert_eq!(app.messages.len(), 1);
        assert!(!app.loading);
    }

    #[tokio::test]
    async fn send_appends_user_message_and_clears_input() {
        let mut app = app_with_dead_backend();
        app.input = "  Quiz me on World History  ".to_string();
        app.cursor = app.input.chars().count();

        app.send_current_input();

        assert_eq!(app.messages.len(), 2);
        assert_eq!(app.messages[1].role, Role::User);
        assert_eq!(app.messages[1].content, "Quiz me on World History");
        assert!(app.loading);
        assert!(app.input.is_empty());
        assert_eq!(app.cursor, 0);
        assert!(!app.shows_suggested_topics());
    }

    #[tokio::test]
    async fn send_is_refused_while_reply_is_pending() {
        let mut app = app_with_dead_backend();

        app.send_message("first");
        app.send_message("second");

        // Only the first made it in
        assert_eq!(app.messages.len(), 2);
        assert_eq!(app.messages[1].content, "first");
    }

    #[tokio::test]
    async fn failed_request_appends_exactly_one_apology() {
        let mut app = app_with_dead_backend();

        app.send_message("hello");
        resolve_pending(&mut app).await;

        // Grew by exactly two: the user message and the apology
        assert_eq!(app.messages.len(), 3);
        assert_eq!(app.messages[2].role, Role::Bot);
        assert_eq!(app.messages[2].content, CONNECT_FALLBACK);
        assert_eq!(app.input_mode, InputMode::Editing);
    }

    #[tokio::test]
    async fn send_is_accepted_again_after_resolution() {
        let mut app = app_with_dead_backend();

        app.send_message("first");
        resolve_pending(&mut app).await;
        app.send_message("second");

        assert_eq!(app.messages.len(), 4);
        assert_eq!(app.messages[3].content, "second");
    }

    #[tokio::test]
    async fn session_id_is_stable_across_sends() {
        let mut app = app_with_dead_backend();
        let original = app.session_id.clone();

        app.send_message("first");
        resolve_pending(&mut app).await;
        app.send_message("second");

        assert_eq!(app.session_id, original);
    }

    #[tokio::test]
    async fn clear_chat_resets_to_the_greeting() {
        let mut app = app_with_dead_backend();
        app.send_message("hello");
        resolve_pending(&mut app).await;

        app.clear_chat();

        assert_eq!(app.messages.len(), 1);
        assert_eq!(app.messages[0].content, GREETING);
        assert!(app.shows_suggested_topics());
    }

    #[tokio::test]
    async fn suggested_topic_behaves_like_typing_it() {
        let mut app = app_with_dead_backend();

        app.send_suggested_topic(1);

        assert_eq!(app.messages[1].content, SUGGESTED_TOPICS[1]);
        assert!(app.loading);

        // Out-of-range index is a no-op
        let mut other = app_with_dead_backend();
        other.send_suggested_topic(4);
        assert_eq!(other.messages.len(), 1);
    }

    #[test]
    fn tick_animates_only_while_loading() {
        let mut app = app_with_dead_backend();

        app.tick_animation();
        assert_eq!(app.animation_frame, 0);

        app.loading = true;
        app.tick_animation();
        app.tick_animation();
        app.tick_animation();
        assert_eq!(app.animation_frame, 0); // wrapped around 0 -> 1 -> 2 -> 0
    }

    #[test]
    fn scroll_to_bottom_accounts_for_wrapping() {
        let mut app = app_with_dead_backend();
        app.chat_width = 10;
        app.chat_height = 5;
        app.messages.push(Message {
            role: Role::User,
            content: "a".repeat(35), // wraps to 4 lines at width 10
        });

        app.scroll_to_bottom();
        assert!(app.chat_scroll > 0);

        app.scroll_to_top();
        assert_eq!(app.chat_scroll, 0);
    }
}
