use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};

use crate::app::{App, InputMode};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string edits
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize => {}
        AppEvent::Tick => {
            app.tick_animation();
            app.poll_reply().await;
        }
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in either mode
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('c') => {
                app.should_quit = true;
                return;
            }
            KeyCode::Char('l') => {
                app.clear_chat();
                return;
            }
            _ => {}
        }
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        // Back to the input line
        KeyCode::Char('i') | KeyCode::Char('/') | KeyCode::Enter => {
            app.input_mode = InputMode::Editing;
        }

        // Transcript scrolling
        KeyCode::Char('j') | KeyCode::Down => app.scroll_down(),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_up(),
        KeyCode::Char('g') => app.scroll_to_top(),
        KeyCode::Char('G') => app.scroll_to_bottom(),

        // Suggested topic shortcuts, only while the panel is showing
        KeyCode::Char(c @ '1'..='4') => {
            if app.shows_suggested_topics() {
                let index = c as usize - '1' as usize;
                app.send_suggested_topic(index);
            }
        }

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => {
            app.send_current_input();
        }
        KeyCode::Backspace => {
            if app.cursor > 0 {
                app.cursor -= 1;
                let byte_pos = char_to_byte_index(&app.input, app.cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = app.input.chars().count();
            if app.cursor < char_count {
                let byte_pos = char_to_byte_index(&app.input, app.cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.cursor = app.cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.input.chars().count();
            app.cursor = (app.cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.cursor = 0;
        }
        KeyCode::End => {
            app.cursor = app.input.chars().count();
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.input, app.cursor);
            app.input.insert(byte_pos, c);
            app.cursor += 1;
        }
        _ => {}
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollDown => {
            app.scroll_down();
            app.scroll_down();
            app.scroll_down();
        }
        MouseEventKind::ScrollUp => {
            app.scroll_up();
            app.scroll_up();
            app.scroll_up();
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use crate::api::ChatClient;
    use crate::app::SUGGESTED_TOPICS;

    use super::*;

    fn test_app() -> App {
        App::new(ChatClient::new("http://127.0.0.1:1"))
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    #[test]
    fn typing_inserts_at_cursor_with_utf8() {
        let mut app = test_app();

        for c in "héllo".chars() {
            handle_key(&mut app, press(KeyCode::Char(c)));
        }
        assert_eq!(app.input, "héllo");
        assert_eq!(app.cursor, 5);

        // Move into the middle and insert
        handle_key(&mut app, press(KeyCode::Left));
        handle_key(&mut app, press(KeyCode::Left));
        handle_key(&mut app, press(KeyCode::Char('x')));
        assert_eq!(app.input, "hélxlo");
    }

    #[test]
    fn backspace_removes_before_cursor() {
        let mut app = test_app();
        app.input = "héllo".to_string();
        app.cursor = 2;

        handle_key(&mut app, press(KeyCode::Backspace));
        assert_eq!(app.input, "hllo");
        assert_eq!(app.cursor, 1);

        // At the start it does nothing
        handle_key(&mut app, press(KeyCode::Home));
        handle_key(&mut app, press(KeyCode::Backspace));
        assert_eq!(app.input, "hllo");
    }

    #[test]
    fn delete_removes_at_cursor() {
        let mut app = test_app();
        app.input = "abc".to_string();
        app.cursor = 3;

        handle_key(&mut app, press(KeyCode::Delete)); // past the end, no-op
        assert_eq!(app.input, "abc");

        handle_key(&mut app, press(KeyCode::Home));
        handle_key(&mut app, press(KeyCode::Delete));
        assert_eq!(app.input, "bc");
    }

    #[tokio::test]
    async fn enter_sends_the_input_line() {
        let mut app = test_app();
        app.input = "hello there".to_string();
        app.cursor = app.input.chars().count();

        handle_key(&mut app, press(KeyCode::Enter));

        assert_eq!(app.messages.len(), 2);
        assert_eq!(app.messages[1].content, "hello there");
        assert!(app.input.is_empty());
    }

    #[tokio::test]
    async fn digit_sends_topic_only_in_normal_mode_with_panel_showing() {
        let mut app = test_app();

        // Editing mode: digits are just text
        handle_key(&mut app, press(KeyCode::Char('2')));
        assert_eq!(app.input, "2");
        assert_eq!(app.messages.len(), 1);

        app.input.clear();
        app.cursor = 0;
        handle_key(&mut app, press(KeyCode::Esc));
        handle_key(&mut app, press(KeyCode::Char('2')));
        assert_eq!(app.messages[1].content, SUGGESTED_TOPICS[1]);
    }

    #[tokio::test]
    async fn digit_is_ignored_once_conversation_started() {
        let mut app = test_app();
        app.send_message("opener");

        handle_key(&mut app, press(KeyCode::Esc));
        handle_key(&mut app, press(KeyCode::Char('1')));

        assert_eq!(app.messages.len(), 2);
    }

    #[test]
    fn ctrl_l_clears_in_either_mode() {
        let mut app = test_app();
        app.messages.push(crate::app::Message {
            role: crate::app::Role::User,
            content: "x".to_string(),
        });

        handle_key(&mut app, ctrl('l'));
        assert_eq!(app.messages.len(), 1);
        assert_eq!(app.input_mode, InputMode::Editing);
    }

    #[test]
    fn quit_keys() {
        let mut app = test_app();
        handle_key(&mut app, ctrl('c'));
        assert!(app.should_quit);

        let mut app = test_app();
        handle_key(&mut app, press(KeyCode::Char('q')));
        assert!(!app.should_quit); // editing mode, 'q' is text
        assert_eq!(app.input, "q");

        handle_key(&mut app, press(KeyCode::Esc));
        handle_key(&mut app, press(KeyCode::Char('q')));
        assert!(app.should_quit);
    }

    #[test]
    fn char_index_conversion_handles_multibyte() {
        assert_eq!(char_to_byte_index("héllo", 0), 0);
        assert_eq!(char_to_byte_index("héllo", 2), 3);
        assert_eq!(char_to_byte_index("héllo", 99), 6);
    }
}
