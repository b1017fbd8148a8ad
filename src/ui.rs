use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, InputMode, Role, SUGGESTED_TOPICS};

/// Style one line of message content, turning `**bold**` runs into bold
/// spans. Chat replies are markdown; this is the whole subset the transcript
/// renders, plus the paragraph splitting the caller already did. Anything
/// unmatched stays literal, and nothing is ever executed as markup.
fn markdown_line(text: &str) -> Line<'static> {
    // A trailing double-space is markdown's hard-break marker; the text is
    // already split into lines, so drop it
    let text = text.trim_end();

    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut rest = text;
    let mut bold = false;

    while let Some(idx) = rest.find("**") {
        let (chunk, tail) = rest.split_at(idx);
        if !chunk.is_empty() {
            spans.push(content_span(chunk, bold));
        }
        rest = &tail[2..];

        if bold {
            bold = false;
        } else if rest.contains("**") {
            bold = true;
        } else {
            // Opener with no closer renders literally
            spans.push(Span::raw("**".to_string()));
        }
    }
    if !rest.is_empty() {
        spans.push(content_span(rest, bold));
    }

    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

fn content_span(text: &str, bold: bool) -> Span<'static> {
    if bold {
        Span::styled(
            text.to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        )
    } else {
        Span::raw(text.to_string())
    }
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_body(app, frame, body_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" StudyBot ", Style::default().fg(Color::Cyan).bold()),
        Span::styled("Your Smart Study Buddy ", Style::default().fg(Color::White)),
        Span::styled(
            format!("v{} ", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
        Span::styled(format!("[{}]", app.session_id), Style::default().fg(Color::Gray)),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_body(app: &mut App, frame: &mut Frame, area: Rect) {
    // 4 topics + borders
    let topics_height = if app.shows_suggested_topics() { 6 } else { 0 };

    let [chat_area, topics_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(topics_height),
        Constraint::Length(3),
    ])
    .areas(area);

    render_chat(app, frame, chat_area);
    if topics_height > 0 {
        render_topics(frame, topics_area);
    }
    render_input(app, frame, input_area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    // Inner dimensions feed the auto-scroll math in App
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Conversation ");

    let mut lines: Vec<Line> = Vec::new();

    for msg in &app.messages {
        match msg.role {
            Role::User => {
                // User bubbles hug the right edge
                lines.push(
                    Line::from(Span::styled(
                        "You:",
                        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                    ))
                    .alignment(Alignment::Right),
                );
                for line in msg.content.lines() {
                    lines.push(Line::from(line.to_string()).alignment(Alignment::Right));
                }
                lines.push(Line::default());
            }
            Role::Bot => {
                lines.push(Line::from(Span::styled(
                    "StudyBot:",
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                )));
                for line in msg.content.lines() {
                    lines.push(markdown_line(line));
                }
                lines.push(Line::default());
            }
        }
    }

    if app.loading {
        lines.push(Line::from(Span::styled(
            "StudyBot:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        // Cycling ellipsis while the reply is in flight
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Typing{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    let chat = Paragraph::new(Text::from(lines))
        .block(chat_block)
        .wrap(Wrap { trim: false })
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

fn render_topics(frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta))
        .title(" Suggested topics (Esc, then 1-4) ");

    let items: Vec<ListItem> = SUGGESTED_TOPICS
        .iter()
        .enumerate()
        .map(|(i, topic)| {
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!(" {}. ", i + 1),
                    Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
                ),
                Span::raw(*topic),
            ]))
        })
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing;
    let border_color = if editing { Color::Yellow } else { Color::DarkGray };
    let title = if app.loading {
        " Waiting for StudyBot... "
    } else {
        " Ask anything "
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Horizontal scroll keeps the cursor inside the box
    let inner_width = area.width.saturating_sub(2) as usize;
    let scroll_offset = if inner_width == 0 {
        0
    } else if app.cursor >= inner_width {
        app.cursor - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app
        .input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);

    frame.render_widget(input, area);

    if editing {
        let cursor_x = (app.cursor - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let mut hints: Vec<Span> = match app.input_mode {
        InputMode::Editing => vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" send ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" scroll ", label_style),
        ],
        InputMode::Normal => {
            let mut hints = vec![
                Span::styled(" i ", key_style),
                Span::styled(" ask ", label_style),
                Span::styled(" j/k ", key_style),
                Span::styled(" scroll ", label_style),
            ];
            if app.shows_suggested_topics() {
                hints.push(Span::styled(" 1-4 ", key_style));
                hints.push(Span::styled(" topic ", label_style));
            }
            hints.push(Span::styled(" q ", key_style));
            hints.push(Span::styled(" quit ", label_style));
            hints
        }
    };

    hints.push(Span::styled(" Ctrl+L ", key_style));
    hints.push(Span::styled(" clear ", label_style));

    let footer = Paragraph::new(Line::from(hints));
    frame.render_widget(footer, area);
}
