use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
};
use ava_core::{
    render_content, ChatContext, ChatWidget, Entry, GateState, LineType, Mode, RenderedContent,
    LINK_LABEL, SUGGESTED_ACTIONS,
};
use crate::app::App;

/// Width of the panel when it is not expanded
const PANEL_WIDTH: u16 = 60;

/// Parse a line of text and convert **bold** markdown to styled spans
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find("**") {
        let after = &rest[start + 2..];
        let Some(end) = after.find("**") else {
            break;
        };
        if end == 0 {
            // "****" is not bold text
            spans.push(Span::raw(rest[..start + 4].to_string()));
            rest = &after[2..];
            continue;
        }
        if start > 0 {
            spans.push(Span::raw(rest[..start].to_string()));
        }
        spans.push(Span::styled(
            after[..end].to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ));
        rest = &after[end + 2..];
    }

    // Whatever is left, including an unclosed **, is literal
    if !rest.is_empty() {
        spans.push(Span::raw(rest.to_string()));
    }

    Line::from(spans)
}

/// Break `text` into lines no wider than `width` characters, on word
/// boundaries where possible
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    for raw in text.lines() {
        let mut current = String::new();
        let mut len = 0;
        for word in raw.split_whitespace() {
            let word_len = word.chars().count();
            if len > 0 && len + 1 + word_len > width {
                lines.push(std::mem::take(&mut current));
                len = 0;
            }
            if len > 0 {
                current.push(' ');
                len += 1;
            }
            // Words longer than a line are split
            for c in word.chars() {
                if len == width {
                    lines.push(std::mem::take(&mut current));
                    len = 0;
                }
                current.push(c);
                len += 1;
            }
        }
        lines.push(current);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    app.chat_area = None;
    match app.gate_state() {
        GateState::Checking => {
            let checking = Paragraph::new(Span::styled(
                " Checking session...",
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            ));
            frame.render_widget(checking, body_area);
        }
        // Signed out: the widget is not rendered at all
        GateState::SignedOut => {}
        GateState::SignedIn(_) => {
            let visible = app.widget.as_ref().map(|w| w.is_visible()).unwrap_or(false);
            if visible {
                render_panel(app, frame, body_area);
            } else {
                render_launcher(frame, body_area);
            }
        }
    }

    render_footer(app, frame, footer_area);

    if app.show_context_picker {
        render_context_picker(app, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let user = match app.gate.user() {
        Some(user) => format!(" {} <{}>", user.name, user.email),
        None => String::new(),
    };

    let title = Line::from(vec![
        Span::styled(" Ava ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(user, Style::default().fg(Color::White)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode = app.widget.as_ref().map(|w| (w.is_visible(), w.mode().clone()));
    let typing = matches!(&mode, Some((true, m)) if m.is_typing());

    let mode_style = if typing {
        Style::default().bg(Color::Yellow).fg(Color::Black)
    } else {
        Style::default().bg(Color::Blue).fg(Color::White)
    };

    let mode_text = match (app.gate_state(), &mode) {
        (GateState::Checking, _) => " CHECKING ",
        (_, None) => " SIGNED OUT ",
        (_, Some((false, _))) => " HIDDEN ",
        (_, Some((true, Mode::Viewing))) => " CHAT ",
        (_, Some((true, Mode::Composing))) => " COMPOSE ",
        (_, Some((true, Mode::Editing { .. }))) => " EDIT ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hint = |key: &'static str, label: &'static str| {
        [
            Span::styled(format!(" {} ", key), key_style),
            Span::styled(format!(" {} ", label), label_style),
        ]
    };

    let hints: Vec<Span> = if app.show_context_picker {
        [hint("j/k", "nav"), hint("Enter", "select"), hint("Esc", "cancel")].concat()
    } else {
        match &mode {
            None => hint("q", "quit").to_vec(),
            Some((false, _)) => {
                [hint("Enter", "open chat"), hint("L", "logout"), hint("q", "quit")].concat()
            }
            Some((true, Mode::Viewing)) => [
                hint("i", "type"),
                hint("j/k", "select"),
                hint("e", "edit"),
                hint("d", "delete"),
                hint("o", "open link"),
                hint("Tab", "context"),
                hint("z", "expand"),
                hint("x", "hide"),
                hint("r", "refresh"),
                hint("L", "logout"),
                hint("q", "quit"),
            ]
            .concat(),
            Some((true, Mode::Composing)) => {
                [hint("Enter", "send"), hint("Esc", "stop typing")].concat()
            }
            Some((true, Mode::Editing { .. })) => {
                [hint("Enter", "save"), hint("Esc", "cancel edit")].concat()
            }
        }
    };

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

/// Collapsed launcher in the bottom-right corner
fn render_launcher(frame: &mut Frame, area: Rect) {
    let width = 16.min(area.width);
    let height = 3.min(area.height);
    let launcher_area = Rect::new(
        area.x + area.width - width,
        area.y + area.height - height,
        width,
        height,
    );

    let launcher = Paragraph::new(Line::from(Span::styled(
        " Open Chat",
        Style::default().fg(Color::Cyan).bold(),
    )))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );
    frame.render_widget(launcher, launcher_area);
}

fn render_panel(app: &mut App, frame: &mut Frame, area: Rect) {
    let Some(widget) = app.widget.as_ref() else {
        return;
    };

    let panel_area = if widget.is_expanded() {
        area
    } else {
        let width = PANEL_WIDTH.min(area.width);
        Rect::new(area.x + area.width - width, area.y, width, area.height)
    };

    let typing = widget.mode().is_typing();
    let border_color = if typing { Color::Yellow } else { Color::Cyan };
    let panel_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(format!(" Ava · {} ", widget.context()));
    let inner = panel_block.inner(panel_area);
    frame.render_widget(Clear, panel_area);
    frame.render_widget(panel_block, panel_area);

    let suggestions_height = if widget.entries().is_empty() { 0 } else { 1 };
    let [avatar_area, list_area, suggestions_area, input_area] = Layout::vertical([
        Constraint::Length(2),
        Constraint::Min(0),
        Constraint::Length(suggestions_height),
        Constraint::Length(3),
    ])
    .areas(inner);

    // Avatar section
    let avatar = Paragraph::new(vec![
        Line::from(Span::styled("Hey👋, I'm Ava", Style::default().fg(Color::Yellow).bold())),
        Line::from(Span::styled(
            "Ask me anything or pick a place to start",
            Style::default().fg(Color::DarkGray),
        )),
    ]);
    frame.render_widget(avatar, avatar_area);

    let items = message_items(widget, list_area.width, app.animation_frame);
    let list = List::new(items)
        .highlight_style(Style::default().bg(Color::Black).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");

    // Store area for mouse hit-testing
    app.chat_area = Some(list_area);
    frame.render_stateful_widget(list, list_area, &mut app.selection);

    let Some(widget) = app.widget.as_ref() else {
        return;
    };

    if suggestions_height > 0 {
        render_suggestions(frame, suggestions_area);
    }

    render_input(widget, frame, input_area, !app.show_context_picker);
}

fn message_items(widget: &ChatWidget, width: u16, animation_frame: u8) -> Vec<ListItem<'static>> {
    // Leave room for the highlight symbol
    let text_width = width.saturating_sub(2) as usize;

    let mut items: Vec<ListItem> = widget
        .entries()
        .iter()
        .map(|entry| ListItem::new(entry_lines(entry, text_width)))
        .collect();

    if widget.entries().is_empty() && !widget.is_loading() {
        items.push(ListItem::new(Line::from(Span::styled(
            "No messages yet. Press i to start typing.",
            Style::default().fg(Color::DarkGray),
        ))));
    }

    if widget.is_busy() {
        let label = if widget.is_sending() { "Thinking" } else { "Loading" };
        let dots = ".".repeat((animation_frame as usize) + 1);
        items.push(ListItem::new(Line::from(Span::styled(
            format!("{}{}", label, dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        ))));
    }

    items
}

fn entry_lines(entry: &Entry, width: usize) -> Vec<Line<'static>> {
    let message = &entry.message;
    let mut lines = Vec::new();

    let author = match message.line_type {
        LineType::User => Span::styled(
            "You:",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        LineType::System => Span::styled(
            "Ava:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
    };
    let mut header = vec![author];
    if entry.pending.is_some() {
        header.push(Span::styled(" sending", Style::default().fg(Color::DarkGray)));
    }
    lines.push(Line::from(header));

    let body_style = if entry.pending.is_some() {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    };

    match render_content(&message.content) {
        RenderedContent::Plain(text) => {
            for line in wrap_text(text, width) {
                lines.push(parse_markdown_line(&line).patch_style(body_style));
            }
        }
        RenderedContent::DocumentLink { text, url } => {
            if !text.trim().is_empty() {
                for line in wrap_text(text.trim_end(), width) {
                    lines.push(parse_markdown_line(&line).patch_style(body_style));
                }
            }
            lines.push(Line::from(Span::styled(
                LINK_LABEL,
                Style::default().fg(Color::Blue).add_modifier(Modifier::UNDERLINED),
            )));
            for line in wrap_text(url, width) {
                lines.push(Line::from(Span::styled(line, Style::default().fg(Color::DarkGray))));
            }
        }
    }

    lines.push(Line::default());
    lines
}

fn render_suggestions(frame: &mut Frame, area: Rect) {
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);

    let spans: Vec<Span> = SUGGESTED_ACTIONS
        .iter()
        .enumerate()
        .flat_map(|(i, action)| {
            [
                Span::styled(format!(" {} ", i + 1), key_style),
                Span::styled(format!(" {} ", action), Style::default().fg(Color::Green)),
            ]
        })
        .collect();

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_input(widget: &ChatWidget, frame: &mut Frame, area: Rect, show_cursor: bool) {
    let (title, border_color) = match widget.mode() {
        Mode::Editing { .. } => (" Editing message (Esc to cancel) ".to_string(), Color::Yellow),
        Mode::Composing => (
            format!(" Message {} (Enter to send) ", widget.context()),
            Color::Yellow,
        ),
        Mode::Viewing => (" Message (i to type) ".to_string(), Color::DarkGray),
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Calculate visible portion of input with horizontal scrolling
    // Inner width = total width - 2 (for borders)
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = widget.input().cursor();

    // Calculate scroll offset to keep cursor visible
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = widget
        .input()
        .text()
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);

    frame.render_widget(input, area);

    // Show cursor when typing
    if show_cursor && widget.mode().is_typing() {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_context_picker(app: &mut App, frame: &mut Frame, area: Rect) {
    let contexts = ChatContext::selectable();
    let current = app.widget.as_ref().map(|w| w.context());

    // Calculate popup size and position (centered)
    let popup_width = 40.min(area.width.saturating_sub(4));
    let popup_height = (contexts.len() as u16 + 2).min(area.height.saturating_sub(4));

    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Select Context (Enter to select, Esc to cancel) ");

    let items: Vec<ListItem> = contexts
        .iter()
        .map(|context| {
            let style = if Some(*context) == current {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(format!(" {} ", context)).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, popup_area, &mut app.context_picker_state);
}
