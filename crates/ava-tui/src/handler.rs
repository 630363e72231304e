use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use ava_core::{GateState, Mode};
use crate::app::App;
use crate::tui::AppEvent;

pub fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize => {}
        AppEvent::Tick => {
            app.tick_animation();
        }
        AppEvent::Session(result) => app.on_session(result),
        AppEvent::Chat(outcome) => app.on_outcome(outcome),
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    // Popup takes precedence
    if app.show_context_picker {
        handle_context_picker(app, key);
        return;
    }

    let Some(widget) = app.widget.as_ref() else {
        // Checking or signed out: nothing to drive
        if key.code == KeyCode::Char('q') {
            app.should_quit = true;
        }
        return;
    };

    if !widget.is_visible() {
        handle_hidden(app, key);
    } else if widget.mode().is_typing() {
        handle_typing(app, key);
    } else {
        handle_viewing(app, key);
    }
}

fn handle_context_picker(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.context_picker_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.context_picker_nav_up(),
        KeyCode::Enter => app.select_context_from_picker(),
        KeyCode::Esc => app.show_context_picker = false,
        _ => {}
    }
}

fn handle_hidden(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter | KeyCode::Char('c') => {
            if let Some(widget) = app.widget.as_mut() {
                widget.toggle_visible();
            }
        }
        KeyCode::Char('L') => logout(app),
        KeyCode::Char('q') => app.should_quit = true,
        _ => {}
    }
}

fn handle_viewing(app: &mut App, key: KeyEvent) {
    match key.code {
        // Quit
        KeyCode::Char('q') => app.should_quit = true,

        // Input focus
        KeyCode::Char('i') | KeyCode::Enter => {
            if let Some(widget) = app.widget.as_mut() {
                widget.focus_input();
            }
        }

        // Message selection
        KeyCode::Char('j') | KeyCode::Down => app.select_next(),
        KeyCode::Char('k') | KeyCode::Up => app.select_prev(),
        KeyCode::Char('g') => app.select_first(),
        KeyCode::Char('G') => app.select_last(),

        // Message actions
        KeyCode::Char('e') => app.edit_selected(),
        KeyCode::Char('d') => app.delete_selected(),
        KeyCode::Char('o') => {
            if let Some(url) = app.selected_link() {
                open_in_browser(&url);
            }
        }
        KeyCode::Char('r') => app.refresh(),

        // Context
        KeyCode::Tab => app.next_context(),
        KeyCode::Char('C') => app.open_context_picker(),

        // Suggested actions, offered once there is a conversation
        KeyCode::Char(c @ ('1' | '2')) => {
            if let Some(widget) = app.widget.as_mut() {
                if !widget.entries().is_empty() {
                    widget.suggest(c as usize - '1' as usize);
                }
            }
        }

        // Layout
        KeyCode::Char('z') => {
            if let Some(widget) = app.widget.as_mut() {
                widget.toggle_expanded();
            }
        }
        KeyCode::Char('x') | KeyCode::Esc => {
            if let Some(widget) = app.widget.as_mut() {
                widget.toggle_visible();
            }
        }

        KeyCode::Char('L') => logout(app),

        _ => {}
    }
}

fn handle_typing(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Enter {
        app.submit();
        return;
    }

    let Some(widget) = app.widget.as_mut() else {
        return;
    };

    match key.code {
        KeyCode::Esc => {
            if matches!(widget.mode(), Mode::Editing { .. }) {
                widget.cancel_edit();
            } else {
                widget.blur_input();
            }
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            widget.input_mut().insert(c);
        }
        KeyCode::Backspace => widget.input_mut().backspace(),
        KeyCode::Delete => widget.input_mut().delete(),
        KeyCode::Left => widget.input_mut().move_left(),
        KeyCode::Right => widget.input_mut().move_right(),
        KeyCode::Home => widget.input_mut().move_home(),
        KeyCode::End => widget.input_mut().move_end(),
        _ => {}
    }
}

fn logout(app: &mut App) {
    let url = app.logout();
    log::info!("[session] signing out via {}", url);
    open_in_browser(&url);
}

fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    if app.gate_state() == &GateState::SignedOut || app.show_context_picker {
        return;
    }

    let in_chat = app
        .chat_area
        .map(|r| point_in_rect(mouse.column, mouse.row, r))
        .unwrap_or(false);
    if !in_chat {
        return;
    }

    match mouse.kind {
        MouseEventKind::ScrollDown => app.select_next(),
        MouseEventKind::ScrollUp => app.select_prev(),
        _ => {}
    }
}

fn open_in_browser(url: &str) {
    use std::process::{Command, Stdio};

    let opener = if cfg!(target_os = "macos") { "open" } else { "xdg-open" };
    let spawned = Command::new(opener)
        .arg(url)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();

    if let Err(err) = spawned {
        log::warn!("[handler] could not open {} with {}: {}", url, opener, err);
    }
}
