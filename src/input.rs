//! Keyboard input handling.
//!
//! Maps terminal key events to [`App`] actions.  Adding a new keybinding is
//! a single match arm in [`handle_key_event`].
//!
//! ## For contributors
//!
//! To add a new keybinding:
//!
//! 1. Add a method on [`App`] for the action (if one doesn't exist).
//! 2. Add a `KeyCode` match arm below that calls it.
//! 3. Update the help text in `ui::draw_status_bar`.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};

use crate::app::{App, View};

/// Process a single key event, updating app state accordingly.
///
/// Only reacts to key-press events (ignoring release / repeat) so that each
/// physical keypress triggers exactly one action.
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }

    match (app.view, key.code) {
        (_, KeyCode::Char('q')) => app.quit = true,
        (View::Detail, KeyCode::Esc | KeyCode::Backspace | KeyCode::Left) => app.close_detail(),
        (View::Exhibition, KeyCode::Esc) => app.toggle_exhibition(),
        (View::Browse, KeyCode::Esc) => app.quit = true,
        (_, KeyCode::Char('f')) => app.toggle_favorite(),
        (_, KeyCode::Char('e')) => app.toggle_exhibition(),
        (View::Detail, _) => {}

        (_, KeyCode::Down | KeyCode::Char('j')) => app.select_next(),
        (_, KeyCode::Up | KeyCode::Char('k')) => app.select_previous(),
        (_, KeyCode::Home | KeyCode::Char('g')) => app.select_first(),
        (_, KeyCode::End | KeyCode::Char('G')) => app.select_last(),
        (_, KeyCode::Enter) => app.open_detail(),

        (View::Browse, KeyCode::Char('n') | KeyCode::PageDown) => app.request_more(),
        (View::Browse, KeyCode::Tab) => app.cycle_source(),
        (View::Browse, KeyCode::Char('s')) => app.cycle_sort(),
        (View::Browse, KeyCode::Char('o')) => app.flip_sort_direction(),
        (View::Browse, KeyCode::Char('r')) => app.reload(),
        _ => {}
    }
}
