use anyhow::Result;
use ratatui::crossterm::event::{KeyCode, KeyEvent};

use crate::store::gateway::RuleStore;
use crate::store::repo::RuleRepository;
use crate::terminal::state::{AppState, Focus};

/// Returns `true` when the app should quit.
pub fn handle_key<R: RuleRepository>(
    key: KeyEvent,
    state: &mut AppState,
    store: &RuleStore<R>,
) -> Result<bool> {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return Ok(true),

        KeyCode::Tab => {
            state.toggle_focus();
            return Ok(false);
        }

        KeyCode::Char('r') => {
            state.reload(store)?;
            state.status = Some("Reloaded".to_string());
            return Ok(false);
        }

        _ => {}
    }

    match state.focus {
        Focus::Rules => handle_rule_keys(key, state, store),
        Focus::Preview => handle_preview_keys(key, state),
    }
}

fn handle_rule_keys<R: RuleRepository>(
    key: KeyEvent,
    state: &mut AppState,
    store: &RuleStore<R>,
) -> Result<bool> {
    match key.code {
        KeyCode::Down | KeyCode::Char('j') => state.move_selection(1),
        KeyCode::Up | KeyCode::Char('k') => state.move_selection(-1),
        KeyCode::Home => state.move_selection(i32::MIN / 2),
        KeyCode::End => state.move_selection(i32::MAX / 2),
        KeyCode::Char('d') | KeyCode::Delete => {
            if let Err(e) = state.delete_selected(store) {
                state.status = Some(format!("Delete failed: {e}"));
            }
        }
        _ => {}
    }
    Ok(false)
}

fn handle_preview_keys(key: KeyEvent, state: &mut AppState) -> Result<bool> {
    match key.code {
        KeyCode::Down | KeyCode::Char('j') => state.scroll_preview(1),
        KeyCode::Up | KeyCode::Char('k') => state.scroll_preview(-1),
        KeyCode::PageDown => state.scroll_preview(10),
        KeyCode::PageUp => state.scroll_preview(-10),
        KeyCode::Home => state.preview_scroll = 0,
        _ => {}
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LabelRule;
    use crate::store::sqlite::SqliteRepo;
    use ratatui::crossterm::event::KeyModifiers;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn navigation_delete_and_quit() {
        let store = RuleStore::new(SqliteRepo::open_in_memory().unwrap());
        for label in ["a", "b", "c"] {
            store.create(LabelRule::new(label).with_subject("x")).unwrap();
        }
        let mut state = AppState::new(None);
        state.reload(&store).unwrap();

        assert!(!handle_key(press(KeyCode::Char('j')), &mut state, &store).unwrap());
        assert!(!handle_key(press(KeyCode::End), &mut state, &store).unwrap());
        assert_eq!(state.list_state.selected(), Some(2));

        handle_key(press(KeyCode::Char('d')), &mut state, &store).unwrap();
        assert_eq!(store.list().unwrap().len(), 2);
        assert_eq!(state.list_state.selected(), Some(1));

        assert!(handle_key(press(KeyCode::Char('q')), &mut state, &store).unwrap());
    }
}
