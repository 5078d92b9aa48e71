pub mod events;
pub mod state;
pub mod ui;

use anyhow::Result;
use ratatui::DefaultTerminal;
use ratatui::crossterm::event::{self, Event, KeyEventKind};
use std::path::PathBuf;

use crate::store::gateway::RuleStore;
use crate::store::repo::RuleRepository;
use crate::terminal::state::AppState;

/// Rule browser with a live preview of the labels each inbox row would get.
pub fn run_tui<R: RuleRepository>(store: &RuleStore<R>, inbox_path: Option<PathBuf>) -> Result<()> {
    let mut state = AppState::new(inbox_path);
    state.reload(store)?;

    let terminal = ratatui::init();
    let result = run(terminal, &mut state, store);
    ratatui::restore();

    result
}

fn run<R: RuleRepository>(
    mut terminal: DefaultTerminal,
    state: &mut AppState,
    store: &RuleStore<R>,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::render(f, state))?;
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if events::handle_key(key, state, store)? {
                break;
            }
        }
    }
    Ok(())
}
