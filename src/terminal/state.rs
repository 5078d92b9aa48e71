use anyhow::Result;
use ratatui::widgets::ListState;
use std::path::PathBuf;

use crate::domain::LabelRule;
use crate::engine::evaluate;
use crate::store::gateway::RuleStore;
use crate::store::repo::RuleRepository;
use crate::surface::InboxSurface;
use crate::surface::snapshot::SnapshotInbox;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Rules,
    Preview,
}

/// An inbox row with the labels the current rules would give it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewRow {
    pub sender: String,
    pub subject: String,
    /// (label, color)
    pub labels: Vec<(String, String)>,
}

pub struct AppState {
    pub rules: Vec<LabelRule>,
    pub list_state: ListState,

    pub inbox_path: Option<PathBuf>,
    pub preview: Vec<PreviewRow>,
    pub preview_scroll: u16,

    pub focus: Focus,
    pub status: Option<String>,
}

impl AppState {
    pub fn new(inbox_path: Option<PathBuf>) -> Self {
        Self {
            rules: vec![],
            list_state: ListState::default(),
            inbox_path,
            preview: vec![],
            preview_scroll: 0,
            focus: Focus::Rules,
            status: None,
        }
    }

    pub fn reload<R: RuleRepository>(&mut self, store: &RuleStore<R>) -> Result<()> {
        self.rules = store.list()?;
        if self.rules.is_empty() {
            self.list_state.select(None);
        } else {
            let last = self.rules.len() - 1;
            let cur = self.list_state.selected().unwrap_or(0).min(last);
            self.list_state.select(Some(cur));
        }
        self.rebuild_preview();
        Ok(())
    }

    fn rebuild_preview(&mut self) {
        let inbox = match &self.inbox_path {
            Some(p) if p.exists() => match SnapshotInbox::load(p) {
                Ok(i) => i,
                Err(e) => {
                    self.status = Some(format!("Could not read inbox: {e}"));
                    SnapshotInbox::default()
                }
            },
            _ => SnapshotInbox::default(),
        };

        self.preview = inbox
            .row_ids()
            .into_iter()
            .filter_map(|id| {
                let row = &inbox.rows[id];
                let record = inbox.record(id)?;
                let labels = evaluate(&record, &self.rules)
                    .into_iter()
                    .map(|r| (r.label.clone(), r.color.clone()))
                    .collect();
                Some(PreviewRow {
                    sender: if row.sender_name.is_empty() {
                        row.sender_address.clone()
                    } else {
                        row.sender_name.clone()
                    },
                    subject: row.subject.clone(),
                    labels,
                })
            })
            .collect();
    }

    pub fn move_selection(&mut self, delta: i32) {
        if self.rules.is_empty() {
            self.list_state.select(None);
            return;
        }
        let cur = self.list_state.selected().unwrap_or(0) as i32;
        let len = self.rules.len() as i32;
        let next = (cur + delta).clamp(0, len - 1) as usize;
        self.list_state.select(Some(next));
    }

    pub fn delete_selected<R: RuleRepository>(&mut self, store: &RuleStore<R>) -> Result<()> {
        let Some(index) = self.list_state.selected() else {
            return Ok(());
        };
        let removed = store.delete(index)?;
        self.status = Some(format!("Deleted rule {}: {}", index + 1, removed.label));
        self.reload(store)
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Rules => Focus::Preview,
            Focus::Preview => Focus::Rules,
        };
    }

    pub fn scroll_preview(&mut self, delta: i32) {
        if delta < 0 {
            self.preview_scroll = self.preview_scroll.saturating_sub((-delta) as u16);
        } else {
            self.preview_scroll = self.preview_scroll.saturating_add(delta as u16);
        }
    }
}
