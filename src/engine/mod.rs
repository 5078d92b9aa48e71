//! Rule matching and row annotation.
//!
//! [`matcher`] decides which rules fire for a record; [`annotate`] puts the
//! resulting labels on the surface without ever duplicating one. [`Labeler`]
//! ties both to the rule store behind a single change entry point.

pub mod annotate;
pub mod matcher;

use log::{debug, info};

use crate::domain::LabelRule;
use crate::store::gateway::{RuleStore, StoreError};
use crate::store::repo::RuleRepository;
use crate::surface::InboxSurface;

pub use annotate::{apply_annotations, clear_annotations};
pub use matcher::{evaluate, rule_fires};

/// Why a pass is being run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalChange {
    /// First pass after startup. Labels already on the surface may come from
    /// rules that have since been edited or deleted.
    Bootstrap,
    /// Rows were added, removed or rewritten.
    RecordsMutated,
    /// The persisted rule list was written.
    RulesChanged,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    pub rows: usize,
    pub fired: usize,
    pub created: usize,
    pub cleared: usize,
}

impl PassReport {
    pub fn changed_surface(&self) -> bool {
        self.created > 0 || self.cleared > 0
    }
}

/// Evaluates every visible row against `rules` and annotates the matches.
pub fn run_pass(surface: &mut dyn InboxSurface, rules: &[LabelRule]) -> PassReport {
    let mut report = PassReport::default();
    for row in surface.row_ids() {
        let Some(record) = surface.record(row) else {
            continue;
        };
        report.rows += 1;
        let fired = evaluate(&record, rules);
        report.fired += fired.len();
        report.created += apply_annotations(surface, row, &fired);
    }
    report
}

pub struct Labeler<'s, R: RuleRepository> {
    store: &'s RuleStore<R>,
}

impl<'s, R: RuleRepository> Labeler<'s, R> {
    pub fn new(store: &'s RuleStore<R>) -> Self {
        Self { store }
    }

    /// Runs one pass in response to `change`.
    ///
    /// Bootstrap and rule changes first strip every managed annotation so
    /// labels of deleted or edited rules do not linger; the pass that follows
    /// re-adds whatever still applies.
    pub fn on_external_change(
        &self,
        surface: &mut dyn InboxSurface,
        change: ExternalChange,
    ) -> Result<PassReport, StoreError> {
        let cleared = match change {
            ExternalChange::Bootstrap | ExternalChange::RulesChanged => clear_annotations(surface),
            ExternalChange::RecordsMutated => 0,
        };

        let rules = self.store.list()?;
        let mut report = run_pass(surface, &rules);
        report.cleared = cleared;

        debug!(
            "{change:?}: {} row(s), {} rule(s), {} fired",
            report.rows,
            rules.len(),
            report.fired
        );
        if report.changed_surface() {
            info!(
                "{change:?}: cleared {} and added {} label(s)",
                report.cleared, report.created
            );
        }
        Ok(report)
    }
}
