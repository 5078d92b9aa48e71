pub mod discovery;

use anyhow::{Result, anyhow, bail};
use log::{debug, error, info};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
    sync::atomic::{AtomicBool, Ordering},
    thread,
    time::Duration,
};

use crate::engine::{ExternalChange, Labeler, PassReport};
use crate::store::gateway::RuleStore;
use crate::store::repo::RuleRepository;
use crate::surface::snapshot::{Fingerprint, SnapshotInbox, fingerprint};

pub struct DaemonConfig {
    pub poll_interval: Duration,
    pub bootstrap_delay: Duration,
    pub inbox_paths: Vec<PathBuf>,
}

/// Loads the snapshot at `path`, runs one pass and writes the labels back.
///
/// Nothing is written if the file was rewritten while the pass ran; the
/// caller gets an error and can run the pass again on the new contents.
fn label_snapshot<R: RuleRepository>(
    store: &RuleStore<R>,
    path: &Path,
    change: ExternalChange,
) -> Result<PassReport> {
    let mut inbox = SnapshotInbox::load(path)?;
    let report = Labeler::new(store).on_external_change(&mut inbox, change)?;
    if report.changed_surface() && !inbox.save_if_unmodified()? {
        bail!("{} changed during the pass", path.display());
    }
    Ok(report)
}

/// Labels the snapshot at `path` once, dropping labels of rules that no
/// longer exist.
pub fn apply_once<R: RuleRepository>(store: &RuleStore<R>, path: &Path) -> Result<PassReport> {
    label_snapshot(store, path, ExternalChange::Bootstrap)
        .map_err(|e| anyhow!("Error applying rules: {e}"))
}

/// Turns file and revision changes into engine passes over one inbox snapshot.
pub struct Watcher<'s, R: RuleRepository> {
    store: &'s RuleStore<R>,
    inbox_path: PathBuf,
    seen_file: Fingerprint,
    seen_revision: Option<i64>,
}

impl<'s, R: RuleRepository> Watcher<'s, R> {
    pub fn new(store: &'s RuleStore<R>, inbox_path: PathBuf) -> Self {
        Self {
            store,
            inbox_path,
            seen_file: None,
            seen_revision: None,
        }
    }

    /// What changed since the last successful pass, if anything.
    ///
    /// A rule change wins over a row change: its pass covers every row anyway.
    pub fn detect(&self) -> Result<Option<ExternalChange>> {
        let revision = self.store.revision()?;
        let change = match self.seen_revision {
            None => Some(ExternalChange::Bootstrap),
            Some(seen) if seen != revision => Some(ExternalChange::RulesChanged),
            Some(_) if fingerprint(&self.inbox_path) != self.seen_file => {
                Some(ExternalChange::RecordsMutated)
            }
            Some(_) => None,
        };
        Ok(change)
    }

    /// Runs the pass for `change` and writes the snapshot back if labels moved.
    ///
    /// Watcher state only advances on success, so a failed pass (including
    /// one that raced with a host rewrite) is retried on the next tick.
    pub fn handle(&mut self, change: ExternalChange) -> Result<PassReport> {
        let revision = self.store.revision()?;
        let report = label_snapshot(self.store, &self.inbox_path, change)?;
        self.seen_file = fingerprint(&self.inbox_path);
        self.seen_revision = Some(revision);
        Ok(report)
    }

    /// One observation step. Failures are logged and never escape.
    pub fn tick(&mut self) -> Option<PassReport> {
        let change = match self.detect() {
            Ok(Some(c)) => c,
            Ok(None) => return None,
            Err(e) => {
                error!("change detection failed: {e:#}");
                return None;
            }
        };
        debug!("{change:?} on {}", self.inbox_path.display());
        match self.handle(change) {
            Ok(report) => Some(report),
            Err(e) => {
                error!("error processing {change:?}: {e:#}");
                None
            }
        }
    }
}

pub fn run_daemon<R: RuleRepository>(store: &RuleStore<R>, cfg: DaemonConfig) -> Result<()> {
    let running = Arc::new(AtomicBool::new(true));
    let r2 = running.clone();
    ctrlc::set_handler(move || {
        r2.store(false, Ordering::SeqCst);
    })?;

    thread::sleep(cfg.bootstrap_delay);

    let Some(inbox_path) =
        discovery::wait_for_inbox(&cfg.inbox_paths, cfg.poll_interval, &running)
    else {
        info!("stopped before an inbox appeared");
        return Ok(());
    };

    let mut watcher = Watcher::new(store, inbox_path);
    while running.load(Ordering::SeqCst) {
        watcher.tick();
        thread::sleep(cfg.poll_interval);
    }

    info!("watcher stopped");
    Ok(())
}
