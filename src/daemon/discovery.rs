use log::{debug, info};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use crate::surface::snapshot;

/// Calls `probe` every `interval` until it yields a value or `running` is cleared.
///
/// There is no retry limit; `None` means the wait was cancelled.
pub fn poll_until_ready<T>(
    interval: Duration,
    running: &AtomicBool,
    mut probe: impl FnMut() -> Option<T>,
) -> Option<T> {
    while running.load(Ordering::SeqCst) {
        if let Some(found) = probe() {
            return Some(found);
        }
        thread::sleep(interval);
    }
    None
}

/// First candidate that currently holds a readable inbox snapshot.
pub fn find_inbox(candidates: &[PathBuf]) -> Option<PathBuf> {
    candidates.iter().find_map(|p| {
        let shape = snapshot::probe(p)?;
        debug!("{} looks like an inbox ({shape:?})", p.display());
        Some(p.clone())
    })
}

pub fn wait_for_inbox(
    candidates: &[PathBuf],
    interval: Duration,
    running: &AtomicBool,
) -> Option<PathBuf> {
    info!(
        "waiting for an inbox snapshot at {}",
        candidates
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );
    let found = poll_until_ready(interval, running, || find_inbox(candidates));
    if let Some(p) = &found {
        info!("watching {}", p.display());
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn returns_as_soon_as_probe_succeeds() {
        let running = AtomicBool::new(true);
        let mut calls = 0;
        let got = poll_until_ready(Duration::from_millis(1), &running, || {
            calls += 1;
            (calls == 3).then_some(calls)
        });
        assert_eq!(got, Some(3));
    }

    #[test]
    fn cancelled_wait_yields_none() {
        let running = AtomicBool::new(true);
        let got: Option<()> = poll_until_ready(Duration::from_millis(1), &running, || {
            running.store(false, Ordering::SeqCst);
            None
        });
        assert_eq!(got, None);
    }

    #[test]
    fn picks_first_candidate_with_a_known_shape() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        let garbage = dir.path().join("garbage.json");
        let bare = dir.path().join("bare.json");
        fs::write(&garbage, r#"{"items": []}"#).unwrap();
        fs::write(&bare, "[]").unwrap();

        let found = find_inbox(&[missing, garbage, bare.clone()]);
        assert_eq!(found, Some(bare));
    }
}
