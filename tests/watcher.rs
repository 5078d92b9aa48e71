use std::fs;
use std::path::Path;

use rs_mail_labeler::daemon::{Watcher, apply_once};
use rs_mail_labeler::domain::LabelRule;
use rs_mail_labeler::engine::ExternalChange;
use rs_mail_labeler::store::RuleStore;
use rs_mail_labeler::store::sqlite::SqliteRepo;
use rs_mail_labeler::surface::snapshot::{Row, SnapshotInbox};

fn write_inbox(path: &Path, rows: Vec<Row>) {
    SnapshotInbox::from_rows(rows).save_to(path).unwrap();
}

fn managed_labels(path: &Path) -> Vec<Vec<String>> {
    SnapshotInbox::load(path)
        .unwrap()
        .rows
        .iter()
        .map(|r| {
            r.all_annotations()
                .filter(|a| a.is_managed())
                .map(|a| a.text.clone())
                .collect()
        })
        .collect()
}

#[test]
fn bootstrap_then_rule_change_then_row_change() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("inbox.json");
    write_inbox(
        &path,
        vec![
            Row::new("Bob", "bob@acme.com", "Invoice", ""),
            Row::new("Ann", "ann@home.net", "Hello", ""),
        ],
    );

    let store = RuleStore::new(SqliteRepo::open(&dir.path().join("rules.db")).unwrap());
    store.create(LabelRule::new("Acme").with_email("acme")).unwrap();

    let mut watcher = Watcher::new(&store, path.clone());

    assert_eq!(watcher.detect().unwrap(), Some(ExternalChange::Bootstrap));
    let report = watcher.tick().unwrap();
    assert_eq!(report.created, 1);
    assert_eq!(managed_labels(&path), vec![vec!["Acme"], vec![]]);

    // our own write does not count as a row change
    assert_eq!(watcher.detect().unwrap(), None);
    assert!(watcher.tick().is_none());

    store.delete(0).unwrap();
    store.create(LabelRule::new("Ann").with_sender("ann")).unwrap();
    assert_eq!(watcher.detect().unwrap(), Some(ExternalChange::RulesChanged));
    let report = watcher.tick().unwrap();
    assert_eq!(report.cleared, 1);
    assert_eq!(managed_labels(&path), vec![vec![], vec!["Ann"]]);

    // host rewrites the inbox with an extra row, keeping existing annotations
    let mut inbox = SnapshotInbox::load(&path).unwrap();
    inbox.rows.push(Row::new("Ann", "ann@work.org", "Standup", ""));
    inbox.save_to(&path).unwrap();

    assert_eq!(watcher.detect().unwrap(), Some(ExternalChange::RecordsMutated));
    let report = watcher.tick().unwrap();
    assert_eq!(report.created, 1);
    assert_eq!(managed_labels(&path), vec![vec![], vec!["Ann"], vec!["Ann"]]);
}

#[test]
fn failed_pass_is_retried_on_next_tick() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("inbox.json");
    fs::write(&path, "this is not json").unwrap();

    let store = RuleStore::new(SqliteRepo::open_in_memory().unwrap());
    store.create(LabelRule::new("Acme").with_email("acme")).unwrap();

    let mut watcher = Watcher::new(&store, path.clone());
    assert!(watcher.tick().is_none());
    assert_eq!(watcher.detect().unwrap(), Some(ExternalChange::Bootstrap));

    write_inbox(&path, vec![Row::new("", "ops@acme.com", "", "")]);
    let report = watcher.tick().unwrap();
    assert_eq!(report.created, 1);
}

#[test]
fn restart_clears_labels_of_rules_removed_while_stopped() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("inbox.json");
    let db = dir.path().join("rules.db");
    write_inbox(&path, vec![Row::new("Bob", "bob@acme.com", "Invoice 7", "")]);

    {
        let store = RuleStore::new(SqliteRepo::open(&db).unwrap());
        store.create(LabelRule::new("Acme").with_email("acme")).unwrap();
        Watcher::new(&store, path.clone()).tick().unwrap();
    }
    assert_eq!(managed_labels(&path), vec![vec!["Acme"]]);

    // rules edited from another process while nothing watches the inbox
    {
        let store = RuleStore::new(SqliteRepo::open(&db).unwrap());
        store.delete(0).unwrap();
        store.create(LabelRule::new("Bills").with_subject("invoice")).unwrap();
    }

    let store = RuleStore::new(SqliteRepo::open(&db).unwrap());
    let report = Watcher::new(&store, path.clone()).tick().unwrap();
    assert_eq!(report.cleared, 1);
    assert_eq!(report.created, 1);
    assert_eq!(managed_labels(&path), vec![vec!["Bills"]]);
}

#[test]
fn apply_once_labels_the_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("inbox.json");
    write_inbox(
        &path,
        vec![
            Row::new("Bob", "bob@acme.com", "Invoice", ""),
            Row::new("Ann", "ann@home.net", "Hello", "").with_label_cell(),
        ],
    );
    let store = RuleStore::new(SqliteRepo::open_in_memory().unwrap());
    store.create(LabelRule::new("Acme").with_email("acme")).unwrap();
    store.create(LabelRule::new("Ann").with_sender("ann")).unwrap();

    let report = apply_once(&store, &path).unwrap();
    assert_eq!(report.rows, 2);
    assert_eq!(report.created, 2);
    assert_eq!(managed_labels(&path), vec![vec!["Acme"], vec!["Ann"]]);

    apply_once(&store, &path).unwrap();
    assert_eq!(managed_labels(&path), vec![vec!["Acme"], vec!["Ann"]]);
}

#[test]
fn apply_once_with_no_rules_left_removes_their_labels() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("inbox.json");
    write_inbox(&path, vec![Row::new("Bob", "bob@acme.com", "Invoice", "")]);
    let store = RuleStore::new(SqliteRepo::open_in_memory().unwrap());
    store.create(LabelRule::new("Acme").with_email("acme")).unwrap();
    apply_once(&store, &path).unwrap();

    store.delete(0).unwrap();
    assert!(store.list().unwrap().is_empty());

    let report = apply_once(&store, &path).unwrap();
    assert_eq!(report.cleared, 1);
    assert_eq!(report.created, 0);
    assert_eq!(managed_labels(&path), vec![Vec::<String>::new()]);
}

#[test]
fn apply_once_failure_is_reported_with_its_cause() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("inbox.json");
    fs::write(&path, r#"{"items": []}"#).unwrap();
    let store = RuleStore::new(SqliteRepo::open_in_memory().unwrap());
    store.create(LabelRule::new("Acme").with_email("acme")).unwrap();

    let msg = apply_once(&store, &path).unwrap_err().to_string();
    assert!(msg.starts_with("Error applying rules: "), "{msg}");
    assert!(msg.contains("not an inbox snapshot"), "{msg}");
    assert_eq!(fs::read_to_string(&path).unwrap(), r#"{"items": []}"#);
}
