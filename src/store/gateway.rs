use log::{debug, info};
use thiserror::Error;

use crate::domain::rule::STORAGE_KEY;
use crate::domain::{LabelRule, RuleError, StorageData};
use crate::store::repo::RuleRepository;

/// Meta counter bumped on every write to the rule list.
pub const REVISION_KEY: &str = "rules_revision";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Invalid(#[from] RuleError),
    #[error("rule {position}: {source}")]
    InvalidImportedRule { position: usize, source: RuleError },
    #[error("invalid format: {0}")]
    Malformed(String),
    #[error("no rule at position {0}")]
    OutOfRange(usize),
    #[error("storage failure: {0}")]
    Storage(#[from] anyhow::Error),
}

/// Gateway over the persisted rule list.
///
/// Every mutation reads the whole list, changes it in memory and writes the
/// whole list back.
pub struct RuleStore<R: RuleRepository> {
    repo: R,
}

impl<R: RuleRepository> RuleStore<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn list(&self) -> Result<Vec<LabelRule>, StoreError> {
        let Some(blob) = self.repo.load_blob(STORAGE_KEY)? else {
            return Ok(Vec::new());
        };
        let data: StorageData = serde_json::from_str(&blob)
            .map_err(|e| StoreError::Storage(anyhow::anyhow!("stored rules unreadable: {e}")))?;
        Ok(data.label_rules)
    }

    /// Changes whenever the rule list is written, by this or any other process.
    pub fn revision(&self) -> Result<i64, StoreError> {
        Ok(self.repo.get_meta_i64(REVISION_KEY)?.unwrap_or(0))
    }

    fn replace_all(&self, rules: Vec<LabelRule>) -> Result<(), StoreError> {
        let data = StorageData { label_rules: rules };
        let blob = serde_json::to_string(&data).map_err(anyhow::Error::from)?;
        self.repo.store_blob(STORAGE_KEY, &blob, REVISION_KEY)?;
        debug!("persisted {} rule(s)", data.label_rules.len());
        Ok(())
    }

    pub fn create(&self, rule: LabelRule) -> Result<usize, StoreError> {
        rule.validate()?;
        let mut rules = self.list()?;
        info!("adding rule \"{}\"", rule.label);
        rules.push(rule);
        let index = rules.len() - 1;
        self.replace_all(rules)?;
        Ok(index)
    }

    pub fn update(&self, index: usize, rule: LabelRule) -> Result<(), StoreError> {
        rule.validate()?;
        let mut rules = self.list()?;
        let slot = rules.get_mut(index).ok_or(StoreError::OutOfRange(index + 1))?;
        info!("updating rule {} (\"{}\")", index + 1, rule.label);
        *slot = rule;
        self.replace_all(rules)
    }

    pub fn delete(&self, index: usize) -> Result<LabelRule, StoreError> {
        let mut rules = self.list()?;
        if index >= rules.len() {
            return Err(StoreError::OutOfRange(index + 1));
        }
        let removed = rules.remove(index);
        info!("deleting rule {} (\"{}\")", index + 1, removed.label);
        self.replace_all(rules)?;
        Ok(removed)
    }

    /// Replaces the whole list with the rules in `text`, or changes nothing.
    pub fn import_from(&self, text: &str) -> Result<usize, StoreError> {
        let rules = parse_import(text)?;
        let count = rules.len();
        self.replace_all(rules)?;
        info!("imported {count} rule(s)");
        Ok(count)
    }

    pub fn export_to(&self) -> Result<String, StoreError> {
        let data = StorageData {
            label_rules: self.list()?,
        };
        Ok(serde_json::to_string_pretty(&data).map_err(anyhow::Error::from)?)
    }
}

/// Parses and validates an import document. The first failing rule aborts.
pub fn parse_import(text: &str) -> Result<Vec<LabelRule>, StoreError> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| StoreError::Malformed(e.to_string()))?;

    let Some(entries) = value.get(STORAGE_KEY).and_then(|v| v.as_array()) else {
        return Err(StoreError::Malformed(format!(
            "missing {STORAGE_KEY} array"
        )));
    };

    let mut rules = Vec::with_capacity(entries.len());
    for (i, entry) in entries.iter().enumerate() {
        let position = i + 1;
        let rule: LabelRule = serde_json::from_value(entry.clone())
            .map_err(|e| StoreError::Malformed(format!("rule {position}: {e}")))?;
        rule.validate()
            .map_err(|source| StoreError::InvalidImportedRule { position, source })?;
        rules.push(rule);
    }
    Ok(rules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::sqlite::SqliteRepo;

    fn store() -> RuleStore<SqliteRepo> {
        RuleStore::new(SqliteRepo::open_in_memory().unwrap())
    }

    #[test]
    fn empty_store_lists_nothing() {
        let s = store();
        assert!(s.list().unwrap().is_empty());
        assert_eq!(s.revision().unwrap(), 0);
    }

    #[test]
    fn create_rejects_invalid_rule_without_writing() {
        let s = store();
        let err = s.create(LabelRule::new("").with_sender("x")).unwrap_err();
        assert!(matches!(err, StoreError::Invalid(RuleError::MissingLabel)));
        assert_eq!(err.to_string(), "label name is required");
        assert_eq!(s.revision().unwrap(), 0);
    }

    #[test]
    fn update_and_delete_by_position() {
        let s = store();
        s.create(LabelRule::new("a").with_subject("x")).unwrap();
        s.create(LabelRule::new("b").with_subject("y")).unwrap();

        s.update(0, LabelRule::new("A").with_subject("x")).unwrap();
        let removed = s.delete(1).unwrap();
        assert_eq!(removed.label, "b");

        let labels: Vec<_> = s.list().unwrap().into_iter().map(|r| r.label).collect();
        assert_eq!(labels, vec!["A"]);
    }

    #[test]
    fn out_of_range_reports_display_position() {
        let s = store();
        let err = s.delete(0).unwrap_err();
        assert_eq!(err.to_string(), "no rule at position 1");

        let err = s.update(2, LabelRule::new("a").with_subject("x")).unwrap_err();
        assert!(matches!(err, StoreError::OutOfRange(3)));
    }

    #[test]
    fn update_validates_before_reading() {
        let s = store();
        s.create(LabelRule::new("a").with_subject("x")).unwrap();
        let err = s.update(0, LabelRule::new("a")).unwrap_err();
        assert!(matches!(err, StoreError::Invalid(RuleError::NoConditions)));
        assert_eq!(s.list().unwrap()[0].subject.as_deref(), Some("x"));
    }

    #[test]
    fn malformed_payloads() {
        assert!(matches!(parse_import("not json"), Err(StoreError::Malformed(_))));
        assert!(matches!(parse_import("{}"), Err(StoreError::Malformed(_))));
        assert!(matches!(
            parse_import(r#"{"labelRules": {"label": "x"}}"#),
            Err(StoreError::Malformed(_))
        ));
        assert!(matches!(
            parse_import(r#"{"labelRules": [42]}"#),
            Err(StoreError::Malformed(_))
        ));
    }

    #[test]
    fn import_error_names_position_and_invariant() {
        let err = parse_import(
            r#"{"labelRules": [
                {"label": "a", "sender": "x"},
                {"label": "b"},
                {"label": "c", "content": "z"}
            ]}"#,
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "rule 2: at least one matching condition is required"
        );
    }

    #[test]
    fn empty_import_clears_the_list() {
        let s = store();
        s.create(LabelRule::new("a").with_subject("x")).unwrap();
        assert_eq!(s.import_from(r#"{"labelRules": []}"#).unwrap(), 0);
        assert!(s.list().unwrap().is_empty());
    }
}
