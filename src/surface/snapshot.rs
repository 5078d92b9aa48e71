use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::domain::{Annotation, Record};
use crate::surface::{InboxSurface, RowId};

/// One inbox row as stored in a snapshot file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    #[serde(default)]
    pub sender_name: String,
    #[serde(default)]
    pub sender_address: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub snippet: String,
    /// The dedicated cell labels go into, when the row layout has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_cell: Option<Vec<Annotation>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
}

impl Row {
    pub fn new(sender_name: &str, sender_address: &str, subject: &str, snippet: &str) -> Self {
        Self {
            sender_name: sender_name.to_string(),
            sender_address: sender_address.to_string(),
            subject: subject.to_string(),
            snippet: snippet.to_string(),
            ..Default::default()
        }
    }

    pub fn with_label_cell(mut self) -> Self {
        self.label_cell = Some(Vec::new());
        self
    }

    fn scope(&self) -> &Vec<Annotation> {
        self.label_cell.as_ref().unwrap_or(&self.annotations)
    }

    fn scope_mut(&mut self) -> &mut Vec<Annotation> {
        match self.label_cell.as_mut() {
            Some(cell) => cell,
            None => &mut self.annotations,
        }
    }

    /// Every annotation on the row, label cell first.
    pub fn all_annotations(&self) -> impl Iterator<Item = &Annotation> {
        self.label_cell.iter().flatten().chain(self.annotations.iter())
    }
}

/// The two layouts a snapshot file may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotShape {
    /// `{ "rows": [...] }`
    Rows,
    /// `[...]`
    Bare,
}

#[derive(Serialize, Deserialize)]
struct RowsDocument {
    rows: Vec<Row>,
}

fn shape_of(value: &serde_json::Value) -> Option<SnapshotShape> {
    match value {
        serde_json::Value::Array(_) => Some(SnapshotShape::Bare),
        serde_json::Value::Object(map) if map.get("rows").is_some_and(|r| r.is_array()) => {
            Some(SnapshotShape::Rows)
        }
        _ => None,
    }
}

/// Discovery predicate: the file exists and holds one of the two known shapes.
pub fn probe(path: &Path) -> Option<SnapshotShape> {
    let s = fs::read_to_string(path).ok()?;
    let value: serde_json::Value = serde_json::from_str(&s).ok()?;
    shape_of(&value)
}

/// Modification time and length of a snapshot file.
pub type Fingerprint = Option<(SystemTime, u64)>;

pub fn fingerprint(path: &Path) -> Fingerprint {
    let meta = fs::metadata(path).ok()?;
    Some((meta.modified().ok()?, meta.len()))
}

/// An inbox snapshot file acting as the live host surface.
#[derive(Debug, Clone, Default)]
pub struct SnapshotInbox {
    path: Option<PathBuf>,
    loaded: Fingerprint,
    pub rows: Vec<Row>,
}

impl SnapshotInbox {
    pub fn from_rows(rows: Vec<Row>) -> Self {
        Self {
            rows,
            ..Default::default()
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let loaded = fingerprint(path);
        let s = fs::read_to_string(path)?;
        let value: serde_json::Value = serde_json::from_str(&s)?;
        let rows = match shape_of(&value) {
            Some(SnapshotShape::Bare) => serde_json::from_value::<Vec<Row>>(value)?,
            Some(SnapshotShape::Rows) => serde_json::from_value::<RowsDocument>(value)?.rows,
            None => {
                return Err(anyhow!(
                    "{} is not an inbox snapshot (expected a rows array)",
                    path.display()
                ));
            }
        };
        Ok(Self {
            path: Some(path.to_path_buf()),
            loaded,
            rows,
        })
    }

    /// Writes back to the file it was loaded from, unless someone else
    /// rewrote that file in the meantime; returns `false` in that case.
    pub fn save_if_unmodified(&self) -> Result<bool> {
        let path = self
            .path
            .as_deref()
            .ok_or_else(|| anyhow!("snapshot has no backing file"))?;
        if fingerprint(path) != self.loaded {
            return Ok(false);
        }
        self.save_to(path)?;
        Ok(true)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let doc = RowsDocument {
            rows: self.rows.clone(),
        };
        let s = serde_json::to_string_pretty(&doc)?;
        fs::write(path, s)?;
        Ok(())
    }
}

impl InboxSurface for SnapshotInbox {
    fn row_ids(&self) -> Vec<RowId> {
        (0..self.rows.len()).collect()
    }

    fn record(&self, row: RowId) -> Option<Record> {
        let r = self.rows.get(row)?;
        Some(Record::new(
            &r.sender_name,
            &r.sender_address,
            &r.subject,
            &r.snippet,
        ))
    }

    fn annotations(&self, row: RowId) -> Vec<Annotation> {
        self.rows
            .get(row)
            .map(|r| r.scope().clone())
            .unwrap_or_default()
    }

    fn attach(&mut self, row: RowId, annotation: Annotation) {
        if let Some(r) = self.rows.get_mut(row) {
            r.scope_mut().push(annotation);
        }
    }

    fn clear_managed(&mut self) -> usize {
        let mut removed = 0;
        for r in &mut self.rows {
            for list in r.label_cell.iter_mut().chain(std::iter::once(&mut r.annotations)) {
                let before = list.len();
                list.retain(|a| !a.is_managed());
                removed += before - list.len();
            }
        }
        removed
    }
}
