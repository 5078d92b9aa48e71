use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_COLOR: &str = "#4285f4";

/// Colors offered by the rule editor; the first one is the default.
pub const PRESET_COLORS: [&str; 5] = ["#4285f4", "#ea4335", "#34a853", "#fbbc05", "#673ab7"];

/// Key the rule list is persisted under, and the top-level field of the
/// import/export document.
pub const STORAGE_KEY: &str = "labelRules";

pub const EXPORT_FILE_NAME: &str = "gmail-label-rules.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("label name is required")]
    MissingLabel,
    #[error("at least one matching condition is required")]
    NoConditions,
}

/// A user-authored label rule.
///
/// `sender`, `email`, `subject` and `content` are comma-separated token lists;
/// any non-empty one of them is a condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelRule {
    #[serde(default)]
    pub label: String,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

fn is_set(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|v| !v.trim().is_empty())
}

impl LabelRule {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            color: default_color(),
            sender: None,
            email: None,
            subject: None,
            content: None,
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    pub fn with_sender(mut self, v: impl Into<String>) -> Self {
        self.sender = Some(v.into());
        self
    }

    pub fn with_email(mut self, v: impl Into<String>) -> Self {
        self.email = Some(v.into());
        self
    }

    pub fn with_subject(mut self, v: impl Into<String>) -> Self {
        self.subject = Some(v.into());
        self
    }

    pub fn with_content(mut self, v: impl Into<String>) -> Self {
        self.content = Some(v.into());
        self
    }

    pub fn has_condition(&self) -> bool {
        is_set(&self.sender) || is_set(&self.email) || is_set(&self.subject) || is_set(&self.content)
    }

    /// Checked on create, update and import. Matching never re-checks it.
    pub fn validate(&self) -> Result<(), RuleError> {
        if self.label.trim().is_empty() {
            return Err(RuleError::MissingLabel);
        }
        if !self.has_condition() {
            return Err(RuleError::NoConditions);
        }
        Ok(())
    }

    /// Human-readable condition lines, in the order the rule editor shows them.
    pub fn describe_conditions(&self) -> Vec<String> {
        let mut out = Vec::new();
        if let Some(v) = self.sender.as_deref().filter(|v| !v.trim().is_empty()) {
            out.push(format!("Sender: {v}"));
        }
        if let Some(v) = self.email.as_deref().filter(|v| !v.trim().is_empty()) {
            out.push(format!("Email: {v}"));
        }
        if let Some(v) = self.subject.as_deref().filter(|v| !v.trim().is_empty()) {
            out.push(format!("Subject contains: {v}"));
        }
        if let Some(v) = self.content.as_deref().filter(|v| !v.trim().is_empty()) {
            out.push(format!("Content contains: {v}"));
        }
        out
    }
}

/// The persisted blob and the import/export document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageData {
    #[serde(rename = "labelRules", default)]
    pub label_rules: Vec<LabelRule>,
}
