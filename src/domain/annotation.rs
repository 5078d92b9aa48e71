use serde::{Deserialize, Serialize};

/// Marker class carried by every annotation the engine creates.
pub const MANAGED_CLASS: &str = "gmail-label-extension";

/// A visual tag attached to an inbox row.
///
/// Host-native tags have no class; the engine only ever looks at, and only
/// ever removes, tags carrying [`MANAGED_CLASS`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub text: String,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
}

impl Annotation {
    pub fn managed(text: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            color: color.into(),
            class: Some(MANAGED_CLASS.to_string()),
        }
    }

    pub fn is_managed(&self) -> bool {
        self.class.as_deref() == Some(MANAGED_CLASS)
    }
}
