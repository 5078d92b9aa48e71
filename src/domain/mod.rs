pub mod annotation;
pub mod record;
pub mod rule;

pub use annotation::{Annotation, MANAGED_CLASS};
pub use record::Record;
pub use rule::{LabelRule, RuleError, StorageData};
