use anyhow::Result;

/// Key/value persistence behind the rule store.
///
/// Blobs are whole-value load/replace; there is no partial update.
pub trait RuleRepository: Send + Sync {
    fn load_blob(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key` and bumps the `i64` meta counter `revision_key`
    /// in the same transaction.
    fn store_blob(&self, key: &str, value: &str, revision_key: &str) -> Result<()>;

    fn get_meta_i64(&self, key: &str) -> Result<Option<i64>>;
}
