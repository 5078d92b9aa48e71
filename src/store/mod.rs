pub mod gateway;
pub mod repo;
pub mod sqlite;

pub use gateway::{RuleStore, StoreError};
