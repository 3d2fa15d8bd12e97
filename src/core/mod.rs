pub mod engine;
pub mod job;

pub use crate::domain::model::{SyncItem, SyncStats};
pub use crate::domain::ports::{FileSource, ObjectStore};
pub use crate::utils::error::Result;
