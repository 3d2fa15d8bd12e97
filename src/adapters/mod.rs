// Adapters layer: concrete sources, stores and files on disk.

pub mod cache;
pub mod mock;
pub mod report;
pub mod s3;
pub mod source;
