pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliArgs;
pub use config::{toml_config::TomlConfig, SmbConfig, SyncConfig};

pub use adapters::{
    mock::MockSource,
    s3::{S3Store, TransferSettings},
    source::{DirectorySource, SmbSource},
};
pub use crate::core::{engine::SyncEngine, job::SyncJob};
pub use utils::error::{Result, SyncError};
pub use utils::layout::RuntimeLayout;
