use std::path::PathBuf;

use thiserror::Error;

use crate::merge::MergeConflict;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config layer {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing config layer {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error(transparent)]
    Merge(#[from] MergeConflict),
}
