use cdgw::core::io::meanfield::MeanFieldLoadError;
use cdgw::engine::error::GwError;
use cdgw::workflows::report::ReportError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] GwError),

    #[error("Failed to load mean-field input: {0}")]
    Input(#[from] MeanFieldLoadError),

    #[error("Failed to write report: {0}")]
    Report(#[from] ReportError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse file '{path}': {source}", path = path.display())]
    FileParsing {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
