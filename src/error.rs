use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while running the pipeline.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Polars(#[from] polars::prelude::PolarsError),

    #[error("Failed to read structure '{path}': {message}", path = path.display())]
    Structure { path: PathBuf, message: String },

    #[error("Could not launch '{program}': {source}")]
    ToolLaunch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' exited with {status}")]
    ToolFailed { program: String, status: ExitStatus },

    #[error("Unexpected output from '{program}': {message}")]
    ToolOutput { program: String, message: String },

    #[error("Column '{column}' missing or mistyped in '{path}'", path = path.display())]
    Column { path: PathBuf, column: String },

    #[error("Table '{path}' has no rows", path = path.display())]
    EmptyTable { path: PathBuf },

    #[error("Plotting error: {0}")]
    Plot(String),

    #[error("Could not build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl<E: std::error::Error + Send + Sync> From<plotters::drawing::DrawingAreaErrorKind<E>>
    for Error
{
    fn from(e: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        Error::Plot(e.to_string())
    }
}
