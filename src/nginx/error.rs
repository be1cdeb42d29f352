//! Nginx publication errors.

use std::path::PathBuf;

use thiserror::Error;

use crate::validator::ValidationError;

#[derive(Debug, Error)]
pub enum NginxError {
    #[error("`{}` is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("invalid listen port: {0}")]
    InvalidPort(#[from] ValidationError),

    #[error("template error: {0}")]
    Template(#[from] handlebars::TemplateError),

    #[error("render error: {0}")]
    Render(#[from] handlebars::RenderError),

    #[error("I/O error on `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type NginxResult<T> = Result<T, NginxError>;
