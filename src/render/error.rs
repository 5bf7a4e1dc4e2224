//! Render-time errors.
//!
//! Every variant is scoped to a single render: the HTTP surface turns it
//! into a 500 response, the exporter into one failed route.

use std::{error::Error, io, path::PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("circular dependency detected in partial: {0}")]
    CircularPartial(String),

    #[error("partial `{partial}` not declared in partial_deps of route `{route}`")]
    UndeclaredPartial { partial: String, route: String },

    #[error("partial `{0}` not found in manifest")]
    MissingPartial(String),

    #[error("maximum partial nesting depth ({0}) exceeded")]
    DepthExceeded(usize),

    #[error("invalid markdown file format, expected exactly one `---` separator line: {0}")]
    MalformedSource(PathBuf),

    #[error("error parsing frontmatter of `{0}`")]
    Frontmatter(PathBuf, #[source] serde_yaml::Error),

    #[error("cannot read source `{0}`")]
    MissingSource(PathBuf, #[source] io::Error),

    #[error("template execution failed")]
    Template(#[source] tera::Error),
}

/// Render an error with its whole source chain on one line.
///
/// Tera reports the useful part ("Variable `x` not found") as a source of a
/// generic "failed to render" error, so `Display` alone is not enough.
pub fn error_chain(err: &dyn Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(err) = source {
        message.push_str(": ");
        message.push_str(&err.to_string());
        source = err.source();
    }
    message
}
