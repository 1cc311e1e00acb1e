use crate::span::Span;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("Syntax error: {msg}")]
    Syntax { msg: String, span: Span },

    #[error("Import error: \"{path}\": {msg}")]
    Import { path: String, msg: String },

    #[error("Type error: {msg}")]
    Type { msg: String, span: Span },

    #[error("Usage error: {msg}")]
    Usage { msg: String },

    #[error("Disposal error: {msg}")]
    Disposal { msg: String },

    #[error("Structural error: {msg}")]
    Structural { msg: String },

    #[error("Instantiation error: {msg}")]
    Instantiation { msg: String },

    #[error("Config error: {msg}")]
    Config { msg: String, path: PathBuf },
}

impl CompileError {
    pub fn syntax(msg: impl Into<String>, span: Span) -> Self {
        Self::Syntax { msg: msg.into(), span }
    }

    pub fn import(path: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Import { path: path.into(), msg: msg.into() }
    }

    pub fn type_err(msg: impl Into<String>, span: Span) -> Self {
        Self::Type { msg: msg.into(), span }
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Self::Usage { msg: msg.into() }
    }

    pub fn disposal(msg: impl Into<String>) -> Self {
        Self::Disposal { msg: msg.into() }
    }

    pub fn structural(msg: impl Into<String>) -> Self {
        Self::Structural { msg: msg.into() }
    }

    pub fn instantiation(msg: impl Into<String>) -> Self {
        Self::Instantiation { msg: msg.into() }
    }

    pub fn config(msg: impl Into<String>, path: PathBuf) -> Self {
        Self::Config { msg: msg.into(), path }
    }
}

/// Failure reported by a [`crate::imports::SourceProvider`].
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("not found")]
    NotFound,

    #[error("unreadable: {0}")]
    Unreadable(#[from] std::io::Error),
}

/// Render a CompileError with ariadne for nice terminal output.
pub fn render_error(source: &str, filename: &str, err: &CompileError) {
    use ariadne::{Label, Report, ReportKind, Source};

    match err {
        CompileError::Syntax { msg, span } | CompileError::Type { msg, span } => {
            let kind_str = match err {
                CompileError::Syntax { .. } => "syntax",
                _ => "type",
            };
            let start = span.start.min(source.len());
            let end = span.end.clamp(start, source.len());
            let report = Report::build(ReportKind::Error, (), start)
                .with_message(format!("{kind_str} error in {filename}"))
                .with_label(Label::new(start..end).with_message(msg))
                .finish();
            if report.eprint(Source::from(source)).is_err() {
                eprintln!("error [{filename}]: {err}");
            }
        }
        CompileError::Import { path, msg } => {
            eprintln!("error[import]: {msg}");
            eprintln!("  --> {path} (imported from {filename})");
        }
        CompileError::Config { msg, path } => {
            eprintln!("error[config]: {msg}");
            eprintln!("  --> {}", path.display());
        }
        _ => {
            eprintln!("error [{filename}]: {err}");
        }
    }
}
