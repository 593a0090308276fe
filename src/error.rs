use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum OutlineError {
    #[error("indentation token and field separator must differ (both are {token:?})")]
    SeparatorConflict { token: String },

    #[error("first entry must be at depth 0, found depth {depth} (line {line}: {title})")]
    FirstLineDepth {
        line: usize,
        title: String,
        depth: usize,
    },

    #[error("depth jumps from {previous} to {depth} without a parent (line {line}: {title})")]
    DepthJump {
        line: usize,
        title: String,
        depth: usize,
        previous: usize,
    },

    #[error("page number missing (line {line}: {title})")]
    MissingPage { line: usize, title: String },

    #[error("expected title and page, found {fields} fields (line {line}: {title})")]
    ExtraFields {
        line: usize,
        title: String,
        fields: usize,
    },

    #[error("page number is empty (line {line}: {title})")]
    EmptyPage { line: usize, title: String },

    #[error("invalid page number {page:?} (line {line}: {title})")]
    InvalidPage {
        line: usize,
        title: String,
        page: String,
    },

    #[error("page {page} comes after page {previous}; pages must not decrease (line {line}: {title})")]
    PageOrder {
        line: usize,
        title: String,
        previous: u32,
        page: u32,
    },

    #[error("outline contains no entries")]
    EmptyOutline,

    #[error("page {page} is beyond the document's {page_count} pages ({title})")]
    PageOutOfRange {
        title: String,
        page: u32,
        page_count: usize,
    },

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("failed to {action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl OutlineError {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }
}

#[derive(Error, Debug)]
pub enum OcrError {
    #[error("image file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("failed to read image {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot reach OCR endpoint: {0}")]
    Connection(#[source] reqwest::Error),

    #[error("OCR request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("malformed OCR response: {0}")]
    MalformedResponse(String),
}

impl OcrError {
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::FileNotFound(_) | Self::Read { .. } | Self::MalformedResponse(_)
        )
    }
}
