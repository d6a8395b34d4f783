use thiserror::Error;

#[derive(Error, Debug)]
pub enum FileReaderError {
    #[error("unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse CSV data: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to parse CSV data: record {record} has {found} fields, expected {expected}")]
    FieldCount {
        record: usize,
        expected: usize,
        found: usize,
    },

    #[error("{context}: {source}")]
    Pdf {
        context: &'static str,
        #[source]
        source: lopdf::Error,
    },
}

impl FileReaderError {
    pub(crate) fn io(context: &'static str) -> impl FnOnce(std::io::Error) -> Self {
        move |source| Self::Io { context, source }
    }
}

pub type Result<T> = std::result::Result<T, FileReaderError>;
