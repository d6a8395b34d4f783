//! Read CSV and PDF files into rows of string fields.
//!
//! [`FileReader`] picks the implementation for a [`FileType`]; callers only
//! ever see the [`Reader`] interface.

pub mod csv_reader;
pub mod error;
pub mod pdf_reader;

pub use csv_reader::CsvReader;
pub use error::{FileReaderError, Result};
pub use pdf_reader::PdfReader;

use serde::Serialize;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

/// Ordered rows, each an ordered list of fields.
pub type Rows = Vec<Vec<String>>;

pub trait Reader {
    /// Parse everything `reader` yields.
    fn read_from(&self, reader: &mut dyn Read) -> Result<Rows>;

    fn read_bytes(&self, data: &[u8]) -> Result<Rows> {
        let mut cursor = data;
        self.read_from(&mut cursor)
    }

    fn read_path(&self, path: &Path) -> Result<Rows> {
        let mut file = File::open(path).map_err(FileReaderError::io("failed to open file"))?;
        self.read_from(&mut file)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Csv,
    Pdf,
}

impl FileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Csv => "csv",
            FileType::Pdf => "pdf",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileType {
    type Err = FileReaderError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(FileType::Csv),
            "pdf" => Ok(FileType::Pdf),
            _ => Err(FileReaderError::UnsupportedFileType(s.to_string())),
        }
    }
}

/// Reader for one supported file type, with default settings.
#[derive(Debug, Clone)]
pub enum FileReader {
    Csv(CsvReader),
    Pdf(PdfReader),
}

impl FileReader {
    pub fn for_type(file_type: FileType) -> Self {
        match file_type {
            FileType::Csv => FileReader::Csv(CsvReader::default()),
            FileType::Pdf => FileReader::Pdf(PdfReader::default()),
        }
    }

    pub fn file_type(&self) -> FileType {
        match self {
            FileReader::Csv(_) => FileType::Csv,
            FileReader::Pdf(_) => FileType::Pdf,
        }
    }
}

impl Reader for FileReader {
    fn read_from(&self, reader: &mut dyn Read) -> Result<Rows> {
        match self {
            FileReader::Csv(csv) => csv.read_from(reader),
            FileReader::Pdf(pdf) => pdf.read_from(reader),
        }
    }

    fn read_bytes(&self, data: &[u8]) -> Result<Rows> {
        match self {
            FileReader::Csv(csv) => csv.read_bytes(data),
            FileReader::Pdf(pdf) => pdf.read_bytes(data),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_file_type_parsing() {
        assert_eq!("csv".parse::<FileType>().unwrap(), FileType::Csv);
        assert_eq!(" PDF ".parse::<FileType>().unwrap(), FileType::Pdf);

        let err = "xlsx".parse::<FileType>().unwrap_err();
        assert!(matches!(err, FileReaderError::UnsupportedFileType(ref t) if t == "xlsx"));
        assert_eq!(err.to_string(), "unsupported file type: xlsx");
    }

    #[test]
    fn test_for_type_dispatch() {
        assert_eq!(FileReader::for_type(FileType::Csv).file_type(), FileType::Csv);
        assert_eq!(FileReader::for_type(FileType::Pdf).file_type(), FileType::Pdf);
    }

    #[test]
    fn test_read_path_through_dispatcher() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"symbol;weight\nAAPL;0.4\n").unwrap();

        let reader = FileReader::Csv(CsvReader {
            delimiter: b';',
            ..CsvReader::default()
        });
        let rows = reader.read_path(file.path()).unwrap();

        assert_eq!(rows, vec![vec!["symbol", "weight"], vec!["AAPL", "0.4"]]);
    }

    #[test]
    fn test_read_path_missing_file() {
        let reader = FileReader::for_type(FileType::Csv);
        let err = reader
            .read_path(Path::new("/definitely/not/here.csv"))
            .unwrap_err();
        assert!(err.to_string().starts_with("failed to open file"));
    }
}
