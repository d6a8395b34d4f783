use csv::{ReaderBuilder, Trim};
use std::io::Read;

use crate::{FileReaderError, Reader, Result, Rows};

/// CSV parser. Every line is a row, including the first one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvReader {
    pub delimiter: u8,
    /// Lines starting with this byte are skipped.
    pub comment: Option<u8>,
    /// Reject any record whose field count differs. `None` accepts ragged rows.
    pub fields_per_record: Option<usize>,
    pub quoting: bool,
    /// Trim surrounding whitespace from every field.
    pub trim_whitespace: bool,
}

impl Default for CsvReader {
    fn default() -> Self {
        Self {
            delimiter: b',',
            comment: None,
            fields_per_record: None,
            quoting: true,
            trim_whitespace: false,
        }
    }
}

impl Reader for CsvReader {
    fn read_from(&self, reader: &mut dyn Read) -> Result<Rows> {
        let mut csv_reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(self.delimiter)
            .comment(self.comment)
            .quoting(self.quoting)
            .trim(if self.trim_whitespace { Trim::Fields } else { Trim::None })
            .from_reader(reader);

        let mut rows = Vec::new();
        for (index, record) in csv_reader.records().enumerate() {
            let record = record?;

            if let Some(expected) = self.fields_per_record {
                if record.len() != expected {
                    return Err(FileReaderError::FieldCount {
                        record: index + 1,
                        expected,
                        found: record.len(),
                    });
                }
            }

            rows.push(record.iter().map(str::to_string).collect());
        }

        tracing::debug!(rows = rows.len(), "Parsed CSV data");
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let rows = CsvReader::default()
            .read_bytes(b"id,name\n1,John\n2,Jane")
            .unwrap();

        assert_eq!(
            rows,
            vec![vec!["id", "name"], vec!["1", "John"], vec!["2", "Jane"]]
        );
    }

    #[test]
    fn test_quoted_fields_and_ragged_rows() {
        let rows = CsvReader::default()
            .read_bytes(b"ticker,note\nAAPL,\"split 4:1, 2020\"\nMSFT\n")
            .unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1], vec!["AAPL", "split 4:1, 2020"]);
        assert_eq!(rows[2], vec!["MSFT"]);
    }

    #[test]
    fn test_comment_and_trim() {
        let reader = CsvReader {
            comment: Some(b'#'),
            trim_whitespace: true,
            ..CsvReader::default()
        };
        let rows = reader.read_bytes(b"# exported\na , b\n").unwrap();

        assert_eq!(rows, vec![vec!["a", "b"]]);
    }

    #[test]
    fn test_fixed_field_count() {
        let reader = CsvReader {
            fields_per_record: Some(2),
            ..CsvReader::default()
        };
        let err = reader.read_bytes(b"a,b\nc,d,e\n").unwrap_err();

        assert!(matches!(
            err,
            FileReaderError::FieldCount { record: 2, expected: 2, found: 3 }
        ));
        assert!(err.to_string().starts_with("failed to parse CSV data"));
    }

    #[test]
    fn test_invalid_utf8_is_wrapped() {
        let err = CsvReader::default().read_bytes(b"a,\xff\xfe\n").unwrap_err();

        assert!(matches!(err, FileReaderError::Csv(_)));
        assert!(err.to_string().starts_with("failed to parse CSV data: "));
    }
}
