//! PDF text and metadata extraction on top of `lopdf`.
//!
//! The upload is spooled into a private temp directory together with the
//! per-page text files extracted from it; the directory goes away when the
//! read returns, whichever way it returns.
//!
//! Text comes from the first of three stages that yields anything: decoded
//! text operators, the library's page text, then the string operands found
//! by scanning the raw content stream. Page text holding control characters
//! (undecoded CID fonts, usually) is treated as missing.

use lazy_static::lazy_static;
use lopdf::content::Content;
use lopdf::{Document, Object};
use regex::Regex;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use crate::{FileReaderError, Reader, Result, Rows};

pub const NO_CONTENT_ROW: &str = "No content extracted from PDF";
pub const METADATA_SEPARATOR: &str = "----- Metadata -----";

lazy_static! {
    static ref FONT_DIRECTIVE: Regex =
        Regex::new(r"/F\d+\s+\d+(\.\d+)?\s+Tf").expect("font directive pattern");
    static ref POSITION_DIRECTIVE: Regex =
        Regex::new(r"-?\d+(\.\d+)?\s+-?\d+(\.\d+)?\s+T[dD]").expect("position directive pattern");
    static ref TEXT_OPERATOR: Regex = Regex::new(
        r"\b(BT|ET|Tj|TJ|Td|TD|Tm|Tc|Tw|Tz|TL|Tf|Tr|Ts)\b|T\*"
    )
    .expect("operator pattern");
    static ref HORIZONTAL_SPACE: Regex = Regex::new(r"[ \t\x0C\r]+").expect("space pattern");
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfReader {
    pub extract_text: bool,
    pub extract_metadata: bool,
    /// Parent of the per-read extraction workspace; the system temp
    /// directory when unset.
    pub temp_dir: Option<PathBuf>,
}

impl Default for PdfReader {
    fn default() -> Self {
        Self {
            extract_text: true,
            extract_metadata: true,
            temp_dir: None,
        }
    }
}

impl Reader for PdfReader {
    fn read_from(&self, reader: &mut dyn Read) -> Result<Rows> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("pdf-extract-");
        let workspace = match &self.temp_dir {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
        .map_err(FileReaderError::io("failed to create temporary directory"))?;

        let pdf_path = workspace.path().join("input.pdf");
        spool(reader, &pdf_path)?;

        let document = Document::load(&pdf_path).map_err(|source| FileReaderError::Pdf {
            context: "failed to load PDF document",
            source,
        })?;

        let mut rows = Rows::new();

        if self.extract_text {
            rows = extract_text_rows(&document, workspace.path())?;
            if rows.is_empty() {
                tracing::warn!("No text recovered from PDF");
                rows.push(vec![NO_CONTENT_ROW.to_string()]);
            }
        }

        if self.extract_metadata {
            match extract_metadata(&document) {
                Ok(metadata) => {
                    if !rows.is_empty() {
                        rows.push(vec![METADATA_SEPARATOR.to_string()]);
                    }
                    rows.extend(
                        metadata
                            .into_iter()
                            .map(|(k, v)| vec!["Metadata".to_string(), k, v]),
                    );
                }
                Err(e) => rows.push(vec![format!("Metadata extraction failed: {}", e)]),
            }
        }

        if rows.is_empty() {
            rows.push(vec![NO_CONTENT_ROW.to_string()]);
        }
        Ok(rows)
    }
}

fn spool(reader: &mut dyn Read, path: &Path) -> Result<()> {
    let mut file =
        File::create(path).map_err(FileReaderError::io("failed to create temporary file"))?;
    io::copy(reader, &mut file)
        .map_err(FileReaderError::io("failed to write PDF data to temporary file"))?;
    file.sync_all()
        .map_err(FileReaderError::io("failed to sync temporary file"))
}

/// Structured content first, then the library's page text, then whatever
/// readable text sits in the raw content streams.
fn extract_text_rows(document: &Document, workspace: &Path) -> Result<Rows> {
    let stages: [(&str, fn(&Document, u32, lopdf::ObjectId) -> Option<String>); 3] = [
        ("content", structured_page_text),
        ("pages", library_page_text),
        ("raw", raw_page_text),
    ];

    for (stage, extract) in stages {
        let dir = workspace.join(stage);
        fs::create_dir(&dir)
            .map_err(FileReaderError::io("failed to create extraction directory"))?;

        for (page_number, page_id) in document.get_pages() {
            let text = extract(document, page_number, page_id).filter(|t| is_readable(t));
            if let Some(text) = text {
                let path = dir.join(format!("page_{:05}.content", page_number));
                fs::write(&path, text)
                    .map_err(FileReaderError::io("failed to write extracted page"))?;
            }
        }

        let rows = collect_paragraphs(&dir)?;
        if !rows.is_empty() {
            tracing::debug!(stage, paragraphs = rows.len(), "Extracted PDF text");
            return Ok(rows);
        }
        tracing::debug!(stage, "PDF extraction stage produced no text");
    }

    Ok(Rows::new())
}

fn collect_paragraphs(dir: &Path) -> Result<Rows> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(FileReaderError::io("failed to read content directory"))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "content" || ext == "txt"))
        .collect();
    files.sort();

    let mut rows = Rows::new();
    for path in files {
        // unreadable page files are skipped, not fatal
        if let Ok(data) = fs::read(&path) {
            let text = String::from_utf8_lossy(&data);
            rows.extend(paragraphs(&clean_pdf_markup(&text)).into_iter().map(|p| vec![p]));
        }
    }
    Ok(rows)
}

fn is_readable(text: &str) -> bool {
    !text.chars().any(|c| c.is_control() && !c.is_whitespace())
}

fn structured_page_text(
    document: &Document,
    _page: u32,
    page_id: lopdf::ObjectId,
) -> Option<String> {
    let data = document.get_page_content(page_id).ok()?;
    let content = Content::decode(&data).ok()?;

    let mut text = String::new();
    for operation in &content.operations {
        match operation.operator.as_str() {
            "Tj" | "'" | "\"" => {
                if let Some(Object::String(bytes, _)) = operation.operands.last() {
                    text.push_str(&decode_pdf_string(bytes));
                }
            }
            "TJ" => {
                if let Some(Object::Array(parts)) = operation.operands.first() {
                    for part in parts {
                        match part {
                            Object::String(bytes, _) => text.push_str(&decode_pdf_string(bytes)),
                            // large negative kerning is a word gap
                            Object::Integer(n) if *n < -200 => text.push(' '),
                            Object::Real(n) if *n < -200.0 => text.push(' '),
                            _ => {}
                        }
                    }
                }
            }
            "Td" | "TD" | "T*" | "Tm" => text.push('\n'),
            "ET" => text.push_str("\n\n"),
            _ => {}
        }
    }

    (!text.trim().is_empty()).then_some(text)
}

fn library_page_text(
    document: &Document,
    page: u32,
    _page_id: lopdf::ObjectId,
) -> Option<String> {
    document
        .extract_text(&[page])
        .ok()
        .filter(|text| !text.trim().is_empty())
}

fn raw_page_text(document: &Document, _page: u32, page_id: lopdf::ObjectId) -> Option<String> {
    let data = document.get_page_content(page_id).ok()?;
    let text = content_strings(&data);
    (!text.trim().is_empty()).then_some(text)
}

/// String operands of a content stream that lopdf could not make sense of,
/// one per line, with a blank line after each text object. Operators and
/// numbers are dropped.
fn content_strings(data: &[u8]) -> String {
    let mut text = String::new();
    let mut i = 0;

    while i < data.len() {
        match data[i] {
            b'(' => {
                let (bytes, next) = literal_string(data, i + 1);
                text.push_str(&decode_pdf_string(&bytes));
                text.push('\n');
                i = next;
            }
            b'<' if data.get(i + 1) == Some(&b'<') => i += 2,
            b'<' => {
                let end = data[i..]
                    .iter()
                    .position(|&b| b == b'>')
                    .map_or(data.len(), |p| i + p);
                text.push_str(&decode_pdf_string(&hex_string(&data[i + 1..end])));
                text.push('\n');
                i = end + 1;
            }
            b'%' => {
                while i < data.len() && !matches!(data[i], b'\n' | b'\r') {
                    i += 1;
                }
            }
            b'E' if data.get(i + 1) == Some(&b'T')
                && (i == 0 || is_delimiter(data.get(i - 1)))
                && is_delimiter(data.get(i + 2)) =>
            {
                text.push('\n');
                i += 2;
            }
            _ => i += 1,
        }
    }
    text
}

fn is_delimiter(byte: Option<&u8>) -> bool {
    byte.map_or(true, |b| b.is_ascii_whitespace() || b"()<>[]{}/%".contains(b))
}

/// Body of a `( ... )` string starting just past the opening parenthesis,
/// and the index after the closing one.
fn literal_string(data: &[u8], mut i: usize) -> (Vec<u8>, usize) {
    let mut out = Vec::new();
    let mut depth = 0usize;

    while let Some(&b) = data.get(i) {
        i += 1;
        match b {
            b'\\' => {
                let Some(&escaped) = data.get(i) else { break };
                i += 1;
                match escaped {
                    b'n' => out.push(b'\n'),
                    b'r' => out.push(b'\r'),
                    b't' => out.push(b'\t'),
                    b'b' => out.push(0x08),
                    b'f' => out.push(0x0C),
                    b'0'..=b'7' => {
                        let mut code = u32::from(escaped - b'0');
                        for _ in 0..2 {
                            match data.get(i) {
                                Some(&d @ b'0'..=b'7') => {
                                    code = code * 8 + u32::from(d - b'0');
                                    i += 1;
                                }
                                _ => break,
                            }
                        }
                        out.push((code & 0xFF) as u8);
                    }
                    // line continuation
                    b'\r' => {
                        if data.get(i) == Some(&b'\n') {
                            i += 1;
                        }
                    }
                    b'\n' => {}
                    other => out.push(other),
                }
            }
            b'(' => {
                depth += 1;
                out.push(b);
            }
            b')' if depth == 0 => return (out, i),
            b')' => {
                depth -= 1;
                out.push(b);
            }
            _ => out.push(b),
        }
    }
    (out, i)
}

/// Odd digit counts are padded with a trailing zero.
fn hex_string(digits: &[u8]) -> Vec<u8> {
    let nibbles: Vec<u8> = digits
        .iter()
        .filter_map(|&b| char::from(b).to_digit(16))
        .map(|d| d as u8)
        .collect();
    nibbles
        .chunks(2)
        .map(|pair| (pair[0] << 4) | pair.get(1).copied().unwrap_or(0))
        .collect()
}

/// PDF text strings are UTF-16BE when they carry a byte order mark and
/// single-byte otherwise.
fn decode_pdf_string(bytes: &[u8]) -> String {
    match bytes {
        [0xFE, 0xFF, rest @ ..] => {
            let units: Vec<u16> = rest
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        _ => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// Info dictionary entries plus page count and version, sorted by key.
fn extract_metadata(
    document: &Document,
) -> std::result::Result<BTreeMap<String, String>, lopdf::Error> {
    let mut metadata = BTreeMap::new();
    metadata.insert("PageCount".to_string(), document.get_pages().len().to_string());
    metadata.insert("Version".to_string(), document.version.clone());

    let Ok(info) = document.trailer.get(b"Info") else {
        return Ok(metadata);
    };
    let info = match info {
        Object::Reference(id) => document.get_object(*id)?,
        other => other,
    };

    for (key, value) in info.as_dict()?.iter() {
        let value = match value {
            Object::String(bytes, _) => decode_pdf_string(bytes),
            Object::Name(name) => String::from_utf8_lossy(name).into_owned(),
            Object::Integer(n) => n.to_string(),
            Object::Real(n) => n.to_string(),
            Object::Boolean(b) => b.to_string(),
            _ => continue,
        };
        metadata.insert(String::from_utf8_lossy(key).into_owned(), value);
    }
    Ok(metadata)
}

/// Strip page-description operators, font and position directives,
/// parentheses and brackets. Line breaks survive so paragraphs can be
/// regrouped afterwards.
pub fn clean_pdf_markup(text: &str) -> String {
    let text = FONT_DIRECTIVE.replace_all(text, "");
    let text = POSITION_DIRECTIVE.replace_all(&text, "");
    let text = TEXT_OPERATOR.replace_all(&text, "");
    let text: String = text
        .chars()
        .filter(|c| !matches!(c, '(' | ')' | '[' | ']'))
        .collect();

    text.lines()
        .map(|line| HORIZONTAL_SPACE.replace_all(line, " ").trim().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Join consecutive non-blank lines with a space; blank lines end a paragraph.
pub fn paragraphs(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();

    for line in text.lines().map(str::trim) {
        if line.is_empty() {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
            continue;
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(line);
    }

    if !current.is_empty() {
        out.push(current);
    }
    out
}
