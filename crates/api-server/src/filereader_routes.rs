use axum::{
    body::Bytes,
    extract::{multipart::MultipartRejection, Multipart, Query, State},
    routing::post,
    Json, Router,
};
use chrono::{SecondsFormat, Utc};
use file_reader::{FileReader, FileType, Reader, Rows};
use serde::{Deserialize, Serialize};

use crate::{AppError, AppState};

const FILE_TYPE_REQUIRED: &str = "File type parameter is required (csv or pdf)";
const NO_FILE: &str = "No file provided or invalid file";

#[derive(Debug, Default, Deserialize)]
pub struct FileQuery {
    #[serde(rename = "fileType")]
    pub file_type: Option<String>,
    pub filename: Option<String>,
}

impl FileQuery {
    /// Validate `fileType` before any body is consumed.
    fn file_type(&self) -> Result<FileType, AppError> {
        match self.file_type.as_deref().map(str::trim) {
            None | Some("") => Err(AppError::bad_request(FILE_TYPE_REQUIRED)),
            Some(raw) => Ok(raw.parse::<FileType>()?),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReadResponse {
    pub version: String,
    pub timestamp: String,
    pub filename: String,
    pub file_type: FileType,
    pub data: Rows,
    pub rows_count: usize,
    /// Length of the longest row.
    pub columns_max: usize,
}

pub fn filereader_routes() -> Router<AppState> {
    Router::new()
        .route("/filereader/upload", post(read_upload))
        .route("/filereader/readbytes", post(read_bytes))
}

async fn parse_file(
    state: &AppState,
    reader: FileReader,
    filename: String,
    data: Bytes,
) -> Result<FileReadResponse, AppError> {
    let size = data.len();
    let file_type = reader.file_type();

    let rows = tokio::task::spawn_blocking(move || reader.read_bytes(&data))
        .await
        .map_err(|e| AppError::internal(format!("file parser task failed: {}", e)))?
        .map_err(|e| {
            tracing::warn!(%file_type, filename = %filename, size, "Failed to read file: {}", e);
            AppError::from(e)
        })?;

    let columns_max = rows.iter().map(Vec::len).max().unwrap_or(0);
    tracing::info!(
        %file_type,
        filename = %filename,
        size,
        rows = rows.len(),
        "Parsed file"
    );

    Ok(FileReadResponse {
        version: state.config.default_version.clone(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        filename,
        file_type,
        rows_count: rows.len(),
        columns_max,
        data: rows,
    })
}

/// Multipart upload; the file is the part named `file`.
async fn read_upload(
    State(state): State<AppState>,
    Query(query): Query<FileQuery>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<FileReadResponse>, AppError> {
    let file_type = query.file_type()?;
    let mut multipart = multipart.map_err(|e| {
        tracing::warn!("Rejected multipart upload: {}", e);
        AppError::bad_request(NO_FILE)
    })?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| AppError::bad_request(NO_FILE))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .filter(|name| !name.is_empty())
            .unwrap_or("unknown")
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|_| AppError::bad_request(NO_FILE))?;

        let reader = FileReader::for_type(file_type);
        return parse_file(&state, reader, filename, data).await.map(Json);
    }

    Err(AppError::bad_request(NO_FILE))
}

/// Raw request body as the file content.
async fn read_bytes(
    State(state): State<AppState>,
    Query(query): Query<FileQuery>,
    body: Bytes,
) -> Result<Json<FileReadResponse>, AppError> {
    let reader = FileReader::for_type(query.file_type()?);
    let filename = query
        .filename
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "unknown".to_string());

    parse_file(&state, reader, filename, body).await.map(Json)
}

#[cfg(test)]
mod tests {
    use crate::test_support::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};

    const NO_UPSTREAM: &str = "http://127.0.0.1:9/query";

    fn post(uri: &str, content_type: &str, body: impl Into<Body>) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, content_type)
            .body(body.into())
            .unwrap()
    }

    fn multipart_body(boundary: &str, field: &str, filename: &str, content: &str) -> String {
        format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
             Content-Type: text/csv\r\n\r\n\
             {content}\r\n\
             --{boundary}--\r\n"
        )
    }

    #[tokio::test]
    async fn test_readbytes_csv() {
        let request = post(
            "/api/v1/filereader/readbytes?fileType=csv&filename=prices.csv",
            "application/octet-stream",
            "date,close\n2024-05-10,167.15\n2024-05-09,166.2,extra\n",
        );

        let (status, body) = send(test_app(NO_UPSTREAM.to_string()), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["filename"], "prices.csv");
        assert_eq!(body["fileType"], "csv");
        assert_eq!(body["rowsCount"], 3);
        assert_eq!(body["columnsMax"], 3);
        assert_eq!(body["data"][1][1], "167.15");
        assert_eq!(body["version"], "1.0");
    }

    #[tokio::test]
    async fn test_readbytes_defaults_filename() {
        let request = post(
            "/v1/filereader/readbytes?fileType=CSV",
            "application/octet-stream",
            "a,b\n",
        );

        let (status, body) = send(test_app(NO_UPSTREAM.to_string()), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["filename"], "unknown");
        assert_eq!(body["fileType"], "csv");
    }

    #[tokio::test]
    async fn test_missing_file_type_is_400() {
        let request = post(
            "/api/v1/filereader/readbytes",
            "application/octet-stream",
            "a,b\n",
        );

        let (status, body) = send(test_app(NO_UPSTREAM.to_string()), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "File type parameter is required (csv or pdf)");
    }

    #[tokio::test]
    async fn test_unsupported_file_type_is_400() {
        let request = post(
            "/api/v1/filereader/readbytes?fileType=xlsx",
            "application/octet-stream",
            "a,b\n",
        );

        let (status, body) = send(test_app(NO_UPSTREAM.to_string()), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "unsupported file type: xlsx");
    }

    #[tokio::test]
    async fn test_invalid_pdf_is_500() {
        let request = post(
            "/api/v1/filereader/readbytes?fileType=pdf",
            "application/pdf",
            "definitely not a pdf",
        );

        let (status, body) = send(test_app(NO_UPSTREAM.to_string()), request).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("failed to load PDF document"));
    }

    #[tokio::test]
    async fn test_upload_csv() {
        let boundary = "X-BOUNDARY";
        let request = post(
            "/api/v1/filereader/upload?fileType=csv",
            &format!("multipart/form-data; boundary={boundary}"),
            multipart_body(boundary, "file", "holdings.csv", "symbol,qty\nIBM,10"),
        );

        let (status, body) = send(test_app(NO_UPSTREAM.to_string()), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["filename"], "holdings.csv");
        assert_eq!(body["rowsCount"], 2);
        assert_eq!(body["columnsMax"], 2);
        assert_eq!(body["data"][1][0], "IBM");
    }

    #[tokio::test]
    async fn test_upload_without_file_part_is_400() {
        let boundary = "X-BOUNDARY";
        let request = post(
            "/api/v1/filereader/upload?fileType=csv",
            &format!("multipart/form-data; boundary={boundary}"),
            multipart_body(boundary, "attachment", "holdings.csv", "symbol,qty"),
        );

        let (status, body) = send(test_app(NO_UPSTREAM.to_string()), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "No file provided or invalid file");
    }

    #[tokio::test]
    async fn test_upload_not_multipart_is_400() {
        let request = post(
            "/api/v1/filereader/upload?fileType=pdf",
            "text/plain",
            "symbol,qty",
        );

        let (status, body) = send(test_app(NO_UPSTREAM.to_string()), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "No file provided or invalid file");
    }
}
