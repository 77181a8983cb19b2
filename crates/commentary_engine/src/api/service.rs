/* 📖 # One service for the whole API

`ApiService` answers every endpoint and routes on the request path:

- `POST /api/extract[?filter=all|todo|doc]` runs a batch extraction over the
  uploaded files (`multipart/form-data`) or pasted snippets
  (`application/json`)
- `GET /api/languages` lists the supported extensions and their grammars
- `GET /api/health` is a liveness probe

Client mistakes get a 4xx status with a JSON `{"error": ...}` body. An
unknown path is an `Err`, which the PAL turns into HTTP 599 so routing bugs
stand out from deliberate answers. Oversized bodies never reach the service;
the server rejects them with 413 using `max_upload_bytes`.
*/

use std::sync::Arc;

use commentary_base::pal::http::{
    HttpMethod, HttpRequest, HttpResponse, HttpService, HttpStatusCode,
};
use commentary_base::{CommentaryResult, err};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use super::multipart::{boundary_from_content_type, parse_multipart};
use super::query::query_param;
use crate::config::Config;
use crate::extractor::{SourceFile, extract_batch};
use crate::hit::CommentFilter;
use crate::syntax::{CommentSyntax, SyntaxTable};

/// Body of an `application/json` extraction request.
#[derive(Debug, Deserialize)]
struct ExtractRequest {
    #[serde(default)]
    filter: Option<String>,
    files: Vec<PastedFile>,
}

#[derive(Debug, Deserialize)]
struct PastedFile {
    name: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
struct LanguageResponse<'a> {
    extension: &'a str,
    #[serde(flatten)]
    grammar: &'a CommentSyntax,
}

#[derive(Debug, Serialize)]
struct LanguagesResponse<'a> {
    languages: Vec<LanguageResponse<'a>>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Files and filter taken from an extraction request.
#[derive(Debug, Default)]
struct UploadedBatch {
    files: Vec<SourceFile>,
    filter: Option<String>,
}

/// HTTP service exposing comment extraction.
#[derive(Debug, Clone)]
pub struct ApiService {
    table: Arc<SyntaxTable>,
    default_filter: CommentFilter,
}

impl ApiService {
    pub fn new(table: SyntaxTable, default_filter: CommentFilter) -> Self {
        Self {
            table: Arc::new(table),
            default_filter,
        }
    }

    /// Service using the configured grammars and default filter.
    pub fn from_config(config: &Config) -> CommentaryResult<Self> {
        Ok(Self::new(config.syntax_table()?, config.default_filter))
    }

    fn serialize_json_response<T: Serialize>(
        status: HttpStatusCode,
        data: &T,
    ) -> CommentaryResult<HttpResponse> {
        serde_json::to_string(data)
            .map(|json| HttpResponse::json(json).with_status(status))
            .map_err(|e| err!("JSON serialization error: {}", e))
    }

    fn error_response(
        status: HttpStatusCode,
        message: impl Into<String>,
    ) -> CommentaryResult<HttpResponse> {
        Self::serialize_json_response(
            status,
            &ErrorResponse {
                error: message.into(),
                errors: None,
            },
        )
    }

    #[instrument(skip_all, fields(path = request.path()))]
    fn handle_extract_request(&self, request: &HttpRequest) -> CommentaryResult<HttpResponse> {
        let query_filter = request.query().and_then(|query| query_param(query, "filter"));

        let content_type = request
            .headers()
            .get("Content-Type")
            .map(String::as_str)
            .unwrap_or_default();
        let upload = if content_type
            .to_ascii_lowercase()
            .starts_with("multipart/form-data")
        {
            let Some(boundary) = boundary_from_content_type(content_type) else {
                return Self::error_response(
                    HttpStatusCode::BadRequest,
                    "multipart request without boundary",
                );
            };
            match parse_multipart(request.body().as_bytes(), &boundary) {
                Ok(parts) => {
                    let mut upload = UploadedBatch::default();
                    for part in parts {
                        match (part.file_name, part.name.as_deref()) {
                            (Some(file_name), _) => {
                                // Browsers send an empty part when no file was chosen
                                if file_name.is_empty() && part.data.is_empty() {
                                    continue;
                                }
                                upload.files.push(SourceFile::new(file_name, part.data));
                            }
                            (None, Some("filter")) => {
                                upload.filter =
                                    Some(String::from_utf8_lossy(&part.data).into_owned());
                            }
                            (None, _) => {}
                        }
                    }
                    upload
                }
                Err(e) => {
                    return Self::error_response(HttpStatusCode::BadRequest, e.to_string());
                }
            }
        } else if content_type
            .to_ascii_lowercase()
            .starts_with("application/json")
        {
            match serde_json::from_slice::<ExtractRequest>(request.body().as_bytes()) {
                Ok(body) => UploadedBatch {
                    files: body
                        .files
                        .into_iter()
                        .map(|file| SourceFile::new(file.name, file.content))
                        .collect(),
                    filter: body.filter,
                },
                Err(e) => {
                    return Self::error_response(
                        HttpStatusCode::BadRequest,
                        format!("invalid JSON body: {}", e),
                    );
                }
            }
        } else {
            return Self::error_response(
                HttpStatusCode::UnsupportedMediaType,
                "expected multipart/form-data or application/json",
            );
        };

        let filter = match query_filter.or(upload.filter) {
            Some(name) => match name.parse::<CommentFilter>() {
                Ok(filter) => filter,
                Err(e) => return Self::error_response(HttpStatusCode::BadRequest, e.to_string()),
            },
            None => self.default_filter,
        };

        let report = extract_batch(&self.table, &upload.files, filter);
        info!(
            files = upload.files.len(),
            files_processed = report.files_processed,
            total_comments = report.total_comments,
            %filter,
            "extraction request"
        );

        if report.is_empty() {
            return Self::serialize_json_response(
                HttpStatusCode::NotFound,
                &ErrorResponse {
                    error: "No comments found".to_string(),
                    errors: Some(report.errors.iter().map(ToString::to_string).collect()),
                },
            );
        }
        Self::serialize_json_response(HttpStatusCode::Ok, &report)
    }

    fn handle_languages_request(&self) -> CommentaryResult<HttpResponse> {
        let languages = self
            .table
            .iter()
            .map(|(extension, grammar)| LanguageResponse { extension, grammar })
            .collect();
        Self::serialize_json_response(HttpStatusCode::Ok, &LanguagesResponse { languages })
    }

    fn handle_health_request(&self) -> CommentaryResult<HttpResponse> {
        Self::serialize_json_response(
            HttpStatusCode::Ok,
            &HealthResponse {
                status: "ok",
                version: env!("CARGO_PKG_VERSION"),
            },
        )
    }
}

impl HttpService for ApiService {
    fn handle_request(&self, request: HttpRequest) -> CommentaryResult<HttpResponse> {
        let route = request.route();
        debug!(method = %request.method(), route, "handling request");

        let expected = match route {
            "/api/extract" => HttpMethod::Post,
            "/api/languages" | "/api/health" => HttpMethod::Get,
            _ => return Err(err!("Invalid API endpoint: {}", route)),
        };
        if request.method() != &expected {
            return Ok(Self::error_response(
                HttpStatusCode::MethodNotAllowed,
                format!("{} {} is not supported", request.method(), route),
            )?
            .with_header("Allow", expected.as_str()));
        }

        match route {
            "/api/extract" => self.handle_extract_request(&request),
            "/api/languages" => self.handle_languages_request(),
            _ => self.handle_health_request(),
        }
    }
}
