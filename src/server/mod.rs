//! The user-facing web server: an upload form and the `/process` route that
//! runs the merge pipeline.

use crate::error::MergeError;
use crate::fetch::HttpFetcher;
use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use anyhow::anyhow;

mod protocol;
pub mod routes;

/// Immutable state shared by every worker
#[derive(Debug, Clone)]
pub struct AppState {
    pub fetcher: HttpFetcher,
    pub max_upload_bytes: usize,
}

/// Any failure of a request, rendered as `Error: <reason>` in plain text
#[derive(Debug)]
pub struct WebError {
    err: anyhow::Error,
}

impl std::fmt::Display for WebError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Error: {}", self.err)
    }
}

impl actix_web::error::ResponseError for WebError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::plaintext())
            .body(self.to_string())
    }

    fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }
}

impl From<anyhow::Error> for WebError {
    fn from(err: anyhow::Error) -> WebError {
        WebError { err }
    }
}

impl From<MergeError> for WebError {
    fn from(err: MergeError) -> Self {
        WebError { err: anyhow!(err) }
    }
}

impl From<actix_multipart::MultipartError> for WebError {
    fn from(err: actix_multipart::MultipartError) -> Self {
        WebError {
            err: anyhow!("malformed form data: {err}"),
        }
    }
}
