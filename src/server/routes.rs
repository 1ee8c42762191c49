//! HTTP routes. `/process` accepts a multipart form with an image and a pose
//! file (each as an upload or a URL) and answers with the merged pose file as
//! a download.

use super::protocol::ProcessForm;
use super::{AppState, WebError};
use crate::pipeline;
use actix_multipart::Multipart;
use actix_web::http::header::{
    Charset, ContentDisposition, ContentType, DispositionParam, DispositionType, ExtendedValue,
};
use actix_web::{get, post, web, HttpResponse, Responder};
use tracing::{info, warn};

type Result<T> = std::result::Result<T, WebError>;

const INDEX_HTML: &str = include_str!("../../static/index.html");

/// The upload form
#[get("/")]
pub async fn index() -> impl Responder {
    HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(INDEX_HTML)
}

/// Attachment header for `filename`. Non-ASCII names get an ASCII-only
/// `filename` fallback plus a UTF-8 `filename*` parameter
fn attachment(filename: String) -> ContentDisposition {
    let parameters = if filename.is_ascii() {
        vec![DispositionParam::Filename(filename)]
    } else {
        vec![
            DispositionParam::Filename(filename.chars().filter(char::is_ascii).collect()),
            DispositionParam::FilenameExt(ExtendedValue {
                charset: Charset::Ext("UTF-8".to_string()),
                language_tag: None,
                value: filename.into_bytes(),
            }),
        ]
    };

    ContentDisposition {
        disposition: DispositionType::Attachment,
        parameters,
    }
}

/// Merge the submitted image into the submitted pose file
#[post("/process")]
pub async fn process(payload: Multipart, state: web::Data<AppState>) -> Result<HttpResponse> {
    let form = ProcessForm::read(payload, state.max_upload_bytes)
        .await
        .map_err(|err| {
            warn!("rejected form: {err}");
            err
        })?;

    let (image, pose) = form.into_sources();
    let merged = pipeline::merge(&state.fetcher, image, pose)
        .await
        .map_err(|err| {
            warn!("rejected merge request: {err}");
            WebError::from(err)
        })?;

    info!(
        "merged image into {} ({} bytes)",
        merged.filename,
        merged.bytes.len()
    );

    Ok(HttpResponse::Ok()
        .content_type(ContentType::json())
        .insert_header(attachment(merged.filename))
        .body(merged.bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::HttpFetcher;
    use crate::util;
    use actix_web::http::{header, StatusCode};
    use actix_web::{test, App};
    use base64::{engine::general_purpose, Engine as _};
    use serde_json::{json, Value};
    use std::time::Duration;

    const BOUNDARY: &str = "posemergeboundary";

    enum Part<'a> {
        Text(&'a str, &'a str),
        File(&'a str, &'a str, &'a [u8]),
    }

    fn multipart(parts: &[Part]) -> Vec<u8> {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match part {
                Part::Text(name, value) => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                    );
                    body.extend_from_slice(value.as_bytes());
                }
                Part::File(name, filename, bytes) => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                             Content-Type: application/octet-stream\r\n\r\n"
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(bytes);
                }
            }
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn state(max_upload_bytes: usize) -> web::Data<AppState> {
        web::Data::new(AppState {
            fetcher: HttpFetcher::new(Duration::from_secs(2), max_upload_bytes).unwrap(),
            max_upload_bytes,
        })
    }

    fn request(parts: &[Part]) -> test::TestRequest {
        test::TestRequest::post()
            .uri("/process")
            .insert_header((
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            ))
            .set_payload(multipart(parts))
    }

    /// Submit a form and return the status and body
    async fn submit(parts: &[Part<'_>], max_upload_bytes: usize) -> (StatusCode, String) {
        let app = test::init_service(
            App::new()
                .app_data(state(max_upload_bytes))
                .service(index)
                .service(process),
        )
        .await;
        let resp = test::call_service(&app, request(parts).to_request()).await;
        let status = resp.status();
        let body = test::read_body(resp).await;
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[actix_web::test]
    async fn test_index() {
        let app = test::init_service(App::new().service(index)).await;
        let req = test::TestRequest::get().uri("/").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body = test::read_body(resp).await;
        let html = std::str::from_utf8(&body).unwrap();
        for field in ["image_url", "image_file", "pose_url", "pose_file"] {
            assert!(html.contains(&format!("name=\"{field}\"")));
        }
    }

    #[actix_web::test]
    async fn test_process_uploads() {
        let png = util::test::png_bytes();
        let app = test::init_service(App::new().app_data(state(1 << 20)).service(process)).await;
        let req = request(&[
            Part::Text("image_url", ""),
            Part::File("image_file", "img.png", &png),
            Part::Text("pose_url", ""),
            Part::File("pose_file", "a.pose", br#"{"x":1}"#),
        ])
        .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert_eq!(
            resp.headers().get(header::CONTENT_DISPOSITION).unwrap(),
            "attachment; filename=\"a.pose\""
        );

        let body = test::read_body(resp).await;
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            value,
            json!({"x": 1, "Base64Image": general_purpose::STANDARD.encode(&png)})
        );
    }

    #[::core::prelude::v1::test]
    fn test_attachment_names() {
        assert_eq!(
            attachment("a.pose".into()).to_string(),
            "attachment; filename=\"a.pose\""
        );
        assert_eq!(
            attachment("ポーズ v1.pose".into()).to_string(),
            "attachment; filename=\" v1.pose\"; filename*=UTF-8''%E3%83%9D%E3%83%BC%E3%82%BA%20v1.pose"
        );
    }

    #[actix_web::test]
    async fn test_process_non_ascii_name() {
        let png = util::test::png_bytes();
        let app = test::init_service(App::new().app_data(state(1 << 20)).service(process)).await;
        let req = request(&[
            Part::File("image_file", "img.png", &png),
            Part::File("pose_file", "ポーズ.pose", b"{}"),
        ])
        .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let disposition = resp.headers().get(header::CONTENT_DISPOSITION).unwrap();
        assert!(disposition.to_str().is_ok());
        assert!(disposition
            .to_str()
            .unwrap()
            .ends_with("filename*=UTF-8''%E3%83%9D%E3%83%BC%E3%82%BA.pose"));
    }

    #[actix_web::test]
    async fn test_process_errors() {
        let png = util::test::png_bytes();
        let cases = vec![
            (
                vec![Part::File("pose_file", "a.pose", b"{}")],
                "Error: No image provided (URL or file)",
            ),
            (
                vec![
                    Part::File("image_file", "img.png", b"GIF89a"),
                    Part::File("pose_file", "a.pose", b"{}"),
                ],
                "Error: Provided image is not a supported image type",
            ),
            (
                vec![Part::File("image_file", "img.png", &png)],
                "Error: No pose file provided (URL or file)",
            ),
            (
                vec![
                    Part::File("image_file", "img.png", &png),
                    Part::File("pose_file", "a.json", b"{}"),
                ],
                "Error: Pose file must have .pose extension",
            ),
            (
                vec![
                    Part::File("image_file", "img.png", &png),
                    Part::File("pose_file", "a.pose", &png),
                ],
                "Error: Pose file appears to be an image; expected JSON .pose",
            ),
            (
                vec![
                    Part::File("image_file", "img.png", &png),
                    Part::File("pose_file", "a.pose", b"{invalid"),
                ],
                "Error: Pose file is not valid JSON",
            ),
        ];

        for (parts, expected) in cases {
            let (status, body) = submit(&parts, 1 << 20).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body, expected);
        }
    }

    #[actix_web::test]
    async fn test_empty_upload_falls_back_to_missing() {
        let (status, body) = submit(
            &[
                Part::File("image_file", "", b""),
                Part::Text("image_url", "   "),
            ],
            1 << 20,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "Error: No image provided (URL or file)");
    }

    #[actix_web::test]
    async fn test_upload_limit() {
        let png = util::test::png_bytes();
        let (status, body) = submit(
            &[
                Part::File("image_file", "img.png", &png),
                Part::File("pose_file", "a.pose", b"{}"),
            ],
            8,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.starts_with("Error: image_file exceeds the upload limit"));
    }

    #[actix_web::test]
    async fn test_unreachable_url() {
        let png = util::test::png_bytes();
        let (status, body) = submit(
            &[
                Part::File("image_file", "img.png", &png),
                Part::Text("pose_url", "http://127.0.0.1:1/a.pose"),
            ],
            1 << 20,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.starts_with("Error: Failed to fetch http://127.0.0.1:1/a.pose: "));
    }
}
