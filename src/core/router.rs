use axum::{http::StatusCode, middleware::from_fn, routing::get, Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::core::config::Config;
use crate::core::middleware;
use crate::core::openapi::{ApiDoc, SwaggerInfoModifier};
use crate::features::chat::{routes as chat_routes, ChatService};
use crate::features::files::{routes as files_routes, FileService};

async fn root() -> Json<Value> {
    Json(json!({ "status": "alive", "message": "Backend is running" }))
}

async fn health_check() -> StatusCode {
    StatusCode::OK
}

fn swagger_routes(config: &Config) -> Router {
    let swagger_modifier = SwaggerInfoModifier {
        title: config.swagger.title.clone(),
        version: config.swagger.version.clone(),
        description: config.swagger.description.clone(),
    };

    let mut openapi = ApiDoc::openapi();
    swagger_modifier.modify(&mut openapi);

    let swagger =
        Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi));

    if let Some(credentials) = config.swagger.credentials() {
        tracing::info!("Swagger UI basic auth enabled");
        swagger.layer(from_fn(middleware::basic_auth_middleware(Arc::new(
            credentials,
        ))))
    } else {
        tracing::info!("Swagger UI basic auth disabled (no credentials configured)");
        swagger
    }
}

/// Assemble the full application: feature routes, docs and the HTTP layers.
pub fn build_router(
    file_service: Arc<FileService>,
    chat_service: Arc<ChatService>,
    config: &Config,
) -> Router {
    let service_routes = Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .merge(files_routes::routes(
            file_service,
            config.app.max_upload_size,
        ))
        .merge(chat_routes::routes(chat_service));

    Router::new()
        .merge(swagger_routes(config))
        .merge(service_routes)
        .layer(middleware::cors_layer(
            config.app.cors_allowed_origins.clone(),
        ))
        // Propagate X-Request-Id to response headers
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(middleware::MakeSpanWithRequestId)
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Generate X-Request-Id using UUID v7 (or use client-provided one)
        .layer(SetRequestIdLayer::x_request_id(middleware::MakeRequestUuid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::provider::{FileState, GenerativeProvider};
    use crate::modules::storage::LocalFileCache;
    use crate::shared::constants::FILE_NOT_CACHED_MESSAGE;
    use crate::shared::test_helpers::FakeProvider;
    use axum::body::Bytes;
    use axum::http::{HeaderName, HeaderValue, Method};
    use axum_test::multipart::{MultipartForm, Part};
    use axum_test::TestServer;
    use tempfile::TempDir;

    struct Harness {
        server: TestServer,
        provider: Arc<FakeProvider>,
        _uploads: TempDir,
    }

    fn harness_with(provider: FakeProvider, extra: &[(&str, &str)]) -> Harness {
        let uploads = tempfile::tempdir().unwrap();
        let provider = Arc::new(provider);
        let dyn_provider: Arc<dyn GenerativeProvider> = provider.clone();

        let mut vars: Vec<(String, String)> = vec![
            ("GEMINI_API_KEY".to_string(), "test-key".to_string()),
            (
                "UPLOADS_DIR".to_string(),
                uploads.path().display().to_string(),
            ),
        ];
        vars.extend(extra.iter().map(|(k, v)| (k.to_string(), v.to_string())));
        let config = Config::from_lookup(|key| {
            vars.iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        })
        .unwrap();

        let file_service = Arc::new(FileService::new(
            dyn_provider.clone(),
            LocalFileCache::new(&config.storage.uploads_dir),
            config.gemini.list_page_size,
        ));
        let chat_service = Arc::new(ChatService::new(
            dyn_provider,
            file_service.clone(),
            config.gemini.system_instruction.clone(),
        ));

        let app = build_router(file_service, chat_service, &config);
        Harness {
            server: TestServer::new(app).unwrap(),
            provider,
            _uploads: uploads,
        }
    }

    fn harness() -> Harness {
        harness_with(FakeProvider::new(), &[])
    }

    fn pdf_form(filename: &str) -> MultipartForm {
        MultipartForm::new().add_part(
            "file",
            Part::bytes(b"%PDF-1.4 test".to_vec())
                .file_name(filename)
                .mime_type("application/pdf"),
        )
    }

    async fn upload(h: &Harness, filename: &str) -> Value {
        let response = h.server.post("/upload").multipart(pdf_form(filename)).await;
        response.assert_status_ok();
        response.json::<Value>()
    }

    #[tokio::test]
    async fn test_root_and_health() {
        let h = harness();

        let response = h.server.get("/").await;
        response.assert_status_ok();
        assert_eq!(
            response.json::<Value>(),
            json!({ "status": "alive", "message": "Backend is running" })
        );

        h.server.get("/health").await.assert_status_ok();
    }

    #[tokio::test]
    async fn test_upload_returns_uri_as_file_id() {
        let h = harness();
        let body = upload(&h, "report.pdf").await;

        assert_eq!(body["filename"], "report.pdf");
        assert_eq!(body["mime_type"], "application/pdf");
        assert!(body["uri"].as_str().is_some_and(|u| !u.is_empty()));
        assert_eq!(body["file_id"], body["uri"]);
        assert_eq!(body["cached"], true);
    }

    #[tokio::test]
    async fn test_upload_without_file_field_is_bad_request() {
        let h = harness();
        let form = MultipartForm::new().add_text("note", "no file here");

        let response = h.server.post("/upload").multipart(form).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["success"], false);
    }

    #[tokio::test]
    async fn test_upload_over_limit_is_rejected() {
        let h = harness_with(FakeProvider::new(), &[("MAX_UPLOAD_SIZE", "16")]);
        let big = vec![b'x'; 2 * 1024 * 1024];
        let form = MultipartForm::new().add_part("file", Part::bytes(big).file_name("big.bin"));

        let response = h.server.post("/upload").multipart(form).await;
        response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(h.provider.file_count(), 0);
    }

    #[tokio::test]
    async fn test_upload_then_chat_then_list() {
        let h = harness();
        let uploaded = upload(&h, "report.pdf").await;
        let uri = uploaded["uri"].as_str().unwrap().to_string();

        let response = h
            .server
            .post("/chat")
            .json(&json!({
                "message": "Summarize page 1",
                "history": [],
                "file_ids": [uri],
            }))
            .await;
        response.assert_status_ok();
        let answer = response.json::<Value>()["response"]
            .as_str()
            .unwrap()
            .to_string();
        assert!(!answer.is_empty());
        assert!(answer.contains("grounded in 1 file(s)"));

        let listing = h.server.get("/files").await.json::<Value>();
        let names: Vec<&str> = listing
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|f| f["display_name"].as_str())
            .collect();
        assert!(names.contains(&"report.pdf"));
    }

    #[tokio::test]
    async fn test_pending_upload_is_not_attached() {
        let h = harness_with(FakeProvider::with_upload_state(FileState::Pending), &[]);
        let uploaded = upload(&h, "slow.pdf").await;
        assert_eq!(uploaded["state"], "PENDING");

        let response = h
            .server
            .post("/chat")
            .json(&json!({
                "message": "Anything?",
                "file_ids": [uploaded["name"]],
            }))
            .await;
        response.assert_status_ok();
        assert!(response.json::<Value>()["response"]
            .as_str()
            .unwrap()
            .contains("grounded in 0 file(s)"));
    }

    #[tokio::test]
    async fn test_delete_then_chat_drops_the_file() {
        let h = harness();
        let uploaded = upload(&h, "report.pdf").await;
        let uri = uploaded["uri"].as_str().unwrap().to_string();

        let response = h
            .server
            .delete(&format!("/files/{}", urlencoding::encode(&uri)))
            .await;
        response.assert_status_ok();
        assert_eq!(
            response.json::<Value>()["message"],
            format!("File {} deleted successfully", uri)
        );
        assert_eq!(h.provider.file_count(), 0);

        let response = h
            .server
            .post("/chat")
            .json(&json!({ "message": "Still there?", "file_ids": [uri] }))
            .await;
        response.assert_status_ok();
        assert!(response.json::<Value>()["response"]
            .as_str()
            .unwrap()
            .contains("grounded in 0 file(s)"));
    }

    #[tokio::test]
    async fn test_delete_accepts_unencoded_resource_name() {
        let h = harness();
        let uploaded = upload(&h, "report.pdf").await;
        let name = uploaded["name"].as_str().unwrap();

        let response = h.server.delete(&format!("/files/{}", name)).await;
        response.assert_status_ok();
        assert_eq!(
            response.json::<Value>()["message"],
            format!("File {} deleted successfully", name)
        );
        assert_eq!(h.provider.file_count(), 0);
    }

    #[tokio::test]
    async fn test_delete_accepts_unencoded_uri() {
        let h = harness();
        let uploaded = upload(&h, "report.pdf").await;
        let uri = uploaded["uri"].as_str().unwrap();
        assert!(uri.starts_with("https://"));

        let response = h.server.delete(&format!("/files/{}", uri)).await;
        response.assert_status_ok();
        assert_eq!(h.provider.file_count(), 0);
    }

    #[tokio::test]
    async fn test_get_file_by_resource_name_and_uri() {
        let h = harness();
        let uploaded = upload(&h, "report.pdf").await;
        let name = uploaded["name"].as_str().unwrap();
        let uri = uploaded["uri"].as_str().unwrap();

        for reference in [name, uri] {
            let response = h.server.get(&format!("/files/{}", reference)).await;
            response.assert_status_ok();
            assert_eq!(response.json::<Value>()["name"], name);
        }

        // The view route keeps priority over the catch-all
        h.server
            .get("/files/view/report.pdf")
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn test_get_file_by_bare_id() {
        let h = harness();
        let uploaded = upload(&h, "report.pdf").await;
        let name = uploaded["name"].as_str().unwrap();
        let bare_id = name.trim_start_matches("files/");

        let response = h.server.get(&format!("/files/{}", bare_id)).await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["name"], name);

        h.server
            .get("/files/does-not-exist")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_unknown_file_is_server_error() {
        let h = harness();

        let response = h.server.delete("/files/does-not-exist").await;
        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let body = response.json::<Value>();
        assert_eq!(body["success"], false);
        assert_eq!(body["errors"][0], "not_found");
    }

    #[tokio::test]
    async fn test_view_serves_cached_copy() {
        let h = harness();
        upload(&h, "report.pdf").await;

        let response = h.server.get("/files/view/report.pdf").await;
        response.assert_status_ok();
        assert_eq!(response.header("content-type"), "application/pdf");
        assert_eq!(response.as_bytes().as_ref(), b"%PDF-1.4 test");
    }

    #[tokio::test]
    async fn test_view_unknown_file_is_not_found() {
        let h = harness();

        let response = h.server.get("/files/view/never-uploaded.pdf").await;
        response.assert_status(StatusCode::NOT_FOUND);
        let body = response.json::<Value>();
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], FILE_NOT_CACHED_MESSAGE);
    }

    #[tokio::test]
    async fn test_malformed_chat_body_is_bad_request() {
        let h = harness();

        let response = h
            .server
            .post("/chat")
            .bytes(Bytes::from_static(b"{\"message\": "))
            .content_type("application/json")
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["success"], false);

        let response = h
            .server
            .post("/chat")
            .json(&json!({ "message": "" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(h.provider.requests().len(), 0);
    }

    fn preflight(h: &Harness, origin: &'static str) -> axum_test::TestRequest {
        h.server
            .method(Method::OPTIONS, "/chat")
            .add_header(
                HeaderName::from_static("origin"),
                HeaderValue::from_static(origin),
            )
            .add_header(
                HeaderName::from_static("access-control-request-method"),
                HeaderValue::from_static("POST"),
            )
    }

    #[tokio::test]
    async fn test_cors_allows_any_origin_by_default() {
        let h = harness();

        let response = preflight(&h, "http://localhost:5501").await;
        response.assert_status_ok();
        assert_eq!(
            response.headers().get("access-control-allow-origin"),
            Some(&HeaderValue::from_static("*"))
        );
    }

    #[tokio::test]
    async fn test_cors_echoes_only_configured_origins() {
        let h = harness_with(
            FakeProvider::new(),
            &[("CORS_ALLOWED_ORIGINS", "http://app.test, http://admin.test")],
        );

        let response = preflight(&h, "http://admin.test").await;
        response.assert_status_ok();
        assert_eq!(
            response.headers().get("access-control-allow-origin"),
            Some(&HeaderValue::from_static("http://admin.test"))
        );

        let response = preflight(&h, "http://evil.test").await;
        assert!(response
            .headers()
            .get("access-control-allow-origin")
            .is_none());
    }

    #[tokio::test]
    async fn test_request_id_is_propagated() {
        let h = harness();

        let response = h.server.get("/health").await;
        assert!(response.headers().contains_key("x-request-id"));
    }
}
