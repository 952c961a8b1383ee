//! HTTP Handlers
//!
//! Profile generation, format listing and health endpoints.

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use warpgen_core::{
    FormatId, GenerationError, GenerationOptions, GenerationResult, GenerationService,
    RegistrationClient,
};

use crate::captcha::{CaptchaError, CaptchaVerifier};

/// Application state shared across handlers
pub struct AppState<R> {
    pub service: GenerationService<R>,
    /// `None` when no captcha secret is configured
    pub captcha: Option<CaptchaVerifier>,
}

/// Build the application router
pub fn router<R: RegistrationClient + 'static>(state: Arc<AppState<R>>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/api/warp",
            get(formats_handler::<R>).post(generate_handler::<R>),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE]),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Generation request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[serde(flatten)]
    pub options: GenerationOptions,
    #[serde(default)]
    pub captcha_token: Option<String>,
}

/// Generation response
#[derive(Serialize)]
pub struct GenerateResponse {
    pub success: bool,
    pub content: GenerationResult,
}

/// Format listing response
#[derive(Serialize)]
pub struct FormatsResponse {
    pub success: bool,
    pub data: FormatsData,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatsData {
    pub supported_formats: Vec<FormatId>,
    pub format_details: BTreeMap<FormatId, FormatDetails>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatDetails {
    pub name: &'static str,
    pub extension: &'static str,
    pub description: &'static str,
    #[serde(rename = "supportsQR")]
    pub supports_qr: bool,
    pub requires_reserved: bool,
}

/// Error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
}

/// Anything a handler can fail with
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request body: {0}")]
    Body(#[from] JsonRejection),

    #[error(transparent)]
    Captcha(#[from] CaptchaError),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Body(_) | ApiError::Captcha(_) => StatusCode::BAD_REQUEST,
            ApiError::Generation(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            ApiError::Generation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Generation failed: {}", self);
        } else {
            tracing::warn!("Request rejected: {}", self);
        }

        let body = ErrorResponse {
            success: false,
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// POST /api/warp - Generate a profile
pub async fn generate_handler<R: RegistrationClient>(
    State(state): State<Arc<AppState<R>>>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let Json(request) = payload?;

    if let Some(captcha) = &state.captcha {
        captcha.verify(request.captcha_token.as_deref()).await?;
    }

    let content = state.service.generate(&request.options).await?;
    tracing::info!("Generated {}", content.file_name);

    Ok(Json(GenerateResponse {
        success: true,
        content,
    }))
}

/// GET /api/warp - Supported formats
pub async fn formats_handler<R: RegistrationClient>(
    State(state): State<Arc<AppState<R>>>,
) -> Json<FormatsResponse> {
    let format_details = state
        .service
        .format_table()
        .iter()
        .map(|info| {
            let details = FormatDetails {
                name: info.name,
                extension: info.extension,
                description: info.description,
                supports_qr: info.supports_qr,
                requires_reserved: info.requires_reserved,
            };
            (info.id, details)
        })
        .collect();

    Json(FormatsResponse {
        success: true,
        data: FormatsData {
            supported_formats: state.service.supported_formats(),
            format_details,
        },
    })
}

/// GET /health - Health check
pub async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use serde_json::{Value, json};
    use std::time::Duration;
    use tower::ServiceExt;
    use warpgen_core::{
        PublicKey, Registration, ReservedBytes, RouteCatalog, TunnelAssignment, UpstreamError,
    };
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct StubClient;

    impl RegistrationClient for StubClient {
        async fn register(&self, _key: &PublicKey) -> Result<Registration, UpstreamError> {
            Ok(Registration {
                client_id: "dev".into(),
                token: "tok".into(),
            })
        }

        async fn enable_tunnel(
            &self,
            _registration: &Registration,
        ) -> Result<TunnelAssignment, UpstreamError> {
            Ok(TunnelAssignment {
                peer_public_key: "bmXOC+F1FxEMF9dyiK2H5/1SUtzH0JuVo51h2wPfgyo=".into(),
                ipv4: "172.16.0.2".parse().unwrap(),
                ipv6: "2606:4700:110:8a36:df92:102a:9602:fa18".parse().unwrap(),
                reserved: ReservedBytes::from(vec![1, 2, 3]),
            })
        }
    }

    fn app(captcha: Option<CaptchaVerifier>) -> Router {
        let service = GenerationService::new(Arc::new(RouteCatalog::builtin()), StubClient);
        router(Arc::new(AppState { service, captcha }))
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post(body: Value) -> Request<Body> {
        Request::post("/api/warp")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn valid_body() -> Value {
        json!({
            "selectedServices": [],
            "siteMode": "all",
            "deviceType": "computer",
            "endpoint": "example.com:500",
            "configFormat": "wireguard"
        })
    }

    #[tokio::test]
    async fn test_generate_success() {
        let (status, body) = send(app(None), post(valid_body())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["content"]["configFormat"], "wireguard");
        assert!(body["content"]["fileName"].as_str().unwrap().starts_with("WARP"));
        assert!(body["content"]["qrCodeBase64"]
            .as_str()
            .unwrap()
            .starts_with("data:image/png;base64,"));
    }

    #[tokio::test]
    async fn test_invalid_site_mode() {
        let mut request = valid_body();
        request["siteMode"] = json!("everything");
        let (status, body) = send(app(None), post(request)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["message"].as_str().unwrap().contains("everything"));
    }

    #[tokio::test]
    async fn test_unsupported_format() {
        let mut request = valid_body();
        request["configFormat"] = json!("openvpn");
        let (status, body) = send(app(None), post(request)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Unsupported config format: openvpn");
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let request = Request::post("/api/warp")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(app(None), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_format_listing() {
        let request = Request::get("/api/warp").body(Body::empty()).unwrap();
        let (status, body) = send(app(None), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["supportedFormats"].as_array().unwrap().len(), 6);
        assert_eq!(body["data"]["formatDetails"]["husi"]["supportsQR"], false);
        assert_eq!(body["data"]["formatDetails"]["clash"]["extension"], "yaml");
        assert_eq!(body["data"]["formatDetails"]["wireguard"]["name"], "AmneziaWG");
    }

    #[tokio::test]
    async fn test_health() {
        let request = Request::get("/health").body(Body::empty()).unwrap();
        let (status, body) = send(app(None), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_captcha_required_when_configured() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
            .expect(1)
            .mount(&server)
            .await;
        let captcha = || CaptchaVerifier::new("s", server.uri(), Duration::from_secs(5)).unwrap();

        let (status, _) = send(app(Some(captcha())), post(valid_body())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let mut request = valid_body();
        request["captchaToken"] = json!("token");
        let (status, body) = send(app(Some(captcha())), post(request)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
    }
}
