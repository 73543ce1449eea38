//! HTTP API handlers.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use axum::body::to_bytes;
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, Method, StatusCode};
use axum::response::IntoResponse;
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::Value;
use subtle::ConstantTimeEq;
use tracing::{debug, info, warn};

use crate::error::UpdateError;
use crate::flag::CancellationFlag;
use crate::metrics;
use crate::schedule::{Clock, EventZone, SystemClock};
use crate::status::report;

/// Application state shared with handlers.
#[derive(Clone)]
pub struct AppState {
    /// Cancellation flag.
    pub flag: CancellationFlag,
    /// Timezone the schedule is evaluated in.
    pub zone: EventZone,
    /// Source of the current time.
    pub clock: Arc<dyn Clock>,
    /// Prometheus exposition, if a recorder is installed.
    pub prometheus: Option<PrometheusHandle>,
    authorization: Arc<str>,
}

impl AppState {
    /// Create new app state reading the system clock.
    pub fn new(authorization: impl Into<Arc<str>>, zone: EventZone) -> Self {
        Self {
            flag: CancellationFlag::new(),
            zone,
            clock: Arc::new(SystemClock),
            prometheus: None,
            authorization: authorization.into(),
        }
    }

    /// Replace the clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Expose metrics through `handle`.
    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }

    /// Check the `Authorization` header against the shared secret.
    pub fn authorize(&self, headers: &HeaderMap) -> Result<(), UpdateError> {
        let provided = headers
            .get(header::AUTHORIZATION)
            .map(|value| value.as_bytes())
            .unwrap_or_default();

        if secrets_match(provided, self.authorization.as_bytes()) {
            Ok(())
        } else {
            Err(UpdateError::Unauthorized)
        }
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("flag", &self.flag)
            .field("zone", &self.zone)
            .field("clock", &self.clock)
            .field("prometheus", &self.prometheus.is_some())
            .finish_non_exhaustive()
    }
}

fn secrets_match(provided: &[u8], expected: &[u8]) -> bool {
    if provided.len() != expected.len() {
        return false;
    }
    provided.ct_eq(expected).into()
}

/// Largest `/update/status` body read after authorization.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Body of `/update/status`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateRequest {
    /// New flag value. Missing or `null` means `false`.
    pub cancelled: bool,
}

impl UpdateRequest {
    /// Decode the first JSON value in `body`.
    ///
    /// A `null` document decodes to the default. The `cancelled` key is
    /// matched exactly first, then ASCII case-insensitively. Anything after
    /// the first value is ignored.
    pub fn from_body(body: &[u8]) -> Result<Self, UpdateError> {
        let value = serde_json::Deserializer::from_slice(body)
            .into_iter::<Value>()
            .next()
            .ok_or(UpdateError::InvalidBody)?
            .map_err(|_| UpdateError::InvalidBody)?;

        let fields = match value {
            Value::Null => return Ok(Self::default()),
            Value::Object(fields) => fields,
            _ => return Err(UpdateError::InvalidBody),
        };

        let field = fields.get("cancelled").or_else(|| {
            fields
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case("cancelled"))
                .map(|(_, value)| value)
        });

        let cancelled = match field {
            None | Some(Value::Null) => false,
            Some(Value::Bool(cancelled)) => *cancelled,
            Some(_) => return Err(UpdateError::InvalidBody),
        };

        Ok(Self { cancelled })
    }
}

/// Confirmation text naming the new state.
pub fn confirmation(cancelled: bool) -> String {
    format!(
        "Board game night has been {}.",
        if cancelled { "cancelled" } else { "resumed" }
    )
}

fn require_post(method: &Method) -> Result<(), UpdateError> {
    if method == Method::POST {
        Ok(())
    } else {
        Err(UpdateError::MethodNotAllowed)
    }
}

fn rejected(endpoint: &'static str, start: Instant, err: UpdateError) -> UpdateError {
    warn!(endpoint, reason = err.reason(), "Update rejected");
    metrics::inc_update_rejections(err.reason());
    metrics::record_http_latency(start, endpoint);
    err
}

/// Status page handler.
pub async fn index(State(state): State<AppState>) -> impl IntoResponse {
    let start = Instant::now();
    let cancelled = state.flag.get();
    let report = report(state.zone, state.clock.now(), cancelled);

    debug!(status = %report.kind, "Status requested");
    metrics::inc_status_requests(report.kind);
    metrics::record_http_latency(start, "/");

    report.text
}

/// Set handler: `POST /update/status` with `{"cancelled": bool}`.
///
/// The body is only read once the caller is authorized.
pub async fn update_status(
    State(state): State<AppState>,
    request: Request,
) -> Result<String, UpdateError> {
    const ENDPOINT: &str = "/update/status";
    let start = Instant::now();

    state
        .authorize(request.headers())
        .and_then(|()| require_post(request.method()))
        .map_err(|err| rejected(ENDPOINT, start, err))?;

    let body = to_bytes(request.into_body(), MAX_BODY_BYTES)
        .await
        .map_err(|_| rejected(ENDPOINT, start, UpdateError::InvalidBody))?;
    let update = UpdateRequest::from_body(&body).map_err(|err| rejected(ENDPOINT, start, err))?;

    state.flag.set(update.cancelled);
    info!(cancelled = update.cancelled, "Cancellation flag set");
    metrics::inc_flag_updates("set");
    metrics::record_http_latency(start, ENDPOINT);

    Ok(confirmation(update.cancelled))
}

/// Toggle handler: `POST /update` with no body.
pub async fn toggle_status(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
) -> Result<String, UpdateError> {
    const ENDPOINT: &str = "/update";
    let start = Instant::now();

    state
        .authorize(&headers)
        .and_then(|()| require_post(&method))
        .map_err(|err| rejected(ENDPOINT, start, err))?;

    let cancelled = state.flag.toggle();
    info!(cancelled, "Cancellation flag toggled");
    metrics::inc_flag_updates("toggle");
    metrics::record_http_latency(start, ENDPOINT);

    Ok(confirmation(cancelled))
}

/// Health check handler - always returns 200.
pub async fn health() -> &'static str {
    "OK"
}

/// Prometheus exposition handler - 404 when no recorder is installed.
pub async fn metrics_text(State(state): State<AppState>) -> impl IntoResponse {
    match &state.prometheus {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, "Metrics are not enabled.".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(auth: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(auth).unwrap());
        headers
    }

    #[test]
    fn authorize_accepts_exact_secret() {
        let state = AppState::new("hunter2", EventZone::Local);
        assert!(state.authorize(&headers_with("hunter2")).is_ok());
    }

    #[test]
    fn authorize_rejects_mismatch() {
        let state = AppState::new("hunter2", EventZone::Local);

        assert_eq!(state.authorize(&HeaderMap::new()), Err(UpdateError::Unauthorized));
        assert_eq!(state.authorize(&headers_with("hunter")), Err(UpdateError::Unauthorized));
        assert_eq!(state.authorize(&headers_with("hunter3")), Err(UpdateError::Unauthorized));
        assert_eq!(
            state.authorize(&headers_with("Bearer hunter2")),
            Err(UpdateError::Unauthorized)
        );
    }

    #[test]
    fn empty_secret_matches_missing_header() {
        // Validation refuses an empty secret at startup; the comparison itself stays literal.
        let state = AppState::new("", EventZone::Local);
        assert!(state.authorize(&HeaderMap::new()).is_ok());
    }

    #[test]
    fn confirmation_texts() {
        assert_eq!(confirmation(true), "Board game night has been cancelled.");
        assert_eq!(confirmation(false), "Board game night has been resumed.");
    }

    #[test]
    fn update_request_defaults_to_not_cancelled() {
        assert!(!UpdateRequest::from_body(b"{}").unwrap().cancelled);
        assert!(!UpdateRequest::from_body(b"null").unwrap().cancelled);
        assert!(!UpdateRequest::from_body(br#"{"cancelled": null}"#).unwrap().cancelled);
        assert!(UpdateRequest::from_body(br#"{"cancelled": true}"#).unwrap().cancelled);
    }

    #[test]
    fn update_request_matches_key_case_insensitively() {
        assert!(UpdateRequest::from_body(br#"{"Cancelled": true}"#).unwrap().cancelled);
        assert!(UpdateRequest::from_body(br#"{"CANCELLED": true}"#).unwrap().cancelled);
        // The exact key wins over a folded one.
        assert!(!UpdateRequest::from_body(br#"{"Cancelled": true, "cancelled": false}"#)
            .unwrap()
            .cancelled);
        assert!(!UpdateRequest::from_body(br#"{"cancelled_at": true}"#).unwrap().cancelled);
    }

    #[test]
    fn update_request_reads_first_value_only() {
        assert!(UpdateRequest::from_body(br#"{"cancelled": true} trailing"#).unwrap().cancelled);
    }

    #[test]
    fn update_request_rejects_malformed_bodies() {
        let bodies: [&[u8]; 6] = [
            b"",
            b"cancel it",
            b"true",
            b"[]",
            br#"{"cancelled": "yes"}"#,
            br#"{"Cancelled": 1}"#,
        ];
        for body in bodies {
            assert_eq!(UpdateRequest::from_body(body), Err(UpdateError::InvalidBody));
        }
    }

    #[test]
    fn rejections_record_latency() {
        let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        ::metrics::with_local_recorder(&recorder, || {
            rejected("/update", Instant::now(), UpdateError::Unauthorized);
        });

        let rendered = handle.render();
        assert!(rendered.contains("update_rejections_total"), "{rendered}");
        assert!(rendered.contains("http_request_latency_ms"), "{rendered}");
        assert!(rendered.contains(r#"endpoint="/update""#), "{rendered}");
    }

    #[test]
    fn debug_hides_secret() {
        let state = AppState::new("hunter2", EventZone::Local);
        assert!(!format!("{state:?}").contains("hunter2"));
    }
}
