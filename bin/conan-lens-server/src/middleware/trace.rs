use std::time::Instant;

use axum::body::Body;
use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use tracing::{Instrument, info, info_span};
use uuid::Uuid;

pub static X_TRACE_ID: &str = "x-trace-id";

/// Open an `http_request` span per request. An incoming `x-trace-id` UUID is
/// kept, otherwise one is generated; either way it is echoed on the response.
pub async fn trace_middleware(mut req: Request<Body>, next: Next) -> Response {
    let start_time = Instant::now();

    let trace_id = req
        .headers()
        .get(X_TRACE_ID)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(Uuid::new_v4);
    // A hyphenated UUID is always a valid header value.
    let header_value = HeaderValue::from_str(&trace_id.to_string()).ok();

    let span = info_span!(
        "http_request",
        trace_id = %trace_id,
        method = %req.method(),
        path = %req.uri().path(),
    );

    async move {
        info!("→ request started");
        if let Some(value) = &header_value {
            req.headers_mut().insert(X_TRACE_ID, value.clone());
        }

        let mut response = next.run(req).await;

        if let Some(value) = header_value {
            response.headers_mut().insert(X_TRACE_ID, value);
        }
        info!(
            status = response.status().as_u16(),
            latency_ms = start_time.elapsed().as_millis(),
            "← response finished"
        );
        response
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod test {
    use super::*;
    use axum::http::StatusCode;
    use tower::ServiceExt;
    use tracing_test::traced_test;

    use crate::routes::testing::empty_app;

    #[tokio::test]
    #[traced_test]
    async fn trace_id_is_kept_and_echoed() {
        let trace_id = "67e55044-10b1-426f-9247-bb680e5fe0c8";
        let request = axum::http::Request::get("/")
            .header(X_TRACE_ID, trace_id)
            .body(Body::empty())
            .unwrap();
        let response = empty_app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[X_TRACE_ID], trace_id);
        assert!(logs_contain("response finished"));
        assert!(logs_contain(trace_id));
    }

    #[tokio::test]
    async fn trace_id_is_generated_when_missing_or_invalid() {
        let request = axum::http::Request::get("/")
            .header(X_TRACE_ID, "not-a-uuid")
            .body(Body::empty())
            .unwrap();
        let response = empty_app().oneshot(request).await.unwrap();
        let echoed = response.headers()[X_TRACE_ID].to_str().unwrap();
        assert!(Uuid::parse_str(echoed).is_ok());
    }
}
