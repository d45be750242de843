//! Inbound notification router.

use std::collections::HashSet;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, HeaderName, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde_json::json;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

use super::registry::{Callback, HandlerRegistry, Notification, NotificationReply};
use crate::protocol::catalog::{CONTENT_TYPE_JSON, X_M2M_ORIGIN, X_M2M_RI, X_M2M_RSC};
use crate::protocol::ResponseStatusCode;

/// Build the notification router: `GET` and `POST` on every path.
pub(crate) fn create_router(
    registry: HandlerRegistry,
    paths: &[String],
    max_body_size: usize,
) -> Router {
    let mut router = Router::new();
    let mut seen = HashSet::new();
    for path in paths {
        let path = if path.starts_with('/') {
            path.clone()
        } else {
            format!("/{path}")
        };
        if seen.insert(path.clone()) {
            router = router.route(&path, get(handle_notification).post(handle_notification));
        }
    }

    router
        .layer(RequestBodyLimitLayer::new(max_body_size))
        .layer(TraceLayer::new_for_http())
        .with_state(registry)
}

/// Correlate one notification with its handler and answer the CSE.
async fn handle_notification(
    State(registry): State<HandlerRegistry>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let rqi = headers
        .get(X_M2M_RI)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let target = Target {
        path: uri.path().to_string(),
        rqi,
    };

    let notification = match Notification::from_slice(&body) {
        Ok(notification) => notification,
        Err(e) => {
            tracing::warn!(error = %e, "Rejecting malformed notification");
            return error_reply(ResponseStatusCode::InternalServerError, &e.to_string(), &target);
        },
    };

    let sur = notification.sur.clone();
    let Some(handler) = registry.take(&sur) else {
        tracing::warn!(%sur, "No handler registered for notification");
        return error_reply(
            ResponseStatusCode::NotFound,
            &format!("No handler registered for {sur}"),
            &target,
        );
    };

    // Handlers are synchronous; keep them off the accept loop.
    let outcome =
        tokio::task::spawn_blocking(move || handler(Callback::Notification(notification))).await;

    match outcome {
        Ok(Ok(reply)) => {
            tracing::debug!(%sur, rsc = %reply.rsc, "Notification handled");
            reply_response(reply, &target)
        },
        Ok(Err(e)) => {
            tracing::warn!(%sur, error = %e, "Notification handler failed");
            error_reply(ResponseStatusCode::InternalServerError, &e.to_string(), &target)
        },
        Err(e) => {
            tracing::warn!(%sur, error = %e, "Notification handler panicked");
            error_reply(
                ResponseStatusCode::InternalServerError,
                "Notification handler panicked",
                &target,
            )
        },
    }
}

/// Where the notification arrived and the request id to echo.
struct Target {
    path: String,
    rqi: Option<String>,
}

fn reply_response(reply: NotificationReply, target: &Target) -> Response {
    let status = reply.rsc.http_status();
    let body = reply.body.map(|b| b.to_string()).unwrap_or_default();
    let originator = reply.originator.unwrap_or_else(|| target.path.clone());

    let mut response = (
        status,
        [
            (X_M2M_RSC, reply.rsc.as_str().to_string()),
            (X_M2M_ORIGIN, originator),
            ("content-type", CONTENT_TYPE_JSON.to_string()),
        ],
        body,
    )
        .into_response();

    if let Some(value) = target.rqi.as_deref().and_then(|r| r.parse().ok()) {
        response
            .headers_mut()
            .insert(HeaderName::from_static("x-m2m-ri"), value);
    }
    response
}

fn error_reply(rsc: ResponseStatusCode, message: &str, target: &Target) -> Response {
    reply_response(
        NotificationReply::new(rsc).with_body(json!({ "m2m:dbg": message })),
        target,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OneM2MError;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn router(registry: &HandlerRegistry) -> Router {
        create_router(
            registry.clone(),
            &["/".to_string(), "/notify".to_string()],
            1024,
        )
    }

    fn notification(sur: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/notify")
            .header(X_M2M_RI, "rq-1")
            .body(Body::from(
                json!({"m2m:sgn": {"sur": sur, "nev": {"net": 3}}}).to_string(),
            ))
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_handler_reply_maps_status() {
        let registry = HandlerRegistry::new();
        registry.register("sub1", |cb| {
            assert!(matches!(cb, Callback::Notification(n) if n.sur == "sub1"));
            Ok(NotificationReply::new(ResponseStatusCode::Created))
        });

        let response = router(&registry).oneshot(notification("sub1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[X_M2M_RSC], "2001");
        assert_eq!(response.headers()[X_M2M_RI], "rq-1");
        assert_eq!(response.headers()[X_M2M_ORIGIN], "/notify");
    }

    #[tokio::test]
    async fn test_no_handler_is_404() {
        let registry = HandlerRegistry::new();
        let response = router(&registry).oneshot(notification("ghost")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[X_M2M_RSC], "4004");
        let body = body_json(response).await;
        assert!(body["m2m:dbg"].as_str().unwrap().contains("ghost"));
    }

    #[tokio::test]
    async fn test_handler_error_is_500() {
        let registry = HandlerRegistry::new();
        registry.register("bad", |_| Err(OneM2MError::Handler("disk full".into())));
        let response = router(&registry).oneshot(notification("bad")).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()[X_M2M_RSC], "5000");
        let body = body_json(response).await;
        assert!(body["m2m:dbg"].as_str().unwrap().contains("disk full"));
    }

    #[tokio::test]
    async fn test_handler_panic_is_500() {
        let registry = HandlerRegistry::new();
        registry.register("panics", |_| panic!("handler bug"));
        let app = router(&registry);

        let response = app.clone().oneshot(notification("panics")).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        // The router keeps serving after a panicking handler.
        registry.register("ok", |_| Ok(NotificationReply::ok()));
        let response = app.oneshot(notification("ok")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_malformed_body_is_500() {
        let registry = HandlerRegistry::new();
        let request = Request::builder()
            .method("POST")
            .uri("/")
            .body(Body::from("{not json"))
            .unwrap();
        let response = router(&registry).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()[X_M2M_RSC], "5000");
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let registry = HandlerRegistry::new();
        let request = Request::builder()
            .method("POST")
            .uri("/notify")
            .body(Body::from(vec![b'x'; 4096]))
            .unwrap();
        let response = router(&registry).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_unconfigured_path_is_404_without_rsc() {
        let registry = HandlerRegistry::new();
        let request = Request::builder()
            .method("POST")
            .uri("/elsewhere")
            .body(Body::empty())
            .unwrap();
        let response = router(&registry).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().get(X_M2M_RSC).is_none());
    }
}
