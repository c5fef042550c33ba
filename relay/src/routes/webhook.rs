//! Intersight webhook receiver.
//!
//! `POST /webhook` accepts the event envelope Intersight delivers for a
//! subscribed alarm. A `null` (or absent) `Event` is acknowledged without
//! contacting WebEx. Otherwise the alarm is posted to the room before the
//! response is sent, and the response is `200 OK` whatever WebEx answered:
//! Intersight would otherwise redeliver an event we cannot do anything more
//! with. There is no deduplication, so redeliveries become repeat messages.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tracing::{info, warn};

use crate::webex::AlarmEvent;
use crate::AppState;

/// Body returned when the delivery carries no event.
pub const EMPTY_EVENT: &str = "Empty Event Data";

/// Request body for `POST /webhook`. Other envelope fields are ignored.
#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    #[serde(rename = "Event", default)]
    pub event: Option<AlarmEvent>,
}

/// `POST /webhook` — relay one alarm to WebEx.
pub async fn receive(
    State(state): State<AppState>,
    Json(payload): Json<WebhookPayload>,
) -> Response {
    let Some(event) = payload.event else {
        info!("Webhook received with no event");
        return (StatusCode::OK, EMPTY_EVENT).into_response();
    };
    info!(
        code = %event.code,
        affected = %event.affected_mo_display_name,
        "Webhook received"
    );

    match state.webex.post_alarm(&event).await {
        Ok(status) if status.is_success() => info!(%status, "Alarm {} posted to WebEx", event.code),
        Ok(status) => warn!(%status, "WebEx rejected alarm {}", event.code),
        Err(e) => warn!("Could not post alarm {} to WebEx: {e}", event.code),
    }
    StatusCode::OK.into_response()
}

/// Any method other than POST on `/webhook`.
pub async fn reject_method() -> StatusCode {
    StatusCode::BAD_REQUEST
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::routes::router;
    use crate::webex::WebexClient;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use httpmock::prelude::*;
    use serde_json::json;
    use tower::ServiceExt;

    fn app(api_url: String) -> axum::Router {
        let mut config = Config::default();
        config.webex.api_url = api_url;
        config.webex.token = "bot-token".into();
        config.webex.room_id = "room-1".into();
        let webex = WebexClient::new(&config.webex).unwrap();
        router(AppState::new(config, webex))
    }

    fn post_json(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/webhook")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_text(resp: Response) -> String {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    const ALARM: &str = r#"{"Event": {"AffectedMoDisplayName": "chassis-1", "Code": "F123",
        "CreateTime": "2024-01-01T00:00:00Z", "Description": "test"}}"#;

    #[tokio::test]
    async fn null_event_skips_webex() {
        let server = MockServer::start_async().await;
        let webex = server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/messages");
                then.status(200);
            })
            .await;

        let resp = app(server.url("/v1/messages"))
            .oneshot(post_json(r#"{"Event": null}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_text(resp).await, EMPTY_EVENT);
        assert_eq!(webex.hits_async().await, 0);
    }

    #[tokio::test]
    async fn alarm_is_posted_once() {
        let server = MockServer::start_async().await;
        let webex = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/messages")
                    .header("authorization", "Bearer bot-token")
                    .json_body_partial(r#"{"roomId": "room-1", "text": "New Critical Alarm: F123"}"#)
                    .body_contains("chassis-1")
                    .body_contains("F123")
                    .body_contains("2024-01-01T00:00:00Z")
                    .body_contains("\"text\":\"test\"");
                then.status(200).json_body(json!({"id": "msg-1"}));
            })
            .await;

        let resp = app(server.url("/v1/messages"))
            .oneshot(post_json(ALARM))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_text(resp).await.is_empty());
        webex.assert_async().await;
    }

    #[tokio::test]
    async fn webex_failure_still_acknowledged() {
        let server = MockServer::start_async().await;
        let webex = server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/messages");
                then.status(500).body("upstream down");
            })
            .await;

        let resp = app(server.url("/v1/messages"))
            .oneshot(post_json(ALARM))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        webex.assert_async().await;
    }

    #[tokio::test]
    async fn unreachable_webex_still_acknowledged() {
        // Nothing listens on port 9 (discard) on a test host.
        let resp = app("http://127.0.0.1:9/v1/messages".into())
            .oneshot(post_json(ALARM))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn non_post_is_bad_request() {
        let resp = app("http://127.0.0.1:9/v1/messages".into())
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/webhook")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_body_is_client_error() {
        let resp = app("http://127.0.0.1:9/v1/messages".into())
            .oneshot(post_json(r#"{"Event": {"Code": 5}}"#))
            .await
            .unwrap();
        assert!(resp.status().is_client_error());
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let resp = app("http://127.0.0.1:9/v1/messages".into())
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let v: serde_json::Value = serde_json::from_str(&body_text(resp).await).unwrap();
        assert_eq!(v["status"], "ok");
        assert_eq!(v["webex_configured"], true);
    }
}
