mod channels;
mod contents;
mod fairscore;
mod profiles;
mod social;

use std::sync::Arc;

use axum::{
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use tapred_fairscale::{FairscaleClient, FairscaleError};
use tapred_tapestry::{TapestryClient, TapestryError};

use crate::middleware::{request_id, RequestId};

#[derive(Clone)]
pub struct AppState {
    pub tapestry: Arc<TapestryClient>,
    pub fairscale: Arc<FairscaleClient>,
    /// Cached FairScores older than this are re-fetched from upstream.
    pub score_max_age: chrono::Duration,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "bad_gateway" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

/// Maps a social-graph client failure onto the response envelope.
///
/// Upstream 404s keep their meaning (the record genuinely does not exist);
/// everything else is the upstream's problem and reported as a bad gateway.
pub(super) fn map_tapestry_error(request_id: String, error: &TapestryError) -> ApiError {
    if let TapestryError::Api { status: 404, .. } = error {
        return ApiError::new(request_id, "not_found", "upstream record not found");
    }
    tracing::error!(error = %error, "tapestry request failed");
    ApiError::new(
        request_id,
        "bad_gateway",
        "upstream social graph request failed",
    )
}

/// Maps a reputation client failure onto the response envelope.
pub(super) fn map_fairscale_error(request_id: String, error: &FairscaleError) -> ApiError {
    tracing::error!(error = %error, "fairscale request failed");
    ApiError::new(
        request_id,
        "bad_gateway",
        "upstream reputation request failed",
    )
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static("x-request-id"),
        ])
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/health", get(health))
        .route(
            "/api/v1/profiles",
            get(profiles::list_profiles).post(profiles::create_profile),
        )
        .route(
            "/api/v1/profiles/{username}",
            get(profiles::get_profile).put(profiles::update_profile),
        )
        .route(
            "/api/v1/profiles/{username}/fairscore",
            get(profiles::get_profile_fairscore),
        )
        .route("/api/v1/fairscore", get(fairscore::get_fairscore))
        .route("/api/v1/contents/feed", get(contents::get_feed))
        .route("/api/v1/comments", post(contents::create_comment))
        .route(
            "/api/v1/likes/{node_id}",
            post(contents::like_content).delete(contents::unlike_content),
        )
        .route(
            "/api/v1/followers",
            post(social::follow).delete(social::unfollow),
        )
        .route("/api/v1/followers/state", get(social::follow_state))
        .route(
            "/api/v1/channels/{subnet}/messages",
            get(channels::list_messages).post(channels::send_message),
        )
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(Extension(req_id): Extension<RequestId>) -> impl IntoResponse {
    // No local dependencies to probe: every data path is an upstream proxy.
    (
        StatusCode::OK,
        Json(ApiResponse {
            data: HealthData { status: "ok" },
            meta: ResponseMeta::new(req_id.0),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tapred_fairscale::RetryPolicy;
    use tower::ServiceExt;
    use wiremock::matchers::{body_string_contains, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_app(tapestry_base: &str, fairscale_base: &str) -> Router {
        let tapestry = TapestryClient::with_base_url("tap-key", 5, tapestry_base)
            .expect("tapestry client should build");
        let fairscale = FairscaleClient::with_base_url(
            "fair-key",
            5,
            RetryPolicy {
                max_retries: 0,
                backoff_base_ms: 1,
            },
            fairscale_base,
        )
        .expect("fairscale client should build");
        build_app(AppState {
            tapestry: Arc::new(tapestry),
            fairscale: Arc::new(fairscale),
            score_max_age: chrono::Duration::hours(24),
        })
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        serde_json::from_slice(&bytes).expect("json parse")
    }

    #[tokio::test]
    async fn health_returns_ok_and_echoes_request_id() {
        let app = test_app("http://localhost:1", "http://localhost:1");
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/health")
                    .header("x-request-id", "req-abc")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get("x-request-id")
                .and_then(|v| v.to_str().ok()),
            Some("req-abc")
        );
        let json = body_json(response).await;
        assert_eq!(json["data"]["status"].as_str(), Some("ok"));
        assert_eq!(json["meta"]["request_id"].as_str(), Some("req-abc"));
    }

    #[tokio::test]
    async fn list_profiles_requires_a_lookup_parameter() {
        let app = test_app("http://localhost:1", "http://localhost:1");
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/profiles")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"].as_str(), Some("bad_request"));
    }

    #[tokio::test]
    async fn get_profile_decodes_the_packed_bio() {
        let server = MockServer::start().await;
        let fresh_ts = Utc::now().timestamp_millis();
        let bio = format!("solana dev |FAIRSCORE_META|{{\"score\":842,\"ts\":{fresh_ts}}}");

        Mock::given(method("GET"))
            .and(path("/profiles/alice"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "profile": { "id": "prof-1", "username": "alice", "bio": bio },
                "wallet": { "address": "Wa11etA1ice" },
                "socialCounts": { "followers": 4, "following": 2 }
            })))
            .mount(&server)
            .await;

        let app = test_app(&server.uri(), "http://localhost:1");
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/profiles/alice")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["bio"].as_str(), Some("solana dev"));
        assert_eq!(json["data"]["fair_score"].as_i64(), Some(842));
        assert_eq!(json["data"]["fair_score_fresh"].as_bool(), Some(true));
        assert_eq!(json["data"]["followers"].as_i64(), Some(4));
    }

    #[tokio::test]
    async fn get_profile_with_corrupt_metadata_degrades_to_no_score() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/profiles/bob"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "profile": {
                    "id": "prof-2",
                    "username": "bob",
                    "bio": "hello |FAIRSCORE_META|not-json"
                }
            })))
            .mount(&server)
            .await;

        let app = test_app(&server.uri(), "http://localhost:1");
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/profiles/bob")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["bio"].as_str(), Some("hello"));
        assert!(json["data"]["fair_score"].is_null());
        assert_eq!(json["data"]["fair_score_fresh"].as_bool(), Some(false));
    }

    #[tokio::test]
    async fn stale_fairscore_is_refreshed_and_repacked() {
        let tapestry = MockServer::start().await;
        let fairscale = MockServer::start().await;

        // ts=1 is 1970: it decodes fine but is far beyond the 24h window.
        Mock::given(method("GET"))
            .and(path("/profiles/alice"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "profile": {
                    "id": "prof-1",
                    "username": "alice",
                    "bio": "solana dev |FAIRSCORE_META|{\"score\":10,\"ts\":1}"
                },
                "wallet": { "address": "Wa11etA1ice" }
            })))
            .mount(&tapestry)
            .await;

        Mock::given(method("GET"))
            .and(path("/fairScore"))
            .and(query_param("wallet", "Wa11etA1ice"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "fair_score": 99 })),
            )
            .expect(1)
            .mount(&fairscale)
            .await;

        // The refreshed score must be written back as a packed bio.
        Mock::given(method("PUT"))
            .and(path("/profiles/alice"))
            .and(body_string_contains("|FAIRSCORE_META|"))
            .and(body_string_contains("\\\"score\\\":99"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "prof-1",
                "username": "alice"
            })))
            .expect(1)
            .mount(&tapestry)
            .await;

        let app = test_app(&tapestry.uri(), &fairscale.uri());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/profiles/alice/fairscore")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["score"].as_i64(), Some(99));
        assert_eq!(json["data"]["source"].as_str(), Some("live"));
    }

    #[tokio::test]
    async fn fresh_fairscore_is_served_from_the_bio_cache() {
        let tapestry = MockServer::start().await;
        let fresh_ts = Utc::now().timestamp_millis();

        Mock::given(method("GET"))
            .and(path("/profiles/alice"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "profile": {
                    "id": "prof-1",
                    "username": "alice",
                    "bio": format!("dev |FAIRSCORE_META|{{\"score\":842,\"ts\":{fresh_ts}}}")
                },
                "wallet": { "address": "Wa11etA1ice" }
            })))
            .mount(&tapestry)
            .await;

        // Unreachable FairScale: a cache hit must not touch it.
        let app = test_app(&tapestry.uri(), "http://localhost:1");
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/profiles/alice/fairscore")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["score"].as_i64(), Some(842));
        assert_eq!(json["data"]["source"].as_str(), Some("cache"));
    }

    #[tokio::test]
    async fn channel_messages_filter_the_feed_and_sort_ascending() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/contents/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "contents": [
                    {
                        "content": {
                            "id": "c-2",
                            "text": "second |TAPESTRY_META|subnet=DevChat",
                            "created_at": 2_000_i64
                        },
                        "authorProfile": { "id": "prof-2", "username": "bob" }
                    },
                    {
                        "content": {
                            "id": "c-3",
                            "text": "hi |TAPESTRY_META|subnet=Other",
                            "created_at": 1_500_i64
                        },
                        "authorProfile": { "id": "prof-3", "username": "carol" }
                    },
                    {
                        "content": {
                            "id": "c-1",
                            "text": "first |TAPESTRY_META|subnet=DevChat",
                            "created_at": 1_000_i64
                        },
                        "authorProfile": { "id": "prof-1", "username": "alice" }
                    }
                ]
            })))
            .mount(&server)
            .await;

        let app = test_app(&server.uri(), "http://localhost:1");
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/channels/DevChat/messages?viewer_username=alice")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let data = json["data"].as_array().expect("data array");
        assert_eq!(data.len(), 2, "only DevChat messages should remain");
        assert_eq!(data[0]["content"].as_str(), Some("first"));
        assert_eq!(data[1]["content"].as_str(), Some("second"));
        assert_eq!(data[0]["is_own"].as_bool(), Some(true));
        assert_eq!(data[1]["is_own"].as_bool(), Some(false));
    }

    #[tokio::test]
    async fn send_message_packs_the_subnet_tag() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/contents/"))
            .and(body_string_contains("|TAPESTRY_META|subnet=DevChat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "c-9",
                "text": "gm |TAPESTRY_META|subnet=DevChat"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let app = test_app(&server.uri(), "http://localhost:1");
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/channels/DevChat/messages")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        serde_json::json!({ "wallet_address": "Wa11et", "text": " gm " })
                            .to_string(),
                    ))
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["id"].as_str(), Some("c-9"));
        assert_eq!(json["data"]["text"].as_str(), Some("gm"));
        assert_eq!(json["data"]["subnet"].as_str(), Some("DevChat"));
    }

    #[tokio::test]
    async fn send_message_rejects_blank_text() {
        let app = test_app("http://localhost:1", "http://localhost:1");
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/channels/DevChat/messages")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        serde_json::json!({ "wallet_address": "Wa11et", "text": "   " })
                            .to_string(),
                    ))
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn upstream_failure_maps_to_bad_gateway() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/contents/"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let app = test_app(&server.uri(), "http://localhost:1");
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/contents/feed")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"].as_str(), Some("bad_gateway"));
    }

    #[tokio::test]
    async fn upstream_404_maps_to_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/profiles/ghost"))
            .respond_with(ResponseTemplate::new(404).set_body_string("no such profile"))
            .mount(&server)
            .await;

        let app = test_app(&server.uri(), "http://localhost:1");
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/profiles/ghost")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn fairscore_route_requires_a_wallet() {
        let app = test_app("http://localhost:1", "http://localhost:1");
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/fairscore")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn create_profile_seeds_the_bio_with_a_packed_score() {
        let tapestry = MockServer::start().await;
        let fairscale = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/fairScore"))
            .and(query_param("wallet", "Wa11etCaro1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "fair_score": 55 })),
            )
            .mount(&fairscale)
            .await;

        Mock::given(method("POST"))
            .and(path("/profiles/findOrCreate"))
            .and(body_string_contains("|FAIRSCORE_META|"))
            .and(body_string_contains("\\\"score\\\":55"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "profile": { "id": "prof-3", "username": "carol", "bio": "gm" },
                "wallet": { "address": "Wa11etCaro1" }
            })))
            .expect(1)
            .mount(&tapestry)
            .await;

        let app = test_app(&tapestry.uri(), &fairscale.uri());
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/profiles")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        serde_json::json!({
                            "username": "carol",
                            "wallet_address": "Wa11etCaro1",
                            "bio": "gm"
                        })
                        .to_string(),
                    ))
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["username"].as_str(), Some("carol"));
    }

    #[tokio::test]
    async fn create_profile_survives_a_reputation_outage() {
        let tapestry = MockServer::start().await;

        // FairScale unreachable: the bio is forwarded unpacked.
        Mock::given(method("POST"))
            .and(path("/profiles/findOrCreate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "profile": { "id": "prof-4", "username": "dave", "bio": "hi" }
            })))
            .expect(1)
            .mount(&tapestry)
            .await;

        let app = test_app(&tapestry.uri(), "http://localhost:1");
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/profiles")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        serde_json::json!({
                            "username": "dave",
                            "wallet_address": "Wa11etDave",
                            "bio": "hi"
                        })
                        .to_string(),
                    ))
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn follow_state_proxies_the_flag() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/followers/state"))
            .and(query_param("startId", "alice"))
            .and(query_param("endId", "Community_DevChat"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "isFollowing": true })),
            )
            .mount(&server)
            .await;

        let app = test_app(&server.uri(), "http://localhost:1");
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/followers/state?follower_username=alice&followee_username=Community_DevChat")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["is_following"].as_bool(), Some(true));
    }
}
