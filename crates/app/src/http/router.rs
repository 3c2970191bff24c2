use std::time::Duration;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::Method;
use axum::middleware;
use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::config::CorsPolicy;
use crate::http::middleware::auth;
use crate::http::routes::{admin, comments, health};
use crate::state::AppState;

const CORS_MAX_AGE: Duration = Duration::from_secs(600);

pub fn build(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors);
    let user_routes = Router::new()
        .route("/v1/comment", post(comments::post_comment))
        .route(
            "/v1/comment/{comment_id}",
            put(comments::put_comment).delete(comments::delete_comment),
        )
        .route("/v1/comment/{comment_id}/report", post(comments::post_report))
        .route("/v1/comments", get(comments::get_comments))
        .route("/v1/comments/my", get(comments::get_my_comments))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_user,
        ));
    let admin_routes = Router::new()
        .route("/v1/admin/comments", get(admin::comments::list_comments))
        .route(
            "/v1/admin/comments/republish",
            post(admin::comments::republish_comments),
        )
        .route(
            "/v1/admin/comments/{comment_id}",
            put(admin::comments::put_comment).delete(admin::comments::soft_delete_comment),
        )
        .route(
            "/v1/admin/comments/{comment_id}/permanent",
            delete(admin::comments::hard_delete_comment),
        )
        .route("/v1/admin/reports", get(admin::reports::list_reports))
        .route("/v1/admin/reports/{report_id}", put(admin::reports::put_report))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_admin,
        ));
    let mut router = Router::new()
        .route("/health", get(health::health))
        .merge(user_routes)
        .merge(admin_routes)
        .with_state(state);
    if let Some(cors) = cors {
        router = router.layer(cors);
    }
    router
}

fn cors_layer(policy: &CorsPolicy) -> Option<CorsLayer> {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(CORS_MAX_AGE);
    match policy {
        CorsPolicy::Disabled => None,
        CorsPolicy::AnyOrigin => Some(layer.allow_origin(Any)),
        CorsPolicy::Origins(origins) => Some(layer.allow_origin(AllowOrigin::list(origins.iter().cloned()))),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{HeaderValue, Request, StatusCode};
    use axum::Router;
    use reqwest::Client;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::build;
    use crate::config::{AppConfig, CorsPolicy};
    use crate::http::middleware::auth::issue_token;
    use crate::state::AppState;
    use commentary_core::domain::comments::CommentStatus;
    use commentary_core::service::CommentService;
    use commentary_core::testing::MemoryStore;
    use commentary_infra::events::EventBus;

    struct Harness {
        router: Router,
        store: Arc<MemoryStore>,
        events: EventBus,
    }

    fn harness() -> Harness {
        harness_with(AppConfig::for_tests())
    }

    fn harness_with(config: AppConfig) -> Harness {
        let store = Arc::new(MemoryStore::new());
        let events = EventBus::with_capacity(64);
        let comments = CommentService::new(
            store.clone(),
            Arc::new(events.clone()),
            config.plugin_settings(),
        );
        let state = AppState {
            config: Arc::new(config),
            comments,
            events: events.clone(),
            http_client: Client::new(),
        };
        Harness {
            router: build(state),
            store,
            events,
        }
    }

    fn token(user: &str, admin: bool) -> String {
        issue_token("test-secret", user, admin, 300).unwrap()
    }

    async fn send(
        router: &Router,
        method: &str,
        uri: &str,
        bearer: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = bearer {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let body = match body {
            Some(value) => {
                builder = builder.header("content-type", "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        let response = router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn create(router: &Router, user: &str, body: Value) -> Value {
        let (status, json) = send(router, "POST", "/v1/comment", Some(&token(user, false)), Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "{json}");
        json
    }

    async fn preflight(router: &Router, origin: &str) -> Option<HeaderValue> {
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/v1/comments")
            .header("origin", origin)
            .header("access-control-request-method", "GET")
            .header("access-control-request-headers", "authorization")
            .body(Body::empty())
            .unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        response.headers().get("access-control-allow-origin").cloned()
    }

    #[tokio::test]
    async fn cors_is_off_unless_configured() {
        let h = harness();
        assert_eq!(preflight(&h.router, "https://a.example").await, None);
    }

    #[tokio::test]
    async fn cors_echoes_only_listed_origins() {
        let mut config = AppConfig::for_tests();
        config.cors = CorsPolicy::Origins(vec![HeaderValue::from_static("https://a.example")]);
        let h = harness_with(config);
        assert_eq!(
            preflight(&h.router, "https://a.example").await,
            Some(HeaderValue::from_static("https://a.example"))
        );
        assert_eq!(preflight(&h.router, "https://b.example").await, None);
    }

    #[tokio::test]
    async fn cors_any_origin_answers_with_wildcard() {
        let mut config = AppConfig::for_tests();
        config.cors = CorsPolicy::AnyOrigin;
        let h = harness_with(config);
        assert_eq!(
            preflight(&h.router, "https://b.example").await,
            Some(HeaderValue::from_static("*"))
        );
    }

    #[tokio::test]
    async fn health_is_public() {
        let h = harness();
        let (status, json) = send(&h.router, "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert_eq!(json["modules"]["auth"]["configured"], true);
        assert_eq!(json["settings"]["defaultStatus"], "published");
    }

    #[tokio::test]
    async fn user_routes_require_a_valid_token() {
        let h = harness();
        let (status, json) = send(&h.router, "GET", "/v1/comments?entityContextId=post-1", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["code"], "UNAUTHORIZED");

        let forged = issue_token("other-secret", "u1", false, 300).unwrap();
        let (status, _) = send(
            &h.router,
            "GET",
            "/v1/comments?entityContextId=post-1",
            Some(&forged),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn missing_secret_reports_unavailable() {
        let mut config = AppConfig::for_tests();
        config.token_secret = None;
        let h = harness_with(config);
        let (status, _) = send(
            &h.router,
            "GET",
            "/v1/comments/my",
            Some(&token("u1", false)),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn admin_routes_refuse_plain_users() {
        let h = harness();
        let (status, json) = send(
            &h.router,
            "GET",
            "/v1/admin/comments",
            Some(&token("u1", false)),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json["code"], "FORBIDDEN");
    }

    #[tokio::test]
    async fn create_reply_and_list_thread() {
        let h = harness();
        let mut receiver = h.events.subscribe();
        let root = create(
            &h.router,
            "u1",
            json!({ "content": "first", "entityContextId": "post-1" }),
        )
        .await;
        assert_eq!(root["status"], "published");
        assert_eq!(root["version"], 1);
        assert!(root["parentCommentId"].is_null());

        let root_id = root["id"].as_str().unwrap();
        let reply = create(
            &h.router,
            "u2",
            json!({ "content": "reply", "entityContextId": "post-1", "parentCommentId": root_id }),
        )
        .await;
        assert_eq!(reply["parentCommentId"], root_id);

        let (status, page) = send(
            &h.router,
            "GET",
            "/v1/comments?entityContextId=post-1&cursor=null",
            Some(&token("u3", false)),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["totalCount"], 1);
        assert_eq!(page["items"][0]["id"], root_id);
        assert_eq!(page["items"][0]["subComments"][0]["content"], "reply");
        assert!(page["endCursor"].is_string());
        assert_eq!(page["hasNextPage"], false);

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.name.as_str(), "comment.create");
    }

    #[tokio::test]
    async fn create_validates_input() {
        let h = harness();
        let user = token("u1", false);
        let (status, json) = send(
            &h.router,
            "POST",
            "/v1/comment",
            Some(&user),
            Some(json!({ "content": "hi" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "INVALID_INPUT");

        let (status, json) = send(
            &h.router,
            "POST",
            "/v1/comment",
            Some(&user),
            Some(json!({
                "content": "hi",
                "entityContextId": "post-1",
                "parentCommentId": "0191a1f0-0000-7000-8000-000000000000"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["code"], "COMMENT_NOT_FOUND");
    }

    #[tokio::test]
    async fn only_the_author_may_edit_or_delete() {
        let h = harness();
        let comment = create(
            &h.router,
            "u1",
            json!({ "content": "mine", "entityContextId": "post-1" }),
        )
        .await;
        let uri = format!("/v1/comment/{}", comment["id"].as_str().unwrap());

        let (status, json) = send(
            &h.router,
            "PUT",
            &uri,
            Some(&token("u2", false)),
            Some(json!({ "content": "hijacked" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json["code"], "COMMENT_NOT_AUTHOR");

        let (status, json) = send(
            &h.router,
            "PUT",
            &uri,
            Some(&token("u1", false)),
            Some(json!({ "content": "edited" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["content"], "edited");
        assert_eq!(json["version"], 2);

        let (status, _) = send(&h.router, "DELETE", &uri, Some(&token("u2", false)), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = send(&h.router, "DELETE", &uri, Some(&token("u1", false)), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(h.store.comments().is_empty());
    }

    #[tokio::test]
    async fn report_flags_comment_and_shows_in_admin_queue() {
        let h = harness();
        let comment = create(
            &h.router,
            "u1",
            json!({ "content": "spam", "entityContextId": "post-1" }),
        )
        .await;
        let comment_id = comment["id"].as_str().unwrap();

        let (status, report) = send(
            &h.router,
            "POST",
            &format!("/v1/comment/{comment_id}/report"),
            Some(&token("u2", false)),
            Some(json!({ "reason": "advertising", "category": "spam" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(report["commentId"], comment_id);
        assert_eq!(report["status"], "new");
        assert!(h.store.comments()[0].is_reported);

        let admin = token("mod", true);
        let (status, page) = send(
            &h.router,
            "GET",
            &format!("/v1/admin/reports?commentId={comment_id}"),
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["totalCount"], 1);

        let report_id = report["id"].as_str().unwrap();
        let (status, updated) = send(
            &h.router,
            "PUT",
            &format!("/v1/admin/reports/{report_id}"),
            Some(&admin),
            Some(json!({ "status": "resolved", "internalNote": "removed" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["status"], "resolved");
        assert_eq!(updated["internalNote"], "removed");
    }

    #[tokio::test]
    async fn admin_soft_then_hard_delete() {
        let h = harness();
        let comment = create(
            &h.router,
            "u1",
            json!({ "content": "rude", "entityContextId": "post-1" }),
        )
        .await;
        let id = comment["id"].as_str().unwrap();
        let admin = token("mod", true);

        let (status, _) = send(
            &h.router,
            "DELETE",
            &format!("/v1/admin/comments/{id}"),
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let stored = h.store.comments();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].status, CommentStatus::Deleted);

        let (_, page) = send(
            &h.router,
            "GET",
            "/v1/comments?entityContextId=post-1",
            Some(&token("u1", false)),
            None,
        )
        .await;
        assert_eq!(page["totalCount"], 0);

        let (status, _) = send(
            &h.router,
            "DELETE",
            &format!("/v1/admin/comments/{id}/permanent"),
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(h.store.comments().is_empty());

        let (status, json) = send(
            &h.router,
            "DELETE",
            &format!("/v1/admin/comments/{id}/permanent"),
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["code"], "COMMENT_NOT_FOUND");
    }

    #[tokio::test]
    async fn admin_update_merges_and_rejects_unknown_fields() {
        let h = harness();
        let comment = create(
            &h.router,
            "u1",
            json!({ "content": "draft", "entityContextId": "post-1" }),
        )
        .await;
        let uri = format!("/v1/admin/comments/{}", comment["id"].as_str().unwrap());
        let admin = token("mod", true);

        let (status, json) = send(
            &h.router,
            "PUT",
            &uri,
            Some(&admin),
            Some(json!({ "status": "approved", "meta": { "pinned": true } })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "approved");
        assert_eq!(json["content"], "draft");
        assert_eq!(json["meta"]["pinned"], true);

        let (status, _) = send(&h.router, "PUT", &uri, Some(&admin), Some(json!({ "flair": "x" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&h.router, "PUT", &uri, Some(&admin), Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn republish_requires_a_criterion_and_counts_matches() {
        let h = harness();
        for n in 0..3 {
            create(
                &h.router,
                "u1",
                json!({ "content": format!("c{n}"), "entityContextId": "post-1" }),
            )
            .await;
        }
        create(
            &h.router,
            "u1",
            json!({ "content": "elsewhere", "entityContextId": "post-2" }),
        )
        .await;
        let admin = token("mod", true);

        let (status, _) = send(
            &h.router,
            "POST",
            "/v1/admin/comments/republish",
            Some(&admin),
            Some(json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, json) = send(
            &h.router,
            "POST",
            "/v1/admin/comments/republish",
            Some(&admin),
            Some(json!({ "entityContextId": "post-1" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["republishedCount"], 3);

        let (status, json) = send(
            &h.router,
            "POST",
            "/v1/admin/comments/republish",
            Some(&admin),
            Some(json!({
                "startDate": "2000-01-01T00:00:00Z",
                "endDate": "2999-01-01T00:00:00Z"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["republishedCount"], 4);
    }

    #[tokio::test]
    async fn my_comments_pages_with_end_cursor() {
        let h = harness();
        for n in 0..3 {
            create(
                &h.router,
                "u1",
                json!({ "content": format!("c{n}"), "entityContextId": "post-1" }),
            )
            .await;
        }
        let user = token("u1", false);
        let (_, first) = send(&h.router, "GET", "/v1/comments/my?first=2", Some(&user), None).await;
        assert_eq!(first["items"].as_array().unwrap().len(), 2);
        assert_eq!(first["hasNextPage"], true);
        let cursor = first["endCursor"].as_str().unwrap();

        let (_, second) = send(
            &h.router,
            "GET",
            &format!("/v1/comments/my?first=2&cursor={cursor}"),
            Some(&user),
            None,
        )
        .await;
        assert_eq!(second["items"].as_array().unwrap().len(), 1);
        assert_eq!(second["hasNextPage"], false);
        assert_eq!(second["hasPrevPage"], true);
    }
}
