use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use chrono::{DateTime, TimeZone};
use chrono_tz::Tz;
use serde_json::Value;
use tower::ServiceExt;

use adoptai_schedule::{DatasetKeys, FixedClock, MemoryStore, ScheduleCache, DEFAULT_TIMEZONE};

use super::{create_router, AppState};

const SESSIONS_JSON: &str = r#"{
  "metadata": {"scrapedAt": "2025-11-19T12:00:00Z", "totalSessions": 3},
  "sessions": [
    {"id":"session-1","title":"AI in Banking","date":"Nov 25, 2025","startTime":"9:30 AM","endTime":"10:00 AM","stage":"CEO Stage","speakers":[{"name":"John Doe","company":"BigBank","role":"CEO"}],"ecosystems":["finance"]},
    {"id":"session-2","title":"Cloud Infrastructure","date":"Nov 25, 2025","startTime":"2:00 PM","endTime":"2:30 PM","stage":"Mainstage South","speakers":[],"ecosystems":["cloud"]},
    {"id":"session-3","title":"Future of AI","date":"Nov 26, 2025","startTime":"10:00 AM","endTime":"10:30 AM","stage":"CEO Stage","speakers":[{"name":"Jane Smith","company":"Anthropic","role":"Researcher"}],"ecosystems":["ai"]}
  ]
}"#;

const SPEAKERS_JSON: &str = r#"{
  "metadata": {"scrapedAt": "2025-11-19T12:00:00Z", "totalSpeakers": 2},
  "speakers": [
    {"name":"John Doe","company":"BigBank","title":"CEO","sessions":["session-1"]},
    {"name":"Jane Smith","company":"Anthropic","title":"Researcher","sessions":["session-3"]}
  ]
}"#;

const LLMS_TXT: &str =
    "# AdoptAI API\n\n240+ sessions • 200+ speakers\n\n## Endpoints\n\nGET /sessions\nGET /speakers";

fn sample_store() -> MemoryStore {
    MemoryStore::new()
        .with_object("data/sessions.json", SESSIONS_JSON)
        .with_object("data/speakers.json", SPEAKERS_JSON)
        .with_object("data/llms.txt", LLMS_TXT)
}

fn paris(day: u32, hour: u32, minute: u32) -> DateTime<Tz> {
    DEFAULT_TIMEZONE
        .with_ymd_and_hms(2025, 11, day, hour, minute, 0)
        .unwrap()
}

fn app_at(store: MemoryStore, now: DateTime<Tz>) -> Router {
    let cache = ScheduleCache::new(Arc::new(store), DatasetKeys::default(), DEFAULT_TIMEZONE);
    create_router(AppState::new(
        cache,
        Arc::new(FixedClock::new(now)),
        "adoptai-api",
    ))
}

fn app(store: MemoryStore) -> Router {
    app_at(store, paris(25, 8, 0))
}

async fn send(app: Router, method: &str, uri: &str) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = send(app, "GET", uri).await;
    let status = response.status();
    assert_eq!(
        response.headers()["content-type"],
        "application/json; charset=utf-8"
    );
    let body = body_bytes(response).await;
    (status, serde_json::from_slice(&body).unwrap())
}

fn session_ids(body: &Value) -> Vec<&str> {
    body["sessions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_str().unwrap())
        .collect()
}

fn assert_cors(response: &Response<Body>) {
    let headers = response.headers();
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert_eq!(headers["access-control-allow-methods"], "GET, OPTIONS");
    assert_eq!(
        headers["access-control-allow-headers"],
        "Content-Type, Authorization"
    );
}

#[tokio::test]
async fn test_root_serves_text_document() {
    let response = send(app(sample_store()), "GET", "/").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        "text/plain; charset=utf-8"
    );
    assert_cors(&response);
    let body = String::from_utf8(body_bytes(response).await).unwrap();
    assert_eq!(body, LLMS_TXT);
}

#[tokio::test]
async fn test_root_and_llms_txt_identical() {
    let router = app(sample_store());

    let root = body_bytes(send(router.clone(), "GET", "/").await).await;
    let llms = body_bytes(send(router, "GET", "/llms.txt").await).await;

    assert_eq!(root, llms);
}

#[tokio::test]
async fn test_text_document_placeholder_when_missing() {
    let response = send(app(MemoryStore::new()), "GET", "/llms.txt").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(body.contains("Visit /sessions or /speakers for data"));
}

#[tokio::test]
async fn test_robots_txt() {
    let response = send(app(sample_store()), "GET", "/robots.txt").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        "text/plain; charset=utf-8"
    );
    assert_eq!(body_bytes(response).await, b"User-agent: *\nAllow: /\n");
}

#[tokio::test]
async fn test_health() {
    let (status, body) = get_json(app(MemoryStore::new()), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        serde_json::json!({"status": "healthy", "service": "adoptai-api"})
    );
}

#[tokio::test]
async fn test_list_all_sessions() {
    let (status, body) = get_json(app(sample_store()), "/sessions").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 3);
    assert_eq!(body["count"], 3);
    assert_eq!(body["filters"], serde_json::json!({}));
    assert_eq!(session_ids(&body), vec!["session-1", "session-2", "session-3"]);

    let first = body["sessions"][0].as_object().unwrap();
    let mut keys: Vec<&str> = first.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(
        keys,
        vec!["date", "ecosystems", "id", "speakers", "stage", "time", "title"]
    );
    assert_eq!(first["time"], "9:30 AM - 10:00 AM");
    assert_eq!(first["speakers"][0]["company"], "BigBank");
}

#[tokio::test]
async fn test_filter_by_date_code() {
    let router = app(sample_store());

    let (_, day_one) = get_json(router.clone(), "/sessions?date=2025-11-25").await;
    assert_eq!(day_one["count"], 2);
    assert_eq!(day_one["total"], 3);
    assert_eq!(day_one["filters"]["date"], "2025-11-25");

    let (_, day_two) = get_json(router.clone(), "/sessions?date=2025-11-26").await;
    assert_eq!(session_ids(&day_two), vec!["session-3"]);

    let (_, label) = get_json(router, "/sessions?date=Nov%2025").await;
    assert_eq!(label["count"], 2);
}

#[tokio::test]
async fn test_filter_by_stage_partial_case_insensitive() {
    let (_, body) = get_json(app(sample_store()), "/sessions?stage=mainstage%20south").await;

    assert_eq!(session_ids(&body), vec!["session-2"]);
}

#[tokio::test]
async fn test_filter_by_time_of_day() {
    let router = app(sample_store());

    let (_, morning) = get_json(router.clone(), "/sessions?time=morning").await;
    assert_eq!(session_ids(&morning), vec!["session-1", "session-3"]);

    let (_, afternoon) = get_json(router.clone(), "/sessions?time=Afternoon").await;
    assert_eq!(session_ids(&afternoon), vec!["session-2"]);

    let (_, evening) = get_json(router, "/sessions?time=evening").await;
    assert_eq!(evening["count"], 3);
}

#[tokio::test]
async fn test_search_matches_speaker_company() {
    let router = app(sample_store());

    let (_, body) = get_json(router.clone(), "/sessions?search=anthropic").await;
    assert_eq!(session_ids(&body), vec!["session-3"]);

    let (_, by_ecosystem) = get_json(router, "/sessions?search=CLOUD").await;
    assert_eq!(session_ids(&by_ecosystem), vec!["session-2"]);
}

#[tokio::test]
async fn test_combined_filters() {
    let (_, body) = get_json(
        app(sample_store()),
        "/sessions?date=2025-11-25&stage=CEO&time=morning&search=bank",
    )
    .await;

    assert_eq!(session_ids(&body), vec!["session-1"]);
    assert_eq!(body["filters"].as_object().unwrap().len(), 4);
}

#[tokio::test]
async fn test_filters_echo_first_value_and_unknown_params() {
    let (_, body) = get_json(
        app(sample_store()),
        "/sessions?stage=CEO&stage=Mainstage&foo=bar&search=",
    )
    .await;

    assert_eq!(
        body["filters"],
        serde_json::json!({"stage": "CEO", "foo": "bar"})
    );
    assert_eq!(session_ids(&body), vec!["session-1", "session-3"]);
}

#[tokio::test]
async fn test_malformed_query_string() {
    let (status, body) = get_json(app(sample_store()), "/sessions?invalid&&&").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 3);
    assert_eq!(body["filters"], serde_json::json!({}));
}

#[tokio::test]
async fn test_now_window_ongoing() {
    let (status, body) = get_json(
        app_at(sample_store(), paris(25, 9, 45)),
        "/sessions?now=true",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["currentTime"], "2025-11-25 09:45 CET");
    assert_eq!(body["timezone"], "Europe/Paris");
    assert_eq!(body["ongoing"]["description"], "Sessions currently in progress");
    assert_eq!(body["ongoing"]["count"], 1);
    assert_eq!(body["ongoing"]["sessions"][0]["id"], "session-1");
    assert_eq!(
        body["upcoming"]["description"],
        "Sessions starting within 30 minutes"
    );
    assert_eq!(body["upcoming"]["count"], 0);
}

#[tokio::test]
async fn test_now_window_upcoming() {
    // 15 minutes before session-3
    let (_, body) = get_json(
        app_at(sample_store(), paris(26, 9, 45)),
        "/sessions?now=1&stage=Mainstage",
    )
    .await;

    assert_eq!(body["ongoing"]["count"], 0);
    assert_eq!(body["upcoming"]["count"], 1);
    assert_eq!(body["upcoming"]["sessions"][0]["id"], "session-3");
}

#[tokio::test]
async fn test_now_false_lists_sessions() {
    let (_, body) = get_json(
        app_at(sample_store(), paris(25, 9, 45)),
        "/sessions?now=false",
    )
    .await;

    assert_eq!(body["count"], 3);
    assert_eq!(body["filters"]["now"], "false");
}

#[tokio::test]
async fn test_list_speakers() {
    let router = app(sample_store());

    let (status, body) = get_json(router.clone(), "/speakers").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert_eq!(body["speakers"][0]["name"], "John Doe");
    assert_eq!(body["speakers"][0]["title"], "CEO");
    assert_eq!(
        body["speakers"][0]["sessions"],
        serde_json::json!(["session-1"])
    );

    let (_, found) = get_json(router, "/speakers?search=RESEARCH").await;
    assert_eq!(found["count"], 1);
    assert_eq!(found["speakers"][0]["company"], "Anthropic");
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let response = send(app(sample_store()), "GET", "/unknown-path").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_cors(&response);
    let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body["error"], "Not Found");
    assert_eq!(body["message"], "Path /unknown-path not found");
    assert_eq!(
        body["available_endpoints"],
        serde_json::json!(["/", "/llms.txt", "/sessions", "/speakers", "/health"])
    );
}

#[tokio::test]
async fn test_options_returns_empty_ok() {
    for path in ["/sessions", "/unknown-path"] {
        let response = send(app(sample_store()), "OPTIONS", path).await;

        assert_eq!(response.status(), StatusCode::OK, "{}", path);
        assert_cors(&response);
        assert!(body_bytes(response).await.is_empty());
    }
}

#[tokio::test]
async fn test_browser_preflight() {
    let response = app(sample_store())
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/speakers")
                .header("origin", "https://example.com")
                .header("access-control-request-method", "GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_cors(&response);
}

#[tokio::test]
async fn test_missing_dataset_is_internal_error() {
    let router = app(MemoryStore::new());

    for path in ["/sessions", "/speakers"] {
        let response = send(router.clone(), "GET", path).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_cors(&response);
        let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(body["error"], "Internal Server Error");
        assert!(body["message"].as_str().unwrap().contains("NoSuchKey"));
    }
}

#[tokio::test]
async fn test_malformed_dataset_is_internal_error() {
    let store = MemoryStore::new().with_object("data/sessions.json", "{ invalid json }");

    let (status, body) = get_json(app(store), "/sessions").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["message"].as_str().unwrap().contains("invalid JSON"));
}

#[tokio::test]
async fn test_non_ascii_emitted_literally() {
    let store = MemoryStore::new().with_object(
        "data/sessions.json",
        r#"{"sessions":[{"id":"s1","title":"Café • Société Générale","date":"Nov 25, 2025"}]}"#,
    );

    let response = send(app(store), "GET", "/sessions").await;
    let body = String::from_utf8(body_bytes(response).await).unwrap();

    assert!(body.contains("Café • Société Générale"));
    assert!(!body.contains("\\u"));
}

#[tokio::test]
async fn test_session_view_omits_internal_fields() {
    let (_, body) = get_json(app(sample_store()), "/sessions?search=cloud").await;
    let session = body["sessions"][0].as_object().unwrap();

    for hidden in ["startTime", "endTime", "start", "end", "start_time"] {
        assert!(!session.contains_key(hidden), "{}", hidden);
    }
}

#[tokio::test]
async fn test_missing_fields_default() {
    let store = MemoryStore::new().with_object(
        "data/sessions.json",
        r#"{"sessions":[{"id":"s1","title":null,"date":"Nov 25, 2025","startTime":"9:00 AM"}]}"#,
    );

    let (_, body) = get_json(app(store), "/sessions").await;
    let session = &body["sessions"][0];

    assert_eq!(session["title"], "");
    assert_eq!(session["time"], "9:00 AM");
    assert_eq!(session["stage"], "");
    assert_eq!(session["speakers"], serde_json::json!([]));
}

#[tokio::test]
async fn test_other_methods_served_like_get() {
    let router = app(sample_store());

    let response = send(router.clone(), "POST", "/sessions?stage=CEO").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_cors(&response);
    let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body["count"], 2);

    let health = send(router.clone(), "DELETE", "/health").await;
    assert_eq!(health.status(), StatusCode::OK);

    let unknown = send(router, "PUT", "/nowhere").await;
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_speaker_records_returned_as_stored() {
    let store = MemoryStore::new()
        .with_object(
            "data/sessions.json",
            r#"{"sessions":[{"id":"s1","title":"Keynote","date":"Nov 25, 2025","speakers":[{"name":"Damien","company":"Artefact","title":"CEO & Founder","photo":"p.jpg"}]}]}"#,
        )
        .with_object(
            "data/speakers.json",
            r#"{"speakers":[{"name":"A","company":"B","title":"CEO","role":"Founder","linkedin":"in/a"}]}"#,
        );
    let router = app(store);

    let (_, sessions) = get_json(router.clone(), "/sessions?search=ceo").await;
    assert_eq!(sessions["count"], 1);
    assert_eq!(
        sessions["sessions"][0]["speakers"][0],
        serde_json::json!({"name":"Damien","company":"Artefact","title":"CEO & Founder","photo":"p.jpg"})
    );

    let (status, speakers) = get_json(router, "/speakers?search=founder").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(speakers["count"], 1);
    assert_eq!(speakers["speakers"][0]["title"], "CEO");
    assert_eq!(speakers["speakers"][0]["role"], "Founder");
    assert_eq!(speakers["speakers"][0]["linkedin"], "in/a");
}
