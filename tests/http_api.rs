mod common;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use quizzz_back::routes;

use common::{harness, stage_questions};

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test(start_paused = true)]
async fn healthcheck_reports_ok() {
    let h = harness(1);
    let app = routes::router(h.state);
    let (status, body) = send(&app, Method::GET, "/healthcheck", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test(start_paused = true)]
async fn staging_routes_accept_and_decline() {
    let h = harness(1);
    let app = routes::router(h.state);

    let ann = json!({ "name": "ann" });
    let (status, body) = send(&app, Method::POST, "/multiplayer/staging/players", Some(ann.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["staging_id"], 0);

    let (status, _) = send(&app, Method::POST, "/multiplayer/staging/players", Some(ann.clone())).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        Method::POST,
        "/multiplayer/staging/players",
        Some(json!({ "name": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = send(&app, Method::POST, "/multiplayer/staging/username", Some(ann.clone())).await;
    assert_eq!(body["available"], false);
    let (_, body) = send(
        &app,
        Method::POST,
        "/multiplayer/staging/username",
        Some(json!({ "name": "" })),
    )
    .await;
    assert_eq!(body["available"], false);

    let (_, body) = send(&app, Method::GET, "/multiplayer/staging/players", None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["name"], "ann");

    let (_, body) = send(&app, Method::POST, "/multiplayer/staging/players/leave", Some(ann)).await;
    assert_eq!(body["removed"], true);
}

#[tokio::test(start_paused = true)]
async fn polling_answers_with_fingerprint_or_no_content() {
    let h = harness(1);
    let app = routes::router(h.state);

    let (status, _) = send(&app, Method::GET, "/multiplayer/updates/7", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, Method::GET, "/multiplayer/updates/0", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let stale = "/multiplayer/updates/0?roster_hash=0000000000000000&phase=WAITING&question_index=-1";
    let (status, body) = send(&app, Method::GET, stale, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["phase"], "WAITING");
    assert_eq!(body["question_index"], -1);

    let bogus = "/multiplayer/updates/0?roster_hash=00&phase=SCOREBOARD&question_index=0";
    let (status, _) = send(&app, Method::GET, bogus, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test(start_paused = true)]
async fn match_routes_follow_a_started_match() {
    let h = harness(1);
    let app = routes::router(h.state.clone());

    let (_, body) = send(&app, Method::POST, "/multiplayer/start", None).await;
    assert_eq!(body["started"], false);

    stage_questions(&h.state, 1).await;
    send(&app, Method::POST, "/multiplayer/staging/players", Some(json!({ "name": "ann" }))).await;
    let (status, body) = send(&app, Method::POST, "/multiplayer/start", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["started"], true);
    assert_eq!(body["match_id"], 0);

    let (status, snapshot) = send(&app, Method::GET, "/multiplayer/matches/0", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(snapshot["phase"], "LOADING");
    assert_eq!(snapshot["question_index"], -1);
    assert_eq!(snapshot["questions"][0]["type"], "comparative");

    let (status, _) = send(&app, Method::GET, "/multiplayer/matches/9", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let score = |name: &str, score: i64| Some(json!({ "name": name, "score": score }));
    let (status, body) = send(&app, Method::POST, "/multiplayer/matches/0/score", score("ann", 250)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["score"], 250);
    let (status, _) = send(&app, Method::POST, "/multiplayer/matches/0/score", score("ann", -1)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(&app, Method::POST, "/multiplayer/matches/0/score", score("zed", 5)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = send(&app, Method::POST, "/multiplayer/matches/4/score", score("ann", 5)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let answer = json!({ "name": "ann", "elapsed_seconds": 4, "answer": { "kind": "choice", "index": 2 } });
    let (status, _) = send(&app, Method::POST, "/multiplayer/matches/0/answers", Some(answer.clone())).await;
    assert_eq!(status, StatusCode::CONFLICT, "no question on screen while loading");

    let (status, body) = send(&app, Method::GET, "/multiplayer/updates/0", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["phase"], "QUESTION");
    assert_eq!(body["question_index"], 0);

    let (status, body) = send(&app, Method::POST, "/multiplayer/matches/0/answers", Some(answer)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["points_awarded"], 1040);
    assert_eq!(body["player"]["score"], 1290);

    let (_, roster) = send(&app, Method::GET, "/multiplayer/matches/0/players", None).await;
    assert_eq!(roster[0]["name"], "ann");
    assert_eq!(roster[0]["streak"], 1);

    let (_, body) = send(
        &app,
        Method::POST,
        "/multiplayer/matches/0/players/leave",
        Some(json!({ "name": "ann" })),
    )
    .await;
    assert_eq!(body["removed"], true);
}

#[tokio::test]
async fn openapi_document_is_served() {
    let h = harness(1);
    let app = routes::router(h.state);
    let (status, body) = send(&app, Method::GET, routes::docs::OPENAPI_PATH, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/multiplayer/updates/{id}"].is_object());
}
