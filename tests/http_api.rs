use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::fs;
use tempfile::TempDir;
use tower::ServiceExt;

use sst_auditor::config::parse_config;
use sst_auditor::ingest::{run_ingest, IngestMode};
use sst_auditor::server::{router, AppState};

async fn setup() -> (TempDir, AppState) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    let pdf_dir = root.join("pdfs");
    fs::create_dir_all(&pdf_dir).unwrap();
    fs::write(
        pdf_dir.join("nr-18.txt"),
        "NR-18 Condições de Segurança e Saúde no Trabalho na Indústria da Construção. Andaimes e plataformas.",
    )
    .unwrap();

    let config = parse_config(&format!(
        r#"[db]
path = "{root}/data/sst.sqlite"

[index]
pdf_dir = "{root}/pdfs"
ingest_on_startup = false
"#,
        root = root.display()
    ))
    .unwrap();

    let state = AppState::build(&config).await.unwrap();
    (tmp, state)
}

async fn indexed_app() -> (TempDir, Router) {
    let (tmp, state) = setup().await;
    run_ingest(&state.config, &state.pool, IngestMode::Incremental)
        .await
        .unwrap();
    (tmp, router(state))
}

async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::post(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn lists_checklists_in_definition_order() {
    let (_tmp, state) = setup().await;
    let (status, body) = get_json(router(state), "/checklists").await;
    assert_eq!(status, StatusCode::OK);
    let names = body.as_array().unwrap();
    assert!(names[0].as_str().unwrap().starts_with("NR-01"));
    assert!(names.contains(&json!("NR-35: Trabalho em Altura")));
}

#[tokio::test]
async fn checklist_items_known_and_unknown() {
    let (_tmp, state) = setup().await;
    let app = router(state);

    let (status, body) = post_json(
        app.clone(),
        "/checklists/items",
        json!({"name": "NR-35: Trabalho em Altura"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 10);

    let (status, body) = post_json(app, "/checklists/items", json!({"name": "NR-99"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn search_returns_hits_with_locator() {
    let (_tmp, app) = indexed_app().await;

    let (status, body) = post_json(app.clone(), "/search", json!({"term": "andaimes"})).await;
    assert_eq!(status, StatusCode::OK);
    let hits = body.as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["title"], "nr-18.txt");
    assert_eq!(hits[0]["locator"], "/pdfs/nr-18.txt");
    assert!(hits[0]["snippet"].as_str().unwrap().contains("<b>"));

    let (status, body) = post_json(app, "/search", json!({"term": ""})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn brigade_industrial_medium_risk() {
    let (_tmp, state) = setup().await;
    let (status, body) = post_json(
        router(state),
        "/brigade",
        json!({"headcount": 50, "divisionCode": "I-2"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["requiredCount"], 11);
    assert_eq!(body["trainingTier"], "Intermediate");
    assert_eq!(body["fallbackApplied"], false);
    assert!(body["computationTrace"]
        .as_str()
        .unwrap()
        .contains("Total 11"));
}

#[tokio::test]
async fn brigade_unknown_division_falls_back() {
    let (_tmp, state) = setup().await;
    let (status, body) = post_json(
        router(state),
        "/brigade",
        json!({"headcount": 5, "divisionCode": "Z-9"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fallbackApplied"], true);
    assert_eq!(body["resolvedDivision"], "D-1");
    assert_eq!(body["requiredCount"], 2);
}

#[tokio::test]
async fn brigade_rejects_non_positive_headcount() {
    let (_tmp, state) = setup().await;
    let (status, body) = post_json(
        router(state),
        "/brigade",
        json!({"headcount": 0, "divisionCode": "I-2"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_input");
}

#[tokio::test]
async fn malformed_json_is_invalid_input() {
    let (_tmp, state) = setup().await;
    let response = router(state)
        .oneshot(
            Request::post("/brigade")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{\"headcount\": "))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["kind"], "invalid_input");
}

#[tokio::test]
async fn cipa_below_threshold_has_no_commission() {
    let (_tmp, state) = setup().await;
    let (status, body) = post_json(
        router(state),
        "/cipa",
        json!({"activityCode": "47.11-3", "headcount": 19}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["effectiveMembers"], 0);
    assert_eq!(body["alternateMembers"], 0);
    assert_eq!(body["designatedOnly"], true);
}

#[tokio::test]
async fn sesmt_unknown_risk_grade_is_configuration_error() {
    let (_tmp, state) = setup().await;
    let (status, body) = post_json(
        router(state),
        "/sesmt",
        json!({"activityCode": "41.20-4", "headcount": 600, "riskGrade": 7}),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], "configuration_error");
}

#[tokio::test]
async fn sesmt_construction_team() {
    let (_tmp, state) = setup().await;
    let (status, body) = post_json(
        router(state),
        "/sesmt",
        json!({"activityCode": "41.20-4", "headcount": 600}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["riskGrade"], 3);
    assert_eq!(body["roleCounts"]["safetyTechnician"], 4);
    assert_eq!(body["roleCounts"]["nurse"], 0);
}

#[tokio::test]
async fn report_returns_pdf_attachment() {
    let (_tmp, state) = setup().await;
    let request = json!({
        "kind": "checklist",
        "metadata": {"client": "Construtora Beta"},
        "payload": {"Andaimes inspecionados?": "Conforme"}
    });
    let response = router(state)
        .oneshot(
            Request::post("/report")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(request.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/pdf"
    );
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"report.pdf\""
    );
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let doc = lopdf::Document::load_mem(&bytes).unwrap();
    assert_eq!(doc.get_pages().len(), 1);
}

#[tokio::test]
async fn report_with_bad_status_is_invalid_input() {
    let (_tmp, state) = setup().await;
    let (status, body) = post_json(
        router(state),
        "/report",
        json!({"kind": "checklist", "payload": {"Extintores?": "Talvez"}}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_input");
}

#[tokio::test]
async fn health_reports_record_count() {
    let (_tmp, app) = indexed_app().await;
    let (status, body) = get_json(app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["indexedRecords"], 1);
}

#[tokio::test]
async fn serves_source_documents() {
    let (_tmp, state) = setup().await;
    let response = router(state)
        .oneshot(Request::get("/pdfs/nr-18.txt").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(String::from_utf8_lossy(&bytes).contains("Andaimes"));
}

#[tokio::test]
async fn allows_any_origin() {
    let (_tmp, state) = setup().await;
    let response = router(state)
        .oneshot(
            Request::get("/health")
                .header(header::ORIGIN, "https://example.org")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}
