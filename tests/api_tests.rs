//! Tests for the HTTP API
//!
//! These tests verify:
//! - Route round trips against a real engine on a temp directory
//! - Status mapping for recoverable error kinds
//! - Request hygiene (empty ids, path-traversing names)

use actix_web::{test, web, App};
use csvfiler::{api, Config, Engine};
use serde_json::json;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_engine() -> (TempDir, web::Data<Engine>) {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .storage_dir(temp_dir.path())
        .hash_buckets(16)
        .build();
    let engine = web::Data::new(Engine::open(config).unwrap());
    (temp_dir, engine)
}

macro_rules! app {
    ($engine:expr) => {
        test::init_service(
            App::new()
                .app_data($engine.clone())
                .configure(api::configure),
        )
        .await
    };
}

// =============================================================================
// Write / Read
// =============================================================================

#[actix_web::test]
async fn test_api_write_then_read() {
    let (_temp, engine) = setup_engine();
    let app = app!(engine);

    let req = test::TestRequest::put()
        .uri("/api/v1/ids")
        .set_json(json!({"name": "a.csv", "ids": [3, 1, 2], "new-file": true}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let req = test::TestRequest::get()
        .uri("/api/v1/ids?file=a.csv")
        .to_request();
    let ids: Vec<u32> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(ids, vec![1, 2, 3]);
}

#[actix_web::test]
async fn test_api_write_without_create_flag_is_bad_request() {
    let (_temp, engine) = setup_engine();
    let app = app!(engine);

    let req = test::TestRequest::put()
        .uri("/api/v1/ids")
        .set_json(json!({"name": "a.csv", "ids": [1]}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn test_api_duplicate_id_is_bad_request() {
    let (_temp, engine) = setup_engine();
    let app = app!(engine);

    let req = test::TestRequest::put()
        .uri("/api/v1/ids")
        .set_json(json!({"name": "a.csv", "ids": [1, 2], "new-file": true}))
        .to_request();
    assert!(test::call_service(&app, req).await.status().is_success());

    let req = test::TestRequest::put()
        .uri("/api/v1/ids")
        .set_json(json!({"name": "b.csv", "ids": [2], "new-file": true}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn test_api_duplicate_allowed_with_not_unique() {
    let (_temp, engine) = setup_engine();
    let app = app!(engine);

    let req = test::TestRequest::put()
        .uri("/api/v1/ids")
        .set_json(json!({"name": "a.csv", "ids": [1, 2], "new-file": true}))
        .to_request();
    assert!(test::call_service(&app, req).await.status().is_success());

    let req = test::TestRequest::put()
        .uri("/api/v1/ids")
        .set_json(json!({"name": "a.csv", "ids": [2, 3], "not-unique": true}))
        .to_request();
    assert!(test::call_service(&app, req).await.status().is_success());

    let req = test::TestRequest::get()
        .uri("/api/v1/ids?file=a.csv")
        .to_request();
    let ids: Vec<u32> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(ids, vec![1, 2, 3]);
}

#[actix_web::test]
async fn test_api_empty_ids_rejected() {
    let (_temp, engine) = setup_engine();
    let app = app!(engine);

    let req = test::TestRequest::put()
        .uri("/api/v1/ids")
        .set_json(json!({"name": "a.csv", "ids": [], "new-file": true}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn test_api_traversing_name_rejected() {
    let (_temp, engine) = setup_engine();
    let app = app!(engine);

    let req = test::TestRequest::put()
        .uri("/api/v1/ids")
        .set_json(json!({"name": "../escape.csv", "ids": [1], "new-file": true}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn test_api_read_unknown_file_is_bad_request() {
    let (_temp, engine) = setup_engine();
    let app = app!(engine);

    let req = test::TestRequest::get()
        .uri("/api/v1/ids?file=missing.csv")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 400);
}

// =============================================================================
// Delete Ids / Delete File
// =============================================================================

#[actix_web::test]
async fn test_api_delete_ids() {
    let (_temp, engine) = setup_engine();
    let app = app!(engine);

    let req = test::TestRequest::put()
        .uri("/api/v1/ids")
        .set_json(json!({"name": "a.csv", "ids": [1, 2, 3], "new-file": true}))
        .to_request();
    assert!(test::call_service(&app, req).await.status().is_success());

    let req = test::TestRequest::delete()
        .uri("/api/v1/ids")
        .set_json(json!({"name": "a.csv", "ids": [2]}))
        .to_request();
    assert!(test::call_service(&app, req).await.status().is_success());

    let req = test::TestRequest::get()
        .uri("/api/v1/ids?file=a.csv")
        .to_request();
    let ids: Vec<u32> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(ids, vec![1, 3]);
}

#[actix_web::test]
async fn test_api_delete_file() {
    let (temp, engine) = setup_engine();
    let app = app!(engine);

    let req = test::TestRequest::put()
        .uri("/api/v1/ids")
        .set_json(json!({"name": "a.csv", "ids": [1], "new-file": true}))
        .to_request();
    assert!(test::call_service(&app, req).await.status().is_success());

    let req = test::TestRequest::delete()
        .uri("/api/v1/file?file=a.csv")
        .to_request();
    assert!(test::call_service(&app, req).await.status().is_success());

    assert!(!temp.path().join("a.csv").exists());

    let req = test::TestRequest::get()
        .uri("/api/v1/ids?file=a.csv")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn test_api_delete_unknown_file_is_bad_request() {
    let (_temp, engine) = setup_engine();
    let app = app!(engine);

    let req = test::TestRequest::delete()
        .uri("/api/v1/file?file=missing.csv")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 400);
}
