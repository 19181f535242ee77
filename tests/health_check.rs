mod common;

use actix_web::{test, App};
use chrono::DateTime;
use crud_server::configure;

#[actix_web::test]
async fn test_health_check() {
    let state = common::memory_state();
    let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let json: serde_json::Value = test::read_body_json(resp).await;

    // Verify response format
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["service"], "crud-server");
    assert!(DateTime::parse_from_rfc3339(json["timestamp"].as_str().unwrap()).is_ok());
}

#[actix_web::test]
async fn test_liveness() {
    let app = test::init_service(
        App::new()
            .app_data(common::memory_state())
            .configure(configure),
    )
    .await;

    let req = test::TestRequest::get().uri("/health/live").to_request();
    let json: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(json, serde_json::json!({ "status": "alive" }));
}

#[actix_web::test]
async fn test_readiness_reports_each_backend() {
    let app = test::init_service(
        App::new()
            .app_data(common::memory_state())
            .configure(configure),
    )
    .await;

    let req = test::TestRequest::get().uri("/health/ready").to_request();
    let json: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(json["status"], "ready");
    assert_eq!(json["checks"]["database"], true);
    assert_eq!(json["checks"]["cache"], true);
}

#[actix_web::test]
async fn test_readiness_without_cache_is_not_ready_but_ok() {
    let app = test::init_service(
        App::new()
            .app_data(common::state_with_cache(None))
            .configure(configure),
    )
    .await;

    let req = test::TestRequest::get().uri("/health/ready").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let json: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(json["status"], "not_ready");
    assert_eq!(json["checks"]["cache"], false);
}
