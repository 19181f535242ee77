mod common;

use actix_web::{test, App};
use crud_server::configure;
use serde_json::{json, Value};

use common::{signup, token_request, with_bearer, PASSWORD};

#[actix_web::test]
async fn test_duplicate_signup_conflicts() {
    let app = test::init_service(
        App::new()
            .app_data(common::memory_state())
            .configure(configure),
    )
    .await;

    assert_eq!(test::call_service(&app, signup("a@x.com").to_request()).await.status(), 201);

    let resp = test::call_service(&app, signup("a@x.com").to_request()).await;
    assert_eq!(resp.status(), 409);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["code"], "CONFLICT");
}

#[actix_web::test]
async fn test_invalid_signup() {
    let app = test::init_service(
        App::new()
            .app_data(common::memory_state())
            .configure(configure),
    )
    .await;

    for payload in [
        json!({ "email": "not-an-email", "name": "A", "password": PASSWORD }),
        json!({ "email": "a@x.com", "name": "A", "password": "short" }),
        json!({ "email": "a@x.com", "name": "", "password": PASSWORD }),
        json!({ "email": "a@x.com", "password": PASSWORD }),
    ] {
        let req = test::TestRequest::post()
            .uri("/api/v1/users")
            .set_json(&payload)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 422, "{payload}");
    }

    let req = test::TestRequest::post()
        .uri("/api/v1/users")
        .insert_header(("content-type", "application/json"))
        .set_payload("{not json")
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 422);
}

#[actix_web::test]
async fn test_me_is_not_shadowed_by_id_route() {
    let state = common::memory_state();
    let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;
    test::call_service(&app, signup("a@x.com").to_request()).await;
    let token = state.tokens.issue("a@x.com", None).unwrap();

    let req = with_bearer(test::TestRequest::get().uri("/api/v1/users/me"), &token).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
}

#[actix_web::test]
async fn test_user_list_and_search() {
    let state = common::memory_state();
    let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;
    for email in ["ada@lovelace.org", "alan@turing.org", "grace@hopper.mil"] {
        test::call_service(&app, signup(email).to_request()).await;
    }
    let token = state.tokens.issue("ada@lovelace.org", None).unwrap();

    let req = with_bearer(test::TestRequest::get().uri("/api/v1/users"), &token).to_request();
    let page: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(page["total"], 3);
    assert_eq!(page["limit"], 100);
    assert!(page["items"][0].get("hashed_password").is_none());

    let req = with_bearer(test::TestRequest::get().uri("/api/v1/users?search=.org"), &token).to_request();
    let page: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(page["total"], 2);
}

#[actix_web::test]
async fn test_update_then_delete_user() {
    let state = common::memory_state();
    let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

    let resp = test::call_service(&app, signup("a@x.com").to_request()).await;
    let user: Value = test::read_body_json(resp).await;
    let token = state.tokens.issue("a@x.com", None).unwrap();
    let uri = format!("/api/v1/users/{}", user["id"].as_str().unwrap());

    let req = with_bearer(test::TestRequest::get().uri(&uri), &token).to_request();
    let fetched: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(fetched["email"], "a@x.com");

    let req = with_bearer(test::TestRequest::put().uri(&uri), &token)
        .set_json(json!({ "name": "Renamed", "password": "new-password" }))
        .to_request();
    let updated: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(updated["name"], "Renamed");
    assert_eq!(updated["email"], "a@x.com");

    // old password no longer works, the new one does
    let resp = test::call_service(&app, token_request("a@x.com", PASSWORD).to_request()).await;
    assert_eq!(resp.status(), 401);
    let resp = test::call_service(&app, token_request("a@x.com", "new-password").to_request()).await;
    assert_eq!(resp.status(), 200);

    // delete a second account so the caller stays valid
    let resp = test::call_service(&app, signup("b@x.com").to_request()).await;
    let other: Value = test::read_body_json(resp).await;
    let other_uri = format!("/api/v1/users/{}", other["id"].as_str().unwrap());

    let req = with_bearer(test::TestRequest::delete().uri(&other_uri), &token).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 204);

    let req = with_bearer(test::TestRequest::get().uri(&other_uri), &token).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 404);
}
