use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, ADMIN_PASSWORD, ADMIN_USERNAME, BASE_PATH, HEADER_SESSION_TOKEN, HEADER_USER_ID};
use serde_json::{json, Value};
use tower::{Service, ServiceExt};

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn url(uri: &str) -> String {
    format!("{BASE_PATH}{uri}")
}

fn request(method: &str, uri: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(url(uri))
        .body(String::new())
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(url(uri))
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn with_session(mut request: Request<String>, session: &(String, String)) -> Request<String> {
    let headers = request.headers_mut();
    let name = |n: &str| http::HeaderName::from_bytes(n.as_bytes()).unwrap();
    headers.insert(name(HEADER_USER_ID), session.0.parse().unwrap());
    headers.insert(name(HEADER_SESSION_TOKEN), session.1.parse().unwrap());
    request
}

// --- generic classes ---

#[tokio::test]
async fn get_missing_object_returns_code_101() {
    let resp = app().oneshot(request("GET", "/classes/Room/nope")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body = body_json(resp).await;
    assert_eq!(body["code"], 101);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn create_returns_201_with_id() {
    let resp = app()
        .oneshot(json_request("POST", "/classes/Room", json!({"name": "Blue"})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = body_json(resp).await;
    assert!(body["id"].is_string());
    assert!(body["createdAt"].is_string());
}

#[tokio::test]
async fn malformed_body_is_rejected() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(url("/classes/Room"))
                .header(http::header::CONTENT_TYPE, "application/json")
                .body("not json".to_string())
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(resp.status().is_client_error());
}

#[tokio::test]
async fn query_with_where_and_count() {
    let mut app = app().into_service();
    for name in ["A", "B", "A"] {
        let resp = ServiceExt::ready(&mut app)
            .await
            .unwrap()
            .call(json_request("POST", "/classes/Room", json!({"name": name})))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let query = "/classes/Room?where=%7B%22name%22%3A%22A%22%7D&count=1&limit=1";
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(request("GET", query))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["count"], 2);
    assert_eq!(body["results"].as_array().unwrap().len(), 1);
    assert_eq!(body["results"][0]["name"], "A");
}

#[tokio::test]
async fn crud_lifecycle() {
    let mut app = app().into_service();

    // create
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("POST", "/classes/Room", json!({"name": "Blue", "seats": 4})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let id = body_json(resp).await["id"].as_str().unwrap().to_string();

    // increment
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "PUT",
            &format!("/classes/Room/{id}"),
            json!({"seats": {"__op": "Increment", "amount": 2}}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["seats"], 6);

    // get
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(request("GET", &format!("/classes/Room/{id}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let fetched = body_json(resp).await;
    assert_eq!(fetched["name"], "Blue");
    assert_eq!(fetched["seats"], 6);
    assert!(fetched["updatedAt"].is_string());

    // delete
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(request("DELETE", &format!("/classes/Room/{id}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // get after delete: 404
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(request("GET", &format!("/classes/Room/{id}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- fixed endpoints ---

#[tokio::test]
async fn fixed_endpoints_require_a_session() {
    let resp = app().oneshot(request("GET", "/Resources/Status")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn bad_credentials_are_rejected() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/Authentication/Authenticate",
            json!({"username": ADMIN_USERNAME, "password": "nope"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn authenticated_resource_endpoints() {
    let mut app = app().into_service();

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "POST",
            "/Authentication/Authenticate",
            json!({"username": ADMIN_USERNAME, "password": ADMIN_PASSWORD}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let login = body_json(resp).await;
    assert_eq!(login["isAuthenticated"], true);
    let session = (
        login["userId"].as_str().unwrap().to_string(),
        login["sessionToken"].as_str().unwrap().to_string(),
    );

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(with_session(request("GET", "/Resources/Status"), &session))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["statuses"][1]["name"], "Available");

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(with_session(request("GET", "/Resources/1"), &session))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["name"], "Conference Room");

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(with_session(
            request("GET", "/Resources/Availability?dateTime=2024-03-01T09%3A00%3A00.000Z"),
            &session,
        ))
        .await
        .unwrap();
    let availability = body_json(resp).await;
    assert_eq!(availability["resources"][0]["availableAt"], "2024-03-01T09:00:00.000Z");
}

#[tokio::test]
async fn reservation_approval() {
    let mut app = app().into_service();
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "POST",
            "/Authentication/Authenticate",
            json!({"username": ADMIN_USERNAME, "password": ADMIN_PASSWORD}),
        ))
        .await
        .unwrap();
    let login = body_json(resp).await;
    let session = (
        login["userId"].as_str().unwrap().to_string(),
        login["sessionToken"].as_str().unwrap().to_string(),
    );

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(with_session(
            json_request("POST", "/Reservations/", json!({"title": "Standup", "requiresApproval": true})),
            &session,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let id = body_json(resp).await["id"].as_str().unwrap().to_string();

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(with_session(request("POST", &format!("/Reservations/{id}/Approval")), &session))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(with_session(request("GET", &format!("/Reservations/{id}")), &session))
        .await
        .unwrap();
    assert_eq!(body_json(resp).await["requiresApproval"], false);
}

// --- files ---

#[tokio::test]
async fn upload_then_download_file() {
    let mut app = app().into_service();
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(
            Request::builder()
                .method("POST")
                .uri(url("/files/notes.txt"))
                .header(http::header::CONTENT_TYPE, "text/plain")
                .body("hello".to_string())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let uploaded = body_json(resp).await;
    let name = uploaded["name"].as_str().unwrap().to_string();
    assert!(name.ends_with("-notes.txt"));
    assert!(uploaded["url"].as_str().unwrap().ends_with(&name));

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(request("GET", &format!("/files/{name}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(http::header::CONTENT_TYPE).unwrap(),
        "text/plain"
    );
    assert_eq!(&body_bytes(resp).await[..], b"hello");
}
