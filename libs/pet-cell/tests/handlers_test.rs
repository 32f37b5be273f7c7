use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pet_cell::router::create_pet_router;
use shared_utils::test_utils::{JwtTestUtils, MockBackendResponses, TestConfig, TestUser};

const SECRET: &str = "test-secret";

fn app(server: &MockServer) -> Router {
    create_pet_router(TestConfig::with_backend(&server.uri()).to_arc())
}

fn token_for(user: &TestUser) -> String {
    JwtTestUtils::create_test_token(user, SECRET, Some(1))
}

fn request(http_method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(http_method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    match body {
        Some(json) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn registration() -> Value {
    json!({
        "species": "Cachorro",
        "breedId": "b-1",
        "name": "Rex",
        "age": 3,
        "sex": "male",
        "weight": 28.5,
        "ownerName": "Ana",
        "ownerEmail": "ana@example.com"
    })
}

#[tokio::test]
async fn list_forwards_search_params_and_filters_locally() {
    let server = MockServer::start().await;
    let token = token_for(&TestUser::default());

    let mut mia = MockBackendResponses::pet("2", "Mia");
    mia["ownerName"] = json!("Bruno");

    Mock::given(method("GET"))
        .and(path("/api/Pets/search"))
        .and(query_param("species", "Cachorro"))
        .and(header("Authorization", format!("Bearer {}", token).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockBackendResponses::pet("1", "Rex"),
            mia
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let response = app(&server)
        .oneshot(request("GET", "/?species=Cachorro&q=bruno", Some(&token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["pets"][0]["name"], "Mia");
}

#[tokio::test]
async fn free_text_query_uses_the_backend_search() {
    let server = MockServer::start().await;
    let token = token_for(&TestUser::default());

    Mock::given(method("GET"))
        .and(path("/api/Pets/search"))
        .and(query_param("query", "labrador ana"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockBackendResponses::pet("1", "Rex")
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let response = app(&server)
        .oneshot(request("GET", "/?query=labrador%20ana&species=Gato", Some(&token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["pets"][0]["name"], "Rex");

    let requests = server.received_requests().await.unwrap();
    assert!(!requests[0].url.query().unwrap_or_default().contains("species"));
}

#[tokio::test]
async fn pets_require_a_session() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/Pets/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let response = app(&server)
        .oneshot(request("GET", "/", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn breeds_are_public_and_anonymous() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/PetsInfo/breeds"))
        .and(query_param("species", "Gato"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockBackendResponses::breed("7", "Siamês", "Gato")
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let response = app(&server)
        .oneshot(request("GET", "/breeds?species=Gato", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["breeds"][0]["name"], "Siamês");

    let requests = server.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| !r.headers.contains_key("authorization")));
}

#[tokio::test]
async fn registration_is_admin_only() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/Pets"))
        .and(header_exists("Authorization"))
        .respond_with(ResponseTemplate::new(201).set_body_json(MockBackendResponses::pet("9", "Rex")))
        .expect(1)
        .mount(&server)
        .await;

    let response = app(&server)
        .oneshot(request("POST", "/", Some(&token_for(&TestUser::default())), Some(registration())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app(&server)
        .oneshot(request("POST", "/", Some(&token_for(&TestUser::admin("vet"))), Some(registration())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["pet"]["id"], "9");
}

#[tokio::test]
async fn invalid_registration_never_reaches_backend() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/Pets"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let mut payload = registration();
    payload["breedId"] = json!("");
    payload["weight"] = json!(150);

    let response = app(&server)
        .oneshot(request("POST", "/", Some(&token_for(&TestUser::admin("vet"))), Some(payload)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let error = json_body(response).await["error"].as_str().unwrap().to_string();
    assert!(error.contains("ID da Raça é obrigatório"));
    assert!(error.contains("Peso"));
}

#[tokio::test]
async fn missing_pet_maps_to_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/Pets/404"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let response = app(&server)
        .oneshot(request("GET", "/404", Some(&token_for(&TestUser::default())), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["error"], "Recurso não encontrado.");
}

#[tokio::test]
async fn update_and_delete() {
    let server = MockServer::start().await;
    let token = token_for(&TestUser::default());

    Mock::given(method("PUT"))
        .and(path("/api/Pets/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockBackendResponses::pet("1", "Rex II")))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/api/Pets/1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let update = json!({
        "name": "Rex II",
        "age": 4,
        "sex": "male",
        "weight": 30.0,
        "ownerName": "Ana",
        "ownerEmail": "ana@example.com"
    });
    let response = app(&server)
        .oneshot(request("PUT", "/1", Some(&token), Some(update)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["pet"]["name"], "Rex II");

    let response = app(&server)
        .oneshot(request("DELETE", "/1", Some(&token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
