use bims_auth::{JwtClaims, Role};
use bims_core::{ResidentId, UserId};
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::json;

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(jwt_secret: &str) -> Self {
        // Same router as prod (in-memory backend, since DATABASE_URL is unset),
        // bound to an ephemeral port.
        let app = bims_api::app::build_app(jwt_secret.to_string()).await;
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(jwt_secret: &str, roles: Vec<Role>, resident_id: Option<ResidentId>) -> String {
    let now = Utc::now();
    let claims = JwtClaims {
        sub: UserId::new(),
        roles,
        resident_id,
        issued_at: now,
        expires_at: now + ChronoDuration::minutes(10),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

async fn create_resident(
    client: &reqwest::Client,
    base_url: &str,
    token: &str,
) -> serde_json::Value {
    let res = client
        .post(format!("{}/residents", base_url))
        .bearer_auth(token)
        .json(&json!({
            "first_name": "Juan",
            "last_name": "dela Cruz",
            "sex": "male",
            "birth_date": "1990-05-01",
            "civil_status": "single",
            "address": "Purok 3, Zone 2",
            "is_voter": true
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    res.json().await.unwrap()
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;

    let client = reqwest::Client::new();
    let res = client
        .get(format!("{}/whoami", srv.base_url))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn("test-secret").await;

    let client = reqwest::Client::new();
    let res = client
        .get(format!("{}/health", srv.base_url))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn whoami_reflects_token_claims() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;

    let token = mint_jwt(jwt_secret, vec![Role::new("staff")], None);
    let client = reqwest::Client::new();
    let res = client
        .get(format!("{}/whoami", srv.base_url))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert!(body["roles"].as_array().unwrap().iter().any(|r| r == "staff"));
}

#[tokio::test]
async fn rbac_denies_out_of_role_writes() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;

    // Tanod can read incidents but cannot touch inventory.
    let token = mint_jwt(jwt_secret, vec![Role::new("tanod")], None);
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/inventory/items", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "name": "Folding chair", "category": "equipment", "unit": "pcs" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .get(format!("{}/incidents", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn stock_ledger_lifecycle() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let token = mint_jwt(jwt_secret, vec![Role::new("admin")], None);
    let client = reqwest::Client::new();

    // Create an item with 10 on hand.
    let res = client
        .post(format!("{}/inventory/items", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "name": "Folding chair",
            "category": "equipment",
            "unit": "pcs",
            "initial_quantity": 10,
            "min_stock": 4
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let item: serde_json::Value = res.json().await.unwrap();
    let item_id = item["id"].as_str().unwrap().to_string();

    // Remove 3 -> 7.
    let res = client
        .post(format!("{}/inventory/items/{}/movements", srv.base_url, item_id))
        .bearer_auth(&token)
        .json(&json!({ "kind": "remove", "quantity": 3 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let movement: serde_json::Value = res.json().await.unwrap();
    assert_eq!(movement["resulting_quantity"], 7);

    // Release 10 -> rejected, quantity unchanged, nothing logged.
    let official_res = client
        .post(format!("{}/officials", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "name": "Maria Santos",
            "position": "kagawad",
            "term_start": "2025-01-01"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(official_res.status(), StatusCode::CREATED);
    let official: serde_json::Value = official_res.json().await.unwrap();
    let official_id = official["id"].as_str().unwrap().to_string();

    let res = client
        .post(format!("{}/inventory/items/{}/movements", srv.base_url, item_id))
        .bearer_auth(&token)
        .json(&json!({ "kind": "release", "quantity": 10, "released_to": official_id.as_str() }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let res = client
        .get(format!("{}/inventory/items/{}", srv.base_url, item_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let item: serde_json::Value = res.json().await.unwrap();
    assert_eq!(item["quantity"], 7);

    let res = client
        .get(format!("{}/inventory/items/{}/movements", srv.base_url, item_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let movements: serde_json::Value = res.json().await.unwrap();
    assert_eq!(movements.as_array().unwrap().len(), 1);

    // Release without a recipient is a validation failure.
    let res = client
        .post(format!("{}/inventory/items/{}/movements", srv.base_url, item_id))
        .bearer_auth(&token)
        .json(&json!({ "kind": "release", "quantity": 2 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Release 2 to the active official -> 5, and the item drops under min_stock
    // a movement later.
    let res = client
        .post(format!("{}/inventory/items/{}/movements", srv.base_url, item_id))
        .bearer_auth(&token)
        .json(&json!({ "kind": "release", "quantity": 2, "released_to": official_id.as_str() }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let movement: serde_json::Value = res.json().await.unwrap();
    assert_eq!(movement["resulting_quantity"], 5);

    let res = client
        .post(format!("{}/inventory/items/{}/movements", srv.base_url, item_id))
        .bearer_auth(&token)
        .json(&json!({ "kind": "remove", "quantity": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client
        .get(format!("{}/inventory/low-stock", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let low: serde_json::Value = res.json().await.unwrap();
    assert!(low
        .as_array()
        .unwrap()
        .iter()
        .any(|i| i["id"].as_str() == Some(item_id.as_str())));
}

#[tokio::test]
async fn document_request_approval_and_release() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let token = mint_jwt(jwt_secret, vec![Role::new("admin")], None);
    let client = reqwest::Client::new();

    let resident = create_resident(&client, &srv.base_url, &token).await;
    let resident_id = resident["id"].as_str().unwrap().to_string();

    let res = client
        .post(format!("{}/documents/requests", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "resident_id": resident_id,
            "kind": "barangay_clearance",
            "purpose": "employment"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let request: serde_json::Value = res.json().await.unwrap();
    let request_id = request["id"].as_str().unwrap().to_string();

    // Release before approval is a conflict.
    let res = client
        .post(format!("{}/documents/requests/{}/release", srv.base_url, request_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    // No file before approval.
    let res = client
        .get(format!("{}/documents/requests/{}/file", srv.base_url, request_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .post(format!("{}/documents/requests/{}/approve", srv.base_url, request_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let approved: serde_json::Value = res.json().await.unwrap();
    assert_eq!(approved["status"], "approved");
    let control = approved["issued"]["control_number"].as_str().unwrap();
    assert!(control.starts_with("BRGY-"));

    let res = client
        .get(format!("{}/documents/requests/{}/file", srv.base_url, request_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.text().await.unwrap();
    assert!(body.contains("dela Cruz"));
    assert!(body.contains(control));

    let res = client
        .post(format!("{}/documents/requests/{}/release", srv.base_url, request_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let released: serde_json::Value = res.json().await.unwrap();
    assert_eq!(released["status"], "released");
}

#[tokio::test]
async fn portal_scopes_to_own_resident_record() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let admin = mint_jwt(jwt_secret, vec![Role::new("admin")], None);
    let client = reqwest::Client::new();

    let resident = create_resident(&client, &srv.base_url, &admin).await;
    let resident_id: ResidentId = resident["id"].as_str().unwrap().parse().unwrap();

    // A resident token without a linked record gets 403.
    let unlinked = mint_jwt(jwt_secret, vec![Role::new("resident")], None);
    let res = client
        .post(format!("{}/portal/requests", srv.base_url))
        .bearer_auth(&unlinked)
        .json(&json!({ "kind": "certificate_of_residency", "purpose": "scholarship" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "forbidden");

    let portal = mint_jwt(jwt_secret, vec![Role::new("resident")], Some(resident_id));
    let res = client
        .post(format!("{}/portal/requests", srv.base_url))
        .bearer_auth(&portal)
        .json(&json!({ "kind": "certificate_of_residency", "purpose": "scholarship" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client
        .get(format!("{}/portal/requests", srv.base_url))
        .bearer_auth(&portal)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let own: serde_json::Value = res.json().await.unwrap();
    assert_eq!(own.as_array().unwrap().len(), 1);

    // Portal accounts cannot use staff endpoints.
    let res = client
        .get(format!("{}/residents", srv.base_url))
        .bearer_auth(&portal)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .post(format!("{}/portal/complaints", srv.base_url))
        .bearer_auth(&portal)
        .json(&json!({ "respondent": "neighbor", "narrative": "loud karaoke past midnight" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let complaint: serde_json::Value = res.json().await.unwrap();
    assert_eq!(complaint["status"], "filed");
    assert!(complaint["blotter_number"].as_str().unwrap().starts_with("BLT-"));
}

#[tokio::test]
async fn duplicate_household_number_conflicts() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let token = mint_jwt(jwt_secret, vec![Role::new("admin")], None);
    let client = reqwest::Client::new();

    let body = json!({ "number": "HH-001", "purok": "Purok 1", "address": "Main St" });
    let res = client
        .post(format!("{}/households", srv.base_url))
        .bearer_auth(&token)
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client
        .post(format!("{}/households", srv.base_url))
        .bearer_auth(&token)
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}
