use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use base64::Engine as _;
use http_body_util::BodyExt;
use sea_orm::{ActiveModelTrait, ActiveValue, ConnectOptions, Database};
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use engine::{Engine, users};
use migration::MigratorTrait;
use server::{ServerState, router};

const PUBLIC_URL: &str = "http://localhost:43000";

struct TestApp {
    router: Router,
    db: sea_orm::DatabaseConnection,
}

impl TestApp {
    async fn new() -> Self {
        let mut options = ConnectOptions::new("sqlite::memory:");
        options
            .max_connections(1)
            .min_connections(1)
            .sqlx_logging(false);
        let db = Database::connect(options).await.unwrap();
        migration::Migrator::up(&db, None).await.unwrap();
        let engine = Engine::builder()
            .database(db.clone())
            .build()
            .await
            .unwrap();
        let router = router(ServerState::new(engine, db.clone(), PUBLIC_URL));
        Self { router, db }
    }

    async fn user(&self, username: &str) -> String {
        let id = Uuid::new_v4().to_string();
        users::ActiveModel {
            id: ActiveValue::Set(id.clone()),
            username: ActiveValue::Set(username.to_string()),
            password: ActiveValue::Set(format!("{username}-secret")),
        }
        .insert(&self.db)
        .await
        .unwrap();
        id
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        username: Option<&str>,
        ledger: Option<Uuid>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(username) = username {
            let credentials = base64::engine::general_purpose::STANDARD
                .encode(format!("{username}:{username}-secret"));
            request = request.header(header::AUTHORIZATION, format!("Basic {credentials}"));
        }
        if let Some(ledger) = ledger {
            request = request.header("x-ledger-id", ledger.to_string());
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn create_ledger(&self, username: &str, name: &str) -> Uuid {
        let (status, body) = self
            .send(
                Method::POST,
                "/ledgers",
                Some(username),
                None,
                Some(json!({ "name": name })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        body["ledgerId"].as_str().unwrap().parse().unwrap()
    }

    async fn invite(&self, username: &str, ledger: Uuid, body: Value) -> Value {
        let (status, body) = self
            .send(
                Method::POST,
                &format!("/ledgers/{ledger}/invitations"),
                Some(username),
                None,
                Some(body),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body
    }

    async fn join(&self, username: &str, token: &str) -> (StatusCode, Value) {
        self.send(
            Method::POST,
            &format!("/invitations/{token}/join"),
            Some(username),
            None,
            None,
        )
        .await
    }
}

#[tokio::test]
async fn requests_without_valid_credentials_are_rejected() {
    let app = TestApp::new().await;
    app.user("alice").await;

    let (status, _) = app.send(Method::GET, "/ledgers", None, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .send(Method::GET, "/ledgers", Some("mallory"), None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn created_ledger_is_listed_with_owner_role() {
    let app = TestApp::new().await;
    let alice = app.user("alice").await;
    let ledger = app.create_ledger("alice", "Household").await;

    let (status, body) = app
        .send(Method::GET, "/ledgers", Some("alice"), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["defaultLedgerId"], json!(ledger.to_string()));
    let first = &body["ledgers"][0];
    assert_eq!(first["name"], json!("Household"));
    assert_eq!(first["role"], json!("owner"));
    assert_eq!(first["ownerId"], json!(alice));
    assert_eq!(first["memberCount"], json!(1));
    assert_eq!(first["currency"], json!("CNY"));
}

#[tokio::test]
async fn context_comes_from_path_or_header() {
    let app = TestApp::new().await;
    app.user("alice").await;
    app.user("mallory").await;
    let ledger = app.create_ledger("alice", "Household").await;

    let (status, body) = app
        .send(Method::GET, "/ledgers/current", Some("alice"), Some(ledger), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], json!(ledger.to_string()));

    let (status, _) = app
        .send(Method::GET, "/ledgers/current", Some("alice"), None, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(Method::GET, &format!("/ledgers/{ledger}"), Some("mallory"), None, None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send(
            Method::GET,
            "/ledgers/current",
            Some("mallory"),
            Some(ledger),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send(
            Method::GET,
            &format!("/ledgers/{}", Uuid::new_v4()),
            Some("alice"),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send(Method::GET, "/ledgers/not-a-uuid", Some("alice"), None, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn invitation_lifecycle() {
    let app = TestApp::new().await;
    app.user("alice").await;
    app.user("bob").await;
    app.user("carol").await;
    let ledger = app.create_ledger("alice", "Household").await;

    let invitation = app.invite("alice", ledger, json!({ "maxUses": 1 })).await;
    let token = invitation["token"].as_str().unwrap().to_string();
    assert_eq!(invitation["defaultRole"], json!("editor"));
    assert_eq!(invitation["status"], json!("active"));
    assert_eq!(invitation["remainingUses"], json!(1));
    assert_eq!(
        invitation["inviteUrl"],
        json!(format!("{PUBLIC_URL}/join/{token}"))
    );

    let (status, body) = app.join("bob", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ledgerId"], json!(ledger.to_string()));
    assert_eq!(body["role"], json!("editor"));

    let (status, body) = app.join("carol", &token).await;
    assert_eq!(status, StatusCode::GONE);
    assert_eq!(body["error"], json!("invitation has no uses left"));

    let (status, body) = app
        .send(
            Method::GET,
            &format!("/ledgers/{ledger}/invitations"),
            Some("alice"),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["status"], json!("exhausted"));
    assert_eq!(body[0]["usedCount"], json!(1));

    let (status, _) = app
        .send(
            Method::GET,
            &format!("/ledgers/{ledger}/invitations"),
            Some("bob"),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn revoked_and_unknown_tokens_look_alike() {
    let app = TestApp::new().await;
    app.user("alice").await;
    app.user("bob").await;
    let ledger = app.create_ledger("alice", "Household").await;

    let invitation = app.invite("alice", ledger, json!({})).await;
    let token = invitation["token"].as_str().unwrap().to_string();

    let (status, _) = app
        .send(
            Method::DELETE,
            &format!("/ledgers/{ledger}/invitations/{token}"),
            Some("alice"),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app
        .send(
            Method::DELETE,
            &format!("/ledgers/{ledger}/invitations/{token}"),
            Some("alice"),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (revoked_status, revoked_body) = app.join("bob", &token).await;
    let (unknown_status, unknown_body) = app.join("bob", "nope").await;
    assert_eq!(revoked_status, StatusCode::NOT_FOUND);
    assert_eq!(unknown_status, StatusCode::NOT_FOUND);
    assert_eq!(revoked_body, unknown_body);
    assert_eq!(revoked_body["error"], json!("invitation is not valid"));
}

#[tokio::test]
async fn expired_invitation_answers_gone() {
    let app = TestApp::new().await;
    app.user("alice").await;
    app.user("bob").await;
    let ledger = app.create_ledger("alice", "Household").await;

    let invitation = app
        .invite(
            "alice",
            ledger,
            json!({ "defaultRole": "viewer", "expiresAt": "2020-01-01T00:00:00Z" }),
        )
        .await;
    assert_eq!(invitation["status"], json!("expired"));

    let (status, body) = app
        .join("bob", invitation["token"].as_str().unwrap())
        .await;
    assert_eq!(status, StatusCode::GONE);
    assert_eq!(body["error"], json!("invitation has expired"));
}

#[tokio::test]
async fn member_management_over_http() {
    let app = TestApp::new().await;
    let alice = app.user("alice").await;
    let bob = app.user("bob").await;
    let ledger = app.create_ledger("alice", "Household").await;
    let invitation = app.invite("alice", ledger, json!({ "maxUses": 0 })).await;
    let (status, _) = app
        .join("bob", invitation["token"].as_str().unwrap())
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .send(
            Method::GET,
            &format!("/ledgers/{ledger}/members"),
            Some("bob"),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
    assert_eq!(body[1]["username"], json!("bob"));
    assert_eq!(body[1]["invitedBy"], json!(alice));

    let (status, _) = app
        .send(
            Method::DELETE,
            &format!("/ledgers/{ledger}/members/{alice}"),
            Some("bob"),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .send(
            Method::DELETE,
            &format!("/ledgers/{ledger}/members/me"),
            Some("alice"),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/ledgers/{ledger}/members/{bob}/role"),
            Some("alice"),
            None,
            Some(json!({ "role": "owner" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/ledgers/{ledger}/members/{bob}/role"),
            Some("alice"),
            None,
            Some(json!({ "role": "admin" })),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app
        .send(
            Method::POST,
            &format!("/ledgers/{ledger}/owner"),
            Some("alice"),
            None,
            Some(json!({ "userId": bob })),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = app
        .send(Method::GET, &format!("/ledgers/{ledger}"), Some("bob"), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], json!("owner"));
    assert_eq!(body["ownerId"], json!(bob));

    let (status, _) = app
        .send(
            Method::DELETE,
            &format!("/ledgers/{ledger}/members/me"),
            Some("alice"),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn update_default_and_delete() {
    let app = TestApp::new().await;
    app.user("alice").await;
    let first = app.create_ledger("alice", "Household").await;
    let second = app.create_ledger("alice", "Travel").await;

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/ledgers/{second}"),
            Some("alice"),
            None,
            Some(json!({ "name": "Holidays", "description": "summer" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], json!("Holidays"));
    assert_eq!(body["description"], json!("summer"));

    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/ledgers/{second}"),
            Some("alice"),
            None,
            Some(json!({ "name": "  " })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/ledgers/{second}/default"),
            Some("alice"),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, body) = app
        .send(Method::GET, "/ledgers", Some("alice"), None, None)
        .await;
    assert_eq!(body["defaultLedgerId"], json!(second.to_string()));

    let (status, _) = app
        .send(
            Method::DELETE,
            &format!("/ledgers/{second}"),
            Some("alice"),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app
        .send(Method::GET, &format!("/ledgers/{second}"), Some("alice"), None, None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (_, body) = app
        .send(Method::GET, "/ledgers", Some("alice"), None, None)
        .await;
    assert_eq!(body["ledgers"].as_array().unwrap().len(), 1);
    assert_eq!(body["defaultLedgerId"], json!(first.to_string()));
}
