use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use fhub::domain::config::ApiConfig;
use fhub::domain::role::Role;
use fhub::kernel::auth::issue_session_token;
use fhub_database::Repositories;
use fhub_notifications::{Email, Mailer, NotificationError};
use fhub_server::Server;
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

const WAREHOUSE_KEY: &str = "wh-test-key";
const INGEST_TOKEN: &str = "feed-test-token";
const BOUNDARY: &str = "fhub-test-boundary";
const SESSION_SECRET: &str = "api-test-secret";

#[derive(Debug, Default)]
struct RecordingMailer {
    sent: Mutex<Vec<Email>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: Email) -> Result<(), NotificationError> {
        self.sent.lock().push(email);
        Ok(())
    }
}

impl RecordingMailer {
    async fn wait_for(&self, count: usize) -> Vec<Email> {
        for _ in 0..100 {
            if self.sent.lock().len() >= count {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.sent.lock().clone()
    }
}

struct TestApp {
    router: Router,
    config: ApiConfig,
    mailer: Arc<RecordingMailer>,
    _uploads: TempDir,
}

impl TestApp {
    async fn new() -> Self {
        let uploads = tempfile::tempdir().unwrap();
        let mut config = ApiConfig::default();
        config.security.session.secret = SESSION_SECRET.to_owned();
        config.security.warehouse_keys = vec![WAREHOUSE_KEY.to_owned()];
        config.security.ingest_tokens = vec![INGEST_TOKEN.to_owned()];
        config.uploads.dir = uploads.path().to_path_buf();
        config.uploads.max_file_bytes = 256;
        config.uploads.max_files = 2;

        let mailer = Arc::new(RecordingMailer::default());
        let server = Server::builder()
            .config(config.clone())
            .repositories(Repositories::in_memory())
            .mailer(mailer.clone())
            .build()
            .await
            .unwrap();

        Self { router: server.router(), config, mailer, _uploads: uploads }
    }

    fn token(&self, user_code: &str, role: Role) -> String {
        issue_session_token(&self.config.security.session, user_code, role).unwrap()
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if body.is_empty() { Value::Null } else { serde_json::from_slice(&body).unwrap_or(Value::Null) };
        (status, json)
    }

    async fn json(&self, method: Method, uri: &str, auth: Auth<'_>, body: &Value) -> (StatusCode, Value) {
        let request = auth
            .apply(Request::builder().method(method).uri(uri))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    async fn get(&self, uri: &str, auth: Auth<'_>) -> (StatusCode, Value) {
        self.send(auth.apply(Request::builder().uri(uri)).body(Body::empty()).unwrap()).await
    }

    async fn seed_customer(&self, user_code: &str) {
        let admin = self.token("admin", Role::Admin);
        let (status, _) = self
            .json(
                Method::PUT,
                &format!("/api/admin/customers/{user_code}"),
                Auth::Bearer(&admin),
                &json!({ "email": format!("{}@example.com", user_code.to_lowercase()), "firstName": "Kim", "branch": "Kingston" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    async fn warehouse_write(&self, body: &Value) -> (StatusCode, Value) {
        self.json(Method::POST, "/api/warehouse/packages", Auth::Key(WAREHOUSE_KEY), body).await
    }
}

#[derive(Clone, Copy)]
enum Auth<'a> {
    None,
    Key(&'a str),
    Bearer(&'a str),
}

impl Auth<'_> {
    fn apply(self, builder: axum::http::request::Builder) -> axum::http::request::Builder {
        match self {
            Self::None => builder,
            Self::Key(key) => builder.header("x-warehouse-key", key),
            Self::Bearer(token) => builder.header(header::AUTHORIZATION, format!("Bearer {token}")),
        }
    }
}

fn multipart(fields: &[(&str, &str)], files: &[(&str, &str, &[u8])]) -> Body {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n").as_bytes(),
        );
    }
    for (file_name, content_type, bytes) in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    Body::from(body)
}

fn upload_request(token: &str, body: Body) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/invoices")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(body)
        .unwrap()
}

#[tokio::test]
async fn health_and_docs_are_public() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/health", Auth::None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "up");

    let response = app.router.clone().oneshot(Request::builder().uri("/api").body(Body::empty()).unwrap()).await;
    assert_eq!(response.unwrap().status(), StatusCode::OK);
}

#[tokio::test]
async fn server_refuses_to_start_without_session_secret() {
    for secret in ["", "   "] {
        let mut config = ApiConfig::default();
        config.security.session.secret = secret.to_owned();

        let built = Server::builder()
            .config(config)
            .repositories(Repositories::in_memory())
            .mailer(Arc::new(RecordingMailer::default()))
            .build()
            .await;

        let err = built.err().expect("blank session secret must be rejected");
        assert!(err.to_string().contains("Session secret"), "{err}");
    }
}

#[tokio::test]
async fn credentials_are_enforced() {
    let app = TestApp::new().await;
    let customer = app.token("C100", Role::Customer);

    let (status, body) = app.get("/api/packages", Auth::None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (status, _) = app.get("/api/packages", Auth::Bearer("not-a-token")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .json(
            Method::POST,
            "/api/warehouse/packages",
            Auth::Key("wrong-key"),
            &json!({ "trackingNumber": "X1", "status": "At Warehouse" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.get("/api/admin/dashboard", Auth::Bearer(&customer)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .json(Method::POST, "/api/warehouse/packages", Auth::Bearer(&customer), &json!({ "trackingNumber": "X1", "status": "At Warehouse" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn package_lifecycle_is_visible_to_its_owner_and_mailed() {
    let app = TestApp::new().await;
    app.seed_customer("C100").await;

    let (status, body) =
        app.warehouse_write(&json!({ "trackingNumber": "TAS999", "status": "At Warehouse", "userCode": "C100" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["created"], true);

    let (_, moved) = app.warehouse_write(&json!({ "trackingNumber": "TAS999", "status": "In Transit" })).await;
    assert_eq!(moved["statusChanged"], true);
    let (_, again) = app.warehouse_write(&json!({ "trackingNumber": "TAS999", "status": "in_transit" })).await;
    assert_eq!(again["statusChanged"], false);

    let owner = app.token("C100", Role::Customer);
    let (status, package) = app.get("/api/packages/TAS999", Auth::Bearer(&owner)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(package["status"], "In Transit");
    assert_eq!(package["uiStatus"], "in_transit");
    assert_eq!(package["history"].as_array().unwrap().len(), 2);

    let stranger = app.token("C200", Role::Customer);
    let (status, _) = app.get("/api/packages/TAS999", Auth::Bearer(&stranger)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Mail for the repeated write would be queued ahead of the delivery mail.
    let (_, delivered) = app.warehouse_write(&json!({ "trackingNumber": "TAS999", "status": "Delivered" })).await;
    assert_eq!(delivered["statusChanged"], true);

    let sent = app.mailer.wait_for(2).await;
    let subjects: Vec<&str> = sent.iter().map(|mail| mail.subject.as_str()).collect();
    assert_eq!(sent.len(), 2, "{subjects:?}");
    assert!(sent.iter().all(|mail| mail.to == "c100@example.com"));
    assert_eq!(subjects.iter().filter(|s| s.contains("In Transit")).count(), 1, "{subjects:?}");
    assert_eq!(subjects.iter().filter(|s| s.contains("Delivered")).count(), 1, "{subjects:?}");
}

#[tokio::test]
async fn unknown_status_is_rejected() {
    let app = TestApp::new().await;

    let (status, body) = app.warehouse_write(&json!({ "trackingNumber": "TAS1", "status": "Lost at sea" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation");
}

#[tokio::test]
async fn carrier_feed_accepts_header_or_body_token() {
    let app = TestApp::new().await;
    app.seed_customer("C100").await;

    let records = json!([
        { "TrackingNumber": "FEED1", "CustomerCode": "C100", "Status": "Shipped" },
        { "TrackingNumber": "FEED2", "CustomerCode": "NOBODY" },
        { "CustomerCode": "C100" },
    ]);
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/ingest/packages")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-api-token", INGEST_TOKEN)
        .body(Body::from(records.to_string()))
        .unwrap();
    let (status, report) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["processed"], 3);
    assert_eq!(report["succeeded"], 1);
    assert_eq!(report["failed"], 2);

    let envelope = json!({ "apiToken": INGEST_TOKEN, "packages": [{ "tracking_no": "FEED3", "account": "C100" }] });
    let (status, report) = app.json(Method::POST, "/api/ingest/packages", Auth::None, &envelope).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["succeeded"], 1);

    let forged = json!({ "apiToken": "forged", "packages": [] });
    let (status, _) = app.json(Method::POST, "/api/ingest/packages", Auth::None, &forged).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn invoice_uploads_are_validated_then_stored() {
    let app = TestApp::new().await;
    app.seed_customer("C100").await;
    app.warehouse_write(&json!({ "trackingNumber": "INV1", "status": "At Warehouse", "userCode": "C100" })).await;
    let owner = app.token("C100", Role::Customer);
    let pdf: &[u8] = b"%PDF-1.7\nminimal";

    let gif = multipart(&[("trackingNumber", "INV1")], &[("a.gif", "image/gif", &b"GIF89a"[..])]);
    let (status, _) = app.send(upload_request(&owner, gif)).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);

    let disguised = multipart(&[("trackingNumber", "INV1")], &[("a.pdf", "application/pdf", &b"\x89PNG\r\n\x1a\n"[..])]);
    let (status, _) = app.send(upload_request(&owner, disguised)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let big = vec![b'%'; 512];
    let oversized = multipart(&[("trackingNumber", "INV1")], &[("big.pdf", "application/pdf", big.as_slice())]);
    let (status, _) = app.send(upload_request(&owner, oversized)).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);

    let three = multipart(
        &[("trackingNumber", "INV1")],
        &[("a.pdf", "application/pdf", pdf), ("b.pdf", "application/pdf", pdf), ("c.pdf", "application/pdf", pdf)],
    );
    let (status, _) = app.send(upload_request(&owner, three)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let foreign = app.token("C200", Role::Customer);
    let valid = multipart(&[("trackingNumber", "INV1")], &[("invoice.pdf", "application/pdf", pdf)]);
    let (status, _) = app.send(upload_request(&foreign, valid)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let valid = multipart(&[("trackingNumber", "INV1"), ("amount", "42.50")], &[("invoice.pdf", "application/pdf", pdf)]);
    let (status, receipt) = app.send(upload_request(&owner, valid)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(receipt["record"]["status"], "submitted");
    assert_eq!(receipt["documents"].as_array().unwrap().len(), 1);

    let admin = app.token("admin", Role::Admin);
    let (_, overview) = app.get("/api/admin/dashboard", Auth::Bearer(&admin)).await;
    assert_eq!(overview["invoicesAwaitingReview"], 1);

    let invoice_id = receipt["record"]["id"].as_str().unwrap();
    let (status, record) = app
        .json(
            Method::PATCH,
            &format!("/api/admin/invoices/INV1/{invoice_id}"),
            Auth::Bearer(&admin),
            &json!({ "status": "reviewed" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record["status"], "reviewed");
}

#[tokio::test]
async fn analytics_and_dashboards() {
    let app = TestApp::new().await;
    app.seed_customer("C100").await;
    app.warehouse_write(&json!({ "trackingNumber": "AN1", "status": "Delivered", "userCode": "C100" })).await;
    app.warehouse_write(&json!({ "trackingNumber": "AN2", "status": "At Warehouse" })).await;
    let admin = app.token("admin", Role::Admin);

    let (status, report) = app.get("/api/admin/analytics?report=status", Auth::Bearer(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["total"], 2);
    assert_eq!(report["rows"].as_array().unwrap().len(), 6);

    let (status, _) = app.get("/api/admin/analytics?report=bogus", Auth::Bearer(&admin)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, overview) = app.get("/api/admin/dashboard", Auth::Bearer(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(overview["totalPackages"], 2);
    assert_eq!(overview["unassignedPackages"], 1);

    let owner = app.token("C100", Role::Customer);
    let (status, dashboard) = app.get("/api/dashboard", Auth::Bearer(&owner)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dashboard["total"], 1);
}

#[tokio::test]
async fn broadcasts_reach_customers() {
    let app = TestApp::new().await;
    app.seed_customer("C100").await;
    let admin = app.token("admin", Role::Admin);

    let (status, _) = app
        .json(
            Method::POST,
            "/api/admin/broadcasts",
            Auth::Bearer(&admin),
            &json!({ "title": "Holiday hours", "message": "Closed on Monday." }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let owner = app.token("C100", Role::Customer);
    let (status, list) = app.get("/api/broadcasts", Auth::Bearer(&owner)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);

    let sent = app.mailer.wait_for(1).await;
    assert_eq!(sent[0].subject, "Holiday hours");
}
