//! Router-level tests: tracking redirect chain, capture form intake,
//! and validation mapping, exercised with in-process requests.

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{header, Request, StatusCode};
use phishline_core::config::{AppConfig, SmtpConfig};
use phishline_core::pages::LoginPageRenderer;
use phishline_core::types::{Recipient, RecipientGroup, Sender};
use phishline_dispatch::{Dispatcher, JobRegistry, SmtpMailerFactory};
use phishline_store::campaigns::NewCampaign;
use phishline_store::{CampaignStore, DirectoryStore, EventStore};
use phishline_tracking::TrackingService;
use phishline_api::{ApiServer, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower::ServiceExt;
use uuid::Uuid;

struct TestApp {
    router: axum::Router,
    events: Arc<EventStore>,
    recipient_id: Uuid,
    campaign_id: Uuid,
    empty_group_id: Uuid,
    sender_id: Uuid,
}

fn test_app() -> TestApp {
    let directory = Arc::new(DirectoryStore::new());
    let campaigns = Arc::new(CampaignStore::new());
    let events = Arc::new(EventStore::new());
    let jobs = Arc::new(JobRegistry::new());

    let sender_id = directory.add_sender(Sender {
        id: Uuid::new_v4(),
        smtp_host: "localhost".to_string(),
        smtp_port: 1025,
        smtp_username: "it@example.com".to_string(),
        smtp_password: "x".to_string(),
    });
    let recipient = Recipient {
        id: Uuid::new_v4(),
        first_name: "Alice".to_string(),
        last_name: "Hart".to_string(),
        email: "alice@example.com".to_string(),
        position: "Accountant".to_string(),
    };
    let recipient_id = directory.add_recipient(recipient.clone());
    let empty_group_id = directory.add_group(RecipientGroup {
        id: Uuid::new_v4(),
        name: "empty".to_string(),
        recipients: vec![],
    });

    let campaign = campaigns.create(
        NewCampaign {
            sender_id,
            group_id: Uuid::new_v4(),
            campaign_name: "drill".to_string(),
            subject: "s".to_string(),
            body: "b".to_string(),
            platform: "facebook".to_string(),
            host: "https://h".to_string(),
        },
        &[recipient],
    );

    let dispatcher = Arc::new(Dispatcher::new(
        directory.clone(),
        campaigns.clone(),
        jobs.clone(),
        Arc::new(SmtpMailerFactory::new(SmtpConfig::default())),
        SmtpConfig::default(),
        "https://h".to_string(),
    ));
    let tracking = Arc::new(TrackingService::new(
        directory,
        campaigns,
        events.clone(),
        LoginPageRenderer::builtin(),
    ));

    let state = AppState {
        dispatcher,
        tracking,
        jobs,
        node_id: AppConfig::default().node_id,
        start_time: Instant::now(),
    };

    TestApp {
        router: ApiServer::router(state),
        events,
        recipient_id,
        campaign_id: campaign.id,
        empty_group_id,
        sender_id,
    }
}

fn with_peer(mut request: Request<Body>) -> Request<Body> {
    let peer: SocketAddr = "192.0.2.1:9999".parse().unwrap();
    request.extensions_mut().insert(ConnectInfo(peer));
    request
}

#[tokio::test]
async fn health_is_up() {
    let app = test_app();
    let response = app
        .router
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn click_redirects_to_login_template_and_logs_once() {
    let app = test_app();
    let path = format!("/track/{}/{}/facebook/", app.recipient_id, app.campaign_id);

    for _ in 0..2 {
        let response = app
            .router
            .clone()
            .oneshot(with_peer(
                Request::get(path.as_str())
                    .header(header::USER_AGENT, "Mozilla/5.0")
                    .body(Body::empty())
                    .unwrap(),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let location = response.headers().get(header::LOCATION).unwrap();
        assert_eq!(
            location.to_str().unwrap(),
            format!(
                "/login-template/{}/{}/facebook/",
                app.recipient_id, app.campaign_id
            )
        );
    }

    assert_eq!(app.events.click_count(), 1);
}

#[tokio::test]
async fn click_for_unknown_recipient_is_404() {
    let app = test_app();
    let path = format!("/track/{}/{}/facebook/", Uuid::new_v4(), app.campaign_id);

    let response = app
        .router
        .oneshot(with_peer(Request::get(path.as_str()).body(Body::empty()).unwrap()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.events.click_count(), 0);
}

#[tokio::test]
async fn login_template_renders_known_platform_only() {
    let app = test_app();

    let ok_path = format!(
        "/login-template/{}/{}/facebook/",
        app.recipient_id, app.campaign_id
    );
    let response = app
        .router
        .clone()
        .oneshot(Request::get(ok_path.as_str()).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bad_path = format!(
        "/login-template/{}/{}/geocities/",
        app.recipient_id, app.campaign_id
    );
    let response = app
        .router
        .oneshot(Request::get(bad_path.as_str()).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn capture_succeeds_even_for_unknown_recipient() {
    let app = test_app();
    let path = format!("/capture/{}/{}/facebook/", Uuid::new_v4(), app.campaign_id);

    let response = app
        .router
        .oneshot(with_peer(
            Request::post(path.as_str())
                .header(
                    header::CONTENT_TYPE,
                    "application/x-www-form-urlencoded",
                )
                .body(Body::from("email=ghost%40example.com&password=hunter2"))
                .unwrap(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.events.credential_count(), 1);
    let stored = &app.events.list_credentials()[0];
    assert!(stored.recipient_id.is_none());
    assert_eq!(stored.email, "ghost@example.com");
}

#[tokio::test]
async fn repeated_capture_posts_append() {
    let app = test_app();
    let path = format!(
        "/capture/{}/{}/facebook/",
        app.recipient_id, app.campaign_id
    );

    for _ in 0..3 {
        let response = app
            .router
            .clone()
            .oneshot(with_peer(
                Request::post(path.as_str())
                    .header(
                        header::CONTENT_TYPE,
                        "application/x-www-form-urlencoded",
                    )
                    .body(Body::from("email=alice%40example.com&password=try"))
                    .unwrap(),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert_eq!(app.events.credential_count(), 3);
}

#[tokio::test]
async fn send_to_empty_group_is_bad_request() {
    let app = test_app();
    let body = serde_json::json!({
        "sender": app.sender_id,
        "recipient_group": app.empty_group_id,
        "subject": "Action required",
        "body": "Click: [Suspicious Link]",
    });

    let response = app
        .router
        .oneshot(
            Request::post("/api/v1/campaigns/send")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_job_is_404() {
    let app = test_app();
    let response = app
        .router
        .oneshot(
            Request::get(format!("/api/v1/campaigns/jobs/{}", Uuid::new_v4()).as_str())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
