mod common;

use common::{envelope, TestApp, SENDGRID_KEY};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn get_redirects_to_form_page() {
    let app = TestApp::spawn().await;

    let response = app.get("/template-version").await;

    assert_eq!(response.status().as_u16(), 302);
    assert_eq!(
        response.headers().get("location").unwrap(),
        "/template-version.html"
    );
}

#[tokio::test]
async fn create_version_posts_payload_with_defaults() {
    let app = TestApp::spawn().await;

    Mock::given(method("POST"))
        .and(path("/v3/templates/d-123/versions"))
        .and(header("authorization", format!("Bearer {}", SENDGRID_KEY).as_str()))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "v-1",
            "template_id": "d-123",
            "name": "Spring"
        })))
        .expect(1)
        .mount(&app.sendgrid)
        .await;

    let body = envelope(
        app.post_form(
            "/template-version",
            &[("template_id", " d-123 "), ("name", "Spring"), ("updated_at", "  ")],
        )
        .await,
    )
    .await;

    assert_eq!(body["success"], true);
    assert_eq!(body["statusCode"], 201);
    assert_eq!(body["data"]["id"], "v-1");

    let requests = app.sendgrid.received_requests().await.unwrap();
    let sent: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(
        sent,
        json!({
            "template_id": "d-123",
            "active": 1,
            "name": "Spring",
            "html_content": "<!doctype><html><body></body></html>",
            "generate_plain_content": false,
            "subject": "",
            "editor": "code"
        })
    );
}

#[tokio::test]
async fn create_version_forwards_optional_fields() {
    let app = TestApp::spawn().await;

    Mock::given(method("POST"))
        .and(path("/v3/templates/d-9/versions"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "v-2"})))
        .mount(&app.sendgrid)
        .await;

    envelope(
        app.post_form(
            "/template-version",
            &[
                ("template_id", "d-9"),
                ("name", "Summer"),
                ("active", "0"),
                ("html_content", "<p>Hello</p>"),
                ("generate_plain_content", "true"),
                ("subject", "Hi {{name}}"),
                ("updated_at", "2024-06-01 09:00:00"),
                ("editor", "design"),
            ],
        )
        .await,
    )
    .await;

    let requests = app.sendgrid.received_requests().await.unwrap();
    let sent: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(sent["active"], 0);
    assert_eq!(sent["html_content"], "<p>Hello</p>");
    assert_eq!(sent["generate_plain_content"], true);
    assert_eq!(sent["subject"], "Hi {{name}}");
    assert_eq!(sent["updated_at"], "2024-06-01 09:00:00");
    assert_eq!(sent["editor"], "design");
}

#[tokio::test]
async fn missing_template_id_short_circuits() {
    let app = TestApp::spawn().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&app.sendgrid)
        .await;

    let body = envelope(app.post_form("/template-version", &[("name", "Spring")]).await).await;

    assert_eq!(body, json!({"success": false, "error": "Template ID is required"}));
}

#[tokio::test]
async fn missing_name_short_circuits() {
    let app = TestApp::spawn().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&app.sendgrid)
        .await;

    let body =
        envelope(app.post_form("/template-version", &[("template_id", "d-1"), ("name", " ")]).await)
            .await;

    assert_eq!(body["error"], "Version name is required");
}

#[tokio::test]
async fn field_error_is_reported() {
    let app = TestApp::spawn().await;
    let error_body = r#"{"errors":[{"field":"name"}]}"#;

    Mock::given(method("POST"))
        .and(path("/v3/templates/d-1/versions"))
        .respond_with(ResponseTemplate::new(400).set_body_string(error_body))
        .mount(&app.sendgrid)
        .await;

    let body = envelope(
        app.post_form("/template-version", &[("template_id", "d-1"), ("name", "x")])
            .await,
    )
    .await;

    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Error in field 'name': Invalid value");
    assert_eq!(body["statusCode"], 400);
    assert_eq!(body["responseBody"], error_body);
}
