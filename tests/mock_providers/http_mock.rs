//! REST upstream mocks: Firestore documents, the signed-URL endpoint, and
//! the Twilio calls API.

use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A tenant document in Firestore's REST shape with the given voice fields.
pub fn tenant_document(voice_fields: Value) -> Value {
    json!({
        "name": "projects/test-project/databases/(default)/documents/users/t1",
        "fields": {
            "onboarding": { "mapValue": { "fields": {
                "voice": { "mapValue": { "fields": voice_fields } }
            }}}
        }
    })
}

pub fn complete_voice_fields() -> Value {
    json!({
        "twilioSid": { "stringValue": "AC123" },
        "twilioApiKey": { "stringValue": "twilio-key" },
        "twilioPhoneNumber": { "stringValue": "+15550100" },
        "elevenLabsApiKey": { "stringValue": "xi-key" },
        "elevenLabsAgentId": { "stringValue": "agent123" },
    })
}

pub fn voice_fields_missing(field: &str) -> Value {
    let mut fields = complete_voice_fields();
    fields.as_object_mut().unwrap().remove(field);
    fields
}

pub async fn mount_tenant_document(server: &MockServer, tenant_id: &str, document: Value) {
    Mock::given(method("GET"))
        .and(path(format!(
            "/v1/projects/test-project/databases/(default)/documents/users/{tenant_id}"
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(document))
        .mount(server)
        .await;
}

pub async fn mount_tenant_not_found(server: &MockServer, tenant_id: &str) {
    Mock::given(method("GET"))
        .and(path(format!(
            "/v1/projects/test-project/databases/(default)/documents/users/{tenant_id}"
        )))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": { "code": 404, "status": "NOT_FOUND" }
        })))
        .mount(server)
        .await;
}

pub async fn mount_signed_url(server: &MockServer, signed_url: &str) {
    Mock::given(method("GET"))
        .and(path("/v1/convai/conversation/get_signed_url"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "signed_url": signed_url
        })))
        .mount(server)
        .await;
}

pub async fn mount_signed_url_failure(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v1/convai/conversation/get_signed_url"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "detail": "agent not available"
        })))
        .mount(server)
        .await;
}

pub async fn mount_create_call(server: &MockServer, account_sid: &str, call_sid: &str) {
    Mock::given(method("POST"))
        .and(path(format!("/2010-04-01/Accounts/{account_sid}/Calls.json")))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "sid": call_sid,
            "status": "queued"
        })))
        .mount(server)
        .await;
}

pub async fn mount_update_call(server: &MockServer, account_sid: &str, call_sid: &str) {
    Mock::given(method("POST"))
        .and(path(format!(
            "/2010-04-01/Accounts/{account_sid}/Calls/{call_sid}.json"
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sid": call_sid,
            "status": "completed"
        })))
        .mount(server)
        .await;
}

pub async fn mount_fetch_call(server: &MockServer, account_sid: &str, call_sid: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(format!(
            "/2010-04-01/Accounts/{account_sid}/Calls/{call_sid}.json"
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

pub async fn mount_call_not_found(server: &MockServer, account_sid: &str, call_sid: &str) {
    Mock::given(method("GET"))
        .and(path(format!(
            "/2010-04-01/Accounts/{account_sid}/Calls/{call_sid}.json"
        )))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "code": 20404,
            "message": "The requested resource was not found",
            "status": 404
        })))
        .mount(server)
        .await;
}
