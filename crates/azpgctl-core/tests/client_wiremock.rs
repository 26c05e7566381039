//! Integration tests for the resource client against a mock control plane

use std::sync::{Arc, Mutex};
use std::time::Duration;

use azpgctl_core::config::PollingConfig;
use azpgctl_core::{
    ClientConfig, ClientSecretCredential, CoreError, GenericResource, LroOptions, ProgressEvent,
    ResourceClient, StaticToken, TokenCredential, UpdateMethod,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::matchers::{any, body_json, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SERVER_PATH: &str =
    "/subscriptions/sub-1/resourcegroups/g1/providers/Microsoft.DBforPostgreSQL/servers/s1";
const API_VERSION: &str = "2017-04-30-preview";

fn fast_polling() -> PollingConfig {
    PollingConfig {
        interval_secs: 0,
        timeout_secs: 30,
        request_timeout_secs: 10,
    }
}

fn client_with(server: &MockServer, polling: PollingConfig) -> ResourceClient {
    let config =
        ClientConfig::new(Url::parse(&server.uri()).unwrap(), "sub-1").with_polling(polling);
    ResourceClient::new(config, Arc::new(StaticToken::new("test-token"))).unwrap()
}

fn client(server: &MockServer) -> ResourceClient {
    client_with(server, fast_polling())
}

fn server_body(state: &str) -> serde_json::Value {
    json!({
        "id": SERVER_PATH,
        "name": "s1",
        "type": "Microsoft.DBforPostgreSQL/servers",
        "location": "westus",
        "properties": {
            "provisioningState": state,
            "userVisibleState": "Ready",
            "version": "9.5"
        }
    })
}

fn recorder() -> (LroOptions, Arc<Mutex<Vec<ProgressEvent>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let options = LroOptions::default().with_progress(Arc::new(move |event| {
        sink.lock().unwrap().push(event);
    }));
    (options, events)
}

// ============================================================================
// GET
// ============================================================================

#[tokio::test]
async fn test_get_sends_token_and_api_version() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SERVER_PATH))
        .and(query_param("api-version", API_VERSION))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(server_body("Succeeded")))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let resource = client.get(&client.server_id("g1", "s1")).await.unwrap();

    assert_eq!(resource.name.as_deref(), Some("s1"));
    assert_eq!(resource.location.as_deref(), Some("westus"));
    assert_eq!(resource.property_str("version"), Some("9.5"));
}

#[tokio::test]
async fn test_get_maps_status_codes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}{}", SERVER_PATH, "-missing")))
        .respond_with(ResponseTemplate::new(404).set_body_string("{}"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{}{}", SERVER_PATH, "-denied")))
        .respond_with(ResponseTemplate::new(401).set_body_string("expired"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{}{}", SERVER_PATH, "-broken")))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let client = client(&server);

    let err = client.get(&client.server_id("g1", "s1-missing")).await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound { .. }), "{err:?}");

    let err = client.get(&client.server_id("g1", "s1-denied")).await.unwrap_err();
    assert!(matches!(err, CoreError::Unauthorized { status: 401, .. }), "{err:?}");

    let err = client.get(&client.server_id("g1", "s1-broken")).await.unwrap_err();
    match err {
        CoreError::Remote { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("expected Remote, got {other:?}"),
    }
}

#[tokio::test]
async fn test_group_name_with_parentheses_is_sent_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(
            "/subscriptions/sub-1/resourcegroups/rg_(test)-1.0/providers/Microsoft.DBforPostgreSQL/servers/s1",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(server_body("Succeeded")))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    client
        .get(&client.server_id("rg_(test)-1.0", "s1"))
        .await
        .unwrap();
}

// ============================================================================
// Validation
// ============================================================================

#[tokio::test]
async fn test_validation_issues_no_requests() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client(&server);

    let err = client
        .get(&client.server_id("bad/name", "s1"))
        .await
        .unwrap_err();
    match err {
        CoreError::Validation { field, .. } => assert_eq!(field, "resourceGroupName"),
        other => panic!("expected Validation, got {other:?}"),
    }

    let too_long = "g".repeat(91);
    let err = client
        .delete(&client.server_id(&too_long, "s1"))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation { .. }));

    let body = GenericResource {
        kind: Some("bad kind!".to_string()),
        ..Default::default()
    };
    let err = client
        .create_or_update(&client.server_id("g1", "s1"), &body, UpdateMethod::Put)
        .await
        .unwrap_err();
    match err {
        CoreError::Validation { field, .. } => assert_eq!(field, "parameters.kind"),
        other => panic!("expected Validation, got {other:?}"),
    }
}

// ============================================================================
// PUT / PATCH
// ============================================================================

#[tokio::test]
async fn test_put_and_patch_send_identical_bodies() {
    let server = MockServer::start().await;
    let body = json!({"properties": {"administratorLoginPassword": "NewPass1"}});

    for verb in ["PUT", "PATCH"] {
        Mock::given(method(verb))
            .and(path(SERVER_PATH))
            .and(body_json(body.clone()))
            .respond_with(ResponseTemplate::new(200).set_body_json(server_body("Succeeded")))
            .expect(1)
            .mount(&server)
            .await;
    }

    let client = client(&server);
    let id = client.server_id("g1", "s1");
    let resource: GenericResource = serde_json::from_value(body).unwrap();

    let put = client
        .create_or_update(&id, &resource, UpdateMethod::Put)
        .await
        .unwrap();
    let patch = client
        .create_or_update(&id, &resource, UpdateMethod::Patch)
        .await
        .unwrap();
    assert_eq!(put, patch);
}

#[tokio::test]
async fn test_create_failure_returns_remote_error() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(SERVER_PATH))
        .respond_with(
            ResponseTemplate::new(400).set_body_string(r#"{"error":{"code":"InvalidSku"}}"#),
        )
        .mount(&server)
        .await;

    let client = client(&server);
    let err = client
        .create_or_update(
            &client.server_id("g1", "s1"),
            &GenericResource::default(),
            UpdateMethod::Put,
        )
        .await
        .unwrap_err();

    match err {
        CoreError::Remote { status, body } => {
            assert_eq!(status, 400);
            assert!(body.contains("InvalidSku"));
        }
        other => panic!("expected Remote, got {other:?}"),
    }
}

#[tokio::test]
async fn test_async_operation_is_polled_until_succeeded() {
    let server = MockServer::start().await;
    let operation_url = format!("{}/operations/op-1", server.uri());

    Mock::given(method("PUT"))
        .and(path(SERVER_PATH))
        .respond_with(
            ResponseTemplate::new(201)
                .insert_header("Azure-AsyncOperation", operation_url.as_str())
                .insert_header("Retry-After", "0")
                .set_body_json(server_body("InProgress")),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/operations/op-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "InProgress"})))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/operations/op-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "Succeeded"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(SERVER_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(server_body("Succeeded")))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let (options, events) = recorder();
    let resource = client
        .create_or_update_with(
            &client.server_id("g1", "s1"),
            &GenericResource::default(),
            UpdateMethod::Put,
            &options,
        )
        .await
        .unwrap();

    assert_eq!(resource.provisioning_state(), Some("Succeeded"));

    let events = events.lock().unwrap();
    assert!(matches!(events.first(), Some(ProgressEvent::Started { .. })));
    assert!(matches!(events.last(), Some(ProgressEvent::Completed { .. })));
    let polls = events
        .iter()
        .filter(|e| matches!(e, ProgressEvent::Polling { status, .. } if status == "InProgress"))
        .count();
    assert_eq!(polls, 2);
}

#[tokio::test]
async fn test_async_operation_failure_is_reported() {
    let server = MockServer::start().await;
    let operation_url = format!("{}/operations/op-2", server.uri());

    Mock::given(method("PUT"))
        .and(path(SERVER_PATH))
        .respond_with(
            ResponseTemplate::new(202)
                .insert_header("Azure-AsyncOperation", operation_url.as_str())
                .insert_header("Retry-After", "0"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/operations/op-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "failed",
            "error": {"code": "QuotaExceeded"}
        })))
        .mount(&server)
        .await;

    let client = client(&server);
    let err = client
        .create_or_update(
            &client.server_id("g1", "s1"),
            &GenericResource::default(),
            UpdateMethod::Put,
        )
        .await
        .unwrap_err();

    match err {
        CoreError::OperationFailed { status, body } => {
            assert_eq!(status, "failed");
            assert!(body.contains("QuotaExceeded"));
        }
        other => panic!("expected OperationFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_provisioning_state_is_polled_on_resource() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path(SERVER_PATH))
        .respond_with(ResponseTemplate::new(201).set_body_json(server_body("Creating")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(SERVER_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(server_body("Creating")))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(SERVER_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(server_body("Succeeded")))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let resource = client
        .create_or_update(
            &client.server_id("g1", "s1"),
            &GenericResource::default(),
            UpdateMethod::Put,
        )
        .await
        .unwrap();
    assert_eq!(resource.provisioning_state(), Some("Succeeded"));
}

#[tokio::test]
async fn test_poll_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(SERVER_PATH))
        .respond_with(ResponseTemplate::new(201).set_body_json(server_body("Creating")))
        .mount(&server)
        .await;
    // The status is still checked once before giving up
    Mock::given(method("GET"))
        .and(path(SERVER_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(server_body("Creating")))
        .expect(1..)
        .mount(&server)
        .await;

    let polling = PollingConfig {
        interval_secs: 1,
        timeout_secs: 0,
        request_timeout_secs: 10,
    };
    let client = client_with(&server, polling);
    let err = client
        .create_or_update(
            &client.server_id("g1", "s1"),
            &GenericResource::default(),
            UpdateMethod::Put,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::PollTimeout(_)), "{err:?}");
    assert!(err.is_timeout());
}

#[tokio::test]
async fn test_retry_after_beyond_timeout_still_checks_status() {
    let server = MockServer::start().await;
    let operation_url = format!("{}/operations/op-slow", server.uri());

    Mock::given(method("PUT"))
        .and(path(SERVER_PATH))
        .respond_with(
            ResponseTemplate::new(202)
                .insert_header("Azure-AsyncOperation", operation_url.as_str())
                .insert_header("Retry-After", "30"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/operations/op-slow"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "Succeeded"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(SERVER_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(server_body("Succeeded")))
        .expect(1)
        .mount(&server)
        .await;

    let polling = PollingConfig {
        interval_secs: 1,
        timeout_secs: 1,
        request_timeout_secs: 10,
    };
    let client = client_with(&server, polling);
    let started = std::time::Instant::now();
    let resource = client
        .create_or_update(
            &client.server_id("g1", "s1"),
            &GenericResource::default(),
            UpdateMethod::Put,
        )
        .await
        .unwrap();

    assert_eq!(resource.provisioning_state(), Some("Succeeded"));
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[tokio::test]
async fn test_patch_completes_through_location_header() {
    let server = MockServer::start().await;
    let location = format!("{}/results/patch-1", server.uri());

    Mock::given(method("PATCH"))
        .and(path(SERVER_PATH))
        .respond_with(
            ResponseTemplate::new(202)
                .insert_header("Location", location.as_str())
                .insert_header("Retry-After", "0"),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/results/patch-1"))
        .respond_with(ResponseTemplate::new(202).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/results/patch-1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    // No body on the final 204, so the resource is read back
    Mock::given(method("GET"))
        .and(path(SERVER_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(server_body("Succeeded")))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let body: GenericResource =
        serde_json::from_value(json!({"properties": {"administratorLoginPassword": "NewPass1"}}))
            .unwrap();
    let resource = client
        .create_or_update(&client.server_id("g1", "s1"), &body, UpdateMethod::Patch)
        .await
        .unwrap();
    assert_eq!(resource.name.as_deref(), Some("s1"));
}

#[tokio::test]
async fn test_put_returns_body_from_location_result() {
    let server = MockServer::start().await;
    let location = format!("{}/results/put-1", server.uri());

    Mock::given(method("PUT"))
        .and(path(SERVER_PATH))
        .respond_with(
            ResponseTemplate::new(202)
                .insert_header("Location", location.as_str())
                .insert_header("Retry-After", "0"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/results/put-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(server_body("Succeeded")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(SERVER_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(server_body("Succeeded")))
        .expect(0)
        .mount(&server)
        .await;

    let client = client(&server);
    let resource = client
        .create_or_update(
            &client.server_id("g1", "s1"),
            &GenericResource::default(),
            UpdateMethod::Put,
        )
        .await
        .unwrap();
    assert_eq!(resource.provisioning_state(), Some("Succeeded"));
}

#[tokio::test]
async fn test_failed_provisioning_state_is_operation_failed() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(SERVER_PATH))
        .respond_with(ResponseTemplate::new(201).set_body_json(server_body("Creating")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(SERVER_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(server_body("Failed")))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let err = client
        .create_or_update(
            &client.server_id("g1", "s1"),
            &GenericResource::default(),
            UpdateMethod::Put,
        )
        .await
        .unwrap_err();

    match err {
        CoreError::OperationFailed { status, .. } => assert_eq!(status, "Failed"),
        other => panic!("expected OperationFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_cancellation_stops_polling() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(SERVER_PATH))
        .respond_with(
            ResponseTemplate::new(202)
                .insert_header("Location", format!("{}/results/r1", server.uri()).as_str()),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/results/r1"))
        .respond_with(ResponseTemplate::new(202))
        .expect(0)
        .mount(&server)
        .await;

    let polling = PollingConfig {
        interval_secs: 60,
        timeout_secs: 600,
        request_timeout_secs: 10,
    };
    let client = client_with(&server, polling);
    let cancel = CancellationToken::new();
    let options = LroOptions::default().with_cancel(cancel.clone());

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();
    });

    let err = client
        .create_or_update_with(
            &client.server_id("g1", "s1"),
            &GenericResource::default(),
            UpdateMethod::Put,
            &options,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Cancelled), "{err:?}");
}

// ============================================================================
// DELETE
// ============================================================================

#[tokio::test]
async fn test_delete_polls_location_header() {
    let server = MockServer::start().await;
    let location = format!("{}/results/del-1", server.uri());

    Mock::given(method("DELETE"))
        .and(path(SERVER_PATH))
        .respond_with(
            ResponseTemplate::new(202)
                .insert_header("Location", location.as_str())
                .insert_header("Retry-After", "0"),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/results/del-1"))
        .respond_with(ResponseTemplate::new(202).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/results/del-1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    client.delete(&client.server_id("g1", "s1")).await.unwrap();
}

#[tokio::test]
async fn test_delete_polls_async_operation() {
    let server = MockServer::start().await;
    let operation_url = format!("{}/operations/del-op", server.uri());

    Mock::given(method("DELETE"))
        .and(path(SERVER_PATH))
        .respond_with(
            ResponseTemplate::new(202)
                .insert_header("Azure-AsyncOperation", operation_url.as_str())
                .insert_header("Retry-After", "0"),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/operations/del-op"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Retry-After", "0")
                .set_body_json(json!({"status": "InProgress"})),
        )
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/operations/del-op"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "Succeeded"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(SERVER_PATH))
        .respond_with(ResponseTemplate::new(404))
        .expect(0)
        .mount(&server)
        .await;

    let client = client(&server);
    client.delete(&client.server_id("g1", "s1")).await.unwrap();
}

#[tokio::test]
async fn test_delete_accepted_without_headers_waits_until_gone() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(SERVER_PATH))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(SERVER_PATH))
        .and(query_param("api-version", API_VERSION))
        .respond_with(ResponseTemplate::new(200).set_body_json(server_body("Deleting")))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(SERVER_PATH))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let (options, events) = recorder();
    client
        .delete_with(&client.server_id("g1", "s1"), &options)
        .await
        .unwrap();

    let events = events.lock().unwrap();
    assert!(events.iter().any(
        |e| matches!(e, ProgressEvent::Polling { status, .. } if status == "Deleting")
    ));
    assert!(matches!(events.last(), Some(ProgressEvent::Completed { .. })));
}

#[tokio::test]
async fn test_delete_accepted_without_headers_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(SERVER_PATH))
        .respond_with(ResponseTemplate::new(202))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(SERVER_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(server_body("Deleting")))
        .expect(1..)
        .mount(&server)
        .await;

    let polling = PollingConfig {
        interval_secs: 1,
        timeout_secs: 0,
        request_timeout_secs: 10,
    };
    let client = client_with(&server, polling);
    let err = client
        .delete(&client.server_id("g1", "s1"))
        .await
        .unwrap_err();
    assert!(err.is_timeout(), "{err:?}");
}

#[tokio::test]
async fn test_delete_missing_resource_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(SERVER_PATH))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(format!("{}{}", SERVER_PATH, "-gone")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client(&server);
    let err = client.delete(&client.server_id("g1", "s1")).await.unwrap_err();
    assert!(err.is_not_found(), "{err:?}");

    let err = client
        .delete(&client.server_id("g1", "s1-gone"))
        .await
        .unwrap_err();
    assert!(err.is_not_found(), "{err:?}");
}

// ============================================================================
// Resource groups
// ============================================================================

#[tokio::test]
async fn test_create_resource_group_uses_group_api_version() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/subscriptions/sub-1/resourcegroups/g1"))
        .and(query_param("api-version", "2017-05-10"))
        .and(body_json(json!({"location": "westus"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "/subscriptions/sub-1/resourceGroups/g1",
            "name": "g1",
            "location": "westus",
            "properties": {"provisioningState": "Succeeded"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let group = client
        .create_resource_group(&client.resource_group_id("g1"), "westus")
        .await
        .unwrap();
    assert_eq!(group.name.as_deref(), Some("g1"));
}

// ============================================================================
// Token acquisition
// ============================================================================

#[tokio::test]
async fn test_client_secret_credential_posts_form_and_caches() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/tenant-1/oauth2/token"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("client_id=app-1"))
        .and(body_string_contains("client_secret=s3cret"))
        .and(body_string_contains(
            "resource=https%3A%2F%2Fmanagement.azure.com%2F",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token_type": "Bearer",
            "expires_in": "3599",
            "access_token": "issued-token"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let credential = ClientSecretCredential::new(
        reqwest::Client::new(),
        &Url::parse(&server.uri()).unwrap(),
        "tenant-1",
        "app-1",
        "s3cret",
        "https://management.azure.com/",
    )
    .unwrap();

    let first = credential.token().await.unwrap();
    let second = credential.token().await.unwrap();
    assert_eq!(first.secret(), "issued-token");
    assert_eq!(second.secret(), "issued-token");
}

#[tokio::test]
async fn test_rejected_client_secret_is_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/tenant-1/oauth2/token"))
        .respond_with(
            ResponseTemplate::new(401).set_body_string(r#"{"error":"invalid_client"}"#),
        )
        .mount(&server)
        .await;

    let credential = ClientSecretCredential::new(
        reqwest::Client::new(),
        &Url::parse(&server.uri()).unwrap(),
        "tenant-1",
        "app-1",
        "wrong",
        "https://management.azure.com/",
    )
    .unwrap();

    let err = credential.token().await.unwrap_err();
    assert!(matches!(err, CoreError::Auth(_)));
    assert!(err.is_unauthorized());
}
