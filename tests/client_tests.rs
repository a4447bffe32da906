use httpmock::prelude::*;
use serde::Deserialize;
use serde_json::json;
use vkapi::{sign, Config, ParamValue, Params, ResponseFormat, VkClient, VkError};

fn mock_client(server: &MockServer) -> VkClient {
    let config = Config::new(server.base_url(), server.url("/oauth"));
    VkClient::with_config("123456", config).expect("failed to create client")
}

fn params(pairs: &[(&str, &str)]) -> Params {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), ParamValue::from(*v)))
        .collect()
}

#[test]
fn test_call_unsigned() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/method/users.get")
            .query_param("access_token", "T")
            .query_param("user_ids", "1");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(json!({"response": [{"id": 1, "first_name": "Pavel"}]}));
    });

    let vk = mock_client(&server).with_access_token("T");
    let response = vk
        .call("users.get", &params(&[("user_ids", "1")]))
        .expect("call failed");

    assert_eq!(response["response"][0]["first_name"], "Pavel");
    mock.assert();
}

#[test]
fn test_call_signed() {
    let server = MockServer::start();
    let expected_sig = sign("/method/users.get?access_token=T&user_ids=1&v=5.1", "s3cr3t");
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/method/users.get")
            .query_param("sig", expected_sig.as_str());
        then.status(200).json_body(json!({"response": []}));
    });

    let vk = mock_client(&server)
        .with_access_token("T")
        .with_secret("s3cr3t")
        .with_default_params(params(&[("v", "5.1")]));
    vk.call("users.get", &params(&[("user_ids", "1")]))
        .expect("signed call failed");

    mock.assert();
}

#[test]
fn test_call_params_override_defaults() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/method/wall.get")
            .query_param("v", "5.2")
            .query_param("q", "x")
            .query_param("access_token", "T");
        then.status(200).json_body(json!({"response": {"count": 0, "items": []}}));
    });

    let vk = mock_client(&server)
        .with_access_token("T")
        .with_default_params(params(&[("v", "5.1")]));
    vk.call("wall.get", &params(&[("v", "5.2"), ("q", "x")]))
        .expect("call failed");

    mock.assert();
}

#[test]
fn test_apply_typed() {
    #[derive(Debug, Deserialize)]
    struct User {
        id: i64,
        first_name: String,
    }

    #[derive(Debug, Deserialize)]
    struct Users {
        response: Vec<User>,
    }

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/method/users.get");
        then.status(200)
            .json_body(json!({"response": [{"id": 1, "first_name": "Pavel"}]}));
    });

    let vk = mock_client(&server);
    let users: Users = vk
        .apply("users.get", &params(&[("user_ids", "1")]))
        .expect("apply failed");

    assert_eq!(users.response.len(), 1);
    assert_eq!(users.response[0].id, 1);
    assert_eq!(users.response[0].first_name, "Pavel");
}

#[test]
fn test_call_error_envelope() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/method/users.get");
        then.status(200)
            .json_body(json!({"error": {"error_code": 5, "error_msg": "bad token"}}));
    });

    let vk = mock_client(&server).with_access_token("bad");
    match vk.call("users.get", &Params::new()) {
        Err(VkError::Api { code, message, .. }) => {
            assert_eq!(code, 5);
            assert_eq!(message, "bad token");
        }
        other => panic!("expected VkError::Api, got {:?}", other),
    }
}

#[test]
fn test_call_malformed_body() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/method/users.get");
        then.status(200).body("{\"response\": [");
    });

    let vk = mock_client(&server);
    let err = vk.call("users.get", &Params::new()).unwrap_err();
    assert!(matches!(err, VkError::Decode { format: ResponseFormat::Json, .. }));
}

#[test]
fn test_call_http_error_without_envelope() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/method/users.get");
        then.status(503).body("Service Unavailable");
    });

    let vk = mock_client(&server);
    match vk.call("users.get", &Params::new()) {
        Err(VkError::Http { status, body }) => {
            assert_eq!(status, 503);
            assert_eq!(body, "Service Unavailable");
        }
        other => panic!("expected VkError::Http, got {:?}", other),
    }
}

#[test]
fn test_call_http_error_with_plain_json_body() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/method/users.get");
        then.status(500).json_body(json!({"foo": 1}));
    });

    let vk = mock_client(&server);
    match vk.call("users.get", &Params::new()) {
        Err(VkError::Http { status, body }) => {
            assert_eq!(status, 500);
            assert!(body.contains("foo"));
        }
        other => panic!("expected VkError::Http, got {:?}", other),
    }
}

#[test]
fn test_call_error_envelope_on_failed_status() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/method/users.get");
        then.status(500).json_body(json!({
            "error": {"error_code": 10, "error_msg": "Internal server error"}
        }));
    });

    let vk = mock_client(&server);
    let err = vk.call("users.get", &Params::new()).unwrap_err();
    assert_eq!(err.api_code(), Some(10));
}

#[test]
fn test_call_xml_untyped() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/method/users.get.xml");
        then.status(200).header("Content-Type", "application/xml").body(
            r#"<?xml version="1.0" encoding="utf-8"?>
<response list="true">
 <user>
  <id>1</id>
  <first_name>Pavel</first_name>
 </user>
</response>"#,
        );
    });

    let mut vk = mock_client(&server);
    vk.set_xml_format();
    let response = vk
        .call("users.get", &params(&[("user_ids", "1")]))
        .expect("xml call failed");

    assert!(response.contains_key("user"));
    mock.assert();
}

#[test]
fn test_call_xml() {
    #[derive(Debug, Deserialize)]
    struct User {
        id: i64,
        first_name: String,
    }

    #[derive(Debug, Deserialize)]
    struct Users {
        user: Vec<User>,
    }

    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/method/users.get.xml");
        then.status(200).header("Content-Type", "application/xml").body(
            r#"<?xml version="1.0" encoding="utf-8"?>
<response list="true">
 <user>
  <id>1</id>
  <first_name>Pavel</first_name>
 </user>
</response>"#,
        );
    });

    let mut vk = mock_client(&server);
    vk.set_response_format(ResponseFormat::Xml);
    let users: Users = vk
        .apply("users.get", &params(&[("user_ids", "1")]))
        .expect("xml call failed");

    assert_eq!(users.user[0].id, 1);
    assert_eq!(users.user[0].first_name, "Pavel");
    mock.assert();
}

#[test]
fn test_call_post_form_fields() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/method/wall.post")
            .query_param("owner_id", "-1")
            .body_contains("name=\"message\"\r\n\r\nhello world");
        then.status(200).json_body(json!({"response": {"post_id": 42}}));
    });

    let vk = mock_client(&server);
    let response = vk
        .call_post(
            "wall.post",
            &params(&[("owner_id", "-1")]),
            &params(&[("message", "hello world")]),
        )
        .expect("post failed");

    assert_eq!(response["response"]["post_id"], 42);
    mock.assert();
}

#[test]
fn test_raw_get_prebuilt_url() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/custom").query_param("a", "1");
        then.status(200).json_body(json!({"ok": true}));
    });

    let vk = mock_client(&server)
        .with_access_token("T")
        .with_secret("s3cr3t");
    let response = vk
        .raw_get(&server.url("/custom?a=1"))
        .expect("raw get failed");

    assert_eq!(response["ok"], true);
    mock.assert();
}

#[test]
fn test_acquire_client_token() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/oauth/access_token")
            .query_param("grant_type", "client_credentials")
            .query_param("client_id", "123456")
            .query_param("client_secret", "s3cr3t")
            .query_param("v", "5.1");
        then.status(200)
            .json_body(json!({"access_token": "abc", "expires_in": 86400}));
    });

    let mut vk = mock_client(&server).with_secret("s3cr3t");
    let token = vk.acquire_client_token().expect("token exchange failed");

    assert_eq!(token.access_token, "abc");
    assert_eq!(token.expires_in, 86400);
    assert_eq!(vk.access_token(), Some("abc"));
    mock.assert();
}

#[test]
fn test_acquire_client_token_error_keeps_previous_token() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/oauth/access_token");
        then.status(200).json_body(json!({"error": "invalid_client"}));
    });

    let mut vk = mock_client(&server)
        .with_secret("wrong")
        .with_access_token("previous");

    match vk.acquire_client_token() {
        Err(VkError::Auth { error, .. }) => assert_eq!(error, "invalid_client"),
        other => panic!("expected VkError::Auth, got {:?}", other),
    }
    assert_eq!(vk.access_token(), Some("previous"));
}

#[test]
fn test_acquire_client_token_error_on_401() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/oauth/access_token");
        then.status(401).json_body(json!({
            "error": "invalid_client",
            "error_description": "client_secret is incorrect"
        }));
    });

    let mut vk = mock_client(&server).with_secret("wrong");
    match vk.acquire_client_token() {
        Err(VkError::Auth { description, .. }) => {
            assert_eq!(description, "client_secret is incorrect");
        }
        other => panic!("expected VkError::Auth, got {:?}", other),
    }
    assert_eq!(vk.access_token(), None);
}

#[test]
fn test_acquire_password_token() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/oauth/token")
            .query_param("grant_type", "password")
            .query_param("username", "user@example.com")
            .query_param("password", "hunter2")
            .query_param("scope", "friends")
            .query_param("test_redirect_uri", "1");
        then.status(200).json_body(json!({
            "access_token": "user-token",
            "expires_in": 0,
            "user_id": 66748
        }));
    });

    let vk = mock_client(&server).with_secret("s3cr3t");
    let token = vk
        .acquire_password_token("user@example.com", "hunter2", "friends", "1")
        .expect("password grant failed");

    assert_eq!(token.access_token, "user-token");
    assert_eq!(token.user_id, Some(66748));
    assert_eq!(token.expires_at(), None);
    // adopting the token is left to the caller
    assert_eq!(vk.access_token(), None);
    mock.assert();
}

#[test]
fn test_acquire_password_token_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/oauth/token");
        then.status(401).json_body(json!({
            "error": "invalid_client",
            "error_description": "Username or password is incorrect"
        }));
    });

    let vk = mock_client(&server);
    let err = vk
        .acquire_password_token("user", "wrong", "", "")
        .unwrap_err();
    assert!(err.is_auth_error());
    assert!(err.to_string().contains("Username or password is incorrect"));
}
