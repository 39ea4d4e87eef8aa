//! Integration tests using wiremock to simulate IBM Cloud IAM.

use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::json;
use wiremock::matchers::{bearer_token, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ibmcloud_inspect::{
    extract_bool, extract_string, extract_strings, public_access_message, AccountInspector,
    AuthenticatedInspector, Credential, ExtractionError, InspectError, InspectorConfig, Query,
};

const ACCOUNT_ID: &str = "8e5158d44fd45edcd727e077fa4f6b16";

async fn mount_token(server: &MockServer, api_key: &str, access_token: &str) {
    Mock::given(method("POST"))
        .and(path("/identity/token"))
        .and(header("Content-Type", "application/x-www-form-urlencoded"))
        .and(body_string_contains(
            "grant_type=urn%3Aibm%3Aparams%3Aoauth%3Agrant-type%3Aapikey",
        ))
        .and(body_string_contains(format!("apikey={}", api_key)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": access_token,
            "refresh_token": "not_supported",
            "token_type": "Bearer",
            "expires_in": 3600,
            "expiration": 1700003600
        })))
        .mount(server)
        .await;
}

fn jwt(payload: serde_json::Value) -> String {
    format!(
        "eyJhbGciOiJSUzI1NiJ9.{}.sig",
        URL_SAFE_NO_PAD.encode(payload.to_string())
    )
}

async fn authenticated(server: &MockServer, access_token: &str) -> AuthenticatedInspector {
    mount_token(server, "abc123", access_token).await;
    AccountInspector::with_iam_url(&server.uri())
        .unwrap()
        .authenticate(&Credential::new("abc123").unwrap())
        .await
        .unwrap()
}

// =============================================================================
// Token Exchange Tests
// =============================================================================

mod token {
    use super::*;

    #[tokio::test]
    async fn test_exchange_returns_token() {
        let server = MockServer::start().await;
        let inspector = authenticated(&server, "tok_xyz").await;

        assert_eq!(inspector.token().secret(), "tok_xyz");
        assert_eq!(inspector.token().preview(), "tok_xyz...");
    }

    #[tokio::test]
    async fn test_exchange_rejected() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/identity/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "errorCode": "BXNIM0415E",
                "errorMessage": "Provided API key could not be found."
            })))
            .mount(&server)
            .await;

        let result = AccountInspector::with_iam_url(&server.uri())
            .unwrap()
            .authenticate(&Credential::new("wrong").unwrap())
            .await;

        match result {
            Err(InspectError::Authentication { status, body }) => {
                assert_eq!(status, 400);
                assert!(body.contains("BXNIM0415E"));
            }
            other => panic!("expected authentication error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_200_success_is_still_rejected() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/identity/token"))
            .respond_with(ResponseTemplate::new(202).set_body_json(json!({"access_token": "tok"})))
            .mount(&server)
            .await;

        let result = AccountInspector::with_iam_url(&server.uri())
            .unwrap()
            .authenticate(&Credential::new("abc123").unwrap())
            .await;

        assert!(matches!(
            result,
            Err(InspectError::Authentication { status: 202, .. })
        ));
    }

    #[tokio::test]
    async fn test_body_without_access_token() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/identity/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token_type": "Bearer"})))
            .mount(&server)
            .await;

        let result = AccountInspector::with_iam_url(&server.uri())
            .unwrap()
            .authenticate(&Credential::new("abc123").unwrap())
            .await;

        match result {
            Err(InspectError::Extraction(ExtractionError::MissingField(field))) => {
                assert_eq!(field, "access_token");
            }
            other => panic!("expected extraction error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/identity/token"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        let result = AccountInspector::with_iam_url(&server.uri())
            .unwrap()
            .authenticate(&Credential::new("abc123").unwrap())
            .await;

        assert!(matches!(result, Err(InspectError::Json(_))));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        // Nothing listens on port 9 locally.
        let config = InspectorConfig::with_iam_url("http://127.0.0.1:9").timeout(Duration::from_secs(2));
        let result = AccountInspector::with_config(&config)
            .unwrap()
            .authenticate(&Credential::new("abc123").unwrap())
            .await;

        let err = result.unwrap_err();
        assert!(err.is_transport(), "unexpected error: {:?}", err);
    }
}

// =============================================================================
// Resource Query Tests
// =============================================================================

mod query {
    use super::*;

    #[tokio::test]
    async fn test_query_carries_bearer_and_accept() {
        let server = MockServer::start().await;
        let inspector = authenticated(&server, "tok_xyz").await;

        Mock::given(method("GET"))
            .and(path("/v1/things"))
            .and(bearer_token("tok_xyz"))
            .and(header("Accept", "application/json"))
            .and(query_param("limit", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"things": [1, 2]})))
            .expect(1)
            .mount(&server)
            .await;

        let body = inspector
            .query(&Query::get("/v1/things").param("limit", "2"))
            .await
            .unwrap();

        assert_eq!(body, json!({"things": [1, 2]}));
    }

    #[tokio::test]
    async fn test_absolute_url_target() {
        let server = MockServer::start().await;
        let inspector = authenticated(&server, "tok_xyz").await;

        Mock::given(method("GET"))
            .and(path("/v1/regions"))
            .and(bearer_token("tok_xyz"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"regions": []})))
            .mount(&server)
            .await;

        let url = format!("{}/v1/regions", server.uri());
        let body = inspector.query(&Query::get(url)).await.unwrap();

        assert_eq!(body, json!({"regions": []}));
    }

    #[tokio::test]
    async fn test_fields_extracted_from_raw_body() {
        let server = MockServer::start().await;
        let inspector = authenticated(&server, "tok_xyz").await;

        Mock::given(method("GET"))
            .and(path("/v2/groups/settings"))
            .and(bearer_token("tok_xyz"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "account_id": ACCOUNT_ID,
                "public_access_enabled": false,
                "regions": [{"name": "us-south"}, {"name": "eu-de"}]
            })))
            .mount(&server)
            .await;

        let body = inspector
            .query(&Query::get("/v2/groups/settings"))
            .await
            .unwrap();

        assert_eq!(extract_string(&body, "account_id").unwrap(), ACCOUNT_ID);
        assert!(!extract_bool(&body, "public_access_enabled").unwrap());
        assert_eq!(
            extract_strings(&body, "regions[].name").unwrap(),
            vec!["us-south", "eu-de"]
        );
    }

    #[tokio::test]
    async fn test_query_failure_keeps_status_and_body() {
        let server = MockServer::start().await;
        let inspector = authenticated(&server, "tok_xyz").await;

        Mock::given(method("GET"))
            .and(path("/v2/groups/settings"))
            .respond_with(ResponseTemplate::new(403).set_body_string("Forbidden"))
            .expect(1)
            .mount(&server)
            .await;

        let result = inspector.public_access_enabled(ACCOUNT_ID).await;

        match result {
            Err(InspectError::Query { status, body }) => {
                assert_eq!(status, 403);
                assert_eq!(body, "Forbidden");
            }
            other => panic!("expected query error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_response_too_large() {
        let server = MockServer::start().await;
        mount_token(&server, "abc123", "tok_xyz").await;

        Mock::given(method("GET"))
            .and(path("/v1/big"))
            .respond_with(ResponseTemplate::new(200).set_body_string("x".repeat(4096)))
            .mount(&server)
            .await;

        let config = InspectorConfig::with_iam_url(&server.uri()).max_body_size(1024);
        let inspector = AccountInspector::with_config(&config)
            .unwrap()
            .authenticate(&Credential::new("abc123").unwrap())
            .await
            .unwrap();

        let result = inspector.query(&Query::get("/v1/big")).await;
        assert!(matches!(result, Err(InspectError::TooLarge(_, 1024))));
    }
}

// =============================================================================
// Account Settings Tests
// =============================================================================

mod settings {
    use super::*;

    async fn mount_settings(server: &MockServer, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/v2/groups/settings"))
            .and(query_param("account_id", ACCOUNT_ID))
            .and(bearer_token("tok_xyz"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_public_access_enabled() {
        let server = MockServer::start().await;
        let inspector = authenticated(&server, "tok_xyz").await;
        mount_settings(
            &server,
            json!({
                "account_id": ACCOUNT_ID,
                "last_modified_at": "",
                "last_modified_by_id": "",
                "public_access_enabled": true
            }),
        )
        .await;

        let settings = inspector.account_settings(ACCOUNT_ID).await.unwrap();

        assert_eq!(settings.account_id.as_deref(), Some(ACCOUNT_ID));
        assert!(settings.public_access_enabled);
    }

    #[tokio::test]
    async fn test_settings_with_null_and_numeric_fields() {
        let server = MockServer::start().await;
        let inspector = authenticated(&server, "tok_xyz").await;
        mount_settings(
            &server,
            json!({
                "account_id": null,
                "last_modified_at": 1700000000,
                "last_modified_by_id": "IBMid-1",
                "public_access_enabled": true
            }),
        )
        .await;

        let settings = inspector.account_settings(ACCOUNT_ID).await.unwrap();

        assert_eq!(settings.account_id, None);
        assert_eq!(settings.last_modified_at, None);
        assert_eq!(settings.last_modified_by_id.as_deref(), Some("IBMid-1"));
        assert!(settings.public_access_enabled);
    }

    #[tokio::test]
    async fn test_public_access_flag_missing() {
        let server = MockServer::start().await;
        let inspector = authenticated(&server, "tok_xyz").await;
        mount_settings(&server, json!({"account_id": ACCOUNT_ID})).await;

        let err = inspector.public_access_enabled(ACCOUNT_ID).await.unwrap_err();

        assert!(err.is_extraction());
        assert_eq!(err.to_string(), "missing field `public_access_enabled`");
    }
}

// =============================================================================
// End-to-End Tests
// =============================================================================

mod end_to_end {
    use super::*;

    #[tokio::test]
    async fn test_public_access_not_enabled() {
        let server = MockServer::start().await;
        mount_token(&server, "abc123", "tok_xyz").await;

        Mock::given(method("GET"))
            .and(path("/v2/groups/settings"))
            .and(query_param("account_id", ACCOUNT_ID))
            .and(bearer_token("tok_xyz"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"public_access_enabled": false})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let inspector = AccountInspector::with_iam_url(&server.uri())
            .unwrap()
            .authenticate(&Credential::new("abc123").unwrap())
            .await
            .unwrap();
        let enabled = inspector.public_access_enabled(ACCOUNT_ID).await.unwrap();

        assert!(!enabled);
        assert!(public_access_message(enabled).contains("Public Access is not enabled"));
    }

    #[tokio::test]
    async fn test_failed_authentication_issues_no_query() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/identity/token"))
            .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v2/groups/settings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"public_access_enabled": true})))
            .expect(0)
            .mount(&server)
            .await;

        let result = AccountInspector::with_iam_url(&server.uri())
            .unwrap()
            .authenticate(&Credential::new("abc123").unwrap())
            .await;

        assert!(matches!(
            result,
            Err(InspectError::Authentication { status: 401, .. })
        ));
    }

    #[tokio::test]
    async fn test_checks_account_from_token_claims() {
        let server = MockServer::start().await;
        let inspector = authenticated(&server, &jwt(json!({"account": {"bss": ACCOUNT_ID}}))).await;

        Mock::given(method("GET"))
            .and(path("/v2/groups/settings"))
            .and(query_param("account_id", ACCOUNT_ID))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"public_access_enabled": true})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let account_id = inspector.resolve_account_id(None).unwrap();
        let enabled = inspector.public_access_enabled(&account_id).await.unwrap();

        assert_eq!(account_id, ACCOUNT_ID);
        assert!(enabled);
    }
}

// =============================================================================
// Account Id Resolution Tests
// =============================================================================

mod account_id {
    use super::*;

    #[tokio::test]
    async fn test_explicit_id_wins_over_claim() {
        let server = MockServer::start().await;
        let inspector = authenticated(&server, &jwt(json!({"account": {"bss": ACCOUNT_ID}}))).await;

        let account_id = inspector.resolve_account_id(Some(" other-account ".into()));

        assert_eq!(account_id.unwrap(), "other-account");
    }

    #[tokio::test]
    async fn test_id_from_claim() {
        let server = MockServer::start().await;
        let payload = json!({"iam_id": "IBMid-123", "account": {"bss": ACCOUNT_ID}});
        let inspector = authenticated(&server, &jwt(payload)).await;

        assert_eq!(inspector.token().claims().unwrap().account_id(), Some(ACCOUNT_ID));
        assert_eq!(inspector.resolve_account_id(None).unwrap(), ACCOUNT_ID);
        assert_eq!(
            inspector.resolve_account_id(Some("  ".into())).unwrap(),
            ACCOUNT_ID
        );
    }

    #[tokio::test]
    async fn test_opaque_token_without_explicit_id() {
        let server = MockServer::start().await;
        let inspector = authenticated(&server, "tok_xyz").await;

        let result = inspector.resolve_account_id(None);

        assert!(matches!(
            result,
            Err(InspectError::MissingCredential("account id"))
        ));
    }

    #[tokio::test]
    async fn test_claims_without_account() {
        let server = MockServer::start().await;
        let inspector = authenticated(&server, &jwt(json!({"iam_id": "IBMid-123"}))).await;

        let result = inspector.resolve_account_id(None);

        assert!(matches!(
            result,
            Err(InspectError::MissingCredential("account id"))
        ));
    }
}
