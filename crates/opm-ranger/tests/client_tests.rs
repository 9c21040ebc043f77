//! Integration tests for the Ranger client against a mock server.

use pretty_assertions::assert_eq;
use wiremock::matchers::{basic_auth, body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use opm_core::{RootIdentifier, TargetResources};
use opm_ranger::{RangerClient, RangerConfig, RangerError};

async fn client_for(server: &MockServer) -> RangerClient {
    let config = RangerConfig::new(&server.uri(), "admin", "secret").unwrap();
    RangerClient::new(config).unwrap()
}

#[tokio::test]
async fn export_parses_policy_file() {
    let server = MockServer::start().await;
    let body = serde_json::json!({
        "metaDataInfo": { "Host name": "ranger01" },
        "policies": [
            {
                "id": 11,
                "service": "cm_hdfs",
                "name": "fid1 access",
                "resources": { "path": { "values": ["/data/fid1"], "isRecursive": true } },
                "policyItems": [{
                    "accesses": [{ "type": "read", "isAllowed": true }],
                    "users": ["alice"],
                    "groups": [],
                    "roles": []
                }]
            }
        ]
    });

    Mock::given(method("GET"))
        .and(path("/service/plugins/policies/exportJson"))
        .and(query_param("serviceName", "cm_hdfs"))
        .and(query_param("checkPoliciesExists", "true"))
        .and(basic_auth("admin", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let policies = client.export_policies("cm_hdfs").await.unwrap();

    assert_eq!(policies.len(), 1);
    assert_eq!(policies[0].id, Some(11));
    assert_eq!(policies[0].name, "fid1 access");
    assert_eq!(policies[0].path_values(), ["/data/fid1"]);
}

#[tokio::test]
async fn export_surfaces_http_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/service/plugins/policies/exportJson"))
        .respond_with(ResponseTemplate::new(401).set_body_string("authentication required"))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client.export_policies("cm_hdfs").await.unwrap_err();

    match err {
        RangerError::UnexpectedStatus {
            operation,
            status,
            body,
        } => {
            assert_eq!(operation, "export");
            assert_eq!(status.as_u16(), 401);
            assert_eq!(body, "authentication required");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn import_posts_policy_json() {
    let server = MockServer::start().await;
    let root = RootIdentifier::new("fid1");
    let policy = opm_core::TargetPolicy {
        service: "cm_ozone".to_string(),
        name: "fid1_volume_policy".to_string(),
        description: None,
        resources: TargetResources::volume(&root),
        policy_items: Vec::new(),
    };

    Mock::given(method("POST"))
        .and(path("/service/plugins/policies"))
        .and(basic_auth("admin", "secret"))
        .and(body_json(&policy))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": 99 })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    client.import_policy(&policy).await.unwrap();
}

#[tokio::test]
async fn delete_requires_no_content() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/service/plugins/policies/42"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/service/plugins/policies/43"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    client.delete_policy(42).await.unwrap();

    let err = client.delete_policy(43).await.unwrap_err();
    assert!(matches!(
        err,
        RangerError::UnexpectedStatus {
            operation: "delete",
            ..
        }
    ));
}
