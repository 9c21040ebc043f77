//! REST client for the Ranger policy store.

use std::time::Duration;

use reqwest::StatusCode;
use serde::Serialize;
use tracing::{debug, info};
use url::Url;

use opm_core::{PolicyFile, SourcePolicy};

use crate::error::{RangerError, RangerResult};

const EXPORT_PATH: &str = "service/plugins/policies/exportJson";
const POLICIES_PATH: &str = "service/plugins/policies";

/// Connection settings for one Ranger instance.
#[derive(Debug, Clone)]
pub struct RangerConfig {
    pub base_url: Url,
    pub username: String,
    pub password: String,
    /// Accept self-signed certificates. Common on internal Ranger
    /// deployments; off by default.
    pub accept_invalid_certs: bool,
    /// Exports can be large; this default is deliberately generous.
    pub export_timeout: Duration,
    pub import_timeout: Duration,
    pub delete_timeout: Duration,
}

impl RangerConfig {
    /// Settings with default timeouts and strict TLS.
    ///
    /// # Errors
    ///
    /// Returns an error when `base_url` does not parse as an absolute URL.
    pub fn new(
        base_url: &str,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> RangerResult<Self> {
        // A trailing slash keeps Url::join from eating the last segment.
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        Ok(Self {
            base_url: Url::parse(&normalized)?,
            username: username.into(),
            password: password.into(),
            accept_invalid_certs: false,
            export_timeout: Duration::from_secs(300),
            import_timeout: Duration::from_secs(60),
            delete_timeout: Duration::from_secs(60),
        })
    }

    #[must_use]
    pub const fn with_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    #[must_use]
    pub const fn with_export_timeout(mut self, timeout: Duration) -> Self {
        self.export_timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_import_timeout(mut self, timeout: Duration) -> Self {
        self.import_timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_delete_timeout(mut self, timeout: Duration) -> Self {
        self.delete_timeout = timeout;
        self
    }
}

/// Client for policy export, import, and deletion.
#[derive(Debug, Clone)]
pub struct RangerClient {
    http: reqwest::Client,
    config: RangerConfig,
}

impl RangerClient {
    /// Build a client from connection settings.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying HTTP client cannot be built.
    pub fn new(config: RangerConfig) -> RangerResult<Self> {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;
        Ok(Self { http, config })
    }

    /// Export every policy of a service as a read-only snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or any non-200 response,
    /// including 404 when the service has no policies.
    pub async fn export_policies(&self, service_name: &str) -> RangerResult<Vec<SourcePolicy>> {
        let url = self.config.base_url.join(EXPORT_PATH)?;
        info!(service = service_name, %url, "exporting policies");

        let response = self
            .http
            .get(url)
            .query(&[
                ("serviceName", service_name),
                ("checkPoliciesExists", "true"),
            ])
            .basic_auth(&self.config.username, Some(&self.config.password))
            .timeout(self.config.export_timeout)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(unexpected_status("export", status, response).await);
        }

        let file: PolicyFile<SourcePolicy> = response.json().await?;
        info!(
            service = service_name,
            count = file.policies.len(),
            "exported policies"
        );
        Ok(file.policies)
    }

    /// Submit one policy. Ranger upserts by service and name, so
    /// re-submitting a deterministically named policy is safe.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or any non-200 response.
    pub async fn import_policy<T: Serialize + Sync>(&self, policy: &T) -> RangerResult<()> {
        let url = self.config.base_url.join(POLICIES_PATH)?;
        let response = self
            .http
            .post(url)
            .basic_auth(&self.config.username, Some(&self.config.password))
            .json(policy)
            .timeout(self.config.import_timeout)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(unexpected_status("import", status, response).await);
        }
        debug!("imported policy");
        Ok(())
    }

    /// Delete one policy by store-assigned id.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or any non-204 response.
    pub async fn delete_policy(&self, policy_id: i64) -> RangerResult<()> {
        let url = self
            .config
            .base_url
            .join(&format!("{POLICIES_PATH}/{policy_id}"))?;
        let response = self
            .http
            .delete(url)
            .basic_auth(&self.config.username, Some(&self.config.password))
            .timeout(self.config.delete_timeout)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::NO_CONTENT {
            return Err(unexpected_status("delete", status, response).await);
        }
        info!(policy_id, "deleted policy");
        Ok(())
    }
}

async fn unexpected_status(
    operation: &'static str,
    status: StatusCode,
    response: reqwest::Response,
) -> RangerError {
    let body = response.text().await.unwrap_or_default();
    RangerError::UnexpectedStatus {
        operation,
        status,
        body,
    }
}
