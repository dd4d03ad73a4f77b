use super::client::SalesforceClient;
use super::session::RestOrgSession;
use async_trait::async_trait;
use multiorg_core::config::{OrgCredentials, SecretConfig};
use multiorg_core::org::{ConnectionName, OrgAuthorizer, OrgIdentity, OrgSession};
use multiorg_core::{MultiorgError, Result};
use reqwest::Client;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Resolves connection names against pre-provisioned credentials.
///
/// Each `connect` verifies the access token through the userinfo endpoint, so
/// an expired or revoked token fails here rather than at query time. Sessions
/// are not cached.
pub struct CredentialAuthorizer {
    http: Client,
    credentials: BTreeMap<String, OrgCredentials>,
}

impl CredentialAuthorizer {
    pub fn new(secrets: SecretConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| MultiorgError::internal(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(http, secrets))
    }

    pub fn with_client(http: Client, secrets: SecretConfig) -> Self {
        Self {
            http,
            credentials: secrets.orgs,
        }
    }

    pub fn knows(&self, name: &ConnectionName) -> bool {
        self.credentials.contains_key(name.as_str())
    }

    fn credentials_for(&self, name: &ConnectionName) -> Result<&OrgCredentials> {
        let credentials = self.credentials.get(name.as_str()).ok_or_else(|| {
            MultiorgError::authorization(format!("unknown connection '{}'", name))
        })?;
        if credentials.access_token.trim().is_empty() {
            return Err(MultiorgError::authorization(format!(
                "connection '{}' has no access token",
                name
            )));
        }
        Ok(credentials)
    }
}

#[async_trait]
impl OrgAuthorizer for CredentialAuthorizer {
    async fn connect(&self, name: &ConnectionName) -> Result<Arc<dyn OrgSession>> {
        let credentials = self.credentials_for(name)?;
        let client = SalesforceClient::new(self.http.clone(), credentials);

        let userinfo = client.userinfo().await?;
        tracing::debug!(
            target: "salesforce",
            "Resolved '{}' to org {} (user {})",
            name,
            userinfo.organization_id,
            userinfo.user_id
        );

        let identity = OrgIdentity {
            id: userinfo.organization_id,
            username: userinfo.preferred_username,
        };
        Ok(Arc::new(RestOrgSession::new(client, identity)))
    }
}
