//! Runs one SOQL query against every configured connection concurrently.

use futures::future::join_all;
use multiorg_core::Result;
use multiorg_core::org::{AccountRow, ConnectionName, ConnectionOutcome, ConnectionSet, OrgAuthorizer};
use std::sync::Arc;

/// Fans a query out over a set of named connections.
///
/// One connection failing never affects the others: every connection
/// yields exactly one [`ConnectionOutcome`], in input order.
pub struct FanOutQueryRunner {
    authorizer: Arc<dyn OrgAuthorizer>,
    connections: ConnectionSet,
}

impl FanOutQueryRunner {
    pub fn new(authorizer: Arc<dyn OrgAuthorizer>, connections: ConnectionSet) -> Self {
        Self {
            authorizer,
            connections,
        }
    }

    /// Runs `soql` against the configured connection set.
    pub async fn run_query(&self, soql: &str) -> Vec<ConnectionOutcome> {
        self.run_query_on(self.connections.as_slice(), soql).await
    }

    /// Runs `soql` against an explicit list of connections.
    pub async fn run_query_on(
        &self,
        names: &[ConnectionName],
        soql: &str,
    ) -> Vec<ConnectionOutcome> {
        if names.is_empty() {
            tracing::debug!(target: "fan_out", "No connections configured, nothing to query");
            return Vec::new();
        }

        tracing::debug!(target: "fan_out", "Querying {} connection(s)", names.len());

        let queries = names.iter().map(|name| async move {
            let result = self.query_connection(name, soql).await;
            if let Err(e) = &result {
                tracing::error!(target: "fan_out", "Error querying '{}': {}", name, e);
            }
            ConnectionOutcome::from_result(name.clone(), result)
        });

        join_all(queries).await
    }

    /// Resolves one connection, runs the query and projects the records.
    pub async fn query_connection(
        &self,
        name: &ConnectionName,
        soql: &str,
    ) -> Result<Vec<AccountRow>> {
        let session = self.authorizer.connect(name).await?;
        let identity = session.identity();
        tracing::info!(
            target: "fan_out",
            "Connected to '{}': org {} as {}",
            name,
            identity.id,
            identity.username
        );

        let response = session.query(soql).await?;
        tracing::info!(
            target: "fan_out",
            "'{}' returned {} record(s) (total_size={}, done={})",
            name,
            response.records.len(),
            response.total_size,
            response.done
        );

        response.records.iter().map(AccountRow::from_record).collect()
    }
}
