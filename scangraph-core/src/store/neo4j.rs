//! Neo4j backend.
//!
//! Each plan runs inside one explicit write transaction. Every step is a
//! parameterized `MERGE`, so re-running a record never duplicates nodes or
//! relationships.

use super::GraphStore;
use crate::error::{Step, StoreError, UpsertError};
use crate::mapper::{Upsert, UpsertPlan};
use neo4rs::{Graph, Query, query};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

pub const MERGE_HOST: &str = "
MERGE (h:Host {url: $url})
SET h.input = $input,
    h.port = $port,
    h.title = $title,
    h.scheme = $scheme,
    h.webserver = $webserver,
    h.status = $status,
    h.words = $words,
    h.lines = $lines";

pub const MERGE_RESOLVES_TO: &str = "
MERGE (h:Host {url: $url})
MERGE (i:IP {address: $ip})
MERGE (h)-[:RESOLVES_TO]->(i)";

pub const MERGE_USES: &str = "
MERGE (h:Host {url: $url})
MERGE (t:Tech {name: $tech})
MERGE (h)-[:USES]->(t)";

pub const MERGE_BELONGS_TO: &str = "
MERGE (h:Host {url: $url})
MERGE (a:ASN {number: $as_number})
SET a.name = $as_name, a.country = $as_country
MERGE (h)-[:BELONGS_TO]->(a)";

/// Where and as whom to connect.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub uri: String,
    pub username: String,
    pub password: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            uri: "neo4j://localhost:7687".to_string(),
            username: "neo4j".to_string(),
            password: "neo4jpass".to_string(),
        }
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("uri", &self.uri)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Cypher statement text for a step.
pub fn statement(op: &Upsert) -> &'static str {
    match op {
        Upsert::Host { .. } => MERGE_HOST,
        Upsert::ResolvesTo { .. } => MERGE_RESOLVES_TO,
        Upsert::Uses { .. } => MERGE_USES,
        Upsert::BelongsTo { .. } => MERGE_BELONGS_TO,
    }
}

fn to_query(op: &Upsert) -> Query {
    let q = query(statement(op)).param("url", op.url());
    match op {
        Upsert::Host { props, .. } => q
            .param("input", props.input.as_str())
            .param("port", props.port.as_str())
            .param("title", props.title.as_str())
            .param("scheme", props.scheme.as_str())
            .param("webserver", props.webserver.as_str())
            .param("status", props.status)
            .param("words", props.words)
            .param("lines", props.lines),
        Upsert::ResolvesTo { address, .. } => q.param("ip", address.as_str()),
        Upsert::Uses { tech, .. } => q.param("tech", tech.as_str()),
        Upsert::BelongsTo { asn, .. } => q
            .param("as_number", asn.number.as_str())
            .param("as_name", asn.name.as_str())
            .param("as_country", asn.country.as_str()),
    }
}

pub struct Neo4jStore {
    graph: Graph,
}

impl Neo4jStore {
    /// Open a connection and verify it with a trivial query.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self, StoreError> {
        let graph = Graph::new(
            config.uri.as_str(),
            config.username.as_str(),
            config.password.as_str(),
        )
        .await?;
        graph.run(query("RETURN 1")).await?;
        info!(uri = %config.uri, user = %config.username, "connected to Neo4j");
        Ok(Self { graph })
    }

    pub async fn host_exists(&self, url: &str) -> Result<bool, StoreError> {
        let q = query("MATCH (h:Host {url: $url}) RETURN h.url LIMIT 1").param("url", url);
        let mut stream = self.graph.execute(q).await?;
        Ok(stream.next().await?.is_some())
    }
}

impl GraphStore for Neo4jStore {
    async fn apply(&mut self, plan: &UpsertPlan) -> Result<(), UpsertError> {
        let url = plan.url();
        let mut txn = self
            .graph
            .start_txn()
            .await
            .map_err(|e| UpsertError::new(url, Step::Begin, e))?;

        for op in plan.ops() {
            let outcome = match op.check_keys() {
                Ok(()) => txn.run(to_query(op)).await.map_err(StoreError::from),
                Err(e) => Err(e),
            };
            if let Err(source) = outcome {
                if let Err(e) = txn.rollback().await {
                    warn!(url, error = %e, "rollback failed");
                }
                return Err(UpsertError::new(url, op.step(), source));
            }
        }

        txn.commit()
            .await
            .map_err(|e| UpsertError::new(url, Step::Commit, e))?;
        debug!(url, steps = plan.len(), "committed upsert plan");
        Ok(())
    }
}
