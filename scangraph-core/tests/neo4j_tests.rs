// Tests for the Neo4j backend. The live test needs a running server:
//   SCANGRAPH_TEST_NEO4J_URI=neo4j://localhost:7687 cargo test -- --ignored

use scangraph_core::error::Step;
use scangraph_core::mapper::{Upsert, UpsertPlan, plan_upserts};
use scangraph_core::record::decode_line;
use scangraph_core::store::neo4j::{
    ConnectionConfig, MERGE_BELONGS_TO, MERGE_HOST, MERGE_RESOLVES_TO, MERGE_USES, statement,
};
use scangraph_core::store::{GraphStore, Neo4jStore};

// ============================================================================
// Statement Text
// ============================================================================

#[test]
fn test_every_statement_merges_host_by_url() {
    for text in [MERGE_HOST, MERGE_RESOLVES_TO, MERGE_USES, MERGE_BELONGS_TO] {
        assert!(text.contains("MERGE (h:Host {url: $url})"), "{}", text);
        assert!(!text.contains("CREATE"), "{}", text);
    }
}

#[test]
fn test_relationships_are_merged() {
    assert!(MERGE_RESOLVES_TO.contains("MERGE (h)-[:RESOLVES_TO]->(i)"));
    assert!(MERGE_USES.contains("MERGE (h)-[:USES]->(t)"));
    assert!(MERGE_BELONGS_TO.contains("MERGE (h)-[:BELONGS_TO]->(a)"));
}

#[test]
fn test_host_statement_sets_title_from_parameter() {
    assert!(MERGE_HOST.contains("h.title = $title"));
    for attr in ["input", "port", "scheme", "webserver", "status", "words", "lines"] {
        assert!(MERGE_HOST.contains(&format!("h.{attr} = ${attr}")), "{}", attr);
    }
}

#[test]
fn test_statement_for_each_step() {
    let record = decode_line(
        1,
        r#"{"url":"https://a.example","host":"1.2.3.4","tech":["nginx"],"asn":{"as_number":"AS1"}}"#,
    )
    .unwrap();
    let plan = plan_upserts(&record);
    let texts: Vec<&str> = plan.ops().iter().map(statement).collect();

    assert_eq!(
        texts,
        vec![MERGE_HOST, MERGE_RESOLVES_TO, MERGE_USES, MERGE_BELONGS_TO]
    );
    assert!(matches!(plan.ops()[0], Upsert::Host { .. }));
}

// ============================================================================
// Connection Config
// ============================================================================

#[test]
fn test_connection_config_defaults() {
    let config = ConnectionConfig::default();
    assert_eq!(config.uri, "neo4j://localhost:7687");
    assert_eq!(config.username, "neo4j");
    assert_eq!(config.password, "neo4jpass");
}

#[test]
fn test_connection_config_debug_hides_password() {
    let config = ConnectionConfig {
        password: "hunter2".to_string(),
        ..ConnectionConfig::default()
    };
    let printed = format!("{:?}", config);
    assert!(!printed.contains("hunter2"));
    assert!(printed.contains("neo4j://localhost:7687"));
}

// ============================================================================
// Live Server
// ============================================================================

#[tokio::test]
#[ignore]
async fn test_live_upsert_is_idempotent() {
    let Ok(uri) = std::env::var("SCANGRAPH_TEST_NEO4J_URI") else {
        return;
    };
    let config = ConnectionConfig {
        uri,
        username: std::env::var("SCANGRAPH_TEST_NEO4J_USER").unwrap_or_else(|_| "neo4j".into()),
        password: std::env::var("SCANGRAPH_TEST_NEO4J_PASSWORD")
            .unwrap_or_else(|_| "neo4jpass".into()),
    };
    let mut store = Neo4jStore::connect(&config).await.unwrap();

    let record = decode_line(
        1,
        r#"{"url":"https://scangraph-live.test","host":"192.0.2.1","tech":["nginx","nginx"],"asn":{"as_number":"AS64500","as_name":"TEST-NET","as_country":"ZZ"},"status_code":200}"#,
    )
    .unwrap();
    let plan = plan_upserts(&record);

    store.apply(&plan).await.unwrap();
    store.apply(&plan).await.unwrap();
    assert!(store.host_exists("https://scangraph-live.test").await.unwrap());

    let mut empty = record.clone();
    empty.url.clear();
    assert!(store.apply(&plan_upserts(&empty)).await.is_err());

    // A failure at the tech step must roll back the host written before it.
    let url = "https://scangraph-rollback.test";
    let rollback = UpsertPlan::new(
        url,
        vec![
            Upsert::Host {
                url: url.to_string(),
                props: Default::default(),
            },
            Upsert::Uses {
                url: url.to_string(),
                tech: String::new(),
            },
        ],
    );
    let err = store.apply(&rollback).await.unwrap_err();
    assert_eq!(err.step, Step::Tech);
    assert!(!store.host_exists(url).await.unwrap());
}
