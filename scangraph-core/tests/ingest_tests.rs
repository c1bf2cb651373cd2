// Tests for the sequential ingest loop

use scangraph_core::error::{IngestError, Step};
use scangraph_core::ingest::{IngestEvent, IngestStats, ingest};
use scangraph_core::model::{NodeLabel, RelType};
use scangraph_core::store::MemoryGraph;
use std::io::{self, Cursor, Read};

/// Outcome of each event, flattened for assertions.
#[derive(Debug, PartialEq)]
enum Seen {
    Upserted(usize, String),
    DecodeFailed(usize),
    UpsertFailed(usize, String, Step),
}

async fn run(input: &str) -> (MemoryGraph, IngestStats, Vec<Seen>) {
    let mut graph = MemoryGraph::new();
    let mut seen = Vec::new();
    let stats = ingest(Cursor::new(input.to_string()), &mut graph, |event| {
        seen.push(match event {
            IngestEvent::Upserted { line, url } => Seen::Upserted(line, url.to_string()),
            IngestEvent::DecodeFailed(e) => Seen::DecodeFailed(e.line),
            IngestEvent::UpsertFailed { line, error } => {
                Seen::UpsertFailed(line, error.url.clone(), error.step)
            }
        });
    })
    .await
    .unwrap();
    (graph, stats, seen)
}

// ============================================================================
// Stream Handling
// ============================================================================

#[tokio::test]
async fn test_malformed_line_does_not_halt_stream() {
    let input = concat!(
        "{\"url\": \"https://broken.example\"\n",
        r#"{"url":"https://a.example","host":"1.2.3.4","tech":["nginx"]}"#,
        "\n"
    );
    let (graph, stats, seen) = run(input).await;

    assert_eq!(
        seen,
        vec![
            Seen::DecodeFailed(1),
            Seen::Upserted(2, "https://a.example".to_string()),
        ]
    );
    assert_eq!(stats.decode_failures, 1);
    assert_eq!(stats.upserted, 1);
    assert_eq!(graph.related("https://a.example", RelType::Uses), vec!["nginx"]);
}

#[tokio::test]
async fn test_upsert_failure_does_not_halt_stream() {
    let input = concat!(
        r#"{"host":"1.2.3.4"}"#,
        "\n",
        r#"{"url":"https://a.example","host":"1.2.3.4"}"#,
        "\n"
    );
    let (graph, stats, seen) = run(input).await;

    assert_eq!(
        seen,
        vec![
            Seen::UpsertFailed(1, String::new(), Step::Host),
            Seen::Upserted(2, "https://a.example".to_string()),
        ]
    );
    assert_eq!(stats.upsert_failures, 1);
    assert_eq!(stats.failures(), 1);
    assert_eq!(graph.count(NodeLabel::Host), 1);
}

#[tokio::test]
async fn test_blank_lines_are_skipped() {
    let input = "\n   \r\n{\"url\":\"https://a.example\",\"host\":\"1.2.3.4\"}\r\n\n";
    let (_, stats, seen) = run(input).await;

    assert_eq!(
        stats,
        IngestStats {
            lines_read: 4,
            blank: 3,
            decode_failures: 0,
            upserted: 1,
            upsert_failures: 0,
        }
    );
    assert_eq!(seen, vec![Seen::Upserted(3, "https://a.example".to_string())]);
}

#[tokio::test]
async fn test_empty_input() {
    let (graph, stats, seen) = run("").await;

    assert_eq!(stats, IngestStats::default());
    assert!(seen.is_empty());
    assert_eq!(graph.summary().nodes(), 0);
}

#[tokio::test]
async fn test_repeated_file_is_idempotent() {
    let file = concat!(
        r#"{"url":"https://a.example","host":"1.2.3.4","tech":["nginx","nginx"],"asn":{"as_number":"AS123","as_name":"ExampleNet","as_country":"US"},"status_code":200}"#,
        "\n",
        r#"{"url":"https://b.example","host":"1.2.3.4","tech":["nginx"]}"#,
        "\n"
    );
    let (once, _, _) = run(file).await;
    let (twice, _, _) = run(&file.repeat(2)).await;

    assert_eq!(once.summary(), twice.summary());
    assert_eq!(once.summary().hosts, 2);
    assert_eq!(once.summary().uses, 2);
}

// ============================================================================
// Read Failures
// ============================================================================

/// Yields `good` and then fails every subsequent read.
struct FailingReader {
    good: Cursor<Vec<u8>>,
}

impl Read for FailingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.good.read(buf)?;
        if n == 0 {
            return Err(io::Error::other("device unplugged"));
        }
        Ok(n)
    }
}

#[tokio::test]
async fn test_read_error_is_fatal_after_processed_lines() {
    let good = concat!(r#"{"url":"https://a.example","host":"1.2.3.4"}"#, "\n");
    let reader = io::BufReader::new(FailingReader {
        good: Cursor::new(good.as_bytes().to_vec()),
    });

    let mut graph = MemoryGraph::new();
    let err = ingest(reader, &mut graph, |_| {}).await.unwrap_err();

    let IngestError::Read {
        line, processed, ..
    } = err;
    assert_eq!(line, 2);
    assert_eq!(processed.upserted, 1);
    assert!(graph.host("https://a.example").is_some());
}

#[tokio::test]
async fn test_record_without_host_is_upserted() {
    let input = concat!(
        r#"{"url":"https://nohost.example","title":"T","status_code":200,"tech":["nginx"]}"#,
        "\n"
    );
    let (graph, stats, seen) = run(input).await;

    assert_eq!(seen, vec![Seen::Upserted(1, "https://nohost.example".to_string())]);
    assert_eq!(stats.upserted, 1);
    assert_eq!(stats.upsert_failures, 0);
    assert!(graph.contains(NodeLabel::Host, "https://nohost.example"));
    assert_eq!(graph.count(NodeLabel::Ip), 0);
}
