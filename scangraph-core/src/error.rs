use crate::ingest::IngestStats;
use std::fmt;
use thiserror::Error;

/// A single input line that could not be decoded into a [`ScanRecord`](crate::record::ScanRecord).
#[derive(Error, Debug)]
#[error("line {line}: invalid scan record: {source}")]
pub struct DecodeError {
    pub line: usize,
    pub content: String,
    #[source]
    pub source: serde_json::Error,
}

/// Failure of one write against a graph store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("empty {0} key")]
    EmptyKey(&'static str),

    #[error("Neo4j error: {0}")]
    Neo4j(#[from] neo4rs::Error),
}

/// The stage of a record's unit of work that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Begin,
    Host,
    Ip,
    Tech,
    Asn,
    Commit,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Begin => "begin",
            Step::Host => "host",
            Step::Ip => "ip",
            Step::Tech => "tech",
            Step::Asn => "asn",
            Step::Commit => "commit",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record whose unit of work was rolled back.
#[derive(Error, Debug)]
#[error("{step} upsert failed for {url}: {source}")]
pub struct UpsertError {
    pub url: String,
    pub step: Step,
    #[source]
    pub source: StoreError,
}

impl UpsertError {
    pub fn new(url: impl Into<String>, step: Step, source: impl Into<StoreError>) -> Self {
        Self {
            url: url.into(),
            step,
            source: source.into(),
        }
    }
}

/// Fatal errors that stop an ingest run.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("failed to read input at line {line}: {source}")]
    Read {
        line: usize,
        /// Counts for the lines handled before the failure.
        processed: IngestStats,
        #[source]
        source: std::io::Error,
    },
}
