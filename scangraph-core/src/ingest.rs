// Sequential line-by-line ingest: decode, plan, apply.

use crate::error::{DecodeError, IngestError, UpsertError};
use crate::mapper::plan_upserts;
use crate::record::decode_slice;
use crate::store::GraphStore;
use std::io::BufRead;
use tracing::{debug, warn};

/// Per-line outcome, reported as each line finishes.
#[derive(Debug)]
pub enum IngestEvent<'a> {
    Upserted { line: usize, url: &'a str },
    DecodeFailed(&'a DecodeError),
    UpsertFailed { line: usize, error: &'a UpsertError },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub lines_read: usize,
    pub blank: usize,
    pub decode_failures: usize,
    pub upserted: usize,
    pub upsert_failures: usize,
}

impl IngestStats {
    pub fn failures(&self) -> usize {
        self.decode_failures + self.upsert_failures
    }
}

fn trim_line_ending(mut bytes: &[u8]) -> &[u8] {
    if let [rest @ .., b'\r'] = bytes {
        bytes = rest;
    }
    bytes
}

/// Feed every line of `reader` through `store`, one unit of work per record.
///
/// Bad lines and failed upserts are logged, counted and reported through
/// `on_event`; only a failure of the reader itself stops the run.
pub async fn ingest<R, S, F>(
    reader: R,
    store: &mut S,
    mut on_event: F,
) -> Result<IngestStats, IngestError>
where
    R: BufRead,
    S: GraphStore,
    F: FnMut(IngestEvent<'_>),
{
    let mut stats = IngestStats::default();

    for (idx, chunk) in reader.split(b'\n').enumerate() {
        let line_no = idx + 1;
        let chunk = chunk.map_err(|source| IngestError::Read {
            line: line_no,
            processed: stats,
            source,
        })?;
        stats.lines_read += 1;

        let bytes = trim_line_ending(&chunk);
        if bytes.iter().all(u8::is_ascii_whitespace) {
            stats.blank += 1;
            continue;
        }

        let record = match decode_slice(line_no, bytes) {
            Ok(record) => record,
            Err(e) => {
                warn!(line = line_no, content = %e.content, "Error parsing JSON: {}", e.source);
                stats.decode_failures += 1;
                on_event(IngestEvent::DecodeFailed(&e));
                continue;
            }
        };

        debug!(line = line_no, url = %record.url, "Processing URL");
        let plan = plan_upserts(&record);

        match store.apply(&plan).await {
            Ok(()) => {
                stats.upserted += 1;
                on_event(IngestEvent::Upserted {
                    line: line_no,
                    url: plan.url(),
                });
            }
            Err(e) => {
                warn!(line = line_no, url = %e.url, step = %e.step, "Error processing record: {}", e.source);
                stats.upsert_failures += 1;
                on_event(IngestEvent::UpsertFailed {
                    line: line_no,
                    error: &e,
                });
            }
        }
    }

    Ok(stats)
}
