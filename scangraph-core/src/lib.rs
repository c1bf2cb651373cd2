pub mod error;
pub mod ingest;
pub mod mapper;
pub mod model;
pub mod record;
pub mod store;

pub use error::{DecodeError, IngestError, Step, StoreError, UpsertError};
pub use ingest::{IngestEvent, IngestStats, ingest};
pub use mapper::{Upsert, UpsertPlan, plan_upserts};
pub use record::{AsnInfo, ScanRecord, decode_line};
pub use store::{ConnectionConfig, GraphStore, MemoryGraph, Neo4jStore};
