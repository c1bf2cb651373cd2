//! Graph store backends.
//!
//! A store applies one [`UpsertPlan`] as a single unit of work: either every
//! step is durable or none is.

pub mod memory;
pub mod neo4j;

use crate::error::UpsertError;
use crate::mapper::UpsertPlan;

pub use memory::{GraphSummary, MemoryGraph};
pub use neo4j::{ConnectionConfig, Neo4jStore};

#[allow(async_fn_in_trait)]
pub trait GraphStore {
    /// Apply every step of `plan` atomically. On error nothing from the plan
    /// is kept and the error names the failing step.
    async fn apply(&mut self, plan: &UpsertPlan) -> Result<(), UpsertError>;
}
