//! Translation of a [`ScanRecord`] into the ordered upserts of one unit of work.
//!
//! The plan is pure data; a [`GraphStore`](crate::store::GraphStore) decides
//! how each step is written.

use crate::error::{Step, StoreError};
use crate::model::{AsnProps, HostProps};
use crate::record::ScanRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Upsert {
    /// Merge the `Host` by URL and overwrite its scalar attributes.
    Host { url: String, props: HostProps },
    /// Merge the `IP` and ensure `Host -[:RESOLVES_TO]-> IP`.
    ResolvesTo { url: String, address: String },
    /// Merge the `Tech` and ensure `Host -[:USES]-> Tech`.
    Uses { url: String, tech: String },
    /// Merge the `ASN`, overwrite name/country, ensure `Host -[:BELONGS_TO]-> ASN`.
    BelongsTo { url: String, asn: AsnProps },
}

impl Upsert {
    pub fn step(&self) -> Step {
        match self {
            Upsert::Host { .. } => Step::Host,
            Upsert::ResolvesTo { .. } => Step::Ip,
            Upsert::Uses { .. } => Step::Tech,
            Upsert::BelongsTo { .. } => Step::Asn,
        }
    }

    pub fn url(&self) -> &str {
        match self {
            Upsert::Host { url, .. }
            | Upsert::ResolvesTo { url, .. }
            | Upsert::Uses { url, .. }
            | Upsert::BelongsTo { url, .. } => url,
        }
    }

    /// Reject steps that would merge a node on an empty key.
    pub fn check_keys(&self) -> Result<(), StoreError> {
        if self.url().is_empty() {
            return Err(StoreError::EmptyKey("Host.url"));
        }
        match self {
            Upsert::Host { .. } => Ok(()),
            Upsert::ResolvesTo { address, .. } if address.is_empty() => {
                Err(StoreError::EmptyKey("IP.address"))
            }
            Upsert::Uses { tech, .. } if tech.is_empty() => Err(StoreError::EmptyKey("Tech.name")),
            Upsert::BelongsTo { asn, .. } if asn.number.is_empty() => {
                Err(StoreError::EmptyKey("ASN.number"))
            }
            _ => Ok(()),
        }
    }
}

/// All upserts for one record, in execution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertPlan {
    url: String,
    ops: Vec<Upsert>,
}

impl UpsertPlan {
    pub fn new(url: impl Into<String>, ops: Vec<Upsert>) -> Self {
        Self {
            url: url.into(),
            ops,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn ops(&self) -> &[Upsert] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Validate every step's keys, returning the first offending step.
    pub fn check_keys(&self) -> Result<(), (Step, StoreError)> {
        for op in &self.ops {
            op.check_keys().map_err(|e| (op.step(), e))?;
        }
        Ok(())
    }
}

pub fn host_props(record: &ScanRecord) -> HostProps {
    HostProps {
        input: record.input.clone(),
        port: record.port.clone(),
        title: record.title.clone(),
        scheme: record.scheme.clone(),
        webserver: record.webserver.clone(),
        status: record.status_code,
        words: record.words,
        lines: record.lines,
    }
}

/// Build the upsert plan for `record`.
///
/// Order: host, IP when an address is present, one step per non-empty tech
/// entry (duplicates kept; the store's merge makes them no-ops), then ASN when
/// an AS number is present. Only the URL is required.
pub fn plan_upserts(record: &ScanRecord) -> UpsertPlan {
    let url = record.url.clone();
    let mut ops = Vec::with_capacity(3 + record.tech.len());

    ops.push(Upsert::Host {
        url: url.clone(),
        props: host_props(record),
    });

    if !record.host.is_empty() {
        ops.push(Upsert::ResolvesTo {
            url: url.clone(),
            address: record.host.clone(),
        });
    }

    for tech in record.tech.iter().filter(|t| !t.is_empty()) {
        ops.push(Upsert::Uses {
            url: url.clone(),
            tech: tech.clone(),
        });
    }

    if !record.asn.as_number.is_empty() {
        ops.push(Upsert::BelongsTo {
            url: url.clone(),
            asn: AsnProps {
                number: record.asn.as_number.clone(),
                name: record.asn.as_name.clone(),
                country: record.asn.as_country.clone(),
            },
        });
    }

    UpsertPlan::new(url, ops)
}
